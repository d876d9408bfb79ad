//! Quantity constraint validation.
//!
//! Stateless rulings on requested quantity changes, applied before any
//! network call. Three outcomes:
//!
//! - a request at or below zero is a *removal signal*, not a quantity
//!   update and not a rejection;
//! - a request under the product's minimum order quantity, or over its
//!   tracked stock, is rejected with the limiting value;
//! - anything else is accepted.
//!
//! Quantity controls move in fixed [`Quantity::STEP`] increments; direct
//! numeric entry is not part of this engine, but the same rules would
//! apply if it ever were.

use thiserror::Error;
use vietmarket_core::Quantity;

use crate::model::CartItem;

/// A locally rejected quantity change. Never reaches the network.
///
/// Messages name the product and the limiting value so the presentation
/// layer can show them verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintViolation {
    /// Requested quantity is under the product's minimum order quantity.
    #[error("{product} is sold in a minimum of {minimum} {unit}")]
    BelowMinimum {
        product: String,
        minimum: Quantity,
        unit: String,
    },

    /// Requested quantity exceeds the tracked stock on hand.
    #[error("only {available} {unit} of {product} left in stock")]
    ExceedsStock {
        product: String,
        available: Quantity,
        unit: String,
    },
}

/// Outcome of validating a requested quantity against a line item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantityRuling {
    /// Requested quantity reached zero: remove the line item.
    Remove,
    /// The change violates a constraint; state must not change.
    Reject(ConstraintViolation),
    /// The change is within bounds.
    Accept(Quantity),
}

/// Validate a requested quantity for a line item.
#[must_use]
pub fn validate(item: &CartItem, requested: Quantity) -> QuantityRuling {
    if requested.is_zero() {
        return QuantityRuling::Remove;
    }

    let product = &item.product;
    if product.has_minimum() && requested < product.minimum_quantity {
        return QuantityRuling::Reject(ConstraintViolation::BelowMinimum {
            product: product.name.clone(),
            minimum: product.minimum_quantity,
            unit: product.unit.clone(),
        });
    }

    if product.tracks_stock() && requested > product.stock_quantity {
        return QuantityRuling::Reject(ConstraintViolation::ExceedsStock {
            product: product.name.clone(),
            available: product.stock_quantity,
            unit: product.unit.clone(),
        });
    }

    QuantityRuling::Accept(requested)
}
