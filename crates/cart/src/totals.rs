//! Checkout fee and total calculation.
//!
//! Pure derivation from the current cart and the chosen fulfillment
//! method. The checkout scope is deliberately the *whole* cart - the
//! selection set drives bulk deletion only, never pricing.
//!
//! Fee schedule:
//!
//! | Method        | Fee                        |
//! |---------------|----------------------------|
//! | Pickup        | 0                          |
//! | Delivery      | 0 (see note below)         |
//! | ProxyShopping | 20000₫ + 5% of subtotal    |
//!
//! Delivery shows a "free above 200000₫" message in the UI, but no fee is
//! charged below the threshold either. The threshold is informational
//! until product decides otherwise; [`delivery_notice`] exposes it without
//! ever computing a nonzero Delivery fee.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use vietmarket_core::Price;

use crate::model::Cart;

/// How the goods reach the buyer. Three mutually exclusive methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentMethod {
    /// Buyer collects at the market.
    #[default]
    Pickup,
    /// Goods are delivered to the buyer.
    Delivery,
    /// A proxy shopper buys on the buyer's behalf for a fee.
    ProxyShopping,
}

/// Derived checkout amounts: `total = subtotal + fee`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutTotals {
    /// Sum of all line subtotals, across every seller.
    pub subtotal: Price,
    /// Fulfillment fee for the chosen method.
    pub fee: Price,
    /// Amount due.
    pub total: Price,
}

/// Flat dispatch fee for proxy shopping, in đồng.
fn proxy_dispatch_fee() -> Decimal {
    Decimal::from(20_000)
}

/// Proxy shopper commission: 5% of the subtotal.
fn proxy_commission_rate() -> Decimal {
    Decimal::new(5, 2)
}

/// Subtotal above which the UI advertises free delivery, in đồng.
fn free_delivery_threshold() -> Decimal {
    Decimal::from(200_000)
}

/// Fee for a fulfillment method at a given subtotal.
#[must_use]
pub fn fee_for(method: FulfillmentMethod, subtotal: Decimal) -> Decimal {
    match method {
        FulfillmentMethod::Pickup | FulfillmentMethod::Delivery => Decimal::ZERO,
        FulfillmentMethod::ProxyShopping => {
            proxy_dispatch_fee() + subtotal * proxy_commission_rate()
        }
    }
}

/// Compute checkout totals for the whole cart under a fulfillment method.
#[must_use]
pub fn compute_totals(cart: &Cart, method: FulfillmentMethod) -> CheckoutTotals {
    let subtotal: Decimal = cart
        .items()
        .iter()
        .map(|item| item.line_subtotal().amount)
        .sum();
    let fee = fee_for(method, subtotal);

    CheckoutTotals {
        subtotal: Price::vnd(subtotal),
        fee: Price::vnd(fee),
        total: Price::vnd(subtotal + fee),
    }
}

/// The informational free-delivery message state for a subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryNotice {
    /// Subtotal clears the advertised threshold.
    FreeDelivery,
    /// Amount still needed to clear the threshold.
    BelowThreshold { remaining: Price },
}

/// Where the subtotal stands against the advertised delivery threshold.
///
/// Informational only: the Delivery fee is zero either way.
#[must_use]
pub fn delivery_notice(subtotal: Price) -> DeliveryNotice {
    let remaining = free_delivery_threshold() - subtotal.amount;
    if remaining <= Decimal::ZERO {
        DeliveryNotice::FreeDelivery
    } else {
        DeliveryNotice::BelowThreshold {
            remaining: Price::vnd(remaining),
        }
    }
}
