//! Non-negative decimal quantities.
//!
//! Marketplace produce is sold by weight as well as by piece, so cart
//! quantities are decimals, not integers: half a kilogram of morning glory
//! is a perfectly normal line item. Quantity controls move in fixed steps of
//! [`Quantity::STEP`] (0.5 unit); free-form numeric entry is not part of
//! this engine.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error constructing a [`Quantity`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuantityError {
    /// Quantities are never negative; a request below zero is a caller bug.
    #[error("quantity cannot be negative: {0}")]
    Negative(Decimal),
}

/// A non-negative decimal quantity of a product, in the product's unit.
///
/// `0` is a valid value: a *requested* quantity of zero means "remove the
/// line item" (see the constraint validator), and sum aggregates start at
/// [`Quantity::ZERO`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Quantity(Decimal);

impl Quantity {
    /// Zero quantity.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// The fixed increment/decrement step for quantity controls: 0.5 unit.
    pub const STEP: Self = Self(Decimal::from_parts(5, 0, 0, false, 1));

    /// Create a quantity from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::Negative`] if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, QuantityError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(QuantityError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Create a quantity from a whole number of units.
    #[must_use]
    pub fn from_units(units: u32) -> Self {
        Self(Decimal::from(units))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether this quantity is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// This quantity raised by one step.
    #[must_use]
    pub fn stepped_up(&self) -> Self {
        Self(self.0 + Self::STEP.0)
    }

    /// This quantity lowered by one step, saturating at zero.
    ///
    /// A saturated result of zero is the "remove this line" signal once it
    /// reaches the constraint validator.
    #[must_use]
    pub fn stepped_down(&self) -> Self {
        let lowered = self.0 - Self::STEP.0;
        if lowered.is_sign_negative() {
            Self::ZERO
        } else {
            Self(lowered)
        }
    }
}

impl Add for Quantity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Quantity {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for Quantity {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}
