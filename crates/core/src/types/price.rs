//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are decimal-denominated in the marketplace's settlement currency
//! (Vietnamese đồng). All fee and subtotal math stays in [`Decimal`] so
//! percentage commissions are exact; floats never touch money.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., đồng, not hào).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in Vietnamese đồng.
    #[must_use]
    pub const fn vnd(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::VND)
    }

    /// A zero price in Vietnamese đồng.
    #[must_use]
    pub const fn zero() -> Self {
        Self::vnd(Decimal::ZERO)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.currency_code {
            // đồng is written amount-first with a trailing sign
            CurrencyCode::VND => write!(f, "{}{}", self.amount.normalize(), "₫"),
            CurrencyCode::USD => write!(f, "${}", self.amount.normalize()),
        }
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    VND,
    USD,
}

impl CurrencyCode {
    /// Currency symbol for display.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::VND => "₫",
            Self::USD => "$",
        }
    }

    /// ISO 4217 alpha code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::VND => "VND",
            Self::USD => "USD",
        }
    }
}
