//! Core domain types.
//!
//! - [`id`] - Type-safe newtype IDs for entity references
//! - [`quantity`] - Non-negative decimal quantities with a 0.5-unit step
//! - [`price`] - Decimal prices with currency codes

pub mod id;
pub mod price;
pub mod quantity;

pub use id::{LineItemId, ProductId, UserId};
pub use price::{CurrencyCode, Price};
pub use quantity::{Quantity, QuantityError};
