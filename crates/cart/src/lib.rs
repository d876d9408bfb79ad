//! Vietmarket cart engine.
//!
//! The shopping-cart aggregation, quantity-constraint, and checkout-pricing
//! engine behind the cart page. Pure derivations (seller grouping, totals,
//! constraint validation) are plain functions over the cart model; all
//! state changes flow through the [`sync::CartSyncController`], which
//! reconciles optimistic local mutations against a remote cart store that
//! can partially fail.
//!
//! # Architecture
//!
//! - [`model`] - canonical line items and product snapshots
//! - [`grouping`] - line items grouped by seller, with aggregates
//! - [`constraints`] - minimum-order and stock validation, pre-network
//! - [`selection`] - the multi-select set for bulk actions
//! - [`totals`] - fees per fulfillment method and the grand total
//! - [`sync`] - optimistic mutation, per-item busy state, bulk fan-out
//! - [`cache`] - versioned, non-authoritative snapshot for first paint
//! - [`repository`] - the remote cart store contract
//! - [`api`] - HTTP repository implementation and ingestion boundary
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vietmarket_cart::api::MarketApiClient;
//! use vietmarket_cart::config::MarketApiConfig;
//! use vietmarket_cart::sync::CartSyncController;
//! use vietmarket_cart::totals::FulfillmentMethod;
//! use vietmarket_core::UserId;
//!
//! let config = MarketApiConfig::from_env()?;
//! let client = Arc::new(MarketApiClient::new(&config)?);
//! let cart = CartSyncController::new(UserId::new(1), client);
//!
//! cart.refresh().await?;
//! for (seller, group) in cart.seller_groups() {
//!     println!("{seller}: {}", group.subtotal);
//! }
//! let totals = cart.totals(FulfillmentMethod::ProxyShopping);
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cache;
pub mod config;
pub mod constraints;
pub mod error;
pub mod grouping;
pub mod model;
pub mod repository;
pub mod selection;
pub mod sync;
pub mod totals;

pub use cache::{CartSnapshot, SnapshotCache};
pub use constraints::{ConstraintViolation, QuantityRuling, validate};
pub use error::{CartError, Result};
pub use grouping::{SellerGroup, group_by_seller};
pub use model::{Cart, CartItem, ProductSnapshot};
pub use repository::{CartRepository, CartSummary, RepositoryError};
pub use selection::SelectionSet;
pub use sync::{BulkRemoval, CartSyncController, MutationOutcome};
pub use totals::{
    CheckoutTotals, DeliveryNotice, FulfillmentMethod, compute_totals, delivery_notice, fee_for,
};
