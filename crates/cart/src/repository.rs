//! The cart persistence contract.
//!
//! The engine consumes the remote cart store exclusively through
//! [`CartRepository`]; it never implements persistence itself. Mutations
//! are keyed by `(user, product)` per the server contract, while the UI
//! works in line-item IDs - the sync controller translates.
//!
//! The trait is object-safe so tests can substitute an in-memory fake with
//! failure injection.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vietmarket_core::{Price, ProductId, Quantity, UserId};

use crate::model::CartItem;

/// Lightweight cart summary for the header badge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSummary {
    /// Summed quantity across all lines.
    pub item_count: Quantity,
    /// Subtotal across all lines.
    pub total_price: Price,
}

/// Errors from the remote cart store.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Transport-level failure without a reqwest error value (used by
    /// fakes and non-HTTP backends).
    #[error("request failed: {0}")]
    Transport(String),

    /// The service answered but rejected the request.
    #[error("cart service rejected the request: {0}")]
    Api(String),

    /// No valid session; handled by the session collaborator, never
    /// retried here.
    #[error("not signed in")]
    Unauthorized,

    /// The server no longer knows the target.
    #[error("not found: {0}")]
    NotFound(String),

    /// Response body did not parse.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Remote cart store operations, keyed by an authenticated user.
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Fetch the user's full cart.
    async fn cart_items(&self, user: UserId) -> Result<Vec<CartItem>, RepositoryError>;

    /// Set the quantity of the user's line for a product.
    ///
    /// Returns the canonical line when the server echoes it back; `None`
    /// when the server acknowledges without a body.
    async fn update_item(
        &self,
        user: UserId,
        product: ProductId,
        quantity: Quantity,
    ) -> Result<Option<CartItem>, RepositoryError>;

    /// Remove the user's line for a product.
    async fn remove_item(&self, user: UserId, product: ProductId) -> Result<(), RepositoryError>;

    /// Remove every line in the user's cart.
    async fn clear(&self, user: UserId) -> Result<(), RepositoryError>;

    /// Fetch the badge summary without the full cart.
    async fn summary(&self, user: UserId) -> Result<CartSummary, RepositoryError>;
}
