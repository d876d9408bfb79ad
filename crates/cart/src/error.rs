//! User-facing error taxonomy for cart operations.
//!
//! Every rejected or failed mutation yields one of these; nothing is
//! silently swallowed. Constraint violations are resolved locally and never
//! reach the network; repository failures surface here after the optimistic
//! state has been reverted (or, for bulk operations, resynced).

use thiserror::Error;
use vietmarket_core::LineItemId;

use crate::constraints::ConstraintViolation;
use crate::repository::RepositoryError;

/// Result type alias for cart operations.
pub type Result<T> = std::result::Result<T, CartError>;

/// Anything a cart mutation can fail with.
#[derive(Debug, Error)]
pub enum CartError {
    /// Rejected locally by the quantity constraint validator.
    #[error(transparent)]
    Constraint(#[from] ConstraintViolation),

    /// The target line item is no longer in the local cart (raced with a
    /// prior removal). A no-op: prompt the user to refresh.
    #[error("that item is no longer in your cart; refresh to see the latest cart")]
    NotFound(LineItemId),

    /// A mutation for the same line item is still in flight. Rejected, not
    /// queued.
    #[error("an update for this item is still in progress")]
    UpdateInFlight(LineItemId),

    /// The session is gone; the session collaborator takes it from here.
    #[error("your session has expired; please sign in again")]
    Unauthorized,

    /// Bulk removal where some but not all calls succeeded. The successful
    /// removals were applied and the cart was resynced from the server.
    #[error("{succeeded} of {total} items were removed")]
    PartialBulkFailure { succeeded: usize, total: usize },

    /// Transient repository failure; optimistic state was reverted and the
    /// operation was not retried.
    #[error(transparent)]
    Repository(RepositoryError),
}

impl CartError {
    /// Map a repository failure into the user-facing taxonomy.
    pub(crate) fn from_repository(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Unauthorized => Self::Unauthorized,
            other => Self::Repository(other),
        }
    }
}
