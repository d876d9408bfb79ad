//! Cart sync controller.
//!
//! The one owner of the cart model. Everything else reads snapshots;
//! every mutation funnels through here so optimistic apply, revert,
//! the selection-set invariant, and the snapshot cache stay coherent.
//!
//! Per line item the controller runs an Idle/Updating state machine:
//! a mutation marks its line in flight, applies the expected effect
//! locally, awaits the repository, then either keeps the result
//! (reconciling any canonical fields the server echoed) or reverts to the
//! pre-mutation state. While a line is in flight, further mutations on
//! the *same* line are rejected, not queued; mutations on other lines may
//! proceed and complete in any order.
//!
//! Bulk removals fan out one repository call per line concurrently and
//! fan the results back in. A partial outcome applies the successful
//! removals and then forces a full refetch, because nothing can be
//! assumed about completion order or about server-side effects of the
//! failed calls.
//!
//! Locking: state sits behind a [`parking_lot::Mutex`] that is never held
//! across an await. Repository calls are the only suspension points.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::{instrument, warn};
use vietmarket_core::{LineItemId, ProductId, Quantity, UserId};

use crate::cache::{CartSnapshot, SnapshotCache};
use crate::constraints::{QuantityRuling, validate};
use crate::error::{CartError, Result};
use crate::grouping::{SellerGroup, group_by_seller};
use crate::model::{Cart, CartItem};
use crate::repository::{CartRepository, CartSummary, RepositoryError};
use crate::selection::SelectionSet;
use crate::totals::{CheckoutTotals, FulfillmentMethod, compute_totals};

/// What a successful single mutation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The line's quantity changed.
    Updated { id: LineItemId, quantity: Quantity },
    /// The line was removed (explicitly, or by stepping down to zero).
    Removed { id: LineItemId },
}

/// Result of a bulk removal where every call succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkRemoval {
    /// Number of lines removed.
    pub removed: usize,
}

#[derive(Default)]
struct CartState {
    cart: Cart,
    selection: SelectionSet,
    in_flight: HashSet<LineItemId>,
    cache: SnapshotCache,
}

enum PreparedUpdate {
    Remove,
    Update {
        product_id: ProductId,
        previous: Quantity,
    },
}

/// Orchestrates local cart state against the remote cart repository.
pub struct CartSyncController {
    user_id: UserId,
    repository: Arc<dyn CartRepository>,
    state: Mutex<CartState>,
}

impl CartSyncController {
    /// Create a controller for a user's cart. The cart starts empty; call
    /// [`refresh`](Self::refresh) on page mount.
    #[must_use]
    pub fn new(user_id: UserId, repository: Arc<dyn CartRepository>) -> Self {
        Self {
            user_id,
            repository,
            state: Mutex::new(CartState::default()),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Snapshot of the current line items.
    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.state.lock().cart.items().to_vec()
    }

    /// Whether the cart has no line items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().cart.is_empty()
    }

    /// Line items grouped by seller, in display order.
    #[must_use]
    pub fn seller_groups(&self) -> IndexMap<String, SellerGroup> {
        group_by_seller(&self.state.lock().cart)
    }

    /// Checkout totals for the whole cart under a fulfillment method.
    #[must_use]
    pub fn totals(&self, method: FulfillmentMethod) -> CheckoutTotals {
        compute_totals(&self.state.lock().cart, method)
    }

    /// Whether a mutation for this line is currently in flight.
    #[must_use]
    pub fn is_updating(&self, id: LineItemId) -> bool {
        self.state.lock().in_flight.contains(&id)
    }

    /// The current snapshot-cache entry, if any. Non-authoritative; good
    /// for first paint only.
    #[must_use]
    pub fn cached_snapshot(&self) -> Option<CartSnapshot> {
        self.state.lock().cache.get().cloned()
    }

    /// Seed the snapshot cache from persisted state, e.g. on page mount.
    pub fn prime_cache(&self, snapshot: CartSnapshot) {
        self.state.lock().cache.prime(snapshot);
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Toggle a line item's selection, returning the new state.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotFound`] if the line is not in the cart.
    pub fn toggle_selected(&self, id: LineItemId) -> Result<bool> {
        let mut state = self.state.lock();
        if !state.cart.contains(id) {
            return Err(CartError::NotFound(id));
        }
        Ok(state.selection.toggle(id))
    }

    /// Select every line item currently in the cart.
    pub fn select_all(&self) {
        let mut state = self.state.lock();
        let ids: Vec<LineItemId> = state.cart.line_ids().collect();
        state.selection.select_all(ids);
    }

    /// Deselect everything.
    pub fn clear_selection(&self) {
        self.state.lock().selection.clear();
    }

    /// Whether a line item is selected.
    #[must_use]
    pub fn is_selected(&self, id: LineItemId) -> bool {
        self.state.lock().selection.is_selected(id)
    }

    /// Number of selected line items.
    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.state.lock().selection.selected_count()
    }

    // =========================================================================
    // Fetch
    // =========================================================================

    /// Replace local state with a fresh server read.
    ///
    /// Also the resync primitive after a partial bulk failure. Drops any
    /// selection whose line is gone and overwrites the snapshot cache.
    ///
    /// # Errors
    ///
    /// Returns the mapped repository error; local state is untouched on
    /// failure.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<()> {
        let items = self
            .repository
            .cart_items(self.user_id)
            .await
            .map_err(CartError::from_repository)?;

        let mut state = self.state.lock();
        let CartState {
            cart,
            selection,
            cache,
            ..
        } = &mut *state;
        cart.replace_all(items);
        selection.retain_present(cart);
        cache.store(cart.items());
        Ok(())
    }

    /// Badge summary straight from the repository.
    ///
    /// # Errors
    ///
    /// Returns the mapped repository error.
    pub async fn summary(&self) -> Result<CartSummary> {
        self.repository
            .summary(self.user_id)
            .await
            .map_err(CartError::from_repository)
    }

    // =========================================================================
    // Single mutations
    // =========================================================================

    /// Raise a line's quantity by one step.
    ///
    /// # Errors
    ///
    /// See [`set_quantity`](Self::set_quantity).
    pub async fn increment(&self, id: LineItemId) -> Result<MutationOutcome> {
        let requested = {
            let state = self.state.lock();
            let item = state.cart.find(id).ok_or(CartError::NotFound(id))?;
            item.quantity.stepped_up()
        };
        self.set_quantity(id, requested).await
    }

    /// Lower a line's quantity by one step. Stepping down to zero removes
    /// the line.
    ///
    /// # Errors
    ///
    /// See [`set_quantity`](Self::set_quantity).
    pub async fn decrement(&self, id: LineItemId) -> Result<MutationOutcome> {
        let requested = {
            let state = self.state.lock();
            let item = state.cart.find(id).ok_or(CartError::NotFound(id))?;
            item.quantity.stepped_down()
        };
        self.set_quantity(id, requested).await
    }

    /// Set a line's quantity, optimistically.
    ///
    /// Validates locally first; a rejected request never reaches the
    /// network and never changes state. A requested quantity of zero is a
    /// removal. On repository failure the optimistic change is reverted.
    ///
    /// # Errors
    ///
    /// [`CartError::NotFound`] if the line is gone locally,
    /// [`CartError::Constraint`] on a validation rejection,
    /// [`CartError::UpdateInFlight`] while this line has a mutation in
    /// flight, or the mapped repository error after revert.
    #[instrument(skip(self))]
    pub async fn set_quantity(&self, id: LineItemId, requested: Quantity) -> Result<MutationOutcome> {
        let prepared = {
            let mut state = self.state.lock();
            let ruling = {
                let item = state.cart.find(id).ok_or(CartError::NotFound(id))?;
                validate(item, requested)
            };
            match ruling {
                QuantityRuling::Remove => PreparedUpdate::Remove,
                QuantityRuling::Reject(violation) => return Err(violation.into()),
                QuantityRuling::Accept(quantity) => {
                    if !state.in_flight.insert(id) {
                        return Err(CartError::UpdateInFlight(id));
                    }
                    let item = state.cart.find_mut(id).ok_or(CartError::NotFound(id))?;
                    let previous = item.quantity;
                    item.quantity = quantity;
                    PreparedUpdate::Update {
                        product_id: item.product_id,
                        previous,
                    }
                }
            }
        };

        let (product_id, previous) = match prepared {
            PreparedUpdate::Remove => return self.remove_item(id).await,
            PreparedUpdate::Update {
                product_id,
                previous,
            } => (product_id, previous),
        };

        let result = self
            .repository
            .update_item(self.user_id, product_id, requested)
            .await;

        let mut state = self.state.lock();
        state.in_flight.remove(&id);
        match result {
            Ok(canonical) => {
                let mut applied = requested;
                if let Some(line) = canonical {
                    // Adopt the canonical line the server echoed back
                    applied = line.quantity;
                    state.cart.upsert(line);
                }
                let items = state.cart.items().to_vec();
                state.cache.store(&items);
                Ok(MutationOutcome::Updated {
                    id,
                    quantity: applied,
                })
            }
            Err(err) => {
                if let Some(item) = state.cart.find_mut(id) {
                    item.quantity = previous;
                }
                Err(CartError::from_repository(err))
            }
        }
    }

    /// Remove a single line, optimistically.
    ///
    /// The line (and its selection) disappears immediately and is restored
    /// at its old position if the repository call fails. A server-side
    /// `NotFound` counts as success - the delete is idempotent.
    ///
    /// # Errors
    ///
    /// [`CartError::NotFound`], [`CartError::UpdateInFlight`], or the
    /// mapped repository error after the revert.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, id: LineItemId) -> Result<MutationOutcome> {
        let (product_id, index, removed, was_selected) = {
            let mut state = self.state.lock();
            if !state.cart.contains(id) {
                return Err(CartError::NotFound(id));
            }
            if !state.in_flight.insert(id) {
                return Err(CartError::UpdateInFlight(id));
            }
            let (index, removed) = match state.cart.remove_by_id(id) {
                Some(entry) => entry,
                None => {
                    state.in_flight.remove(&id);
                    return Err(CartError::NotFound(id));
                }
            };
            let was_selected = state.selection.remove(id);
            (removed.product_id, index, removed, was_selected)
        };

        let result = self.repository.remove_item(self.user_id, product_id).await;

        let mut state = self.state.lock();
        state.in_flight.remove(&id);
        match result {
            Ok(()) | Err(RepositoryError::NotFound(_)) => {
                let items = state.cart.items().to_vec();
                state.cache.store(&items);
                Ok(MutationOutcome::Removed { id })
            }
            Err(err) => {
                state.cart.insert_at(index, removed);
                if was_selected {
                    state.selection.insert(id);
                }
                Err(CartError::from_repository(err))
            }
        }
    }

    // =========================================================================
    // Bulk mutations
    // =========================================================================

    /// Remove every selected line item.
    ///
    /// # Errors
    ///
    /// [`CartError::UpdateInFlight`] if any target already has a mutation
    /// in flight, [`CartError::PartialBulkFailure`] when only some calls
    /// succeeded (after resync), or the mapped repository error when none
    /// did.
    #[instrument(skip(self))]
    pub async fn remove_selected(&self) -> Result<BulkRemoval> {
        let targets = {
            let state = self.state.lock();
            state
                .cart
                .items()
                .iter()
                .filter(|item| state.selection.is_selected(item.id))
                .map(|item| (item.id, item.product_id))
                .collect::<Vec<_>>()
        };
        self.remove_many(targets).await
    }

    /// Remove every line item belonging to a seller group.
    ///
    /// # Errors
    ///
    /// Same as [`remove_selected`](Self::remove_selected).
    #[instrument(skip(self))]
    pub async fn clear_seller_group(&self, seller_name: &str) -> Result<BulkRemoval> {
        let targets = {
            let state = self.state.lock();
            state
                .cart
                .items()
                .iter()
                .filter(|item| item.product.seller_name == seller_name)
                .map(|item| (item.id, item.product_id))
                .collect::<Vec<_>>()
        };
        self.remove_many(targets).await
    }

    /// Remove the whole cart with a single repository call.
    ///
    /// # Errors
    ///
    /// [`CartError::UpdateInFlight`] while any mutation is in flight, or
    /// the mapped repository error (local state untouched).
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<()> {
        {
            let state = self.state.lock();
            if let Some(id) = state.in_flight.iter().next() {
                return Err(CartError::UpdateInFlight(*id));
            }
        }

        self.repository
            .clear(self.user_id)
            .await
            .map_err(CartError::from_repository)?;

        let mut state = self.state.lock();
        state.cart.replace_all(Vec::new());
        state.selection.clear();
        state.cache.store(&[]);
        Ok(())
    }

    /// Fan out one removal call per target, fan the results back in.
    ///
    /// All success: apply removals, done. Partial: apply the successes,
    /// then force a full refetch to eliminate drift. Zero: refetch to be
    /// safe against partial server-side effects, then surface the first
    /// failure.
    async fn remove_many(&self, targets: Vec<(LineItemId, ProductId)>) -> Result<BulkRemoval> {
        if targets.is_empty() {
            return Ok(BulkRemoval { removed: 0 });
        }

        {
            let mut state = self.state.lock();
            for (id, _) in &targets {
                if state.in_flight.contains(id) {
                    return Err(CartError::UpdateInFlight(*id));
                }
            }
            for (id, _) in &targets {
                state.in_flight.insert(*id);
            }
        }

        let user_id = self.user_id;
        let calls = targets.iter().map(|&(line_id, product_id)| {
            let repository = Arc::clone(&self.repository);
            async move { (line_id, repository.remove_item(user_id, product_id).await) }
        });
        let results = join_all(calls).await;

        let total = results.len();
        let mut succeeded = 0usize;
        let mut first_failure: Option<RepositoryError> = None;
        {
            let mut state = self.state.lock();
            for (id, _) in &targets {
                state.in_flight.remove(id);
            }
            for (id, result) in results {
                match result {
                    Ok(()) | Err(RepositoryError::NotFound(_)) => {
                        state.cart.remove_by_id(id);
                        state.selection.remove(id);
                        succeeded += 1;
                    }
                    Err(err) => {
                        if first_failure.is_none() {
                            first_failure = Some(err);
                        }
                    }
                }
            }
            if succeeded == total {
                let items = state.cart.items().to_vec();
                state.cache.store(&items);
            }
        }

        if succeeded == total {
            return Ok(BulkRemoval { removed: total });
        }

        if let Err(err) = self.refresh().await {
            warn!(error = %err, "resync after bulk removal failure also failed");
        }

        if succeeded == 0 {
            let failure = first_failure
                .unwrap_or_else(|| RepositoryError::Transport("bulk removal failed".to_string()));
            Err(CartError::from_repository(failure))
        } else {
            Err(CartError::PartialBulkFailure { succeeded, total })
        }
    }
}
