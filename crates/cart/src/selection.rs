//! Multi-select set for bulk cart actions.
//!
//! Page-session UI state: which line items are checked. Never persisted.
//! The set is always a subset of the line IDs currently in the cart; the
//! sync controller calls [`SelectionSet::retain_present`] after every cart
//! change so a stale selection is never observable.

use std::collections::HashSet;

use vietmarket_core::LineItemId;

use crate::model::Cart;

/// The set of checked line items.
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    ids: HashSet<LineItemId>,
}

impl SelectionSet {
    /// Toggle a line item, returning whether it is selected afterwards.
    pub fn toggle(&mut self, id: LineItemId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    /// Replace the selection with the given line IDs.
    pub fn select_all(&mut self, ids: impl IntoIterator<Item = LineItemId>) {
        self.ids = ids.into_iter().collect();
    }

    /// Deselect everything.
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Whether a line item is selected.
    #[must_use]
    pub fn is_selected(&self, id: LineItemId) -> bool {
        self.ids.contains(&id)
    }

    /// Number of selected line items.
    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Drop one id, e.g. when its line item leaves the cart.
    pub(crate) fn remove(&mut self, id: LineItemId) -> bool {
        self.ids.remove(&id)
    }

    /// Re-add an id when an optimistic removal is reverted.
    pub(crate) fn insert(&mut self, id: LineItemId) {
        self.ids.insert(id);
    }

    /// Drop every id that is no longer present in the cart.
    pub(crate) fn retain_present(&mut self, cart: &Cart) {
        self.ids.retain(|id| cart.contains(*id));
    }
}
