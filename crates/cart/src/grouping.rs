//! Seller grouping engine.
//!
//! Pure derivation from the cart model: line items grouped by seller
//! display name, in first-appearance order, with per-group aggregates. The
//! cart page renders one section per group.
//!
//! The grouping key is the *display* name, not a normalized seller ID, so
//! two distinct sellers sharing a display name collide into one group. A
//! known limitation of the upstream data model, kept as-is.

use indexmap::IndexMap;
use vietmarket_core::{Price, Quantity};

use crate::model::{Cart, CartItem};

/// Line items of a single seller, with aggregates.
#[derive(Debug, Clone, PartialEq)]
pub struct SellerGroup {
    /// Seller display name.
    pub seller_name: String,
    /// The seller's line items, in cart order.
    pub items: Vec<CartItem>,
    /// Sum of line subtotals.
    pub subtotal: Price,
    /// Sum of line quantities.
    pub item_count: Quantity,
}

/// Group a cart's line items by seller display name.
///
/// Single O(n) pass; seller order follows the first line item seen for
/// each seller, item order within a group follows the cart. Recomputed on
/// every cart change - carts hold tens of items, caching would be noise.
#[must_use]
pub fn group_by_seller(cart: &Cart) -> IndexMap<String, SellerGroup> {
    let mut groups: IndexMap<String, SellerGroup> = IndexMap::new();

    for item in cart.items() {
        let group = groups
            .entry(item.product.seller_name.clone())
            .or_insert_with(|| SellerGroup {
                seller_name: item.product.seller_name.clone(),
                items: Vec::new(),
                subtotal: Price::zero(),
                item_count: Quantity::ZERO,
            });

        group.subtotal.amount += item.line_subtotal().amount;
        group.item_count += item.quantity;
        group.items.push(item.clone());
    }

    groups
}
