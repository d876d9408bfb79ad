//! Canonical in-memory cart model.
//!
//! [`Cart`] holds the line items exactly as last loaded from the cart
//! repository, one line per product. Product attributes travel on each line
//! as a [`ProductSnapshot`] taken at read time, so display and validation
//! never reach back into a product service.
//!
//! Read access is public; mutation is crate-private. Only the sync
//! controller mutates the cart, which is what keeps optimistic updates,
//! reverts, and the selection-set invariant in one place.

use serde::{Deserialize, Serialize};
use vietmarket_core::{LineItemId, Price, ProductId, Quantity};

/// Product attributes captured when the cart was read.
///
/// All fields are fully resolved at the ingestion boundary
/// (`api::payloads`); downstream code never sees missing or duck-typed
/// fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    /// Product display name.
    pub name: String,
    /// Price per unit.
    pub unit_price: Price,
    /// Sale unit (e.g., "kg", "bó", "con").
    pub unit: String,
    /// Seller display name. Grouping key for the cart page.
    pub seller_name: String,
    /// Market stall / store display name.
    pub store_name: String,
    /// Whether the product is currently purchasable.
    pub is_available: bool,
    /// Tracked stock on hand. Zero means stock is untracked (unlimited).
    pub stock_quantity: Quantity,
    /// Minimum order quantity. Zero means no minimum.
    pub minimum_quantity: Quantity,
}

impl ProductSnapshot {
    /// Whether the seller tracks stock for this product.
    #[must_use]
    pub fn tracks_stock(&self) -> bool {
        !self.stock_quantity.is_zero()
    }

    /// Whether this product has a minimum order quantity.
    #[must_use]
    pub fn has_minimum(&self) -> bool {
        !self.minimum_quantity.is_zero()
    }
}

/// One cart line: a product, a quantity, and the product snapshot.
///
/// `id` identifies the cart line itself; `product_id` identifies the
/// product. The repository keys mutations by product, the UI keys them by
/// line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Cart-line identity.
    pub id: LineItemId,
    /// Product identity. Unique within a user's cart by server contract.
    pub product_id: ProductId,
    /// Quantity in the product's unit.
    pub quantity: Quantity,
    /// Product attributes at read time.
    pub product: ProductSnapshot,
}

impl CartItem {
    /// The line subtotal: `quantity × unit price`.
    #[must_use]
    pub fn line_subtotal(&self) -> Price {
        Price::new(
            self.quantity.amount() * self.product.unit_price.amount,
            self.product.unit_price.currency_code,
        )
    }
}

/// Ordered collection of cart lines, one per product.
///
/// Uniqueness of `product_id` is maintained by the repository; the model
/// trusts the server on that and preserves whatever order the server
/// returned.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// All line items, in server order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Find a line item by its line ID.
    #[must_use]
    pub fn find(&self, id: LineItemId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Whether a line with this ID is present.
    #[must_use]
    pub fn contains(&self, id: LineItemId) -> bool {
        self.find(id).is_some()
    }

    /// Number of line items (not summed quantity).
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no line items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// IDs of all line items, in order.
    pub fn line_ids(&self) -> impl Iterator<Item = LineItemId> + '_ {
        self.items.iter().map(|item| item.id)
    }

    /// Replace the entire cart with a fresh server read.
    pub(crate) fn replace_all(&mut self, items: Vec<CartItem>) {
        self.items = items;
    }

    /// Insert or replace a line item.
    ///
    /// A line for the same product replaces in place, preserving its
    /// position; otherwise the item is appended. This is how a canonical
    /// line echoed by the server lands in the cart.
    pub(crate) fn upsert(&mut self, item: CartItem) {
        match self
            .items
            .iter_mut()
            .find(|existing| existing.product_id == item.product_id)
        {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
    }

    /// Remove a line item, returning it and the position it held.
    pub(crate) fn remove_by_id(&mut self, id: LineItemId) -> Option<(usize, CartItem)> {
        let index = self.items.iter().position(|item| item.id == id)?;
        Some((index, self.items.remove(index)))
    }

    /// Re-insert a previously removed item at its old position.
    ///
    /// Used to revert an optimistic removal; the index is clamped in case
    /// the cart shrank while the call was in flight.
    pub(crate) fn insert_at(&mut self, index: usize, item: CartItem) {
        let index = index.min(self.items.len());
        self.items.insert(index, item);
    }

    /// Mutable access to a line item.
    pub(crate) fn find_mut(&mut self, id: LineItemId) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn snapshot(name: &str, seller: &str, price: i64) -> ProductSnapshot {
        ProductSnapshot {
            name: name.to_string(),
            unit_price: Price::vnd(Decimal::from(price)),
            unit: "kg".to_string(),
            seller_name: seller.to_string(),
            store_name: format!("Sạp {seller}"),
            is_available: true,
            stock_quantity: Quantity::ZERO,
            minimum_quantity: Quantity::ZERO,
        }
    }

    fn item(id: i64, product_id: i64, quantity: u32, price: i64) -> CartItem {
        CartItem {
            id: LineItemId::new(id),
            product_id: ProductId::new(product_id),
            quantity: Quantity::from_units(quantity),
            product: snapshot("Rau muống", "Cô Lan", price),
        }
    }

    #[test]
    fn test_line_subtotal() {
        let line = item(1, 10, 2, 10_000);
        assert_eq!(line.line_subtotal(), Price::vnd(Decimal::from(20_000)));
    }

    #[test]
    fn test_replace_all_keeps_server_order() {
        let mut cart = Cart::default();
        cart.replace_all(vec![item(2, 20, 1, 5_000), item(1, 10, 2, 10_000)]);

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.items()[0].product_id, ProductId::new(20));
        let line = cart.find(LineItemId::new(1)).expect("line 1");
        assert_eq!(line.quantity, Quantity::from_units(2));
    }

    #[test]
    fn test_upsert_replaces_by_product_in_place() {
        let mut cart = Cart::default();
        cart.replace_all(vec![item(1, 10, 1, 10_000), item(2, 20, 1, 5_000)]);
        // Same product again: replaces in place, order preserved
        cart.upsert(item(1, 10, 3, 10_000));
        cart.upsert(item(3, 30, 1, 8_000));

        assert_eq!(cart.len(), 3);
        let first = cart.find(LineItemId::new(1)).expect("line 1");
        assert_eq!(first.quantity, Quantity::from_units(3));
        assert_eq!(cart.items()[0].product_id, ProductId::new(10));
        assert_eq!(cart.items()[2].product_id, ProductId::new(30));
    }

    #[test]
    fn test_remove_and_reinsert_preserves_position() {
        let mut cart = Cart::default();
        cart.replace_all(vec![
            item(1, 10, 1, 10_000),
            item(2, 20, 1, 5_000),
            item(3, 30, 1, 8_000),
        ]);

        let (index, removed) = cart.remove_by_id(LineItemId::new(2)).expect("present");
        assert_eq!(index, 1);
        assert!(!cart.contains(LineItemId::new(2)));

        cart.insert_at(index, removed);
        let ids: Vec<i64> = cart.line_ids().map(|id| id.as_i64()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_insert_at_clamps_index() {
        let mut cart = Cart::default();
        cart.insert_at(5, item(1, 10, 1, 10_000));
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_snapshot_flags() {
        let mut product = snapshot("Cá rô", "Chú Ba", 40_000);
        assert!(!product.tracks_stock());
        assert!(!product.has_minimum());

        product.stock_quantity = Quantity::from_units(5);
        product.minimum_quantity = Quantity::from_units(1);
        assert!(product.tracks_stock());
        assert!(product.has_minimum());
    }
}
