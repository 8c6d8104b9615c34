//! Cart state manager.
//!
//! The cart is owned by the client until checkout. Every mutation runs
//! inside a single `watch::Sender::send_if_modified` call that updates the
//! lines and writes the full list to the store before releasing the lock, so
//! a mutation never interleaves with another and the persisted copy always
//! matches what subscribers see.
//!
//! Operations never fail. A write that cannot be persisted is logged and
//! the in-memory cart stays authoritative.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use emporium_core::{Price, ProductId};

use crate::models::CartItem;
use crate::models::session::keys;
use crate::store::KeyValueStore;

/// Cloneable handle to the local cart.
#[derive(Debug, Clone)]
pub struct CartManager {
    inner: Arc<CartInner>,
}

#[derive(Debug)]
struct CartInner {
    items: watch::Sender<Vec<CartItem>>,
    store: Arc<dyn KeyValueStore>,
}

impl CartManager {
    /// Restore the cart persisted in `store`.
    ///
    /// A missing or unparseable value yields an empty cart.
    #[must_use]
    pub fn restore(store: Arc<dyn KeyValueStore>) -> Self {
        let items = restore_items(store.as_ref());
        let (sender, _) = watch::channel(items);

        Self {
            inner: Arc::new(CartInner {
                items: sender,
                store,
            }),
        }
    }

    /// Add `quantity` units of a product.
    ///
    /// An existing line for the product has its quantity increased; its name
    /// and price snapshot are kept. Otherwise a new line is appended with the
    /// given snapshot. Adding zero units does nothing.
    pub fn add_item(
        &self,
        product_id: ProductId,
        name: impl Into<String>,
        unit_price: Price,
        quantity: u32,
    ) {
        if quantity == 0 {
            return;
        }
        let name = name.into();

        self.mutate(|items| {
            if let Some(item) = items.iter_mut().find(|i| i.product_id == product_id) {
                item.quantity = item.quantity.saturating_add(quantity);
            } else {
                items.push(CartItem {
                    product_id,
                    name,
                    unit_price,
                    quantity,
                });
            }
            true
        });
    }

    /// Remove a product's line. Removing an absent product does nothing.
    pub fn remove_item(&self, product_id: ProductId) {
        self.mutate(|items| remove_line(items, product_id));
    }

    /// Set a product's quantity.
    ///
    /// A quantity of zero or less removes the line. Unknown products are
    /// ignored.
    pub fn update_quantity(&self, product_id: ProductId, quantity: i64) {
        let Ok(quantity) = u32::try_from(quantity.max(0)) else {
            self.set_quantity(product_id, u32::MAX);
            return;
        };
        if quantity == 0 {
            self.remove_item(product_id);
        } else {
            self.set_quantity(product_id, quantity);
        }
    }

    /// Empty the cart.
    pub fn clear(&self) {
        self.mutate(|items| {
            let had_items = !items.is_empty();
            items.clear();
            had_items
        });
    }

    /// Take the quantities of `ordered` back out of the cart.
    ///
    /// Used after a successful checkout: lines added while the order was in
    /// flight stay, and a line whose quantity grew in the meantime keeps the
    /// difference.
    pub(crate) fn remove_ordered(&self, ordered: &[CartItem]) {
        self.mutate(|items| {
            let before = items.clone();
            for done in ordered {
                if let Some(line) = items.iter_mut().find(|i| i.product_id == done.product_id) {
                    line.quantity = line.quantity.saturating_sub(done.quantity);
                }
            }
            items.retain(|i| i.quantity > 0);
            *items != before
        });
    }

    /// Snapshot of the current lines, in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.inner.items.borrow().clone()
    }

    /// Sum of `unit_price * quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Price {
        self.inner.items.borrow().iter().map(CartItem::line_total).sum()
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.inner
            .items
            .borrow()
            .iter()
            .map(|i| u64::from(i.quantity))
            .sum()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.items.borrow().is_empty()
    }

    /// Watch for cart changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<CartItem>> {
        self.inner.items.subscribe()
    }

    fn set_quantity(&self, product_id: ProductId, quantity: u32) {
        self.mutate(|items| {
            items
                .iter_mut()
                .find(|i| i.product_id == product_id)
                .is_some_and(|item| {
                    let changed = item.quantity != quantity;
                    item.quantity = quantity;
                    changed
                })
        });
    }

    /// Apply `op`; when it reports a change, persist the result before the
    /// lock is released.
    fn mutate(&self, op: impl FnOnce(&mut Vec<CartItem>) -> bool) {
        let store = &self.inner.store;
        self.inner.items.send_if_modified(|items| {
            let changed = op(items);
            if changed {
                persist(store.as_ref(), items);
            }
            changed
        });
    }
}

fn remove_line(items: &mut Vec<CartItem>, product_id: ProductId) -> bool {
    let before = items.len();
    items.retain(|i| i.product_id != product_id);
    items.len() != before
}

fn restore_items(store: &dyn KeyValueStore) -> Vec<CartItem> {
    let Some(raw) = store.get(keys::CART) else {
        return Vec::new();
    };

    match serde_json::from_str::<Vec<CartItem>>(&raw) {
        Ok(items) => reconcile(items),
        Err(e) => {
            warn!(
                error = %e,
                bytes = raw.len(),
                "Discarding unreadable persisted cart"
            );
            Vec::new()
        }
    }
}

/// Re-establish the line invariants on data written by older or foreign
/// code: one line per product (quantities merged, first snapshot kept) and
/// no zero-quantity lines.
fn reconcile(items: Vec<CartItem>) -> Vec<CartItem> {
    let loaded = items.len();
    let mut merged: Vec<CartItem> = Vec::with_capacity(loaded);

    for item in items.into_iter().filter(|i| i.quantity > 0) {
        if let Some(existing) = merged.iter_mut().find(|m| m.product_id == item.product_id) {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
        } else {
            merged.push(item);
        }
    }

    if merged.len() == loaded {
        debug!(lines = loaded, "Restored persisted cart");
    } else {
        warn!(
            loaded,
            kept = merged.len(),
            "Reconciled duplicate or empty lines in persisted cart"
        );
    }
    merged
}

fn persist(store: &dyn KeyValueStore, items: &[CartItem]) {
    let encoded = match serde_json::to_string(items) {
        Ok(encoded) => encoded,
        Err(e) => {
            warn!(error = %e, "Failed to encode cart");
            return;
        }
    };
    if let Err(e) = store.set(keys::CART, &encoded) {
        warn!(error = %e, "Failed to persist cart");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn price(s: &str) -> Price {
        s.parse().unwrap()
    }

    fn empty_cart() -> (CartManager, Arc<dyn KeyValueStore>) {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        (CartManager::restore(Arc::clone(&store)), store)
    }

    #[test]
    fn test_repeated_add_increments_single_line() {
        let (cart, _) = empty_cart();
        cart.add_item(ProductId::new(1), "Widget", price("9.99"), 1);
        cart.add_item(ProductId::new(1), "Widget", price("9.99"), 2);

        let items = cart.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 3);
        assert_eq!(cart.total(), price("29.97"));
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_repeated_add_keeps_first_snapshot() {
        let (cart, _) = empty_cart();
        cart.add_item(ProductId::new(1), "Widget", price("9.99"), 1);
        cart.add_item(ProductId::new(1), "Widget v2", price("12.00"), 1);

        let items = cart.items();
        assert_eq!(items[0].name, "Widget");
        assert_eq!(items[0].unit_price, price("9.99"));
    }

    #[test]
    fn test_add_zero_is_noop() {
        let (cart, store) = empty_cart();
        cart.add_item(ProductId::new(1), "Widget", price("9.99"), 0);
        assert!(cart.is_empty());
        assert_eq!(store.get(keys::CART), None);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let (cart, _) = empty_cart();
        cart.add_item(ProductId::new(1), "Widget", price("9.99"), 1);
        cart.remove_item(ProductId::new(2));
        assert_eq!(cart.items().len(), 1);
    }

    #[test]
    fn test_update_to_zero_or_negative_removes() {
        for quantity in [0, -1, i64::MIN] {
            let (cart, _) = empty_cart();
            cart.add_item(ProductId::new(1), "Widget", price("9.99"), 4);
            cart.add_item(ProductId::new(2), "Gadget", price("1.50"), 1);
            cart.update_quantity(ProductId::new(1), quantity);

            let (reference, _) = empty_cart();
            reference.add_item(ProductId::new(1), "Widget", price("9.99"), 4);
            reference.add_item(ProductId::new(2), "Gadget", price("1.50"), 1);
            reference.remove_item(ProductId::new(1));

            assert_eq!(cart.items(), reference.items(), "quantity {quantity}");
        }
    }

    #[test]
    fn test_update_sets_absolute_quantity() {
        let (cart, _) = empty_cart();
        cart.add_item(ProductId::new(1), "Widget", price("2.00"), 4);
        cart.update_quantity(ProductId::new(1), 2);
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.total(), price("4.00"));

        cart.update_quantity(ProductId::new(9), 5);
        assert_eq!(cart.items().len(), 1);
    }

    #[test]
    fn test_update_clamps_huge_quantity() {
        let (cart, _) = empty_cart();
        cart.add_item(ProductId::new(1), "Widget", price("1.00"), 1);
        cart.update_quantity(ProductId::new(1), i64::MAX);
        assert_eq!(cart.items()[0].quantity, u32::MAX);
    }

    #[test]
    fn test_lines_stay_unique_across_mixed_operations() {
        let (cart, _) = empty_cart();
        let ops: [(i64, i64); 10] = [
            (1, 2),
            (2, 1),
            (1, 1),
            (3, 5),
            (2, 0),
            (1, -3),
            (2, 4),
            (3, 1),
            (1, 1),
            (2, 2),
        ];
        for (step, (pid, qty)) in ops.into_iter().enumerate() {
            let id = ProductId::new(pid);
            match step % 3 {
                0 => cart.add_item(id, "p", price("1.00"), u32::try_from(qty.max(1)).unwrap()),
                1 => cart.update_quantity(id, qty),
                _ => cart.remove_item(id),
            }
            let items = cart.items();
            let mut ids: Vec<_> = items.iter().map(|i| i.product_id).collect();
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), items.len());
            assert!(items.iter().all(|i| i.quantity >= 1));
            let expected: u64 = items.iter().map(|i| u64::from(i.quantity)).sum();
            assert_eq!(cart.item_count(), expected);
        }
    }

    #[test]
    fn test_persist_restore_round_trip() {
        let (cart, store) = empty_cart();
        cart.add_item(ProductId::new(3), "Gizmo", price("0.10"), 7);
        cart.add_item(ProductId::new(1), "Widget", price("9.99"), 1);
        cart.add_item(ProductId::new(2), "Gadget", price("100"), 2);

        let restored = CartManager::restore(store);
        assert_eq!(restored.items(), cart.items());
        assert_eq!(restored.total(), cart.total());
    }

    #[test]
    fn test_clear_persists_empty_list() {
        let (cart, store) = empty_cart();
        cart.add_item(ProductId::new(1), "Widget", price("9.99"), 1);
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(store.get(keys::CART).as_deref(), Some("[]"));
    }

    #[test]
    fn test_corrupt_persisted_cart_restores_empty() {
        for raw in ["{not json", "42", r#"[{"productId":"x"}]"#] {
            let store: Arc<dyn KeyValueStore> =
                Arc::new(MemoryStore::with_entries([(keys::CART, raw)]));
            let cart = CartManager::restore(store);
            assert!(cart.is_empty(), "raw {raw}");
            assert_eq!(cart.total(), Price::ZERO);
        }
    }

    #[test]
    fn test_restore_reconciles_duplicates_and_zero_lines() {
        let raw = r#"[
            {"productId":1,"name":"Widget","price":9.99,"quantity":1},
            {"productId":2,"name":"Gadget","unitPrice":"1.50","quantity":0},
            {"productId":1,"name":"Widget","price":9.99,"quantity":2}
        ]"#;
        let store: Arc<dyn KeyValueStore> =
            Arc::new(MemoryStore::with_entries([(keys::CART, raw)]));
        let cart = CartManager::restore(store);

        let items = cart.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 3);
        assert_eq!(cart.total(), price("29.97"));
    }

    #[test]
    fn test_restored_extreme_prices_total_without_overflow() {
        let raw = r#"[
            {"productId":1,"name":"Widget","unitPrice":"79228162514264337593543950335","quantity":2},
            {"productId":2,"name":"Gadget","unitPrice":"79228162514264337593543950335","quantity":1}
        ]"#;
        let store: Arc<dyn KeyValueStore> =
            Arc::new(MemoryStore::with_entries([(keys::CART, raw)]));
        let cart = CartManager::restore(store);

        assert_eq!(cart.items().len(), 2);
        let max = price("79228162514264337593543950335");
        assert_eq!(cart.items()[0].line_total(), max);
        assert_eq!(cart.total(), max);
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_remove_ordered_keeps_later_additions() {
        let (cart, store) = empty_cart();
        cart.add_item(ProductId::new(1), "Widget", price("9.99"), 2);
        cart.add_item(ProductId::new(2), "Gadget", price("5.00"), 1);
        let ordered = cart.items();

        cart.add_item(ProductId::new(1), "Widget", price("9.99"), 1);
        cart.add_item(ProductId::new(3), "Gizmo", price("2.50"), 4);
        cart.remove_ordered(&ordered);

        let left: Vec<(i64, u32)> = cart
            .items()
            .iter()
            .map(|i| (i.product_id.as_i64(), i.quantity))
            .collect();
        assert_eq!(left, vec![(1, 1), (3, 4)]);
        let restored = CartManager::restore(store);
        assert_eq!(restored.items(), cart.items());
    }

    #[test]
    fn test_cart_does_not_touch_session_keys() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::with_entries([
            (keys::CREDENTIAL, "tok"),
            (keys::IDENTITY, "{}"),
        ]));
        let cart = CartManager::restore(Arc::clone(&store));
        cart.add_item(ProductId::new(1), "Widget", price("1.00"), 1);
        cart.clear();

        assert_eq!(store.get(keys::CREDENTIAL).as_deref(), Some("tok"));
        assert_eq!(store.get(keys::IDENTITY).as_deref(), Some("{}"));
    }

    #[tokio::test]
    async fn test_subscribers_observe_mutations() {
        let (cart, _) = empty_cart();
        let mut rx = cart.subscribe();

        cart.add_item(ProductId::new(1), "Widget", price("9.99"), 1);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().len(), 1);

        cart.remove_item(ProductId::new(42));
        assert!(!rx.has_changed().unwrap());
    }
}
