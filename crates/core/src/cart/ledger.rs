//! The cart ledger: merge, adjust and remove lines over a persisted snapshot.

use crate::types::VariantId;

use super::codec::{decode_snapshot, encode_snapshot};
use super::line_item::{LineItem, NewLineItem};
use super::storage::{CartStorage, StorageError};

/// Authoritative list of cart lines for one client.
///
/// Every mutation runs synchronously to completion: it edits the in-memory
/// lines, rewrites the whole snapshot to storage, and returns the new lines.
/// No operation fails. A rejected write is logged, kept in
/// [`CartLedger::write_error`] for the caller to surface, and otherwise
/// ignored; the in-memory lines stay authoritative for the rest of the
/// request.
#[derive(Debug)]
pub struct CartLedger<S> {
    storage: S,
    items: Vec<LineItem>,
    write_error: Option<StorageError>,
}

impl<S: CartStorage> CartLedger<S> {
    /// Open the ledger over `storage`, loading whatever snapshot it holds.
    pub fn open(storage: S) -> Self {
        let mut ledger = Self {
            storage,
            items: Vec::new(),
            write_error: None,
        };
        ledger.load();
        ledger
    }

    /// Re-read the persisted snapshot, replacing the in-memory lines.
    ///
    /// An absent or undecodable snapshot loads as an empty cart.
    pub fn load(&mut self) -> &[LineItem] {
        self.items = self
            .storage
            .read()
            .map(|raw| decode_snapshot(&raw))
            .unwrap_or_default();
        &self.items
    }

    /// Current lines, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add a line, merging into an existing line with the same product and
    /// size.
    ///
    /// On merge only the quantity changes; the existing line keeps its
    /// variant id, title and image. A zero quantity is not a valid addition
    /// and leaves the cart untouched.
    pub fn add(&mut self, item: NewLineItem) -> &[LineItem] {
        if item.quantity == 0 {
            tracing::debug!(variant_id = %item.variant_id, "Ignoring add with zero quantity");
            return &self.items;
        }

        if let Some(existing) = self.items.iter_mut().find(|line| line.same_purchase(&item)) {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
        } else {
            self.items.push(item.into());
        }

        self.persist();
        &self.items
    }

    /// Increment the quantity of the line with `variant_id`.
    pub fn increase(&mut self, variant_id: &VariantId) -> &[LineItem] {
        for line in self.items.iter_mut().filter(|l| &l.variant_id == variant_id) {
            line.quantity = line.quantity.saturating_add(1);
        }

        self.persist();
        &self.items
    }

    /// Decrement the quantity of the line with `variant_id`, never below 1.
    ///
    /// A line at 1 stays at 1; use [`CartLedger::remove`] to drop it. After
    /// adjusting, any line left at zero or less is dropped, which only
    /// happens for lines that were stored with quantity 0.
    pub fn decrease(&mut self, variant_id: &VariantId) -> &[LineItem] {
        for line in self.items.iter_mut().filter(|l| &l.variant_id == variant_id) {
            line.quantity = match line.quantity.checked_sub(1) {
                Some(0) => 1,
                Some(quantity) => quantity,
                // 0 - 1 goes negative; mark for removal below.
                None => 0,
            };
        }
        self.items.retain(|line| line.quantity > 0);

        self.persist();
        &self.items
    }

    /// Drop the line with `variant_id`, whatever its quantity.
    pub fn remove(&mut self, variant_id: &VariantId) -> &[LineItem] {
        self.items.retain(|line| &line.variant_id != variant_id);

        self.persist();
        &self.items
    }

    /// Empty the cart.
    pub fn clear(&mut self) -> &[LineItem] {
        self.items.clear();

        self.persist();
        &self.items
    }

    /// The error from the most recent write, if it was rejected.
    #[must_use]
    pub const fn write_error(&self) -> Option<&StorageError> {
        self.write_error.as_ref()
    }

    /// Borrow the storage backing this ledger.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Give back the storage, e.g. to emit the pending cookie.
    pub fn into_storage(self) -> S {
        self.storage
    }

    fn persist(&mut self) {
        let result = encode_snapshot(&self.items)
            .map_err(|e| StorageError::Encode(e.to_string()))
            .and_then(|snapshot| self.storage.write(&snapshot));

        match result {
            Ok(()) => self.write_error = None,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    lines = self.items.len(),
                    "Cart snapshot was not persisted"
                );
                self.write_error = Some(e);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::MemoryStorage;
    use crate::types::ProductId;

    fn new_item(product: &str, size: &str, variant: &str, quantity: u32) -> NewLineItem {
        NewLineItem {
            product_id: ProductId::new(product),
            title: format!("{product} title"),
            image: format!("{product}.png"),
            variant_id: VariantId::new(variant),
            size: size.to_string(),
            quantity,
        }
    }

    fn quantities<S: CartStorage>(ledger: &CartLedger<S>) -> Vec<(String, u32)> {
        ledger
            .items()
            .iter()
            .map(|l| (l.variant_id.to_string(), l.quantity))
            .collect()
    }

    #[test]
    fn test_open_on_empty_storage_is_empty() {
        let ledger = CartLedger::open(MemoryStorage::new());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_add_merges_on_product_and_size_first_write_wins() {
        let mut ledger = CartLedger::open(MemoryStorage::new());

        ledger.add(new_item("p1", "M", "v1", 2));
        let mut second = new_item("p1", "M", "v9", 3);
        second.title = "renamed".to_string();
        second.image = "other.png".to_string();
        let items = ledger.add(second);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 5);
        assert_eq!(items[0].variant_id.as_str(), "v1");
        assert_eq!(items[0].title, "p1 title");
        assert_eq!(items[0].image, "p1.png");
    }

    #[test]
    fn test_add_with_distinct_product_or_size_appends() {
        let mut ledger = CartLedger::open(MemoryStorage::new());

        ledger.add(new_item("p1", "M", "v1", 1));
        // Same variant id, different size: still a new line.
        ledger.add(new_item("p1", "L", "v1", 1));
        // Same size, different product, colliding variant id.
        ledger.add(new_item("p2", "M", "v1", 1));

        assert_eq!(ledger.items().len(), 3);
        assert!(ledger.items().iter().all(|l| l.quantity == 1));
    }

    #[test]
    fn test_add_zero_quantity_is_ignored() {
        let storage = MemoryStorage::new();
        let mut ledger = CartLedger::open(storage.clone());

        ledger.add(new_item("p1", "M", "v1", 0));

        assert!(ledger.is_empty());
        assert_eq!(storage.read(), None);
    }

    #[test]
    fn test_increase_unknown_variant_is_noop() {
        let mut ledger = CartLedger::open(MemoryStorage::new());
        ledger.add(new_item("p1", "M", "v1", 1));

        let before = ledger.items().to_vec();
        let after = ledger.increase(&VariantId::new("missing")).to_vec();

        assert_eq!(before, after);
    }

    #[test]
    fn test_decrease_floors_at_one() {
        let mut ledger = CartLedger::open(MemoryStorage::new());
        ledger.add(new_item("p1", "M", "v1", 2));

        ledger.decrease(&VariantId::new("v1"));
        assert_eq!(quantities(&ledger), vec![("v1".to_string(), 1)]);

        ledger.decrease(&VariantId::new("v1"));
        assert_eq!(quantities(&ledger), vec![("v1".to_string(), 1)]);
    }

    #[test]
    fn test_decrease_drops_lines_stored_at_zero() {
        let raw = r#"[
            {"productId":"p1","title":"A","image":"a","variantId":"v1","size":"M","quantity":0},
            {"productId":"p2","title":"B","image":"b","variantId":"v2","size":"M","quantity":0},
            {"productId":"p3","title":"C","image":"c","variantId":"v3","size":"M","quantity":3}
        ]"#;
        let mut ledger = CartLedger::open(MemoryStorage::seeded(raw));
        assert_eq!(ledger.items().len(), 3);

        // The sweep after adjusting drops every zero line, not just the target.
        ledger.decrease(&VariantId::new("v1"));

        assert_eq!(quantities(&ledger), vec![("v3".to_string(), 3)]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut ledger = CartLedger::open(MemoryStorage::new());
        ledger.add(new_item("p1", "M", "v1", 1));
        ledger.add(new_item("p2", "S", "v2", 4));

        let unchanged = ledger.remove(&VariantId::new("nope")).to_vec();
        assert_eq!(unchanged.len(), 2);

        let once = ledger.remove(&VariantId::new("v2")).to_vec();
        let twice = ledger.remove(&VariantId::new("v2")).to_vec();
        assert_eq!(once, twice);
        assert_eq!(quantities(&ledger), vec![("v1".to_string(), 1)]);
    }

    #[test]
    fn test_load_returns_last_mutation_snapshot() {
        let storage = MemoryStorage::new();
        let mut ledger = CartLedger::open(storage.clone());

        ledger.add(new_item("p1", "M", "v1", 1));
        ledger.add(new_item("p2", "L", "v2", 2));
        ledger.increase(&VariantId::new("v2"));
        let last = ledger.decrease(&VariantId::new("v1")).to_vec();

        assert_eq!(ledger.load(), last.as_slice());
        assert_eq!(CartLedger::open(storage.clone()).items(), last.as_slice());

        let cleared = ledger.clear().to_vec();
        assert!(cleared.is_empty());
        assert!(CartLedger::open(storage.clone()).is_empty());

        storage.wipe();
        assert!(ledger.load().is_empty());
    }

    #[test]
    fn test_corrupt_storage_loads_empty() {
        let mut ledger = CartLedger::open(MemoryStorage::seeded("%%%{not json"));
        assert!(ledger.is_empty());
        assert!(ledger.load().is_empty());

        // The next write replaces the garbage.
        ledger.add(new_item("p1", "M", "v1", 1));
        assert_eq!(ledger.load().len(), 1);
    }

    #[test]
    fn test_end_to_end_scenario() {
        let mut ledger = CartLedger::open(MemoryStorage::new());
        let v1 = VariantId::new("v1");
        let item = |quantity| NewLineItem {
            product_id: ProductId::new("p1"),
            title: "T".to_string(),
            image: "i.png".to_string(),
            variant_id: VariantId::new("v1"),
            size: "M".to_string(),
            quantity,
        };

        let items = ledger.add(item(1));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 1);

        assert_eq!(ledger.increase(&v1)[0].quantity, 2);
        assert_eq!(ledger.add(item(3))[0].quantity, 5);

        for expected in [4, 3, 2, 1] {
            let items = ledger.decrease(&v1);
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].quantity, expected);
        }
        assert_eq!(ledger.decrease(&v1)[0].quantity, 1);

        assert!(ledger.remove(&v1).is_empty());
        assert!(ledger.load().is_empty());
    }

    #[test]
    fn test_rejected_write_is_recorded_not_raised() {
        let storage = MemoryStorage::with_limit(120);
        let mut ledger = CartLedger::open(storage.clone());

        ledger.add(new_item("p1", "M", "v1", 1));
        assert!(ledger.write_error().is_none());

        let items = ledger.add(new_item("p2-with-a-long-id", "XXL", "v2", 1)).to_vec();
        assert_eq!(items.len(), 2);
        assert!(matches!(
            ledger.write_error(),
            Some(StorageError::QuotaExceeded { .. })
        ));

        // Storage still holds the last accepted snapshot.
        assert_eq!(CartLedger::open(storage).items().len(), 1);

        // A later write that fits clears the error.
        ledger.remove(&VariantId::new("v2"));
        assert!(ledger.write_error().is_none());
    }

    #[test]
    fn test_two_writers_are_last_writer_wins() {
        let storage = MemoryStorage::new();
        let mut tab_a = CartLedger::open(storage.clone());
        let mut tab_b = CartLedger::open(storage.clone());

        tab_a.add(new_item("p1", "M", "v1", 1));
        // Tab B never reloaded, so its write drops tab A's line.
        tab_b.add(new_item("p2", "L", "v2", 1));

        let seen = CartLedger::open(storage).items().to_vec();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].variant_id.as_str(), "v2");
    }
}
