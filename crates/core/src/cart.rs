//! Session cart state machine.
//!
//! The cart is a mapping from product ID to a positive quantity plus two
//! cached totals. This module holds the pure part of the cart: mutating the
//! mapping and reconciling it against catalog prices. Loading products and
//! persisting the state into a session is the storefront's job.
//!
//! The cached totals are write-through: every mutation is followed by a full
//! [`CartState::reconcile`] and [`CartState::apply_summary`], never by
//! patching the totals incrementally, so price changes and deleted products
//! cannot make them drift.

use std::collections::BTreeMap;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// Anything with a current unit price, typically a catalog product.
pub trait Priced {
    /// Current unit price.
    fn unit_price(&self) -> Price;
}

/// Error for quantities that cannot be applied to the cart.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuantityError {
    /// Quantity is larger than the cart can hold.
    #[error("quantity {0} is too large")]
    TooLarge(i64),
}

/// A client-requested quantity change, normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityUpdate {
    /// Replace the stored quantity.
    Set(NonZeroU32),
    /// Drop the entry.
    Remove,
}

impl QuantityUpdate {
    /// Normalize a signed client quantity: anything `<= 0` means remove.
    ///
    /// # Errors
    ///
    /// Returns `QuantityError::TooLarge` above `u32::MAX`.
    pub fn from_requested(quantity: i64) -> Result<Self, QuantityError> {
        if quantity <= 0 {
            return Ok(Self::Remove);
        }
        u32::try_from(quantity)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self::Set)
            .ok_or(QuantityError::TooLarge(quantity))
    }
}

/// Derived cart totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSummary {
    /// Sum of quantities over resolvable entries.
    pub total_item_count: u32,
    /// Sum of quantity x unit price over resolvable entries.
    pub total_price: Price,
}

/// One resolved cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine<P> {
    /// The resolved product.
    pub product: P,
    /// Quantity in the cart.
    pub quantity: u32,
    /// `quantity` x unit price.
    pub line_total: Price,
}

/// Result of reconciling the mapping against the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation<P> {
    /// Lines whose product resolved, in product ID order.
    pub lines: Vec<CartLine<P>>,
    /// Totals over `lines`.
    pub summary: CartSummary,
    /// IDs still in the mapping whose product no longer resolves.
    pub missing: Vec<ProductId>,
}

/// The cart as held in a visitor's session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    items: BTreeMap<ProductId, NonZeroU32>,
    cached: CartSummary,
}

impl CartState {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a cart from its stored parts.
    #[must_use]
    pub const fn from_parts(items: BTreeMap<ProductId, NonZeroU32>, cached: CartSummary) -> Self {
        Self { items, cached }
    }

    /// The raw product ID to quantity mapping.
    #[must_use]
    pub const fn items(&self) -> &BTreeMap<ProductId, NonZeroU32> {
        &self.items
    }

    /// Totals cached by the last completed mutation.
    #[must_use]
    pub const fn cached_summary(&self) -> CartSummary {
        self.cached
    }

    /// Whether the mapping has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Stored quantity for a product.
    #[must_use]
    pub fn quantity(&self, product_id: ProductId) -> Option<u32> {
        self.items.get(&product_id).map(|q| q.get())
    }

    /// Add one unit of a product, creating the entry at 1.
    ///
    /// Returns the new quantity.
    pub fn increment(&mut self, product_id: ProductId) -> u32 {
        let quantity = self
            .items
            .entry(product_id)
            .and_modify(|q| *q = q.saturating_add(1))
            .or_insert(NonZeroU32::MIN);
        quantity.get()
    }

    /// Apply a normalized quantity change.
    pub fn apply(&mut self, product_id: ProductId, update: QuantityUpdate) {
        match update {
            QuantityUpdate::Set(quantity) => {
                self.items.insert(product_id, quantity);
            }
            QuantityUpdate::Remove => {
                self.items.remove(&product_id);
            }
        }
    }

    /// Remove a product. Returns whether it was present.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        self.items.remove(&product_id).is_some()
    }

    /// Resolve every entry and total the ones that still exist.
    ///
    /// Entries for which `resolve` returns `None` are reported in
    /// [`Reconciliation::missing`] and left in the mapping.
    pub fn reconcile<P, F>(&self, mut resolve: F) -> Reconciliation<P>
    where
        P: Priced,
        F: FnMut(ProductId) -> Option<P>,
    {
        let mut lines = Vec::with_capacity(self.items.len());
        let mut missing = Vec::new();
        let mut summary = CartSummary::default();

        for (&product_id, &quantity) in &self.items {
            let Some(product) = resolve(product_id) else {
                missing.push(product_id);
                continue;
            };
            let quantity = quantity.get();
            let line_total = product.unit_price().times(quantity);
            summary.total_item_count = summary.total_item_count.saturating_add(quantity);
            summary.total_price = summary.total_price + line_total;
            lines.push(CartLine {
                product,
                quantity,
                line_total,
            });
        }

        Reconciliation {
            lines,
            summary,
            missing,
        }
    }

    /// Overwrite the cached totals.
    pub const fn apply_summary(&mut self, summary: CartSummary) {
        self.cached = summary;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Item(Price);

    impl Priced for Item {
        fn unit_price(&self) -> Price {
            self.0
        }
    }

    fn catalog(entries: &[(i32, i64)]) -> HashMap<ProductId, Item> {
        entries
            .iter()
            .map(|&(id, yen)| (ProductId::new(id), Item(Price::new(yen))))
            .collect()
    }

    #[test]
    fn test_increment_creates_then_counts_up() {
        let mut cart = CartState::new();
        assert_eq!(cart.increment(ProductId::new(5)), 1);
        assert_eq!(cart.increment(ProductId::new(5)), 2);
        assert_eq!(cart.quantity(ProductId::new(5)), Some(2));
    }

    #[test]
    fn test_quantity_update_normalizes_non_positive_to_remove() {
        assert_eq!(QuantityUpdate::from_requested(0), Ok(QuantityUpdate::Remove));
        assert_eq!(QuantityUpdate::from_requested(-1), Ok(QuantityUpdate::Remove));
        assert_eq!(
            QuantityUpdate::from_requested(4),
            Ok(QuantityUpdate::Set(NonZeroU32::new(4).unwrap()))
        );
        assert!(QuantityUpdate::from_requested(i64::from(u32::MAX) + 1).is_err());
    }

    #[test]
    fn test_apply_remove_drops_entry() {
        let mut cart = CartState::new();
        cart.increment(ProductId::new(3));
        cart.apply(ProductId::new(3), QuantityUpdate::Remove);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut cart = CartState::new();
        cart.increment(ProductId::new(1));
        assert!(!cart.remove(ProductId::new(2)));
        assert_eq!(cart.items().len(), 1);
    }

    #[test]
    fn test_reconcile_totals() {
        let mut cart = CartState::new();
        cart.apply(ProductId::new(3), QuantityUpdate::from_requested(2).unwrap());
        cart.increment(ProductId::new(7));
        let prices = catalog(&[(3, 500), (7, 1200)]);

        let result = cart.reconcile(|id| prices.get(&id).cloned());

        assert_eq!(result.summary.total_item_count, 3);
        assert_eq!(result.summary.total_price, Price::new(2200));
        assert_eq!(result.lines.len(), 2);
        assert_eq!(result.lines[0].line_total, Price::new(1000));
        assert!(result.missing.is_empty());
    }

    #[test]
    fn test_reconcile_skips_unresolved_but_keeps_mapping() {
        let mut cart = CartState::new();
        cart.increment(ProductId::new(3));
        cart.increment(ProductId::new(9));
        let prices = catalog(&[(3, 500)]);

        let result = cart.reconcile(|id| prices.get(&id).cloned());

        assert_eq!(result.summary.total_item_count, 1);
        assert_eq!(result.summary.total_price, Price::new(500));
        assert_eq!(result.missing, vec![ProductId::new(9)]);
        assert_eq!(cart.quantity(ProductId::new(9)), Some(1));
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #[test]
            fn test_distinct_adds_total_to_count_and_price_sum(
                prices in prop::collection::btree_map(any::<i32>(), 0i64..100_000, 0..24)
            ) {
                let mut cart = CartState::new();
                for &id in prices.keys() {
                    cart.increment(ProductId::new(id));
                }
                let products: HashMap<ProductId, Item> = prices
                    .iter()
                    .map(|(&id, &yen)| (ProductId::new(id), Item(Price::new(yen))))
                    .collect();

                let result = cart.reconcile(|id| products.get(&id).cloned());

                prop_assert_eq!(result.summary.total_item_count, u32::try_from(prices.len()).unwrap());
                prop_assert_eq!(result.summary.total_price, Price::new(prices.values().sum()));
                prop_assert!(result.missing.is_empty());
            }

            #[test]
            fn test_repeated_adds_count_up(id in any::<i32>(), times in 1u32..200) {
                let mut cart = CartState::new();
                let mut last = 0;
                for _ in 0..times {
                    last = cart.increment(ProductId::new(id));
                }

                prop_assert_eq!(last, times);
                prop_assert_eq!(cart.quantity(ProductId::new(id)), Some(times));
            }

            #[test]
            fn test_non_positive_quantity_removes_entry(
                id in any::<i32>(),
                existing in 0u32..10,
                requested in i64::MIN..=0,
            ) {
                let mut cart = CartState::new();
                for _ in 0..existing {
                    cart.increment(ProductId::new(id));
                }

                let update = QuantityUpdate::from_requested(requested).unwrap();
                cart.apply(ProductId::new(id), update);

                prop_assert_eq!(update, QuantityUpdate::Remove);
                prop_assert_eq!(cart.quantity(ProductId::new(id)), None);
            }

            #[test]
            fn test_set_quantity_scales_line_total(
                yen in 0i64..100_000,
                quantity in 1i64..1_000,
            ) {
                let mut cart = CartState::new();
                let products = catalog(&[(1, yen)]);

                cart.apply(ProductId::new(1), QuantityUpdate::from_requested(quantity).unwrap());
                let result = cart.reconcile(|id| products.get(&id).cloned());

                prop_assert_eq!(i64::from(result.summary.total_item_count), quantity);
                prop_assert_eq!(result.summary.total_price, Price::new(yen * quantity));
            }
        }
    }
}
