//! Price derivation for cart lines.
//!
//! Lines carry no price. Totals come from joining the ledger against the
//! latest catalog fetch; a line whose product is missing from that fetch
//! (not loaded yet, deleted upstream) is priced at zero rather than failing.
//! Nothing here is cached or persisted.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::catalog::Product;
use crate::types::ProductId;

use super::line_item::LineItem;

/// Lookup table from product id to current unit price.
#[derive(Debug, Clone, Default)]
pub struct PriceIndex {
    prices: HashMap<ProductId, Decimal>,
}

impl PriceIndex {
    /// Build the index from a catalog fetch. A product listed twice keeps
    /// its last price.
    #[must_use]
    pub fn from_products<'a>(products: impl IntoIterator<Item = &'a Product>) -> Self {
        let prices = products
            .into_iter()
            .map(|p| (p.id.clone(), p.price))
            .collect();
        Self { prices }
    }

    /// Unit price of a product, zero when unknown.
    #[must_use]
    pub fn price_of(&self, product_id: &ProductId) -> Decimal {
        self.prices
            .get(product_id)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Whether the index knows this product.
    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.prices.contains_key(product_id)
    }

    /// Number of priced products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Whether no products are priced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl FromIterator<(ProductId, Decimal)> for PriceIndex {
    fn from_iter<I: IntoIterator<Item = (ProductId, Decimal)>>(iter: I) -> Self {
        Self {
            prices: iter.into_iter().collect(),
        }
    }
}

/// Unit price times quantity, saturating at [`Decimal::MAX`].
#[must_use]
pub fn line_total(item: &LineItem, index: &PriceIndex) -> Decimal {
    index
        .price_of(&item.product_id)
        .checked_mul(Decimal::from(item.quantity))
        .unwrap_or(Decimal::MAX)
}

/// Sum of [`line_total`] over every line, saturating at [`Decimal::MAX`].
#[must_use]
pub fn cart_total(items: &[LineItem], index: &PriceIndex) -> Decimal {
    items.iter().fold(Decimal::ZERO, |acc, item| {
        acc.checked_add(line_total(item, index))
            .unwrap_or(Decimal::MAX)
    })
}

/// Total units across all lines (the cart badge).
#[must_use]
pub fn item_count(items: &[LineItem]) -> u32 {
    items
        .iter()
        .fold(0u32, |acc, item| acc.saturating_add(item.quantity))
}
