//! Cart line records.

use serde::{Deserialize, Serialize};

use crate::types::{ProductId, VariantId};

/// One row in the cart.
///
/// `title`, `image` and `size` are copied from the catalog when the line is
/// first added and are never refreshed, so they can drift from the live
/// product. Price is deliberately absent.
///
/// Quantity is at least 1 for every line the ledger creates. Snapshots from
/// storage are trusted as-is, so a hand-edited cookie can still carry 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: ProductId,
    pub title: String,
    pub image: String,
    pub variant_id: VariantId,
    pub size: String,
    pub quantity: u32,
}

impl LineItem {
    /// Whether `other` would merge into this line on add.
    #[must_use]
    pub fn same_purchase(&self, other: &NewLineItem) -> bool {
        self.product_id == other.product_id && self.size == other.size
    }
}

/// A line about to be added to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLineItem {
    pub product_id: ProductId,
    pub title: String,
    pub image: String,
    pub variant_id: VariantId,
    pub size: String,
    pub quantity: u32,
}

impl From<NewLineItem> for LineItem {
    fn from(item: NewLineItem) -> Self {
        Self {
            product_id: item.product_id,
            title: item.title,
            image: item.image,
            variant_id: item.variant_id,
            size: item.size,
            quantity: item.quantity,
        }
    }
}
