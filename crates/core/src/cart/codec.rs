//! JSON snapshot encoding.

use super::line_item::LineItem;

/// Storage key the snapshot is kept under.
pub const CART_STORAGE_KEY: &str = "cart";

/// Encode lines as the persisted JSON array.
///
/// # Errors
///
/// Returns `serde_json::Error` if serialization fails.
pub fn encode_snapshot(items: &[LineItem]) -> Result<String, serde_json::Error> {
    serde_json::to_string(items)
}

/// Decode a persisted snapshot.
///
/// Anything that is not a JSON array of line items (garbage, an object, a
/// line with a missing field) decodes to an empty cart. Unknown fields on a
/// line are ignored.
#[must_use]
pub fn decode_snapshot(raw: &str) -> Vec<LineItem> {
    match serde_json::from_str::<Vec<LineItem>>(raw) {
        Ok(items) => items,
        Err(e) => {
            tracing::debug!(error = %e, "Discarding undecodable cart snapshot");
            Vec::new()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{ProductId, VariantId};

    #[test]
    fn test_encode_uses_camel_case_keys() {
        let items = vec![LineItem {
            product_id: ProductId::new("p1"),
            title: "T".to_string(),
            image: "i.png".to_string(),
            variant_id: VariantId::new("v1"),
            size: "M".to_string(),
            quantity: 2,
        }];

        assert_eq!(
            encode_snapshot(&items).unwrap(),
            r#"[{"productId":"p1","title":"T","image":"i.png","variantId":"v1","size":"M","quantity":2}]"#
        );
    }

    #[test]
    fn test_decode_tolerates_extra_fields() {
        // Older carts also stored a price on each line.
        let raw = r#"[{"productId":"p1","title":"T","price":500,"image":"i.png","variantId":"v1","size":"M","quantity":1}]"#;

        let items = decode_snapshot(raw);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].variant_id.as_str(), "v1");
    }

    #[test]
    fn test_decode_garbage_is_empty() {
        assert!(decode_snapshot("not json").is_empty());
        assert!(decode_snapshot("").is_empty());
        assert!(decode_snapshot(r#"{"productId":"p1"}"#).is_empty());
        assert!(decode_snapshot(r#"[{"productId":"p1"}]"#).is_empty());
        assert!(decode_snapshot(r#"[{"productId":"p1","title":"T","image":"i","variantId":"v","size":"M","quantity":-1}]"#).is_empty());
    }
}
