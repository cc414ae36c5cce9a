//! Cart cookie inspection.
//!
//! Reading follows the storefront: a value that is not valid percent-encoding
//! or not a JSON array of lines is an empty cart, never an error.

use bazaar_core::cart::{LineItem, PriceIndex, cart_total, decode_snapshot, item_count, line_total};
use bazaar_core::{CurrencyCode, Price};

use super::catalog_client;

/// Decode a raw cookie value the way the storefront reads it.
///
/// Accepts the bare value or a `cart=<value>` pair, percent-encoded or not.
pub fn decode_cookie_value(raw: &str) -> Vec<LineItem> {
    let value = raw.trim();
    let value = value.strip_prefix("cart=").unwrap_or(value);

    urlencoding::decode(value)
        .map(|decoded| decode_snapshot(&decoded))
        .unwrap_or_default()
}

/// Print the lines stored in a cookie value.
///
/// # Errors
///
/// Returns an error only if `--json` output cannot be serialized.
pub fn decode(raw: &str, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let items = decode_cookie_value(raw);

    #[allow(clippy::print_stdout)]
    {
        if json {
            println!("{}", serde_json::to_string_pretty(&items)?);
            return Ok(());
        }

        if items.is_empty() {
            println!("Cart is empty");
            return Ok(());
        }

        for item in &items {
            println!(
                "{:<12} {:<6} x{:<4} {} (product {})",
                item.variant_id, item.size, item.quantity, item.title, item.product_id
            );
        }
        println!("{} line(s), {} unit(s)", items.len(), item_count(&items));
    }

    Ok(())
}

/// Price a cookie value against a fresh product list.
///
/// # Errors
///
/// Returns an error if no API URL is configured or the product list cannot
/// be fetched.
pub async fn total(
    raw: &str,
    api_url: Option<&str>,
    currency: CurrencyCode,
) -> Result<(), Box<dyn std::error::Error>> {
    let items = decode_cookie_value(raw);
    let client = catalog_client(api_url)?;
    let prices = PriceIndex::from_products(&client.products().await?);

    for item in items.iter().filter(|i| !prices.contains(&i.product_id)) {
        tracing::warn!(product_id = %item.product_id, "Product not in catalog, priced at 0");
    }

    #[allow(clippy::print_stdout)]
    {
        for line in price_lines(&items, &prices, currency) {
            println!("{line}");
        }
        println!(
            "Total: {}",
            Price::new(cart_total(&items, &prices), currency)
        );
    }

    Ok(())
}

/// One printable row per line: title, size, unit price, quantity, line total.
fn price_lines(items: &[LineItem], prices: &PriceIndex, currency: CurrencyCode) -> Vec<String> {
    items
        .iter()
        .map(|item| {
            format!(
                "{} ({}): {} x {} = {}",
                item.title,
                item.size,
                Price::new(prices.price_of(&item.product_id), currency),
                item.quantity,
                Price::new(line_total(item, prices), currency),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_core::ProductId;
    use rust_decimal::Decimal;

    const JSON: &str = r#"[{"productId":"p1","title":"Linen Panjabi","image":"","variantId":"v1","size":"M","quantity":2}]"#;

    #[test]
    fn test_decode_accepts_plain_and_encoded_values() {
        let encoded = urlencoding::encode(JSON).into_owned();

        assert_eq!(decode_cookie_value(JSON).len(), 1);
        assert_eq!(decode_cookie_value(&encoded).len(), 1);
        assert_eq!(decode_cookie_value(&format!("cart={encoded}")).len(), 1);
    }

    #[test]
    fn test_decode_fails_open() {
        assert!(decode_cookie_value("").is_empty());
        assert!(decode_cookie_value("not json").is_empty());
        assert!(decode_cookie_value("%FF%FE").is_empty());
        assert!(decode_cookie_value(r#"{"productId":"p1"}"#).is_empty());
    }

    #[test]
    fn test_price_lines() {
        let items = decode_cookie_value(JSON);
        let prices: PriceIndex = [(ProductId::new("p1"), Decimal::from(1450))]
            .into_iter()
            .collect();

        let lines = price_lines(&items, &prices, CurrencyCode::BDT);

        assert_eq!(
            lines,
            vec!["Linen Panjabi (M): ৳ 1450.00 x 2 = ৳ 2900.00".to_string()]
        );
    }
}
