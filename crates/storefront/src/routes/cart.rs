//! Cart route handlers.
//!
//! The cart lives entirely in the `cart` cookie (see
//! [`crate::middleware::cart_cookie`]). Every mutation loads the ledger,
//! applies one operation and writes the cookie back.
//!
//! HTMX requests get a fragment plus `HX-Trigger: cart-updated`; plain form
//! posts get a `303 See Other`. A cookie that could not be written adds a
//! `cart-write-failed` event and a banner, never an error status.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use bazaar_core::cart::{
    CartLedger, LineItem, NewLineItem, PriceIndex, cart_total, item_count, line_total,
};
use bazaar_core::{CurrencyCode, Price, VariantId};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{CartCookie, CartSession, CookieCartStorage};
use crate::routes::products::PLACEHOLDER_IMAGE;
use crate::state::AppState;

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub variant_id: String,
    pub title: String,
    pub image: String,
    pub size: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub total: String,
    pub item_count: u32,
    pub write_failed: bool,
}

impl CartView {
    /// Join the lines against a price index.
    #[must_use]
    pub fn new(items: &[LineItem], prices: &PriceIndex, currency: CurrencyCode) -> Self {
        let total = Price::new(cart_total(items, prices), currency).display();

        Self {
            items: items
                .iter()
                .map(|item| CartItemView {
                    variant_id: item.variant_id.to_string(),
                    title: item.title.clone(),
                    image: if item.image.is_empty() {
                        PLACEHOLDER_IMAGE.to_string()
                    } else {
                        item.image.clone()
                    },
                    size: item.size.clone(),
                    quantity: item.quantity,
                    unit_price: Price::new(prices.price_of(&item.product_id), currency).display(),
                    line_total: Price::new(line_total(item, prices), currency).display(),
                })
                .collect(),
            // No shipping or tax: the subtotal is the total.
            subtotal: total.clone(),
            total,
            item_count: item_count(items),
            write_failed: false,
        }
    }

    #[must_use]
    pub const fn with_write_failed(mut self, write_failed: bool) -> Self {
        self.write_failed = write_failed;
        self
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub slug: String,
    pub variant_id: String,
    pub quantity: Option<u32>,
}

/// Form data naming one cart line.
#[derive(Debug, Deserialize)]
pub struct LineForm {
    pub variant_id: String,
}

/// Notice carried through a redirect.
#[derive(Debug, Default, Deserialize)]
pub struct CartPageQuery {
    pub status: Option<String>,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
    pub write_failed: bool,
}

// =============================================================================
// Helpers
// =============================================================================

/// Whether the request was issued by htmx.
fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get("HX-Request")
        .is_some_and(|value| value.as_bytes() == b"true")
}

/// `HX-Trigger` value for a finished mutation.
const fn hx_trigger(write_failed: bool) -> &'static str {
    if write_failed {
        "cart-updated, cart-write-failed"
    } else {
        "cart-updated"
    }
}

/// Fresh prices for the cart's products.
///
/// Prices are never cached for the cart: a failed fetch prices every line at
/// zero and is logged.
async fn current_prices(state: &AppState, items: &[LineItem]) -> PriceIndex {
    if items.is_empty() {
        return PriceIndex::default();
    }

    match state.catalog().products().await {
        Ok(products) => PriceIndex::from_products(&products),
        Err(e) => {
            tracing::warn!("Failed to fetch prices for cart, showing zero: {e}");
            PriceIndex::default()
        }
    }
}

/// Answer a line mutation: the items fragment for htmx, a redirect otherwise.
async fn mutation_response(
    state: &AppState,
    headers: &HeaderMap,
    cart: &CartLedger<CookieCartStorage>,
) -> Response {
    let cookie = CartCookie::from(cart);
    let write_failed = cart.write_error().is_some();

    if !is_htmx(headers) {
        let target = if write_failed {
            "/cart?status=cart-full"
        } else {
            "/cart"
        };
        return (cookie, Redirect::to(target)).into_response();
    }

    let prices = current_prices(state, cart.items()).await;
    let view = CartView::new(cart.items(), &prices, state.config().currency)
        .with_write_failed(write_failed);

    (
        cookie,
        AppendHeaders([("HX-Trigger", hx_trigger(write_failed))]),
        CartItemsTemplate { cart: view },
    )
        .into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, cart))]
pub async fn show(
    State(state): State<AppState>,
    CartSession(cart): CartSession,
    Query(query): Query<CartPageQuery>,
) -> impl IntoResponse {
    let prices = current_prices(&state, cart.items()).await;

    CartShowTemplate {
        cart: CartView::new(cart.items(), &prices, state.config().currency)
            .with_write_failed(query.status.as_deref() == Some("cart-full")),
    }
}

/// Add a size of a product to the cart.
///
/// The product is fetched fresh so the line snapshots its current title,
/// first image and size label.
///
/// # Errors
///
/// Returns 400 for a zero quantity, a sold-out size or a variant that is
/// not one of the product's sizes, 404 for an unknown product, and 502 if the catalog is
/// unreachable.
#[instrument(skip(state, headers, cart))]
pub async fn add(
    State(state): State<AppState>,
    headers: HeaderMap,
    CartSession(mut cart): CartSession,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let quantity = form.quantity.unwrap_or(1);
    if quantity == 0 {
        return Err(AppError::BadRequest("quantity must be at least 1".to_string()));
    }

    let product = state.catalog().fetch_product(&form.slug).await?;
    let variant_id = VariantId::new(form.variant_id);
    let variant = product.variant(&variant_id).ok_or_else(|| {
        AppError::BadRequest(format!(
            "variant {variant_id} does not belong to {}",
            product.slug
        ))
    })?;
    if !variant.in_stock() {
        return Err(AppError::BadRequest(format!("size {} is sold out", variant.size)));
    }

    cart.add(NewLineItem {
        product_id: product.id.clone(),
        title: product.title.clone(),
        image: product
            .featured_image()
            .unwrap_or(PLACEHOLDER_IMAGE)
            .to_string(),
        variant_id: variant.id.clone(),
        size: variant.size.clone(),
        quantity,
    });

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[
            ("product", product.slug.as_str()),
            ("variant_id", variant.id.as_str()),
        ]),
    );

    let cookie = CartCookie::from(&cart);
    let write_failed = cart.write_error().is_some();

    if !is_htmx(&headers) {
        let status = if write_failed { "cart-full" } else { "added" };
        let target = format!(
            "/product/{}?status={status}",
            urlencoding::encode(&product.slug)
        );
        return Ok((cookie, Redirect::to(&target)).into_response());
    }

    Ok((
        cookie,
        AppendHeaders([("HX-Trigger", hx_trigger(write_failed))]),
        CartCountTemplate {
            count: item_count(cart.items()),
            write_failed,
        },
    )
        .into_response())
}

/// Increase a line's quantity by one.
#[instrument(skip(state, headers, cart))]
pub async fn increase(
    State(state): State<AppState>,
    headers: HeaderMap,
    CartSession(mut cart): CartSession,
    Form(form): Form<LineForm>,
) -> Response {
    cart.increase(&VariantId::new(form.variant_id));
    mutation_response(&state, &headers, &cart).await
}

/// Decrease a line's quantity by one, never below one.
#[instrument(skip(state, headers, cart))]
pub async fn decrease(
    State(state): State<AppState>,
    headers: HeaderMap,
    CartSession(mut cart): CartSession,
    Form(form): Form<LineForm>,
) -> Response {
    cart.decrease(&VariantId::new(form.variant_id));
    mutation_response(&state, &headers, &cart).await
}

/// Remove a line.
#[instrument(skip(state, headers, cart))]
pub async fn remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    CartSession(mut cart): CartSession,
    Form(form): Form<LineForm>,
) -> Response {
    cart.remove(&VariantId::new(form.variant_id));
    mutation_response(&state, &headers, &cart).await
}

/// Empty the cart.
#[instrument(skip(state, headers, cart))]
pub async fn clear(
    State(state): State<AppState>,
    headers: HeaderMap,
    CartSession(mut cart): CartSession,
) -> Response {
    cart.clear();
    mutation_response(&state, &headers, &cart).await
}

/// Get cart count badge (HTMX).
#[instrument(skip(cart))]
pub async fn count(CartSession(cart): CartSession) -> impl IntoResponse {
    CartCountTemplate {
        count: item_count(cart.items()),
        write_failed: false,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use bazaar_core::ProductId;
    use rust_decimal::Decimal;

    fn line(product: &str, variant: &str, quantity: u32) -> LineItem {
        LineItem {
            product_id: ProductId::new(product),
            title: format!("Product {product}"),
            image: String::new(),
            variant_id: VariantId::new(variant),
            size: "M".to_string(),
            quantity,
        }
    }

    #[test]
    fn test_cart_view_prices_lines() {
        let prices: PriceIndex = [(ProductId::new("p1"), Decimal::from(500))]
            .into_iter()
            .collect();
        let items = vec![line("p1", "v1", 2), line("gone", "v2", 1)];

        let view = CartView::new(&items, &prices, CurrencyCode::BDT);

        assert_eq!(view.items[0].unit_price, "৳ 500.00");
        assert_eq!(view.items[0].line_total, "৳ 1000.00");
        assert_eq!(view.items[1].line_total, "৳ 0.00");
        assert_eq!(view.items[1].image, PLACEHOLDER_IMAGE);
        assert_eq!(view.total, "৳ 1000.00");
        assert_eq!(view.subtotal, view.total);
        assert_eq!(view.item_count, 3);
        assert!(!view.write_failed);
    }

    #[test]
    fn test_is_htmx() {
        let mut headers = HeaderMap::new();
        assert!(!is_htmx(&headers));
        headers.insert("HX-Request", HeaderValue::from_static("true"));
        assert!(is_htmx(&headers));
    }

    #[test]
    fn test_hx_trigger() {
        assert_eq!(hx_trigger(false), "cart-updated");
        assert_eq!(hx_trigger(true), "cart-updated, cart-write-failed");
    }

    #[test]
    fn test_count_fragment_renders() {
        let html = CartCountTemplate {
            count: 3,
            write_failed: false,
        }
        .render()
        .unwrap();
        assert!(html.contains('3'));
    }
}
