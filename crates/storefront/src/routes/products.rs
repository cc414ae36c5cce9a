//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use bazaar_core::catalog::Product;
use bazaar_core::{CurrencyCode, Price};
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::state::AppState;

/// Image shown when a product has none.
pub const PLACEHOLDER_IMAGE: &str = "/static/images/placeholder.svg";

/// How many related products the detail page shows.
const RELATED_PRODUCTS: usize = 4;

/// Product card data for grids (home, category, related).
#[derive(Clone)]
pub struct ProductCardView {
    pub slug: String,
    pub title: String,
    pub price: String,
    pub image: String,
    pub new_arrival: bool,
}

impl ProductCardView {
    /// Build a card, formatting the price in the shop currency.
    #[must_use]
    pub fn new(product: &Product, currency: CurrencyCode) -> Self {
        Self {
            slug: product.slug.clone(),
            title: product.title.clone(),
            price: Price::new(product.price, currency).display(),
            image: product
                .featured_image()
                .unwrap_or(PLACEHOLDER_IMAGE)
                .to_string(),
            new_arrival: product.new_arrival,
        }
    }
}

/// Size option display data.
#[derive(Clone)]
pub struct VariantView {
    pub id: String,
    pub size: String,
    pub in_stock: bool,
    pub checked: bool,
}

/// Product detail display data.
#[derive(Clone)]
pub struct ProductView {
    pub slug: String,
    pub title: String,
    pub price: String,
    pub images: Vec<String>,
    pub featured_image: String,
    pub intro: Option<String>,
    pub bullet_points: Vec<String>,
    pub outro: Option<String>,
    pub categories: Vec<String>,
    pub sku: Option<String>,
    pub color: Option<String>,
    pub variants: Vec<VariantView>,
}

impl ProductView {
    #[must_use]
    pub fn new(product: &Product, currency: CurrencyCode) -> Self {
        let description = product.description.clone().unwrap_or_default();
        let preselected = product.default_variant().map(|v| &v.id);

        Self {
            slug: product.slug.clone(),
            title: product.title.clone(),
            price: Price::new(product.price, currency).display(),
            images: product.images.clone(),
            featured_image: product
                .featured_image()
                .unwrap_or(PLACEHOLDER_IMAGE)
                .to_string(),
            intro: description.intro,
            bullet_points: description.bullet_points,
            outro: description.outro,
            categories: product.category_names().map(String::from).collect(),
            sku: product.sku.clone(),
            color: product.color.clone(),
            variants: product
                .variant_option
                .iter()
                .map(|v| VariantView {
                    id: v.id.to_string(),
                    size: v.size.clone(),
                    in_stock: v.in_stock(),
                    checked: preselected == Some(&v.id),
                })
                .collect(),
        }
    }

    /// Whether any size can be added to the cart.
    #[must_use]
    pub fn purchasable(&self) -> bool {
        self.variants.iter().any(|v| v.in_stock)
    }
}

/// Notice shown after a plain (non-HTMX) add-to-cart redirect.
#[derive(Debug, Default, Deserialize)]
pub struct ProductPageQuery {
    pub status: Option<String>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductView,
    pub related_products: Vec<ProductCardView>,
    pub added: bool,
    pub write_failed: bool,
}

/// Quick view fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/quick_view.html")]
pub struct QuickViewTemplate {
    pub product: ProductView,
}

/// Display product detail page.
///
/// # Errors
///
/// Returns 404 for an unknown slug and 502 if the catalog is unreachable.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<ProductPageQuery>,
) -> Result<impl IntoResponse> {
    let currency = state.config().currency;
    let product = state.catalog().product(&slug).await?;

    let related_products = match (
        product.primary_category_slug(),
        state.catalog().cached_products().await,
    ) {
        (Some(category), Ok(products)) => products
            .iter()
            .filter(|p| p.id != product.id && p.in_category(category))
            .take(RELATED_PRODUCTS)
            .map(|p| ProductCardView::new(p, currency))
            .collect(),
        (_, Err(e)) => {
            tracing::warn!("Failed to fetch related products: {e}");
            Vec::new()
        }
        (None, Ok(_)) => Vec::new(),
    };

    let status = query.status.as_deref();

    Ok(ProductShowTemplate {
        product: ProductView::new(&product, currency),
        related_products,
        added: status == Some("added"),
        write_failed: status == Some("cart-full"),
    })
}

/// Display quick view fragment (for HTMX).
///
/// # Errors
///
/// Returns 404 for an unknown slug and 502 if the catalog is unreachable.
#[instrument(skip(state))]
pub async fn quick_view(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let product = state.catalog().product(&slug).await?;

    Ok(QuickViewTemplate {
        product: ProductView::new(&product, state.config().currency),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(images: &[&str]) -> Product {
        serde_json::from_value(serde_json::json!({
            "id": "p1",
            "title": "Linen Panjabi",
            "slug": "linen-panjabi",
            "price": 1450,
            "images": images,
            "description": { "intro": "Breathable linen.", "bulletPoints": ["100% linen"] },
            "variantOption": [
                { "id": "v1", "size": "M", "stock": 3 },
                { "id": "v2", "size": "L", "stock": 0 }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_card_uses_placeholder_without_images() {
        let card = ProductCardView::new(&product(&[]), CurrencyCode::BDT);
        assert_eq!(card.image, PLACEHOLDER_IMAGE);
        assert_eq!(card.price, "৳ 1450.00");
    }

    #[test]
    fn test_product_view_maps_variants_and_description() {
        let view = ProductView::new(&product(&["https://cdn.example/a.png"]), CurrencyCode::USD);

        assert_eq!(view.featured_image, "https://cdn.example/a.png");
        assert_eq!(view.price, "$ 1450.00");
        assert_eq!(view.intro.as_deref(), Some("Breathable linen."));
        assert_eq!(view.bullet_points, vec!["100% linen".to_string()]);
        assert!(view.purchasable());
        assert!(view.variants[0].in_stock);
        assert!(!view.variants[1].in_stock);
    }

    #[test]
    fn test_first_in_stock_size_is_preselected() {
        let mut p = product(&[]);
        p.variant_option.reverse();

        let view = ProductView::new(&p, CurrencyCode::BDT);

        assert_eq!(view.variants[0].size, "L");
        assert!(!view.variants[0].checked);
        assert!(view.variants[1].checked);
    }

    #[test]
    fn test_sold_out_product_is_not_purchasable() {
        let mut p = product(&[]);
        for v in &mut p.variant_option {
            v.stock = 0;
        }

        let view = ProductView::new(&p, CurrencyCode::BDT);

        assert!(!view.purchasable());
        assert!(view.variants.iter().all(|v| !v.checked));
    }
}
