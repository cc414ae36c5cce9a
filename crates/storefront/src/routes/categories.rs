//! Category listing route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use bazaar_core::catalog::products_in_category;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::routes::products::ProductCardView;
use crate::state::AppState;

/// Category page template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/show.html")]
pub struct CategoryShowTemplate {
    pub name: String,
    pub products: Vec<ProductCardView>,
}

/// Display every product carrying the category slug.
///
/// Matching is case-insensitive. An unknown slug renders an empty listing
/// titled with the slug itself.
///
/// # Errors
///
/// Returns 502 if the product list cannot be fetched.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let currency = state.config().currency;
    let products = state.catalog().cached_products().await?;

    let name = match state.catalog().categories().await {
        Ok(categories) => categories
            .into_iter()
            .find(|c| c.slug.eq_ignore_ascii_case(&slug))
            .map(|c| c.name),
        Err(e) => {
            tracing::warn!("Failed to fetch categories: {e}");
            None
        }
    }
    .unwrap_or_else(|| slug.clone());

    Ok(CategoryShowTemplate {
        name,
        products: products_in_category(&products, &slug)
            .into_iter()
            .map(|p| ProductCardView::new(p, currency))
            .collect(),
    })
}
