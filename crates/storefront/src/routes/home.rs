//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use bazaar_core::catalog::group_by_category;
use tracing::instrument;

use crate::filters;
use crate::routes::products::ProductCardView;
use crate::state::AppState;

/// Number of products to show per category section.
const PRODUCTS_PER_SECTION: usize = 4;

/// One category row on the home page.
#[derive(Clone)]
pub struct SectionView {
    pub name: String,
    pub slug: String,
    pub products: Vec<ProductCardView>,
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub sections: Vec<SectionView>,
}

/// Display the home page.
///
/// A catalog outage renders an empty page rather than an error.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    let currency = state.config().currency;
    let catalog = state.catalog();

    let (categories, products) = tokio::join!(catalog.categories(), catalog.cached_products());

    let categories = categories.unwrap_or_else(|e| {
        tracing::error!("Failed to fetch categories: {e}");
        Vec::new()
    });
    let products = products.unwrap_or_else(|e| {
        tracing::error!("Failed to fetch products: {e}");
        Vec::new()
    });

    let sections = group_by_category(&categories, &products, PRODUCTS_PER_SECTION)
        .into_iter()
        .filter(|section| !section.products.is_empty())
        .map(|section| SectionView {
            name: section.category.name.clone(),
            slug: section.category.slug.clone(),
            products: section
                .products
                .iter()
                .map(|p| ProductCardView::new(p, currency))
                .collect(),
        })
        .collect();

    HomeTemplate { sections }
}
