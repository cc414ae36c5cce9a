//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                           - Home page (one section per category)
//! GET  /health                     - Liveness check
//! GET  /health/ready               - Readiness check (catalog reachable)
//!
//! # Catalog
//! GET  /category/{slug}            - Products in a category
//! GET  /product/{slug}             - Product detail
//! GET  /product/{slug}/quick-view  - Quick view fragment (HTMX)
//!
//! # Cart (cookie-backed, HTMX fragments or 303 redirects)
//! GET  /cart                       - Cart page
//! POST /cart/add                   - Add a size of a product
//! POST /cart/increase              - Quantity + 1
//! POST /cart/decrease              - Quantity - 1, floor of 1
//! POST /cart/remove                - Drop a line
//! POST /cart/clear                 - Empty the cart
//! GET  /cart/count                 - Cart count badge (fragment)
//! ```

pub mod cart;
pub mod categories;
pub mod health;
pub mod home;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/{slug}", get(products::show))
        .route("/{slug}/quick-view", get(products::quick_view))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/increase", post(cart::increase))
        .route("/decrease", post(cart::decrease))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/category/{slug}", get(categories::show))
        .nest("/product", product_routes())
        .nest("/cart", cart_routes())
}
