//! Integration test harness for the Bazaar storefront.
//!
//! Every test gets its own fake catalog API and storefront, both bound to
//! `127.0.0.1:0` inside the test's runtime. No external services needed:
//!
//! ```bash
//! cargo test -p bazaar-integration-tests
//! ```
//!
//! # Fixture catalog
//!
//! | slug             | price   | sizes (variant id)                         |
//! |------------------|---------|--------------------------------------------|
//! | `linen-panjabi`  | 1450    | M (`v-linen-m`), L (`v-linen-l`, no stock) |
//! | `denim-jacket`   | 2200.50 | M (`v-denim-m`), M (`v-denim-m2`), XL      |
//! | `festival-scarf` | 300     | one size (`v-scarf`), 4 KiB title          |

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use bazaar_core::CurrencyCode;
use bazaar_core::cart::{LineItem, decode_snapshot};
use bazaar_storefront::config::{CatalogConfig, StorefrontConfig, parse_api_url};
use bazaar_storefront::state::AppState;
use reqwest::header::{COOKIE, SET_COOKIE};
use serde_json::{Value, json};
use tokio::sync::RwLock;

/// Build the fixture product list.
#[must_use]
pub fn fixture_products() -> Vec<Value> {
    vec![
        json!({
            "id": "p-linen",
            "title": "Linen Panjabi",
            "slug": "linen-panjabi",
            "price": 1450,
            "images": ["https://cdn.example.com/linen-1.jpg", "https://cdn.example.com/linen-2.jpg"],
            "newArrival": true,
            "description": { "intro": "Breathable linen for warm evenings.", "bulletPoints": ["100% linen"] },
            "productCategory": [
                { "categoryId": "c-panjabi", "category": { "id": "c-panjabi", "name": "Panjabi", "slug": "panjabi" } }
            ],
            "variantOption": [
                { "id": "v-linen-m", "size": "M", "stock": 5 },
                { "id": "v-linen-l", "size": "L", "stock": 0 }
            ]
        }),
        json!({
            "id": "p-denim",
            "title": "Denim Jacket",
            "slug": "denim-jacket",
            "price": "2200.50",
            "images": [],
            "productCategory": [
                { "category": { "id": "c-jackets", "name": "Jackets", "slug": "jackets" } }
            ],
            "variantOption": [
                { "id": "v-denim-m", "size": "M", "stock": 2 },
                { "id": "v-denim-m2", "size": "M", "stock": 2 },
                { "id": "v-denim-xl", "size": "XL", "stock": 1 }
            ]
        }),
        json!({
            "id": "p-scarf",
            "title": format!("Festival Scarf {}", "~".repeat(4096)),
            "slug": "festival-scarf",
            "price": 300,
            "images": ["https://cdn.example.com/scarf.jpg"],
            "productCategory": [
                { "category": { "id": "c-accessories", "name": "Accessories", "slug": "accessories" } }
            ],
            "variantOption": [
                { "id": "v-scarf", "size": "Free", "stock": 9 }
            ]
        }),
    ]
}

/// Build the fixture category list.
#[must_use]
pub fn fixture_categories() -> Vec<Value> {
    vec![
        json!({ "id": "c-panjabi", "name": "Panjabi", "slug": "panjabi" }),
        json!({ "id": "c-jackets", "name": "Jackets", "slug": "jackets" }),
        json!({ "id": "c-accessories", "name": "Accessories", "slug": "accessories" }),
    ]
}

// =============================================================================
// Fake catalog API
// =============================================================================

#[derive(Clone, Default)]
struct CatalogData {
    products: Arc<RwLock<Vec<Value>>>,
    categories: Arc<RwLock<Vec<Value>>>,
}

/// In-process stand-in for the catalog REST API.
///
/// Serves `GET /api/product`, `GET /api/product/{slug}` and
/// `GET /api/category` with `{ "data": ... }` envelopes. The product list
/// can be edited while tests run.
pub struct FakeCatalog {
    addr: SocketAddr,
    data: CatalogData,
}

impl FakeCatalog {
    /// Start the fake API with the fixture data.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn spawn() -> Self {
        let data = CatalogData {
            products: Arc::new(RwLock::new(fixture_products())),
            categories: Arc::new(RwLock::new(fixture_categories())),
        };

        let app = Router::new()
            .route("/api/product", get(list_products))
            .route("/api/product/{slug}", get(product_by_slug))
            .route("/api/category", get(list_categories))
            .with_state(data.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake catalog");
        let addr = listener.local_addr().expect("fake catalog addr");
        tokio::spawn(async move { axum::serve(listener, app).await.expect("serve fake catalog") });

        Self { addr, data }
    }

    /// Base URL to hand to the storefront.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Change a product's price.
    pub async fn set_price(&self, product_id: &str, price: Value) {
        let mut products = self.data.products.write().await;
        for product in products.iter_mut().filter(|p| p["id"] == product_id) {
            product["price"] = price.clone();
        }
    }

    /// Delete a product from the catalog.
    pub async fn remove_product(&self, product_id: &str) {
        self.data
            .products
            .write()
            .await
            .retain(|p| p["id"] != product_id);
    }
}

async fn list_products(State(data): State<CatalogData>) -> Json<Value> {
    Json(json!({ "data": *data.products.read().await, "success": true }))
}

async fn product_by_slug(
    State(data): State<CatalogData>,
    Path(slug): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    data.products
        .read()
        .await
        .iter()
        .find(|p| p["slug"] == slug.as_str())
        .map(|p| Json(json!({ "data": p, "success": true })))
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": "Product not found", "success": false })),
            )
        })
}

async fn list_categories(State(data): State<CatalogData>) -> Json<Value> {
    Json(json!({ "data": *data.categories.read().await, "success": true }))
}

// =============================================================================
// Storefront
// =============================================================================

/// Storefront configuration pointing at `catalog_url`.
///
/// # Panics
///
/// Panics if `catalog_url` is not an http(s) URL.
#[must_use]
pub fn storefront_config(catalog_url: &str) -> StorefrontConfig {
    StorefrontConfig {
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        currency: CurrencyCode::BDT,
        catalog: CatalogConfig {
            base_url: parse_api_url("CATALOG_API_URL", catalog_url).expect("catalog url"),
            api_token: None,
            cache_ttl: Duration::from_secs(60),
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Serve the storefront on a free local port and return its base URL.
///
/// # Panics
///
/// Panics if no local port can be bound.
pub async fn spawn_storefront(config: StorefrontConfig) -> String {
    let app = bazaar_storefront::app(AppState::new(config));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind storefront");
    let addr = listener.local_addr().expect("storefront addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve storefront") });

    format!("http://{addr}")
}

/// A fake catalog plus a storefront wired to it.
pub struct TestShop {
    pub catalog: FakeCatalog,
    pub url: String,
}

impl TestShop {
    /// Start both servers.
    pub async fn start() -> Self {
        let catalog = FakeCatalog::spawn().await;
        let url = spawn_storefront(storefront_config(&catalog.base_url())).await;
        Self { catalog, url }
    }

    /// A shopper with an empty cart.
    #[must_use]
    pub fn shopper(&self) -> Shopper {
        Shopper::new(&self.url)
    }
}

// =============================================================================
// Shopper (a browser holding one cart cookie)
// =============================================================================

/// HTTP client that carries the `cart` cookie between requests by hand,
/// so tests can read and tamper with the raw value.
pub struct Shopper {
    client: reqwest::Client,
    base_url: String,
    /// Raw (still percent-encoded) cookie value.
    pub cart_cookie: Option<String>,
}

impl Shopper {
    /// New shopper without a cart cookie. Redirects are not followed.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("build client");

        Self {
            client,
            base_url: base_url.to_string(),
            cart_cookie: None,
        }
    }

    /// GET a path.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn get(&mut self, path: &str) -> reqwest::Response {
        let request = self.client.get(format!("{}{path}", self.base_url));
        self.send(request).await
    }

    /// POST a form as a plain browser would.
    pub async fn post(&mut self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        let request = self
            .client
            .post(format!("{}{path}", self.base_url))
            .form(form);
        self.send(request).await
    }

    /// POST a form as htmx would.
    pub async fn hx_post(&mut self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        let request = self
            .client
            .post(format!("{}{path}", self.base_url))
            .header("HX-Request", "true")
            .form(form);
        self.send(request).await
    }

    /// Lines currently held in the cookie, decoded like the storefront does.
    #[must_use]
    pub fn cart(&self) -> Vec<LineItem> {
        self.cart_cookie
            .as_deref()
            .and_then(|raw| urlencoding::decode(raw).ok())
            .map(|json| decode_snapshot(&json))
            .unwrap_or_default()
    }

    async fn send(&mut self, mut request: reqwest::RequestBuilder) -> reqwest::Response {
        if let Some(value) = &self.cart_cookie {
            request = request.header(COOKIE, format!("cart={value}"));
        }

        let response = request.send().await.expect("send request");

        if let Some(value) = set_cookie_header(&response).and_then(|h| cookie_value(&h)) {
            self.cart_cookie = Some(value);
        }

        response
    }
}

/// The response's `cart` Set-Cookie header, if any.
#[must_use]
pub fn set_cookie_header(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .find(|h| h.starts_with("cart="))
        .map(String::from)
}

/// Value part of a `cart=<value>; attrs` header.
#[must_use]
pub fn cookie_value(header: &str) -> Option<String> {
    header
        .split(';')
        .next()
        .and_then(|pair| pair.strip_prefix("cart="))
        .map(String::from)
}
