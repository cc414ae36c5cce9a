//! Catalog REST API client.
//!
//! # Architecture
//!
//! - The catalog service is the source of truth for products, prices and
//!   categories - NO local copy, direct API calls
//! - Browsing pages read through an in-memory `moka` cache (short TTL)
//! - The cart page always fetches fresh so totals use current prices
//!
//! # Endpoints
//!
//! - `GET /product` - `{ data: Product[] }`
//! - `GET /product/{slug}` - `{ data: Product }` with variants and description
//! - `GET /category` - `{ data: Category[] }`
//!
//! # Example
//!
//! ```rust,ignore
//! use bazaar_storefront::catalog::CatalogClient;
//!
//! let client = CatalogClient::new(&config.catalog);
//!
//! let product = client.product("linen-panjabi").await?;
//! let prices = PriceIndex::from_products(&client.products().await?);
//! ```

mod cache;

use std::sync::Arc;

use bazaar_core::catalog::{ApiEnvelope, Category, Product};
use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::CatalogConfig;

use cache::{CacheKey, CacheValue};

/// Errors that can occur when talking to the catalog API.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("Catalog API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request URL could not be built.
    #[error("Invalid catalog URL: {0}")]
    Url(#[from] url::ParseError),
}

// =============================================================================
// CatalogClient
// =============================================================================

/// Client for the catalog REST API.
///
/// Cheap to clone; clones share the HTTP connection pool and the cache.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: Url,
    api_token: Option<SecretString>,
    cache: Cache<CacheKey, CacheValue>,
}

impl CatalogClient {
    /// Create a new catalog API client.
    #[must_use]
    pub fn new(config: &CatalogConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        Self {
            inner: Arc::new(CatalogClientInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.clone(),
                api_token: config.api_token.clone(),
                cache,
            }),
        }
    }

    /// Issue a GET against `path` (relative to the base URL) and unwrap the
    /// `data` envelope.
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, CatalogError> {
        let url = self.inner.base_url.join(path)?;

        let mut request = self.inner.client.get(url).header("Accept", "application/json");
        if let Some(token) = &self.inner.api_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(path.to_string()));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Catalog API returned non-success status"
            );
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body: response_text.chars().take(200).collect(),
            });
        }

        let envelope: ApiEnvelope<T> = match serde_json::from_str(&response_text) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse catalog API response"
                );
                return Err(CatalogError::Parse(e));
            }
        };

        Ok(envelope.data)
    }

    /// Fetch every product, bypassing the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<Product>, CatalogError> {
        let products: Vec<Product> = self.get("product").await?;

        // Refresh the browsing cache while we have the data.
        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Fetch every product, serving from cache when possible.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn cached_products(&self) -> Result<Vec<Product>, CatalogError> {
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for product list");
            return Ok(products);
        }

        self.products().await
    }

    /// Fetch a single product by slug, bypassing the cache.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no product has this slug, or
    /// another error if the API request fails.
    #[instrument(skip(self))]
    pub async fn fetch_product(&self, slug: &str) -> Result<Product, CatalogError> {
        let path = format!("product/{}", urlencoding::encode(slug));
        let product: Product = self.get(&path).await?;

        self.inner
            .cache
            .insert(
                CacheKey::Product(slug.to_string()),
                CacheValue::Product(Box::new(product.clone())),
            )
            .await;

        Ok(product)
    }

    /// Fetch a single product by slug, serving from cache when possible.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no product has this slug, or
    /// another error if the API request fails.
    #[instrument(skip(self))]
    pub async fn product(&self, slug: &str) -> Result<Product, CatalogError> {
        let cache_key = CacheKey::Product(slug.to_string());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        self.fetch_product(slug).await
    }

    /// Fetch every category, serving from cache when possible.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, CatalogError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let categories: Vec<Category> = self.get("category").await?;

        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(categories.clone()),
            )
            .await;

        Ok(categories)
    }

    /// Check the API answers at all.
    ///
    /// # Errors
    ///
    /// Returns an error if the category listing cannot be fetched.
    pub async fn ping(&self) -> Result<(), CatalogError> {
        self.get::<Vec<Category>>("category").await.map(|_| ())
    }
}
