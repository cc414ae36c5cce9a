//! CLI command implementations.

pub mod cart;
pub mod catalog;

use std::time::Duration;

use bazaar_storefront::catalog::CatalogClient;
use bazaar_storefront::config::{CatalogConfig, parse_api_url};
use secrecy::SecretString;

/// Build a catalog client for a one-shot command.
///
/// Picks up `CATALOG_API_TOKEN` like the storefront does.
fn catalog_client(api_url: Option<&str>) -> Result<CatalogClient, Box<dyn std::error::Error>> {
    let raw = api_url.ok_or("CATALOG_API_URL not set (pass --api-url)")?;
    let base_url = parse_api_url("--api-url", raw)?;

    let config = CatalogConfig {
        base_url,
        api_token: std::env::var("CATALOG_API_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())
            .map(SecretString::from),
        cache_ttl: Duration::from_secs(60),
    };

    tracing::info!(catalog = %config.base_url, "Using catalog API");
    Ok(CatalogClient::new(&config))
}
