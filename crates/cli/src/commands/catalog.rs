//! Catalog listing commands.

use super::catalog_client;

/// List every product, fetched fresh.
///
/// # Errors
///
/// Returns an error if no API URL is configured or the request fails.
#[allow(clippy::print_stdout)]
pub async fn products(api_url: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let client = catalog_client(api_url)?;
    let products = client.products().await?;

    tracing::info!(count = products.len(), "Fetched products");

    for product in &products {
        let sizes: Vec<String> = product
            .variant_option
            .iter()
            .map(|v| format!("{}={}({})", v.size, v.id, v.stock))
            .collect();
        println!(
            "{:<32} {:>10} [{}] {}",
            product.slug,
            product.price,
            product.category_slugs().collect::<Vec<_>>().join(","),
            sizes.join(" ")
        );
    }

    Ok(())
}

/// List every category.
///
/// # Errors
///
/// Returns an error if no API URL is configured or the request fails.
#[allow(clippy::print_stdout)]
pub async fn categories(api_url: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let client = catalog_client(api_url)?;
    let categories = client.categories().await?;

    tracing::info!(count = categories.len(), "Fetched categories");

    for category in &categories {
        println!("{:<24} {}", category.slug, category.name);
    }

    Ok(())
}
