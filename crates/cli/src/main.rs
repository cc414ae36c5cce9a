//! Bazaar CLI - cart cookie inspection and catalog queries.
//!
//! # Usage
//!
//! ```bash
//! # Show the lines stored in a cart cookie value
//! bazaar cart decode '%5B%7B%22productId%22...'
//!
//! # Price a cart cookie against the live catalog
//! bazaar cart total '%5B%7B%22productId%22...' --api-url https://api.example.com/api/v1
//!
//! # List the catalog
//! bazaar catalog products
//! bazaar catalog categories
//! ```
//!
//! `--api-url` falls back to `CATALOG_API_URL` (a `.env` file is honored).

#![cfg_attr(not(test), forbid(unsafe_code))]

use bazaar_core::CurrencyCode;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bazaar")]
#[command(author, version, about = "Bazaar CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect cart cookie values
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Query the catalog API
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,

        /// Catalog API base URL
        #[arg(long, env = "CATALOG_API_URL", global = true)]
        api_url: Option<String>,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Decode a raw `cart` cookie value and list its lines
    Decode {
        /// Cookie value, percent-encoded or plain JSON (a leading `cart=` is ignored)
        value: String,

        /// Print the decoded lines as JSON
        #[arg(long)]
        json: bool,
    },
    /// Price a `cart` cookie value against the current catalog
    Total {
        /// Cookie value, percent-encoded or plain JSON (a leading `cart=` is ignored)
        value: String,

        /// Catalog API base URL
        #[arg(long, env = "CATALOG_API_URL")]
        api_url: Option<String>,

        /// Currency used for display
        #[arg(long, env = "STOREFRONT_CURRENCY", default_value = "BDT")]
        currency: CurrencyCode,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List every product with its price and sizes
    Products,
    /// List every category
    Categories,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Before parsing so `env = "..."` arguments see `.env` values.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Decode { value, json } => commands::cart::decode(&value, json)?,
            CartAction::Total {
                value,
                api_url,
                currency,
            } => commands::cart::total(&value, api_url.as_deref(), currency).await?,
        },
        Commands::Catalog { action, api_url } => match action {
            CatalogAction::Products => commands::catalog::products(api_url.as_deref()).await?,
            CatalogAction::Categories => {
                commands::catalog::categories(api_url.as_deref()).await?;
            }
        },
    }
    Ok(())
}
