//! Bazaar Core - Shared types, catalog model and the cart ledger.
//!
//! This crate provides the pieces shared by every Bazaar component:
//! - `storefront` - Public-facing shop (catalog browsing and cart)
//! - `cli` - Command-line tools for inspecting carts and the catalog
//!
//! # Architecture
//!
//! The core crate contains only types, traits and pure logic - no network
//! access, no HTTP clients. Persistence of the cart goes through the
//! [`cart::CartStorage`] trait so the storefront can back it with a cookie
//! and tests can back it with memory.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and prices
//! - [`catalog`] - Product and category records served by the catalog API
//! - [`cart`] - The cart ledger, its snapshot codec and price derivation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod types;

pub use types::*;
