//! Client-side cart ledger.
//!
//! The cart lives entirely on the client: an ordered list of [`LineItem`]s
//! persisted as a JSON snapshot in a storage medium the shop does not own
//! (a browser cookie in production). The ledger never stores prices; totals
//! are derived on every render by joining the lines against a fresh catalog
//! fetch (see [`pricing`]).
//!
//! # Identity
//!
//! Lines are merged on [`CartLedger::add`] when product id and size match,
//! while [`CartLedger::increase`], [`CartLedger::decrease`] and
//! [`CartLedger::remove`] address lines by variant id. The two keys usually
//! agree, but a product with two variants sharing a size label would merge
//! into one line on add. That behaviour is kept deliberately.
//!
//! # Consistency
//!
//! Every mutation rewrites the full snapshot. Two writers sharing the same
//! storage (two browser tabs) are last-writer-wins; nothing detects or
//! reconciles a lost update.

mod codec;
mod ledger;
mod line_item;
pub mod pricing;
mod storage;

pub use codec::{CART_STORAGE_KEY, decode_snapshot, encode_snapshot};
pub use ledger::CartLedger;
pub use line_item::{LineItem, NewLineItem};
pub use pricing::{PriceIndex, cart_total, item_count, line_total};
pub use storage::{CartStorage, MemoryStorage, StorageError};
