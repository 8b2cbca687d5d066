//! Frigo - personal food inventory tracker.
//!
//! Tracks owned product items with stock counts, expiry dates (DLC),
//! purchase price history and categories. The store merges duplicate adds
//! by product identity, keeps an append-only capped price ledger per item,
//! and reconciles JSON/CSV imports under merge or replace semantics.

pub mod error;
pub mod exchange;
pub mod expiry;
pub mod formatters;
pub mod models;
pub mod query;
pub mod storage;
pub mod store;

// Re-export commonly used items
pub use error::{FrigoError, Result};
pub use exchange::{export_csv, export_json, import_data, ImportFormat, ImportReport};
pub use expiry::{ExpiryReport, ExpiryStatus};
pub use formatters::{format_human_csv, format_shopping_list};
pub use models::{
    identity_key, Category, ExitEntry, InventoryItem, NutriScore, PriceHistoryEntry,
    PriceVariation, Product,
};
pub use query::{query, ExpiryBucket, ItemFilter, SortBy};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
pub use store::{AddOptions, InventoryStore, ItemPatch};
