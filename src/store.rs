//! The authoritative inventory collection.
//!
//! Every operation is a full read-modify-write of one JSON blob against the
//! injected [`KeyValueStore`]: load the whole collection, mutate in memory,
//! write the whole collection back. No partial writes, no cross-process
//! coordination (see storage module notes).
//!
//! Mutating operations return `bool` and never propagate storage failures:
//! a failed write is logged and reported as `false`. Only the exit ledger
//! returns a `Result`, because over-stock requests are a caller error that
//! deserves a descriptive message.

use crate::error::{FrigoError, Result};
use crate::expiry::ExpiryStatus;
use crate::models::{
    Category, ExitEntry, InventoryItem, PriceHistoryEntry, PriceVariation, Product,
    EXIT_HISTORY_CAP, PRICE_HISTORY_CAP,
};
use crate::storage::KeyValueStore;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Storage key under which the collection blob lives.
pub const STORE_KEY: &str = "frigo_items";

/// Version written into the persisted envelope.
pub const STORE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct StoreEnvelope {
    version: u32,
    items: Vec<InventoryItem>,
}

/// Accepts both the versioned envelope and the historical bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredBlob {
    Envelope(StoreEnvelope),
    Bare(Vec<InventoryItem>),
}

/// Optional metadata accompanying an `add` call.
#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    pub category: Option<Category>,
    pub expiry_date: Option<NaiveDate>,
    pub price: Option<f64>,
    pub store: Option<String>,
}

/// Partial field update for [`InventoryStore::update`].
///
/// `expiry_date` is doubly optional: `None` leaves the DLC untouched,
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub quantity: Option<u32>,
    pub category: Option<Category>,
    pub expiry_date: Option<Option<NaiveDate>>,
    pub price: Option<f64>,
    pub store: Option<String>,
    pub quantity_label: Option<String>,
}

/// Inventory store over an injected durable key-value backend.
pub struct InventoryStore<S: KeyValueStore> {
    storage: S,
}

impl<S: KeyValueStore> InventoryStore<S> {
    pub fn new(storage: S) -> Self {
        InventoryStore { storage }
    }

    /// Loads the collection. Fail-soft: unreadable or corrupt storage logs
    /// and yields an empty collection, never an error.
    fn load(&self) -> Vec<InventoryItem> {
        let raw = match self.storage.get(STORE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                log::error!("Failed to read inventory blob: {}", e);
                return Vec::new();
            }
        };
        match serde_json::from_str::<StoredBlob>(&raw) {
            Ok(StoredBlob::Envelope(envelope)) => envelope.items,
            Ok(StoredBlob::Bare(items)) => items,
            Err(e) => {
                log::error!("Corrupt inventory blob, starting empty: {}", e);
                Vec::new()
            }
        }
    }

    fn save(&self, items: &[InventoryItem]) -> Result<()> {
        let envelope = StoreEnvelope {
            version: STORE_VERSION,
            items: items.to_vec(),
        };
        let raw = serde_json::to_string(&envelope)?;
        self.storage.set(STORE_KEY, &raw)
    }

    fn save_logged(&self, items: &[InventoryItem]) -> bool {
        match self.save(items) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to persist inventory: {}", e);
                false
            }
        }
    }

    /// Returns a snapshot of every item, in insertion order.
    pub fn get_all(&self) -> Vec<InventoryItem> {
        self.load()
    }

    /// Adds a product, merging into an existing item with the same identity
    /// key: quantity accumulates, the new call's metadata wins, `id` and
    /// `added_at` are preserved. Returns false on persistence failure.
    pub fn add(&self, product: Product, quantity: u32, opts: AddOptions) -> bool {
        let mut items = self.load();
        let key = product.identity_key();

        if let Some(item) = items.iter_mut().find(|i| i.identity_key() == key) {
            log::debug!("Merging add into existing item {} ({})", item.id, key);
            item.quantity += quantity;
            if let Some(category) = opts.category {
                item.category = category;
            }
            if let Some(dlc) = opts.expiry_date {
                item.expiry_date = Some(dlc);
            }
            apply_price_change(item, opts.price, opts.store);
        } else {
            let mut item = InventoryItem::new(
                product,
                quantity,
                opts.category.unwrap_or(Category::Autre),
            );
            item.expiry_date = opts.expiry_date;
            apply_price_change(&mut item, opts.price, opts.store);
            log::debug!("Created item {} ({})", item.id, key);
            items.push(item);
        }
        self.save_logged(&items)
    }

    /// Removes the item with the given id. Missing ids are treated as
    /// success (idempotent removal).
    pub fn remove(&self, id: &str) -> bool {
        let mut items = self.load();
        let before = items.len();
        items.retain(|i| i.id != id);
        if items.len() == before {
            log::debug!("remove({}) matched nothing", id);
            return true;
        }
        self.save_logged(&items)
    }

    /// Applies a partial update to the item with the given id.
    ///
    /// Price-ledger rule: when the patch changes the price or the store and
    /// both are defined afterwards, a history entry is appended (capped at
    /// 10, oldest evicted) before the rest of the patch lands. Unknown id
    /// is a no-op returning false.
    pub fn update(&self, id: &str, patch: ItemPatch) -> bool {
        let mut items = self.load();
        let Some(item) = items.iter_mut().find(|i| i.id == id) else {
            log::warn!("update({}): no such item", id);
            return false;
        };

        apply_price_change(item, patch.price, patch.store);
        if let Some(quantity) = patch.quantity {
            item.quantity = quantity;
        }
        if let Some(category) = patch.category {
            item.category = category;
        }
        if let Some(dlc) = patch.expiry_date {
            item.expiry_date = dlc;
        }
        if let Some(label) = patch.quantity_label {
            item.product.quantity_label = label;
        }
        self.save_logged(&items)
    }

    /// Increments stock of the item by `amount`.
    pub fn increment_quantity(&self, id: &str, amount: u32) -> bool {
        let mut items = self.load();
        let Some(item) = items.iter_mut().find(|i| i.id == id) else {
            log::warn!("increment_quantity({}): no such item", id);
            return false;
        };
        item.quantity += amount;
        self.save_logged(&items)
    }

    /// Sets stock of the item, flooring non-positive targets to 1.
    ///
    /// Legacy policy carried from the original tracker; use
    /// [`set_quantity`](Self::set_quantity) to represent zero stock.
    pub fn update_quantity(&self, id: &str, quantity: i64) -> bool {
        let floored = quantity.max(1) as u32;
        let mut items = self.load();
        let Some(item) = items.iter_mut().find(|i| i.id == id) else {
            log::warn!("update_quantity({}): no such item", id);
            return false;
        };
        item.quantity = floored;
        self.save_logged(&items)
    }

    /// Sets stock of the item to an exact count; zero means "out but
    /// retained".
    pub fn set_quantity(&self, id: &str, quantity: u32) -> bool {
        let mut items = self.load();
        let Some(item) = items.iter_mut().find(|i| i.id == id) else {
            log::warn!("set_quantity({}): no such item", id);
            return false;
        };
        item.quantity = quantity;
        self.save_logged(&items)
    }

    /// Deletes every item.
    pub fn clear(&self) -> bool {
        self.save_logged(&[])
    }

    pub fn get_count(&self) -> usize {
        self.load().len()
    }

    pub fn get_by_category(&self, category: Category) -> Vec<InventoryItem> {
        self.load()
            .into_iter()
            .filter(|i| i.category == category)
            .collect()
    }

    /// The set of categories actually in use.
    pub fn get_categories(&self) -> BTreeSet<Category> {
        self.load().iter().map(|i| i.category).collect()
    }

    /// Lookup by product identity key (not id).
    pub fn get_by_product(&self, product: &Product) -> Option<InventoryItem> {
        let key = product.identity_key();
        self.load().into_iter().find(|i| i.identity_key() == key)
    }

    pub fn is_in_frigo(&self, product: &Product) -> bool {
        self.get_by_product(product).is_some()
    }

    /// Difference between the two most recent price observations of the
    /// item, in insertion order. None if the item is missing or has fewer
    /// than two entries.
    pub fn price_variation(&self, id: &str) -> Option<PriceVariation> {
        let items = self.load();
        let item = items.iter().find(|i| i.id == id)?;
        let len = item.price_history.len();
        if len < 2 {
            return None;
        }
        let previous = &item.price_history[len - 2];
        let latest = &item.price_history[len - 1];
        let amount = latest.price - previous.price;
        Some(PriceVariation {
            amount,
            percentage_change: amount / previous.price * 100.0,
        })
    }

    /// Items whose DLC is strictly before `today`.
    pub fn get_expired(&self, today: NaiveDate) -> Vec<InventoryItem> {
        self.load()
            .into_iter()
            .filter(|i| ExpiryStatus::classify(i.expiry_date, today).is_expired())
            .collect()
    }

    /// Items whose DLC falls between `today` and `today + 3`, inclusive.
    pub fn get_expiring_soon(&self, today: NaiveDate) -> Vec<InventoryItem> {
        self.load()
            .into_iter()
            .filter(|i| ExpiryStatus::classify(i.expiry_date, today).is_soon())
            .collect()
    }

    /// Records a consumption event: validates the requested quantity
    /// against stock, decrements, and appends to the capped exit ledger.
    /// Over-stock requests fail before any mutation.
    pub fn record_exit(
        &self,
        id: &str,
        quantity: u32,
        reason: Option<String>,
        notes: Option<String>,
    ) -> Result<ExitEntry> {
        if quantity == 0 {
            return Err(FrigoError::ZeroExit);
        }
        let mut items = self.load();
        let Some(item) = items.iter_mut().find(|i| i.id == id) else {
            return Err(FrigoError::NotFound(id.to_string()));
        };
        if quantity > item.quantity {
            return Err(FrigoError::InsufficientStock {
                name: item.product.name.clone(),
                requested: quantity,
                available: item.quantity,
            });
        }
        let entry = ExitEntry {
            quantity,
            reason,
            notes,
            date: Utc::now(),
        };
        item.quantity -= quantity;
        item.exit_history.push(entry.clone());
        if item.exit_history.len() > EXIT_HISTORY_CAP {
            let excess = item.exit_history.len() - EXIT_HISTORY_CAP;
            item.exit_history.drain(..excess);
        }
        self.save(&items)?;
        Ok(entry)
    }

    /// Reconciles sanitized records into the store.
    ///
    /// Under merge, a candidate matching an existing identity key overwrites
    /// that item's fields while preserving its `id` and `added_at` (an
    /// import is a restore, not a purchase: quantities do not accumulate).
    /// Under replace, the store afterwards contains exactly the imported
    /// set. Returns (created, updated).
    pub fn reconcile(&self, candidates: Vec<InventoryItem>, merge: bool) -> Result<(usize, usize)> {
        let mut items = if merge { self.load() } else { Vec::new() };
        let mut index: HashMap<String, usize> = items
            .iter()
            .enumerate()
            .map(|(pos, item)| (item.identity_key(), pos))
            .collect();

        let mut created = 0;
        let mut updated = 0;
        for candidate in candidates {
            let key = candidate.identity_key();
            match index.get(&key) {
                Some(&pos) => {
                    let existing = &mut items[pos];
                    let id = existing.id.clone();
                    let added_at = existing.added_at;
                    *existing = candidate;
                    existing.id = id;
                    existing.added_at = added_at;
                    updated += 1;
                }
                None => {
                    // Index new inserts too: duplicate identities within one
                    // payload collapse instead of violating the invariant
                    index.insert(key, items.len());
                    items.push(candidate);
                    created += 1;
                }
            }
        }
        self.save(&items)?;
        Ok((created, updated))
    }
}

/// Applies a price/store change to an item, appending a ledger entry when
/// the effective price or store actually changed and both are defined.
fn apply_price_change(item: &mut InventoryItem, price: Option<f64>, store: Option<String>) {
    let price_changed = price.is_some() && price != item.current_price;
    let store_changed = store.is_some() && store != item.current_store;

    let new_price = price.or(item.current_price);
    let new_store = store.clone().or_else(|| item.current_store.clone());

    if (price_changed || store_changed) && new_price.is_some() && new_store.is_some() {
        item.price_history.push(PriceHistoryEntry {
            price: new_price.unwrap_or_default(),
            store: new_store.clone().unwrap_or_default(),
            date: Utc::now(),
        });
        if item.price_history.len() > PRICE_HISTORY_CAP {
            let excess = item.price_history.len() - PRICE_HISTORY_CAP;
            item.price_history.drain(..excess);
        }
    }
    if let Some(p) = price {
        item.current_price = Some(p);
    }
    if let Some(s) = store {
        item.current_store = Some(s);
    }
}
