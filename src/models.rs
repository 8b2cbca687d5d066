//! Core data model: products, inventory items, categories and ledgers.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Maximum number of price history entries kept per item (oldest evicted first).
pub const PRICE_HISTORY_CAP: usize = 10;

/// Maximum number of exit (consumption) entries kept per item.
pub const EXIT_HISTORY_CAP: usize = 50;

/// Sentinel brand used when a product has no brand information.
pub const UNKNOWN_BRAND: &str = "Marque inconnue";

/// Represents the closed set of inventory categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    FruitsLegumes,
    ViandesPoissons,
    ProduitsLaitiers,
    Epicerie,
    Boissons,
    Surgeles,
    Boulangerie,
    Autre,
}

impl Category {
    /// Returns the display label of the category (e.g., "Fruits & Légumes")
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::FruitsLegumes => "Fruits & Légumes",
            Category::ViandesPoissons => "Viandes & Poissons",
            Category::ProduitsLaitiers => "Produits Laitiers",
            Category::Epicerie => "Épicerie",
            Category::Boissons => "Boissons",
            Category::Surgeles => "Surgelés",
            Category::Boulangerie => "Boulangerie",
            Category::Autre => "Autre",
        }
    }

    /// Maps any input to the closed category set. Unrecognized or empty
    /// values map to `Autre`; never fails.
    pub fn normalize(raw: &str) -> Self {
        let folded = raw.trim().to_lowercase();
        match folded.as_str() {
            "fruits & légumes" | "fruits & legumes" | "fruits et légumes" | "fruits"
            | "légumes" | "legumes" => Category::FruitsLegumes,
            "viandes & poissons" | "viandes et poissons" | "viandes" | "poissons" => {
                Category::ViandesPoissons
            }
            "produits laitiers" | "laitier" | "laitiers" => Category::ProduitsLaitiers,
            "épicerie" | "epicerie" => Category::Epicerie,
            "boissons" | "boisson" => Category::Boissons,
            "surgelés" | "surgeles" | "surgelé" | "surgele" => Category::Surgeles,
            "boulangerie" => Category::Boulangerie,
            _ => Category::Autre,
        }
    }

    /// Returns all categories in display order
    pub fn all() -> &'static [Category] {
        &[
            Category::FruitsLegumes,
            Category::ViandesPoissons,
            Category::ProduitsLaitiers,
            Category::Epicerie,
            Category::Boissons,
            Category::Surgeles,
            Category::Boulangerie,
            Category::Autre,
        ]
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Autre
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Category {
    fn from(raw: String) -> Self {
        Category::normalize(&raw)
    }
}

impl From<Category> for String {
    fn from(cat: Category) -> Self {
        cat.as_str().to_string()
    }
}

/// Nutri-Score grade of a product (a-e), or unknown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NutriScore {
    A,
    B,
    C,
    D,
    E,
    Unknown,
}

impl NutriScore {
    /// Parse a grade letter, case-insensitive; anything else is `Unknown`
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "a" => NutriScore::A,
            "b" => NutriScore::B,
            "c" => NutriScore::C,
            "d" => NutriScore::D,
            "e" => NutriScore::E,
            _ => NutriScore::Unknown,
        }
    }

    /// Lowercase letter form, empty string when unknown
    pub fn as_str(&self) -> &'static str {
        match self {
            NutriScore::A => "a",
            NutriScore::B => "b",
            NutriScore::C => "c",
            NutriScore::D => "d",
            NutriScore::E => "e",
            NutriScore::Unknown => "",
        }
    }
}

impl Default for NutriScore {
    fn default() -> Self {
        NutriScore::Unknown
    }
}

impl From<String> for NutriScore {
    fn from(raw: String) -> Self {
        NutriScore::parse(&raw)
    }
}

impl From<NutriScore> for String {
    fn from(score: NutriScore) -> Self {
        score.as_str().to_string()
    }
}

fn default_brand() -> String {
    UNKNOWN_BRAND.to_string()
}

/// A purchasable good, externally sourced (barcode lookup) or user-entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    #[serde(default = "default_brand")]
    pub brand: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub ingredients_text: String,
    /// Opaque nutrition facts passthrough (per-100g values, serving sizes, ...)
    #[serde(default)]
    pub nutrients: BTreeMap<String, serde_json::Value>,
    /// Free-text packaging size, e.g. "500g"
    #[serde(default)]
    pub quantity_label: String,
    #[serde(default)]
    pub nutri_score: NutriScore,
}

impl Product {
    /// Creates a product from just a name, with the unknown-brand sentinel
    pub fn named(name: &str) -> Self {
        Product {
            name: name.to_string(),
            brand: default_brand(),
            image_url: String::new(),
            ingredients_text: String::new(),
            nutrients: BTreeMap::new(),
            quantity_label: String::new(),
            nutri_score: NutriScore::Unknown,
        }
    }

    /// Stable identity key of this product, see [`identity_key`]
    pub fn identity_key(&self) -> String {
        identity_key(&self.name, &self.brand)
    }
}

/// Derives the stable identity key used for duplicate detection.
///
/// Two products with the same key are "the same purchasable good" for
/// merge purposes, regardless of casing or surrounding whitespace.
pub fn identity_key(name: &str, brand: &str) -> String {
    format!(
        "{}|{}",
        name.trim().to_lowercase(),
        brand.trim().to_lowercase()
    )
}

/// One recorded purchase price observation, appended automatically
/// whenever an item's price or store changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistoryEntry {
    pub price: f64,
    pub store: String,
    pub date: DateTime<Utc>,
}

/// One consumption/removal event from the exit ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitEntry {
    pub quantity: u32,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub date: DateTime<Utc>,
}

/// The core aggregate: one owned product with stock count, expiry and ledgers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Unique, generated at creation, never reused
    pub id: String,
    pub product: Product,
    /// Set once at creation, immutable thereafter
    pub added_at: DateTime<Utc>,
    /// Current stock count; 0 means "out but retained"
    pub quantity: u32,
    #[serde(default)]
    pub category: Category,
    /// DLC; absence means "no tracked expiry"
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub current_store: Option<String>,
    #[serde(default)]
    pub price_history: Vec<PriceHistoryEntry>,
    #[serde(default)]
    pub exit_history: Vec<ExitEntry>,
}

impl InventoryItem {
    /// Creates a fresh item with a new id and `added_at = now`
    pub fn new(product: Product, quantity: u32, category: Category) -> Self {
        InventoryItem {
            id: uuid::Uuid::new_v4().to_string(),
            product,
            added_at: Utc::now(),
            quantity,
            category,
            expiry_date: None,
            current_price: None,
            current_store: None,
            price_history: Vec::new(),
            exit_history: Vec::new(),
        }
    }

    /// Identity key of the underlying product
    pub fn identity_key(&self) -> String {
        self.product.identity_key()
    }
}

/// Difference between the two most recent price observations of an item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceVariation {
    /// `latest.price - previous.price`
    pub amount: f64,
    /// `amount / previous.price * 100`
    pub percentage_change: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_key_is_case_insensitive() {
        assert_eq!(identity_key("Lait", "Lactel"), identity_key("lait", "LACTEL"));
    }

    #[test]
    fn identity_key_trims_whitespace() {
        assert_eq!(identity_key("  Lait ", "Lactel"), "lait|lactel");
    }

    #[test]
    fn identity_key_distinguishes_brands() {
        assert_ne!(identity_key("Lait", "Lactel"), identity_key("Lait", "Candia"));
    }

    #[test]
    fn category_normalize_known_labels() {
        assert_eq!(Category::normalize("Produits Laitiers"), Category::ProduitsLaitiers);
        assert_eq!(Category::normalize("épicerie"), Category::Epicerie);
        assert_eq!(Category::normalize("EPICERIE"), Category::Epicerie);
        assert_eq!(Category::normalize("surgeles"), Category::Surgeles);
    }

    #[test]
    fn category_normalize_unknown_is_autre() {
        assert_eq!(Category::normalize("Bricolage"), Category::Autre);
        assert_eq!(Category::normalize(""), Category::Autre);
    }

    #[test]
    fn category_serde_round_trip() {
        let json = serde_json::to_string(&Category::FruitsLegumes).unwrap();
        assert_eq!(json, "\"Fruits & Légumes\"");
        let back: Category = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Category::FruitsLegumes);
    }

    #[test]
    fn category_deserialize_never_fails() {
        let cat: Category = serde_json::from_str("\"n'importe quoi\"").unwrap();
        assert_eq!(cat, Category::Autre);
    }

    #[test]
    fn nutri_score_parse() {
        assert_eq!(NutriScore::parse("A"), NutriScore::A);
        assert_eq!(NutriScore::parse("e"), NutriScore::E);
        assert_eq!(NutriScore::parse(""), NutriScore::Unknown);
        assert_eq!(NutriScore::parse("z"), NutriScore::Unknown);
    }

    #[test]
    fn product_brand_defaults_to_sentinel() {
        let product: Product = serde_json::from_str(r#"{"name": "Pain"}"#).unwrap();
        assert_eq!(product.brand, UNKNOWN_BRAND);
    }

    #[test]
    fn item_deserializes_without_ledgers() {
        // Blobs written before the exit ledger existed must still load.
        let json = r#"{
            "id": "abc",
            "product": {"name": "Pain", "brand": "X"},
            "added_at": "2026-01-01T10:00:00Z",
            "quantity": 2
        }"#;
        let item: InventoryItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.quantity, 2);
        assert_eq!(item.category, Category::Autre);
        assert!(item.price_history.is_empty());
        assert!(item.exit_history.is_empty());
    }
}
