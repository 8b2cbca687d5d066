//! Permissive wire shape for import payloads.
//!
//! One `RawRecord` accepts every accepted input: exported JSON items
//! (nested `product`), flat JSON objects, canonical CSV columns and the
//! French display CSV columns (via serde aliases). CSV rows are funneled
//! through `serde_json::Value` so both formats share this single shape.

use serde::Deserialize;
use std::collections::BTreeMap;

/// Nested product shape found in exported inventory items.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawProduct {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub ingredients_text: Option<String>,
    #[serde(default)]
    pub nutrients: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    pub quantity_label: Option<String>,
    #[serde(default)]
    pub nutri_score: Option<String>,
}

/// Unvalidated price history entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPriceEntry {
    #[serde(default)]
    pub price: Option<serde_json::Value>,
    #[serde(default)]
    pub store: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

/// Unvalidated exit ledger entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RawExitEntry {
    #[serde(default)]
    pub quantity: Option<serde_json::Value>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

/// One record of an import payload, before sanitization.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawRecord {
    #[serde(default, alias = "product_name", alias = "Nom", alias = "nom")]
    pub name: Option<String>,
    #[serde(default, alias = "brands", alias = "Marque", alias = "marque")]
    pub brand: Option<String>,
    /// Number in JSON, string in CSV
    #[serde(default, alias = "Quantité", alias = "quantite")]
    pub quantity: Option<serde_json::Value>,
    #[serde(default, alias = "Catégorie", alias = "categorie")]
    pub category: Option<String>,
    #[serde(default, alias = "dlc", alias = "DLC")]
    pub expiry_date: Option<String>,
    #[serde(
        default,
        alias = "current_price",
        alias = "price",
        alias = "Prix (EUR)",
        alias = "prix"
    )]
    pub current_price: Option<serde_json::Value>,
    #[serde(
        default,
        alias = "current_store",
        alias = "store",
        alias = "Magasin",
        alias = "magasin"
    )]
    pub current_store: Option<String>,
    #[serde(default, alias = "Ajouté le", alias = "ajoute_le")]
    pub added_at: Option<String>,
    #[serde(default, alias = "nutriscore", alias = "NutriScore")]
    pub nutri_score: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub ingredients_text: Option<String>,
    #[serde(default)]
    pub nutrients: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    pub quantity_label: Option<String>,
    #[serde(default)]
    pub price_history: Option<Vec<RawPriceEntry>>,
    #[serde(default)]
    pub exit_history: Option<Vec<RawExitEntry>>,
    /// Present when the record is a full exported inventory item
    #[serde(default)]
    pub product: Option<RawProduct>,
}

impl RawRecord {
    /// Effective product name: flat field first, then nested product.
    pub fn effective_name(&self) -> Option<String> {
        pick(&self.name).or_else(|| pick(&self.product.as_ref().and_then(|p| p.name.clone())))
    }

    /// Effective brand, same resolution order as the name.
    pub fn effective_brand(&self) -> Option<String> {
        pick(&self.brand).or_else(|| pick(&self.product.as_ref().and_then(|p| p.brand.clone())))
    }
}

/// Trims a textual field, mapping empty strings to None.
fn pick(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_flat_shape() {
        let raw: RawRecord =
            serde_json::from_str(r#"{"name": "Lait", "brand": "Lactel", "quantity": 2}"#).unwrap();
        assert_eq!(raw.effective_name().as_deref(), Some("Lait"));
        assert_eq!(raw.effective_brand().as_deref(), Some("Lactel"));
    }

    #[test]
    fn accepts_nested_product_shape() {
        let raw: RawRecord = serde_json::from_str(
            r#"{"product": {"name": "Lait", "brand": "Lactel"}, "quantity": 2}"#,
        )
        .unwrap();
        assert_eq!(raw.effective_name().as_deref(), Some("Lait"));
        assert_eq!(raw.effective_brand().as_deref(), Some("Lactel"));
    }

    #[test]
    fn accepts_french_display_columns() {
        let raw: RawRecord = serde_json::from_str(
            r#"{"Nom": "Lait", "Marque": "Lactel", "Prix (EUR)": "1,15", "Magasin": "Leclerc"}"#,
        )
        .unwrap();
        assert_eq!(raw.effective_name().as_deref(), Some("Lait"));
        assert!(raw.current_price.is_some());
        assert_eq!(raw.current_store.as_deref(), Some("Leclerc"));
    }

    #[test]
    fn blank_name_is_treated_as_missing() {
        let raw: RawRecord = serde_json::from_str(r#"{"name": "   "}"#).unwrap();
        assert!(raw.effective_name().is_none());
    }
}
