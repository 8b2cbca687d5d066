//! Display-only output formats: plain-text shopping list and the
//! French-labelled CSV. Neither is a machine interchange format; the
//! canonical schema lives in the exchange module (though the French
//! headers re-import through the same aliased record shape).

use crate::error::{FrigoError, Result};
use crate::models::{Category, InventoryItem};

/// French display CSV column labels.
pub const DISPLAY_CSV_HEADER: [&str; 10] = [
    "Nom",
    "Marque",
    "Quantité",
    "Catégorie",
    "DLC",
    "Prix (EUR)",
    "Magasin",
    "Ajouté le",
    "NutriScore",
    "Commentaires",
];

/// Formats a plain-text shopping list grouped by category, one line per
/// item: `• Name (xQty) – Category – DLC date`.
pub fn format_shopping_list(items: &[InventoryItem]) -> String {
    let mut output = String::new();

    for category in Category::all() {
        let in_category: Vec<&InventoryItem> =
            items.iter().filter(|i| i.category == *category).collect();
        if in_category.is_empty() {
            continue;
        }

        output.push_str(&format!("{}\n", category.as_str()));
        for item in in_category {
            let dlc = item
                .expiry_date
                .map(|d| format!(" – DLC {}", d.format("%d/%m/%Y")))
                .unwrap_or_default();
            output.push_str(&format!(
                "• {} (x{}) – {}{}\n",
                item.product.name,
                item.quantity,
                category.as_str(),
                dlc
            ));
        }
        output.push('\n');
    }

    output
}

/// Formats the human-labelled CSV variant. Quoting comes from the same
/// `csv` writer the canonical export uses.
pub fn format_human_csv(items: &[InventoryItem]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(Vec::new());
    writer.write_record(DISPLAY_CSV_HEADER)?;
    for item in items {
        writer.write_record([
            item.product.name.clone(),
            item.product.brand.clone(),
            item.quantity.to_string(),
            item.category.as_str().to_string(),
            item.expiry_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            item.current_price
                .map(|p| format!("{:.2}", p))
                .unwrap_or_default(),
            item.current_store.clone().unwrap_or_default(),
            item.added_at.format("%Y-%m-%d").to_string(),
            item.product.nutri_score.as_str().to_uppercase(),
            // Commentaires: the packaging size is the only free text we track
            item.product.quantity_label.clone(),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| FrigoError::Storage(format!("CSV buffer error: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| FrigoError::Payload(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Product;
    use chrono::NaiveDate;

    fn make_item(name: &str, quantity: u32, category: Category) -> InventoryItem {
        InventoryItem::new(Product::named(name), quantity, category)
    }

    #[test]
    fn shopping_list_groups_by_category() {
        let items = vec![
            make_item("Lait", 2, Category::ProduitsLaitiers),
            make_item("Pain", 1, Category::Boulangerie),
            make_item("Yaourt", 4, Category::ProduitsLaitiers),
        ];
        let out = format_shopping_list(&items);

        let laitiers_pos = out.find("Produits Laitiers").unwrap();
        let boulangerie_pos = out.find("Boulangerie").unwrap();
        assert!(laitiers_pos < boulangerie_pos, "categories in display order");
        assert!(out.contains("• Lait (x2) – Produits Laitiers"));
        assert!(out.contains("• Pain (x1) – Boulangerie"));
    }

    #[test]
    fn shopping_list_includes_dlc_when_present() {
        let mut item = make_item("Lait", 1, Category::ProduitsLaitiers);
        item.expiry_date = NaiveDate::from_ymd_opt(2026, 3, 15);
        let out = format_shopping_list(&[item]);
        assert!(out.contains("DLC 15/03/2026"));
    }

    #[test]
    fn shopping_list_skips_empty_categories() {
        let out = format_shopping_list(&[make_item("Lait", 1, Category::ProduitsLaitiers)]);
        assert!(!out.contains("Surgelés"));
    }

    #[test]
    fn human_csv_has_french_header() {
        let out = format_human_csv(&[]).unwrap();
        assert_eq!(out.lines().next().unwrap(), DISPLAY_CSV_HEADER.join(";"));
    }

    #[test]
    fn human_csv_quotes_delimiter_in_fields() {
        let item = make_item("Pâtes; complètes", 1, Category::Epicerie);
        let out = format_human_csv(&[item]).unwrap();
        assert!(out.contains("\"Pâtes; complètes\""));
    }

    #[test]
    fn human_csv_formats_price_with_two_decimals() {
        let mut item = make_item("Lait", 1, Category::ProduitsLaitiers);
        item.current_price = Some(1.5);
        let out = format_human_csv(&[item]).unwrap();
        assert!(out.contains(";1.50;"));
    }
}
