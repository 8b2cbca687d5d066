//! Stateless filter/sort engine over inventory snapshots.
//!
//! Filters compose conjunctively; the sort is applied last and is stable.

use crate::expiry::ExpiryStatus;
use crate::models::{Category, InventoryItem};
use chrono::NaiveDate;

/// Expiry bucket selectable in a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryBucket {
    Expired,
    Soon,
    Ok,
}

/// Sort order for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    /// Newest first (default)
    #[default]
    DateAdded,
    /// Case-insensitive ascending
    Name,
    /// Descending, missing price treated as 0
    Price,
    /// Ascending by DLC; items without one sort last
    Expiry,
}

/// Filter/sort parameters. An empty filter passes everything through
/// sorted newest-first.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub category: Option<Category>,
    /// Case-insensitive substring, matched against name, brand, category
    /// and store (OR semantics)
    pub text: Option<String>,
    /// Items without a DLC never match a bucket filter
    pub expiry: Option<ExpiryBucket>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub sort: SortBy,
}

/// Derives a filtered, sorted view over a snapshot.
pub fn query(items: &[InventoryItem], filter: &ItemFilter, today: NaiveDate) -> Vec<InventoryItem> {
    let mut matched: Vec<InventoryItem> = items
        .iter()
        .filter(|item| matches(item, filter, today))
        .cloned()
        .collect();
    sort(&mut matched, filter.sort);
    matched
}

fn matches(item: &InventoryItem, filter: &ItemFilter, today: NaiveDate) -> bool {
    if let Some(category) = filter.category {
        if item.category != category {
            return false;
        }
    }

    if let Some(text) = filter.text.as_deref() {
        let needle = text.trim().to_lowercase();
        if !needle.is_empty() && !text_matches(item, &needle) {
            return false;
        }
    }

    if let Some(bucket) = filter.expiry {
        let status = ExpiryStatus::classify(item.expiry_date, today);
        let hit = match (bucket, status) {
            (ExpiryBucket::Expired, ExpiryStatus::Expired { .. }) => true,
            (ExpiryBucket::Soon, ExpiryStatus::Soon { .. }) => true,
            (ExpiryBucket::Ok, ExpiryStatus::Ok { .. }) => true,
            _ => false,
        };
        if !hit {
            return false;
        }
    }

    if filter.min_price.is_some() || filter.max_price.is_some() {
        // Price filters exclude items without a tracked price
        let Some(price) = item.current_price else {
            return false;
        };
        if let Some(min) = filter.min_price {
            if price < min {
                return false;
            }
        }
        if let Some(max) = filter.max_price {
            if price > max {
                return false;
            }
        }
    }

    true
}

fn text_matches(item: &InventoryItem, needle: &str) -> bool {
    item.product.name.to_lowercase().contains(needle)
        || item.product.brand.to_lowercase().contains(needle)
        || item.category.as_str().to_lowercase().contains(needle)
        || item
            .current_store
            .as_deref()
            .map(|s| s.to_lowercase().contains(needle))
            .unwrap_or(false)
}

fn sort(items: &mut [InventoryItem], order: SortBy) {
    match order {
        SortBy::DateAdded => items.sort_by(|a, b| b.added_at.cmp(&a.added_at)),
        SortBy::Name => items.sort_by(|a, b| {
            a.product
                .name
                .to_lowercase()
                .cmp(&b.product.name.to_lowercase())
        }),
        SortBy::Price => items.sort_by(|a, b| {
            let pa = a.current_price.unwrap_or(0.0);
            let pb = b.current_price.unwrap_or(0.0);
            pb.partial_cmp(&pa).unwrap_or(std::cmp::Ordering::Equal)
        }),
        SortBy::Expiry => items.sort_by(|a, b| match (a.expiry_date, b.expiry_date) {
            (Some(da), Some(db)) => da.cmp(&db),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Product;
    use chrono::{Duration, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_item(name: &str, category: Category) -> InventoryItem {
        let mut product = Product::named(name);
        product.brand = "Marque Test".to_string();
        InventoryItem::new(product, 1, category)
    }

    fn fixture() -> Vec<InventoryItem> {
        let mut lait = make_item("Lait demi-écrémé", Category::ProduitsLaitiers);
        lait.current_price = Some(1.0);
        lait.current_store = Some("Carrefour".to_string());
        lait.expiry_date = Some(date(2026, 3, 2));

        let mut yaourt = make_item("Yaourt nature", Category::ProduitsLaitiers);
        yaourt.current_price = Some(5.0);
        yaourt.expiry_date = Some(date(2026, 2, 20));

        let mut jus = make_item("Jus d'orange", Category::Boissons);
        jus.current_price = Some(10.0);
        jus.expiry_date = Some(date(2026, 6, 1));

        let sel = make_item("Sel fin", Category::Epicerie);

        vec![lait, yaourt, jus, sel]
    }

    const TODAY: (i32, u32, u32) = (2026, 3, 1);

    fn run(filter: ItemFilter) -> Vec<String> {
        let (y, m, d) = TODAY;
        query(&fixture(), &filter, date(y, m, d))
            .into_iter()
            .map(|i| i.product.name)
            .collect()
    }

    #[test]
    fn empty_filter_passes_everything() {
        assert_eq!(run(ItemFilter::default()).len(), 4);
    }

    #[test]
    fn category_filter_is_exact() {
        let names = run(ItemFilter {
            category: Some(Category::ProduitsLaitiers),
            sort: SortBy::Name,
            ..Default::default()
        });
        assert_eq!(names, vec!["Lait demi-écrémé", "Yaourt nature"]);
    }

    #[test]
    fn text_filter_matches_name_case_insensitive() {
        let names = run(ItemFilter {
            text: Some("DEMI".to_string()),
            sort: SortBy::Name,
            ..Default::default()
        });
        assert_eq!(names, vec!["Lait demi-écrémé"]);
    }

    #[test]
    fn text_filter_reaches_category_label_too() {
        // "lait" hits one item by name and a second through "Produits laitiers".
        let names = run(ItemFilter {
            text: Some("LAIT".to_string()),
            sort: SortBy::Name,
            ..Default::default()
        });
        assert_eq!(names, vec!["Lait demi-écrémé", "Yaourt nature"]);
    }

    #[test]
    fn text_filter_matches_store() {
        let names = run(ItemFilter {
            text: Some("carrefour".to_string()),
            ..Default::default()
        });
        assert_eq!(names, vec!["Lait demi-écrémé"]);
    }

    #[test]
    fn text_filter_matches_category_label() {
        let names = run(ItemFilter {
            text: Some("boissons".to_string()),
            ..Default::default()
        });
        assert_eq!(names, vec!["Jus d'orange"]);
    }

    #[test]
    fn blank_text_filter_is_ignored() {
        assert_eq!(run(ItemFilter {
            text: Some("   ".to_string()),
            ..Default::default()
        })
        .len(), 4);
    }

    #[test]
    fn expiry_bucket_filter() {
        let expired = run(ItemFilter {
            expiry: Some(ExpiryBucket::Expired),
            ..Default::default()
        });
        assert_eq!(expired, vec!["Yaourt nature"]);

        let soon = run(ItemFilter {
            expiry: Some(ExpiryBucket::Soon),
            ..Default::default()
        });
        assert_eq!(soon, vec!["Lait demi-écrémé"]);
    }

    #[test]
    fn dateless_items_never_match_a_bucket() {
        for bucket in [ExpiryBucket::Expired, ExpiryBucket::Soon, ExpiryBucket::Ok] {
            let names = run(ItemFilter {
                expiry: Some(bucket),
                ..Default::default()
            });
            assert!(!names.contains(&"Sel fin".to_string()));
        }
    }

    #[test]
    fn price_range_excludes_priceless_items() {
        let names = run(ItemFilter {
            min_price: Some(0.0),
            ..Default::default()
        });
        assert_eq!(names.len(), 3, "Sel fin has no price");
    }

    #[test]
    fn price_range_bounds_are_inclusive() {
        let names = run(ItemFilter {
            min_price: Some(1.0),
            max_price: Some(5.0),
            sort: SortBy::Name,
            ..Default::default()
        });
        assert_eq!(names, vec!["Lait demi-écrémé", "Yaourt nature"]);
    }

    #[test]
    fn filters_compose_conjunctively() {
        let names = run(ItemFilter {
            category: Some(Category::ProduitsLaitiers),
            min_price: Some(2.0),
            max_price: Some(8.0),
            ..Default::default()
        });
        assert_eq!(names, vec!["Yaourt nature"]);
    }

    #[test]
    fn sort_by_date_added_is_newest_first() {
        let mut old = make_item("Ancien", Category::Autre);
        old.added_at = Utc::now() - Duration::days(7);
        let recent = make_item("Récent", Category::Autre);

        let sorted = query(
            &[old, recent],
            &ItemFilter::default(),
            date(2026, 3, 1),
        );
        assert_eq!(sorted[0].product.name, "Récent");
    }

    #[test]
    fn sort_by_price_descending_missing_as_zero() {
        let names = run(ItemFilter {
            sort: SortBy::Price,
            ..Default::default()
        });
        assert_eq!(
            names,
            vec!["Jus d'orange", "Yaourt nature", "Lait demi-écrémé", "Sel fin"]
        );
    }

    #[test]
    fn sort_by_expiry_puts_dateless_last() {
        let names = run(ItemFilter {
            sort: SortBy::Expiry,
            ..Default::default()
        });
        assert_eq!(
            names,
            vec!["Yaourt nature", "Lait demi-écrémé", "Jus d'orange", "Sel fin"]
        );
    }
}
