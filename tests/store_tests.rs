//! End-to-end inventory store tests against the SQLite backend.

use frigo::{
    AddOptions, Category, InventoryStore, ItemPatch, MemoryStore, Product, SortBy, SqliteStore,
};
use chrono::NaiveDate;

fn make_product(name: &str, brand: &str) -> Product {
    let mut product = Product::named(name);
    product.brand = brand.to_string();
    product
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn inventory_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frigo.db");

    {
        let store = InventoryStore::new(SqliteStore::open(&path).unwrap());
        assert!(store.add(
            make_product("Lait", "Lactel"),
            2,
            AddOptions {
                category: Some(Category::ProduitsLaitiers),
                expiry_date: Some(date(2026, 3, 10)),
                price: Some(1.15),
                store: Some("Carrefour".to_string()),
            },
        ));
    }

    let store = InventoryStore::new(SqliteStore::open(&path).unwrap());
    let items = store.get_all();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].product.name, "Lait");
    assert_eq!(items[0].quantity, 2);
    assert_eq!(items[0].category, Category::ProduitsLaitiers);
    assert_eq!(items[0].current_price, Some(1.15));
    assert_eq!(items[0].price_history.len(), 1);
}

#[test]
fn merge_then_consume_workflow() {
    let store = InventoryStore::new(SqliteStore::open_in_memory().unwrap());

    // Two purchases of the same good, distinct casing
    store.add(make_product("Jus d'orange", "Tropicana"), 2, AddOptions::default());
    store.add(make_product("JUS D'ORANGE", "tropicana"), 3, AddOptions::default());
    assert_eq!(store.get_count(), 1);

    let id = store.get_all()[0].id.clone();
    store.record_exit(&id, 4, Some("petit déjeuner".to_string()), None).unwrap();

    let item = &store.get_all()[0];
    assert_eq!(item.quantity, 1);
    assert_eq!(item.exit_history.len(), 1);
}

#[test]
fn price_ledger_across_updates_and_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frigo.db");

    let id = {
        let store = InventoryStore::new(SqliteStore::open(&path).unwrap());
        store.add(make_product("Beurre", "Président"), 1, AddOptions::default());
        let id = store.get_all()[0].id.clone();
        for (price, shop) in [(2.4, "Leclerc"), (2.6, "Carrefour"), (2.5, "Leclerc")] {
            store.update(
                &id,
                ItemPatch {
                    price: Some(price),
                    store: Some(shop.to_string()),
                    ..Default::default()
                },
            );
        }
        id
    };

    let store = InventoryStore::new(SqliteStore::open(&path).unwrap());
    let item = &store.get_all()[0];
    assert_eq!(item.id, id);
    assert_eq!(item.price_history.len(), 3);

    let variation = store.price_variation(&id).unwrap();
    assert!((variation.amount + 0.1).abs() < 1e-9, "2.6 -> 2.5 is -0.1");
}

#[test]
fn query_composes_over_store_snapshot() {
    let store = InventoryStore::new(MemoryStore::new());
    for (name, category, price) in [
        ("Pomme", Category::FruitsLegumes, Some(1.0)),
        ("Poire", Category::FruitsLegumes, Some(5.0)),
        ("Banane", Category::FruitsLegumes, Some(10.0)),
        ("Coca", Category::Boissons, Some(3.0)),
    ] {
        store.add(
            make_product(name, "X"),
            1,
            AddOptions {
                category: Some(category),
                price,
                store: Some("Leclerc".to_string()),
                ..Default::default()
            },
        );
    }

    let filter = frigo::ItemFilter {
        category: Some(Category::FruitsLegumes),
        min_price: Some(2.0),
        max_price: Some(8.0),
        sort: SortBy::Name,
        ..Default::default()
    };
    let names: Vec<String> = frigo::query(&store.get_all(), &filter, date(2026, 3, 1))
        .into_iter()
        .map(|i| i.product.name)
        .collect();
    assert_eq!(names, vec!["Poire".to_string()]);
}
