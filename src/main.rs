//! Frigo - food inventory tracker CLI.
//!
//! All commands operate on the local SQLite-backed store. The `watch`
//! command is the only long-running one: it re-scans expiry dates on a
//! fixed interval, read-only.

use clap::{Parser, Subcommand, ValueEnum};
use frigo::{
    export_csv, export_json, format_human_csv, format_shopping_list, import_data, AddOptions,
    Category, ExpiryBucket, ExpiryReport, ImportFormat, InventoryStore, ItemFilter, SortBy,
    SqliteStore,
};
use std::path::PathBuf;

/// Personal food inventory tracker - stock, DLC, prices, import/export
#[derive(Parser, Debug)]
#[command(name = "frigo")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database file
    #[arg(short, long, default_value_t = default_db_path())]
    database: String,

    #[command(subcommand)]
    command: Command,
}

/// Returns the default database path: ~/.local/share/frigo/frigo.db
fn default_db_path() -> String {
    frigo::storage::default_db_path()
        .to_string_lossy()
        .to_string()
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SortArg {
    Date,
    Name,
    Price,
    Dlc,
}

impl From<SortArg> for SortBy {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Date => SortBy::DateAdded,
            SortArg::Name => SortBy::Name,
            SortArg::Price => SortBy::Price,
            SortArg::Dlc => SortBy::Expiry,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ExpiryArg {
    Expired,
    Soon,
    Ok,
}

impl From<ExpiryArg> for ExpiryBucket {
    fn from(arg: ExpiryArg) -> Self {
        match arg {
            ExpiryArg::Expired => ExpiryBucket::Expired,
            ExpiryArg::Soon => ExpiryBucket::Soon,
            ExpiryArg::Ok => ExpiryBucket::Ok,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Json,
    Csv,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List inventory items, optionally filtered and sorted
    List {
        /// Filter by category label (e.g. "Boissons")
        #[arg(long)]
        category: Option<String>,
        /// Case-insensitive text search over name, brand, category, store
        #[arg(long)]
        search: Option<String>,
        /// Filter by expiry bucket
        #[arg(long)]
        expiry: Option<ExpiryArg>,
        #[arg(long)]
        min_price: Option<f64>,
        #[arg(long)]
        max_price: Option<f64>,
        #[arg(long, value_enum, default_value = "date")]
        sort: SortArg,
    },
    /// Add a product (merges into an existing item with the same name+brand)
    Add {
        name: String,
        #[arg(long)]
        brand: Option<String>,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
        #[arg(long)]
        category: Option<String>,
        /// DLC as YYYY-MM-DD
        #[arg(long)]
        dlc: Option<String>,
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        store: Option<String>,
    },
    /// Remove an item by id
    Remove { id: String },
    /// Record a consumption event, decrementing stock
    Consume {
        id: String,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
        #[arg(long)]
        reason: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Set the exact stock count of an item (0 = out but retained)
    SetQty { id: String, quantity: u32 },
    /// Export the inventory to stdout
    Export {
        #[arg(long, value_enum, default_value = "json")]
        format: FormatArg,
        /// Use the French display CSV labels instead of the machine schema
        #[arg(long, default_value_t = false)]
        display: bool,
    },
    /// Import a JSON or CSV file into the inventory
    Import {
        file: PathBuf,
        #[arg(long, value_enum, default_value = "json")]
        format: FormatArg,
        /// Replace the whole inventory instead of merging by identity
        #[arg(long, default_value_t = false)]
        replace: bool,
    },
    /// Print a shopping list grouped by category
    ShoppingList,
    /// Show expired and expiring-soon items
    Expiring,
    /// Periodically re-scan expiry dates and log changes (read-only)
    Watch {
        /// Poll interval in seconds
        #[arg(long, default_value_t = 60)]
        interval_secs: u64,
    },
    /// Delete every item
    Clear,
    /// Show item and category counts
    Stats,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let backend = match SqliteStore::open(&args.database) {
        Ok(backend) => backend,
        Err(e) => {
            log::error!("Failed to open database {}: {}", args.database, e);
            std::process::exit(1);
        }
    };
    let store = InventoryStore::new(backend);
    let today = chrono::Local::now().date_naive();

    match args.command {
        Command::List {
            category,
            search,
            expiry,
            min_price,
            max_price,
            sort,
        } => {
            let filter = ItemFilter {
                category: category.as_deref().map(Category::normalize),
                text: search,
                expiry: expiry.map(Into::into),
                min_price,
                max_price,
                sort: sort.into(),
            };
            let items = frigo::query(&store.get_all(), &filter, today);
            if items.is_empty() {
                println!("Frigo vide.");
                return;
            }
            for item in items {
                let price = item
                    .current_price
                    .map(|p| format!(" {:.2} EUR", p))
                    .unwrap_or_default();
                let dlc = item
                    .expiry_date
                    .map(|d| format!(" DLC {}", d))
                    .unwrap_or_default();
                println!(
                    "{}  {} ({}) x{} [{}]{}{}",
                    item.id, item.product.name, item.product.brand, item.quantity,
                    item.category, price, dlc
                );
            }
        }
        Command::Add {
            name,
            brand,
            quantity,
            category,
            dlc,
            price,
            store: shop,
        } => {
            let mut product = frigo::Product::named(&name);
            if let Some(brand) = brand {
                product.brand = brand;
            }
            let expiry_date = dlc
                .as_deref()
                .and_then(|raw| chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok());
            if dlc.is_some() && expiry_date.is_none() {
                log::warn!("Ignoring unparseable DLC (expected YYYY-MM-DD)");
            }
            let opts = AddOptions {
                category: category.as_deref().map(Category::normalize),
                expiry_date,
                price,
                store: shop,
            };
            if store.add(product, quantity, opts) {
                println!("Ajouté.");
            } else {
                log::error!("Add failed (storage error)");
                std::process::exit(1);
            }
        }
        Command::Remove { id } => {
            if store.remove(&id) {
                println!("Supprimé.");
            } else {
                log::error!("Remove failed (storage error)");
                std::process::exit(1);
            }
        }
        Command::Consume {
            id,
            quantity,
            reason,
            notes,
        } => match store.record_exit(&id, quantity, reason, notes) {
            Ok(entry) => println!("Sorti x{}.", entry.quantity),
            Err(e) => {
                log::error!("{}", e);
                std::process::exit(1);
            }
        },
        Command::SetQty { id, quantity } => {
            if store.set_quantity(&id, quantity) {
                println!("Quantité: {}", quantity);
            } else {
                log::error!("No such item or storage error");
                std::process::exit(1);
            }
        }
        Command::Export { format, display } => {
            let items = store.get_all();
            let output = match (format, display) {
                (FormatArg::Json, _) => export_json(&items),
                (FormatArg::Csv, false) => export_csv(&items),
                (FormatArg::Csv, true) => format_human_csv(&items),
            };
            match output {
                Ok(payload) => println!("{}", payload),
                Err(e) => {
                    log::error!("Export failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Command::Import {
            file,
            format,
            replace,
        } => {
            let payload = match std::fs::read_to_string(&file) {
                Ok(payload) => payload,
                Err(e) => {
                    log::error!("Cannot read {}: {}", file.display(), e);
                    std::process::exit(1);
                }
            };
            let format = match format {
                FormatArg::Json => ImportFormat::Json,
                FormatArg::Csv => ImportFormat::Csv,
            };
            match import_data(&store, &payload, format, !replace) {
                Ok(report) => println!(
                    "{} lignes: {} créés, {} mis à jour, {} ignorés",
                    report.total, report.created, report.updated, report.skipped
                ),
                Err(e) => {
                    log::error!("Import failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Command::ShoppingList => {
            print!("{}", format_shopping_list(&store.get_all()));
        }
        Command::Expiring => {
            let report = ExpiryReport::scan(&store.get_all(), today);
            if report.is_empty() {
                println!("Rien à signaler.");
                return;
            }
            for name in &report.expired {
                println!("PÉRIMÉ     {}", name);
            }
            for name in &report.expiring_soon {
                println!("BIENTÔT    {}", name);
            }
        }
        Command::Watch { interval_secs } => {
            log::info!("Watching expiry dates every {}s", interval_secs);
            let mut last = ExpiryReport::default();
            loop {
                let today = chrono::Local::now().date_naive();
                let report = ExpiryReport::scan(&store.get_all(), today);
                if report != last {
                    if !report.expired.is_empty() {
                        log::warn!("Expired: {}", report.expired.join(", "));
                    }
                    if !report.expiring_soon.is_empty() {
                        log::info!("Expiring soon: {}", report.expiring_soon.join(", "));
                    }
                    last = report;
                }
                std::thread::sleep(std::time::Duration::from_secs(interval_secs));
            }
        }
        Command::Clear => {
            if store.clear() {
                println!("Frigo vidé.");
            } else {
                log::error!("Clear failed (storage error)");
                std::process::exit(1);
            }
        }
        Command::Stats => {
            let items = store.get_all();
            println!("{} produits", items.len());
            let total_stock: u32 = items.iter().map(|i| i.quantity).sum();
            println!("{} unités en stock", total_stock);
            for category in store.get_categories() {
                let count = items.iter().filter(|i| i.category == category).count();
                println!("  {}: {}", category, count);
            }
        }
    }
}
