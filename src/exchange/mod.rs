//! Import/export reconciliation.
//!
//! Exports serialize a snapshot to a versioned JSON envelope or canonical
//! `;`-delimited CSV. Imports accept JSON (raw array, `{items}` or
//! `{frigo}` envelope) and CSV (`;`/`,` auto-detected), funnel every row
//! through one sanitization pipeline, and reconcile the survivors into the
//! store under merge or replace semantics. A malformed payload is fatal;
//! a malformed record is counted and skipped.

pub mod record;
pub mod sanitize;

use crate::error::{FrigoError, Result};
use crate::models::InventoryItem;
use crate::storage::KeyValueStore;
use crate::store::InventoryStore;
use crate::exchange::record::RawRecord;
use crate::exchange::sanitize::{sanitize, SkipReason};
use chrono::Utc;
use serde::Serialize;

/// Version written into the export envelope.
pub const EXPORT_VERSION: u32 = 1;

/// Canonical machine-readable CSV column order.
pub const CSV_HEADER: [&str; 11] = [
    "product_name",
    "brands",
    "quantity",
    "category",
    "expiry_date",
    "price",
    "store",
    "added_at",
    "nutriscore",
    "image_url",
    "quantity_label",
];

/// Supported payload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Json,
    Csv,
}

/// Outcome counts of one import call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    /// Records found in the payload
    pub total: usize,
    /// New items inserted
    pub created: usize,
    /// Existing items updated by identity key
    pub updated: usize,
    /// Records dropped during sanitization
    pub skipped: usize,
}

#[derive(Serialize)]
struct ExportEnvelope<'a> {
    version: u32,
    exported_at: String,
    count: usize,
    items: &'a [InventoryItem],
}

/// Serializes a snapshot to the pretty-printed JSON export envelope.
pub fn export_json(items: &[InventoryItem]) -> Result<String> {
    let envelope = ExportEnvelope {
        version: EXPORT_VERSION,
        exported_at: Utc::now().to_rfc3339(),
        count: items.len(),
        items,
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// Serializes a snapshot to canonical `;`-delimited CSV with RFC4180
/// quoting (the `csv` crate quotes any field containing the delimiter,
/// a quote or a newline).
pub fn export_csv(items: &[InventoryItem]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
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
                .map(|p| p.to_string())
                .unwrap_or_default(),
            item.current_store.clone().unwrap_or_default(),
            item.added_at.to_rfc3339(),
            item.product.nutri_score.as_str().to_string(),
            item.product.image_url.clone(),
            item.product.quantity_label.clone(),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| FrigoError::Storage(format!("CSV buffer error: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| FrigoError::Payload(e.to_string()))
}

/// One payload entry: either a readable raw record or the reason it is
/// skipped. Unreadable entries still count toward the import total.
pub type ParsedRecord = std::result::Result<RawRecord, SkipReason>;

/// Parses a payload into raw records, without validating them.
///
/// JSON accepts a top-level array or an `{items: [...]}` / `{frigo: [...]}`
/// envelope. CSV auto-detects the delimiter from the header line. Only an
/// unparseable payload is fatal; an entry that cannot be read into a record
/// yields `Err(SkipReason::MalformedRecord)` in its slot.
pub fn parse_records(payload: &str, format: ImportFormat) -> Result<Vec<ParsedRecord>> {
    match format {
        ImportFormat::Json => parse_json_records(payload),
        ImportFormat::Csv => parse_csv_records(payload),
    }
}

fn parse_json_records(payload: &str) -> Result<Vec<ParsedRecord>> {
    let value: serde_json::Value = serde_json::from_str(payload)?;
    let rows = match value {
        serde_json::Value::Array(rows) => rows,
        serde_json::Value::Object(mut obj) => {
            match obj.remove("items").or_else(|| obj.remove("frigo")) {
                Some(serde_json::Value::Array(rows)) => rows,
                _ => {
                    return Err(FrigoError::Payload(
                        "expected a JSON array, or an object with an 'items' or 'frigo' array"
                            .to_string(),
                    ))
                }
            }
        }
        _ => {
            return Err(FrigoError::Payload(
                "expected a JSON array or envelope object".to_string(),
            ))
        }
    };
    Ok(rows
        .into_iter()
        .map(|row| {
            serde_json::from_value::<RawRecord>(row).map_err(|e| {
                log::debug!("Unreadable JSON record: {}", e);
                SkipReason::MalformedRecord
            })
        })
        .collect())
}

fn parse_csv_records(payload: &str) -> Result<Vec<ParsedRecord>> {
    let delimiter = detect_delimiter(payload);
    log::debug!(
        "CSV import using '{}' delimiter",
        char::from(delimiter)
    );
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(payload.as_bytes());

    let headers = reader.headers()?.clone();
    let mut records = Vec::new();
    for row in reader.records() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                log::debug!("Unreadable CSV row: {}", e);
                records.push(Err(SkipReason::MalformedRecord));
                continue;
            }
        };
        // Empty cells are absent fields, so sanitization defaults apply
        let mut object = serde_json::Map::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            if !cell.is_empty() {
                object.insert(
                    header.to_string(),
                    serde_json::Value::String(cell.to_string()),
                );
            }
        }
        records.push(
            serde_json::from_value(serde_json::Value::Object(object)).map_err(|e| {
                log::debug!("Unreadable CSV record: {}", e);
                SkipReason::MalformedRecord
            }),
        );
    }
    Ok(records)
}

/// `;` wins when present in the header line, matching the canonical export;
/// plain comma CSV still imports.
fn detect_delimiter(payload: &str) -> u8 {
    let header_line = payload.lines().next().unwrap_or_default();
    if header_line.contains(';') {
        b';'
    } else {
        b','
    }
}

/// Parses, sanitizes and reconciles a payload into the store.
///
/// With `merge` true, records matching an existing identity key update that
/// item in place (its id survives); otherwise the store is replaced by the
/// imported set. Fails when the payload is unparseable or yields zero
/// usable records; per-record problems only increment `skipped`.
pub fn import_data<S: KeyValueStore>(
    store: &InventoryStore<S>,
    payload: &str,
    format: ImportFormat,
    merge: bool,
) -> Result<ImportReport> {
    let raw_records = parse_records(payload, format)?;
    let total = raw_records.len();

    let mut candidates = Vec::new();
    let mut skipped = 0;
    for (position, parsed) in raw_records.into_iter().enumerate() {
        match parsed.and_then(sanitize) {
            Ok(item) => candidates.push(item),
            Err(reason) => {
                log::warn!("Import record {} skipped: {}", position + 1, reason);
                skipped += 1;
            }
        }
    }

    if candidates.is_empty() {
        return Err(FrigoError::EmptyImport { skipped });
    }

    let (created, updated) = store.reconcile(candidates, merge)?;
    log::info!(
        "Import done: {} total, {} created, {} updated, {} skipped",
        total,
        created,
        updated,
        skipped
    );
    Ok(ImportReport {
        total,
        created,
        updated,
        skipped,
    })
}
