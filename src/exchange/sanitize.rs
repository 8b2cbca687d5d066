//! Per-record sanitization pipeline: `RawRecord -> Result<InventoryItem, SkipReason>`.
//!
//! Individual field problems are repaired (defaulted, clamped, dropped),
//! never fatal; only a missing product name or brand rejects the record,
//! and the rejection carries an enumerated reason for precise reporting.

use crate::exchange::record::{RawExitEntry, RawPriceEntry, RawRecord};
use crate::models::{
    Category, ExitEntry, InventoryItem, NutriScore, PriceHistoryEntry, Product,
    PRICE_HISTORY_CAP,
};
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;

/// Why an import record was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingName,
    MissingBrand,
    MalformedRecord,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingName => write!(f, "missing product name"),
            SkipReason::MissingBrand => write!(f, "missing brand"),
            SkipReason::MalformedRecord => write!(f, "record could not be read"),
        }
    }
}

/// Sanitizes one raw record into a fresh inventory item.
pub fn sanitize(raw: RawRecord) -> Result<InventoryItem, SkipReason> {
    let name = raw.effective_name().ok_or(SkipReason::MissingName)?;
    let brand = raw.effective_brand().ok_or(SkipReason::MissingBrand)?;

    let nested = raw.product.clone().unwrap_or_default();
    let product = Product {
        name,
        brand,
        image_url: raw
            .image_url
            .or(nested.image_url)
            .unwrap_or_default(),
        ingredients_text: raw
            .ingredients_text
            .or(nested.ingredients_text)
            .unwrap_or_default(),
        nutrients: raw.nutrients.or(nested.nutrients).unwrap_or_default(),
        quantity_label: raw
            .quantity_label
            .or(nested.quantity_label)
            .unwrap_or_default(),
        nutri_score: raw
            .nutri_score
            .or(nested.nutri_score)
            .map(|s| NutriScore::parse(&s))
            .unwrap_or_default(),
    };

    let mut item = InventoryItem::new(
        product,
        parse_quantity(raw.quantity.as_ref()),
        Category::normalize(raw.category.as_deref().unwrap_or_default()),
    );
    if let Some(added_at) = raw.added_at.as_deref().and_then(parse_timestamp_loose) {
        item.added_at = added_at;
    }
    item.expiry_date = raw.expiry_date.as_deref().and_then(parse_date);
    item.current_price = raw.current_price.as_ref().and_then(parse_price);
    item.current_store = raw
        .current_store
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    item.price_history = sanitize_price_history(raw.price_history.unwrap_or_default());
    item.exit_history = sanitize_exit_history(raw.exit_history.unwrap_or_default());
    Ok(item)
}

/// Quantity defaults to 1 when absent or invalid, and never goes below 1.
fn parse_quantity(value: Option<&serde_json::Value>) -> u32 {
    let parsed = match value {
        Some(serde_json::Value::Number(n)) => n.as_f64().map(|f| f as i64),
        Some(serde_json::Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match parsed {
        Some(q) if q >= 1 => q as u32,
        _ => 1,
    }
}

/// Parses a price from a JSON number or a string, tolerating the comma
/// decimal separator. Negative or non-finite values are dropped.
fn parse_price(value: &serde_json::Value) -> Option<f64> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|p| p.is_finite() && *p >= 0.0)
}

/// Date-only field: `YYYY-MM-DD`, or the date part of a full timestamp.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(raw).map(|ts| ts.date_naive()))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Timestamp, or a bare date taken as midnight UTC (display CSV exports
/// only carry the day).
fn parse_timestamp_loose(raw: &str) -> Option<DateTime<Utc>> {
    parse_timestamp(raw).or_else(|| {
        NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    })
}

/// Validates history entries individually; invalid entries are filtered
/// out rather than rejecting the whole item.
fn sanitize_price_history(entries: Vec<RawPriceEntry>) -> Vec<PriceHistoryEntry> {
    let mut history: Vec<PriceHistoryEntry> = entries
        .into_iter()
        .filter_map(|entry| {
            let price = entry.price.as_ref().and_then(parse_price)?;
            let store = entry
                .store
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())?;
            let date = entry.date.as_deref().and_then(parse_timestamp)?;
            Some(PriceHistoryEntry { price, store, date })
        })
        .collect();
    if history.len() > PRICE_HISTORY_CAP {
        let excess = history.len() - PRICE_HISTORY_CAP;
        history.drain(..excess);
    }
    history
}

fn sanitize_exit_history(entries: Vec<RawExitEntry>) -> Vec<ExitEntry> {
    entries
        .into_iter()
        .filter_map(|entry| {
            let quantity = match entry.quantity.as_ref() {
                Some(serde_json::Value::Number(n)) => n.as_u64().filter(|q| *q >= 1)? as u32,
                Some(serde_json::Value::String(s)) => {
                    s.trim().parse::<u32>().ok().filter(|q| *q >= 1)?
                }
                _ => return None,
            };
            let date = entry.date.as_deref().and_then(parse_timestamp)?;
            Some(ExitEntry {
                quantity,
                reason: entry.reason,
                notes: entry.notes,
                date,
            })
        })
        .collect()
}
