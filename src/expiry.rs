//! Expiry date classification.
//!
//! Single source of truth for "expired" vs "expiring soon": an item whose
//! DLC falls on `today` is Soon(0), strictly past dates are Expired. The
//! store-wide expiry queries and the per-item badge both go through here.

use chrono::NaiveDate;

/// Number of days ahead (inclusive) still counted as "expiring soon".
pub const SOON_WINDOW_DAYS: i64 = 3;

/// Consumption-deadline bucket of an item relative to "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryStatus {
    /// No tracked expiry date
    None,
    /// DLC strictly before today
    Expired { days_overdue: i64 },
    /// DLC between today and today+3, inclusive
    Soon { days_remaining: i64 },
    /// DLC more than 3 days out
    Ok { days_remaining: i64 },
}

impl ExpiryStatus {
    /// Classifies a DLC against `today`, comparing date-only (no time of day).
    pub fn classify(expiry: Option<NaiveDate>, today: NaiveDate) -> Self {
        let Some(dlc) = expiry else {
            return ExpiryStatus::None;
        };
        let diff_days = (dlc - today).num_days();
        if diff_days < 0 {
            ExpiryStatus::Expired {
                days_overdue: -diff_days,
            }
        } else if diff_days <= SOON_WINDOW_DAYS {
            ExpiryStatus::Soon {
                days_remaining: diff_days,
            }
        } else {
            ExpiryStatus::Ok {
                days_remaining: diff_days,
            }
        }
    }

    pub fn is_expired(&self) -> bool {
        matches!(self, ExpiryStatus::Expired { .. })
    }

    pub fn is_soon(&self) -> bool {
        matches!(self, ExpiryStatus::Soon { .. })
    }
}

/// Read-only expiry snapshot, produced by the periodic rescan. Never
/// mutates the store.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExpiryReport {
    pub expired: Vec<String>,
    pub expiring_soon: Vec<String>,
}

impl ExpiryReport {
    /// Scans a snapshot and collects item names per bucket.
    pub fn scan(items: &[crate::models::InventoryItem], today: NaiveDate) -> Self {
        let mut report = ExpiryReport::default();
        for item in items {
            match ExpiryStatus::classify(item.expiry_date, today) {
                ExpiryStatus::Expired { .. } => report.expired.push(item.product.name.clone()),
                ExpiryStatus::Soon { .. } => {
                    report.expiring_soon.push(item.product.name.clone())
                }
                _ => {}
            }
        }
        report
    }

    pub fn is_empty(&self) -> bool {
        self.expired.is_empty() && self.expiring_soon.is_empty()
    }
}
