//! Order intake from a tabular export with `Cliente` and `Días Retorno`
//! columns.

use crate::engine::BookingRequest;
use crate::persistence::{PersistenceError, PersistenceResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

pub const CLIENT_COLUMN: &str = "Cliente";
pub const RETURN_DAYS_COLUMN: &str = "Días Retorno";

/// An imported order that has not been placed on the calendar yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOrder {
    #[serde(rename = "Cliente")]
    pub client: String,
    #[serde(rename = "Días Retorno")]
    pub return_days: u32,
}

impl PendingOrder {
    pub fn new(client: impl Into<String>, return_days: u32) -> Self {
        Self {
            client: client.into(),
            return_days,
        }
    }

    /// Booking request for this order once a unit and ship date are chosen.
    pub fn to_request(&self, unit_type: impl Into<String>, ship_date: NaiveDate) -> BookingRequest {
        BookingRequest::new(self.client.clone(), unit_type, ship_date, self.return_days)
    }
}

pub fn load_orders_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<PendingOrder>> {
    let file = File::open(path)?;
    read_orders_csv(file)
}

/// Reads orders, keeping only the two required columns.
///
/// Rows with a blank client or blank lead time are skipped. Lead times may be
/// written as integral floats (`3.0`), as spreadsheet exports often do.
pub fn read_orders_csv<R: Read>(reader: R) -> PersistenceResult<Vec<PendingOrder>> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers()?.clone();
    let position = |name: &str| {
        headers
            .iter()
            .position(|header| header.trim_start_matches('\u{feff}').trim() == name)
    };
    let (Some(client_idx), Some(days_idx)) = (position(CLIENT_COLUMN), position(RETURN_DAYS_COLUMN))
    else {
        return Err(PersistenceError::InvalidData(format!(
            "the file must contain the columns: {CLIENT_COLUMN}, {RETURN_DAYS_COLUMN}"
        )));
    };

    let mut orders = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record?;
        let client = record.get(client_idx).unwrap_or_default().trim();
        let days = record.get(days_idx).unwrap_or_default().trim();
        if client.is_empty() || days.is_empty() {
            continue;
        }
        let return_days = parse_return_days(days).ok_or_else(|| {
            PersistenceError::InvalidData(format!(
                "row {}: invalid {RETURN_DAYS_COLUMN} '{days}'",
                row_idx + 2
            ))
        })?;
        orders.push(PendingOrder::new(client, return_days));
    }
    info!(orders = orders.len(), "orders imported");
    Ok(orders)
}

fn parse_return_days(input: &str) -> Option<u32> {
    if let Ok(days) = input.parse::<u32>() {
        return Some(days);
    }
    let value = input.parse::<f64>().ok()?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= f64::from(u32::MAX) {
        Some(value as u32)
    } else {
        None
    }
}
