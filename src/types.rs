use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{DashboardError, Result};

// ── Classification axes ──

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Region {
    Uk,
    Eu,
    Other(String),
}

impl Region {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "UK" => Region::Uk,
            "EU" => Region::Eu,
            other => Region::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Region::Uk => "UK",
            Region::Eu => "EU",
            Region::Other(s) => s,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Warehouse {
    Dawson,
    Romania,
    Other(String),
}

impl Warehouse {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Dawson" => Warehouse::Dawson,
            "Romania" => Warehouse::Romania,
            other => Warehouse::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Warehouse::Dawson => "Dawson",
            Warehouse::Romania => "Romania",
            Warehouse::Other(s) => s,
        }
    }
}

impl fmt::Display for Warehouse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Input rows (decoded from the two upstream tables) ──

/// One inventory snapshot row. Quantity columns are nullable upstream; a
/// `None` is a missing point, not a zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryRecord {
    pub asin: String,
    pub sku: String,
    pub product_name: String,
    pub date: NaiveDate,
    pub region: Region,
    pub fulfillable_quantity: Option<i64>,
    pub reserved: Option<i64>,
    pub inbound: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRecord {
    pub asin: String,
    pub sku: String,
    pub order_id: String,
    pub order_date: NaiveDate,
    pub dispatch_date: Option<NaiveDate>,
    pub quantity: i64,
    pub target_region: Region,
    pub warehouse: Warehouse,
    pub channel_name: String,
}

// ── Query ──

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySelection {
    pub target_asin: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl QuerySelection {
    /// Builds a selection from raw operator input. The identifier is trimmed
    /// but otherwise matched exactly.
    pub fn new(asin: &str, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            target_asin: asin.trim().to_string(),
            start_date,
            end_date,
        }
    }

    /// Parses operator-typed dates and rejects an inverted range.
    pub fn from_input(asin: &str, start: &str, end: &str) -> Result<Self> {
        let start_date = parse_date(start)?;
        let end_date = parse_date(end)?;
        if start_date > end_date {
            return Err(DashboardError::InvertedRange {
                start: start_date.to_string(),
                end: end_date.to_string(),
            });
        }
        Ok(Self::new(asin, start_date, end_date))
    }

    /// Inclusive on both bounds.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| DashboardError::InvalidDate(raw.to_string()))
}

// ── Aggregated output ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub quantity_sum: i64,
}
