//! Data models for the collection dashboard.
//!
//! This module contains the normalized item record, the derived view
//! types produced by the aggregation pipeline, and the report structure
//! that ties them together for rendering.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Round a value to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One purchase event from the source table, after normalization.
///
/// A record may describe a bundle: `quantity` physical items whose combined
/// weight is `total_weight`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    /// Source row number (1-based, header excluded).
    pub row: usize,
    pub name: String,
    /// Free-text description ("About Me" / "Fun Fact").
    pub about: String,
    pub date_bought: NaiveDate,
    /// Calendar year of `date_bought`.
    pub year: i32,
    pub purchaser: String,
    pub method: String,
    pub city: String,
    /// Region or state; empty when not applicable (non-US purchases).
    pub state: String,
    pub country: String,
    /// Upper-case ISO country code, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iso_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    pub quantity: u32,
    /// Combined weight of the bundle in grams.
    pub total_weight: f64,
    /// `total_weight / quantity`, rounded to 2 decimals.
    pub avg_weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
}

/// Field a view groups records by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    Purchaser,
    Method,
    Year,
    /// (country, ISO code) pair; records without an ISO code are skipped.
    Country,
    /// Region/state; the empty-string sentinel is skipped.
    State,
    City,
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupBy::Purchaser => write!(f, "Purchaser"),
            GroupBy::Method => write!(f, "Purchase Method"),
            GroupBy::Year => write!(f, "Year"),
            GroupBy::Country => write!(f, "Country"),
            GroupBy::State => write!(f, "State"),
            GroupBy::City => write!(f, "City"),
        }
    }
}

/// Which sums a view carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    #[default]
    Quantity,
    QuantityAndWeight,
}

/// Key of one row in a grouped view.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupKey {
    Year(i32),
    Country { country: String, iso_code: String },
    Text(String),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Year(year) => write!(f, "{}", year),
            GroupKey::Country { country, iso_code } => write!(f, "{} ({})", country, iso_code),
            GroupKey::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for GroupKey {
    fn from(s: &str) -> Self {
        GroupKey::Text(s.to_string())
    }
}

/// Summed quantity and weight for one group. The weight is unrounded.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupTotals {
    pub quantity: u64,
    pub total_weight: f64,
}

impl GroupTotals {
    pub fn add(&mut self, item: &ItemRecord) {
        self.quantity += u64::from(item.quantity);
        self.total_weight += item.total_weight;
    }
}

/// Cumulative totals up to and including `year`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearTotals {
    pub year: i32,
    pub quantity: u64,
    pub total_weight: f64,
    /// True when the row was synthesized for a year with no purchases.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub filled: bool,
}

/// One row of a derived view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewRow {
    pub key: GroupKey,
    pub quantity: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_weight: Option<f64>,
    /// Carry-forward row for a year without purchases.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub filled: bool,
}

/// A named aggregate table consumed by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedView {
    pub name: String,
    pub group_by: GroupBy,
    pub measure: Measure,
    pub cumulative: bool,
    pub rows: Vec<ViewRow>,
}

#[cfg(test)]
impl DerivedView {
    /// Look up the row for a group key.
    pub fn get(&self, key: &GroupKey) -> Option<&ViewRow> {
        self.rows.iter().find(|r| &r.key == key)
    }

    /// Sum of the quantity column.
    pub fn total_quantity(&self) -> u64 {
        self.rows.iter().map(|r| r.quantity).sum()
    }
}

/// Headline figures shown as summary cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub total_quantity: u64,
    pub total_weight: f64,
    pub unique_countries: usize,
    pub unique_cities: usize,
    /// Quantity bought on or after `window_start`.
    pub bought_last_year: u64,
    /// `today` minus one calendar year.
    pub window_start: NaiveDate,
}

/// A purchase location for the geo scatter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationPoint {
    pub name: String,
    pub city: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Per-unit dimensions for the 3-D scatter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionPoint {
    pub name: String,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub avg_weight: f64,
}

/// Projected, optionally filtered item table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemTable {
    pub columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub rows: Vec<Vec<String>>,
}

/// Text of a single item card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemCard {
    pub name: String,
    pub about: String,
    pub location: String,
    pub date: String,
    pub weight: String,
    pub dimensions: String,
}

impl From<&ItemRecord> for ItemCard {
    fn from(item: &ItemRecord) -> Self {
        let dim = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_else(|| "?".to_string());
        let location = match (item.city.is_empty(), item.country.is_empty()) {
            (false, false) => format!("{}, {}", item.city, item.country),
            (false, true) => item.city.clone(),
            (true, false) => item.country.clone(),
            (true, true) => String::new(),
        };

        Self {
            name: item.name.clone(),
            about: item.about.clone(),
            location,
            date: item.date_bought.format("%Y-%m-%d").to_string(),
            weight: format!("{}g", item.avg_weight),
            dimensions: format!(
                "{}cm x {}cm x {}cm",
                dim(item.height),
                dim(item.width),
                dim(item.length)
            ),
        }
    }
}

/// Metadata about a generated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Path of the source table.
    pub source: String,
    /// Number of records loaded.
    pub records: usize,
    /// Reference date for the trailing-year metric.
    pub today: NaiveDate,
    /// Whether missing years were filled in cumulative views.
    pub year_gaps_filled: bool,
}

/// The complete dashboard report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub summary: SummaryMetrics,
    pub views: Vec<DerivedView>,
    pub locations: Vec<LocationPoint>,
    pub dimensions: Vec<DimensionPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<ItemTable>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub cards: Vec<ItemCard>,
}
