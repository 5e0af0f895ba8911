//! Record normalization.
//!
//! Turns raw text rows into typed [`ItemRecord`]s: dates are parsed, the
//! purchase year and average weight derived, and every invariant checked.
//! Normalization fails closed. All rows are inspected, every problem is
//! collected, and no records are returned if any problem was found.

use crate::config::ColumnMap;
use crate::error::{DataError, DataErrors};
use crate::models::{round2, ItemRecord};
use crate::source::{Dataset, RawRow};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use tracing::debug;

/// Average weight of one unit in a bundle, rounded to 2 decimals.
pub fn average_weight(row: usize, total_weight: f64, quantity: u32) -> Result<f64, DataError> {
    if quantity == 0 {
        return Err(DataError::ZeroQuantity { row });
    }
    Ok(round2(total_weight / f64::from(quantity)))
}

/// Parse a date using the first matching format.
///
/// Formats with a time component (`%H`, `%M`, `%S`, `%T`) are parsed as
/// date-times and truncated to the date.
pub fn parse_date(value: &str, formats: &[String]) -> Option<NaiveDate> {
    let value = value.trim();
    formats.iter().find_map(|fmt| {
        if has_time_component(fmt) {
            NaiveDateTime::parse_from_str(value, fmt)
                .ok()
                .map(|dt| dt.date())
        } else {
            NaiveDate::parse_from_str(value, fmt).ok()
        }
    })
}

fn has_time_component(fmt: &str) -> bool {
    ["%H", "%M", "%S", "%T", "%R"]
        .iter()
        .any(|token| fmt.contains(token))
}

/// Normalize every row of the dataset, sorted by purchase date.
pub fn normalize(
    dataset: &Dataset,
    columns: &ColumnMap,
    date_formats: &[String],
) -> Result<Vec<ItemRecord>, DataErrors> {
    let mut items = Vec::with_capacity(dataset.len());
    let mut errors = Vec::new();

    for row in &dataset.rows {
        match normalize_row(row, columns, date_formats) {
            Ok(item) => items.push(item),
            Err(row_errors) => errors.extend(row_errors),
        }
    }

    if !errors.is_empty() {
        return Err(DataErrors(errors));
    }

    // Stable: same-day purchases keep their sheet order.
    items.sort_by_key(|item| item.date_bought);

    debug!("Normalized {} records", items.len());
    Ok(items)
}

/// Collects the errors of a single row.
struct RowCheck<'a> {
    row: &'a RawRow,
    errors: Vec<DataError>,
}

impl<'a> RowCheck<'a> {
    fn new(row: &'a RawRow) -> Self {
        Self {
            row,
            errors: Vec::new(),
        }
    }

    fn missing(&mut self, column: &str) {
        self.errors.push(DataError::MissingField {
            row: self.row.number,
            column: column.to_string(),
        });
    }

    fn cell(&self, column: &str) -> &'a str {
        self.row.get(column)
    }

    fn text(&self, column: &str) -> String {
        self.cell(column).to_string()
    }

    fn required_text(&mut self, column: &str) -> String {
        let value = self.text(column);
        if value.is_empty() {
            self.missing(column);
        }
        value
    }

    fn date(&mut self, column: &str, formats: &[String]) -> Option<NaiveDate> {
        let raw = self.cell(column);
        if raw.is_empty() {
            self.missing(column);
            return None;
        }
        let parsed = parse_date(raw, formats);
        if parsed.is_none() {
            self.errors.push(DataError::InvalidDate {
                row: self.row.number,
                column: column.to_string(),
                value: raw.to_string(),
            });
        }
        parsed
    }

    fn quantity(&mut self, column: &str) -> Option<u32> {
        let raw = self.cell(column);
        if raw.is_empty() {
            self.missing(column);
            return None;
        }

        // Spreadsheet exports often write whole numbers as "2.0".
        let parsed = raw.parse::<u32>().ok().or_else(|| {
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.fract() == 0.0 && *v >= 0.0 && *v <= f64::from(u32::MAX))
                .map(|v| v as u32)
        });

        if parsed.is_none() {
            self.invalid_number(column, raw.to_string(), "non-negative integer");
        }
        parsed
    }

    fn number(&mut self, column: &str, required: bool) -> Option<f64> {
        let raw = self.cell(column);
        if raw.is_empty() {
            if required {
                self.missing(column);
            }
            return None;
        }

        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Some(v),
            _ => {
                self.invalid_number(column, raw.to_string(), "number");
                None
            }
        }
    }

    fn non_negative(&mut self, column: &str, required: bool) -> Option<f64> {
        let value = self.number(column, required)?;
        if value < 0.0 {
            self.errors.push(DataError::Negative {
                row: self.row.number,
                column: column.to_string(),
                value,
            });
            return None;
        }
        // Folds "-0" into +0.
        Some(value + 0.0)
    }

    fn bounded(&mut self, column: &str, min: f64, max: f64) -> Option<f64> {
        let value = self.number(column, false)?;
        if !(min..=max).contains(&value) {
            self.errors.push(DataError::OutOfRange {
                row: self.row.number,
                column: column.to_string(),
                value,
                min,
                max,
            });
            return None;
        }
        Some(value)
    }

    fn iso_code(&mut self, column: &str) -> Option<String> {
        let raw = self.cell(column);
        if raw.is_empty() {
            return None;
        }
        if (2..=3).contains(&raw.len()) && raw.chars().all(|c| c.is_ascii_alphabetic()) {
            Some(raw.to_ascii_uppercase())
        } else {
            self.errors.push(DataError::InvalidIsoCode {
                row: self.row.number,
                value: raw.to_string(),
            });
            None
        }
    }

    fn invalid_number(&mut self, column: &str, value: String, expected: &'static str) {
        self.errors.push(DataError::InvalidNumber {
            row: self.row.number,
            column: column.to_string(),
            value,
            expected,
        });
    }
}

fn normalize_row(
    row: &RawRow,
    columns: &ColumnMap,
    date_formats: &[String],
) -> Result<ItemRecord, Vec<DataError>> {
    let mut check = RowCheck::new(row);

    let name = check.required_text(&columns.name);
    let purchaser = check.required_text(&columns.purchaser);
    let method = check.required_text(&columns.method);
    let date_bought = check.date(&columns.date_bought, date_formats);
    let quantity = check.quantity(&columns.quantity);
    let total_weight = check.non_negative(&columns.total_weight, true);

    let iso_code = check.iso_code(&columns.iso_code);
    let latitude = check.bounded(&columns.latitude, -90.0, 90.0);
    let longitude = check.bounded(&columns.longitude, -180.0, 180.0);
    let height = check.non_negative(&columns.height, false);
    let width = check.non_negative(&columns.width, false);
    let length = check.non_negative(&columns.length, false);

    let avg_weight = match (total_weight, quantity) {
        (Some(w), Some(q)) => match average_weight(row.number, w, q) {
            Ok(avg) => Some(avg),
            Err(e) => {
                check.errors.push(e);
                None
            }
        },
        _ => None,
    };

    // A missing required value always leaves an error behind.
    match (date_bought, quantity, total_weight, avg_weight) {
        (Some(date_bought), Some(quantity), Some(total_weight), Some(avg_weight))
            if check.errors.is_empty() =>
        {
            Ok(ItemRecord {
                row: row.number,
                name,
                about: check.text(&columns.about),
                year: date_bought.year(),
                date_bought,
                purchaser,
                method,
                city: check.text(&columns.city),
                state: check.text(&columns.state),
                country: check.text(&columns.country),
                iso_code,
                latitude,
                longitude,
                quantity,
                total_weight,
                avg_weight,
                height,
                width,
                length,
            })
        }
        _ => Err(check.errors),
    }
}
