//! Error types for data-quality and configuration failures.
//!
//! Operational failures (I/O, malformed files) travel as `anyhow::Error`.
//! The types here describe problems with the *content* of the collection
//! sheet or with the view configuration, so they can be reported precisely.

use std::fmt;
use thiserror::Error;

/// A single data-quality problem found in one row of the source table.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("row {row}: missing required field '{column}'")]
    MissingField { row: usize, column: String },

    #[error("row {row}: cannot parse date '{value}' in column '{column}'")]
    InvalidDate {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: quantity is zero, average weight is undefined")]
    ZeroQuantity { row: usize },

    #[error("row {row}: '{value}' in column '{column}' is not a valid {expected}")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
        expected: &'static str,
    },

    #[error("row {row}: column '{column}' must not be negative (got {value})")]
    Negative {
        row: usize,
        column: String,
        value: f64,
    },

    #[error("row {row}: '{value}' is not a 2-3 letter ISO country code")]
    InvalidIsoCode { row: usize, value: String },

    #[error("row {row}: {column} {value} is outside [{min}, {max}]")]
    OutOfRange {
        row: usize,
        column: String,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl DataError {
    /// Row number (1-based, header excluded) the error refers to.
    pub fn row(&self) -> usize {
        match self {
            DataError::MissingField { row, .. }
            | DataError::InvalidDate { row, .. }
            | DataError::ZeroQuantity { row }
            | DataError::InvalidNumber { row, .. }
            | DataError::Negative { row, .. }
            | DataError::InvalidIsoCode { row, .. }
            | DataError::OutOfRange { row, .. } => *row,
        }
    }
}

/// Every data-quality error found in one normalization pass.
///
/// Normalization fails closed: if this is non-empty no derived view is built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataErrors(pub Vec<DataError>);

impl DataErrors {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataError> {
        self.0.iter()
    }
}

impl fmt::Display for DataErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} data-quality error(s) in source table:", self.0.len())?;
        for err in &self.0 {
            writeln!(f, "  - {}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for DataErrors {}

/// Problems with the view or column configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("view '{0}': cumulative views must group by year")]
    CumulativeWithoutYear(String),

    #[error("duplicate view name '{0}'")]
    DuplicateView(String),

    #[error("view name must not be empty")]
    EmptyViewName,

    #[error("no date formats configured")]
    NoDateFormats,

    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidToday(String),
}
