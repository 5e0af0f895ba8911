//! Loading the collection table from CSV or JSON.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Supported source table formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Comma-separated values with a header row
    Csv,
    /// JSON array of objects
    Json,
}

impl SourceFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "csv" => Some(SourceFormat::Csv),
            "json" => Some(SourceFormat::Json),
            _ => None,
        }
    }
}

/// One raw row of the source table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    /// 1-based data row number (header excluded).
    pub number: usize,
    cells: HashMap<String, String>,
}

impl RawRow {
    pub fn new(number: usize, cells: HashMap<String, String>) -> Self {
        Self { number, cells }
    }

    /// Trimmed cell text, or `""` when the column is absent.
    pub fn get(&self, column: &str) -> &str {
        self.cells.get(column).map(|s| s.trim()).unwrap_or("")
    }
}

/// The loaded source table. Never mutated after loading.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Where the table came from.
    pub source: PathBuf,
    /// Column headers in source order.
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Load the source table, detecting the format from the extension when
/// `format` is `None`.
pub fn load_dataset(path: &Path, format: Option<SourceFormat>) -> Result<Dataset> {
    let format = match format.or_else(|| SourceFormat::from_path(path)) {
        Some(f) => f,
        None => bail!(
            "Cannot detect source format of {} (use a .csv or .json file, or set the format explicitly)",
            path.display()
        ),
    };

    info!("Loading {:?} data from {}", format, path.display());

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read data file: {}", path.display()))?;

    let (columns, rows) = match format {
        SourceFormat::Csv => parse_csv(&content)
            .with_context(|| format!("Failed to parse CSV file: {}", path.display()))?,
        SourceFormat::Json => parse_json(&content)
            .with_context(|| format!("Failed to parse JSON file: {}", path.display()))?,
    };

    debug!("Loaded {} rows with {} columns", rows.len(), columns.len());

    Ok(Dataset {
        source: path.to_path_buf(),
        columns,
        rows,
    })
}

/// Parse CSV text with a header row.
pub fn parse_csv(content: &str) -> Result<(Vec<String>, Vec<RawRow>)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let columns: Vec<String> = reader.headers()?.iter().map(String::from).collect();
    let mut rows = Vec::new();

    for (i, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Malformed CSV record at data row {}", i + 1))?;

        // Fully blank lines in spreadsheet exports are not records.
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }

        let cells = columns
            .iter()
            .zip(record.iter())
            .map(|(col, cell)| (col.clone(), cell.to_string()))
            .collect();
        rows.push(RawRow::new(i + 1, cells));
    }

    Ok((columns, rows))
}

/// Parse a JSON array of flat objects.
pub fn parse_json(content: &str) -> Result<(Vec<String>, Vec<RawRow>)> {
    let value: Value = serde_json::from_str(content)?;
    let Value::Array(items) = value else {
        bail!("Expected a JSON array of objects at the top level");
    };

    let mut columns: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(items.len());

    for (i, item) in items.into_iter().enumerate() {
        let Value::Object(map) = item else {
            bail!("Element {} is not a JSON object", i + 1);
        };

        let mut cells = HashMap::with_capacity(map.len());
        for (key, value) in map {
            if !columns.contains(&key) {
                columns.push(key.clone());
            }
            cells.insert(key, cell_text(value));
        }
        rows.push(RawRow::new(i + 1, cells));
    }

    Ok((columns, rows))
}

fn cell_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
