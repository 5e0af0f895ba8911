//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.analyducks.toml` files. The column map and view list let one
//! pipeline serve every variant of the collection sheet.

use crate::error::ConfigError;
use crate::models::{GroupBy, Measure};
use crate::source::SourceFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Default config file name, looked up in the current directory.
pub const CONFIG_FILE: &str = ".analyducks.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Source table settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Source column names.
    #[serde(default)]
    pub columns: ColumnMap,

    /// Pipeline behavior.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Derived view definitions.
    #[serde(default = "default_views")]
    pub views: Vec<ViewDefinition>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            source: SourceConfig::default(),
            columns: ColumnMap::default(),
            pipeline: PipelineConfig::default(),
            report: ReportConfig::default(),
            views: default_views(),
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
        }
    }
}

fn default_output() -> String {
    "analyducks_report.md".to_string()
}

/// Where and how to read the collection table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Path to the data file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Table format; detected from the extension when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<SourceFormat>,

    /// `chrono` formats tried in order when parsing purchase dates.
    /// Formats containing a time component are parsed as date-times.
    #[serde(default = "default_date_formats")]
    pub date_formats: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: None,
            format: None,
            date_formats: default_date_formats(),
        }
    }
}

fn default_date_formats() -> Vec<String> {
    vec!["%Y-%m-%d", "%Y-%m-%d %H:%M:%S", "%m/%d/%Y"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Source column names for each item field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
    pub name: String,
    pub about: String,
    pub date_bought: String,
    pub purchaser: String,
    pub method: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub iso_code: String,
    pub latitude: String,
    pub longitude: String,
    pub quantity: String,
    pub total_weight: String,
    pub height: String,
    pub width: String,
    pub length: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            name: "Name".to_string(),
            about: "About Me".to_string(),
            date_bought: "Date_Bought".to_string(),
            purchaser: "Buyer".to_string(),
            method: "Purchase_Method".to_string(),
            city: "Purchase_City".to_string(),
            state: "Purchase_State".to_string(),
            country: "Purchase_Country".to_string(),
            iso_code: "ISO_Code".to_string(),
            latitude: "Latitude".to_string(),
            longitude: "Longitude".to_string(),
            quantity: "Quantity".to_string(),
            total_weight: "Total_Weight".to_string(),
            height: "Height".to_string(),
            width: "Width".to_string(),
            length: "Length".to_string(),
        }
    }
}

/// Pipeline behavior switches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Insert carry-forward rows for years without purchases in
    /// cumulative views. Off by default: missing years stay missing.
    #[serde(default)]
    pub fill_year_gaps: bool,
}

/// One named derived view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewDefinition {
    pub name: String,
    pub group_by: GroupBy,
    #[serde(default)]
    pub measure: Measure,
    /// Running totals across ascending keys. Only valid for `year`.
    #[serde(default)]
    pub cumulative: bool,
}

impl ViewDefinition {
    pub fn new(name: &str, group_by: GroupBy, measure: Measure, cumulative: bool) -> Self {
        Self {
            name: name.to_string(),
            group_by,
            measure,
            cumulative,
        }
    }
}

fn default_views() -> Vec<ViewDefinition> {
    vec![
        ViewDefinition::new("by_purchaser", GroupBy::Purchaser, Measure::Quantity, false),
        ViewDefinition::new("by_method", GroupBy::Method, Measure::Quantity, false),
        ViewDefinition::new("by_year", GroupBy::Year, Measure::QuantityAndWeight, false),
        ViewDefinition::new(
            "cumulative_by_year",
            GroupBy::Year,
            Measure::QuantityAndWeight,
            true,
        ),
        ViewDefinition::new("by_country", GroupBy::Country, Measure::Quantity, false),
        ViewDefinition::new("by_state", GroupBy::State, Measure::Quantity, false),
    ]
}

/// Columns available in the item table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableColumn {
    Name,
    About,
    DateBought,
    Purchaser,
    Method,
    City,
    State,
    Country,
    Quantity,
    TotalWeight,
    AvgWeight,
    Height,
    Width,
    Length,
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Include the item table.
    #[serde(default = "default_true")]
    pub include_table: bool,

    /// Include item cards.
    #[serde(default)]
    pub include_cards: bool,

    /// Include purchase locations.
    #[serde(default = "default_true")]
    pub include_locations: bool,

    /// Include per-item dimensions.
    #[serde(default = "default_true")]
    pub include_dimensions: bool,

    /// Columns shown in the item table, in order.
    #[serde(default = "default_table_columns")]
    pub table_columns: Vec<TableColumn>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_table: true,
            include_cards: false,
            include_locations: true,
            include_dimensions: true,
            table_columns: default_table_columns(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_table_columns() -> Vec<TableColumn> {
    vec![
        TableColumn::Name,
        TableColumn::City,
        TableColumn::Country,
        TableColumn::DateBought,
        TableColumn::About,
        TableColumn::TotalWeight,
        TableColumn::Height,
        TableColumn::Width,
        TableColumn::Length,
    ]
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data) = args.data {
            self.source.path = Some(data.display().to_string());
        }
        if let Some(format) = args.source_format {
            self.source.format = Some(format);
        }
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }

        // Flags always override
        if args.fill_year_gaps {
            self.pipeline.fill_year_gaps = true;
        }
        if args.cards {
            self.report.include_cards = true;
        }
    }

    /// Check view definitions and date formats.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.source.date_formats.is_empty() {
            return Err(ConfigError::NoDateFormats);
        }

        let mut seen = HashSet::new();
        for view in &self.views {
            if view.name.trim().is_empty() {
                return Err(ConfigError::EmptyViewName);
            }
            if !seen.insert(view.name.as_str()) {
                return Err(ConfigError::DuplicateView(view.name.clone()));
            }
            if view.cumulative && view.group_by != GroupBy::Year {
                return Err(ConfigError::CumulativeWithoutYear(view.name.clone()));
            }
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
