//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::error::ConfigError;
use crate::source::SourceFormat;
use chrono::{Local, NaiveDate};
use clap::Parser;
use std::path::PathBuf;

/// Analyducks - statistics and reports for a rubber duck collection
///
/// Loads the collection sheet, derives per-purchaser, per-method,
/// per-year, cumulative, per-country and per-state views plus the
/// headline figures, and writes them as a Markdown or JSON report.
///
/// Examples:
///   analyducks --data data/ducks.csv
///   analyducks --data data/ducks.json --format json -o dashboard.json
///   analyducks --data data/ducks.csv --search "tokyo" --cards
///   analyducks --data data/ducks.csv --dry-run
///   analyducks --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Collection table to load (.csv or .json)
    ///
    /// Can also be set via ANALYDUCKS_DATA or `[source] path` in .analyducks.toml.
    #[arg(short, long, value_name = "FILE", env = "ANALYDUCKS_DATA")]
    pub data: Option<PathBuf>,

    /// Source table format, when it cannot be inferred from the extension
    #[arg(long, value_name = "FORMAT")]
    pub source_format: Option<SourceFormat>,

    /// Output file path for the report
    ///
    /// Defaults to `[general] output` from the config, or analyducks_report.md.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .analyducks.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Reference date for the "bought within the last year" figure
    ///
    /// Format: YYYY-MM-DD. Defaults to the local date.
    #[arg(long, value_name = "DATE")]
    pub today: Option<String>,

    /// Only list items matching this text in the item table
    ///
    /// Case-insensitive; every whitespace-separated term must match.
    #[arg(short, long, value_name = "TEXT")]
    pub search: Option<String>,

    /// Fill years without purchases in cumulative views
    #[arg(long)]
    pub fill_year_gaps: bool,

    /// Include one card per item in the report
    #[arg(long)]
    pub cards: bool,

    /// Load and validate the data without writing a report
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .analyducks.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Err(e) = self.today() {
            return Err(e.to_string());
        }

        if let Some(ref query) = self.search {
            if query.trim().is_empty() {
                return Err("Search text must not be empty".to_string());
            }
        }

        // Validate data file if provided
        if let Some(ref data) = self.data {
            if !data.exists() {
                return Err(format!("Data file does not exist: {}", data.display()));
            }
            if !data.is_file() {
                return Err(format!("Data path is not a file: {}", data.display()));
            }
        }

        Ok(())
    }

    /// The reference date: `--today` if given, otherwise the local date.
    pub fn today(&self) -> Result<NaiveDate, ConfigError> {
        match self.today {
            Some(ref s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map_err(|_| ConfigError::InvalidToday(s.clone())),
            None => Ok(Local::now().date_naive()),
        }
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
