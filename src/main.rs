//! Analyducks - rubber duck collection dashboard
//!
//! A CLI tool that loads a collection sheet, derives aggregate views
//! and headline figures, and writes them as a Markdown or JSON report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (I/O, config, malformed file, etc.)
//!   2 - Data-quality errors in the source table (nothing was rendered)

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod report;
mod source;

use anyhow::{anyhow, Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use models::{ItemCard, Report, ReportMetadata};
use std::path::PathBuf;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("Analyducks v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .analyducks.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to map column names, define views, and pick table columns.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load, derive and render. Returns the exit code (0 or 2).
fn run(args: Args) -> Result<i32> {
    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate().context("Invalid configuration")?;

    let today = args.today()?;
    let data_path = match config.source.path {
        Some(ref p) => PathBuf::from(p),
        None => {
            return Err(anyhow!(
                "No data file given (use --data, ANALYDUCKS_DATA, or [source] path in {})",
                CONFIG_FILE
            ))
        }
    };

    // Step 1: Load the table
    if !args.quiet {
        println!("📥 Loading collection: {}", data_path.display());
    }
    let dataset = source::load_dataset(&data_path, config.source.format)?;
    info!("Loaded {} rows from {}", dataset.len(), data_path.display());
    debug!("Columns: {:?}", dataset.columns);

    if dataset.is_empty() {
        warn!("Source table has no rows; every view will be empty");
    }

    // Step 2: Normalize and derive
    let dashboard = match analysis::run_pipeline(&dataset, &config, today) {
        Ok(dashboard) => dashboard,
        Err(errors) => {
            for e in errors.iter() {
                warn!(row = e.row(), "{}", e);
            }
            error!("{} data-quality error(s); no report written", errors.len());
            eprintln!("\n⛔ {}", errors);
            eprintln!("Fix the source table and run again (exit code 2).");
            return Ok(2);
        }
    };

    // Handle --dry-run: validate only
    if args.dry_run {
        println!(
            "\n✅ Dry run: {} records, {} items, all valid. No report written.",
            dashboard.items.len(),
            dashboard.summary.total_quantity
        );
        return Ok(0);
    }

    // Step 3: Build the report
    let table = config.report.include_table.then(|| {
        analysis::build_table(
            &dashboard.items,
            &config.report.table_columns,
            args.search.as_deref(),
        )
    });

    let cards = if config.report.include_cards {
        dashboard.items.iter().map(ItemCard::from).collect()
    } else {
        Vec::new()
    };

    let report = Report {
        metadata: ReportMetadata {
            source: dataset.source.display().to_string(),
            records: dashboard.items.len(),
            today,
            year_gaps_filled: config.pipeline.fill_year_gaps,
        },
        summary: dashboard.summary.clone(),
        views: dashboard.views.clone(),
        locations: if config.report.include_locations {
            dashboard.locations.clone()
        } else {
            Vec::new()
        },
        dimensions: if config.report.include_dimensions {
            dashboard.dimensions.clone()
        } else {
            Vec::new()
        },
        table,
        cards,
    };

    // Step 4: Render and save
    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    let output_path = PathBuf::from(&config.general.output);
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    if !args.quiet {
        let summary = &report.summary;
        println!("\n📊 Collection Summary:");
        println!("   Total ducks owned: {}", summary.total_quantity);
        println!("   Bought within last year: {}", summary.bought_last_year);
        println!("   Collection weight: {}g", summary.total_weight);
        println!(
            "   Countries: {} | Cities: {}",
            summary.unique_countries, summary.unique_cities
        );
        if let Some(ref table) = report.table {
            if let Some(ref query) = table.query {
                println!("   Items matching \"{}\": {}", query, table.rows.len());
            }
        }
        println!("\n✅ Report saved to: {}", output_path.display());
    }

    Ok(0)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
