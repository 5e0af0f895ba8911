//! Aggregation pipeline.
//!
//! Normalizes the loaded dataset and derives every view the report
//! needs. [`run_pipeline`] is deterministic: the same dataset, config
//! and reference date always produce the same [`Dashboard`].

pub mod aggregator;
pub mod normalize;
pub mod search;
pub mod views;

pub use aggregator::*;
pub use normalize::normalize;
pub use search::build_table;
pub use views::derive_views;

use crate::config::Config;
use crate::error::DataErrors;
use crate::models::{DerivedView, DimensionPoint, ItemRecord, LocationPoint, SummaryMetrics};
use crate::source::Dataset;
use chrono::NaiveDate;
use tracing::info;

/// Everything derived from one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    /// Normalized records, sorted by purchase date.
    pub items: Vec<ItemRecord>,
    pub summary: SummaryMetrics,
    pub views: Vec<DerivedView>,
    pub locations: Vec<LocationPoint>,
    pub dimensions: Vec<DimensionPoint>,
}

/// Normalize the dataset and derive every view.
///
/// Fails closed: any data-quality error aborts before a view is built.
pub fn run_pipeline(
    dataset: &Dataset,
    config: &Config,
    today: NaiveDate,
) -> Result<Dashboard, DataErrors> {
    let items = normalize(dataset, &config.columns, &config.source.date_formats)?;

    let summary = summary_metrics(&items, today);
    let views = derive_views(&items, &config.views, config.pipeline.fill_year_gaps);
    let locations = purchase_locations(&items);
    let dimensions = dimension_points(&items);

    info!(
        "Derived {} views from {} records ({} items)",
        views.len(),
        items.len(),
        summary.total_quantity
    );

    Ok(Dashboard {
        items,
        summary,
        views,
        locations,
        dimensions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::parse_csv;
    use std::path::PathBuf;

    const SHEET: &str = "\
Name,About Me,Date_Bought,Buyer,Purchase_Method,Purchase_City,Purchase_State,Purchase_Country,ISO_Code,Latitude,Longitude,Quantity,Total_Weight,Height,Width,Length
Classic,The original,2020-03-01,Allan,In Person,St. Louis,MO,United States,USA,38.63,-90.2,2,10,5,4,6
Sumo,Heavyweight,2021-01-20,Kate,Online,Tokyo,,Japan,JPN,35.68,139.69,3,9,,,
Surfer,Hangs ten,2020-07-15,Allan,Gift,San Diego,CA,United States,USA,,,1,5,4.5,4,5.5
";

    fn dataset(content: &str) -> Dataset {
        let (columns, rows) = parse_csv(content).unwrap();
        Dataset {
            source: PathBuf::from("ducks.csv"),
            columns,
            rows,
        }
    }

    #[test]
    fn test_run_pipeline() {
        let today = NaiveDate::from_ymd_opt(2021, 6, 1).unwrap();
        let dashboard = run_pipeline(&dataset(SHEET), &Config::default(), today).unwrap();

        let names: Vec<&str> = dashboard.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Classic", "Surfer", "Sumo"]);

        assert_eq!(dashboard.summary.total_quantity, 6);
        assert_eq!(dashboard.summary.total_weight, 24.0);
        assert_eq!(dashboard.summary.unique_countries, 2);
        assert_eq!(dashboard.summary.unique_cities, 3);
        assert_eq!(dashboard.summary.bought_last_year, 4);

        assert_eq!(dashboard.views.len(), 6);
        assert_eq!(dashboard.locations.len(), 2);
        assert_eq!(dashboard.dimensions.len(), 2);
    }

    #[test]
    fn test_run_pipeline_is_idempotent() {
        let today = NaiveDate::from_ymd_opt(2021, 6, 1).unwrap();
        let data = dataset(SHEET);
        let config = Config::default();

        let first = run_pipeline(&data, &config, today).unwrap();
        let second = run_pipeline(&data, &config, today).unwrap();
        assert_eq!(first, second);

        let first_json = serde_json::to_string(&first.views).unwrap();
        let second_json = serde_json::to_string(&second.views).unwrap();
        assert_eq!(first_json, second_json);
    }

    #[test]
    fn test_run_pipeline_fails_closed() {
        let broken = format!("{}Broken,,someday,Allan,Online,,,,,,,0,1,,,\n", SHEET);
        let today = NaiveDate::from_ymd_opt(2021, 6, 1).unwrap();

        let errors = run_pipeline(&dataset(&broken), &Config::default(), today).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.row() == 4));
    }
}
