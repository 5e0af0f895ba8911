//! Aggregation and summary statistics.
//!
//! This module provides the group-and-sum operations, the cumulative
//! by-year series and the headline metrics computed over a normalized
//! item set. Every function is pure over its input slice.

use crate::models::{
    round2, DimensionPoint, GroupTotals, ItemRecord, LocationPoint, SummaryMetrics, YearTotals,
};
use chrono::{Months, NaiveDate};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Group items by a key and sum quantity and weight per group.
///
/// Items for which `key` returns `None` are left out of the result.
/// Weight sums stay unrounded; round them when building output rows.
pub fn group_and_sum<K, F>(items: &[ItemRecord], key: F) -> BTreeMap<K, GroupTotals>
where
    K: Ord,
    F: Fn(&ItemRecord) -> Option<K>,
{
    let mut grouped: BTreeMap<K, GroupTotals> = BTreeMap::new();

    for item in items {
        if let Some(k) = key(item) {
            grouped.entry(k).or_default().add(item);
        }
    }

    grouped
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Quantity per purchaser.
pub fn sum_by_purchaser(items: &[ItemRecord]) -> BTreeMap<String, GroupTotals> {
    group_and_sum(items, |i| non_empty(&i.purchaser))
}

/// Quantity per purchase method.
pub fn sum_by_method(items: &[ItemRecord]) -> BTreeMap<String, GroupTotals> {
    group_and_sum(items, |i| non_empty(&i.method))
}

/// Quantity and weight per purchase year.
pub fn sum_by_year(items: &[ItemRecord]) -> BTreeMap<i32, GroupTotals> {
    group_and_sum(items, |i| Some(i.year))
}

/// Quantity per (country, ISO code). Items without an ISO code are skipped.
pub fn sum_by_country(items: &[ItemRecord]) -> BTreeMap<(String, String), GroupTotals> {
    group_and_sum(items, |i| {
        let code = i.iso_code.as_ref();
        if code.is_none() {
            debug!("Row {}: no ISO code, left out of country view", i.row);
        }
        code.map(|iso| (i.country.clone(), iso.clone()))
    })
}

/// Quantity per region/state. The empty-string sentinel is skipped.
pub fn sum_by_state(items: &[ItemRecord]) -> BTreeMap<String, GroupTotals> {
    group_and_sum(items, |i| non_empty(&i.state))
}

/// Quantity per purchase city.
pub fn sum_by_city(items: &[ItemRecord]) -> BTreeMap<String, GroupTotals> {
    group_and_sum(items, |i| non_empty(&i.city))
}

/// Running totals of quantity and weight across years, ascending.
///
/// Years without purchases produce no row unless `fill_gaps` is set, in
/// which case they get a row carrying the previous cumulative values.
pub fn cumulative_by_year(items: &[ItemRecord], fill_gaps: bool) -> Vec<YearTotals> {
    let yearly = sum_by_year(items);
    let mut series = Vec::with_capacity(yearly.len());
    let mut quantity = 0u64;
    let mut weight = 0.0f64;
    let mut previous: Option<i32> = None;

    for (year, totals) in yearly {
        if fill_gaps {
            if let Some(prev) = previous {
                for gap in (prev + 1)..year {
                    series.push(YearTotals {
                        year: gap,
                        quantity,
                        total_weight: round2(weight),
                        filled: true,
                    });
                }
            }
        }

        quantity += totals.quantity;
        weight += totals.total_weight;
        series.push(YearTotals {
            year,
            quantity,
            total_weight: round2(weight),
            filled: false,
        });
        previous = Some(year);
    }

    series
}

/// Start of the trailing one-year window ending at `today`.
///
/// Calendar-aware: Feb 29 maps to Feb 28 of the previous year.
pub fn trailing_year_start(today: NaiveDate) -> NaiveDate {
    today
        .checked_sub_months(Months::new(12))
        .unwrap_or(NaiveDate::MIN)
}

/// Compute the headline figures.
pub fn summary_metrics(items: &[ItemRecord], today: NaiveDate) -> SummaryMetrics {
    let window_start = trailing_year_start(today);

    let total_quantity = items.iter().map(|i| u64::from(i.quantity)).sum();
    let total_weight = round2(items.iter().map(|i| i.total_weight).sum());

    let unique_countries = items
        .iter()
        .filter(|i| !i.country.is_empty())
        .map(|i| i.country.as_str())
        .collect::<HashSet<_>>()
        .len();

    let unique_cities = items
        .iter()
        .filter(|i| !i.city.is_empty())
        .map(|i| i.city.as_str())
        .collect::<HashSet<_>>()
        .len();

    let bought_last_year = items
        .iter()
        .filter(|i| i.date_bought >= window_start)
        .map(|i| u64::from(i.quantity))
        .sum();

    SummaryMetrics {
        total_quantity,
        total_weight,
        unique_countries,
        unique_cities,
        bought_last_year,
        window_start,
    }
}

/// Purchase locations for every item with both coordinates.
pub fn purchase_locations(items: &[ItemRecord]) -> Vec<LocationPoint> {
    items
        .iter()
        .filter_map(|i| match (i.latitude, i.longitude) {
            (Some(latitude), Some(longitude)) => Some(LocationPoint {
                name: i.name.clone(),
                city: i.city.clone(),
                country: i.country.clone(),
                latitude,
                longitude,
            }),
            _ => None,
        })
        .collect()
}

/// Dimensions for every item with length, width and height recorded.
pub fn dimension_points(items: &[ItemRecord]) -> Vec<DimensionPoint> {
    items
        .iter()
        .filter_map(|i| match (i.length, i.width, i.height) {
            (Some(length), Some(width), Some(height)) => Some(DimensionPoint {
                name: i.name.clone(),
                length,
                width,
                height,
                avg_weight: i.avg_weight,
            }),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::item;

    fn scenario() -> Vec<ItemRecord> {
        vec![
            item(1, "2020-03-01", 2, 10.0),
            item(2, "2020-07-15", 1, 5.0),
            item(3, "2021-01-20", 3, 9.0),
        ]
    }

    #[test]
    fn test_sum_by_year_scenario() {
        let yearly = sum_by_year(&scenario());

        assert_eq!(yearly.len(), 2);
        assert_eq!(yearly[&2020].quantity, 3);
        assert_eq!(yearly[&2020].total_weight, 15.0);
        assert_eq!(yearly[&2021].quantity, 3);
        assert_eq!(yearly[&2021].total_weight, 9.0);
    }

    #[test]
    fn test_cumulative_by_year_scenario() {
        let series = cumulative_by_year(&scenario(), false);

        assert_eq!(series.len(), 2);
        assert_eq!((series[0].year, series[0].quantity), (2020, 3));
        assert_eq!(series[0].total_weight, 15.0);
        assert_eq!((series[1].year, series[1].quantity), (2021, 6));
        assert_eq!(series[1].total_weight, 24.0);
    }

    #[test]
    fn test_scenario_averages_and_total() {
        let items = scenario();
        let averages: Vec<f64> = items.iter().map(|i| i.avg_weight).collect();
        assert_eq!(averages, vec![5.0, 5.0, 3.0]);

        let today = NaiveDate::from_ymd_opt(2021, 6, 1).unwrap();
        assert_eq!(summary_metrics(&items, today).total_quantity, 6);
    }

    #[test]
    fn test_cumulative_preserves_year_gaps() {
        let items = vec![item(1, "2018-01-01", 1, 4.0), item(2, "2021-01-01", 2, 6.0)];
        let years: Vec<i32> = cumulative_by_year(&items, false)
            .iter()
            .map(|r| r.year)
            .collect();
        assert_eq!(years, vec![2018, 2021]);
    }

    #[test]
    fn test_cumulative_fills_year_gaps() {
        let items = vec![item(1, "2018-01-01", 1, 4.0), item(2, "2021-01-01", 2, 6.0)];
        let series = cumulative_by_year(&items, true);

        let years: Vec<i32> = series.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2018, 2019, 2020, 2021]);
        assert_eq!(series[1].quantity, 1);
        assert_eq!(series[2].total_weight, 4.0);
        assert!(series[1].filled && series[2].filled);
        assert!(!series[3].filled);
        assert_eq!(series[3].quantity, 3);
    }

    #[test]
    fn test_cumulative_is_non_decreasing() {
        let items = vec![
            item(1, "2019-05-01", 1, 3.5),
            item(2, "2017-02-01", 4, 20.0),
            item(3, "2019-09-01", 2, 0.0),
            item(4, "2022-12-31", 1, 11.25),
        ];
        let series = cumulative_by_year(&items, false);

        for pair in series.windows(2) {
            assert!(pair[0].year < pair[1].year);
            assert!(pair[0].quantity <= pair[1].quantity);
            assert!(pair[0].total_weight <= pair[1].total_weight);
        }
    }

    #[test]
    fn test_purchaser_sums_match_total() {
        let mut items = scenario();
        items[1].purchaser = "Kate".to_string();
        items.push(item(4, "2022-01-01", 5, 30.0));

        let by_purchaser = sum_by_purchaser(&items);
        let total: u64 = by_purchaser.values().map(|t| t.quantity).sum();
        let today = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();

        assert_eq!(by_purchaser["Kate"].quantity, 1);
        assert_eq!(total, summary_metrics(&items, today).total_quantity);

        let last = cumulative_by_year(&items, false).last().copied().unwrap();
        assert_eq!(last.quantity, total);
    }

    #[test]
    fn test_state_excludes_empty_but_country_does_not() {
        let mut abroad = item(1, "2020-01-01", 2, 10.0);
        abroad.state = String::new();
        let mut home = item(2, "2020-01-01", 3, 12.0);
        home.state = "CA".to_string();
        let items = vec![abroad, home];

        let by_state = sum_by_state(&items);
        assert_eq!(by_state.len(), 1);
        assert_eq!(by_state["CA"].quantity, 3);

        let by_country = sum_by_country(&items);
        let key = ("United States".to_string(), "USA".to_string());
        assert_eq!(by_country[&key].quantity, 5);
    }

    #[test]
    fn test_country_skips_missing_iso_code() {
        let mut unknown = item(1, "2020-01-01", 2, 10.0);
        unknown.iso_code = None;
        let items = vec![unknown, item(2, "2020-01-01", 1, 5.0)];

        let by_country = sum_by_country(&items);
        assert_eq!(by_country.values().map(|t| t.quantity).sum::<u64>(), 1);
        // Other views still see the record
        assert_eq!(sum_by_purchaser(&items)["Allan"].quantity, 3);
    }

    #[test]
    fn test_summary_metrics() {
        let mut paris = item(3, "2023-06-01", 2, 8.0);
        paris.city = "Paris".to_string();
        paris.country = "France".to_string();
        let mut blank_city = item(4, "2023-06-02", 1, 1.0);
        blank_city.city = String::new();
        let items = vec![
            item(1, "2022-06-01", 1, 4.0),
            item(2, "2022-06-02", 3, 9.0),
            paris,
            blank_city,
        ];

        let today = NaiveDate::from_ymd_opt(2023, 6, 2).unwrap();
        let metrics = summary_metrics(&items, today);

        assert_eq!(metrics.total_quantity, 7);
        assert_eq!(metrics.total_weight, 22.0);
        assert_eq!(metrics.unique_countries, 2);
        assert_eq!(metrics.unique_cities, 2);
        // 2022-06-01 is before the window, 2022-06-02 is exactly on it
        assert_eq!(metrics.window_start, NaiveDate::from_ymd_opt(2022, 6, 2).unwrap());
        assert_eq!(metrics.bought_last_year, 6);
    }

    #[test]
    fn test_trailing_year_start_leap_day() {
        let leap = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(
            trailing_year_start(leap),
            NaiveDate::from_ymd_opt(2023, 2, 28).unwrap()
        );
    }

    #[test]
    fn test_locations_and_dimensions() {
        let mut located = item(1, "2020-01-01", 1, 10.0);
        located.latitude = Some(35.68);
        located.longitude = Some(139.69);
        located.length = Some(6.0);
        located.width = Some(4.0);
        located.height = Some(5.5);
        let mut half = item(2, "2020-01-02", 1, 10.0);
        half.latitude = Some(10.0);
        half.height = Some(3.0);
        let items = vec![located, half];

        let locations = purchase_locations(&items);
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].longitude, 139.69);

        let dims = dimension_points(&items);
        assert_eq!(dims.len(), 1);
        assert_eq!(dims[0].height, 5.5);
        assert_eq!(dims[0].avg_weight, 10.0);
    }

    #[test]
    fn test_cumulative_weight_matches_collection_weight() {
        let items = vec![
            item(1, "2020-01-01", 1, 0.005),
            item(2, "2021-01-01", 1, 0.005),
            item(3, "2022-01-01", 1, 0.005),
        ];
        let today = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();

        let last = cumulative_by_year(&items, false).last().copied().unwrap();
        let summary = summary_metrics(&items, today);
        assert_eq!(last.total_weight, summary.total_weight);

        let filled = cumulative_by_year(&items, true).last().copied().unwrap();
        assert_eq!(filled.total_weight, summary.total_weight);
    }
}
