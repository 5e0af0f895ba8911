//! Named derived views.
//!
//! One parameterized pipeline: each [`ViewDefinition`] names a grouping
//! key, a measure, and whether the series is cumulative.

use super::aggregator::{
    cumulative_by_year, sum_by_city, sum_by_country, sum_by_method, sum_by_purchaser,
    sum_by_state, sum_by_year,
};
use crate::config::ViewDefinition;
use crate::models::{round2, DerivedView, GroupBy, GroupKey, GroupTotals, ItemRecord, Measure, ViewRow};
use std::collections::BTreeMap;
use tracing::debug;

/// Build one view from its definition.
pub fn derive_view(
    items: &[ItemRecord],
    definition: &ViewDefinition,
    fill_year_gaps: bool,
) -> DerivedView {
    let with_weight = definition.measure == Measure::QuantityAndWeight;

    let rows = if definition.cumulative {
        cumulative_by_year(items, fill_year_gaps)
            .into_iter()
            .map(|r| ViewRow {
                key: GroupKey::Year(r.year),
                quantity: r.quantity,
                total_weight: with_weight.then_some(r.total_weight),
                filled: r.filled,
            })
            .collect()
    } else {
        grouped_totals(items, definition.group_by)
            .into_iter()
            .map(|(key, totals)| ViewRow {
                key,
                quantity: totals.quantity,
                total_weight: with_weight.then(|| round2(totals.total_weight)),
                filled: false,
            })
            .collect()
    };

    let view = DerivedView {
        name: definition.name.clone(),
        group_by: definition.group_by,
        measure: definition.measure,
        cumulative: definition.cumulative,
        rows,
    };
    debug!("View '{}': {} rows", view.name, view.rows.len());
    view
}

/// Build every configured view, in definition order.
pub fn derive_views(
    items: &[ItemRecord],
    definitions: &[ViewDefinition],
    fill_year_gaps: bool,
) -> Vec<DerivedView> {
    definitions
        .iter()
        .map(|d| derive_view(items, d, fill_year_gaps))
        .collect()
}

fn grouped_totals(items: &[ItemRecord], group_by: GroupBy) -> BTreeMap<GroupKey, GroupTotals> {
    fn text_keys(map: BTreeMap<String, GroupTotals>) -> BTreeMap<GroupKey, GroupTotals> {
        map.into_iter().map(|(k, v)| (GroupKey::Text(k), v)).collect()
    }

    match group_by {
        GroupBy::Purchaser => text_keys(sum_by_purchaser(items)),
        GroupBy::Method => text_keys(sum_by_method(items)),
        GroupBy::State => text_keys(sum_by_state(items)),
        GroupBy::City => text_keys(sum_by_city(items)),
        GroupBy::Year => sum_by_year(items)
            .into_iter()
            .map(|(year, v)| (GroupKey::Year(year), v))
            .collect(),
        GroupBy::Country => sum_by_country(items)
            .into_iter()
            .map(|((country, iso_code), v)| (GroupKey::Country { country, iso_code }, v))
            .collect(),
    }
}
