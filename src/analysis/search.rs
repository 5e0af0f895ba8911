//! Searchable item table.

use crate::config::TableColumn;
use crate::models::{ItemRecord, ItemTable};

impl TableColumn {
    /// Header text for the column.
    pub fn label(&self) -> &'static str {
        match self {
            TableColumn::Name => "Name",
            TableColumn::About => "About",
            TableColumn::DateBought => "Date Bought",
            TableColumn::Purchaser => "Purchaser",
            TableColumn::Method => "Purchase Method",
            TableColumn::City => "City",
            TableColumn::State => "State",
            TableColumn::Country => "Country",
            TableColumn::Quantity => "Quantity",
            TableColumn::TotalWeight => "Total Weight (g)",
            TableColumn::AvgWeight => "Avg. Weight (g)",
            TableColumn::Height => "Height (cm)",
            TableColumn::Width => "Width (cm)",
            TableColumn::Length => "Length (cm)",
        }
    }

    /// Cell text for an item.
    pub fn cell(&self, item: &ItemRecord) -> String {
        let opt = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
        match self {
            TableColumn::Name => item.name.clone(),
            TableColumn::About => item.about.clone(),
            TableColumn::DateBought => item.date_bought.format("%Y-%m-%d").to_string(),
            TableColumn::Purchaser => item.purchaser.clone(),
            TableColumn::Method => item.method.clone(),
            TableColumn::City => item.city.clone(),
            TableColumn::State => item.state.clone(),
            TableColumn::Country => item.country.clone(),
            TableColumn::Quantity => item.quantity.to_string(),
            TableColumn::TotalWeight => item.total_weight.to_string(),
            TableColumn::AvgWeight => item.avg_weight.to_string(),
            TableColumn::Height => opt(item.height),
            TableColumn::Width => opt(item.width),
            TableColumn::Length => opt(item.length),
        }
    }
}

/// Check whether every whitespace-separated term of `query` occurs in
/// at least one of `cells`, ignoring case.
pub fn matches_query(cells: &[String], query: &str) -> bool {
    let haystack: Vec<String> = cells.iter().map(|c| c.to_lowercase()).collect();
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .all(|term| haystack.iter().any(|cell| cell.contains(&term)))
}

/// Project items onto `columns`, keeping only rows that match `query`.
///
/// Rows keep the order of `items` (purchase date).
pub fn build_table(items: &[ItemRecord], columns: &[TableColumn], query: Option<&str>) -> ItemTable {
    let query = query.map(str::trim).filter(|q| !q.is_empty());

    let rows = items
        .iter()
        .map(|item| columns.iter().map(|c| c.cell(item)).collect::<Vec<_>>())
        .filter(|cells| query.map_or(true, |q| matches_query(cells, q)))
        .collect();

    ItemTable {
        columns: columns.iter().map(|c| c.label().to_string()).collect(),
        query: query.map(String::from),
        rows,
    }
}
