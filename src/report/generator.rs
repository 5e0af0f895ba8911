//! Markdown and JSON report generation.
//!
//! This module renders the dashboard report: headline figures, one
//! table per derived view, locations, dimensions, the item table and
//! optional item cards.

use crate::models::{
    DerivedView, DimensionPoint, ItemCard, ItemTable, LocationPoint, Measure, Report,
    ReportMetadata, SummaryMetrics,
};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# Analyducks\n\n");
    output.push_str("A visual analysis of a rubber duck collection.\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(report));
    output.push_str(&generate_summary_section(&report.summary));
    output.push_str(&generate_views_section(&report.views));
    output.push_str(&generate_locations_section(&report.locations));
    output.push_str(&generate_dimensions_section(&report.dimensions));

    if let Some(ref table) = report.table {
        output.push_str(&generate_table_section(table));
    }

    output.push_str(&generate_cards_section(&report.cards));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** `{}`\n", metadata.source));
    section.push_str(&format!("- **Records:** {}\n", metadata.records));
    section.push_str(&format!(
        "- **Reference Date:** {}\n",
        metadata.today.format("%Y-%m-%d")
    ));
    if metadata.year_gaps_filled {
        section.push_str("- **Cumulative Views:** years without purchases carried forward\n");
    }
    section.push('\n');

    section
}

fn anchor(title: &str) -> String {
    title
        .to_lowercase()
        .replace(|c: char| !c.is_ascii_alphanumeric() && !matches!(c, ' ' | '-' | '_'), "")
        .replace(' ', "-")
}

/// Generate the table of contents.
fn generate_table_of_contents(report: &Report) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Summary](#summary)\n");
    toc.push_str("- [Views](#views)\n");

    for view in &report.views {
        let title = view_title(view);
        toc.push_str(&format!("  - [{}](#{})\n", title, anchor(&title)));
    }

    if !report.locations.is_empty() {
        toc.push_str("- [Purchase Locations](#purchase-locations)\n");
    }
    if !report.dimensions.is_empty() {
        toc.push_str("- [Dimensions](#dimensions)\n");
    }
    if report.table.is_some() {
        toc.push_str("- [Collection](#collection)\n");
    }
    if !report.cards.is_empty() {
        toc.push_str("- [Cards](#cards)\n");
    }

    toc.push('\n');

    toc
}

/// Generate the headline figures.
fn generate_summary_section(summary: &SummaryMetrics) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str(
        "| Total Ducks Owned | Ducks Bought Within Last Year | Duck Collection Weight (g) | Unique Countries of Purchase | Unique Cities of Purchase |\n",
    );
    section.push_str("|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| **{}** | **{}** | **{}** | **{}** | **{}** |\n\n",
        summary.total_quantity,
        summary.bought_last_year,
        summary.total_weight,
        summary.unique_countries,
        summary.unique_cities
    ));
    section.push_str(&format!(
        "*Last year = purchases on or after {}.*\n\n",
        summary.window_start.format("%Y-%m-%d")
    ));

    section
}

fn view_title(view: &DerivedView) -> String {
    let mut title = if view.cumulative {
        format!("Cumulative by {}", view.group_by)
    } else {
        format!("By {}", view.group_by)
    };
    title.push_str(&format!(" ({})", view.name));
    title
}

/// Generate one table per derived view.
fn generate_views_section(views: &[DerivedView]) -> String {
    let mut section = String::new();

    section.push_str("## Views\n\n");

    if views.is_empty() {
        section.push_str("No views are configured.\n\n");
        return section;
    }

    for view in views {
        section.push_str(&generate_view_block(view));
    }

    section
}

/// Generate the table for a single view.
fn generate_view_block(view: &DerivedView) -> String {
    let mut block = String::new();
    let with_weight = view.measure == Measure::QuantityAndWeight;

    block.push_str(&format!("### {}\n\n", view_title(view)));

    if view.rows.is_empty() {
        block.push_str("*No data.*\n\n");
        return block;
    }

    if with_weight {
        block.push_str(&format!("| {} | Quantity | Weight (g) |\n", view.group_by));
        block.push_str("|:---|---:|---:|\n");
    } else {
        block.push_str(&format!("| {} | Quantity |\n", view.group_by));
        block.push_str("|:---|---:|\n");
    }

    for row in &view.rows {
        let key = if row.filled {
            format!("{} \\*", escape_cell(&row.key.to_string()))
        } else {
            escape_cell(&row.key.to_string())
        };
        match row.total_weight {
            Some(weight) if with_weight => {
                block.push_str(&format!("| {} | {} | {} |\n", key, row.quantity, weight))
            }
            _ => block.push_str(&format!("| {} | {} |\n", key, row.quantity)),
        }
    }
    block.push('\n');

    if view.rows.iter().any(|r| r.filled) {
        block.push_str("\\* No purchases that year; totals carried forward.\n\n");
    }

    block
}

/// Generate the purchase locations section.
fn generate_locations_section(locations: &[LocationPoint]) -> String {
    if locations.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Purchase Locations\n\n");
    section.push_str("| Name | City | Country | Latitude | Longitude |\n");
    section.push_str("|:---|:---|:---|---:|---:|\n");
    for p in locations {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            escape_cell(&p.name),
            escape_cell(&p.city),
            escape_cell(&p.country),
            p.latitude,
            p.longitude
        ));
    }
    section.push('\n');

    section
}

/// Generate the dimensions section.
fn generate_dimensions_section(dimensions: &[DimensionPoint]) -> String {
    if dimensions.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Dimensions\n\n");
    section.push_str("| Name | Length (cm) | Width (cm) | Height (cm) | Avg. Weight (g) |\n");
    section.push_str("|:---|---:|---:|---:|---:|\n");
    for d in dimensions {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            escape_cell(&d.name),
            d.length,
            d.width,
            d.height,
            d.avg_weight
        ));
    }
    section.push('\n');

    section
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Generate the item table.
fn generate_table_section(table: &ItemTable) -> String {
    let mut section = String::new();

    section.push_str("## Collection\n\n");
    if let Some(ref query) = table.query {
        section.push_str(&format!(
            "*{} item(s) matching \"{}\".*\n\n",
            table.rows.len(),
            query
        ));
    }

    if table.rows.is_empty() {
        section.push_str("No items to show.\n\n");
        return section;
    }

    section.push_str(&format!("| {} |\n", table.columns.join(" | ")));
    section.push_str(&format!("|{}\n", ":---|".repeat(table.columns.len())));
    for row in &table.rows {
        let cells: Vec<String> = row.iter().map(|c| escape_cell(c)).collect();
        section.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    section.push('\n');

    section
}

/// Generate one card per item.
fn generate_cards_section(cards: &[ItemCard]) -> String {
    if cards.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Cards\n\n");
    for card in cards {
        section.push_str(&format!("### {}\n\n", escape_cell(&card.name)));
        if !card.about.is_empty() {
            section.push_str(&format!("- **About Me:** {}\n", card.about));
        }
        if !card.location.is_empty() {
            section.push_str(&format!("- **Purchase Location:** {}\n", card.location));
        }
        section.push_str(&format!("- **Purchase Date:** {}\n", card.date));
        section.push_str(&format!("- **Weight:** {}\n", card.weight));
        section.push_str(&format!("- **H x W x L:** {}\n\n", card.dimensions));
    }

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Report generated by Analyducks*\n");

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GroupBy, GroupKey, ViewRow};
    use chrono::NaiveDate;

    fn create_test_report() -> Report {
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        Report {
            metadata: ReportMetadata {
                source: "data/ducks.csv".to_string(),
                records: 3,
                today,
                year_gaps_filled: false,
            },
            summary: SummaryMetrics {
                total_quantity: 6,
                total_weight: 24.0,
                unique_countries: 2,
                unique_cities: 3,
                bought_last_year: 1,
                window_start: NaiveDate::from_ymd_opt(2023, 5, 1).unwrap(),
            },
            views: vec![
                DerivedView {
                    name: "by_state".to_string(),
                    group_by: GroupBy::State,
                    measure: Measure::Quantity,
                    cumulative: false,
                    rows: vec![ViewRow {
                        key: GroupKey::from("CA"),
                        quantity: 3,
                        total_weight: None,
                        filled: false,
                    }],
                },
                DerivedView {
                    name: "cumulative_by_year".to_string(),
                    group_by: GroupBy::Year,
                    measure: Measure::QuantityAndWeight,
                    cumulative: true,
                    rows: vec![
                        ViewRow {
                            key: GroupKey::Year(2020),
                            quantity: 3,
                            total_weight: Some(15.0),
                            filled: false,
                        },
                        ViewRow {
                            key: GroupKey::Year(2021),
                            quantity: 6,
                            total_weight: Some(24.0),
                            filled: false,
                        },
                    ],
                },
            ],
            locations: vec![LocationPoint {
                name: "Sumo".to_string(),
                city: "Tokyo".to_string(),
                country: "Japan".to_string(),
                latitude: 35.68,
                longitude: 139.69,
            }],
            dimensions: Vec::new(),
            table: Some(ItemTable {
                columns: vec!["Name".to_string(), "About".to_string()],
                query: Some("sumo".to_string()),
                rows: vec![vec!["Sumo".to_string(), "Big | heavy".to_string()]],
            }),
            cards: Vec::new(),
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("# Analyducks"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Summary"));
        assert!(markdown.contains("## Views"));
        assert!(markdown.contains("### By State (by_state)"));
        assert!(markdown.contains("| 2021 | 6 | 24 |"));
        assert!(markdown.contains("## Purchase Locations"));
        assert!(!markdown.contains("## Dimensions"));
        assert!(markdown.contains("Big \\| heavy"));
        assert!(markdown.contains("1 item(s) matching \"sumo\""));
    }

    #[test]
    fn test_generate_summary_section() {
        let report = create_test_report();
        let section = generate_summary_section(&report.summary);

        assert!(section.contains("Total Ducks Owned"));
        assert!(section.contains("| **6** | **1** | **24** | **2** | **3** |"));
        assert!(section.contains("2023-05-01"));
    }

    #[test]
    fn test_empty_view_says_no_data() {
        let view = DerivedView {
            name: "by_state".to_string(),
            group_by: GroupBy::State,
            measure: Measure::Quantity,
            cumulative: false,
            rows: Vec::new(),
        };

        let block = generate_view_block(&view);
        assert!(block.contains("*No data.*"));
        assert!(!block.contains("| 0 |"));
    }

    #[test]
    fn test_filled_rows_are_marked() {
        let view = DerivedView {
            name: "running".to_string(),
            group_by: GroupBy::Year,
            measure: Measure::Quantity,
            cumulative: true,
            rows: vec![
                ViewRow {
                    key: GroupKey::Year(2019),
                    quantity: 1,
                    total_weight: None,
                    filled: false,
                },
                ViewRow {
                    key: GroupKey::Year(2020),
                    quantity: 1,
                    total_weight: None,
                    filled: true,
                },
            ],
        };

        let block = generate_view_block(&view);
        assert!(block.contains("| 2019 | 1 |"));
        assert!(block.contains("| 2020 \\* | 1 |"));
        assert!(block.contains("carried forward"));
    }

    #[test]
    fn test_pipes_in_keys_and_card_names_are_escaped() {
        let view = DerivedView {
            name: "by_purchaser".to_string(),
            group_by: GroupBy::Purchaser,
            measure: Measure::Quantity,
            cumulative: false,
            rows: vec![ViewRow {
                key: GroupKey::from("Allan|Kate"),
                quantity: 2,
                total_weight: None,
                filled: false,
            }],
        };
        let block = generate_view_block(&view);
        assert!(block.contains("| Allan\\|Kate | 2 |"));

        let cards = vec![ItemCard {
            name: "Duck|Goose".to_string(),
            about: String::new(),
            location: String::new(),
            date: "2021-01-20".to_string(),
            weight: "3g".to_string(),
            dimensions: "?cm x ?cm x ?cm".to_string(),
        }];
        assert!(generate_cards_section(&cards).contains("### Duck\\|Goose"));
    }

    #[test]
    fn test_generate_cards_section() {
        let cards = vec![ItemCard {
            name: "Sumo".to_string(),
            about: "Heavyweight".to_string(),
            location: "Tokyo, Japan".to_string(),
            date: "2021-01-20".to_string(),
            weight: "3g".to_string(),
            dimensions: "?cm x ?cm x ?cm".to_string(),
        }];

        let section = generate_cards_section(&cards);
        assert!(section.contains("### Sumo"));
        assert!(section.contains("**Purchase Location:** Tokyo, Japan"));
    }

    #[test]
    fn test_anchor() {
        assert_eq!(anchor("By State (by_state)"), "by-state-by_state");
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"total_quantity\": 6"));
        assert!(json.contains("\"cumulative_by_year\""));
        assert!(json.contains("\"key\": \"CA\""));
        assert!(!json.contains("\"cards\""));
    }
}
