use std::fmt::Write;

use comfy_table::{Attribute, Cell};

use crate::report::{cell_text, Report, Row};

use super::styling::{bright, bright_yellow, cyan, dim, metric};
use super::tables::{create_table, header_cells, metric_cell, stale_share_cell};

/// Per-repository columns shown in the terminal table. The full set is
/// available through the CSV and JSON formats.
const TABLE_COLUMNS: &[&str] = &[
    "repo",
    "openedPullRequests",
    "mergedPullRequests",
    "averagePullRequestMergeTimeInterval",
    "openPullRequests",
    "openedIssues",
    "closedIssues",
    "openIssues",
    "percentStaleIssues",
    "contributorsThisPeriod",
    "stars",
];

/// Overview lines taken from the TOTAL row.
const OVERVIEW: &[(&str, &str)] = &[
    ("PRs opened:", "openedPullRequests"),
    ("PRs merged:", "mergedPullRequests"),
    ("PR turnaround (days):", "averagePullRequestMergeTimeInterval"),
    ("Issues opened:", "openedIssues"),
    ("Issues closed:", "closedIssues"),
    ("Open issues:", "openIssues"),
    ("Stale issues:", "percentStaleIssues"),
    ("Contributors:", "contributorsThisPeriod"),
    ("First-time contributors:", "contributorsThisPeriodFirstTimeContributor"),
];

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", bright(emoji), bright(title).underlined());
}

fn text(row: &Row, key: &str) -> String {
    row.get(key).map(cell_text).unwrap_or_default()
}

fn label<'a>(report: &'a Report, key: &'a str) -> &'a str {
    report
        .columns
        .iter()
        .find(|column| column.key == key)
        .map_or(key, |column| column.label.as_str())
}

fn row_cells(row: &Row) -> Vec<Cell> {
    TABLE_COLUMNS
        .iter()
        .map(|&key| {
            let value = text(row, key);
            match key {
                "repo" => Cell::new(value),
                "percentStaleIssues" => stale_share_cell(&value),
                _ => metric_cell(&value),
            }
        })
        .collect()
}

/// Renders the report for the terminal: an overview of the organization
/// total followed by a table of the key per-repository columns.
pub fn render_summary(report: &Report, period_label: &str) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "📊", "Overview");
    let _ = writeln!(output, "  {} {}", dim("Period:"), cyan(period_label));
    let _ = writeln!(
        output,
        "  {} {}",
        dim("Repositories analyzed:"),
        bright_yellow(report.repositories.len())
    );
    for (caption, key) in OVERVIEW {
        let _ = writeln!(output, "  {} {}", dim(caption), metric(&text(&report.total, key)));
    }
    output.push('\n');

    if report.repositories.is_empty() {
        let _ = writeln!(output, "{}", bright_yellow("No repositories found."));
        return output;
    }

    add_section_header(&mut output, "📋", "Repositories");
    let mut table = create_table();
    table.set_header(header_cells(TABLE_COLUMNS.iter().map(|key| label(report, key))));
    for row in &report.repositories {
        table.add_row(row_cells(row));
    }
    table.add_row(
        row_cells(&report.total)
            .into_iter()
            .map(|cell| cell.add_attribute(Attribute::Bold)),
    );
    let _ = writeln!(output, "{table}\n");

    add_section_header(&mut output, "💡", "Next Steps");
    let _ = write!(
        output,
        "  {} Use {} or {} to get every column\n  {} Use {} to rank repositories by another column\n",
        cyan("•"),
        bright_yellow("--format csv"),
        bright_yellow("--format json"),
        cyan("•"),
        bright_yellow("--sort <field>"),
    );

    output
}
