use std::cmp::Ordering;
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use clap::ValueEnum;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{OrgPulseError, Result};
use crate::metrics::{aggregate_repositories, RepositoryMetrics, Thresholds};

pub const DEFAULT_SORT_FIELD: &str = "openedPullRequests";

/// How a column's header is built.
#[derive(Debug, Clone, Copy)]
enum Label {
    Fixed(&'static str),
    /// Suffixed with the period label, e.g. `PRs Opened (<30 days)`
    Period(&'static str),
    StaleThreshold,
    OldThreshold,
}

/// Report columns in publication order.
const COLUMNS: &[(&str, Label)] = &[
    ("repo", Label::Fixed("Repo Name")),
    ("openedPullRequests", Label::Period("PRs Opened")),
    ("openedPullRequestsInternal", Label::Period("PRs Opened Int")),
    ("openedPullRequestsExternal", Label::Period("PRs Opened Ext")),
    ("openedPullRequestsFirstTimeContributor", Label::Period("PRs Opened FTC")),
    ("mergedPullRequests", Label::Period("PRs Merged")),
    ("averagePullRequestMergeTimeInterval", Label::Period("PR turnaround time")),
    ("closedPullRequests", Label::Period("PRs Closed")),
    ("openPullRequests", Label::Fixed("PRs Open (all time)")),
    ("mergedPullRequestsTotal", Label::Fixed("PRs Merged (all time)")),
    ("closedPullRequestsTotal", Label::Fixed("PRs Closed (all time)")),
    ("averagePullRequestMergeTime", Label::Fixed("PR turnaround time (all time)")),
    ("pullRequests", Label::Fixed("Total PRs (all time)")),
    ("internalPullRequests", Label::Fixed("Total PRs Int (all time)")),
    ("externalPullRequests", Label::Fixed("Total PRs Ext (all time)")),
    ("openedIssues", Label::Period("Issues Opened")),
    ("openedIssuesInternal", Label::Period("Issues Opened Int")),
    ("openedIssuesExternal", Label::Period("Issues Opened Ext")),
    ("openedIssuesFirstTimeContributor", Label::Period("Issues Opened FTC")),
    ("closedIssues", Label::Period("Issues Closed")),
    ("issues", Label::Fixed("Total Issues (all time)")),
    ("internalIssues", Label::Fixed("Total Issues Int (all time)")),
    ("externalIssues", Label::Fixed("Total Issues Ext (all time)")),
    ("openIssues", Label::Fixed("Open Issues (all time)")),
    ("staleIssues", Label::StaleThreshold),
    ("percentStaleIssues", Label::Fixed("% Stale Issues (all time)")),
    ("oldIssues", Label::OldThreshold),
    ("percentOldIssues", Label::Fixed("% Old Issues (all time)")),
    ("percentIssuesClosedByPullRequest", Label::Fixed("% Issues Closed by PR (all time)")),
    ("averageIssueOpenTime", Label::Fixed("Average Issue open days (all time)")),
    ("contributorsThisPeriod", Label::Period("Contributors")),
    ("contributorsThisPeriodInternal", Label::Period("Contributors Int")),
    ("contributorsThisPeriodExternal", Label::Period("Contributors Ext")),
    ("contributorsThisPeriodFirstTimeContributor", Label::Period("Contributors FTC")),
    ("contributorsAllTime", Label::Fixed("Contributors (all time)")),
    ("contributorsAllTimeInternal", Label::Fixed("Contributors Int (all time)")),
    ("contributorsAllTimeExternal", Label::Fixed("Contributors Ext (all time)")),
    ("stars", Label::Fixed("Stars (all time)")),
    ("watches", Label::Fixed("Watches (all time)")),
    ("forks", Label::Fixed("Forks (all time)")),
];

/// A published column: field key plus human-readable header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub key: &'static str,
    pub label: String,
}

/// Resolves the header of every column for one run.
pub fn column_labels(period_label: &str, thresholds: Thresholds) -> Vec<Column> {
    COLUMNS
        .iter()
        .map(|&(key, label)| Column {
            key,
            label: match label {
                Label::Fixed(text) => text.to_string(),
                Label::Period(text) => format!("{text} ({period_label})"),
                Label::StaleThreshold => format!("Stale Issues (>{})", thresholds.stale_days),
                Label::OldThreshold => format!("Old Issues (>{})", thresholds.old_days),
            },
        })
        .collect()
}

/// Checks a sort field against the column table.
pub fn validate_sort_field(field: &str) -> Result<&'static str> {
    COLUMNS
        .iter()
        .map(|&(key, _)| key)
        .find(|key| *key == field)
        .ok_or_else(|| OrgPulseError::UnknownSortField(field.to_string()))
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => f.write_str("asc"),
            Self::Desc => f.write_str("desc"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: &'static str,
    pub order: SortOrder,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: DEFAULT_SORT_FIELD,
            order: SortOrder::Desc,
        }
    }
}

/// One report row keyed by field, in column order. Values are numbers,
/// percentage strings or `"N/A"`.
pub type Row = IndexMap<&'static str, Value>;

/// Textual representation of a cell, as shown in tables and CSV.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Flattens a metrics record into a row in column order.
pub fn to_row(metrics: &RepositoryMetrics) -> Result<Row> {
    let mut record: Map<String, Value> = serde_json::from_value(serde_json::to_value(metrics)?)?;

    Ok(COLUMNS
        .iter()
        .map(|&(key, _)| (key, record.remove(key).unwrap_or(Value::Null)))
        .collect())
}

/// Sorted repository rows followed by the organization total.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub columns: Vec<Column>,
    pub repositories: Vec<Row>,
    pub total: Row,
}

impl Report {
    pub fn assemble(
        metrics: &[RepositoryMetrics],
        sort: &SortSpec,
        period_label: &str,
        thresholds: Thresholds,
    ) -> Result<Self> {
        let total = to_row(&aggregate_repositories(metrics))?;
        let mut repositories = metrics.iter().map(to_row).collect::<Result<Vec<_>>>()?;
        sort_rows(&mut repositories, sort);

        log::debug!(
            "Assembled report of {} repositories sorted by {} {}",
            repositories.len(),
            sort.field,
            sort.order
        );

        Ok(Self {
            columns: column_labels(period_label, thresholds),
            repositories,
            total,
        })
    }

    /// Every published row, total last.
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.repositories.iter().chain(std::iter::once(&self.total))
    }
}

/// Stable sort of rows by the textual representation of one field.
pub fn sort_rows(rows: &mut [Row], sort: &SortSpec) {
    let text = |row: &Row| row.get(sort.field).map(cell_text).unwrap_or_default();
    rows.sort_by(|a, b| {
        let ordering = natural_cmp(&text(a), &text(b));
        match sort.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

/// Natural ordering: digit runs compare numerically, other characters
/// case-insensitively, with a case-sensitive comparison as the final
/// tie-break.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    compare_ignoring_case(a, b).then_with(|| a.cmp(b))
}

fn compare_ignoring_case(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        let ordering = match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                compare_digit_runs(&take_digits(&mut left), &take_digits(&mut right))
            }
            (Some(l), Some(r)) => {
                left.next();
                right.next();
                l.to_lowercase().cmp(r.to_lowercase())
            }
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(digit) = chars.next_if(char::is_ascii_digit) {
        run.push(digit);
    }
    run
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
