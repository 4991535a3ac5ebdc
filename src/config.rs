use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::OrgPulseError;
use crate::metrics::{MetricsContext, Thresholds, TimeWindow};
use crate::report::{validate_sort_field, SortOrder, SortSpec, DEFAULT_SORT_FIELD};

/// Configuration file structure for orgpulse.
///
/// Every value can also be given on the command line or through the
/// environment; those take precedence over the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GitHubConfig {
    /// GitHub personal access token
    pub token: Option<String>,

    /// GitHub API base URL; GraphQL requests go to `<api-url>/graphql`
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Organization login
    pub org: Option<String>,

    /// Team slug; limits the report to the team's repositories
    pub team: Option<String>,

    /// Repositories fetched at the same time
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Items requested per GraphQL page (max 100)
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReportConfig {
    /// Length of the relative window
    #[serde(default = "default_days")]
    pub days: u32,

    /// Explicit window start, `YYYY-MM-DD`
    pub from_date: Option<String>,

    /// Explicit window end (exclusive), `YYYY-MM-DD`
    pub to_date: Option<String>,

    #[serde(default = "default_stale_days")]
    pub stale_days: u32,

    #[serde(default = "default_old_days")]
    pub old_days: u32,

    /// Field key to sort repository rows by
    #[serde(default = "default_sort")]
    pub sort: String,

    #[serde(default)]
    pub sort_order: SortOrder,

    #[serde(default)]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: default_api_url(),
            org: None,
            team: None,
            concurrency: default_concurrency(),
            page_size: default_page_size(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            days: default_days(),
            from_date: None,
            to_date: None,
            stale_days: default_stale_days(),
            old_days: default_old_days(),
            sort: default_sort(),
            sort_order: SortOrder::default(),
            format: OutputFormat::default(),
            pretty: false,
        }
    }
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_concurrency() -> usize {
    4
}

fn default_page_size() -> usize {
    100
}

fn default_days() -> u32 {
    30
}

fn default_stale_days() -> u32 {
    14
}

fn default_old_days() -> u32 {
    120
}

fn default_sort() -> String {
    DEFAULT_SORT_FIELD.to_string()
}

const LOCAL_CANDIDATES: [&str; 4] = [
    "orgpulse.toml",
    "orgpulse.json",
    "orgpulse.yaml",
    "orgpulse.yml",
];

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./orgpulse.toml, ./orgpulse.json, ./orgpulse.yaml, ./orgpulse.yml
    /// 3. `<config dir>/orgpulse/config.toml`
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let user_config = dirs::config_dir().map(|dir| dir.join("orgpulse").join("config.toml"));
        let found = LOCAL_CANDIDATES
            .iter()
            .map(PathBuf::from)
            .chain(user_config)
            .find(|candidate| candidate.exists());

        match found {
            Some(path) => Self::load_from_path(&path),
            None => {
                log::debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        log::info!("Using configuration from {}", path.display());

        match path.extension().and_then(|ext| ext.to_str()).unwrap_or("") {
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
        }
    }
}

/// Everything a report run needs, resolved once from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSettings {
    pub context: MetricsContext,
    /// Period suffix for column headers, e.g. `<30 days`
    pub period_label: String,
    pub sort: SortSpec,
}

impl ReportSettings {
    /// Resolves the window, thresholds and sort spec. `now` anchors both
    /// the relative window and the staleness checks.
    pub fn resolve(report: &ReportConfig, now: DateTime<Utc>) -> crate::error::Result<Self> {
        let sort = SortSpec {
            field: validate_sort_field(&report.sort)?,
            order: report.sort_order,
        };

        let (window, period_label) = match explicit_window(report)? {
            Some(explicit) => explicit,
            None => {
                let start = Duration::try_days(i64::from(report.days))
                    .and_then(|days| now.checked_sub_signed(days))
                    .ok_or_else(|| {
                        OrgPulseError::Config(format!("days out of range: {}", report.days))
                    })?;
                (TimeWindow::new(start, now), format!("<{} days", report.days))
            }
        };

        log::debug!(
            "Reporting window {} to {} ({period_label})",
            window.start,
            window.end
        );

        Ok(Self {
            context: MetricsContext {
                window,
                thresholds: Thresholds {
                    stale_days: report.stale_days,
                    old_days: report.old_days,
                },
                now,
            },
            period_label,
            sort,
        })
    }
}

/// The `[from, to)` window when both dates are present and well-formed.
/// Anything less falls back to the relative window with a warning.
fn explicit_window(
    report: &ReportConfig,
) -> crate::error::Result<Option<(TimeWindow, String)>> {
    let (from, to) = match (report.from_date.as_deref(), report.to_date.as_deref()) {
        (None, None) => return Ok(None),
        (Some(from), Some(to)) => (from, to),
        _ => {
            log::warn!(
                "Both from-date and to-date are needed for a fixed window, using the last {} days",
                report.days
            );
            return Ok(None);
        }
    };

    let (from, to) = match (parse_date(from), parse_date(to)) {
        (Ok(from), Ok(to)) => (from, to),
        (Err(err), _) | (_, Err(err)) => {
            log::warn!("{err}, using the last {} days", report.days);
            return Ok(None);
        }
    };

    if from >= to {
        return Err(OrgPulseError::Config(format!(
            "from-date {from} must be before to-date {to}"
        )));
    }

    let start = from.and_time(chrono::NaiveTime::MIN).and_utc();
    let end = to.and_time(chrono::NaiveTime::MIN).and_utc();
    Ok(Some((TimeWindow::new(start, end), format!("{from} to {to}"))))
}

/// Parses a strict `YYYY-MM-DD` date.
pub fn parse_date(text: &str) -> crate::error::Result<NaiveDate> {
    let well_formed = text.len() == 10
        && text
            .char_indices()
            .all(|(i, c)| if i == 4 || i == 7 { c == '-' } else { c.is_ascii_digit() });

    if !well_formed {
        return Err(OrgPulseError::InvalidDate(text.to_string()));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|_| OrgPulseError::InvalidDate(text.to_string()))
}
