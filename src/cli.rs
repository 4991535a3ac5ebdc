use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::auth::Token;
use crate::config::{Config, GitHubConfig, OutputFormat, ReportSettings};
use crate::error::OrgPulseError;
use crate::metrics::compute_repository_metrics;
use crate::output::{export_report, PhaseProgress};
use crate::providers::GitHubProvider;
use crate::report::{Report, SortOrder};
use crate::snapshot::RepositorySnapshot;

#[derive(Parser)]
#[command(name = "orgpulse")]
#[command(
    author,
    version,
    about = "GitHub organization activity report",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (toml, json or yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Write to this file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the activity report for an organization
    Report(ReportArgs),
    /// Fetch repository snapshots and write them as JSON
    Fetch(GitHubArgs),
}

#[derive(Args)]
struct GitHubArgs {
    #[arg(short, long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// GitHub API base URL (GitHub Enterprise: https://host/api)
    #[arg(long)]
    api_url: Option<String>,

    /// Organization login
    #[arg(long, env = "ORGPULSE_ORG")]
    org: Option<String>,

    /// Only report on the repositories of this team
    #[arg(long, env = "ORGPULSE_TEAM")]
    team: Option<String>,

    /// Repositories fetched at the same time
    #[arg(long)]
    concurrency: Option<usize>,
}

impl GitHubArgs {
    fn apply(&self, config: &mut GitHubConfig) {
        if self.token.is_some() {
            config.token.clone_from(&self.token);
        }
        if let Some(api_url) = &self.api_url {
            config.api_url.clone_from(api_url);
        }
        if self.org.is_some() {
            config.org.clone_from(&self.org);
        }
        if self.team.is_some() {
            config.team.clone_from(&self.team);
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
    }
}

#[derive(Args)]
struct ReportArgs {
    #[command(flatten)]
    github: GitHubArgs,

    /// Length of the reporting period ending now
    #[arg(long, env = "ORGPULSE_DAYS")]
    days: Option<u32>,

    /// Start of an explicit period (YYYY-MM-DD), used with --to-date
    #[arg(long, env = "ORGPULSE_FROM_DATE")]
    from_date: Option<String>,

    /// End of an explicit period (YYYY-MM-DD), used with --from-date
    #[arg(long, env = "ORGPULSE_TO_DATE")]
    to_date: Option<String>,

    /// Days without activity before an open issue is stale
    #[arg(long, env = "ORGPULSE_STALE_DAYS")]
    stale_days: Option<u32>,

    /// Days since creation before an open issue is old
    #[arg(long, env = "ORGPULSE_OLD_DAYS")]
    old_days: Option<u32>,

    /// Field to sort repositories by, e.g. openedPullRequests or stars
    #[arg(long, env = "ORGPULSE_SORT")]
    sort: Option<String>,

    #[arg(long, env = "ORGPULSE_SORT_ORDER", value_enum)]
    sort_order: Option<SortOrder>,

    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Compute the report from a file written by `orgpulse fetch`
    #[arg(long)]
    snapshots: Option<PathBuf>,
}

impl ReportArgs {
    fn apply(&self, config: &mut Config) {
        self.github.apply(&mut config.github);

        let report = &mut config.report;
        if let Some(days) = self.days {
            report.days = days;
        }
        if self.from_date.is_some() {
            report.from_date.clone_from(&self.from_date);
        }
        if self.to_date.is_some() {
            report.to_date.clone_from(&self.to_date);
        }
        if let Some(stale_days) = self.stale_days {
            report.stale_days = stale_days;
        }
        if let Some(old_days) = self.old_days {
            report.old_days = old_days;
        }
        if let Some(sort) = &self.sort {
            report.sort.clone_from(sort);
        }
        if let Some(sort_order) = self.sort_order {
            report.sort_order = sort_order;
        }
        if let Some(format) = self.format {
            report.format = format;
        }
    }
}

impl Cli {
    async fn execute_report(&self, config: &Config, snapshots: Option<&Path>) -> Result<()> {
        // Bad sort fields and date ranges fail before any request is made
        let settings = ReportSettings::resolve(&config.report, Utc::now())?;

        let (snapshots, progress) = match snapshots {
            Some(path) => {
                let snapshots = load_snapshots(path)?;
                info!(
                    "Loaded {} repository snapshots from {}",
                    snapshots.len(),
                    path.display()
                );
                (snapshots, PhaseProgress::start_phase_3())
            }
            None => {
                let provider = build_provider(&config.github)?;
                let (snapshots, progress) =
                    fetch_snapshots(&provider, config.github.team.as_deref()).await?;
                (snapshots, progress.finish_phase_2_start_phase_3())
            }
        };

        let metrics: Vec<_> = snapshots
            .iter()
            .map(|snapshot| compute_repository_metrics(snapshot, &settings.context))
            .collect();
        let report = Report::assemble(
            &metrics,
            &settings.sort,
            &settings.period_label,
            settings.context.thresholds,
        )?;
        progress.finish_phase_3();

        let pretty = self.pretty || config.report.pretty;
        self.write_output(|output| {
            export_report(
                &report,
                &settings.period_label,
                config.report.format,
                pretty,
                output,
            )
        })
    }

    async fn execute_fetch(&self, config: &Config) -> Result<()> {
        let provider = build_provider(&config.github)?;
        let (snapshots, progress) =
            fetch_snapshots(&provider, config.github.team.as_deref()).await?;
        progress.finish_phase_2();

        let json_output = if self.pretty || config.report.pretty {
            serde_json::to_string_pretty(&snapshots)?
        } else {
            serde_json::to_string(&snapshots)?
        };
        self.write_output(|output| {
            writeln!(output, "{json_output}")?;
            Ok(())
        })
    }

    fn write_output(&self, write: impl FnOnce(&mut dyn Write) -> Result<()>) -> Result<()> {
        if let Some(output_path) = &self.output {
            let file = File::create(output_path)
                .with_context(|| format!("Failed to create {}", output_path.display()))?;
            let mut writer = BufWriter::new(file);
            write(&mut writer)?;
            writer.flush()?;
            info!("Output written to: {}", output_path.display());
        } else {
            let mut stdout = io::stdout().lock();
            write(&mut stdout)?;
            stdout.flush()?;
        }
        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        let mut config = Config::load(self.config.as_deref())?;

        match &self.command {
            Commands::Report(args) => {
                args.apply(&mut config);
                self.execute_report(&config, args.snapshots.as_deref()).await
            }
            Commands::Fetch(args) => {
                args.apply(&mut config.github);
                self.execute_fetch(&config).await
            }
        }
    }
}

fn build_provider(config: &GitHubConfig) -> Result<GitHubProvider> {
    let org = config
        .org
        .clone()
        .filter(|org| !org.trim().is_empty())
        .ok_or_else(|| {
            OrgPulseError::Config("an organization is required (--org or ORGPULSE_ORG)".into())
        })?;

    let token = config.token.as_deref().map(Token::from);
    if token.is_none() {
        warn!("No GitHub token configured; the GraphQL API rejects anonymous requests");
    }

    Ok(GitHubProvider::new(
        &config.api_url,
        org,
        token,
        config.concurrency,
        config.page_size,
    )?)
}

async fn fetch_snapshots(
    provider: &GitHubProvider,
    team: Option<&str>,
) -> Result<(Vec<RepositorySnapshot>, PhaseProgress)> {
    match team {
        Some(team) => info!("Collecting activity for team {}/{}", provider.org(), team),
        None => info!("Collecting activity for organization {}", provider.org()),
    }

    let progress = PhaseProgress::start_phase_1(provider.org());
    let names = provider.list_repositories(team).await?;

    let progress = progress.finish_phase_1_start_phase_2(names.len());
    let snapshots = provider
        .fetch_snapshots(&names, |snapshot| progress.fetched(&snapshot.name))
        .await?;

    Ok((snapshots, progress))
}

fn load_snapshots(path: &Path) -> Result<Vec<RepositorySnapshot>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshots from {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse snapshots in {}", path.display()))
}
