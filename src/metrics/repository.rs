use serde::Serialize;

use super::classify::{average, Average, Percentage};
use super::issues::{extract_issue_metrics, IssueMetrics};
use super::pull_requests::{extract_pull_request_metrics, PullRequestMetrics};
use super::MetricsContext;
use crate::snapshot::RepositorySnapshot;

use super::contributors::ContributorSets;

/// Repository-level counters reported directly by GitHub.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepositoryCounters {
    pub stars: u64,
    pub watches: u64,
    pub forks: u64,
    pub issues: u64,
    pub pull_requests: u64,
}

impl RepositoryCounters {
    fn of(snapshot: &RepositorySnapshot) -> Self {
        Self {
            stars: snapshot.stars,
            watches: snapshot.watchers,
            forks: snapshot.forks,
            issues: snapshot.total_issues,
            pull_requests: snapshot.total_pull_requests,
        }
    }
}

/// One report row worth of metrics.
///
/// The flat fields are what gets published. The raw extractor outputs are
/// retained (and skipped during serialization) so that organization totals
/// can be re-derived from their components.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryMetrics {
    pub repo: String,

    // All time, as of the run
    pub stars: u64,
    pub watches: u64,
    pub forks: u64,
    pub issues: u64,
    pub internal_issues: u64,
    pub external_issues: u64,
    pub open_issues: u64,
    pub stale_issues: u64,
    pub percent_stale_issues: Percentage,
    pub old_issues: u64,
    pub percent_old_issues: Percentage,
    pub percent_issues_closed_by_pull_request: Percentage,
    pub average_issue_open_time: Average,
    pub pull_requests: u64,
    pub internal_pull_requests: u64,
    pub external_pull_requests: u64,
    pub open_pull_requests: u64,
    pub merged_pull_requests_total: u64,
    pub closed_pull_requests_total: u64,
    pub average_pull_request_merge_time: Average,
    pub average_pull_request_merge_time_interval: Average,
    pub contributors_all_time: u64,
    pub contributors_all_time_internal: u64,
    pub contributors_all_time_external: u64,

    // This period
    pub opened_issues: u64,
    pub opened_issues_internal: u64,
    pub opened_issues_external: u64,
    pub opened_issues_first_time_contributor: u64,
    pub closed_issues: u64,
    pub opened_pull_requests: u64,
    pub opened_pull_requests_internal: u64,
    pub opened_pull_requests_external: u64,
    pub opened_pull_requests_first_time_contributor: u64,
    pub merged_pull_requests: u64,
    pub closed_pull_requests: u64,
    pub contributors_this_period: u64,
    pub contributors_this_period_internal: u64,
    pub contributors_this_period_external: u64,
    pub contributors_this_period_first_time_contributor: u64,

    #[serde(skip)]
    pub counters: RepositoryCounters,
    #[serde(skip)]
    pub issue_metrics: IssueMetrics,
    #[serde(skip)]
    pub pull_request_metrics: PullRequestMetrics,
    /// Issue and pull request contributors combined
    #[serde(skip)]
    pub contributors: ContributorSets,
}

/// Runs both extractors over one snapshot and assembles its report record.
pub fn compute_repository_metrics(
    snapshot: &RepositorySnapshot,
    ctx: &MetricsContext,
) -> RepositoryMetrics {
    let issue_metrics = extract_issue_metrics(&snapshot.issues, ctx);
    let pull_request_metrics = extract_pull_request_metrics(&snapshot.pull_requests, ctx);

    log::debug!(
        "{}: {} issues, {} pull requests processed",
        snapshot.name,
        snapshot.issues.len(),
        snapshot.pull_requests.len()
    );

    RepositoryMetrics::assemble(
        snapshot.name.clone(),
        RepositoryCounters::of(snapshot),
        issue_metrics,
        pull_request_metrics,
    )
}

#[allow(clippy::cast_possible_truncation)]
fn count(set: &std::collections::BTreeSet<String>) -> u64 {
    set.len() as u64
}

impl RepositoryMetrics {
    /// Derives every published field from raw components. Used for both
    /// single repositories and organization totals.
    pub(super) fn assemble(
        repo: String,
        counters: RepositoryCounters,
        issue_metrics: IssueMetrics,
        pull_request_metrics: PullRequestMetrics,
    ) -> Self {
        let contributors = ContributorSets::union([
            &issue_metrics.contributors,
            &pull_request_metrics.contributors,
        ]);
        let im = &issue_metrics;
        let pm = &pull_request_metrics;

        Self {
            repo,
            stars: counters.stars,
            watches: counters.watches,
            forks: counters.forks,
            issues: counters.issues,
            internal_issues: im.internal_issues,
            external_issues: im.external_issues,
            open_issues: im.open_issues,
            stale_issues: im.stale_issues,
            percent_stale_issues: Percentage::of(im.stale_issues, im.open_issues),
            old_issues: im.old_issues,
            percent_old_issues: Percentage::of(im.old_issues, im.open_issues),
            percent_issues_closed_by_pull_request: Percentage::of(
                im.closed_by_pull_request_issues,
                im.closed_issues_total,
            ),
            average_issue_open_time: average(&im.open_times),
            pull_requests: counters.pull_requests,
            internal_pull_requests: pm.internal_pull_requests,
            external_pull_requests: pm.external_pull_requests,
            open_pull_requests: pm.open_pull_requests,
            merged_pull_requests_total: pm.merged_pull_requests_total,
            closed_pull_requests_total: pm.closed_pull_requests_total,
            average_pull_request_merge_time: average(&pm.open_times),
            average_pull_request_merge_time_interval: average(&pm.open_times_interval),
            contributors_all_time: count(&contributors.all_time),
            contributors_all_time_internal: count(&contributors.all_time_internal),
            contributors_all_time_external: count(&contributors.all_time_external),

            opened_issues: im.opened_issues,
            opened_issues_internal: im.opened_issues_internal,
            opened_issues_external: im.opened_issues_external,
            opened_issues_first_time_contributor: im.opened_issues_first_time_contributor,
            closed_issues: im.closed_issues,
            opened_pull_requests: pm.opened_pull_requests,
            opened_pull_requests_internal: pm.opened_pull_requests_internal,
            opened_pull_requests_external: pm.opened_pull_requests_external,
            opened_pull_requests_first_time_contributor: pm
                .opened_pull_requests_first_time_contributor,
            merged_pull_requests: pm.merged_pull_requests,
            closed_pull_requests: pm.closed_pull_requests,
            contributors_this_period: count(&contributors.this_period),
            contributors_this_period_internal: count(&contributors.this_period_internal),
            contributors_this_period_external: count(&contributors.this_period_external),
            contributors_this_period_first_time_contributor: count(
                &contributors.this_period_first_time_contributor,
            ),

            counters,
            contributors,
            issue_metrics,
            pull_request_metrics,
        }
    }
}
