use super::classify::{classify_role, days_between};
use super::contributors::ContributorSets;
use super::MetricsContext;
use crate::snapshot::{Closer, IssueRecord, IssueState, TimelineEvent};

/// Issue statistics for one repository, split into all-time and
/// this-period figures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueMetrics {
    pub internal_issues: u64,
    pub external_issues: u64,
    pub open_issues: u64,
    pub stale_issues: u64,
    pub old_issues: u64,
    pub closed_by_pull_request_issues: u64,
    pub closed_issues_total: u64,
    pub opened_issues: u64,
    pub opened_issues_internal: u64,
    pub opened_issues_external: u64,
    pub opened_issues_first_time_contributor: u64,
    pub closed_issues: u64,
    /// Creation-to-close durations in days, one per closed issue
    pub open_times: Vec<f64>,
    pub contributors: ContributorSets,
}

/// Folds a repository's complete issue list into [`IssueMetrics`].
pub fn extract_issue_metrics(issues: &[IssueRecord], ctx: &MetricsContext) -> IssueMetrics {
    issues
        .iter()
        .fold(IssueMetrics::default(), |metrics, issue| {
            metrics.record(issue, ctx)
        })
}

impl IssueMetrics {
    fn record(mut self, issue: &IssueRecord, ctx: &MetricsContext) -> Self {
        let role = classify_role(issue.author_association);

        if let Some(author) = issue.author.as_deref() {
            self.contributors.add_all_time(author, role);
            if role.internal {
                self.internal_issues += 1;
            }
            if role.external {
                self.external_issues += 1;
            }
        }

        if issue.state == IssueState::Open {
            self.open_issues += 1;

            let last_activity = issue
                .timeline
                .last()
                .map_or(issue.created_at, TimelineEvent::at);

            if days_between(last_activity, ctx.now) > f64::from(ctx.thresholds.stale_days) {
                self.stale_issues += 1;
            }
            if days_between(issue.created_at, ctx.now) > f64::from(ctx.thresholds.old_days) {
                self.old_issues += 1;
            }
        }

        if ctx.window.contains(issue.created_at) {
            self.opened_issues += 1;
            if role.internal {
                self.opened_issues_internal += 1;
            }
            if role.external {
                self.opened_issues_external += 1;
            }
            if role.first_time_contributor {
                self.opened_issues_first_time_contributor += 1;
            }
            if let Some(author) = issue.author.as_deref() {
                self.contributors.add_this_period(author, role);
            }
        }

        if let Some(closed_at) = issue.closed_at {
            self.closed_issues_total += 1;
            if ctx.window.contains(closed_at) {
                self.closed_issues += 1;
            }
            self.open_times.push(days_between(issue.created_at, closed_at));

            if last_closer(&issue.timeline) == Some(Closer::PullRequest) {
                self.closed_by_pull_request_issues += 1;
            }
        }

        self
    }

    /// Combines figures from several repositories: counters add, samples
    /// concatenate, contributor sets union.
    pub fn merge<'a, I>(all: I) -> Self
    where
        I: IntoIterator<Item = &'a IssueMetrics>,
        I::IntoIter: Clone,
    {
        let all = all.into_iter();
        let sum = |field: fn(&IssueMetrics) -> u64| all.clone().map(field).sum::<u64>();

        Self {
            internal_issues: sum(|m| m.internal_issues),
            external_issues: sum(|m| m.external_issues),
            open_issues: sum(|m| m.open_issues),
            stale_issues: sum(|m| m.stale_issues),
            old_issues: sum(|m| m.old_issues),
            closed_by_pull_request_issues: sum(|m| m.closed_by_pull_request_issues),
            closed_issues_total: sum(|m| m.closed_issues_total),
            opened_issues: sum(|m| m.opened_issues),
            opened_issues_internal: sum(|m| m.opened_issues_internal),
            opened_issues_external: sum(|m| m.opened_issues_external),
            opened_issues_first_time_contributor: sum(|m| m.opened_issues_first_time_contributor),
            closed_issues: sum(|m| m.closed_issues),
            open_times: all
                .clone()
                .flat_map(|m| m.open_times.iter().copied())
                .collect(),
            contributors: ContributorSets::union(all.map(|m| &m.contributors)),
        }
    }
}

/// Closer of the last closing event; earlier closes are ignored.
fn last_closer(timeline: &[TimelineEvent]) -> Option<Closer> {
    timeline
        .iter()
        .rev()
        .find_map(|event| match event {
            TimelineEvent::Closed { closer, .. } => Some(*closer),
            TimelineEvent::Activity { .. } => None,
        })
        .flatten()
}
