use super::classify::{classify_role, days_between};
use super::contributors::ContributorSets;
use super::MetricsContext;
use crate::snapshot::{PullRequestRecord, PullRequestState};

/// Pull request statistics for one repository.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PullRequestMetrics {
    pub internal_pull_requests: u64,
    pub external_pull_requests: u64,
    pub open_pull_requests: u64,
    pub opened_pull_requests: u64,
    pub opened_pull_requests_internal: u64,
    pub opened_pull_requests_external: u64,
    pub opened_pull_requests_first_time_contributor: u64,
    pub merged_pull_requests: u64,
    pub closed_pull_requests: u64,
    pub merged_pull_requests_total: u64,
    pub closed_pull_requests_total: u64,
    /// Creation-to-merge durations in days for every merged pull request
    pub open_times: Vec<f64>,
    /// Window-start-to-merge durations in days for pull requests merged in the window
    pub open_times_interval: Vec<f64>,
    pub contributors: ContributorSets,
}

/// Folds a repository's complete pull request list into [`PullRequestMetrics`].
pub fn extract_pull_request_metrics(
    pull_requests: &[PullRequestRecord],
    ctx: &MetricsContext,
) -> PullRequestMetrics {
    pull_requests
        .iter()
        .fold(PullRequestMetrics::default(), |metrics, pull_request| {
            metrics.record(pull_request, ctx)
        })
}

impl PullRequestMetrics {
    fn record(mut self, pull_request: &PullRequestRecord, ctx: &MetricsContext) -> Self {
        let role = classify_role(pull_request.author_association);

        if let Some(author) = pull_request.author.as_deref() {
            self.contributors.add_all_time(author, role);
            if role.internal {
                self.internal_pull_requests += 1;
            }
            if role.external {
                self.external_pull_requests += 1;
            }
        }

        if pull_request.state == PullRequestState::Open {
            self.open_pull_requests += 1;
        }

        if ctx.window.contains(pull_request.created_at) {
            self.opened_pull_requests += 1;
            if role.internal {
                self.opened_pull_requests_internal += 1;
            }
            if role.external {
                self.opened_pull_requests_external += 1;
            }
            if role.first_time_contributor {
                self.opened_pull_requests_first_time_contributor += 1;
            }
            if let Some(author) = pull_request.author.as_deref() {
                self.contributors.add_this_period(author, role);
            }
        }

        match (pull_request.state, pull_request.merged_at, pull_request.closed_at) {
            (PullRequestState::Merged, Some(merged_at), _) => {
                self.merged_pull_requests_total += 1;
                if ctx.window.contains(merged_at) {
                    self.merged_pull_requests += 1;
                    self.open_times_interval
                        .push(days_between(ctx.window.start, merged_at));
                }
                self.open_times
                    .push(days_between(pull_request.created_at, merged_at));
            }
            (PullRequestState::Closed, _, Some(closed_at)) => {
                self.closed_pull_requests_total += 1;
                if ctx.window.contains(closed_at) {
                    self.closed_pull_requests += 1;
                }
            }
            _ => {}
        }

        self
    }

    /// Combines figures from several repositories: counters add, samples
    /// concatenate, contributor sets union.
    pub fn merge<'a, I>(all: I) -> Self
    where
        I: IntoIterator<Item = &'a PullRequestMetrics>,
        I::IntoIter: Clone,
    {
        let all = all.into_iter();
        let sum = |field: fn(&PullRequestMetrics) -> u64| all.clone().map(field).sum::<u64>();
        let concat = |field: fn(&PullRequestMetrics) -> &Vec<f64>| {
            all.clone()
                .flat_map(|m| field(m).iter().copied())
                .collect::<Vec<_>>()
        };

        Self {
            internal_pull_requests: sum(|m| m.internal_pull_requests),
            external_pull_requests: sum(|m| m.external_pull_requests),
            open_pull_requests: sum(|m| m.open_pull_requests),
            opened_pull_requests: sum(|m| m.opened_pull_requests),
            opened_pull_requests_internal: sum(|m| m.opened_pull_requests_internal),
            opened_pull_requests_external: sum(|m| m.opened_pull_requests_external),
            opened_pull_requests_first_time_contributor: sum(|m| {
                m.opened_pull_requests_first_time_contributor
            }),
            merged_pull_requests: sum(|m| m.merged_pull_requests),
            closed_pull_requests: sum(|m| m.closed_pull_requests),
            merged_pull_requests_total: sum(|m| m.merged_pull_requests_total),
            closed_pull_requests_total: sum(|m| m.closed_pull_requests_total),
            open_times: concat(|m| &m.open_times),
            open_times_interval: concat(|m| &m.open_times_interval),
            contributors: ContributorSets::union(all.map(|m| &m.contributors)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::metrics::test_support::{context, day, pull_request};
    use crate::metrics::classify::{average, Average};
    use crate::snapshot::AuthorAssociation;

    fn merged(created: i64, merged_at: i64) -> PullRequestRecord {
        PullRequestRecord {
            state: PullRequestState::Merged,
            merged_at: Some(day(merged_at)),
            closed_at: Some(day(merged_at)),
            ..pull_request(created, Some("alice"), AuthorAssociation::Member)
        }
    }

    fn closed(created: i64, closed_at: i64) -> PullRequestRecord {
        PullRequestRecord {
            state: PullRequestState::Closed,
            closed_at: Some(day(closed_at)),
            ..pull_request(created, Some("bob"), AuthorAssociation::None)
        }
    }

    #[test]
    fn merged_in_window_records_merge_and_turnaround_times() {
        let metrics = extract_pull_request_metrics(&[merged(0, 5)], &context());

        assert_eq!(metrics.opened_pull_requests, 1);
        assert_eq!(metrics.merged_pull_requests, 1);
        assert_eq!(metrics.merged_pull_requests_total, 1);
        assert_eq!(average(&metrics.open_times), Average::Days(5));
        // Turnaround is measured from the window start (D0-1)
        assert_eq!(metrics.open_times_interval, vec![6.0]);
        assert_eq!(metrics.open_pull_requests, 0);
        assert_eq!(metrics.closed_pull_requests, 0);
    }

    #[test]
    fn merged_outside_window_counts_only_all_time() {
        let metrics = extract_pull_request_metrics(&[merged(-40, -20)], &context());

        assert_eq!(metrics.merged_pull_requests, 0);
        assert_eq!(metrics.merged_pull_requests_total, 1);
        assert_eq!(metrics.open_times, vec![20.0]);
        assert!(metrics.open_times_interval.is_empty());
    }

    #[test]
    fn closed_without_merge_is_bucketed_by_close_time() {
        let metrics =
            extract_pull_request_metrics(&[closed(-40, 2), closed(-40, -30)], &context());

        assert_eq!(metrics.closed_pull_requests, 1);
        assert_eq!(metrics.closed_pull_requests_total, 2);
        assert_eq!(metrics.merged_pull_requests_total, 0);
        assert!(metrics.open_times.is_empty());
    }

    #[test]
    fn state_without_matching_timestamp_is_tolerated() {
        let broken_merge = PullRequestRecord {
            state: PullRequestState::Merged,
            ..pull_request(1, Some("alice"), AuthorAssociation::Member)
        };
        let broken_close = PullRequestRecord {
            state: PullRequestState::Closed,
            ..pull_request(1, Some("alice"), AuthorAssociation::Member)
        };

        let metrics = extract_pull_request_metrics(&[broken_merge, broken_close], &context());
        assert_eq!(metrics.opened_pull_requests, 2);
        assert_eq!(metrics.merged_pull_requests_total, 0);
        assert_eq!(metrics.closed_pull_requests_total, 0);
    }

    #[test]
    fn authorless_pull_request_counts_toward_lifecycle_only() {
        let metrics = extract_pull_request_metrics(
            &[pull_request(2, None, AuthorAssociation::FirstTimer)],
            &context(),
        );

        assert_eq!(metrics.open_pull_requests, 1);
        assert_eq!(metrics.opened_pull_requests, 1);
        assert_eq!(metrics.opened_pull_requests_first_time_contributor, 1);
        assert_eq!(metrics.internal_pull_requests, 0);
        assert!(metrics.contributors.this_period.is_empty());
    }

    #[test]
    fn roles_split_counts_and_sets() {
        let metrics = extract_pull_request_metrics(
            &[
                pull_request(1, Some("alice"), AuthorAssociation::Owner),
                pull_request(2, Some("bob"), AuthorAssociation::Collaborator),
                pull_request(3, Some("carol"), AuthorAssociation::FirstTimeContributor),
                pull_request(-9, Some("alice"), AuthorAssociation::Owner),
            ],
            &context(),
        );

        assert_eq!(metrics.internal_pull_requests, 3);
        assert_eq!(metrics.external_pull_requests, 1);
        assert_eq!(metrics.opened_pull_requests, 3);
        assert_eq!(metrics.opened_pull_requests_internal, 2);
        assert_eq!(metrics.opened_pull_requests_external, 1);
        assert_eq!(metrics.opened_pull_requests_first_time_contributor, 1);
        assert_eq!(metrics.contributors.all_time.len(), 3);
        assert_eq!(metrics.contributors.this_period_first_time_contributor.len(), 1);
    }

    #[test]
    fn merge_concatenates_both_sample_lists() {
        let ctx = context();
        let a = extract_pull_request_metrics(&[merged(0, 5)], &ctx);
        let b = extract_pull_request_metrics(&[merged(-40, -20), closed(0, 1)], &ctx);

        let merged = PullRequestMetrics::merge([&a, &b]);
        assert_eq!(merged.merged_pull_requests, 1);
        assert_eq!(merged.merged_pull_requests_total, 2);
        assert_eq!(merged.closed_pull_requests, 1);
        assert_eq!(merged.open_times, vec![5.0, 20.0]);
        assert_eq!(merged.open_times_interval, vec![6.0]);
        assert_eq!(merged.contributors.all_time.len(), 2);
    }
}
