use super::issues::IssueMetrics;
use super::pull_requests::PullRequestMetrics;
use super::repository::{RepositoryCounters, RepositoryMetrics};

pub const TOTAL_REPO_NAME: &str = "TOTAL";

/// Folds per-repository records into one organization-wide `TOTAL` record.
///
/// Counters are summed and contributor sets unioned, then every percentage
/// and average is derived again from the combined components. Per-repository
/// percentages and averages are never averaged.
pub fn aggregate_repositories(repos: &[RepositoryMetrics]) -> RepositoryMetrics {
    let counters = repos
        .iter()
        .fold(RepositoryCounters::default(), |total, repo| RepositoryCounters {
            stars: total.stars + repo.counters.stars,
            watches: total.watches + repo.counters.watches,
            forks: total.forks + repo.counters.forks,
            issues: total.issues + repo.counters.issues,
            pull_requests: total.pull_requests + repo.counters.pull_requests,
        });

    let issue_metrics = IssueMetrics::merge(repos.iter().map(|repo| &repo.issue_metrics));
    let pull_request_metrics =
        PullRequestMetrics::merge(repos.iter().map(|repo| &repo.pull_request_metrics));

    log::debug!("Aggregated {} repositories into totals", repos.len());

    RepositoryMetrics::assemble(
        TOTAL_REPO_NAME.to_string(),
        counters,
        issue_metrics,
        pull_request_metrics,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::test_support::{context, day, issue, pull_request};
    use crate::metrics::classify::{percentage, Average, Percentage};
    use crate::metrics::compute_repository_metrics;
    use crate::snapshot::{
        AuthorAssociation, IssueRecord, IssueState, PullRequestRecord, PullRequestState,
        RepositorySnapshot,
    };

    fn repo(name: &str, issues: Vec<IssueRecord>, pulls: Vec<PullRequestRecord>) -> RepositoryMetrics {
        let snapshot = RepositorySnapshot {
            name: name.to_string(),
            stars: 5,
            watchers: 1,
            forks: 2,
            total_issues: issues.len() as u64,
            total_pull_requests: pulls.len() as u64,
            issues,
            pull_requests: pulls,
        };
        compute_repository_metrics(&snapshot, &context())
    }

    fn merged_pull_request(author: &str, created: i64, merged: i64) -> PullRequestRecord {
        PullRequestRecord {
            state: PullRequestState::Merged,
            merged_at: Some(day(merged)),
            ..pull_request(created, Some(author), AuthorAssociation::Member)
        }
    }

    fn fresh_issue(author: &str) -> IssueRecord {
        issue(8, Some(author), AuthorAssociation::Member)
    }

    #[test]
    fn shared_contributor_counts_once_across_repositories() {
        let repos = vec![
            repo("a", vec![fresh_issue("alice")], vec![]),
            repo("b", vec![], vec![merged_pull_request("alice", 1, 2)]),
        ];

        let total = aggregate_repositories(&repos);
        assert_eq!(total.repo, "TOTAL");
        assert_eq!(repos[0].contributors_this_period, 1);
        assert_eq!(repos[1].contributors_this_period, 1);
        assert_eq!(total.contributors_this_period, 1);
        assert_eq!(total.contributors_all_time, 1);
    }

    #[test]
    fn sums_counters() {
        let repos = vec![
            repo("a", vec![fresh_issue("alice")], vec![]),
            repo("b", vec![fresh_issue("bob")], vec![merged_pull_request("bob", 1, 2)]),
        ];

        let total = aggregate_repositories(&repos);
        assert_eq!(total.stars, 10);
        assert_eq!(total.watches, 2);
        assert_eq!(total.forks, 4);
        assert_eq!(total.issues, 2);
        assert_eq!(total.pull_requests, 1);
        assert_eq!(total.open_issues, 2);
        assert_eq!(total.opened_issues, 2);
        assert_eq!(total.merged_pull_requests, 1);
    }

    #[test]
    fn percentages_come_from_summed_components() {
        // Repo a: 1 of 1 open issues stale. Repo b: 0 of 3 open issues stale.
        let stale = issue(0, Some("alice"), AuthorAssociation::Member);
        let repos = vec![
            repo("a", vec![stale], vec![]),
            repo(
                "b",
                vec![fresh_issue("bob"), fresh_issue("carol"), fresh_issue("dave")],
                vec![],
            ),
        ];

        assert_eq!(repos[0].percent_stale_issues.to_string(), "100%");
        assert_eq!(repos[1].percent_stale_issues.to_string(), "0%");

        let total = aggregate_repositories(&repos);
        // 1 / 4, not the 50% an average of percentages would give
        assert_eq!(total.percent_stale_issues.to_string(), percentage(1, 4));
        assert_eq!(total.percent_stale_issues.to_string(), "25%");
    }

    #[test]
    fn averages_come_from_concatenated_samples() {
        let repos = vec![
            repo("a", vec![], vec![merged_pull_request("alice", 0, 1)]),
            repo(
                "b",
                vec![],
                vec![
                    merged_pull_request("bob", 0, 7),
                    merged_pull_request("bob", 0, 7),
                    merged_pull_request("bob", 0, 7),
                ],
            ),
        ];

        let total = aggregate_repositories(&repos);
        // (1 + 7 + 7 + 7) / 4 = 5.5 -> 6, where averaging averages gives 4
        assert_eq!(total.average_pull_request_merge_time, Average::Days(6));
    }

    #[test]
    fn zero_denominators_stay_not_available() {
        let closed = IssueRecord {
            state: IssueState::Closed,
            closed_at: Some(day(2)),
            ..issue(1, Some("alice"), AuthorAssociation::Member)
        };
        let total = aggregate_repositories(&[repo("a", vec![closed], vec![])]);

        assert_eq!(total.percent_stale_issues, Percentage::NotAvailable);
        assert_eq!(total.percent_issues_closed_by_pull_request.to_string(), "0%");
        assert_eq!(total.average_pull_request_merge_time, Average::NotAvailable);
    }

    #[test]
    fn empty_organization_produces_empty_total() {
        let total = aggregate_repositories(&[]);
        assert_eq!(total.repo, "TOTAL");
        assert_eq!(total.stars, 0);
        assert_eq!(total.contributors_all_time, 0);
        assert_eq!(total.average_issue_open_time, Average::NotAvailable);
    }
}
