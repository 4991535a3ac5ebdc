//! The metrics engine: pure functions from repository snapshots to report
//! records. Nothing in here performs I/O or reads process-wide state.

mod classify;
mod contributors;
mod issues;
mod organization;
mod pull_requests;
mod repository;

use chrono::{DateTime, Utc};

pub use organization::aggregate_repositories;
pub use repository::{compute_repository_metrics, RepositoryMetrics};

/// The reporting period. An instant is inside the window iff it is strictly
/// after `start` and strictly before `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant > self.start && instant < self.end
    }
}

/// Day thresholds for the open-issue health checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// An open issue is stale after this many days without timeline activity
    pub stale_days: u32,
    /// An open issue is old after this many days since creation
    pub old_days: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            stale_days: 14,
            old_days: 120,
        }
    }
}

/// Everything the extractors need besides the data itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsContext {
    pub window: TimeWindow,
    pub thresholds: Thresholds,
    /// Reference instant for staleness and age
    pub now: DateTime<Utc>,
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::{MetricsContext, Thresholds, TimeWindow};
    use crate::snapshot::{
        AuthorAssociation, IssueRecord, IssueState, PullRequestRecord, PullRequestState,
    };

    /// Day zero for fixtures.
    pub fn d0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    pub fn day(offset: i64) -> DateTime<Utc> {
        d0() + Duration::days(offset)
    }

    /// Window `(D0-1, D0+10)` with `now` at D0+15.
    pub fn context() -> MetricsContext {
        MetricsContext {
            window: TimeWindow::new(day(-1), day(10)),
            thresholds: Thresholds::default(),
            now: day(15),
        }
    }

    pub fn issue(
        created: i64,
        author: Option<&str>,
        association: AuthorAssociation,
    ) -> IssueRecord {
        IssueRecord {
            created_at: day(created),
            state: IssueState::Open,
            closed_at: None,
            author: author.map(ToString::to_string),
            author_association: association,
            timeline: vec![],
        }
    }

    pub fn pull_request(
        created: i64,
        author: Option<&str>,
        association: AuthorAssociation,
    ) -> PullRequestRecord {
        PullRequestRecord {
            created_at: day(created),
            state: PullRequestState::Open,
            merged_at: None,
            closed_at: None,
            author: author.map(ToString::to_string),
            author_association: association,
        }
    }
}
