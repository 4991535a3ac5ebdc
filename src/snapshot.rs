//! Fully materialized repository data consumed by the metrics engine.
//!
//! Snapshots are built by the GitHub provider (every page fetched) or loaded
//! from a JSON file written by `orgpulse fetch`. The engine never sees
//! pagination.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One repository's counters plus its complete issue and pull request lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositorySnapshot {
    pub name: String,
    pub stars: u64,
    pub watchers: u64,
    pub forks: u64,
    /// Total issue count reported by GitHub
    pub total_issues: u64,
    /// Total pull request count reported by GitHub
    pub total_pull_requests: u64,
    #[serde(default)]
    pub issues: Vec<IssueRecord>,
    #[serde(default)]
    pub pull_requests: Vec<PullRequestRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueState {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PullRequestState {
    Open,
    Merged,
    Closed,
}

/// Relationship GitHub reports between an author and the repository.
///
/// Values GitHub may add later deserialize as `Unknown` and are classified
/// as neither internal nor external.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorAssociation {
    Owner,
    Member,
    Contributor,
    Collaborator,
    FirstTimer,
    FirstTimeContributor,
    Mannequin,
    None,
    #[serde(other)]
    Unknown,
}

/// What closed an issue, when GitHub reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Closer {
    PullRequest,
    Commit,
}

/// A single entry in an issue timeline. Only closing events carry a payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TimelineEvent {
    Closed {
        at: DateTime<Utc>,
        #[serde(default)]
        closer: Option<Closer>,
    },
    Activity {
        /// GraphQL type name of the event, e.g. `IssueComment`
        kind: String,
        at: DateTime<Utc>,
    },
}

impl TimelineEvent {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Self::Closed { at, .. } | Self::Activity { at, .. } => *at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRecord {
    pub created_at: DateTime<Utc>,
    pub state: IssueState,
    pub closed_at: Option<DateTime<Utc>>,
    /// Login of the author; absent for deleted accounts
    pub author: Option<String>,
    pub author_association: AuthorAssociation,
    /// Events in the order GitHub appended them
    #[serde(default)]
    pub timeline: Vec<TimelineEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestRecord {
    pub created_at: DateTime<Utc>,
    pub state: PullRequestState,
    pub merged_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub author: Option<String>,
    pub author_association: AuthorAssociation,
}
