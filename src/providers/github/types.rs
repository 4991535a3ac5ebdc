//! Response shapes of the GraphQL queries under `queries/`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::snapshot::{AuthorAssociation, IssueState, PullRequestState};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimit {
    pub remaining: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// A cursor-paginated list. GitHub may return `null` entries.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<Option<T>>,
    pub page_info: PageInfo,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalCount {
    pub total_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Actor {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryName {
    pub name: String,
}

// Repository listing

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationRepositoriesData {
    pub rate_limit: Option<RateLimit>,
    pub organization: Option<OrganizationRepositories>,
}

#[derive(Debug, Deserialize)]
pub struct OrganizationRepositories {
    pub repositories: Connection<RepositoryName>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRepositoriesData {
    pub rate_limit: Option<RateLimit>,
    pub organization: Option<OrganizationTeam>,
}

#[derive(Debug, Deserialize)]
pub struct OrganizationTeam {
    pub team: Option<OrganizationRepositories>,
}

// Repository data

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryOverviewData {
    pub rate_limit: Option<RateLimit>,
    pub repository: Option<RepositoryOverview>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryOverview {
    pub name: String,
    pub stargazers: TotalCount,
    pub watchers: TotalCount,
    pub forks: TotalCount,
    pub issues: TotalCount,
    pub pull_requests: TotalCount,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryIssuesData {
    pub rate_limit: Option<RateLimit>,
    pub repository: Option<RepositoryIssues>,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryIssues {
    pub issues: Connection<IssueNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueNode {
    pub created_at: DateTime<Utc>,
    pub state: IssueState,
    pub closed_at: Option<DateTime<Utc>>,
    pub author: Option<Actor>,
    pub author_association: AuthorAssociation,
    pub timeline_items: Option<TimelineConnection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimelineConnection {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<Option<TimelineNode>>,
}

/// Any timeline item. Only the fields requested for the known event
/// types are present; unknown types arrive with just `__typename`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineNode {
    #[serde(rename = "__typename")]
    pub typename: String,
    pub created_at: Option<DateTime<Utc>>,
    pub closer: Option<TypeName>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeName {
    #[serde(rename = "__typename")]
    pub typename: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryPullRequestsData {
    pub rate_limit: Option<RateLimit>,
    pub repository: Option<RepositoryPullRequests>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryPullRequests {
    pub pull_requests: Connection<PullRequestNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestNode {
    pub created_at: DateTime<Utc>,
    pub state: PullRequestState,
    pub merged_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub author: Option<Actor>,
    pub author_association: AuthorAssociation,
}

// Variables

#[derive(Debug, Clone, Serialize)]
pub struct OrganizationRepositoriesVariables {
    pub org: String,
    pub first: i64,
    pub after: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamRepositoriesVariables {
    pub org: String,
    pub team: String,
    pub first: i64,
    pub after: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepositoryVariables {
    pub owner: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepositoryPageVariables {
    pub owner: String,
    pub name: String,
    pub first: i64,
    pub after: Option<String>,
}
