use futures::stream::{self, StreamExt, TryStreamExt};
use log::{debug, info};

use crate::auth::Token;
use crate::error::{OrgPulseError, Result};
use crate::snapshot::{
    Closer, IssueRecord, PullRequestRecord, RepositorySnapshot, TimelineEvent,
};

use super::client::{GitHubClient, Query};
use super::types::{
    Connection, IssueNode, OrganizationRepositoriesData, OrganizationRepositoriesVariables,
    PageInfo, PullRequestNode, RateLimit, RepositoryIssuesData, RepositoryOverviewData,
    RepositoryName, RepositoryPageVariables, RepositoryPullRequestsData, RepositoryVariables,
    TeamRepositoriesData, TeamRepositoriesVariables, TimelineNode,
};

const MAX_PAGE_SIZE: usize = 100;

const ORGANIZATION_REPOSITORIES: Query = Query {
    operation_name: "OrganizationRepositories",
    document: include_str!("queries/organization_repositories.graphql"),
};

const TEAM_REPOSITORIES: Query = Query {
    operation_name: "TeamRepositories",
    document: include_str!("queries/team_repositories.graphql"),
};

const REPOSITORY_OVERVIEW: Query = Query {
    operation_name: "RepositoryOverview",
    document: include_str!("queries/repository_overview.graphql"),
};

const REPOSITORY_ISSUES: Query = Query {
    operation_name: "RepositoryIssues",
    document: include_str!("queries/repository_issues.graphql"),
};

const REPOSITORY_PULL_REQUESTS: Query = Query {
    operation_name: "RepositoryPullRequests",
    document: include_str!("queries/repository_pull_requests.graphql"),
};

/// Fetches repository snapshots for one organization.
pub struct GitHubProvider {
    client: GitHubClient,
    org: String,
    concurrency: usize,
    page_size: usize,
}

impl GitHubProvider {
    pub fn new(
        api_url: &str,
        org: String,
        token: Option<Token>,
        concurrency: usize,
        page_size: usize,
    ) -> Result<Self> {
        if org.trim().is_empty() {
            return Err(OrgPulseError::Config("organization must not be empty".into()));
        }

        let client = GitHubClient::new(api_url, token)?;
        debug!("Using GraphQL endpoint {}", client.graphql_url());

        Ok(Self {
            client,
            org,
            concurrency: concurrency.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        })
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    #[allow(clippy::cast_possible_wrap)]
    fn first(&self) -> i64 {
        self.page_size as i64
    }

    /// Names of every repository in the organization, or only the team's
    /// repositories when a team slug is given.
    pub async fn list_repositories(&self, team: Option<&str>) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let connection = match team {
                None => self.organization_repositories_page(cursor.clone()).await?,
                Some(team) => self.team_repositories_page(team, cursor.clone()).await?,
            };

            names.extend(connection.nodes.into_iter().flatten().map(|repo| repo.name));

            match next_cursor(connection.page_info) {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        info!(
            "Found {} repositories in {}{}",
            names.len(),
            self.org,
            team.map(|team| format!(" (team {team})")).unwrap_or_default()
        );

        Ok(names)
    }

    async fn organization_repositories_page(
        &self,
        after: Option<String>,
    ) -> Result<Connection<RepositoryName>> {
        let variables = OrganizationRepositoriesVariables {
            org: self.org.clone(),
            first: self.first(),
            after,
        };
        let data: OrganizationRepositoriesData = self
            .client
            .execute(ORGANIZATION_REPOSITORIES, variables)
            .await?;

        debug!(
            "{}: repository page fetched (rate limit remaining: {})",
            self.org,
            remaining(data.rate_limit.as_ref())
        );

        data.organization
            .map(|organization| organization.repositories)
            .ok_or_else(|| OrgPulseError::OrganizationNotFound(self.org.clone()))
    }

    async fn team_repositories_page(
        &self,
        team: &str,
        after: Option<String>,
    ) -> Result<Connection<RepositoryName>> {
        let variables = TeamRepositoriesVariables {
            org: self.org.clone(),
            team: team.to_string(),
            first: self.first(),
            after,
        };
        let data: TeamRepositoriesData = self.client.execute(TEAM_REPOSITORIES, variables).await?;
        debug!(
            "{}/{team}: repository page fetched (rate limit remaining: {})",
            self.org,
            remaining(data.rate_limit.as_ref())
        );

        let organization = data
            .organization
            .ok_or_else(|| OrgPulseError::OrganizationNotFound(self.org.clone()))?;

        organization
            .team
            .map(|team| team.repositories)
            .ok_or_else(|| OrgPulseError::TeamNotFound {
                org: self.org.clone(),
                team: team.to_string(),
            })
    }

    /// Counters plus every issue and pull request of one repository.
    pub async fn fetch_snapshot(&self, name: &str) -> Result<RepositorySnapshot> {
        let variables = RepositoryVariables {
            owner: self.org.clone(),
            name: name.to_string(),
        };
        let data: RepositoryOverviewData =
            self.client.execute(REPOSITORY_OVERVIEW, variables).await?;
        let overview = data
            .repository
            .ok_or_else(|| OrgPulseError::RepositoryNotFound(format!("{}/{name}", self.org)))?;

        let issues = self.fetch_issues(name).await?;
        let (pull_requests, rate_limit) = self.fetch_pull_requests(name).await?;

        info!(
            "{}/{}: {} issues, {} pull requests (rate limit remaining: {})",
            self.org,
            name,
            issues.len(),
            pull_requests.len(),
            remaining(rate_limit.or(data.rate_limit).as_ref())
        );

        Ok(RepositorySnapshot {
            name: overview.name,
            stars: overview.stargazers.total_count,
            watchers: overview.watchers.total_count,
            forks: overview.forks.total_count,
            total_issues: overview.issues.total_count,
            total_pull_requests: overview.pull_requests.total_count,
            issues,
            pull_requests,
        })
    }

    /// Fetches up to `concurrency` repositories at a time. Results keep the
    /// order of `names`; the first failure aborts the whole fetch.
    pub async fn fetch_snapshots<F>(
        &self,
        names: &[String],
        mut on_fetched: F,
    ) -> Result<Vec<RepositorySnapshot>>
    where
        F: FnMut(&RepositorySnapshot),
    {
        stream::iter(names)
            .map(|name| self.fetch_snapshot(name))
            .buffered(self.concurrency)
            .inspect_ok(|snapshot| on_fetched(snapshot))
            .try_collect()
            .await
    }

    async fn fetch_issues(&self, name: &str) -> Result<Vec<IssueRecord>> {
        let mut issues = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let variables = RepositoryPageVariables {
                owner: self.org.clone(),
                name: name.to_string(),
                first: self.first(),
                after: cursor.clone(),
            };
            let data: RepositoryIssuesData =
                self.client.execute(REPOSITORY_ISSUES, variables).await?;
            let connection = data
                .repository
                .map(|repository| repository.issues)
                .ok_or_else(|| OrgPulseError::RepositoryNotFound(format!("{}/{name}", self.org)))?;

            issues.extend(connection.nodes.into_iter().flatten().map(issue_record));
            debug!(
                "{}/{name}: {} issues fetched so far (rate limit remaining: {})",
                self.org,
                issues.len(),
                remaining(data.rate_limit.as_ref())
            );

            match next_cursor(connection.page_info) {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(issues)
    }

    async fn fetch_pull_requests(
        &self,
        name: &str,
    ) -> Result<(Vec<PullRequestRecord>, Option<RateLimit>)> {
        let mut pull_requests = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let variables = RepositoryPageVariables {
                owner: self.org.clone(),
                name: name.to_string(),
                first: self.first(),
                after: cursor.clone(),
            };
            let data: RepositoryPullRequestsData =
                self.client.execute(REPOSITORY_PULL_REQUESTS, variables).await?;
            let connection = data
                .repository
                .map(|repository| repository.pull_requests)
                .ok_or_else(|| OrgPulseError::RepositoryNotFound(format!("{}/{name}", self.org)))?;

            pull_requests.extend(
                connection
                    .nodes
                    .into_iter()
                    .flatten()
                    .map(pull_request_record),
            );

            match next_cursor(connection.page_info) {
                Some(next) => cursor = Some(next),
                None => return Ok((pull_requests, data.rate_limit)),
            }
        }
    }
}

/// Remaining GraphQL budget for log lines.
fn remaining(rate_limit: Option<&RateLimit>) -> String {
    rate_limit.map_or_else(|| "unknown".to_string(), |limit| limit.remaining.to_string())
}

/// Cursor of the following page, if there is one.
fn next_cursor(page_info: PageInfo) -> Option<String> {
    if page_info.has_next_page {
        page_info.end_cursor
    } else {
        None
    }
}

fn issue_record(node: IssueNode) -> IssueRecord {
    IssueRecord {
        created_at: node.created_at,
        state: node.state,
        closed_at: node.closed_at,
        author: node.author.map(|author| author.login),
        author_association: node.author_association,
        timeline: node
            .timeline_items
            .map(|timeline| {
                timeline
                    .nodes
                    .into_iter()
                    .flatten()
                    .filter_map(timeline_event)
                    .collect()
            })
            .unwrap_or_default(),
    }
}

fn pull_request_record(node: PullRequestNode) -> PullRequestRecord {
    PullRequestRecord {
        created_at: node.created_at,
        state: node.state,
        merged_at: node.merged_at,
        closed_at: node.closed_at,
        author: node.author.map(|author| author.login),
        author_association: node.author_association,
    }
}

/// Items without a timestamp are dropped.
fn timeline_event(node: TimelineNode) -> Option<TimelineEvent> {
    let at = node.created_at?;

    if node.typename == "ClosedEvent" {
        let closer = node.closer.and_then(|closer| match closer.typename.as_str() {
            "PullRequest" => Some(Closer::PullRequest),
            "Commit" => Some(Closer::Commit),
            _ => None,
        });
        Some(TimelineEvent::Closed { at, closer })
    } else {
        Some(TimelineEvent::Activity {
            kind: node.typename,
            at,
        })
    }
}
