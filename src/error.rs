use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrgPulseError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Unknown sort field '{0}'")]
    UnknownSortField(String),

    #[error("GitHub API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("GraphQL query {query} failed: {errors}")]
    GraphQLError { query: String, errors: String },

    #[error("GraphQL response contained no data")]
    NoResponseData,

    #[error("Organization '{0}' not found")]
    OrganizationNotFound(String),

    #[error("Team '{team}' not found in organization '{org}'")]
    TeamNotFound { org: String, team: String },

    #[error("Repository '{0}' not found")]
    RepositoryNotFound(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, OrgPulseError>;
