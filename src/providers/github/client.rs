use graphql_client::{QueryBody, Response as GraphQLResponse};
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

use crate::auth::Token;
use crate::error::{OrgPulseError, Result};

/// A GraphQL document and the operation to run from it.
#[derive(Debug, Clone, Copy)]
pub struct Query {
    pub operation_name: &'static str,
    pub document: &'static str,
}

/// Thin GraphQL client for the GitHub v4 API.
pub struct GitHubClient {
    client: Client,
    graphql_url: Url,
    token: Option<Token>,
}

impl GitHubClient {
    pub fn new(api_url: &str, token: Option<Token>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("orgpulse/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| OrgPulseError::Config(format!("Failed to create HTTP client: {e}")))?;

        // Keep any path prefix of a GitHub Enterprise API URL
        let base = if api_url.ends_with('/') {
            Url::parse(api_url)
        } else {
            Url::parse(&format!("{api_url}/"))
        }
        .map_err(|e| OrgPulseError::Config(format!("Invalid API URL: {e}")))?;

        let graphql_url = base
            .join("graphql")
            .map_err(|e| OrgPulseError::Config(format!("Invalid GraphQL URL: {e}")))?;

        Ok(Self {
            client,
            graphql_url,
            token,
        })
    }

    pub fn graphql_url(&self) -> &Url {
        &self.graphql_url
    }

    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = &self.token {
            request.bearer_auth(token.as_str())
        } else {
            request
        }
    }

    /// Runs one GraphQL operation and returns its `data` after checking
    /// the HTTP status and the GraphQL `errors` list.
    pub(super) async fn execute<V, T>(&self, query: Query, variables: V) -> Result<T>
    where
        V: Serialize,
        T: DeserializeOwned,
    {
        let body = QueryBody {
            variables,
            query: query.document,
            operation_name: query.operation_name,
        };

        let response = self
            .auth_request(self.client.post(self.graphql_url.clone()).json(&body))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(OrgPulseError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let response_body: GraphQLResponse<T> = response.json().await?;

        if let Some(errors) = response_body.errors.filter(|errors| !errors.is_empty()) {
            return Err(OrgPulseError::GraphQLError {
                query: query.operation_name.to_string(),
                errors: errors
                    .iter()
                    .map(|e| e.message.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }

        response_body.data.ok_or(OrgPulseError::NoResponseData)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde::Deserialize;
    use serde_json::json;

    const VIEWER: Query = Query {
        operation_name: "Viewer",
        document: "query Viewer { viewer { login } }",
    };

    #[derive(Debug, Deserialize)]
    struct ViewerData {
        viewer: Viewer,
    }

    #[derive(Debug, Deserialize)]
    struct Viewer {
        login: String,
    }

    #[test]
    fn graphql_url_keeps_api_prefix() {
        let client = GitHubClient::new("https://github.example.com/api", None).unwrap();
        assert_eq!(
            client.graphql_url().as_str(),
            "https://github.example.com/api/graphql"
        );

        let client = GitHubClient::new("https://api.github.com", None).unwrap();
        assert_eq!(client.graphql_url().as_str(), "https://api.github.com/graphql");
    }

    #[test]
    fn rejects_invalid_url() {
        assert!(matches!(
            GitHubClient::new("not a url", None),
            Err(OrgPulseError::Config(_))
        ));
    }

    #[tokio::test]
    async fn sends_bearer_token_and_returns_data() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/graphql")
            .match_header("authorization", "Bearer ghp_test")
            .match_body(Matcher::PartialJson(json!({ "operationName": "Viewer" })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":{"viewer":{"login":"octocat"}}}"#)
            .create_async()
            .await;

        let client = GitHubClient::new(&server.url(), Some(Token::from("ghp_test"))).unwrap();
        let data: ViewerData = client.execute(VIEWER, json!({})).await.unwrap();

        assert_eq!(data.viewer.login, "octocat");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn http_failure_is_an_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .with_status(401)
            .with_body("Bad credentials")
            .create_async()
            .await;

        let client = GitHubClient::new(&server.url(), None).unwrap();
        let result: Result<ViewerData> = client.execute(VIEWER, json!({})).await;

        match result {
            Err(OrgPulseError::ApiError { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "Bad credentials");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn graphql_errors_are_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body(r#"{"data":null,"errors":[{"message":"Field 'x' doesn't exist"}]}"#)
            .create_async()
            .await;

        let client = GitHubClient::new(&server.url(), None).unwrap();
        let result: Result<ViewerData> = client.execute(VIEWER, json!({})).await;

        match result {
            Err(OrgPulseError::GraphQLError { query, errors }) => {
                assert_eq!(query, "Viewer");
                assert!(errors.contains("doesn't exist"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_data_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body(r#"{"data":null}"#)
            .create_async()
            .await;

        let client = GitHubClient::new(&server.url(), None).unwrap();
        let result: Result<ViewerData> = client.execute(VIEWER, json!({})).await;

        assert!(matches!(result, Err(OrgPulseError::NoResponseData)));
    }
}
