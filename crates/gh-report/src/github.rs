//! GitHub API client and related types.
//!
//! Reports never talk to [`Client`] directly: they go through the
//! [`GitHubApi`] trait, which exposes one GraphQL entrypoint and one
//! REST entrypoint.

use std::fmt::Display;

use http::StatusCode;
use reqwest::{
    Response,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, InvalidHeaderValue},
    retry,
};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

pub(crate) const USER_AGENT: &str = concat!("gh-report/", env!("CARGO_PKG_VERSION"));

/// Represents different types of GitHub hosts.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum GitHubHost {
    Enterprise(String),
    Standard(String),
}

impl GitHubHost {
    pub(crate) fn new(hostname: &str) -> Result<Self, String> {
        let normalized = hostname.to_lowercase();

        // NOTE: This only catches the most likely kind of user confusion
        // (supplying a URL instead of a bare domain name).
        if normalized.starts_with("https://") || normalized.starts_with("http://") {
            return Err("must be a domain name, not a URL".into());
        }

        if normalized.eq_ignore_ascii_case("github.com") || normalized.ends_with(".ghe.com") {
            Ok(Self::Standard(hostname.into()))
        } else {
            Ok(Self::Enterprise(hostname.into()))
        }
    }

    /// Whether this is github.com or a GHE.com data residency host,
    /// i.e. not a GitHub Enterprise Server instance.
    pub(crate) fn is_standard(&self) -> bool {
        matches!(self, Self::Standard(_))
    }

    fn to_api_host(&self) -> String {
        match self {
            Self::Enterprise(host) => host.clone(),
            Self::Standard(host) => format!("api.{host}"),
        }
    }

    fn to_api_url(&self) -> String {
        match self {
            Self::Enterprise(_) => format!("https://{host}/api/v3", host = self.to_api_host()),
            Self::Standard(_) => format!("https://{host}", host = self.to_api_host()),
        }
    }

    fn to_graphql_url(&self) -> String {
        match self {
            Self::Enterprise(_) => format!("https://{host}/api/graphql", host = self.to_api_host()),
            Self::Standard(_) => format!("https://{host}/graphql", host = self.to_api_host()),
        }
    }
}

impl Display for GitHubHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Enterprise(host) => write!(f, "{host}"),
            Self::Standard(host) => write!(f, "{host}"),
        }
    }
}

/// A sanitized GitHub access token.
#[derive(Clone)]
pub(crate) struct GitHubToken(String);

impl GitHubToken {
    pub(crate) fn new(token: &str) -> Result<Self, String> {
        let token = token.trim();
        if token.is_empty() {
            return Err("GitHub token cannot be empty".into());
        }
        Ok(Self(token.to_owned()))
    }

    fn to_header_value(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        HeaderValue::from_str(&format!("Bearer {}", self.0))
    }
}

/// Errors that can occur while using the GitHub API client.
#[derive(Debug, Error)]
pub(crate) enum ClientError {
    /// An error originating from the underlying HTTP client.
    #[error("request error while accessing GitHub API")]
    Request(#[from] reqwest::Error),
    /// An error originating from the HTTP client (and its middleware).
    #[error("request error while accessing GitHub API")]
    Middleware(#[from] reqwest_middleware::Error),
    /// We couldn't turn the user's token into a valid header value.
    #[error("invalid token header")]
    InvalidTokenHeader(#[from] InvalidHeaderValue),
    /// The GraphQL API answered, but with a non-empty `errors` array.
    #[error("{operation} query failed: {}", messages.join("; "))]
    GraphQl {
        operation: String,
        messages: Vec<String>,
    },
    /// The GraphQL API answered with neither `data` nor `errors`.
    #[error("{operation} query returned no data")]
    NoData { operation: String },
    /// A response body didn't have the expected shape.
    #[error("couldn't decode response for {context}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    /// A connection claimed another page but gave no cursor for it.
    #[error("{label}: another page was reported without a cursor")]
    MissingCursor { label: String },
}

/// The seam between reports and GitHub.
pub(crate) trait GitHubApi {
    /// Run the named GraphQL `query` with `variables`, decoding its
    /// `data` payload into `T`.
    async fn graphql<T: DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
        variables: Value,
    ) -> Result<T, ClientError>;

    /// `GET` the given REST API path (relative to the API root),
    /// decoding the body into `T`.
    async fn rest<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: &'a Value,
    operation_name: &'a str,
}

#[derive(Deserialize, Debug, Default)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize, Debug)]
struct GraphQlError {
    message: String,
}

impl GraphQlResponse {
    /// Unwraps this response's `data` into `T`. Any reported error fails
    /// the whole response, even if partial `data` is present.
    fn into_data<T: DeserializeOwned>(self, operation: &str) -> Result<T, ClientError> {
        if !self.errors.is_empty() {
            return Err(ClientError::GraphQl {
                operation: operation.into(),
                messages: self.errors.into_iter().map(|e| e.message).collect(),
            });
        }

        let data = self.data.ok_or_else(|| ClientError::NoData {
            operation: operation.into(),
        })?;

        serde_json::from_value(data).map_err(|source| ClientError::Decode {
            context: operation.into(),
            source,
        })
    }
}

struct RequestLoggingMiddleware;

#[async_trait::async_trait]
impl reqwest_middleware::Middleware for RequestLoggingMiddleware {
    async fn handle(
        &self,
        req: reqwest::Request,
        extensions: &mut http::Extensions,
        next: reqwest_middleware::Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        tracing::debug!("{method} {url}", method = req.method(), url = req.url());

        let res = next.run(req, extensions).await?;

        tracing::debug!("response status was {}", res.status());

        Ok(res)
    }
}

#[derive(Clone)]
pub(crate) struct Client {
    api_base: String,
    graphql_url: String,
    api_client: ClientWithMiddleware,
}

/// Only server errors and rate limiting are worth another attempt. A
/// 4xx other than 429 will fail the same way again.
fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

impl Client {
    pub(crate) fn new(host: &GitHubHost, token: &GitHubToken) -> Result<Self, ClientError> {
        let mut api_client_headers = HeaderMap::new();
        api_client_headers.insert(AUTHORIZATION, token.to_header_value()?);
        api_client_headers.insert("X-GitHub-Api-Version", "2022-11-28".parse()?);
        api_client_headers.insert(ACCEPT, "application/vnd.github+json".parse()?);

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(api_client_headers)
            .retry(
                retry::for_host(host.to_api_host())
                    .max_retries_per_request(3)
                    // NOTE: No budget, since we cap at 3 retries anyway.
                    .no_budget()
                    // NOTE: In the context of the retry classifier,
                    // "success" means "don't retry".
                    .classify_fn(|req_rep| match req_rep.status() {
                        Some(status) if is_retryable(status) => req_rep.retryable(),
                        _ => req_rep.success(),
                    }),
            )
            .build()?;

        Ok(Self {
            api_base: host.to_api_url(),
            graphql_url: host.to_graphql_url(),
            api_client: ClientBuilder::new(client)
                .with(RequestLoggingMiddleware)
                .build(),
        })
    }
}

impl GitHubApi for Client {
    #[instrument(skip(self, query, variables))]
    async fn graphql<T: DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
        variables: Value,
    ) -> Result<T, ClientError> {
        let resp: GraphQlResponse = self
            .api_client
            .post(&self.graphql_url)
            .json(&GraphQlRequest {
                query,
                variables: &variables,
                operation_name: operation,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        resp.into_data(operation)
    }

    #[instrument(skip(self))]
    async fn rest<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = format!("{api_base}/{path}", api_base = self.api_base);

        let body: Value = self
            .api_client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        serde_json::from_value(body).map_err(|source| ClientError::Decode {
            context: path.into(),
            source,
        })
    }
}
