use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

use super::models::ArticlesEnvelope;
use super::subject::clamp_limit;
use super::RawArticle;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// GraphQL query for one user's solution articles, most recent first.
const USER_SOLUTIONS_QUERY: &str = r#"
query ugcArticleUserSolutionArticles(
  $username: String!,
  $orderBy: ArticleOrderByEnum,
  $skip: Int,
  $before: String,
  $after: String,
  $first: Int,
  $last: Int
) {
  ugcArticleUserSolutionArticles(
    username: $username
    orderBy: $orderBy
    skip: $skip
    before: $before
    after: $after
    first: $first
    last: $last
  ) {
    totalNum
    pageInfo { hasNextPage }
    edges {
      node {
        topicId
        uuid
        title
        slug
        createdAt
        hitCount
        questionSlug
        questionTitle
      }
    }
  }
}
"#;

/// Errors from a single upstream fetch. There is no partial success within
/// one call: any of these fails the whole subject.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Upstream returned a GraphQL-level error list
    #[error("Upstream error: {0}")]
    Api(String),
    /// Response body was not the expected envelope
    #[error("Malformed upstream response: {0}")]
    Decode(String),
}

/// Client for the upstream GraphQL endpoint.
///
/// Optional session credentials (cookie + CSRF token) let the feed include
/// articles that are only visible to the authenticated account.
pub struct UpstreamClient {
    endpoint: String,
    cookie: Option<SecretString>,
    csrf: Option<SecretString>,
    http: reqwest::Client,
    timeout: Duration,
}

impl UpstreamClient {
    pub fn new(endpoint: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            endpoint: endpoint.into(),
            cookie: None,
            csrf: None,
            http,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Attach session credentials sent with every request.
    pub fn with_session(mut self, cookie: Option<SecretString>, csrf: Option<SecretString>) -> Self {
        self.cookie = cookie;
        self.csrf = csrf;
        self
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetches up to `limit` solution articles for one subject.
    ///
    /// Issues exactly one network round-trip. The limit is clamped to the
    /// allowed range before serialization, so callers may pass stored values
    /// unchecked.
    pub async fn fetch_solution_articles(
        &self,
        subject: &str,
        limit: i64,
    ) -> Result<Vec<RawArticle>, UpstreamError> {
        let first = clamp_limit(Some(limit));
        let body = json!({
            "query": USER_SOLUTIONS_QUERY,
            "operationName": "ugcArticleUserSolutionArticles",
            "variables": {
                "username": subject,
                "orderBy": "MOST_RECENT",
                "skip": 0,
                "first": first,
            },
        });

        let mut request = self
            .http
            .post(&self.endpoint)
            .header("Referer", "https://leetcode.com/")
            .header("User-Agent", "solvefeed/0.1")
            .json(&body);

        if let Some(cookie) = &self.cookie {
            request = request.header("Cookie", cookie.expose_secret());
        }
        if let Some(csrf) = &self.csrf {
            request = request
                .header("x-csrftoken", csrf.expose_secret())
                .header("x-requested-with", "XMLHttpRequest");
        }

        let response = tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| UpstreamError::Timeout)?
            .map_err(UpstreamError::Network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::HttpStatus(status.as_u16()));
        }

        let envelope: ArticlesEnvelope = response
            .json()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;

        if let Some(error) = envelope.errors.first() {
            return Err(UpstreamError::Api(error.message.clone()));
        }

        let edges = envelope
            .data
            .and_then(|d| d.articles)
            .map(|c| c.edges)
            .unwrap_or_default();

        tracing::debug!(subject = subject, count = edges.len(), "Fetched solution articles");
        Ok(edges.into_iter().map(|e| e.node).collect())
    }
}
