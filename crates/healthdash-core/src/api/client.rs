//! HTTP client for the health dashboard backend.
//!
//! `ApiClient` implements [`DataSource`] over the backend's REST endpoints
//! and also exposes the member directory and health probe used by the
//! terminal front end.

use std::time::Duration;

use anyhow::{Context, Result};
use futures::future::{BoxFuture, FutureExt};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{parse_payload, DataSource, FetchError};
use crate::chat::QueryReply;
use crate::config::Config;
use crate::models::{MemberId, MemberSummary, Payload, ResourceId};

// ============================================================================
// Constants
// ============================================================================

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
}

/// The query endpoint answers `{"response"}` or the reasoning shape
/// `{"reasoning", "context_found"}`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QueryResponse {
    response: Option<String>,
    reasoning: Option<String>,
    context_found: Option<String>,
}

impl QueryResponse {
    fn into_reply(self) -> Result<QueryReply, FetchError> {
        let answer = self.response.or(self.reasoning).ok_or_else(|| {
            FetchError::Malformed("missing `response` or `reasoning` field".to_string())
        })?;
        Ok(QueryReply {
            answer,
            context: self.context_found,
        })
    }
}

/// The directory endpoint answers either a bare list or `{"members": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MembersResponse {
    List(Vec<MemberSummary>),
    Wrapped { members: Vec<MemberSummary> },
}

impl MembersResponse {
    fn into_members(self) -> Vec<MemberSummary> {
        match self {
            MembersResponse::List(members) | MembersResponse::Wrapped { members } => members,
        }
    }
}

/// Backend API client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    initial_backoff: Duration,
}

impl ApiClient {
    /// Create a client for `base_url` (e.g. `http://localhost:5000/api`).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid API base URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("API base URL cannot carry a path: {}", base_url);
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.api_url(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[cfg(test)]
    fn with_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Append percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Send a request, retrying 429 responses with exponential backoff,
    /// and return the body text of a successful response.
    async fn send<F>(&self, request: F) -> Result<String, FetchError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut retries = 0;
        let mut backoff = self.initial_backoff;

        loop {
            let response = request().send().await.map_err(|e| {
                warn!(error = %e, "Request failed");
                FetchError::from_transport(&e)
            })?;

            let status = response.status();
            if status.is_success() {
                return response
                    .text()
                    .await
                    .map_err(|e| FetchError::from_transport(&e));
            }

            if status == StatusCode::TOO_MANY_REQUESTS && retries < MAX_RATE_LIMIT_RETRIES {
                retries += 1;
                warn!(
                    url = %response.url(),
                    retry = retries,
                    backoff_ms = backoff.as_millis() as u64,
                    "Rate limited, backing off"
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2; // Exponential backoff
                continue;
            }

            let url = response.url().clone();
            let body = response.text().await.unwrap_or_default();
            warn!(
                url = %url,
                status = status.as_u16(),
                body = %FetchError::truncate_body(&body),
                "Request rejected"
            );
            return Err(FetchError::from_status(status));
        }
    }

    // ===== Data Fetching Methods =====

    /// Fetch one resource of a member.
    pub async fn fetch_resource(
        &self,
        resource: ResourceId,
        member: &MemberId,
    ) -> Result<Payload, FetchError> {
        let url = self.endpoint(&["members", member.as_str(), resource.path_segment()]);
        debug!(resource = %resource, member = %member, "Fetching resource");

        let body = self.send(|| self.client.get(url.clone())).await?;
        let value: Value = parse_payload(&body)?;
        Ok(Payload::new(value))
    }

    /// Fetch the member directory.
    pub async fn fetch_members(&self) -> Result<Vec<MemberSummary>, FetchError> {
        let url = self.endpoint(&["members"]);
        let body = self.send(|| self.client.get(url.clone())).await?;
        let parsed: MembersResponse = parse_payload(&body)?;
        let members = parsed.into_members();
        debug!(count = members.len(), "Fetched member directory");
        Ok(members)
    }

    /// Probe the backend's health endpoint.
    pub async fn health_check(&self) -> Result<(), FetchError> {
        let url = self.endpoint(&["health"]);
        self.send(|| self.client.get(url.clone())).await?;
        Ok(())
    }

    /// Ask the AI endpoint a question and return its answer and context.
    pub async fn send_query(&self, query: &str) -> Result<QueryReply, FetchError> {
        let url = self.endpoint(&["chat", "query"]);
        let request = QueryRequest { query };
        debug!(len = query.len(), "Sending AI query");

        let body = self
            .send(|| self.client.post(url.clone()).json(&request))
            .await?;
        let parsed: QueryResponse = parse_payload(&body)?;
        parsed.into_reply()
    }
}

impl DataSource for ApiClient {
    fn fetch(&self, resource: ResourceId, member: &MemberId) -> BoxFuture<'static, Result<Payload, FetchError>> {
        let client = self.clone();
        let member = member.clone();
        async move { client.fetch_resource(resource, &member).await }.boxed()
    }

    fn send_query(&self, query: &str) -> BoxFuture<'static, Result<QueryReply, FetchError>> {
        let client = self.clone();
        let query = query.to_string();
        async move { client.send_query(&query).await }.boxed()
    }
}

// ============================================================================
// Tests
// ============================================================================
