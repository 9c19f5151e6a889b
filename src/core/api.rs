/// HTTP client for the container-management API
///
/// Thin typed wrapper over the backend's REST contract. Every call is a single
/// request, except `running_container_stats` which fans out one stats request
/// per running container. Retries are left to the pollers' fixed schedule.

use futures::future::join_all;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::core::actions::ContainerAction;
use crate::core::models::{
    ActionReceipt, Container, ContainerLogs, ContainerStats, HealthStatus, SystemMetrics,
};
use crate::utils::constants::{DEFAULT_ACTION_TIMEOUT, DEFAULT_REQUEST_TIMEOUT, MAX_LOG_TAIL};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API returned {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid API base URL '{0}'")]
    InvalidBaseUrl(String),
    #[error("Invalid container name '{0}'")]
    InvalidName(String),
}

impl ApiError {
    /// True for 404 responses, e.g. an unknown container name
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status: 404, .. })
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base: Url,
    base_url: String,
    action_timeout: Duration,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Client whose reads time out after `timeout`; actions keep
    /// [`DEFAULT_ACTION_TIMEOUT`] unless changed with [`Self::with_action_timeout`]
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();

        let base = Url::parse(&base_url)
            .map_err(|_| ApiError::InvalidBaseUrl(base_url.clone()))?;
        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(base_url));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base,
            base_url,
            action_timeout: DEFAULT_ACTION_TIMEOUT,
        })
    }

    pub fn with_action_timeout(mut self, timeout: Duration) -> Self {
        self.action_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Base URL with `segments` appended, each percent-encoded as one segment
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // Checked in the constructor: http(s) URLs always have a path
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn container_url(&self, name: &str, suffix: Option<&str>) -> Result<Url, ApiError> {
        let name = name.trim();
        if name.is_empty() || name == "." || name == ".." {
            return Err(ApiError::InvalidName(name.to_string()));
        }

        let mut segments = vec!["api", "v1", "containers", name];
        segments.extend(suffix);
        Ok(self.endpoint(&segments))
    }

    /// Liveness of the API and its Docker connection
    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.get_json(self.endpoint(&["health"]), &[]).await
    }

    /// List containers; `all = false` returns running containers only
    pub async fn list_containers(&self, all: bool) -> Result<Vec<Container>, ApiError> {
        self.get_json(
            self.endpoint(&["api", "v1", "containers"]),
            &[("all", all.to_string())],
        )
        .await
    }

    pub async fn get_container(&self, name: &str) -> Result<Container, ApiError> {
        self.get_json(self.container_url(name, None)?, &[]).await
    }

    /// POST one of the mutating endpoints
    ///
    /// Uses the action timeout rather than the client's read timeout. The
    /// backend answers with `{status, message}`; an empty body is also
    /// accepted and turned into a success receipt.
    pub async fn container_action(
        &self,
        action: ContainerAction,
        name: &str,
    ) -> Result<ActionReceipt, ApiError> {
        let url = self.container_url(name, Some(action.path_segment()))?;
        debug!(%url, "POST");

        let response = self
            .client
            .post(url)
            .timeout(self.action_timeout)
            .send()
            .await?;
        let body = Self::read_success(response).await?;

        if body.trim().is_empty() {
            return Ok(ActionReceipt {
                status: "success".to_string(),
                message: format!("Container {} {}", name, action.past_tense()),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Last `tail` log lines, clamped to 1..=1000
    pub async fn container_logs(&self, name: &str, tail: usize) -> Result<ContainerLogs, ApiError> {
        let tail = tail.clamp(1, MAX_LOG_TAIL);
        self.get_json(self.container_url(name, Some("logs"))?, &[("tail", tail.to_string())])
            .await
    }

    pub async fn container_stats(&self, name: &str) -> Result<ContainerStats, ApiError> {
        self.get_json(self.container_url(name, Some("stats"))?, &[]).await
    }

    /// Stats of every running container, keyed by name
    ///
    /// Fails only if the list itself cannot be fetched. A container whose
    /// stats request fails (it may have just stopped) is left out.
    pub async fn running_container_stats(&self) -> Result<HashMap<String, ContainerStats>, ApiError> {
        let running = self.list_containers(false).await?;

        let requests = running.into_iter().filter(|c| c.running).map(|c| async move {
            match self.container_stats(&c.name).await {
                Ok(stats) => Some((c.name, stats)),
                Err(e) => {
                    debug!(container = %c.name, error = %e, "stats unavailable");
                    None
                }
            }
        });

        Ok(join_all(requests).await.into_iter().flatten().collect())
    }

    pub async fn system_metrics(&self) -> Result<SystemMetrics, ApiError> {
        self.get_json(self.endpoint(&["api", "v1", "system", "metrics"]), &[])
            .await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        debug!(%url, "GET");
        let response = self.client.get(url).query(query).send().await?;
        let body = Self::read_success(response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn read_success(response: Response) -> Result<String, ApiError> {
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(ApiError::Status {
                status: status.as_u16(),
                detail: error_detail(&body)
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string()),
            })
        }
    }
}

/// Pull FastAPI's `{"detail": ...}` out of an error body, falling back to the raw text
fn error_detail(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => match map.get("detail") {
            Some(serde_json::Value::String(detail)) => Some(detail.clone()),
            Some(other) => Some(other.to_string()),
            None => Some(body.to_string()),
        },
        _ => Some(body.to_string()),
    }
}
