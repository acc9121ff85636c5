use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::error::WatchError;

/// Longest slice of an error body kept in `EndpointUnavailable`.
const BODY_SNIPPET_LEN: usize = 200;

#[async_trait]
pub trait HomeworkApi: Send + Sync {
    /// Fetch homework statuses changed since `from_date` (unix seconds).
    async fn homework_statuses(&self, from_date: i64) -> Result<Value, WatchError>;
}

#[derive(Clone)]
pub struct PracticumClient {
    http: Client,
    endpoint: Url,
    token: String,
}

impl fmt::Debug for PracticumClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PracticumClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl PracticumClient {
    pub fn with_base_url(token: String, endpoint: Url, timeout: Duration) -> Result<Self, WatchError> {
        let http = Client::builder()
            .user_agent("homework-watchbot/0.1")
            .timeout(timeout)
            .build()
            .map_err(|e| WatchError::Transport(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            endpoint,
            token,
        })
    }

    pub fn build_request(&self, from_date: i64) -> Result<reqwest::Request, WatchError> {
        let from_date = if from_date == 0 {
            chrono::Utc::now().timestamp()
        } else {
            from_date
        };
        self.http
            .get(self.endpoint.clone())
            .header("Authorization", format!("OAuth {}", self.token))
            .query(&[("from_date", from_date)])
            .build()
            .map_err(|e| WatchError::Transport(format!("failed to build request: {}", e)))
    }
}

#[async_trait]
impl HomeworkApi for PracticumClient {
    async fn homework_statuses(&self, from_date: i64) -> Result<Value, WatchError> {
        let request = self.build_request(from_date)?;
        debug!(url = %request.url(), "requesting homework statuses");
        // The URL carries the cursor; keep it out of the error text so the
        // same outage yields the same error on every cycle.
        let res = self
            .http
            .execute(request)
            .await
            .map_err(|e| WatchError::Transport(e.without_url().to_string()))?;
        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| {
                WatchError::MalformedResponse(format!("failed to read body: {}", e.without_url()))
            })?;
        debug!(%status, bytes = body.len(), "homework API responded");
        parse_response(status, &body)
    }
}

/// Anything but 200 is an unavailable endpoint; a 200 must carry JSON.
pub fn parse_response(status: StatusCode, body: &str) -> Result<Value, WatchError> {
    if status != StatusCode::OK {
        let snippet: String = body.chars().take(BODY_SNIPPET_LEN).collect();
        return Err(WatchError::EndpointUnavailable {
            status: status.as_u16(),
            body: snippet,
        });
    }
    serde_json::from_str(body).map_err(|e| WatchError::MalformedResponse(e.to_string()))
}
