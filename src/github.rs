use std::future::Future;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::{rng, Rng};
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error_handling::ApiError;

pub(crate) fn jitter(ms: u64) -> Duration {
    let j = rng().random_range(0..=ms / 2);
    Duration::from_millis(ms + j)
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Body of a JSON call. Statistics endpoints answer `202 Accepted` with no
/// body while the host is still computing them.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiPayload {
    Ready(Value),
    Pending,
}

/// The seam between the fetcher and the network. Paths are relative to the
/// API root, e.g. `/repos/rust-lang/rust/commits`.
pub trait HostingTransport: Send + Sync {
    fn get_json(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> impl Future<Output = Result<ApiPayload, ApiError>> + Send;

    /// Fetches a file body using the raw media type (README, `package.json`).
    fn get_raw(&self, path: &str) -> impl Future<Output = Result<String, ApiError>> + Send;
}

#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    base_url: String,
    token: String,
}

impl GitHubClient {
    pub fn new(base_url: impl Into<String>, token: String) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("netscore/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(60))
            .build()?;
        info!("Token detected (authenticated GitHub requests enabled)");
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn request(&self, url: &str, accept: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header("Accept", accept)
            .header("X-GitHub-Api-Version", "2022-11-28")
            .header("Authorization", format!("Bearer {}", self.token))
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, url: &str, query: &[(&'static str, String)], accept: &str) -> Result<reqwest::Response, ApiError> {
        debug!("GET {} {:?}", url, query);
        let resp = self.request(url, accept).query(query).send().await?;
        let status = resp.status();

        if let Some(remaining) = header_u64(resp.headers(), "x-ratelimit-remaining") {
            if remaining < 50 {
                warn!("Only {} GitHub API requests left in the current window", remaining);
            }
        }

        if status.is_success() {
            return Ok(resp);
        }

        let headers = resp.headers().clone();
        let body = resp.text().await.unwrap_or_default();
        Err(classify_failure(status, &headers, url, body))
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
}

/// Maps a non-success status to the error taxonomy. Nothing here is retried.
pub(crate) fn classify_failure(status: StatusCode, headers: &HeaderMap, url: &str, body: String) -> ApiError {
    match status.as_u16() {
        401 => ApiError::Unauthorized,
        403 | 429 if header_u64(headers, "x-ratelimit-remaining") == Some(0) || status.as_u16() == 429 => {
            let reset = header_u64(headers, "x-ratelimit-reset");
            if let Some(ts) = reset {
                warn!("Rate limit exhausted; resets in {}s", ts.saturating_sub(now_secs()));
            }
            ApiError::RateLimited { reset }
        }
        403 => ApiError::Forbidden(body),
        404 => ApiError::NotFound(url.to_string()),
        code @ 400..=499 => ApiError::Client { status: code, message: body },
        code => ApiError::Server { status: code, url: url.to_string() },
    }
}

impl HostingTransport for GitHubClient {
    async fn get_json(&self, path: &str, query: &[(&'static str, String)]) -> Result<ApiPayload, ApiError> {
        let url = self.url_for(path);
        let resp = self.send(&url, query, "application/vnd.github+json").await?;

        if resp.status() == StatusCode::ACCEPTED {
            return Ok(ApiPayload::Pending);
        }

        let value = resp.json::<Value>().await.map_err(|e| ApiError::Decode {
            url: url.clone(),
            message: e.to_string(),
        })?;
        Ok(ApiPayload::Ready(value))
    }

    async fn get_raw(&self, path: &str) -> Result<String, ApiError> {
        let url = self.url_for(path);
        let resp = self.send(&url, &[], "application/vnd.github.raw+json").await?;
        Ok(resp.text().await?)
    }
}
