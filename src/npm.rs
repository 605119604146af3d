use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

use crate::error_handling::{ApiError, EvaluationError, UrlError};
use crate::github::classify_failure;
use crate::local_cache::ExpiringCache;
use crate::url_utils::{classify, convert_ssh_to_https, extract_owner_and_repo, UrlType};

const RESOLUTION_CACHE_SIZE: usize = 256;
const RESOLUTION_TTL: Duration = Duration::from_secs(60 * 60);

/// Source of package documents (the registry's `GET /{name}`).
pub trait PackageRegistry: Send + Sync {
    fn package_document(&self, package: &str) -> impl Future<Output = Result<Value, ApiError>> + Send;
}

#[derive(Clone)]
pub struct NpmRegistryClient {
    client: Client,
    base_url: String,
}

impl NpmRegistryClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("netscore/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

impl PackageRegistry for NpmRegistryClient {
    async fn package_document(&self, package: &str) -> Result<Value, ApiError> {
        // Scoped names keep their '@' but the slash must be escaped.
        let url = format!("{}/{}", self.base_url, package.replace('/', "%2F"));
        debug!("GET {}", url);

        let resp = self.client.get(&url).header("Accept", "application/json").send().await?;
        let status = resp.status();
        if !status.is_success() {
            let headers = resp.headers().clone();
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_failure(status, &headers, &url, body));
        }
        resp.json::<Value>().await.map_err(|e| ApiError::Decode {
            url,
            message: e.to_string(),
        })
    }
}

/// `repository` is either a bare string or `{ "type": "git", "url": ... }`.
pub fn repository_url(document: &Value) -> Option<String> {
    match document.get("repository")? {
        Value::String(url) => Some(url.clone()),
        Value::Object(object) => object.get("url")?.as_str().map(str::to_string),
        _ => None,
    }
}

/// Turns any of the registry's repository forms into `https://github.com/o/r`,
/// or `None` if it does not point at GitHub.
pub fn normalise_repository_url(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let expanded = match raw.strip_prefix("github:") {
        Some(shorthand) => format!("https://github.com/{}", shorthand),
        None if !raw.contains(':') && raw.split('/').count() == 2 => format!("https://github.com/{}", raw),
        None => convert_ssh_to_https(raw),
    };

    if classify(&expanded) != UrlType::GitHub {
        return None;
    }
    extract_owner_and_repo(&expanded).ok().map(|r| r.hosting_url())
}

/// Maps package names to GitHub URLs, remembering answers for the run.
pub struct NpmResolver<R> {
    registry: R,
    resolved: ExpiringCache<String>,
}

impl<R: PackageRegistry> NpmResolver<R> {
    pub fn new(registry: R) -> Self {
        Self {
            registry,
            resolved: ExpiringCache::new(RESOLUTION_CACHE_SIZE, RESOLUTION_TTL),
        }
    }

    pub async fn resolve_to_hosting_url(&mut self, package: &str) -> Result<String, EvaluationError> {
        if let Some(url) = self.resolved.get(package) {
            debug!("Using cached repository for {}: {}", package, url);
            return Ok(url);
        }

        info!("Fetching GitHub repository URL for package: {}", package);
        let document = self.registry.package_document(package).await?;
        let raw = repository_url(&document).ok_or_else(|| UrlError::NoHostingRepository {
            package: package.to_string(),
            found: "no repository field".to_string(),
        })?;
        let url = normalise_repository_url(&raw).ok_or_else(|| UrlError::NoHostingRepository {
            package: package.to_string(),
            found: raw.clone(),
        })?;

        info!("GitHub repository URL found for {}: {}", package, url);
        self.resolved.set(package, url.clone());
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockRegistry;
    use serde_json::json;

    #[test]
    fn test_repository_url_forms() {
        assert_eq!(
            repository_url(&json!({ "repository": "https://github.com/o/r" })).as_deref(),
            Some("https://github.com/o/r")
        );
        assert_eq!(
            repository_url(&json!({ "repository": { "type": "git", "url": "git+https://github.com/o/r.git" } }))
                .as_deref(),
            Some("git+https://github.com/o/r.git")
        );
        assert_eq!(repository_url(&json!({ "name": "x" })), None);
    }

    #[test]
    fn test_normalise_repository_url() {
        let expected = Some("https://github.com/o/r".to_string());
        assert_eq!(normalise_repository_url("git+https://github.com/o/r.git"), expected);
        assert_eq!(normalise_repository_url("git@github.com:o/r.git"), expected);
        assert_eq!(normalise_repository_url("git://github.com/o/r.git"), expected);
        assert_eq!(normalise_repository_url("github:o/r"), expected);
        assert_eq!(normalise_repository_url("o/r"), expected);
        assert_eq!(normalise_repository_url("https://gitlab.com/o/r"), None);
    }

    #[tokio::test]
    async fn test_resolution_is_memoised() {
        let registry = MockRegistry::default().with(
            "express",
            json!({ "repository": { "type": "git", "url": "git+https://github.com/expressjs/express.git" } }),
        );
        let mut resolver = NpmResolver::new(registry);

        let first = resolver.resolve_to_hosting_url("express").await.unwrap();
        let second = resolver.resolve_to_hosting_url("express").await.unwrap();
        assert_eq!(first, "https://github.com/expressjs/express");
        assert_eq!(first, second);
        assert_eq!(resolver.registry.calls(), 1);
    }

    #[tokio::test]
    async fn test_non_github_repository_is_an_error() {
        let registry = MockRegistry::default()
            .with("elsewhere", json!({ "repository": "https://gitlab.com/o/r" }))
            .with("bare", json!({ "name": "bare" }));
        let mut resolver = NpmResolver::new(registry);

        let err = resolver.resolve_to_hosting_url("elsewhere").await.unwrap_err();
        assert!(matches!(err, EvaluationError::Url(UrlError::NoHostingRepository { .. })));

        let err = resolver.resolve_to_hosting_url("bare").await.unwrap_err();
        assert!(matches!(err, EvaluationError::Url(UrlError::NoHostingRepository { .. })));

        let err = resolver.resolve_to_hosting_url("missing").await.unwrap_err();
        assert!(matches!(err, EvaluationError::Api(ApiError::NotFound(_))));
    }
}
