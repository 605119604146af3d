use std::sync::Arc;

use chrono::{DateTime, Months, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::FetchSettings;
use crate::error_handling::ApiError;
use crate::github::{jitter, ApiPayload, HostingTransport};
use crate::license_detect::detect_license;
use crate::rate_limiter::RateLimiter;
use crate::repo_details::{
    CommitRecord, ContributorStats, IssueRecord, RawCommit, RawContributor, RawIssue, RawRepoMetadata, RepoDetails,
};

pub const NO_LICENSE: &str = "No license";

const STATS_PENDING_RETRIES: usize = 3;
const STATS_PENDING_WAIT_MS: u64 = 2000;

/// Stop rule for a paginated listing.
#[derive(Debug, Clone, Copy)]
struct PageCutoff {
    since: DateTime<Utc>,
    page_size: usize,
    max_pages: usize,
    newest_first: bool,
}

/// Issues every hosting API call needed to build a [`RepoDetails`].
pub struct RepoDataFetcher<T> {
    transport: T,
    limiter: Arc<RateLimiter>,
    settings: FetchSettings,
    fixed_time: Option<DateTime<Utc>>,
}

impl<T: HostingTransport> RepoDataFetcher<T> {
    pub fn new(transport: T, limiter: Arc<RateLimiter>, settings: FetchSettings) -> Self {
        Self {
            transport,
            limiter,
            settings,
            fixed_time: None,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Pins the snapshot time instead of reading the clock.
    pub fn at_fixed_time(mut self, at: DateTime<Utc>) -> Self {
        self.fixed_time = Some(at);
        self
    }

    async fn call_json(&self, path: &str, query: &[(&'static str, String)]) -> Result<ApiPayload, ApiError> {
        self.limiter.schedule(|| self.transport.get_json(path, query)).await
    }

    async fn call_raw(&self, path: &str) -> Result<String, ApiError> {
        self.limiter.schedule(|| self.transport.get_raw(path)).await
    }

    async fn call_typed<D: DeserializeOwned>(&self, path: &str, query: &[(&'static str, String)]) -> Result<D, ApiError> {
        match self.call_json(path, query).await? {
            ApiPayload::Ready(value) => decode(path, value),
            ApiPayload::Pending => Err(ApiError::Decode {
                url: path.to_string(),
                message: "response still being computed".to_string(),
            }),
        }
    }

    pub async fn fetch_repo_metadata(&self, owner: &str, repo: &str) -> Result<RawRepoMetadata, ApiError> {
        info!("Fetching repository metadata for {}/{}", owner, repo);
        self.call_typed(&format!("/repos/{}/{}", owner, repo), &[]).await
    }

    /// Declared license, else `package.json`'s `license`, else a license named
    /// in the README, else [`NO_LICENSE`]. A missing or unreadable file moves on
    /// to the next source; any other failure ends the lookup.
    pub async fn resolve_license(
        &self,
        metadata: &RawRepoMetadata,
        owner: &str,
        repo: &str,
    ) -> Result<String, ApiError> {
        if let Some(declared) = metadata.license.as_ref().and_then(|l| l.name.clone()) {
            if !declared.trim().is_empty() && declared != "Other" {
                return Ok(declared);
            }
        }

        let package_json = self.call_raw(&format!("/repos/{}/{}/contents/package.json", owner, repo)).await;
        if let Some(body) = absent_on_missing(package_json, owner, repo, "package.json")? {
            if let Some(license) = package_json_license(&body) {
                debug!("License {} taken from package.json", license);
                return Ok(license);
            }
        }

        let readme = self.call_raw(&format!("/repos/{}/{}/readme", owner, repo)).await;
        if let Some(readme) = absent_on_missing(readme, owner, repo, "README")? {
            if let Some(license) = detect_license(&readme) {
                debug!("License {} found in README", license);
                return Ok(license.to_string());
            }
        }

        Ok(NO_LICENSE.to_string())
    }

    pub async fn fetch_paged_commits(
        &self,
        owner: &str,
        repo: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<CommitRecord>, ApiError> {
        let path = format!("/repos/{}/{}/commits", owner, repo);
        let cutoff = self.cutoff(since);
        let extra = [("since", since.to_rfc3339())];

        self.fetch_pages(&path, &extra, cutoff, |raw: RawCommit| raw.into_record(), |c| c.date)
            .await
    }

    pub async fn fetch_paged_issues(
        &self,
        owner: &str,
        repo: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<IssueRecord>, ApiError> {
        let path = format!("/repos/{}/{}/issues", owner, repo);
        let cutoff = self.cutoff(since);
        let extra = [
            ("state", "all".to_string()),
            ("sort", "created".to_string()),
            ("direction", "desc".to_string()),
            ("since", since.to_rfc3339()),
        ];

        self.fetch_pages(
            &path,
            &extra,
            cutoff,
            |raw: RawIssue| (!raw.is_pull_request()).then(|| raw.into_record()),
            |i| i.created_at,
        )
        .await
    }

    pub async fn fetch_contributor_stats(&self, owner: &str, repo: &str) -> Result<Vec<ContributorStats>, ApiError> {
        let path = format!("/repos/{}/{}/stats/contributors", owner, repo);

        for attempt in 0..=STATS_PENDING_RETRIES {
            match self.call_json(&path, &[]).await? {
                ApiPayload::Ready(Value::Null) => return Ok(Vec::new()),
                ApiPayload::Ready(value) => {
                    let raw: Vec<RawContributor> = decode(&path, value)?;
                    return Ok(raw.into_iter().map(RawContributor::into_stats).collect());
                }
                ApiPayload::Pending if attempt < STATS_PENDING_RETRIES => {
                    debug!("Contributor statistics for {}/{} pending (attempt {})", owner, repo, attempt + 1);
                    tokio::time::sleep(jitter(STATS_PENDING_WAIT_MS)).await;
                }
                ApiPayload::Pending => {}
            }
        }

        warn!("Contributor statistics for {}/{} still pending; using none", owner, repo);
        Ok(Vec::new())
    }

    /// Metadata, then license, then history, in that order.
    pub async fn fetch_repo_details(&self, owner: &str, repo: &str) -> Result<RepoDetails, ApiError> {
        let fetched_at = self.fixed_time.unwrap_or_else(Utc::now);
        let metadata = self.fetch_repo_metadata(owner, repo).await?;
        let license = self.resolve_license(&metadata, owner, repo).await?;

        let since = fetched_at
            .checked_sub_months(Months::new(self.settings.history_window_months))
            .unwrap_or(metadata.created_at);

        let commits = self.fetch_paged_commits(owner, repo, since).await?;
        let issues = self.fetch_paged_issues(owner, repo, since).await?;
        let contributors = self.fetch_contributor_stats(owner, repo).await?;

        info!(
            "Fetched {}/{}: {} commits, {} issues, {} contributors, license {}",
            owner,
            repo,
            commits.len(),
            issues.len(),
            contributors.len(),
            license
        );

        Ok(RepoDetails {
            owner: owner.to_string(),
            repo: repo.to_string(),
            created_at: metadata.created_at,
            fetched_at,
            stars: metadata.stargazers_count,
            forks: metadata.forks_count,
            open_issues: metadata.open_issues_count,
            license,
            commits,
            issues,
            contributors,
        })
    }

    fn cutoff(&self, since: DateTime<Utc>) -> PageCutoff {
        PageCutoff {
            since,
            page_size: self.settings.page_size,
            max_pages: self.settings.max_pages,
            newest_first: self.settings.assume_newest_first,
        }
    }

    async fn fetch_pages<R, O, M, D>(
        &self,
        path: &str,
        extra: &[(&'static str, String)],
        cutoff: PageCutoff,
        mut map: M,
        date_of: D,
    ) -> Result<Vec<O>, ApiError>
    where
        R: DeserializeOwned,
        M: FnMut(R) -> Option<O>,
        D: Fn(&O) -> DateTime<Utc>,
    {
        let mut collected = Vec::new();
        let mut early_stop = cutoff.newest_first;

        for page in 1..=cutoff.max_pages {
            let mut query = vec![("per_page", cutoff.page_size.to_string()), ("page", page.to_string())];
            query.extend(extra.iter().cloned());

            let raw_page: Vec<R> = self.call_typed(path, &query).await?;
            let raw_len = raw_page.len();
            let entries: Vec<O> = raw_page.into_iter().filter_map(&mut map).collect();

            if early_stop && !is_newest_first(&entries, &date_of) {
                warn!("{} page {} is not ordered newest-first; disabling early stop", path, page);
                early_stop = false;
            }

            let reached_window_start = entries.iter().any(|e| date_of(e) < cutoff.since);
            collected.extend(entries.into_iter().filter(|e| date_of(e) >= cutoff.since));

            if raw_len < cutoff.page_size {
                debug!("{} page {} is short ({} entries); done", path, page, raw_len);
                break;
            }
            if early_stop && reached_window_start {
                debug!("{} page {} reaches past {}; done", path, page, cutoff.since);
                break;
            }
        }

        Ok(collected)
    }
}

fn decode<D: DeserializeOwned>(path: &str, value: Value) -> Result<D, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Decode {
        url: path.to_string(),
        message: e.to_string(),
    })
}

fn absent_on_missing(
    result: Result<String, ApiError>,
    owner: &str,
    repo: &str,
    what: &str,
) -> Result<Option<String>, ApiError> {
    match result {
        Ok(body) => Ok(Some(body)),
        Err(e @ (ApiError::NotFound(_) | ApiError::Decode { .. })) => {
            debug!("No usable {} for {}/{}: {}", what, owner, repo, e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn is_newest_first<O, D: Fn(&O) -> DateTime<Utc>>(entries: &[O], date_of: &D) -> bool {
    entries.windows(2).all(|pair| date_of(&pair[0]) >= date_of(&pair[1]))
}

/// `license` from a `package.json` body, as a string or `{ "type": ... }`.
pub fn package_json_license(body: &str) -> Option<String> {
    let doc: Value = serde_json::from_str(body).ok()?;
    let license = match doc.get("license")? {
        Value::String(s) => s.clone(),
        Value::Object(map) => map.get("type")?.as_str()?.to_string(),
        _ => return None,
    };
    let license = license.trim().to_string();
    (!license.is_empty()).then_some(license)
}
