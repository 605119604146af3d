//! In-memory stand-ins for the network and the clone step.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde_json::Value;

use crate::cloned_repo::ClonedRepository;
use crate::error_handling::{ApiError, CloneError};
use crate::github::{ApiPayload, HostingTransport};
use crate::npm::PackageRegistry;
use crate::repo_cache::RepoCloner;
use crate::url_utils::extract_owner_and_repo;

#[derive(Debug, Clone)]
pub(crate) enum MockResponse {
    Json(Value),
    Pending,
    Raw(String),
    NotFound,
    Unauthorized,
}

/// Canned answers keyed by path, or by `path?page=N` for paged listings.
/// A key with several queued answers hands them out in order and then keeps
/// repeating the last one.
#[derive(Default)]
pub(crate) struct MockTransport {
    responses: Mutex<HashMap<String, VecDeque<MockResponse>>>,
    calls: Mutex<Vec<String>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(self, key: &str, response: MockResponse) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .push_back(response);
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn next(&self, key: &str) -> MockResponse {
        self.calls.lock().unwrap().push(key.to_string());
        let mut responses = self.responses.lock().unwrap();
        match responses.get_mut(key) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap_or(MockResponse::NotFound),
            None => MockResponse::NotFound,
        }
    }
}

fn key_for(path: &str, query: &[(&'static str, String)]) -> String {
    match query.iter().find(|(k, _)| *k == "page") {
        Some((_, page)) => format!("{}?page={}", path, page),
        None => path.to_string(),
    }
}

impl HostingTransport for MockTransport {
    async fn get_json(&self, path: &str, query: &[(&'static str, String)]) -> Result<ApiPayload, ApiError> {
        match self.next(&key_for(path, query)) {
            MockResponse::Json(value) => Ok(ApiPayload::Ready(value)),
            MockResponse::Pending => Ok(ApiPayload::Pending),
            MockResponse::Raw(body) => serde_json::from_str(&body)
                .map(ApiPayload::Ready)
                .map_err(|e| ApiError::Decode { url: path.to_string(), message: e.to_string() }),
            MockResponse::NotFound => Err(ApiError::NotFound(path.to_string())),
            MockResponse::Unauthorized => Err(ApiError::Unauthorized),
        }
    }

    async fn get_raw(&self, path: &str) -> Result<String, ApiError> {
        match self.next(path) {
            MockResponse::Raw(body) => Ok(body),
            MockResponse::Json(value) => Ok(value.to_string()),
            MockResponse::Pending => Ok(String::new()),
            MockResponse::NotFound => Err(ApiError::NotFound(path.to_string())),
            MockResponse::Unauthorized => Err(ApiError::Unauthorized),
        }
    }
}

/// "Clones" by writing a fixed file tree under the scratch root.
pub(crate) struct FixtureCloner {
    pub(crate) scratch_root: PathBuf,
    pub(crate) files: Vec<(&'static str, &'static str)>,
    pub(crate) removed: Mutex<Vec<PathBuf>>,
}

impl FixtureCloner {
    pub(crate) fn new(scratch_root: &Path, files: Vec<(&'static str, &'static str)>) -> Self {
        Self {
            scratch_root: scratch_root.to_path_buf(),
            files,
            removed: Mutex::new(Vec::new()),
        }
    }
}

impl RepoCloner for FixtureCloner {
    async fn clone_repo(&self, hosting_url: &str) -> Result<ClonedRepository, CloneError> {
        let repo_ref = extract_owner_and_repo(hosting_url).map_err(|_| CloneError::InvalidUrl(hosting_url.to_string()))?;
        let local_path = self.scratch_root.join(format!("{}_{}", repo_ref.owner, repo_ref.repo));
        for (relative, contents) in &self.files {
            let target = local_path.join(relative);
            if relative.ends_with('/') {
                std::fs::create_dir_all(&target)?;
                continue;
            }
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(target, contents)?;
        }
        std::fs::create_dir_all(&local_path)?;
        Ok(ClonedRepository {
            owner: repo_ref.owner,
            repo: repo_ref.repo,
            local_path,
        })
    }

    async fn remove(&self, repo: &ClonedRepository) -> Result<(), CloneError> {
        std::fs::remove_dir_all(&repo.local_path)?;
        self.removed.lock().unwrap().push(repo.local_path.clone());
        Ok(())
    }
}

/// Registry documents by package name; unknown packages are 404s.
#[derive(Default)]
pub(crate) struct MockRegistry {
    documents: HashMap<String, Value>,
    calls: AtomicUsize,
}

impl MockRegistry {
    pub(crate) fn with(mut self, package: &str, document: Value) -> Self {
        self.documents.insert(package.to_string(), document);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PackageRegistry for MockRegistry {
    async fn package_document(&self, package: &str) -> Result<Value, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.documents
            .get(package)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(package.to_string()))
    }
}
