use std::future::Future;
use std::path::{Component, Path, PathBuf};

use reqwest::Url;
use tokio::process::Command;
use tracing::{error, info, warn};

use crate::cloned_repo::ClonedRepository;
use crate::error_handling::CloneError;

/// Seam between the aggregator and the disk: produce a checkout, then get rid of it.
pub trait RepoCloner: Send + Sync {
    fn clone_repo(&self, hosting_url: &str) -> impl Future<Output = Result<ClonedRepository, CloneError>> + Send;

    fn remove(&self, repo: &ClonedRepository) -> impl Future<Output = Result<(), CloneError>> + Send;
}

/// Shallow-clones repositories into a scratch root and deletes them again,
/// refusing to touch anything that is not strictly inside that root.
#[derive(Debug, Clone)]
pub struct RepoCloneManager {
    scratch_root: PathBuf,
}

impl RepoCloneManager {
    pub fn new(scratch_root: impl Into<PathBuf>) -> Self {
        Self {
            scratch_root: scratch_root.into(),
        }
    }

    pub fn scratch_root(&self) -> &Path {
        &self.scratch_root
    }

    /// Checks host and `owner/repo` shape, returning `(owner, repo)`.
    pub fn validate_url(hosting_url: &str) -> Result<(String, String), CloneError> {
        let invalid = || CloneError::InvalidUrl(hosting_url.to_string());
        let url = Url::parse(hosting_url.trim()).map_err(|_| invalid())?;

        if !matches!(url.scheme(), "https" | "http") {
            return Err(invalid());
        }
        if !matches!(url.host_str(), Some("github.com") | Some("www.github.com")) {
            return Err(invalid());
        }

        let mut segments = url.path_segments().ok_or_else(invalid)?.filter(|s| !s.is_empty());
        let owner = segments.next().ok_or_else(invalid)?.to_string();
        let repo = segments.next().ok_or_else(invalid)?.trim_end_matches(".git").to_string();
        if repo.is_empty() {
            return Err(invalid());
        }
        Ok((owner, repo))
    }

    fn sanitize_repo_name(&self, owner: &str, repo: &str) -> String {
        format!("{}_{}", owner, repo).replace(['/', '\\', '.'], "_")
    }

    /// Deterministic checkout location for `owner/repo`.
    pub fn clone_path_for(&self, owner: &str, repo: &str) -> PathBuf {
        self.scratch_root.join(self.sanitize_repo_name(owner, repo))
    }

    pub async fn clone(&self, hosting_url: &str) -> Result<ClonedRepository, CloneError> {
        let (owner, repo) = Self::validate_url(hosting_url)?;
        let repo_dir = self.clone_path_for(&owner, &repo);

        tokio::fs::create_dir_all(&self.scratch_root).await?;

        if tokio::fs::symlink_metadata(&repo_dir).await.is_ok() {
            info!("Removing stale checkout at {:?} before cloning", repo_dir);
            self.remove_path(&repo_dir).await?;
        }

        let clone_url = format!("https://github.com/{}/{}.git", owner, repo);
        info!("Cloning repository {}/{} to {:?}", owner, repo, repo_dir);

        let output = Command::new("git")
            .arg("clone")
            .args(["--depth", "1", "--single-branch", "--quiet"])
            .arg(&clone_url)
            .arg(&repo_dir)
            .output()
            .await
            .map_err(|e| CloneError::Git(format!("Failed to execute git clone: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(
                "Git clone failed for {}/{}: status={:?}, stderr={}",
                owner,
                repo,
                output.status.code(),
                stderr
            );
            if tokio::fs::symlink_metadata(&repo_dir).await.is_ok() {
                if let Err(e) = self.remove_path(&repo_dir).await {
                    warn!("Failed to clean up partial clone {:?}: {}", repo_dir, e);
                }
            }
            return Err(CloneError::Git(format!("Git clone failed: {}", stderr.trim())));
        }

        info!("Successfully cloned {}/{} to {:?}", owner, repo, repo_dir);
        Ok(ClonedRepository {
            owner,
            repo,
            local_path: repo_dir,
        })
    }

    /// Deletes `path` only if it lies strictly inside the scratch root and exists.
    pub async fn remove_path(&self, path: &Path) -> Result<(), CloneError> {
        let resolved = absolutize(path)?;
        let root = absolutize(&self.scratch_root)?;

        if !resolved.starts_with(&root) {
            return Err(CloneError::OutsideScratchRoot(resolved.display().to_string()));
        }
        if resolved == root {
            return Err(CloneError::ScratchRootItself);
        }
        let metadata = tokio::fs::symlink_metadata(&resolved)
            .await
            .map_err(|_| CloneError::Missing(resolved.display().to_string()))?;

        if metadata.is_dir() {
            tokio::fs::remove_dir_all(&resolved).await?;
        } else {
            tokio::fs::remove_file(&resolved).await?;
        }
        info!("Removed checkout {:?}", resolved);
        Ok(())
    }
}

impl RepoCloner for RepoCloneManager {
    async fn clone_repo(&self, hosting_url: &str) -> Result<ClonedRepository, CloneError> {
        self.clone(hosting_url).await
    }

    async fn remove(&self, repo: &ClonedRepository) -> Result<(), CloneError> {
        self.remove_path(&repo.local_path).await
    }
}

/// Absolute, lexically normalised form of `path` (no `.` or `..`), without
/// touching the filesystem so that missing paths can still be checked.
fn absolutize(path: &Path) -> Result<PathBuf, CloneError> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut normalised = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalised.pop();
            }
            other => normalised.push(other.as_os_str()),
        }
    }
    Ok(normalised)
}
