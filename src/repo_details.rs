//! Snapshot of everything the scorers need to know about one repository.
//!
//! [`RepoDetails`] is assembled once per evaluation by the fetcher and then
//! shared read-only (behind an `Arc`) with every scorer. The `Raw*` types
//! mirror the hosting API's JSON just closely enough to build it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Hosting login when the commit is linked to an account, git author name otherwise.
    pub author: Option<String>,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub state: IssueState,
}

impl IssueRecord {
    pub fn is_closed(&self) -> bool {
        self.state == IssueState::Closed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributorStats {
    pub identity: String,
    pub total_commits: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoDetails {
    pub owner: String,
    pub repo: String,
    pub created_at: DateTime<Utc>,
    /// When the snapshot was taken; time windows are measured back from here.
    pub fetched_at: DateTime<Utc>,
    pub stars: u64,
    pub forks: u64,
    pub open_issues: u64,
    pub license: String,
    /// Newest first.
    pub commits: Vec<CommitRecord>,
    /// Newest first by creation date.
    pub issues: Vec<IssueRecord>,
    pub contributors: Vec<ContributorStats>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawLicense {
    pub name: Option<String>,
    pub spdx_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawRepoMetadata {
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub open_issues_count: u64,
    #[serde(default)]
    pub license: Option<RawLicense>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawAccount {
    pub login: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawGitAuthor {
    pub name: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawGitCommit {
    pub author: Option<RawGitAuthor>,
    pub committer: Option<RawGitAuthor>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawCommit {
    pub commit: RawGitCommit,
    #[serde(default)]
    pub author: Option<RawAccount>,
}

impl RawCommit {
    pub(crate) fn into_record(self) -> Option<CommitRecord> {
        let git_author = self.commit.author;
        let date = git_author
            .as_ref()
            .and_then(|a| a.date)
            .or_else(|| self.commit.committer.as_ref().and_then(|c| c.date))?;
        let author = self
            .author
            .and_then(|a| a.login)
            .or_else(|| git_author.and_then(|a| a.name));
        Some(CommitRecord { author, date })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawIssue {
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    pub state: IssueState,
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

impl RawIssue {
    pub(crate) fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }

    pub(crate) fn into_record(self) -> IssueRecord {
        IssueRecord {
            created_at: self.created_at,
            closed_at: self.closed_at,
            state: self.state,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawContributor {
    pub total: u64,
    #[serde(default)]
    pub author: Option<RawAccount>,
}

impl RawContributor {
    pub(crate) fn into_stats(self) -> ContributorStats {
        ContributorStats {
            identity: self
                .author
                .and_then(|a| a.login)
                .unwrap_or_else(|| "unknown".to_string()),
            total_commits: self.total,
        }
    }
}
