use std::sync::OnceLock;

use regex::Regex;

use crate::error_handling::UrlError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlType {
    GitHub,
    Npm,
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    pub fn hosting_url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.repo)
    }
}

fn github_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(https?://)?(www\.)?github\.com/([^/\s]+)/([^/\s#?]+)").expect("static github pattern")
    })
}

fn npm_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(https?://)?(www\.)?npmjs\.com/package/((@[^/\s]+/)?[^/\s#?]+)").expect("static npm pattern")
    })
}

pub fn classify(url: &str) -> UrlType {
    let url = url.trim();
    if github_pattern().is_match(url) {
        UrlType::GitHub
    } else if npm_pattern().is_match(url) {
        UrlType::Npm
    } else {
        UrlType::Invalid
    }
}

pub fn extract_owner_and_repo(github_url: &str) -> Result<RepoRef, UrlError> {
    let caps = github_pattern()
        .captures(github_url.trim())
        .ok_or_else(|| UrlError::MissingOwnerOrRepo(github_url.to_string()))?;

    let owner = caps[3].to_string();
    let repo = caps[4].trim_end_matches(".git").to_string();
    if owner.is_empty() || repo.is_empty() {
        return Err(UrlError::MissingOwnerOrRepo(github_url.to_string()));
    }
    Ok(RepoRef { owner, repo })
}

pub fn extract_package_name(npm_url: &str) -> Result<String, UrlError> {
    npm_pattern()
        .captures(npm_url.trim())
        .map(|caps| caps[3].to_string())
        .ok_or_else(|| UrlError::MissingPackageName(npm_url.to_string()))
}

/// Normalises the repository URL forms found in registry metadata
/// (`git@github.com:o/r.git`, `git+https://...`, `git://...`) to
/// `https://github.com/o/r`. Anything else comes back unchanged.
pub fn convert_ssh_to_https(url: &str) -> String {
    let url = url.trim();
    let normalised = if let Some(rest) = url.strip_prefix("git@github.com:") {
        format!("https://github.com/{}", rest)
    } else if let Some(rest) = url.strip_prefix("git+ssh://git@github.com/") {
        format!("https://github.com/{}", rest)
    } else if let Some(rest) = url.strip_prefix("git+") {
        rest.to_string()
    } else if let Some(rest) = url.strip_prefix("git://") {
        format!("https://{}", rest)
    } else {
        return url.to_string();
    };
    normalised.trim_end_matches(".git").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify("https://github.com/owner/repo"), UrlType::GitHub);
        assert_eq!(classify("github.com/owner/repo"), UrlType::GitHub);
        assert_eq!(classify("https://www.npmjs.com/package/package-name"), UrlType::Npm);
        assert_eq!(classify("https://invalid-url.com"), UrlType::Invalid);
        assert_eq!(classify("https://github.com/only-owner"), UrlType::Invalid);
    }

    #[test]
    fn test_extract_owner_and_repo() {
        let r = extract_owner_and_repo("https://github.com/owner/repo").unwrap();
        assert_eq!(r, RepoRef { owner: "owner".into(), repo: "repo".into() });

        let r = extract_owner_and_repo("https://github.com/owner/repo.git").unwrap();
        assert_eq!(r.repo, "repo");

        let r = extract_owner_and_repo("https://github.com/owner/repo/tree/main/src").unwrap();
        assert_eq!(r.hosting_url(), "https://github.com/owner/repo");

        assert!(extract_owner_and_repo("https://github.com/invalid-url").is_err());
    }

    #[test]
    fn test_extract_package_name() {
        assert_eq!(extract_package_name("https://www.npmjs.com/package/package-name").unwrap(), "package-name");
        assert_eq!(extract_package_name("https://www.npmjs.com/package/@types/node").unwrap(), "@types/node");
        assert!(extract_package_name("https://invalid-url.com").is_err());
    }

    #[test]
    fn test_convert_ssh_to_https() {
        assert_eq!(convert_ssh_to_https("git@github.com:owner/repo.git"), "https://github.com/owner/repo");
        assert_eq!(convert_ssh_to_https("git+https://github.com/owner/repo.git"), "https://github.com/owner/repo");
        assert_eq!(convert_ssh_to_https("git://github.com/owner/repo.git"), "https://github.com/owner/repo");
        assert_eq!(convert_ssh_to_https("https://github.com/owner/repo"), "https://github.com/owner/repo");
    }
}
