use std::path::Path;

use chrono::Months;
use tracing::debug;

use super::clamp_unit;
use super::walk::{any_file_bfs, count_files, find_dir_bfs};
use crate::repo_details::RepoDetails;

const FOLDER_SEARCH_DEPTH: usize = 3;

const SOURCE_DIRS: &[&str] = &["src", "source", "sources", "lib", "app", "main", "pkg", "packages"];
const TEST_DIRS: &[&str] = &["test", "tests", "spec", "specs", "__tests__", "testing", "t"];

const CI_FILES: &[&str] = &[
    ".travis.yml",
    ".gitlab-ci.yml",
    "jenkinsfile",
    "azure-pipelines.yml",
    "appveyor.yml",
    ".appveyor.yml",
    ".drone.yml",
    "bitbucket-pipelines.yml",
    "circle.yml",
    "cloudbuild.yaml",
];

fn is_ci_config(name: &str, parent: &Path) -> bool {
    let lower = name.to_lowercase();
    if CI_FILES.contains(&lower.as_str()) {
        return true;
    }

    let parent_name = parent.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    let grandparent_name = parent
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    match parent_name {
        ".circleci" => lower == "config.yml",
        "workflows" if grandparent_name == ".github" => lower.ends_with(".yml") || lower.ends_with(".yaml"),
        _ => false,
    }
}

pub fn has_ci_config(clone_path: &Path) -> bool {
    any_file_bfs(clone_path, is_ci_config)
}

/// 0.8 for CI configuration plus up to 0.2 for the test-to-source file ratio.
/// `None` when there is no usable source folder or no test folder at all.
pub fn test_coverage_score(clone_path: &Path) -> Option<f64> {
    let source_dir = find_dir_bfs(clone_path, SOURCE_DIRS, FOLDER_SEARCH_DEPTH)?;
    let source_files = count_files(&source_dir);
    if source_files == 0 {
        debug!("Source folder {:?} is empty", source_dir);
        return None;
    }
    let test_dir = find_dir_bfs(clone_path, TEST_DIRS, FOLDER_SEARCH_DEPTH)?;
    let test_files = count_files(&test_dir);

    let ci = if has_ci_config(clone_path) { 0.8 } else { 0.0 };
    let ratio = (test_files as f64 / source_files as f64).min(1.0);
    debug!(
        "Coverage inputs: ci={} source={:?} ({} files) test={:?} ({} files)",
        ci, source_dir, source_files, test_dir, test_files
    );
    Some(ci + 0.2 * ratio)
}

/// Share of issues opened in the trailing window that are now closed.
pub fn issue_close_ratio(details: &RepoDetails, window_months: u32) -> f64 {
    let since = details
        .fetched_at
        .checked_sub_months(Months::new(window_months))
        .unwrap_or(details.created_at);

    let (opened, closed) = details
        .issues
        .iter()
        .filter(|issue| issue.created_at >= since)
        .fold((0usize, 0usize), |(opened, closed), issue| {
            (opened + 1, closed + usize::from(issue.is_closed()))
        });

    if opened == 0 {
        0.0
    } else {
        closed as f64 / opened as f64
    }
}

pub fn calculate_correctness(details: &RepoDetails, clone_path: &Path, window_months: u32) -> f64 {
    let Some(coverage) = test_coverage_score(clone_path) else {
        debug!("No source or test folder in {}/{}; correctness is 0", details.owner, details.repo);
        return 0.0;
    };

    let close_ratio = issue_close_ratio(details, window_months);
    debug!("Correctness inputs: coverage={:.3} close_ratio={:.3}", coverage, close_ratio);
    clamp_unit(0.5 * coverage + 0.5 * close_ratio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::test_details;
    use crate::repo_details::{IssueRecord, IssueState};
    use chrono::{Duration, TimeZone, Utc};
    use std::fs;

    fn layout(files: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for relative in files {
            let path = dir.path().join(relative);
            if relative.ends_with('/') {
                fs::create_dir_all(&path).unwrap();
            } else {
                fs::create_dir_all(path.parent().unwrap()).unwrap();
                fs::write(&path, "content").unwrap();
            }
        }
        dir
    }

    fn details_with_issues() -> RepoDetails {
        let mut details = test_details();
        let recent = details.fetched_at - Duration::days(30);
        details.issues = vec![
            IssueRecord { created_at: recent, closed_at: None, state: IssueState::Open },
            IssueRecord { created_at: recent, closed_at: Some(recent), state: IssueState::Closed },
            IssueRecord { created_at: recent, closed_at: Some(recent), state: IssueState::Closed },
        ];
        details
    }

    #[test]
    fn complete_repo_scores_at_least_half() {
        let dir = layout(&[
            "README.md",
            "src/file1.ts",
            "src/file2.ts",
            "test/file1.test.ts",
            "test/file2.test.ts",
            ".travis.yml",
        ]);
        let score = calculate_correctness(&details_with_issues(), dir.path(), 6);
        assert!(score >= 0.5 && score <= 1.0, "score={}", score);
        assert!((score - (0.5 + 0.5 * 2.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn empty_source_folder_scores_zero() {
        let dir = layout(&["README.md", "src/", ".travis.yml"]);
        assert_eq!(calculate_correctness(&details_with_issues(), dir.path(), 6), 0.0);

        let dir = layout(&["README.md", "src/", "test/file1.test.ts", ".travis.yml"]);
        assert_eq!(calculate_correctness(&details_with_issues(), dir.path(), 6), 0.0);
    }

    #[test]
    fn missing_source_folder_scores_zero() {
        let dir = layout(&["README.md", "test/file1.test.ts", "test/file2.test.ts", ".travis.yml"]);
        assert_eq!(calculate_correctness(&details_with_issues(), dir.path(), 6), 0.0);
    }

    #[test]
    fn missing_test_folder_scores_zero() {
        let dir = layout(&["README.md", "src/file1.ts", "src/file2.ts", ".travis.yml"]);
        assert_eq!(calculate_correctness(&details_with_issues(), dir.path(), 6), 0.0);
    }

    #[test]
    fn nested_workflow_counts_as_ci() {
        let dir = layout(&[".github/workflows/build.yml"]);
        assert!(has_ci_config(dir.path()));

        let dir = layout(&[".github/config.json", ".github/workflow/fileA.txt"]);
        assert!(!has_ci_config(dir.path()));
    }

    #[test]
    fn coverage_without_ci_uses_ratio_only() {
        let dir = layout(&["lib/a.py", "lib/b.py", "lib/c.py", "lib/d.py", "tests/test_a.py", "tests/test_b.py"]);
        let coverage = test_coverage_score(dir.path()).unwrap();
        assert!((coverage - 0.1).abs() < 1e-9);
    }

    #[test]
    fn close_ratio_ignores_old_issues() {
        let mut details = test_details();
        let old = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let recent = details.fetched_at - Duration::days(10);
        details.issues = vec![
            IssueRecord { created_at: recent, closed_at: Some(recent), state: IssueState::Closed },
            IssueRecord { created_at: old, closed_at: None, state: IssueState::Open },
        ];
        assert_eq!(issue_close_ratio(&details, 6), 1.0);
        assert_eq!(issue_close_ratio(&test_details(), 6), 0.0);
    }
}
