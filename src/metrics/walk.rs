//! Directory walks over a checkout. None of these follow symbolic links, so a
//! link cycle inside a cloned repository cannot trap them.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Directories that never hold the project's own sources.
const SKIPPED_DIRS: &[&str] = &[".git", "node_modules"];

fn is_skipped(name: &str) -> bool {
    SKIPPED_DIRS.contains(&name)
}

/// Sorted entries of `dir` as `(path, file name, is_dir, is_file)`; symlinks
/// are reported as neither.
fn sorted_entries(dir: &Path) -> Vec<(PathBuf, String, bool, bool)> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Failed to read directory {:?}: {}", dir, e);
            return Vec::new();
        }
    };

    let mut out: Vec<_> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let file_type = entry.file_type().ok()?;
            let name = entry.file_name().to_string_lossy().into_owned();
            Some((entry.path(), name, file_type.is_dir(), file_type.is_file()))
        })
        .collect();
    out.sort_by(|a, b| a.1.cmp(&b.1));
    out
}

/// Breadth-first search for the shallowest directory whose lowercase name is
/// in `names`. Depth 1 means direct children of `root`.
pub fn find_dir_bfs(root: &Path, names: &[&str], max_depth: usize) -> Option<PathBuf> {
    let mut queue = VecDeque::from([(root.to_path_buf(), 0usize)]);

    while let Some((dir, depth)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }
        for (path, name, is_dir, _) in sorted_entries(&dir) {
            if !is_dir || is_skipped(&name) {
                continue;
            }
            if names.contains(&name.to_lowercase().as_str()) {
                return Some(path);
            }
            queue.push_back((path, depth + 1));
        }
    }
    None
}

/// Breadth-first search over the whole tree for a file accepted by `matches`,
/// which receives the file name and its parent directory's path.
pub fn any_file_bfs<F>(root: &Path, mut matches: F) -> bool
where
    F: FnMut(&str, &Path) -> bool,
{
    let mut queue = VecDeque::from([root.to_path_buf()]);

    while let Some(dir) = queue.pop_front() {
        for (path, name, is_dir, is_file) in sorted_entries(&dir) {
            if is_dir {
                if !is_skipped(&name) {
                    queue.push_back(path);
                }
            } else if is_file && matches(&name, &dir) {
                return true;
            }
        }
    }
    false
}

/// Every regular file under `root`.
pub fn collect_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    collect_files_recursive(root, &mut files);
    files
}

fn collect_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) {
    for (path, name, is_dir, is_file) in sorted_entries(dir) {
        if is_dir {
            if !is_skipped(&name) {
                collect_files_recursive(&path, files);
            }
        } else if is_file {
            files.push(path);
        }
    }
}

pub fn count_files(root: &Path) -> usize {
    collect_files(root).len()
}
