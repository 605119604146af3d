use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info};

use super::clamp_unit;
use super::walk::collect_files;

const README_SCORE: f64 = 0.1;
const INSTALL_SCORE: f64 = 0.4;
const COMMENT_SCORE: f64 = 0.5;
/// One comment line per this many lines earns the full comment score.
const LINES_PER_COMMENT: f64 = 8.0;

const INSTALL_KEYWORDS: &[&str] = &["install", "test", "launch", "run"];
const CODE_EXTENSIONS: &[&str] = &[
    "js", "ts", "jsx", "tsx", "py", "java", "c", "cpp", "h", "hpp", "cs", "rb", "go", "php", "swift", "kt", "kts", "rs",
];

static README_PATTERN: OnceLock<Regex> = OnceLock::new();

fn readme_pattern() -> &'static Regex {
    README_PATTERN.get_or_init(|| Regex::new(r"(?i)^README(\.md|\.txt|\.rst)?$").expect("static readme pattern"))
}

struct CommentSyntax {
    line: &'static str,
    block_start: &'static str,
    block_end: &'static str,
}

impl CommentSyntax {
    fn for_extension(ext: &str) -> Self {
        match ext {
            "py" => Self { line: "#", block_start: "'''", block_end: "'''" },
            "rb" => Self { line: "#", block_start: "=begin", block_end: "=end" },
            _ => Self { line: "//", block_start: "/*", block_end: "*/" },
        }
    }
}

/// README files directly inside the checkout root; symlinks are ignored.
pub fn find_readmes(clone_path: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(clone_path) else {
        return Vec::new();
    };
    let mut readmes: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter(|e| readme_pattern().is_match(&e.file_name().to_string_lossy()))
        .map(|e| e.path())
        .collect();
    readmes.sort();
    readmes
}

pub fn has_install_instructions(readmes: &[PathBuf]) -> bool {
    readmes.iter().any(|path| match fs::read_to_string(path) {
        Ok(content) => {
            let content = content.to_lowercase();
            INSTALL_KEYWORDS.iter().any(|k| content.contains(k))
        }
        Err(e) => {
            debug!("Failed to read {:?}: {}", path, e);
            false
        }
    })
}

pub fn count_comment_lines(content: &str, ext: &str) -> usize {
    let syntax = CommentSyntax::for_extension(ext);
    let mut in_block = false;
    let mut comments = 0;

    for line in content.lines() {
        let trimmed = line.trim();
        if in_block {
            comments += 1;
            if trimmed.contains(syntax.block_end) {
                in_block = false;
            }
        } else if trimmed.starts_with(syntax.line) {
            comments += 1;
        } else if let Some(pos) = trimmed.find(syntax.block_start) {
            comments += 1;
            // Python opens and closes a docstring with the same token.
            let rest = &trimmed[pos + syntax.block_start.len()..];
            if !rest.contains(syntax.block_end) {
                in_block = true;
            }
        }
    }
    comments
}

fn is_code_file(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    CODE_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Up to [`COMMENT_SCORE`], from comment lines against total lines across all
/// source files.
pub fn comment_ratio_score(clone_path: &Path) -> f64 {
    let mut total_lines = 0usize;
    let mut comment_lines = 0usize;

    for file in collect_files(clone_path) {
        let Some(ext) = is_code_file(&file) else {
            continue;
        };
        let Ok(bytes) = fs::read(&file) else {
            continue;
        };
        let content = String::from_utf8_lossy(&bytes);
        total_lines += content.lines().count().max(1);
        comment_lines += count_comment_lines(&content, &ext);
    }

    if total_lines == 0 {
        return 0.0;
    }
    let ratio = comment_lines as f64 / (total_lines as f64 / LINES_PER_COMMENT);
    ratio.min(1.0) * COMMENT_SCORE
}

pub fn calculate_ramp_up_time(clone_path: &Path) -> f64 {
    info!("Starting ramp-up time calculation for {:?}", clone_path);

    let readmes = find_readmes(clone_path);
    let readme_score = if readmes.is_empty() { 0.0 } else { README_SCORE };
    let install_score = if has_install_instructions(&readmes) { INSTALL_SCORE } else { 0.0 };
    let comment_score = comment_ratio_score(clone_path);

    debug!(
        "Ramp-up scores: readme={} install={} comments={:.3}",
        readme_score, install_score, comment_score
    );
    clamp_unit(readme_score + install_score + comment_score)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn readme_with_install_words() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "README.md", "This is a test README with install instructions.\nRun this code.");

        let score = calculate_ramp_up_time(dir.path());
        assert!((score - 0.5).abs() < 1e-9, "score={}", score);
    }

    #[test]
    fn no_readme_scores_nothing_for_docs() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "index.js", "console.log(\"Hello, world!\");");
        write(dir.path(), "docs/README.md", "install and run");

        assert!(find_readmes(dir.path()).is_empty());
        assert_eq!(calculate_ramp_up_time(dir.path()), 0.0);
    }

    #[test]
    fn readme_name_variants() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "readme.rst", "");
        write(dir.path(), "README.old", "");
        write(dir.path(), "READMEFIRST", "");

        let found = find_readmes(dir.path());
        assert_eq!(found, vec![dir.path().join("readme.rst")]);
    }

    #[test]
    fn counts_c_style_comments() {
        let source = "// header\nlet a = 1;\n/* block\n still block\n*/\nlet b = 2; /* inline */\n";
        assert_eq!(count_comment_lines(source, "js"), 5);
    }

    #[test]
    fn counts_python_and_ruby_comments() {
        let py = "# note\n'''\ndoc\n'''\nx = 1\n'''one line'''\n";
        assert_eq!(count_comment_lines(py, "py"), 5);

        let rb = "# note\n=begin\nblock\n=end\nputs 1\n";
        assert_eq!(count_comment_lines(rb, "rb"), 4);
    }

    #[test]
    fn well_commented_code_earns_full_comment_score() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/lib.rs", "// one\nfn a() {}\nfn b() {}\nfn c() {}\n");
        write(dir.path(), "notes.txt", "not code\n".repeat(100).as_str());

        assert!((comment_ratio_score(dir.path()) - COMMENT_SCORE).abs() < 1e-9);
    }

    #[test]
    fn sparse_comments_scale_down() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = String::from("// only comment\n");
        source.push_str(&"x();\n".repeat(15));
        write(dir.path(), "main.c", &source);

        // 1 comment over 16 lines: ratio 0.5 of the target.
        assert!((comment_ratio_score(dir.path()) - 0.25).abs() < 1e-9);
    }
}
