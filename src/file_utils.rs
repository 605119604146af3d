use std::path::Path;

use tracing::info;

/// One identifier per line; surrounding whitespace and blank lines are dropped.
pub fn parse_url_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub async fn read_urls_from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Vec<String>> {
    let content = tokio::fs::read_to_string(path.as_ref()).await?;
    let urls = parse_url_lines(&content);
    info!("Read {} URLs from {}", urls.len(), path.as_ref().display());
    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_blank_lines() {
        let urls = parse_url_lines("http://example.com\n\n  https://example.org  \r\n\n");
        assert_eq!(urls, vec!["http://example.com", "https://example.org"]);
        assert!(parse_url_lines("").is_empty());
    }

    #[tokio::test]
    async fn test_read_urls_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.txt");
        std::fs::write(
            &path,
            "https://github.com/cloudinary/cloudinary_npm\nhttps://www.npmjs.com/package/express\n",
        )
        .unwrap();

        let urls = read_urls_from_file(&path).await.unwrap();
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[1], "https://www.npmjs.com/package/express");
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_urls_from_file(dir.path().join("nope.txt")).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
