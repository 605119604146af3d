use std::path::PathBuf;
use std::time::Duration;

use crate::error_handling::ConfigError;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_NPM_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// Knobs for the paginated history listings.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub page_size: usize,
    pub max_pages: usize,
    /// How far back commits and issues are listed.
    pub history_window_months: u32,
    /// Stop paging once a page's oldest entry predates the window. Only sound
    /// when the host returns entries newest-first.
    pub assume_newest_first: bool,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            page_size: 100,
            max_pages: 5,
            history_window_months: 12,
            assume_newest_first: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricSettings {
    pub correctness_window_months: u32,
    pub responsiveness_window_months: u32,
}

impl Default for MetricSettings {
    fn default() -> Self {
        Self {
            correctness_window_months: 6,
            responsiveness_window_months: 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Silent,
    Info,
    Debug,
}

impl LogLevel {
    fn parse(raw: Option<&str>) -> Result<Self, ConfigError> {
        match raw.map(str::trim) {
            None | Some("") | Some("0") => Ok(LogLevel::Silent),
            Some("1") => Ok(LogLevel::Info),
            Some("2") => Ok(LogLevel::Debug),
            Some(other) => Err(ConfigError::InvalidValue {
                name: "LOG_LEVEL",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub github_token: String,
    pub log_level: LogLevel,
    pub log_file: Option<PathBuf>,
    pub scratch_root: PathBuf,
    pub api_base_url: String,
    pub npm_registry_url: String,
    pub requests_per_hour: u32,
    pub fetch: FetchSettings,
    pub metrics: MetricSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let github_token = lookup("GITHUB_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let log_level = LogLevel::parse(lookup("LOG_LEVEL").as_deref())?;
        let log_file = lookup("LOG_FILE")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let scratch_root = match lookup("NETSCORE_SCRATCH_DIR") {
            Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join("scratch"),
        };

        let requests_per_hour = match lookup("NETSCORE_REQUESTS_PER_HOUR") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidValue {
                    name: "NETSCORE_REQUESTS_PER_HOUR",
                    value: raw,
                })?,
            None => 4800,
        };

        Ok(Self {
            github_token,
            log_level,
            log_file,
            scratch_root,
            api_base_url: lookup("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            npm_registry_url: lookup("NPM_REGISTRY_URL")
                .unwrap_or_else(|| DEFAULT_NPM_REGISTRY_URL.to_string()),
            requests_per_hour,
            fetch: FetchSettings::default(),
            metrics: MetricSettings::default(),
        })
    }

    /// Spacing between hosting API calls derived from the hourly quota.
    pub fn min_request_interval(&self) -> Duration {
        Duration::from_secs_f64(3600.0 / f64::from(self.requests_per_hour))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_missing_token_is_fatal() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingToken));

        let err = Config::from_lookup(lookup_from(&[("GITHUB_TOKEN", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingToken));
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[("GITHUB_TOKEN", "abc")])).unwrap();
        assert_eq!(config.log_level, LogLevel::Silent);
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert_eq!(config.min_request_interval(), Duration::from_millis(750));
        assert_eq!(config.fetch.page_size, 100);
        assert_eq!(config.fetch.max_pages, 5);
        assert!(config.scratch_root.ends_with("scratch"));
    }

    #[test]
    fn test_log_level_mapping() {
        let config = Config::from_lookup(lookup_from(&[("GITHUB_TOKEN", "abc"), ("LOG_LEVEL", "2")])).unwrap();
        assert_eq!(config.log_level, LogLevel::Debug);

        let err = Config::from_lookup(lookup_from(&[("GITHUB_TOKEN", "abc"), ("LOG_LEVEL", "loud")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "LOG_LEVEL", .. }));
    }

    #[test]
    fn test_rate_override() {
        let config = Config::from_lookup(lookup_from(&[
            ("GITHUB_TOKEN", "abc"),
            ("NETSCORE_REQUESTS_PER_HOUR", "3600"),
        ]))
        .unwrap();
        assert_eq!(config.min_request_interval(), Duration::from_secs(1));
    }
}
