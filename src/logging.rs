use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::{Config, LogLevel};
use crate::error_handling::ConfigError;

fn filter_for(level: LogLevel) -> EnvFilter {
    match level {
        LogLevel::Silent => EnvFilter::new("off"),
        LogLevel::Info => EnvFilter::new("netscore=info"),
        LogLevel::Debug => EnvFilter::new("netscore=debug"),
    }
}

/// Installs the global subscriber. Standard output is reserved for score
/// records, so logs go to `LOG_FILE` when set and to stderr otherwise.
pub fn init_logging(config: &Config) -> Result<(), ConfigError> {
    let filter = filter_for(config.log_level);

    match &config.log_file {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::MissingLogFile(path.display().to_string()));
            }
            let file = OpenOptions::new()
                .append(true)
                .open(path)
                .map_err(|e| ConfigError::Logging(format!("{}: {}", path.display(), e)))?;

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|e| ConfigError::Logging(e.to_string()))
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| ConfigError::Logging(e.to_string())),
    }
}
