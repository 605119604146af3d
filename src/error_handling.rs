use colored::Colorize;
use thiserror::Error;
use tracing::error;

/// Failures talking to the hosting API or the package registry.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized. Invalid or missing GitHub Token.")]
    Unauthorized,
    #[error("Rate limit exceeded (resets at {reset:?})")]
    RateLimited { reset: Option<u64> },
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not Found. Invalid URL: {0}")]
    NotFound(String),
    #[error("Client error ({status}): {message}")]
    Client { status: u16, message: String },
    #[error("Server error ({status}) from {url}")]
    Server { status: u16, url: String },
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Unexpected response from {url}: {message}")]
    Decode { url: String, message: String },
}

#[derive(Debug, Error)]
pub enum CloneError {
    #[error("Invalid GitHub URL: {0}")]
    InvalidUrl(String),
    #[error("Cannot remove files outside the scratch directory: {0}")]
    OutsideScratchRoot(String),
    #[error("Cannot remove the scratch directory itself")]
    ScratchRootItself,
    #[error("Repository does not exist: {0}")]
    Missing(String),
    #[error("Git error: {0}")]
    Git(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GITHUB_TOKEN is not set")]
    MissingToken,
    #[error("LOG_FILE does not exist: {0}")]
    MissingLogFile(String),
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
    #[error("Failed to initialise logging: {0}")]
    Logging(String),
}

#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Unsupported URL: {0}")]
    Unsupported(String),
    #[error("Could not extract owner and repository from {0}")]
    MissingOwnerOrRepo(String),
    #[error("Could not extract package name from {0}")]
    MissingPackageName(String),
    #[error("Package {package} has no GitHub repository ({found})")]
    NoHostingRepository { package: String, found: String },
}

/// Everything that can abort the evaluation of a single identifier.
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("Clone error: {0}")]
    Clone(#[from] CloneError),
    #[error("URL error: {0}")]
    Url(#[from] UrlError),
    #[error("Scorer {metric} did not complete: {message}")]
    Scorer { metric: &'static str, message: String },
}

pub struct ErrorReporter;

impl ErrorReporter {
    pub fn report_error(url: &str, error: &EvaluationError) {
        let label = match error {
            EvaluationError::Api(_) => "API Error",
            EvaluationError::Clone(_) => "Clone Error",
            EvaluationError::Url(_) => "URL Error",
            EvaluationError::Scorer { .. } => "Scoring Error",
        };

        eprintln!("{} {}: {}", label.red().bold(), url, error);
        error!(url, "{}", error);
    }

    pub fn report_config_error(error: &ConfigError) {
        eprintln!("{} {}", "Configuration Error:".red().bold(), error);
    }

    pub fn report_warning(message: &str) {
        eprintln!("{} {}", "warning:".yellow().bold(), message);
    }

    pub fn report_summary(succeeded: usize, failed: usize) {
        let line = format!("Evaluated {} identifiers ({} failed)", succeeded + failed, failed);
        if failed == 0 {
            eprintln!("{}", line.green());
        } else {
            eprintln!("{}", line.yellow());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_message_names_the_token() {
        let err = EvaluationError::from(ApiError::Unauthorized);
        assert!(err.to_string().contains("Invalid or missing GitHub Token"));
    }

    #[test]
    fn not_found_message_mentions_invalid_url() {
        let err = ApiError::NotFound("https://api.github.com/repos/a/b".into());
        assert!(err.to_string().starts_with("Not Found. Invalid URL"));
    }

    #[test]
    fn clone_errors_convert_into_evaluation_errors() {
        let err: EvaluationError = CloneError::ScratchRootItself.into();
        assert!(matches!(err, EvaluationError::Clone(CloneError::ScratchRootItself)));
    }
}
