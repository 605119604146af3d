//! Trustworthiness scores for open-source packages.
//!
//! Each identifier (a GitHub repository or an npm package page) is resolved to
//! a GitHub repository, its history is fetched through a rate-limited client,
//! a shallow checkout is inspected, and five metrics are combined into a
//! weighted NetScore.

pub mod cloned_repo;
pub mod config;
pub mod error_handling;
pub mod fetcher;
pub mod file_utils;
pub mod github;
pub mod license_detect;
pub mod local_cache;
pub mod logging;
pub mod metrics;
pub mod npm;
pub mod persistence;
pub mod processor;
pub mod rate_limiter;
pub mod repo_cache;
pub mod repo_details;
pub mod url_utils;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use error_handling::{ErrorReporter, EvaluationError};
pub use persistence::NetScoreRecord;
pub use processor::{BatchProcessor, IdentifierOutcome};
