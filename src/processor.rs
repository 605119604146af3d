use tracing::{info, warn};

use crate::error_handling::{EvaluationError, UrlError};
use crate::github::HostingTransport;
use crate::metrics::NetScoreAggregator;
use crate::npm::{NpmResolver, PackageRegistry};
use crate::persistence::NetScoreRecord;
use crate::repo_cache::RepoCloner;
use crate::url_utils::{classify, extract_package_name, UrlType};

/// What happened to one line of the input file.
#[derive(Debug)]
pub struct IdentifierOutcome {
    pub url: String,
    pub result: Result<NetScoreRecord, EvaluationError>,
}

/// Evaluates identifiers one after another. A failing identifier yields an
/// error outcome and the batch carries on with the next one.
pub struct BatchProcessor<T, C, R> {
    aggregator: NetScoreAggregator<T, C>,
    resolver: NpmResolver<R>,
}

impl<T, C, R> BatchProcessor<T, C, R>
where
    T: HostingTransport,
    C: RepoCloner,
    R: PackageRegistry,
{
    pub fn new(aggregator: NetScoreAggregator<T, C>, resolver: NpmResolver<R>) -> Self {
        Self { aggregator, resolver }
    }

    /// The GitHub URL an identifier stands for.
    pub async fn resolve_identifier(&mut self, url: &str) -> Result<String, EvaluationError> {
        let url = url.trim();
        match classify(url) {
            UrlType::GitHub => Ok(url.to_string()),
            UrlType::Npm => {
                let package = extract_package_name(url)?;
                self.resolver.resolve_to_hosting_url(&package).await
            }
            UrlType::Invalid => Err(UrlError::Unsupported(url.to_string()).into()),
        }
    }

    pub async fn process_identifier(&mut self, url: &str) -> IdentifierOutcome {
        info!("Processing URL: {}", url);
        let result = match self.resolve_identifier(url).await {
            Ok(hosting_url) => self.aggregator.evaluate(&hosting_url).await.map(|mut record| {
                // Records are reported under the identifier as written.
                record.url = url.to_string();
                record
            }),
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            warn!("Evaluation failed for {}: {}", url, e);
        }
        IdentifierOutcome {
            url: url.to_string(),
            result,
        }
    }
}
