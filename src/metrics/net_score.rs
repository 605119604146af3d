use std::path::Path;
use std::sync::Arc;

use tokio::time::Instant;
use tracing::{error, info};

use super::latency::{measure, MetricResult};
use super::{
    calculate_bus_factor, calculate_correctness, calculate_license_compatibility, calculate_ramp_up_time,
    calculate_responsiveness, clamp_unit,
};
use crate::config::MetricSettings;
use crate::error_handling::EvaluationError;
use crate::fetcher::RepoDataFetcher;
use crate::github::HostingTransport;
use crate::persistence::NetScoreRecord;
use crate::repo_cache::RepoCloner;
use crate::repo_details::RepoDetails;
use crate::url_utils::extract_owner_and_repo;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetScoreWeights {
    pub correctness: f64,
    pub bus_factor: f64,
    pub license: f64,
    pub responsiveness: f64,
    pub ramp_up: f64,
}

impl Default for NetScoreWeights {
    fn default() -> Self {
        Self {
            correctness: 0.2,
            bus_factor: 0.2,
            license: 0.1,
            responsiveness: 0.3,
            ramp_up: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct MetricScores {
    ramp_up: MetricResult<f64>,
    correctness: MetricResult<f64>,
    responsiveness: MetricResult<f64>,
    license: MetricResult<f64>,
    bus_factor: MetricResult<f64>,
}

impl NetScoreWeights {
    fn combine(&self, scores: &MetricScores) -> f64 {
        clamp_unit(
            self.correctness * scores.correctness.value
                + self.bus_factor * scores.bus_factor.value
                + self.license * scores.license.value
                + self.responsiveness * scores.responsiveness.value
                + self.ramp_up * scores.ramp_up.value,
        )
    }
}

/// Runs a filesystem-bound scorer off the async worker.
async fn blocking<F>(metric: &'static str, work: F) -> Result<f64, EvaluationError>
where
    F: FnOnce() -> f64 + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| EvaluationError::Scorer { metric, message: e.to_string() })
}

/// Fetch, clone, score and clean up one repository.
pub struct NetScoreAggregator<T, C> {
    fetcher: RepoDataFetcher<T>,
    cloner: C,
    metrics: MetricSettings,
    weights: NetScoreWeights,
}

impl<T: HostingTransport, C: RepoCloner> NetScoreAggregator<T, C> {
    pub fn new(fetcher: RepoDataFetcher<T>, cloner: C, metrics: MetricSettings) -> Self {
        Self {
            fetcher,
            cloner,
            metrics,
            weights: NetScoreWeights::default(),
        }
    }

    pub fn with_weights(mut self, weights: NetScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Evaluates a GitHub repository. The checkout is removed whether or not
    /// scoring succeeds; any failed stage means no record.
    pub async fn evaluate(&self, hosting_url: &str) -> Result<NetScoreRecord, EvaluationError> {
        let start = Instant::now();
        let repo_ref = extract_owner_and_repo(hosting_url)?;

        info!("Fetching GitHub repository data for {}/{}", repo_ref.owner, repo_ref.repo);
        let details = self.fetcher.fetch_repo_details(&repo_ref.owner, &repo_ref.repo).await?;
        let api_time = start.elapsed().as_secs_f64();

        let clone_start = Instant::now();
        let checkout = self.cloner.clone_repo(&repo_ref.hosting_url()).await?;
        let clone_time = clone_start.elapsed().as_secs_f64();
        info!("Repository cloned to {:?} in {:.3}s", checkout.local_path, clone_time);

        let scored = self.run_scorers(Arc::new(details), &checkout.local_path).await;

        info!("Removing cloned repository {}", checkout.full_name());
        let removed = self.cloner.remove(&checkout).await;
        if let Err(e) = &removed {
            error!("Failed to remove cloned repository {:?}: {}", checkout.local_path, e);
        }
        let scores = scored?;
        removed?;

        let net_score = self.weights.combine(&scores);
        let net_score_latency = start.elapsed().as_secs_f64();
        info!(
            "NetScore {:.3} for {} in {:.3}s",
            net_score, hosting_url, net_score_latency
        );

        // Clone-dependent scorers also waited on the clone.
        let ramp_up = scores.ramp_up.with_added_latency(api_time + clone_time);
        let correctness = scores.correctness.with_added_latency(api_time + clone_time);
        let bus_factor = scores.bus_factor.with_added_latency(api_time);
        let responsiveness = scores.responsiveness.with_added_latency(api_time);
        let license = scores.license.with_added_latency(api_time);

        Ok(NetScoreRecord {
            url: hosting_url.to_string(),
            net_score,
            net_score_latency,
            ramp_up: ramp_up.value,
            ramp_up_latency: ramp_up.latency_seconds,
            correctness: correctness.value,
            correctness_latency: correctness.latency_seconds,
            bus_factor: bus_factor.value,
            bus_factor_latency: bus_factor.latency_seconds,
            responsive_maintainer: responsiveness.value,
            responsive_maintainer_latency: responsiveness.latency_seconds,
            license: license.value,
            license_latency: license.latency_seconds,
        })
    }

    async fn run_scorers(&self, details: Arc<RepoDetails>, clone_path: &Path) -> Result<MetricScores, EvaluationError> {
        let ramp_up_path = clone_path.to_path_buf();
        let correctness_path = clone_path.to_path_buf();
        let correctness_details = Arc::clone(&details);
        let correctness_window = self.metrics.correctness_window_months;
        let responsiveness_window = self.metrics.responsiveness_window_months;

        let (ramp_up, correctness, responsiveness, license, bus_factor) = tokio::join!(
            measure(blocking("RampUp", move || calculate_ramp_up_time(&ramp_up_path))),
            measure(blocking("Correctness", move || {
                calculate_correctness(&correctness_details, &correctness_path, correctness_window)
            })),
            measure(async { calculate_responsiveness(&details, responsiveness_window) }),
            measure(async { calculate_license_compatibility(&details) }),
            measure(async { calculate_bus_factor(&details) }),
        );

        Ok(MetricScores {
            ramp_up: ramp_up.transpose()?,
            correctness: correctness.transpose()?,
            responsiveness,
            license,
            bus_factor,
        })
    }
}
