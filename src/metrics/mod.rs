//! The five scorers and the aggregator that times and combines them.
//!
//! Every scorer maps a [`RepoDetails`](crate::repo_details::RepoDetails)
//! snapshot, and for two of them a checkout on disk, to a score in `[0, 1]`.
//! Scorers never mutate the snapshot; time windows are measured back from
//! `fetched_at`, so the same snapshot always yields the same scores.

pub mod bus_factor;
pub mod correctness;
pub mod latency;
pub mod license;
pub mod net_score;
pub mod ramp_up;
pub mod responsiveness;
pub mod walk;

pub use bus_factor::calculate_bus_factor;
pub use correctness::calculate_correctness;
pub use latency::{measure, MetricResult};
pub use license::calculate_license_compatibility;
pub use net_score::{NetScoreAggregator, NetScoreWeights};
pub use ramp_up::calculate_ramp_up_time;
pub use responsiveness::calculate_responsiveness;

pub(crate) fn clamp_unit(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
pub(crate) fn test_details() -> crate::repo_details::RepoDetails {
    use chrono::TimeZone;

    crate::repo_details::RepoDetails {
        owner: "owner".to_string(),
        repo: "repo".to_string(),
        created_at: chrono::Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap(),
        fetched_at: chrono::Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap(),
        stars: 100,
        forks: 50,
        open_issues: 100,
        license: "MIT".to_string(),
        commits: Vec::new(),
        issues: Vec::new(),
        contributors: Vec::new(),
    }
}
