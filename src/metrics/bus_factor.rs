use tracing::debug;

use super::clamp_unit;
use crate::repo_details::RepoDetails;

/// Contributors below this share of all commits are ignored.
const OUTLIER_SHARE: f64 = 0.005;
/// Core contributors together account for this share of commits.
const CORE_SHARE: f64 = 0.8;
/// Fraction of contributors that must be "core" for a perfect score.
const TARGET_CORE_RATIO: f64 = 0.35;

pub fn calculate_bus_factor(details: &RepoDetails) -> f64 {
    let mut totals: Vec<u64> = details
        .contributors
        .iter()
        .map(|c| c.total_commits)
        .filter(|&n| n > 0)
        .collect();

    // A lone contributor is the single point of failure we are scoring against.
    if totals.len() <= 1 {
        debug!("Bus factor for {}/{}: {} active contributors", details.owner, details.repo, totals.len());
        return 0.0;
    }

    let all_commits: u64 = totals.iter().sum();
    totals.sort_unstable_by(|a, b| b.cmp(a));
    totals.retain(|&n| n as f64 >= OUTLIER_SHARE * all_commits as f64);
    if totals.len() <= 1 {
        debug!("Bus factor for {}/{}: one contributor left after dropping outliers", details.owner, details.repo);
        return 0.0;
    }

    let kept_commits: u64 = totals.iter().sum();
    let target = CORE_SHARE * kept_commits as f64;

    let mut running = 0u64;
    let mut core = 0usize;
    for n in &totals {
        running += n;
        core += 1;
        if running as f64 >= target {
            break;
        }
    }

    let score = core as f64 / (TARGET_CORE_RATIO * totals.len() as f64);
    debug!(
        "Bus factor for {}/{}: {} core of {} contributors",
        details.owner,
        details.repo,
        core,
        totals.len()
    );
    clamp_unit(score)
}
