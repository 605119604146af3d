use chrono::{DateTime, Duration, Months, Utc};
use tracing::debug;

use super::clamp_unit;
use crate::repo_details::RepoDetails;

/// Commits per week at which the frequency term saturates.
const BASELINE_COMMITS_PER_WEEK: f64 = 10.0;

fn week() -> Duration {
    Duration::days(7)
}

/// Latest of the nominal window start, repository creation, and the oldest
/// entry, so young repositories are not penalised for weeks they did not exist.
fn window_start(
    details: &RepoDetails,
    window_months: u32,
    earliest: Option<DateTime<Utc>>,
) -> DateTime<Utc> {
    let nominal = details
        .fetched_at
        .checked_sub_months(Months::new(window_months))
        .unwrap_or(details.created_at);

    [Some(nominal), Some(details.created_at), earliest]
        .into_iter()
        .flatten()
        .max()
        .unwrap_or(nominal)
}

fn weeks_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let span = (end - start).num_milliseconds().max(0) as f64;
    (span / week().num_milliseconds() as f64).ceil().max(1.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResponsivenessBreakdown {
    pub closed_ratio: f64,
    pub timeliness: f64,
    pub commit_frequency: f64,
}

impl ResponsivenessBreakdown {
    pub fn score(&self) -> f64 {
        clamp_unit(0.5 * self.closed_ratio + 0.25 * self.timeliness + 0.25 * self.commit_frequency)
    }
}

pub fn responsiveness_breakdown(details: &RepoDetails, window_months: u32) -> ResponsivenessBreakdown {
    let earliest_issue = details.issues.iter().map(|i| i.created_at).min();
    let issue_start = window_start(details, window_months, earliest_issue);

    let opened: Vec<_> = details.issues.iter().filter(|i| i.created_at >= issue_start).collect();
    let closed: Vec<_> = opened.iter().filter(|i| i.is_closed()).collect();

    let (closed_ratio, timeliness) = if opened.is_empty() || closed.is_empty() {
        (0.0, 0.0)
    } else {
        let total_weeks_to_close: f64 = closed
            .iter()
            .map(|i| {
                let closed_at = i.closed_at.unwrap_or(details.fetched_at);
                (closed_at - i.created_at).num_milliseconds().max(0) as f64 / week().num_milliseconds() as f64
            })
            .sum();
        let mean_weeks_to_close = total_weeks_to_close / closed.len() as f64;
        let weeks = weeks_between(issue_start, details.fetched_at);

        (
            closed.len() as f64 / opened.len() as f64,
            clamp_unit((weeks - mean_weeks_to_close) / weeks),
        )
    };

    let earliest_commit = details.commits.iter().map(|c| c.date).min();
    let commit_start = window_start(details, window_months, earliest_commit);
    let commits_in_window = details.commits.iter().filter(|c| c.date >= commit_start).count();
    let commit_weeks = weeks_between(commit_start, details.fetched_at);
    let commit_frequency = clamp_unit((commits_in_window as f64 / commit_weeks) / BASELINE_COMMITS_PER_WEEK);

    ResponsivenessBreakdown {
        closed_ratio,
        timeliness,
        commit_frequency,
    }
}

pub fn calculate_responsiveness(details: &RepoDetails, window_months: u32) -> f64 {
    let breakdown = responsiveness_breakdown(details, window_months);
    debug!(
        "Responsiveness for {}/{}: closed={:.3} timeliness={:.3} commits={:.3}",
        details.owner, details.repo, breakdown.closed_ratio, breakdown.timeliness, breakdown.commit_frequency
    );
    breakdown.score()
}
