use crate::models::{DoraRating, DoraSummary, OverallRating, PipelineRun, RunStatus, Stats};

/// How many of the four metric ratings must be elite for the overall
/// rating to be "Elite".
const ELITE_THRESHOLD: usize = 3;

/// Derive summary statistics from the full run collection.
///
/// Total over its input: zero runs yields all-zero stats rather than a
/// division error. Order-independent, so callers never need to sort first.
pub fn compute_stats(runs: &[PipelineRun]) -> Stats {
    let total_runs = runs.len();
    if total_runs == 0 {
        return Stats::default();
    }

    let successful = runs
        .iter()
        .filter(|r| r.status == RunStatus::Success)
        .count();
    let failed_runs = runs
        .iter()
        .filter(|r| r.status == RunStatus::Failure)
        .count();

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let success_rate = ((successful as f64 / total_runs as f64) * 100.0).round() as u32;

    let total_duration: u64 = runs.iter().map(|r| r.duration_seconds).sum();
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let avg_duration = (total_duration as f64 / total_runs as f64).round() as u64;

    Stats {
        total_runs,
        success_rate,
        failed_runs,
        avg_duration,
    }
}

/// Aggregate the four constituent ratings into the overall label.
/// Unrecognized ratings never count toward the threshold.
pub fn overall_dora_rating(summary: &DoraSummary) -> OverallRating {
    let elite = [
        &summary.deployment_frequency,
        &summary.change_failure_rate,
        &summary.mean_time_to_recovery,
        &summary.lead_time,
    ]
    .iter()
    .filter(|m| m.rating == DoraRating::Elite)
    .count();

    if elite >= ELITE_THRESHOLD {
        OverallRating::Elite
    } else {
        OverallRating::Developing
    }
}
