use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded execution of a CI/CD workflow. Read-only snapshot, never
/// mutated locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    pub id: String,
    pub repo_full_name: String,
    pub branch: String,
    pub status: RunStatus,
    pub workflow_name: String,
    pub commit_message: String,
    /// Missing on the wire means zero.
    #[serde(default)]
    pub duration_seconds: u64,
    pub created_at: DateTime<Utc>,
}

/// Final status of a pipeline run. Backends grow statuses over time, so
/// anything unrecognized lands on `Unknown` instead of failing the parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failure,
    Cancelled,
    #[serde(other)]
    Unknown,
}

/// An AI-generated diagnosis of a pipeline failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    pub id: String,
    pub title: String,
    pub severity: Severity,
    pub diagnosis: String,
    pub recommendation: String,
    /// 0-100.
    pub confidence: u8,
    pub estimated_time_save_minutes: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    #[serde(other)]
    Unknown,
}

/// The four delivery-performance metrics as computed by the backend.
/// Pass-through: values and ratings are never recomputed here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoraSummary {
    pub deployment_frequency: DoraMetric,
    pub change_failure_rate: DoraMetric,
    pub mean_time_to_recovery: DoraMetric,
    pub lead_time: DoraMetric,
    pub period_days: u32,
    pub total_runs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoraMetric {
    pub value: f64,
    pub unit: String,
    pub rating: DoraRating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoraRating {
    Elite,
    High,
    Medium,
    Low,
    #[serde(other)]
    Unknown,
}

/// Aggregate label derived from the four constituent ratings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OverallRating {
    Elite,
    Developing,
}

/// Summary statistics derived from the current run collection. Always a
/// pure function of that collection; recomputed wholesale on every fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total_runs: usize,
    /// Integer percentage in [0, 100]; 0 when there are no runs.
    pub success_rate: u32,
    pub failed_runs: usize,
    /// Rounded mean duration in seconds; 0 when there are no runs.
    pub avg_duration: u64,
}
