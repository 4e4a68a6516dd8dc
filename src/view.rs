use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::Serialize;

use crate::models::{DoraMetric, Insight, OverallRating, PipelineRun, RunStatus, Severity, Stats};
use crate::session::SessionState;
use crate::stats::overall_dora_rating;

/// How many failures/insights the overview slices show.
const OVERVIEW_LIMIT: usize = 5;

/// Which data slice is visible. Pure view state; switching tabs never
/// touches the fetched data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Overview,
    Runs,
    Insights,
    Dora,
}

impl std::fmt::Display for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Overview => "overview",
            Self::Runs => "runs",
            Self::Insights => "insights",
            Self::Dora => "dora",
        };
        f.write_str(name)
    }
}

/// What the CLI renders: the selected tab's view plus any recovered error.
#[derive(Debug, Serialize)]
pub struct Snapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub view: TabView,
}

#[derive(Debug, Serialize)]
#[serde(tag = "tab", rename_all = "lowercase")]
pub enum TabView {
    Overview {
        stats: Stats,
        recent_failures: Vec<RunRow>,
        recent_insights: Vec<InsightCard>,
    },
    Runs {
        stats: Stats,
        rows: Vec<RunRow>,
    },
    Insights {
        cards: Vec<InsightCard>,
    },
    Dora {
        #[serde(skip_serializing_if = "Option::is_none")]
        panel: Option<DoraPanel>,
    },
}

#[derive(Debug, Serialize)]
pub struct RunRow {
    pub repository: String,
    pub branch: String,
    pub workflow: String,
    pub status: RunStatus,
    pub duration_seconds: u64,
    pub age: String,
}

#[derive(Debug, Serialize)]
pub struct InsightCard {
    pub title: String,
    pub severity: Severity,
    pub diagnosis: String,
    pub recommendation: String,
    pub confidence: u8,
    pub time_saved_minutes: u32,
    pub age: String,
}

#[derive(Debug, Serialize)]
pub struct DoraPanel {
    pub metrics: Vec<DoraCard>,
    pub period_days: u32,
    pub total_runs: u64,
    pub overall_rating: OverallRating,
}

#[derive(Debug, Serialize)]
pub struct DoraCard {
    pub metric: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub value: f64,
    pub unit: String,
    pub rating: crate::models::DoraRating,
}

/// Display copy for the four DORA cards, in presentation order.
const DORA_CARDS: [(&str, &str, &str); 4] = [
    (
        "deployment_frequency",
        "Deployment Frequency",
        "How often you deploy to production",
    ),
    (
        "change_failure_rate",
        "Change Failure Rate",
        "% of deployments causing failures",
    ),
    (
        "mean_time_to_recovery",
        "Mean Time to Recovery",
        "How long to recover from failures",
    ),
    ("lead_time", "Lead Time", "Time from commit to production"),
];

/// Project the session state into the currently selected tab's view.
/// The clock is passed in so this stays a pure function.
pub fn snapshot(state: &SessionState, now: DateTime<Utc>) -> Snapshot {
    Snapshot {
        error: state.error.clone(),
        view: build_tab(state, now),
    }
}

fn build_tab(state: &SessionState, now: DateTime<Utc>) -> TabView {
    match state.tab {
        Tab::Overview => TabView::Overview {
            stats: state.stats,
            recent_failures: state
                .runs
                .iter()
                .filter(|r| r.status == RunStatus::Failure)
                .take(OVERVIEW_LIMIT)
                .map(|r| run_row(r, now))
                .collect(),
            recent_insights: state
                .insights
                .iter()
                .take(OVERVIEW_LIMIT)
                .map(|i| insight_card(i, now))
                .collect(),
        },
        Tab::Runs => TabView::Runs {
            stats: state.stats,
            rows: state.runs.iter().map(|r| run_row(r, now)).collect(),
        },
        Tab::Insights => TabView::Insights {
            cards: state
                .insights
                .iter()
                .map(|i| insight_card(i, now))
                .collect(),
        },
        Tab::Dora => TabView::Dora {
            panel: state.dora.as_ref().map(|summary| {
                let metrics: [&DoraMetric; 4] = [
                    &summary.deployment_frequency,
                    &summary.change_failure_rate,
                    &summary.mean_time_to_recovery,
                    &summary.lead_time,
                ];
                DoraPanel {
                    metrics: DORA_CARDS
                        .iter()
                        .zip(metrics)
                        .map(|(&(metric, label, description), data)| DoraCard {
                            metric,
                            label,
                            description,
                            value: data.value,
                            unit: data.unit.clone(),
                            rating: data.rating,
                        })
                        .collect(),
                    period_days: summary.period_days,
                    total_runs: summary.total_runs,
                    overall_rating: overall_dora_rating(summary),
                }
            }),
        },
    }
}

fn run_row(run: &PipelineRun, now: DateTime<Utc>) -> RunRow {
    RunRow {
        repository: run.repo_full_name.clone(),
        branch: run.branch.clone(),
        workflow: run.workflow_name.clone(),
        status: run.status,
        duration_seconds: run.duration_seconds,
        age: time_ago(now, run.created_at),
    }
}

fn insight_card(insight: &Insight, now: DateTime<Utc>) -> InsightCard {
    InsightCard {
        title: insight.title.clone(),
        severity: insight.severity,
        diagnosis: insight.diagnosis.clone(),
        recommendation: insight.recommendation.clone(),
        confidence: insight.confidence,
        time_saved_minutes: insight.estimated_time_save_minutes,
        age: time_ago(now, insight.created_at),
    }
}

/// Relative age: seconds under a minute, then minutes, hours, days.
pub fn time_ago(now: DateTime<Utc>, then: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds().max(0);
    if seconds < 60 {
        format!("{seconds}s ago")
    } else if seconds < 3600 {
        format!("{}m ago", seconds / 60)
    } else if seconds < 86400 {
        format!("{}h ago", seconds / 3600)
    } else {
        format!("{}d ago", seconds / 86400)
    }
}
