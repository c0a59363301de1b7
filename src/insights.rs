use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct RunInsights {
    pub provider: String,
    pub repository: String,
    pub collected_at: DateTime<Utc>,
    pub total_runs: usize,
    pub workflows: Vec<WorkflowInsights>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workflows_without_runs: Vec<WorkflowRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRef {
    pub id: u64,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowInsights {
    pub workflow_id: u64,
    pub name: Option<String>,
    pub path: Option<String>,
    pub pages_fetched: u32,
    /// `total_count` as reported by the API, which may exceed `total_runs`
    pub reported_total_runs: Option<u64>,
    pub total_runs: usize,
    pub total_duration_seconds: f64,
    pub first_created_at: DateTime<Utc>,
    pub last_created_at: DateTime<Utc>,
    /// Time between the first and last run creation
    pub created_span_seconds: f64,
    pub statuses: Vec<StatusMetrics>,
    pub clock_skewed_runs: Vec<SkewedRun>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusMetrics {
    pub status: String,
    pub count: usize,
    pub percentage: f64,
    pub total_duration_seconds: f64,
    pub mean_duration_seconds: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkewedRun {
    pub run_id: u64,
    pub status: String,
    pub skew_seconds: f64,
    pub url: String,
}
