use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Deserializer};
use std::fmt;

/// Terminal outcome of a workflow run.
///
/// GitHub reports `null` while a run is still going, which maps to
/// `InProgress`. Values this tool does not know about are kept verbatim in
/// `Other` instead of failing the decode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ConclusionStatus {
    Cancelled,
    Success,
    Failure,
    #[default]
    InProgress,
    Other(String),
}

impl ConclusionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Cancelled => "cancelled",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::InProgress => "in_progress",
            Self::Other(raw) => raw,
        }
    }
}

impl From<Option<&str>> for ConclusionStatus {
    fn from(value: Option<&str>) -> Self {
        match value {
            None | Some("in_progress" | "inProgress") => Self::InProgress,
            Some("cancelled") => Self::Cancelled,
            Some("success") => Self::Success,
            Some("failure") => Self::Failure,
            Some(other) => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ConclusionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ConclusionStatus {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(Self::from(raw.as_deref()))
    }
}

/// A single GitHub Actions workflow run.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRun {
    /// Unique identifier for the workflow run
    pub id: u64,
    /// Name of the workflow
    #[serde(default)]
    pub name: Option<String>,
    /// Path to the workflow file
    #[serde(default)]
    pub path: Option<String>,
    /// Conclusion of the run (success, failure, etc.)
    #[serde(default)]
    pub conclusion: ConclusionStatus,
    /// When the run attempt started executing
    #[serde(default)]
    pub run_started_at: Option<DateTime<Utc>>,
    /// When the run was created
    pub created_at: DateTime<Utc>,
    /// When the run was last updated
    pub updated_at: DateTime<Utc>,
}

impl WorkflowRun {
    /// Start of the run, falling back to `created_at` for runs that predate
    /// the `run_started_at` field.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.run_started_at.unwrap_or(self.created_at)
    }

    /// Elapsed time between start and last update. Negative when the
    /// platform clocks disagree.
    pub fn duration(&self) -> TimeDelta {
        self.updated_at - self.started_at()
    }
}

/// One page of `GET /repos/{owner}/{repo}/actions/workflows/{id}/runs`.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRunsPage {
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub workflow_runs: Vec<WorkflowRun>,
}

/// A workflow definition as listed by `GET /repos/{owner}/{repo}/actions/workflows`.
#[derive(Debug, Clone, Deserialize)]
pub struct Workflow {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowsPage {
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub workflows: Vec<Workflow>,
}

/// Links for GitHub resources.
pub mod links {
    /// Generate URL for a workflow run.
    pub fn workflow_run_url(owner: &str, repo: &str, run_id: u64) -> String {
        format!("https://github.com/{owner}/{repo}/actions/runs/{run_id}")
    }
}
