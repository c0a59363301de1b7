use chrono::{TimeDelta, Utc};
use log::{info, warn};

use crate::auth::Token;
use crate::error::{Result, RunLensError};
use crate::insights::{RunInsights, SkewedRun, StatusMetrics, WorkflowInsights, WorkflowRef};

use super::client::GitHubClient;
use super::pagination::{collect_runs, CollectedRuns, Pagination};
use super::run_metrics::{aggregate, RunAggregate};
use super::types::links;

/// Provider for collecting workflow run statistics from GitHub Actions.
pub struct GitHubProvider {
    /// GitHub API client
    client: GitHubClient,
    /// Repository owner
    owner: String,
    /// Repository name
    repo: String,
}

impl GitHubProvider {
    /// Create a new GitHub Actions provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be configured from
    /// `base_url` and `token`.
    pub fn new(base_url: &str, owner: String, repo: String, token: &Token) -> Result<Self> {
        let client = GitHubClient::new(base_url, owner.clone(), repo.clone(), token)?;

        Ok(Self {
            client,
            owner,
            repo,
        })
    }

    fn repository(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Collect statistics for a single workflow.
    ///
    /// # Errors
    ///
    /// Returns [`RunLensError::NoRuns`] when the workflow has no runs, and
    /// the first transport or decode error hit while paging.
    pub async fn collect_workflow_insights(
        &self,
        workflow_id: u64,
        pagination: Pagination,
    ) -> Result<RunInsights> {
        info!(
            "Collecting runs of workflow {workflow_id} in {}",
            self.repository()
        );

        let workflow = self.summarize_workflow(workflow_id, None, pagination).await?;

        Ok(RunInsights {
            provider: "GitHub Actions".to_string(),
            repository: self.repository(),
            collected_at: Utc::now(),
            total_runs: workflow.total_runs,
            workflows: vec![workflow],
            workflows_without_runs: vec![],
        })
    }

    /// Collect statistics for every workflow of the repository.
    ///
    /// Workflows without runs are listed separately instead of failing the
    /// whole collection.
    ///
    /// # Errors
    ///
    /// Returns [`RunLensError::NoRuns`] when no workflow has any runs, and
    /// the first transport or decode error.
    pub async fn collect_repository_insights(
        &self,
        pagination: Pagination,
    ) -> Result<RunInsights> {
        let workflows = self.client.fetch_workflows().await?;
        info!(
            "Found {} workflows in {}",
            workflows.len(),
            self.repository()
        );

        let mut summaries = Vec::new();
        let mut without_runs = Vec::new();

        for workflow in workflows {
            match self
                .summarize_workflow(workflow.id, Some(workflow.name.clone()), pagination)
                .await
            {
                Ok(mut summary) => {
                    if summary.path.is_none() {
                        summary.path = workflow.path;
                    }
                    summaries.push(summary);
                }
                Err(RunLensError::NoRuns) => {
                    warn!("Workflow {} ({}) has no runs", workflow.id, workflow.name);
                    without_runs.push(WorkflowRef {
                        id: workflow.id,
                        name: Some(workflow.name),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        if summaries.is_empty() {
            return Err(RunLensError::NoRuns);
        }

        Ok(RunInsights {
            provider: "GitHub Actions".to_string(),
            repository: self.repository(),
            collected_at: Utc::now(),
            total_runs: summaries.iter().map(|w| w.total_runs).sum(),
            workflows: summaries,
            workflows_without_runs: without_runs,
        })
    }

    async fn summarize_workflow(
        &self,
        workflow_id: u64,
        name: Option<String>,
        pagination: Pagination,
    ) -> Result<WorkflowInsights> {
        let collected = collect_runs(&self.client.workflow_runs(workflow_id), pagination).await?;
        let aggregate = aggregate(&collected.runs)?;

        Ok(self.to_workflow_insights(workflow_id, name, &collected, &aggregate))
    }

    fn to_workflow_insights(
        &self,
        workflow_id: u64,
        name: Option<String>,
        collected: &CollectedRuns,
        aggregate: &RunAggregate,
    ) -> WorkflowInsights {
        let first_run = collected.runs.first();

        let statuses = aggregate
            .per_status
            .iter()
            .map(|(status, stats)| StatusMetrics {
                status: status.to_string(),
                count: stats.count,
                percentage: percentage(stats.count, aggregate.total_count),
                total_duration_seconds: seconds(stats.total_duration),
                mean_duration_seconds: stats.mean_duration().map(seconds),
            })
            .collect();

        let clock_skewed_runs = aggregate
            .clock_skews
            .iter()
            .map(|skew| SkewedRun {
                run_id: skew.run_id,
                status: skew.status.to_string(),
                skew_seconds: seconds(skew.skew()),
                url: links::workflow_run_url(&self.owner, &self.repo, skew.run_id),
            })
            .collect();

        WorkflowInsights {
            workflow_id,
            name: name.or_else(|| first_run.and_then(|r| r.name.clone())),
            path: first_run.and_then(|r| r.path.clone()),
            pages_fetched: collected.pages_fetched,
            reported_total_runs: collected.total_count,
            total_runs: aggregate.total_count,
            total_duration_seconds: seconds(aggregate.total_duration),
            first_created_at: aggregate.first_created_at,
            last_created_at: aggregate.last_created_at,
            created_span_seconds: seconds(aggregate.created_span()),
            statuses,
            clock_skewed_runs,
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn seconds(duration: TimeDelta) -> f64 {
    duration.num_milliseconds() as f64 / 1000.0
}

fn percentage(part: usize, total: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let rate = (part as f64 / total.max(1) as f64) * 100.0;
    rate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_github_provider_creation() {
        let provider = GitHubProvider::new(
            "https://api.github.com",
            "owner".to_string(),
            "repo".to_string(),
            &Token::from("test-token"),
        )
        .unwrap();

        assert_eq!(provider.owner, "owner");
        assert_eq!(provider.repo, "repo");
        assert_eq!(provider.repository(), "owner/repo");
    }

    #[test]
    fn test_github_provider_invalid_base_url() {
        let result = GitHubProvider::new(
            "not a url",
            "owner".to_string(),
            "repo".to_string(),
            &Token::from("test-token"),
        );

        assert!(matches!(result, Err(RunLensError::Config(_))));
    }

    #[test]
    fn test_seconds_keeps_millisecond_precision() {
        assert!((seconds(TimeDelta::milliseconds(1500)) - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_percentage_of_empty_total_is_zero() {
        assert!(percentage(0, 0).abs() < f64::EPSILON);
        assert!((percentage(1, 4) - 25.0).abs() < f64::EPSILON);
    }
}
