use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::Token;
use crate::error::{Result, RunLensError};

use super::pagination::RunPageSource;
use super::types::{Workflow, WorkflowRunsPage, WorkflowsPage};

const API_VERSION: &str = "2022-11-28";
const WORKFLOWS_PAGE_SIZE: u32 = 100;

/// GitHub REST API client for workflow and workflow run listings.
pub struct GitHubClient {
    /// HTTP client with auth and API headers preset
    client: Client,
    /// Base URL for the GitHub API, possibly with a path prefix such as `/api/v3`
    base_url: Url,
    /// Repository owner
    owner: String,
    /// Repository name
    repo: String,
}

impl GitHubClient {
    /// Create a new GitHub API client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - GitHub API base URL (e.g., <https://api.github.com>)
    /// * `owner` - Repository owner/organization
    /// * `repo` - Repository name
    /// * `token` - Bearer token sent with every request
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL or the token cannot be used.
    pub fn new(base_url: &str, owner: String, repo: String, token: &Token) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.as_str()))
            .map_err(|e| RunLensError::Config(format!("Invalid token: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .user_agent(concat!("runlens/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| RunLensError::Config(format!("Failed to create HTTP client: {e}")))?;

        let base_url = Url::parse(base_url)
            .map_err(|e| RunLensError::Config(format!("Invalid base URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(RunLensError::Config(format!(
                "Invalid base URL: {base_url} cannot carry a path"
            )));
        }

        Ok(Self {
            client,
            base_url,
            owner,
            repo,
        })
    }

    /// `{base}/repos/{owner}/{repo}/{suffix}` with owner and repo escaped as
    /// single path segments.
    fn repo_url(&self, suffix: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RunLensError::Config(format!("Invalid base URL: {}", self.base_url)))?
            .pop_if_empty()
            .push("repos")
            .push(&self.owner)
            .push(&self.repo)
            .extend(suffix.split('/'));
        Ok(url)
    }

    /// GET `url` and decode the JSON body.
    ///
    /// Non-2xx responses become [`RunLensError::ApiError`], unparseable
    /// bodies [`RunLensError::Decode`]. Nothing is retried.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!("GET {url}");

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(RunLensError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|source| RunLensError::Decode {
            url: url.to_string(),
            source,
        })
    }

    /// Fetch one page of runs for a workflow.
    pub async fn fetch_runs_page(
        &self,
        workflow_id: u64,
        per_page: u32,
        page: u32,
    ) -> Result<WorkflowRunsPage> {
        let mut url = self.repo_url(&format!("actions/workflows/{workflow_id}/runs"))?;
        url.query_pairs_mut()
            .append_pair("per_page", &per_page.to_string())
            .append_pair("page", &page.to_string());

        self.get_json(url).await
    }

    /// Fetch every workflow defined in the repository.
    pub async fn fetch_workflows(&self) -> Result<Vec<Workflow>> {
        let mut workflows = Vec::new();
        let mut page = 1;

        loop {
            let mut url = self.repo_url("actions/workflows")?;
            url.query_pairs_mut()
                .append_pair("per_page", &WORKFLOWS_PAGE_SIZE.to_string())
                .append_pair("page", &page.to_string());

            let response: WorkflowsPage = self.get_json(url).await?;
            let received = response.workflows.len();
            workflows.extend(response.workflows);

            let reached_total = response
                .total_count
                .is_some_and(|total| workflows.len() as u64 >= total);

            if received < WORKFLOWS_PAGE_SIZE as usize || reached_total {
                break;
            }

            page += 1;
        }

        Ok(workflows)
    }

    /// Run pages of a single workflow, as consumed by the pagination driver.
    pub fn workflow_runs(&self, workflow_id: u64) -> WorkflowRunPages<'_> {
        WorkflowRunPages {
            client: self,
            workflow_id,
        }
    }
}

/// [`RunPageSource`] over the runs of one workflow.
pub struct WorkflowRunPages<'a> {
    client: &'a GitHubClient,
    workflow_id: u64,
}

impl RunPageSource for WorkflowRunPages<'_> {
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<WorkflowRunsPage> {
        self.client
            .fetch_runs_page(self.workflow_id, per_page, page)
            .await
    }
}
