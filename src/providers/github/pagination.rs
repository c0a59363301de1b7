use log::{debug, info};

use super::types::{WorkflowRun, WorkflowRunsPage};
use crate::error::Result;

/// Source of numbered run pages (1-based, offset pagination).
#[allow(async_fn_in_trait)]
pub trait RunPageSource {
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<WorkflowRunsPage>;
}

/// How many pages to request and how big each one is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Upper bound on the number of pages requested
    pub limit: u32,
    pub per_page: u32,
}

/// Runs gathered by [`collect_runs`], in fetch order.
#[derive(Debug, Default)]
pub struct CollectedRuns {
    pub runs: Vec<WorkflowRun>,
    pub pages_fetched: u32,
    /// Last `total_count` reported by the API, if any
    pub total_count: Option<u64>,
}

/// Fetches pages `1..=limit` one after another and concatenates their runs.
///
/// Stops before `limit` when a page comes back short or empty, or once the
/// API's `total_count` has been reached. The first failing page aborts the
/// whole collection.
pub async fn collect_runs<S: RunPageSource>(
    source: &S,
    pagination: Pagination,
) -> Result<CollectedRuns> {
    let mut collected = CollectedRuns::default();

    for page in 1..=pagination.limit {
        let response = source.fetch_page(page, pagination.per_page).await?;
        collected.pages_fetched = page;

        let received = response.workflow_runs.len();
        debug!("Page {page}: {received} runs");

        if response.total_count.is_some() {
            collected.total_count = response.total_count;
        }
        collected.runs.extend(response.workflow_runs);

        if received < pagination.per_page as usize {
            debug!("Page {page} was short, no more pages to fetch");
            break;
        }

        if let Some(total) = collected.total_count {
            if collected.runs.len() as u64 >= total {
                debug!("Collected all {total} runs reported by the API");
                break;
            }
        }
    }

    info!(
        "Collected {} runs across {} pages",
        collected.runs.len(),
        collected.pages_fetched
    );

    Ok(collected)
}
