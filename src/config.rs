use clap::ValueEnum;
use std::path::PathBuf;
use url::Url;

use crate::auth::Token;
use crate::error::{Result, RunLensError};
use crate::providers::Pagination;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Largest `per_page` the GitHub REST API honours.
pub const MAX_PER_PAGE: u32 = 100;

/// Validated settings for one collection run.
///
/// Built from command-line arguments only; there is no config file or
/// environment fallback.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub api_url: String,
    pub owner: String,
    pub repository: String,
    pub token: Token,
    pub pagination: Pagination,
}

impl RunConfig {
    /// # Errors
    ///
    /// Returns [`RunLensError::Config`] for blank coordinates or token, an
    /// owner or repository with characters GitHub does not allow, a
    /// `limit` of zero, a `per_page` outside `1..=100`, or an API URL that is
    /// not an absolute http(s) URL.
    pub fn new(
        api_url: &str,
        owner: &str,
        repository: &str,
        token: &str,
        limit: u32,
        per_page: u32,
    ) -> Result<Self> {
        let url = Url::parse(api_url)
            .map_err(|e| RunLensError::Config(format!("Invalid API URL '{api_url}': {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(RunLensError::Config(format!(
                "API URL must use http or https, got '{}'",
                url.scheme()
            )));
        }

        let owner = path_segment("owner", owner)?;
        let repository = path_segment("repository", repository)?;

        let token = Token::from(token);
        if token.is_blank() {
            return Err(RunLensError::Config("token must not be empty".to_string()));
        }

        if limit == 0 {
            return Err(RunLensError::Config(
                "limit must be at least 1 page".to_string(),
            ));
        }

        if per_page == 0 || per_page > MAX_PER_PAGE {
            return Err(RunLensError::Config(format!(
                "perPage must be between 1 and {MAX_PER_PAGE}, got {per_page}"
            )));
        }

        Ok(Self {
            api_url: api_url.to_string(),
            owner,
            repository,
            token,
            pagination: Pagination { limit, per_page },
        })
    }
}

fn non_blank(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RunLensError::Config(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Owner and repository names end up in the request path, so only the
/// characters GitHub allows in them are accepted.
fn path_segment(field: &str, value: &str) -> Result<String> {
    let name = non_blank(field, value)?;
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.');

    if name == "." || name == ".." || !name.chars().all(allowed) {
        return Err(RunLensError::Config(format!(
            "{field} '{name}' may only contain letters, digits, '-', '_' and '.'"
        )));
    }
    Ok(name)
}

/// How the collected statistics are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Summary,
    Json,
    Csv,
}

#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Pretty-print JSON output
    pub pretty: bool,
    /// Write the report here instead of stdout
    pub path: Option<PathBuf>,
}
