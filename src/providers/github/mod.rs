mod client;
mod pagination;
mod provider;
mod run_metrics;
mod types;


pub use pagination::Pagination;
pub use provider::GitHubProvider;
