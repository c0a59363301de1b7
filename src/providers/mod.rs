mod github;

pub use github::{GitHubProvider, Pagination};
