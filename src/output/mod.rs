mod exports;
mod progress;
mod styling;
mod summary;
mod tables;

pub use exports::export_insights;
pub use progress::PhaseProgress;
pub use styling::{dim, magenta_bold};

/// Prints the `RunLens` banner to stderr.
///
/// Displays the tool name, version, and description at the start of execution.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🔍 RunLens"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("GitHub Actions Run Statistics")
    );
}
