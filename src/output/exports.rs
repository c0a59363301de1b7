use std::io::Write;

use crate::config::OutputFormat;
use crate::error::Result;
use crate::insights::RunInsights;

use super::summary::render_summary;

/// Writes the collected statistics in the requested format.
///
/// - Summary: human-readable tables
/// - JSON: programmatic access, compact unless `pretty`
/// - CSV: one row per workflow and conclusion status
///
/// # Errors
///
/// Returns [`crate::error::RunLensError::Io`] when `output` cannot be
/// written to.
pub fn export_insights(
    insights: &RunInsights,
    format: OutputFormat,
    pretty: bool,
    output: &mut dyn Write,
) -> Result<()> {
    match format {
        OutputFormat::Summary => {
            write!(output, "{}", render_summary(insights))?;
            Ok(())
        }
        OutputFormat::Json => export_json(insights, pretty, output),
        OutputFormat::Csv => export_csv(insights, output),
    }
}

fn export_json(insights: &RunInsights, pretty: bool, output: &mut dyn Write) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(insights)?
    } else {
        serde_json::to_string(insights)?
    };
    writeln!(output, "{json}")?;
    Ok(())
}

fn export_csv(insights: &RunInsights, output: &mut dyn Write) -> Result<()> {
    writeln!(output, "Workflow ID,Workflow,Path,Status,Runs,Percentage,Mean Duration (s),Total Duration (s),First Created,Last Created")?;

    for workflow in &insights.workflows {
        for status in &workflow.statuses {
            writeln!(
                output,
                "{},{},{},{},{},{:.1},{},{:.1},{},{}",
                workflow.workflow_id,
                csv_quote(workflow.name.as_deref().unwrap_or("")),
                csv_quote(workflow.path.as_deref().unwrap_or("")),
                csv_quote(&status.status),
                status.count,
                status.percentage,
                status
                    .mean_duration_seconds
                    .map(|mean| format!("{mean:.1}"))
                    .unwrap_or_default(),
                status.total_duration_seconds,
                workflow.first_created_at.to_rfc3339(),
                workflow.last_created_at.to_rfc3339()
            )?;
        }
    }

    Ok(())
}

fn csv_quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}
