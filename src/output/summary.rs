use std::fmt::Write;

use crate::insights::{RunInsights, WorkflowInsights};
use comfy_table::{Cell, Color as TableColor};

use super::styling::{bright, bright_red, bright_yellow, cyan, dim};
use super::tables::{color_coded_duration_cell, create_table, format_duration, status_cell};

/// Renders a human-readable summary of workflow run statistics.
///
/// Shows an overview of the repository, then for each workflow the run
/// count, creation window, total duration and a per-status table with
/// run count, share of runs and mean duration. Runs with clock skew and
/// workflows without any runs are listed at the end of their sections.
///
/// Durations are color coded: green up to 10 minutes, yellow up to 15,
/// red above.
pub fn render_summary(insights: &RunInsights) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "📊", "Overview");
    let _ = writeln!(
        output,
        "  {} {}\n  {} {}\n  {} {}\n  {} {}\n",
        dim("Repository:"),
        cyan(&insights.repository),
        dim("Workflows analyzed:"),
        bright_yellow(insights.workflows.len()),
        dim("Runs analyzed:"),
        bright_yellow(insights.total_runs),
        dim("Analysis date:"),
        dim(insights.collected_at.format("%Y-%m-%d %H:%M UTC"))
    );

    for workflow in &insights.workflows {
        render_workflow(&mut output, workflow);
    }

    if !insights.workflows_without_runs.is_empty() {
        add_section_header(&mut output, "🚫", "Workflows Without Runs");
        for workflow in &insights.workflows_without_runs {
            let _ = writeln!(
                output,
                "  {} {}",
                workflow.name.as_deref().unwrap_or("(unnamed)"),
                dim(format!("(id {})", workflow.id))
            );
        }
        output.push('\n');
    }

    output
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", bright(emoji), bright(title).underlined());
}

fn render_workflow(output: &mut String, workflow: &WorkflowInsights) {
    let title = format!(
        "Workflow: {} (id {})",
        workflow.name.as_deref().unwrap_or("(unnamed)"),
        workflow.workflow_id
    );
    add_section_header(output, "⚙️", &title);

    if let Some(path) = &workflow.path {
        let _ = writeln!(output, "  {} {}", dim("Path:"), cyan(path));
    }

    let reported = workflow
        .reported_total_runs
        .filter(|total| *total as usize != workflow.total_runs)
        .map(|total| format!(" {}", dim(format!("(API reports {total})"))))
        .unwrap_or_default();

    let _ = writeln!(
        output,
        "  {} {}{}\n  {} {}\n  {} {}\n  {} {}\n  {} {}\n  {} {}\n",
        dim("Runs:"),
        bright_yellow(workflow.total_runs),
        reported,
        dim("Pages fetched:"),
        bright_yellow(workflow.pages_fetched),
        dim("First run created:"),
        workflow.first_created_at.format("%Y-%m-%d %H:%M:%S UTC"),
        dim("Last run created:"),
        workflow.last_created_at.format("%Y-%m-%d %H:%M:%S UTC"),
        dim("Time span:"),
        format_duration(workflow.created_span_seconds),
        dim("Total duration:"),
        bright_yellow(format_duration(workflow.total_duration_seconds))
    );

    let mut table = create_table();
    table.set_header(
        ["Status", "Runs", "Share", "Mean Duration", "Total Duration"]
            .iter()
            .map(|label| Cell::new(*label).fg(TableColor::Cyan))
            .collect::<Vec<_>>(),
    );

    for status in &workflow.statuses {
        table.add_row(vec![
            status_cell(&status.status),
            Cell::new(status.count),
            Cell::new(format!("{:.1}%", status.percentage)),
            color_coded_duration_cell(status.mean_duration_seconds),
            Cell::new(format_duration(status.total_duration_seconds)),
        ]);
    }

    let _ = writeln!(output, "{table}\n");

    if !workflow.clock_skewed_runs.is_empty() {
        let _ = writeln!(
            output,
            "  {}",
            bright_red(format!(
                "⚠️  {} run(s) updated before they started, excluded from durations:",
                workflow.clock_skewed_runs.len()
            ))
        );
        for run in &workflow.clock_skewed_runs {
            let _ = writeln!(
                output,
                "    {} {} skewed by {} {}",
                dim(format!("#{}", run.run_id)),
                run.status,
                format_duration(run.skew_seconds),
                dim(&run.url)
            );
        }
        output.push('\n');
    }
}
