use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use crate::config::{OutputConfig, OutputFormat, RunConfig, DEFAULT_API_URL};
use crate::insights::RunInsights;
use crate::output::{export_insights, PhaseProgress};
use crate::providers::GitHubProvider;

#[derive(Parser, Debug)]
#[command(name = "runlens")]
#[command(author, version, about = "GitHub Actions Run Statistics", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Write the report to this file instead of stdout
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,

    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Summary)]
    format: OutputFormat,

    /// GitHub REST API base URL
    #[arg(long, global = true, default_value = DEFAULT_API_URL)]
    api_url: String,
}

#[derive(Args, Debug)]
struct RepoArgs {
    /// GitHub access token
    #[arg(short, long)]
    token: String,

    /// Repository that contains the workflows
    #[arg(short, long)]
    repository: String,

    /// Owner of the repository
    #[arg(short, long)]
    owner: String,

    /// Maximum number of pages of runs to fetch per workflow
    #[arg(long)]
    limit: u32,

    /// Number of runs per page (at most 100)
    #[arg(long = "perPage")]
    per_page: u32,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Summarize the runs of a single workflow
    Workflow {
        /// Numeric id of the workflow
        #[arg(long = "workflowId")]
        workflow_id: u64,

        #[command(flatten)]
        repo: RepoArgs,
    },

    /// Summarize the runs of every workflow in the repository
    Actions {
        #[command(flatten)]
        repo: RepoArgs,
    },
}

impl Cli {
    fn run_config(&self, repo: &RepoArgs) -> Result<RunConfig> {
        let config = RunConfig::new(
            &self.api_url,
            &repo.owner,
            &repo.repository,
            &repo.token,
            repo.limit,
            repo.per_page,
        )?;
        Ok(config)
    }

    fn output_config(&self) -> OutputConfig {
        OutputConfig {
            format: self.format,
            pretty: self.pretty,
            path: self.output.clone(),
        }
    }

    async fn execute_workflow(&self, workflow_id: u64, repo: &RepoArgs) -> Result<()> {
        let config = self.run_config(repo)?;
        info!(
            "Fetching up to {} pages of {} runs",
            config.pagination.limit, config.pagination.per_page
        );

        let provider = GitHubProvider::new(
            &config.api_url,
            config.owner.clone(),
            config.repository.clone(),
            &config.token,
        )?;

        let progress = PhaseProgress::start(&format!("Fetching runs of workflow {workflow_id}"));
        let insights = match provider
            .collect_workflow_insights(workflow_id, config.pagination)
            .await
        {
            Ok(insights) => {
                progress.finish(&format!("Fetched {} runs", insights.total_runs));
                insights
            }
            Err(e) => {
                progress.abandon();
                return Err(e).with_context(|| {
                    format!("Failed to collect runs of workflow {workflow_id}")
                });
            }
        };

        self.write_report(&insights)
    }

    async fn execute_actions(&self, repo: &RepoArgs) -> Result<()> {
        let config = self.run_config(repo)?;
        info!(
            "Collecting runs of all workflows in {}/{}",
            config.owner, config.repository
        );

        let provider = GitHubProvider::new(
            &config.api_url,
            config.owner.clone(),
            config.repository.clone(),
            &config.token,
        )?;

        let progress = PhaseProgress::start("Fetching workflows and their runs");
        let insights = match provider
            .collect_repository_insights(config.pagination)
            .await
        {
            Ok(insights) => {
                progress.finish(&format!(
                    "Fetched {} runs across {} workflows",
                    insights.total_runs,
                    insights.workflows.len()
                ));
                insights
            }
            Err(e) => {
                progress.abandon();
                return Err(e).with_context(|| {
                    format!(
                        "Failed to collect workflow runs for {}/{}",
                        config.owner, config.repository
                    )
                });
            }
        };

        self.write_report(&insights)
    }

    fn write_report(&self, insights: &RunInsights) -> Result<()> {
        let output = self.output_config();

        if let Some(path) = &output.path {
            console::set_colors_enabled(false);
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            export_insights(insights, output.format, output.pretty, &mut writer)?;
            writer.flush()?;
            info!("Report written to: {}", path.display());
        } else {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            export_insights(insights, output.format, output.pretty, &mut handle)?;
        }

        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Workflow { workflow_id, repo } => {
                self.execute_workflow(*workflow_id, repo).await
            }
            Commands::Actions { repo } => self.execute_actions(repo).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    const WORKFLOW_ARGS: &[&str] = &[
        "runlens",
        "workflow",
        "--token",
        "ghp_x",
        "--workflowId",
        "161335",
        "--repository",
        "hello",
        "--owner",
        "octo",
        "--limit",
        "3",
        "--perPage",
        "50",
    ];

    #[test]
    fn test_parse_workflow_command() {
        let cli = Cli::try_parse_from(WORKFLOW_ARGS).unwrap();

        match &cli.command {
            Commands::Workflow { workflow_id, repo } => {
                assert_eq!(*workflow_id, 161_335);
                assert_eq!(repo.token, "ghp_x");
                assert_eq!(repo.repository, "hello");
                assert_eq!(repo.owner, "octo");
                assert_eq!(repo.limit, 3);
                assert_eq!(repo.per_page, 50);
            }
            Commands::Actions { .. } => panic!("expected workflow command"),
        }
        assert_eq!(cli.format, OutputFormat::Summary);
        assert_eq!(cli.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_parse_actions_command_with_short_flags() {
        let cli = Cli::try_parse_from([
            "runlens", "actions", "-t", "ghp_x", "-r", "hello", "-o", "octo", "--limit", "1",
            "--perPage", "100", "--format", "json", "--pretty",
        ])
        .unwrap();

        assert!(matches!(cli.command, Commands::Actions { .. }));
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.pretty);
    }

    #[test]
    fn test_every_flag_is_required() {
        // Drop each flag/value pair in turn
        for skip in (2..WORKFLOW_ARGS.len()).step_by(2) {
            let args: Vec<&str> = WORKFLOW_ARGS
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != skip && *i != skip + 1)
                .map(|(_, arg)| *arg)
                .collect();

            let err = Cli::try_parse_from(args).unwrap_err();
            assert_eq!(
                err.kind(),
                ErrorKind::MissingRequiredArgument,
                "missing {} should be a usage error",
                WORKFLOW_ARGS[skip]
            );
            assert_eq!(err.exit_code(), 2);
        }
    }

    #[test]
    fn test_actions_does_not_take_workflow_id() {
        let result = Cli::try_parse_from([
            "runlens", "actions", "-t", "x", "-r", "r", "-o", "o", "--limit", "1", "--perPage",
            "1", "--workflowId", "5",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_non_numeric_limit_rejected() {
        let mut args = WORKFLOW_ARGS.to_vec();
        args[11] = "many";
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_run_config_validation_errors_surface() {
        let mut args = WORKFLOW_ARGS.to_vec();
        args[13] = "500";
        let cli = Cli::try_parse_from(args).unwrap();
        let Commands::Workflow { repo, .. } = &cli.command else {
            panic!("expected workflow command");
        };

        let err = cli.run_config(repo).unwrap_err();
        assert!(err.to_string().contains("perPage"));
    }

    #[test]
    fn test_write_report_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        let mut args = WORKFLOW_ARGS.to_vec();
        let path_str = path.to_str().unwrap().to_string();
        args.extend(["--format", "json", "--output", path_str.as_str()]);
        let cli = Cli::try_parse_from(args).unwrap();

        let insights = RunInsights {
            provider: "GitHub Actions".to_string(),
            repository: "octo/hello".to_string(),
            collected_at: chrono::Utc::now(),
            total_runs: 0,
            workflows: vec![],
            workflows_without_runs: vec![],
        };
        cli.write_report(&insights).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"repository\":\"octo/hello\""));
    }
}
