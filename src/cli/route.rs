//! CLI route: single route table and run context. Dispatches to the workspace
//! command service and presentation.

use crate::cli::parse::{Cli, Commands};
use crate::cli::presentation::{format_outcome_json, format_outcome_text, ReportStyle};
use crate::config::{ConfigLoader, HashDbConfig};
use crate::error::ApiError;
use crate::workspace::{CommandOutcome, RunFlags, Workspace, WorkspaceCommandService};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Report format selected with `--format`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(format: &str) -> Result<Self, ApiError> {
        match format {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(ApiError::InvalidArgument(format!(
                "unknown output format '{}' (must be 'text' or 'json')",
                other
            ))),
        }
    }
}

/// Runtime context for CLI execution: the opened workspace plus the flags
/// that shape every command.
pub struct RunContext {
    workspace: Workspace,
    flags: RunFlags,
    style: ReportStyle,
    format: OutputFormat,
}

impl RunContext {
    /// Load configuration (explicit file or layered sources) and open the root.
    pub fn new(root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = load_config(&root, config_path.as_deref())?;
        let style = ReportStyle {
            color: config.output.color,
            verbose_failures: config.output.verbose_failures,
        };
        let workspace = Workspace::open(&root, config)?;
        debug!(root = %workspace.root().display(), "Workspace opened");

        Ok(Self {
            workspace,
            flags: RunFlags::default(),
            style,
            format: OutputFormat::Text,
        })
    }

    /// Build from parsed arguments, applying report and dry-run flags.
    pub fn from_cli(cli: &Cli) -> Result<Self, ApiError> {
        let mut context = Self::new(cli.root.clone(), cli.config.clone())?;
        context.flags.pretend = cli.pretend;
        context.style.color &= !cli.no_color;
        context.style.verbose_failures |= cli.verbose_failures;
        context.format = OutputFormat::parse(&cli.format)?;
        Ok(context)
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<CommandOutcome, ApiError> {
        let started = Instant::now();
        let workspace = &self.workspace;
        let flags = self.flags;

        let outcome = match command {
            Commands::Init => WorkspaceCommandService::init(workspace, flags),
            Commands::Update => WorkspaceCommandService::update(workspace, flags),
            Commands::Status => WorkspaceCommandService::status(workspace),
            Commands::Verify { update_mtimes } => {
                WorkspaceCommandService::verify(workspace, *update_mtimes, flags)
            }
            Commands::Import { listings } => {
                WorkspaceCommandService::import(workspace, listings, flags)
            }
            Commands::Split { subdir } => WorkspaceCommandService::split(workspace, subdir, flags),
            Commands::Export { output } => {
                WorkspaceCommandService::export(workspace, output.as_deref(), flags)
            }
        }?;

        info!(
            command = command.name(),
            success = outcome.is_success(),
            failures = outcome.failures.len(),
            duration_ms = started.elapsed().as_millis(),
            "Command finished"
        );
        Ok(outcome)
    }

    /// Render an outcome in the selected format.
    pub fn render(&self, outcome: &CommandOutcome) -> Result<String, ApiError> {
        match self.format {
            OutputFormat::Text => Ok(format_outcome_text(outcome, &self.style)),
            OutputFormat::Json => format_outcome_json(outcome),
        }
    }
}

fn load_config(root: &Path, config_path: Option<&Path>) -> Result<HashDbConfig, ApiError> {
    let config = match config_path {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load(root)?,
    };
    Ok(config)
}
