//! Command dispatch

use std::io::{self, Write};
use std::path::PathBuf;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::services::{CheckOutcome, FixtureRequest, WriteStatus};
use crate::cli::args::{Cli, Commands, ConfigCommands, TreeArgs};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{self, Settings};
use crate::domain::Oracle;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    if let Commands::Completion { shell } = &cli.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let settings = Settings::load(cli.config.as_deref())?;
    let container = ServiceContainer::new(settings);

    match &cli.command {
        Commands::Generate {
            tree,
            output,
            stdout,
        } => cmd_generate(&container, tree, output.clone(), *stdout),
        Commands::Check { tree, output } => cmd_check(&container, tree, output.clone()),
        Commands::Show { tree } => cmd_show(&container, tree),
        Commands::Config { command } => cmd_config(&container, command, cli),
        Commands::Completion { .. } => Ok(()),
    }
}

/// Merge command-line overrides into the configured request.
fn build_request(
    settings: &Settings,
    tree: &TreeArgs,
    output: Option<PathBuf>,
) -> CliResult<FixtureRequest> {
    let kinds = if tree.kinds.is_empty() {
        settings.kinds.clone()
    } else {
        tree.kinds.clone()
    };

    let mut effective = settings.clone();
    effective.kinds = kinds;
    effective
        .validate()
        .map_err(|e| CliError::InvalidArgs(e.to_string()))?;

    Ok(FixtureRequest {
        tree: tree.tree.clone().unwrap_or_else(|| settings.tree.clone()),
        output: output.unwrap_or_else(|| settings.output.clone()),
        kinds: effective.kinds,
        template: settings.fixture.clone(),
    })
}

#[instrument(skip(container))]
fn cmd_generate(
    container: &ServiceContainer,
    tree: &TreeArgs,
    output: Option<PathBuf>,
    stdout: bool,
) -> CliResult<()> {
    let request = build_request(&container.settings, tree, output)?;
    debug!("request: {:?}", request);

    if stdout {
        let rendered = container.generator.render(&request)?;
        io::stdout()
            .lock()
            .write_all(rendered.text.as_bytes())
            .map_err(|e| InfraError::io("write fixture to stdout", e))?;
        return Ok(());
    }

    let report = container.generator.generate(&request)?;
    let verb = match report.status {
        WriteStatus::Created => "created",
        WriteStatus::Updated => "updated",
        WriteStatus::Unchanged => "unchanged",
    };
    output::success(&format!(
        "{} {} ({} nodes, {} checks, digest {})",
        verb,
        report.path.display(),
        report.rendered.node_count,
        report.rendered.oracles.len(),
        report.rendered.digest
    ));
    Ok(())
}

#[instrument(skip(container))]
fn cmd_check(
    container: &ServiceContainer,
    tree: &TreeArgs,
    output: Option<PathBuf>,
) -> CliResult<()> {
    let request = build_request(&container.settings, tree, output)?;
    match container.generator.check(&request)? {
        CheckOutcome::UpToDate => {
            output::success(&format!("{} is up to date", request.output.display()));
            Ok(())
        }
        CheckOutcome::Stale {
            expected_digest,
            actual_digest,
        } => {
            output::failure(&format!(
                "{} differs (on disk {}, expected {})",
                request.output.display(),
                actual_digest,
                expected_digest
            ));
            Err(CliError::Stale(request.output))
        }
        CheckOutcome::Missing => Err(CliError::Missing(request.output)),
    }
}

#[instrument(skip(container))]
fn cmd_show(container: &ServiceContainer, tree: &TreeArgs) -> CliResult<()> {
    let request = build_request(&container.settings, tree, None)?;
    let (arena, oracles) = container.generator.oracles(&request.tree, &request.kinds)?;

    output::header("Tree");
    output::info(&arena.to_display_tree());
    output::action("nodes", &arena.len());
    output::action("leaves", &arena.leaf_count());
    output::action("depth", &arena.depth());
    for Oracle { kind, tags } in &oracles {
        output::header(kind);
        output::detail(&tags.join(" "));
    }
    Ok(())
}

fn cmd_config(container: &ServiceContainer, command: &ConfigCommands, cli: &Cli) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&container.settings.to_toml()?);
        }
        ConfigCommands::Path => {
            match config::global_config_path() {
                Some(path) => output::action("global", &path.display()),
                None => output::warning("no global config directory on this platform"),
            }
            let project = cli
                .config
                .clone()
                .unwrap_or_else(|| config::project_config_path(std::path::Path::new(".")));
            output::action("project", &project.display());
        }
    }
    Ok(())
}
