// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tunnel Editor - headless host for variable tunnel graphs
//!
//! Loads saved workflows, settles their Set/Get variable bindings the way
//! the interactive editor would, and reports or compiles the result.
//!
//! ## Architecture
//!
//! The node semantics live in `tunnel_editor_graph`; the host session,
//! refresh queue, history and settings live in this crate's library.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tunnel_editor_app::settings::SETTINGS_FILE_NAME;
use tunnel_editor_app::{EditorSession, EditorSettings, SessionError};
use tunnel_editor_graph::{Workflow, WorkflowError};

/// Command line interface
#[derive(Debug, Parser)]
#[command(name = "tunnel_editor")]
#[command(about = "Inspect and compile variable tunnel workflows")]
#[command(version)]
struct Cli {
    /// Settings file
    #[arg(long, default_value = SETTINGS_FILE_NAME)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load a workflow and report its variable bindings
    Check {
        /// Workflow file (.ron or .json)
        workflow: PathBuf,
    },
    /// List the variable names a workflow publishes
    Names {
        /// Workflow file (.ron or .json)
        workflow: PathBuf,
    },
    /// Compile a workflow into its executable graph
    Compile {
        /// Workflow file (.ron or .json)
        workflow: PathBuf,
        /// Write the JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Load, settle and save a workflow, converting by file extension
    Convert {
        /// Source workflow
        input: PathBuf,
        /// Destination workflow
        output: PathBuf,
    },
    /// Write the default settings file
    InitConfig,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("Failed to read settings: {0}")]
    Settings(std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0} consumer(s) resolve to no producer")]
    Unresolved(usize),
}

fn main() {
    let cli = Cli::parse();
    let settings = EditorSettings::load_or_default(&cli.config);

    let filter = settings
        .as_ref()
        .map_or("info", |settings| settings.log_filter.as_str());
    init_tracing(filter);

    let result = settings
        .map_err(CliError::Settings)
        .and_then(|settings| run(&cli, &settings));

    if let Err(e) = result {
        tracing::error!("{e}");
        process::exit(1);
    }
}

fn init_tracing(default_filter: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: &Cli, settings: &EditorSettings) -> Result<(), CliError> {
    match &cli.command {
        Command::Check { workflow } => {
            let session = open(workflow, settings)?;
            let unresolved = session.unresolved_consumers();
            for (node, name) in &unresolved {
                tracing::warn!(consumer = ?node, name = %name, "unresolved binding");
            }
            tracing::info!(
                "{} nodes, {} links, variables: [{}]",
                session.graph().node_count(),
                session.graph().link_count(),
                session.available_names().join(", ")
            );
            if unresolved.is_empty() {
                Ok(())
            } else {
                Err(CliError::Unresolved(unresolved.len()))
            }
        }
        Command::Names { workflow } => {
            let session = open(workflow, settings)?;
            for name in session.available_names() {
                println!("{name}");
            }
            Ok(())
        }
        Command::Compile { workflow, output } => {
            let session = open(workflow, settings)?;
            let compiled = session.compile()?;
            let json = compiled.to_json_pretty()?;
            match output {
                Some(path) => {
                    std::fs::write(path, json)?;
                    tracing::info!("Wrote {} nodes to {:?}", compiled.len(), path);
                }
                None => println!("{json}"),
            }
            Ok(())
        }
        Command::Convert { input, output } => {
            let session = open(input, settings)?;
            session.to_workflow().save(output)?;
            tracing::info!("Saved {:?}", output);
            Ok(())
        }
        Command::InitConfig => {
            settings.save(&cli.config)?;
            tracing::info!("Wrote settings to {:?}", cli.config);
            Ok(())
        }
    }
}

/// Load a workflow into a session and let it settle
fn open(path: &Path, settings: &EditorSettings) -> Result<EditorSession, CliError> {
    let workflow = Workflow::load(path)?;
    let mut session = EditorSession::new(settings);
    session.load_workflow(workflow);
    session.tick();
    Ok(session)
}
