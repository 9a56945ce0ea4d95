//! callgate CLI tool.
//!
//! Usage:
//! ```bash
//! callgate check [OPTIONS] [PATHS]...
//! callgate list-rules [--rule-set ID]
//! callgate init [--force]
//! ```

use anyhow::Result;
use callgate_core::CancellationToken;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

/// Forbidden-call linter for Java and Kotlin sources
#[derive(Parser)]
#[command(name = "callgate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check sources for forbidden calls
    Check(commands::check::CheckArgs),

    /// List the rules of a built-in rule set
    ListRules {
        /// Rule set to list (default: every built-in set)
        #[arg(long)]
        rule_set: Option<String>,
    },

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

/// Output format for findings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// `path:line:col [severity] ruleId: message`, one finding per line.
    #[default]
    Text,
    /// The full analysis report as JSON.
    Json,
    /// Graphical diagnostics with source excerpts.
    Pretty,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check(args) => {
            let cancel = CancellationToken::new();
            install_interrupt_handler(&cancel);
            let clean = commands::check::run(args, cli.config.as_deref(), &cancel)?;
            Ok(if clean {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::ListRules { rule_set } => {
            commands::list_rules::run(rule_set.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Init { force } => {
            commands::init::run(force)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// First Ctrl-C stops dispatching files and reports what was analyzed;
/// a second one exits immediately.
fn install_interrupt_handler(cancel: &CancellationToken) {
    let token = cancel.clone();
    let installed = ctrlc::set_handler(move || {
        if token.is_cancelled() {
            std::process::exit(130);
        }
        eprintln!("Interrupted, finishing files in progress (Ctrl-C again to abort)");
        token.cancel();
    });
    if let Err(e) = installed {
        tracing::warn!("Failed to install Ctrl-C handler: {}", e);
    }
}
