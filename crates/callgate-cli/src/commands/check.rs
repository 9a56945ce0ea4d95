//! Check command implementation.

use anyhow::{bail, Context, Result};
use callgate_core::{declarative, Analyzer, CancellationToken, Config, Discovery, Rule};
use callgate_rules::rule_set;
use callgate_ts::TreeSitterAdapter;
use std::path::{Path, PathBuf};

use crate::config_resolver;
use crate::OutputFormat;

/// Rule set used when neither the CLI nor the config names one.
const DEFAULT_RULE_SET: &str = "android";

/// Arguments of `callgate check`.
#[derive(Debug, clap::Args)]
pub struct CheckArgs {
    /// Files or directories to analyze (default: `[analyzer] root`)
    pub paths: Vec<PathBuf>,

    /// Built-in rule set (overrides `rule_set` in config)
    #[arg(long)]
    pub rule_set: Option<String>,

    /// Extra `[[forbidden-call]]` definitions
    #[arg(long)]
    pub rules_file: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    pub format: OutputFormat,

    /// Exclude patterns (can be specified multiple times)
    #[arg(short, long)]
    pub exclude: Vec<String>,

    /// Worker threads (default: `[analyzer] parallelism`, else all cores)
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

/// Runs the check command. Returns `false` when findings reach the
/// configured `fail_on` severity or `cancel` fired before every file was
/// analyzed.
pub fn run(
    args: CheckArgs,
    explicit_config: Option<&Path>,
    cancel: &CancellationToken,
) -> Result<bool> {
    let project = config_resolver::project_dir(&args.paths);
    let loaded = config_resolver::load(&project, explicit_config)?;
    if let Some(source) = &loaded.source {
        tracing::debug!("Using config: {}", source.display());
    }
    let config = loaded.config;

    let rules = assemble_rules(
        args.rule_set.as_deref(),
        loaded.rules,
        args.rules_file.as_deref(),
        &config,
    )?;

    let adapter = TreeSitterAdapter::new();
    let mut builder = Analyzer::builder().rules(rules).adapter(adapter);
    if let Some(jobs) = args.jobs {
        builder = builder.parallelism(jobs);
    }
    let analyzer = builder
        .config(&config)
        .build()
        .context("Failed to build analyzer")?;

    let paths = if args.paths.is_empty() {
        vec![project.join(&config.analyzer.root)]
    } else {
        args.paths
    };

    let discovered = Discovery::new(analyzer.extensions())
        .exclude(config.analyzer.exclude.iter().chain(&args.exclude))
        .context("Invalid exclude pattern")?
        .respect_gitignore(config.analyzer.respect_gitignore)
        .collect(&paths)
        .context("Failed to collect source files")?;

    tracing::info!(
        "Analyzing {} file(s) with {} rule(s)",
        discovered.units.len(),
        analyzer.rule_count()
    );

    let mut report = analyzer.analyze_with(&discovered.units, cancel);
    report.record_failures(discovered.unreadable);
    super::output::print(&report, args.format, analyzer.registry())?;

    Ok(!report.was_cancelled() && !report.has_findings_at(config.fail_threshold()))
}

/// Combines the built-in rule set, config-defined rules and `--rules-file`,
/// then applies `[rules.<id>]` overrides.
fn assemble_rules(
    cli_rule_set: Option<&str>,
    config_rules: Vec<Rule>,
    rules_file: Option<&Path>,
    config: &Config,
) -> Result<Vec<Rule>> {
    let set_id = cli_rule_set
        .or(config.rule_set.as_deref())
        .unwrap_or(DEFAULT_RULE_SET);
    let Some(mut rules) = rule_set(set_id).context("Built-in rule set is invalid")? else {
        bail!("Unknown rule set `{set_id}` (see `callgate list-rules`)");
    };

    rules.extend(config_rules);
    if let Some(path) = rules_file {
        let extra = declarative::load_rules_from_file(path)
            .with_context(|| format!("Failed to load rules: {}", path.display()))?;
        tracing::debug!("Loaded {} rule(s) from {}", extra.len(), path.display());
        rules.extend(extra);
    }

    Ok(config.apply_overrides(rules))
}
