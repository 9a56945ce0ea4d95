//! Locates and loads `callgate.toml`.
//!
//! Lookup order, first hit wins:
//!
//! 1. `--config <FILE>`
//! 2. `callgate.toml`, then `.callgate.toml`, in the project directory
//! 3. `config.toml` in `$CALLGATE_CONFIG_DIR`, else in `~/.callgate/`
//! 4. built-in defaults

use anyhow::{Context, Result};
use callgate_core::{declarative, Config, Rule};
use std::path::{Path, PathBuf};

/// Environment variable overriding the global config directory.
const GLOBAL_DIR_ENV: &str = "CALLGATE_CONFIG_DIR";

/// Project-level config file names, checked in order.
const PROJECT_CONFIG_NAMES: &[&str] = &["callgate.toml", ".callgate.toml"];

/// Config file name within the global config directory.
const GLOBAL_CONFIG_NAME: &str = "config.toml";

/// Where the configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// `--config` flag.
    Explicit(PathBuf),
    /// Project directory.
    Project(PathBuf),
    /// Global config directory.
    Global(PathBuf),
    /// Nothing found.
    Default,
}

impl ConfigSource {
    /// Returns the config file path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(p) | Self::Project(p) | Self::Global(p) => Some(p),
            Self::Default => None,
        }
    }
}

/// A loaded configuration together with the rules it defines.
#[derive(Debug, Default)]
pub struct Loaded {
    /// Parsed settings.
    pub config: Config,
    /// `[[forbidden-call]]` definitions from the same file.
    pub rules: Vec<Rule>,
    /// Where it came from.
    pub source: Option<PathBuf>,
}

/// Resolves the configuration file for `project_dir`.
#[must_use]
pub fn resolve(project_dir: &Path, explicit: Option<&Path>) -> ConfigSource {
    resolve_with(project_dir, explicit, global_config_dir())
}

/// Resolves and parses the configuration, including its rule definitions.
///
/// # Errors
///
/// Returns an error if the resolved file cannot be read or is malformed.
pub fn load(project_dir: &Path, explicit: Option<&Path>) -> Result<Loaded> {
    let source = resolve(project_dir, explicit);
    let Some(path) = source.path() else {
        tracing::debug!("No config file found, using defaults");
        return Ok(Loaded::default());
    };

    if matches!(source, ConfigSource::Global(_)) {
        tracing::info!("Using global config: {}", path.display());
    }
    let config = Config::from_file(path)
        .with_context(|| format!("Failed to load config: {}", path.display()))?;
    let rules = declarative::load_rules_from_file(path)
        .with_context(|| format!("Invalid [[forbidden-call]] in {}", path.display()))?;

    Ok(Loaded {
        config,
        rules,
        source: Some(path.to_path_buf()),
    })
}

/// Directory whose config applies to `paths`: the first path if it is a
/// directory, else its parent, else the current directory.
#[must_use]
pub fn project_dir(paths: &[PathBuf]) -> PathBuf {
    match paths.first() {
        Some(p) if p.is_dir() => p.clone(),
        Some(p) => p
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf),
        None => PathBuf::from("."),
    }
}

/// Global config directory: `$CALLGATE_CONFIG_DIR`, else `~/.callgate/`.
#[must_use]
pub fn global_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(GLOBAL_DIR_ENV) {
        return Some(PathBuf::from(dir));
    }
    home::home_dir().map(|h| h.join(".callgate"))
}

/// Takes `global_dir` explicitly so tests need not touch the environment.
fn resolve_with(
    project_dir: &Path,
    explicit: Option<&Path>,
    global_dir: Option<PathBuf>,
) -> ConfigSource {
    if let Some(p) = explicit {
        return ConfigSource::Explicit(p.to_path_buf());
    }

    if let Some(found) = PROJECT_CONFIG_NAMES
        .iter()
        .map(|name| project_dir.join(name))
        .find(|candidate| candidate.is_file())
    {
        tracing::debug!("Found project config: {}", found.display());
        return ConfigSource::Project(found);
    }

    match global_dir.map(|dir| dir.join(GLOBAL_CONFIG_NAME)) {
        Some(candidate) if candidate.is_file() => {
            tracing::debug!("Found global config: {}", candidate.display());
            ConfigSource::Global(candidate)
        }
        _ => ConfigSource::Default,
    }
}
