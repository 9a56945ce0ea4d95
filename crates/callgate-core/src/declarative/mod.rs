//! Forbidden-call rules driven by TOML configuration.
//!
//! Rules are static data, not code. A new forbidden API is one more
//! `[[forbidden-call]]` table:
//!
//! ```toml
//! [[forbidden-call]]
//! id = "LogUsage"
//! title = "Log Usage"
//! severity = "error"
//! owner_type = "android.util.Log"
//! methods = ["i", "d", "e", "v", "w", "wtf"]
//! requires_receiver = true
//! message = "use HLog instead of Log.{method}()"
//! ```
//!
//! # Pipeline
//!
//! ```text
//! TOML text
//!   ↓ serde (DTO layer)
//! config_dto types
//!   ↓ validate + convert
//! Vec<Rule>
//! ```

pub mod config_dto;
pub mod loader;

/// Errors from parsing TOML and loading declarative rules.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum LoadRulesError {
    /// TOML deserialization failed.
    #[error("TOML parse error: {0}")]
    #[diagnostic(code(callgate::declarative::toml))]
    Toml(#[from] toml::de::Error),

    /// A rule definition is malformed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Load(#[from] loader::LoadError),
}

/// Parses TOML content and returns the rules it defines, in file order.
///
/// Returns `Ok(vec![])` if no `[[forbidden-call]]` tables are present.
///
/// # Errors
///
/// Returns an error if TOML parsing or rule validation fails.
pub fn load_rules_from_toml(content: &str) -> Result<Vec<crate::Rule>, LoadRulesError> {
    let dto: config_dto::DeclarativeConfigDto = toml::from_str(content)?;
    Ok(loader::load(dto)?)
}

/// Reads a TOML file and returns the rules it defines.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed or validated.
pub fn load_rules_from_file(
    path: &std::path::Path,
) -> Result<Vec<crate::Rule>, crate::config::ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| crate::config::ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    load_rules_from_toml(&content).map_err(|e| crate::config::ConfigError::Parse {
        message: format!("{}: {e}", path.display()),
    })
}
