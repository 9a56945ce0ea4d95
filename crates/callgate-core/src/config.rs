//! Configuration types for callgate.

use crate::rule::Rule;
use crate::types::Severity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Top-level configuration for callgate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Built-in rule set to start from (e.g., "android").
    #[serde(default)]
    pub rule_set: Option<String>,

    /// Severity threshold for a failing exit (default: "error").
    #[serde(default)]
    pub fail_on: Option<Severity>,

    /// Analyzer configuration.
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// Per-rule overrides, keyed by rule id.
    #[serde(default)]
    pub rules: HashMap<String, RuleConfig>,
}

impl Config {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// Unknown top-level tables (such as `[[forbidden-call]]`) are ignored
    /// here; they are read by [`crate::declarative`].
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Checks if a rule is enabled.
    #[must_use]
    pub fn is_rule_enabled(&self, rule_id: &str) -> bool {
        self.rules
            .get(rule_id)
            .map_or(true, |c| c.enabled.unwrap_or(true))
    }

    /// Gets the severity override for a rule.
    #[must_use]
    pub fn rule_severity(&self, rule_id: &str) -> Option<Severity> {
        self.rules.get(rule_id).and_then(|c| c.severity)
    }

    /// Severity at or above which the run fails.
    #[must_use]
    pub fn fail_threshold(&self) -> Severity {
        self.fail_on.unwrap_or(Severity::Error)
    }

    /// Drops disabled rules and applies severity overrides.
    #[must_use]
    pub fn apply_overrides(&self, rules: Vec<Rule>) -> Vec<Rule> {
        rules
            .into_iter()
            .filter(|r| {
                let enabled = self.is_rule_enabled(r.id().as_str());
                if !enabled {
                    tracing::debug!("Skipping disabled rule: {}", r.id());
                }
                enabled
            })
            .map(|r| match self.rule_severity(r.id().as_str()) {
                Some(severity) => r.with_severity(severity),
                None => r,
            })
            .collect()
    }
}

/// Analyzer-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Root directory to analyze when no paths are given (default: current directory).
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Glob patterns to exclude from discovery.
    #[serde(default = "default_excludes")]
    pub exclude: Vec<String>,

    /// Whether to respect .gitignore files.
    #[serde(default = "default_true")]
    pub respect_gitignore: bool,

    /// Worker pool size (default: available parallelism).
    #[serde(default)]
    pub parallelism: Option<usize>,

    /// Units larger than this are reported as parse failures instead of parsed.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            exclude: default_excludes(),
            respect_gitignore: true,
            parallelism: None,
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_excludes() -> Vec<String> {
    vec!["**/build/**".to_string(), "**/generated/**".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_max_file_bytes() -> usize {
    4 * 1024 * 1024
}

/// Per-rule configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Whether this rule is enabled.
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Severity override for this rule.
    #[serde(default)]
    pub severity: Option<Severity>,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file {path}: {source}")]
    #[diagnostic(code(callgate::config::io))]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("Failed to parse config: {message}")]
    #[diagnostic(code(callgate::config::parse))]
    Parse {
        /// Parse error message.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: &str) -> Rule {
        Rule::builder(id)
            .owner("android.util.Log")
            .methods(["d"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.analyzer.respect_gitignore);
        assert!(config.rules.is_empty());
        assert_eq!(config.fail_threshold(), Severity::Error);
        assert_eq!(config.analyzer.max_file_bytes, 4 * 1024 * 1024);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
rule_set = "android"
fail_on = "warning"

[analyzer]
root = "./app"
exclude = ["**/generated/**"]
parallelism = 2

[rules.LogUsage]
enabled = true
severity = "warning"

[[forbidden-call]]
id = "Ignored"
"#;

        let config = Config::parse(toml).expect("Failed to parse");
        assert_eq!(config.rule_set.as_deref(), Some("android"));
        assert_eq!(config.fail_threshold(), Severity::Warning);
        assert_eq!(config.analyzer.root, PathBuf::from("./app"));
        assert_eq!(config.analyzer.parallelism, Some(2));
        assert!(config.is_rule_enabled("LogUsage"));
        assert_eq!(config.rule_severity("LogUsage"), Some(Severity::Warning));
    }

    #[test]
    fn test_parse_rejects_bad_severity() {
        let err = Config::parse("[rules.LogUsage]\nseverity = \"fatal\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn apply_overrides_filters_and_rewrites() {
        let config = Config::parse(
            r#"
[rules.Off]
enabled = false

[rules.Soft]
severity = "info"
"#,
        )
        .unwrap();

        let rules = config.apply_overrides(vec![rule("Off"), rule("Soft"), rule("Kept")]);
        let summary: Vec<(&str, Severity)> = rules
            .iter()
            .map(|r| (r.id().as_str(), r.severity()))
            .collect();
        assert_eq!(
            summary,
            [("Soft", Severity::Info), ("Kept", Severity::Error)]
        );
    }
}
