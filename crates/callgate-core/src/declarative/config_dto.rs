//! TOML deserialization types (DTO layer).
//!
//! These types exist solely for serde deserialization.
//! They are converted to [`Rule`](crate::Rule)s via the loader.

use serde::Deserialize;

/// Raw TOML representation of declarative rules.
///
/// Lives alongside the base `Config` in the same file, under
/// `[[forbidden-call]]` array tables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeclarativeConfigDto {
    /// Forbidden-call rule definitions.
    #[serde(rename = "forbidden-call", default)]
    pub forbidden_call: Vec<ForbiddenCallDto>,
}

/// TOML representation of a forbidden-call rule.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForbiddenCallDto {
    /// Rule id (e.g., "LogUsage").
    pub id: String,
    /// Short title.
    #[serde(default)]
    pub title: Option<String>,
    /// Long explanation.
    #[serde(default)]
    pub description: Option<String>,
    /// Severity (default: "error").
    #[serde(default = "default_severity_str")]
    pub severity: String,
    /// Single owner type (mutually exclusive with `owner_types`).
    #[serde(default)]
    pub owner_type: Option<String>,
    /// Several owner types (mutually exclusive with `owner_type`).
    #[serde(default)]
    pub owner_types: Option<Vec<String>>,
    /// Forbidden method names.
    pub methods: Vec<String>,
    /// Whether the call must have an explicit receiver.
    #[serde(default)]
    pub requires_receiver: bool,
    /// Message template; `{method}`, `{owner}`, `{receiver}` are substituted.
    #[serde(default)]
    pub message: Option<String>,
}

fn default_severity_str() -> String {
    "error".to_string()
}
