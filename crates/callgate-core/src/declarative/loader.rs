//! DTO → Rule conversion with validation.

use crate::rule::{Rule, RuleDefinitionError};
use crate::types::Severity;

use super::config_dto::{DeclarativeConfigDto, ForbiddenCallDto};

/// Errors during DTO → Rule conversion.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum LoadError {
    /// A rule failed validation.
    #[error("{context}: {source}")]
    #[diagnostic(code(callgate::declarative::invalid_rule))]
    Validation {
        /// Where the error occurred (e.g., "forbidden-call[0] 'LogUsage'").
        context: String,
        /// The underlying rule error.
        source: RuleDefinitionError,
    },

    /// The `owner_type` and `owner_types` fields are both set or both missing.
    #[error("{context}: exactly one of `owner_type` or `owner_types` must be set")]
    #[diagnostic(code(callgate::declarative::ambiguous_owner))]
    AmbiguousOwner {
        /// The rule that has the conflict.
        context: String,
    },

    /// Unknown severity string.
    #[error("{context}: unknown severity `{value}`, expected: error, warning, info")]
    #[diagnostic(code(callgate::declarative::severity))]
    UnknownSeverity {
        /// Where the error occurred.
        context: String,
        /// The invalid value.
        value: String,
    },
}

/// Converts a [`DeclarativeConfigDto`] to validated rules, in file order.
///
/// # Errors
///
/// Returns the first error encountered during conversion.
pub fn load(dto: DeclarativeConfigDto) -> Result<Vec<Rule>, LoadError> {
    dto.forbidden_call
        .into_iter()
        .enumerate()
        .map(|(i, d)| convert_forbidden_call(d, i))
        .collect()
}

fn convert_forbidden_call(dto: ForbiddenCallDto, index: usize) -> Result<Rule, LoadError> {
    let context = format!("forbidden-call[{index}] '{}'", dto.id);

    let owners = match (dto.owner_type, dto.owner_types) {
        (Some(single), None) => vec![single],
        (None, Some(many)) => many,
        _ => return Err(LoadError::AmbiguousOwner { context }),
    };

    let severity = parse_severity(&dto.severity, &context)?;

    let mut builder = Rule::builder(dto.id)
        .severity(severity)
        .methods(dto.methods)
        .requires_receiver(dto.requires_receiver);
    for owner in owners {
        builder = builder.owner(owner);
    }
    if let Some(title) = dto.title {
        builder = builder.title(title);
    }
    if let Some(description) = dto.description {
        builder = builder.description(description);
    }
    if let Some(message) = dto.message {
        builder = builder.message(message);
    }

    builder
        .build()
        .map_err(|source| LoadError::Validation { context, source })
}

fn parse_severity(value: &str, context: &str) -> Result<Severity, LoadError> {
    Severity::parse(value).ok_or_else(|| LoadError::UnknownSeverity {
        context: context.to_string(),
        value: value.to_string(),
    })
}
