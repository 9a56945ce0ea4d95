//! The AST adapter seam.
//!
//! The core never parses source text itself. An [`AstAdapter`] turns a
//! [`SourceUnit`] into the [`CallSite`]s it contains and resolves each call's
//! declaring owner type. Any conforming implementation works: a real
//! Tree-sitter parser, a fixture-driven stub, or a mock in tests.

use crate::types::Location;
use serde::Serialize;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// One file (or in-memory buffer) to analyze.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    path: PathBuf,
    content: Option<String>,
}

impl SourceUnit {
    /// A unit backed by a file on disk, read lazily by the driver.
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            content: None,
        }
    }

    /// A unit whose text is already in memory. `path` is used for reporting
    /// and for language detection.
    #[must_use]
    pub fn in_memory(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: Some(content.into()),
        }
    }

    /// Returns the unit's path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the file extension including the dot (e.g. `.kt`), or an empty string.
    #[must_use]
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default()
    }

    /// Returns the unit's size in bytes without reading its text.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file's metadata cannot be read.
    pub fn byte_len(&self) -> std::io::Result<u64> {
        match &self.content {
            Some(text) => Ok(text.len() as u64),
            None => std::fs::metadata(&self.path).map(|m| m.len()),
        }
    }

    /// Returns the unit's text, reading the file if necessary.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be read or is not UTF-8.
    pub fn read(&self) -> std::io::Result<Cow<'_, str>> {
        match &self.content {
            Some(text) => Ok(Cow::Borrowed(text)),
            None => std::fs::read_to_string(&self.path).map(Cow::Owned),
        }
    }
}

/// The declaring type of the method invoked at a call site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "type")]
pub enum OwnerType {
    /// Fully-qualified type name, e.g. `android.util.Log`.
    Resolved(String),
    /// Symbol resolution did not produce a type.
    Unresolved,
}

impl OwnerType {
    /// Returns the fully-qualified name, if resolved.
    #[must_use]
    pub fn as_resolved(&self) -> Option<&str> {
        match self {
            Self::Resolved(name) => Some(name),
            Self::Unresolved => None,
        }
    }
}

/// One method invocation found in source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallSite {
    /// Receiver expression text (`Log` in `Log.d(..)`), `None` for bare calls.
    pub receiver: Option<String>,
    /// Invoked method name.
    pub method: String,
    /// Declaring owner type as determined during traversal.
    pub owner: OwnerType,
    /// Where the call starts and how long it is.
    pub location: Location,
}

impl CallSite {
    /// Creates a call site with an explicit receiver.
    #[must_use]
    pub fn with_receiver(
        receiver: impl Into<String>,
        method: impl Into<String>,
        owner: OwnerType,
        location: Location,
    ) -> Self {
        Self {
            receiver: Some(receiver.into()),
            method: method.into(),
            owner,
            location,
        }
    }

    /// Creates a call site without a receiver.
    #[must_use]
    pub fn bare(method: impl Into<String>, owner: OwnerType, location: Location) -> Self {
        Self {
            receiver: None,
            method: method.into(),
            owner,
            location,
        }
    }

    /// Whether the call has an explicit receiver expression.
    #[must_use]
    pub fn has_receiver(&self) -> bool {
        self.receiver.is_some()
    }
}

/// Why an adapter could not produce call sites for a unit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Source is malformed.
    #[error("syntax error at {line}:{column}: {message}")]
    Syntax {
        /// 1-indexed line of the first error.
        line: usize,
        /// 1-indexed column of the first error.
        column: usize,
        /// What went wrong.
        message: String,
    },

    /// No adapter handles this file type.
    #[error("unsupported language for extension `{extension}`")]
    UnsupportedLanguage {
        /// The file extension, including the dot.
        extension: String,
    },

    /// The unit exceeds the configured size limit.
    #[error("file is {size} bytes, over the {limit} byte limit")]
    TooLarge {
        /// Actual size in bytes.
        size: usize,
        /// Configured limit in bytes.
        limit: usize,
    },

    /// The underlying parser gave up (e.g. it was interrupted).
    #[error("parser failed: {0}")]
    Parser(String),
}

impl ParseError {
    /// Returns the `(line, column)` of the error, if it has one.
    #[must_use]
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            Self::Syntax { line, column, .. } => Some((*line, *column)),
            _ => None,
        }
    }
}

/// Produces call sites from source units.
///
/// Implementations must be shareable across worker threads; the driver calls
/// [`traverse`](AstAdapter::traverse) for many units concurrently.
pub trait AstAdapter: Send + Sync {
    /// File extensions handled by this adapter (e.g. `&[".java"]`).
    fn extensions(&self) -> &[&'static str];

    /// Parses `source` (the text of `unit`) and returns every method call in it.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the unit cannot be parsed.
    fn traverse(&self, unit: &SourceUnit, source: &str) -> Result<Vec<CallSite>, ParseError>;

    /// Resolves the declaring owner type of `call`.
    ///
    /// The default trusts whatever [`traverse`](AstAdapter::traverse) recorded.
    fn resolve_owner_type(&self, call: &CallSite) -> OwnerType {
        call.owner.clone()
    }

    /// Whether this adapter handles `unit`.
    fn handles(&self, unit: &SourceUnit) -> bool {
        let ext = unit.extension();
        self.extensions().iter().any(|e| *e == ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_includes_dot() {
        assert_eq!(SourceUnit::from_path("a/B.kt").extension(), ".kt");
        assert_eq!(SourceUnit::from_path("Makefile").extension(), "");
    }

    #[test]
    fn in_memory_unit_reads_without_io() {
        let unit = SourceUnit::in_memory("does/not/Exist.java", "class A {}");
        assert_eq!(unit.read().unwrap(), "class A {}");
    }

    #[test]
    fn byte_len_uses_content_or_metadata() {
        assert_eq!(SourceUnit::in_memory("A.kt", "class A").byte_len().unwrap(), 7);
        assert!(SourceUnit::from_path("/no/such/A.kt").byte_len().is_err());
    }

    #[test]
    fn missing_file_read_fails() {
        let unit = SourceUnit::from_path("/definitely/not/here/Nope.java");
        assert!(unit.read().is_err());
    }

    #[test]
    fn owner_type_as_resolved() {
        assert_eq!(
            OwnerType::Resolved("android.util.Log".into()).as_resolved(),
            Some("android.util.Log")
        );
        assert_eq!(OwnerType::Unresolved.as_resolved(), None);
    }

    #[test]
    fn syntax_error_has_position() {
        let e = ParseError::Syntax {
            line: 4,
            column: 2,
            message: "unexpected `}`".into(),
        };
        assert_eq!(e.position(), Some((4, 2)));
        assert_eq!(ParseError::Parser("x".into()).position(), None);
    }
}
