//! Core types for findings, parse failures and run reports.

use miette::{Diagnostic, SourceSpan};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Severity level for findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message, does not fail the run.
    Info,
    /// Warning that should be addressed.
    Warning,
    /// Error that must be fixed.
    Error,
}

impl Severity {
    /// Parses a lowercase severity name (`info`, `warning`, `error`).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "info" => Some(Self::Info),
            "warning" => Some(Self::Warning),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Source code location.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    /// File path as given to the analyzer.
    pub file: PathBuf,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
    /// Byte offset in file (for miette integration).
    pub offset: usize,
    /// Length of the span in bytes.
    pub length: usize,
}

impl Location {
    /// Creates a new location with explicit values.
    #[must_use]
    pub fn new(file: PathBuf, line: usize, column: usize) -> Self {
        Self {
            file,
            line,
            column,
            offset: 0,
            length: 0,
        }
    }

    /// Sets the byte offset and length for this location.
    #[must_use]
    pub fn with_span(mut self, offset: usize, length: usize) -> Self {
        self.offset = offset;
        self.length = length;
        self
    }
}

/// One reported rule violation.
///
/// Findings are values: once emitted by the reporter they are never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Identifier of the rule that matched (e.g., `LogUsage`).
    pub rule_id: String,
    /// Severity of the rule at the time of the run.
    pub severity: Severity,
    /// Location of the offending call site.
    pub location: Location,
    /// Message rendered from the rule's template.
    pub message: String,
}

impl Finding {
    /// Creates a new finding.
    #[must_use]
    pub fn new(
        rule_id: impl Into<String>,
        severity: Severity,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            severity,
            location,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{} [{}] {}: {}",
            self.location.file.display(),
            self.location.line,
            self.location.column,
            self.severity,
            self.rule_id,
            self.message
        )
    }
}

/// A source unit that could not be analyzed.
///
/// Parse failures are diagnostics distinct from findings: they never stop a
/// run, and they carry no rule id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseFailure {
    /// Path of the unit that failed.
    pub file: PathBuf,
    /// First error position, when the adapter reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Human-readable reason.
    pub message: String,
}

impl std::fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(loc) => write!(
                f,
                "{}:{}:{}: parse error: {}",
                self.file.display(),
                loc.line,
                loc.column,
                self.message
            ),
            None => write!(f, "{}: parse error: {}", self.file.display(), self.message),
        }
    }
}

/// Converts a [`Finding`] to a miette diagnostic for rich terminal display.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("[{rule_id}] {message}")]
pub struct FindingDiagnostic {
    rule_id: String,
    message: String,
    #[help]
    help: Option<String>,
    #[label("{label_message}")]
    span: SourceSpan,
    label_message: String,
}

impl FindingDiagnostic {
    /// Attaches a help line (usually the rule's description).
    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl From<&Finding> for FindingDiagnostic {
    fn from(f: &Finding) -> Self {
        Self {
            rule_id: f.rule_id.clone(),
            message: f.message.clone(),
            help: None,
            span: SourceSpan::from((f.location.offset, f.location.length)),
            label_message: f.severity.to_string(),
        }
    }
}

/// Result of one analysis run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Findings ordered by file path, then location, then rule id.
    pub findings: Vec<Finding>,
    /// Units that could not be analyzed, ordered by path.
    pub parse_failures: Vec<ParseFailure>,
    /// Number of units whose call sites were evaluated.
    pub units_analyzed: usize,
    /// Number of units never dispatched because the run was cancelled.
    #[serde(default)]
    pub units_skipped: usize,
}

impl AnalysisReport {
    /// Creates a new empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if there are any error-level findings.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Error)
    }

    /// Checks if any findings meet or exceed the given severity threshold.
    #[must_use]
    pub fn has_findings_at(&self, severity: Severity) -> bool {
        self.findings.iter().any(|f| f.severity >= severity)
    }

    /// Returns true if the run stopped dispatching units early.
    #[must_use]
    pub fn was_cancelled(&self) -> bool {
        self.units_skipped > 0
    }

    /// Adds failures found outside the driver (e.g. during discovery),
    /// keeping `parse_failures` ordered by path.
    pub fn record_failures(&mut self, failures: impl IntoIterator<Item = ParseFailure>) {
        self.parse_failures.extend(failures);
        self.parse_failures.sort_by(|a, b| a.file.cmp(&b.file));
    }

    /// Counts findings by severity as `(errors, warnings, infos)`.
    #[must_use]
    pub fn count_by_severity(&self) -> (usize, usize, usize) {
        let count = |s: Severity| self.findings.iter().filter(|f| f.severity == s).count();
        (
            count(Severity::Error),
            count(Severity::Warning),
            count(Severity::Info),
        )
    }

    /// Formats a one-line summary of the run.
    #[must_use]
    pub fn summary(&self) -> String {
        let (errors, warnings, infos) = self.count_by_severity();
        let mut line = format!(
            "Found {errors} error(s), {warnings} warning(s), {infos} info(s) in {} file(s)",
            self.units_analyzed
        );
        if !self.parse_failures.is_empty() {
            line.push_str(&format!(
                "; {} file(s) could not be analyzed",
                self.parse_failures.len()
            ));
        }
        if self.units_skipped > 0 {
            line.push_str(&format!("; cancelled with {} file(s) skipped", self.units_skipped));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_finding(severity: Severity) -> Finding {
        Finding::new(
            "LogUsage",
            severity,
            Location::new(PathBuf::from("app/src/Main.java"), 12, 9),
            "use HLog instead of Log.d",
        )
    }

    #[test]
    fn severity_is_ordered() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn severity_parse_accepts_lowercase_names_only() {
        assert_eq!(Severity::parse("warning"), Some(Severity::Warning));
        assert_eq!(Severity::parse("ERROR"), None);
    }

    #[test]
    fn finding_display_uses_line_format() {
        let f = make_finding(Severity::Error);
        assert_eq!(
            f.to_string(),
            "app/src/Main.java:12:9 [error] LogUsage: use HLog instead of Log.d"
        );
    }

    #[test]
    fn parse_failure_display_with_and_without_location() {
        let bare = ParseFailure {
            file: PathBuf::from("Broken.java"),
            location: None,
            message: "unsupported language".into(),
        };
        assert_eq!(bare.to_string(), "Broken.java: parse error: unsupported language");

        let located = ParseFailure {
            location: Some(Location::new(PathBuf::from("Broken.java"), 3, 5)),
            ..bare
        };
        assert!(located.to_string().starts_with("Broken.java:3:5: parse error"));
    }

    #[test]
    fn has_findings_at_respects_threshold() {
        let mut report = AnalysisReport::new();
        report.findings.push(make_finding(Severity::Warning));
        assert!(!report.has_errors());
        assert!(!report.has_findings_at(Severity::Error));
        assert!(report.has_findings_at(Severity::Warning));
        assert!(report.has_findings_at(Severity::Info));
    }

    #[test]
    fn summary_mentions_failures_and_cancellation() {
        let mut report = AnalysisReport::new();
        report.units_analyzed = 2;
        report.findings.push(make_finding(Severity::Error));
        report.parse_failures.push(ParseFailure {
            file: PathBuf::from("x.kt"),
            location: None,
            message: "syntax error".into(),
        });
        report.units_skipped = 4;

        let summary = report.summary();
        assert!(summary.contains("1 error(s)"));
        assert!(summary.contains("in 2 file(s)"));
        assert!(summary.contains("1 file(s) could not be analyzed"));
        assert!(summary.contains("4 file(s) skipped"));
        assert!(report.was_cancelled());
    }

    #[test]
    fn recorded_failures_stay_sorted() {
        let failure = |file: &str| ParseFailure {
            file: PathBuf::from(file),
            location: None,
            message: "unreadable".into(),
        };
        let mut report = AnalysisReport::new();
        report.parse_failures.push(failure("b/B.kt"));
        report.record_failures([failure("c/locked"), failure("a/locked")]);

        let files: Vec<_> = report.parse_failures.iter().map(|f| f.file.to_str()).collect();
        assert_eq!(files, [Some("a/locked"), Some("b/B.kt"), Some("c/locked")]);
    }
}
