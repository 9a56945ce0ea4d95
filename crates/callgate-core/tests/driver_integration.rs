//! Integration test: rules → registry → analyzer → report, driven by a
//! fixture adapter instead of a real parser.
//!
//! The fixture adapter maps each unit path to a canned list of calls (or a
//! parse error) and resolves owners through a receiver → type table, so the
//! same resolution seam a real adapter uses is exercised here.

use callgate_core::declarative;
use callgate_core::{
    Analyzer, AstAdapter, CallSite, CancellationToken, Location, OwnerType, ParseError,
    Severity, SourceUnit,
};
use std::collections::HashMap;
use std::path::PathBuf;

const RULES: &str = r#"
[[forbidden-call]]
id = "LogUsage"
title = "Log Usage"
description = "Please use the unified logging wrapper."
severity = "error"
owner_type = "android.util.Log"
methods = ["i", "d", "e", "v", "w", "wtf"]
requires_receiver = true
message = "use HLog instead of Log.{method}()"
"#;

#[derive(Default)]
struct FixtureAdapter {
    units: HashMap<PathBuf, Result<Vec<(String, String, usize)>, ParseError>>,
    symbols: HashMap<String, String>,
    cancel_on_traverse: Option<CancellationToken>,
}

impl FixtureAdapter {
    fn unit(mut self, path: &str, calls: &[(&str, &str, usize)]) -> Self {
        let calls = calls
            .iter()
            .map(|(r, m, l)| ((*r).to_string(), (*m).to_string(), *l))
            .collect();
        self.units.insert(PathBuf::from(path), Ok(calls));
        self
    }

    fn broken(mut self, path: &str) -> Self {
        self.units.insert(
            PathBuf::from(path),
            Err(ParseError::Syntax {
                line: 2,
                column: 7,
                message: "expected `;`".into(),
            }),
        );
        self
    }

    fn symbol(mut self, receiver: &str, owner: &str) -> Self {
        self.symbols.insert(receiver.into(), owner.into());
        self
    }

    /// Cancels `token` from inside every `traverse` call.
    fn cancelling(mut self, token: &CancellationToken) -> Self {
        self.cancel_on_traverse = Some(token.clone());
        self
    }
}

impl AstAdapter for FixtureAdapter {
    fn extensions(&self) -> &[&'static str] {
        &[".java"]
    }

    fn traverse(&self, unit: &SourceUnit, _source: &str) -> Result<Vec<CallSite>, ParseError> {
        if let Some(token) = &self.cancel_on_traverse {
            token.cancel();
        }
        let calls = self
            .units
            .get(unit.path())
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))?;
        Ok(calls
            .into_iter()
            .map(|(receiver, method, line)| {
                let loc = Location::new(unit.path().to_path_buf(), line, 9).with_span(line * 10, 5);
                if receiver.is_empty() {
                    CallSite::bare(method, OwnerType::Unresolved, loc)
                } else {
                    CallSite::with_receiver(receiver, method, OwnerType::Unresolved, loc)
                }
            })
            .collect())
    }

    fn resolve_owner_type(&self, call: &CallSite) -> OwnerType {
        call.receiver
            .as_ref()
            .and_then(|r| self.symbols.get(r))
            .map_or(OwnerType::Unresolved, |owner| OwnerType::Resolved(owner.clone()))
    }
}

fn android_log() -> FixtureAdapter {
    FixtureAdapter::default()
        .symbol("Log", "android.util.Log")
        .symbol("myLogger", "com.example.MyLogger")
}

fn analyzer(adapter: FixtureAdapter) -> Analyzer {
    analyzer_with_threads(adapter, 4)
}

fn analyzer_with_threads(adapter: FixtureAdapter, threads: usize) -> Analyzer {
    let rules = declarative::load_rules_from_toml(RULES).expect("fixture rules should load");
    Analyzer::builder()
        .rules(rules)
        .adapter(adapter)
        .parallelism(threads)
        .build()
        .expect("analyzer should build")
}

fn unit(path: &str) -> SourceUnit {
    SourceUnit::in_memory(path, "")
}

// ── Scenarios ──

#[test]
fn log_d_is_reported_as_error() {
    let analyzer = analyzer(android_log().unit("Main.java", &[("Log", "d", 5)]));
    let report = analyzer.analyze(&[unit("Main.java")]);

    assert_eq!(report.findings.len(), 1);
    let finding = &report.findings[0];
    assert_eq!(finding.rule_id, "LogUsage");
    assert_eq!(finding.severity, Severity::Error);
    assert_eq!(finding.location.line, 5);
    assert_eq!(finding.message, "use HLog instead of Log.d()");
    assert!(report.has_errors());
}

#[test]
fn custom_logger_is_not_reported() {
    let analyzer = analyzer(android_log().unit("Main.java", &[("myLogger", "d", 5)]));
    let report = analyzer.analyze(&[unit("Main.java")]);
    assert!(report.findings.is_empty());
    assert_eq!(report.units_analyzed, 1);
}

#[test]
fn method_outside_forbidden_set_is_not_reported() {
    let analyzer = analyzer(android_log().unit("Main.java", &[("Log", "x", 5)]));
    assert!(analyzer.analyze(&[unit("Main.java")]).findings.is_empty());
}

#[test]
fn unresolved_owner_is_not_reported() {
    let analyzer = analyzer(android_log().unit("Main.java", &[("Mystery", "d", 5)]));
    let report = analyzer.analyze(&[unit("Main.java")]);
    assert!(report.findings.is_empty());
    assert!(report.parse_failures.is_empty());
}

#[test]
fn bare_call_is_not_reported() {
    let analyzer = analyzer(android_log().unit("Main.java", &[("", "d", 5)]));
    assert!(analyzer.analyze(&[unit("Main.java")]).findings.is_empty());
}

#[test]
fn malformed_unit_is_isolated() {
    let analyzer = analyzer(
        android_log()
            .unit("Good.java", &[("Log", "e", 3)])
            .broken("Bad.java"),
    );
    let report = analyzer.analyze(&[unit("Bad.java"), unit("Good.java")]);

    assert_eq!(report.units_analyzed, 1);
    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].location.file, PathBuf::from("Good.java"));

    assert_eq!(report.parse_failures.len(), 1);
    let failure = &report.parse_failures[0];
    assert_eq!(failure.file, PathBuf::from("Bad.java"));
    let loc = failure.location.as_ref().expect("syntax errors carry a position");
    assert_eq!((loc.line, loc.column), (2, 7));
}

// ── Properties ──

#[test]
fn n_units_with_m_failures_yield_n_minus_m_analyzed() {
    let mut adapter = android_log();
    let mut units = Vec::new();
    for i in 0..20 {
        let path = format!("U{i:02}.java");
        adapter = if i % 4 == 0 {
            adapter.broken(&path)
        } else {
            adapter.unit(&path, &[("Log", "w", i + 1)])
        };
        units.push(unit(&path));
    }

    let report = analyzer(adapter).analyze(&units);
    assert_eq!(report.parse_failures.len(), 5);
    assert_eq!(report.units_analyzed, 15);
    assert_eq!(report.findings.len(), 15);
}

#[test]
fn duplicate_calls_at_same_location_are_reported_once() {
    let analyzer = analyzer(
        android_log().unit("Main.java", &[("Log", "d", 5), ("Log", "d", 5), ("Log", "i", 6)]),
    );
    let report = analyzer.analyze(&[unit("Main.java")]);
    assert_eq!(report.findings.len(), 2);
}

#[test]
fn repeated_runs_are_identical() {
    let mut adapter = android_log();
    let mut units = Vec::new();
    for i in 0..32 {
        let path = format!("pkg/F{}.java", 31 - i);
        adapter = adapter.unit(&path, &[("Log", "v", 3), ("Log", "wtf", 1), ("myLogger", "d", 2)]);
        units.push(unit(&path));
    }
    let analyzer = analyzer(adapter);

    let first = analyzer.analyze(&units);
    let second = analyzer.analyze(&units);
    assert_eq!(first, second);
    assert_eq!(first.findings.len(), 64);

    let mut sorted = first.findings.clone();
    sorted.sort_by(|a, b| {
        (&a.location.file, a.location.line, &a.rule_id).cmp(&(
            &b.location.file,
            b.location.line,
            &b.rule_id,
        ))
    });
    assert_eq!(first.findings, sorted);
}

#[test]
fn cancellation_before_run_skips_everything() {
    let analyzer = analyzer(android_log().unit("Main.java", &[("Log", "d", 1)]));
    let token = CancellationToken::new();
    token.cancel();

    let report = analyzer.analyze_with(&[unit("Main.java"), unit("Other.java")], &token);
    assert_eq!(report.units_skipped, 2);
    assert_eq!(report.units_analyzed, 0);
}

#[test]
fn cancellation_mid_run_keeps_in_flight_findings() {
    let token = CancellationToken::new();
    let mut adapter = android_log().cancelling(&token);
    let mut units = Vec::new();
    for i in 0..4 {
        let path = format!("C{i}.java");
        adapter = adapter.unit(&path, &[("Log", "d", i + 1)]);
        units.push(unit(&path));
    }
    let analyzer = analyzer_with_threads(adapter, 1);

    let report = analyzer.analyze_with(&units, &token);
    assert_eq!(report.units_analyzed, 1);
    assert_eq!(report.units_skipped, 3);
    assert_eq!(report.findings.len(), 1);
    assert!(report.parse_failures.is_empty());
    assert!(report.was_cancelled());

    // A later run gets its own token.
    let report = analyzer.analyze(&units);
    assert_eq!(report.units_analyzed, 4);
    assert_eq!(report.units_skipped, 0);
    assert_eq!(report.findings.len(), 4);
}

#[test]
fn duplicate_rule_ids_fail_startup() {
    let mut rules = declarative::load_rules_from_toml(RULES).unwrap();
    rules.extend(declarative::load_rules_from_toml(RULES).unwrap());
    let result = Analyzer::builder().rules(rules).adapter(android_log()).build();
    assert!(result.is_err());
}
