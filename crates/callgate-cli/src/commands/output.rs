//! Shared output formatting for analysis reports.
//!
//! Findings go to stdout; parse failures and the summary go to stderr.

use anyhow::Result;
use callgate_core::{AnalysisReport, FindingDiagnostic, RuleRegistry, Severity};
use miette::{NamedSource, Report};
use std::collections::HashMap;
use std::path::Path;

use crate::OutputFormat;

/// Print the report in the specified format.
pub fn print(report: &AnalysisReport, format: OutputFormat, registry: &RuleRegistry) -> Result<()> {
    match format {
        OutputFormat::Text => print_text(report),
        OutputFormat::Json => return print_json(report),
        OutputFormat::Pretty => print_pretty(report, registry),
    }
    Ok(())
}

fn print_text(report: &AnalysisReport) {
    for finding in &report.findings {
        println!("{finding}");
    }
    print_failures_and_summary(report);
}

fn print_json(report: &AnalysisReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{json}");
    Ok(())
}

fn print_pretty(report: &AnalysisReport, registry: &RuleRegistry) {
    let mut sources: HashMap<&Path, Option<String>> = HashMap::new();

    for finding in &report.findings {
        let file = finding.location.file.as_path();
        let text = sources
            .entry(file)
            .or_insert_with(|| std::fs::read_to_string(file).ok());

        let mut diagnostic = FindingDiagnostic::from(finding);
        if let Some(rule) = registry.get(&finding.rule_id) {
            if !rule.description().is_empty() {
                diagnostic = diagnostic.with_help(rule.description());
            }
        }

        match text {
            Some(text) => {
                let named = NamedSource::new(file.display().to_string(), text.clone());
                println!("{:?}", Report::new(diagnostic).with_source_code(named));
            }
            // Source vanished since analysis; fall back to the one-line form.
            None => println!("{finding}"),
        }
    }
    print_failures_and_summary(report);
}

fn print_failures_and_summary(report: &AnalysisReport) {
    for failure in &report.parse_failures {
        eprintln!("{failure}");
    }

    let (errors, warnings, _) = report.count_by_severity();
    let color = if errors > 0 {
        "\x1b[31m"
    } else if warnings > 0 {
        "\x1b[33m"
    } else {
        "\x1b[32m"
    };
    eprintln!("{color}{}\x1b[0m", report.summary());
}

/// Colored severity label for terminals.
#[must_use]
pub fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "\x1b[31merror\x1b[0m",
        Severity::Warning => "\x1b[33mwarning\x1b[0m",
        Severity::Info => "\x1b[34minfo\x1b[0m",
    }
}
