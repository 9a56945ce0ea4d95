//! The analysis driver.

use crate::adapter::{AstAdapter, CallSite, ParseError, SourceUnit};
use crate::cancel::CancellationToken;
use crate::config::Config;
use crate::matcher::{explain, MatchOutcome};
use crate::registry::{DuplicateRuleError, RuleRegistry};
use crate::reporter::Reporter;
use crate::rule::Rule;
use crate::types::{AnalysisReport, Location, ParseFailure};

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

/// Errors that can occur while building an [`Analyzer`].
///
/// These are startup errors; nothing that happens while analyzing a unit
/// is surfaced through this type.
#[derive(Debug, Error, miette::Diagnostic)]
pub enum AnalyzerError {
    /// Two rules share an id.
    #[error(transparent)]
    #[diagnostic(transparent)]
    DuplicateRule(#[from] DuplicateRuleError),

    /// No AST adapter was registered.
    #[error("no AST adapter registered")]
    #[diagnostic(code(callgate::analyzer::no_adapter))]
    NoAdapter,

    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    #[diagnostic(code(callgate::analyzer::pool))]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Builder for configuring an [`Analyzer`].
pub struct AnalyzerBuilder {
    registry: RuleRegistry,
    pending: Vec<Rule>,
    adapters: Vec<Box<dyn AstAdapter>>,
    parallelism: Option<usize>,
    max_file_bytes: Option<usize>,
}

impl Default for AnalyzerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyzerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: RuleRegistry::new(),
            pending: Vec::new(),
            adapters: Vec::new(),
            parallelism: None,
            max_file_bytes: None,
        }
    }

    /// Starts from an already-populated registry.
    #[must_use]
    pub fn registry(mut self, registry: RuleRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Adds a rule. Duplicate ids are reported by [`build`](Self::build).
    #[must_use]
    pub fn rule(mut self, rule: Rule) -> Self {
        self.pending.push(rule);
        self
    }

    /// Adds several rules.
    #[must_use]
    pub fn rules<I>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = Rule>,
    {
        self.pending.extend(rules);
        self
    }

    /// Adds an AST adapter.
    #[must_use]
    pub fn adapter<A: AstAdapter + 'static>(mut self, adapter: A) -> Self {
        self.adapters.push(Box::new(adapter));
        self
    }

    /// Sets the worker pool size (default: available parallelism).
    #[must_use]
    pub fn parallelism(mut self, threads: usize) -> Self {
        self.parallelism = Some(threads);
        self
    }

    /// Sets the maximum unit size in bytes.
    #[must_use]
    pub fn max_file_bytes(mut self, limit: usize) -> Self {
        self.max_file_bytes = Some(limit);
        self
    }

    /// Takes `parallelism` and `max_file_bytes` from configuration,
    /// unless they were set explicitly.
    #[must_use]
    pub fn config(mut self, config: &Config) -> Self {
        if self.parallelism.is_none() {
            self.parallelism = config.analyzer.parallelism;
        }
        if self.max_file_bytes.is_none() {
            self.max_file_bytes = Some(config.analyzer.max_file_bytes);
        }
        self
    }

    /// Builds the analyzer.
    ///
    /// # Errors
    ///
    /// Returns an error on a duplicate rule id, when no adapter was added,
    /// or if the worker pool cannot be created.
    pub fn build(self) -> Result<Analyzer, AnalyzerError> {
        let mut registry = self.registry;
        registry.register_all(self.pending)?;

        if self.adapters.is_empty() {
            return Err(AnalyzerError::NoAdapter);
        }

        // 0 lets rayon size the pool to the available parallelism.
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.parallelism.unwrap_or(0))
            .thread_name(|i| format!("callgate-worker-{i}"))
            .build()?;

        Ok(Analyzer {
            registry,
            adapters: self.adapters,
            pool,
            max_file_bytes: self
                .max_file_bytes
                .unwrap_or(Config::default().analyzer.max_file_bytes),
        })
    }
}

enum UnitOutcome {
    Analyzed,
    Failed(ParseFailure),
    Skipped,
}

/// Drives call-site traversal, matching and reporting over source units.
///
/// Use [`Analyzer::builder()`] to construct an instance. Units are analyzed
/// in parallel on a dedicated worker pool; the only shared mutable state is
/// the per-run [`Reporter`].
pub struct Analyzer {
    registry: RuleRegistry,
    adapters: Vec<Box<dyn AstAdapter>>,
    pool: rayon::ThreadPool,
    max_file_bytes: usize,
}

impl Analyzer {
    /// Creates a new builder for configuring an analyzer.
    #[must_use]
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    /// Returns the active rules.
    #[must_use]
    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Returns the number of registered rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.registry.len()
    }

    /// File extensions handled by the registered adapters.
    #[must_use]
    pub fn extensions(&self) -> Vec<&'static str> {
        let mut exts: Vec<&'static str> = self
            .adapters
            .iter()
            .flat_map(|a| a.extensions().iter().copied())
            .collect();
        exts.sort_unstable();
        exts.dedup();
        exts
    }

    /// Analyzes `units` and returns the findings and parse failures.
    ///
    /// A unit that cannot be read or parsed is recorded as a
    /// [`ParseFailure`] and never aborts the run. Results are sorted, so
    /// the report does not depend on worker scheduling.
    #[must_use]
    pub fn analyze(&self, units: &[SourceUnit]) -> AnalysisReport {
        self.analyze_with(units, &CancellationToken::new())
    }

    /// Like [`analyze`](Self::analyze), stopping dispatch once `cancel` fires.
    ///
    /// The token only affects this run. Units already being analyzed finish
    /// and keep their findings; the rest are counted as skipped.
    #[must_use]
    pub fn analyze_with(&self, units: &[SourceUnit], cancel: &CancellationToken) -> AnalysisReport {
        info!(
            "Starting analysis of {} file(s) with {} rule(s)",
            units.len(),
            self.registry.len()
        );

        let reporter = Reporter::new();
        let outcomes: Vec<UnitOutcome> = self.pool.install(|| {
            units
                .par_iter()
                .map(|unit| self.analyze_unit(unit, &reporter, cancel))
                .collect()
        });

        let mut report = AnalysisReport::new();
        for outcome in outcomes {
            match outcome {
                UnitOutcome::Analyzed => report.units_analyzed += 1,
                UnitOutcome::Failed(failure) => report.parse_failures.push(failure),
                UnitOutcome::Skipped => report.units_skipped += 1,
            }
        }
        report.parse_failures.sort_by(|a, b| a.file.cmp(&b.file));
        report.findings = reporter.into_results();

        if report.units_skipped > 0 {
            warn!(
                "Analysis cancelled: {} file(s) not analyzed",
                report.units_skipped
            );
        }
        info!(
            "Analysis complete: {} finding(s) in {} file(s), {} parse failure(s)",
            report.findings.len(),
            report.units_analyzed,
            report.parse_failures.len()
        );

        report
    }

    fn analyze_unit(
        &self,
        unit: &SourceUnit,
        reporter: &Reporter,
        cancel: &CancellationToken,
    ) -> UnitOutcome {
        if cancel.is_cancelled() {
            return UnitOutcome::Skipped;
        }
        debug!("Analyzing: {}", unit.path().display());

        let Some(adapter) = self.adapters.iter().find(|a| a.handles(unit)) else {
            return fail(
                unit,
                &ParseError::UnsupportedLanguage {
                    extension: unit.extension(),
                },
            );
        };

        // Checked before reading so oversized files are never loaded.
        let size = match unit.byte_len() {
            Ok(size) => usize::try_from(size).unwrap_or(usize::MAX),
            Err(e) => return unreadable(unit, &e),
        };
        if size > self.max_file_bytes {
            return fail(
                unit,
                &ParseError::TooLarge {
                    size,
                    limit: self.max_file_bytes,
                },
            );
        }

        let source = match unit.read() {
            Ok(source) => source,
            Err(e) => return unreadable(unit, &e),
        };

        let calls = match adapter.traverse(unit, &source) {
            Ok(calls) => calls,
            Err(e) => return fail(unit, &e),
        };

        for call in calls {
            let owner = adapter.resolve_owner_type(&call);
            let call = CallSite { owner, ..call };
            self.match_call(&call, reporter);
        }

        UnitOutcome::Analyzed
    }

    fn match_call(&self, call: &CallSite, reporter: &Reporter) {
        for rule in self.registry.candidates(&call.method) {
            match explain(call, rule) {
                MatchOutcome::Matched => {
                    reporter.report(call, rule);
                }
                MatchOutcome::Unresolved => trace!(
                    "Unresolved owner for {}() at {}:{}, skipping {}",
                    call.method,
                    call.location.file.display(),
                    call.location.line,
                    rule.id()
                ),
                _ => {}
            }
        }
    }
}

fn unreadable(unit: &SourceUnit, error: &std::io::Error) -> UnitOutcome {
    warn!("Failed to read {}: {}", unit.path().display(), error);
    UnitOutcome::Failed(ParseFailure {
        file: unit.path().to_path_buf(),
        location: None,
        message: format!("unreadable: {error}"),
    })
}

fn fail(unit: &SourceUnit, error: &ParseError) -> UnitOutcome {
    warn!("Failed to parse {}: {}", unit.path().display(), error);
    let location = error
        .position()
        .map(|(line, column)| Location::new(unit.path().to_path_buf(), line, column));
    UnitOutcome::Failed(ParseFailure {
        file: unit.path().to_path_buf(),
        location,
        message: error.to_string(),
    })
}
