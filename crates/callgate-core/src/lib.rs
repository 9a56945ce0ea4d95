//! # callgate-core
//!
//! Core framework for forbidden-API linting.
//!
//! The core never parses source itself. An [`AstAdapter`] turns each
//! [`SourceUnit`] into [`CallSite`]s; the [`Analyzer`] evaluates every call
//! against the rules in a [`RuleRegistry`] with the pure matcher in
//! [`matcher`], and a per-run [`Reporter`] collects deduplicated
//! [`Finding`]s. It includes:
//!
//! - [`Rule`]: declarative forbidden-call rule (owner type, method names, receiver flag)
//! - [`RuleRegistry`]: insertion-ordered rule set indexed by method name
//! - [`Analyzer`]: parallel driver with per-unit failure isolation
//! - [`declarative`]: `[[forbidden-call]]` TOML rule definitions
//! - [`Discovery`]: file discovery honouring `.gitignore` and exclude globs
//!
//! ## Example
//!
//! ```ignore
//! use callgate_core::{Analyzer, Rule, SourceUnit};
//!
//! let analyzer = Analyzer::builder()
//!     .rule(
//!         Rule::builder("LogUsage")
//!             .owner("android.util.Log")
//!             .methods(["d", "e"])
//!             .requires_receiver(true)
//!             .build()?,
//!     )
//!     .adapter(MyAdapter::new())
//!     .build()?;
//!
//! let report = analyzer.analyze(&[SourceUnit::from_path("app/src/Main.java")]);
//! for finding in &report.findings {
//!     println!("{finding}");
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod adapter;
mod analyzer;
mod cancel;
mod config;
mod discovery;
mod registry;
mod reporter;
mod rule;
mod types;

pub mod declarative;
pub mod matcher;

pub use adapter::{AstAdapter, CallSite, OwnerType, ParseError, SourceUnit};
pub use analyzer::{Analyzer, AnalyzerBuilder, AnalyzerError};
pub use cancel::CancellationToken;
pub use config::{AnalyzerConfig, Config, ConfigError, RuleConfig};
pub use discovery::{Discovered, Discovery, DiscoveryError};
pub use registry::{DuplicateRuleError, RuleRegistry};
pub use reporter::Reporter;
pub use rule::{
    MessageArgs, MessageTemplate, OwnerPredicate, Rule, RuleBuilder, RuleDefinitionError, RuleId,
};
pub use types::{
    AnalysisReport, Finding, FindingDiagnostic, Location, ParseFailure, Severity,
};
