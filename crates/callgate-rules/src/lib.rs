//! # callgate-rules
//!
//! Built-in forbidden-call rules for callgate.
//!
//! Rules here are plain data built with [`Rule::builder`]; they go through
//! the same registry and matcher as `[[forbidden-call]]` definitions.
//!
//! ## Available Rules
//!
//! | Id | Set | Severity | Description |
//! |----|-----|----------|-------------|
//! | `LogUsage` | `android` | error | Forbids `android.util.Log.{i,d,e,v,w,wtf}` in favour of the project wrapper |
//!
//! ## Usage
//!
//! ```ignore
//! use callgate_core::Analyzer;
//! use callgate_rules::RuleSet;
//!
//! let analyzer = Analyzer::builder()
//!     .rules(RuleSet::Android.rules()?)
//!     .adapter(TreeSitterAdapter::new())
//!     .build()?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod log_usage;
mod presets;

pub use presets::{all_rules, rule_set, RuleSet};

/// Re-export core types for convenience.
pub use callgate_core::{Rule, Severity};
