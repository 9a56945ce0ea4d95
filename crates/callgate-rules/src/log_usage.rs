//! Rule forbidding direct use of `android.util.Log`.
//!
//! # Rationale
//!
//! Projects route logging through one wrapper (`HLog`) so that release
//! builds can strip or redirect output in a single place. Direct calls to
//! the platform logger bypass it.
//!
//! # Detected Patterns
//!
//! - `Log.i(..)`, `Log.d(..)`, `Log.e(..)`, `Log.v(..)`, `Log.w(..)`, `Log.wtf(..)`
//!   where `Log` resolves to `android.util.Log`
//! - `android.util.Log.d(..)` (fully-qualified receiver)
//!
//! # Not Detected
//!
//! - Receiver-less calls via static/member imports (`d(..)`)
//! - Other loggers with the same method names (e.g. `Timber.d`)
//! - Calls whose receiver cannot be resolved

use callgate_core::{Rule, RuleDefinitionError, Severity};

/// Rule id for log-usage.
pub const ID: &str = "LogUsage";

/// Declaring type the rule forbids.
pub const OWNER: &str = "android.util.Log";

/// Forbidden method names.
pub const METHODS: &[&str] = &["i", "d", "e", "v", "w", "wtf"];

/// Builds the `LogUsage` rule.
///
/// # Errors
///
/// Never fails for the built-in definition; the `Result` mirrors
/// [`Rule::builder`] validation.
pub fn rule() -> Result<Rule, RuleDefinitionError> {
    Rule::builder(ID)
        .title("Log Usage")
        .description("Please use the unified HLog wrapper instead of android.util.Log.")
        .severity(Severity::Error)
        .owner(OWNER)
        .methods(METHODS.iter().copied())
        .requires_receiver(true)
        .message("\u{21E2} use HLog instead of Log.{method}()")
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use callgate_core::matcher::evaluate;
    use callgate_core::{CallSite, Location, OwnerType};
    use std::path::PathBuf;

    fn call(receiver: Option<&str>, method: &str, owner: Option<&str>) -> CallSite {
        let owner = owner.map_or(OwnerType::Unresolved, |o| OwnerType::Resolved(o.into()));
        let loc = Location::new(PathBuf::from("MainActivity.java"), 10, 9);
        match receiver {
            Some(r) => CallSite::with_receiver(r, method, owner, loc),
            None => CallSite::bare(method, owner, loc),
        }
    }

    #[test]
    fn builds() {
        let rule = rule().unwrap();
        assert_eq!(rule.id().as_str(), ID);
        assert_eq!(rule.severity(), Severity::Error);
        assert_eq!(rule.methods().len(), METHODS.len());
    }

    #[test]
    fn every_forbidden_level_matches() {
        let rule = rule().unwrap();
        for method in METHODS {
            assert!(evaluate(&call(Some("Log"), method, Some(OWNER)), &rule), "{method}");
        }
    }

    #[test]
    fn other_methods_and_owners_do_not_match() {
        let rule = rule().unwrap();
        assert!(!evaluate(&call(Some("Log"), "isLoggable", Some(OWNER)), &rule));
        assert!(!evaluate(&call(Some("Timber"), "d", Some("timber.log.Timber")), &rule));
        assert!(!evaluate(&call(Some("Log"), "d", None), &rule));
        assert!(!evaluate(&call(None, "d", Some(OWNER)), &rule));
    }

    #[test]
    fn message_names_the_method() {
        let rule = rule().unwrap();
        let rendered = rule.message().render(&callgate_core::MessageArgs {
            method: "wtf",
            ..Default::default()
        });
        assert!(rendered.ends_with("Log.wtf()"));
    }
}
