//! Call-site matching.
//!
//! Pure functions: no I/O, no mutation, same answer for the same inputs.

use crate::adapter::{CallSite, OwnerType};
use crate::rule::Rule;

/// Outcome of evaluating one call site against one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// All predicates hold.
    Matched,
    /// The rule requires a receiver and the call has none.
    MissingReceiver,
    /// The method name is not in the rule's set.
    MethodMismatch,
    /// The owner type could not be resolved. Never reported.
    Unresolved,
    /// The owner type resolved to something the rule does not cover.
    OwnerMismatch,
}

impl MatchOutcome {
    /// Whether this outcome is a match.
    #[must_use]
    pub fn is_match(self) -> bool {
        self == Self::Matched
    }
}

/// Evaluates `call` against `rule`, explaining the result.
///
/// Checks run cheapest first: receiver, method name, then owner type.
/// An unresolved owner is a deliberate no-match so incomplete symbol
/// information yields false negatives rather than false positives.
#[must_use]
pub fn explain(call: &CallSite, rule: &Rule) -> MatchOutcome {
    if rule.requires_receiver() && !call.has_receiver() {
        return MatchOutcome::MissingReceiver;
    }
    if !rule.methods().contains(&call.method) {
        return MatchOutcome::MethodMismatch;
    }
    match &call.owner {
        OwnerType::Unresolved => MatchOutcome::Unresolved,
        OwnerType::Resolved(owner) if rule.owner().accepts(owner) => MatchOutcome::Matched,
        OwnerType::Resolved(_) => MatchOutcome::OwnerMismatch,
    }
}

/// Returns true iff `call` matches `rule`.
#[must_use]
pub fn evaluate(call: &CallSite, rule: &Rule) -> bool {
    explain(call, rule).is_match()
}
