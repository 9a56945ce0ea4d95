//! The rule registry.

use crate::rule::{Rule, RuleId};
use std::collections::HashMap;

/// Raised when two rules share an id. Fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
#[error("duplicate rule id `{id}`")]
#[diagnostic(
    code(callgate::registry::duplicate),
    help("rule ids must be unique across built-in rule sets and [[forbidden-call]] entries")
)]
pub struct DuplicateRuleError {
    /// The id that was registered twice.
    pub id: String,
}

/// Holds the active rules for the lifetime of the process.
///
/// Rules are kept in insertion order so reporting is deterministic, and are
/// indexed by method name so the driver only evaluates rules that can match.
/// There is no removal: once built, a registry is shared read-only.
#[derive(Debug, Default, Clone)]
pub struct RuleRegistry {
    rules: Vec<Rule>,
    ids: HashMap<RuleId, usize>,
    by_method: HashMap<String, Vec<usize>>,
}

impl RuleRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateRuleError`] if a rule with the same id exists.
    pub fn register(&mut self, rule: Rule) -> Result<(), DuplicateRuleError> {
        if self.ids.contains_key(rule.id()) {
            return Err(DuplicateRuleError {
                id: rule.id().to_string(),
            });
        }

        let index = self.rules.len();
        for method in rule.methods() {
            self.by_method.entry(method.clone()).or_default().push(index);
        }
        self.ids.insert(rule.id().clone(), index);
        self.rules.push(rule);
        Ok(())
    }

    /// Adds every rule, stopping at the first duplicate.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateRuleError`] on the first id collision.
    pub fn register_all<I>(&mut self, rules: I) -> Result<(), DuplicateRuleError>
    where
        I: IntoIterator<Item = Rule>,
    {
        for rule in rules {
            self.register(rule)?;
        }
        Ok(())
    }

    /// All registered rules in insertion order.
    #[must_use]
    pub fn active_rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Rules whose method set contains `method`, in insertion order.
    pub fn candidates<'a>(&'a self, method: &str) -> impl Iterator<Item = &'a Rule> + 'a {
        self.by_method
            .get(method)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(move |&i| &self.rules[i])
    }

    /// Looks a rule up by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Rule> {
        let id = RuleId::new(id).ok()?;
        self.ids.get(&id).map(|&i| &self.rules[i])
    }

    /// Number of registered rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rules are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: &str, owner: &str, methods: &[&str]) -> Rule {
        Rule::builder(id)
            .owner(owner)
            .methods(methods.iter().copied())
            .build()
            .unwrap()
    }

    #[test]
    fn register_preserves_insertion_order() {
        let mut registry = RuleRegistry::new();
        registry.register(rule("Zeta", "a.Z", &["z"])).unwrap();
        registry.register(rule("Alpha", "a.A", &["a"])).unwrap();

        let ids: Vec<&str> = registry
            .active_rules()
            .iter()
            .map(|r| r.id().as_str())
            .collect();
        assert_eq!(ids, ["Zeta", "Alpha"]);
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let mut registry = RuleRegistry::new();
        registry.register(rule("LogUsage", "android.util.Log", &["d"])).unwrap();
        let err = registry
            .register(rule("LogUsage", "other.Log", &["i"]))
            .unwrap_err();
        assert_eq!(err.id, "LogUsage");
        assert_eq!(registry.len(), 1);
        // The rejected rule must not leak into the method index.
        assert_eq!(registry.candidates("i").count(), 0);
    }

    #[test]
    fn candidates_are_indexed_by_method() {
        let mut registry = RuleRegistry::new();
        registry
            .register_all([
                rule("LogUsage", "android.util.Log", &["d", "e"]),
                rule("PrintUsage", "java.io.PrintStream", &["println"]),
                rule("TimberUsage", "timber.log.Timber", &["d"]),
            ])
            .unwrap();

        let for_d: Vec<&str> = registry.candidates("d").map(|r| r.id().as_str()).collect();
        assert_eq!(for_d, ["LogUsage", "TimberUsage"]);
        assert_eq!(registry.candidates("x").count(), 0);
    }

    #[test]
    fn get_by_id() {
        let mut registry = RuleRegistry::new();
        registry.register(rule("LogUsage", "android.util.Log", &["d"])).unwrap();
        assert!(registry.get("LogUsage").is_some());
        assert!(registry.get("Missing").is_none());
        assert!(registry.get("not an id").is_none());
    }
}
