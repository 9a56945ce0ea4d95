//! Built-in rule sets, selectable by identifier.

use callgate_core::{Rule, RuleDefinitionError};

/// Built-in rule sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSet {
    /// Android project rules (`LogUsage`).
    Android,
    /// No built-in rules; only `[[forbidden-call]]` definitions apply.
    Empty,
}

impl RuleSet {
    /// Every built-in rule set.
    pub const ALL: &'static [Self] = &[Self::Android, Self::Empty];

    /// Looks a rule set up by identifier.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "android" => Some(Self::Android),
            "none" => Some(Self::Empty),
            _ => None,
        }
    }

    /// Returns the identifier used on the command line and in config.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Android => "android",
            Self::Empty => "none",
        }
    }

    /// One-line description for `list-rules`.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Android => "Android platform APIs that must go through project wrappers",
            Self::Empty => "No built-in rules",
        }
    }

    /// Returns the rules for this set, in reporting order.
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in definition fails validation.
    pub fn rules(self) -> Result<Vec<Rule>, RuleDefinitionError> {
        match self {
            Self::Android => Ok(vec![crate::log_usage::rule()?]),
            Self::Empty => Ok(Vec::new()),
        }
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::Android
    }
}

/// Returns the rules of the built-in set named `id`.
///
/// Returns `Ok(None)` when no set has that identifier.
///
/// # Errors
///
/// Returns an error if a built-in definition fails validation.
pub fn rule_set(id: &str) -> Result<Option<Vec<Rule>>, RuleDefinitionError> {
    match RuleSet::from_id(id) {
        Some(set) => {
            tracing::debug!("Using built-in rule set: {}", set.id());
            set.rules().map(Some)
        }
        None => Ok(None),
    }
}

/// Returns every built-in rule across all sets.
///
/// # Errors
///
/// Returns an error if a built-in definition fails validation.
pub fn all_rules() -> Result<Vec<Rule>, RuleDefinitionError> {
    let mut rules = Vec::new();
    for set in RuleSet::ALL {
        rules.extend(set.rules()?);
    }
    Ok(rules)
}
