//! Finding accumulation for a single run.

use crate::adapter::CallSite;
use crate::rule::{MessageArgs, Rule};
use crate::types::{Finding, Location};
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default)]
struct State {
    seen: HashSet<(String, Location)>,
    findings: Vec<Finding>,
}

/// Collects findings for one analysis run.
///
/// `report` may be called from many worker threads; a mutex guards the
/// dedup set and the finding list together so the "one finding per
/// (rule id, location)" invariant holds under concurrency. Ordering is
/// normalized in [`Reporter::into_results`], never taken from arrival order.
#[derive(Debug, Default)]
pub struct Reporter {
    state: Mutex<State>,
}

impl Reporter {
    /// Creates an empty reporter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a finding for `call` matching `rule`.
    ///
    /// Returns false if the same (rule id, location) was already reported in
    /// this run.
    pub fn report(&self, call: &CallSite, rule: &Rule) -> bool {
        let owner = call.owner.as_resolved().unwrap_or_default();
        let message = rule.message().render(&MessageArgs {
            method: &call.method,
            owner,
            receiver: call.receiver.as_deref().unwrap_or_default(),
        });
        let key = (rule.id().to_string(), call.location.clone());

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.seen.insert(key) {
            return false;
        }
        state.findings.push(Finding::new(
            rule.id().as_str(),
            rule.severity(),
            call.location.clone(),
            message,
        ));
        true
    }

    /// Number of findings recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .findings
            .len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consumes the reporter and returns findings sorted by file, then
    /// location, then rule id.
    #[must_use]
    pub fn into_results(self) -> Vec<Finding> {
        let mut findings = self
            .state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .findings;
        findings.sort_by(|a, b| {
            a.location
                .file
                .cmp(&b.location.file)
                .then(a.location.line.cmp(&b.location.line))
                .then(a.location.column.cmp(&b.location.column))
                .then(a.location.offset.cmp(&b.location.offset))
                .then(a.rule_id.cmp(&b.rule_id))
        });
        findings
    }
}
