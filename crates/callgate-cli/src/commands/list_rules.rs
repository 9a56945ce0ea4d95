//! List rules command implementation.

use anyhow::{bail, Context, Result};
use callgate_rules::RuleSet;

use super::output::severity_label;

/// Runs the list-rules command.
pub fn run(rule_set: Option<&str>) -> Result<()> {
    let sets: Vec<RuleSet> = match rule_set {
        Some(id) => match RuleSet::from_id(id) {
            Some(set) => vec![set],
            None => bail!("Unknown rule set `{id}`"),
        },
        None => RuleSet::ALL.to_vec(),
    };

    for set in sets {
        println!("{} - {}\n", set.id(), set.description());
        let rules = set.rules().context("Built-in rule set is invalid")?;
        if rules.is_empty() {
            println!("  (no rules)\n");
            continue;
        }

        println!(
            "  {:<16} {:<18} {:<24} {:<20} Title",
            "Id", "Severity", "Owner", "Methods"
        );
        println!("  {}", "-".repeat(90));
        for rule in &rules {
            let methods: Vec<&str> = rule.methods().iter().map(String::as_str).collect();
            println!(
                "  {:<16} {:<18} {:<24} {:<20} {}",
                rule.id().as_str(),
                severity_label(rule.severity()),
                rule.owner().to_string(),
                methods.join(","),
                rule.title()
            );
        }
        println!();
    }

    println!("Select a set with `rule_set = \"<id>\"` in callgate.toml or:");
    println!("  callgate check --rule-set android");

    Ok(())
}
