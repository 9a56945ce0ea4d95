//! Init command implementation.

use anyhow::{bail, Context, Result};
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# callgate configuration

# Built-in rule set: "android" or "none"
rule_set = "android"

# Exit non-zero when a finding is at least this severe: "info", "warning", "error"
fail_on = "error"

[analyzer]
# Root directory to analyze when no paths are given (default: current directory)
# root = "./app/src"

# Glob patterns to exclude from analysis
exclude = [
    "**/build/**",
    "**/generated/**",
]

# Respect .gitignore files
respect_gitignore = true

# Worker threads (default: all cores)
# parallelism = 4

# Files larger than this are reported as parse failures instead of analyzed
# max_file_bytes = 4194304

# Per-rule overrides
[rules.LogUsage]
enabled = true
# severity = "warning"

# Custom forbidden calls
# [[forbidden-call]]
# id = "NoSystemExit"
# title = "System.exit"
# description = "Let the framework manage the process lifecycle."
# severity = "error"
# owner_type = "java.lang.System"
# methods = ["exit"]
# requires_receiver = true
# message = "avoid {owner}.{method}()"
"#;

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    write_config(Path::new("callgate.toml"), force)?;

    println!("Created callgate.toml");
    println!("\nNext steps:");
    println!("  1. Edit callgate.toml to configure rules");
    println!("  2. Run: callgate check");

    Ok(())
}

fn write_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }
    std::fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", path.display()))
}
