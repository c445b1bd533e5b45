//! CLI doctor command.
//!
//! Checks the environment configuration without starting the server.

use anyhow::Result;

use tripforge_config::{validate, EnvError, TripForgeConfig};

/// Findings for the loaded environment, one line each, and whether it is usable.
fn findings(loaded: &Result<TripForgeConfig, EnvError>) -> (Vec<String>, bool) {
    match loaded {
        Err(e) => {
            let lines = e
                .problems
                .iter()
                .map(|p| format!("  error    {}: {}", p.var_name, p.message))
                .collect();
            (lines, false)
        }
        Ok(config) => {
            let report = validate(config);
            let warnings = report
                .warnings
                .iter()
                .map(|w| format!("  warning  {}: {}", w.path, w.message));
            let errors = report
                .errors
                .iter()
                .map(|e| format!("  error    {}: {}", e.path, e.message));
            (warnings.chain(errors).collect(), report.is_valid())
        }
    }
}

/// Print the effective config and every finding.
/// Returns whether the config is usable.
pub fn run(loaded: &Result<TripForgeConfig, EnvError>) -> Result<bool> {
    println!("\nTripForge doctor\n");
    match loaded {
        Ok(config) => {
            println!("Effective configuration:");
            println!("{}\n", serde_json::to_string_pretty(&config.redacted())?);
        }
        Err(_) => println!("Some environment variables could not be read:\n"),
    }

    let (lines, usable) = findings(loaded);
    for line in &lines {
        println!("{line}");
    }

    println!();
    if usable {
        println!("All checks passed.");
    } else {
        let count = lines.iter().filter(|l| l.trim_start().starts_with("error")).count();
        println!("{count} problem(s) found. Fix them before running `tripforge serve`.");
    }
    Ok(usable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<TripForgeConfig, EnvError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        TripForgeConfig::from_map(&vars)
    }

    #[test]
    fn unreadable_variables_are_reported_not_raised() {
        let (lines, usable) = findings(&load(&[
            ("TRIPFORGE_PORT", "eighty"),
            ("LLM_PROVIDER", "gemini"),
        ]));
        assert!(!usable);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("TRIPFORGE_PORT"));
        assert!(lines[1].contains("gemini"));
        assert!(run(&load(&[("TRIPFORGE_PORT", "eighty")])).is_ok());
    }

    #[test]
    fn validation_findings_are_listed() {
        let (lines, usable) = findings(&load(&[("LLM_PROVIDER", "openai")]));
        assert!(!usable);
        assert!(lines.iter().any(|l| l.contains("LLM_API_KEY")));

        let (lines, usable) = findings(&load(&[("LLM_PROVIDER", "mock")]));
        assert!(usable);
        assert!(lines.is_empty());
    }
}
