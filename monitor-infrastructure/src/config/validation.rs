use anyhow::{anyhow, Result};

use monitor_domain::RuleSet;

pub fn validate_rule_set(rules: &RuleSet) -> Result<()> {
    rules.validate().map_err(|err| anyhow!(err))?;
    if rules.high_risk_categories.is_empty() {
        tracing::warn!("high-risk category rule has an empty category set");
    }
    Ok(())
}

pub fn validate_input_extension(path: &str) -> Result<()> {
    match crate::utils::FileFormat::from_path(path) {
        Some(_) => Ok(()),
        None => Err(anyhow!(
            "unsupported file extension for '{}': expected .csv, .json, .jsonl, .ndjson or .xlsx",
            path
        )),
    }
}
