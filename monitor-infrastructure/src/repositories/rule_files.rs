use std::path::Path;

use anyhow::{Context, Result};
use tokio::fs;

use monitor_domain::RuleSet;

use crate::config::validate_rule_set;

/// Loads a YAML rule set. Missing keys keep their default values.
pub async fn load_rule_set(path: &str) -> Result<RuleSet> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read rules file {}", path))?;
    let rules = parse_rule_set(&content).with_context(|| format!("invalid rules file {}", path))?;
    Ok(rules)
}

pub fn parse_rule_set(content: &str) -> Result<RuleSet> {
    let rules: RuleSet = serde_yaml::from_str(content)?;
    let rules = rules.normalized();
    validate_rule_set(&rules)?;
    Ok(rules)
}

/// Resolves the effective rule set: the rules file wins over inline settings
/// when it exists.
pub async fn resolve_rule_set(rules_path: Option<&str>, inline: RuleSet) -> Result<RuleSet> {
    match rules_path {
        Some(path) if Path::new(path).exists() => load_rule_set(path).await,
        Some(path) => {
            tracing::warn!("rules file {} not found, using configured rules", path);
            Ok(inline)
        }
        None => Ok(inline),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monitor_domain::Category;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let rules = parse_rule_set("spike_multiplier: 5.0\n").expect("parse");
        assert_eq!(rules.spike_multiplier, 5.0);
        assert_eq!(rules.off_hours_end, 5);
        assert_eq!(
            rules.high_risk_categories,
            vec![Category::Travel, Category::Electronics]
        );
    }

    #[test]
    fn categories_are_normalized() {
        let rules = parse_rule_set(
            "high_risk_categories:\n  - travel\n  - Travel\n  - Crypto\n",
        )
        .expect("parse");
        assert_eq!(
            rules.high_risk_categories,
            vec![Category::Travel, Category::Other("Crypto".to_string())]
        );
    }

    #[test]
    fn invalid_multiplier_is_rejected() {
        assert!(parse_rule_set("spike_multiplier: 0\n").is_err());
    }

    #[tokio::test]
    async fn missing_rules_file_falls_back_to_inline() {
        let inline = RuleSet {
            off_hours_end: 6,
            ..RuleSet::default()
        };
        let rules = resolve_rule_set(Some("/nonexistent/rules.yaml"), inline.clone())
            .await
            .expect("resolve");
        assert_eq!(rules, inline);
    }

    #[tokio::test]
    async fn rules_file_overrides_inline() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rules.yaml");
        std::fs::write(&path, "off_hours_end: 4\n").expect("write");
        let rules = resolve_rule_set(Some(&path.to_string_lossy()), RuleSet::default())
            .await
            .expect("resolve");
        assert_eq!(rules.off_hours_end, 4);
    }
}
