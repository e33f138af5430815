use std::env;
use std::path::Path;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use monitor_domain::{Category, GeneratorConfig, RuleSet, RuntimeConfig};

use crate::config::validation::validate_rule_set;

pub const CONFIG_ENV: &str = "TXWATCH_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "./txwatch.toml";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub input_path: String,
    pub delay_ms: u64,
    pub progress_every: u64,
    pub workers: usize,
    pub sort_input: bool,
    pub alerts_path: Option<String>,
    pub metrics_path: Option<String>,
    pub rules_path: Option<String>,
    pub spike_multiplier: f64,
    pub off_hours_end: u32,
    pub high_risk_categories: Vec<String>,
    pub generator_output: String,
    pub generator_users: usize,
    pub generator_min_per_user: usize,
    pub generator_max_per_user: usize,
    pub generator_history_days: i64,
    pub generator_fraud_rate: f64,
    pub generator_seed: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let rules = RuleSet::default();
        let generator = GeneratorConfig::default();
        Self {
            input_path: "./transactions.csv".to_string(),
            delay_ms: 0,
            progress_every: 10,
            workers: 1,
            sort_input: true,
            alerts_path: None,
            metrics_path: None,
            rules_path: None,
            spike_multiplier: rules.spike_multiplier,
            off_hours_end: rules.off_hours_end,
            high_risk_categories: rules
                .high_risk_categories
                .iter()
                .map(|category| category.to_string())
                .collect(),
            generator_output: generator.output_path,
            generator_users: generator.users,
            generator_min_per_user: generator.min_per_user,
            generator_max_per_user: generator.max_per_user,
            generator_history_days: generator.history_days,
            generator_fraud_rate: generator.fraud_rate,
            generator_seed: generator.seed,
        }
    }
}

impl AppConfig {
    pub async fn load() -> Result<Self> {
        let path = env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let file_path = Path::new(&path);
        let base_dir = file_path.parent();
        if !file_path.exists() {
            warn!("{} not found, using defaults", path);
            let mut config = AppConfig::default();
            config.apply_env_overrides();
            config.resolve_paths(base_dir);
            config.normalize();
            config.validate()?;
            return Ok(config);
        }
        let content = fs::read_to_string(file_path).await?;
        let mut config: AppConfig = toml::from_str(&content)?;
        config.apply_env_overrides();
        config.resolve_paths(base_dir);
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn normalize(&mut self) {
        self.alerts_path = normalize_optional(self.alerts_path.take());
        self.metrics_path = normalize_optional(self.metrics_path.take());
        self.rules_path = normalize_optional(self.rules_path.take());
        self.input_path = self.input_path.trim().to_string();
        self.generator_output = self.generator_output.trim().to_string();
        let mut categories: Vec<String> = Vec::new();
        for raw in std::mem::take(&mut self.high_risk_categories) {
            let label = Category::from(raw.as_str()).to_string();
            if !label.is_empty() && !categories.contains(&label) {
                categories.push(label);
            }
        }
        self.high_risk_categories = categories;
    }

    fn resolve_paths(&mut self, base_dir: Option<&Path>) {
        let Some(base) = base_dir else {
            return;
        };
        self.input_path = resolve_path(base, &self.input_path);
        self.generator_output = resolve_path(base, &self.generator_output);
        self.alerts_path = self.alerts_path.as_deref().map(|value| resolve_path(base, value));
        self.metrics_path = self.metrics_path.as_deref().map(|value| resolve_path(base, value));
        self.rules_path = self.rules_path.as_deref().map(|value| resolve_path(base, value));
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_path.is_empty() {
            return Err(anyhow!("input_path must not be empty"));
        }
        if self.workers == 0 {
            return Err(anyhow!("workers must be greater than 0"));
        }
        if self.progress_every == 0 {
            return Err(anyhow!("progress_every must be greater than 0"));
        }
        if self.generator_min_per_user == 0 || self.generator_min_per_user > self.generator_max_per_user {
            return Err(anyhow!(
                "generator_min_per_user must be within 1..=generator_max_per_user"
            ));
        }
        if self.generator_history_days <= 0 {
            return Err(anyhow!("generator_history_days must be greater than 0"));
        }
        if !(0.0..=1.0).contains(&self.generator_fraud_rate) {
            return Err(anyhow!("generator_fraud_rate must be within 0..=1"));
        }
        validate_rule_set(&self.rule_set())?;
        Ok(())
    }

    pub fn rule_set(&self) -> RuleSet {
        RuleSet {
            spike_multiplier: self.spike_multiplier,
            off_hours_end: self.off_hours_end,
            high_risk_categories: self
                .high_risk_categories
                .iter()
                .map(|label| Category::from(label.as_str()))
                .collect(),
        }
        .normalized()
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            input_path: self.input_path.clone(),
            delay_ms: self.delay_ms,
            progress_every: self.progress_every,
            workers: self.workers,
            sort_input: self.sort_input,
            alerts_path: self.alerts_path.clone(),
            rules: self.rule_set(),
        }
    }

    pub fn to_generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            output_path: self.generator_output.clone(),
            users: self.generator_users,
            min_per_user: self.generator_min_per_user,
            max_per_user: self.generator_max_per_user,
            history_days: self.generator_history_days,
            fraud_rate: self.generator_fraud_rate,
            seed: self.generator_seed,
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("TXWATCH_INPUT_PATH") {
            self.input_path = value;
        }
        override_parsed("TXWATCH_DELAY_MS", &mut self.delay_ms);
        override_parsed("TXWATCH_PROGRESS_EVERY", &mut self.progress_every);
        override_parsed("TXWATCH_WORKERS", &mut self.workers);
        override_parsed("TXWATCH_SORT_INPUT", &mut self.sort_input);
        if let Ok(value) = env::var("TXWATCH_ALERTS_PATH") {
            self.alerts_path = Some(value);
        }
        if let Ok(value) = env::var("TXWATCH_METRICS_PATH") {
            self.metrics_path = Some(value);
        }
        if let Ok(value) = env::var("TXWATCH_RULES_PATH") {
            self.rules_path = Some(value);
        }
        override_parsed("TXWATCH_SPIKE_MULTIPLIER", &mut self.spike_multiplier);
        override_parsed("TXWATCH_OFF_HOURS_END", &mut self.off_hours_end);
        if let Ok(value) = env::var("TXWATCH_HIGH_RISK_CATEGORIES") {
            self.high_risk_categories = parse_env_list(&value);
        }
        if let Ok(value) = env::var("TXWATCH_GENERATOR_OUTPUT") {
            self.generator_output = value;
        }
        override_parsed("TXWATCH_GENERATOR_USERS", &mut self.generator_users);
        override_parsed("TXWATCH_GENERATOR_SEED", &mut self.generator_seed);
    }
}

fn override_parsed<T: FromStr>(name: &str, target: &mut T) {
    if let Ok(value) = env::var(name) {
        if let Some(parsed) = parse_override(name, &value) {
            *target = parsed;
        }
    }
}

fn parse_override<T: FromStr>(name: &str, value: &str) -> Option<T> {
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!("ignoring {}={:?}: not a valid value", name, value);
            None
        }
    }
}

fn resolve_path(base: &Path, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        trimmed.to_string()
    } else {
        base.join(path).to_string_lossy().to_string()
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

fn parse_env_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect()
}
