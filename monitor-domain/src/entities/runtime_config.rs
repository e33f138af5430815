// Runtime settings handed from configuration to the application layer

use crate::entities::RuleSet;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub input_path: String,
    pub delay_ms: u64,
    pub progress_every: u64,
    pub workers: usize,
    pub sort_input: bool,
    pub alerts_path: Option<String>,
    pub rules: RuleSet,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            input_path: "./transactions.csv".to_string(),
            delay_ms: 0,
            progress_every: 10,
            workers: 1,
            sort_input: true,
            alerts_path: None,
            rules: RuleSet::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub output_path: String,
    pub users: usize,
    pub min_per_user: usize,
    pub max_per_user: usize,
    pub history_days: i64,
    pub fraud_rate: f64,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_path: "./transactions.csv".to_string(),
            users: 2500,
            min_per_user: 4,
            max_per_user: 14,
            history_days: 180,
            fraud_rate: 0.02,
            seed: 42,
        }
    }
}
