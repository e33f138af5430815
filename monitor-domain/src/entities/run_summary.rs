// Run summary entity

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entities::Evaluation;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub processed: u64,
    pub alerted: u64,
    pub reasons_by_rule: BTreeMap<String, u64>,
    pub profiles: usize,
    pub cancelled: bool,
}

impl RunSummary {
    pub fn record(&mut self, evaluation: &Evaluation) {
        self.processed += 1;
        if evaluation.is_alert() {
            self.alerted += 1;
        }
        for reason in &evaluation.reasons {
            *self
                .reasons_by_rule
                .entry(reason.rule_name().to_string())
                .or_insert(0) += 1;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub processed: u64,
    pub total: u64,
    pub alerted: u64,
}
