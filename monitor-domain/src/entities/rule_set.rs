// Rule parameters for the anomaly evaluator

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::Category;

pub const DEFAULT_SPIKE_MULTIPLIER: f64 = 3.0;
pub const DEFAULT_OFF_HOURS_END: u32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    pub spike_multiplier: f64,
    /// Transactions with an hour-of-day below this value are off-hours.
    pub off_hours_end: u32,
    pub high_risk_categories: Vec<Category>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            spike_multiplier: DEFAULT_SPIKE_MULTIPLIER,
            off_hours_end: DEFAULT_OFF_HOURS_END,
            high_risk_categories: vec![Category::Travel, Category::Electronics],
        }
    }
}

impl RuleSet {
    pub fn is_high_risk(&self, category: &Category) -> bool {
        self.high_risk_categories.contains(category)
    }

    pub fn normalized(&self) -> Self {
        let mut categories: Vec<Category> = Vec::with_capacity(self.high_risk_categories.len());
        for category in &self.high_risk_categories {
            if category.as_str().is_empty() || categories.contains(category) {
                continue;
            }
            categories.push(category.clone());
        }
        Self {
            spike_multiplier: self.spike_multiplier,
            off_hours_end: self.off_hours_end,
            high_risk_categories: categories,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.spike_multiplier.is_finite() || self.spike_multiplier <= 0.0 {
            return Err(DomainError::InvalidRuleSet(format!(
                "spike_multiplier must be a positive number, got {}",
                self.spike_multiplier
            )));
        }
        if self.off_hours_end > 24 {
            return Err(DomainError::InvalidRuleSet(format!(
                "off_hours_end must be within 0..=24, got {}",
                self.off_hours_end
            )));
        }
        Ok(())
    }
}
