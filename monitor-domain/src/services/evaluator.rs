use crate::entities::{AlertReason, EntityProfile, RuleSet, Transaction};

/// Judges a transaction against the profile as it stood before that
/// transaction was applied. Rules run in a fixed order and never short-circuit.
#[derive(Debug, Clone, Default)]
pub struct AnomalyEvaluator {
    rules: RuleSet,
}

impl AnomalyEvaluator {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn evaluate(&self, transaction: &Transaction, profile: &EntityProfile) -> Vec<AlertReason> {
        let mut reasons = Vec::new();

        let threshold = self.rules.spike_multiplier * profile.avg_amount;
        if transaction.amount > threshold {
            reasons.push(AlertReason::AmountSpike {
                amount: transaction.amount,
                threshold,
                average: profile.avg_amount,
            });
        }

        if transaction.country != profile.common_country() {
            reasons.push(AlertReason::CountryDeviation {
                observed: transaction.country.clone(),
                expected: profile.common_country().to_string(),
            });
        }

        if transaction.device != profile.common_device() {
            reasons.push(AlertReason::DeviceDeviation {
                observed: transaction.device.clone(),
                expected: profile.common_device().to_string(),
            });
        }

        if transaction.hour() < self.rules.off_hours_end {
            reasons.push(AlertReason::OffHours {
                hour: transaction.hour(),
                minute: transaction.minute(),
            });
        }

        if self.rules.is_high_risk(&transaction.category) {
            reasons.push(AlertReason::HighRiskCategory {
                category: transaction.category.clone(),
            });
        }

        reasons
    }

    /// Evaluation with no prior history: zero average, modes equal to the
    /// transaction's own values.
    pub fn evaluate_absent(&self, transaction: &Transaction) -> Vec<AlertReason> {
        let empty = EntityProfile::seeded(&transaction.country, &transaction.device);
        self.evaluate(transaction, &empty)
    }
}
