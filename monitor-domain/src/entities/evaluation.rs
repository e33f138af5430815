// Alert reasons and per-transaction evaluation results

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entities::Transaction;
use crate::value_objects::{Category, RiskLevel};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum AlertReason {
    AmountSpike {
        amount: f64,
        threshold: f64,
        average: f64,
    },
    CountryDeviation {
        observed: String,
        expected: String,
    },
    DeviceDeviation {
        observed: String,
        expected: String,
    },
    OffHours {
        hour: u32,
        minute: u32,
    },
    HighRiskCategory {
        category: Category,
    },
}

impl AlertReason {
    pub const RULE_IDS: [&'static str; 5] = ["R1", "R2", "R3", "R4", "R5"];

    pub fn rule_id(&self) -> &'static str {
        match self {
            AlertReason::AmountSpike { .. } => "R1",
            AlertReason::CountryDeviation { .. } => "R2",
            AlertReason::DeviceDeviation { .. } => "R3",
            AlertReason::OffHours { .. } => "R4",
            AlertReason::HighRiskCategory { .. } => "R5",
        }
    }

    pub fn rule_name(&self) -> &'static str {
        match self {
            AlertReason::AmountSpike { .. } => "amount_spike",
            AlertReason::CountryDeviation { .. } => "country_deviation",
            AlertReason::DeviceDeviation { .. } => "device_deviation",
            AlertReason::OffHours { .. } => "off_hours",
            AlertReason::HighRiskCategory { .. } => "high_risk_category",
        }
    }

    pub fn risk_level(&self) -> RiskLevel {
        match self {
            AlertReason::AmountSpike { .. } => RiskLevel::HIGH,
            AlertReason::CountryDeviation { .. } | AlertReason::DeviceDeviation { .. } => {
                RiskLevel::MEDIUM
            }
            AlertReason::OffHours { .. } | AlertReason::HighRiskCategory { .. } => RiskLevel::LOW,
        }
    }
}

impl fmt::Display for AlertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertReason::AmountSpike {
                amount,
                threshold,
                average,
            } => write!(
                f,
                "Amount {} > threshold {:.2} (user average {:.2})",
                amount, threshold, average
            ),
            AlertReason::CountryDeviation { observed, expected } => {
                write!(f, "Unusual country: {} (expected: {})", observed, expected)
            }
            AlertReason::DeviceDeviation { observed, expected } => {
                write!(f, "Unusual device: {} (expected: {})", observed, expected)
            }
            AlertReason::OffHours { hour, minute } => {
                write!(f, "Suspicious time: {:02}:{:02}", hour, minute)
            }
            AlertReason::HighRiskCategory { category } => {
                write!(f, "High-risk category: {}", category)
            }
        }
    }
}

/// Outcome of judging one transaction; an empty reason list means no anomaly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub transaction: Transaction,
    pub reasons: Vec<AlertReason>,
}

impl Evaluation {
    pub fn new(transaction: Transaction, reasons: Vec<AlertReason>) -> Self {
        Self {
            transaction,
            reasons,
        }
    }

    pub fn is_alert(&self) -> bool {
        !self.reasons.is_empty()
    }

    pub fn risk_level(&self) -> Option<RiskLevel> {
        self.reasons.iter().map(AlertReason::risk_level).max()
    }

    pub fn evidence_json(&self) -> String {
        serde_json::json!({
            "transaction_id": self.transaction.transaction_id,
            "user_id": self.transaction.user_id,
            "risk_level": self.risk_level().map(|level| level.as_str()),
            "rules": self.reasons.iter().map(AlertReason::rule_id).collect::<Vec<_>>(),
            "reasons": self.reasons,
        })
        .to_string()
    }
}
