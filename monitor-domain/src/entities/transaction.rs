// Transaction entity
// Immutable input record delivered by the stream

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::utils::{flag_serde, timestamp_serde};
use crate::value_objects::Category;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    #[serde(with = "timestamp_serde")]
    pub timestamp: NaiveDateTime,
    pub user_id: String,
    pub amount: f64,
    #[serde(default)]
    pub merchant: String,
    pub category: Category,
    pub country: String,
    pub device: String,
    #[serde(default)]
    pub ip: String,
    /// Generation/validation label; never read by the evaluator.
    #[serde(default, with = "flag_serde")]
    pub is_fraud: bool,
}

impl Transaction {
    pub fn hour(&self) -> u32 {
        self.timestamp.hour()
    }

    pub fn minute(&self) -> u32 {
        self.timestamp.minute()
    }
}
