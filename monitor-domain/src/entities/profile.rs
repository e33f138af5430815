// Entity profile
// Running behavioral baseline for one entity

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::entities::Transaction;
use crate::utils::optional_timestamp_serde;

/// Online mode over a categorical attribute. Counters cover every value
/// observed so far; the incumbent keeps the mode on ties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeTracker {
    mode: String,
    counts: HashMap<String, u64>,
}

impl ModeTracker {
    pub fn seeded(value: &str) -> Self {
        Self {
            mode: value.to_string(),
            counts: HashMap::new(),
        }
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    pub fn frequency(&self, value: &str) -> u64 {
        self.counts.get(value).copied().unwrap_or(0)
    }

    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    pub fn observe(&mut self, value: &str) {
        let observed = {
            let count = self.counts.entry(value.to_string()).or_insert(0);
            *count += 1;
            *count
        };
        if value != self.mode && observed > self.frequency(&self.mode) {
            self.mode = value.to_string();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityProfile {
    pub transaction_count: u64,
    pub avg_amount: f64,
    #[serde(with = "optional_timestamp_serde")]
    pub last_transaction_time: Option<NaiveDateTime>,
    country: ModeTracker,
    device: ModeTracker,
}

impl EntityProfile {
    /// Fresh profile: no history, modes seeded with the given values.
    pub fn seeded(country: &str, device: &str) -> Self {
        Self {
            transaction_count: 0,
            avg_amount: 0.0,
            last_transaction_time: None,
            country: ModeTracker::seeded(country),
            device: ModeTracker::seeded(device),
        }
    }

    /// Baseline a never-seen entity's first transaction is judged against:
    /// its own amount, country and device.
    pub fn first_sighting(transaction: &Transaction) -> Self {
        Self {
            avg_amount: transaction.amount,
            ..Self::seeded(&transaction.country, &transaction.device)
        }
    }

    pub fn common_country(&self) -> &str {
        self.country.mode()
    }

    pub fn common_device(&self) -> &str {
        self.device.mode()
    }

    pub fn country_frequency(&self, country: &str) -> u64 {
        self.country.frequency(country)
    }

    pub fn device_frequency(&self, device: &str) -> u64 {
        self.device.frequency(device)
    }

    pub fn distinct_countries(&self) -> usize {
        self.country.distinct()
    }

    pub fn distinct_devices(&self) -> usize {
        self.device.distinct()
    }

    // Callers validate ordering and amount first; see ProfileStore::update.
    pub(crate) fn apply(&mut self, transaction: &Transaction) {
        self.transaction_count += 1;
        self.avg_amount += (transaction.amount - self.avg_amount) / self.transaction_count as f64;
        self.country.observe(&transaction.country);
        self.device.observe(&transaction.device);
        self.last_transaction_time = Some(transaction.timestamp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_switches_only_on_strictly_higher_frequency() {
        let mut tracker = ModeTracker::seeded("A");
        for value in ["A", "A", "B", "B"] {
            tracker.observe(value);
        }
        assert_eq!(tracker.mode(), "A");
        tracker.observe("B");
        assert_eq!(tracker.mode(), "B");
        assert_eq!(tracker.frequency("B"), 3);
        assert_eq!(tracker.frequency("A"), 2);
    }

    #[test]
    fn seeded_value_is_counted_on_first_observation() {
        let mut tracker = ModeTracker::seeded("US");
        tracker.observe("US");
        assert_eq!(tracker.frequency("US"), 1);
        tracker.observe("CA");
        assert_eq!(tracker.mode(), "US");
    }

    #[test]
    fn first_sighting_baseline_uses_own_values() {
        let tx: Transaction = serde_json::from_value(serde_json::json!({
            "transaction_id": "TX1",
            "timestamp": "2025-01-01 10:00:00",
            "user_id": "E1",
            "amount": 42.0,
            "category": "Retail",
            "country": "FR",
            "device": "d9",
        }))
        .expect("transaction");
        let baseline = EntityProfile::first_sighting(&tx);
        assert_eq!(baseline.transaction_count, 0);
        assert_eq!(baseline.avg_amount, 42.0);
        assert_eq!(baseline.common_country(), "FR");
        assert_eq!(baseline.common_device(), "d9");
        assert!(baseline.last_transaction_time.is_none());
    }
}
