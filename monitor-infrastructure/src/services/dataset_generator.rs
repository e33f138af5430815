use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

use chrono::{NaiveDateTime, TimeDelta, Timelike};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use monitor_domain::{Category, GeneratorConfig, RuleSet, Transaction};

pub const COUNTRIES: [&str; 10] = ["US", "CA", "GB", "FR", "DE", "BR", "RU", "CN", "JP", "MX"];

const CATEGORY_WEIGHTS: [(Category, f64); 5] = [
    (Category::Electronics, 0.15),
    (Category::Retail, 0.35),
    (Category::Travel, 0.10),
    (Category::Services, 0.25),
    (Category::Groceries, 0.15),
];

const PRIMARY_DEVICES: [&str; 8] = [
    "Chrome/Windows 10",
    "Chrome/macOS",
    "Safari/iPhone",
    "Safari/iPad",
    "Firefox/Linux",
    "Edge/Windows 11",
    "Chrome/Android",
    "Samsung Internet/Android",
];

const ALTERNATE_DEVICES: [&str; 6] = [
    "Opera/Windows 7",
    "Firefox/Android",
    "Unknown Device",
    "Android Emulator",
    "Headless Chrome/Linux",
    "Unknown Browser/Unknown OS",
];

const COMPANY_NAMES: [&str; 12] = [
    "Acme", "Globex", "Initech", "Umbrella", "Stark", "Wayne", "Hooli", "Vandelay", "Soylent",
    "Cyberdyne", "Tyrell", "Wonka",
];

const COMPANY_SUFFIXES: [&str; 5] = ["Inc", "LLC", "Group", "Ltd", "and Sons"];

const AMOUNT_LOG_MEAN: f64 = 4.5;
const AMOUNT_LOG_SIGMA: f64 = 1.2;
const HOME_COUNTRY_PROBABILITY: f64 = 0.9;
const PRIMARY_DEVICE_PROBABILITY: f64 = 0.95;
const FRAUD_AMOUNT_FACTOR: f64 = 4.0;

struct SyntheticUser {
    user_id: String,
    home_country: &'static str,
    primary_device: &'static str,
    average_amount: f64,
}

/// Seeded generator for labelled transaction datasets.
pub struct DatasetGenerator {
    config: GeneratorConfig,
    rules: RuleSet,
}

impl DatasetGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            rules: RuleSet::default(),
        }
    }

    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    /// Produces transactions in generation order, with timestamps in the
    /// `history_days` window ending at `now`.
    pub fn generate(&self, now: NaiveDateTime) -> Vec<Transaction> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let now = now.with_nanosecond(0).unwrap_or(now);
        let users: Vec<SyntheticUser> = (0..self.config.users)
            .map(|index| self.sample_user(index, &mut rng))
            .collect();

        let mut used_ids = HashSet::new();
        let mut transactions = Vec::new();
        for user in &users {
            let low = self.config.min_per_user.min(self.config.max_per_user);
            let high = self.config.min_per_user.max(self.config.max_per_user);
            let count = rng.random_range(low..=high);
            for _ in 0..count {
                let transaction = self.sample_transaction(user, now, &mut used_ids, &mut rng);
                transactions.push(transaction);
            }
        }

        self.label_fraud(&mut transactions, &mut rng);
        let fraud = transactions.iter().filter(|tx| tx.is_fraud).count();
        info!(
            users = users.len(),
            rows = transactions.len(),
            fraud,
            seed = self.config.seed,
            "synthetic dataset generated"
        );
        transactions
    }

    fn sample_user(&self, index: usize, rng: &mut StdRng) -> SyntheticUser {
        SyntheticUser {
            user_id: format!("USR{:05}", index),
            home_country: COUNTRIES[rng.random_range(0..COUNTRIES.len())],
            primary_device: PRIMARY_DEVICES[rng.random_range(0..PRIMARY_DEVICES.len())],
            average_amount: sample_normal(rng, AMOUNT_LOG_MEAN, AMOUNT_LOG_SIGMA).exp(),
        }
    }

    fn sample_transaction(
        &self,
        user: &SyntheticUser,
        now: NaiveDateTime,
        used_ids: &mut HashSet<u32>,
        rng: &mut StdRng,
    ) -> Transaction {
        let window = (self.config.history_days * 86_400).max(1);
        let timestamp = now - TimeDelta::seconds(rng.random_range(0..window));
        let amount = sample_normal(rng, user.average_amount, user.average_amount / 3.0)
            .abs()
            .round();
        let category = sample_category(rng);
        let country = if rng.random::<f64>() < HOME_COUNTRY_PROBABILITY {
            user.home_country
        } else {
            COUNTRIES[rng.random_range(0..COUNTRIES.len())]
        };
        let device = if rng.random::<f64>() < PRIMARY_DEVICE_PROBABILITY {
            user.primary_device
        } else {
            ALTERNATE_DEVICES[rng.random_range(0..ALTERNATE_DEVICES.len())]
        };

        Transaction {
            transaction_id: unique_transaction_id(used_ids, rng),
            timestamp,
            user_id: user.user_id.clone(),
            amount,
            merchant: sample_company(rng),
            category,
            country: country.to_string(),
            device: device.to_string(),
            ip: sample_ipv4(rng),
            is_fraud: false,
        }
    }

    fn label_fraud(&self, transactions: &mut [Transaction], rng: &mut StdRng) {
        let mut totals: HashMap<String, (f64, u64)> = HashMap::new();
        let mut first_country: HashMap<String, String> = HashMap::new();
        for tx in transactions.iter() {
            let entry = totals.entry(tx.user_id.clone()).or_insert((0.0, 0));
            entry.0 += tx.amount;
            entry.1 += 1;
            first_country
                .entry(tx.user_id.clone())
                .or_insert_with(|| tx.country.clone());
        }

        for tx in transactions.iter_mut() {
            let mean = totals
                .get(&tx.user_id)
                .map(|(sum, count)| sum / *count as f64)
                .unwrap_or(0.0);
            let candidate = tx.amount > mean * FRAUD_AMOUNT_FACTOR
                || first_country
                    .get(&tx.user_id)
                    .is_some_and(|country| *country != tx.country)
                || tx.device.contains("Unknown")
                || tx.device.contains("Emulator")
                || self.rules.is_high_risk(&tx.category);
            let noise = rng.random::<f64>();
            tx.is_fraud = candidate && noise < self.config.fraud_rate;
        }
    }
}

/// Box-Muller transform.
fn sample_normal(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = 1.0 - rng.random::<f64>();
    let u2: f64 = rng.random();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
    mean + std_dev * z
}

fn sample_category(rng: &mut StdRng) -> Category {
    let roll: f64 = rng.random();
    let mut cumulative = 0.0;
    for (category, weight) in CATEGORY_WEIGHTS.iter() {
        cumulative += weight;
        if roll < cumulative {
            return category.clone();
        }
    }
    Category::Groceries
}

fn sample_company(rng: &mut StdRng) -> String {
    let name = COMPANY_NAMES[rng.random_range(0..COMPANY_NAMES.len())];
    let suffix = COMPANY_SUFFIXES[rng.random_range(0..COMPANY_SUFFIXES.len())];
    format!("{} {}", name, suffix)
}

fn sample_ipv4(rng: &mut StdRng) -> String {
    format!(
        "{}.{}.{}.{}",
        rng.random_range(1..=223u8),
        rng.random::<u8>(),
        rng.random::<u8>(),
        rng.random_range(1..=254u8)
    )
}

fn unique_transaction_id(used: &mut HashSet<u32>, rng: &mut StdRng) -> String {
    loop {
        let candidate = rng.random_range(10_000_000..100_000_000u32);
        if used.insert(candidate) {
            return format!("TX{}", candidate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 30)
            .and_then(|date| date.and_hms_opt(12, 0, 0))
            .expect("now")
    }

    fn small_config(seed: u64) -> GeneratorConfig {
        GeneratorConfig {
            users: 40,
            seed,
            ..GeneratorConfig::default()
        }
    }

    #[test]
    fn same_seed_same_dataset() {
        let first = DatasetGenerator::new(small_config(7)).generate(now());
        let second = DatasetGenerator::new(small_config(7)).generate(now());
        assert_eq!(first, second);
        let other = DatasetGenerator::new(small_config(8)).generate(now());
        assert_ne!(first, other);
    }

    #[test]
    fn rows_respect_configured_bounds() {
        let config = small_config(42);
        let rows = DatasetGenerator::new(config.clone()).generate(now());
        let earliest = now() - TimeDelta::days(config.history_days);

        let mut per_user: HashMap<&str, usize> = HashMap::new();
        let mut ids = HashSet::new();
        for tx in &rows {
            *per_user.entry(tx.user_id.as_str()).or_insert(0) += 1;
            assert!(ids.insert(tx.transaction_id.clone()), "duplicate id");
            assert_eq!(tx.transaction_id.len(), 10);
            assert!(tx.transaction_id.starts_with("TX"));
            assert!(tx.amount >= 0.0);
            assert_eq!(tx.amount, tx.amount.round());
            assert!(tx.timestamp <= now() && tx.timestamp > earliest);
            assert!(tx.category.is_known());
            assert_eq!(tx.ip.split('.').count(), 4);
        }
        assert_eq!(per_user.len(), config.users);
        for count in per_user.values() {
            assert!((config.min_per_user..=config.max_per_user).contains(count));
        }
    }

    #[test]
    fn fraud_labels_follow_rate() {
        let never = GeneratorConfig {
            fraud_rate: 0.0,
            ..small_config(3)
        };
        let rows = DatasetGenerator::new(never).generate(now());
        assert!(rows.iter().all(|tx| !tx.is_fraud));

        let always = GeneratorConfig {
            fraud_rate: 1.0,
            ..small_config(3)
        };
        let rows = DatasetGenerator::new(always).generate(now());
        let labelled: Vec<&Transaction> = rows.iter().filter(|tx| tx.is_fraud).collect();
        assert!(!labelled.is_empty());
        let rules = RuleSet::default();
        assert!(rows
            .iter()
            .filter(|tx| rules.is_high_risk(&tx.category))
            .all(|tx| tx.is_fraud));
    }

    #[test]
    fn user_ids_are_zero_padded() {
        let rows = DatasetGenerator::new(GeneratorConfig {
            users: 1,
            ..GeneratorConfig::default()
        })
        .generate(now());
        assert!(rows.iter().all(|tx| tx.user_id == "USR00000"));
    }
}
