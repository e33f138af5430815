use std::collections::HashMap;

use crate::entities::{EntityProfile, Transaction};
use crate::error::DomainError;

/// Owns one behavioral profile per entity for the lifetime of a stream.
#[derive(Debug, Default)]
pub struct ProfileStore {
    profiles: HashMap<String, EntityProfile>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_profile(&self, entity_id: &str) -> Option<&EntityProfile> {
        self.profiles.get(entity_id)
    }

    /// Rejects a transaction that cannot be applied without corrupting the
    /// entity's running state. Nothing is mutated.
    pub fn check(&self, transaction: &Transaction) -> Result<(), DomainError> {
        if transaction.user_id.trim().is_empty() {
            return Err(DomainError::MissingEntity {
                transaction_id: transaction.transaction_id.clone(),
            });
        }
        if !transaction.amount.is_finite() || transaction.amount < 0.0 {
            return Err(DomainError::InvalidAmount {
                transaction_id: transaction.transaction_id.clone(),
                amount: transaction.amount,
            });
        }
        let last_seen = self
            .profiles
            .get(&transaction.user_id)
            .and_then(|profile| profile.last_transaction_time);
        if let Some(last) = last_seen {
            if transaction.timestamp < last {
                return Err(DomainError::OutOfOrder {
                    entity: transaction.user_id.clone(),
                    transaction_id: transaction.transaction_id.clone(),
                    last,
                    received: transaction.timestamp,
                });
            }
        }
        Ok(())
    }

    /// Applies the transaction to its entity's profile, creating the profile
    /// on first sighting, and returns the post-update state.
    pub fn update(&mut self, transaction: &Transaction) -> Result<&EntityProfile, DomainError> {
        self.check(transaction)?;
        let profile = self
            .profiles
            .entry(transaction.user_id.clone())
            .or_insert_with(|| EntityProfile::seeded(&transaction.country, &transaction.device));
        profile.apply(transaction);
        Ok(profile)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EntityProfile)> {
        self.profiles
            .iter()
            .map(|(entity_id, profile)| (entity_id.as_str(), profile))
    }
}
