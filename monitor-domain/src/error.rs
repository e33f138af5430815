use chrono::NaiveDateTime;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("out-of-order transaction {transaction_id} for entity {entity}: {received} is earlier than last seen {last}")]
    OutOfOrder {
        entity: String,
        transaction_id: String,
        last: NaiveDateTime,
        received: NaiveDateTime,
    },
    #[error("invalid amount {amount} on transaction {transaction_id}")]
    InvalidAmount { transaction_id: String, amount: f64 },
    #[error("transaction {transaction_id} has no entity id")]
    MissingEntity { transaction_id: String },
    #[error("invalid rule set: {0}")]
    InvalidRuleSet(String),
}
