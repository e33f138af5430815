use async_trait::async_trait;

use crate::entities::Transaction;

#[async_trait]
pub trait TransactionSource: Send + Sync {
    async fn load_transactions(&self, path: &str) -> anyhow::Result<Vec<Transaction>>;
}

#[async_trait]
pub trait TransactionWriter: Send + Sync {
    async fn write_transactions(&self, path: &str, transactions: &[Transaction]) -> anyhow::Result<()>;
}
