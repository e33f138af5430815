use std::collections::HashSet;

use monitor_domain::ports::TransactionWriter;
use monitor_domain::Transaction;
use tracing::{error, info};

use crate::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportReport {
    pub rows: usize,
    pub users: usize,
    pub fraud_rows: usize,
}

/// Writes a dataset grouped by entity, each entity's rows in time order.
pub async fn export_dataset(
    writer: &dyn TransactionWriter,
    path: &str,
    mut transactions: Vec<Transaction>,
) -> Result<ExportReport, AppError> {
    if path.trim().is_empty() {
        return Err(AppError::BadRequest("output path is required".to_string()));
    }
    transactions.sort_by(|a, b| {
        a.user_id
            .cmp(&b.user_id)
            .then_with(|| a.timestamp.cmp(&b.timestamp))
    });

    let report = ExportReport {
        rows: transactions.len(),
        users: transactions
            .iter()
            .map(|transaction| transaction.user_id.as_str())
            .collect::<HashSet<_>>()
            .len(),
        fraud_rows: transactions.iter().filter(|transaction| transaction.is_fraud).count(),
    };

    writer
        .write_transactions(path, &transactions)
        .await
        .map_err(|err| {
            error!("failed to write dataset {}: {}", path, err);
            AppError::Internal(err)
        })?;
    info!(
        "dataset written: path={}, rows={}, users={}, fraud_rows={}",
        path, report.rows, report.users, report.fraud_rows
    );
    Ok(report)
}
