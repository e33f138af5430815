use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

use monitor_domain::{AlertSink, Evaluation, RunSummary};

use crate::utils::ensure_parent_dir;

/// Appends one JSON object per alert to a file.
pub struct JsonlAlertSink {
    path: String,
    file: Mutex<File>,
}

impl JsonlAlertSink {
    pub async fn create(path: &str) -> Result<Self> {
        ensure_parent_dir(path).await?;
        let file = File::create(path)
            .await
            .with_context(|| format!("failed to create alerts file {}", path))?;
        Ok(Self {
            path: path.to_string(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[async_trait]
impl AlertSink for JsonlAlertSink {
    async fn publish(&self, evaluation: &Evaluation) -> Result<()> {
        if !evaluation.is_alert() {
            return Ok(());
        }
        let mut line = evaluation.evidence_json();
        line.push('\n');
        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        Ok(())
    }

    async fn finish(&self, summary: &RunSummary) -> Result<()> {
        let mut file = self.file.lock().await;
        file.flush().await?;
        info!(path = %self.path, alerts = summary.alerted, "alert log written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use monitor_domain::{AlertReason, Category, Transaction};

    fn evaluation(id: &str, reasons: Vec<AlertReason>) -> Evaluation {
        Evaluation::new(
            Transaction {
                transaction_id: id.to_string(),
                timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                    .and_then(|date| date.and_hms_opt(12, 0, 0))
                    .expect("timestamp"),
                user_id: "user_1".to_string(),
                amount: 600.0,
                merchant: String::new(),
                category: Category::Retail,
                country: "US".to_string(),
                device: "Desktop".to_string(),
                ip: String::new(),
                is_fraud: false,
            },
            reasons,
        )
    }

    #[tokio::test]
    async fn writes_one_line_per_alert() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("logs/alerts.jsonl");
        let sink = JsonlAlertSink::create(&path.to_string_lossy())
            .await
            .expect("create");

        sink.publish(&evaluation("TX1", Vec::new()))
            .await
            .expect("publish");
        sink.publish(&evaluation(
            "TX2",
            vec![AlertReason::AmountSpike {
                amount: 600.0,
                threshold: 150.0,
                average: 50.0,
            }],
        ))
        .await
        .expect("publish");
        sink.finish(&RunSummary::default()).await.expect("finish");

        let content = std::fs::read_to_string(&path).expect("read");
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 1);
        let record: serde_json::Value = serde_json::from_str(lines[0]).expect("json");
        assert_eq!(record["transaction_id"], "TX2");
        assert_eq!(record["risk_level"], "HIGH");
        assert_eq!(record["rules"][0], "R1");
        assert_eq!(record["reasons"][0]["rule"], "amount_spike");
    }
}
