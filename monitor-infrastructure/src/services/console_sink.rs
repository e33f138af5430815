use std::io::{self, Stdout, Write};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use monitor_domain::{
    format_timestamp, AlertSink, Evaluation, ProgressUpdate, RunSummary,
};

const RULE_WIDTH: usize = 60;

/// Human-readable alert output. Evaluations without reasons print nothing.
pub struct ConsoleAlertSink<W: Write + Send> {
    out: Mutex<W>,
}

impl ConsoleAlertSink<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ConsoleAlertSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_text(&self, text: &str) -> Result<()> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| anyhow!("console writer lock poisoned"))?;
        out.write_all(text.as_bytes())?;
        out.flush()?;
        Ok(())
    }
}

pub fn render_alert(evaluation: &Evaluation) -> String {
    let tx = &evaluation.transaction;
    let rule = "═".repeat(RULE_WIDTH);
    let mut text = String::new();
    text.push('\n');
    text.push_str(&rule);
    text.push('\n');
    text.push_str("⚠ POTENTIAL FRAUD ALERT ⚠\n");
    text.push_str(&format!("Transaction ID: {}\n", tx.transaction_id));
    text.push_str(&format!(
        "User: {} | Amount: {} | Date: {}\n",
        tx.user_id,
        tx.amount,
        format_timestamp(&tx.timestamp)
    ));
    text.push_str(&format!("Merchant: {} ({})\n", tx.merchant, tx.category));
    text.push_str("\nAlert reasons:\n");
    for (index, reason) in evaluation.reasons.iter().enumerate() {
        text.push_str(&format!("{}. {}\n", index + 1, reason));
    }
    text.push_str(&rule);
    text.push_str("\n\n");
    text
}

pub fn render_progress(update: &ProgressUpdate) -> String {
    format!(
        "Progress: {}/{} transactions analyzed | Alerts: {}\n",
        update.processed, update.total, update.alerted
    )
}

#[async_trait]
impl<W: Write + Send> AlertSink for ConsoleAlertSink<W> {
    async fn publish(&self, evaluation: &Evaluation) -> Result<()> {
        if !evaluation.is_alert() {
            return Ok(());
        }
        self.write_text(&render_alert(evaluation))
    }

    async fn progress(&self, update: &ProgressUpdate) -> Result<()> {
        self.write_text(&render_progress(update))
    }

    async fn finish(&self, summary: &RunSummary) -> Result<()> {
        let status = if summary.cancelled {
            "Monitoring cancelled"
        } else {
            "Monitoring completed!"
        };
        self.write_text(&format!(
            "\n{} {} transactions analyzed, {} alerts.\n",
            status, summary.processed, summary.alerted
        ))
    }
}
