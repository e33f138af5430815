use async_trait::async_trait;

use crate::entities::{Evaluation, ProgressUpdate, RunSummary};

/// Presentation side of the stream. Receives every evaluation, including the
/// ones without reasons.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn publish(&self, evaluation: &Evaluation) -> anyhow::Result<()>;

    async fn progress(&self, _update: &ProgressUpdate) -> anyhow::Result<()> {
        Ok(())
    }

    async fn finish(&self, _summary: &RunSummary) -> anyhow::Result<()> {
        Ok(())
    }
}
