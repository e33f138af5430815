use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

use monitor_domain::{AlertSink, Evaluation, ProgressUpdate, RunSummary};

/// Forwards every call to each inner sink in order. Every sink is called even
/// when an earlier one fails; the first error is returned afterwards.
pub struct CompositeAlertSink {
    sinks: Vec<Arc<dyn AlertSink>>,
}

impl CompositeAlertSink {
    pub fn new(sinks: Vec<Arc<dyn AlertSink>>) -> Self {
        Self { sinks }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl AlertSink for CompositeAlertSink {
    async fn publish(&self, evaluation: &Evaluation) -> Result<()> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(err) = sink.publish(evaluation).await {
                warn!("alert sink failed during publish: {}", err);
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    async fn progress(&self, update: &ProgressUpdate) -> Result<()> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(err) = sink.progress(update).await {
                warn!("alert sink failed during progress: {}", err);
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    async fn finish(&self, summary: &RunSummary) -> Result<()> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(err) = sink.finish(summary).await {
                warn!("alert sink failed during finish: {}", err);
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
