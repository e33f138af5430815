use std::sync::Arc;

use monitor_domain::ports::{AlertSink, TransactionSource};
use monitor_domain::RuntimeConfig;

use crate::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub source: Arc<dyn TransactionSource>,
    pub sink: Arc<dyn AlertSink>,
    pub metrics: Arc<Metrics>,
}
