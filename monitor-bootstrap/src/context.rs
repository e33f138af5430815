use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use monitor_application::{AppState, Metrics};
use monitor_domain::AlertSink;
use monitor_infrastructure::{
    resolve_rule_set, validate_input_extension, AppConfig, CompositeAlertSink,
    ConsoleAlertSink, FileTransactionRepository, JsonlAlertSink,
};

pub struct AppContext {
    pub state: AppState,
}

impl AppContext {
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let mut runtime_config = config.to_runtime_config();
        validate_input_extension(&runtime_config.input_path)?;
        runtime_config.rules =
            resolve_rule_set(config.rules_path.as_deref(), runtime_config.rules).await?;

        let mut sinks: Vec<Arc<dyn AlertSink>> = vec![Arc::new(ConsoleAlertSink::stdout())];
        if let Some(path) = &runtime_config.alerts_path {
            let jsonl = JsonlAlertSink::create(path).await?;
            info!("writing alert records to {}", jsonl.path());
            sinks.push(Arc::new(jsonl));
        }
        let sink: Arc<dyn AlertSink> = if sinks.len() == 1 {
            sinks.remove(0)
        } else {
            Arc::new(CompositeAlertSink::new(sinks))
        };

        let state = AppState {
            config: runtime_config,
            source: Arc::new(FileTransactionRepository::new()),
            sink,
            metrics: Arc::new(Metrics::default()),
        };

        Ok(Self { state })
    }
}
