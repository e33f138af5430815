use anyhow::Result;
use chrono::Local;
use tokio::fs;
use tracing::{info, warn};

use monitor_application::commands::export_commands::{export_dataset, ExportReport};
use monitor_application::commands::monitor_commands::run_monitor;
use monitor_application::ops::Shutdown;
use monitor_domain::RunSummary;
use monitor_infrastructure::{ensure_parent_dir, AppConfig, DatasetGenerator, FileTransactionRepository};

use crate::context::AppContext;

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct MonitorOverrides {
    pub input: Option<String>,
    pub delay_ms: Option<u64>,
    pub workers: Option<usize>,
    pub alerts_out: Option<String>,
    pub rules: Option<String>,
    pub no_sort: bool,
}

impl MonitorOverrides {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(input) = &self.input {
            config.input_path = input.clone();
        }
        if let Some(delay_ms) = self.delay_ms {
            config.delay_ms = delay_ms;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(alerts_out) = &self.alerts_out {
            config.alerts_path = Some(alerts_out.clone());
        }
        if let Some(rules) = &self.rules {
            config.rules_path = Some(rules.clone());
        }
        if self.no_sort {
            config.sort_input = false;
        }
        config.normalize();
    }
}

#[derive(Debug, Clone, Default)]
pub struct GenerateOverrides {
    pub output: Option<String>,
    pub users: Option<usize>,
    pub seed: Option<u64>,
    pub fraud_rate: Option<f64>,
}

impl GenerateOverrides {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(output) = &self.output {
            config.generator_output = output.clone();
        }
        if let Some(users) = self.users {
            config.generator_users = users;
        }
        if let Some(seed) = self.seed {
            config.generator_seed = seed;
        }
        if let Some(fraud_rate) = self.fraud_rate {
            config.generator_fraud_rate = fraud_rate;
        }
        config.normalize();
    }
}

pub async fn run_monitor_command(overrides: MonitorOverrides) -> Result<RunSummary> {
    let mut config = AppConfig::load().await?;
    overrides.apply(&mut config);
    config.validate()?;

    let context = AppContext::new(&config).await?;
    let state = context.state;

    let (stop_tx, shutdown) = Shutdown::channel();
    let signal = tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown requested, stopping after the current transaction");
        let _ = stop_tx.send(true);
    });

    let result = run_monitor(&state, shutdown).await;
    signal.abort();
    let summary = result?;

    if let Some(path) = &config.metrics_path {
        ensure_parent_dir(path).await?;
        fs::write(path, state.metrics.render_prometheus()).await?;
        info!("metrics written to {}", path);
    }
    info!(
        processed = summary.processed,
        alerted = summary.alerted,
        profiles = summary.profiles,
        cancelled = summary.cancelled,
        "monitoring finished"
    );
    Ok(summary)
}

pub async fn run_generate_command(overrides: GenerateOverrides) -> Result<ExportReport> {
    let mut config = AppConfig::load().await?;
    overrides.apply(&mut config);
    config.validate()?;

    let generator_config = config.to_generator_config();
    let output = generator_config.output_path.clone();
    let generator = DatasetGenerator::new(generator_config).with_rules(config.rule_set());
    let transactions = generator.generate(Local::now().naive_local());

    let writer = FileTransactionRepository::new();
    let report = export_dataset(&writer, &output, transactions).await?;
    let fraud_share = if report.rows == 0 {
        0.0
    } else {
        report.fraud_rows as f64 / report.rows as f64
    };
    info!(
        "generated {} rows for {} users, fraud share {:.4}",
        report.rows, report.users, fraud_share
    );
    Ok(report)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
