use std::time::Duration;

use monitor_domain::{AnomalyEvaluator, Evaluation, ProgressUpdate, RunSummary, Transaction};
use tracing::{error, info, warn};

use crate::ops::stream_runner::order_stream;
use crate::ops::{ShardPool, Shutdown, StreamRunner};
use crate::{AppError, AppState};

/// Loads the configured input and monitors it to completion or shutdown.
pub async fn run_monitor(state: &AppState, shutdown: Shutdown) -> Result<RunSummary, AppError> {
    let mut transactions = state
        .source
        .load_transactions(&state.config.input_path)
        .await
        .map_err(|err| {
            error!("failed to load transactions from {}: {}", state.config.input_path, err);
            AppError::Internal(err)
        })?;
    if state.config.sort_input {
        order_stream(&mut transactions);
    }
    info!(
        "monitoring {} transactions from {} with {} worker(s)",
        transactions.len(),
        state.config.input_path,
        state.config.workers.max(1)
    );
    process_stream(state, transactions, shutdown).await
}

/// Drives an already ordered stream through the engine and the sink.
pub async fn process_stream(
    state: &AppState,
    transactions: Vec<Transaction>,
    shutdown: Shutdown,
) -> Result<RunSummary, AppError> {
    let evaluator = AnomalyEvaluator::new(state.config.rules.clone());
    let mut summary = if state.config.workers > 1 {
        process_sharded(state, evaluator, transactions, shutdown).await?
    } else {
        process_sequential(state, evaluator, transactions, shutdown).await?
    };
    if summary.cancelled {
        warn!("monitoring cancelled after {} transactions", summary.processed);
    }
    if let Err(err) = state.sink.finish(&summary).await {
        warn!("failed to publish run summary: {}", err);
    }
    info!(
        "monitoring finished: processed={}, alerted={}, profiles={}",
        summary.processed, summary.alerted, summary.profiles
    );
    Ok(summary)
}

async fn process_sequential(
    state: &AppState,
    evaluator: AnomalyEvaluator,
    transactions: Vec<Transaction>,
    mut shutdown: Shutdown,
) -> Result<RunSummary, AppError> {
    let total = transactions.len() as u64;
    let delay = Duration::from_millis(state.config.delay_ms);
    let mut runner = StreamRunner::new(evaluator);
    let mut summary = RunSummary::default();

    for transaction in transactions {
        if !shutdown.pace(delay).await {
            summary.cancelled = true;
            break;
        }
        let evaluation = match runner.process(transaction) {
            Ok(evaluation) => evaluation,
            Err(err) => {
                state.metrics.record_rejected();
                error!("stream rejected: {}", err);
                return Err(err.into());
            }
        };
        deliver(state, &mut summary, &evaluation, total).await;
    }

    summary.profiles = runner.profiles().len();
    Ok(summary)
}

async fn process_sharded(
    state: &AppState,
    evaluator: AnomalyEvaluator,
    transactions: Vec<Transaction>,
    shutdown: Shutdown,
) -> Result<RunSummary, AppError> {
    let total = transactions.len() as u64;
    let delay = Duration::from_millis(state.config.delay_ms);
    let pool = ShardPool::new(state.config.workers, evaluator);
    let mut run = pool.start(transactions, delay, shutdown);
    let mut summary = RunSummary::default();

    while let Some(result) = run.next().await {
        match result {
            Ok(evaluation) => deliver(state, &mut summary, &evaluation, total).await,
            Err(err) => {
                state.metrics.record_rejected();
                error!("stream rejected: {}", err);
                if let Err(join_err) = run.join().await {
                    warn!("shards did not stop cleanly: {}", join_err);
                }
                return Err(err.into());
            }
        }
    }

    let outcome = run.join().await.map_err(|err| {
        error!("sharded stream failed: {}", err);
        err
    })?;
    summary.profiles = outcome.profiles;
    summary.cancelled = outcome.cancelled;
    Ok(summary)
}

async fn deliver(state: &AppState, summary: &mut RunSummary, evaluation: &Evaluation, total: u64) {
    state.metrics.record_evaluation(evaluation);
    summary.record(evaluation);
    if let Err(err) = state.sink.publish(evaluation).await {
        warn!(
            "failed to publish evaluation for {}: {}",
            evaluation.transaction.transaction_id, err
        );
    }
    let every = state.config.progress_every.max(1);
    if summary.processed % every == 0 {
        let update = ProgressUpdate {
            processed: summary.processed,
            total,
            alerted: summary.alerted,
        };
        if let Err(err) = state.sink.progress(&update).await {
            warn!("failed to publish progress: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{NaiveDate, NaiveDateTime};
    use monitor_domain::ports::{AlertSink, TransactionSource};
    use monitor_domain::{AlertReason, Category, DomainError, RuntimeConfig};
    use tokio::sync::Mutex;

    use crate::Metrics;

    #[derive(Default)]
    struct MemorySink {
        evaluations: Mutex<Vec<Evaluation>>,
        progress: Mutex<Vec<ProgressUpdate>>,
        summaries: Mutex<Vec<RunSummary>>,
    }

    #[async_trait]
    impl AlertSink for MemorySink {
        async fn publish(&self, evaluation: &Evaluation) -> anyhow::Result<()> {
            self.evaluations.lock().await.push(evaluation.clone());
            Ok(())
        }

        async fn progress(&self, update: &ProgressUpdate) -> anyhow::Result<()> {
            self.progress.lock().await.push(update.clone());
            Ok(())
        }

        async fn finish(&self, summary: &RunSummary) -> anyhow::Result<()> {
            self.summaries.lock().await.push(summary.clone());
            Ok(())
        }
    }

    struct FixedSource(Vec<Transaction>);

    #[async_trait]
    impl TransactionSource for FixedSource {
        async fn load_transactions(&self, _path: &str) -> anyhow::Result<Vec<Transaction>> {
            Ok(self.0.clone())
        }
    }

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 4, 1)
            .and_then(|date| date.and_hms_opt(hour, minute, 0))
            .expect("valid date")
    }

    fn tx(id: &str, entity: &str, timestamp: NaiveDateTime, amount: f64, category: Category) -> Transaction {
        Transaction {
            transaction_id: id.to_string(),
            timestamp,
            user_id: entity.to_string(),
            amount,
            merchant: "Acme".to_string(),
            category,
            country: "US".to_string(),
            device: "d1".to_string(),
            ip: "10.0.0.1".to_string(),
            is_fraud: false,
        }
    }

    fn state_with(transactions: Vec<Transaction>, config: RuntimeConfig) -> (AppState, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::default());
        let state = AppState {
            config,
            source: Arc::new(FixedSource(transactions)),
            sink: sink.clone(),
            metrics: Arc::new(Metrics::default()),
        };
        (state, sink)
    }

    #[tokio::test]
    async fn run_monitor_sorts_and_reports() {
        let transactions = vec![
            tx("T2", "E1", at(10, 5), 500.0, Category::Retail),
            tx("T1", "E1", at(10, 0), 100.0, Category::Retail),
            tx("T3", "E2", at(2, 0), 20.0, Category::Travel),
        ];
        let config = RuntimeConfig {
            progress_every: 2,
            ..RuntimeConfig::default()
        };
        let (state, sink) = state_with(transactions, config);

        let summary = run_monitor(&state, Shutdown::never()).await.expect("run");

        assert_eq!(summary.processed, 3);
        assert_eq!(summary.alerted, 2);
        assert_eq!(summary.profiles, 2);
        assert_eq!(summary.reasons_by_rule.get("amount_spike"), Some(&1));
        assert_eq!(summary.reasons_by_rule.get("off_hours"), Some(&1));
        assert_eq!(summary.reasons_by_rule.get("high_risk_category"), Some(&1));

        let evaluations = sink.evaluations.lock().await;
        let ids: Vec<&str> = evaluations
            .iter()
            .map(|evaluation| evaluation.transaction.transaction_id.as_str())
            .collect();
        assert_eq!(ids, vec!["T3", "T1", "T2"]);
        assert_eq!(
            evaluations[0].reasons,
            vec![
                AlertReason::OffHours { hour: 2, minute: 0 },
                AlertReason::HighRiskCategory {
                    category: Category::Travel,
                },
            ]
        );
        assert!(evaluations[1].reasons.is_empty());
        assert_eq!(sink.progress.lock().await.len(), 1);
        assert_eq!(sink.summaries.lock().await.len(), 1);
        assert_eq!(state.metrics.processed(), 3);
    }

    #[tokio::test]
    async fn unsorted_input_is_rejected_when_sorting_disabled() {
        let transactions = vec![
            tx("T2", "E1", at(11, 0), 10.0, Category::Retail),
            tx("T1", "E1", at(10, 0), 10.0, Category::Retail),
        ];
        let config = RuntimeConfig {
            sort_input: false,
            ..RuntimeConfig::default()
        };
        let (state, sink) = state_with(transactions, config);

        let err = run_monitor(&state, Shutdown::never()).await.expect_err("ordering");
        assert!(matches!(err, AppError::Domain(DomainError::OutOfOrder { .. })));
        assert_eq!(sink.evaluations.lock().await.len(), 1);
        assert_eq!(state.metrics.rejected(), 1);
        assert!(sink.summaries.lock().await.is_empty());
    }

    #[tokio::test]
    async fn sharded_run_matches_sequential_summary() {
        let mut transactions = Vec::new();
        for minute in 0..20u32 {
            let entity = format!("E{}", minute % 5);
            let amount = if minute % 7 == 6 { 900.0 } else { 50.0 };
            transactions.push(tx(&format!("T{}", minute), &entity, at(8, minute), amount, Category::Services));
        }

        let (sequential_state, _) = state_with(transactions.clone(), RuntimeConfig::default());
        let sequential = run_monitor(&sequential_state, Shutdown::never())
            .await
            .expect("sequential");

        let config = RuntimeConfig {
            workers: 3,
            ..RuntimeConfig::default()
        };
        let (sharded_state, sink) = state_with(transactions, config);
        let sharded = run_monitor(&sharded_state, Shutdown::never()).await.expect("sharded");

        assert_eq!(sharded, sequential);
        assert_eq!(sink.evaluations.lock().await.len(), 20);
    }

    #[tokio::test]
    async fn sharded_run_stops_publishing_at_rejected_record() {
        let mut transactions = vec![
            tx("B2", "BAD", at(9, 0), 10.0, Category::Retail),
            tx("B1", "BAD", at(8, 0), 10.0, Category::Retail),
        ];
        for index in 0..200u32 {
            let entity = format!("OK{}", index % 3);
            transactions.push(tx(
                &format!("K{}", index),
                &entity,
                at(10 + index / 60, index % 60),
                25.0,
                Category::Retail,
            ));
        }

        for workers in [1, 4] {
            let config = RuntimeConfig {
                workers,
                sort_input: false,
                ..RuntimeConfig::default()
            };
            let (state, sink) = state_with(transactions.clone(), config);

            let err = run_monitor(&state, Shutdown::never()).await.expect_err("ordering");
            assert!(matches!(err, AppError::Domain(DomainError::OutOfOrder { .. })));
            let evaluations = sink.evaluations.lock().await;
            assert_eq!(evaluations.len(), 1, "workers = {}", workers);
            assert_eq!(evaluations[0].transaction.transaction_id, "B2");
            assert_eq!(state.metrics.processed(), 1);
            assert_eq!(state.metrics.rejected(), 1);
            assert!(sink.summaries.lock().await.is_empty());
        }
    }

    #[tokio::test]
    async fn cancelled_run_reports_partial_summary() {
        let transactions = vec![tx("T1", "E1", at(10, 0), 10.0, Category::Retail)];
        let (state, sink) = state_with(transactions, RuntimeConfig::default());
        let (tx_stop, shutdown) = Shutdown::channel();
        tx_stop.send(true).expect("send");

        let summary = run_monitor(&state, shutdown).await.expect("run");
        assert!(summary.cancelled);
        assert_eq!(summary.processed, 0);
        assert!(sink.evaluations.lock().await.is_empty());
    }
}
