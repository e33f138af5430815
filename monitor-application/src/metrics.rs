use std::sync::atomic::{AtomicU64, Ordering};

use monitor_domain::{AlertReason, Evaluation};

#[derive(Debug, Default)]
pub struct Metrics {
    processed: AtomicU64,
    alerted: AtomicU64,
    rejected: AtomicU64,
    reasons: [AtomicU64; 5],
}

impl Metrics {
    pub fn record_evaluation(&self, evaluation: &Evaluation) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        if evaluation.is_alert() {
            self.alerted.fetch_add(1, Ordering::Relaxed);
        }
        for reason in &evaluation.reasons {
            if let Some(index) = AlertReason::RULE_IDS
                .iter()
                .position(|rule_id| *rule_id == reason.rule_id())
            {
                self.reasons[index].fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn alerted(&self) -> u64 {
        self.alerted.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn render_prometheus(&self) -> String {
        let mut out = format!(
            "# TYPE txwatch_transactions_processed_total counter\n\
txwatch_transactions_processed_total {}\n\
# TYPE txwatch_transactions_alerted_total counter\n\
txwatch_transactions_alerted_total {}\n\
# TYPE txwatch_transactions_rejected_total counter\n\
txwatch_transactions_rejected_total {}\n\
# TYPE txwatch_alert_reasons_total counter\n",
            self.processed(),
            self.alerted(),
            self.rejected()
        );
        for (rule_id, counter) in AlertReason::RULE_IDS.iter().zip(self.reasons.iter()) {
            out.push_str(&format!(
                "txwatch_alert_reasons_total{{rule=\"{}\"}} {}\n",
                rule_id,
                counter.load(Ordering::Relaxed)
            ));
        }
        out
    }
}
