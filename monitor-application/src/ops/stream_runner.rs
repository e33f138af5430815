use monitor_domain::{
    AnomalyEvaluator, DomainError, EntityProfile, Evaluation, ProfileStore, Transaction,
};

/// Sequential per-stream driver: evaluate against the pre-update baseline,
/// then apply the transaction to the store.
#[derive(Debug, Default)]
pub struct StreamRunner {
    store: ProfileStore,
    evaluator: AnomalyEvaluator,
}

impl StreamRunner {
    pub fn new(evaluator: AnomalyEvaluator) -> Self {
        Self {
            store: ProfileStore::new(),
            evaluator,
        }
    }

    pub fn process(&mut self, transaction: Transaction) -> Result<Evaluation, DomainError> {
        self.store.check(&transaction)?;
        let reasons = match self.store.get_profile(&transaction.user_id) {
            Some(baseline) => self.evaluator.evaluate(&transaction, baseline),
            None => {
                let baseline = EntityProfile::first_sighting(&transaction);
                self.evaluator.evaluate(&transaction, &baseline)
            }
        };
        self.store.update(&transaction)?;
        Ok(Evaluation::new(transaction, reasons))
    }

    pub fn profiles(&self) -> &ProfileStore {
        &self.store
    }

    pub fn evaluator(&self) -> &AnomalyEvaluator {
        &self.evaluator
    }
}

/// Stable sort by timestamp; records sharing an instant keep input order.
pub fn order_stream(transactions: &mut [Transaction]) {
    transactions.sort_by_key(|transaction| transaction.timestamp);
}
