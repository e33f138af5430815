use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use monitor_domain::{AnomalyEvaluator, DomainError, Evaluation, Transaction};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::ops::{Shutdown, StreamRunner};
use crate::AppError;

const CHANNEL_BUFFER: usize = 256;
const NOT_HALTED: u64 = u64::MAX;

type Sequenced<T> = (u64, T);
type ShardResult = Sequenced<Result<Evaluation, DomainError>>;

/// Entity-partitioned processing. Each shard owns a StreamRunner, so an
/// entity's subsequence stays on one task and keeps its delivery order.
pub struct ShardPool {
    workers: usize,
    evaluator: AnomalyEvaluator,
}

/// A started sharded run. Results are released in feed order, so the
/// published stream is the one a sequential run would produce.
pub struct ShardRun {
    results: mpsc::Receiver<ShardResult>,
    pending: BTreeMap<u64, Result<Evaluation, DomainError>>,
    next_seq: u64,
    halted: bool,
    // Sequence number of the earliest rejected record.
    halt_at: Arc<AtomicU64>,
    feeder: JoinHandle<bool>,
    shards: Vec<JoinHandle<usize>>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ShardOutcome {
    pub profiles: usize,
    pub cancelled: bool,
}

impl ShardPool {
    pub fn new(workers: usize, evaluator: AnomalyEvaluator) -> Self {
        Self {
            workers: workers.max(1),
            evaluator,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Starts the shards and the feeder. Pull results with `ShardRun::next`
    /// and call `ShardRun::join` afterwards.
    pub fn start(&self, transactions: Vec<Transaction>, delay: Duration, shutdown: Shutdown) -> ShardRun {
        let halt_at = Arc::new(AtomicU64::new(NOT_HALTED));
        let (result_tx, result_rx) = mpsc::channel(CHANNEL_BUFFER);
        let mut senders = Vec::with_capacity(self.workers);
        let mut shards = Vec::with_capacity(self.workers);
        for shard in 0..self.workers {
            let (tx, rx) = mpsc::channel(CHANNEL_BUFFER);
            let runner = StreamRunner::new(self.evaluator.clone());
            shards.push(tokio::spawn(run_shard(
                shard,
                runner,
                rx,
                result_tx.clone(),
                halt_at.clone(),
            )));
            senders.push(tx);
        }
        drop(result_tx);

        let feeder = tokio::spawn(feed(transactions, senders, delay, shutdown, halt_at.clone()));
        ShardRun {
            results: result_rx,
            pending: BTreeMap::new(),
            next_seq: 0,
            halted: false,
            halt_at,
            feeder,
            shards,
        }
    }
}

impl ShardRun {
    /// Next result in feed order. After a rejected record is returned the
    /// run is halted and no further results are released.
    pub async fn next(&mut self) -> Option<Result<Evaluation, DomainError>> {
        if self.halted {
            return None;
        }
        loop {
            if let Some(result) = self.pending.remove(&self.next_seq) {
                if result.is_err() {
                    self.halted = true;
                    self.halt_at.fetch_min(self.next_seq, Ordering::SeqCst);
                }
                self.next_seq += 1;
                return Some(result);
            }
            match self.results.recv().await {
                Some((seq, result)) => {
                    self.pending.insert(seq, result);
                }
                None => return None,
            }
        }
    }

    pub async fn join(mut self) -> Result<ShardOutcome, AppError> {
        // Shards still sending after a halt must not block on a full channel.
        self.results.close();
        let cancelled = self
            .feeder
            .await
            .map_err(|err| AppError::Internal(anyhow::anyhow!("feeder task failed: {}", err)))?;
        let mut outcome = ShardOutcome {
            profiles: 0,
            cancelled,
        };
        for handle in self.shards {
            let profiles = handle
                .await
                .map_err(|err| AppError::Internal(anyhow::anyhow!("shard task failed: {}", err)))?;
            outcome.profiles += profiles;
        }
        Ok(outcome)
    }
}

/// FNV-1a over the entity id; stable for the lifetime of a run.
pub fn shard_for(entity_id: &str, workers: usize) -> usize {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in entity_id.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    (hash % workers.max(1) as u64) as usize
}

async fn run_shard(
    shard: usize,
    mut runner: StreamRunner,
    mut rx: mpsc::Receiver<Sequenced<Transaction>>,
    results: mpsc::Sender<ShardResult>,
    halt_at: Arc<AtomicU64>,
) -> usize {
    while let Some((seq, transaction)) = rx.recv().await {
        // records fed before the halting one are still owed to the consumer
        if seq > halt_at.load(Ordering::SeqCst) {
            debug!("shard {} halted at sequence {}", shard, seq);
            break;
        }
        let result = runner.process(transaction);
        let rejected = result.is_err();
        if rejected {
            halt_at.fetch_min(seq, Ordering::SeqCst);
        }
        if results.send((seq, result)).await.is_err() {
            debug!("shard {} result receiver dropped", shard);
            break;
        }
        if rejected {
            break;
        }
    }
    runner.profiles().len()
}

// Returns true when the feed stopped because of shutdown.
async fn feed(
    transactions: Vec<Transaction>,
    senders: Vec<mpsc::Sender<Sequenced<Transaction>>>,
    delay: Duration,
    mut shutdown: Shutdown,
    halt_at: Arc<AtomicU64>,
) -> bool {
    let workers = senders.len();
    for (seq, transaction) in (0u64..).zip(transactions) {
        if !shutdown.pace(delay).await {
            return true;
        }
        if halt_at.load(Ordering::SeqCst) != NOT_HALTED {
            debug!("feeder halted before sequence {}", seq);
            return false;
        }
        let shard = shard_for(&transaction.user_id, workers);
        if senders[shard].send((seq, transaction)).await.is_err() {
            warn!("shard {} stopped accepting transactions", shard);
            return false;
        }
    }
    false
}
