use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

/// Cooperative stop flag shared by the feeding loops.
#[derive(Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
    _keepalive: Option<Arc<watch::Sender<bool>>>,
}

impl Shutdown {
    pub fn channel() -> (watch::Sender<bool>, Shutdown) {
        let (tx, rx) = watch::channel(false);
        (
            tx,
            Shutdown {
                rx,
                _keepalive: None,
            },
        )
    }

    pub fn never() -> Shutdown {
        let (tx, rx) = watch::channel(false);
        Shutdown {
            rx,
            _keepalive: Some(Arc::new(tx)),
        }
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    pub async fn triggered(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                // Sender gone without triggering: nothing can stop us anymore.
                std::future::pending::<()>().await;
            }
        }
    }

    /// Sleeps for the pacing delay; returns false when shutdown fired first.
    pub async fn pace(&mut self, delay: Duration) -> bool {
        if delay.is_zero() {
            return !self.is_triggered();
        }
        tokio::select! {
            _ = tokio::time::sleep(delay) => !self.is_triggered(),
            _ = self.triggered() => false,
        }
    }
}
