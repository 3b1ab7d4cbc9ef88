//! Cancel-and-reschedule debouncing for search input.
//!
//! Each call to [`Debouncer::schedule`] aborts the pending task and spawns a
//! new one that sleeps for the quiescence interval before delivering its
//! value. Every scheduled value carries a generation number, and the
//! receiving side drops anything older than the latest generation, so a
//! superseded value is never delivered even if its timer raced a newer
//! schedule.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const DEFAULT_QUIESCENCE: Duration = Duration::from_millis(300);

pub struct Debouncer<T> {
    delay: Duration,
    generation: Arc<AtomicU64>,
    pending: Option<JoinHandle<()>>,
    tx: mpsc::UnboundedSender<(u64, T)>,
}

pub struct Debounced<T> {
    generation: Arc<AtomicU64>,
    rx: mpsc::UnboundedReceiver<(u64, T)>,
}

/// Creates a debouncer and the receiver its surviving values arrive on.
pub fn debouncer<T: Send + 'static>(delay: Duration) -> (Debouncer<T>, Debounced<T>) {
    let generation = Arc::new(AtomicU64::new(0));
    let (tx, rx) = mpsc::unbounded_channel();
    (
        Debouncer {
            delay,
            generation: generation.clone(),
            pending: None,
            tx,
        },
        Debounced { generation, rx },
    )
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn schedule(&mut self, value: T) {
        self.abort_pending();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let tx = self.tx.clone();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send((generation, value));
        }));
    }

    /// Drops the pending value, if any.
    pub fn cancel(&mut self) {
        self.abort_pending();
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    fn abort_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl<T> Debounced<T> {
    /// Waits for the next value that survived its quiescence interval.
    /// Returns `None` once the debouncer is gone and nothing is left.
    pub async fn recv(&mut self) -> Option<T> {
        while let Some((generation, value)) = self.rx.recv().await {
            if generation == self.generation.load(Ordering::SeqCst) {
                return Some(value);
            }
            tracing::trace!(generation, "dropping superseded debounced value");
        }
        None
    }
}
