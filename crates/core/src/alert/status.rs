use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// How long a dispatch result stays visible.
pub const STATUS_TTL: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertStatus {
    pub ticker: String,
    pub success: bool,
    pub message: String,
}

impl AlertStatus {
    pub fn sent(ticker: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            success: true,
            message: format!("Alert sent for {ticker}"),
        }
    }

    pub fn failed(ticker: &str, message: impl Into<String>) -> Self {
        Self {
            ticker: ticker.to_string(),
            success: false,
            message: message.into(),
        }
    }
}

/// Single-entry, self-expiring holder for the latest dispatch result.
///
/// A publish overwrites whatever is shown and restarts the expiry timer.
#[derive(Debug, Clone)]
pub struct StatusSlot {
    inner: Arc<SlotInner>,
}

#[derive(Debug)]
struct SlotInner {
    tx: watch::Sender<Option<AlertStatus>>,
    generation: AtomicU64,
    clear_task: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
    ttl: Duration,
}

impl Default for StatusSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusSlot {
    pub fn new() -> Self {
        Self::with_ttl(STATUS_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            inner: Arc::new(SlotInner {
                tx,
                generation: AtomicU64::new(0),
                clear_task: Mutex::new(None),
                closed: AtomicBool::new(false),
                ttl,
            }),
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn publish(&self, status: AlertStatus) {
        if self.inner.closed.load(Ordering::SeqCst) {
            tracing::debug!(ticker = %status.ticker, "status slot closed; dropping alert status");
            return;
        }

        let mut clear_task = self
            .inner
            .clear_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(prev) = clear_task.take() {
            prev.abort();
        }

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.tx.send_replace(Some(status));

        let inner = Arc::clone(&self.inner);
        *clear_task = Some(tokio::spawn(async move {
            tokio::time::sleep(inner.ttl).await;
            // A newer publish bumps the generation; only clear our own status.
            inner.tx.send_if_modified(|current| {
                if inner.generation.load(Ordering::SeqCst) == generation && current.is_some() {
                    *current = None;
                    true
                } else {
                    false
                }
            });
        }));
    }

    pub fn current(&self) -> Option<AlertStatus> {
        self.inner.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<AlertStatus>> {
        self.inner.tx.subscribe()
    }

    /// Cancels the pending expiry and rejects further publishes.
    pub fn shutdown(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        let mut clear_task = self
            .inner
            .clear_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(task) = clear_task.take() {
            task.abort();
        }
        self.inner.tx.send_replace(None);
    }
}
