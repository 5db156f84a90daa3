use crate::app::Orchestrator;
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

/// Interval between timer-driven refreshes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

// A manual refresh that arrives while this many are queued is coalesced.
const MANUAL_QUEUE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Timer,
    Manual,
}

/// Cloneable handle for requesting an out-of-schedule refresh.
#[derive(Debug, Clone)]
pub struct RefreshTrigger {
    tx: mpsc::Sender<()>,
}

impl RefreshTrigger {
    /// Returns false if the poller has stopped or the request queue is full.
    pub fn refresh_now(&self) -> bool {
        self.tx.try_send(()).is_ok()
    }
}

pub struct PollerHandle {
    trigger: RefreshTrigger,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn refresh_now(&self) -> bool {
        self.trigger.refresh_now()
    }

    pub fn trigger(&self) -> RefreshTrigger {
        self.trigger.clone()
    }

    /// Stops the timer, aborts in-flight refreshes and waits for the loop to exit.
    pub async fn shutdown(mut self) -> anyhow::Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        (&mut self.task).await.context("poller task failed")?;
        Ok(())
    }
}

pub struct Poller;

impl Poller {
    /// Refreshes immediately, then every `interval`, plus on manual triggers.
    pub fn spawn(app: Arc<Orchestrator>, interval: Duration) -> PollerHandle {
        let (tx, manual_rx) = mpsc::channel(MANUAL_QUEUE);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(run(app, interval, manual_rx, shutdown_rx));

        PollerHandle {
            trigger: RefreshTrigger { tx },
            shutdown_tx: Some(shutdown_tx),
            task,
        }
    }
}

async fn run(
    app: Arc<Orchestrator>,
    interval: Duration,
    mut manual_rx: mpsc::Receiver<()>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut in_flight = JoinSet::new();

    tracing::info!(?interval, "poller started");

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown_rx => break,
            _ = ticker.tick() => spawn_refresh(&mut in_flight, &app, Trigger::Timer),
            Some(()) = manual_rx.recv() => spawn_refresh(&mut in_flight, &app, Trigger::Manual),
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(err) = joined {
                    if err.is_panic() {
                        tracing::error!(error = %err, "refresh task panicked");
                    }
                }
            }
        }
    }

    // Late responses must not reach the store once we are torn down.
    in_flight.abort_all();
    app.shutdown();
    while in_flight.join_next().await.is_some() {}

    tracing::info!("poller stopped");
}

fn spawn_refresh(in_flight: &mut JoinSet<()>, app: &Arc<Orchestrator>, trigger: Trigger) {
    let app = Arc::clone(app);
    in_flight.spawn(async move {
        let report = app.refresh().await;
        tracing::debug!(?trigger, seq = report.seq, outcome = ?report.outcome, "refresh finished");
    });
}
