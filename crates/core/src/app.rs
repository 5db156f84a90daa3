use crate::alert::{AlertDispatcher, AlertStatus};
use crate::domain::signal::{classify, Signal};
use crate::domain::trend::{SourceCounts, Trend};
use crate::ingest::{FetchError, TrendsSource};
use crate::policy::AutoAlertPolicy;
use crate::store::{ApplyOutcome, TrendStore};
use crate::view::{self, Filter, TrendRow};
use chrono::{DateTime, NaiveDateTime, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::time::Instant;

/// User-controlled state shared by the front ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Preferences {
    pub filter: Filter,
    pub auto_alerts: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            filter: Filter::All,
            auto_alerts: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Updated { count: usize },
    Failed(FetchError),
    Stale,
    Stopped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefreshReport {
    pub seq: u64,
    pub outcome: RefreshOutcome,
    pub alerts: Vec<AlertStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManualAlertError {
    UnknownTicker(String),
    NotActionable { ticker: String, signal: Signal },
}

impl fmt::Display for ManualAlertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManualAlertError::UnknownTicker(ticker) => {
                write!(f, "{ticker} is not in the displayed trend list")
            }
            ManualAlertError::NotActionable { ticker, signal } => {
                write!(f, "{ticker} is {signal}; only BUY and SELL can be alerted")
            }
        }
    }
}

impl std::error::Error for ManualAlertError {}

/// Everything a front end needs to draw one frame.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub rows: Vec<TrendRow>,
    pub total: usize,
    pub filter: Filter,
    pub auto_alerts: bool,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    pub upstream_updated: Option<NaiveDateTime>,
    pub sources: Option<SourceCounts>,
    pub loading: bool,
    pub initial_loading: bool,
    pub alert_status: Option<AlertStatus>,
}

/// Top-level application state: owns the trend store, the auto-alert policy and the
/// user preferences, and wires fetch results through to the dispatcher.
pub struct Orchestrator {
    source: Arc<dyn TrendsSource>,
    dispatcher: AlertDispatcher,
    store: Mutex<TrendStore>,
    policy: Mutex<AutoAlertPolicy>,
    prefs: Mutex<Preferences>,
    stopped: AtomicBool,
    updates: watch::Sender<u64>,
}

impl Orchestrator {
    pub fn new(
        source: Arc<dyn TrendsSource>,
        dispatcher: AlertDispatcher,
        policy: AutoAlertPolicy,
        prefs: Preferences,
    ) -> Self {
        let (updates, _rx) = watch::channel(0);
        Self {
            source,
            dispatcher,
            store: Mutex::new(TrendStore::new()),
            policy: Mutex::new(policy),
            prefs: Mutex::new(prefs),
            stopped: AtomicBool::new(false),
            updates,
        }
    }

    /// One poll cycle. Timer-driven and manual refreshes both come through here.
    pub async fn refresh(&self) -> RefreshReport {
        let ticket = self.store().begin();
        let seq = ticket.seq();
        tracing::debug!(seq, source = self.source.source_name(), "refresh started");

        let result = self.source.fetch_trends().await;

        if self.stopped.load(Ordering::SeqCst) {
            tracing::debug!(seq, "orchestrator stopped; ignoring late refresh response");
            return RefreshReport {
                seq,
                outcome: RefreshOutcome::Stopped,
                alerts: Vec::new(),
            };
        }

        let outcome = self.store().apply(ticket, result, Utc::now());
        match outcome {
            ApplyOutcome::Updated(trends) => {
                self.notify();
                tracing::info!(seq, count = trends.len(), "trends updated");

                let alerts = if self.preferences().auto_alerts {
                    self.auto_alert(&trends).await
                } else {
                    Vec::new()
                };

                RefreshReport {
                    seq,
                    outcome: RefreshOutcome::Updated {
                        count: trends.len(),
                    },
                    alerts,
                }
            }
            ApplyOutcome::Failed(err) => {
                self.notify();
                tracing::error!(seq, error = %err, "trend refresh failed; keeping previous data");
                RefreshReport {
                    seq,
                    outcome: RefreshOutcome::Failed(err),
                    alerts: Vec::new(),
                }
            }
            ApplyOutcome::Stale => {
                self.notify();
                tracing::debug!(seq, "dropping stale refresh response");
                RefreshReport {
                    seq,
                    outcome: RefreshOutcome::Stale,
                    alerts: Vec::new(),
                }
            }
        }
    }

    async fn auto_alert(&self, trends: &[Trend]) -> Vec<AlertStatus> {
        let picked = lock(&self.policy).select(trends, Instant::now());
        if picked.is_empty() {
            return Vec::new();
        }

        tracing::info!(count = picked.len(), "dispatching auto-alerts");
        join_all(
            picked
                .iter()
                .map(|(trend, signal)| self.dispatcher.send_alert(trend, *signal)),
        )
        .await
    }

    /// User-initiated alert for a displayed BUY or SELL row. Ignores the auto-alert flag.
    /// Rows hidden by the current filter are treated as unknown.
    pub async fn send_manual_alert(&self, ticker: &str) -> Result<AlertStatus, ManualAlertError> {
        let filter = self.preferences().filter;
        let shown = view::visible(self.store().trends(), filter);
        let trend = shown
            .into_iter()
            .find(|t| t.matches_ticker(ticker))
            .ok_or_else(|| ManualAlertError::UnknownTicker(ticker.trim().to_string()))?;

        let signal = classify(trend.momentum, trend.sentiment);
        if !signal.is_actionable() {
            return Err(ManualAlertError::NotActionable {
                ticker: trend.ticker,
                signal,
            });
        }

        Ok(self.dispatcher.send_alert(&trend, signal).await)
    }

    pub fn preferences(&self) -> Preferences {
        *lock(&self.prefs)
    }

    pub fn set_filter(&self, filter: Filter) {
        lock(&self.prefs).filter = filter;
        self.notify();
    }

    pub fn set_auto_alerts(&self, enabled: bool) {
        lock(&self.prefs).auto_alerts = enabled;
        tracing::info!(enabled, "auto-alerts toggled");
        self.notify();
    }

    pub fn toggle_auto_alerts(&self) -> bool {
        let enabled = {
            let mut prefs = lock(&self.prefs);
            prefs.auto_alerts = !prefs.auto_alerts;
            prefs.auto_alerts
        };
        tracing::info!(enabled, "auto-alerts toggled");
        self.notify();
        enabled
    }

    pub fn view(&self) -> DashboardView {
        self.view_for(self.preferences().filter)
    }

    /// Same as [`Orchestrator::view`] but with a one-off filter; preferences are untouched.
    pub fn view_for(&self, filter: Filter) -> DashboardView {
        let prefs = self.preferences();
        let snapshot = self.store().snapshot();
        DashboardView {
            rows: view::rows(&snapshot.trends, filter),
            total: snapshot.trends.len(),
            filter,
            auto_alerts: prefs.auto_alerts,
            error: snapshot.error,
            last_updated: snapshot.last_updated,
            upstream_updated: snapshot.upstream_updated,
            sources: snapshot.sources,
            loading: snapshot.loading,
            initial_loading: snapshot.initial_loading,
            alert_status: self.dispatcher.status().current(),
        }
    }

    pub fn alert_status(&self) -> Option<AlertStatus> {
        self.dispatcher.status().current()
    }

    pub fn subscribe_alert_status(&self) -> watch::Receiver<Option<AlertStatus>> {
        self.dispatcher.status().subscribe()
    }

    /// Bumped whenever the store or the preferences change.
    pub fn subscribe_updates(&self) -> watch::Receiver<u64> {
        self.updates.subscribe()
    }

    /// Stops acting on late responses and cancels the pending status expiry.
    pub fn shutdown(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.dispatcher.status().shutdown();
    }

    fn notify(&self) {
        self.updates.send_modify(|n| *n = n.wrapping_add(1));
    }

    fn store(&self) -> MutexGuard<'_, TrendStore> {
        lock(&self.store)
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
