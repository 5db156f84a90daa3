use crate::alert::status::{AlertStatus, StatusSlot};
use crate::alert::{AlertRequest, AlertResponse, AlertSink};
use crate::domain::signal::Signal;
use crate::domain::trend::Trend;
use std::sync::Arc;

const NOT_SENT_FALLBACK: &str = "Alert not sent";

/// Sends alerts and reports every outcome through the shared status slot.
///
/// Automatic and manual dispatches share one dispatcher, so they also share one slot.
#[derive(Clone)]
pub struct AlertDispatcher {
    sink: Arc<dyn AlertSink>,
    status: StatusSlot,
}

impl AlertDispatcher {
    pub fn new(sink: Arc<dyn AlertSink>, status: StatusSlot) -> Self {
        Self { sink, status }
    }

    pub fn status(&self) -> &StatusSlot {
        &self.status
    }

    pub async fn send_alert(&self, trend: &Trend, signal: Signal) -> AlertStatus {
        let req = AlertRequest::new(trend, signal);

        let status = match self.sink.send_alert(&req).await {
            Ok(resp) => {
                let status = interpret(&trend.ticker, &resp);
                if status.success {
                    tracing::info!(
                        ticker = %trend.ticker,
                        %signal,
                        momentum = trend.momentum,
                        channels = ?resp.channels,
                        "alert sent"
                    );
                } else {
                    tracing::warn!(
                        ticker = %trend.ticker,
                        %signal,
                        reason = %status.message,
                        "alert not sent"
                    );
                }
                status
            }
            Err(err) => {
                tracing::error!(
                    ticker = %trend.ticker,
                    %signal,
                    sink = self.sink.sink_name(),
                    error = %err,
                    "alert dispatch failed"
                );
                AlertStatus::failed(&trend.ticker, err.to_string())
            }
        };

        self.status.publish(status.clone());
        status
    }
}

/// A missing `sent` field counts as not sent.
fn interpret(ticker: &str, resp: &AlertResponse) -> AlertStatus {
    if resp.sent == Some(true) {
        return AlertStatus::sent(ticker);
    }

    let reason = resp
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(NOT_SENT_FALLBACK);
    AlertStatus::failed(ticker, reason)
}
