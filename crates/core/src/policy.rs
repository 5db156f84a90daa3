use crate::domain::signal::{classify, Signal};
use crate::domain::trend::Trend;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// BUY trends at or above this momentum are alerted without user action.
pub const AUTO_ALERT_MIN_MOMENTUM: u32 = 75;

/// Decides which trends of a completed poll get an automatic alert.
///
/// Without a cool-down every qualifying trend is selected on every poll. With one, a ticker
/// (compared case-insensitively) is skipped until the window since its last selection elapses.
#[derive(Debug, Clone, Default)]
pub struct AutoAlertPolicy {
    cooldown: Option<Duration>,
    last_alerted: HashMap<String, Instant>,
}

impl AutoAlertPolicy {
    pub fn new(cooldown: Option<Duration>) -> Self {
        Self {
            cooldown: cooldown.filter(|d| !d.is_zero()),
            last_alerted: HashMap::new(),
        }
    }

    pub fn cooldown(&self) -> Option<Duration> {
        self.cooldown
    }

    pub fn qualifies(trend: &Trend) -> Option<Signal> {
        let signal = classify(trend.momentum, trend.sentiment);
        (signal == Signal::Buy && trend.momentum >= AUTO_ALERT_MIN_MOMENTUM).then_some(signal)
    }

    pub fn select(&mut self, trends: &[Trend], now: Instant) -> Vec<(Trend, Signal)> {
        let mut out = Vec::new();
        for trend in trends {
            let Some(signal) = Self::qualifies(trend) else {
                continue;
            };

            if let Some(cooldown) = self.cooldown {
                let key = trend.ticker.trim().to_ascii_uppercase();
                if let Some(last) = self.last_alerted.get(&key) {
                    if now.saturating_duration_since(*last) < cooldown {
                        tracing::debug!(ticker = %trend.ticker, ?cooldown, "auto-alert suppressed by cool-down");
                        continue;
                    }
                }
                self.last_alerted.insert(key, now);
            }

            out.push((trend.clone(), signal));
        }

        if let Some(cooldown) = self.cooldown {
            self.last_alerted
                .retain(|_, last| now.saturating_duration_since(*last) < cooldown);
        }

        out
    }
}
