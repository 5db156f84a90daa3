use serde::{Deserialize, Serialize};
use std::fmt;

const BUY_MIN_MOMENTUM: u32 = 70;
const BUY_MIN_SENTIMENT: f64 = 0.2;
const SELL_MAX_MOMENTUM: u32 = 30;
const SELL_MAX_SENTIMENT: f64 = -0.3;
const WATCH_MIN_MOMENTUM: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Watch,
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SignalColors {
    pub accent: &'static str,
    pub background: &'static str,
}

/// Maps momentum and sentiment to a signal. Rules overlap, so the first match wins.
pub fn classify(momentum: u32, sentiment: f64) -> Signal {
    if momentum >= BUY_MIN_MOMENTUM && sentiment > BUY_MIN_SENTIMENT {
        Signal::Buy
    } else if momentum <= SELL_MAX_MOMENTUM || sentiment < SELL_MAX_SENTIMENT {
        Signal::Sell
    } else if momentum >= WATCH_MIN_MOMENTUM {
        Signal::Watch
    } else {
        Signal::Hold
    }
}

impl Signal {
    pub fn as_str(self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Watch => "WATCH",
            Signal::Hold => "HOLD",
        }
    }

    pub fn colors(self) -> SignalColors {
        match self {
            Signal::Buy => SignalColors {
                accent: "#22c55e",
                background: "#052e16",
            },
            Signal::Sell => SignalColors {
                accent: "#ef4444",
                background: "#450a0a",
            },
            Signal::Watch => SignalColors {
                accent: "#f59e0b",
                background: "#451a03",
            },
            Signal::Hold => SignalColors {
                accent: "#6b7280",
                background: "#111827",
            },
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Signal::Buy => "🟢",
            Signal::Sell => "🔴",
            Signal::Watch => "🟡",
            Signal::Hold => "⚪",
        }
    }

    /// Only BUY and SELL rows offer a manual alert action.
    pub fn is_actionable(self) -> bool {
        matches!(self, Signal::Buy | Signal::Sell)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buy_requires_strictly_positive_sentiment_above_threshold() {
        assert_eq!(classify(70, 0.2), Signal::Watch);
        assert_eq!(classify(70, 0.21), Signal::Buy);
        assert_eq!(classify(85, 0.45), Signal::Buy);
    }

    #[test]
    fn sell_boundaries() {
        assert_eq!(classify(30, 0.0), Signal::Sell);
        assert_eq!(classify(20, -0.5), Signal::Sell);
        // -0.3 is not strictly below -0.3, and 31 clears the momentum floor.
        assert_eq!(classify(31, -0.3), Signal::Hold);
        assert_eq!(classify(90, -0.31), Signal::Sell);
    }

    #[test]
    fn watch_and_hold() {
        assert_eq!(classify(55, 0.1), Signal::Watch);
        assert_eq!(classify(50, -0.2), Signal::Watch);
        assert_eq!(classify(40, 0.0), Signal::Hold);
        assert_eq!(classify(49, 0.9), Signal::Hold);
    }

    #[test]
    fn total_and_deterministic_over_grid() {
        for momentum in 0..=100u32 {
            for step in -20..=20i32 {
                let sentiment = f64::from(step) / 20.0;
                let first = classify(momentum, sentiment);
                assert_eq!(first, classify(momentum, sentiment));
            }
        }
    }

    #[test]
    fn serializes_as_uppercase_label() {
        assert_eq!(serde_json::to_string(&Signal::Buy).unwrap(), "\"BUY\"");
        assert_eq!(Signal::Watch.to_string(), "WATCH");
        assert!(Signal::Sell.is_actionable());
        assert!(!Signal::Hold.is_actionable());
    }
}
