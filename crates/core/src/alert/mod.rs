pub mod dispatcher;
pub mod error;
pub mod http;
pub mod status;

pub use dispatcher::AlertDispatcher;
pub use error::DispatchError;
pub use http::HttpAlertClient;
pub use status::{AlertStatus, StatusSlot, STATUS_TTL};

use crate::domain::signal::Signal;
use crate::domain::trend::{Source, Trend};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Discord,
    Email,
}

pub const DEFAULT_CHANNELS: [Channel; 2] = [Channel::Discord, Channel::Email];

/// Body of `POST /api/alert`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRequest {
    pub ticker: String,
    pub signal: Signal,
    pub momentum: u32,
    pub sentiment: f64,
    pub source: Source,
    pub channels: Vec<Channel>,
}

impl AlertRequest {
    pub fn new(trend: &Trend, signal: Signal) -> Self {
        Self {
            ticker: trend.ticker.clone(),
            signal,
            momentum: trend.momentum,
            sentiment: trend.sentiment,
            source: trend.source,
            channels: DEFAULT_CHANNELS.to_vec(),
        }
    }
}

/// Reply from the notification collaborator. Only `sent` is contractual.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertResponse {
    #[serde(default)]
    pub sent: Option<bool>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub channels: BTreeMap<String, bool>,
}

#[async_trait::async_trait]
pub trait AlertSink: Send + Sync {
    fn sink_name(&self) -> &'static str;

    async fn send_alert(&self, req: &AlertRequest) -> Result<AlertResponse, DispatchError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_matches_wire_contract() {
        let trend: Trend = serde_json::from_value(json!({
            "ticker": "$NVDA", "source": "reddit", "momentum": 85, "sentiment": 0.45, "mentions": 40
        }))
        .unwrap();

        let req = AlertRequest::new(&trend, Signal::Buy);
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "ticker": "$NVDA",
                "signal": "BUY",
                "momentum": 85,
                "sentiment": 0.45,
                "source": "reddit",
                "channels": ["discord", "email"]
            })
        );
    }

    #[test]
    fn response_tolerates_missing_fields() {
        let resp: AlertResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(resp.sent, None);

        let resp: AlertResponse = serde_json::from_value(json!({
            "sent": true, "ticker": "$NVDA", "signal": "BUY", "channels": {"discord": true, "email": false}
        }))
        .unwrap();
        assert_eq!(resp.sent, Some(true));
        assert_eq!(resp.channels.get("email"), Some(&false));
    }
}
