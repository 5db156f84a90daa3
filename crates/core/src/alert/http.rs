use crate::alert::error::DispatchError;
use crate::alert::{AlertRequest, AlertResponse, AlertSink};
use crate::config::Settings;
use anyhow::Context;
use serde::Deserialize;
use std::time::Duration;

const ALERT_PATH: &str = "/api/alert";

#[derive(Debug, Clone)]
pub struct HttpAlertClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl HttpAlertClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let base_url = settings.require_alert_base_url()?.to_string();
        Self::new(base_url, settings.http_timeout())
    }

    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .context("failed to build alert http client")?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), ALERT_PATH)
    }
}

#[async_trait::async_trait]
impl AlertSink for HttpAlertClient {
    fn sink_name(&self) -> &'static str {
        "trendpulse_http"
    }

    async fn send_alert(&self, req: &AlertRequest) -> Result<AlertResponse, DispatchError> {
        let res = self
            .http
            .post(self.url())
            .json(req)
            .send()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| DispatchError::Transport(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(DispatchError::Status {
                status: status.as_u16(),
                detail: error_detail(&text),
            });
        }

        parse_response(&text)
    }
}

pub(crate) fn parse_response(text: &str) -> Result<AlertResponse, DispatchError> {
    serde_json::from_str::<AlertResponse>(text).map_err(|e| DispatchError::Decode(e.to_string()))
}

fn error_detail(text: &str) -> String {
    serde_json::from_str::<ErrorBody>(text)
        .map(|body| body.error)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::Signal;
    use crate::domain::trend::{Source, Trend};

    #[test]
    fn builds_alert_url() {
        let client = HttpAlertClient::new("https://tp.example/", None).unwrap();
        assert_eq!(client.url(), "https://tp.example/api/alert");
    }

    #[test]
    fn surfaces_error_field_from_failed_response() {
        assert_eq!(error_detail(r#"{"error": "boom"}"#), "boom");
        assert_eq!(error_detail("Internal Server Error"), "");

        let err = DispatchError::Status {
            status: 500,
            detail: error_detail(r#"{"error": "boom"}"#),
        };
        assert_eq!(err.to_string(), "Failed to send alert: HTTP 500 (boom)");
    }

    fn nvda_buy() -> AlertRequest {
        let trend = Trend {
            ticker: "$NVDA".to_string(),
            source: Source::Reddit,
            momentum: 80,
            sentiment: 0.3,
            mentions: 120,
            subreddit: Some("wallstreetbets".to_string()),
            posts: Some(14),
        };
        AlertRequest::new(&trend, Signal::Buy)
    }

    #[tokio::test]
    async fn error_body_with_failed_status_becomes_status_error() {
        let (base, server) =
            crate::testing::serve_once("500 Internal Server Error", r#"{"error":"boom"}"#).await;
        let client = HttpAlertClient::new(base, Some(Duration::from_secs(5))).unwrap();

        let err = client.send_alert(&nvda_buy()).await.unwrap_err();
        assert_eq!(
            err,
            DispatchError::Status {
                status: 500,
                detail: "boom".to_string(),
            }
        );

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/alert HTTP/1.1"), "{request}");
        assert!(request.contains(r#""ticker":"$NVDA""#), "{request}");
        assert!(request.contains(r#""signal":"BUY""#), "{request}");
    }

    #[tokio::test]
    async fn rejected_alert_with_ok_status_is_a_response() {
        let (base, _server) =
            crate::testing::serve_once("200 OK", r#"{"sent":false,"reason":"rate limited"}"#).await;
        let client = HttpAlertClient::new(base, None).unwrap();

        let resp = client.send_alert(&nvda_buy()).await.unwrap();
        assert_eq!(resp.sent, Some(false));
        assert_eq!(resp.reason.as_deref(), Some("rate limited"));
    }

    #[test]
    fn non_json_success_body_is_a_decode_error() {
        assert!(matches!(
            parse_response("ok"),
            Err(DispatchError::Decode(_))
        ));
        assert_eq!(
            parse_response(r#"{"sent": false, "reason": "rate limited"}"#)
                .unwrap()
                .reason
                .as_deref(),
            Some("rate limited")
        );
    }
}
