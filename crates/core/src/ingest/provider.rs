use crate::config::Settings;
use crate::domain::trend::TrendsResponse;
use crate::ingest::error::FetchError;
use anyhow::{Context, Result};
use std::time::Duration;

const TRENDS_PATH: &str = "/api/trends";
const MAX_BODY_IN_ERROR: usize = 512;

/// Source of trend snapshots. One call is one poll of the ingestion collaborator.
#[async_trait::async_trait]
pub trait TrendsSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn fetch_trends(&self) -> Result<TrendsResponse, FetchError>;
}

#[derive(Debug, Clone)]
pub struct HttpTrendsClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTrendsClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_base_url()?.to_string();
        Self::new(base_url, settings.http_timeout())
    }

    /// Without an explicit timeout the transport default applies.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .context("failed to build trends http client")?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), TRENDS_PATH)
    }
}

#[async_trait::async_trait]
impl TrendsSource for HttpTrendsClient {
    fn source_name(&self) -> &'static str {
        "trendpulse_http"
    }

    async fn fetch_trends(&self) -> Result<TrendsResponse, FetchError> {
        let res = self
            .http
            .get(self.url())
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| FetchError::Transport(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: truncate(&text, MAX_BODY_IN_ERROR),
            });
        }

        parse_trends(&text)
    }
}

pub(crate) fn parse_trends(text: &str) -> Result<TrendsResponse, FetchError> {
    let parsed = serde_json::from_str::<TrendsResponse>(text)
        .map_err(|e| FetchError::Decode(e.to_string()))?;
    parsed
        .validate()
        .map_err(|e| FetchError::Invalid(format!("{e:#}")))?;
    Ok(parsed)
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
