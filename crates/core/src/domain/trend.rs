use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Reddit,
    Twitter,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Reddit => "reddit",
            Source::Twitter => "twitter",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ticker's snapshot as delivered by the ingestion collaborator.
///
/// Trends are never mutated after decoding; a refresh replaces the whole list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub ticker: String,
    pub source: Source,
    pub momentum: u32,
    pub sentiment: f64,
    pub mentions: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subreddit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posts: Option<u32>,
}

impl Trend {
    pub fn matches_ticker(&self, ticker: &str) -> bool {
        self.ticker.trim().eq_ignore_ascii_case(ticker.trim())
    }

    pub fn sentiment_pct(&self) -> String {
        format_sentiment(self.sentiment)
    }
}

/// Renders sentiment as a signed, truncated percentage (`+45%`, `-50%`, `0%`).
/// The sign follows the raw score, so a small positive score renders as `+0%`.
pub fn format_sentiment(sentiment: f64) -> String {
    let pct = (sentiment * 100.0).trunc() as i64;
    if sentiment > 0.0 {
        format!("+{pct}%")
    } else {
        format!("{pct}%")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCounts {
    #[serde(default)]
    pub reddit: u32,
    #[serde(default)]
    pub twitter: u32,
}

/// Body of `GET /api/trends`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrendsResponse {
    #[serde(default)]
    pub trends: Vec<Trend>,
    /// Upstream generation time in UTC. Unreadable values are dropped rather than failing the poll.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated: Option<NaiveDateTime>,
    #[serde(default)]
    pub sources: Option<SourceCounts>,
}

impl TrendsResponse {
    pub fn validate(&self) -> anyhow::Result<()> {
        for trend in &self.trends {
            validate_trend(trend)?;
        }
        Ok(())
    }
}

// Accepts naive ISO timestamps (treated as UTC) and RFC 3339 with an offset.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let Some(serde_json::Value::String(s)) = raw else {
        return Ok(None);
    };
    let s = s.trim();

    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Some(naive));
    }
    Ok(DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.naive_utc()))
}

fn validate_trend(trend: &Trend) -> anyhow::Result<()> {
    anyhow::ensure!(!trend.ticker.trim().is_empty(), "ticker must be non-empty");
    anyhow::ensure!(
        trend.momentum <= 100,
        "momentum must be 0..=100 (ticker={}, got {})",
        trend.ticker,
        trend.momentum
    );
    anyhow::ensure!(
        trend.sentiment.is_finite(),
        "sentiment must be finite (ticker={})",
        trend.ticker
    );
    Ok(())
}
