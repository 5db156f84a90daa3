use crate::domain::signal::{classify, Signal};
use crate::domain::trend::{Source, Trend};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Reddit,
    Twitter,
}

impl Filter {
    pub fn as_str(self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Reddit => "reddit",
            Filter::Twitter => "twitter",
        }
    }

    pub fn admits(self, source: Source) -> bool {
        match self {
            Filter::All => true,
            Filter::Reddit => source == Source::Reddit,
            Filter::Twitter => source == Source::Twitter,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Filter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Filter::All),
            "reddit" => Ok(Filter::Reddit),
            "twitter" | "x" => Ok(Filter::Twitter),
            other => anyhow::bail!("unknown filter {other:?} (expected all, reddit or twitter)"),
        }
    }
}

/// Order-preserving subset of `trends` admitted by `filter`.
pub fn visible(trends: &[Trend], filter: Filter) -> Vec<Trend> {
    trends
        .iter()
        .filter(|t| filter.admits(t.source))
        .cloned()
        .collect()
}

/// A displayable row: the trend plus its derived signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendRow {
    #[serde(flatten)]
    pub trend: Trend,
    pub signal: Signal,
    pub sentiment_pct: String,
    pub accent: &'static str,
    pub background: &'static str,
}

/// Rows for exactly the trends [`visible`] admits, in the same order.
pub fn rows(trends: &[Trend], filter: Filter) -> Vec<TrendRow> {
    visible(trends, filter)
        .into_iter()
        .map(|trend| {
            let signal = classify(trend.momentum, trend.sentiment);
            let colors = signal.colors();
            TrendRow {
                sentiment_pct: trend.sentiment_pct(),
                trend,
                signal,
                accent: colors.accent,
                background: colors.background,
            }
        })
        .collect()
}
