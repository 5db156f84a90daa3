use crate::domain::trend::{SourceCounts, Trend, TrendsResponse};
use crate::ingest::FetchError;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

/// Token handed out when a refresh starts. Only the newest ticket may update the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    seq: u64,
}

impl RefreshTicket {
    pub fn seq(self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    Updated(Vec<Trend>),
    Failed(FetchError),
    /// A newer refresh was started after this one; the response was dropped.
    Stale,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrendSnapshot {
    pub trends: Vec<Trend>,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    pub upstream_updated: Option<NaiveDateTime>,
    pub sources: Option<SourceCounts>,
    pub loading: bool,
    pub initial_loading: bool,
}

/// Owner of the current trend collection and its error/timestamp state.
#[derive(Debug, Default)]
pub struct TrendStore {
    trends: Vec<Trend>,
    error: Option<String>,
    last_updated: Option<DateTime<Utc>>,
    upstream_updated: Option<NaiveDateTime>,
    sources: Option<SourceCounts>,
    issued: u64,
    in_flight: usize,
    settled: bool,
}

impl TrendStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> RefreshTicket {
        self.issued += 1;
        self.in_flight += 1;
        RefreshTicket { seq: self.issued }
    }

    pub fn apply(
        &mut self,
        ticket: RefreshTicket,
        result: Result<TrendsResponse, FetchError>,
        now: DateTime<Utc>,
    ) -> ApplyOutcome {
        self.in_flight = self.in_flight.saturating_sub(1);

        if ticket.seq != self.issued {
            return ApplyOutcome::Stale;
        }
        self.settled = true;

        match result {
            Ok(resp) => {
                self.trends = resp.trends;
                self.error = None;
                self.last_updated = Some(now);
                self.upstream_updated = resp.updated;
                self.sources = resp.sources;
                ApplyOutcome::Updated(self.trends.clone())
            }
            Err(err) => {
                self.error = Some(err.to_string());
                ApplyOutcome::Failed(err)
            }
        }
    }

    pub fn trends(&self) -> &[Trend] {
        &self.trends
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn snapshot(&self) -> TrendSnapshot {
        TrendSnapshot {
            trends: self.trends.clone(),
            error: self.error.clone(),
            last_updated: self.last_updated,
            upstream_updated: self.upstream_updated,
            sources: self.sources,
            loading: self.is_loading(),
            initial_loading: self.is_loading() && !self.settled,
        }
    }
}
