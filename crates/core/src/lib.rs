pub mod alert;
pub mod app;
pub mod domain;
pub mod ingest;
pub mod poller;
pub mod policy;
pub mod store;
pub mod view;

#[cfg(test)]
mod testing;

pub mod config {
    use anyhow::Context;
    use std::time::Duration;

    const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub base_url: Option<String>,
        pub alert_base_url: Option<String>,
        pub sentry_dsn: Option<String>,
        pub poll_interval_secs: u64,
        pub alert_cooldown_secs: Option<u64>,
        pub auto_alerts_enabled: bool,
        pub http_timeout_secs: Option<u64>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let poll_interval_secs =
                parse_secs("POLL_INTERVAL_SECS", std::env::var("POLL_INTERVAL_SECS").ok())?
                    .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
            anyhow::ensure!(poll_interval_secs > 0, "POLL_INTERVAL_SECS must be positive");

            let http_timeout_secs =
                parse_secs("HTTP_TIMEOUT_SECS", std::env::var("HTTP_TIMEOUT_SECS").ok())?;
            anyhow::ensure!(
                http_timeout_secs != Some(0),
                "HTTP_TIMEOUT_SECS must be positive (unset it to keep the transport default)"
            );

            Ok(Self {
                base_url: non_empty_var("TRENDPULSE_BASE_URL"),
                alert_base_url: non_empty_var("ALERT_BASE_URL"),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
                poll_interval_secs,
                alert_cooldown_secs: parse_secs(
                    "ALERT_COOLDOWN_SECS",
                    std::env::var("ALERT_COOLDOWN_SECS").ok(),
                )?
                .filter(|secs| *secs > 0),
                auto_alerts_enabled: std::env::var("AUTO_ALERTS_ENABLED")
                    .map(|s| parse_flag(&s))
                    .unwrap_or(true),
                http_timeout_secs,
            })
        }

        pub fn require_base_url(&self) -> anyhow::Result<&str> {
            self.base_url
                .as_deref()
                .context("TRENDPULSE_BASE_URL is required")
        }

        /// Base for the notification collaborator; falls back to the shared base.
        pub fn require_alert_base_url(&self) -> anyhow::Result<&str> {
            match self.alert_base_url.as_deref() {
                Some(url) => Ok(url),
                None => self.require_base_url(),
            }
        }

        pub fn poll_interval(&self) -> Duration {
            Duration::from_secs(self.poll_interval_secs)
        }

        pub fn alert_cooldown(&self) -> Option<Duration> {
            self.alert_cooldown_secs.map(Duration::from_secs)
        }

        /// A zero timeout would fail every request, so it is treated as unset.
        pub fn http_timeout(&self) -> Option<Duration> {
            self.http_timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|s| !s.trim().is_empty())
    }

    /// Blank or missing values are `None`; anything else must be a whole number of seconds.
    fn parse_secs(key: &str, raw: Option<String>) -> anyhow::Result<Option<u64>> {
        let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
            return Ok(None);
        };
        let secs = raw
            .trim()
            .parse::<u64>()
            .with_context(|| format!("{key} must be a whole number of seconds (got {raw:?})"))?;
        Ok(Some(secs))
    }

    fn parse_flag(s: &str) -> bool {
        !matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "0" | "false" | "off" | "no"
        )
    }

}
