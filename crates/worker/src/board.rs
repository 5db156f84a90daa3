use trendpulse_core::alert::AlertStatus;
use trendpulse_core::app::DashboardView;

pub fn render(view: &DashboardView) -> String {
    let mut out = String::new();

    let updated = view
        .last_updated
        .map(|t| t.format("%H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());
    out.push_str(&format!(
        "TrendPulse  filter={}  auto-alerts={}  updated={}",
        view.filter,
        if view.auto_alerts { "on" } else { "off" },
        updated
    ));
    if let Some(sources) = view.sources {
        out.push_str(&format!(
            "  (reddit {} / twitter {})",
            sources.reddit, sources.twitter
        ));
    }
    if view.loading {
        out.push_str("  [refreshing]");
    }
    out.push('\n');

    if let Some(err) = &view.error {
        out.push_str(&format!("! {err}\n"));
    }

    if view.initial_loading {
        out.push_str("Loading trends...\n");
        return out;
    }

    if view.rows.is_empty() {
        if view.total == 0 {
            out.push_str("no trends\n");
        } else {
            out.push_str(&format!("no trends ({} hidden by filter)\n", view.total));
        }
        return out;
    }

    out.push_str(&format!(
        "{:<10} {:<8} {:>4} {:>6} {:>9}  {}\n",
        "TICKER", "SOURCE", "MOM", "SENT", "MENTIONS", "SIGNAL"
    ));
    for row in &view.rows {
        out.push_str(&format!(
            "{:<10} {:<8} {:>4} {:>6} {:>9}  {} {}\n",
            row.trend.ticker,
            row.trend.source,
            row.trend.momentum,
            row.sentiment_pct,
            row.trend.mentions,
            row.signal.emoji(),
            row.signal
        ));
    }
    out
}

pub fn render_status(status: &AlertStatus) -> String {
    let mark = if status.success { "ok" } else { "failed" };
    format!("[alert {mark}] {}: {}", status.ticker, status.message)
}
