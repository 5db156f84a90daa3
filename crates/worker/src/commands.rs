use anyhow::{bail, Context};
use trendpulse_core::view::Filter;

pub const HELP: &str = "commands: r (refresh) | a (toggle auto-alerts) | f <all|reddit|twitter> | alert <TICKER> | s (show) | q (quit)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Refresh,
    ToggleAutoAlerts,
    Filter(Filter),
    Alert(String),
    Show,
    Help,
    Quit,
}

/// Parses one stdin line. Blank lines are `Ok(None)`.
pub fn parse(line: &str) -> anyhow::Result<Option<Command>> {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Ok(None);
    };
    let arg = parts.next();
    if parts.next().is_some() {
        bail!("too many arguments; {HELP}");
    }

    let cmd = match (head.to_ascii_lowercase().as_str(), arg) {
        ("r" | "refresh", None) => Command::Refresh,
        ("a" | "auto", None) => Command::ToggleAutoAlerts,
        ("f" | "filter", Some(name)) => Command::Filter(
            name.parse()
                .with_context(|| format!("bad filter; {HELP}"))?,
        ),
        ("alert", Some(ticker)) => Command::Alert(normalize_ticker(ticker)),
        ("s" | "show", None) => Command::Show,
        ("h" | "help" | "?", None) => Command::Help,
        ("q" | "quit" | "exit", None) => Command::Quit,
        _ => bail!("unknown command {:?}; {HELP}", line.trim()),
    };
    Ok(Some(cmd))
}

fn normalize_ticker(raw: &str) -> String {
    let upper = raw.trim().to_ascii_uppercase();
    if upper.starts_with('$') {
        upper
    } else {
        format!("${upper}")
    }
}
