use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trendpulse_core::alert::{AlertDispatcher, HttpAlertClient, StatusSlot};
use trendpulse_core::app::{Orchestrator, Preferences, RefreshOutcome};
use trendpulse_core::ingest::HttpTrendsClient;
use trendpulse_core::poller::Poller;
use trendpulse_core::policy::AutoAlertPolicy;
use trendpulse_core::view::Filter;

mod board;
mod commands;

use commands::Command;

#[derive(Debug, Parser)]
#[command(name = "trendpulse_worker")]
struct Args {
    /// Seconds between timer-driven refreshes. Defaults to POLL_INTERVAL_SECS (60).
    #[arg(long)]
    interval_secs: Option<u64>,

    /// Per-ticker auto-alert cool-down in seconds; 0 re-alerts on every poll.
    #[arg(long)]
    alert_cooldown_secs: Option<u64>,

    /// Start with automatic alerts switched off.
    #[arg(long)]
    no_auto_alerts: bool,

    /// Initial source filter (all, reddit, twitter).
    #[arg(long, default_value = "all")]
    filter: Filter,

    /// Run a single poll cycle, print the board and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = trendpulse_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let interval = args
        .interval_secs
        .map(Duration::from_secs)
        .unwrap_or_else(|| settings.poll_interval());
    anyhow::ensure!(!interval.is_zero(), "--interval-secs must be positive");

    let cooldown = match args.alert_cooldown_secs {
        Some(secs) => Some(Duration::from_secs(secs)),
        None => settings.alert_cooldown(),
    };

    let source = HttpTrendsClient::from_settings(&settings)?;
    let sink = HttpAlertClient::from_settings(&settings)?;
    let app = Arc::new(Orchestrator::new(
        Arc::new(source),
        AlertDispatcher::new(Arc::new(sink), StatusSlot::new()),
        AutoAlertPolicy::new(cooldown),
        Preferences {
            filter: args.filter,
            auto_alerts: settings.auto_alerts_enabled && !args.no_auto_alerts,
        },
    ));

    if args.once {
        return run_once(&app).await;
    }

    tracing::info!(
        ?interval,
        ?cooldown,
        auto_alerts = app.preferences().auto_alerts,
        filter = %args.filter,
        "trendpulse worker starting"
    );
    println!("{}", commands::HELP);

    let poller = Poller::spawn(Arc::clone(&app), interval);
    let trigger = poller.trigger();

    let mut updates = app.subscribe_updates();
    let mut status_rx = app.subscribe_alert_status();
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("{}", board::render(&app.view()));
            }
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = status_rx.borrow_and_update().clone();
                if let Some(status) = status {
                    println!("{}", board::render_status(&status));
                }
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match commands::parse(&line) {
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(cmd)) => handle_command(&app, &trigger, cmd),
                    Ok(None) => {}
                    Err(err) => println!("{err:#}"),
                },
                Ok(None) => {
                    tracing::debug!("stdin closed; continuing without commands");
                    stdin_open = false;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "failed to read stdin; disabling commands");
                    stdin_open = false;
                }
            },
        }
    }

    tracing::info!("shutting down");
    if let Err(err) = poller.shutdown().await {
        sentry_anyhow::capture_anyhow(&err);
        return Err(err);
    }
    Ok(())
}

fn handle_command(
    app: &Arc<Orchestrator>,
    trigger: &trendpulse_core::poller::RefreshTrigger,
    cmd: Command,
) {
    match cmd {
        Command::Refresh => {
            if !trigger.refresh_now() {
                println!("refresh already queued");
            }
        }
        Command::ToggleAutoAlerts => {
            let enabled = app.toggle_auto_alerts();
            println!("auto-alerts {}", if enabled { "on" } else { "off" });
        }
        Command::Filter(filter) => app.set_filter(filter),
        Command::Show => println!("{}", board::render(&app.view())),
        Command::Help => println!("{}", commands::HELP),
        Command::Alert(ticker) => {
            let app = Arc::clone(app);
            tokio::spawn(async move {
                if let Err(err) = app.send_manual_alert(&ticker).await {
                    println!("{err}");
                }
            });
        }
        Command::Quit => {}
    }
}

async fn run_once(app: &Orchestrator) -> anyhow::Result<()> {
    let report = app.refresh().await;
    println!("{}", board::render(&app.view()));
    for status in &report.alerts {
        println!("{}", board::render_status(status));
    }
    app.shutdown();

    // Already reported to Sentry by the error-level refresh log.
    if let RefreshOutcome::Failed(err) = report.outcome {
        return Err(anyhow::Error::new(err).context("poll cycle failed"));
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")
    {
        tracing::error!(error = %err, "shutdown signal unavailable");
        std::future::pending::<()>().await;
    }
}

fn init_sentry(settings: &trendpulse_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
