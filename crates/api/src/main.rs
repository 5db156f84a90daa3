use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trendpulse_core::alert::{AlertDispatcher, AlertStatus, HttpAlertClient, StatusSlot};
use trendpulse_core::app::{DashboardView, ManualAlertError, Orchestrator, Preferences};
use trendpulse_core::ingest::HttpTrendsClient;
use trendpulse_core::poller::{Poller, RefreshTrigger};
use trendpulse_core::policy::AutoAlertPolicy;
use trendpulse_core::view::Filter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = trendpulse_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let source = HttpTrendsClient::from_settings(&settings)?;
    let sink = HttpAlertClient::from_settings(&settings)?;

    let orchestrator = Arc::new(Orchestrator::new(
        Arc::new(source),
        AlertDispatcher::new(Arc::new(sink), StatusSlot::new()),
        AutoAlertPolicy::new(settings.alert_cooldown()),
        Preferences {
            filter: Filter::All,
            auto_alerts: settings.auto_alerts_enabled,
        },
    ));
    let poller = Poller::spawn(Arc::clone(&orchestrator), settings.poll_interval());

    let state = AppState {
        app: orchestrator,
        trigger: poller.trigger(),
    };
    let app = router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, interval = ?settings.poll_interval(), "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Err(err) = poller.shutdown().await {
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(error = %err, "poller did not shut down cleanly");
    }
    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/trends", get(get_trends))
        .route("/alert-status", get(get_alert_status))
        .route("/refresh", post(post_refresh))
        .route("/filter", put(put_filter))
        .route("/auto-alerts", put(put_auto_alerts))
        .route("/alerts/:ticker", post(post_alert))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    app: Arc<Orchestrator>,
    trigger: RefreshTrigger,
}

#[derive(Debug, Deserialize)]
struct TrendsQuery {
    filter: Option<Filter>,
}

#[derive(Debug, Deserialize)]
struct FilterBody {
    filter: Filter,
}

#[derive(Debug, Deserialize)]
struct AutoAlertsBody {
    enabled: bool,
}

#[derive(Debug, Serialize)]
struct ApiError {
    error: String,
}

async fn get_trends(
    State(state): State<AppState>,
    Query(query): Query<TrendsQuery>,
) -> Json<DashboardView> {
    let view = match query.filter {
        Some(filter) => state.app.view_for(filter),
        None => state.app.view(),
    };
    Json(view)
}

async fn get_alert_status(State(state): State<AppState>) -> Json<Option<AlertStatus>> {
    Json(state.app.alert_status())
}

async fn post_refresh(State(state): State<AppState>) -> StatusCode {
    if state.trigger.refresh_now() {
        StatusCode::ACCEPTED
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn put_filter(
    State(state): State<AppState>,
    Json(body): Json<FilterBody>,
) -> Json<Preferences> {
    state.app.set_filter(body.filter);
    Json(state.app.preferences())
}

async fn put_auto_alerts(
    State(state): State<AppState>,
    Json(body): Json<AutoAlertsBody>,
) -> Json<Preferences> {
    state.app.set_auto_alerts(body.enabled);
    Json(state.app.preferences())
}

async fn post_alert(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<AlertStatus>, (StatusCode, Json<ApiError>)> {
    state
        .app
        .send_manual_alert(&ticker)
        .await
        .map(Json)
        .map_err(|e| {
            let code = match e {
                ManualAlertError::UnknownTicker(_) => StatusCode::NOT_FOUND,
                ManualAlertError::NotActionable { .. } => StatusCode::CONFLICT,
            };
            tracing::warn!(%ticker, error = %e, "manual alert rejected");
            (
                code,
                Json(ApiError {
                    error: e.to_string(),
                }),
            )
        })
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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
