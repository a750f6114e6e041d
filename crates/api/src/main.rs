use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use signalboard_core::config::Settings;
use signalboard_core::load::UrlSignalSource;
use signalboard_core::render::html::{render_page, PageOptions};
use signalboard_core::render::{SharedBoard, SignalBoard};
use signalboard_core::schedule::{RefreshController, RefreshOptions};
use signalboard_core::time::ist_market::MarketCalendar;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let board = SignalBoard::shared();

    let controller = match build_controller(&settings, Arc::clone(&board)) {
        Ok(mut controller) => {
            controller.start();
            Some(controller)
        }
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %format!("{e:#}"), "signal source misconfigured; starting API in degraded mode");
            None
        }
    };

    let state = AppState {
        board,
        page: PageOptions {
            auto_refresh: Some(settings.refresh_interval()),
        },
    };

    let app = Router::new()
        .route("/", get(get_dashboard))
        .route("/api/signals", get(get_signals))
        .route("/healthz", get(healthz))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(controller) = controller {
        controller.dispose().await;
    }

    Ok(())
}

fn build_controller(settings: &Settings, board: SharedBoard) -> anyhow::Result<RefreshController> {
    let source = UrlSignalSource::from_settings(settings)?;
    let calendar = MarketCalendar::from_holiday_list(settings.market_holidays.as_deref())?;
    tracing::info!(data_url = %source.data_url(), "signal source configured");

    let options = RefreshOptions {
        interval: settings.refresh_interval(),
        ..RefreshOptions::default()
    };
    Ok(RefreshController::new(
        Arc::new(source),
        board,
        calendar,
        options,
    ))
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Clone)]
struct AppState {
    board: SharedBoard,
    page: PageOptions,
}

async fn get_dashboard(State(state): State<AppState>) -> Html<String> {
    let board = state.board.read().await;
    Html(render_page(&board, &state.page))
}

async fn get_signals(State(state): State<AppState>) -> Result<Json<SignalBoard>, StatusCode> {
    let board = state.board.read().await;
    if !board.is_rendered() {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    Ok(Json(board.clone()))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
