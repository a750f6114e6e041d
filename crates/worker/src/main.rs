use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use signalboard_core::load::UrlSignalSource;
use signalboard_core::render::html::PageOptions;
use signalboard_core::render::{HtmlFilePublisher, SignalBoard};
use signalboard_core::schedule::{RefreshController, RefreshOptions, RefreshOutcome};
use signalboard_core::time::ist_market::MarketCalendar;

#[derive(Debug, Parser)]
#[command(name = "signalboard_worker")]
struct Args {
    /// Load and render once, write the page, then exit.
    #[arg(long)]
    once: bool,

    /// Output HTML file. Defaults to SIGNALBOARD_OUTPUT.
    #[arg(long)]
    output: Option<PathBuf>,

    /// URL the dashboard page is published at. Defaults to SIGNALBOARD_PAGE_URL.
    #[arg(long)]
    page_url: Option<String>,

    /// Refresh on every tick, even outside NSE market hours.
    #[arg(long)]
    ignore_market_hours: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut settings = signalboard_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    if let Some(page_url) = args.page_url {
        settings.page_url = page_url;
    }
    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(&settings.output));

    let source = UrlSignalSource::from_settings(&settings)?;
    let calendar = MarketCalendar::from_holiday_list(settings.market_holidays.as_deref())?;
    let publisher = HtmlFilePublisher::new(
        &output,
        PageOptions {
            auto_refresh: Some(settings.refresh_interval()),
        },
    );

    tracing::info!(
        data_url = %source.data_url(),
        output = %output.display(),
        once = args.once,
        "worker starting"
    );

    let options = RefreshOptions {
        interval: settings.refresh_interval(),
        load_on_start: true,
        ignore_market_hours: args.ignore_market_hours,
    };
    let mut controller =
        RefreshController::new(Arc::new(source), SignalBoard::shared(), calendar, options)
            .with_publisher(Arc::new(publisher));

    if args.once {
        return match controller.job().refresh_now(chrono::Utc::now()).await {
            RefreshOutcome::Rendered { rows } => {
                tracing::info!(rows, output = %output.display(), "one-shot refresh done");
                Ok(())
            }
            other => {
                let err = anyhow::anyhow!("one-shot refresh failed: {other:?}");
                sentry_anyhow::capture_anyhow(&err);
                Err(err)
            }
        };
    }

    controller.start();
    shutdown_signal().await;
    tracing::info!("shutdown requested");
    controller.dispose().await;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &signalboard_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
