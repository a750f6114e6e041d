use crate::load::SignalSource;
use crate::render::{BoardPublisher, SharedBoard};
use crate::time::ist_market::MarketCalendar;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

const DEFAULT_INTERVAL: Duration = Duration::from_millis(300_000);

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct RefreshOptions {
    pub interval: Duration,
    /// Load once when the controller starts, regardless of market hours.
    pub load_on_start: bool,
    pub ignore_market_hours: bool,
}

impl Default for RefreshOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            load_on_start: true,
            ignore_market_hours: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Rendered { rows: usize },
    /// The board was updated but writing it out failed.
    PublishFailed { rows: usize },
    LoadFailed,
    Skipped,
}

/// One load-and-render pass. Failures are logged and never reach the board.
#[derive(Clone)]
pub struct RefreshJob {
    source: Arc<dyn SignalSource>,
    board: SharedBoard,
    publisher: Option<Arc<dyn BoardPublisher>>,
    calendar: Arc<MarketCalendar>,
    ignore_market_hours: bool,
}

impl RefreshJob {
    pub fn board(&self) -> &SharedBoard {
        &self.board
    }

    pub async fn refresh_now(&self, now: DateTime<Utc>) -> RefreshOutcome {
        let doc = match self.source.load().await {
            Ok(doc) => doc,
            Err(err) => {
                tracing::error!(
                    source = self.source.source_name(),
                    stage = err.stage.as_str(),
                    url = %err.url,
                    error = %err,
                    "signal load failed; keeping previous render"
                );
                return RefreshOutcome::LoadFailed;
            }
        };

        let snapshot = {
            let mut board = self.board.write().await;
            board.render(&doc, now);
            board.clone()
        };
        let rows = snapshot.rows.len();

        if let Some(publisher) = &self.publisher {
            if let Err(err) = publisher.publish(&snapshot).await {
                tracing::error!(rows, error = %format!("{err:#}"), "publishing dashboard failed");
                return RefreshOutcome::PublishFailed { rows };
            }
        }

        tracing::info!(rows, updated = %snapshot.updated, "dashboard refreshed");
        RefreshOutcome::Rendered { rows }
    }

    /// Scheduled tick: refreshes only while the market is open.
    pub async fn tick(&self, now: DateTime<Utc>) -> RefreshOutcome {
        if !self.ignore_market_hours {
            match self.calendar.should_refresh(now) {
                Ok(true) => {}
                Ok(false) => {
                    tracing::info!(%now, "outside market hours; skipping refresh");
                    return RefreshOutcome::Skipped;
                }
                Err(err) => {
                    tracing::error!(error = %format!("{err:#}"), "market calendar check failed");
                    return RefreshOutcome::Skipped;
                }
            }
        }
        self.refresh_now(now).await
    }
}

struct Running {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Owns the periodic refresh task. Loads run one at a time inside that task, so a slow fetch can
/// never be overtaken by a later one.
pub struct RefreshController {
    job: RefreshJob,
    options: RefreshOptions,
    clock: Clock,
    running: Option<Running>,
}

impl RefreshController {
    pub fn new(
        source: Arc<dyn SignalSource>,
        board: SharedBoard,
        calendar: MarketCalendar,
        options: RefreshOptions,
    ) -> Self {
        let job = RefreshJob {
            source,
            board,
            publisher: None,
            calendar: Arc::new(calendar),
            ignore_market_hours: options.ignore_market_hours,
        };
        Self {
            job,
            options,
            clock: Arc::new(Utc::now),
            running: None,
        }
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn BoardPublisher>) -> Self {
        self.job.publisher = Some(publisher);
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn job(&self) -> &RefreshJob {
        &self.job
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|r| !r.task.is_finished())
    }

    pub fn start(&mut self) {
        if self.is_running() {
            tracing::warn!("refresh controller already running");
            return;
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(run_loop(
            self.job.clone(),
            self.options.clone(),
            Arc::clone(&self.clock),
            stop_rx,
        ));
        self.running = Some(Running { stop_tx, task });
    }

    /// Stops the loop, cancelling an in-flight load, and waits for the task to finish.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        let _ = running.stop_tx.send(true);
        if let Err(err) = running.task.await {
            if !err.is_cancelled() {
                tracing::error!(error = %err, "refresh task ended abnormally");
            }
        }
    }

    pub async fn dispose(mut self) {
        self.stop().await;
    }
}

impl Drop for RefreshController {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.task.abort();
        }
    }
}

async fn run_loop(
    job: RefreshJob,
    options: RefreshOptions,
    clock: Clock,
    mut stop_rx: watch::Receiver<bool>,
) {
    tracing::info!(
        interval_secs = options.interval.as_secs(),
        ignore_market_hours = options.ignore_market_hours,
        "refresh loop started"
    );

    if options.load_on_start {
        tokio::select! {
            _ = job.refresh_now(clock()) => {}
            _ = stopped(&mut stop_rx) => {
                tracing::info!("refresh loop stopped");
                return;
            }
        }
    }

    let mut ticker = tokio::time::interval_at(Instant::now() + options.interval, options.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = stopped(&mut stop_rx) => break,
        }
        tokio::select! {
            _ = job.tick(clock()) => {}
            _ = stopped(&mut stop_rx) => break,
        }
    }

    tracing::info!("refresh loop stopped");
}

// A dropped sender counts as a stop request.
async fn stopped(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}
