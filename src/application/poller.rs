// Realtime poller - keeps the "latest record" slot fresh on a fixed interval
use crate::application::inspection_source::InspectionSource;
use crate::domain::dashboard::DashboardState;
use crate::domain::filter::QueryParams;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

struct ActiveTimer {
    generation: u64,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns at most one interval timer. Re-arming always cancels and joins the
/// previous timer before the next one starts.
pub struct Poller {
    source: Arc<dyn InspectionSource>,
    state: Arc<RwLock<DashboardState>>,
    interval: Duration,
    generation: u64,
    active: Option<ActiveTimer>,
}

impl Poller {
    pub fn new(
        source: Arc<dyn InspectionSource>,
        state: Arc<RwLock<DashboardState>>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            state,
            interval,
            generation: 0,
            active: None,
        }
    }

    /// Number of timers armed so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Start polling with `params`, replacing any running timer.
    pub async fn arm(&mut self, params: QueryParams) {
        self.stop().await;

        self.generation += 1;
        let generation = self.generation;
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_timer(
            self.source.clone(),
            self.state.clone(),
            self.interval,
            params,
            cancel.clone(),
        ));

        tracing::info!(generation, interval_ms = self.interval.as_millis() as u64, "realtime poller armed");
        self.active = Some(ActiveTimer {
            generation,
            cancel,
            handle,
        });
    }

    /// Cancel the running timer and wait for its task to exit.
    ///
    /// Fetches already in flight are not aborted and may still land.
    pub async fn stop(&mut self) {
        if let Some(timer) = self.active.take() {
            timer.cancel.cancel();
            if let Err(e) = timer.handle.await {
                tracing::warn!(generation = timer.generation, "poller task ended abnormally: {}", e);
            }
            tracing::debug!(generation = timer.generation, "realtime poller stopped");
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        if let Some(timer) = &self.active {
            timer.cancel.cancel();
        }
    }
}

async fn run_timer(
    source: Arc<dyn InspectionSource>,
    state: Arc<RwLock<DashboardState>>,
    interval: Duration,
    params: QueryParams,
    cancel: CancellationToken,
) {
    // first tick completes immediately
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                tokio::spawn(poll_once(source.clone(), state.clone(), params.clone()));
            }
        }
    }
}

/// One realtime fetch. Whichever response settles last owns the slot.
pub async fn poll_once(
    source: Arc<dyn InspectionSource>,
    state: Arc<RwLock<DashboardState>>,
    params: QueryParams,
) {
    match source.realtime(&params).await {
        Ok(latest) => {
            let mut state = state.write().await;
            let previous = state.recency.last_id();
            if let Some(record) = &latest {
                state.recency.observe(record.id);
            }
            tracing::debug!(id = latest.as_ref().map(|r| r.id), previous, "realtime record received");
            state.latest = latest;
        }
        Err(e) => {
            tracing::warn!("Realtime poll failed, keeping previous record: {}", e);
        }
    }
}
