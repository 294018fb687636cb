// Live sync service - wires filter edits to history reloads and the poller
use crate::application::inspection_source::InspectionSource;
use crate::application::poller::Poller;
use crate::domain::dashboard::{DashboardState, DashboardView, DisplayFormat};
use crate::domain::filter::{FilterCommand, FilterError, FilterState};
use chrono::{Local, NaiveDateTime};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

pub struct LiveSyncService {
    source: Arc<dyn InspectionSource>,
    state: Arc<RwLock<DashboardState>>,
    poller: Mutex<Poller>,
    display: DisplayFormat,
}

impl LiveSyncService {
    pub fn new(
        source: Arc<dyn InspectionSource>,
        filters: FilterState,
        poll_interval: Duration,
        display: DisplayFormat,
    ) -> Self {
        let state = Arc::new(RwLock::new(DashboardState::new(filters)));
        let poller = Poller::new(source.clone(), state.clone(), poll_interval);
        Self {
            source,
            state,
            poller: Mutex::new(poller),
            display,
        }
    }

    /// Load the catalog and first history page, then start polling.
    pub async fn start(&self) {
        self.load_catalog().await;
        self.reload_history().await;
        self.rearm_poller().await;
    }

    pub async fn shutdown(&self) {
        self.poller.lock().await.stop().await;
        tracing::info!("live sync stopped");
    }

    /// Machine and product lists, attempted once each.
    pub async fn load_catalog(&self) {
        let machines = match self.source.machines().await {
            Ok(machines) => machines,
            Err(e) => {
                tracing::warn!("Failed to load machines: {}", e);
                Vec::new()
            }
        };
        let products = match self.source.products().await {
            Ok(products) => products,
            Err(e) => {
                tracing::warn!("Failed to load products: {}", e);
                Vec::new()
            }
        };

        tracing::debug!(machines = machines.len(), products = products.len(), "catalog loaded");
        let mut state = self.state.write().await;
        state.machines = machines;
        state.products = products;
    }

    /// Replace the loaded history with a fresh fetch. On failure the previous
    /// records stay in place.
    pub async fn reload_history(&self) {
        let params = self.state.read().await.filters.history_params();

        match self.source.history(&params).await {
            Ok(records) => {
                tracing::debug!(count = records.len(), query = %params.query_string(), "history loaded");
                self.state.write().await.history = records;
            }
            Err(e) => {
                tracing::warn!("Failed to load history, keeping previous records: {}", e);
            }
        }
    }

    async fn rearm_poller(&self) {
        let mut poller = self.poller.lock().await;
        let params = self.state.read().await.filters.realtime_params();
        poller.arm(params).await;
    }

    pub async fn apply(&self, command: FilterCommand) -> Result<FilterState, FilterError> {
        self.apply_at(command, Local::now().naive_local()).await
    }

    /// Apply a filter edit using `now` for quick ranges.
    pub async fn apply_at(
        &self,
        command: FilterCommand,
        now: NaiveDateTime,
    ) -> Result<FilterState, FilterError> {
        let (change, filters) = {
            let mut state = self.state.write().await;
            let change = state.filters.apply(command, now)?;
            (change, state.filters.clone())
        };

        if change.is_empty() {
            tracing::debug!("filter command left the query unchanged");
            return Ok(filters);
        }

        if change.realtime {
            self.rearm_poller().await;
        }
        if change.history {
            self.reload_history().await;
        }
        Ok(filters)
    }

    pub async fn filters(&self) -> FilterState {
        self.state.read().await.filters.clone()
    }

    pub async fn catalog(&self) -> (Vec<String>, Vec<String>) {
        let state = self.state.read().await;
        (state.machines.clone(), state.products.clone())
    }

    pub async fn dashboard(&self, search: &str) -> DashboardView {
        self.state.read().await.view(search, &self.display)
    }

    pub async fn export_url(&self) -> String {
        let params = self.state.read().await.filters.export_params();
        self.source.export_url(&params)
    }

    pub async fn poller_generation(&self) -> u64 {
        self.poller.lock().await.generation()
    }
}
