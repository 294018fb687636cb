// Application state for HTTP handlers
use crate::application::live_sync_service::LiveSyncService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub live_sync: Arc<LiveSyncService>,
}
