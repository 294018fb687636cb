// HTTP request handlers
use crate::domain::dashboard::DashboardView;
use crate::domain::filter::{FilterCommand, FilterState, QueryParams};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Serialize)]
pub struct CatalogResponse {
    pub machines: Vec<String>,
    pub products: Vec<String>,
}

#[derive(Serialize)]
pub struct FiltersResponse {
    pub filters: FilterState,
    pub active_filter: String,
    pub history_params: QueryParams,
    pub realtime_params: QueryParams,
}

impl From<FilterState> for FiltersResponse {
    fn from(filters: FilterState) -> Self {
        Self {
            active_filter: filters.describe(),
            history_params: filters.history_params(),
            realtime_params: filters.realtime_params(),
            filters,
        }
    }
}

#[derive(Serialize)]
pub struct ExportResponse {
    pub url: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/dashboard", get(get_dashboard))
        .route("/catalog", get(get_catalog))
        .route("/filters", get(get_filters).post(update_filters))
        .route("/export", get(get_export))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Current dashboard snapshot, rows narrowed by the optional `q` search
pub async fn get_dashboard(
    Query(query): Query<SearchQuery>,
    State(state): State<Arc<AppState>>,
) -> Json<DashboardView> {
    let search = query.q.unwrap_or_default();
    Json(state.live_sync.dashboard(&search).await)
}

pub async fn get_catalog(State(state): State<Arc<AppState>>) -> Json<CatalogResponse> {
    let (machines, products) = state.live_sync.catalog().await;
    Json(CatalogResponse { machines, products })
}

pub async fn get_filters(State(state): State<Arc<AppState>>) -> Json<FiltersResponse> {
    Json(state.live_sync.filters().await.into())
}

/// Apply one filter edit; history and polling follow the new filters
pub async fn update_filters(
    State(state): State<Arc<AppState>>,
    Json(command): Json<FilterCommand>,
) -> Result<Json<FiltersResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.live_sync.apply(command).await {
        Ok(filters) => Ok(Json(filters.into())),
        Err(e) => {
            tracing::warn!("Rejected filter command: {}", e);
            Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorResponse { error: e.to_string() }),
            ))
        }
    }
}

/// Where the source serves the CSV export for the active filters
pub async fn get_export(State(state): State<Arc<AppState>>) -> Json<ExportResponse> {
    Json(ExportResponse {
        url: state.live_sync.export_url().await,
    })
}
