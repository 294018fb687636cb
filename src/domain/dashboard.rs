// Dashboard state and the snapshot handed to renderers
use super::aggregation::{aggregate, Aggregates, DEFAULT_BUCKET_LABEL_FORMAT};
use super::filter::{FilterState, RecordLimit, QUICK_RANGE_PRESETS};
use super::inspection::{format_timestamp, InspectionRecord, Status};
use super::recency::RecencyTracker;
use super::search::{filter_records, visible_count_label};
use serde::{Deserialize, Serialize};

/// Locale patterns for rendered timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DisplayFormat {
    pub bucket_label_format: String,
    pub timestamp_format: String,
}

impl Default for DisplayFormat {
    fn default() -> Self {
        Self {
            bucket_label_format: DEFAULT_BUCKET_LABEL_FORMAT.to_string(),
            timestamp_format: "%d.%m.%Y %H:%M:%S".to_string(),
        }
    }
}

/// Everything the live-sync engine holds between updates.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub filters: FilterState,
    pub machines: Vec<String>,
    pub products: Vec<String>,
    /// Newest first, exactly as returned by the source.
    pub history: Vec<InspectionRecord>,
    pub latest: Option<InspectionRecord>,
    pub recency: RecencyTracker,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordRow {
    #[serde(flatten)]
    pub record: InspectionRecord,
    pub outcome: Status,
    pub display_time: String,
    pub flash: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub filters: FilterState,
    pub active_filter: String,
    pub quick_ranges: [u32; 3],
    pub limits: [u32; 9],
    pub machines: Vec<String>,
    pub products: Vec<String>,
    pub has_data: bool,
    pub summary: Aggregates,
    pub latest: Option<RecordRow>,
    pub rows: Vec<RecordRow>,
    pub visible_count: String,
}

impl DashboardState {
    pub fn new(filters: FilterState) -> Self {
        Self {
            filters,
            ..Self::default()
        }
    }

    fn row(&self, record: &InspectionRecord, format: &DisplayFormat) -> RecordRow {
        RecordRow {
            record: record.clone(),
            outcome: record.status(),
            display_time: format_timestamp(&record.timestamp, &format.timestamp_format),
            flash: self.recency.is_recent(record.id),
        }
    }

    /// Project the current state into a renderable snapshot. Never fetches.
    pub fn view(&self, search: &str, format: &DisplayFormat) -> DashboardView {
        let summary = aggregate(&self.history, &format.bucket_label_format);
        let visible = filter_records(&self.history, search);

        DashboardView {
            filters: self.filters.clone(),
            active_filter: self.filters.describe(),
            quick_ranges: QUICK_RANGE_PRESETS,
            limits: RecordLimit::ALLOWED,
            machines: self.machines.clone(),
            products: self.products.clone(),
            has_data: summary.kpis.total > 0,
            visible_count: visible_count_label(visible.len(), self.history.len()),
            rows: visible.into_iter().map(|r| self.row(r, format)).collect(),
            latest: self.latest.as_ref().map(|r| self.row(r, format)),
            summary,
        }
    }
}
