// Filter state and canonical query parameter derivation
use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minute-precision format used by the datetime inputs.
pub const UI_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Quick range shortcuts offered to the user, in minutes.
pub const QUICK_RANGE_PRESETS: [u32; 3] = [15, 60, 1440];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("unsupported record limit {0}, expected one of {allowed:?}", allowed = RecordLimit::ALLOWED)]
    UnsupportedLimit(u32),
}

/// Number of history records to request; restricted to a fixed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct RecordLimit(u32);

impl RecordLimit {
    pub const ALLOWED: [u32; 9] = [10, 25, 50, 100, 200, 300, 500, 1000, 2000];

    pub fn new(value: u32) -> Result<Self, FilterError> {
        if Self::ALLOWED.contains(&value) {
            Ok(Self(value))
        } else {
            Err(FilterError::UnsupportedLimit(value))
        }
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl Default for RecordLimit {
    fn default() -> Self {
        Self(10)
    }
}

impl TryFrom<u32> for RecordLimit {
    type Error = FilterError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RecordLimit> for u32 {
    fn from(limit: RecordLimit) -> Self {
        limit.0
    }
}

/// Canonical parameter set sent to the record source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

impl QueryParams {
    /// Present parameters in wire order. Empty values are never included.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(5);
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        let optional = [
            ("machine_id", &self.machine_id),
            ("product_id", &self.product_id),
            ("start", &self.start),
            ("end", &self.end),
        ];
        for (key, value) in optional {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                pairs.push((key, value.to_string()));
            }
        }
        pairs
    }

    pub fn query_string(&self) -> String {
        self.pairs()
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// A single user edit to the filter state.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FilterCommand {
    SelectMachine { machine_id: Option<String> },
    SelectProduct { product_id: Option<String> },
    SetLimit { limit: u32 },
    SetStart { value: Option<String> },
    SetEnd { value: Option<String> },
    QuickRange { minutes: u32 },
    ClearRange,
}

/// Which consumers must refresh after a filter edit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterChange {
    pub history: bool,
    pub realtime: bool,
}

impl FilterChange {
    pub fn is_empty(&self) -> bool {
        !self.history && !self.realtime
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterState {
    selected_machine: Option<String>,
    selected_product: Option<String>,
    limit: RecordLimit,
    start_local: Option<String>,
    end_local: Option<String>,
    active_quick_range_minutes: Option<u32>,
}

impl FilterState {
    pub fn with_limit(limit: RecordLimit) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn start_local(&self) -> Option<&str> {
        self.start_local.as_deref()
    }

    pub fn end_local(&self) -> Option<&str> {
        self.end_local.as_deref()
    }

    pub fn active_quick_range(&self) -> Option<u32> {
        self.active_quick_range_minutes
    }

    pub fn select_machine(&mut self, machine_id: Option<String>) {
        self.selected_machine = non_empty(machine_id);
    }

    pub fn select_product(&mut self, product_id: Option<String>) {
        self.selected_product = non_empty(product_id);
    }

    pub fn set_limit(&mut self, limit: RecordLimit) {
        self.limit = limit;
    }

    /// Manual edit of the range start; leaves quick-range mode.
    pub fn set_start(&mut self, value: Option<String>) {
        self.start_local = non_empty(value);
        self.active_quick_range_minutes = None;
    }

    /// Manual edit of the range end; leaves quick-range mode.
    pub fn set_end(&mut self, value: Option<String>) {
        self.end_local = non_empty(value);
        self.active_quick_range_minutes = None;
    }

    /// Set the range to `[now - minutes, now]`, both bounds derived from the same `now`.
    pub fn set_quick_range(&mut self, minutes: u32, now: NaiveDateTime) {
        let start = now - TimeDelta::minutes(i64::from(minutes));
        self.start_local = Some(start.format(UI_TIME_FORMAT).to_string());
        self.end_local = Some(now.format(UI_TIME_FORMAT).to_string());
        self.active_quick_range_minutes = Some(minutes);
    }

    pub fn clear_range(&mut self) {
        self.start_local = None;
        self.end_local = None;
        self.active_quick_range_minutes = None;
    }

    /// Apply a command and report which fetches it invalidates.
    pub fn apply(
        &mut self,
        command: FilterCommand,
        now: NaiveDateTime,
    ) -> Result<FilterChange, FilterError> {
        let history_before = self.history_params();
        let realtime_before = self.realtime_params();

        match command {
            FilterCommand::SelectMachine { machine_id } => self.select_machine(machine_id),
            FilterCommand::SelectProduct { product_id } => self.select_product(product_id),
            FilterCommand::SetLimit { limit } => self.set_limit(RecordLimit::new(limit)?),
            FilterCommand::SetStart { value } => self.set_start(value),
            FilterCommand::SetEnd { value } => self.set_end(value),
            FilterCommand::QuickRange { minutes } => self.set_quick_range(minutes, now),
            FilterCommand::ClearRange => self.clear_range(),
        }

        Ok(FilterChange {
            history: history_before != self.history_params(),
            realtime: realtime_before != self.realtime_params(),
        })
    }

    pub fn history_params(&self) -> QueryParams {
        QueryParams {
            limit: Some(self.limit.get()),
            ..self.realtime_params()
        }
    }

    pub fn realtime_params(&self) -> QueryParams {
        QueryParams {
            limit: None,
            machine_id: self.selected_machine.clone(),
            product_id: self.selected_product.clone(),
            start: self.start_local.as_deref().map(to_wire_time),
            end: self.end_local.as_deref().map(to_wire_time),
        }
    }

    pub fn export_params(&self) -> QueryParams {
        self.history_params()
    }

    /// Human readable summary of the active filters.
    pub fn describe(&self) -> String {
        let machine = self.selected_machine.as_deref().unwrap_or("All");
        let product = self.selected_product.as_deref().unwrap_or("All");
        let range = if self.start_local.is_some() || self.end_local.is_some() {
            let start = self.start_local.as_deref().map_or("…".to_string(), |s| s.replacen('T', " ", 1));
            let end = self.end_local.as_deref().map_or("…".to_string(), |s| s.replacen('T', " ", 1));
            format!("{} → {}", start, end)
        } else {
            "All".to_string()
        };
        format!("Machine: {} | Product: {} | Range: {}", machine, product, range)
    }
}

/// "YYYY-MM-DDTHH:MM" -> "YYYY-MM-DD HH:MM:00". Malformed input is not rejected.
pub fn to_wire_time(local: &str) -> String {
    format!("{}:00", local.replacen('T', " ", 1))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
