// Inspection record domain model
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

/// Formats accepted for source timestamps, tried in order.
const TIMESTAMP_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Pass,
    Fail,
}

impl Status {
    /// Anything that is not case-insensitively "PASS" counts as a failure.
    pub fn normalize(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("pass") {
            Status::Pass
        } else {
            Status::Fail
        }
    }
}

/// One pass/fail inspection event as returned by the record source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionRecord {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub status: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub machine_id: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub product_id: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub timestamp: String,
}

// Source columns are nullable; a null must not reject the whole batch.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl InspectionRecord {
    pub fn new(
        id: i64,
        status: impl Into<String>,
        machine_id: impl Into<String>,
        product_id: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            id,
            status: status.into(),
            machine_id: machine_id.into(),
            product_id: product_id.into(),
            timestamp: timestamp.into(),
        }
    }

    pub fn status(&self) -> Status {
        Status::normalize(&self.status)
    }

    pub fn is_pass(&self) -> bool {
        self.status() == Status::Pass
    }

    /// Haystack used by the table search.
    pub fn search_text(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.id, self.status, self.machine_id, self.product_id, self.timestamp
        )
    }
}

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Render a timestamp with `pattern`, falling back to the raw string.
pub fn format_timestamp(raw: &str, pattern: &str) -> String {
    match parse_timestamp(raw) {
        Some(time) => time.format(pattern).to_string(),
        None => raw.to_string(),
    }
}
