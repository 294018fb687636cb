// Boundary trait for the inspection record source
use crate::domain::filter::QueryParams;
use crate::domain::inspection::InspectionRecord;
use async_trait::async_trait;
use thiserror::Error;

/// Failures talking to the record source. All of them are recoverable:
/// callers log and keep whatever they had before.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request to {endpoint} failed: {message}")]
    Network {
        endpoint: &'static str,
        message: String,
    },

    #[error("malformed body from {endpoint}: {message}")]
    Parse {
        endpoint: &'static str,
        message: String,
    },

    #[error("unexpected data shape from {endpoint}: {message}")]
    DataShape {
        endpoint: &'static str,
        message: String,
    },
}

#[async_trait]
pub trait InspectionSource: Send + Sync {
    /// Distinct machine ids known to the source
    async fn machines(&self) -> Result<Vec<String>, SourceError>;

    /// Distinct product ids known to the source
    async fn products(&self) -> Result<Vec<String>, SourceError>;

    /// Up to `params.limit` most recent matching records, newest first
    async fn history(&self, params: &QueryParams) -> Result<Vec<InspectionRecord>, SourceError>;

    /// The single most recent matching record, if any
    async fn realtime(&self, params: &QueryParams)
    -> Result<Option<InspectionRecord>, SourceError>;

    /// Location of the CSV export for the given filters
    fn export_url(&self, params: &QueryParams) -> String;
}
