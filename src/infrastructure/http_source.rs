// HTTP implementation of the inspection record source
use crate::application::inspection_source::{InspectionSource, SourceError};
use crate::domain::filter::QueryParams;
use crate::domain::inspection::InspectionRecord;
use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpInspectionSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpInspectionSource {
    pub fn new(base_url: String, request_timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn build_url(&self, endpoint: &str, params: Option<&QueryParams>) -> String {
        let query = params.map(QueryParams::query_string).unwrap_or_default();
        if query.is_empty() {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}{}?{}", self.base_url, endpoint, query)
        }
    }

    async fn get_json(
        &self,
        endpoint: &'static str,
        params: Option<&QueryParams>,
    ) -> Result<Value, SourceError> {
        let url = self.build_url(endpoint, params);
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| SourceError::Network {
                endpoint,
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(SourceError::Network {
                endpoint,
                message: format!("status {}", response.status()),
            });
        }

        let body = response.text().await.map_err(|e| SourceError::Network {
            endpoint,
            message: e.to_string(),
        })?;

        serde_json::from_str(&body).map_err(|e| SourceError::Parse {
            endpoint,
            message: e.to_string(),
        })
    }
}

fn decode<T: DeserializeOwned>(endpoint: &'static str, value: Value) -> Result<T, SourceError> {
    serde_json::from_value(value).map_err(|e| SourceError::DataShape {
        endpoint,
        message: e.to_string(),
    })
}

/// `{}` and `null` both mean "nothing matches the filters".
fn is_empty_record(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(fields) => fields.is_empty(),
        _ => false,
    }
}

#[async_trait]
impl InspectionSource for HttpInspectionSource {
    async fn machines(&self) -> Result<Vec<String>, SourceError> {
        let value = self.get_json("/machines", None).await?;
        decode("/machines", value)
    }

    async fn products(&self) -> Result<Vec<String>, SourceError> {
        let value = self.get_json("/products", None).await?;
        decode("/products", value)
    }

    async fn history(&self, params: &QueryParams) -> Result<Vec<InspectionRecord>, SourceError> {
        let value = self.get_json("/history", Some(params)).await?;
        decode("/history", value)
    }

    async fn realtime(
        &self,
        params: &QueryParams,
    ) -> Result<Option<InspectionRecord>, SourceError> {
        let value = self.get_json("/realtime", Some(params)).await?;
        if is_empty_record(&value) {
            return Ok(None);
        }
        decode("/realtime", value).map(Some)
    }

    fn export_url(&self, params: &QueryParams) -> String {
        self.build_url("/export", Some(params))
    }
}
