// Scripted in-memory source shared by the application tests
use crate::application::inspection_source::{InspectionSource, SourceError};
use crate::domain::filter::QueryParams;
use crate::domain::inspection::InspectionRecord;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

type RealtimeReply = (Duration, Result<Option<InspectionRecord>, SourceError>);

/// Replies are consumed in call order; an exhausted script answers with empty data.
#[derive(Default)]
pub struct ScriptedSource {
    machines: Vec<String>,
    products: Vec<String>,
    catalog_fails: bool,
    history: Mutex<VecDeque<Result<Vec<InspectionRecord>, SourceError>>>,
    realtime: Mutex<VecDeque<RealtimeReply>>,
    history_calls: Mutex<Vec<QueryParams>>,
    realtime_calls: Mutex<Vec<QueryParams>>,
}

impl ScriptedSource {
    pub fn with_catalog(machines: &[&str], products: &[&str]) -> Self {
        Self {
            machines: machines.iter().map(|m| m.to_string()).collect(),
            products: products.iter().map(|p| p.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn with_failing_catalog() -> Self {
        Self {
            catalog_fails: true,
            ..Self::default()
        }
    }

    pub fn push_history(&self, reply: Result<Vec<InspectionRecord>, SourceError>) {
        self.history.lock().unwrap().push_back(reply);
    }

    pub fn push_realtime(&self, delay: Duration, reply: Result<Option<InspectionRecord>, SourceError>) {
        self.realtime.lock().unwrap().push_back((delay, reply));
    }

    pub fn history_calls(&self) -> Vec<QueryParams> {
        self.history_calls.lock().unwrap().clone()
    }

    pub fn realtime_calls(&self) -> Vec<QueryParams> {
        self.realtime_calls.lock().unwrap().clone()
    }
}

pub fn network_error(endpoint: &'static str) -> SourceError {
    SourceError::Network {
        endpoint,
        message: "connection refused".to_string(),
    }
}

#[async_trait]
impl InspectionSource for ScriptedSource {
    async fn machines(&self) -> Result<Vec<String>, SourceError> {
        if self.catalog_fails {
            return Err(network_error("/machines"));
        }
        Ok(self.machines.clone())
    }

    async fn products(&self) -> Result<Vec<String>, SourceError> {
        if self.catalog_fails {
            return Err(network_error("/products"));
        }
        Ok(self.products.clone())
    }

    async fn history(&self, params: &QueryParams) -> Result<Vec<InspectionRecord>, SourceError> {
        self.history_calls.lock().unwrap().push(params.clone());
        let reply = self.history.lock().unwrap().pop_front();
        reply.unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn realtime(
        &self,
        params: &QueryParams,
    ) -> Result<Option<InspectionRecord>, SourceError> {
        self.realtime_calls.lock().unwrap().push(params.clone());
        let reply = self.realtime.lock().unwrap().pop_front();
        let (delay, result) = reply.unwrap_or((Duration::ZERO, Ok(None)));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }

    fn export_url(&self, params: &QueryParams) -> String {
        format!("http://source.test/export?{}", params.query_string())
    }
}
