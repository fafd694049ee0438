// Forwarder: hands a validated report to the downstream API

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::pipeline::error::PipelineError;
use crate::pipeline::model::PlantReport;

/// Default bound on a single downstream POST
pub const DEFAULT_FORWARD_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait Forwarder: Send + Sync {
    /// POST the report to `target_url`, returning the parsed response body
    async fn send(&self, report: &PlantReport, target_url: &str) -> Result<Value, PipelineError>;
}

/// reqwest-backed forwarder with a per-request timeout
#[derive(Debug, Clone)]
pub struct HttpForwarder {
    client: reqwest::Client,
}

impl HttpForwarder {
    pub fn new(timeout: Duration) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Forward { status: None, body: e.to_string() })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn send(&self, report: &PlantReport, target_url: &str) -> Result<Value, PipelineError> {
        tracing::info!("Forwarding report for {} to {}", report.plant_name, target_url);

        let response = self
            .client
            .post(target_url)
            .json(report)
            .send()
            .await
            .map_err(|e| PipelineError::Forward { status: None, body: e.to_string() })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PipelineError::Forward { status: Some(status.as_u16()), body: e.to_string() })?;

        if !status.is_success() {
            tracing::warn!("Downstream API rejected report: {} {}", status, body);
            return Err(PipelineError::Forward { status: Some(status.as_u16()), body });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| PipelineError::Forward {
            status: Some(status.as_u16()),
            body: format!("Downstream API returned invalid JSON: {}", e),
        })
    }
}
