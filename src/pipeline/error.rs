use thiserror::Error;

use crate::pipeline::orchestrator::PipelineStage;

/// Upstream systems feeding the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Erp,
    Maintenance,
    Metering,
    BuildingModel,
}

impl Source {
    /// Section name used in the inbound request body
    pub fn section(&self) -> &'static str {
        match self {
            Source::Erp => "sap",
            Source::Maintenance => "gmao",
            Source::Metering => "clear",
            Source::BuildingModel => "bim",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.section())
    }
}

/// Errors raised by the ingestion pipeline stages
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Missing field '{field}' in {origin} data")]
    MissingField { origin: Source, field: String },

    #[error("Cannot parse {field} value '{value}' as a non-negative number")]
    Parse { field: String, value: String },

    #[error("Contract error: {0}")]
    Contract(String),

    #[error("Audit error: {0}")]
    Audit(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{}", forward_message(.status, .body))]
    Forward { status: Option<u16>, body: String },
}

fn forward_message(status: &Option<u16>, body: &str) -> String {
    match status {
        Some(code) => format!("Downstream API returned {}: {}", code, body),
        None => format!("Downstream API unreachable: {}", body),
    }
}

impl PipelineError {
    pub fn missing(source: Source, field: impl Into<String>) -> Self {
        PipelineError::MissingField { origin: source, field: field.into() }
    }

    pub fn parse(field: impl Into<String>, value: impl Into<String>) -> Self {
        PipelineError::Parse { field: field.into(), value: value.into() }
    }

    /// Stable code for client handling
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::MissingField { .. } => "MISSING_FIELD",
            PipelineError::Parse { .. } => "PARSE_ERROR",
            PipelineError::Contract(_) => "CONTRACT_ERROR",
            PipelineError::Audit(_) => "AUDIT_ERROR",
            PipelineError::Validation(_) => "VALIDATION_FAILED",
            PipelineError::Forward { .. } => "FORWARD_FAILED",
        }
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Audit(err.to_string())
    }
}

/// A pipeline run that ended in the `Failed` state
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{error}")]
pub struct PipelineFailure {
    /// The stage that was being attempted when the error occurred
    pub stage: PipelineStage,
    pub error: PipelineError,
}

impl PipelineFailure {
    /// Stages the run passed through, ending in `Failed`
    pub fn stages(&self) -> Vec<PipelineStage> {
        PipelineStage::SEQUENCE
            .into_iter()
            .take_while(|stage| *stage != self.stage)
            .chain(std::iter::once(PipelineStage::Failed))
            .collect()
    }
}
