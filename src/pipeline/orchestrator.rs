// Pipeline orchestrator: Received -> Normalized -> Merged -> Validated -> Forwarded -> Done.
// Any failure moves straight to Failed; nothing is retried or rolled back.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;

use crate::config::PipelineConfig;
use crate::pipeline::audit::AuditStore;
use crate::pipeline::contract::{contract_data_path, CliContractValidator, ContractTemplate, ContractValidator};
use crate::pipeline::error::{PipelineError, PipelineFailure};
use crate::pipeline::forward::{Forwarder, HttpForwarder};
use crate::pipeline::merge::merge;
use crate::pipeline::model::{IngestRequest, PlantReport, SourcePartial};
use crate::pipeline::normalize::{
    normalize_building_model, normalize_erp, normalize_maintenance, normalize_metering,
};

/// A successful run records every stage through `Done`. A failed run ends in
/// `Failed`; see `PipelineFailure::stages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    Received,
    Normalized,
    Merged,
    Validated,
    Forwarded,
    Done,
    Failed,
}

impl PipelineStage {
    /// Stages of a successful run, in order
    pub const SEQUENCE: [PipelineStage; 6] = [
        PipelineStage::Received,
        PipelineStage::Normalized,
        PipelineStage::Merged,
        PipelineStage::Validated,
        PipelineStage::Forwarded,
        PipelineStage::Done,
    ];

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Done | PipelineStage::Failed)
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineStage::Received => "received",
            PipelineStage::Normalized => "normalized",
            PipelineStage::Merged => "merged",
            PipelineStage::Validated => "validated",
            PipelineStage::Forwarded => "forwarded",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Partials produced by the four normalizers
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSources {
    pub erp: SourcePartial,
    pub maintenance: SourcePartial,
    pub metering: SourcePartial,
    pub building_model: SourcePartial,
}

impl NormalizedSources {
    pub fn from_request(request: &IngestRequest) -> Result<Self, PipelineError> {
        Ok(Self {
            erp: normalize_erp(&request.sap.details)?,
            maintenance: normalize_maintenance(&request.gmao.details)?,
            metering: normalize_metering(&request.clear.details)?,
            building_model: normalize_building_model(&request.bim.details)?,
        })
    }

    pub fn merge(&self) -> PlantReport {
        merge(&self.erp, &self.maintenance, &self.metering, &self.building_model)
    }
}

/// Audit artifacts of a successful validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedReport {
    pub audit_path: PathBuf,
    pub contract_path: PathBuf,
}

/// Result of a run that reached `Done`
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub report: PlantReport,
    pub audit_path: PathBuf,
    pub contract_path: PathBuf,
    pub api_response: Value,
    pub stages: Vec<PipelineStage>,
    pub execution_time: Duration,
}

pub struct Pipeline {
    audit: AuditStore,
    contract_path: PathBuf,
    validator: Arc<dyn ContractValidator>,
    forwarder: Arc<dyn Forwarder>,
    target_url: String,
}

impl Pipeline {
    pub fn new(
        audit: AuditStore,
        contract_path: impl Into<PathBuf>,
        validator: Arc<dyn ContractValidator>,
        forwarder: Arc<dyn Forwarder>,
        target_url: impl Into<String>,
    ) -> Self {
        Self {
            audit,
            contract_path: contract_path.into(),
            validator,
            forwarder,
            target_url: target_url.into(),
        }
    }

    /// Pipeline backed by the external validator command and an HTTP forwarder
    pub fn from_config(config: &PipelineConfig) -> Result<Self, PipelineError> {
        let validator = CliContractValidator::new(&config.validator_command, config.validator_workers)?
            .with_timeout(config.validation_timeout());
        let forwarder = HttpForwarder::new(config.forward_timeout())?;

        Ok(Self::new(
            AuditStore::new(&config.uploads_dir, config.unique_audit_names),
            &config.contract_path,
            Arc::new(validator),
            Arc::new(forwarder),
            &config.forward_url,
        ))
    }

    pub fn contract_path(&self) -> &Path {
        &self.contract_path
    }

    /// Normalize and merge without any side effects
    pub fn prepare(&self, request: &IngestRequest) -> Result<PlantReport, PipelineFailure> {
        let sources = NormalizedSources::from_request(request)
            .map_err(|e| fail(PipelineStage::Normalized, e))?;
        Ok(sources.merge())
    }

    /// Persist the report, bind the contract to it, and run the validator
    pub async fn validate(&self, report: &PlantReport) -> Result<ValidatedReport, PipelineError> {
        let audit_path = self.audit.write_report(report).await?;

        let template = ContractTemplate::load(&self.contract_path).await?;
        let bound = template.render_bound(&contract_data_path(&audit_path))?;
        let contract_path = self.audit.write_contract(&audit_path, &bound).await?;

        tracing::debug!("Running validator {}", self.validator.name());
        self.validator.validate(&contract_path).await?;

        Ok(ValidatedReport { audit_path, contract_path })
    }

    /// Run one request through every stage
    pub async fn run(&self, request: &IngestRequest) -> Result<PipelineOutcome, PipelineFailure> {
        let start_time = Instant::now();
        let mut stages = vec![PipelineStage::Received];

        tracing::info!("Pipeline starting: target={}", self.target_url);

        let sources = NormalizedSources::from_request(request)
            .map_err(|e| fail(PipelineStage::Normalized, e))?;
        stages.push(PipelineStage::Normalized);

        let report = sources.merge();
        stages.push(PipelineStage::Merged);
        tracing::info!(
            "Merged report for {} with {} work lines",
            report.plant_name,
            report.work_lines.len()
        );

        let validated = self
            .validate(&report)
            .await
            .map_err(|e| fail(PipelineStage::Validated, e))?;
        stages.push(PipelineStage::Validated);

        let api_response = self
            .forwarder
            .send(&report, &self.target_url)
            .await
            .map_err(|e| fail(PipelineStage::Forwarded, e))?;
        stages.push(PipelineStage::Forwarded);
        stages.push(PipelineStage::Done);

        let execution_time = start_time.elapsed();
        tracing::info!("Pipeline completed in {:?}", execution_time);

        Ok(PipelineOutcome {
            report,
            audit_path: validated.audit_path,
            contract_path: validated.contract_path,
            api_response,
            stages,
            execution_time,
        })
    }
}

fn fail(stage: PipelineStage, error: PipelineError) -> PipelineFailure {
    tracing::warn!("Pipeline failed while {}: {}", stage, error);
    PipelineFailure { stage, error }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    const TEMPLATE: &str = "servers:\n  production:\n    type: local\n    path: placeholder.json\n";

    struct StaticValidator(Result<(), PipelineError>);

    #[async_trait]
    impl ContractValidator for StaticValidator {
        fn name(&self) -> &'static str {
            "StaticValidator"
        }

        async fn validate(&self, contract_path: &Path) -> Result<(), PipelineError> {
            assert!(contract_path.exists());
            self.0.clone()
        }
    }

    #[derive(Default)]
    struct RecordingForwarder {
        sent: Mutex<Vec<(String, PlantReport)>>,
    }

    #[async_trait]
    impl Forwarder for RecordingForwarder {
        async fn send(&self, report: &PlantReport, target_url: &str) -> Result<Value, PipelineError> {
            self.sent.lock().unwrap().push((target_url.to_string(), report.clone()));
            Ok(json!({ "received": true }))
        }
    }

    fn request() -> IngestRequest {
        serde_json::from_value(json!({
            "sap": { "details": { "employee_costs": "25000€", "sap_plant": "Zona Franca" } },
            "gmao": { "details": {
                "gmao_location": "Zona Franca",
                "gmao_worklines": [ { "workline_id": "L1", "electric_usage": "1200 kW", "downtime_total": "90" } ]
            } },
            "clear": { "details": { "line_id": "L1", "input_material": "50 Toneladas", "output_products": [] } },
            "bim": { "details": {
                "plant_location": "Zona Franca",
                "bim_worklines": [ { "ID_Linea": "L1", "line_name": "Tratamiento industriales y otros" } ]
            } }
        }))
        .unwrap()
    }

    fn pipeline(
        dir: &Path,
        validator: Result<(), PipelineError>,
        forwarder: Arc<RecordingForwarder>,
    ) -> Pipeline {
        let contract = dir.join("datacontract.yaml");
        std::fs::write(&contract, TEMPLATE).unwrap();
        Pipeline::new(
            AuditStore::new(dir.join("uploads"), true),
            contract,
            Arc::new(StaticValidator(validator)),
            forwarder,
            "http://downstream.test/reports",
        )
    }

    #[tokio::test]
    async fn successful_run_passes_every_stage() {
        let dir = tempfile::tempdir().unwrap();
        let forwarder = Arc::new(RecordingForwarder::default());
        let pipeline = pipeline(dir.path(), Ok(()), forwarder.clone());

        let outcome = pipeline.run(&request()).await.unwrap();

        assert_eq!(
            outcome.stages,
            vec![
                PipelineStage::Received,
                PipelineStage::Normalized,
                PipelineStage::Merged,
                PipelineStage::Validated,
                PipelineStage::Forwarded,
                PipelineStage::Done,
            ]
        );
        assert_eq!(outcome.api_response, json!({ "received": true }));
        assert!(outcome.audit_path.exists());

        let sent = forwarder.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "http://downstream.test/reports");
        assert_eq!(sent[0].1, outcome.report);
    }

    #[tokio::test]
    async fn bound_contract_points_at_audit_file_and_template_is_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path(), Ok(()), Arc::new(RecordingForwarder::default()));

        let outcome = pipeline.run(&request()).await.unwrap();

        let bound: serde_yaml::Value =
            serde_yaml::from_str(&std::fs::read_to_string(&outcome.contract_path).unwrap()).unwrap();
        assert_eq!(
            bound["servers"]["production"]["path"],
            serde_yaml::Value::from(outcome.audit_path.to_string_lossy().into_owned())
        );
        assert_eq!(std::fs::read_to_string(pipeline.contract_path()).unwrap(), TEMPLATE);
    }

    #[tokio::test]
    async fn validation_failure_stops_before_forwarding_and_keeps_audit_file() {
        let dir = tempfile::tempdir().unwrap();
        let forwarder = Arc::new(RecordingForwarder::default());
        let pipeline = pipeline(
            dir.path(),
            Err(PipelineError::Validation("plant_name is required".into())),
            forwarder.clone(),
        );

        let failure = pipeline.run(&request()).await.unwrap_err();

        assert_eq!(failure.stage, PipelineStage::Validated);
        assert_eq!(failure.error.code(), "VALIDATION_FAILED");
        assert!(forwarder.sent.lock().unwrap().is_empty());

        let audit_files: Vec<_> = std::fs::read_dir(dir.path().join("uploads"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |ext| ext == "json"))
            .collect();
        assert_eq!(audit_files.len(), 1);
    }

    #[tokio::test]
    async fn normalization_failure_is_reported_at_first_stage() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path(), Ok(()), Arc::new(RecordingForwarder::default()));
        let mut request = request();
        request.bim.details = json!({ "bim_worklines": [ { "line_name": "x" } ] })
            .as_object()
            .cloned()
            .unwrap();

        let failure = pipeline.run(&request).await.unwrap_err();
        assert_eq!(failure.stage, PipelineStage::Normalized);
        assert_eq!(failure.error.code(), "MISSING_FIELD");
        assert!(!dir.path().join("uploads").exists());
    }

    #[tokio::test]
    async fn missing_contract_template_fails_validation_stage() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(
            AuditStore::new(dir.path().join("uploads"), true),
            dir.path().join("absent.yaml"),
            Arc::new(StaticValidator(Ok(()))),
            Arc::new(RecordingForwarder::default()),
            "http://downstream.test/reports",
        );

        let failure = pipeline.run(&request()).await.unwrap_err();
        assert_eq!(failure.stage, PipelineStage::Validated);
        assert_eq!(failure.error.code(), "CONTRACT_ERROR");
    }

    #[test]
    fn prepare_merges_without_touching_disk() {
        let dir = tempfile::tempdir().unwrap();
        let forwarder = Arc::new(RecordingForwarder::default());
        let pipeline = pipeline(dir.path(), Ok(()), forwarder.clone());

        let report = pipeline.prepare(&request()).unwrap();
        assert_eq!(report.plant_name, "Zona Franca");
        assert_eq!(report.work_lines[0].electric_usage_kw, 1200.0);
        assert!(!dir.path().join("uploads").exists());
        assert!(forwarder.sent.lock().unwrap().is_empty());

        let mut bad = request();
        bad.bim.details.insert("bim_worklines".into(), json!([{ "line_name": "x" }]));
        let failure = pipeline.prepare(&bad).unwrap_err();
        assert_eq!(failure.stage, PipelineStage::Normalized);
        assert_eq!(failure.error.code(), "MISSING_FIELD");
    }

    #[tokio::test]
    async fn failed_run_trace_ends_in_failed() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(
            dir.path(),
            Err(PipelineError::Validation("schema mismatch".into())),
            Arc::new(RecordingForwarder::default()),
        );

        let failure = pipeline.run(&request()).await.unwrap_err();
        assert_eq!(
            failure.stages(),
            vec![
                PipelineStage::Received,
                PipelineStage::Normalized,
                PipelineStage::Merged,
                PipelineStage::Failed,
            ]
        );
        assert!(failure.stages().last().is_some_and(PipelineStage::is_terminal));
    }

    #[test]
    fn terminal_stages() {
        assert!(PipelineStage::Done.is_terminal());
        assert!(PipelineStage::Failed.is_terminal());
        assert!(!PipelineStage::Merged.is_terminal());
    }
}
