// Data contract binding and the external validation capability

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_yaml::{Mapping, Value};
use tokio::process::Command;
use tokio::sync::Semaphore;

use crate::pipeline::error::PipelineError;

/// Declarative contract describing the expected plant report.
///
/// The template is read-only: binding produces a new document whose only
/// difference is `servers.production.path`.
#[derive(Debug, Clone)]
pub struct ContractTemplate {
    document: Value,
}

impl ContractTemplate {
    pub async fn load(path: &Path) -> Result<Self, PipelineError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            PipelineError::Contract(format!("Cannot read contract {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, PipelineError> {
        let document: Value = serde_yaml::from_str(content)
            .map_err(|e| PipelineError::Contract(format!("Invalid contract document: {}", e)))?;
        production_server(&document)?;
        Ok(Self { document })
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Copy of the contract pointing its production server at `data_path`
    pub fn bind(&self, data_path: &str) -> Result<Value, PipelineError> {
        let mut bound = self.document.clone();
        let production = bound
            .get_mut("servers")
            .and_then(|servers| servers.get_mut("production"))
            .and_then(Value::as_mapping_mut)
            .ok_or_else(missing_production)?;
        production.insert(Value::from("path"), Value::from(data_path));
        Ok(bound)
    }

    /// Bind and render as YAML
    pub fn render_bound(&self, data_path: &str) -> Result<String, PipelineError> {
        let bound = self.bind(data_path)?;
        serde_yaml::to_string(&bound)
            .map_err(|e| PipelineError::Contract(format!("Failed to render contract: {}", e)))
    }
}

fn production_server(document: &Value) -> Result<&Mapping, PipelineError> {
    document
        .get("servers")
        .and_then(|servers| servers.get("production"))
        .and_then(Value::as_mapping)
        .ok_or_else(missing_production)
}

fn missing_production() -> PipelineError {
    PipelineError::Contract("Contract has no servers.production section".to_string())
}

/// Checks a bound contract document against the data it points at
#[async_trait]
pub trait ContractValidator: Send + Sync {
    /// Validator name for logging
    fn name(&self) -> &'static str;

    async fn validate(&self, contract_path: &Path) -> Result<(), PipelineError>;
}

/// Runs an external contract-testing command (`datacontract test <contract>` by default).
///
/// Invocations are queued through a semaphore so at most `workers` validator
/// processes run at once.
pub struct CliContractValidator {
    program: String,
    args: Vec<String>,
    queue: Semaphore,
    timeout: Option<Duration>,
}

impl CliContractValidator {
    /// `command` is the program followed by its leading arguments; the contract path is appended
    pub fn new(command: &[String], workers: usize) -> Result<Self, PipelineError> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| PipelineError::Contract("Validator command is empty".to_string()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            queue: Semaphore::new(workers.max(1)),
            timeout: None,
        })
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, contract_path: &Path) -> Result<std::process::Output, PipelineError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(contract_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        let output = command.output();

        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, output).await.map_err(|_| {
                PipelineError::Validation(format!("{} timed out after {:?}", self.program, limit))
            })?,
            None => output.await,
        };

        result.map_err(|e| PipelineError::Validation(format!("Failed to launch {}: {}", self.program, e)))
    }
}

#[async_trait]
impl ContractValidator for CliContractValidator {
    fn name(&self) -> &'static str {
        "CliContractValidator"
    }

    async fn validate(&self, contract_path: &Path) -> Result<(), PipelineError> {
        let _permit = self
            .queue
            .acquire()
            .await
            .map_err(|e| PipelineError::Validation(e.to_string()))?;

        tracing::info!("Validating contract {} with {}", contract_path.display(), self.program);
        let output = self.run(contract_path).await?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let diagnostic = if stderr.is_empty() {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        } else {
            stderr
        };
        tracing::warn!("Contract validation failed ({}): {}", output.status, diagnostic);
        Err(PipelineError::Validation(diagnostic))
    }
}

/// Path string written into the bound contract
pub fn contract_data_path(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
