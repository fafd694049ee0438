// Audit artifacts: the exact report that was validated and sent, plus the
// contract copy bound to it. Files are written once and never rewritten.

use std::path::{Path, PathBuf};

use tokio::io::{AsyncWrite, AsyncWriteExt};
use uuid::Uuid;

use crate::pipeline::error::PipelineError;
use crate::pipeline::model::PlantReport;

/// Compact filename token for a report timestamp: 2024-05-01T10:20:30 -> 20240501_102030
pub fn file_token(timestamp: &str) -> String {
    timestamp
        .replace([':', '-', 'Z'], "")
        .replace('T', "_")
}

/// Writes audit files under a single uploads directory
#[derive(Debug, Clone)]
pub struct AuditStore {
    dir: PathBuf,
    unique_names: bool,
}

impl AuditStore {
    pub fn new(dir: impl Into<PathBuf>, unique_names: bool) -> Self {
        Self {
            dir: dir.into(),
            unique_names,
        }
    }

    /// Write the report as 2-space-indented JSON and return its path.
    /// Fails rather than overwrite an existing audit file.
    pub async fn write_report(&self, report: &PlantReport) -> Result<PathBuf, PipelineError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.dir.join(format!("{}.json", self.name_for(report)));
        let body = serde_json::to_vec_pretty(report)
            .map_err(|e| PipelineError::Audit(format!("Failed to serialize report: {}", e)))?;
        write_new(&path, &body).await?;

        tracing::info!("Wrote audit report {}", path.display());
        Ok(path)
    }

    /// Write a bound contract document next to the audit report it points at
    pub async fn write_contract(
        &self,
        report_path: &Path,
        contract_yaml: &str,
    ) -> Result<PathBuf, PipelineError> {
        let stem = report_path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| PipelineError::Audit(format!("Invalid audit path {}", report_path.display())))?;
        let path = self.dir.join(format!("{}.datacontract.yaml", stem));
        write_new(&path, contract_yaml.as_bytes()).await?;

        tracing::debug!("Wrote bound contract {}", path.display());
        Ok(path)
    }

    fn name_for(&self, report: &PlantReport) -> String {
        let token = file_token(&report.metadata.timestamp);
        if self.unique_names {
            let suffix = Uuid::new_v4().simple().to_string();
            format!("{}-{}", token, &suffix[..8])
        } else {
            token
        }
    }
}

/// Read an audit report back from disk
pub async fn read_report(path: &Path) -> Result<PlantReport, PipelineError> {
    let content = tokio::fs::read(path).await?;
    serde_json::from_slice(&content)
        .map_err(|e| PipelineError::Audit(format!("Invalid audit report {}: {}", path.display(), e)))
}

async fn write_new(path: &Path, body: &[u8]) -> Result<(), PipelineError> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .map_err(|e| PipelineError::Audit(format!("Cannot create {}: {}", path.display(), e)))?;
    fill_or_remove(path, &mut file, body).await
}

/// Write `body` into a freshly created file; a partial file is removed so
/// no truncated audit artifact is left behind
async fn fill_or_remove<W>(path: &Path, writer: &mut W, body: &[u8]) -> Result<(), PipelineError>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        writer.write_all(body).await?;
        writer.flush().await
    }
    .await;

    if let Err(e) = written {
        if let Err(cleanup) = tokio::fs::remove_file(path).await {
            tracing::warn!("Cannot remove partial file {}: {}", path.display(), cleanup);
        }
        return Err(PipelineError::Audit(format!("Cannot write {}: {}", path.display(), e)));
    }
    Ok(())
}
