use std::sync::Arc;

use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::pipeline::{IngestRequest, Pipeline};

/// POST /api/v1/process_data/
///
/// Runs the four source sections through the pipeline and relays the
/// downstream API's response. Any stage failure becomes a 500 carrying the
/// failing stage and an error code.
pub async fn process_data(
    Extension(pipeline): Extension<Arc<Pipeline>>,
    Json(request): Json<IngestRequest>,
) -> Result<Json<Value>, ApiError> {
    let outcome = pipeline.run(&request).await?;

    tracing::info!(
        "Processed report for {} (audit file {})",
        outcome.report.plant_name,
        outcome.audit_path.display()
    );

    Ok(Json(json!({
        "message": "Data sent successfully",
        "api_response": outcome.api_response
    })))
}
