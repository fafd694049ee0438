use axum::{extract::Path, Json};
use serde_json::{json, Value};

use crate::database::models::{Policy, PolicyCreate, PolicyUpdate, PolicyView};
use crate::database::DatabaseManager;
use crate::middleware::{ApiResponse, ApiResult, IntoApiResponse};
use crate::services::PolicyService;

async fn service() -> Result<PolicyService, crate::error::ApiError> {
    Ok(PolicyService::new(DatabaseManager::pool().await?))
}

/// POST /api/v1/policies/
pub async fn create(Json(payload): Json<PolicyCreate>) -> ApiResult<PolicyView> {
    let created = service().await?.create(payload).await?;
    Ok(ApiResponse::created(created))
}

/// GET /api/v1/policies/
pub async fn list() -> ApiResult<Vec<PolicyView>> {
    Ok(service().await?.list().await?.into_api_response())
}

/// GET /api/v1/policies/:id
pub async fn get(Path(id): Path<i32>) -> ApiResult<PolicyView> {
    Ok(service().await?.get(id).await?.into_api_response())
}

/// PUT /api/v1/policies/:id
pub async fn update(Path(id): Path<i32>, Json(payload): Json<PolicyUpdate>) -> ApiResult<PolicyView> {
    Ok(service().await?.update(id, payload).await?.into_api_response())
}

/// DELETE /api/v1/policies/:id
pub async fn delete(Path(id): Path<i32>) -> ApiResult<Policy> {
    Ok(service().await?.delete(id).await?.into_api_response())
}

/// DELETE /api/v1/policies/
pub async fn delete_all() -> ApiResult<Value> {
    let deleted = service().await?.delete_all().await?;
    Ok(json!({ "deleted_count": deleted }).into_api_response())
}
