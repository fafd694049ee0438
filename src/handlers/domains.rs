use axum::{extract::Path, Json};
use serde_json::{json, Value};

use crate::database::models::{Domain, DomainCreate, DomainUpdate, DomainView};
use crate::database::DatabaseManager;
use crate::middleware::{ApiResponse, ApiResult, IntoApiResponse};
use crate::services::DomainService;

async fn service() -> Result<DomainService, crate::error::ApiError> {
    Ok(DomainService::new(DatabaseManager::pool().await?))
}

/// POST /api/v1/domains/
pub async fn create(Json(payload): Json<DomainCreate>) -> ApiResult<DomainView> {
    let created = service().await?.create(payload).await?;
    Ok(ApiResponse::created(created))
}

/// GET /api/v1/domains/
pub async fn list() -> ApiResult<Vec<DomainView>> {
    Ok(service().await?.list().await?.into_api_response())
}

/// GET /api/v1/domains/:id
pub async fn get(Path(id): Path<i32>) -> ApiResult<DomainView> {
    Ok(service().await?.get(id).await?.into_api_response())
}

/// PUT /api/v1/domains/:id
pub async fn update(Path(id): Path<i32>, Json(payload): Json<DomainUpdate>) -> ApiResult<DomainView> {
    Ok(service().await?.update(id, payload).await?.into_api_response())
}

/// DELETE /api/v1/domains/:id
pub async fn delete(Path(id): Path<i32>) -> ApiResult<Domain> {
    Ok(service().await?.delete(id).await?.into_api_response())
}

/// DELETE /api/v1/domains/
pub async fn delete_all() -> ApiResult<Value> {
    let deleted = service().await?.delete_all().await?;
    Ok(json!({ "deleted_count": deleted }).into_api_response())
}
