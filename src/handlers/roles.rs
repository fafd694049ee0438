use axum::{extract::Path, Json};
use serde_json::{json, Value};

use crate::database::models::{Role, RoleCreate, RoleUpdate, RoleView};
use crate::database::DatabaseManager;
use crate::middleware::{ApiResponse, ApiResult, IntoApiResponse};
use crate::services::RoleService;

async fn service() -> Result<RoleService, crate::error::ApiError> {
    Ok(RoleService::new(DatabaseManager::pool().await?))
}

/// POST /api/v1/roles/
pub async fn create(Json(payload): Json<RoleCreate>) -> ApiResult<RoleView> {
    let created = service().await?.create(payload).await?;
    Ok(ApiResponse::created(created))
}

/// GET /api/v1/roles/
pub async fn list() -> ApiResult<Vec<RoleView>> {
    Ok(service().await?.list().await?.into_api_response())
}

/// GET /api/v1/roles/:id
pub async fn get(Path(id): Path<i32>) -> ApiResult<RoleView> {
    Ok(service().await?.get(id).await?.into_api_response())
}

/// PUT /api/v1/roles/:id
pub async fn update(Path(id): Path<i32>, Json(payload): Json<RoleUpdate>) -> ApiResult<RoleView> {
    Ok(service().await?.update(id, payload).await?.into_api_response())
}

/// DELETE /api/v1/roles/:id
pub async fn delete(Path(id): Path<i32>) -> ApiResult<Role> {
    Ok(service().await?.delete(id).await?.into_api_response())
}

/// DELETE /api/v1/roles/
pub async fn delete_all() -> ApiResult<Value> {
    let deleted = service().await?.delete_all().await?;
    Ok(json!({ "deleted_count": deleted }).into_api_response())
}
