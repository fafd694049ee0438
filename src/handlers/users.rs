use axum::{extract::Path, Json};
use serde_json::{json, Value};

use crate::database::models::{User, UserCreate, UserUpdate, UserView};
use crate::database::DatabaseManager;
use crate::middleware::{ApiResponse, ApiResult, IntoApiResponse};
use crate::services::UserService;

async fn service() -> Result<UserService, crate::error::ApiError> {
    Ok(UserService::new(DatabaseManager::pool().await?))
}

/// POST /api/v1/users/
pub async fn create(Json(payload): Json<UserCreate>) -> ApiResult<UserView> {
    let created = service().await?.create(payload).await?;
    Ok(ApiResponse::created(created))
}

/// GET /api/v1/users/
pub async fn list() -> ApiResult<Vec<UserView>> {
    Ok(service().await?.list().await?.into_api_response())
}

/// GET /api/v1/users/:id
pub async fn get(Path(id): Path<i32>) -> ApiResult<UserView> {
    Ok(service().await?.get(id).await?.into_api_response())
}

/// PUT /api/v1/users/:id
pub async fn update(Path(id): Path<i32>, Json(payload): Json<UserUpdate>) -> ApiResult<UserView> {
    Ok(service().await?.update(id, payload).await?.into_api_response())
}

/// DELETE /api/v1/users/:id
pub async fn delete(Path(id): Path<i32>) -> ApiResult<User> {
    Ok(service().await?.delete(id).await?.into_api_response())
}

/// DELETE /api/v1/users/
pub async fn delete_all() -> ApiResult<Value> {
    let deleted = service().await?.delete_all().await?;
    Ok(json!({ "deleted_count": deleted }).into_api_response())
}
