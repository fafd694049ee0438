use axum::{extract::Path, Json};
use serde_json::{json, Value};

use crate::database::models::{DataProduct, DataProductCreate, DataProductUpdate, DataProductView};
use crate::database::DatabaseManager;
use crate::middleware::{ApiResponse, ApiResult, IntoApiResponse};
use crate::services::DataProductService;

async fn service() -> Result<DataProductService, crate::error::ApiError> {
    Ok(DataProductService::new(DatabaseManager::pool().await?))
}

/// POST /api/v1/data_products/
pub async fn create(Json(payload): Json<DataProductCreate>) -> ApiResult<DataProductView> {
    let created = service().await?.create(payload).await?;
    Ok(ApiResponse::created(created))
}

/// GET /api/v1/data_products/
pub async fn list() -> ApiResult<Vec<DataProductView>> {
    Ok(service().await?.list().await?.into_api_response())
}

/// GET /api/v1/data_products/:id
pub async fn get(Path(id): Path<i32>) -> ApiResult<DataProductView> {
    Ok(service().await?.get(id).await?.into_api_response())
}

/// PUT /api/v1/data_products/:id
pub async fn update(Path(id): Path<i32>, Json(payload): Json<DataProductUpdate>) -> ApiResult<DataProductView> {
    Ok(service().await?.update(id, payload).await?.into_api_response())
}

/// DELETE /api/v1/data_products/:id
pub async fn delete(Path(id): Path<i32>) -> ApiResult<DataProduct> {
    Ok(service().await?.delete(id).await?.into_api_response())
}

/// DELETE /api/v1/data_products/
pub async fn delete_all() -> ApiResult<Value> {
    let deleted = service().await?.delete_all().await?;
    Ok(json!({ "deleted_count": deleted }).into_api_response())
}
