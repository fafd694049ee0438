use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::DatabaseManager;

/// GET / - service banner
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Data Product API",
            "version": version,
            "description": "Plant report ingestion and data product registry",
            "endpoints": {
                "health": "/health",
                "process_data": "/api/v1/process_data/",
                "users": "/api/v1/users/[:id]",
                "roles": "/api/v1/roles/[:id]",
                "policies": "/api/v1/policies/[:id]",
                "domains": "/api/v1/domains/[:id]",
                "data_products": "/api/v1/data_products/[:id]",
            }
        }
    }))
}

/// GET /health - 503 when the database cannot be reached
pub async fn health() -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
