use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Extension, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::handlers::{self, data_products, domains, policies, roles, system, users};
use crate::pipeline::Pipeline;

/// Build the application router around a shared pipeline
pub fn app(pipeline: Arc<Pipeline>) -> Router {
    app_with_config(pipeline, crate::config::config())
}

pub fn app_with_config(pipeline: Arc<Pipeline>, config: &AppConfig) -> Router {
    let router = Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .merge(dashboard_routes())
        .merge(crud_routes())
        .layer(
            ServiceBuilder::new()
                .layer(Extension(pipeline))
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(config.api.max_request_size_bytes)),
        );

    let router = if config.security.enable_cors {
        router.layer(cors_layer(&config.security.cors_origins))
    } else {
        router
    };

    if config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn dashboard_routes() -> Router {
    Router::new().route(
        "/api/v1/process_data/",
        post(handlers::dashboard::process_data),
    )
}

fn crud_routes() -> Router {
    Router::new()
        .route(
            "/api/v1/users/",
            get(users::list).post(users::create).delete(users::delete_all),
        )
        .route(
            "/api/v1/users/:id",
            get(users::get).put(users::update).delete(users::delete),
        )
        .route(
            "/api/v1/roles/",
            get(roles::list).post(roles::create).delete(roles::delete_all),
        )
        .route(
            "/api/v1/roles/:id",
            get(roles::get).put(roles::update).delete(roles::delete),
        )
        .route(
            "/api/v1/policies/",
            get(policies::list).post(policies::create).delete(policies::delete_all),
        )
        .route(
            "/api/v1/policies/:id",
            get(policies::get).put(policies::update).delete(policies::delete),
        )
        .route(
            "/api/v1/domains/",
            get(domains::list).post(domains::create).delete(domains::delete_all),
        )
        .route(
            "/api/v1/domains/:id",
            get(domains::get).put(domains::update).delete(domains::delete),
        )
        .route(
            "/api/v1/data_products/",
            get(data_products::list)
                .post(data_products::create)
                .delete(data_products::delete_all),
        )
        .route(
            "/api/v1/data_products/:id",
            get(data_products::get)
                .put(data_products::update)
                .delete(data_products::delete),
        )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    layer.allow_origin(allowed)
}
