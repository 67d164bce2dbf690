use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    middleware,
    routing::get,
    Router,
};
use std::{sync::Arc, time::Duration};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::handlers::{
    create_cart_router, create_catalog_router, health_check, metrics_handler,
    request_validation_middleware, security_headers_middleware, HealthState,
};
use crate::observability::{observability_middleware, Metrics};
use crate::services::{CartDirectory, CategoryService};

/// Everything the router needs, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub metrics: Arc<Metrics>,
    pub category_service: Arc<CategoryService>,
    pub cart_directory: Arc<CartDirectory>,
    pub service_name: String,
    pub service_version: String,
    pub max_request_size: usize,
    pub request_timeout: Duration,
}

/// Build the application router
pub fn create_app(state: AppState) -> Router {
    let metrics_for_middleware = state.metrics.clone();
    let max_request_size = state.max_request_size;

    let health_state = HealthState {
        service_name: state.service_name,
        service_version: state.service_version,
        category_service: state.category_service.clone(),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(86400));

    let operational = Router::new()
        .route("/health/status", get(health_check))
        .with_state(health_state)
        .route("/metrics", get(metrics_handler))
        .with_state(state.metrics);

    Router::new()
        .merge(operational)
        .merge(create_catalog_router(state.category_service))
        .merge(create_cart_router(state.cart_directory))
        // Layers wrap everything added before them: the last one runs first
        .layer(middleware::from_fn(move |req, next| {
            observability_middleware(metrics_for_middleware.clone(), req, next)
        }))
        .layer(DefaultBodyLimit::max(max_request_size))
        .layer(middleware::from_fn(move |req, next| {
            request_validation_middleware(max_request_size, req, next)
        }))
        .layer(TimeoutLayer::new(state.request_timeout))
        .layer(cors)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
}
