use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::instrument;

use crate::error_with_trace;
use crate::models::ApiResponse;
use crate::observability::Metrics;

/// Prometheus scrape endpoint. Encoding failures use the JSON error envelope.
#[instrument(name = "metrics_handler", skip(metrics))]
pub async fn metrics_handler(State(metrics): State<Arc<Metrics>>) -> Response {
    let exposition = match metrics.encode() {
        Ok(text) => text,
        Err(e) => {
            error_with_trace!(error = %e, "Metrics exposition failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Failed to encode metrics")),
            )
                .into_response();
        }
    };

    ([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], exposition).into_response()
}
