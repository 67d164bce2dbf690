use axum::{extract::State, response::Json};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::instrument;

use crate::models::CatalogSource;
use crate::services::CategoryService;

#[derive(Clone)]
pub struct HealthState {
    pub service_name: String,
    pub service_version: String,
    pub category_service: Arc<CategoryService>,
}

/// Health check endpoint handler. A fallback catalog reports `degraded`
/// but still answers 200, since the service keeps serving.
#[instrument(name = "health_check", skip(state))]
pub async fn health_check(State(state): State<HealthState>) -> Json<Value> {
    let catalog = &state.category_service;
    let status = match catalog.source() {
        CatalogSource::Loaded => "healthy",
        CatalogSource::Fallback => "degraded",
    };

    Json(json!({
        "status": status,
        "service": state.service_name,
        "version": state.service_version,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "catalog": {
            "source": catalog.source(),
            // excludes the synthetic "Other" entry
            "categories": catalog.get_categories().len().saturating_sub(1),
            "crops": catalog.get_all_crops().len(),
        }
    }))
}
