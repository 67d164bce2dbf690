use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::models::{ApiResponse, Crop, UnitOfMeasure};
use crate::services::CategoryService;

#[derive(Clone)]
pub struct CatalogHandlerState {
    pub category_service: Arc<CategoryService>,
}

/// Query parameters for crop search
#[derive(Debug, Deserialize)]
pub struct SearchCropsQuery {
    pub q: Option<String>,
}

/// Catalog routes, mounted at the root
pub fn create_catalog_router(category_service: Arc<CategoryService>) -> Router {
    let state = CatalogHandlerState { category_service };

    Router::new()
        .route("/api/categories", get(get_categories))
        .route("/api/categories/:category/crops", get(get_crops_by_category))
        .route("/api/crops/search", get(search_crops))
        .route("/api/crops", get(get_all_crops))
        .route("/api/units", get(get_units))
        .with_state(state)
}

#[instrument(skip(state))]
pub async fn get_categories(
    State(state): State<CatalogHandlerState>,
) -> Json<ApiResponse<Vec<String>>> {
    Json(ApiResponse::ok(
        state.category_service.get_categories().to_vec(),
    ))
}

#[instrument(skip(state))]
pub async fn get_crops_by_category(
    State(state): State<CatalogHandlerState>,
    Path(category): Path<String>,
) -> Json<ApiResponse<Vec<Crop>>> {
    let crops = state.category_service.get_crops_by_category(&category);
    info!(count = crops.len(), "Crops for category");
    Json(ApiResponse::ok(crops))
}

#[instrument(skip(state))]
pub async fn search_crops(
    State(state): State<CatalogHandlerState>,
    Query(query): Query<SearchCropsQuery>,
) -> Json<ApiResponse<Vec<Crop>>> {
    Json(ApiResponse::ok(
        state.category_service.search_crops(query.q.as_deref()),
    ))
}

#[instrument(skip(state))]
pub async fn get_all_crops(State(state): State<CatalogHandlerState>) -> Json<ApiResponse<Vec<Crop>>> {
    Json(ApiResponse::ok(state.category_service.get_all_crops().to_vec()))
}

#[instrument(skip(state))]
pub async fn get_units(
    State(state): State<CatalogHandlerState>,
) -> Json<ApiResponse<&'static [UnitOfMeasure]>> {
    Json(ApiResponse::ok(state.category_service.get_units()))
}
