use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::error_with_trace;
use crate::models::{
    AddCartItemRequest, ApiResponse, CartItemUpdate, CartLineItem, CartSummary, ServiceError,
    StorageError, UpdateCartItemRequest,
};
use crate::services::{CartDirectory, CartService};

type ErrorResponse = (StatusCode, Json<ApiResponse<()>>);

/// State for cart handlers
#[derive(Clone)]
pub struct CartHandlerState {
    pub cart_directory: Arc<CartDirectory>,
}

impl CartHandlerState {
    fn cart_for(&self, owner_id: &str) -> Result<CartService, ErrorResponse> {
        self.cart_directory
            .cart_for(owner_id)
            .map_err(service_error_to_response)
    }
}

/// Create cart router with all endpoints
pub fn create_cart_router(cart_directory: Arc<CartDirectory>) -> Router {
    let state = CartHandlerState { cart_directory };

    Router::new()
        .route("/api/cart/:owner_id", get(get_cart).delete(clear_cart))
        .route("/api/cart/:owner_id/items", post(add_cart_item))
        .route(
            "/api/cart/:owner_id/items/:item_id",
            put(update_cart_item).delete(remove_cart_item),
        )
        .route("/api/cart/:owner_id/summary", get(get_cart_summary))
        .with_state(state)
}

/// Line items of an owner's cart
#[instrument(skip(state))]
pub async fn get_cart(
    State(state): State<CartHandlerState>,
    Path(owner_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<CartLineItem>>>, ErrorResponse> {
    let cart = state.cart_for(&owner_id)?;
    Ok(Json(ApiResponse::ok(cart.get_cart_items().await)))
}

/// Add an item to the cart
#[instrument(skip(state, payload))]
pub async fn add_cart_item(
    State(state): State<CartHandlerState>,
    Path(owner_id): Path<String>,
    payload: Result<Json<AddCartItemRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<CartLineItem>>), ErrorResponse> {
    let Json(request) = payload.map_err(json_rejection_to_response)?;
    let cart = state.cart_for(&owner_id)?;

    let line = cart
        .add_to_cart(request)
        .await
        .map_err(service_error_to_response)?;

    info!(item_id = %line.id, "Item added to cart");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(line, "Item added to cart")),
    ))
}

/// Update the quantity of a line; zero or below removes it
#[instrument(skip(state, payload))]
pub async fn update_cart_item(
    State(state): State<CartHandlerState>,
    Path((owner_id, item_id)): Path<(String, String)>,
    payload: Result<Json<UpdateCartItemRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<()>>, ErrorResponse> {
    let Json(request) = payload.map_err(json_rejection_to_response)?;
    let cart = state.cart_for(&owner_id)?;

    let outcome = cart
        .update_cart_item(&item_id, request.quantity)
        .await
        .map_err(service_error_to_response)?;

    let message = match outcome {
        CartItemUpdate::Updated => "Cart item updated",
        CartItemUpdate::Removed => "Cart item removed",
        CartItemUpdate::NotFound => "Cart item not found, nothing changed",
    };
    Ok(Json(ApiResponse::message(message)))
}

/// Remove a line from the cart
#[instrument(skip(state))]
pub async fn remove_cart_item(
    State(state): State<CartHandlerState>,
    Path((owner_id, item_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<()>>, ErrorResponse> {
    let cart = state.cart_for(&owner_id)?;

    let removed = cart
        .remove_from_cart(&item_id)
        .await
        .map_err(service_error_to_response)?;

    let message = if removed {
        "Cart item removed"
    } else {
        "Cart item not found, nothing changed"
    };
    Ok(Json(ApiResponse::message(message)))
}

/// Delete the whole cart
#[instrument(skip(state))]
pub async fn clear_cart(
    State(state): State<CartHandlerState>,
    Path(owner_id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ErrorResponse> {
    let cart = state.cart_for(&owner_id)?;

    cart.clear_cart().await.map_err(service_error_to_response)?;

    info!("Cart cleared");
    Ok(Json(ApiResponse::message("Cart cleared")))
}

/// Totals over the cart
#[instrument(skip(state))]
pub async fn get_cart_summary(
    State(state): State<CartHandlerState>,
    Path(owner_id): Path<String>,
) -> Result<Json<ApiResponse<CartSummary>>, ErrorResponse> {
    let cart = state.cart_for(&owner_id)?;
    Ok(Json(ApiResponse::ok(cart.get_cart_summary().await)))
}

fn json_rejection_to_response(rejection: JsonRejection) -> ErrorResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::error(format!(
            "Invalid request body: {}",
            rejection.body_text()
        ))),
    )
}

/// Convert ServiceError to HTTP response
pub fn service_error_to_response(err: ServiceError) -> ErrorResponse {
    let (status, message) = match &err {
        ServiceError::ValidationError { .. } | ServiceError::AmountOutOfRange => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        ServiceError::CapacityExceeded { .. } => (StatusCode::CONFLICT, err.to_string()),
        ServiceError::Storage { source } => match source {
            StorageError::Serialization { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            _ => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Cart storage unavailable".to_string(),
            ),
        },
        ServiceError::Configuration { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Configuration error".to_string(),
        ),
    };

    if status.is_server_error() {
        error_with_trace!(error = %err, status = status.as_u16(), "Cart request failed");
    }

    (status, Json(ApiResponse::error(message)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_service_error_status_mapping() {
        let (status, Json(body)) = service_error_to_response(ServiceError::CapacityExceeded {
            max_quantity: 10,
            unit: "kg".to_string(),
        });
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.message.as_deref(), Some("Cannot add more than 10 kg"));
        assert!(!body.success);

        let (status, _) = service_error_to_response(ServiceError::ValidationError {
            message: "bad".to_string(),
        });
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, Json(body)) = service_error_to_response(ServiceError::AmountOutOfRange);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body.message.as_deref(),
            Some("Cart amount exceeds the supported range")
        );

        let (status, Json(body)) =
            service_error_to_response(ServiceError::from(StorageError::ConnectionFailed));
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.message.as_deref(), Some("Cart storage unavailable"));

        let (status, _) = service_error_to_response(ServiceError::Configuration {
            message: "x".to_string(),
        });
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_add_cart_item_request_deserialization() {
        let json = r#"{
            "productId": "P1",
            "productName": "Tomatoes",
            "sellerId": "S1",
            "sellerName": "Green Acres",
            "sellerLocation": "Nashik",
            "quantity": 3,
            "unit": "kg",
            "pricePerUnit": 12.5,
            "category": "Vegetables",
            "estimatedDelivery": "2 days",
            "deliveryMode": "pickup",
            "maxQuantity": 50
        }"#;
        let request: AddCartItemRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.product_id, "P1");
        assert_eq!(request.quantity, 3);
        assert_eq!(request.price_per_unit, dec!(12.5));
        assert_eq!(request.image, None);
    }

    #[test]
    fn test_update_cart_item_request_accepts_negative_quantity() {
        let request: UpdateCartItemRequest = serde_json::from_str(r#"{"quantity": -1}"#).unwrap();
        assert_eq!(request.quantity, -1);
    }
}
