pub mod cart;
pub mod catalog;
pub mod health;
pub mod metrics;
pub mod middleware;

pub use cart::{create_cart_router, service_error_to_response, CartHandlerState};
pub use catalog::{create_catalog_router, CatalogHandlerState};
pub use health::{health_check, HealthState};
pub use metrics::metrics_handler;
pub use middleware::{request_validation_middleware, security_headers_middleware};
