// Services module - business logic layer

pub mod cart_service;
pub mod category_service;

pub use cart_service::{cart_storage_key, CartDirectory, CartService, DEFAULT_CART_KEY};
pub use category_service::{load_catalog, CategoryService};
