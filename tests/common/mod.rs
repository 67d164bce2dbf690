use std::sync::Arc;
use std::time::Duration;

use farmtrade_rs::{
    create_app,
    models::{Catalog, CatalogSource},
    repositories::{InMemoryKeyValueStore, KeyValueStore},
    services::{CartDirectory, CategoryService},
    AppState, Metrics,
};
use reqwest::Client;
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const CATALOG_CSV: &str = "Commodity,Category\n\
    Tomatoes,Vegetables\n\
    Green+Chilly%2fHot,Vegetables\n\
    Cherry+Tomato,Vegetables\n\
    Wheat,Cereals & Grains\n\
    Basmati+Rice,Cereals & Grains\n\
    Alphonso+Mango,Fruits\n";

pub struct TestEnvironment {
    pub client: Client,
    pub base_url: String,
    pub storage: Arc<InMemoryKeyValueStore>,
}

impl TestEnvironment {
    pub async fn new() -> Self {
        let catalog = Catalog::parse(CATALOG_CSV).expect("Sample catalog should parse");
        Self::with_category_service(CategoryService::new(catalog, CatalogSource::Loaded)).await
    }

    pub async fn with_fallback_catalog() -> Self {
        Self::with_category_service(CategoryService::from_load_result(
            farmtrade_rs::services::load_catalog("/nonexistent/Category.csv").await,
        ))
        .await
    }

    async fn with_category_service(category_service: CategoryService) -> Self {
        let metrics = Arc::new(Metrics::new().expect("Failed to create metrics"));
        let storage = Arc::new(InMemoryKeyValueStore::new());
        let store: Arc<dyn KeyValueStore> = storage.clone();

        let app = create_app(AppState {
            metrics: metrics.clone(),
            category_service: Arc::new(category_service.with_metrics(metrics.clone())),
            cart_directory: Arc::new(CartDirectory::new(store, metrics)),
            service_name: "farmtrade-test".to_string(),
            service_version: "0.1.0".to_string(),
            max_request_size: 16 * 1024,
            request_timeout: Duration::from_secs(5),
        });

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind listener");
        let addr = listener.local_addr().expect("Failed to get local address");
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Failed to serve app");
        });

        Self {
            client: Client::new(),
            base_url,
            storage,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get_json(&self, path: &str) -> (u16, Value) {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send request");
        let status = response.status().as_u16();
        (status, response.json().await.expect("Failed to parse response"))
    }

    pub async fn add_item(&self, owner_id: &str, body: &Value) -> (u16, Value) {
        let response = self
            .client
            .post(self.url(&format!("/api/cart/{}/items", owner_id)))
            .json(body)
            .send()
            .await
            .expect("Failed to send request");
        let status = response.status().as_u16();
        (status, response.json().await.expect("Failed to parse response"))
    }
}

/// JSON body for adding `quantity` of a product, capped at `max_quantity`
pub fn add_item_body(product_id: &str, seller_id: &str, quantity: u32, max_quantity: u32) -> Value {
    json!({
        "productId": product_id,
        "productName": "Tomatoes",
        "sellerId": seller_id,
        "sellerName": "Green Acres Farm",
        "sellerLocation": "Nashik, Maharashtra",
        "quantity": quantity,
        "unit": "kg",
        "pricePerUnit": "40.50",
        "category": "Vegetables",
        "estimatedDelivery": "2-3 days",
        "deliveryMode": "delivery",
        "maxQuantity": max_quantity
    })
}
