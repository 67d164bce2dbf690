pub mod dynamodb_store;
pub mod file_store;
pub mod key_value_store;
pub mod metered_store;

pub use dynamodb_store::DynamoDbKeyValueStore;
pub use file_store::FileKeyValueStore;
pub use key_value_store::{InMemoryKeyValueStore, KeyValueStore};
pub use metered_store::MeteredKeyValueStore;

use aws_config::{BehaviorVersion, Region};
use std::sync::Arc;
use tracing::info;

use crate::config::{StorageBackend, StorageConfig};
use crate::models::{ServiceError, ServiceResult};
use crate::observability::Metrics;

/// Open the configured backend, wrapped with storage metrics
pub async fn open_key_value_store(
    config: &StorageConfig,
    metrics: Arc<Metrics>,
) -> ServiceResult<Arc<dyn KeyValueStore>> {
    let backend = config.backend().map_err(|e| ServiceError::Configuration {
        message: e.to_string(),
    })?;

    let inner: Arc<dyn KeyValueStore> = match backend {
        StorageBackend::Memory => Arc::new(InMemoryKeyValueStore::new()),
        StorageBackend::File => Arc::new(FileKeyValueStore::open(&config.storage_dir).await?),
        StorageBackend::DynamoDb => {
            let aws_config = aws_config::defaults(BehaviorVersion::latest())
                .region(Region::new(config.region.clone()))
                .load()
                .await;
            let client = Arc::new(aws_sdk_dynamodb::Client::new(&aws_config));
            Arc::new(DynamoDbKeyValueStore::new(
                client,
                config.carts_table_name.clone(),
                config.region.clone(),
            ))
        }
    };

    info!(backend = %backend, "Cart storage opened");
    Ok(Arc::new(MeteredKeyValueStore::new(
        inner,
        backend.to_string(),
        metrics,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage_config(backend: &str, dir: &str) -> StorageConfig {
        StorageConfig {
            storage_backend: backend.to_string(),
            storage_dir: dir.to_string(),
            carts_table_name: "FarmTradeCarts".to_string(),
            region: "us-west-2".to_string(),
        }
    }

    #[tokio::test]
    async fn test_open_memory_store() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let store = open_key_value_store(&storage_config("memory", ""), metrics)
            .await
            .unwrap();

        store.set("k", "v".to_string()).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_open_file_store_creates_directory() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("nested").join("carts");
        let metrics = Arc::new(Metrics::new().unwrap());

        let store = open_key_value_store(
            &storage_config("file", root.to_str().unwrap()),
            metrics,
        )
        .await
        .unwrap();

        store.set("farm_trade_cart", "[]".to_string()).await.unwrap();
        assert!(root.join("farm_trade_cart.json").exists());
    }

    #[tokio::test]
    async fn test_open_unknown_backend_fails() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let result = open_key_value_store(&storage_config("redis", ""), metrics).await;

        assert!(matches!(result, Err(ServiceError::Configuration { .. })));
    }
}
