use async_trait::async_trait;
use std::sync::Arc;

use super::KeyValueStore;
use crate::models::StorageResult;
use crate::observability::{Metrics, StorageTracingMiddleware};

/// Wraps a backend so every call is timed and counted under `backend`
pub struct MeteredKeyValueStore {
    inner: Arc<dyn KeyValueStore>,
    backend: String,
    tracing: StorageTracingMiddleware,
}

impl MeteredKeyValueStore {
    pub fn new(
        inner: Arc<dyn KeyValueStore>,
        backend: impl Into<String>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            inner,
            backend: backend.into(),
            tracing: StorageTracingMiddleware::new(metrics),
        }
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }
}

#[async_trait]
impl KeyValueStore for MeteredKeyValueStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.tracing
            .trace_operation("get", &self.backend, self.inner.get(key))
            .await
    }

    async fn set(&self, key: &str, value: String) -> StorageResult<()> {
        self.tracing
            .trace_operation("set", &self.backend, self.inner.set(key, value))
            .await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.tracing
            .trace_operation("delete", &self.backend, self.inner.delete(key))
            .await
    }
}
