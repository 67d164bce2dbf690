use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::{Client as DynamoDbClient, Error as DynamoDbError};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, Instrument};

use super::KeyValueStore;
use crate::models::{StorageError, StorageResult};

const KEY_ATTRIBUTE: &str = "cart_key";
const VALUE_ATTRIBUTE: &str = "value";
const UPDATED_AT_ATTRIBUTE: &str = "updated_at";

/// DynamoDB-backed key-value store: one item per key, hash key `cart_key`
pub struct DynamoDbKeyValueStore {
    client: Arc<DynamoDbClient>,
    table_name: String,
    region: String,
}

impl DynamoDbKeyValueStore {
    pub fn new(client: Arc<DynamoDbClient>, table_name: String, region: String) -> Self {
        Self {
            client,
            table_name,
            region,
        }
    }

    /// Create a DynamoDB subsegment span
    fn create_dynamodb_span(&self, operation: &str) -> tracing::Span {
        tracing::info_span!(
            "DynamoDB",
            "aws.service" = "DynamoDB",
            "aws.operation" = operation,
            "aws.region" = %self.region,
            "aws.dynamodb.table_name" = %self.table_name,
            "aws.remote.service" = "AWS::DynamoDB",
            "aws.remote.operation" = operation,
            "aws.remote.resource.type" = "AWS::DynamoDB::Table",
            "aws.remote.resource.identifier" = %self.table_name,
            "otel.kind" = "client",
            "otel.name" = format!("DynamoDB.{}", operation),
            "rpc.system" = "aws-api",
            "rpc.service" = "AmazonDynamoDBv2",
            "rpc.method" = operation,
            "db.system" = "dynamodb",
            "db.name" = %self.table_name,
            "db.operation" = operation,
        )
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Build the DynamoDB item for a stored value
    pub fn value_to_item(&self, key: &str, value: &str) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();
        item.insert(
            KEY_ATTRIBUTE.to_string(),
            AttributeValue::S(key.to_string()),
        );
        item.insert(
            VALUE_ATTRIBUTE.to_string(),
            AttributeValue::S(value.to_string()),
        );
        item.insert(
            UPDATED_AT_ATTRIBUTE.to_string(),
            AttributeValue::S(chrono::Utc::now().to_rfc3339()),
        );
        item
    }

    /// Extract the stored value from a DynamoDB item
    pub fn item_to_value(
        &self,
        key: &str,
        item: &HashMap<String, AttributeValue>,
    ) -> StorageResult<String> {
        item.get(VALUE_ATTRIBUTE)
            .and_then(|v| v.as_s().ok())
            .cloned()
            .ok_or_else(|| StorageError::MalformedValue {
                key: key.to_string(),
                message: format!("missing string attribute '{}'", VALUE_ATTRIBUTE),
            })
    }

    fn map_dynamodb_error(&self, error: DynamoDbError) -> StorageError {
        error!("DynamoDB error: {:?}", error);
        match error {
            DynamoDbError::ResourceNotFoundException(_) => StorageError::TableNotFound {
                table_name: self.table_name.clone(),
            },
            other => StorageError::AwsSdk {
                message: other.to_string(),
            },
        }
    }
}

#[async_trait]
impl KeyValueStore for DynamoDbKeyValueStore {
    #[instrument(skip(self), fields(table = %self.table_name))]
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let get_span = self.create_dynamodb_span("GetItem");

        let response = async {
            self.client
                .get_item()
                .table_name(&self.table_name)
                .key(KEY_ATTRIBUTE, AttributeValue::S(key.to_string()))
                .consistent_read(true)
                .send()
                .await
                .map_err(|e| self.map_dynamodb_error(e.into()))
        }
        .instrument(get_span)
        .await?;

        match response.item {
            Some(item) => Ok(Some(self.item_to_value(key, &item)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, value), fields(table = %self.table_name, value_len = value.len()))]
    async fn set(&self, key: &str, value: String) -> StorageResult<()> {
        let item = self.value_to_item(key, &value);
        let put_span = self.create_dynamodb_span("PutItem");

        async {
            self.client
                .put_item()
                .table_name(&self.table_name)
                .set_item(Some(item))
                .send()
                .await
                .map_err(|e| self.map_dynamodb_error(e.into()))
        }
        .instrument(put_span)
        .await?;

        info!("Value saved");
        Ok(())
    }

    #[instrument(skip(self), fields(table = %self.table_name))]
    async fn delete(&self, key: &str) -> StorageResult<()> {
        let delete_span = self.create_dynamodb_span("DeleteItem");

        async {
            self.client
                .delete_item()
                .table_name(&self.table_name)
                .key(KEY_ATTRIBUTE, AttributeValue::S(key.to_string()))
                .send()
                .await
                .map_err(|e| self.map_dynamodb_error(e.into()))
        }
        .instrument(delete_span)
        .await?;

        info!("Value deleted");
        Ok(())
    }
}
