//! DynamoDB store implementation.
//!
//! Implements the store traits from `submit_core::storage` using DynamoDB.

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;

use submit_core::entity::{EntityKind, Record};
use submit_core::storage::{
    EntityStore, IdentityIndex, Page, PageRequest, Result, ResumePoint, StorageKey, StoreError,
};

use super::conversions::{
    item_to_key, item_to_record, key_to_item, key_to_resume_point, record_to_item,
    resume_point_to_key, Item,
};
use super::error::{
    map_delete_item_error, map_get_item_error, map_put_item_error, map_query_error,
    map_scan_error,
};
use super::schema::{ATTR_ENTITY_ID, ATTR_PARTITION_KEY, ATTR_SORT_KEY};
use crate::config::Config;

/// Default number of items per scan page.
const DEFAULT_SCAN_PAGE_SIZE: i32 = 100;

/// DynamoDB-based store implementation.
///
/// Provides async access to the single physical table for all entity kinds.
#[derive(Debug, Clone)]
pub struct DynamoDbStore {
    client: Client,
    table_name: String,
    entity_id_index: String,
    scan_page_size: i32,
}

impl DynamoDbStore {
    /// Creates a new store with the given DynamoDB client and table name.
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
            entity_id_index: "EntityIdIndex".to_string(),
            scan_page_size: DEFAULT_SCAN_PAGE_SIZE,
        }
    }

    /// Sets the name of the identity index.
    pub fn with_entity_id_index(mut self, index_name: impl Into<String>) -> Self {
        self.entity_id_index = index_name.into();
        self
    }

    /// Sets how many items one `scan_all` call requests.
    pub fn with_scan_page_size(mut self, scan_page_size: u32) -> Self {
        self.scan_page_size = i32::try_from(scan_page_size.max(1)).unwrap_or(i32::MAX);
        self
    }

    /// Creates a new store from configuration.
    ///
    /// Uses the AWS SDK default credential chain, with optional region and
    /// endpoint overrides for local DynamoDB.
    pub async fn from_config(config: &Config) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_dynamodb::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }
        let client = Client::from_conf(builder.build());

        tracing::debug!(
            table = %config.table_name,
            index = %config.entity_id_index,
            endpoint = ?config.endpoint_url,
            "Created DynamoDB store"
        );

        Self::new(client, config.table_name.clone())
            .with_entity_id_index(config.entity_id_index.clone())
            .with_scan_page_size(config.scan_page_size)
    }

    /// Get the table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Get the underlying client.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

fn records_from(items: Option<Vec<Item>>) -> Result<Vec<Record>> {
    items.unwrap_or_default().iter().map(item_to_record).collect()
}

fn next_from(last_evaluated_key: Option<Item>) -> Result<Option<ResumePoint>> {
    last_evaluated_key
        .filter(|key| !key.is_empty())
        .map(|key| key_to_resume_point(&key))
        .transpose()
}

// ============================================================================
// EntityStore implementation
// ============================================================================

#[async_trait]
impl EntityStore for DynamoDbStore {
    async fn put(&self, record: &Record) -> Result<()> {
        let item = record_to_item(record)?;

        tracing::debug!(
            partition_key = %record.partition_key,
            sort_key = %record.sort_key,
            "PutItem"
        );
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(map_put_item_error)?;

        Ok(())
    }

    async fn get(&self, key: &StorageKey) -> Result<Option<Record>> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(key_to_item(key)))
            .consistent_read(true)
            .send()
            .await
            .map_err(map_get_item_error)?;

        match result.item {
            Some(item) => Ok(Some(item_to_record(&item)?)),
            None => Ok(None),
        }
    }

    async fn query(
        &self,
        partition_key: &str,
        kind: EntityKind,
        page: &PageRequest,
    ) -> Result<Page> {
        let mut request = self
            .client
            .query()
            .table_name(&self.table_name)
            .key_condition_expression("#pk = :pk AND begins_with(#sk, :prefix)")
            .expression_attribute_names("#pk", ATTR_PARTITION_KEY)
            .expression_attribute_names("#sk", ATTR_SORT_KEY)
            .expression_attribute_values(":pk", AttributeValue::S(partition_key.to_string()))
            .expression_attribute_values(
                ":prefix",
                AttributeValue::S(kind.sort_key_prefix().to_string()),
            )
            .limit(i32::try_from(page.page_size.get()).unwrap_or(i32::MAX));

        if let Some(cursor) = &page.cursor {
            if cursor.partition_key != partition_key {
                return Err(StoreError::InvalidCursor(format!(
                    "cursor belongs to partition {}",
                    cursor.partition_key
                )));
            }
            request = request.set_exclusive_start_key(Some(resume_point_to_key(cursor)));
        }

        tracing::debug!(partition_key, kind = %kind, "Query");
        let result = request.send().await.map_err(map_query_error)?;

        Ok(Page::new(
            records_from(result.items)?,
            next_from(result.last_evaluated_key)?,
        ))
    }

    async fn scan_all(&self, cursor: Option<&ResumePoint>) -> Result<Page> {
        tracing::debug!(table = %self.table_name, resumed = cursor.is_some(), "Scan");
        let result = self
            .client
            .scan()
            .table_name(&self.table_name)
            .limit(self.scan_page_size)
            .set_exclusive_start_key(cursor.map(resume_point_to_key))
            .send()
            .await
            .map_err(map_scan_error)?;

        Ok(Page::new(
            records_from(result.items)?,
            next_from(result.last_evaluated_key)?,
        ))
    }

    async fn delete(&self, key: &StorageKey) -> Result<()> {
        tracing::debug!(
            partition_key = %key.partition_key,
            sort_key = %key.sort_key,
            "DeleteItem"
        );
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(key_to_item(key)))
            .send()
            .await
            .map_err(map_delete_item_error)?;

        Ok(())
    }
}

// ============================================================================
// IdentityIndex implementation
// ============================================================================

#[async_trait]
impl IdentityIndex for DynamoDbStore {
    async fn find_by_entity_id(&self, entity_id: &str) -> Result<Record> {
        // Two items are enough to detect a duplicate.
        let result = self
            .client
            .query()
            .table_name(&self.table_name)
            .index_name(&self.entity_id_index)
            .key_condition_expression("#id = :id")
            .expression_attribute_names("#id", ATTR_ENTITY_ID)
            .expression_attribute_values(":id", AttributeValue::S(entity_id.to_string()))
            .limit(2)
            .send()
            .await
            .map_err(map_query_error)?;

        let not_found = || StoreError::NotFound {
            entity_type: "Entity",
            id: entity_id.to_string(),
        };

        let items = result.items.unwrap_or_default();
        let key = match items.as_slice() {
            [] => return Err(not_found()),
            [item] => item_to_key(item)?,
            _ => {
                return Err(StoreError::IntegrityViolation {
                    entity_id: entity_id.to_string(),
                    matches: items.len(),
                })
            }
        };

        // The index only projects keys, and may be stale.
        match self.get(&key).await? {
            Some(record) if record.entity_id == entity_id => Ok(record),
            _ => Err(not_found()),
        }
    }
}
