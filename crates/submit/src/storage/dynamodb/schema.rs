//! Physical table layout and provisioning.

use aws_sdk_dynamodb::operation::create_table::CreateTableError;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, GlobalSecondaryIndex, KeySchemaElement, KeyType, Projection,
    ProjectionType, ScalarAttributeType,
};
use aws_sdk_dynamodb::Client;

use submit_core::storage::{Result, StoreError};

pub const ATTR_PARTITION_KEY: &str = "PartitionKey";
pub const ATTR_SORT_KEY: &str = "SortKey";
pub const ATTR_ENTITY_ID: &str = "EntityId";
pub const ATTR_CREATED_BY: &str = "CreatedBy";
pub const ATTR_CREATED_AT: &str = "CreatedAt";

/// Attributes owned by the table layout; entity payloads may not use them.
pub(crate) const RESERVED_ATTRIBUTES: [&str; 5] = [
    ATTR_PARTITION_KEY,
    ATTR_SORT_KEY,
    ATTR_ENTITY_ID,
    ATTR_CREATED_BY,
    ATTR_CREATED_AT,
];

fn build_error(e: impl std::fmt::Display) -> StoreError {
    StoreError::InvalidData(format!("Invalid table definition: {}", e))
}

fn key_element(name: &str, key_type: KeyType) -> Result<KeySchemaElement> {
    KeySchemaElement::builder()
        .attribute_name(name)
        .key_type(key_type)
        .build()
        .map_err(build_error)
}

fn string_attribute(name: &str) -> Result<AttributeDefinition> {
    AttributeDefinition::builder()
        .attribute_name(name)
        .attribute_type(ScalarAttributeType::S)
        .build()
        .map_err(build_error)
}

/// Creates the table and its identity index, on-demand billing.
///
/// An existing table with the same name is left untouched.
pub async fn create_table(
    client: &Client,
    table_name: &str,
    entity_id_index: &str,
) -> Result<()> {
    let identity_index = GlobalSecondaryIndex::builder()
        .index_name(entity_id_index)
        .key_schema(key_element(ATTR_ENTITY_ID, KeyType::Hash)?)
        .projection(
            Projection::builder()
                .projection_type(ProjectionType::KeysOnly)
                .build(),
        )
        .build()
        .map_err(build_error)?;

    let result = client
        .create_table()
        .table_name(table_name)
        .key_schema(key_element(ATTR_PARTITION_KEY, KeyType::Hash)?)
        .key_schema(key_element(ATTR_SORT_KEY, KeyType::Range)?)
        .attribute_definitions(string_attribute(ATTR_PARTITION_KEY)?)
        .attribute_definitions(string_attribute(ATTR_SORT_KEY)?)
        .attribute_definitions(string_attribute(ATTR_ENTITY_ID)?)
        .global_secondary_indexes(identity_index)
        .billing_mode(BillingMode::PayPerRequest)
        .send()
        .await;

    match result {
        Ok(_) => {
            tracing::info!(table = table_name, index = entity_id_index, "Created table");
            Ok(())
        }
        Err(err) => match err.into_service_error() {
            CreateTableError::ResourceInUseException(_) => {
                tracing::info!(table = table_name, "Table already exists");
                Ok(())
            }
            err => Err(StoreError::StoreUnavailable(format!(
                "CreateTable failed: {:?}",
                err
            ))),
        },
    }
}
