//! DynamoDB storage backend implementation.
//!
//! This module provides a DynamoDB-based implementation of the store traits
//! using `aws-sdk-dynamodb`. One physical table holds every entity kind;
//! the `EntityIdIndex` global secondary index serves identity lookups.

mod conversions;
mod error;
mod repository;
mod schema;

pub use repository::DynamoDbStore;
pub use schema::{
    create_table, ATTR_CREATED_AT, ATTR_CREATED_BY, ATTR_ENTITY_ID, ATTR_PARTITION_KEY,
    ATTR_SORT_KEY,
};
