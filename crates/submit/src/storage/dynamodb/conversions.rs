//! DynamoDB attribute conversion functions.
//!
//! Pure functions for converting between DynamoDB AttributeValue maps and
//! store records. These are testable in isolation without DynamoDB access.

use std::collections::{BTreeMap, HashMap};

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, Utc};

use submit_core::entity::{AttributeValue as Value, Attributes, Record};
use submit_core::storage::{ResumePoint, StorageKey, StoreError};

use super::schema::{
    ATTR_CREATED_AT, ATTR_CREATED_BY, ATTR_ENTITY_ID, ATTR_PARTITION_KEY, ATTR_SORT_KEY,
    RESERVED_ATTRIBUTES,
};

pub type Item = HashMap<String, AttributeValue>;

// ============================================================================
// Record conversions
// ============================================================================

/// Convert a Record to DynamoDB item.
///
/// Kind attributes are stored as top-level item attributes next to the
/// shared columns.
pub fn record_to_item(record: &Record) -> Result<Item, StoreError> {
    let mut item = HashMap::new();

    for (name, value) in &record.attributes {
        if RESERVED_ATTRIBUTES.contains(&name.as_str()) {
            return Err(StoreError::InvalidData(format!(
                "Attribute name is reserved: {}",
                name
            )));
        }
        item.insert(name.clone(), to_dynamo(value));
    }

    // Keys
    item.insert(
        ATTR_PARTITION_KEY.to_string(),
        AttributeValue::S(record.partition_key.clone()),
    );
    item.insert(
        ATTR_SORT_KEY.to_string(),
        AttributeValue::S(record.sort_key.clone()),
    );

    // Shared columns
    item.insert(
        ATTR_ENTITY_ID.to_string(),
        AttributeValue::S(record.entity_id.clone()),
    );
    item.insert(
        ATTR_CREATED_BY.to_string(),
        AttributeValue::S(record.created_by.clone()),
    );
    item.insert(
        ATTR_CREATED_AT.to_string(),
        AttributeValue::S(record.created_at.to_rfc3339()),
    );

    Ok(item)
}

/// Convert a DynamoDB item to Record.
pub fn item_to_record(item: &Item) -> Result<Record, StoreError> {
    let mut attributes = Attributes::new();
    for (name, value) in item {
        if RESERVED_ATTRIBUTES.contains(&name.as_str()) {
            continue;
        }
        attributes.insert(name.clone(), from_dynamo(name, value)?);
    }

    Ok(Record {
        partition_key: get_string(item, ATTR_PARTITION_KEY)?,
        sort_key: get_string(item, ATTR_SORT_KEY)?,
        entity_id: get_string(item, ATTR_ENTITY_ID)?,
        created_by: get_string(item, ATTR_CREATED_BY)?,
        created_at: get_datetime(item, ATTR_CREATED_AT)?,
        attributes,
    })
}

/// Primary key map for GetItem and DeleteItem.
pub fn key_to_item(key: &StorageKey) -> Item {
    HashMap::from([
        (
            ATTR_PARTITION_KEY.to_string(),
            AttributeValue::S(key.partition_key.clone()),
        ),
        (
            ATTR_SORT_KEY.to_string(),
            AttributeValue::S(key.sort_key.clone()),
        ),
    ])
}

/// Extract the primary key from an item, e.g. an index projection.
pub fn item_to_key(item: &Item) -> Result<StorageKey, StoreError> {
    Ok(StorageKey::new(
        get_string(item, ATTR_PARTITION_KEY)?,
        get_string(item, ATTR_SORT_KEY)?,
    ))
}

// ============================================================================
// Pagination conversions
// ============================================================================

/// Convert a resume point to an `ExclusiveStartKey`.
pub fn resume_point_to_key(point: &ResumePoint) -> Item {
    let mut key = key_to_item(&StorageKey::new(
        point.partition_key.clone(),
        point.sort_key.clone(),
    ));
    if let Some(entity_id) = &point.entity_id {
        key.insert(
            ATTR_ENTITY_ID.to_string(),
            AttributeValue::S(entity_id.clone()),
        );
    }
    key
}

/// Convert a `LastEvaluatedKey` to a resume point.
pub fn key_to_resume_point(key: &Item) -> Result<ResumePoint, StoreError> {
    Ok(ResumePoint {
        partition_key: get_string(key, ATTR_PARTITION_KEY)?,
        sort_key: get_string(key, ATTR_SORT_KEY)?,
        entity_id: get_optional_string(key, ATTR_ENTITY_ID),
    })
}

// ============================================================================
// Value conversions
// ============================================================================

fn to_dynamo(value: &Value) -> AttributeValue {
    match value {
        Value::S(s) => AttributeValue::S(s.clone()),
        Value::N(n) => AttributeValue::N(n.clone()),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::L(list) => AttributeValue::L(list.iter().map(to_dynamo).collect()),
        Value::M(map) => AttributeValue::M(
            map.iter()
                .map(|(k, v)| (k.clone(), to_dynamo(v)))
                .collect(),
        ),
        Value::Null => AttributeValue::Null(true),
    }
}

fn from_dynamo(name: &str, value: &AttributeValue) -> Result<Value, StoreError> {
    Ok(match value {
        AttributeValue::S(s) => Value::S(s.clone()),
        AttributeValue::N(n) => Value::N(n.clone()),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::L(list) => Value::L(
            list.iter()
                .map(|v| from_dynamo(name, v))
                .collect::<Result<_, _>>()?,
        ),
        AttributeValue::M(map) => Value::M(
            map.iter()
                .map(|(k, v)| Ok((k.clone(), from_dynamo(name, v)?)))
                .collect::<Result<BTreeMap<_, _>, StoreError>>()?,
        ),
        // Sets written by other tools read back as lists.
        AttributeValue::Ss(set) => Value::string_list(set.iter().cloned()),
        AttributeValue::Ns(set) => Value::L(set.iter().cloned().map(Value::N).collect()),
        _ => {
            return Err(StoreError::InvalidData(format!(
                "Unsupported attribute type for {}",
                name
            )))
        }
    })
}

// ============================================================================
// Helper functions
// ============================================================================

/// Get a required string attribute from a DynamoDB item.
fn get_string(item: &Item, key: &str) -> Result<String, StoreError> {
    item.get(key)
        .and_then(|v| v.as_s().ok())
        .map(|s| s.to_string())
        .ok_or_else(|| StoreError::InvalidData(format!("Missing or invalid field: {}", key)))
}

/// Get an optional string attribute from a DynamoDB item.
fn get_optional_string(item: &Item, key: &str) -> Option<String> {
    item.get(key)
        .and_then(|v| v.as_s().ok())
        .map(|s| s.to_string())
}

/// Get a datetime from a DynamoDB item (RFC 3339 format).
fn get_datetime(item: &Item, key: &str) -> Result<DateTime<Utc>, StoreError> {
    let s = get_string(item, key)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::InvalidData(format!("Invalid datetime {}: {}", key, e)))
}
