//! Key codec for the single-table design.
//!
//! Pure functions mapping `(kind, parent id, local id)` to the physical
//! `(PartitionKey, SortKey)` pair and back. Every call site derives keys here;
//! nothing else concatenates key strings.

use serde::{Deserialize, Serialize};

use crate::entity::EntityKind;

use super::KeyError;

/// Separator between the type name and the local id in a sort key.
pub const KEY_DELIMITER: char = '#';

/// Partition shared by all festivals, which have no owning parent.
pub const ROOT_PARTITION: &str = "Festivals";

/// Physical primary key of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StorageKey {
    pub partition_key: String,
    pub sort_key: String,
}

impl StorageKey {
    pub fn new(partition_key: impl Into<String>, sort_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            sort_key: sort_key.into(),
        }
    }
}

/// Derive the physical key for an entity.
///
/// Pattern: PK = parent id (or [`ROOT_PARTITION`] for festivals),
/// SK = `<Kind>#<local_id>`.
///
/// # Examples
///
/// ```
/// use submit_core::entity::EntityKind;
/// use submit_core::storage::encode_key;
///
/// let key = encode_key(EntityKind::Vote, "sub-1", "voter-9").unwrap();
/// assert_eq!(key.partition_key, "sub-1");
/// assert_eq!(key.sort_key, "Vote#voter-9");
/// ```
pub fn encode_key(
    kind: EntityKind,
    parent_id: &str,
    local_id: &str,
) -> Result<StorageKey, KeyError> {
    Ok(StorageKey {
        partition_key: partition_key(kind, parent_id)?,
        sort_key: sort_key(kind, local_id)?,
    })
}

/// Derive the partition key for an entity of `kind` owned by `parent_id`.
///
/// Festivals ignore the parent and live in the root partition.
pub fn partition_key(kind: EntityKind, parent_id: &str) -> Result<String, KeyError> {
    match kind {
        EntityKind::Festival => Ok(ROOT_PARTITION.to_string()),
        _ if parent_id.is_empty() => Err(KeyError::EmptyPartitionKey),
        _ => Ok(parent_id.to_string()),
    }
}

/// Derive the sort key for an entity of `kind` with the given local id.
pub fn sort_key(kind: EntityKind, local_id: &str) -> Result<String, KeyError> {
    validate_local_id(local_id)?;
    Ok(format!("{}{}", kind.sort_key_prefix(), local_id))
}

/// Split a stored sort key into its kind and local id.
pub fn decode_sort_key(sort_key: &str) -> Result<(EntityKind, &str), KeyError> {
    let (name, local_id) = sort_key
        .split_once(KEY_DELIMITER)
        .ok_or_else(|| KeyError::MalformedSortKey(sort_key.to_string()))?;
    let kind = name.parse::<EntityKind>()?;
    validate_local_id(local_id)?;
    Ok((kind, local_id))
}

/// Local ids must be non-empty and must not contain the delimiter.
pub fn validate_local_id(local_id: &str) -> Result<(), KeyError> {
    if local_id.is_empty() {
        return Err(KeyError::EmptyLocalId);
    }
    if local_id.contains(KEY_DELIMITER) {
        return Err(KeyError::ReservedDelimiter(local_id.to_string()));
    }
    Ok(())
}
