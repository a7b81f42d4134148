use async_trait::async_trait;

use crate::entity::{EntityKind, Record};

use super::{Page, PageRequest, Result, ResumePoint, StorageKey};

/// Generic persistence over the single physical table.
///
/// Writes are unconditional (last writer wins) and each call is independent;
/// no operation spans more than one record atomically.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Writes a record, overwriting whatever is stored at the same key.
    async fn put(&self, record: &Record) -> Result<()>;

    /// Gets a record by its physical key.
    async fn get(&self, key: &StorageKey) -> Result<Option<Record>>;

    /// Lists records of one kind within a partition, ascending by sort key.
    async fn query(
        &self,
        partition_key: &str,
        kind: EntityKind,
        page: &PageRequest,
    ) -> Result<Page>;

    /// Returns one page of the whole table. Callers loop until `next` is `None`.
    async fn scan_all(&self, cursor: Option<&ResumePoint>) -> Result<Page>;

    /// Deletes a record. Deleting a missing key succeeds.
    async fn delete(&self, key: &StorageKey) -> Result<()>;
}

/// Lookup by globally unique entity id, without knowing the partition.
///
/// Backed by a secondary index that may lag behind the table: a record
/// written moments ago can still resolve to `NotFound`.
#[async_trait]
pub trait IdentityIndex: Send + Sync {
    /// Resolves an entity id to exactly one full record.
    ///
    /// Zero matches is `NotFound`; more than one is `IntegrityViolation`.
    async fn find_by_entity_id(&self, entity_id: &str) -> Result<Record>;
}
