//! Typed command and query surface over the store.
//!
//! Every operation is built from the storage primitives alone: keyed reads
//! and writes through the key codec, partition queries with opaque
//! pagination keys, and identity lookups for anything addressed by entity id.

mod festivals;
mod forts;
mod labels;
mod submissions;
mod votes;

use std::sync::Arc;

use submit_core::entity::{Entity, EntityKind, Record};
use submit_core::storage::{
    encode_key, EntityStore, IdentityIndex, PageRequest, Result, StoreError,
};

pub use festivals::FestivalFilter;
pub use votes::VOTE_RANGE;

/// One page of typed results plus the token for the next page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub pagination_key: Option<String>,
}

/// Feature-level operations on festivals, forts, submissions, labels and votes.
///
/// # Type Parameters
///
/// * `S` - The store implementation, usually wrapped in `RetryingStore`
pub struct Catalog<S> {
    store: Arc<S>,
}

impl<S> Clone for Catalog<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> Catalog<S>
where
    S: EntityStore + IdentityIndex,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Deletes whatever entity `entity_id` resolves to and returns its kind.
    ///
    /// Ranks are derived data owned by the vote tally and cannot be deleted.
    pub async fn delete_by_id(&self, entity_id: &str) -> Result<EntityKind> {
        let record = self.store.find_by_entity_id(entity_id).await?;
        let kind = record.kind().ok_or_else(|| {
            StoreError::InvalidData(format!("Malformed sort key: {}", record.sort_key))
        })?;
        if kind == EntityKind::SubmissionRank {
            return Err(StoreError::Validation(
                "submission ranks are maintained by the vote tally".to_string(),
            ));
        }

        self.store.delete(&record.key()).await?;
        tracing::info!(entity_id, kind = %kind, "Deleted entity");
        Ok(kind)
    }

    /// Resolves an entity id to a typed entity of kind `T`.
    ///
    /// A record of another kind reads as `NotFound` for `T`.
    async fn resolve<T: Entity>(&self, entity_id: &str) -> Result<(T, Record)> {
        let record = self.store.find_by_entity_id(entity_id).await?;
        if !record.is_kind(T::KIND) {
            return Err(not_found(T::KIND, entity_id));
        }
        Ok((T::from_record(&record)?, record))
    }

    /// Resolves and deletes an entity of kind `T`.
    async fn delete_typed<T: Entity>(&self, entity_id: &str) -> Result<()> {
        let (_, record) = self.resolve::<T>(entity_id).await?;
        self.store.delete(&record.key()).await?;
        tracing::info!(entity_id, kind = %T::KIND, "Deleted entity");
        Ok(())
    }

    /// Loads the entity of kind `T` stored under `(parent_id, local_id)`.
    async fn load<T: Entity>(&self, parent_id: &str, local_id: &str) -> Result<Option<T>> {
        let key = encode_key(T::KIND, parent_id, local_id)?;
        self.store
            .get(&key)
            .await?
            .map(|record| T::from_record(&record))
            .transpose()
    }

    /// Like [`Self::load`], but absence is `NotFound`.
    async fn require<T: Entity>(&self, parent_id: &str, local_id: &str) -> Result<T> {
        self.load(parent_id, local_id)
            .await?
            .ok_or_else(|| not_found(T::KIND, local_id))
    }

    async fn save<T: Entity>(&self, entity: &T) -> Result<()> {
        self.store.put(&entity.to_record()?).await
    }

    /// Lists one page of kind `T` in a partition.
    async fn list<T: Entity>(
        &self,
        partition_key: &str,
        page_size: i64,
        pagination_key: Option<&str>,
    ) -> Result<Paged<T>> {
        let request = PageRequest::from_params(page_size, pagination_key)?;
        let page = self
            .store
            .query(partition_key, T::KIND, &request)
            .await?
            .try_map(|record| T::from_record(&record))?;
        Ok(Paged {
            pagination_key: page.next_token(),
            items: page.items,
        })
    }
}

fn not_found(kind: EntityKind, id: &str) -> StoreError {
    StoreError::NotFound {
        entity_type: kind.name(),
        id: id.to_string(),
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(StoreError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}
