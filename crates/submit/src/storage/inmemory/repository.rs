//! In-memory store implementation.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use submit_core::entity::{EntityKind, Record};
use submit_core::storage::{
    EntityStore, IdentityIndex, Page, PageRequest, Result, ResumePoint, StorageKey, StoreError,
};

/// Default number of records per scan page.
const DEFAULT_SCAN_PAGE_SIZE: usize = 100;

type Table = BTreeMap<(String, String), Record>;

/// In-memory storage backend for testing.
///
/// Uses an ordered map keyed by (partition key, sort key) wrapped in
/// `Arc<RwLock<_>>` for thread-safe access. Clones share the same data.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    records: Arc<RwLock<Table>>,
    scan_page_size: usize,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(BTreeMap::new())),
            scan_page_size: DEFAULT_SCAN_PAGE_SIZE,
        }
    }

    /// Sets how many records one `scan_all` call returns.
    pub fn with_scan_page_size(mut self, scan_page_size: usize) -> Self {
        self.scan_page_size = scan_page_size.max(1);
        self
    }

    /// Number of records currently stored.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

/// Cuts `items` to `limit` and returns the resume point after the last kept
/// record when the lookahead found more.
fn finish_page(mut items: Vec<Record>, limit: usize) -> Page {
    if items.len() <= limit {
        return Page::new(items, None);
    }
    items.truncate(limit);
    let next = items.last().map(|last| ResumePoint::after(&last.key()));
    Page::new(items, next)
}

#[async_trait]
impl EntityStore for InMemoryStore {
    async fn put(&self, record: &Record) -> Result<()> {
        let mut records = self.records.write().await;
        records.insert(
            (record.partition_key.clone(), record.sort_key.clone()),
            record.clone(),
        );
        Ok(())
    }

    async fn get(&self, key: &StorageKey) -> Result<Option<Record>> {
        let records = self.records.read().await;
        Ok(records
            .get(&(key.partition_key.clone(), key.sort_key.clone()))
            .cloned())
    }

    async fn query(
        &self,
        partition_key: &str,
        kind: EntityKind,
        page: &PageRequest,
    ) -> Result<Page> {
        if let Some(cursor) = &page.cursor {
            if cursor.partition_key != partition_key {
                return Err(StoreError::InvalidCursor(format!(
                    "cursor belongs to partition {}",
                    cursor.partition_key
                )));
            }
        }

        let prefix = kind.sort_key_prefix();
        let limit = page.page_size.get() as usize;
        let records = self.records.read().await;

        // Resume right after the cursor, never before the kind prefix.
        let start = match &page.cursor {
            Some(cursor) if cursor.sort_key.as_str() >= prefix => {
                Bound::Excluded((partition_key.to_string(), cursor.sort_key.clone()))
            }
            _ => Bound::Included((partition_key.to_string(), prefix.to_string())),
        };

        // One extra record tells whether another page exists.
        let items: Vec<Record> = records
            .range((start, Bound::Unbounded))
            .take_while(|((pk, sk), _)| pk == partition_key && sk.starts_with(prefix))
            .take(limit + 1)
            .map(|(_, record)| record.clone())
            .collect();

        Ok(finish_page(items, limit))
    }

    async fn scan_all(&self, cursor: Option<&ResumePoint>) -> Result<Page> {
        let records = self.records.read().await;
        let limit = self.scan_page_size;

        let start = match cursor {
            Some(c) => Bound::Excluded((c.partition_key.clone(), c.sort_key.clone())),
            None => Bound::Unbounded,
        };

        let items: Vec<Record> = records
            .range((start, Bound::Unbounded))
            .take(limit + 1)
            .map(|(_, record)| record.clone())
            .collect();

        Ok(finish_page(items, limit))
    }

    async fn delete(&self, key: &StorageKey) -> Result<()> {
        let mut records = self.records.write().await;
        records.remove(&(key.partition_key.clone(), key.sort_key.clone()));
        Ok(())
    }
}

#[async_trait]
impl IdentityIndex for InMemoryStore {
    async fn find_by_entity_id(&self, entity_id: &str) -> Result<Record> {
        let records = self.records.read().await;
        let mut matches = records.values().filter(|r| r.entity_id == entity_id);

        match (matches.next(), matches.count()) {
            (None, _) => Err(StoreError::NotFound {
                entity_type: "Entity",
                id: entity_id.to_string(),
            }),
            (Some(record), 0) => Ok(record.clone()),
            (Some(_), rest) => Err(StoreError::IntegrityViolation {
                entity_id: entity_id.to_string(),
                matches: rest + 1,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use submit_core::entity::{AttributeValue, Attributes};
    use submit_core::storage::{decode_cursor, encode_cursor, encode_key, PageSize};

    use super::*;

    fn record(kind: EntityKind, partition: &str, local_id: &str, entity_id: &str) -> Record {
        let key = encode_key(kind, partition, local_id).unwrap();
        let mut attributes = Attributes::new();
        attributes.insert("name".to_string(), AttributeValue::S(local_id.to_string()));
        Record {
            partition_key: key.partition_key,
            sort_key: key.sort_key,
            entity_id: entity_id.to_string(),
            created_by: "user-1".to_string(),
            created_at: DateTime::parse_from_rfc3339("2024-01-15T10:30:00Z")
                .unwrap()
                .with_timezone(&Utc),
            attributes,
        }
    }

    async fn seed_forts(store: &InMemoryStore, festival_id: &str, count: usize) {
        for i in 0..count {
            let id = format!("fort-{:02}", i);
            store
                .put(&record(EntityKind::Fort, festival_id, &id, &id))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_put_then_get_returns_equal_record() {
        let store = InMemoryStore::new();
        let original = record(EntityKind::Fort, "fest-1", "fort-1", "fort-1");

        store.put(&original).await.unwrap();
        let fetched = store.get(&original.key()).await.unwrap();

        assert_eq!(fetched, Some(original));
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let store = InMemoryStore::new();
        let result = store
            .get(&StorageKey::new("fest-1", "Fort#nope"))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites_same_key() {
        let store = InMemoryStore::new();
        let first = record(EntityKind::Submission, "fort-1", "user-1", "sub-1");
        let mut second = first.clone();
        second
            .attributes
            .insert("name".to_string(), AttributeValue::S("Renamed".to_string()));

        store.put(&first).await.unwrap();
        store.put(&second).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(store.get(&first.key()).await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn test_query_pages_through_partition() {
        let store = InMemoryStore::new();
        seed_forts(&store, "fest-1", 25).await;

        let mut request = PageRequest::from_params(10, None).unwrap();
        let mut sizes = Vec::new();
        let mut seen = Vec::new();
        loop {
            let page = store
                .query("fest-1", EntityKind::Fort, &request)
                .await
                .unwrap();
            sizes.push(page.items.len());
            seen.extend(page.items.iter().map(|r| r.entity_id.clone()));
            match page.next_token() {
                Some(token) => request = PageRequest::from_params(10, Some(&token)).unwrap(),
                None => break,
            }
        }

        assert_eq!(sizes, vec![10, 10, 5]);
        assert_eq!(seen.len(), 25);
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_query_filters_by_kind_and_partition() {
        let store = InMemoryStore::new();
        store
            .put(&record(EntityKind::Submission, "sub-1", "sub-1", "s"))
            .await
            .unwrap();
        store
            .put(&record(EntityKind::SubmissionRank, "sub-1", "sub-1", "r"))
            .await
            .unwrap();
        store
            .put(&record(EntityKind::Vote, "sub-1", "voter-1", "v1"))
            .await
            .unwrap();
        store
            .put(&record(EntityKind::Vote, "sub-2", "voter-1", "v2"))
            .await
            .unwrap();

        let request = PageRequest::from_params(10, None).unwrap();
        let submissions = store
            .query("sub-1", EntityKind::Submission, &request)
            .await
            .unwrap();
        let votes = store
            .query("sub-1", EntityKind::Vote, &request)
            .await
            .unwrap();

        assert_eq!(submissions.items.len(), 1);
        assert_eq!(submissions.items[0].entity_id, "s");
        assert_eq!(votes.items.len(), 1);
        assert_eq!(votes.items[0].entity_id, "v1");
        assert!(votes.next.is_none());
    }

    #[tokio::test]
    async fn test_query_exact_page_has_no_cursor() {
        let store = InMemoryStore::new();
        seed_forts(&store, "fest-1", 10).await;

        let request = PageRequest::from_params(10, None).unwrap();
        let page = store
            .query("fest-1", EntityKind::Fort, &request)
            .await
            .unwrap();

        assert_eq!(page.items.len(), 10);
        assert!(page.next.is_none());
    }

    #[tokio::test]
    async fn test_query_resumes_after_deleted_or_foreign_cursor() {
        let store = InMemoryStore::new();
        seed_forts(&store, "fest-1", 5).await;
        store
            .delete(&StorageKey::new("fest-1", "Fort#fort-01"))
            .await
            .unwrap();

        let after_deleted = PageRequest {
            page_size: PageSize::new(2).unwrap(),
            cursor: Some(ResumePoint::after(&StorageKey::new("fest-1", "Fort#fort-01"))),
        };
        let page = store
            .query("fest-1", EntityKind::Fort, &after_deleted)
            .await
            .unwrap();
        let ids: Vec<_> = page.items.iter().map(|r| r.sort_key.as_str()).collect();
        assert_eq!(ids, vec!["Fort#fort-02", "Fort#fort-03"]);
        assert!(page.next.is_some());

        let before_prefix = PageRequest {
            page_size: PageSize::new(10).unwrap(),
            cursor: Some(ResumePoint::after(&StorageKey::new("fest-1", "Festival#x"))),
        };
        let page = store
            .query("fest-1", EntityKind::Fort, &before_prefix)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 4);
        assert!(page.next.is_none());
    }

    #[tokio::test]
    async fn test_query_rejects_cursor_from_other_partition() {
        let store = InMemoryStore::new();
        seed_forts(&store, "fest-1", 3).await;
        let request = PageRequest {
            page_size: PageSize::new(2).unwrap(),
            cursor: Some(ResumePoint::after(&StorageKey::new("fest-2", "Fort#fort-00"))),
        };

        let result = store.query("fest-1", EntityKind::Fort, &request).await;

        assert!(matches!(result, Err(StoreError::InvalidCursor(_))));
    }

    #[tokio::test]
    async fn test_stale_cursor_returns_empty_page() {
        let store = InMemoryStore::new();
        seed_forts(&store, "fest-1", 3).await;
        let stale = ResumePoint::after(&StorageKey::new("deleted-festival", "Fort#fort-01"));
        let token = encode_cursor(&stale);
        let request = PageRequest::from_params(10, Some(&token)).unwrap();

        let page = store
            .query("deleted-festival", EntityKind::Fort, &request)
            .await
            .unwrap();

        assert!(page.items.is_empty());
        assert!(page.next.is_none());
    }

    #[tokio::test]
    async fn test_scan_all_visits_every_record_once() {
        let store = InMemoryStore::new().with_scan_page_size(4);
        seed_forts(&store, "fest-1", 6).await;
        seed_forts(&store, "fest-2", 5).await;

        let mut cursor = None;
        let mut pages = 0;
        let mut total = 0;
        loop {
            let page = store.scan_all(cursor.as_ref()).await.unwrap();
            pages += 1;
            total += page.items.len();
            match page.next_token() {
                Some(token) => cursor = Some(decode_cursor(&token).unwrap()),
                None => break,
            }
        }

        assert_eq!(total, 11);
        assert_eq!(pages, 3);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = InMemoryStore::new();
        let original = record(EntityKind::Label, "fest-1", "label-1", "label-1");
        store.put(&original).await.unwrap();

        store.delete(&original.key()).await.unwrap();
        store.delete(&original.key()).await.unwrap();

        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_find_by_entity_id() {
        let store = InMemoryStore::new();
        let original = record(EntityKind::Label, "fest-1", "label-1", "label-1");
        store.put(&original).await.unwrap();

        assert_eq!(store.find_by_entity_id("label-1").await.unwrap(), original);
        assert!(matches!(
            store.find_by_entity_id("label-2").await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_find_by_entity_id_rejects_duplicates() {
        let store = InMemoryStore::new();
        store
            .put(&record(EntityKind::Fort, "fest-1", "dup", "dup"))
            .await
            .unwrap();
        store
            .put(&record(EntityKind::Label, "fest-1", "dup", "dup"))
            .await
            .unwrap();

        let result = store.find_by_entity_id("dup").await;

        assert_eq!(
            result,
            Err(StoreError::IntegrityViolation {
                entity_id: "dup".to_string(),
                matches: 2,
            })
        );
    }
}
