//! Retrying store decorator.
//!
//! Wraps any `EntityStore`/`IdentityIndex` and retries transient failures
//! (`StoreUnavailable`) with bounded exponential backoff and jitter. Every
//! other error passes straight through. A cancelled token resolves the call
//! to `Cancelled` at once, whether it is waiting on the store or sleeping
//! between attempts.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};

use submit_core::entity::{EntityKind, Record};
use submit_core::storage::{
    EntityStore, IdentityIndex, Page, PageRequest, Result, ResumePoint, StorageKey, StoreError,
};

use crate::cancellation::Cancellation;

/// Bounded exponential backoff settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per call, including the first. Values below 1 act as 1.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(2_000),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Un-jittered backoff schedule: one delay per retry, doubling from
    /// `initial_backoff` up to `max_backoff`.
    pub fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.initial_backoff)
            .with_max_delay(self.max_backoff)
            .with_max_times(self.max_attempts.saturating_sub(1) as usize)
    }

    /// Runs `call` until it succeeds, fails permanently, runs out of
    /// attempts or is cancelled.
    pub async fn run<T, F, Fut>(
        &self,
        operation: &'static str,
        cancel: &Cancellation,
        call: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let retry = call
            .retry(self.backoff().with_jitter())
            .when(StoreError::is_retryable)
            .notify(|err: &StoreError, delay: Duration| {
                tracing::warn!(
                    operation,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Store call failed, retrying"
                );
            });

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StoreError::Cancelled),
            result = retry => result,
        };

        if let Err(err) = &result {
            if err.is_retryable() {
                tracing::warn!(
                    operation,
                    max_attempts = self.max_attempts,
                    error = %err,
                    "Store call gave up"
                );
            }
        }
        result
    }
}

/// Store decorator applying a [`RetryPolicy`] to every call.
///
/// # Type Parameters
///
/// * `S` - The underlying store implementation
pub struct RetryingStore<S> {
    inner: Arc<S>,
    policy: RetryPolicy,
    cancel: Cancellation,
}

impl<S> RetryingStore<S> {
    pub fn new(inner: Arc<S>, policy: RetryPolicy) -> Self {
        Self {
            inner,
            policy,
            cancel: Cancellation::never(),
        }
    }

    /// Binds a cancellation token that aborts retries and backoff sleeps.
    pub fn with_cancellation(mut self, cancel: Cancellation) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn inner(&self) -> &Arc<S> {
        &self.inner
    }
}

#[async_trait]
impl<S> EntityStore for RetryingStore<S>
where
    S: EntityStore + 'static,
{
    async fn put(&self, record: &Record) -> Result<()> {
        self.policy
            .run("put", &self.cancel, || self.inner.put(record))
            .await
    }

    async fn get(&self, key: &StorageKey) -> Result<Option<Record>> {
        self.policy
            .run("get", &self.cancel, || self.inner.get(key))
            .await
    }

    async fn query(
        &self,
        partition_key: &str,
        kind: EntityKind,
        page: &PageRequest,
    ) -> Result<Page> {
        self.policy
            .run("query", &self.cancel, || {
                self.inner.query(partition_key, kind, page)
            })
            .await
    }

    async fn scan_all(&self, cursor: Option<&ResumePoint>) -> Result<Page> {
        self.policy
            .run("scan_all", &self.cancel, || self.inner.scan_all(cursor))
            .await
    }

    async fn delete(&self, key: &StorageKey) -> Result<()> {
        self.policy
            .run("delete", &self.cancel, || self.inner.delete(key))
            .await
    }
}

#[async_trait]
impl<S> IdentityIndex for RetryingStore<S>
where
    S: IdentityIndex + 'static,
{
    async fn find_by_entity_id(&self, entity_id: &str) -> Result<Record> {
        self.policy
            .run("find_by_entity_id", &self.cancel, || {
                self.inner.find_by_entity_id(entity_id)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use backon::BackoffBuilder;
    use chrono::Utc;

    use super::*;

    /// Mock store that fails a fixed number of times before answering.
    struct FlakyStore {
        failures_left: AtomicUsize,
        error: StoreError,
        calls: AtomicUsize,
        puts: Mutex<Vec<Record>>,
    }

    impl FlakyStore {
        fn new(failures: usize, error: StoreError) -> Self {
            Self {
                failures_left: AtomicUsize::new(failures),
                error,
                calls: AtomicUsize::new(0),
                puts: Mutex::new(Vec::new()),
            }
        }

        fn call(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let remaining = self.failures_left.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures_left.store(remaining - 1, Ordering::SeqCst);
                return Err(self.error.clone());
            }
            Ok(())
        }
    }

    #[async_trait]
    impl EntityStore for FlakyStore {
        async fn put(&self, record: &Record) -> Result<()> {
            self.call()?;
            self.puts.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn get(&self, _key: &StorageKey) -> Result<Option<Record>> {
            self.call()?;
            Ok(None)
        }

        async fn query(
            &self,
            _partition_key: &str,
            _kind: EntityKind,
            _page: &PageRequest,
        ) -> Result<Page> {
            self.call()?;
            Ok(Page::new(Vec::new(), None))
        }

        async fn scan_all(&self, _cursor: Option<&ResumePoint>) -> Result<Page> {
            self.call()?;
            Ok(Page::new(Vec::new(), None))
        }

        async fn delete(&self, _key: &StorageKey) -> Result<()> {
            self.call()
        }
    }

    #[async_trait]
    impl IdentityIndex for FlakyStore {
        async fn find_by_entity_id(&self, entity_id: &str) -> Result<Record> {
            self.call()?;
            Err(StoreError::NotFound {
                entity_type: "Entity",
                id: entity_id.to_string(),
            })
        }
    }

    /// Store whose calls never complete.
    struct HangingStore;

    #[async_trait]
    impl EntityStore for HangingStore {
        async fn put(&self, _record: &Record) -> Result<()> {
            std::future::pending().await
        }

        async fn get(&self, _key: &StorageKey) -> Result<Option<Record>> {
            std::future::pending().await
        }

        async fn query(
            &self,
            _partition_key: &str,
            _kind: EntityKind,
            _page: &PageRequest,
        ) -> Result<Page> {
            std::future::pending().await
        }

        async fn scan_all(&self, _cursor: Option<&ResumePoint>) -> Result<Page> {
            std::future::pending().await
        }

        async fn delete(&self, _key: &StorageKey) -> Result<()> {
            std::future::pending().await
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(4),
        }
    }

    fn unavailable() -> StoreError {
        StoreError::StoreUnavailable("throttled".to_string())
    }

    fn sample_record() -> Record {
        Record {
            partition_key: "sub-1".to_string(),
            sort_key: "Vote#user-1".to_string(),
            entity_id: "vote-1".to_string(),
            created_by: "user-1".to_string(),
            created_at: Utc::now(),
            attributes: Default::default(),
        }
    }

    #[test]
    fn test_backoff_doubles_up_to_cap() {
        let policy = RetryPolicy {
            max_attempts: 8,
            ..RetryPolicy::default()
        };
        let delays: Vec<Duration> = policy.backoff().build().collect();
        assert_eq!(
            delays,
            [100, 200, 400, 800, 1_600, 2_000, 2_000]
                .into_iter()
                .map(Duration::from_millis)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_default_policy_retries_twice() {
        assert_eq!(RetryPolicy::default().backoff().build().count(), 2);
        assert_eq!(RetryPolicy::none().backoff().build().count(), 0);
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let inner = Arc::new(FlakyStore::new(2, unavailable()));
        let store = RetryingStore::new(inner.clone(), fast_policy(3));

        store.put(&sample_record()).await.unwrap();

        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
        assert_eq!(inner.puts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let inner = Arc::new(FlakyStore::new(10, unavailable()));
        let store = RetryingStore::new(inner.clone(), fast_policy(3));

        let result = store.get(&StorageKey::new("a", "Vote#b")).await;

        assert_eq!(result, Err(unavailable()));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let inner = Arc::new(FlakyStore::new(0, unavailable()));
        let store = RetryingStore::new(inner.clone(), fast_policy(3));

        let result = store.find_by_entity_id("missing").await;

        assert!(matches!(result, Err(StoreError::NotFound { .. })));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_permanent_errors_pass_through() {
        let inner = Arc::new(FlakyStore::new(
            1,
            StoreError::InvalidData("bad item".to_string()),
        ));
        let store = RetryingStore::new(inner.clone(), fast_policy(3));

        let result = store.scan_all(None).await;

        assert!(matches!(result, Err(StoreError::InvalidData(_))));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancellation_stops_retries() {
        let inner = Arc::new(FlakyStore::new(10, unavailable()));
        let (handle, token) = Cancellation::new();
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_backoff: Duration::from_secs(30),
            max_backoff: Duration::from_secs(30),
        };
        let store = RetryingStore::new(inner.clone(), policy).with_cancellation(token);

        let cancel = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            handle.cancel();
        });
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            store.delete(&StorageKey::new("a", "Vote#b")),
        )
        .await
        .expect("cancellation should interrupt the backoff");
        cancel.await.unwrap();

        assert_eq!(result, Err(StoreError::Cancelled));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_attempt() {
        let inner = Arc::new(FlakyStore::new(0, unavailable()));
        let (handle, token) = Cancellation::new();
        handle.cancel();
        let store = RetryingStore::new(inner.clone(), fast_policy(3)).with_cancellation(token);

        let page = PageRequest::from_params(10, None).unwrap();
        let result = store.query("p", EntityKind::Vote, &page).await;

        assert_eq!(result, Err(StoreError::Cancelled));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_call_in_flight() {
        let (handle, token) = Cancellation::new();
        let store = RetryingStore::new(Arc::new(HangingStore), RetryPolicy::default())
            .with_cancellation(token);

        let cancel = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            handle.cancel();
        });
        let result = tokio::time::timeout(
            Duration::from_secs(2),
            store.get(&StorageKey::new("a", "Vote#b")),
        )
        .await
        .expect("cancellation should interrupt the pending call");
        cancel.await.unwrap();

        assert_eq!(result, Err(StoreError::Cancelled));
    }
}
