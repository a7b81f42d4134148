//! In-memory storage backend for testing.
//!
//! This module provides an in-memory implementation of the store traits that
//! keeps every record in one ordered map wrapped in `Arc<RwLock<_>>`. The
//! ordering matches the table's (partition key, sort key) order, so paging
//! behaves like the real backend. Data is lost when the store is dropped.
//!
//! # Example
//!
//! ```rust,ignore
//! use submit::storage::inmemory::InMemoryStore;
//!
//! let store = InMemoryStore::new();
//! // Use store for testing...
//! ```

mod repository;

pub use repository::InMemoryStore;
