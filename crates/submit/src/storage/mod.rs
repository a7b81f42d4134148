//! Storage backend implementations.
//!
//! This module provides concrete implementations of the store traits
//! defined in `submit_core::storage`. Backends are selected at compile time
//! via feature flags; the retry decorator wraps any of them.
//!
//! # Feature Flags
//!
//! - `inmemory` (default): process-local store for tests and local runs
//! - `dynamodb`: AWS DynamoDB storage backend using `aws-sdk-dynamodb`
//!
//! Build with DynamoDB:
//! ```bash
//! cargo build -p submit --features dynamodb
//! ```

#[cfg(not(any(feature = "inmemory", feature = "dynamodb")))]
compile_error!(
    "No storage backend selected. Enable 'inmemory' or 'dynamodb' feature. \
    Example: cargo build -p submit --features dynamodb"
);

mod retrying;

#[cfg(feature = "inmemory")]
pub mod inmemory;

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

pub use retrying::{RetryPolicy, RetryingStore};

#[cfg(feature = "inmemory")]
pub use inmemory::InMemoryStore;

#[cfg(feature = "dynamodb")]
pub use dynamodb::DynamoDbStore;
