use std::{env, time::Duration};

use thiserror::Error;

use crate::storage::RetryPolicy;

/// Errors raised while reading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a positive integer, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

/// Store configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Physical table name (default: "submit")
    pub table_name: String,
    /// Name of the secondary index keyed by `EntityId` (default: "EntityIdIndex")
    pub entity_id_index: String,
    /// Custom endpoint URL, for local DynamoDB
    pub endpoint_url: Option<String>,
    /// AWS region override; the SDK default chain applies when unset
    pub region: Option<String>,
    /// Attempts per store call, including the first (default: 3)
    pub retry_max_attempts: u32,
    /// First retry delay in milliseconds (default: 100)
    pub retry_initial_backoff_ms: u64,
    /// Upper bound on any retry delay in milliseconds (default: 2,000)
    pub retry_max_backoff_ms: u64,
    /// Records per page when scanning the whole table (default: 100)
    pub scan_page_size: u32,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SUBMIT_TABLE_NAME` - Table name (default: "submit")
    /// - `SUBMIT_ENTITY_ID_INDEX` - Identity index name (default: "EntityIdIndex")
    /// - `AWS_ENDPOINT_URL` - Custom endpoint (default: unset)
    /// - `AWS_REGION` - Region override (default: unset)
    /// - `SUBMIT_RETRY_MAX_ATTEMPTS` - Attempts per call (default: 3)
    /// - `SUBMIT_RETRY_INITIAL_BACKOFF_MS` - First retry delay (default: 100)
    /// - `SUBMIT_RETRY_MAX_BACKOFF_MS` - Retry delay cap (default: 2000)
    /// - `SUBMIT_SCAN_PAGE_SIZE` - Scan page size (default: 100)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Ok(Self {
            table_name: non_empty("SUBMIT_TABLE_NAME").unwrap_or_else(|| "submit".to_string()),
            entity_id_index: non_empty("SUBMIT_ENTITY_ID_INDEX")
                .unwrap_or_else(|| "EntityIdIndex".to_string()),
            endpoint_url: non_empty("AWS_ENDPOINT_URL"),
            region: non_empty("AWS_REGION"),
            retry_max_attempts: positive(&non_empty, "SUBMIT_RETRY_MAX_ATTEMPTS", 3)?,
            retry_initial_backoff_ms: positive(&non_empty, "SUBMIT_RETRY_INITIAL_BACKOFF_MS", 100)?,
            retry_max_backoff_ms: positive(&non_empty, "SUBMIT_RETRY_MAX_BACKOFF_MS", 2_000)?,
            scan_page_size: positive(&non_empty, "SUBMIT_SCAN_PAGE_SIZE", 100)?,
        })
    }

    /// Retry policy for the store decorator.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_max_attempts,
            initial_backoff: Duration::from_millis(self.retry_initial_backoff_ms),
            max_backoff: Duration::from_millis(
                self.retry_max_backoff_ms.max(self.retry_initial_backoff_ms),
            ),
        }
    }
}

/// Parse a positive integer variable, falling back to `default` when unset.
fn positive<T, F>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(name) else {
        return Ok(default);
    };
    match value.trim().parse::<T>() {
        Ok(parsed) if parsed > T::default() => Ok(parsed),
        _ => Err(ConfigError::InvalidNumber { name, value }),
    }
}
