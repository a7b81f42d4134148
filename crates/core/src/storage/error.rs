use thiserror::Error;

/// Errors produced while deriving or decoding physical keys.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Partition key must not be empty")]
    EmptyPartitionKey,
    #[error("Local id must not be empty")]
    EmptyLocalId,
    #[error("Local id contains the reserved delimiter '#': {0}")]
    ReservedDelimiter(String),
    #[error("Unknown entity kind: {0}")]
    UnknownKind(String),
    #[error("Malformed sort key: {0}")]
    MalformedSortKey(String),
}

/// Errors that can occur during store operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    #[error("Entity id {entity_id} resolved to {matches} records")]
    IntegrityViolation { entity_id: String, matches: usize },
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),
    #[error("Invalid page size {0}: must be between 1 and 2147483647")]
    InvalidPageSize(i64),
    #[error("Invalid key: {0}")]
    InvalidKey(#[from] KeyError),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Operation cancelled")]
    Cancelled,
}

impl StoreError {
    /// Returns true for transient backend failures worth retrying.
    ///
    /// Only `StoreUnavailable` qualifies. `NotFound` from the identity index
    /// may also be transient (index lag) but is surfaced to the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::StoreUnavailable(_))
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
