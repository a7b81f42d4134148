//! Opaque pagination tokens.
//!
//! A [`ResumePoint`] is the exact set of key fields a backend needs to resume
//! a query or scan. Tokens handed to callers are a versioned JSON payload of
//! those fields, base64url encoded without padding.

use std::num::NonZeroU32;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::keys::{decode_sort_key, StorageKey};
use super::{Result, StoreError};
use crate::entity::Record;

const CURSOR_VERSION: u8 = 1;

/// Backend-native position after the last returned record.
///
/// `entity_id` is only present for resume points produced by the identity
/// index, whose native key includes the index attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResumePoint {
    pub partition_key: String,
    pub sort_key: String,
    pub entity_id: Option<String>,
}

impl ResumePoint {
    /// Resume point positioned after the given primary key.
    pub fn after(key: &StorageKey) -> Self {
        Self {
            partition_key: key.partition_key.clone(),
            sort_key: key.sort_key.clone(),
            entity_id: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CursorPayload {
    v: u8,
    pk: String,
    sk: String,
    #[serde(default)]
    id: Option<String>,
}

/// Encode a resume point as an opaque token.
///
/// # Examples
///
/// ```
/// use submit_core::storage::{decode_cursor, encode_cursor, ResumePoint};
///
/// let point = ResumePoint {
///     partition_key: "fort-1".to_string(),
///     sort_key: "Submission#user-1".to_string(),
///     entity_id: None,
/// };
/// let token = encode_cursor(&point);
/// assert_eq!(decode_cursor(&token).unwrap(), point);
/// ```
pub fn encode_cursor(point: &ResumePoint) -> String {
    let payload = match &point.entity_id {
        Some(id) => serde_json::json!({
            "v": CURSOR_VERSION,
            "pk": point.partition_key,
            "sk": point.sort_key,
            "id": id,
        }),
        None => serde_json::json!({
            "v": CURSOR_VERSION,
            "pk": point.partition_key,
            "sk": point.sort_key,
        }),
    };
    URL_SAFE_NO_PAD.encode(payload.to_string())
}

/// Decode an opaque token back into a resume point.
///
/// Fails with `InvalidCursor` on malformed or tampered input. A cursor whose
/// partition no longer exists still decodes; the follow-up query just returns
/// fewer records.
pub fn decode_cursor(token: &str) -> Result<ResumePoint> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token.trim())
        .map_err(|e| StoreError::InvalidCursor(format!("not base64url: {e}")))?;
    let payload: CursorPayload = serde_json::from_slice(&bytes)
        .map_err(|e| StoreError::InvalidCursor(format!("unreadable payload: {e}")))?;

    if payload.v != CURSOR_VERSION {
        return Err(StoreError::InvalidCursor(format!(
            "unsupported version {}",
            payload.v
        )));
    }
    if payload.pk.is_empty() {
        return Err(StoreError::InvalidCursor("empty partition key".to_string()));
    }
    decode_sort_key(&payload.sk)
        .map_err(|e| StoreError::InvalidCursor(format!("bad sort key: {e}")))?;
    if matches!(payload.id.as_deref(), Some("")) {
        return Err(StoreError::InvalidCursor("empty entity id".to_string()));
    }

    Ok(ResumePoint {
        partition_key: payload.pk,
        sort_key: payload.sk,
        entity_id: payload.id,
    })
}

/// Number of records requested per page, between 1 and [`PageSize::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageSize(NonZeroU32);

impl PageSize {
    /// Largest page the DynamoDB `Limit` parameter accepts.
    pub const MAX: u32 = i32::MAX as u32;

    /// Validate a caller-supplied page size.
    pub fn new(value: i64) -> Result<Self> {
        u32::try_from(value)
            .ok()
            .filter(|v| *v <= Self::MAX)
            .and_then(NonZeroU32::new)
            .map(Self)
            .ok_or(StoreError::InvalidPageSize(value))
    }

    pub fn get(&self) -> u32 {
        self.0.get()
    }
}

impl TryFrom<i64> for PageSize {
    type Error = StoreError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

/// A page size plus an optional position to resume from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page_size: PageSize,
    pub cursor: Option<ResumePoint>,
}

impl PageRequest {
    /// Request the first page.
    pub fn first(page_size: PageSize) -> Self {
        Self {
            page_size,
            cursor: None,
        }
    }

    /// Build a request from list-endpoint parameters.
    pub fn from_params(page_size: i64, pagination_key: Option<&str>) -> Result<Self> {
        let page_size = PageSize::new(page_size)?;
        let cursor = pagination_key
            .filter(|key| !key.is_empty())
            .map(decode_cursor)
            .transpose()?;
        Ok(Self { page_size, cursor })
    }
}

/// One page of results plus where to resume, if anything may remain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T = Record> {
    pub items: Vec<T>,
    pub next: Option<ResumePoint>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next: Option<ResumePoint>) -> Self {
        Self { items, next }
    }

    /// Opaque token for the next page.
    pub fn next_token(&self) -> Option<String> {
        self.next.as_ref().map(encode_cursor)
    }

    /// Convert every item, failing on the first error.
    pub fn try_map<U, E>(
        self,
        f: impl FnMut(T) -> std::result::Result<U, E>,
    ) -> std::result::Result<Page<U>, E> {
        let items = self
            .items
            .into_iter()
            .map(f)
            .collect::<std::result::Result<_, _>>()?;
        Ok(Page {
            items,
            next: self.next,
        })
    }
}
