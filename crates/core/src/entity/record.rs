use std::collections::BTreeMap;
use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::EntityKind;
use crate::storage::{decode_sort_key, StorageKey};

/// A stored attribute value.
///
/// Mirrors the DynamoDB value model closely enough that the backend mapping
/// is one-to-one. Numbers are kept as decimal text so no precision is lost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeValue {
    S(String),
    N(String),
    Bool(bool),
    L(Vec<AttributeValue>),
    M(BTreeMap<String, AttributeValue>),
    Null,
}

impl AttributeValue {
    pub fn number(n: impl Display) -> Self {
        AttributeValue::N(n.to_string())
    }

    pub fn string_list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AttributeValue::L(
            values
                .into_iter()
                .map(|v| AttributeValue::S(v.into()))
                .collect(),
        )
    }

    pub fn as_s(&self) -> Option<&str> {
        match self {
            AttributeValue::S(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_n(&self) -> Option<&str> {
        match self {
            AttributeValue::N(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_l(&self) -> Option<&[AttributeValue]> {
        match self {
            AttributeValue::L(l) => Some(l),
            _ => None,
        }
    }
}

/// Kind-specific payload of a record.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// The stored shape shared by every entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub partition_key: String,
    pub sort_key: String,
    pub entity_id: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub attributes: Attributes,
}

impl Record {
    /// The physical primary key.
    pub fn key(&self) -> StorageKey {
        StorageKey::new(self.partition_key.clone(), self.sort_key.clone())
    }

    /// The entity kind encoded in the sort key, if it decodes.
    pub fn kind(&self) -> Option<EntityKind> {
        decode_sort_key(&self.sort_key).ok().map(|(kind, _)| kind)
    }

    /// Prefix test used by scans that filter a single kind.
    pub fn is_kind(&self, kind: EntityKind) -> bool {
        self.sort_key.starts_with(kind.sort_key_prefix())
    }
}
