//! Entity model for the single-table layout.
//!
//! Each kind is a plain struct. The [`Entity`] trait ties a struct to its
//! [`EntityKind`] and knows how to turn it into the generic [`Record`] and
//! back; key derivation always goes through the key codec.

mod conversions;
mod kind;
mod record;
mod types;

pub use conversions::{parse_review_status, review_status_to_string};
pub use kind::EntityKind;
pub use record::{AttributeValue, Attributes, Record};
pub use types::{
    ContactInfo, EntityMeta, Festival, Fort, Label, ReviewStatus, SocialLinks, Submission,
    SubmissionDetails, SubmissionRank, Vote,
};

use crate::storage::{decode_sort_key, encode_key, StorageKey, StoreError};

/// A typed entity persisted as a [`Record`].
pub trait Entity: Sized {
    const KIND: EntityKind;

    fn meta(&self) -> &EntityMeta;

    /// Logical parent id; becomes the partition key.
    fn parent_id(&self) -> &str;

    /// Id unique within the parent; becomes the sort key suffix.
    fn local_id(&self) -> &str;

    /// Kind-specific payload.
    fn attributes(&self) -> Result<Attributes, StoreError>;

    /// Rebuild the entity from decoded record parts.
    fn from_parts(
        meta: EntityMeta,
        partition_key: &str,
        local_id: &str,
        attributes: &Attributes,
    ) -> Result<Self, StoreError>;

    fn storage_key(&self) -> Result<StorageKey, StoreError> {
        Ok(encode_key(Self::KIND, self.parent_id(), self.local_id())?)
    }

    fn to_record(&self) -> Result<Record, StoreError> {
        let key = self.storage_key()?;
        let meta = self.meta();
        Ok(Record {
            partition_key: key.partition_key,
            sort_key: key.sort_key,
            entity_id: meta.entity_id.clone(),
            created_by: meta.created_by.clone(),
            created_at: meta.created_at,
            attributes: self.attributes()?,
        })
    }

    fn from_record(record: &Record) -> Result<Self, StoreError> {
        let (kind, local_id) = decode_sort_key(&record.sort_key)
            .map_err(|e| StoreError::InvalidData(e.to_string()))?;
        if kind != Self::KIND {
            return Err(StoreError::InvalidData(format!(
                "expected {} record, found {}",
                Self::KIND,
                kind
            )));
        }
        let meta = EntityMeta {
            entity_id: record.entity_id.clone(),
            created_by: record.created_by.clone(),
            created_at: record.created_at,
        };
        Self::from_parts(meta, &record.partition_key, local_id, &record.attributes)
    }
}
