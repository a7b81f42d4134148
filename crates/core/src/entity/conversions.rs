//! Attribute conversions for every entity kind.
//!
//! Pure functions between typed entities and the generic attribute map.
//! Descriptive text fields read back as empty strings when absent so that
//! records written by older clients still load.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{
    AttributeValue, Attributes, ContactInfo, Entity, EntityKind, EntityMeta, Festival, Fort,
    Label, ReviewStatus, SocialLinks, Submission, SubmissionDetails, SubmissionRank, Vote,
};
use crate::ranking::Rank;
use crate::storage::{StoreError, ROOT_PARTITION};

// ============================================================================
// Attribute names
// ============================================================================

const ATTR_NAME: &str = "name";
const ATTR_DESCRIPTION: &str = "description";
const ATTR_GUIDELINES: &str = "guidelines";
const ATTR_IS_ACTIVE: &str = "isActive";
const ATTR_START_DATE_TIME: &str = "startDateTime";
const ATTR_END_DATE_TIME: &str = "endDateTime";
const ATTR_FESTIVAL_ID: &str = "festivalId";
const ATTR_STATE: &str = "state";
const ATTR_CITY: &str = "city";
const ATTR_COUNTRY: &str = "country";
const ATTR_PICTURE_URL: &str = "pictureUrl";
const ATTR_WEBSITE_URL: &str = "websiteUrl";
const ATTR_GENRES: &str = "genres";
const ATTR_STATEMENT: &str = "statement";
const ATTR_SOCIAL_LINKS: &str = "socialLinks";
const ATTR_CONTACT_INFO: &str = "contactInfo";
const ATTR_REVIEW_STATUS: &str = "reviewStatus";
const ATTR_LABEL_IDS: &str = "labelIds";
const ATTR_VALUE: &str = "value";
const ATTR_RANK: &str = "rank";
const ATTR_VOTE_COUNT: &str = "voteCount";

// ============================================================================
// Festival
// ============================================================================

impl Entity for Festival {
    const KIND: EntityKind = EntityKind::Festival;

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn parent_id(&self) -> &str {
        ROOT_PARTITION
    }

    fn local_id(&self) -> &str {
        &self.meta.entity_id
    }

    fn attributes(&self) -> Result<Attributes, StoreError> {
        let mut attrs = Attributes::new();
        attrs.insert(ATTR_NAME.to_string(), AttributeValue::S(self.name.clone()));
        attrs.insert(
            ATTR_GUIDELINES.to_string(),
            AttributeValue::S(self.guidelines.clone()),
        );
        attrs.insert(
            ATTR_IS_ACTIVE.to_string(),
            AttributeValue::Bool(self.is_active),
        );
        attrs.insert(
            ATTR_START_DATE_TIME.to_string(),
            AttributeValue::S(self.start_date_time.to_rfc3339()),
        );
        attrs.insert(
            ATTR_END_DATE_TIME.to_string(),
            AttributeValue::S(self.end_date_time.to_rfc3339()),
        );
        Ok(attrs)
    }

    fn from_parts(
        meta: EntityMeta,
        _partition_key: &str,
        _local_id: &str,
        attrs: &Attributes,
    ) -> Result<Self, StoreError> {
        Ok(Festival {
            meta,
            name: get_string(attrs, ATTR_NAME)?,
            guidelines: get_optional_string(attrs, ATTR_GUIDELINES).unwrap_or_default(),
            is_active: get_bool(attrs, ATTR_IS_ACTIVE)?,
            start_date_time: get_datetime(attrs, ATTR_START_DATE_TIME)?,
            end_date_time: get_datetime(attrs, ATTR_END_DATE_TIME)?,
        })
    }
}

// ============================================================================
// Fort
// ============================================================================

impl Entity for Fort {
    const KIND: EntityKind = EntityKind::Fort;

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn parent_id(&self) -> &str {
        &self.festival_id
    }

    fn local_id(&self) -> &str {
        &self.meta.entity_id
    }

    fn attributes(&self) -> Result<Attributes, StoreError> {
        let mut attrs = Attributes::new();
        attrs.insert(ATTR_NAME.to_string(), AttributeValue::S(self.name.clone()));
        attrs.insert(
            ATTR_DESCRIPTION.to_string(),
            AttributeValue::S(self.description.clone()),
        );
        Ok(attrs)
    }

    fn from_parts(
        meta: EntityMeta,
        partition_key: &str,
        _local_id: &str,
        attrs: &Attributes,
    ) -> Result<Self, StoreError> {
        Ok(Fort {
            meta,
            festival_id: partition_key.to_string(),
            name: get_string(attrs, ATTR_NAME)?,
            description: get_optional_string(attrs, ATTR_DESCRIPTION).unwrap_or_default(),
        })
    }
}

// ============================================================================
// Submission
// ============================================================================

impl Entity for Submission {
    const KIND: EntityKind = EntityKind::Submission;

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn parent_id(&self) -> &str {
        &self.fort_id
    }

    fn local_id(&self) -> &str {
        &self.submitter
    }

    fn attributes(&self) -> Result<Attributes, StoreError> {
        let details = &self.details;
        let mut attrs = Attributes::new();
        attrs.insert(
            ATTR_FESTIVAL_ID.to_string(),
            AttributeValue::S(self.festival_id.clone()),
        );
        attrs.insert(ATTR_NAME.to_string(), AttributeValue::S(details.name.clone()));
        attrs.insert(ATTR_STATE.to_string(), AttributeValue::S(details.state.clone()));
        attrs.insert(ATTR_CITY.to_string(), AttributeValue::S(details.city.clone()));
        attrs.insert(
            ATTR_COUNTRY.to_string(),
            AttributeValue::S(details.country.clone()),
        );
        attrs.insert(
            ATTR_DESCRIPTION.to_string(),
            AttributeValue::S(details.description.clone()),
        );
        attrs.insert(
            ATTR_PICTURE_URL.to_string(),
            AttributeValue::S(details.picture_url.clone()),
        );
        attrs.insert(
            ATTR_WEBSITE_URL.to_string(),
            AttributeValue::S(details.website_url.clone()),
        );
        attrs.insert(
            ATTR_GENRES.to_string(),
            AttributeValue::string_list(details.genres.iter().cloned()),
        );
        attrs.insert(
            ATTR_STATEMENT.to_string(),
            AttributeValue::S(details.statement.clone()),
        );

        // Nested structures as JSON
        attrs.insert(
            ATTR_SOCIAL_LINKS.to_string(),
            AttributeValue::S(to_json(&details.social_links)?),
        );
        attrs.insert(
            ATTR_CONTACT_INFO.to_string(),
            AttributeValue::S(to_json(&details.contact_info)?),
        );

        attrs.insert(
            ATTR_REVIEW_STATUS.to_string(),
            AttributeValue::S(review_status_to_string(&self.review_status).to_string()),
        );
        attrs.insert(
            ATTR_LABEL_IDS.to_string(),
            AttributeValue::string_list(self.label_ids.iter().cloned()),
        );
        Ok(attrs)
    }

    fn from_parts(
        meta: EntityMeta,
        partition_key: &str,
        local_id: &str,
        attrs: &Attributes,
    ) -> Result<Self, StoreError> {
        let review_status = match get_optional_string(attrs, ATTR_REVIEW_STATUS) {
            Some(s) => parse_review_status(&s)?,
            None => ReviewStatus::default(),
        };
        let social_links: SocialLinks = match get_optional_string(attrs, ATTR_SOCIAL_LINKS) {
            Some(json) => from_json(&json)?,
            None => SocialLinks::default(),
        };
        let contact_info: ContactInfo = match get_optional_string(attrs, ATTR_CONTACT_INFO) {
            Some(json) => from_json(&json)?,
            None => ContactInfo::default(),
        };

        Ok(Submission {
            meta,
            fort_id: partition_key.to_string(),
            festival_id: get_string(attrs, ATTR_FESTIVAL_ID)?,
            submitter: local_id.to_string(),
            details: SubmissionDetails {
                name: get_string(attrs, ATTR_NAME)?,
                state: get_optional_string(attrs, ATTR_STATE).unwrap_or_default(),
                city: get_optional_string(attrs, ATTR_CITY).unwrap_or_default(),
                country: get_optional_string(attrs, ATTR_COUNTRY).unwrap_or_default(),
                description: get_optional_string(attrs, ATTR_DESCRIPTION).unwrap_or_default(),
                picture_url: get_optional_string(attrs, ATTR_PICTURE_URL).unwrap_or_default(),
                website_url: get_optional_string(attrs, ATTR_WEBSITE_URL).unwrap_or_default(),
                genres: get_string_list(attrs, ATTR_GENRES)?,
                statement: get_optional_string(attrs, ATTR_STATEMENT).unwrap_or_default(),
                social_links,
                contact_info,
            },
            review_status,
            label_ids: get_string_list(attrs, ATTR_LABEL_IDS)?,
        })
    }
}

// ============================================================================
// Label
// ============================================================================

impl Entity for Label {
    const KIND: EntityKind = EntityKind::Label;

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn parent_id(&self) -> &str {
        &self.festival_id
    }

    fn local_id(&self) -> &str {
        &self.meta.entity_id
    }

    fn attributes(&self) -> Result<Attributes, StoreError> {
        let mut attrs = Attributes::new();
        attrs.insert(ATTR_NAME.to_string(), AttributeValue::S(self.name.clone()));
        Ok(attrs)
    }

    fn from_parts(
        meta: EntityMeta,
        partition_key: &str,
        _local_id: &str,
        attrs: &Attributes,
    ) -> Result<Self, StoreError> {
        Ok(Label {
            meta,
            festival_id: partition_key.to_string(),
            name: get_string(attrs, ATTR_NAME)?,
        })
    }
}

// ============================================================================
// Vote
// ============================================================================

impl Entity for Vote {
    const KIND: EntityKind = EntityKind::Vote;

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn parent_id(&self) -> &str {
        &self.submission_id
    }

    fn local_id(&self) -> &str {
        &self.meta.created_by
    }

    fn attributes(&self) -> Result<Attributes, StoreError> {
        let mut attrs = Attributes::new();
        attrs.insert(ATTR_VALUE.to_string(), AttributeValue::number(self.value));
        Ok(attrs)
    }

    fn from_parts(
        meta: EntityMeta,
        partition_key: &str,
        _local_id: &str,
        attrs: &Attributes,
    ) -> Result<Self, StoreError> {
        Ok(Vote {
            meta,
            submission_id: partition_key.to_string(),
            value: get_number(attrs, ATTR_VALUE)?,
        })
    }
}

// ============================================================================
// SubmissionRank
// ============================================================================

impl Entity for SubmissionRank {
    const KIND: EntityKind = EntityKind::SubmissionRank;

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn parent_id(&self) -> &str {
        &self.submission_id
    }

    fn local_id(&self) -> &str {
        &self.submission_id
    }

    fn attributes(&self) -> Result<Attributes, StoreError> {
        let mut attrs = Attributes::new();
        attrs.insert(ATTR_RANK.to_string(), AttributeValue::number(self.rank));
        attrs.insert(
            ATTR_VOTE_COUNT.to_string(),
            AttributeValue::number(self.vote_count),
        );
        Ok(attrs)
    }

    fn from_parts(
        meta: EntityMeta,
        partition_key: &str,
        _local_id: &str,
        attrs: &Attributes,
    ) -> Result<Self, StoreError> {
        Ok(SubmissionRank {
            meta,
            submission_id: partition_key.to_string(),
            rank: get_number::<Rank>(attrs, ATTR_RANK)?,
            vote_count: get_number(attrs, ATTR_VOTE_COUNT)?,
        })
    }
}

// ============================================================================
// Review status conversions
// ============================================================================

/// Convert ReviewStatus to string.
pub fn review_status_to_string(status: &ReviewStatus) -> &'static str {
    match status {
        ReviewStatus::Pending => "pending",
        ReviewStatus::Approved => "approved",
        ReviewStatus::Declined => "declined",
    }
}

/// Parse ReviewStatus from string.
pub fn parse_review_status(s: &str) -> Result<ReviewStatus, StoreError> {
    match s.to_lowercase().as_str() {
        "pending" => Ok(ReviewStatus::Pending),
        "approved" => Ok(ReviewStatus::Approved),
        "declined" => Ok(ReviewStatus::Declined),
        _ => Err(StoreError::InvalidData(format!(
            "Unknown review status: {}",
            s
        ))),
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Get a required string attribute.
fn get_string(attrs: &Attributes, key: &str) -> Result<String, StoreError> {
    get_optional_string(attrs, key)
        .ok_or_else(|| StoreError::InvalidData(format!("Missing or invalid field: {}", key)))
}

/// Get an optional string attribute.
fn get_optional_string(attrs: &Attributes, key: &str) -> Option<String> {
    attrs
        .get(key)
        .and_then(|v| v.as_s())
        .map(|s| s.to_string())
}

/// Get a required boolean attribute.
fn get_bool(attrs: &Attributes, key: &str) -> Result<bool, StoreError> {
    attrs
        .get(key)
        .and_then(|v| v.as_bool())
        .ok_or_else(|| StoreError::InvalidData(format!("Missing or invalid field: {}", key)))
}

/// Get a required numeric attribute, parsed from its decimal text.
fn get_number<T>(attrs: &Attributes, key: &str) -> Result<T, StoreError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let n = attrs
        .get(key)
        .and_then(|v| v.as_n())
        .ok_or_else(|| StoreError::InvalidData(format!("Missing or invalid field: {}", key)))?;
    n.parse()
        .map_err(|e| StoreError::InvalidData(format!("Invalid number {}: {}", key, e)))
}

/// Get a string list attribute. A missing attribute is an empty list.
fn get_string_list(attrs: &Attributes, key: &str) -> Result<Vec<String>, StoreError> {
    let Some(value) = attrs.get(key) else {
        return Ok(Vec::new());
    };
    let list = value
        .as_l()
        .ok_or_else(|| StoreError::InvalidData(format!("Invalid list field: {}", key)))?;
    list.iter()
        .map(|v| {
            v.as_s()
                .map(|s| s.to_string())
                .ok_or_else(|| StoreError::InvalidData(format!("Invalid list item in {}", key)))
        })
        .collect()
}

/// Get a required datetime attribute (RFC 3339 format).
fn get_datetime(attrs: &Attributes, key: &str) -> Result<DateTime<Utc>, StoreError> {
    let s = get_string(attrs, key)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::InvalidData(format!("Invalid datetime {}: {}", key, e)))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|e| StoreError::InvalidData(e.to_string()))
}

fn from_json<T: DeserializeOwned>(json: &str) -> Result<T, StoreError> {
    serde_json::from_str(json).map_err(|e| StoreError::InvalidData(e.to_string()))
}
