use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ranking::Rank;

/// Fields every entity carries regardless of kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMeta {
    /// Globally unique id, exposed externally as the resource id.
    pub entity_id: String,
    pub created_by: String,
    /// Set once at creation and never changed.
    pub created_at: DateTime<Utc>,
}

impl EntityMeta {
    /// Fresh metadata with a new v4 entity id, stamped now.
    pub fn new(created_by: impl Into<String>) -> Self {
        Self::at(created_by, Utc::now())
    }

    /// Fresh metadata with a new v4 entity id and an explicit timestamp.
    pub fn at(created_by: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            entity_id: Uuid::new_v4().to_string(),
            created_by: created_by.into(),
            created_at,
        }
    }

    /// Sets a specific entity id (useful for testing).
    pub fn with_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = entity_id.into();
        self
    }
}

/// A festival accepting submissions during its window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Festival {
    pub meta: EntityMeta,
    pub name: String,
    pub guidelines: String,
    pub is_active: bool,
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
}

impl Festival {
    pub fn new(
        created_by: impl Into<String>,
        name: impl Into<String>,
        guidelines: impl Into<String>,
        start_date_time: DateTime<Utc>,
        end_date_time: DateTime<Utc>,
    ) -> Self {
        Self {
            meta: EntityMeta::new(created_by),
            name: name.into(),
            guidelines: guidelines.into(),
            is_active: true,
            start_date_time,
            end_date_time,
        }
    }

    /// True while the festival is active and `now` falls inside its window.
    pub fn submissions_open(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.start_date_time <= now && now <= self.end_date_time
    }
}

/// A venue owned by a festival.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fort {
    pub meta: EntityMeta,
    pub festival_id: String,
    pub name: String,
    pub description: String,
}

impl Fort {
    pub fn new(
        festival_id: impl Into<String>,
        created_by: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            meta: EntityMeta::new(created_by),
            festival_id: festival_id.into(),
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Where a submission stands in review.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
    Declined,
}

/// Links to an artist's presence on other platforms. Empty strings mean unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SocialLinks {
    pub spotify: String,
    pub apple_music: String,
    pub bandcamp: String,
    pub soundcloud: String,
    pub videos: Vec<String>,
    pub facebook: String,
    pub twitter: String,
    pub instagram: String,
    pub tiktok: String,
}

/// How organizers reach the people behind a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactInfo {
    pub name: String,
    pub phone_number: String,
    pub email: String,
    pub relationship: String,
    pub management_contact: String,
    pub agent_contact: String,
    pub booking_contact: String,
    pub publicist_contact: String,
}

/// Everything the submitter fills in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionDetails {
    pub name: String,
    pub state: String,
    pub city: String,
    pub country: String,
    pub description: String,
    pub picture_url: String,
    pub website_url: String,
    pub genres: Vec<String>,
    pub statement: String,
    pub social_links: SocialLinks,
    pub contact_info: ContactInfo,
}

/// An act submitted to a fort.
///
/// The local id is the submitter's identity, so submitting again to the same
/// fort overwrites the earlier submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub meta: EntityMeta,
    pub fort_id: String,
    pub festival_id: String,
    pub submitter: String,
    pub details: SubmissionDetails,
    pub review_status: ReviewStatus,
    pub label_ids: Vec<String>,
}

impl Submission {
    pub fn new(
        festival_id: impl Into<String>,
        fort_id: impl Into<String>,
        submitter: impl Into<String>,
        details: SubmissionDetails,
    ) -> Self {
        let submitter = submitter.into();
        Self {
            meta: EntityMeta::new(submitter.clone()),
            fort_id: fort_id.into(),
            festival_id: festival_id.into(),
            submitter,
            details,
            review_status: ReviewStatus::Pending,
            label_ids: Vec::new(),
        }
    }
}

/// A festival-scoped tag attachable to submissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub meta: EntityMeta,
    pub festival_id: String,
    pub name: String,
}

impl Label {
    pub fn new(
        festival_id: impl Into<String>,
        created_by: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            meta: EntityMeta::new(created_by),
            festival_id: festival_id.into(),
            name: name.into(),
        }
    }
}

/// One voter's score for one submission.
///
/// Stored in the submission's partition with the voter as local id, so each
/// voter holds at most one vote per submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    pub meta: EntityMeta,
    pub submission_id: String,
    pub value: i64,
}

impl Vote {
    pub fn new(submission_id: impl Into<String>, voter: impl Into<String>, value: i64) -> Self {
        Self {
            meta: EntityMeta::new(voter),
            submission_id: submission_id.into(),
            value,
        }
    }

    pub fn voter(&self) -> &str {
        &self.meta.created_by
    }
}

/// Derived average score of a submission. Written only by the vote tally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRank {
    pub meta: EntityMeta,
    pub submission_id: String,
    pub rank: Rank,
    pub vote_count: u32,
}
