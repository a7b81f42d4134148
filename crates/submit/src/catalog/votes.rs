use std::ops::RangeInclusive;

use submit_core::entity::{Submission, SubmissionRank, Vote};
use submit_core::storage::{EntityStore, IdentityIndex, Result, StoreError};

use super::{Catalog, Paged};

/// Scores a voter may give.
pub const VOTE_RANGE: RangeInclusive<i64> = 1..=10;

impl<S> Catalog<S>
where
    S: EntityStore + IdentityIndex,
{
    /// Records a voter's score for a submission.
    ///
    /// Each voter holds one vote per submission; voting again replaces the
    /// value and keeps the vote's identity. Ranks only change on the next
    /// tally run.
    pub async fn cast_vote(&self, submission_id: &str, voter: &str, value: i64) -> Result<Vote> {
        if !VOTE_RANGE.contains(&value) {
            return Err(StoreError::Validation(format!(
                "vote must be between {} and {}, got {}",
                VOTE_RANGE.start(),
                VOTE_RANGE.end(),
                value
            )));
        }
        self.resolve::<Submission>(submission_id).await?;

        let mut vote = Vote::new(submission_id, voter, value);
        if let Some(existing) = self.load::<Vote>(submission_id, voter).await? {
            vote.meta = existing.meta;
        }

        self.save(&vote).await?;
        tracing::info!(submission_id, vote_id = %vote.meta.entity_id, "Cast vote");
        Ok(vote)
    }

    pub async fn list_votes(
        &self,
        submission_id: &str,
        page_size: i64,
        pagination_key: Option<&str>,
    ) -> Result<Paged<Vote>> {
        self.list(submission_id, page_size, pagination_key).await
    }

    /// The latest tallied rank, if the submission has been ranked.
    pub async fn get_rank(&self, submission_id: &str) -> Result<Option<SubmissionRank>> {
        self.load(submission_id, submission_id).await
    }
}
