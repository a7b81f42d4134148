use chrono::Utc;

use submit_core::entity::{EntityKind, Label, ReviewStatus, Submission, SubmissionDetails};
use submit_core::storage::{EntityStore, IdentityIndex, Result, StoreError};

use super::{not_found, require_non_empty, Catalog, Paged};

impl<S> Catalog<S>
where
    S: EntityStore + IdentityIndex,
{
    /// Submits an act to a fort while the festival accepts submissions.
    ///
    /// The submitter is the local id, so submitting again replaces the
    /// earlier submission. The replacement keeps the original entity id,
    /// creation time and labels, and goes back to `Pending` review.
    pub async fn add_submission(
        &self,
        festival_id: &str,
        fort_id: &str,
        submitter: &str,
        details: SubmissionDetails,
    ) -> Result<Submission> {
        require_non_empty("name", &details.name)?;
        let festival = self.require_festival(festival_id).await?;
        if !festival.submissions_open(Utc::now()) {
            return Err(StoreError::Validation(format!(
                "festival {} is not accepting submissions",
                festival_id
            )));
        }
        self.require_fort(festival_id, fort_id).await?;

        let mut submission = Submission::new(festival_id, fort_id, submitter, details);
        let existing = self.load::<Submission>(fort_id, submitter).await?;
        if let Some(existing) = &existing {
            submission.meta = existing.meta.clone();
            submission.label_ids = existing.label_ids.clone();
        }

        self.save(&submission).await?;
        tracing::info!(
            fort_id,
            submission_id = %submission.meta.entity_id,
            replaced = existing.is_some(),
            "Saved submission"
        );
        Ok(submission)
    }

    /// Lists submissions in a fort, optionally only those by one creator.
    ///
    /// The creator filter applies within each page.
    pub async fn list_submissions(
        &self,
        fort_id: &str,
        created_by: Option<&str>,
        page_size: i64,
        pagination_key: Option<&str>,
    ) -> Result<Paged<Submission>> {
        let mut page = self
            .list::<Submission>(fort_id, page_size, pagination_key)
            .await?;
        if let Some(created_by) = created_by {
            page.items.retain(|s| s.meta.created_by == created_by);
        }
        Ok(page)
    }

    pub async fn get_submission(
        &self,
        fort_id: &str,
        submitter: &str,
    ) -> Result<Option<Submission>> {
        self.load(fort_id, submitter).await
    }

    pub async fn review_submission(
        &self,
        fort_id: &str,
        submitter: &str,
        status: ReviewStatus,
    ) -> Result<Submission> {
        let mut submission = self.require::<Submission>(fort_id, submitter).await?;
        submission.review_status = status;

        self.save(&submission).await?;
        tracing::info!(
            submission_id = %submission.meta.entity_id,
            status = ?status,
            "Reviewed submission"
        );
        Ok(submission)
    }

    /// Tags a submission with a label from the same festival.
    ///
    /// Applying a label the submission already carries changes nothing.
    pub async fn apply_label(
        &self,
        fort_id: &str,
        submitter: &str,
        label_id: &str,
    ) -> Result<Submission> {
        let mut submission = self.require::<Submission>(fort_id, submitter).await?;
        let (label, _) = self.resolve::<Label>(label_id).await?;
        if label.festival_id != submission.festival_id {
            return Err(StoreError::Validation(format!(
                "label {} belongs to another festival",
                label_id
            )));
        }
        if submission.label_ids.iter().any(|id| id == label_id) {
            return Ok(submission);
        }

        submission.label_ids.push(label_id.to_string());
        self.save(&submission).await?;
        tracing::info!(
            submission_id = %submission.meta.entity_id,
            label_id,
            "Applied label"
        );
        Ok(submission)
    }

    /// Removes a label from a submission. Absent labels are ignored.
    pub async fn remove_label(
        &self,
        fort_id: &str,
        submitter: &str,
        label_id: &str,
    ) -> Result<Submission> {
        let mut submission = self.require::<Submission>(fort_id, submitter).await?;
        let before = submission.label_ids.len();
        submission.label_ids.retain(|id| id != label_id);
        if submission.label_ids.len() == before {
            return Ok(submission);
        }

        self.save(&submission).await?;
        tracing::info!(
            submission_id = %submission.meta.entity_id,
            label_id,
            "Removed label"
        );
        Ok(submission)
    }

    async fn require_fort(&self, festival_id: &str, fort_id: &str) -> Result<()> {
        self.get_fort(festival_id, fort_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| not_found(EntityKind::Fort, fort_id))
    }
}

#[cfg(all(test, feature = "inmemory"))]
mod tests {
    use chrono::Duration;
    use submit_core::entity::{Festival, Fort};

    use super::super::test_support::*;
    use super::*;

    async fn submitted(
        catalog: &Catalog<crate::storage::InMemoryStore>,
    ) -> (Festival, Fort, Submission) {
        let (festival, fort) = festival_with_fort(catalog).await;
        let submission = catalog
            .add_submission(
                &festival.meta.entity_id,
                &fort.meta.entity_id,
                "user-1",
                details("The Lanterns"),
            )
            .await
            .unwrap();
        (festival, fort, submission)
    }

    #[tokio::test]
    async fn test_add_submission_is_readable() {
        let catalog = catalog();
        let (_, fort, submission) = submitted(&catalog).await;

        let fetched = catalog
            .get_submission(&fort.meta.entity_id, "user-1")
            .await
            .unwrap();

        assert_eq!(fetched, Some(submission.clone()));
        assert_eq!(submission.review_status, ReviewStatus::Pending);
        assert_eq!(submission.meta.created_by, "user-1");
    }

    #[tokio::test]
    async fn test_resubmission_keeps_identity() {
        let catalog = catalog();
        let (festival, fort, first) = submitted(&catalog).await;
        catalog
            .review_submission(&fort.meta.entity_id, "user-1", ReviewStatus::Approved)
            .await
            .unwrap();

        let second = catalog
            .add_submission(
                &festival.meta.entity_id,
                &fort.meta.entity_id,
                "user-1",
                details("The Lanterns (Live)"),
            )
            .await
            .unwrap();

        assert_eq!(second.meta, first.meta);
        assert_eq!(second.review_status, ReviewStatus::Pending);
        let page = catalog
            .list_submissions(&fort.meta.entity_id, None, 10, None)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].details.name, "The Lanterns (Live)");
    }

    #[tokio::test]
    async fn test_add_submission_requires_open_festival() {
        let catalog = catalog();
        let mut closed = open_festival("Closed");
        closed.end_date_time = Utc::now() - Duration::days(1);
        closed.start_date_time = Utc::now() - Duration::days(5);
        let closed = catalog.add_festival(closed).await.unwrap();
        let fort = catalog
            .add_fort(Fort::new(closed.meta.entity_id.clone(), "admin", "Music", ""))
            .await
            .unwrap();

        let result = catalog
            .add_submission(
                &closed.meta.entity_id,
                &fort.meta.entity_id,
                "user-1",
                details("Late Band"),
            )
            .await;

        assert!(matches!(result, Err(StoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_add_submission_requires_fort() {
        let catalog = catalog();
        let (festival, _) = festival_with_fort(&catalog).await;

        let result = catalog
            .add_submission(&festival.meta.entity_id, "no-fort", "user-1", details("Band"))
            .await;

        assert!(matches!(
            result,
            Err(StoreError::NotFound {
                entity_type: "Fort",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_submitter_with_delimiter_is_rejected() {
        let catalog = catalog();
        let (festival, fort) = festival_with_fort(&catalog).await;

        let result = catalog
            .add_submission(
                &festival.meta.entity_id,
                &fort.meta.entity_id,
                "user#1",
                details("Band"),
            )
            .await;

        assert!(matches!(result, Err(StoreError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_list_submissions_by_creator() {
        let catalog = catalog();
        let (festival, fort, _) = submitted(&catalog).await;
        catalog
            .add_submission(
                &festival.meta.entity_id,
                &fort.meta.entity_id,
                "user-2",
                details("Other Band"),
            )
            .await
            .unwrap();

        let mine = catalog
            .list_submissions(&fort.meta.entity_id, Some("user-2"), 10, None)
            .await
            .unwrap();

        assert_eq!(mine.items.len(), 1);
        assert_eq!(mine.items[0].submitter, "user-2");
    }

    #[tokio::test]
    async fn test_review_missing_submission() {
        let catalog = catalog();
        let result = catalog
            .review_submission("fort-1", "nobody", ReviewStatus::Declined)
            .await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_apply_and_remove_label() {
        let catalog = catalog();
        let (festival, fort, _) = submitted(&catalog).await;
        let label = catalog
            .add_label(Label::new(festival.meta.entity_id.clone(), "admin", "Headliner"))
            .await
            .unwrap();
        let fort_id = fort.meta.entity_id.as_str();
        let label_id = label.meta.entity_id.as_str();

        let labeled = catalog.apply_label(fort_id, "user-1", label_id).await.unwrap();
        assert_eq!(labeled.label_ids, vec![label_id.to_string()]);

        let again = catalog.apply_label(fort_id, "user-1", label_id).await.unwrap();
        assert_eq!(again.label_ids.len(), 1);

        let cleared = catalog.remove_label(fort_id, "user-1", label_id).await.unwrap();
        assert!(cleared.label_ids.is_empty());
        let stored = catalog.get_submission(fort_id, "user-1").await.unwrap().unwrap();
        assert!(stored.label_ids.is_empty());
    }

    #[tokio::test]
    async fn test_apply_label_from_other_festival() {
        let catalog = catalog();
        let (_, fort, _) = submitted(&catalog).await;
        let other = catalog
            .add_festival(open_festival("Other"))
            .await
            .unwrap();
        let label = catalog
            .add_label(Label::new(other.meta.entity_id.clone(), "admin", "Local"))
            .await
            .unwrap();

        let result = catalog
            .apply_label(&fort.meta.entity_id, "user-1", &label.meta.entity_id)
            .await;

        assert!(matches!(result, Err(StoreError::Validation(_))));
    }
}
