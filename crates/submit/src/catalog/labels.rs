use submit_core::entity::Label;
use submit_core::storage::{EntityStore, IdentityIndex, Result};

use super::{require_non_empty, Catalog, Paged};

impl<S> Catalog<S>
where
    S: EntityStore + IdentityIndex,
{
    /// Stores a label under its festival. The festival must exist.
    pub async fn add_label(&self, label: Label) -> Result<Label> {
        require_non_empty("name", &label.name)?;
        self.require_festival(&label.festival_id).await?;

        self.save(&label).await?;
        tracing::info!(
            festival_id = %label.festival_id,
            label_id = %label.meta.entity_id,
            "Added label"
        );
        Ok(label)
    }

    pub async fn list_labels(
        &self,
        festival_id: &str,
        page_size: i64,
        pagination_key: Option<&str>,
    ) -> Result<Paged<Label>> {
        self.list(festival_id, page_size, pagination_key).await
    }

    pub async fn get_label(&self, label_id: &str) -> Result<Label> {
        Ok(self.resolve::<Label>(label_id).await?.0)
    }

    /// Deletes a label by id.
    ///
    /// Submissions that carry the label keep its id until the label is
    /// removed from them.
    pub async fn delete_label(&self, label_id: &str) -> Result<()> {
        self.delete_typed::<Label>(label_id).await
    }
}
