use chrono::{DateTime, Utc};

use submit_core::entity::Festival;
use submit_core::storage::{EntityStore, IdentityIndex, Result, StoreError, ROOT_PARTITION};

use super::{require_non_empty, Catalog, Paged};

/// Which festivals a listing keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FestivalFilter {
    /// Keep only festivals flagged active.
    pub active_only: bool,
    /// Keep only festivals accepting submissions at this instant.
    pub open_at: Option<DateTime<Utc>>,
}

impl FestivalFilter {
    /// Festivals accepting submissions right now.
    pub fn open_now() -> Self {
        Self {
            active_only: true,
            open_at: Some(Utc::now()),
        }
    }

    fn keeps(&self, festival: &Festival) -> bool {
        if self.active_only && !festival.is_active {
            return false;
        }
        self.open_at.is_none_or(|now| festival.submissions_open(now))
    }
}

impl<S> Catalog<S>
where
    S: EntityStore + IdentityIndex,
{
    pub async fn add_festival(&self, festival: Festival) -> Result<Festival> {
        require_non_empty("name", &festival.name)?;
        if festival.end_date_time < festival.start_date_time {
            return Err(StoreError::Validation(
                "festival must end after it starts".to_string(),
            ));
        }

        self.save(&festival).await?;
        tracing::info!(
            festival_id = %festival.meta.entity_id,
            name = %festival.name,
            "Added festival"
        );
        Ok(festival)
    }

    /// Lists festivals from the root partition.
    ///
    /// The filter applies within each page, so a page can hold fewer than
    /// `page_size` festivals while a pagination key is still returned.
    pub async fn list_festivals(
        &self,
        filter: FestivalFilter,
        page_size: i64,
        pagination_key: Option<&str>,
    ) -> Result<Paged<Festival>> {
        let mut page = self
            .list::<Festival>(ROOT_PARTITION, page_size, pagination_key)
            .await?;
        page.items.retain(|festival| filter.keeps(festival));
        Ok(page)
    }

    pub async fn get_festival(&self, festival_id: &str) -> Result<Option<Festival>> {
        self.load(ROOT_PARTITION, festival_id).await
    }

    /// Like [`Self::get_festival`], but absence is `NotFound`.
    pub(crate) async fn require_festival(&self, festival_id: &str) -> Result<Festival> {
        self.require(ROOT_PARTITION, festival_id).await
    }

    pub async fn delete_festival(&self, festival_id: &str) -> Result<()> {
        self.delete_typed::<Festival>(festival_id).await
    }
}

#[cfg(all(test, feature = "inmemory"))]
mod tests {
    use chrono::Duration;

    use super::super::test_support::*;
    use super::*;

    #[tokio::test]
    async fn test_add_and_get_festival() {
        let catalog = catalog();
        let festival = catalog
            .add_festival(open_festival("Treefort"))
            .await
            .unwrap();

        let fetched = catalog
            .get_festival(&festival.meta.entity_id)
            .await
            .unwrap();

        assert_eq!(fetched, Some(festival));
    }

    #[tokio::test]
    async fn test_add_festival_validates() {
        let catalog = catalog();

        let unnamed = open_festival("  ");
        assert!(matches!(
            catalog.add_festival(unnamed).await,
            Err(StoreError::Validation(_))
        ));

        let mut backwards = open_festival("Backwards");
        backwards.end_date_time = backwards.start_date_time - Duration::days(1);
        assert!(matches!(
            catalog.add_festival(backwards).await,
            Err(StoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_list_festivals_filters() {
        let catalog = catalog();
        let open = catalog.add_festival(open_festival("Open")).await.unwrap();

        let mut inactive = open_festival("Inactive");
        inactive.is_active = false;
        catalog.add_festival(inactive).await.unwrap();

        let mut past = open_festival("Past");
        past.start_date_time = Utc::now() - Duration::days(60);
        past.end_date_time = Utc::now() - Duration::days(30);
        catalog.add_festival(past).await.unwrap();

        let all = catalog
            .list_festivals(FestivalFilter::default(), 10, None)
            .await
            .unwrap();
        assert_eq!(all.items.len(), 3);

        let active = catalog
            .list_festivals(
                FestivalFilter {
                    active_only: true,
                    open_at: None,
                },
                10,
                None,
            )
            .await
            .unwrap();
        assert_eq!(active.items.len(), 2);

        let accepting = catalog
            .list_festivals(FestivalFilter::open_now(), 10, None)
            .await
            .unwrap();
        assert_eq!(accepting.items, vec![open]);
    }

    #[tokio::test]
    async fn test_list_festivals_rejects_bad_page_size() {
        let catalog = catalog();
        let result = catalog
            .list_festivals(FestivalFilter::default(), 0, None)
            .await;
        assert_eq!(result, Err(StoreError::InvalidPageSize(0)));
    }

    #[tokio::test]
    async fn test_delete_festival() {
        let catalog = catalog();
        let festival = catalog
            .add_festival(open_festival("Treefort"))
            .await
            .unwrap();

        catalog
            .delete_festival(&festival.meta.entity_id)
            .await
            .unwrap();

        assert!(catalog
            .get_festival(&festival.meta.entity_id)
            .await
            .unwrap()
            .is_none());
        assert!(matches!(
            catalog.delete_festival(&festival.meta.entity_id).await,
            Err(StoreError::NotFound { .. })
        ));
    }
}
