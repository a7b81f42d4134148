use submit_core::entity::Fort;
use submit_core::storage::{EntityStore, IdentityIndex, Result};

use super::{require_non_empty, Catalog, Paged};

impl<S> Catalog<S>
where
    S: EntityStore + IdentityIndex,
{
    /// Stores a fort under its festival. The festival must exist.
    pub async fn add_fort(&self, fort: Fort) -> Result<Fort> {
        require_non_empty("name", &fort.name)?;
        self.require_festival(&fort.festival_id).await?;

        self.save(&fort).await?;
        tracing::info!(
            festival_id = %fort.festival_id,
            fort_id = %fort.meta.entity_id,
            "Added fort"
        );
        Ok(fort)
    }

    pub async fn list_forts(
        &self,
        festival_id: &str,
        page_size: i64,
        pagination_key: Option<&str>,
    ) -> Result<Paged<Fort>> {
        self.list(festival_id, page_size, pagination_key).await
    }

    pub async fn get_fort(&self, festival_id: &str, fort_id: &str) -> Result<Option<Fort>> {
        self.load(festival_id, fort_id).await
    }

    pub async fn delete_fort(&self, fort_id: &str) -> Result<()> {
        self.delete_typed::<Fort>(fort_id).await
    }
}

#[cfg(all(test, feature = "inmemory"))]
mod tests {
    use submit_core::storage::StoreError;

    use super::super::test_support::*;
    use super::*;

    #[tokio::test]
    async fn test_add_fort_requires_festival() {
        let catalog = catalog();
        let result = catalog
            .add_fort(Fort::new("missing-festival", "admin", "Music", ""))
            .await;

        assert!(matches!(
            result,
            Err(StoreError::NotFound {
                entity_type: "Festival",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_list_forts_pages_with_token() {
        let catalog = catalog();
        let (festival, _) = festival_with_fort(&catalog).await;
        let festival_id = festival.meta.entity_id.clone();
        for name in ["Comedy", "Film", "Food", "Skate"] {
            catalog
                .add_fort(Fort::new(festival_id.clone(), "admin", name, ""))
                .await
                .unwrap();
        }

        let first = catalog.list_forts(&festival_id, 3, None).await.unwrap();
        assert_eq!(first.items.len(), 3);
        let token = first.pagination_key.expect("more forts remain");

        let second = catalog
            .list_forts(&festival_id, 3, Some(&token))
            .await
            .unwrap();
        assert_eq!(second.items.len(), 2);
        assert!(second.pagination_key.is_none());
    }

    #[tokio::test]
    async fn test_list_forts_rejects_garbage_token() {
        let catalog = catalog();
        let (festival, _) = festival_with_fort(&catalog).await;

        let result = catalog
            .list_forts(&festival.meta.entity_id, 3, Some("not a token!"))
            .await;

        assert!(matches!(result, Err(StoreError::InvalidCursor(_))));
    }

    #[tokio::test]
    async fn test_delete_fort_rejects_other_kinds() {
        let catalog = catalog();
        let (festival, _) = festival_with_fort(&catalog).await;

        let result = catalog.delete_fort(&festival.meta.entity_id).await;

        assert!(matches!(
            result,
            Err(StoreError::NotFound {
                entity_type: "Fort",
                ..
            })
        ));
        assert!(catalog
            .get_festival(&festival.meta.entity_id)
            .await
            .unwrap()
            .is_some());
    }
}
