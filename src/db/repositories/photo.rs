use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::entities::{photos, prelude::*};
use crate::models::patch::PhotoPatch;

pub struct PhotoRepository {
    conn: DatabaseConnection,
}

pub struct NewPhoto {
    pub id: String,
    pub event_id: String,
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub caption: Option<String>,
    pub approved: bool,
    pub uploaded_by: Option<String>,
    pub guest_token: Option<String>,
    pub file_size: i64,
}

impl PhotoRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, photo: NewPhoto) -> Result<photos::Model> {
        let active = photos::ActiveModel {
            id: Set(photo.id),
            event_id: Set(photo.event_id),
            url: Set(photo.url),
            thumbnail_url: Set(photo.thumbnail_url),
            caption: Set(photo.caption),
            approved: Set(photo.approved),
            uploaded_by: Set(photo.uploaded_by),
            guest_token: Set(photo.guest_token),
            file_size: Set(Some(photo.file_size.to_string())),
            uploaded_at: Set(chrono::Utc::now().to_rfc3339()),
        };

        active.insert(&self.conn).await.context("Failed to insert photo")
    }

    pub async fn get_in_event(
        &self,
        event_id: &str,
        photo_id: &str,
    ) -> Result<Option<photos::Model>> {
        Photos::find_by_id(photo_id)
            .filter(photos::Column::EventId.eq(event_id))
            .one(&self.conn)
            .await
            .context("Failed to query photo")
    }

    pub async fn list_for_event(
        &self,
        event_id: &str,
        approved_only: bool,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<photos::Model>, u64)> {
        let mut query = Photos::find()
            .filter(photos::Column::EventId.eq(event_id))
            .order_by_desc(photos::Column::UploadedAt);

        if approved_only {
            query = query.filter(photos::Column::Approved.eq(true));
        }

        let paginator = query.paginate(&self.conn, page_size);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total))
    }

    pub async fn count_approved(&self, event_id: &str) -> Result<u64> {
        Photos::find()
            .filter(photos::Column::EventId.eq(event_id))
            .filter(photos::Column::Approved.eq(true))
            .count(&self.conn)
            .await
            .context("Failed to count approved photos")
    }

    pub async fn count(&self) -> Result<u64> {
        Photos::find()
            .count(&self.conn)
            .await
            .context("Failed to count photos")
    }

    pub async fn apply_patch(
        &self,
        model: photos::Model,
        patch: PhotoPatch,
    ) -> Result<photos::Model> {
        patch
            .apply(model)
            .update(&self.conn)
            .await
            .context("Failed to update photo")
    }

    pub async fn delete(&self, model: photos::Model) -> Result<()> {
        model
            .delete(&self.conn)
            .await
            .context("Failed to delete photo")?;
        Ok(())
    }

    pub async fn bulk_delete(&self, event_id: &str, photo_ids: &[String]) -> Result<u64> {
        if photo_ids.is_empty() {
            return Ok(0);
        }

        let result = Photos::delete_many()
            .filter(photos::Column::Id.is_in(photo_ids.to_vec()))
            .filter(photos::Column::EventId.eq(event_id))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    pub async fn recent(&self, page: u64, page_size: u64) -> Result<(Vec<photos::Model>, u64)> {
        let paginator = Photos::find()
            .order_by_desc(photos::Column::UploadedAt)
            .paginate(&self.conn, page_size);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total))
    }

    pub async fn all_sizes(&self) -> Result<Vec<Option<String>>> {
        let sizes: Vec<Option<String>> = Photos::find()
            .select_only()
            .column(photos::Column::FileSize)
            .into_tuple()
            .all(&self.conn)
            .await?;

        Ok(sizes)
    }

    /// File-size column for every photo charged to the user, for quota
    /// accounting. One scan, size text returned as stored.
    pub async fn sizes_for_uploader(&self, user_id: &str) -> Result<Vec<Option<String>>> {
        let sizes: Vec<Option<String>> = Photos::find()
            .select_only()
            .column(photos::Column::FileSize)
            .filter(photos::Column::UploadedBy.eq(user_id))
            .into_tuple()
            .all(&self.conn)
            .await?;

        Ok(sizes)
    }
}
