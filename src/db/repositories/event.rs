use std::collections::HashMap;

use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::entities::{events, prelude::*};
use crate::models::patch::EventPatch;

pub struct EventRepository {
    conn: DatabaseConnection,
}

pub struct NewEvent {
    pub id: String,
    pub host_id: String,
    pub name: String,
    pub description: Option<String>,
    pub date: Option<String>,
    pub password_hash: Option<String>,
}

impl EventRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, event: NewEvent) -> Result<events::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = events::ActiveModel {
            id: Set(event.id),
            host_id: Set(event.host_id),
            name: Set(event.name),
            description: Set(event.description),
            date: Set(event.date),
            password_hash: Set(event.password_hash),
            cover_image_url: Set(None),
            cover_thumbnail_url: Set(None),
            cover_size: Set(None),
            is_active: Set(true),
            is_archived: Set(false),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        };

        active.insert(&self.conn).await.context("Failed to insert event")
    }

    pub async fn get(&self, id: &str) -> Result<Option<events::Model>> {
        Events::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query event")
    }

    /// Publicly reachable events only: active and not archived.
    pub async fn get_public(&self, id: &str) -> Result<Option<events::Model>> {
        Events::find_by_id(id)
            .filter(events::Column::IsActive.eq(true))
            .filter(events::Column::IsArchived.eq(false))
            .one(&self.conn)
            .await
            .context("Failed to query public event")
    }

    pub async fn list_for_host(
        &self,
        host_id: &str,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<events::Model>, u64)> {
        let paginator = Events::find()
            .filter(events::Column::HostId.eq(host_id))
            .order_by_desc(events::Column::CreatedAt)
            .paginate(&self.conn, page_size);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total))
    }

    pub async fn list_page(&self, page: u64, page_size: u64) -> Result<(Vec<events::Model>, u64)> {
        let paginator = Events::find()
            .order_by_desc(events::Column::CreatedAt)
            .paginate(&self.conn, page_size);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total))
    }

    pub async fn apply_patch(
        &self,
        model: events::Model,
        patch: EventPatch,
    ) -> Result<events::Model> {
        patch
            .apply(model)
            .update(&self.conn)
            .await
            .context("Failed to update event")
    }

    pub async fn set_cover(
        &self,
        model: events::Model,
        url: &str,
        thumbnail_url: Option<&str>,
        size: i64,
    ) -> Result<events::Model> {
        let mut active: events::ActiveModel = model.into();
        active.cover_image_url = Set(Some(url.to_string()));
        active.cover_thumbnail_url = Set(thumbnail_url.map(std::string::ToString::to_string));
        active.cover_size = Set(Some(size.to_string()));
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        active.update(&self.conn).await.context("Failed to store cover image")
    }

    pub async fn delete(&self, model: events::Model) -> Result<()> {
        model
            .delete(&self.conn)
            .await
            .context("Failed to delete event")?;
        Ok(())
    }

    /// Flips status flags on every listed event owned by `host_id`. Events
    /// belonging to other hosts are silently skipped. Returns the number of
    /// rows updated.
    pub async fn bulk_set_status(
        &self,
        host_id: &str,
        event_ids: &[String],
        is_active: Option<bool>,
        is_archived: Option<bool>,
    ) -> Result<u64> {
        if event_ids.is_empty() {
            return Ok(0);
        }

        let mut update = Events::update_many()
            .filter(events::Column::Id.is_in(event_ids.to_vec()))
            .filter(events::Column::HostId.eq(host_id));

        if let Some(active) = is_active {
            update = update.col_expr(
                events::Column::IsActive,
                sea_orm::sea_query::Expr::value(active),
            );
        }
        if let Some(archived) = is_archived {
            update = update.col_expr(
                events::Column::IsArchived,
                sea_orm::sea_query::Expr::value(archived),
            );
        }

        let result = update
            .col_expr(
                events::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    pub async fn count(&self) -> Result<u64> {
        Events::find()
            .count(&self.conn)
            .await
            .context("Failed to count events")
    }

    pub async fn count_for_hosts(&self, host_ids: &[String]) -> Result<HashMap<String, i64>> {
        if host_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let results: Vec<(String, i64)> = Events::find()
            .select_only()
            .column(events::Column::HostId)
            .column_as(events::Column::Id.count(), "count")
            .filter(events::Column::HostId.is_in(host_ids.to_vec()))
            .group_by(events::Column::HostId)
            .into_tuple()
            .all(&self.conn)
            .await?;

        Ok(results.into_iter().collect())
    }

    pub async fn all_cover_sizes(&self) -> Result<Vec<Option<String>>> {
        let sizes: Vec<Option<String>> = Events::find()
            .select_only()
            .column(events::Column::CoverSize)
            .into_tuple()
            .all(&self.conn)
            .await?;

        Ok(sizes)
    }

    /// Cover-size column for every event owned by the host, for quota
    /// accounting. One scan, size text returned as stored.
    pub async fn cover_sizes_for_host(&self, host_id: &str) -> Result<Vec<Option<String>>> {
        let sizes: Vec<Option<String>> = Events::find()
            .select_only()
            .column(events::Column::CoverSize)
            .filter(events::Column::HostId.eq(host_id))
            .into_tuple()
            .all(&self.conn)
            .await?;

        Ok(sizes)
    }
}
