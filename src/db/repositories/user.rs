use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::entities::{prelude::*, users};
use crate::models::patch::UserPatch;

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<users::Model>> {
        Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by id")
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<users::Model>> {
        Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")
    }

    /// Recovery lookup after a lost insert race: either key may have won.
    pub async fn get_by_email_or_id(&self, email: &str, id: &str) -> Result<Option<users::Model>> {
        Users::find()
            .filter(
                Condition::any()
                    .add(users::Column::Email.eq(email))
                    .add(users::Column::Id.eq(id)),
            )
            .one(&self.conn)
            .await
            .context("Failed to query user by email or id")
    }

    /// Inserts a fresh user row. Unique-constraint violations are returned
    /// as the raw `DbErr` so the caller can distinguish a lost race from
    /// other storage failures.
    pub async fn insert(
        &self,
        id: &str,
        email: &str,
        name: Option<&str>,
        is_admin: bool,
    ) -> std::result::Result<users::Model, DbErr> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = users::ActiveModel {
            id: Set(id.to_string()),
            email: Set(email.to_string()),
            name: Set(name.map(std::string::ToString::to_string)),
            is_admin: Set(is_admin),
            is_suspended: Set(false),
            avatar_url: Set(None),
            avatar_thumbnail_url: Set(None),
            avatar_size: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        };

        active.insert(&self.conn).await
    }

    pub async fn apply_patch(&self, model: users::Model, patch: UserPatch) -> Result<users::Model> {
        patch
            .apply(model)
            .update(&self.conn)
            .await
            .context("Failed to update user")
    }

    pub async fn set_avatar(
        &self,
        model: users::Model,
        url: &str,
        thumbnail_url: Option<&str>,
        size: i64,
    ) -> Result<users::Model> {
        let mut active: users::ActiveModel = model.into();
        active.avatar_url = Set(Some(url.to_string()));
        active.avatar_thumbnail_url = Set(thumbnail_url.map(std::string::ToString::to_string));
        active.avatar_size = Set(Some(size.to_string()));
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        active.update(&self.conn).await.context("Failed to store avatar")
    }

    pub async fn set_suspended(&self, id: &str, suspended: bool) -> Result<Option<users::Model>> {
        let Some(model) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = model.into();
        active.is_suspended = Set(suspended);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to update suspension flag")?;

        Ok(Some(updated))
    }

    pub async fn set_admin_by_email(&self, email: &str, is_admin: bool) -> Result<bool> {
        let Some(model) = self.get_by_email(email).await? else {
            return Ok(false);
        };

        let mut active: users::ActiveModel = model.into();
        active.is_admin = Set(is_admin);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active
            .update(&self.conn)
            .await
            .context("Failed to update admin flag")?;

        Ok(true)
    }

    pub async fn list_page(&self, page: u64, page_size: u64) -> Result<(Vec<users::Model>, u64)> {
        let paginator = Users::find()
            .order_by_asc(users::Column::CreatedAt)
            .paginate(&self.conn, page_size);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total))
    }

    pub async fn count(&self) -> Result<u64> {
        Users::find()
            .count(&self.conn)
            .await
            .context("Failed to count users")
    }

    pub async fn all_avatar_sizes(&self) -> Result<Vec<Option<String>>> {
        let sizes: Vec<Option<String>> = Users::find()
            .select_only()
            .column(users::Column::AvatarSize)
            .into_tuple()
            .all(&self.conn)
            .await?;

        Ok(sizes)
    }
}
