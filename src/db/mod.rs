use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use tracing::info;

use crate::entities::{audit_logs, events, photos, users};
use crate::models::patch::{EventPatch, PhotoPatch, UserPatch};

pub mod migrator;
pub mod repositories;

pub use repositories::event::NewEvent;
pub use repositories::photo::NewPhoto;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    #[must_use]
    pub fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn event_repo(&self) -> repositories::event::EventRepository {
        repositories::event::EventRepository::new(self.conn.clone())
    }

    fn photo_repo(&self) -> repositories::photo::PhotoRepository {
        repositories::photo::PhotoRepository::new(self.conn.clone())
    }

    fn logs_repo(&self) -> repositories::logs::LogRepository {
        repositories::logs::LogRepository::new(self.conn.clone())
    }

    // ========== Users ==========

    pub async fn get_user(&self, id: &str) -> Result<Option<users::Model>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<users::Model>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn patch_user(&self, model: users::Model, patch: UserPatch) -> Result<users::Model> {
        self.user_repo().apply_patch(model, patch).await
    }

    pub async fn set_user_avatar(
        &self,
        model: users::Model,
        url: &str,
        thumbnail_url: Option<&str>,
        size: i64,
    ) -> Result<users::Model> {
        self.user_repo()
            .set_avatar(model, url, thumbnail_url, size)
            .await
    }

    pub async fn set_user_suspended(
        &self,
        id: &str,
        suspended: bool,
    ) -> Result<Option<users::Model>> {
        self.user_repo().set_suspended(id, suspended).await
    }

    pub async fn set_admin_by_email(&self, email: &str, is_admin: bool) -> Result<bool> {
        self.user_repo().set_admin_by_email(email, is_admin).await
    }

    pub async fn list_users(&self, page: u64, page_size: u64) -> Result<(Vec<users::Model>, u64)> {
        self.user_repo().list_page(page, page_size).await
    }

    pub async fn count_users(&self) -> Result<u64> {
        self.user_repo().count().await
    }

    // ========== Events ==========

    pub async fn insert_event(&self, event: NewEvent) -> Result<events::Model> {
        self.event_repo().insert(event).await
    }

    pub async fn get_event(&self, id: &str) -> Result<Option<events::Model>> {
        self.event_repo().get(id).await
    }

    pub async fn get_public_event(&self, id: &str) -> Result<Option<events::Model>> {
        self.event_repo().get_public(id).await
    }

    pub async fn list_events_for_host(
        &self,
        host_id: &str,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<events::Model>, u64)> {
        self.event_repo().list_for_host(host_id, page, page_size).await
    }

    pub async fn list_events(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<events::Model>, u64)> {
        self.event_repo().list_page(page, page_size).await
    }

    pub async fn patch_event(
        &self,
        model: events::Model,
        patch: EventPatch,
    ) -> Result<events::Model> {
        self.event_repo().apply_patch(model, patch).await
    }

    pub async fn set_event_cover(
        &self,
        model: events::Model,
        url: &str,
        thumbnail_url: Option<&str>,
        size: i64,
    ) -> Result<events::Model> {
        self.event_repo()
            .set_cover(model, url, thumbnail_url, size)
            .await
    }

    pub async fn delete_event(&self, model: events::Model) -> Result<()> {
        self.event_repo().delete(model).await
    }

    pub async fn bulk_set_event_status(
        &self,
        host_id: &str,
        event_ids: &[String],
        is_active: Option<bool>,
        is_archived: Option<bool>,
    ) -> Result<u64> {
        self.event_repo()
            .bulk_set_status(host_id, event_ids, is_active, is_archived)
            .await
    }

    pub async fn count_events(&self) -> Result<u64> {
        self.event_repo().count().await
    }

    pub async fn event_counts_for_hosts(
        &self,
        host_ids: &[String],
    ) -> Result<HashMap<String, i64>> {
        self.event_repo().count_for_hosts(host_ids).await
    }

    pub async fn cover_sizes_for_host(&self, host_id: &str) -> Result<Vec<Option<String>>> {
        self.event_repo().cover_sizes_for_host(host_id).await
    }

    // ========== Photos ==========

    pub async fn insert_photo(&self, photo: NewPhoto) -> Result<photos::Model> {
        self.photo_repo().insert(photo).await
    }

    pub async fn get_photo_in_event(
        &self,
        event_id: &str,
        photo_id: &str,
    ) -> Result<Option<photos::Model>> {
        self.photo_repo().get_in_event(event_id, photo_id).await
    }

    pub async fn list_photos_for_event(
        &self,
        event_id: &str,
        approved_only: bool,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<photos::Model>, u64)> {
        self.photo_repo()
            .list_for_event(event_id, approved_only, page, page_size)
            .await
    }

    pub async fn count_approved_photos(&self, event_id: &str) -> Result<u64> {
        self.photo_repo().count_approved(event_id).await
    }

    pub async fn count_photos(&self) -> Result<u64> {
        self.photo_repo().count().await
    }

    pub async fn patch_photo(
        &self,
        model: photos::Model,
        patch: PhotoPatch,
    ) -> Result<photos::Model> {
        self.photo_repo().apply_patch(model, patch).await
    }

    pub async fn delete_photo(&self, model: photos::Model) -> Result<()> {
        self.photo_repo().delete(model).await
    }

    pub async fn bulk_delete_photos(&self, event_id: &str, photo_ids: &[String]) -> Result<u64> {
        self.photo_repo().bulk_delete(event_id, photo_ids).await
    }

    pub async fn recent_photos(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<photos::Model>, u64)> {
        self.photo_repo().recent(page, page_size).await
    }

    pub async fn photo_sizes_for_uploader(&self, user_id: &str) -> Result<Vec<Option<String>>> {
        self.photo_repo().sizes_for_uploader(user_id).await
    }

    pub async fn all_photo_sizes(&self) -> Result<Vec<Option<String>>> {
        self.photo_repo().all_sizes().await
    }

    pub async fn all_cover_sizes(&self) -> Result<Vec<Option<String>>> {
        self.event_repo().all_cover_sizes().await
    }

    pub async fn all_avatar_sizes(&self) -> Result<Vec<Option<String>>> {
        self.user_repo().all_avatar_sizes().await
    }

    // ========== Audit log ==========

    pub async fn add_audit_log(
        &self,
        event_type: &str,
        level: &str,
        message: &str,
        details: Option<String>,
    ) -> Result<()> {
        self.logs_repo().add(event_type, level, message, details).await
    }

    pub async fn get_audit_logs(
        &self,
        page: u64,
        page_size: u64,
        event_type_filter: Option<String>,
    ) -> Result<(Vec<audit_logs::Model>, u64)> {
        self.logs_repo()
            .get_page(page, page_size, event_type_filter)
            .await
    }

    pub async fn prune_audit_logs(&self, older_than_days: i64) -> Result<u64> {
        self.logs_repo().prune(older_than_days).await
    }
}
