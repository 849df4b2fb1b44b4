//! Per-account storage accounting.
//!
//! A host's consumed bytes are the sum of three categories: photos charged
//! to them, cover images on events they own, and their own avatar. Size
//! columns are text because the upload pipeline has recorded them
//! inconsistently over time; a row that cannot be parsed contributes zero
//! rather than failing the whole computation.

use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;

use crate::db::Store;

#[derive(Clone)]
pub struct QuotaService {
    store: Store,
}

impl QuotaService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Total bytes currently charged to the account.
    ///
    /// One column scan per category, summed in process. Read-only; callers
    /// on the upload path compare the result plus the incoming size against
    /// the configured ceiling. The window between this read and the
    /// subsequent insert is not atomic — a concurrent upload can slip past
    /// the ceiling by one file, which is accepted.
    pub async fn total_upload_bytes(&self, user_id: &str) -> Result<i64> {
        let photo_bytes: i64 = self
            .store
            .photo_sizes_for_uploader(user_id)
            .await?
            .iter()
            .map(|raw| coerce_size(raw.as_deref()))
            .sum();

        let cover_bytes: i64 = self
            .store
            .cover_sizes_for_host(user_id)
            .await?
            .iter()
            .map(|raw| coerce_size(raw.as_deref()))
            .sum();

        let avatar_bytes = self
            .store
            .get_user(user_id)
            .await?
            .map_or(0, |user| coerce_size(user.avatar_size.as_deref()));

        Ok(photo_bytes + cover_bytes + avatar_bytes)
    }

    /// System-wide storage total across every account, for the admin
    /// overview. Same coercion rules as the per-user sum.
    pub async fn total_storage_bytes(&self) -> Result<i64> {
        let photos: i64 = self
            .store
            .all_photo_sizes()
            .await?
            .iter()
            .map(|raw| coerce_size(raw.as_deref()))
            .sum();

        let covers: i64 = self
            .store
            .all_cover_sizes()
            .await?
            .iter()
            .map(|raw| coerce_size(raw.as_deref()))
            .sum();

        let avatars: i64 = self
            .store
            .all_avatar_sizes()
            .await?
            .iter()
            .map(|raw| coerce_size(raw.as_deref()))
            .sum();

        Ok(photos + covers + avatars)
    }

    /// Whether accepting `incoming_bytes` would push the account past
    /// `ceiling`. Returns the pre-upload total alongside the verdict so
    /// callers can report it.
    pub async fn would_exceed(
        &self,
        user_id: &str,
        incoming_bytes: i64,
        ceiling: i64,
    ) -> Result<(bool, i64)> {
        let current = self.total_upload_bytes(user_id).await?;
        Ok((current + incoming_bytes > ceiling, current))
    }
}

/// Coerces a stored size value to bytes, degrading anything unparseable to 0.
///
/// Most rows hold a plain byte count. Older rows carry unit-suffixed strings
/// ("1.5 MB", "200 KiB"); those are tolerated rather than migrated.
#[must_use]
pub fn coerce_size(raw: Option<&str>) -> i64 {
    let Some(raw) = raw else { return 0 };
    let trimmed = raw.trim();

    if let Ok(bytes) = trimmed.parse::<i64>() {
        return bytes.max(0);
    }

    parse_unit_size(trimmed).unwrap_or(0)
}

fn parse_unit_size(size_str: &str) -> Option<i64> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE
        .get_or_init(|| Regex::new(r"(?i)^(\d+(?:\.\d+)?)\s*([KMGT]i?B|B)$").expect("Invalid regex"));

    let caps = re.captures(size_str)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    let unit = caps.get(2)?.as_str().to_uppercase();

    let bytes = match unit.as_str() {
        "B" => value,
        "KIB" => value * 1024.0,
        "MIB" => value * 1024.0 * 1024.0,
        "GIB" => value * 1024.0 * 1024.0 * 1024.0,
        "TIB" => value * 1024.0 * 1024.0 * 1024.0 * 1024.0,
        "KB" => value * 1000.0,
        "MB" => value * 1000.0 * 1000.0,
        "GB" => value * 1000.0 * 1000.0 * 1000.0,
        "TB" => value * 1000.0 * 1000.0 * 1000.0 * 1000.0,
        _ => return None,
    };

    if bytes < 0.0 {
        return None;
    }

    #[allow(clippy::cast_possible_truncation)]
    Some(bytes as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewEvent, NewPhoto, Store};

    #[test]
    fn coerces_plain_and_suffixed_sizes() {
        assert_eq!(coerce_size(Some("1024")), 1024);
        assert_eq!(coerce_size(Some(" 2048 ")), 2048);
        assert_eq!(coerce_size(Some("1.5 MB")), 1_500_000);
        assert_eq!(coerce_size(Some("200 KiB")), 204_800);
        assert_eq!(coerce_size(Some("bad")), 0);
        assert_eq!(coerce_size(Some("")), 0);
        assert_eq!(coerce_size(Some("-500")), 0);
        assert_eq!(coerce_size(None), 0);
    }

    async fn seed_host(store: &Store, id: &str) {
        store
            .user_repo()
            .insert(id, &format!("{id}@example.com"), None, false)
            .await
            .unwrap();
    }

    async fn seed_event(store: &Store, id: &str, host_id: &str) {
        store
            .insert_event(NewEvent {
                id: id.to_string(),
                host_id: host_id.to_string(),
                name: "Wedding".to_string(),
                description: None,
                date: None,
                password_hash: None,
            })
            .await
            .unwrap();
    }

    async fn seed_photo(store: &Store, id: &str, event_id: &str, uploader: &str, size: &str) {
        let photo = store
            .insert_photo(NewPhoto {
                id: id.to_string(),
                event_id: event_id.to_string(),
                url: format!("https://cdn.example.com/{id}.jpg"),
                thumbnail_url: None,
                caption: None,
                approved: false,
                uploaded_by: Some(uploader.to_string()),
                guest_token: None,
                file_size: 0,
            })
            .await
            .unwrap();

        // Overwrite the size column with the raw legacy encoding under test.
        use sea_orm::{ActiveModelTrait, Set};
        let mut active: crate::entities::photos::ActiveModel = photo.into();
        active.file_size = Set(Some(size.to_string()));
        active.update(&store.conn).await.unwrap();
    }

    #[tokio::test]
    async fn empty_account_totals_zero() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        seed_host(&store, "host-1").await;

        let quota = QuotaService::new(store);
        assert_eq!(quota.total_upload_bytes("host-1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unknown_user_totals_zero() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let quota = QuotaService::new(store);
        assert_eq!(quota.total_upload_bytes("nobody").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn corrupt_rows_contribute_zero() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        seed_host(&store, "host-1").await;
        seed_event(&store, "ev-1", "host-1").await;
        seed_photo(&store, "p1", "ev-1", "host-1", "1024").await;
        seed_photo(&store, "p2", "ev-1", "host-1", "bad").await;
        seed_photo(&store, "p3", "ev-1", "host-1", "2048").await;

        let quota = QuotaService::new(store);
        assert_eq!(quota.total_upload_bytes("host-1").await.unwrap(), 3072);
    }

    #[tokio::test]
    async fn sums_photos_covers_and_avatar() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        seed_host(&store, "host-1").await;
        seed_event(&store, "ev-1", "host-1").await;
        seed_photo(&store, "p1", "ev-1", "host-1", "500000").await;

        let event = store.get_event("ev-1").await.unwrap().unwrap();
        store
            .set_event_cover(event, "https://cdn.example.com/cover.jpg", None, 250_000)
            .await
            .unwrap();

        let user = store.get_user("host-1").await.unwrap().unwrap();
        store
            .set_user_avatar(user, "https://cdn.example.com/avatar.jpg", None, 100_000)
            .await
            .unwrap();

        let quota = QuotaService::new(store);
        assert_eq!(
            quota.total_upload_bytes("host-1").await.unwrap(),
            850_000
        );
    }

    #[tokio::test]
    async fn other_accounts_are_not_charged() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        seed_host(&store, "host-1").await;
        seed_host(&store, "host-2").await;
        seed_event(&store, "ev-1", "host-1").await;
        seed_photo(&store, "p1", "ev-1", "host-1", "4096").await;

        let quota = QuotaService::new(store);
        assert_eq!(quota.total_upload_bytes("host-2").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn ceiling_check_reports_pre_upload_total() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        seed_host(&store, "host-1").await;
        seed_event(&store, "ev-1", "host-1").await;
        seed_photo(&store, "p1", "ev-1", "host-1", "999999000").await;

        let quota = QuotaService::new(store);
        let (exceeds, current) = quota
            .would_exceed("host-1", 2000, 1_000_000_000)
            .await
            .unwrap();

        assert!(exceeds);
        assert_eq!(current, 999_999_000);

        let (exceeds, _) = quota
            .would_exceed("host-1", 1000, 1_000_000_000)
            .await
            .unwrap();
        assert!(!exceeds);
    }
}
