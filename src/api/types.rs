use serde::{Deserialize, Serialize};

use crate::entities::{audit_logs, events, photos, users};
use crate::services::quota::coerce_size;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

const fn default_page() -> u64 {
    1
}

const fn default_page_size() -> u64 {
    20
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub has_more: bool,
}

impl<T> Paginated<T> {
    #[must_use]
    pub fn new(items: Vec<T>, total: u64, page: u64, page_size: u64) -> Self {
        let has_more = page.saturating_mul(page_size) < total;
        Self {
            items,
            total,
            page,
            page_size,
            has_more,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub email_verified: bool,
    pub is_admin: bool,
    pub is_suspended: bool,
    pub avatar_url: Option<String>,
    pub avatar_thumbnail_url: Option<String>,
    pub created_at: String,
}

impl UserDto {
    #[must_use]
    pub fn from_model(model: users::Model, email_verified: bool) -> Self {
        Self {
            id: model.id,
            email: model.email,
            name: model.name,
            email_verified,
            is_admin: model.is_admin,
            is_suspended: model.is_suspended,
            avatar_url: model.avatar_url,
            avatar_thumbnail_url: model.avatar_thumbnail_url,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileDto {
    #[serde(flatten)]
    pub user: UserDto,
    pub upload_bytes_used: i64,
    pub upload_bytes_limit: i64,
}

#[derive(Debug, Serialize)]
pub struct SessionDto {
    pub token: String,
    pub user: UserDto,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
}

// ============================================================================
// Events
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub name: String,
    pub description: Option<String>,
    pub date: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEventRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    /// Empty string clears the access password.
    pub password: Option<String>,
    pub is_active: Option<bool>,
    pub is_archived: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct EventDto {
    pub id: String,
    pub host_id: String,
    pub name: String,
    pub description: Option<String>,
    pub date: Option<String>,
    pub has_password: bool,
    pub cover_image_url: Option<String>,
    pub cover_thumbnail_url: Option<String>,
    pub is_active: bool,
    pub is_archived: bool,
    pub photo_count: u64,
    pub share_path: String,
    pub created_at: String,
    pub updated_at: String,
}

impl EventDto {
    #[must_use]
    pub fn from_model(model: events::Model, photo_count: u64) -> Self {
        let share_path = format!("/api/public/events/{}", model.id);
        Self {
            id: model.id,
            host_id: model.host_id,
            name: model.name,
            description: model.description,
            date: model.date,
            has_password: model.password_hash.is_some(),
            cover_image_url: model.cover_image_url,
            cover_thumbnail_url: model.cover_thumbnail_url,
            is_active: model.is_active,
            is_archived: model.is_archived,
            photo_count,
            share_path,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Trimmed event card for unauthenticated visitors.
#[derive(Debug, Serialize)]
pub struct PublicEventDto {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub date: Option<String>,
    pub cover_image_url: Option<String>,
    pub has_password: bool,
    pub photo_count: u64,
    pub is_active: bool,
}

impl PublicEventDto {
    #[must_use]
    pub fn from_model(model: events::Model, photo_count: u64) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            date: model.date,
            cover_image_url: model.cover_image_url,
            has_password: model.password_hash.is_some(),
            photo_count,
            is_active: model.is_active,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BulkEventActionRequest {
    pub action: String,
    pub event_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyPasswordRequest {
    pub password: String,
}

// ============================================================================
// Photos
// ============================================================================

#[derive(Debug, Serialize)]
pub struct PhotoDto {
    pub id: String,
    pub event_id: String,
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub caption: Option<String>,
    pub approved: bool,
    pub uploaded_by: Option<String>,
    pub guest_token: Option<String>,
    pub file_size: i64,
    pub uploaded_at: String,
}

impl From<photos::Model> for PhotoDto {
    fn from(model: photos::Model) -> Self {
        let file_size = coerce_size(model.file_size.as_deref());
        Self {
            id: model.id,
            event_id: model.event_id,
            url: model.url,
            thumbnail_url: model.thumbnail_url,
            caption: model.caption,
            approved: model.approved,
            uploaded_by: model.uploaded_by,
            guest_token: model.guest_token,
            file_size,
            uploaded_at: model.uploaded_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdatePhotoRequest {
    pub caption: Option<String>,
    pub approved: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    pub photo_ids: Vec<String>,
}

// ============================================================================
// Admin
// ============================================================================

#[derive(Debug, Serialize)]
pub struct OverviewStats {
    pub total_users: u64,
    pub total_events: u64,
    pub total_photos: u64,
    pub total_storage_bytes: i64,
}

#[derive(Debug, Serialize)]
pub struct AdminUserDto {
    #[serde(flatten)]
    pub user: UserDto,
    pub event_count: i64,
}

#[derive(Debug, Serialize)]
pub struct AdminEventDto {
    #[serde(flatten)]
    pub event: EventDto,
    pub host_email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserStatusRequest {
    pub is_suspended: bool,
}

#[derive(Debug, Deserialize)]
pub struct EventStatusRequest {
    pub is_active: Option<bool>,
    pub is_archived: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct RecentUploadDto {
    #[serde(flatten)]
    pub photo: PhotoDto,
    pub event_name: Option<String>,
    pub host_email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuditLogDto {
    pub id: i32,
    pub event_type: String,
    pub level: String,
    pub message: String,
    pub details: Option<String>,
    pub created_at: String,
}

impl From<audit_logs::Model> for AuditLogDto {
    fn from(model: audit_logs::Model) -> Self {
        Self {
            id: model.id,
            event_type: model.event_type,
            level: model.level,
            message: model.message,
            details: model.details,
            created_at: model.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_more_tracks_page_window() {
        let page: Paginated<u8> = Paginated::new(vec![1, 2], 5, 1, 2);
        assert!(page.has_more);

        let page: Paginated<u8> = Paginated::new(vec![5], 5, 3, 2);
        assert!(!page.has_more);

        let page: Paginated<u8> = Paginated::new(vec![], 0, 1, 20);
        assert!(!page.has_more);
    }
}
