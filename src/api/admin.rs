//! Admin surface: system totals, user/event inspection, suspension, force
//! deletes, the recent-upload feed, and the audit trail.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{
    AdminEventDto, AdminUserDto, ApiError, ApiResponse, AppState, AuditLogDto, EventDto,
    EventStatusRequest, MessageResponse, OverviewStats, Paginated, Pagination, PhotoDto,
    RecentUploadDto, UserDto, UserStatusRequest,
};
use crate::api::validation::validate_pagination;
use crate::models::patch::EventPatch;

/// GET /admin/overview
pub async fn get_overview(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<OverviewStats>>, ApiError> {
    let store = &state.shared.store;

    let total_users = store.count_users().await?;
    let total_events = store.count_events().await?;
    let total_photos = store.count_photos().await?;
    let total_storage_bytes = state.shared.quota.total_storage_bytes().await?;

    Ok(Json(ApiResponse::success(OverviewStats {
        total_users,
        total_events,
        total_photos,
        total_storage_bytes,
    })))
}

/// GET /admin/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ApiResponse<Paginated<AdminUserDto>>>, ApiError> {
    let (page, page_size) = validate_pagination(pagination.page, pagination.page_size)?;

    let (items, total) = state.shared.store.list_users(page, page_size).await?;

    let host_ids: Vec<String> = items.iter().map(|u| u.id.clone()).collect();
    let counts = state.shared.store.event_counts_for_hosts(&host_ids).await?;

    let users = items
        .into_iter()
        .map(|model| {
            let event_count = counts.get(&model.id).copied().unwrap_or(0);
            AdminUserDto {
                user: UserDto::from_model(model, false),
                event_count,
            }
        })
        .collect();

    Ok(Json(ApiResponse::success(Paginated::new(
        users, total, page, page_size,
    ))))
}

/// GET /admin/users/{id}
pub async fn inspect_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<AdminUserDto>>, ApiError> {
    let user = state
        .shared
        .store
        .get_user(&user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", &user_id))?;

    let counts = state
        .shared
        .store
        .event_counts_for_hosts(&[user.id.clone()])
        .await?;
    let event_count = counts.get(&user.id).copied().unwrap_or(0);

    Ok(Json(ApiResponse::success(AdminUserDto {
        user: UserDto::from_model(user, false),
        event_count,
    })))
}

/// PATCH /admin/users/{id}/status
pub async fn update_user_status(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<CurrentUser>,
    Path(user_id): Path<String>,
    Json(payload): Json<UserStatusRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    if admin.user.id == user_id {
        return Err(ApiError::validation("Admins cannot suspend themselves"));
    }

    let user = state
        .shared
        .store
        .set_user_suspended(&user_id, payload.is_suspended)
        .await?
        .ok_or_else(|| ApiError::not_found("User", &user_id))?;

    let verb = if payload.is_suspended {
        "suspended"
    } else {
        "reactivated"
    };
    state
        .shared
        .audit
        .record_warn(
            "admin.user_status",
            &format!("User {user_id} {verb} by admin {}", admin.user.id),
            None,
        )
        .await;

    Ok(Json(ApiResponse::success(UserDto::from_model(user, false))))
}

/// GET /admin/events
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ApiResponse<Paginated<AdminEventDto>>>, ApiError> {
    let (page, page_size) = validate_pagination(pagination.page, pagination.page_size)?;

    let (items, total) = state.shared.store.list_events(page, page_size).await?;

    let mut events = Vec::with_capacity(items.len());
    for event in items {
        let host_email = state
            .shared
            .store
            .get_user(&event.host_id)
            .await?
            .map(|u| u.email);
        let photo_count = state.shared.store.count_approved_photos(&event.id).await?;
        events.push(AdminEventDto {
            event: EventDto::from_model(event, photo_count),
            host_email,
        });
    }

    Ok(Json(ApiResponse::success(Paginated::new(
        events, total, page, page_size,
    ))))
}

/// GET /admin/events/{id}
pub async fn inspect_event(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
) -> Result<Json<ApiResponse<AdminEventDto>>, ApiError> {
    let event = state
        .shared
        .store
        .get_event(&event_id)
        .await?
        .ok_or_else(|| ApiError::event_not_found(&event_id))?;

    let host_email = state
        .shared
        .store
        .get_user(&event.host_id)
        .await?
        .map(|u| u.email);
    let photo_count = state.shared.store.count_approved_photos(&event.id).await?;

    Ok(Json(ApiResponse::success(AdminEventDto {
        event: EventDto::from_model(event, photo_count),
        host_email,
    })))
}

/// PATCH /admin/events/{id}/status
/// Admin override of the active/archived flags, regardless of host.
pub async fn update_event_status(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<CurrentUser>,
    Path(event_id): Path<String>,
    Json(payload): Json<EventStatusRequest>,
) -> Result<Json<ApiResponse<EventDto>>, ApiError> {
    let event = state
        .shared
        .store
        .get_event(&event_id)
        .await?
        .ok_or_else(|| ApiError::event_not_found(&event_id))?;

    let patch = EventPatch {
        is_active: payload.is_active,
        is_archived: payload.is_archived,
        ..Default::default()
    };

    let event = if patch.is_empty() {
        event
    } else {
        state.shared.store.patch_event(event, patch).await?
    };

    state
        .shared
        .audit
        .record_warn(
            "admin.event_status",
            &format!("Event {event_id} status changed by admin {}", admin.user.id),
            None,
        )
        .await;

    let photo_count = state.shared.store.count_approved_photos(&event.id).await?;
    Ok(Json(ApiResponse::success(EventDto::from_model(
        event,
        photo_count,
    ))))
}

/// DELETE /admin/events/{id}
pub async fn force_delete_event(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<CurrentUser>,
    Path(event_id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let event = state
        .shared
        .store
        .get_event(&event_id)
        .await?
        .ok_or_else(|| ApiError::event_not_found(&event_id))?;

    state.shared.store.delete_event(event).await?;

    state
        .shared
        .audit
        .record_warn(
            "admin.event_delete",
            &format!("Event {event_id} force-deleted by admin {}", admin.user.id),
            None,
        )
        .await;

    Ok(Json(ApiResponse::success(MessageResponse::new(format!(
        "Event '{event_id}' has been force-deleted"
    )))))
}

/// GET /admin/uploads/recent
pub async fn recent_uploads(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ApiResponse<Paginated<RecentUploadDto>>>, ApiError> {
    let (page, page_size) = validate_pagination(pagination.page, pagination.page_size)?;

    let (items, total) = state.shared.store.recent_photos(page, page_size).await?;

    let mut uploads = Vec::with_capacity(items.len());
    for photo in items {
        let event = state.shared.store.get_event(&photo.event_id).await?;
        let host_email = match &event {
            Some(event) => state
                .shared
                .store
                .get_user(&event.host_id)
                .await?
                .map(|u| u.email),
            None => None,
        };

        uploads.push(RecentUploadDto {
            photo: PhotoDto::from(photo),
            event_name: event.map(|e| e.name),
            host_email,
        });
    }

    Ok(Json(ApiResponse::success(Paginated::new(
        uploads, total, page, page_size,
    ))))
}

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub event_type: Option<String>,
}

/// GET /admin/logs
pub async fn get_logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<ApiResponse<Paginated<AuditLogDto>>>, ApiError> {
    let (page, page_size) =
        validate_pagination(query.page.unwrap_or(1), query.page_size.unwrap_or(20))?;

    let (items, total) = state
        .shared
        .store
        .get_audit_logs(page, page_size, query.event_type)
        .await?;

    let logs = items.into_iter().map(AuditLogDto::from).collect();
    Ok(Json(ApiResponse::success(Paginated::new(
        logs, total, page, page_size,
    ))))
}
