//! Host moderation of event photos.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::events::verify_event_ownership;
use super::{
    ApiError, ApiResponse, AppState, BulkDeleteRequest, MessageResponse, Paginated, Pagination,
    PhotoDto, UpdatePhotoRequest,
};
use crate::api::validation::{validate_caption, validate_pagination};
use crate::models::patch::PhotoPatch;
use crate::services::MediaClient;

/// GET /events/{id}/photos
/// The host sees every photo, approved or not.
pub async fn list_photos(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(event_id): Path<String>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ApiResponse<Paginated<PhotoDto>>>, ApiError> {
    let (page, page_size) = validate_pagination(pagination.page, pagination.page_size)?;
    verify_event_ownership(&state, &event_id, &current.user.id).await?;

    let (items, total) = state
        .shared
        .store
        .list_photos_for_event(&event_id, false, page, page_size)
        .await?;

    let photos = items.into_iter().map(PhotoDto::from).collect();
    Ok(Json(ApiResponse::success(Paginated::new(
        photos, total, page, page_size,
    ))))
}

/// PATCH /events/{id}/photos/{photo_id}
/// Caption edits and approval flips.
pub async fn update_photo(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path((event_id, photo_id)): Path<(String, String)>,
    Json(payload): Json<UpdatePhotoRequest>,
) -> Result<Json<ApiResponse<PhotoDto>>, ApiError> {
    verify_event_ownership(&state, &event_id, &current.user.id).await?;

    if let Some(caption) = payload.caption.as_deref() {
        validate_caption(caption)?;
    }

    let photo = state
        .shared
        .store
        .get_photo_in_event(&event_id, &photo_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Photo", &photo_id))?;

    let approved_change = payload.approved;
    let patch = PhotoPatch {
        caption: payload.caption,
        approved: payload.approved,
    };

    let photo = if patch.is_empty() {
        photo
    } else {
        state.shared.store.patch_photo(photo, patch).await?
    };

    if let Some(approved) = approved_change {
        let verb = if approved { "approved" } else { "unapproved" };
        state
            .shared
            .audit
            .record(
                "photo.moderate",
                &format!("Photo {photo_id} {verb} in event {event_id}"),
                None,
            )
            .await;
    }

    Ok(Json(ApiResponse::success(PhotoDto::from(photo))))
}

/// DELETE /events/{id}/photos/{photo_id}
pub async fn delete_photo(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path((event_id, photo_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    verify_event_ownership(&state, &event_id, &current.user.id).await?;

    let photo = state
        .shared
        .store
        .get_photo_in_event(&event_id, &photo_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Photo", &photo_id))?;

    let url = photo.url.clone();
    state.shared.store.delete_photo(photo).await?;

    let media = state.shared.media.clone();
    tokio::spawn(async move {
        if let Some(id) = MediaClient::public_id_from_url(&url) {
            media.delete_image(id).await;
        }
    });

    state
        .shared
        .audit
        .record(
            "photo.delete",
            &format!("Photo {photo_id} deleted from event {event_id}"),
            None,
        )
        .await;

    Ok(Json(ApiResponse::success(MessageResponse::new(format!(
        "Photo '{photo_id}' deleted from event '{event_id}'"
    )))))
}

/// POST /events/{id}/photos/bulk-delete
pub async fn bulk_delete_photos(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(event_id): Path<String>,
    Json(payload): Json<BulkDeleteRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    verify_event_ownership(&state, &event_id, &current.user.id).await?;

    if payload.photo_ids.is_empty() {
        return Err(ApiError::validation("photo_ids cannot be empty"));
    }

    let deleted = state
        .shared
        .store
        .bulk_delete_photos(&event_id, &payload.photo_ids)
        .await?;

    state
        .shared
        .audit
        .record(
            "photo.bulk_delete",
            &format!("{deleted} photo(s) deleted from event {event_id}"),
            Some(payload.photo_ids.join(",")),
        )
        .await;

    Ok(Json(ApiResponse::success(MessageResponse::new(format!(
        "Deleted {deleted} photo(s) from event '{event_id}'"
    )))))
}
