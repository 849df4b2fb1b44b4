//! Host-facing event management.

use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
};
use std::sync::Arc;
use uuid::Uuid;

use super::auth::CurrentUser;
use super::{
    ApiError, ApiResponse, AppState, BulkEventActionRequest, CreateEventRequest, EventDto,
    MessageResponse, Paginated, Pagination, UpdateEventRequest,
};
use crate::api::validation::{
    resolve_content_type, validate_event_name, validate_image_upload, validate_pagination,
};
use crate::db::NewEvent;
use crate::entities::events;
use crate::models::patch::EventPatch;
use crate::services::passwords;

/// Loads the event and enforces that `user_id` hosts it.
pub async fn verify_event_ownership(
    state: &AppState,
    event_id: &str,
    user_id: &str,
) -> Result<events::Model, ApiError> {
    let event = state
        .shared
        .store
        .get_event(event_id)
        .await?
        .ok_or_else(|| ApiError::event_not_found(event_id))?;

    if event.host_id != user_id {
        return Err(ApiError::Forbidden(
            "You do not have permission to manage this event".to_string(),
        ));
    }

    Ok(event)
}

/// POST /events
pub async fn create_event(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<CreateEventRequest>,
) -> Result<Json<ApiResponse<EventDto>>, ApiError> {
    let name = validate_event_name(&payload.name)?.to_string();

    let password_hash = match payload.password.as_deref().filter(|p| !p.is_empty()) {
        Some(password) => {
            Some(passwords::hash_password(password, &state.shared.config.security).await?)
        }
        None => None,
    };

    let event = state
        .shared
        .store
        .insert_event(NewEvent {
            id: Uuid::new_v4().to_string(),
            host_id: current.user.id.clone(),
            name,
            description: payload.description,
            date: payload.date,
            password_hash,
        })
        .await?;

    Ok(Json(ApiResponse::success(EventDto::from_model(event, 0))))
}

/// GET /events
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ApiResponse<Paginated<EventDto>>>, ApiError> {
    let (page, page_size) = validate_pagination(pagination.page, pagination.page_size)?;

    let (items, total) = state
        .shared
        .store
        .list_events_for_host(&current.user.id, page, page_size)
        .await?;

    let mut events = Vec::with_capacity(items.len());
    for event in items {
        let photo_count = state.shared.store.count_approved_photos(&event.id).await?;
        events.push(EventDto::from_model(event, photo_count));
    }

    Ok(Json(ApiResponse::success(Paginated::new(
        events, total, page, page_size,
    ))))
}

/// GET /events/{id}
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(event_id): Path<String>,
) -> Result<Json<ApiResponse<EventDto>>, ApiError> {
    let event = verify_event_ownership(&state, &event_id, &current.user.id).await?;
    let photo_count = state.shared.store.count_approved_photos(&event.id).await?;

    Ok(Json(ApiResponse::success(EventDto::from_model(
        event,
        photo_count,
    ))))
}

/// PATCH /events/{id}
pub async fn update_event(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(event_id): Path<String>,
    Json(payload): Json<UpdateEventRequest>,
) -> Result<Json<ApiResponse<EventDto>>, ApiError> {
    let event = verify_event_ownership(&state, &event_id, &current.user.id).await?;

    let name = match payload.name.as_deref() {
        Some(name) => Some(validate_event_name(name)?.to_string()),
        None => None,
    };

    // Empty string clears the access password; anything else re-hashes.
    let password_hash = match payload.password.as_deref() {
        None => None,
        Some("") => Some(None),
        Some(password) => Some(Some(
            passwords::hash_password(password, &state.shared.config.security).await?,
        )),
    };

    let patch = EventPatch {
        name,
        description: payload.description,
        date: payload.date,
        password_hash,
        is_active: payload.is_active,
        is_archived: payload.is_archived,
    };

    let event = if patch.is_empty() {
        event
    } else {
        state.shared.store.patch_event(event, patch).await?
    };

    let photo_count = state.shared.store.count_approved_photos(&event.id).await?;
    Ok(Json(ApiResponse::success(EventDto::from_model(
        event,
        photo_count,
    ))))
}

/// DELETE /events/{id}
/// Photo rows cascade with the event; CDN objects are cleaned up
/// best-effort afterwards.
pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(event_id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let event = verify_event_ownership(&state, &event_id, &current.user.id).await?;

    // Collect every photo URL before the cascade wipes the rows.
    let mut photos = Vec::new();
    let mut page = 1;
    loop {
        let (batch, _) = state
            .shared
            .store
            .list_photos_for_event(&event.id, false, page, 100)
            .await?;
        if batch.is_empty() {
            break;
        }
        photos.extend(batch);
        page += 1;
    }

    let cover_url = event.cover_image_url.clone();
    state.shared.store.delete_event(event).await?;

    let media = state.shared.media.clone();
    tokio::spawn(async move {
        for photo in photos {
            if let Some(id) = crate::services::MediaClient::public_id_from_url(&photo.url) {
                media.delete_image(id).await;
            }
        }
        if let Some(url) = cover_url
            && let Some(id) = crate::services::MediaClient::public_id_from_url(&url)
        {
            media.delete_image(id).await;
        }
    });

    state
        .shared
        .audit
        .record(
            "event.delete",
            &format!("Event {event_id} deleted by host {}", current.user.id),
            None,
        )
        .await;

    Ok(Json(ApiResponse::success(MessageResponse::new(format!(
        "Event '{event_id}' and all associated photos have been deleted"
    )))))
}

/// POST /events/{id}/cover
pub async fn upload_cover(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(event_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<EventDto>>, ApiError> {
    let event = verify_event_ownership(&state, &event_id, &current.user.id).await?;

    let mut file: Option<(Vec<u8>, String, String)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let content_type = field.content_type().unwrap_or_default().to_string();
            let filename = field.file_name().unwrap_or("cover").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::validation(format!("Failed to read upload: {e}")))?;
            file = Some((bytes.to_vec(), filename, content_type));
        }
    }

    let (bytes, filename, declared_type) =
        file.ok_or_else(|| ApiError::validation("Missing file field"))?;

    let content_type = resolve_content_type(Some(declared_type.as_str()), &filename).unwrap_or_default();

    validate_image_upload(
        Some(content_type.as_str()),
        bytes.len(),
        state.shared.config.quota.max_file_bytes,
    )?;

    let incoming = i64::try_from(bytes.len()).unwrap_or(i64::MAX);
    let ceiling = state.shared.config.quota.max_total_bytes_per_user;
    let (exceeds, current_total) = state
        .shared
        .quota
        .would_exceed(&current.user.id, incoming, ceiling)
        .await?;
    if exceeds {
        return Err(ApiError::QuotaExceeded(format!(
            "Upload limit exceeded: {current_total} of {ceiling} bytes already used"
        )));
    }

    let asset = state
        .shared
        .media
        .upload_image(bytes, &filename, &content_type)
        .await?;

    let event = state
        .shared
        .store
        .set_event_cover(event, &asset.url, asset.thumbnail_url.as_deref(), asset.bytes)
        .await?;

    let photo_count = state.shared.store.count_approved_photos(&event.id).await?;
    Ok(Json(ApiResponse::success(EventDto::from_model(
        event,
        photo_count,
    ))))
}

/// POST /events/actions/bulk
pub async fn bulk_actions(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<BulkEventActionRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let (is_active, is_archived) = match payload.action.as_str() {
        "archive" => (None, Some(true)),
        "unarchive" => (None, Some(false)),
        "activate" => (Some(true), None),
        "deactivate" => (Some(false), None),
        other => {
            return Err(ApiError::validation(format!(
                "Invalid action '{other}'. Must be one of: archive, unarchive, activate, deactivate"
            )));
        }
    };

    let updated = state
        .shared
        .store
        .bulk_set_event_status(&current.user.id, &payload.event_ids, is_active, is_archived)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(format!(
        "Performed action '{}' on {updated} event(s)",
        payload.action
    )))))
}
