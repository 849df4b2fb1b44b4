//! Unauthenticated visitor flow: event cards, approved galleries, and
//! password-gated photo uploads.

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
};
use std::sync::Arc;
use uuid::Uuid;

use super::{
    ApiError, ApiResponse, AppState, MessageResponse, Paginated, Pagination, PhotoDto,
    PublicEventDto, VerifyPasswordRequest,
};
use crate::api::validation::{
    resolve_content_type, validate_caption, validate_image_upload, validate_pagination,
};
use crate::db::NewPhoto;
use crate::entities::events;
use crate::services::passwords;

/// Loads an event that is active, not archived, and therefore publicly
/// reachable under its share slug (the event id).
async fn get_public_event(state: &AppState, slug: &str) -> Result<events::Model, ApiError> {
    state
        .shared
        .store
        .get_public_event(slug)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound("Event not found or not available for public access".to_string())
        })
}

/// Opaque identifier handed to an anonymous uploader (32-char hex string),
/// so a visitor can later point at "their" photos without an account.
fn generate_guest_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();

    bytes.iter().fold(String::with_capacity(32), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

async fn check_event_password(
    event: &events::Model,
    provided: Option<&str>,
) -> Result<(), ApiError> {
    let Some(hash) = event.password_hash.as_deref() else {
        return Ok(());
    };

    let Some(password) = provided.filter(|p| !p.is_empty()) else {
        return Err(ApiError::Unauthorized(
            "Password required for this event".to_string(),
        ));
    };

    if passwords::verify_password(password, hash).await? {
        Ok(())
    } else {
        Err(ApiError::Unauthorized("Incorrect password".to_string()))
    }
}

/// GET /public/events/{slug}
pub async fn get_event_card(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<PublicEventDto>>, ApiError> {
    let event = get_public_event(&state, &slug).await?;
    let photo_count = state.shared.store.count_approved_photos(&event.id).await?;

    Ok(Json(ApiResponse::success(PublicEventDto::from_model(
        event,
        photo_count,
    ))))
}

/// GET /public/events/{slug}/photos
/// Visitors only ever see approved photos.
pub async fn list_event_photos(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ApiResponse<Paginated<PhotoDto>>>, ApiError> {
    let (page, page_size) = validate_pagination(pagination.page, pagination.page_size)?;
    let event = get_public_event(&state, &slug).await?;

    let (items, total) = state
        .shared
        .store
        .list_photos_for_event(&event.id, true, page, page_size)
        .await?;

    let photos = items.into_iter().map(PhotoDto::from).collect();
    Ok(Json(ApiResponse::success(Paginated::new(
        photos, total, page, page_size,
    ))))
}

/// POST /public/events/{slug}/verify-password
pub async fn verify_event_password(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Json(payload): Json<VerifyPasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let event = get_public_event(&state, &slug).await?;

    if event.password_hash.is_none() {
        return Ok(Json(ApiResponse::success(MessageResponse::new(
            "No password required for this event",
        ))));
    }

    check_event_password(&event, Some(&payload.password)).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password verified successfully",
    ))))
}

/// POST /public/events/{slug}/photos
/// Anonymous upload. The bytes are charged against the event host's quota,
/// and the photo stays hidden until the host approves it.
pub async fn upload_photo(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<PhotoDto>>, ApiError> {
    let event = get_public_event(&state, &slug).await?;

    let mut file: Option<(Vec<u8>, String, String)> = None;
    let mut caption: Option<String> = None;
    let mut password: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed multipart body: {e}")))?
    {
        match field.name() {
            Some("file") => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let filename = field.file_name().unwrap_or("photo").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation(format!("Failed to read upload: {e}")))?;
                file = Some((bytes.to_vec(), filename, content_type));
            }
            Some("caption") => {
                caption = field.text().await.ok().filter(|c| !c.is_empty());
            }
            Some("password") => {
                password = field.text().await.ok();
            }
            _ => {}
        }
    }

    check_event_password(&event, password.as_deref()).await?;

    let (bytes, filename, declared_type) =
        file.ok_or_else(|| ApiError::validation("Missing file field"))?;

    let content_type = resolve_content_type(Some(declared_type.as_str()), &filename).unwrap_or_default();

    validate_image_upload(
        Some(content_type.as_str()),
        bytes.len(),
        state.shared.config.quota.max_file_bytes,
    )?;

    if let Some(caption) = caption.as_deref() {
        validate_caption(caption)?;
    }

    // Quota is checked against the host before the CDN sees any bytes. The
    // read-then-insert window is not atomic; a concurrent upload can exceed
    // the ceiling by one file, which is accepted.
    let incoming = i64::try_from(bytes.len()).unwrap_or(i64::MAX);
    let ceiling = state.shared.config.quota.max_total_bytes_per_user;
    let (exceeds, current_total) = state
        .shared
        .quota
        .would_exceed(&event.host_id, incoming, ceiling)
        .await?;
    if exceeds {
        return Err(ApiError::QuotaExceeded(format!(
            "Host's upload limit exceeded: {current_total} of {ceiling} bytes already used"
        )));
    }

    let asset = state
        .shared
        .media
        .upload_image(bytes, &filename, &content_type)
        .await?;

    let photo = state
        .shared
        .store
        .insert_photo(NewPhoto {
            id: Uuid::new_v4().to_string(),
            event_id: event.id.clone(),
            url: asset.url,
            thumbnail_url: asset.thumbnail_url,
            caption,
            approved: false,
            uploaded_by: Some(event.host_id.clone()),
            guest_token: Some(generate_guest_token()),
            file_size: asset.bytes,
        })
        .await?;

    Ok(Json(ApiResponse::success(PhotoDto::from(photo))))
}
