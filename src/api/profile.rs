//! Host profile endpoints (`/me`).

use axum::{
    Extension, Json,
    extract::{Multipart, State},
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState, ProfileDto, UpdateProfileRequest, UserDto};
use crate::api::validation::{resolve_content_type, validate_image_upload};
use crate::models::patch::UserPatch;

/// GET /me
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<ProfileDto>>, ApiError> {
    let upload_bytes_used = state
        .shared
        .quota
        .total_upload_bytes(&current.user.id)
        .await?;

    Ok(Json(ApiResponse::success(ProfileDto {
        user: UserDto::from_model(current.user, current.claims.email_verified),
        upload_bytes_used,
        upload_bytes_limit: state.shared.config.quota.max_total_bytes_per_user,
    })))
}

/// PATCH /me
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let patch = UserPatch { name: payload.name };

    let user = if patch.is_empty() {
        current.user
    } else {
        state.shared.store.patch_user(current.user, patch).await?
    };

    Ok(Json(ApiResponse::success(UserDto::from_model(
        user,
        current.claims.email_verified,
    ))))
}

/// POST /me/avatar
/// Replaces the profile picture. The new file is charged against the
/// account's storage quota like any other upload.
pub async fn upload_avatar(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let mut file: Option<(Vec<u8>, String, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let content_type = field.content_type().unwrap_or_default().to_string();
            let filename = field.file_name().unwrap_or("avatar").to_string();
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

    let user = state
        .shared
        .store
        .set_user_avatar(
            current.user,
            &asset.url,
            asset.thumbnail_url.as_deref(),
            asset.bytes,
        )
        .await?;

    Ok(Json(ApiResponse::success(UserDto::from_model(
        user,
        current.claims.email_verified,
    ))))
}
