use super::ApiError;

const MAX_PAGE_SIZE: u64 = 100;
const MAX_NAME_LEN: usize = 120;
const MAX_CAPTION_LEN: usize = 255;

pub fn validate_pagination(page: u64, page_size: u64) -> Result<(u64, u64), ApiError> {
    if page == 0 {
        return Err(ApiError::validation("Page numbers start at 1"));
    }
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(ApiError::validation(format!(
            "Page size must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }
    Ok((page, page_size))
}

pub fn validate_event_name(name: &str) -> Result<&str, ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Event name cannot be empty"));
    }
    if trimmed.len() > MAX_NAME_LEN {
        return Err(ApiError::validation(format!(
            "Event name must be {} characters or less",
            MAX_NAME_LEN
        )));
    }
    Ok(trimmed)
}

pub fn validate_caption(caption: &str) -> Result<&str, ApiError> {
    if caption.len() > MAX_CAPTION_LEN {
        return Err(ApiError::validation(format!(
            "Caption must be {} characters or less",
            MAX_CAPTION_LEN
        )));
    }
    Ok(caption)
}

/// Picks the effective content type of an upload: the multipart header when
/// present, otherwise a guess from the file extension.
#[must_use]
pub fn resolve_content_type(declared: Option<&str>, filename: &str) -> Option<String> {
    if let Some(ct) = declared.filter(|ct| !ct.is_empty()) {
        return Some(ct.to_string());
    }

    mime_guess::from_path(filename)
        .first()
        .map(|m| m.essence_str().to_string())
}

/// Upload gate: images only, non-empty, within the per-file ceiling.
pub fn validate_image_upload(
    content_type: Option<&str>,
    size: usize,
    max_file_bytes: i64,
) -> Result<(), ApiError> {
    let is_image = content_type.is_some_and(|ct| ct.starts_with("image/"));
    if !is_image {
        return Err(ApiError::validation("File must be an image"));
    }

    if size == 0 {
        return Err(ApiError::validation("File is empty"));
    }

    if i64::try_from(size).unwrap_or(i64::MAX) > max_file_bytes {
        return Err(ApiError::validation(format!(
            "File size exceeds maximum allowed size ({} bytes)",
            max_file_bytes
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_pagination() {
        assert!(validate_pagination(1, 20).is_ok());
        assert!(validate_pagination(1, 100).is_ok());
        assert!(validate_pagination(0, 20).is_err());
        assert!(validate_pagination(1, 0).is_err());
        assert!(validate_pagination(1, 101).is_err());
    }

    #[test]
    fn test_validate_event_name() {
        assert_eq!(validate_event_name("  Summer Party  ").unwrap(), "Summer Party");
        assert!(validate_event_name("").is_err());
        assert!(validate_event_name("   ").is_err());
        assert!(validate_event_name(&"x".repeat(121)).is_err());
    }

    #[test]
    fn test_resolve_content_type() {
        assert_eq!(
            resolve_content_type(Some("image/webp"), "x.jpg").as_deref(),
            Some("image/webp")
        );
        assert_eq!(
            resolve_content_type(None, "photo.jpg").as_deref(),
            Some("image/jpeg")
        );
        assert_eq!(
            resolve_content_type(Some(""), "photo.png").as_deref(),
            Some("image/png")
        );
        assert_eq!(resolve_content_type(None, "mystery"), None);
    }

    #[test]
    fn test_validate_image_upload() {
        assert!(validate_image_upload(Some("image/jpeg"), 1024, 10_000).is_ok());
        assert!(validate_image_upload(Some("image/png"), 1024, 10_000).is_ok());
        assert!(validate_image_upload(Some("text/plain"), 1024, 10_000).is_err());
        assert!(validate_image_upload(None, 1024, 10_000).is_err());
        assert!(validate_image_upload(Some("image/jpeg"), 0, 10_000).is_err());
        assert!(validate_image_upload(Some("image/jpeg"), 10_001, 10_000).is_err());
    }
}
