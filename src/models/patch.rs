//! Typed patch structs for the mutable slice of each entity.
//!
//! Every field is optional; `None` means "leave unchanged". Application is a
//! pure transformation from a fetched model to an active model, so callers
//! can see exactly which columns a handler is allowed to touch.

use sea_orm::Set;

use crate::entities::{events, photos, users};

#[derive(Debug, Default, Clone)]
pub struct UserPatch {
    pub name: Option<String>,
}

impl UserPatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
    }

    #[must_use]
    pub fn apply(self, model: users::Model) -> users::ActiveModel {
        let mut active: users::ActiveModel = model.into();
        if let Some(name) = self.name {
            active.name = Set(Some(name));
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active
    }
}

#[derive(Debug, Default, Clone)]
pub struct EventPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    /// `Some(None)` clears the access password, `Some(Some(hash))` replaces it.
    pub password_hash: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub is_archived: Option<bool>,
}

impl EventPatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.date.is_none()
            && self.password_hash.is_none()
            && self.is_active.is_none()
            && self.is_archived.is_none()
    }

    #[must_use]
    pub fn apply(self, model: events::Model) -> events::ActiveModel {
        let mut active: events::ActiveModel = model.into();
        if let Some(name) = self.name {
            active.name = Set(name);
        }
        if let Some(description) = self.description {
            active.description = Set(Some(description));
        }
        if let Some(date) = self.date {
            active.date = Set(Some(date));
        }
        if let Some(password_hash) = self.password_hash {
            active.password_hash = Set(password_hash);
        }
        if let Some(is_active) = self.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(is_archived) = self.is_archived {
            active.is_archived = Set(is_archived);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active
    }
}

#[derive(Debug, Default, Clone)]
pub struct PhotoPatch {
    pub caption: Option<String>,
    pub approved: Option<bool>,
}

impl PhotoPatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.caption.is_none() && self.approved.is_none()
    }

    #[must_use]
    pub fn apply(self, model: photos::Model) -> photos::ActiveModel {
        let mut active: photos::ActiveModel = model.into();
        if let Some(caption) = self.caption {
            active.caption = Set(Some(caption));
        }
        if let Some(approved) = self.approved {
            active.approved = Set(approved);
        }
        active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::ActiveValue;

    fn sample_photo() -> photos::Model {
        photos::Model {
            id: "p1".to_string(),
            event_id: "e1".to_string(),
            url: "https://cdn/x.jpg".to_string(),
            thumbnail_url: None,
            caption: None,
            approved: false,
            uploaded_by: Some("u1".to_string()),
            guest_token: None,
            file_size: Some("1024".to_string()),
            uploaded_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn photo_patch_touches_only_named_fields() {
        let patch = PhotoPatch {
            caption: None,
            approved: Some(true),
        };
        let active = patch.apply(sample_photo());

        assert!(matches!(active.approved, ActiveValue::Set(true)));
        assert!(matches!(active.caption, ActiveValue::Unchanged(None)));
        assert!(matches!(active.url, ActiveValue::Unchanged(_)));
    }

    #[test]
    fn empty_patches_report_empty() {
        assert!(UserPatch::default().is_empty());
        assert!(EventPatch::default().is_empty());
        assert!(PhotoPatch::default().is_empty());
        assert!(
            !EventPatch {
                is_archived: Some(true),
                ..Default::default()
            }
            .is_empty()
        );
    }
}
