//! Client for the external media CDN that stores the actual image bytes.
//!
//! This backend only persists URLs, thumbnails and byte counts; the CDN owns
//! the files. Deletions are best-effort — an orphaned CDN object is cheaper
//! than a failed moderation action.

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::config::MediaConfig;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Media storage is disabled")]
    Disabled,

    #[error("Media CDN error: {0}")]
    Upstream(String),

    #[error("Media CDN returned an unusable response: {0}")]
    BadResponse(String),
}

/// Stored-object descriptor returned by the CDN upload API.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaAsset {
    pub public_id: String,
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub bytes: i64,
}

#[derive(Clone)]
pub struct MediaClient {
    config: MediaConfig,
    client: Client,
}

impl MediaClient {
    #[must_use]
    pub fn new(config: MediaConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(
                config.request_timeout_seconds.into(),
            ))
            .user_agent("Snapnest/1.0")
            .build()
            .unwrap_or_default();

        Self { config, client }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub async fn upload_image(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        content_type: &str,
    ) -> Result<MediaAsset, MediaError> {
        if !self.config.enabled {
            return Err(MediaError::Disabled);
        }

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(|e| MediaError::Upstream(e.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("thumbnail_size", self.config.thumbnail_size.to_string());

        let response = self
            .client
            .post(format!("{}/upload", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| MediaError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MediaError::Upstream(format!(
                "upload returned {}",
                response.status()
            )));
        }

        let asset: MediaAsset = response
            .json()
            .await
            .map_err(|e| MediaError::BadResponse(e.to_string()))?;

        if asset.url.is_empty() {
            return Err(MediaError::BadResponse("missing url".to_string()));
        }

        Ok(asset)
    }

    /// Removes an object from the CDN. Failures are logged, never returned:
    /// row deletion must not be blocked by CDN hiccups.
    pub async fn delete_image(&self, public_id: &str) {
        if !self.config.enabled || public_id.is_empty() {
            return;
        }

        let result = self
            .client
            .delete(format!("{}/objects/{public_id}", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .send()
            .await;

        match result {
            Ok(response) if !response.status().is_success() => {
                warn!(
                    public_id = %public_id,
                    status = %response.status(),
                    "Media CDN refused delete"
                );
            }
            Err(e) => warn!(public_id = %public_id, "Media CDN delete failed: {e}"),
            Ok(_) => {}
        }
    }

    /// Derives the CDN public id back out of a stored URL, for deletes.
    #[must_use]
    pub fn public_id_from_url(url: &str) -> Option<&str> {
        url.rsplit('/').next().and_then(|name| {
            let id = name.split('.').next().unwrap_or(name);
            if id.is_empty() { None } else { Some(id) }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_public_id_from_url() {
        assert_eq!(
            MediaClient::public_id_from_url("https://cdn.example.com/v1/abc123.jpg"),
            Some("abc123")
        );
        assert_eq!(
            MediaClient::public_id_from_url("https://cdn.example.com/v1/abc123"),
            Some("abc123")
        );
        assert_eq!(MediaClient::public_id_from_url(""), None);
    }

    #[tokio::test]
    async fn disabled_client_refuses_uploads() {
        let client = MediaClient::new(MediaConfig {
            enabled: false,
            ..Default::default()
        });

        let result = client
            .upload_image(vec![1, 2, 3], "x.jpg", "image/jpeg")
            .await;

        assert!(matches!(result, Err(MediaError::Disabled)));
    }
}
