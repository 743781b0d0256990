//! Image storage: cloud first, local disk as the fallback.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use metrics::counter;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::infra::uploads::LocalMediaStore;

const SOURCE: &str = "application::media";

/// Content types accepted by the single-file upload endpoint, with the extension
/// used for the stored file.
const LEGACY_UPLOAD_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
];

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("storage backend is not configured")]
    NotConfigured,
    #[error("unsupported content type `{content_type}`")]
    UnsupportedType { content_type: String },
    #[error("file of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },
    #[error("uploaded file is empty")]
    EmptyPayload,
    #[error("media path escapes the storage root")]
    InvalidPath,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("storage upstream failed: {message}")]
    Upstream { message: String },
}

impl MediaError {
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }
}

/// A fully buffered file taken from a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, bytes: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        }
    }

    /// Browsers send an empty, nameless part when a file input is left blank.
    pub fn is_blank(&self) -> bool {
        self.file_name.trim().is_empty() || self.bytes.is_empty()
    }
}

/// A remote object store that can hold images and later remove them by URL.
#[async_trait]
pub trait MediaStore: Send + Sync {
    fn backend(&self) -> &'static str;

    /// Whether `url` points into this store.
    fn owns(&self, url: &str) -> bool;

    async fn store(&self, folder: &str, file: &UploadedFile) -> Result<String, MediaError>;

    async fn remove(&self, url: &str) -> Result<bool, MediaError>;
}

/// Stand-in used when no cloud credentials are configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledMediaStore;

#[async_trait]
impl MediaStore for DisabledMediaStore {
    fn backend(&self) -> &'static str {
        "disabled"
    }

    fn owns(&self, _url: &str) -> bool {
        false
    }

    async fn store(&self, _folder: &str, _file: &UploadedFile) -> Result<String, MediaError> {
        Err(MediaError::NotConfigured)
    }

    async fn remove(&self, _url: &str) -> Result<bool, MediaError> {
        Err(MediaError::NotConfigured)
    }
}

#[derive(Clone)]
pub struct MediaService {
    cloud: Arc<dyn MediaStore>,
    local: Arc<LocalMediaStore>,
}

impl MediaService {
    pub fn new(cloud: Arc<dyn MediaStore>, local: Arc<LocalMediaStore>) -> Self {
        Self { cloud, local }
    }

    pub fn local(&self) -> &LocalMediaStore {
        &self.local
    }

    /// Store an image for `folder`, returning its public URL.
    ///
    /// Any cloud failure falls back to local disk. `None` means neither backend
    /// accepted the file; callers carry on without an image.
    pub async fn upload(&self, file: &UploadedFile, folder: &str) -> Option<String> {
        if file.is_blank() {
            return None;
        }

        match self.cloud.store(folder, file).await {
            Ok(url) => {
                counter!("taproom_media_upload_total", "backend" => self.cloud.backend())
                    .increment(1);
                info!(target = SOURCE, folder, url = %url, "stored image in cloud storage");
                return Some(url);
            }
            Err(MediaError::NotConfigured) => {
                debug!(target = SOURCE, folder, "cloud storage disabled; using local disk");
            }
            Err(err) => {
                counter!("taproom_media_fallback_total").increment(1);
                warn!(
                    target = SOURCE,
                    folder,
                    file = %file.file_name,
                    error = %err,
                    "cloud upload failed; falling back to local disk"
                );
            }
        }

        match self.local.store(folder, file).await {
            Ok(url) => {
                counter!("taproom_media_upload_total", "backend" => "local").increment(1);
                Some(url)
            }
            Err(err) => {
                warn!(
                    target = SOURCE,
                    folder,
                    file = %file.file_name,
                    error = %err,
                    "local image storage failed"
                );
                None
            }
        }
    }

    /// Single-file upload straight to the media root, limited to common image types.
    pub async fn save_upload(&self, file: &UploadedFile) -> Result<String, MediaError> {
        let content_type = file
            .content_type
            .as_deref()
            .map(|value| value.trim().to_ascii_lowercase())
            .unwrap_or_default();
        let extension = LEGACY_UPLOAD_TYPES
            .iter()
            .find(|(mime, _)| *mime == content_type)
            .map(|(_, ext)| *ext)
            .ok_or_else(|| MediaError::UnsupportedType {
                content_type: content_type.clone(),
            })?;

        if file.bytes.is_empty() {
            return Err(MediaError::EmptyPayload);
        }

        let name = format!("{}.{extension}", Uuid::new_v4().simple());
        let url = self.local.store_flat(&name, &file.bytes).await?;
        counter!("taproom_media_upload_total", "backend" => "local").increment(1);
        Ok(url)
    }

    /// Remove the asset behind `url`. Failures are logged and reported as `false`.
    pub async fn delete(&self, url: &str) -> bool {
        let url = url.trim();
        if url.is_empty() {
            return false;
        }

        let result = if self.cloud.owns(url) {
            self.cloud.remove(url).await
        } else if self.local.owns(url) {
            self.local.remove(url).await
        } else {
            debug!(target = SOURCE, url, "media url not owned by any backend");
            return false;
        };

        match result {
            Ok(removed) => removed,
            Err(err) => {
                warn!(target = SOURCE, url, error = %err, "media deletion failed");
                false
            }
        }
    }
}
