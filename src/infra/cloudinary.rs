//! Cloudinary client used as the primary image store.
//!
//! Requests are signed with SHA-256 (`signature_algorithm=sha256`): the sorted
//! `key=value` parameters joined by `&`, followed by the API secret.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    Client,
    multipart::{Form, Part},
};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::application::media::{MediaError, MediaStore, UploadedFile};
use crate::config::CloudStorageSettings;
use crate::infra::error::InfraError;
use crate::infra::uploads::sanitize_filename;

const SOURCE: &str = "infra::cloudinary";
const API_BASE: &str = "https://api.cloudinary.com/v1_1";
const OWNED_HOST_SUFFIX: &str = "cloudinary.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
const UPLOAD_TRANSFORMATION: &str = "c_limit,w_800/q_auto,f_auto";
const ALLOWED_FORMATS: &str = "jpg,jpeg,png,webp";

pub struct CloudinaryStore {
    client: Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    folder_prefix: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: Option<String>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl CloudinaryStore {
    pub fn new(settings: &CloudStorageSettings) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(concat!("taproom/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| InfraError::http_client(err.to_string()))?;

        Ok(Self {
            client,
            cloud_name: settings.cloud_name.clone(),
            api_key: settings.api_key.clone(),
            api_secret: settings.api_secret.clone(),
            folder_prefix: settings.folder_prefix.clone(),
        })
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{API_BASE}/{}/image/{action}", self.cloud_name)
    }

    fn signed_form(&self, params: &[(&'static str, String)]) -> Form {
        let signature = sign(params, &self.api_secret);
        let mut form = Form::new()
            .text("api_key", self.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(*key, value.clone());
        }
        form
    }

    fn folder_for(&self, folder: &str) -> String {
        let folder = folder.trim_matches('/');
        match (self.folder_prefix.is_empty(), folder.is_empty()) {
            (true, _) => folder.to_string(),
            (false, true) => self.folder_prefix.clone(),
            (false, false) => format!("{}/{folder}", self.folder_prefix),
        }
    }
}

#[async_trait]
impl MediaStore for CloudinaryStore {
    fn backend(&self) -> &'static str {
        "cloudinary"
    }

    fn owns(&self, url: &str) -> bool {
        Url::parse(url)
            .ok()
            .and_then(|parsed| parsed.host_str().map(is_cloudinary_host))
            .unwrap_or(false)
    }

    async fn store(&self, folder: &str, file: &UploadedFile) -> Result<String, MediaError> {
        if file.bytes.is_empty() {
            return Err(MediaError::EmptyPayload);
        }
        if file.bytes.len() > MAX_UPLOAD_BYTES {
            return Err(MediaError::TooLarge {
                size: file.bytes.len(),
                limit: MAX_UPLOAD_BYTES,
            });
        }

        let (stem, _) = sanitize_filename(&file.file_name);
        let public_id = format!("{}_{stem}", Uuid::new_v4().simple());
        let params = [
            ("allowed_formats", ALLOWED_FORMATS.to_string()),
            ("folder", self.folder_for(folder)),
            ("public_id", public_id),
            ("timestamp", OffsetDateTime::now_utc().unix_timestamp().to_string()),
            ("transformation", UPLOAD_TRANSFORMATION.to_string()),
        ];

        let mut part = Part::bytes(file.bytes.to_vec()).file_name(file.file_name.clone());
        if let Some(content_type) = file.content_type.as_deref() {
            part = part
                .mime_str(content_type)
                .map_err(|err| MediaError::upstream(err.to_string()))?;
        }
        let form = self.signed_form(&params).part("file", part);

        let response = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|err| MediaError::upstream(err.to_string()))?;
        let status = response.status();
        let body: UploadResponse = response
            .json()
            .await
            .map_err(|err| MediaError::upstream(format!("status {status}: {err}")))?;

        match (body.secure_url, body.error) {
            (Some(url), _) if status.is_success() => {
                debug!(target = SOURCE, url = %url, "cloudinary upload accepted");
                Ok(url)
            }
            (_, Some(error)) => Err(MediaError::upstream(error.message)),
            _ => Err(MediaError::upstream(format!(
                "upload answered {status} without a URL"
            ))),
        }
    }

    async fn remove(&self, url: &str) -> Result<bool, MediaError> {
        let public_id = public_id_from_url(url).ok_or(MediaError::InvalidPath)?;
        let params = [
            ("public_id", public_id),
            ("timestamp", OffsetDateTime::now_utc().unix_timestamp().to_string()),
        ];

        let response = self
            .client
            .post(self.endpoint("destroy"))
            .multipart(self.signed_form(&params))
            .send()
            .await
            .map_err(|err| MediaError::upstream(err.to_string()))?;
        let body: DestroyResponse = response
            .json()
            .await
            .map_err(|err| MediaError::upstream(err.to_string()))?;

        if let Some(error) = body.error {
            return Err(MediaError::upstream(error.message));
        }
        Ok(body.result.as_deref() == Some("ok"))
    }
}

fn is_cloudinary_host(host: &str) -> bool {
    host == OWNED_HOST_SUFFIX || host.ends_with(&format!(".{OWNED_HOST_SUFFIX}"))
}

/// Hex SHA-256 of the sorted `key=value&...` string followed by the secret.
fn sign(params: &[(&str, String)], secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by_key(|(key, _)| *key);
    let joined = sorted
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Recover the public id from a delivery URL: the path after `upload/`, without
/// the `v<digits>` version segment and the file extension.
fn public_id_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    if !parsed.host_str().is_some_and(is_cloudinary_host) {
        return None;
    }

    let segments: Vec<&str> = parsed.path_segments()?.collect();
    let upload = segments.iter().position(|segment| *segment == "upload")?;
    let mut rest = &segments[upload + 1..];
    if let Some(first) = rest.first()
        && first.len() > 1
        && first.starts_with('v')
        && first[1..].bytes().all(|b| b.is_ascii_digit())
    {
        rest = &rest[1..];
    }

    let (last, folders) = rest.split_last()?;
    let stem = match last.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => last,
    };
    if stem.is_empty() {
        return None;
    }

    let mut parts: Vec<&str> = folders.to_vec();
    parts.push(stem);
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_sorts_parameters() {
        let params = [
            ("timestamp", "1315060510".to_string()),
            ("public_id", "sample_image".to_string()),
            ("eager", "w_400,h_300,c_pad|w_260,h_200,c_crop".to_string()),
        ];
        let expected = {
            let mut hasher = Sha256::new();
            hasher.update(
                b"eager=w_400,h_300,c_pad|w_260,h_200,c_crop&public_id=sample_image&timestamp=1315060510abcd",
            );
            hex::encode(hasher.finalize())
        };
        assert_eq!(sign(&params, "abcd"), expected);
    }

    #[test]
    fn public_id_skips_version_and_extension() {
        let url = "https://res.cloudinary.com/demo/image/upload/v1712345678/taproom/menu/abc_burger.jpg";
        assert_eq!(
            public_id_from_url(url).as_deref(),
            Some("taproom/menu/abc_burger")
        );
    }

    #[test]
    fn public_id_without_version() {
        let url = "https://res.cloudinary.com/demo/image/upload/events/poster.webp";
        assert_eq!(public_id_from_url(url).as_deref(), Some("events/poster"));
    }

    #[test]
    fn foreign_hosts_are_not_owned() {
        assert!(public_id_from_url("https://example.com/image/upload/a.jpg").is_none());
        assert!(public_id_from_url("/static/media/menu/a.jpg").is_none());
        assert!(is_cloudinary_host("res.cloudinary.com"));
        assert!(!is_cloudinary_host("notcloudinary.com"));
    }
}
