//! Local disk media storage, served back under `/static/media`.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use slug::slugify;
use time::OffsetDateTime;
use tokio::{fs, io::AsyncWriteExt};

use crate::application::media::{MediaError, UploadedFile};

/// Public URL prefix for files kept under the media root.
pub const LOCAL_MEDIA_PREFIX: &str = "/static/media/";

const MAX_NAME_ATTEMPTS: u32 = 10_000;

/// Filesystem-backed media storage.
#[derive(Debug)]
pub struct LocalMediaStore {
    root: PathBuf,
}

impl LocalMediaStore {
    /// Initialise storage rooted at the provided directory, creating it if necessary.
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn owns(&self, url: &str) -> bool {
        url.starts_with(LOCAL_MEDIA_PREFIX)
    }

    /// Write `file` to `<folder>/<yyyy>/<mm>/<name>`, suffixing `_1`, `_2`, ... onto
    /// the stem until the name is free.
    pub async fn store(&self, folder: &str, file: &UploadedFile) -> Result<String, MediaError> {
        if file.bytes.is_empty() {
            return Err(MediaError::EmptyPayload);
        }

        let now = OffsetDateTime::now_utc();
        let relative_dir = format!(
            "{}/{}/{:02}",
            sanitize_folder(folder),
            now.year(),
            u8::from(now.month())
        );
        let directory = self.resolve(&relative_dir)?;
        fs::create_dir_all(&directory).await?;

        let (stem, extension) = sanitize_filename(&file.file_name);
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = candidate_name(&stem, extension.as_deref(), attempt);
            match write_new(&directory.join(&name), &file.bytes).await {
                Ok(()) => return Ok(format!("{LOCAL_MEDIA_PREFIX}{relative_dir}/{name}")),
                Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(err) => return Err(MediaError::Io(err)),
            }
        }

        Err(MediaError::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("no free file name for `{stem}` in {relative_dir}"),
        )))
    }

    /// Write `data` directly under the media root as `name`.
    pub async fn store_flat(&self, name: &str, data: &Bytes) -> Result<String, MediaError> {
        if name.contains('/') || name.contains('\\') {
            return Err(MediaError::InvalidPath);
        }
        let path = self.resolve(name)?;
        write_new(&path, data).await?;
        Ok(format!("{LOCAL_MEDIA_PREFIX}{name}"))
    }

    /// Read a stored file given its path relative to the media root.
    pub async fn read(&self, relative: &str) -> Result<Bytes, MediaError> {
        let absolute = self.resolve(relative)?;
        if !fs::metadata(&absolute).await?.is_file() {
            return Err(MediaError::Io(ErrorKind::NotFound.into()));
        }
        let data = fs::read(absolute).await?;
        Ok(Bytes::from(data))
    }

    /// Remove the file behind a `/static/media/...` URL. `Ok(false)` when nothing was there.
    pub async fn remove(&self, url: &str) -> Result<bool, MediaError> {
        let relative = url
            .strip_prefix(LOCAL_MEDIA_PREFIX)
            .ok_or(MediaError::InvalidPath)?;
        let relative = relative.split(['?', '#']).next().unwrap_or_default();
        let absolute = self.resolve(relative)?;

        match fs::remove_file(&absolute).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(MediaError::Io(err)),
        }
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf, MediaError> {
        let path = Path::new(relative);
        if relative.is_empty()
            || path.is_absolute()
            || path.components().any(|component| {
                matches!(
                    component,
                    Component::ParentDir | Component::Prefix(_) | Component::RootDir
                )
            })
        {
            return Err(MediaError::InvalidPath);
        }

        Ok(self.root.join(path))
    }
}

async fn write_new(path: &Path, data: &[u8]) -> Result<(), std::io::Error> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    if let Err(err) = file.write_all(data).await {
        drop(file);
        let _ = fs::remove_file(path).await;
        return Err(err);
    }
    file.flush().await
}

fn candidate_name(stem: &str, extension: Option<&str>, attempt: u32) -> String {
    let stem = if attempt == 0 {
        stem.to_string()
    } else {
        format!("{stem}_{attempt}")
    };
    match extension {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    }
}

fn sanitize_folder(folder: &str) -> String {
    let folder = slugify(folder);
    if folder.is_empty() {
        "uploads".to_string()
    } else {
        folder
    }
}

pub(crate) fn sanitize_filename(original: &str) -> (String, Option<String>) {
    let base_name = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let path = Path::new(base_name);
    let stem = path
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or("upload");
    let mut base = slugify(stem);
    if base.is_empty() {
        base = "upload".to_string();
    }

    let extension = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.trim_matches('.').to_ascii_lowercase())
        .filter(|value| !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric()));

    (base, extension)
}
