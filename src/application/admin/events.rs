use std::sync::Arc;

use time::PrimitiveDateTime;
use tracing::{info, warn};

use crate::application::admin::{
    AdminError, ImageChange, discard_upload, non_blank, not_found_as, require_text,
};
use crate::application::media::{MediaService, UploadedFile};
use crate::application::repos::{EventParams, EventsRepo, EventsWriteRepo};
use crate::domain::entities::EventRecord;

const SOURCE: &str = "application::admin::events";
const MEDIA_FOLDER: &str = "events";

pub const DEFAULT_VENUE_AREA: &str = "Deck";

#[derive(Debug, Clone)]
pub struct EventInput {
    pub title: String,
    pub starts_at: PrimitiveDateTime,
    pub ends_at: Option<PrimitiveDateTime>,
    pub description: Option<String>,
    pub venue_area: Option<String>,
    pub is_published: bool,
    pub ticket_url: Option<String>,
}

#[derive(Clone)]
pub struct AdminEventService {
    reader: Arc<dyn EventsRepo>,
    writer: Arc<dyn EventsWriteRepo>,
    media: MediaService,
}

impl AdminEventService {
    pub fn new(
        reader: Arc<dyn EventsRepo>,
        writer: Arc<dyn EventsWriteRepo>,
        media: MediaService,
    ) -> Self {
        Self {
            reader,
            writer,
            media,
        }
    }

    pub async fn list(&self) -> Result<Vec<EventRecord>, AdminError> {
        self.reader.list_events().await.map_err(AdminError::from)
    }

    pub async fn find(&self, id: i64) -> Result<EventRecord, AdminError> {
        self.reader
            .find_event(id)
            .await?
            .ok_or(AdminError::NotFound { entity: "event" })
    }

    pub async fn create(
        &self,
        input: EventInput,
        image: ImageChange<'_>,
    ) -> Result<EventRecord, AdminError> {
        let mut params = event_params(input)?;
        let mut uploaded = None;
        params.image_url = match image {
            ImageChange::Keep => None,
            ImageChange::Upload(file) => {
                uploaded = self.store_image(file).await;
                uploaded.clone()
            }
            ImageChange::Set(url) => non_blank(url),
        };

        let record = match self.writer.create_event(params).await {
            Ok(record) => record,
            Err(err) => {
                discard_upload(&self.media, uploaded).await;
                return Err(err.into());
            }
        };
        info!(target = SOURCE, id = record.id, title = %record.title, "event created");
        Ok(record)
    }

    pub async fn update(
        &self,
        id: i64,
        input: EventInput,
        image: ImageChange<'_>,
    ) -> Result<EventRecord, AdminError> {
        let existing = self.find(id).await?;

        let mut params = event_params(input)?;
        let mut uploaded = None;
        let image_url = match image {
            ImageChange::Keep => existing.image_url.clone(),
            ImageChange::Upload(file) => {
                uploaded = self.store_image(file).await;
                uploaded.clone().or_else(|| existing.image_url.clone())
            }
            ImageChange::Set(url) => non_blank(url),
        };
        params.image_url = image_url.clone();

        let record = match self.writer.update_event(id, params).await {
            Ok(record) => record,
            Err(err) => {
                discard_upload(&self.media, uploaded).await;
                return Err(not_found_as("event")(err));
            }
        };

        if let Some(previous) = existing.image_url.as_deref()
            && image_url.as_deref() != Some(previous)
        {
            self.media.delete(previous).await;
        }

        Ok(record)
    }

    /// Flip the published flag, returning the new value.
    pub async fn toggle_published(&self, id: i64) -> Result<bool, AdminError> {
        let event = self.find(id).await?;
        let published = !event.is_published;
        self.writer
            .set_event_published(id, published)
            .await
            .map_err(not_found_as("event"))?;
        Ok(published)
    }

    /// Delete the image first, then the event.
    pub async fn delete(&self, id: i64) -> Result<(), AdminError> {
        let event = self.find(id).await?;
        if let Some(url) = event.image_url.as_deref() {
            self.media.delete(url).await;
        }
        self.writer
            .delete_event(id)
            .await
            .map_err(not_found_as("event"))?;
        info!(target = SOURCE, id, "event deleted");
        Ok(())
    }

    async fn store_image(&self, file: &UploadedFile) -> Option<String> {
        if file.is_blank() {
            return None;
        }
        let stored = self.media.upload(file, MEDIA_FOLDER).await;
        if stored.is_none() {
            warn!(
                target = SOURCE,
                file = %file.file_name,
                "image upload failed; saving event without a new image"
            );
        }
        stored
    }
}

fn event_params(input: EventInput) -> Result<EventParams, AdminError> {
    let title = require_text(&input.title, "title")?;
    if let Some(ends_at) = input.ends_at
        && ends_at < input.starts_at
    {
        return Err(AdminError::validation("event end must not precede its start"));
    }

    Ok(EventParams {
        title,
        starts_at: input.starts_at,
        ends_at: input.ends_at,
        description: non_blank(input.description),
        image_url: None,
        venue_area: non_blank(input.venue_area).unwrap_or_else(|| DEFAULT_VENUE_AREA.to_string()),
        is_published: input.is_published,
        ticket_url: non_blank(input.ticket_url),
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use async_trait::async_trait;
    use bytes::Bytes;
    use time::macros::datetime;

    use super::*;
    use crate::application::media::DisabledMediaStore;
    use crate::application::repos::RepoError;
    use crate::infra::uploads::LocalMediaStore;

    struct RejectingEvents;

    #[async_trait]
    impl EventsRepo for RejectingEvents {
        async fn list_events(&self) -> Result<Vec<EventRecord>, RepoError> {
            Ok(Vec::new())
        }

        async fn find_event(&self, _id: i64) -> Result<Option<EventRecord>, RepoError> {
            Ok(None)
        }

        async fn list_upcoming(
            &self,
            _from: PrimitiveDateTime,
            _limit: u32,
        ) -> Result<Vec<EventRecord>, RepoError> {
            Ok(Vec::new())
        }

        async fn list_in_range(
            &self,
            _start: PrimitiveDateTime,
            _end: PrimitiveDateTime,
        ) -> Result<Vec<EventRecord>, RepoError> {
            Ok(Vec::new())
        }

        async fn count_upcoming(&self, _from: PrimitiveDateTime) -> Result<u64, RepoError> {
            Ok(0)
        }
    }

    #[async_trait]
    impl EventsWriteRepo for RejectingEvents {
        async fn create_event(&self, _params: EventParams) -> Result<EventRecord, RepoError> {
            Err(RepoError::Timeout)
        }

        async fn update_event(
            &self,
            _id: i64,
            _params: EventParams,
        ) -> Result<EventRecord, RepoError> {
            Err(RepoError::Timeout)
        }

        async fn set_event_published(&self, _id: i64, _published: bool) -> Result<(), RepoError> {
            Err(RepoError::Timeout)
        }

        async fn delete_event(&self, _id: i64) -> Result<(), RepoError> {
            Err(RepoError::Timeout)
        }
    }

    fn stored_files(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .expect("read dir")
            .map(|entry| {
                let path = entry.expect("entry").path();
                if path.is_dir() { stored_files(&path) } else { 1 }
            })
            .sum()
    }

    fn input() -> EventInput {
        EventInput {
            title: "  Trivia Night ".to_string(),
            starts_at: datetime!(2025-03-01 19:00),
            ends_at: Some(datetime!(2025-03-01 22:00)),
            description: Some("   ".to_string()),
            venue_area: None,
            is_published: true,
            ticket_url: None,
        }
    }

    #[test]
    fn params_trim_and_default_area() {
        let params = event_params(input()).expect("valid");
        assert_eq!(params.title, "Trivia Night");
        assert_eq!(params.venue_area, DEFAULT_VENUE_AREA);
        assert!(params.description.is_none());
    }

    #[test]
    fn end_before_start_is_rejected() {
        let mut input = input();
        input.ends_at = Some(datetime!(2025-03-01 18:00));
        assert!(matches!(
            event_params(input),
            Err(AdminError::Validation(_))
        ));
    }

    #[test]
    fn blank_title_is_rejected() {
        let mut input = input();
        input.title = " ".to_string();
        assert!(event_params(input).is_err());
    }

    #[tokio::test]
    async fn failed_write_discards_the_new_upload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let local = Arc::new(LocalMediaStore::new(dir.path().to_path_buf()).expect("store"));
        let media = MediaService::new(Arc::new(DisabledMediaStore), local);
        let repo = Arc::new(RejectingEvents);
        let service = AdminEventService::new(repo.clone(), repo, media);

        let poster = UploadedFile::new(
            "poster.png",
            Some("image/png".to_string()),
            Bytes::from_static(b"\x89PNG\r\n\x1a\nposter"),
        );
        let result = service.create(input(), ImageChange::Upload(&poster)).await;

        assert!(matches!(result, Err(AdminError::Repo(RepoError::Timeout))));
        assert_eq!(stored_files(dir.path()), 0);
    }
}
