//! Application services for the back office.

pub mod dashboard;
pub mod events;
pub mod inbox;
pub mod menu;
pub mod reviews;
pub mod site;
pub mod taxonomy;

pub use dashboard::{AdminDashboardService, DashboardCounts};
pub use events::{AdminEventService, EventInput};
pub use inbox::AdminInboxService;
pub use menu::{AdminMenuService, ImageChange, MenuItemInput};
pub use reviews::{AdminReviewService, ReviewInput};
pub use site::{AdminSiteService, SiteBasicInput, TimeSlotInput};
pub use taxonomy::{AdminTaxonomyService, CategoryInput, TagInput};

use thiserror::Error;

use crate::application::media::MediaService;
use crate::application::repos::RepoError;
use crate::domain::error::DomainError;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
    #[error("{0}")]
    Validation(String),
    #[error("Cannot delete {entity} used by {count} menu items")]
    InUse { entity: &'static str, count: u64 },
    #[error("{0}")]
    Duplicate(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl AdminError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<DomainError> for AdminError {
    fn from(err: DomainError) -> Self {
        AdminError::Validation(err.into_message())
    }
}

/// Map a repository miss on a keyed write to the entity's not-found error.
pub(crate) fn not_found_as(entity: &'static str) -> impl Fn(RepoError) -> AdminError {
    move |err| match err {
        RepoError::NotFound => AdminError::NotFound { entity },
        other => AdminError::Repo(other),
    }
}

/// Remove an asset stored for a write that did not go through.
pub(crate) async fn discard_upload(media: &MediaService, uploaded: Option<String>) {
    if let Some(url) = uploaded {
        media.delete(&url).await;
    }
}

/// Trim an optional text field, treating blank input as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

pub(crate) fn require_text(value: &str, field: &str) -> Result<String, AdminError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AdminError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}
