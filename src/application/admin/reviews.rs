use std::sync::Arc;

use serde::Serialize;
use time::OffsetDateTime;
use tracing::info;

use crate::application::admin::{AdminError, non_blank, not_found_as};
use crate::application::repos::{ReviewParams, ReviewsRepo};
use crate::domain::entities::ReviewRecord;
use crate::domain::types::ReviewSource;

const SOURCE: &str = "application::admin::reviews";
const ADMIN_OTHER_LIMIT: u32 = 200;

#[derive(Debug, Clone)]
pub struct ReviewInput {
    pub source: ReviewSource,
    pub rating: i32,
    pub body: Option<String>,
    pub url: Option<String>,
    pub reviewer_name: Option<String>,
    pub reviewer_avatar: Option<String>,
    pub embed_code: Option<String>,
    pub review_time: Option<OffsetDateTime>,
    pub is_featured: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewsScreen {
    pub featured: Vec<ReviewRecord>,
    pub others: Vec<ReviewRecord>,
}

#[derive(Clone)]
pub struct AdminReviewService {
    repo: Arc<dyn ReviewsRepo>,
}

impl AdminReviewService {
    pub fn new(repo: Arc<dyn ReviewsRepo>) -> Self {
        Self { repo }
    }

    pub async fn screen(&self) -> Result<ReviewsScreen, AdminError> {
        Ok(ReviewsScreen {
            featured: self.repo.list_featured_reviews().await?,
            others: self.repo.list_other_reviews(ADMIN_OTHER_LIMIT).await?,
        })
    }

    pub async fn create(&self, input: ReviewInput) -> Result<ReviewRecord, AdminError> {
        if !(1..=5).contains(&input.rating) {
            return Err(AdminError::validation("rating must be between 1 and 5"));
        }

        let params = ReviewParams {
            source: input.source,
            embed_code: non_blank(input.embed_code),
            rating: input.rating,
            body: non_blank(input.body),
            url: non_blank(input.url),
            reviewer_name: non_blank(input.reviewer_name),
            reviewer_avatar: non_blank(input.reviewer_avatar),
            review_time: input.review_time,
            is_featured: input.is_featured,
        };
        let record = self.repo.create_review(params).await?;
        info!(target = SOURCE, id = record.id, source = %record.source, "review created");
        Ok(record)
    }

    /// Flip the featured flag, returning the new value.
    pub async fn toggle_featured(&self, id: i64) -> Result<bool, AdminError> {
        let review = self
            .repo
            .find_review(id)
            .await?
            .ok_or(AdminError::NotFound { entity: "review" })?;
        let featured = !review.is_featured;
        self.repo
            .set_review_featured(id, featured)
            .await
            .map_err(not_found_as("review"))?;
        Ok(featured)
    }

    pub async fn delete(&self, id: i64) -> Result<(), AdminError> {
        self.repo
            .delete_review(id)
            .await
            .map_err(not_found_as("review"))?;
        info!(target = SOURCE, id, "review deleted");
        Ok(())
    }
}
