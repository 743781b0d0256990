//! Public form submissions: persist first, then relay best-effort.

use std::sync::Arc;

use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{info, warn};

use crate::application::admin::non_blank;
use crate::application::forms::{FormFields, FormKind, FormRelay, RelayOutcome};
use crate::application::repos::{MusicianRepo, NewMusicianApp, NewRental, RentalsRepo, RepoError};
use crate::domain::datetime::{format_local_datetime, now_local, parse_local_datetime};

const SOURCE: &str = "application::submissions";

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MusicianSubmission {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
    pub genre: Option<String>,
    pub link: Option<String>,
    pub socials: Option<Value>,
    pub file_url: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RentalSubmission {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
    pub date: Option<String>,
    pub event_date: Option<String>,
    pub package: Option<String>,
    pub venue_area: Option<String>,
    pub party_size: Option<i32>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactSubmission {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub message: Option<String>,
}

/// Body returned to the browser after a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionReceipt {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relay_error: Option<String>,
}

#[derive(Clone)]
pub struct SubmissionService {
    rentals: Arc<dyn RentalsRepo>,
    musicians: Arc<dyn MusicianRepo>,
    relay: Arc<dyn FormRelay>,
}

impl SubmissionService {
    pub fn new(
        rentals: Arc<dyn RentalsRepo>,
        musicians: Arc<dyn MusicianRepo>,
        relay: Arc<dyn FormRelay>,
    ) -> Self {
        Self {
            rentals,
            musicians,
            relay,
        }
    }

    pub async fn submit_musician(
        &self,
        form: MusicianSubmission,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let name = required(&form.name, "name")?;
        let email = required(&form.email, "email")?;

        let application = NewMusicianApp {
            name,
            email,
            phone: non_blank(form.phone),
            genre: non_blank(form.genre),
            link: non_blank(form.link),
            socials: form.socials.filter(|value| !value.is_null()),
            file_url: non_blank(form.file_url),
            message: non_blank(form.message),
        };
        let record = self.musicians.create_application(application).await?;
        info!(target = SOURCE, id = record.id, "musician application stored");

        let fields = fields_of(json!({
            "name": record.name,
            "email": record.email,
            "phone": record.phone,
            "genre": record.genre,
            "link": record.link,
            "message": record.message,
        }));
        let outcome = self.relay(FormKind::Musician, &fields).await;

        Ok(SubmissionReceipt {
            success: true,
            id: Some(record.id),
            message: "Musician application submitted successfully".to_string(),
            relay_error: outcome.reason(),
        })
    }

    /// `date` wins over `event_date`; an unparseable or missing date records the
    /// submission time.
    pub async fn submit_rental(
        &self,
        form: RentalSubmission,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let name = required(&form.name, "name")?;
        let email = required(&form.email, "email")?;
        let event_date = non_blank(form.date)
            .or_else(|| non_blank(form.event_date))
            .and_then(|raw| parse_local_datetime(&raw).ok())
            .unwrap_or_else(now_local);

        let rental = NewRental {
            name,
            email,
            phone: non_blank(form.phone),
            event_date,
            package: non_blank(form.package),
            venue_area: non_blank(form.venue_area),
            party_size: form.party_size.filter(|size| *size > 0),
            message: non_blank(form.message),
        };
        let record = self.rentals.create_rental(rental).await?;
        info!(target = SOURCE, id = record.id, "rental request stored");

        let fields = fields_of(json!({
            "name": record.name,
            "email": record.email,
            "phone": record.phone,
            "event_date": format_local_datetime(record.event_date),
            "party_size": record.party_size,
            "message": record.message,
        }));
        let outcome = self.relay(FormKind::Rental, &fields).await;

        Ok(SubmissionReceipt {
            success: true,
            id: Some(record.id),
            message: "Venue rental request submitted successfully".to_string(),
            relay_error: outcome.reason(),
        })
    }

    /// Contact messages are not stored; the receipt is successful whatever the relay says.
    pub async fn submit_contact(&self, form: ContactSubmission) -> SubmissionReceipt {
        let fields = fields_of(json!({
            "name": form.name.trim(),
            "email": form.email.trim(),
            "message": non_blank(form.message),
        }));
        let outcome = self.relay(FormKind::Contact, &fields).await;

        SubmissionReceipt {
            success: true,
            id: None,
            message: "Contact message received".to_string(),
            relay_error: outcome.reason(),
        }
    }

    async fn relay(&self, kind: FormKind, fields: &FormFields) -> RelayOutcome {
        let outcome = self.relay.forward(kind, fields).await;
        counter!(
            "taproom_form_relay_total",
            "kind" => kind.as_str(),
            "outcome" => outcome.label()
        )
        .increment(1);
        match &outcome {
            RelayOutcome::Delivered | RelayOutcome::NotConfigured => {}
            other => warn!(
                target = SOURCE,
                kind = %kind,
                outcome = other.label(),
                reason = other.reason().unwrap_or_default(),
                "form relay did not deliver"
            ),
        }
        outcome
    }
}

fn required(value: &str, field: &str) -> Result<String, SubmissionError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SubmissionError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn fields_of(value: Value) -> FormFields {
    match value {
        Value::Object(map) => map,
        _ => FormFields::new(),
    }
}
