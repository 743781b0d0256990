//! Form relay backed by per-kind HTTP endpoints (Formspree-compatible).

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use tracing::debug;
use url::Url;

use crate::application::forms::{FormFields, FormKind, FormRelay, RelayOutcome};
use crate::config::FormRelaySettings;
use crate::infra::error::InfraError;

const SOURCE: &str = "infra::forms";
const MAX_ERROR_BODY_CHARS: usize = 512;

pub struct HttpFormRelay {
    client: Client,
    musician: Option<Url>,
    rental: Option<Url>,
    contact: Option<Url>,
}

impl HttpFormRelay {
    pub fn new(settings: &FormRelaySettings) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(concat!("taproom/", env!("CARGO_PKG_VERSION")))
            .timeout(settings.timeout)
            .build()
            .map_err(|err| InfraError::http_client(err.to_string()))?;

        Ok(Self {
            client,
            musician: settings.musician_endpoint.clone(),
            rental: settings.rental_endpoint.clone(),
            contact: settings.contact_endpoint.clone(),
        })
    }

    /// Whether any form kind has an endpoint.
    pub fn is_configured(&self) -> bool {
        self.musician.is_some() || self.rental.is_some() || self.contact.is_some()
    }

    fn endpoint(&self, kind: FormKind) -> Option<&Url> {
        match kind {
            FormKind::Musician => self.musician.as_ref(),
            FormKind::Rental => self.rental.as_ref(),
            FormKind::Contact => self.contact.as_ref(),
        }
    }
}

#[async_trait]
impl FormRelay for HttpFormRelay {
    async fn forward(&self, kind: FormKind, fields: &FormFields) -> RelayOutcome {
        let Some(endpoint) = self.endpoint(kind) else {
            return RelayOutcome::NotConfigured;
        };

        let response = match self
            .client
            .post(endpoint.clone())
            .header(header::ACCEPT, "application/json")
            .json(fields)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                let reason = if err.is_timeout() {
                    "relay timed out".to_string()
                } else {
                    err.to_string()
                };
                return RelayOutcome::Failed { reason };
            }
        };

        let status = response.status();
        if is_delivered(status) {
            debug!(target = SOURCE, kind = %kind, status = status.as_u16(), "form relayed");
            return RelayOutcome::Delivered;
        }

        let body = response.text().await.unwrap_or_default();
        RelayOutcome::Rejected {
            status: status.as_u16(),
            body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        }
    }
}

fn is_delivered(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::OK | StatusCode::CREATED | StatusCode::ACCEPTED
    )
}
