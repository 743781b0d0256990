//! Best-effort forwarding of public form submissions to an external form inbox.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormKind {
    Musician,
    Rental,
    Contact,
}

impl FormKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FormKind::Musician => "musician",
            FormKind::Rental => "rental",
            FormKind::Contact => "contact",
        }
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    Delivered,
    NotConfigured,
    Rejected { status: u16, body: String },
    Failed { reason: String },
}

impl RelayOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, RelayOutcome::Delivered)
    }

    /// Label used for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            RelayOutcome::Delivered => "delivered",
            RelayOutcome::NotConfigured => "not_configured",
            RelayOutcome::Rejected { .. } => "rejected",
            RelayOutcome::Failed { .. } => "failed",
        }
    }

    pub fn reason(&self) -> Option<String> {
        match self {
            RelayOutcome::Delivered => None,
            RelayOutcome::NotConfigured => Some("Formspree endpoint not configured".to_string()),
            RelayOutcome::Rejected { status, .. } => Some(format!("relay answered {status}")),
            RelayOutcome::Failed { reason } => Some(reason.clone()),
        }
    }
}

/// Flattened form fields sent to the relay.
pub type FormFields = Map<String, Value>;

#[async_trait]
pub trait FormRelay: Send + Sync {
    async fn forward(&self, kind: FormKind, fields: &FormFields) -> RelayOutcome;
}

/// Relay used when no endpoint is configured for any form kind.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledFormRelay;

#[async_trait]
impl FormRelay for DisabledFormRelay {
    async fn forward(&self, _kind: FormKind, _fields: &FormFields) -> RelayOutcome {
        RelayOutcome::NotConfigured
    }
}
