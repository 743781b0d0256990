//! Public form submissions. Browsers post urlencoded or multipart forms, scripts
//! may post JSON; all three decode into the same submission types.

use axum::{
    Form, Json,
    extract::{FromRequest, Multipart, Request, State},
    http::header::CONTENT_TYPE,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::application::submissions::{
    ContactSubmission, MusicianSubmission, RentalSubmission, SubmissionReceipt,
};

use super::ApiState;
use super::error::ApiError;

/// Fields whose text form is an integer.
const INTEGER_FIELDS: &[&str] = &["party_size"];

pub struct SubmissionPayload(Map<String, Value>);

impl<S> FromRequest<S> for SubmissionPayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("application/json") {
            let Json(fields) = Json::<Map<String, Value>>::from_request(req, state)
                .await
                .map_err(|err| ApiError::bad_request("invalid JSON body", Some(err.body_text())))?;
            return Ok(Self(fields));
        }

        if content_type.starts_with("multipart/form-data") {
            let mut multipart = Multipart::from_request(req, state).await.map_err(|err| {
                ApiError::bad_request("invalid multipart payload", Some(err.body_text()))
            })?;
            let mut fields = Map::new();
            while let Some(field) = multipart.next_field().await.map_err(|err| {
                ApiError::bad_request("invalid multipart payload", Some(err.to_string()))
            })? {
                // File parts (press kits) are accepted but not stored.
                if field.file_name().is_some() {
                    continue;
                }
                let Some(name) = field.name().map(str::to_string) else {
                    continue;
                };
                let text = field.text().await.map_err(|err| {
                    ApiError::bad_request("invalid multipart payload", Some(err.to_string()))
                })?;
                fields.insert(name, Value::String(text));
            }
            return Ok(Self(coerce_text_fields(fields)));
        }

        let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
            .await
            .map_err(|err| ApiError::bad_request("invalid form body", Some(err.body_text())))?;
        let fields = pairs
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect();
        Ok(Self(coerce_text_fields(fields)))
    }
}

impl SubmissionPayload {
    fn decode<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        serde_json::from_value(Value::Object(self.0))
            .map_err(|err| ApiError::bad_request("invalid submission", Some(err.to_string())))
    }
}

/// Text forms carry numbers as strings; blank or non-numeric values are dropped.
fn coerce_text_fields(mut fields: Map<String, Value>) -> Map<String, Value> {
    for key in INTEGER_FIELDS {
        let parsed = match fields.get(*key) {
            Some(Value::String(raw)) => Some(raw.trim().parse::<i64>().ok()),
            _ => None,
        };
        match parsed {
            Some(Some(number)) => {
                fields.insert((*key).to_string(), Value::from(number));
            }
            Some(None) => {
                fields.remove(*key);
            }
            None => {}
        }
    }
    fields
}

pub async fn musician(
    State(state): State<ApiState>,
    payload: SubmissionPayload,
) -> Result<Json<SubmissionReceipt>, ApiError> {
    let form: MusicianSubmission = payload.decode()?;
    Ok(Json(state.submissions.submit_musician(form).await?))
}

pub async fn rental(
    State(state): State<ApiState>,
    payload: SubmissionPayload,
) -> Result<Json<SubmissionReceipt>, ApiError> {
    let form: RentalSubmission = payload.decode()?;
    Ok(Json(state.submissions.submit_rental(form).await?))
}

pub async fn contact(
    State(state): State<ApiState>,
    payload: SubmissionPayload,
) -> Result<Json<SubmissionReceipt>, ApiError> {
    let form: ContactSubmission = payload.decode()?;
    Ok(Json(state.submissions.submit_contact(form).await))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn party_size_text_becomes_a_number() {
        let mut fields = Map::new();
        fields.insert("party_size".into(), Value::String(" 40 ".into()));
        let fields = coerce_text_fields(fields);
        assert_eq!(fields.get("party_size"), Some(&Value::from(40)));
    }

    #[test]
    fn blank_party_size_is_dropped() {
        let mut fields = Map::new();
        fields.insert("party_size".into(), Value::String(String::new()));
        fields.insert("name".into(), Value::String("Ada".into()));
        let fields = coerce_text_fields(fields);
        assert!(!fields.contains_key("party_size"));

        let form: RentalSubmission = SubmissionPayload(fields).decode().expect("decode");
        assert_eq!(form.name, "Ada");
        assert!(form.party_size.is_none());
    }
}
