//! Back-office form bodies. Screens with an image input post multipart, the rest
//! post urlencoded; both land in the same field list.

use axum::{
    Form,
    extract::{FromRequest, Request},
    http::{StatusCode, header::CONTENT_TYPE},
};
use axum_extra::extract::Multipart;

use crate::application::{error::HttpError, media::UploadedFile};

const SOURCE: &str = "infra::http::admin::form";

/// Checkbox values browsers and scripts send for "off".
const FALSE_VALUES: &[&str] = &["", "0", "false", "off"];

#[derive(Debug, Default)]
pub(super) struct AdminForm {
    fields: Vec<(String, String)>,
    files: Vec<(String, UploadedFile)>,
}

impl<S> FromRequest<S> for AdminForm
where
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.to_ascii_lowercase().starts_with("multipart/form-data"));

        if !is_multipart {
            let Form(fields) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|err| {
                    HttpError::new(
                        SOURCE,
                        StatusCode::BAD_REQUEST,
                        "Invalid form submission",
                        err.body_text(),
                    )
                })?;
            return Ok(Self {
                fields,
                files: Vec::new(),
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|err| invalid_multipart(err.to_string()))?;
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|err| invalid_multipart(err.to_string()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if let Some(file_name) = field.file_name().map(str::to_string) {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| invalid_multipart(err.to_string()))?;
                form.files
                    .push((name, UploadedFile::new(file_name, content_type, bytes)));
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|err| invalid_multipart(err.to_string()))?;
                form.fields.push((name, text));
            }
        }
        Ok(form)
    }
}

fn invalid_multipart(detail: String) -> HttpError {
    HttpError::new(
        SOURCE,
        StatusCode::BAD_REQUEST,
        "Invalid form submission",
        detail,
    )
}

impl AdminForm {
    #[cfg(test)]
    pub(super) fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            fields: pairs
                .iter()
                .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
                .collect(),
            files: Vec::new(),
        }
    }

    /// First value posted under `name`.
    pub(super) fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub(super) fn owned(&self, name: &str) -> Option<String> {
        self.text(name).map(str::to_string)
    }

    pub(super) fn required(&self, name: &str) -> Result<&str, HttpError> {
        match self.text(name).map(str::trim) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(HttpError::new(
                SOURCE,
                StatusCode::BAD_REQUEST,
                format!("{name} is required"),
                format!("missing form field `{name}`"),
            )),
        }
    }

    /// Unchecked boxes are simply absent from the body.
    pub(super) fn checked(&self, name: &str) -> bool {
        self.text(name)
            .is_some_and(|value| !FALSE_VALUES.contains(&value.trim().to_ascii_lowercase().as_str()))
    }

    /// Optional integer field; blank means absent.
    pub(super) fn integer(&self, name: &str) -> Result<Option<i64>, HttpError> {
        match self.text(name).map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|_| {
                HttpError::new(
                    SOURCE,
                    StatusCode::BAD_REQUEST,
                    format!("{name} must be a whole number"),
                    format!("`{name}` = `{raw}`"),
                )
            }),
        }
    }

    pub(super) fn required_id(&self, name: &str) -> Result<i64, HttpError> {
        self.integer(name)?.ok_or_else(|| {
            HttpError::new(
                SOURCE,
                StatusCode::BAD_REQUEST,
                format!("{name} is required"),
                format!("missing form field `{name}`"),
            )
        })
    }

    /// Every parseable value of a repeated field, such as tag checkboxes.
    pub(super) fn integers(&self, name: &str) -> Vec<i64> {
        self.fields
            .iter()
            .filter(|(key, _)| key == name)
            .filter_map(|(_, value)| value.trim().parse().ok())
            .collect()
    }

    /// Fields named `<prefix><suffix>`, yielded as `(suffix, value)`.
    pub(super) fn with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.fields.iter().filter_map(move |(key, value)| {
            key.strip_prefix(prefix)
                .map(|suffix| (suffix, value.as_str()))
        })
    }

    /// The uploaded file under `name`, if the browser sent a non-empty one.
    pub(super) fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files
            .iter()
            .find(|(key, file)| key == name && !file.is_blank())
            .map(|(_, file)| file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkbox_semantics() {
        let form = AdminForm::from_pairs(&[("a", "on"), ("b", "false"), ("c", ""), ("d", "1")]);
        assert!(form.checked("a"));
        assert!(!form.checked("b"));
        assert!(!form.checked("c"));
        assert!(form.checked("d"));
        assert!(!form.checked("missing"));
    }

    #[test]
    fn repeated_and_prefixed_fields() {
        let form = AdminForm::from_pairs(&[
            ("tag_ids", "3"),
            ("tag_ids", "x"),
            ("tag_ids", "5"),
            ("rank_7", "2"),
            ("rank_9", ""),
        ]);
        assert_eq!(form.integers("tag_ids"), vec![3, 5]);
        let ranks: Vec<_> = form.with_prefix("rank_").collect();
        assert_eq!(ranks, vec![("7", "2"), ("9", "")]);
    }

    #[test]
    fn malformed_integers_are_rejected() {
        let form = AdminForm::from_pairs(&[("featured_rank", "abc"), ("sort_order", " ")]);
        let err = form.integer("featured_rank").expect_err("not a number");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(form.integer("sort_order").expect("blank"), None);
    }
}
