//! Request extractors and file responses.
//!
//! axum's stock `Json`, `Query` and `Path` rejections answer in plain text. These wrappers turn
//! them into [`ApiError`]s so that every failure uses the same envelope.

use crate::error::ApiError;
use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// JSON body whose deserialisation errors become 400s naming the offending field.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        parse_json(&bytes).map(ValidJson)
    }
}

/// Deserialise `bytes`, reporting the JSON path of the first bad field.
pub(crate) fn parse_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    if bytes.is_empty() {
        return Err(ApiError::bad_request("Request body is required"));
    }
    let deserializer = &mut serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(deserializer).map_err(|err| {
        let path = err.path().to_string();
        let inner = err.into_inner().to_string();
        // serde_json appends the byte position, which means nothing to a form.
        let reason = inner.split(" at line ").next().unwrap_or(&inner);
        if path == "." {
            ApiError::bad_request(reason)
        } else {
            ApiError::bad_request(format!("{path}: {reason}"))
        }
    })
}

/// Query string extractor with enveloped rejections.
#[derive(Debug, Clone)]
pub struct ValidQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::try_from_uri(&parts.uri)
            .map(|Query(value)| ValidQuery(value))
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
    }
}

/// The `:id` path segment of a resource route.
#[derive(Debug, Clone, Copy)]
pub struct ResourceId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for ResourceId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<Uuid>::from_request_parts(parts, state)
            .await
            .map(|Path(id)| ResourceId(id))
            .map_err(|_| ApiError::bad_request("Invalid id"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Browser downloads the file.
    Attachment,
    /// Browser shows the file in place.
    Inline,
}

/// A rendered PDF named after the record it prints.
#[derive(Debug)]
pub struct Pdf {
    name: String,
    bytes: Vec<u8>,
    disposition: Disposition,
}

impl Pdf {
    pub fn attachment((name, bytes): (String, Vec<u8>)) -> Self {
        Self {
            name,
            bytes,
            disposition: Disposition::Attachment,
        }
    }

    pub fn inline((name, bytes): (String, Vec<u8>)) -> Self {
        Self {
            name,
            bytes,
            disposition: Disposition::Inline,
        }
    }

    fn content_disposition(&self) -> String {
        let kind = match self.disposition {
            Disposition::Attachment => "attachment",
            Disposition::Inline => "inline",
        };
        let safe: String = self
            .name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
            .collect();
        format!("{kind}; filename=\"{safe}.pdf\"")
    }
}

impl IntoResponse for Pdf {
    fn into_response(self) -> Response {
        let disposition = self.content_disposition();
        (
            [
                (CONTENT_TYPE, "application/pdf".to_owned()),
                (CONTENT_DISPOSITION, disposition),
            ],
            self.bytes,
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    #[allow(dead_code)]
    struct TransferBody {
        bed_id: Uuid,
        days: u32,
    }

    #[test]
    fn test_parse_json_names_the_field() {
        let err = parse_json::<TransferBody>(br#"{"bedId": "nope", "days": 2}"#)
            .expect_err("bad uuid should fail");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.message().starts_with("bedId: "), "{}", err.message());
        assert!(!err.message().contains("line"));
    }

    #[test]
    fn test_parse_json_rejects_empty_body() {
        let err = parse_json::<TransferBody>(b"").expect_err("empty body should fail");
        assert_eq!(err.message(), "Request body is required");
    }

    #[test]
    fn test_pdf_disposition() {
        let pdf = Pdf::attachment(("OPD-00001".into(), vec![]));
        assert_eq!(pdf.content_disposition(), "attachment; filename=\"OPD-00001.pdf\"");

        let pdf = Pdf::inline(("VISIT/2026\"x".into(), vec![]));
        assert_eq!(pdf.content_disposition(), "inline; filename=\"VISIT2026x.pdf\"");
    }
}
