//! Mapping from service errors to HTTP responses.
//!
//! Caller mistakes keep their message; anything else is logged with its full source chain and
//! answered with a generic 500 so internals never reach the client.

use api_shared::{ApiResponse, AuthError, LegacyResponse};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use his_core::{HisError, StoreError};

const INTERNAL_MESSAGE: &str = "Internal server error";

/// An error ready to be sent as a standard `{message, data, status}` envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn internal(err: &dyn std::error::Error) -> Self {
        tracing::error!(error = %error_chain(err), "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<HisError> for ApiError {
    fn from(err: HisError) -> Self {
        let status = match &err {
            HisError::Validation(_) | HisError::Precondition(_) => StatusCode::BAD_REQUEST,
            HisError::NotFound(_) => StatusCode::NOT_FOUND,
            HisError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            HisError::Forbidden(_) => StatusCode::FORBIDDEN,
            HisError::Store(StoreError::Duplicate(index)) => {
                return Self::bad_request(format!("A record with the same {} already exists", index));
            }
            _ => return Self::internal(&err),
        };
        Self::new(status, err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken | AuthError::InvalidToken(_) | AuthError::Expired => {
                Self::new(StatusCode::UNAUTHORIZED, err.to_string())
            }
            AuthError::Forbidden => Self::new(StatusCode::FORBIDDEN, err.to_string()),
            AuthError::Encoding(_) => Self::internal(&err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::failure(self.message))).into_response()
    }
}

/// The same error rendered in the `/api/auth/*` envelope.
#[derive(Debug)]
pub struct LegacyError(pub ApiError);

impl From<ApiError> for LegacyError {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl From<HisError> for LegacyError {
    fn from(err: HisError) -> Self {
        Self(ApiError::from(err))
    }
}

impl From<AuthError> for LegacyError {
    fn from(err: AuthError) -> Self {
        Self(ApiError::from(err))
    }
}

impl IntoResponse for LegacyError {
    fn into_response(self) -> Response {
        let ApiError { status, message } = self.0;
        (status, Json(LegacyResponse::failure(message))).into_response()
    }
}

/// `outer: inner: innermost`, following `source()` links.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut chain = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_keep_their_message() {
        let err = ApiError::from(HisError::NotFound("Patient"));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "Patient not found");

        let err = ApiError::from(HisError::precondition("Bed 101 is occupied"));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_duplicate_is_bad_request() {
        let err = ApiError::from(HisError::from(StoreError::Duplicate("email".into())));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.message().contains("email"));
    }

    #[test]
    fn test_internal_errors_are_hidden() {
        let err = ApiError::from(HisError::Pdf("font table missing".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), INTERNAL_MESSAGE);
    }

    #[test]
    fn test_auth_errors() {
        assert_eq!(
            ApiError::from(AuthError::MissingToken).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::Forbidden).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_error_chain_follows_sources() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "catalog.yaml");
        let err = HisError::CatalogRead(io);
        assert_eq!(error_chain(&err), "failed to read catalogue file: catalog.yaml");
    }
}
