//! Response envelopes.
//!
//! Every resource route answers with [`ApiResponse`]. The `/api/auth/*` routes keep the older
//! [`LegacyResponse`] shape because existing front-end code reads `success` from them.

use serde::{Deserialize, Serialize};

/// Standard envelope: `{ message, data, status }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub status: bool,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            status: true,
        }
    }
}

impl ApiResponse<()> {
    /// Failure envelope. `data` is always `null`.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
            status: false,
        }
    }

    /// Success without a payload, e.g. after a delete.
    pub fn done(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
            status: true,
        }
    }
}

/// Envelope used by the auth routes: `{ success, message, data }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T> LegacyResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl LegacyResponse<()> {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

/// One entry of a picker list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DropdownOption {
    pub value: String,
    pub label: String,
}

impl DropdownOption {
    pub fn new(value: impl ToString, label: impl Into<String>) -> Self {
        Self {
            value: value.to_string(),
            label: label.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_failure_serialises_null_data() {
        let json = serde_json::to_value(ApiResponse::failure("Patient not found"))
            .expect("serialise should succeed");
        assert_eq!(
            json,
            serde_json::json!({"message": "Patient not found", "data": null, "status": false})
        );
    }

    #[test]
    fn test_legacy_response_shape() {
        let json = serde_json::to_value(LegacyResponse::ok("Login successful", 7))
            .expect("serialise should succeed");
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], 7);
    }
}
