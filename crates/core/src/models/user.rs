use crate::constants::{MAX_NAME_LEN, MIN_PASSWORD_LEN};
use crate::time::Timestamp;
use crate::validation::{max_len, Validate};
use crate::{HisError, HisResult};
use api_shared::Role;
use his_types::{EmailAddress, NonEmptyText};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A staff login. The stored form carries the password hash; APIs return [`UserProfile`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: NonEmptyText,
    pub email: EmailAddress,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: NonEmptyText,
    pub email: EmailAddress,
    pub role: Role,
    pub is_active: bool,
    pub created_at: Timestamp,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: NonEmptyText,
    pub email: EmailAddress,
    pub password: String,
    pub role: Role,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> HisResult<()> {
        max_len("name", self.name.as_str(), MAX_NAME_LEN)?;
        password_strength(&self.password)
    }
}

pub(crate) fn password_strength(password: &str) -> HisResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(HisError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: EmailAddress,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> HisResult<()> {
        if self.password.is_empty() {
            return Err(HisError::validation("password is required"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserStatusRequest {
    pub is_active: bool,
}
