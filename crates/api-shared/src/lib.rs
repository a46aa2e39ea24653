//! # API Shared
//!
//! Shared utilities and definitions for the HIS APIs.
//!
//! Contains:
//! - Authentication primitives: roles, JWT signing and verification, the route policy table
//! - Response envelopes used by every handler
//! - Shared services like `HealthService`
//!
//! Used by `his-core` (for roles and dropdown options) and `api-rest`.

pub mod auth;
pub mod envelope;
pub mod health;

pub use auth::{extract_bearer_token, Access, AuthError, Claims, JwtKeys, Policy, Role, RouteGroup};
pub use envelope::{ApiResponse, DropdownOption, LegacyResponse};
pub use health::{HealthRes, HealthService};
