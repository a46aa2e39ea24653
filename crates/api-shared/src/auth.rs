//! Authentication and authorisation primitives.
//!
//! Tokens are HS256 JWTs carrying `{ id, role, iat, exp }`. Older clients send `userId` instead of
//! `id`, so both are accepted when decoding. Which roles may call which routes is decided by a
//! single [`Policy`] table rather than by per-route checks.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Errors raised while issuing or checking tokens.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authorization token missing")]
    MissingToken,
    #[error("Invalid token: {0}")]
    InvalidToken(&'static str),
    #[error("Token expired")]
    Expired,
    #[error("You do not have permission to perform this action")]
    Forbidden,
    #[error("failed to encode token: {0}")]
    Encoding(String),
}

/// Staff roles. Wire names are snake_case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Doctor,
    Receptionist,
    Nurse,
    LabTechnician,
    Radiologist,
    Accountant,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Admin,
        Role::Doctor,
        Role::Receptionist,
        Role::Nurse,
        Role::LabTechnician,
        Role::Radiologist,
        Role::Accountant,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Receptionist => "receptionist",
            Role::Nurse => "nurse",
            Role::LabTechnician => "lab_technician",
            Role::Radiologist => "radiologist",
            Role::Accountant => "accountant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or(AuthError::InvalidToken("unknown role"))
    }
}

/// JWT payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(alias = "userId")]
    pub id: Uuid,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Signing material and token lifetime, resolved once at startup.
#[derive(Clone)]
pub struct JwtKeys {
    secret: Vec<u8>,
    ttl: Duration,
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl JwtKeys {
    pub fn new(secret: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        HmacSha256::new_from_slice(&self.secret).map_err(|e| AuthError::Encoding(e.to_string()))
    }

    /// Issues a token for `user_id` valid from `now` for the configured lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Encoding`] if the header or claims cannot be serialised.
    pub fn issue(&self, user_id: Uuid, role: Role, now: DateTime<Utc>) -> Result<String, AuthError> {
        let header = Header {
            alg: "HS256".into(),
            typ: "JWT".into(),
        };
        let claims = Claims {
            id: user_id,
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        let header_json =
            serde_json::to_vec(&header).map_err(|e| AuthError::Encoding(e.to_string()))?;
        let claims_json =
            serde_json::to_vec(&claims).map_err(|e| AuthError::Encoding(e.to_string()))?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header_json),
            URL_SAFE_NO_PAD.encode(claims_json)
        );

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature}"))
    }

    /// Verifies signature, algorithm and expiry, returning the claims.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidToken`] for malformed tokens, wrong algorithm or bad signature.
    /// - [`AuthError::Expired`] when `exp` is at or before `now`.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let mut parts = token.split('.');
        let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::InvalidToken("malformed token"));
        };

        let header_bytes = URL_SAFE_NO_PAD
            .decode(header_b64)
            .map_err(|_| AuthError::InvalidToken("malformed header"))?;
        let header: Header = serde_json::from_slice(&header_bytes)
            .map_err(|_| AuthError::InvalidToken("malformed header"))?;
        if header.alg != "HS256" {
            return Err(AuthError::InvalidToken("unsupported algorithm"));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| AuthError::InvalidToken("malformed signature"))?;
        let mut mac = self.mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::InvalidToken("bad signature"))?;

        let claims_bytes = URL_SAFE_NO_PAD
            .decode(claims_b64)
            .map_err(|_| AuthError::InvalidToken("malformed claims"))?;
        let claims: Claims = serde_json::from_slice(&claims_bytes)
            .map_err(|_| AuthError::InvalidToken("malformed claims"))?;

        if claims.exp <= now.timestamp() {
            return Err(AuthError::Expired);
        }
        Ok(claims)
    }
}

/// Pulls the token out of an `Authorization: Bearer <token>` header value.
///
/// # Errors
///
/// Returns [`AuthError::MissingToken`] when the header is absent or blank, and
/// [`AuthError::InvalidToken`] when it does not use the Bearer scheme.
pub fn extract_bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.map(str::trim).filter(|v| !v.is_empty());
    let value = value.ok_or(AuthError::MissingToken)?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidToken("authorization header must use Bearer scheme"))?
        .trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

// ============================================================================
// POLICY
// ============================================================================

/// Groups of routes that share an access rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteGroup {
    Users,
    Patients,
    Doctors,
    Visits,
    Appointments,
    Facilities,
    Catalog,
    OpdBilling,
    Ipd,
    Lab,
    Radiology,
    Clinical,
    Dashboard,
}

/// Reads are `GET`/`HEAD`; everything else is a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Read,
    Write,
}

#[derive(Debug, Clone)]
struct Rule {
    group: RouteGroup,
    access: Access,
    roles: &'static [Role],
}

const EVERYONE: &[Role] = &Role::ALL;
const FRONT_DESK: &[Role] = &[Role::Admin, Role::Receptionist, Role::Doctor, Role::Nurse];
const BILLING: &[Role] = &[Role::Admin, Role::Receptionist, Role::Accountant];
const BILLING_READ: &[Role] = &[
    Role::Admin,
    Role::Receptionist,
    Role::Accountant,
    Role::Doctor,
    Role::Nurse,
];
const WARD_STAFF: &[Role] = &[Role::Admin, Role::Receptionist, Role::Doctor, Role::Nurse];
const LAB_READ: &[Role] = &[
    Role::Admin,
    Role::Doctor,
    Role::Nurse,
    Role::Receptionist,
    Role::LabTechnician,
    Role::Radiologist,
];
const LAB_WRITE: &[Role] = &[Role::Admin, Role::LabTechnician];
const RADIOLOGY_WRITE: &[Role] = &[Role::Admin, Role::Radiologist];
const CLINICAL_READ: &[Role] = &[Role::Admin, Role::Doctor, Role::Nurse, Role::Receptionist];
const CLINICAL_WRITE: &[Role] = &[Role::Admin, Role::Doctor];
const ADMIN: &[Role] = &[Role::Admin];

const HOSPITAL_RULES: &[Rule] = &[
    Rule { group: RouteGroup::Users, access: Access::Read, roles: ADMIN },
    Rule { group: RouteGroup::Users, access: Access::Write, roles: ADMIN },
    Rule { group: RouteGroup::Patients, access: Access::Read, roles: EVERYONE },
    Rule { group: RouteGroup::Patients, access: Access::Write, roles: FRONT_DESK },
    Rule { group: RouteGroup::Doctors, access: Access::Read, roles: EVERYONE },
    Rule { group: RouteGroup::Doctors, access: Access::Write, roles: ADMIN },
    Rule { group: RouteGroup::Visits, access: Access::Read, roles: EVERYONE },
    Rule { group: RouteGroup::Visits, access: Access::Write, roles: FRONT_DESK },
    Rule { group: RouteGroup::Appointments, access: Access::Read, roles: EVERYONE },
    Rule { group: RouteGroup::Appointments, access: Access::Write, roles: FRONT_DESK },
    Rule { group: RouteGroup::Facilities, access: Access::Read, roles: EVERYONE },
    Rule { group: RouteGroup::Facilities, access: Access::Write, roles: ADMIN },
    Rule { group: RouteGroup::Catalog, access: Access::Read, roles: EVERYONE },
    Rule { group: RouteGroup::Catalog, access: Access::Write, roles: ADMIN },
    Rule { group: RouteGroup::OpdBilling, access: Access::Read, roles: BILLING_READ },
    Rule { group: RouteGroup::OpdBilling, access: Access::Write, roles: BILLING },
    Rule { group: RouteGroup::Ipd, access: Access::Read, roles: BILLING_READ },
    Rule { group: RouteGroup::Ipd, access: Access::Write, roles: WARD_STAFF },
    Rule { group: RouteGroup::Lab, access: Access::Read, roles: LAB_READ },
    Rule { group: RouteGroup::Lab, access: Access::Write, roles: LAB_WRITE },
    Rule { group: RouteGroup::Radiology, access: Access::Read, roles: LAB_READ },
    Rule { group: RouteGroup::Radiology, access: Access::Write, roles: RADIOLOGY_WRITE },
    Rule { group: RouteGroup::Clinical, access: Access::Read, roles: CLINICAL_READ },
    Rule { group: RouteGroup::Clinical, access: Access::Write, roles: CLINICAL_WRITE },
    Rule { group: RouteGroup::Dashboard, access: Access::Read, roles: EVERYONE },
];

/// Declarative map from `(route group, access)` to the roles allowed through.
///
/// A pair with no rule denies everyone.
#[derive(Debug, Clone)]
pub struct Policy {
    rules: Vec<Rule>,
}

impl Policy {
    /// The table the hospital runs with.
    pub fn hospital() -> Self {
        Self {
            rules: HOSPITAL_RULES.to_vec(),
        }
    }

    /// A policy that lets every role through every group. Used by tests that exercise
    /// handlers rather than access control.
    pub fn permissive() -> Self {
        let groups = HOSPITAL_RULES.iter().map(|r| r.group);
        let rules = groups
            .flat_map(|group| {
                [Access::Read, Access::Write].map(|access| Rule {
                    group,
                    access,
                    roles: EVERYONE,
                })
            })
            .collect();
        Self { rules }
    }

    pub fn allows(&self, group: RouteGroup, access: Access, role: Role) -> bool {
        self.rules
            .iter()
            .filter(|rule| rule.group == group && rule.access == access)
            .any(|rule| rule.roles.contains(&role))
    }

    /// # Errors
    ///
    /// Returns [`AuthError::Forbidden`] when the role is not on the allow-list.
    pub fn authorize(&self, group: RouteGroup, access: Access, role: Role) -> Result<(), AuthError> {
        if self.allows(group, access, role) {
            Ok(())
        } else {
            Err(AuthError::Forbidden)
        }
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self::hospital()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn keys() -> JwtKeys {
        JwtKeys::new("test-secret", Duration::hours(1))
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    #[test]
    fn test_issue_then_verify() {
        let user = Uuid::new_v4();
        let token = keys()
            .issue(user, Role::Doctor, now())
            .expect("issue should succeed");
        let claims = keys().verify(&token, now()).expect("verify should succeed");
        assert_eq!(claims.id, user);
        assert_eq!(claims.role, Role::Doctor);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_verify_rejects_other_secret() {
        let token = keys()
            .issue(Uuid::new_v4(), Role::Admin, now())
            .expect("issue should succeed");
        let other = JwtKeys::new("another-secret", Duration::hours(1));
        assert_eq!(
            other.verify(&token, now()),
            Err(AuthError::InvalidToken("bad signature"))
        );
    }

    #[test]
    fn test_verify_rejects_expired() {
        let token = keys()
            .issue(Uuid::new_v4(), Role::Nurse, now())
            .expect("issue should succeed");
        let later = now() + Duration::hours(2);
        assert_eq!(keys().verify(&token, later), Err(AuthError::Expired));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        assert!(matches!(
            keys().verify("not-a-token", now()),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_claims_accept_user_id_alias() {
        let id = Uuid::new_v4();
        let json = serde_json::json!({"userId": id, "role": "lab_technician", "iat": 1, "exp": 2});
        let claims: Claims = serde_json::from_value(json).expect("decode should succeed");
        assert_eq!(claims.id, id);
        assert_eq!(claims.role, Role::LabTechnician);
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token(Some("Bearer abc")), Ok("abc"));
        assert_eq!(extract_bearer_token(None), Err(AuthError::MissingToken));
        assert!(matches!(
            extract_bearer_token(Some("Basic abc")),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_policy_gates_writes() {
        let policy = Policy::hospital();
        assert!(policy.allows(RouteGroup::Patients, Access::Read, Role::Accountant));
        assert!(!policy.allows(RouteGroup::Patients, Access::Write, Role::Accountant));
        assert!(policy.allows(RouteGroup::Lab, Access::Write, Role::LabTechnician));
        assert_eq!(
            policy.authorize(RouteGroup::Users, Access::Write, Role::Doctor),
            Err(AuthError::Forbidden)
        );
    }

    #[test]
    fn test_dashboard_has_no_write_rule() {
        let policy = Policy::hospital();
        assert!(!policy.allows(RouteGroup::Dashboard, Access::Write, Role::Admin));
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("Lab_Technician".parse::<Role>(), Ok(Role::LabTechnician));
        assert!("janitor".parse::<Role>().is_err());
    }
}
