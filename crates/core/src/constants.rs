//! Constants used throughout the HIS core crate.

/// Default page number when none is supplied.
pub const DEFAULT_PAGE: u64 = 1;

/// Default page size when none is supplied.
pub const DEFAULT_PAGE_LIMIT: u64 = 10;

/// Largest page size a caller may request.
pub const MAX_PAGE_LIMIT: u64 = 100;

/// Default lifetime of issued access tokens, in hours.
pub const DEFAULT_JWT_EXPIRY_HOURS: i64 = 24;

/// Default listen port when neither `HIS_REST_ADDR` nor `PORT` is set.
pub const DEFAULT_PORT: u16 = 3000;

/// Offset used to decide which calendar day a record belongs to (India Standard Time).
pub const DEFAULT_UTC_OFFSET: &str = "+05:30";

/// Secret used outside production when `JWT_SECRET` is unset.
pub const DEV_JWT_SECRET: &str = "his-development-secret";

/// PBKDF2-HMAC-SHA256 rounds for new password hashes.
pub const PASSWORD_HASH_ITERATIONS: u32 = 100_000;

/// Bytes of derived key stored per password.
pub const PASSWORD_HASH_LEN: usize = 32;

/// Bytes of random salt per password.
pub const PASSWORD_SALT_LEN: usize = 16;

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Maximum length for short free-text fields such as names.
pub const MAX_NAME_LEN: usize = 100;

/// Maximum length for long free-text fields such as notes and report bodies.
pub const MAX_NOTES_LEN: usize = 5_000;

/// Maximum length of a rich-text radiology report or template.
pub const MAX_REPORT_LEN: usize = 50_000;

/// Ages and reference bounds are compared in steps of 1/(12 * 365) of a year, where a month is
/// 1/12 of a year and a day 1/365. Whole ages and whole bounds are then exact integers.
pub const AGE_STEPS_PER_YEAR: u64 = 12 * 365;

pub const AGE_STEPS_PER_MONTH: u64 = 365;

pub const AGE_STEPS_PER_DAY: u64 = 12;

/// Hospital name printed on document headers.
pub const HOSPITAL_NAME: &str = "City General Hospital";
