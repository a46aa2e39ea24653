//! Human-readable record codes.
//!
//! Records are keyed internally by UUID, but staff and printed documents refer to them by short
//! generated codes. This crate owns the format of every such code so that generation, parsing
//! and display never drift apart.
//!
//! ## Code families
//!
//! | Kind | Example | Sequence scope |
//! |---|---|---|
//! | UHID | `UHID202610160007` | per day |
//! | Visit | `VISIT202610160012` | per day |
//! | Accession | `LAB202610160003` | per day |
//! | OPD bill | `OPD-00042` | global |
//! | IPD admission | `IPD-1760601234567` | millisecond timestamp |
//! | Appointment | `APPT-1760601234567` | millisecond timestamp |
//!
//! Daily codes take their sequence number from a counter keyed by [`DailyCode::counter_key`],
//! so the suffix restarts at 1 when the date changes. The counter itself lives in the store; this
//! crate only formats and parses.

mod codes;

pub use codes::{CodeKind, DailyCode, SerialCode, TimestampCode};

/// Error type for code operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for code operations.
pub type IdResult<T> = Result<T, IdError>;
