//! # HIS Core
//!
//! Core business logic for the hospital information system.
//!
//! This crate contains the data model and every workflow that reads or writes it:
//! - Document store abstraction with in-memory and Postgres backends
//! - Generated record codes (UHID, visit, accession, bill numbers)
//! - Request validation
//! - One service per functional area (patients, billing, lab, ...)
//! - PDF rendering for bills, prescriptions and reports
//!
//! **No API concerns**: HTTP routing, authentication extraction and response envelopes belong in
//! `api-rest` or `api-shared`.

pub mod bootstrap;
pub mod clock;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod models;
pub mod pagination;
pub mod pdf;
pub mod reference;
pub mod sequence;
pub mod services;
pub mod store;
pub mod time;
pub mod validation;
pub mod vocab;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AppConfig, Environment, StoreBackend};
pub use error::{HisError, HisResult};
pub use pagination::{PageRequest, Paginated};
pub use sequence::CodeGenerator;
pub use services::{ServiceContext, Services};
pub use store::{Collection, Document, Filter, MemoryStore, PgStore, Query, Sort, Store, StoreError};
pub use time::Timestamp;
