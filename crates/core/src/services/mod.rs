//! Workflows over the store.
//!
//! Every service holds a cloned [`ServiceContext`] and follows the same shape: validate the
//! request, load the records it references, check business preconditions, then write. Writes
//! that touch more than one record go through a single [`UnitOfWork`] so a failure leaves
//! nothing half-done.
//!
//! This module contains **only** data operations. Authentication, role checks and response
//! envelopes belong in `api-rest`.

mod appointments;
mod catalog;
mod clinical;
mod dashboard;
mod doctors;
mod facilities;
mod ipd;
mod lab;
mod opd;
mod patients;
mod radiology;
mod users;
mod visits;

pub use appointments::AppointmentService;
pub use catalog::{CatalogFile, CatalogService, ImportSummary};
pub use clinical::ClinicalService;
pub use dashboard::{DashboardService, DashboardStats};
pub use doctors::DoctorService;
pub use facilities::FacilityService;
pub use ipd::IpdService;
pub use lab::LabService;
pub use opd::OpdService;
pub use patients::PatientService;
pub use radiology::RadiologyService;
pub use users::UserService;
pub use visits::VisitService;

use crate::clock::Clock;
use crate::config::AppConfig;
use crate::pdf::Letterhead;
use crate::sequence::CodeGenerator;
use crate::store::{Collection, Document, Filter, Store, UnitOfWork};
use crate::time::Timestamp;
use crate::{HisError, HisResult};
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Shared handles every service needs.
#[derive(Clone)]
pub struct ServiceContext {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    config: Arc<AppConfig>,
    codes: CodeGenerator,
}

impl ServiceContext {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, config: Arc<AppConfig>) -> Self {
        let codes = CodeGenerator::new(Arc::clone(&store), Arc::clone(&clock), config.utc_offset());
        Self {
            store,
            clock,
            config,
            codes,
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn codes(&self) -> &CodeGenerator {
        &self.codes
    }

    pub fn collection<T: Document>(&self) -> Collection<T> {
        Collection::new(Arc::clone(&self.store))
    }

    pub fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now())
    }

    /// Today's date in hospital local time.
    pub fn today(&self) -> NaiveDate {
        self.codes.today()
    }

    /// The instant local midnight begins on `date`.
    pub fn day_start(&self, date: NaiveDate) -> Timestamp {
        let local_midnight = date.and_time(chrono::NaiveTime::default());
        let utc = local_midnight - Duration::seconds(i64::from(self.config.utc_offset().local_minus_utc()));
        Timestamp::new(Utc.from_utc_datetime(&utc))
    }

    /// The last millisecond of `date` in local time.
    pub fn day_end(&self, date: NaiveDate) -> Timestamp {
        let next = self.day_start(date).as_datetime() + Duration::days(1);
        Timestamp::new(next - Duration::milliseconds(1))
    }

    /// Inclusive local-day range over a timestamp field. Open ends are unbounded.
    pub fn date_range(&self, field: &str, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Filter {
        Filter::all_of(vec![
            from.map_or(Filter::All, |d| Filter::gte(field, self.day_start(d))),
            to.map_or(Filter::All, |d| Filter::lte(field, self.day_end(d))),
        ])
    }

    pub fn letterhead(&self) -> Letterhead {
        Letterhead::new(self.config.hospital_name(), self.config.utc_offset())
    }

    pub async fn commit(&self, unit: UnitOfWork) -> HisResult<()> {
        Ok(self.store.commit(unit).await?)
    }

    /// Load a record or fail with `"{what} not found"`.
    pub async fn require<T: Document>(&self, id: Uuid, what: &'static str) -> HisResult<T> {
        self.collection::<T>()
            .get(id)
            .await?
            .ok_or(HisError::NotFound(what))
    }
}

/// One handle per functional area, built over a shared context.
#[derive(Clone)]
pub struct Services {
    pub users: UserService,
    pub patients: PatientService,
    pub doctors: DoctorService,
    pub visits: VisitService,
    pub appointments: AppointmentService,
    pub facilities: FacilityService,
    pub catalog: CatalogService,
    pub opd: OpdService,
    pub ipd: IpdService,
    pub lab: LabService,
    pub radiology: RadiologyService,
    pub clinical: ClinicalService,
    pub dashboard: DashboardService,
}

impl Services {
    pub fn new(ctx: ServiceContext) -> Self {
        Self {
            users: UserService::new(ctx.clone()),
            patients: PatientService::new(ctx.clone()),
            doctors: DoctorService::new(ctx.clone()),
            visits: VisitService::new(ctx.clone()),
            appointments: AppointmentService::new(ctx.clone()),
            facilities: FacilityService::new(ctx.clone()),
            catalog: CatalogService::new(ctx.clone()),
            opd: OpdService::new(ctx.clone()),
            ipd: IpdService::new(ctx.clone()),
            lab: LabService::new(ctx.clone()),
            radiology: RadiologyService::new(ctx.clone()),
            clinical: ClinicalService::new(ctx.clone()),
            dashboard: DashboardService::new(ctx),
        }
    }
}

/// Uuid as the JSON value it is stored as.
pub(crate) fn id_value(id: Uuid) -> serde_json::Value {
    serde_json::Value::String(id.to_string())
}

/// Case-insensitive search across several string fields; `None` or blank matches all.
pub(crate) fn search_filter(fields: &[&str], search: Option<&str>) -> Filter {
    match search.map(str::trim).filter(|s| !s.is_empty()) {
        Some(needle) => Filter::any_of(
            fields
                .iter()
                .map(|field| Filter::contains(field, needle))
                .collect(),
        ),
        None => Filter::All,
    }
}


#[cfg(test)]
mod tests {
    use super::testing::harness;
    use chrono::NaiveDate;

    #[test]
    fn test_local_day_bounds() {
        let h = harness();
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).expect("valid date");
        assert_eq!(h.ctx.day_start(date).to_string(), "2026-10-15T18:30:00.000Z");
        assert_eq!(h.ctx.day_end(date).to_string(), "2026-10-16T18:29:59.999Z");
        assert_eq!(h.ctx.today(), date);
    }
}
