//! Patient registration.

use super::{id_value, search_filter, ServiceContext};
use crate::models::{Ipd, Patient, PatientFilter, PatientRequest};
use crate::pagination::{paginate, PageRequest, Paginated};
use crate::store::{Filter, Query, Sort};
use crate::validation::{not_in_future, Validate};
use crate::vocab::PatientStatus;
use crate::{HisError, HisResult};
use api_shared::DropdownOption;
use his_ids::CodeKind;
use uuid::Uuid;

const SEARCH_FIELDS: &[&str] = &["name", "uhid", "mobile"];
const DROPDOWN_LIMIT: u64 = 50;

#[derive(Clone)]
pub struct PatientService {
    ctx: ServiceContext,
}

impl PatientService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    fn check(&self, req: &PatientRequest) -> HisResult<()> {
        req.validate()?;
        if let Some(dob) = req.date_of_birth {
            not_in_future("dateOfBirth", dob, self.ctx.today())?;
        }
        Ok(())
    }

    /// Register a patient under a freshly generated UHID.
    pub async fn create(&self, req: PatientRequest) -> HisResult<Patient> {
        self.check(&req)?;
        let uhid = self.ctx.codes().next_daily(CodeKind::Uhid).await?;
        let patient = Patient::new(uhid.to_string(), req, self.ctx.now());
        self.ctx.collection::<Patient>().insert(&patient).await?;
        tracing::info!(patient_id = %patient.id, uhid = %patient.uhid, "patient registered");
        Ok(patient)
    }

    pub async fn get(&self, id: Uuid) -> HisResult<Patient> {
        self.ctx.require(id, "Patient").await
    }

    pub async fn get_by_uhid(&self, uhid: &str) -> HisResult<Patient> {
        self.ctx
            .collection::<Patient>()
            .find_one(Filter::eq("uhid", uhid.trim().to_ascii_uppercase()))
            .await?
            .ok_or(HisError::NotFound("Patient"))
    }

    /// Newest registrations first.
    pub async fn list(&self, filter: &PatientFilter, page: &PageRequest) -> HisResult<Paginated<Patient>> {
        let filter = search_filter(SEARCH_FIELDS, filter.search.as_deref());
        Ok(paginate(
            &self.ctx.collection::<Patient>(),
            filter,
            Sort::desc("createdAt"),
            page,
        )
        .await?)
    }

    pub async fn update(&self, id: Uuid, req: PatientRequest) -> HisResult<Patient> {
        self.check(&req)?;
        let mut patient = self.get(id).await?;
        patient.apply(req, self.ctx.now());
        self.ctx.collection::<Patient>().replace(&patient).await?;
        Ok(patient)
    }

    /// # Errors
    ///
    /// Returns `HisError::Precondition` while the patient is admitted.
    pub async fn delete(&self, id: Uuid) -> HisResult<()> {
        let patient = self.get(id).await?;
        let admitted = self
            .ctx
            .collection::<Ipd>()
            .exists(Filter::all_of(vec![
                Filter::eq("patientId", id_value(id)),
                Filter::eq("patientStatus", PatientStatus::Admitted.as_str()),
            ]))
            .await?;
        if admitted {
            tracing::warn!(patient_id = %id, "delete rejected: patient is admitted");
            return Err(HisError::precondition(
                "Patient is currently admitted; discharge before deleting",
            ));
        }
        self.ctx.collection::<Patient>().delete(patient.id).await?;
        tracing::info!(patient_id = %id, uhid = %patient.uhid, "patient deleted");
        Ok(())
    }

    pub async fn dropdown(&self, search: Option<&str>) -> HisResult<Vec<DropdownOption>> {
        let query = Query::new(search_filter(SEARCH_FIELDS, search))
            .sort(Sort::asc("name"))
            .limit(DROPDOWN_LIMIT);
        let patients = self.ctx.collection::<Patient>().find(&query).await?;
        Ok(patients
            .iter()
            .map(|p| DropdownOption::new(p.id, format!("{} ({})", p.name, p.uhid)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{harness, patient_request};
    use chrono::{Duration, NaiveDate};

    #[tokio::test]
    async fn test_same_day_uhids_increase_and_reset_next_day() {
        let h = harness();
        let patients = &h.services.patients;

        let first = patients.create(patient_request("Asha Verma")).await.expect("create should succeed");
        let second = patients.create(patient_request("Ravi Verma")).await.expect("create should succeed");
        assert_eq!(first.uhid, "UHID202610160001");
        assert_eq!(second.uhid, "UHID202610160002");

        h.clock.advance(Duration::days(1));
        let third = patients.create(patient_request("Kiran Rao")).await.expect("create should succeed");
        assert_eq!(third.uhid, "UHID202610170001");
    }

    #[tokio::test]
    async fn test_create_then_fetch_round_trips() {
        let h = harness();
        let patients = &h.services.patients;
        let created = patients.create(patient_request("Asha Verma")).await.expect("create should succeed");
        let fetched = patients.get(created.id).await.expect("get should succeed");
        assert_eq!(created, fetched);
        assert_eq!(fetched.address.pincode.as_deref(), Some("411001"));

        let by_uhid = patients.get_by_uhid("uhid202610160001").await.expect("lookup should succeed");
        assert_eq!(by_uhid.id, created.id);
    }

    #[tokio::test]
    async fn test_future_birth_date_rejected() {
        let h = harness();
        let mut req = patient_request("Asha Verma");
        req.date_of_birth = NaiveDate::from_ymd_opt(2027, 1, 1);
        let err = h.services.patients.create(req).await.expect_err("future DOB should fail");
        assert!(matches!(err, HisError::Validation(_)));
    }

    #[tokio::test]
    async fn test_search_and_dropdown() {
        let h = harness();
        let patients = &h.services.patients;
        patients.create(patient_request("Asha Verma")).await.expect("create should succeed");
        patients.create(patient_request("Kiran Rao")).await.expect("create should succeed");

        let filter = PatientFilter { search: Some("kiran".into()) };
        let page = patients.list(&filter, &PageRequest::default()).await.expect("list should succeed");
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name.as_str(), "Kiran Rao");

        let options = patients.dropdown(None).await.expect("dropdown should succeed");
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].label, "Asha Verma (UHID202610160001)");
    }

    #[tokio::test]
    async fn test_missing_patient_is_not_found() {
        let h = harness();
        let err = h.services.patients.get(Uuid::new_v4()).await.expect_err("should be missing");
        assert_eq!(err.to_string(), "Patient not found");
    }
}
