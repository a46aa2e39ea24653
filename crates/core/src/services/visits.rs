//! Outpatient visits.

use super::{id_value, ServiceContext};
use crate::models::{
    Doctor, DoctorSummary, Patient, PatientSummary, Prescription, Visit, VisitFilter, VisitRequest,
    VisitView,
};
use crate::pagination::{paginate, PageRequest, Paginated};
use crate::store::{Filter, Sort};
use crate::validation::Validate;
use crate::{HisError, HisResult};
use his_ids::CodeKind;
use uuid::Uuid;

#[derive(Clone)]
pub struct VisitService {
    ctx: ServiceContext,
}

impl VisitService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    async fn check_references(&self, req: &VisitRequest) -> HisResult<()> {
        self.ctx.require::<Patient>(req.patient_id, "Patient").await?;
        self.ctx.require::<Doctor>(req.doctor_id, "Doctor").await?;
        Ok(())
    }

    pub async fn create(&self, req: VisitRequest) -> HisResult<Visit> {
        req.validate()?;
        self.check_references(&req).await?;
        let code = self.ctx.codes().next_daily(CodeKind::Visit).await?;
        let visit = Visit::new(code.to_string(), req, self.ctx.now());
        self.ctx.collection::<Visit>().insert(&visit).await?;
        tracing::info!(visit_id = %visit.id, code = %visit.code, "visit created");
        Ok(visit)
    }

    pub async fn get(&self, id: Uuid) -> HisResult<VisitView> {
        let visit: Visit = self.ctx.require(id, "Visit").await?;
        Ok(self.populate(vec![visit]).await?.remove(0))
    }

    /// Attach patient and doctor summaries, preserving order.
    pub(crate) async fn populate(&self, visits: Vec<Visit>) -> HisResult<Vec<VisitView>> {
        let patients = self
            .ctx
            .collection::<Patient>()
            .get_many(visits.iter().map(|v| v.patient_id))
            .await?;
        let doctors = self
            .ctx
            .collection::<Doctor>()
            .get_many(visits.iter().map(|v| v.doctor_id))
            .await?;
        Ok(visits
            .into_iter()
            .map(|visit| VisitView {
                patient: patients.get(&visit.patient_id).map(PatientSummary::from),
                doctor: doctors.get(&visit.doctor_id).map(DoctorSummary::from),
                visit,
            })
            .collect())
    }

    /// Newest visits first.
    pub async fn list(&self, filter: &VisitFilter, page: &PageRequest) -> HisResult<Paginated<VisitView>> {
        let predicate = Filter::all_of(vec![
            filter
                .patient_id
                .map_or(Filter::All, |id| Filter::eq("patientId", id_value(id))),
            filter
                .doctor_id
                .map_or(Filter::All, |id| Filter::eq("doctorId", id_value(id))),
            filter
                .status
                .map_or(Filter::All, |s| Filter::eq("status", s.as_str())),
            self.ctx.date_range("visitDate", filter.from, filter.to),
        ]);
        let page = paginate(
            &self.ctx.collection::<Visit>(),
            predicate,
            Sort::desc("visitDate"),
            page,
        )
        .await?;
        let items = self.populate(page.items.clone()).await?;
        Ok(page.with_items(items))
    }

    pub async fn update(&self, id: Uuid, req: VisitRequest) -> HisResult<Visit> {
        req.validate()?;
        let mut visit: Visit = self.ctx.require(id, "Visit").await?;
        self.check_references(&req).await?;
        visit.apply(req, self.ctx.now());
        self.ctx.collection::<Visit>().replace(&visit).await?;
        Ok(visit)
    }

    /// # Errors
    ///
    /// Returns `HisError::Precondition` if the visit already has a prescription.
    pub async fn delete(&self, id: Uuid) -> HisResult<()> {
        let visit: Visit = self.ctx.require(id, "Visit").await?;
        let prescribed = self
            .ctx
            .collection::<Prescription>()
            .exists(Filter::eq("visitId", id_value(id)))
            .await?;
        if prescribed {
            return Err(HisError::precondition(
                "Visit has a prescription and cannot be deleted",
            ));
        }
        self.ctx.collection::<Visit>().delete(visit.id).await?;
        tracing::info!(visit_id = %id, code = %visit.code, "visit deleted");
        Ok(())
    }
}
