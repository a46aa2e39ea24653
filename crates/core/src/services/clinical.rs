//! Prescriptions and examinations, both keyed one-per-visit.

use super::{id_value, ServiceContext};
use crate::models::{
    clean, Doctor, DoctorSummary, Examination, ExaminationRequest, Patient, PatientSummary,
    Prescription, PrescriptionFilter, PrescriptionRequest, PrescriptionView, Visit,
};
use crate::pagination::{paginate, PageRequest, Paginated};
use crate::pdf::{documents, render};
use crate::store::{Filter, Sort, UnitOfWork};
use crate::validation::Validate;
use crate::vocab::VisitStatus;
use crate::{HisError, HisResult};
use uuid::Uuid;

#[derive(Clone)]
pub struct ClinicalService {
    ctx: ServiceContext,
}

impl ClinicalService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    fn by_visit(visit_id: Uuid) -> Filter {
        Filter::eq("visitId", id_value(visit_id))
    }

    // =========================================================================
    // PRESCRIPTIONS
    // =========================================================================

    /// Write the prescription for a visit and close the visit.
    ///
    /// # Errors
    ///
    /// Returns `HisError::Precondition` if the visit is closed or cancelled, or already has a
    /// prescription.
    pub async fn create_prescription(&self, req: PrescriptionRequest) -> HisResult<PrescriptionView> {
        req.validate()?;
        let mut visit: Visit = self.ctx.require(req.visit_id, "Visit").await?;
        if matches!(visit.status, VisitStatus::Closed | VisitStatus::Cancelled) {
            tracing::warn!(visit = %visit.code, status = %visit.status, "prescription rejected");
            return Err(HisError::precondition(format!("Visit is already {}", visit.status)));
        }
        if self
            .ctx
            .collection::<Prescription>()
            .exists(Self::by_visit(visit.id))
            .await?
        {
            return Err(HisError::precondition("This visit already has a prescription"));
        }

        let now = self.ctx.now();
        let prescription = Prescription {
            id: Uuid::new_v4(),
            visit_id: visit.id,
            patient_id: visit.patient_id,
            doctor_id: visit.doctor_id,
            medicines: req.medicines,
            advice: clean(req.advice),
            follow_up_date: req.follow_up_date,
            created_at: now,
            updated_at: now,
        };
        visit.status = VisitStatus::Closed;
        visit.updated_at = now;

        let mut unit = UnitOfWork::new();
        unit.insert(&prescription)?.replace(&visit)?;
        self.ctx.commit(unit).await?;
        tracing::info!(visit = %visit.code, "prescription written; visit closed");
        self.view(prescription).await
    }

    async fn view(&self, prescription: Prescription) -> HisResult<PrescriptionView> {
        Ok(self.populate(vec![prescription]).await?.remove(0))
    }

    async fn populate(&self, prescriptions: Vec<Prescription>) -> HisResult<Vec<PrescriptionView>> {
        let visits = self
            .ctx
            .collection::<Visit>()
            .get_many(prescriptions.iter().map(|p| p.visit_id))
            .await?;
        let patients = self
            .ctx
            .collection::<Patient>()
            .get_many(prescriptions.iter().map(|p| p.patient_id))
            .await?;
        let doctors = self
            .ctx
            .collection::<Doctor>()
            .get_many(prescriptions.iter().map(|p| p.doctor_id))
            .await?;
        Ok(prescriptions
            .into_iter()
            .map(|prescription| PrescriptionView {
                visit_code: visits.get(&prescription.visit_id).map(|v| v.code.clone()),
                patient: patients.get(&prescription.patient_id).map(PatientSummary::from),
                doctor: doctors.get(&prescription.doctor_id).map(DoctorSummary::from),
                prescription,
            })
            .collect())
    }

    pub async fn get_prescription(&self, id: Uuid) -> HisResult<PrescriptionView> {
        let prescription = self.ctx.require(id, "Prescription").await?;
        self.view(prescription).await
    }

    pub async fn prescription_for_visit(&self, visit_id: Uuid) -> HisResult<PrescriptionView> {
        let prescription = self
            .ctx
            .collection::<Prescription>()
            .find_one(Self::by_visit(visit_id))
            .await?
            .ok_or(HisError::NotFound("Prescription"))?;
        self.view(prescription).await
    }

    pub async fn list_prescriptions(
        &self,
        filter: &PrescriptionFilter,
        page: &PageRequest,
    ) -> HisResult<Paginated<PrescriptionView>> {
        let predicate = Filter::all_of(vec![
            filter
                .patient_id
                .map_or(Filter::All, |id| Filter::eq("patientId", id_value(id))),
            filter
                .doctor_id
                .map_or(Filter::All, |id| Filter::eq("doctorId", id_value(id))),
        ]);
        let page = paginate(
            &self.ctx.collection::<Prescription>(),
            predicate,
            Sort::desc("createdAt"),
            page,
        )
        .await?;
        let items = self.populate(page.items.clone()).await?;
        Ok(page.with_items(items))
    }

    /// Rewrite medicines and advice. The visit cannot change.
    pub async fn update_prescription(&self, id: Uuid, req: PrescriptionRequest) -> HisResult<PrescriptionView> {
        req.validate()?;
        let mut prescription: Prescription = self.ctx.require(id, "Prescription").await?;
        if req.visit_id != prescription.visit_id {
            return Err(HisError::validation("visitId cannot be changed"));
        }
        prescription.medicines = req.medicines;
        prescription.advice = clean(req.advice);
        prescription.follow_up_date = req.follow_up_date;
        prescription.updated_at = self.ctx.now();
        self.ctx.collection::<Prescription>().replace(&prescription).await?;
        self.view(prescription).await
    }

    pub async fn delete_prescription(&self, id: Uuid) -> HisResult<()> {
        let prescription: Prescription = self.ctx.require(id, "Prescription").await?;
        self.ctx.collection::<Prescription>().delete(prescription.id).await?;
        tracing::info!(prescription_id = %id, "prescription deleted");
        Ok(())
    }

    /// Printable prescription with the visit's examination, if recorded.
    pub async fn prescription_pdf(&self, id: Uuid) -> HisResult<(String, Vec<u8>)> {
        let view = self.get_prescription(id).await?;
        let examination = self
            .ctx
            .collection::<Examination>()
            .find_one(Self::by_visit(view.prescription.visit_id))
            .await?;
        let layout = documents::prescription_layout(&self.ctx.letterhead(), &view, examination.as_ref());
        let name = view
            .visit_code
            .clone()
            .unwrap_or_else(|| view.prescription.id.to_string());
        Ok((name, render(&layout)?))
    }

    // =========================================================================
    // EXAMINATIONS
    // =========================================================================

    /// Record the examination for a visit, replacing any earlier one.
    pub async fn save_examination(&self, req: ExaminationRequest) -> HisResult<Examination> {
        req.validate()?;
        let visit: Visit = self.ctx.require(req.visit_id, "Visit").await?;
        let collection = self.ctx.collection::<Examination>();
        let now = self.ctx.now();
        match collection.find_one(Self::by_visit(visit.id)).await? {
            Some(mut examination) => {
                examination.apply(req, now);
                collection.replace(&examination).await?;
                Ok(examination)
            }
            None => {
                let mut examination = Examination {
                    id: Uuid::new_v4(),
                    visit_id: visit.id,
                    patient_id: visit.patient_id,
                    doctor_id: visit.doctor_id,
                    vitals: Default::default(),
                    chief_complaint: None,
                    history: None,
                    findings: None,
                    diagnosis: None,
                    notes: None,
                    created_at: now,
                    updated_at: now,
                };
                examination.apply(req, now);
                collection.insert(&examination).await?;
                tracing::info!(visit = %visit.code, "examination recorded");
                Ok(examination)
            }
        }
    }

    pub async fn get_examination(&self, id: Uuid) -> HisResult<Examination> {
        self.ctx.require(id, "Examination").await
    }

    pub async fn examination_for_visit(&self, visit_id: Uuid) -> HisResult<Examination> {
        self.ctx
            .collection::<Examination>()
            .find_one(Self::by_visit(visit_id))
            .await?
            .ok_or(HisError::NotFound("Examination"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Medicine, VisitRequest, Vitals};
    use crate::services::testing::{harness, text, Harness};

    async fn open_visit(h: &Harness) -> Visit {
        let patient = h.patient().await;
        let doctor = h.doctor("dr.rao@example.org", "MCI-1001").await;
        h.services
            .visits
            .create(VisitRequest {
                patient_id: patient.id,
                doctor_id: doctor.id,
                visit_date: None,
                status: None,
                complaint: Some("Cough".into()),
                notes: None,
            })
            .await
            .expect("visit should succeed")
    }

    fn prescription(visit_id: Uuid) -> PrescriptionRequest {
        PrescriptionRequest {
            visit_id,
            medicines: vec![Medicine {
                name: text("Paracetamol 500mg"),
                dosage: text("1 tab"),
                frequency: text("TDS"),
                duration: text("5 days"),
                instructions: Some("After food".into()),
            }],
            advice: Some("Rest and fluids".into()),
            follow_up_date: None,
        }
    }

    #[tokio::test]
    async fn test_prescription_closes_visit() {
        let h = harness();
        let visit = open_visit(&h).await;
        let view = h
            .services
            .clinical
            .create_prescription(prescription(visit.id))
            .await
            .expect("prescription should succeed");
        assert_eq!(view.visit_code.as_deref(), Some(visit.code.as_str()));
        assert_eq!(view.prescription.patient_id, visit.patient_id);

        let visit = h.services.visits.get(visit.id).await.expect("visit");
        assert_eq!(visit.visit.status, VisitStatus::Closed);

        let err = h
            .services
            .clinical
            .create_prescription(prescription(visit.visit.id))
            .await
            .expect_err("closed visit");
        assert_eq!(err.to_string(), "Visit is already closed");

        let by_visit = h
            .services
            .clinical
            .prescription_for_visit(visit.visit.id)
            .await
            .expect("lookup should succeed");
        assert_eq!(by_visit.prescription.id, view.prescription.id);

        let (name, pdf) = h
            .services
            .clinical
            .prescription_pdf(view.prescription.id)
            .await
            .expect("pdf should render");
        assert_eq!(name, visit.visit.code);
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_examination_upserts_by_visit() {
        let h = harness();
        let visit = open_visit(&h).await;
        let request = |spo2| ExaminationRequest {
            visit_id: visit.id,
            vitals: Vitals {
                spo2: Some(spo2),
                ..Vitals::default()
            },
            chief_complaint: Some("Cough".into()),
            history: None,
            findings: None,
            diagnosis: Some("URTI".into()),
            notes: None,
        };
        let first = h
            .services
            .clinical
            .save_examination(request(95.0))
            .await
            .expect("save should succeed");
        let second = h
            .services
            .clinical
            .save_examination(request(98.0))
            .await
            .expect("resave should succeed");
        assert_eq!(first.id, second.id);

        let stored = h
            .services
            .clinical
            .examination_for_visit(visit.id)
            .await
            .expect("lookup should succeed");
        assert_eq!(stored.vitals.spo2, Some(98.0));
        assert_eq!(stored.diagnosis.as_deref(), Some("URTI"));
    }

    #[tokio::test]
    async fn test_prescription_for_unknown_visit() {
        let h = harness();
        let err = h
            .services
            .clinical
            .create_prescription(prescription(Uuid::new_v4()))
            .await
            .expect_err("missing visit");
        assert_eq!(err.to_string(), "Visit not found");
    }
}
