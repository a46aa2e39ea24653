//! Appointments, including callers who are not registered yet.

use super::{id_value, ServiceContext};
use crate::models::{
    Appointment, AppointmentFilter, AppointmentRequest, AppointmentStatusRequest, AppointmentView,
    ConvertAppointmentRequest, Doctor, DoctorSummary, Patient, Visit, VisitRequest,
};
use crate::pagination::{paginate, PageRequest, Paginated};
use crate::store::{Filter, Sort, UnitOfWork};
use crate::validation::Validate;
use crate::vocab::AppointmentStatus;
use crate::{HisError, HisResult};
use his_ids::CodeKind;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppointmentService {
    ctx: ServiceContext,
}

impl AppointmentService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    async fn check_references(&self, req: &AppointmentRequest) -> HisResult<()> {
        self.ctx.require::<Doctor>(req.doctor_id, "Doctor").await?;
        if let Some(patient_id) = req.patient_id {
            self.ctx.require::<Patient>(patient_id, "Patient").await?;
        }
        Ok(())
    }

    async fn require_scheduled(&self, id: Uuid) -> HisResult<Appointment> {
        let appointment: Appointment = self.ctx.require(id, "Appointment").await?;
        if appointment.status != AppointmentStatus::Scheduled {
            return Err(HisError::precondition(format!(
                "Appointment is already {}",
                appointment.status
            )));
        }
        Ok(appointment)
    }

    pub async fn create(&self, req: AppointmentRequest) -> HisResult<Appointment> {
        req.validate()?;
        self.check_references(&req).await?;
        let number = self.ctx.codes().timestamped(CodeKind::Appointment)?;
        let appointment = Appointment::new(number.to_string(), req, self.ctx.now());
        self.ctx.collection::<Appointment>().insert(&appointment).await?;
        tracing::info!(
            appointment_id = %appointment.id,
            number = %appointment.appointment_number,
            "appointment booked"
        );
        Ok(appointment)
    }

    pub async fn get(&self, id: Uuid) -> HisResult<AppointmentView> {
        let appointment: Appointment = self.ctx.require(id, "Appointment").await?;
        Ok(self.populate(vec![appointment]).await?.remove(0))
    }

    async fn populate(&self, appointments: Vec<Appointment>) -> HisResult<Vec<AppointmentView>> {
        let doctors = self
            .ctx
            .collection::<Doctor>()
            .get_many(appointments.iter().map(|a| a.doctor_id))
            .await?;
        Ok(appointments
            .into_iter()
            .map(|appointment| AppointmentView {
                doctor: doctors.get(&appointment.doctor_id).map(DoctorSummary::from),
                appointment,
            })
            .collect())
    }

    /// Earliest slot first.
    pub async fn list(
        &self,
        filter: &AppointmentFilter,
        page: &PageRequest,
    ) -> HisResult<Paginated<AppointmentView>> {
        let predicate = Filter::all_of(vec![
            filter
                .doctor_id
                .map_or(Filter::All, |id| Filter::eq("doctorId", id_value(id))),
            filter
                .status
                .map_or(Filter::All, |s| Filter::eq("status", s.as_str())),
            self.ctx.date_range("scheduledAt", filter.date, filter.date),
        ]);
        let page = paginate(
            &self.ctx.collection::<Appointment>(),
            predicate,
            Sort::asc("scheduledAt"),
            page,
        )
        .await?;
        let items = self.populate(page.items.clone()).await?;
        Ok(page.with_items(items))
    }

    /// Reschedule or correct details. Only scheduled appointments can change.
    pub async fn update(&self, id: Uuid, req: AppointmentRequest) -> HisResult<Appointment> {
        req.validate()?;
        let mut appointment = self.require_scheduled(id).await?;
        self.check_references(&req).await?;
        appointment.apply(req, self.ctx.now());
        self.ctx.collection::<Appointment>().replace(&appointment).await?;
        Ok(appointment)
    }

    /// Completed and cancelled are final.
    pub async fn set_status(&self, id: Uuid, req: AppointmentStatusRequest) -> HisResult<Appointment> {
        let mut appointment = self.require_scheduled(id).await?;
        appointment.status = req.status;
        appointment.updated_at = self.ctx.now();
        self.ctx.collection::<Appointment>().replace(&appointment).await?;
        tracing::info!(appointment_id = %id, status = %req.status, "appointment status changed");
        Ok(appointment)
    }

    pub async fn delete(&self, id: Uuid) -> HisResult<()> {
        let appointment: Appointment = self.ctx.require(id, "Appointment").await?;
        self.ctx.collection::<Appointment>().delete(appointment.id).await?;
        Ok(())
    }

    /// Turn a scheduled appointment into a visit and mark it completed.
    ///
    /// # Errors
    ///
    /// Returns `HisError::Validation` when neither the appointment nor the request names a
    /// patient, and `HisError::Precondition` if the appointment is no longer scheduled.
    pub async fn convert_to_visit(&self, id: Uuid, req: ConvertAppointmentRequest) -> HisResult<Visit> {
        let mut appointment = self.require_scheduled(id).await?;
        let patient_id = appointment.patient_id.or(req.patient_id).ok_or_else(|| {
            HisError::validation("patientId is required to convert an appointment for an unregistered caller")
        })?;
        self.ctx.require::<Patient>(patient_id, "Patient").await?;
        self.ctx.require::<Doctor>(appointment.doctor_id, "Doctor").await?;

        let now = self.ctx.now();
        let code = self.ctx.codes().next_daily(CodeKind::Visit).await?;
        let mut visit = Visit::new(
            code.to_string(),
            VisitRequest {
                patient_id,
                doctor_id: appointment.doctor_id,
                visit_date: Some(now),
                status: None,
                complaint: appointment.reason.clone(),
                notes: None,
            },
            now,
        );
        visit.appointment_id = Some(appointment.id);

        appointment.patient_id = Some(patient_id);
        appointment.status = AppointmentStatus::Completed;
        appointment.visit_id = Some(visit.id);
        appointment.updated_at = now;

        let mut unit = UnitOfWork::new();
        unit.insert(&visit)?.replace(&appointment)?;
        self.ctx.commit(unit).await?;
        tracing::info!(appointment_id = %id, visit_id = %visit.id, "appointment converted to visit");
        Ok(visit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{harness, text};
    use crate::time::Timestamp;
    use his_types::MobileNumber;

    fn request(doctor_id: Uuid) -> AppointmentRequest {
        AppointmentRequest {
            patient_id: None,
            patient_name: text("Walk-in Caller"),
            mobile: MobileNumber::parse("9000000001").expect("valid mobile"),
            doctor_id,
            scheduled_at: Timestamp::parse("2026-10-17T05:00:00Z").expect("timestamp"),
            reason: Some("follow-up".into()),
        }
    }

    #[tokio::test]
    async fn test_convert_unregistered_caller_needs_patient() {
        let h = harness();
        let doctor = h.doctor("meera@his.test", "KMC-1001").await;
        let appointments = &h.services.appointments;
        let appointment = appointments.create(request(doctor.id)).await.expect("create should succeed");
        assert!(appointment.appointment_number.starts_with("APPT-"));

        let err = appointments
            .convert_to_visit(appointment.id, ConvertAppointmentRequest::default())
            .await
            .expect_err("conversion without patient should fail");
        assert!(matches!(err, HisError::Validation(_)));

        let patient = h.patient().await;
        let visit = appointments
            .convert_to_visit(
                appointment.id,
                ConvertAppointmentRequest {
                    patient_id: Some(patient.id),
                },
            )
            .await
            .expect("conversion should succeed");
        assert_eq!(visit.appointment_id, Some(appointment.id));
        assert_eq!(visit.complaint.as_deref(), Some("follow-up"));

        let view = appointments.get(appointment.id).await.expect("get should succeed");
        assert_eq!(view.appointment.status, AppointmentStatus::Completed);
        assert_eq!(view.appointment.visit_id, Some(visit.id));
    }

    #[tokio::test]
    async fn test_cancelled_appointment_is_final() {
        let h = harness();
        let doctor = h.doctor("meera@his.test", "KMC-1001").await;
        let appointments = &h.services.appointments;
        let appointment = appointments.create(request(doctor.id)).await.expect("create should succeed");
        appointments
            .set_status(
                appointment.id,
                AppointmentStatusRequest {
                    status: AppointmentStatus::Cancelled,
                },
            )
            .await
            .expect("cancel should succeed");

        let err = appointments
            .set_status(
                appointment.id,
                AppointmentStatusRequest {
                    status: AppointmentStatus::Completed,
                },
            )
            .await
            .expect_err("cancelled appointment should not change");
        assert_eq!(err.to_string(), "Appointment is already cancelled");
    }
}
