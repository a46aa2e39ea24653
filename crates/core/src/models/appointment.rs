use super::DoctorSummary;
use crate::constants::MAX_NOTES_LEN;
use crate::time::Timestamp;
use crate::validation::{optional_max_len, Validate};
use crate::vocab::AppointmentStatus;
use crate::HisResult;
use his_types::{MobileNumber, NonEmptyText};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    pub appointment_number: String,
    /// Unset for callers who are not registered yet.
    pub patient_id: Option<Uuid>,
    pub patient_name: NonEmptyText,
    pub mobile: MobileNumber,
    pub doctor_id: Uuid,
    pub scheduled_at: Timestamp,
    pub status: AppointmentStatus,
    pub reason: Option<String>,
    /// The visit this appointment turned into.
    pub visit_id: Option<Uuid>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRequest {
    pub patient_id: Option<Uuid>,
    pub patient_name: NonEmptyText,
    pub mobile: MobileNumber,
    pub doctor_id: Uuid,
    pub scheduled_at: Timestamp,
    pub reason: Option<String>,
}

impl Validate for AppointmentRequest {
    fn validate(&self) -> HisResult<()> {
        optional_max_len("reason", self.reason.as_deref(), MAX_NOTES_LEN)
    }
}

impl Appointment {
    pub fn new(appointment_number: String, req: AppointmentRequest, now: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            appointment_number,
            patient_id: req.patient_id,
            patient_name: req.patient_name,
            mobile: req.mobile,
            doctor_id: req.doctor_id,
            scheduled_at: req.scheduled_at,
            status: AppointmentStatus::Scheduled,
            reason: super::clean(req.reason),
            visit_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, req: AppointmentRequest, now: Timestamp) {
        self.patient_id = req.patient_id;
        self.patient_name = req.patient_name;
        self.mobile = req.mobile;
        self.doctor_id = req.doctor_id;
        self.scheduled_at = req.scheduled_at;
        self.reason = super::clean(req.reason);
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, utoipa::ToSchema)]
pub struct AppointmentStatusRequest {
    pub status: AppointmentStatus,
}

/// Body of the convert-to-visit call. `patientId` is needed only when the appointment itself
/// has none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConvertAppointmentRequest {
    pub patient_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentView {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub doctor: Option<DoctorSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AppointmentFilter {
    pub doctor_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub date: Option<chrono::NaiveDate>,
}
