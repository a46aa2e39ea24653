use super::{DoctorSummary, PatientSummary};
use crate::constants::MAX_NOTES_LEN;
use crate::time::Timestamp;
use crate::validation::{optional_max_len, Validate};
use crate::vocab::VisitStatus;
use crate::HisResult;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub id: Uuid,
    pub code: String,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub visit_date: Timestamp,
    pub status: VisitStatus,
    pub complaint: Option<String>,
    pub notes: Option<String>,
    /// Set when the visit was created from an appointment.
    pub appointment_id: Option<Uuid>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisitRequest {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    /// Defaults to now.
    pub visit_date: Option<Timestamp>,
    /// Defaults to `pending` on create; left unchanged on update when absent.
    pub status: Option<VisitStatus>,
    pub complaint: Option<String>,
    pub notes: Option<String>,
}

impl Validate for VisitRequest {
    fn validate(&self) -> HisResult<()> {
        optional_max_len("complaint", self.complaint.as_deref(), MAX_NOTES_LEN)?;
        optional_max_len("notes", self.notes.as_deref(), MAX_NOTES_LEN)
    }
}

impl Visit {
    pub fn new(code: String, req: VisitRequest, now: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            code,
            patient_id: req.patient_id,
            doctor_id: req.doctor_id,
            visit_date: req.visit_date.unwrap_or(now),
            status: req.status.unwrap_or(VisitStatus::Pending),
            complaint: super::clean(req.complaint),
            notes: super::clean(req.notes),
            appointment_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, req: VisitRequest, now: Timestamp) {
        self.patient_id = req.patient_id;
        self.doctor_id = req.doctor_id;
        if let Some(date) = req.visit_date {
            self.visit_date = date;
        }
        if let Some(status) = req.status {
            self.status = status;
        }
        self.complaint = super::clean(req.complaint);
        self.notes = super::clean(req.notes);
        self.updated_at = now;
    }
}

/// A visit with its patient and doctor attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisitView {
    #[serde(flatten)]
    pub visit: Visit,
    pub patient: Option<PatientSummary>,
    pub doctor: Option<DoctorSummary>,
}

/// List filters for visits. Dates are inclusive calendar days in hospital local time.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct VisitFilter {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub status: Option<VisitStatus>,
    pub from: Option<chrono::NaiveDate>,
    pub to: Option<chrono::NaiveDate>,
}
