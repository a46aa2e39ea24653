use super::{DoctorSummary, PatientSummary};
use crate::constants::{MAX_NAME_LEN, MAX_NOTES_LEN};
use crate::time::Timestamp;
use crate::validation::{in_range, max_len, non_empty_list, optional_max_len, Validate};
use crate::{HisError, HisResult};
use chrono::NaiveDate;
use his_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Medicine {
    pub name: NonEmptyText,
    pub dosage: NonEmptyText,
    pub frequency: NonEmptyText,
    pub duration: NonEmptyText,
    pub instructions: Option<String>,
}

impl Validate for Medicine {
    fn validate(&self) -> HisResult<()> {
        max_len("medicine name", self.name.as_str(), MAX_NAME_LEN)?;
        max_len("dosage", self.dosage.as_str(), 50)?;
        max_len("frequency", self.frequency.as_str(), 50)?;
        max_len("duration", self.duration.as_str(), 50)?;
        optional_max_len("instructions", self.instructions.as_deref(), 500)
    }
}

/// Writing a prescription closes its visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub id: Uuid,
    pub visit_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub medicines: Vec<Medicine>,
    pub advice: Option<String>,
    pub follow_up_date: Option<NaiveDate>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionRequest {
    pub visit_id: Uuid,
    pub medicines: Vec<Medicine>,
    pub advice: Option<String>,
    pub follow_up_date: Option<NaiveDate>,
}

impl Validate for PrescriptionRequest {
    fn validate(&self) -> HisResult<()> {
        non_empty_list("medicines", &self.medicines)?;
        self.medicines.iter().try_for_each(Validate::validate)?;
        optional_max_len("advice", self.advice.as_deref(), MAX_NOTES_LEN)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionView {
    #[serde(flatten)]
    pub prescription: Prescription,
    pub visit_code: Option<String>,
    pub patient: Option<PatientSummary>,
    pub doctor: Option<DoctorSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PrescriptionFilter {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Vitals {
    /// As written, e.g. `120/80`.
    pub blood_pressure: Option<String>,
    pub pulse: Option<f64>,
    /// Degrees Fahrenheit.
    pub temperature: Option<f64>,
    pub spo2: Option<f64>,
    /// Kilograms.
    pub weight: Option<f64>,
    /// Centimetres.
    pub height: Option<f64>,
    pub respiratory_rate: Option<f64>,
}

impl Validate for Vitals {
    fn validate(&self) -> HisResult<()> {
        if let Some(bp) = self.blood_pressure.as_deref() {
            let ok = bp
                .split_once('/')
                .and_then(|(s, d)| Some((s.trim().parse::<u16>().ok()?, d.trim().parse::<u16>().ok()?)))
                .is_some_and(|(s, d)| s > d && s <= 300);
            if !ok {
                return Err(HisError::validation("bloodPressure must look like 120/80"));
            }
        }
        let checks = [
            ("pulse", self.pulse, 0.0, 300.0),
            ("temperature", self.temperature, 80.0, 115.0),
            ("spo2", self.spo2, 0.0, 100.0),
            ("weight", self.weight, 0.0, 500.0),
            ("height", self.height, 0.0, 300.0),
            ("respiratoryRate", self.respiratory_rate, 0.0, 100.0),
        ];
        for (field, value, min, max) in checks {
            if let Some(value) = value {
                in_range(field, value, min, max)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Examination {
    pub id: Uuid,
    pub visit_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub vitals: Vitals,
    pub chief_complaint: Option<String>,
    pub history: Option<String>,
    pub findings: Option<String>,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Saving an examination for a visit that already has one replaces it.
#[derive(Debug, Clone, PartialEq, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExaminationRequest {
    pub visit_id: Uuid,
    #[serde(default)]
    pub vitals: Vitals,
    pub chief_complaint: Option<String>,
    pub history: Option<String>,
    pub findings: Option<String>,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
}

impl Validate for ExaminationRequest {
    fn validate(&self) -> HisResult<()> {
        self.vitals.validate()?;
        for (field, value) in [
            ("chiefComplaint", &self.chief_complaint),
            ("history", &self.history),
            ("findings", &self.findings),
            ("diagnosis", &self.diagnosis),
            ("notes", &self.notes),
        ] {
            optional_max_len(field, value.as_deref(), MAX_NOTES_LEN)?;
        }
        Ok(())
    }
}

impl Examination {
    pub fn apply(&mut self, req: ExaminationRequest, now: Timestamp) {
        self.vitals = req.vitals;
        self.chief_complaint = super::clean(req.chief_complaint);
        self.history = super::clean(req.history);
        self.findings = super::clean(req.findings);
        self.diagnosis = super::clean(req.diagnosis);
        self.notes = super::clean(req.notes);
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vitals_ranges() {
        let mut vitals = Vitals {
            blood_pressure: Some("120/80".into()),
            spo2: Some(98.0),
            ..Vitals::default()
        };
        vitals.validate().expect("normal vitals should validate");

        vitals.spo2 = Some(120.0);
        assert!(vitals.validate().is_err());
    }

    #[test]
    fn test_blood_pressure_format() {
        let vitals = Vitals {
            blood_pressure: Some("80/120".into()),
            ..Vitals::default()
        };
        assert!(vitals.validate().is_err());
    }
}
