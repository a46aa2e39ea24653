use super::PatientSummary;
use crate::constants::{MAX_NAME_LEN, MAX_NOTES_LEN};
use crate::time::Timestamp;
use crate::validation::{in_range, max_len, money, optional_max_len, Validate};
use crate::vocab::{BedStatus, WardType};
use crate::{HisError, HisResult};
use his_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Floor {
    pub id: Uuid,
    pub name: NonEmptyText,
    /// Building floor number; 0 is the ground floor, negatives are basements.
    pub number: i32,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FloorRequest {
    pub name: NonEmptyText,
    pub number: i32,
    pub description: Option<String>,
}

impl Validate for FloorRequest {
    fn validate(&self) -> HisResult<()> {
        max_len("name", self.name.as_str(), MAX_NAME_LEN)?;
        in_range("number", f64::from(self.number), -10.0, 200.0)?;
        optional_max_len("description", self.description.as_deref(), MAX_NOTES_LEN)
    }
}

impl Floor {
    pub fn new(req: FloorRequest, now: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: req.name,
            number: req.number,
            description: super::clean(req.description),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, req: FloorRequest, now: Timestamp) {
        self.name = req.name;
        self.number = req.number;
        self.description = super::clean(req.description);
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Ward {
    pub id: Uuid,
    pub name: NonEmptyText,
    pub floor_id: Uuid,
    pub ward_type: WardType,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WardRequest {
    pub name: NonEmptyText,
    pub floor_id: Uuid,
    pub ward_type: WardType,
    pub description: Option<String>,
}

impl Validate for WardRequest {
    fn validate(&self) -> HisResult<()> {
        max_len("name", self.name.as_str(), MAX_NAME_LEN)?;
        optional_max_len("description", self.description.as_deref(), MAX_NOTES_LEN)
    }
}

impl Ward {
    pub fn new(req: WardRequest, now: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: req.name,
            floor_id: req.floor_id,
            ward_type: req.ward_type,
            description: super::clean(req.description),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, req: WardRequest, now: Timestamp) {
        self.name = req.name;
        self.floor_id = req.floor_id;
        self.ward_type = req.ward_type;
        self.description = super::clean(req.description);
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Bed {
    pub id: Uuid,
    pub bed_number: NonEmptyText,
    pub ward_id: Uuid,
    pub status: BedStatus,
    /// The admitted patient while `status` is `occupied`.
    pub patient_id: Option<Uuid>,
    pub charge_per_day: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Bed {
    pub fn new(req: BedRequest, now: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            bed_number: req.bed_number,
            ward_id: req.ward_id,
            status: req.status.unwrap_or(BedStatus::Available),
            patient_id: None,
            charge_per_day: req.charge_per_day,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, req: BedRequest, now: Timestamp) {
        self.bed_number = req.bed_number;
        self.ward_id = req.ward_id;
        self.charge_per_day = req.charge_per_day;
        if let Some(status) = req.status {
            self.status = status;
        }
        self.updated_at = now;
    }

    pub fn occupy(&mut self, patient_id: Uuid, now: Timestamp) {
        self.status = BedStatus::Occupied;
        self.patient_id = Some(patient_id);
        self.updated_at = now;
    }

    pub fn release(&mut self, now: Timestamp) {
        self.status = BedStatus::Available;
        self.patient_id = None;
        self.updated_at = now;
    }
}

/// Beds are occupied only through admission, so the request may set `available` or
/// `maintenance` but never `occupied`.
#[derive(Debug, Clone, PartialEq, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BedRequest {
    pub bed_number: NonEmptyText,
    pub ward_id: Uuid,
    pub charge_per_day: f64,
    pub status: Option<BedStatus>,
}

impl Validate for BedRequest {
    fn validate(&self) -> HisResult<()> {
        max_len("bedNumber", self.bed_number.as_str(), 20)?;
        money("chargePerDay", self.charge_per_day)?;
        if self.status == Some(BedStatus::Occupied) {
            return Err(HisError::validation(
                "status cannot be set to occupied directly; admit a patient instead",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WardSummary {
    pub id: Uuid,
    pub name: NonEmptyText,
    pub ward_type: WardType,
}

impl From<&Ward> for WardSummary {
    fn from(w: &Ward) -> Self {
        Self {
            id: w.id,
            name: w.name.clone(),
            ward_type: w.ward_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BedView {
    #[serde(flatten)]
    pub bed: Bed,
    pub ward: Option<WardSummary>,
    pub patient: Option<PatientSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct BedFilter {
    pub ward_id: Option<Uuid>,
    pub status: Option<BedStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct WardFilter {
    pub floor_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bed_request_cannot_mark_occupied() {
        let req = BedRequest {
            bed_number: NonEmptyText::new("B-12").expect("valid text"),
            ward_id: Uuid::new_v4(),
            charge_per_day: 1500.0,
            status: Some(BedStatus::Occupied),
        };
        assert!(matches!(req.validate(), Err(HisError::Validation(_))));
    }

    #[test]
    fn test_occupy_and_release() {
        let now = Timestamp::parse("2026-10-16T10:00:00Z").expect("timestamp");
        let req = BedRequest {
            bed_number: NonEmptyText::new("B-12").expect("valid text"),
            ward_id: Uuid::new_v4(),
            charge_per_day: 1500.0,
            status: None,
        };
        let mut bed = Bed::new(req, now);
        let patient = Uuid::new_v4();
        bed.occupy(patient, now);
        assert_eq!((bed.status, bed.patient_id), (BedStatus::Occupied, Some(patient)));
        bed.release(now);
        assert_eq!((bed.status, bed.patient_id), (BedStatus::Available, None));
    }
}
