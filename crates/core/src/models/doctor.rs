use crate::constants::MAX_NAME_LEN;
use crate::time::Timestamp;
use crate::validation::{max_len, money, Validate};
use crate::HisResult;
use his_types::{EmailAddress, MobileNumber, NonEmptyText};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: Uuid,
    /// The login created alongside the doctor.
    pub user_id: Uuid,
    pub name: NonEmptyText,
    pub email: EmailAddress,
    pub mobile: MobileNumber,
    pub specialization: NonEmptyText,
    pub qualification: NonEmptyText,
    pub license_number: NonEmptyText,
    pub department: NonEmptyText,
    pub consultation_fee: f64,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DoctorRequest {
    pub name: NonEmptyText,
    pub email: EmailAddress,
    pub mobile: MobileNumber,
    pub specialization: NonEmptyText,
    pub qualification: NonEmptyText,
    pub license_number: NonEmptyText,
    pub department: NonEmptyText,
    pub consultation_fee: f64,
    /// Required when creating; ignored on update unless present, in which case the linked
    /// user's password is reset.
    pub password: Option<String>,
    pub is_active: Option<bool>,
}

impl Validate for DoctorRequest {
    fn validate(&self) -> HisResult<()> {
        max_len("name", self.name.as_str(), MAX_NAME_LEN)?;
        max_len("specialization", self.specialization.as_str(), MAX_NAME_LEN)?;
        max_len("qualification", self.qualification.as_str(), MAX_NAME_LEN)?;
        max_len("licenseNumber", self.license_number.as_str(), 50)?;
        max_len("department", self.department.as_str(), MAX_NAME_LEN)?;
        money("consultationFee", self.consultation_fee)?;
        self.password
            .as_deref()
            .map_or(Ok(()), super::user::password_strength)
    }
}

impl Doctor {
    pub fn new(user_id: Uuid, req: DoctorRequest, now: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: req.name,
            email: req.email,
            mobile: req.mobile,
            specialization: req.specialization,
            qualification: req.qualification,
            license_number: req.license_number,
            department: req.department,
            consultation_fee: req.consultation_fee,
            is_active: req.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, req: DoctorRequest, now: Timestamp) {
        self.name = req.name;
        self.email = req.email;
        self.mobile = req.mobile;
        self.specialization = req.specialization;
        self.qualification = req.qualification;
        self.license_number = req.license_number;
        self.department = req.department;
        self.consultation_fee = req.consultation_fee;
        if let Some(active) = req.is_active {
            self.is_active = active;
        }
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DoctorSummary {
    pub id: Uuid,
    pub name: NonEmptyText,
    pub specialization: NonEmptyText,
    pub department: NonEmptyText,
}

impl From<&Doctor> for DoctorSummary {
    fn from(d: &Doctor) -> Self {
        Self {
            id: d.id,
            name: d.name.clone(),
            specialization: d.specialization.clone(),
            department: d.department.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DoctorFilter {
    /// Matches name or specialization.
    pub search: Option<String>,
    pub department: Option<String>,
    pub is_active: Option<bool>,
}
