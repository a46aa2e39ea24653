use crate::constants::{AGE_STEPS_PER_DAY, AGE_STEPS_PER_MONTH, AGE_STEPS_PER_YEAR, MAX_NAME_LEN};
use crate::time::Timestamp;
use crate::validation::{age_parts, max_len, optional_max_len, pincode, Validate};
use crate::vocab::{BloodGroup, Gender, IdType, MaritalStatus, Occupation, RelationType, Religion, Title};
use crate::HisResult;
use chrono::NaiveDate;
use his_types::{EmailAddress, MobileNumber, NonEmptyText};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Age as entered at the registration desk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Age {
    #[serde(default)]
    pub years: u32,
    #[serde(default)]
    pub months: u32,
    #[serde(default)]
    pub days: u32,
}

impl Age {
    pub fn new(years: u32, months: u32, days: u32) -> Self {
        Self {
            years,
            months,
            days,
        }
    }

    /// `years + months/12 + days/365`, scaled by `12 * 365` so that it is a whole number.
    pub fn in_steps(&self) -> u64 {
        u64::from(self.years) * AGE_STEPS_PER_YEAR
            + u64::from(self.months) * AGE_STEPS_PER_MONTH
            + u64::from(self.days) * AGE_STEPS_PER_DAY
    }
}

impl std::fmt::Display for Age {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.years, self.months, self.days) {
            (0, 0, d) => write!(f, "{d}D"),
            (0, m, d) => write!(f, "{m}M {d}D"),
            (y, m, _) => write!(f, "{y}Y {m}M"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub line: NonEmptyText,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
}

impl Address {
    fn validate(&self) -> HisResult<()> {
        max_len("address", self.line.as_str(), 250)?;
        optional_max_len("city", self.city.as_deref(), MAX_NAME_LEN)?;
        optional_max_len("state", self.state.as_deref(), MAX_NAME_LEN)?;
        self.pincode.as_deref().map_or(Ok(()), pincode)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: Uuid,
    pub uhid: String,
    pub title: Title,
    pub name: NonEmptyText,
    pub gender: Gender,
    pub age: Age,
    pub date_of_birth: Option<NaiveDate>,
    pub mobile: MobileNumber,
    pub email: Option<EmailAddress>,
    pub address: Address,
    pub relation_type: RelationType,
    pub relative_name: NonEmptyText,
    pub religion: Religion,
    pub occupation: Occupation,
    pub id_type: IdType,
    pub id_number: NonEmptyText,
    pub blood_group: Option<BloodGroup>,
    pub marital_status: Option<MaritalStatus>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientRequest {
    pub title: Title,
    pub name: NonEmptyText,
    pub gender: Gender,
    pub age: Age,
    pub date_of_birth: Option<NaiveDate>,
    pub mobile: MobileNumber,
    pub email: Option<EmailAddress>,
    pub address: Address,
    pub relation_type: RelationType,
    pub relative_name: NonEmptyText,
    pub religion: Religion,
    pub occupation: Occupation,
    pub id_type: IdType,
    pub id_number: NonEmptyText,
    pub blood_group: Option<BloodGroup>,
    pub marital_status: Option<MaritalStatus>,
}

impl Validate for PatientRequest {
    fn validate(&self) -> HisResult<()> {
        max_len("name", self.name.as_str(), MAX_NAME_LEN)?;
        age_parts(self.age.years, self.age.months, self.age.days)?;
        self.address.validate()?;
        max_len("relativeName", self.relative_name.as_str(), MAX_NAME_LEN)?;
        max_len("idNumber", self.id_number.as_str(), 30)
    }
}

impl Patient {
    pub fn new(uhid: String, req: PatientRequest, now: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            uhid,
            title: req.title,
            name: req.name,
            gender: req.gender,
            age: req.age,
            date_of_birth: req.date_of_birth,
            mobile: req.mobile,
            email: req.email,
            address: req.address,
            relation_type: req.relation_type,
            relative_name: req.relative_name,
            religion: req.religion,
            occupation: req.occupation,
            id_type: req.id_type,
            id_number: req.id_number,
            blood_group: req.blood_group,
            marital_status: req.marital_status,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite every editable field. `uhid` and `createdAt` never change.
    pub fn apply(&mut self, req: PatientRequest, now: Timestamp) {
        self.title = req.title;
        self.name = req.name;
        self.gender = req.gender;
        self.age = req.age;
        self.date_of_birth = req.date_of_birth;
        self.mobile = req.mobile;
        self.email = req.email;
        self.address = req.address;
        self.relation_type = req.relation_type;
        self.relative_name = req.relative_name;
        self.religion = req.religion;
        self.occupation = req.occupation;
        self.id_type = req.id_type;
        self.id_number = req.id_number;
        self.blood_group = req.blood_group;
        self.marital_status = req.marital_status;
        self.updated_at = now;
    }
}

/// The fields other records show when they reference a patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientSummary {
    pub id: Uuid,
    pub uhid: String,
    pub name: NonEmptyText,
    pub gender: Gender,
    pub age: Age,
    pub mobile: MobileNumber,
}

impl From<&Patient> for PatientSummary {
    fn from(p: &Patient) -> Self {
        Self {
            id: p.id,
            uhid: p.uhid.clone(),
            name: p.name.clone(),
            gender: p.gender,
            age: p.age,
            mobile: p.mobile.clone(),
        }
    }
}

/// Free-text search over name, UHID and mobile.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PatientFilter {
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_in_steps() {
        assert_eq!(Age::new(1, 0, 0).in_steps(), 4380);
        assert_eq!(Age::new(1, 6, 0).in_steps(), 4380 + 6 * 365);
        assert_eq!(Age::new(0, 0, 73).in_steps(), 876);
        assert_eq!(Age::new(0, 12, 0).in_steps(), Age::new(1, 0, 0).in_steps());
    }

    #[test]
    fn test_age_display() {
        assert_eq!(Age::new(34, 2, 5).to_string(), "34Y 2M");
        assert_eq!(Age::new(0, 3, 12).to_string(), "3M 12D");
        assert_eq!(Age::new(0, 0, 4).to_string(), "4D");
    }

    #[test]
    fn test_request_rejects_bad_pincode() {
        let json = serde_json::json!({
            "title": "Mrs", "name": "Asha Verma", "gender": "Female",
            "age": {"years": 34}, "mobile": "9876543210",
            "address": {"line": "12 MG Road", "pincode": "12345"},
            "relationType": "W/O", "relativeName": "Ravi Verma", "religion": "Hindu",
            "occupation": "Service", "idType": "Aadhaar", "idNumber": "1234 5678 9012"
        });
        let req: PatientRequest = serde_json::from_value(json).expect("shape should parse");
        let err = req.validate().expect_err("pincode should fail");
        assert_eq!(err.to_string(), "pincode must be a 6-digit postal code");
    }
}
