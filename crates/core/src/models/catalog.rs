use crate::constants::{MAX_NAME_LEN, MAX_NOTES_LEN};
use crate::time::Timestamp;
use crate::validation::{in_range, max_len, money, optional_max_len, Validate};
use crate::vocab::{AgeUnit, Applicability, ReferenceGender, ResultType, SampleType, ServiceCategory};
use crate::{HisError, HisResult};
use his_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A billable item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: Uuid,
    pub name: NonEmptyText,
    /// Short code, stored upper-case.
    pub code: String,
    pub category: ServiceCategory,
    pub applicability: Applicability,
    pub price: f64,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub name: NonEmptyText,
    pub code: NonEmptyText,
    pub category: ServiceCategory,
    pub applicability: Applicability,
    pub price: f64,
    pub is_active: Option<bool>,
}

impl Validate for ServiceRequest {
    fn validate(&self) -> HisResult<()> {
        max_len("name", self.name.as_str(), MAX_NAME_LEN)?;
        max_len("code", self.code.as_str(), 20)?;
        if !self
            .code
            .as_str()
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(HisError::validation(
                "code may only contain letters, digits, '-' and '_'",
            ));
        }
        money("price", self.price)
    }
}

impl Service {
    pub fn new(req: ServiceRequest, now: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: req.name,
            code: req.code.as_str().to_ascii_uppercase(),
            category: req.category,
            applicability: req.applicability,
            price: req.price,
            is_active: req.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, req: ServiceRequest, now: Timestamp) {
        self.name = req.name;
        self.code = req.code.as_str().to_ascii_uppercase();
        self.category = req.category;
        self.applicability = req.applicability;
        self.price = req.price;
        if let Some(active) = req.is_active {
            self.is_active = active;
        }
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ServiceFilter {
    pub category: Option<ServiceCategory>,
    /// `OPD` also returns `Both` services, likewise `IPD`.
    pub applicability: Option<Applicability>,
    pub search: Option<String>,
    pub is_active: Option<bool>,
}

/// Test definition for a lab or radiology service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabTest {
    pub id: Uuid,
    pub service_id: Uuid,
    pub name: NonEmptyText,
    pub sample_type: SampleType,
    pub method: Option<String>,
    /// Parameters in report order.
    pub parameter_ids: Vec<Uuid>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabTestRequest {
    pub service_id: Uuid,
    pub name: NonEmptyText,
    pub sample_type: SampleType,
    pub method: Option<String>,
    #[serde(default)]
    pub parameter_ids: Vec<Uuid>,
}

impl Validate for LabTestRequest {
    fn validate(&self) -> HisResult<()> {
        max_len("name", self.name.as_str(), MAX_NAME_LEN)?;
        optional_max_len("method", self.method.as_deref(), MAX_NAME_LEN)?;
        let mut seen = std::collections::HashSet::new();
        if !self.parameter_ids.iter().all(|id| seen.insert(id)) {
            return Err(HisError::validation("parameterIds cannot repeat a parameter"));
        }
        Ok(())
    }
}

impl LabTest {
    pub fn new(req: LabTestRequest, now: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            service_id: req.service_id,
            name: req.name,
            sample_type: req.sample_type,
            method: super::clean(req.method),
            parameter_ids: req.parameter_ids,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, req: LabTestRequest, now: Timestamp) {
        self.service_id = req.service_id;
        self.name = req.name;
        self.sample_type = req.sample_type;
        self.method = super::clean(req.method);
        self.parameter_ids = req.parameter_ids;
        self.updated_at = now;
    }
}

/// A lab test with its parameters resolved, in report order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabTestView {
    #[serde(flatten)]
    pub test: LabTest,
    pub parameters: Vec<LabParameter>,
}

/// One measured value on a lab report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabParameter {
    pub id: Uuid,
    pub name: NonEmptyText,
    pub unit: Option<String>,
    pub result_type: ResultType,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabParameterRequest {
    pub name: NonEmptyText,
    pub unit: Option<String>,
    pub result_type: ResultType,
    pub description: Option<String>,
}

impl Validate for LabParameterRequest {
    fn validate(&self) -> HisResult<()> {
        max_len("name", self.name.as_str(), MAX_NAME_LEN)?;
        optional_max_len("unit", self.unit.as_deref(), 30)?;
        optional_max_len("description", self.description.as_deref(), MAX_NOTES_LEN)
    }
}

impl LabParameter {
    pub fn new(req: LabParameterRequest, now: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: req.name,
            unit: super::clean(req.unit),
            result_type: req.result_type,
            description: super::clean(req.description),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, req: LabParameterRequest, now: Timestamp) {
        self.name = req.name;
        self.unit = super::clean(req.unit);
        self.result_type = req.result_type;
        self.description = super::clean(req.description);
        self.updated_at = now;
    }
}

/// Normal range for a parameter, scoped by gender and age.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BioReference {
    pub id: Uuid,
    pub parameter_id: Uuid,
    pub gender: ReferenceGender,
    /// Unit of `minAge` and `maxAge`.
    pub age_type: AgeUnit,
    pub min_age: f64,
    pub max_age: f64,
    pub lower_value: Option<f64>,
    pub upper_value: Option<f64>,
    pub reference_text: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BioReferenceRequest {
    pub parameter_id: Uuid,
    pub gender: ReferenceGender,
    pub age_type: AgeUnit,
    pub min_age: f64,
    pub max_age: f64,
    pub lower_value: Option<f64>,
    pub upper_value: Option<f64>,
    pub reference_text: Option<String>,
}

impl Validate for BioReferenceRequest {
    fn validate(&self) -> HisResult<()> {
        in_range("minAge", self.min_age, 0.0, 200.0 * 365.0)?;
        in_range("maxAge", self.max_age, 0.0, 200.0 * 365.0)?;
        if self.min_age > self.max_age {
            return Err(HisError::validation("minAge cannot exceed maxAge"));
        }
        for (field, value) in [("lowerValue", self.lower_value), ("upperValue", self.upper_value)] {
            if value.is_some_and(|v| !v.is_finite()) {
                return Err(HisError::validation(format!("{field} must be a number")));
            }
        }
        if let (Some(lower), Some(upper)) = (self.lower_value, self.upper_value) {
            if lower > upper {
                return Err(HisError::validation("lowerValue cannot exceed upperValue"));
            }
        }
        let has_text = self
            .reference_text
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty());
        if self.lower_value.is_none() && self.upper_value.is_none() && !has_text {
            return Err(HisError::validation(
                "a reference needs lowerValue, upperValue or referenceText",
            ));
        }
        optional_max_len("referenceText", self.reference_text.as_deref(), 500)
    }
}

impl BioReference {
    pub fn new(req: BioReferenceRequest, now: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            parameter_id: req.parameter_id,
            gender: req.gender,
            age_type: req.age_type,
            min_age: req.min_age,
            max_age: req.max_age,
            lower_value: req.lower_value,
            upper_value: req.upper_value,
            reference_text: super::clean(req.reference_text),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, req: BioReferenceRequest, now: Timestamp) {
        self.parameter_id = req.parameter_id;
        self.gender = req.gender;
        self.age_type = req.age_type;
        self.min_age = req.min_age;
        self.max_age = req.max_age;
        self.lower_value = req.lower_value;
        self.upper_value = req.upper_value;
        self.reference_text = super::clean(req.reference_text);
        self.updated_at = now;
    }

    /// Text shown in the reference column of a report.
    pub fn display_range(&self) -> String {
        match (self.lower_value, self.upper_value, self.reference_text.as_deref()) {
            (_, _, Some(text)) => text.to_owned(),
            (Some(lower), Some(upper), None) => format!("{lower} - {upper}"),
            (Some(lower), None, None) => format!(">= {lower}"),
            (None, Some(upper), None) => format!("<= {upper}"),
            (None, None, None) => String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReferenceFilter {
    pub parameter_id: Option<Uuid>,
}
