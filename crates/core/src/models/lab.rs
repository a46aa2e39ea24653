use super::{BioReference, LabParameter, PatientSummary};
use crate::constants::{MAX_NAME_LEN, MAX_NOTES_LEN, MAX_REPORT_LEN};
use crate::time::Timestamp;
use crate::validation::{max_len, non_empty_list, optional_max_len, Validate};
use crate::vocab::{BillingKind, LabStatus, SampleType, ServiceCategory};
use crate::{HisError, HisResult};
use his_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One order per billing event that included lab or radiology services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabOrder {
    pub id: Uuid,
    pub accession_number: String,
    pub patient_id: Uuid,
    pub billing_id: Uuid,
    pub billing_kind: BillingKind,
    pub doctor_id: Option<Uuid>,
    /// Lowest status among the order's tests.
    pub status: LabStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One billed lab or radiology service inside an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabOrderTest {
    pub id: Uuid,
    pub lab_order_id: Uuid,
    pub service_id: Uuid,
    /// Test definition, when the catalogue has one for the service.
    pub lab_test_id: Option<Uuid>,
    pub name: String,
    pub category: ServiceCategory,
    pub sample_type: Option<SampleType>,
    pub status: LabStatus,
    pub collected_at: Option<Timestamp>,
    pub saved_at: Option<Timestamp>,
    pub authorized_at: Option<Timestamp>,
    pub authorized_by: Option<Uuid>,
    pub remarks: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl LabOrderTest {
    pub fn is_radiology(&self) -> bool {
        self.category == ServiceCategory::Radiology
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabResult {
    pub id: Uuid,
    pub lab_order_test_id: Uuid,
    pub parameter_id: Uuid,
    pub value: String,
    pub unit: Option<String>,
    /// Set for numeric values when a matching reference range has bounds.
    pub is_abnormal: Option<bool>,
    pub remarks: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResultEntry {
    pub parameter_id: Uuid,
    pub value: NonEmptyText,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveResultsRequest {
    pub results: Vec<ResultEntry>,
    pub remarks: Option<String>,
}

impl Validate for SaveResultsRequest {
    fn validate(&self) -> HisResult<()> {
        non_empty_list("results", &self.results)?;
        let mut seen = std::collections::HashSet::new();
        for entry in &self.results {
            if !seen.insert(entry.parameter_id) {
                return Err(HisError::validation("results cannot repeat a parameter"));
            }
            max_len("value", entry.value.as_str(), 200)?;
            optional_max_len("remarks", entry.remarks.as_deref(), MAX_NOTES_LEN)?;
        }
        optional_max_len("remarks", self.remarks.as_deref(), MAX_NOTES_LEN)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabRemarksRequest {
    pub remarks: Option<String>,
}

/// Sets a test's status without workflow checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, utoipa::ToSchema)]
pub struct LabStatusRequest {
    pub status: LabStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabOrderView {
    #[serde(flatten)]
    pub order: LabOrder,
    pub tests: Vec<LabOrderTest>,
    pub patient: Option<PatientSummary>,
}

/// A parameter on a test, with the references that apply to this patient and any saved value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDetail {
    pub parameter: LabParameter,
    pub references: Vec<BioReference>,
    pub result: Option<LabResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabTestDetail {
    pub test: LabOrderTest,
    pub accession_number: String,
    pub patient: Option<PatientSummary>,
    pub parameters: Vec<ParameterDetail>,
    pub radiology_report: Option<RadiologyReport>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LabOrderFilter {
    pub patient_id: Option<Uuid>,
    pub status: Option<LabStatus>,
    pub billing_kind: Option<BillingKind>,
    /// Matches the accession number.
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RadiologyTemplate {
    pub id: Uuid,
    pub name: NonEmptyText,
    pub service_id: Option<Uuid>,
    pub content: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RadiologyTemplateRequest {
    pub name: NonEmptyText,
    pub service_id: Option<Uuid>,
    pub content: NonEmptyText,
}

impl Validate for RadiologyTemplateRequest {
    fn validate(&self) -> HisResult<()> {
        max_len("name", self.name.as_str(), MAX_NAME_LEN)?;
        max_len("content", self.content.as_str(), MAX_REPORT_LEN)
    }
}

impl RadiologyTemplate {
    pub fn new(req: RadiologyTemplateRequest, now: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: req.name,
            service_id: req.service_id,
            content: req.content.into_inner(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, req: RadiologyTemplateRequest, now: Timestamp) {
        self.name = req.name;
        self.service_id = req.service_id;
        self.content = req.content.into_inner();
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RadiologyReport {
    pub id: Uuid,
    pub lab_order_test_id: Uuid,
    pub template_id: Option<Uuid>,
    pub content: String,
    pub impression: Option<String>,
    pub reported_by: Option<Uuid>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RadiologyReportRequest {
    pub template_id: Option<Uuid>,
    pub content: NonEmptyText,
    pub impression: Option<String>,
}

impl Validate for RadiologyReportRequest {
    fn validate(&self) -> HisResult<()> {
        max_len("content", self.content.as_str(), MAX_REPORT_LEN)?;
        optional_max_len("impression", self.impression.as_deref(), MAX_NOTES_LEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_results_rejects_repeats() {
        let parameter = Uuid::new_v4();
        let entry = ResultEntry {
            parameter_id: parameter,
            value: NonEmptyText::new("13.2").expect("text"),
            remarks: None,
        };
        let req = SaveResultsRequest {
            results: vec![entry.clone(), entry],
            remarks: None,
        };
        assert!(matches!(req.validate(), Err(HisError::Validation(_))));
    }

    #[test]
    fn test_save_results_requires_entries() {
        let req = SaveResultsRequest {
            results: vec![],
            remarks: None,
        };
        assert_eq!(
            req.validate().expect_err("should fail").to_string(),
            "results cannot be empty"
        );
    }
}
