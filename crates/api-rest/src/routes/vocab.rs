//! `/api/vocab/:name`: fixed picker lists.

use super::{ok, ApiResult};
use crate::auth::logged_in;
use crate::error::ApiError;
use crate::state::AppState;
use api_shared::DropdownOption;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use his_core::vocab::{
    AgeUnit, Applicability, AppointmentStatus, BedStatus, BloodGroup, Gender, IdType, LabStatus,
    MaritalStatus, Occupation, PatientStatus, PaymentMode, ReferenceGender, RelationType,
    Religion, ResultType, SampleType, ServiceCategory, Title, VisitStatus, WardType,
};

pub(crate) fn router(state: &AppState) -> Router<AppState> {
    logged_in(Router::new().route("/vocab/:name", get(vocabulary)), state)
}

/// Options for a vocabulary, by its kebab-case name.
pub(crate) fn options(name: &str) -> Option<Vec<DropdownOption>> {
    let options = match name {
        "title" => Title::options(),
        "gender" => Gender::options(),
        "relation-type" => RelationType::options(),
        "religion" => Religion::options(),
        "occupation" => Occupation::options(),
        "id-type" => IdType::options(),
        "blood-group" => BloodGroup::options(),
        "marital-status" => MaritalStatus::options(),
        "visit-status" => VisitStatus::options(),
        "appointment-status" => AppointmentStatus::options(),
        "bed-status" => BedStatus::options(),
        "ward-type" => WardType::options(),
        "service-category" => ServiceCategory::options(),
        "applicability" => Applicability::options(),
        "sample-type" => SampleType::options(),
        "result-type" => ResultType::options(),
        "reference-gender" => ReferenceGender::options(),
        "age-unit" => AgeUnit::options(),
        "payment-mode" => PaymentMode::options(),
        "patient-status" => PatientStatus::options(),
        "lab-status" => LabStatus::options(),
        _ => return None,
    };
    Some(options)
}

#[utoipa::path(
    get,
    path = "/api/vocab/{name}",
    tag = "vocab",
    params(("name" = String, Path, description = "Vocabulary name, e.g. `blood-group`")),
    responses(
        (status = 200, description = "Picker options", body = [DropdownOption]),
        (status = 404, description = "Unknown vocabulary")
    )
)]
#[axum::debug_handler]
pub(crate) async fn vocabulary(
    State(_state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Vec<DropdownOption>> {
    match options(&name) {
        Some(options) => ok("Options fetched successfully", options),
        None => Err(ApiError::new(
            StatusCode::NOT_FOUND,
            format!("Unknown vocabulary '{name}'"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blood_group_options() {
        let options = options("blood-group").expect("blood-group should be known");
        assert_eq!(options.len(), BloodGroup::ALL.len());
        assert_eq!(options[0].value, "A+");
    }

    #[test]
    fn test_unknown_vocabulary() {
        assert!(options("colour").is_none());
    }
}
