//! OpenAPI document served at `/api-docs/openapi.json` and browsed through Swagger UI.
//!
//! Response bodies are documented as the `data` payload; every JSON response is wrapped in the
//! `{message, data, status}` envelope (`{success, message, data}` under `/api/auth`). List
//! endpoints return a page object whose `items` hold the documented type.

use crate::routes;
use api_shared::{DropdownOption, HealthRes, Role};
use his_core::models::*;
use his_core::services::DashboardStats;
use his_core::vocab::*;
use his_core::Timestamp;
use his_types::{EmailAddress, MobileNumber, NonEmptyText};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(title = "HIS REST API", description = "Hospital information system"),
    paths(
        routes::health::health,
        routes::health::ready,
        routes::auth::login,
        routes::auth::register,
        routes::auth::me,
        routes::users::list_users,
        routes::users::get_user,
        routes::users::set_user_status,
        routes::vocab::vocabulary,
        routes::patients::list_patients,
        routes::patients::create_patient,
        routes::patients::get_patient,
        routes::patients::get_patient_by_uhid,
        routes::patients::update_patient,
        routes::patients::delete_patient,
        routes::patients::patient_dropdown,
        routes::doctors::list_doctors,
        routes::doctors::create_doctor,
        routes::doctors::get_doctor,
        routes::doctors::update_doctor,
        routes::doctors::delete_doctor,
        routes::doctors::doctor_dropdown,
        routes::visits::list_visits,
        routes::visits::create_visit,
        routes::visits::get_visit,
        routes::visits::update_visit,
        routes::visits::delete_visit,
        routes::appointments::list_appointments,
        routes::appointments::create_appointment,
        routes::appointments::get_appointment,
        routes::appointments::update_appointment,
        routes::appointments::set_appointment_status,
        routes::appointments::delete_appointment,
        routes::appointments::convert_appointment,
        routes::facilities::list_floors,
        routes::facilities::create_floor,
        routes::facilities::get_floor,
        routes::facilities::update_floor,
        routes::facilities::delete_floor,
        routes::facilities::floor_dropdown,
        routes::facilities::list_wards,
        routes::facilities::create_ward,
        routes::facilities::get_ward,
        routes::facilities::update_ward,
        routes::facilities::delete_ward,
        routes::facilities::ward_dropdown,
        routes::facilities::list_beds,
        routes::facilities::create_bed,
        routes::facilities::get_bed,
        routes::facilities::update_bed,
        routes::facilities::delete_bed,
        routes::facilities::available_bed_dropdown,
        routes::catalog::list_services,
        routes::catalog::create_service,
        routes::catalog::get_service,
        routes::catalog::update_service,
        routes::catalog::delete_service,
        routes::catalog::service_dropdown,
        routes::catalog::list_lab_tests,
        routes::catalog::create_lab_test,
        routes::catalog::get_lab_test,
        routes::catalog::update_lab_test,
        routes::catalog::delete_lab_test,
        routes::catalog::list_parameters,
        routes::catalog::create_parameter,
        routes::catalog::get_parameter,
        routes::catalog::update_parameter,
        routes::catalog::delete_parameter,
        routes::catalog::parameter_dropdown,
        routes::catalog::list_references,
        routes::catalog::create_reference,
        routes::catalog::get_reference,
        routes::catalog::update_reference,
        routes::catalog::delete_reference,
        routes::catalog::applicable_references,
        routes::billing::list_opd_bills,
        routes::billing::create_opd_bill,
        routes::billing::get_opd_bill,
        routes::billing::update_opd_payment,
        routes::billing::delete_opd_bill,
        routes::billing::opd_bill_pdf,
        routes::ipd::list_admissions,
        routes::ipd::admit_patient,
        routes::ipd::get_admission,
        routes::ipd::update_admission,
        routes::ipd::delete_admission,
        routes::ipd::ipd_bill_pdf,
        routes::lab::list_lab_orders,
        routes::lab::get_lab_order,
        routes::lab::lab_report_pdf,
        routes::lab::get_order_test,
        routes::lab::collect_sample,
        routes::lab::save_results,
        routes::lab::authorize_test,
        routes::lab::set_test_status,
        routes::radiology::list_templates,
        routes::radiology::create_template,
        routes::radiology::get_template,
        routes::radiology::update_template,
        routes::radiology::delete_template,
        routes::radiology::template_dropdown,
        routes::radiology::get_report,
        routes::radiology::save_report,
        routes::radiology::radiology_report_pdf,
        routes::clinical::list_prescriptions,
        routes::clinical::create_prescription,
        routes::clinical::get_prescription,
        routes::clinical::prescription_for_visit,
        routes::clinical::update_prescription,
        routes::clinical::delete_prescription,
        routes::clinical::prescription_pdf,
        routes::clinical::save_examination,
        routes::clinical::get_examination,
        routes::clinical::examination_for_visit,
        routes::dashboard::dashboard_stats,
    ),
    components(schemas(
        HealthRes,
        DropdownOption,
        Role,
        NonEmptyText,
        EmailAddress,
        MobileNumber,
        Timestamp,
        UserProfile,
        RegisterRequest,
        LoginRequest,
        LoginResponse,
        UserStatusRequest,
        Age,
        Address,
        Patient,
        PatientRequest,
        PatientSummary,
        Doctor,
        DoctorRequest,
        DoctorSummary,
        Visit,
        VisitRequest,
        VisitView,
        Appointment,
        AppointmentRequest,
        AppointmentStatusRequest,
        AppointmentView,
        ConvertAppointmentRequest,
        Floor,
        FloorRequest,
        Ward,
        WardRequest,
        WardSummary,
        Bed,
        BedRequest,
        BedView,
        Service,
        ServiceRequest,
        LabTest,
        LabTestRequest,
        LabTestView,
        LabParameter,
        LabParameterRequest,
        BioReference,
        BioReferenceRequest,
        BillLine,
        BillLineRequest,
        Totals,
        OpdBilling,
        OpdBillingRequest,
        OpdBillingView,
        OpdPaymentRequest,
        Ipd,
        IpdAdmitRequest,
        IpdUpdateRequest,
        IpdView,
        LabOrder,
        LabOrderTest,
        LabOrderView,
        LabResult,
        ResultEntry,
        SaveResultsRequest,
        LabRemarksRequest,
        LabStatusRequest,
        ParameterDetail,
        LabTestDetail,
        RadiologyTemplate,
        RadiologyTemplateRequest,
        RadiologyReport,
        RadiologyReportRequest,
        Medicine,
        Prescription,
        PrescriptionRequest,
        PrescriptionView,
        Vitals,
        Examination,
        ExaminationRequest,
        DashboardStats,
        Title,
        Gender,
        RelationType,
        Religion,
        Occupation,
        IdType,
        BloodGroup,
        MaritalStatus,
        VisitStatus,
        AppointmentStatus,
        BedStatus,
        WardType,
        ServiceCategory,
        Applicability,
        SampleType,
        ResultType,
        ReferenceGender,
        AgeUnit,
        PaymentMode,
        PatientStatus,
        BillingKind,
        LabStatus,
    )),
    modifiers(&BearerAuth),
    security(("bearer" = [])),
    tags(
        (name = "health", description = "Liveness and readiness"),
        (name = "auth", description = "Login and registration"),
        (name = "patients", description = "Patient registration"),
        (name = "billing", description = "OPD billing"),
        (name = "ipd", description = "Admissions and discharge"),
        (name = "lab", description = "Lab worklist and reports"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` JWT scheme referenced by the global security requirement.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
