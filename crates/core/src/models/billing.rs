use super::{round2, DoctorSummary, PatientSummary, Service};
use crate::constants::MAX_NOTES_LEN;
use crate::time::Timestamp;
use crate::validation::{money, non_empty_list, optional_max_len, quantity, Validate};
use crate::vocab::{PatientStatus, PaymentMode, ServiceCategory};
use crate::{HisError, HisResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A service as charged on a bill. Prices are copied so later catalogue edits do not change
/// issued bills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BillLine {
    /// `None` for lines the system adds itself, such as bed charges.
    pub service_id: Option<Uuid>,
    pub name: String,
    pub category: ServiceCategory,
    pub quantity: u32,
    pub price: f64,
    pub amount: f64,
}

impl BillLine {
    pub fn for_service(service: &Service, quantity: u32, price: Option<f64>) -> Self {
        let price = price.unwrap_or(service.price);
        Self {
            service_id: Some(service.id),
            name: service.name.to_string(),
            category: service.category,
            quantity,
            price,
            amount: round2(price * f64::from(quantity)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BillLineRequest {
    pub service_id: Uuid,
    #[serde(default = "one")]
    pub quantity: u32,
    /// Overrides the catalogue price for this bill only.
    pub price: Option<f64>,
}

fn one() -> u32 {
    1
}

impl Validate for BillLineRequest {
    fn validate(&self) -> HisResult<()> {
        quantity("quantity", self.quantity)?;
        self.price.map_or(Ok(()), |p| money("price", p))
    }
}

/// Money columns shared by OPD and IPD bills.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub total_amount: f64,
    pub discount: f64,
    pub net_amount: f64,
    pub paid_amount: f64,
    pub due_amount: f64,
}

impl Totals {
    /// Sum `lines`, then apply `discount` and `paid`.
    ///
    /// # Errors
    ///
    /// Returns `HisError::Validation` if the discount exceeds the total or the payment exceeds
    /// the net amount.
    pub fn compute(lines: &[BillLine], discount: f64, paid: f64) -> HisResult<Self> {
        let totals = Self::with_advance(lines, discount, paid)?;
        if paid > totals.net_amount {
            return Err(HisError::validation("paidAmount cannot exceed netAmount"));
        }
        Ok(totals)
    }

    /// Like [`Totals::compute`], but `paid` may run ahead of the net amount.
    ///
    /// IPD admissions take a deposit before any charges exist. The excess is carried as
    /// credit and `dueAmount` stays at zero until charges catch up.
    ///
    /// # Errors
    ///
    /// Returns `HisError::Validation` if the discount exceeds the total.
    pub fn with_advance(lines: &[BillLine], discount: f64, paid: f64) -> HisResult<Self> {
        money("discount", discount)?;
        money("paidAmount", paid)?;
        let total_amount = round2(lines.iter().map(|l| l.amount).sum());
        if discount > total_amount {
            return Err(HisError::validation("discount cannot exceed totalAmount"));
        }
        let net_amount = round2(total_amount - discount);
        Ok(Self {
            total_amount,
            discount: round2(discount),
            net_amount,
            paid_amount: round2(paid),
            due_amount: round2((net_amount - paid).max(0.0)),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpdBilling {
    pub id: Uuid,
    pub bill_number: String,
    pub patient_id: Uuid,
    pub visit_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub services: Vec<BillLine>,
    #[serde(flatten)]
    pub totals: Totals,
    pub payment_mode: PaymentMode,
    /// Lab order raised for the lab and radiology lines, if any.
    pub lab_order_id: Option<Uuid>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpdBillingRequest {
    pub patient_id: Uuid,
    pub visit_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub services: Vec<BillLineRequest>,
    pub discount: Option<f64>,
    pub paid_amount: Option<f64>,
    pub payment_mode: PaymentMode,
}

impl Validate for OpdBillingRequest {
    fn validate(&self) -> HisResult<()> {
        non_empty_list("services", &self.services)?;
        self.services.iter().try_for_each(Validate::validate)?;
        self.discount.map_or(Ok(()), |d| money("discount", d))?;
        self.paid_amount.map_or(Ok(()), |p| money("paidAmount", p))
    }
}

/// Records a payment against an existing OPD bill.
#[derive(Debug, Clone, PartialEq, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpdPaymentRequest {
    pub paid_amount: f64,
    pub discount: Option<f64>,
    pub payment_mode: Option<PaymentMode>,
}

impl Validate for OpdPaymentRequest {
    fn validate(&self) -> HisResult<()> {
        money("paidAmount", self.paid_amount)?;
        self.discount.map_or(Ok(()), |d| money("discount", d))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpdBillingView {
    #[serde(flatten)]
    pub bill: OpdBilling,
    pub patient: Option<PatientSummary>,
    pub doctor: Option<DoctorSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct BillingFilter {
    pub patient_id: Option<Uuid>,
    /// Only bills with an outstanding balance.
    pub due_only: Option<bool>,
    pub from: Option<chrono::NaiveDate>,
    pub to: Option<chrono::NaiveDate>,
}

/// An inpatient admission and its running bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Ipd {
    pub id: Uuid,
    pub ipd_number: String,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub bed_id: Uuid,
    /// When the patient moved onto the current bed; bed charges accrue from here.
    pub bed_assigned_at: Timestamp,
    pub admission_date: Timestamp,
    pub discharge_date: Option<Timestamp>,
    pub patient_status: PatientStatus,
    pub services: Vec<BillLine>,
    #[serde(flatten)]
    pub totals: Totals,
    pub payment_mode: Option<PaymentMode>,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
    pub lab_order_id: Option<Uuid>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Ipd {
    pub fn is_admitted(&self) -> bool {
        self.patient_status == PatientStatus::Admitted
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IpdAdmitRequest {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub bed_id: Uuid,
    /// Defaults to now.
    pub admission_date: Option<Timestamp>,
    #[serde(default)]
    pub services: Vec<BillLineRequest>,
    pub discount: Option<f64>,
    pub paid_amount: Option<f64>,
    pub payment_mode: Option<PaymentMode>,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
}

impl Validate for IpdAdmitRequest {
    fn validate(&self) -> HisResult<()> {
        self.services.iter().try_for_each(Validate::validate)?;
        self.discount.map_or(Ok(()), |d| money("discount", d))?;
        self.paid_amount.map_or(Ok(()), |p| money("paidAmount", p))?;
        optional_max_len("diagnosis", self.diagnosis.as_deref(), MAX_NOTES_LEN)?;
        optional_max_len("notes", self.notes.as_deref(), MAX_NOTES_LEN)
    }
}

/// Partial update of an admission. Absent fields are left alone; `addServices` appends.
/// Setting `patientStatus` to `Discharged` discharges the patient and frees the bed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IpdUpdateRequest {
    pub doctor_id: Option<Uuid>,
    /// Transfer to another available bed.
    pub bed_id: Option<Uuid>,
    #[serde(default)]
    pub add_services: Vec<BillLineRequest>,
    pub discount: Option<f64>,
    pub paid_amount: Option<f64>,
    pub payment_mode: Option<PaymentMode>,
    pub patient_status: Option<PatientStatus>,
    pub discharge_date: Option<Timestamp>,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
}

impl Validate for IpdUpdateRequest {
    fn validate(&self) -> HisResult<()> {
        self.add_services.iter().try_for_each(Validate::validate)?;
        self.discount.map_or(Ok(()), |d| money("discount", d))?;
        self.paid_amount.map_or(Ok(()), |p| money("paidAmount", p))?;
        if self.patient_status != Some(PatientStatus::Discharged) && self.discharge_date.is_some() {
            return Err(HisError::validation(
                "dischargeDate requires patientStatus Discharged",
            ));
        }
        optional_max_len("diagnosis", self.diagnosis.as_deref(), MAX_NOTES_LEN)?;
        optional_max_len("notes", self.notes.as_deref(), MAX_NOTES_LEN)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IpdView {
    #[serde(flatten)]
    pub ipd: Ipd,
    pub patient: Option<PatientSummary>,
    pub doctor: Option<DoctorSummary>,
    pub bed_number: Option<String>,
    pub ward_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct IpdFilter {
    pub patient_id: Option<Uuid>,
    pub patient_status: Option<PatientStatus>,
}
