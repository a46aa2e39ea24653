//! Outpatient billing.

use super::lab::{stage_order, stage_order_removal, OrderSource};
use super::{id_value, ServiceContext};
use crate::models::{
    BillLine, BillLineRequest, BillingFilter, Doctor, DoctorSummary, OpdBilling, OpdBillingRequest,
    OpdBillingView, OpdPaymentRequest, Patient, PatientSummary, Service, Totals, Visit,
};
use crate::pagination::{paginate, PageRequest, Paginated};
use crate::pdf::documents::{bill_layout, BillDocument};
use crate::pdf::render;
use crate::store::{Filter, Sort, UnitOfWork};
use crate::validation::Validate;
use crate::vocab::{Applicability, BillingKind};
use crate::{HisError, HisResult};
use his_ids::CodeKind;
use uuid::Uuid;

/// Which desk is charging; decides the applicability check.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Desk {
    Opd,
    Ipd,
}

impl Desk {
    fn allows(self, applicability: Applicability) -> bool {
        match self {
            Desk::Opd => applicability.allows_opd(),
            Desk::Ipd => applicability.allows_ipd(),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Desk::Opd => "OPD",
            Desk::Ipd => "IPD",
        }
    }
}

/// Price each requested line from the catalogue.
///
/// # Errors
///
/// Returns `HisError::NotFound` for unknown services and `HisError::Precondition` for
/// inactive services or services the desk may not charge.
pub(crate) async fn price_lines(
    ctx: &ServiceContext,
    requests: &[BillLineRequest],
    desk: Desk,
) -> HisResult<Vec<BillLine>> {
    let services = ctx
        .collection::<Service>()
        .get_many(requests.iter().map(|r| r.service_id))
        .await?;
    requests
        .iter()
        .map(|req| {
            let service = services
                .get(&req.service_id)
                .ok_or(HisError::NotFound("Service"))?;
            if !service.is_active {
                return Err(HisError::precondition(format!(
                    "Service {} is inactive",
                    service.name
                )));
            }
            if !desk.allows(service.applicability) {
                return Err(HisError::precondition(format!(
                    "Service {} is not applicable to {}",
                    service.name,
                    desk.label()
                )));
            }
            Ok(BillLine::for_service(service, req.quantity, req.price))
        })
        .collect()
}

#[derive(Clone)]
pub struct OpdService {
    ctx: ServiceContext,
}

impl OpdService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Raise an outpatient bill, and a lab order for any lab or radiology lines, atomically.
    pub async fn create(&self, req: OpdBillingRequest) -> HisResult<OpdBillingView> {
        req.validate()?;
        self.ctx.require::<Patient>(req.patient_id, "Patient").await?;

        let mut doctor_id = req.doctor_id;
        if let Some(visit_id) = req.visit_id {
            let visit: Visit = self.ctx.require(visit_id, "Visit").await?;
            if visit.patient_id != req.patient_id {
                return Err(HisError::validation("visit belongs to a different patient"));
            }
            doctor_id = doctor_id.or(Some(visit.doctor_id));
        }
        if let Some(id) = req.doctor_id {
            self.ctx.require::<Doctor>(id, "Doctor").await?;
        }

        let lines = price_lines(&self.ctx, &req.services, Desk::Opd).await?;
        let totals = Totals::compute(
            &lines,
            req.discount.unwrap_or(0.0),
            req.paid_amount.unwrap_or(0.0),
        )?;
        let bill_number = self.ctx.codes().next_serial(CodeKind::OpdBill).await?;
        let now = self.ctx.now();
        let mut bill = OpdBilling {
            id: Uuid::new_v4(),
            bill_number: bill_number.to_string(),
            patient_id: req.patient_id,
            visit_id: req.visit_id,
            doctor_id,
            services: lines,
            totals,
            payment_mode: req.payment_mode,
            lab_order_id: None,
            created_at: now,
            updated_at: now,
        };

        let mut unit = UnitOfWork::new();
        bill.lab_order_id = stage_order(
            &self.ctx,
            &mut unit,
            OrderSource {
                patient_id: bill.patient_id,
                billing_id: bill.id,
                billing_kind: BillingKind::Opd,
                doctor_id,
                existing_order: None,
            },
            &bill.services,
        )
        .await?;
        unit.insert(&bill)?;
        self.ctx.commit(unit).await?;

        tracing::info!(
            bill_number = %bill.bill_number,
            net_amount = bill.totals.net_amount,
            lab_order = bill.lab_order_id.is_some(),
            "opd bill created"
        );
        Ok(self.populate(vec![bill]).await?.remove(0))
    }

    async fn populate(&self, bills: Vec<OpdBilling>) -> HisResult<Vec<OpdBillingView>> {
        let patients = self
            .ctx
            .collection::<Patient>()
            .get_many(bills.iter().map(|b| b.patient_id))
            .await?;
        let doctors = self
            .ctx
            .collection::<Doctor>()
            .get_many(bills.iter().filter_map(|b| b.doctor_id))
            .await?;
        Ok(bills
            .into_iter()
            .map(|bill| OpdBillingView {
                patient: patients.get(&bill.patient_id).map(PatientSummary::from),
                doctor: bill
                    .doctor_id
                    .and_then(|id| doctors.get(&id))
                    .map(DoctorSummary::from),
                bill,
            })
            .collect())
    }

    pub async fn get(&self, id: Uuid) -> HisResult<OpdBillingView> {
        let bill: OpdBilling = self.ctx.require(id, "OPD bill").await?;
        Ok(self.populate(vec![bill]).await?.remove(0))
    }

    pub async fn list(&self, filter: &BillingFilter, page: &PageRequest) -> HisResult<Paginated<OpdBillingView>> {
        let predicate = Filter::all_of(vec![
            filter
                .patient_id
                .map_or(Filter::All, |id| Filter::eq("patientId", id_value(id))),
            if filter.due_only.unwrap_or(false) {
                Filter::lte("dueAmount", 0).negate()
            } else {
                Filter::All
            },
            self.ctx.date_range("createdAt", filter.from, filter.to),
        ]);
        let page = paginate(
            &self.ctx.collection::<OpdBilling>(),
            predicate,
            Sort::desc("createdAt"),
            page,
        )
        .await?;
        let items = self.populate(page.items.clone()).await?;
        Ok(page.with_items(items))
    }

    /// Record a payment. The discount is kept unless the request sets a new one.
    pub async fn update_payment(&self, id: Uuid, req: OpdPaymentRequest) -> HisResult<OpdBillingView> {
        req.validate()?;
        let mut bill: OpdBilling = self.ctx.require(id, "OPD bill").await?;
        bill.totals = Totals::compute(
            &bill.services,
            req.discount.unwrap_or(bill.totals.discount),
            req.paid_amount,
        )?;
        if let Some(mode) = req.payment_mode {
            bill.payment_mode = mode;
        }
        bill.updated_at = self.ctx.now();
        self.ctx.collection::<OpdBilling>().replace(&bill).await?;
        tracing::info!(bill_number = %bill.bill_number, due = bill.totals.due_amount, "opd payment recorded");
        Ok(self.populate(vec![bill]).await?.remove(0))
    }

    /// Delete a bill and its lab order. Refused once any of the order's tests has progressed.
    pub async fn delete(&self, id: Uuid) -> HisResult<()> {
        let bill: OpdBilling = self.ctx.require(id, "OPD bill").await?;
        let mut unit = UnitOfWork::new();
        if let Some(order_id) = bill.lab_order_id {
            stage_order_removal(&self.ctx, &mut unit, order_id).await?;
        }
        unit.delete::<OpdBilling>(bill.id);
        self.ctx.commit(unit).await?;
        tracing::info!(bill_number = %bill.bill_number, "opd bill deleted");
        Ok(())
    }

    /// Printable bill, named by bill number.
    pub async fn bill_pdf(&self, id: Uuid) -> HisResult<(String, Vec<u8>)> {
        let view = self.get(id).await?;
        let letterhead = self.ctx.letterhead();
        let layout = bill_layout(
            &letterhead,
            &BillDocument {
                title: "OPD Bill",
                number: &view.bill.bill_number,
                date: view.bill.created_at,
                patient: view.patient.as_ref(),
                doctor: view.doctor.as_ref(),
                details: Vec::new(),
                lines: &view.bill.services,
                totals: &view.bill.totals,
                payment_mode: Some(view.bill.payment_mode),
            },
        );
        Ok((view.bill.bill_number.clone(), render(&layout)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LabOrder, LabOrderTest};
    use crate::services::testing::{harness, Harness};
    use crate::vocab::{LabStatus, PaymentMode, ServiceCategory};

    fn request(patient_id: Uuid, lines: &[(&Service, u32)], paid: f64) -> OpdBillingRequest {
        OpdBillingRequest {
            patient_id,
            visit_id: None,
            doctor_id: None,
            services: lines
                .iter()
                .map(|(s, q)| BillLineRequest {
                    service_id: s.id,
                    quantity: *q,
                    price: None,
                })
                .collect(),
            discount: Some(100.0),
            paid_amount: Some(paid),
            payment_mode: PaymentMode::Upi,
        }
    }

    async fn count_all(h: &Harness) -> (u64, u64, u64) {
        (
            h.ctx.collection::<OpdBilling>().count(&Filter::All).await.expect("count"),
            h.ctx.collection::<LabOrder>().count(&Filter::All).await.expect("count"),
            h.ctx.collection::<LabOrderTest>().count(&Filter::All).await.expect("count"),
        )
    }

    #[tokio::test]
    async fn test_bill_raises_lab_order_for_lab_lines() {
        let h = harness();
        let patient = h.patient().await;
        let consult = h.service("CONS", ServiceCategory::Consultation, Applicability::Opd, 500.0).await;
        let xray = h.service("XRAY", ServiceCategory::Radiology, Applicability::Both, 400.0).await;

        let bill = h
            .services
            .opd
            .create(request(patient.id, &[(&consult, 1), (&xray, 2)], 500.0))
            .await
            .expect("bill should succeed");
        assert_eq!(bill.bill.bill_number, "OPD-00001");
        assert_eq!(bill.bill.totals.total_amount, 1300.0);
        assert_eq!(bill.bill.totals.net_amount, 1200.0);
        assert_eq!(bill.bill.totals.due_amount, 700.0);
        assert_eq!(bill.patient.as_ref().map(|p| p.uhid.as_str()), Some(patient.uhid.as_str()));

        let order = h
            .services
            .lab
            .get_order(bill.bill.lab_order_id.expect("order"))
            .await
            .expect("order should load");
        assert_eq!(order.order.billing_kind, BillingKind::Opd);
        assert_eq!(order.tests.len(), 1);
        assert_eq!(order.tests[0].status, LabStatus::Pending);
        assert!(order.tests[0].is_radiology());

        let second = h
            .services
            .opd
            .create(request(patient.id, &[(&consult, 1)], 0.0))
            .await
            .expect("bill should succeed");
        assert_eq!(second.bill.bill_number, "OPD-00002");
        assert_eq!(second.bill.lab_order_id, None);
    }

    #[tokio::test]
    async fn test_ipd_only_service_persists_nothing() {
        let h = harness();
        let patient = h.patient().await;
        let lab = h.service("CBC", ServiceCategory::Laboratory, Applicability::Both, 350.0).await;
        let nursing = h.service("NURSE", ServiceCategory::Nursing, Applicability::Ipd, 800.0).await;

        let err = h
            .services
            .opd
            .create(request(patient.id, &[(&lab, 1), (&nursing, 1)], 0.0))
            .await
            .expect_err("IPD-only service should be refused");
        assert_eq!(err.to_string(), format!("Service {} is not applicable to OPD", nursing.name));
        assert_eq!(count_all(&h).await, (0, 0, 0));
    }

    #[tokio::test]
    async fn test_payment_and_due_filter() {
        let h = harness();
        let patient = h.patient().await;
        let consult = h.service("CONS", ServiceCategory::Consultation, Applicability::Opd, 500.0).await;
        let bill = h
            .services
            .opd
            .create(request(patient.id, &[(&consult, 2)], 500.0))
            .await
            .expect("bill should succeed");

        let due_only = BillingFilter {
            due_only: Some(true),
            ..Default::default()
        };
        let page = PageRequest::default();
        assert_eq!(h.services.opd.list(&due_only, &page).await.expect("list").total, 1);

        let paid = h
            .services
            .opd
            .update_payment(
                bill.bill.id,
                OpdPaymentRequest {
                    paid_amount: 900.0,
                    discount: None,
                    payment_mode: Some(PaymentMode::Card),
                },
            )
            .await
            .expect("payment should succeed");
        assert_eq!(paid.bill.totals.due_amount, 0.0);
        assert_eq!(paid.bill.totals.discount, 100.0);
        assert_eq!(paid.bill.payment_mode, PaymentMode::Card);
        assert_eq!(h.services.opd.list(&due_only, &page).await.expect("list").total, 0);

        let err = h
            .services
            .opd
            .update_payment(
                bill.bill.id,
                OpdPaymentRequest {
                    paid_amount: 950.0,
                    discount: None,
                    payment_mode: None,
                },
            )
            .await
            .expect_err("overpayment");
        assert!(matches!(err, HisError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_refused_once_lab_work_started() {
        let h = harness();
        let patient = h.patient().await;
        let cbc = h.service("CBC", ServiceCategory::Laboratory, Applicability::Both, 350.0).await;
        let first = h
            .services
            .opd
            .create(request(patient.id, &[(&cbc, 1)], 0.0))
            .await
            .expect("bill should succeed");
        let second = h
            .services
            .opd
            .create(request(patient.id, &[(&cbc, 1)], 0.0))
            .await
            .expect("bill should succeed");

        h.services.opd.delete(first.bill.id).await.expect("delete should succeed");
        assert_eq!(count_all(&h).await, (1, 1, 1));

        let order = h
            .services
            .lab
            .get_order(second.bill.lab_order_id.expect("order"))
            .await
            .expect("order");
        h.services.lab.collect(order.tests[0].id).await.expect("collect");
        let err = h.services.opd.delete(second.bill.id).await.expect_err("lab work started");
        assert!(matches!(err, HisError::Precondition(_)));
        assert_eq!(count_all(&h).await, (1, 1, 1));
    }

    #[tokio::test]
    async fn test_bill_pdf_renders() {
        let h = harness();
        let patient = h.patient().await;
        let consult = h.service("CONS", ServiceCategory::Consultation, Applicability::Opd, 500.0).await;
        let bill = h
            .services
            .opd
            .create(request(patient.id, &[(&consult, 1)], 0.0))
            .await
            .expect("bill should succeed");
        let (name, bytes) = h.services.opd.bill_pdf(bill.bill.id).await.expect("pdf");
        assert_eq!(name, "OPD-00001");
        assert!(bytes.starts_with(b"%PDF"));
    }
}
