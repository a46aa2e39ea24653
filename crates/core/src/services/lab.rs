//! Laboratory orders and the sample → result → authorisation workflow.
//!
//! Billing raises one [`LabOrder`] per bill that includes Laboratory or Radiology services,
//! with one [`LabOrderTest`] per such line. Each test then moves through
//! `pending → collected → saved → authorized`, and every test write also recomputes the
//! order status as the lowest status among its tests, in the same unit of work.

use super::{id_value, ServiceContext};
use crate::models::{
    clean, BillLine, BioReference, LabOrder, LabOrderFilter, LabOrderTest, LabOrderView,
    LabParameter, LabRemarksRequest, LabResult, LabStatusRequest, LabTest, LabTestDetail,
    ParameterDetail, Patient, PatientSummary, RadiologyReport, SaveResultsRequest,
};
use crate::pagination::{paginate, PageRequest, Paginated};
use crate::pdf::{documents, render};
use crate::reference::{applicable_references, is_abnormal};
use crate::store::{Filter, Query, Sort, UnitOfWork};
use crate::time::Timestamp;
use crate::validation::Validate;
use crate::vocab::{BillingKind, LabStatus, ResultType};
use crate::{HisError, HisResult};
use his_ids::CodeKind;
use std::collections::HashMap;
use uuid::Uuid;

/// Who and what a staged lab order is for.
pub(crate) struct OrderSource {
    pub patient_id: Uuid,
    pub billing_id: Uuid,
    pub billing_kind: BillingKind,
    pub doctor_id: Option<Uuid>,
    /// Order to append to instead of raising a new one.
    pub existing_order: Option<Uuid>,
}

/// Stage an order and its tests for the lab-relevant `lines`.
///
/// Returns the order id, or the existing order id unchanged when no line needs the lab.
pub(crate) async fn stage_order(
    ctx: &ServiceContext,
    unit: &mut UnitOfWork,
    source: OrderSource,
    lines: &[BillLine],
) -> HisResult<Option<Uuid>> {
    let lab_lines: Vec<(&BillLine, Uuid)> = lines
        .iter()
        .filter(|l| l.category.is_lab_relevant())
        .filter_map(|l| l.service_id.map(|id| (l, id)))
        .collect();
    if lab_lines.is_empty() {
        return Ok(source.existing_order);
    }

    let now = ctx.now();
    let definitions: HashMap<Uuid, LabTest> = ctx
        .collection::<LabTest>()
        .find(&Query::new(Filter::one_of(
            "serviceId",
            lab_lines.iter().map(|(_, id)| id.to_string()),
        )))
        .await?
        .into_iter()
        .map(|t| (t.service_id, t))
        .collect();

    let order = match source.existing_order {
        Some(id) => {
            let mut order: LabOrder = ctx.require(id, "Lab order").await?;
            if order.status != LabStatus::Pending {
                order.status = LabStatus::Pending;
                order.updated_at = now;
                unit.replace(&order)?;
            }
            order
        }
        None => {
            let accession = ctx.codes().next_daily(CodeKind::Accession).await?;
            let order = LabOrder {
                id: Uuid::new_v4(),
                accession_number: accession.to_string(),
                patient_id: source.patient_id,
                billing_id: source.billing_id,
                billing_kind: source.billing_kind,
                doctor_id: source.doctor_id,
                status: LabStatus::Pending,
                created_at: now,
                updated_at: now,
            };
            unit.insert(&order)?;
            order
        }
    };

    for (line, service_id) in lab_lines {
        let definition = definitions.get(&service_id);
        let test = LabOrderTest {
            id: Uuid::new_v4(),
            lab_order_id: order.id,
            service_id,
            lab_test_id: definition.map(|d| d.id),
            name: line.name.clone(),
            category: line.category,
            sample_type: definition.map(|d| d.sample_type),
            status: LabStatus::Pending,
            collected_at: None,
            saved_at: None,
            authorized_at: None,
            authorized_by: None,
            remarks: None,
            created_at: now,
            updated_at: now,
        };
        unit.insert(&test)?;
    }
    tracing::info!(order_id = %order.id, accession = %order.accession_number, "lab order staged");
    Ok(Some(order.id))
}

/// Stage deletion of an order whose tests are all still pending.
pub(crate) async fn stage_order_removal(
    ctx: &ServiceContext,
    unit: &mut UnitOfWork,
    order_id: Uuid,
) -> HisResult<()> {
    let tests = tests_of(ctx, order_id).await?;
    if tests.iter().any(|t| t.status != LabStatus::Pending) {
        return Err(HisError::precondition(
            "Lab work has already started on this bill",
        ));
    }
    for test in &tests {
        unit.delete::<LabOrderTest>(test.id);
    }
    unit.delete::<LabOrder>(order_id);
    Ok(())
}

async fn tests_of(ctx: &ServiceContext, order_id: Uuid) -> HisResult<Vec<LabOrderTest>> {
    let query = Query::new(Filter::eq("labOrderId", id_value(order_id))).sort(Sort::asc("createdAt"));
    Ok(ctx.collection::<LabOrderTest>().find(&query).await?)
}

/// Stage `test` and the order status implied by it and its siblings.
pub(crate) async fn stage_with_rollup(
    ctx: &ServiceContext,
    unit: &mut UnitOfWork,
    test: &LabOrderTest,
) -> HisResult<LabStatus> {
    unit.replace(test)?;
    let mut order: LabOrder = ctx.require(test.lab_order_id, "Lab order").await?;
    let siblings = tests_of(ctx, order.id).await?;
    let status = LabStatus::rollup(
        siblings
            .iter()
            .map(|t| if t.id == test.id { test.status } else { t.status }),
    );
    if status != order.status {
        order.status = status;
        order.updated_at = ctx.now();
        unit.replace(&order)?;
    }
    Ok(status)
}

#[derive(Clone)]
pub struct LabService {
    ctx: ServiceContext,
}

impl LabService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn list_orders(&self, filter: &LabOrderFilter, page: &PageRequest) -> HisResult<Paginated<LabOrderView>> {
        let predicate = Filter::all_of(vec![
            filter
                .patient_id
                .map_or(Filter::All, |id| Filter::eq("patientId", id_value(id))),
            filter
                .status
                .map_or(Filter::All, |s| Filter::eq("status", s.as_str())),
            filter
                .billing_kind
                .map_or(Filter::All, |k| Filter::eq("billingKind", k.as_str())),
            super::search_filter(&["accessionNumber"], filter.search.as_deref()),
        ]);
        let page = paginate(
            &self.ctx.collection::<LabOrder>(),
            predicate,
            Sort::desc("createdAt"),
            page,
        )
        .await?;
        let items = self.populate(page.items.clone()).await?;
        Ok(page.with_items(items))
    }

    async fn populate(&self, orders: Vec<LabOrder>) -> HisResult<Vec<LabOrderView>> {
        let patients = self
            .ctx
            .collection::<Patient>()
            .get_many(orders.iter().map(|o| o.patient_id))
            .await?;
        let tests = self
            .ctx
            .collection::<LabOrderTest>()
            .find(
                &Query::new(Filter::one_of(
                    "labOrderId",
                    orders.iter().map(|o| o.id.to_string()),
                ))
                .sort(Sort::asc("createdAt")),
            )
            .await?;
        let mut by_order: HashMap<Uuid, Vec<LabOrderTest>> = HashMap::new();
        for test in tests {
            by_order.entry(test.lab_order_id).or_default().push(test);
        }
        Ok(orders
            .into_iter()
            .map(|order| LabOrderView {
                tests: by_order.remove(&order.id).unwrap_or_default(),
                patient: patients.get(&order.patient_id).map(PatientSummary::from),
                order,
            })
            .collect())
    }

    pub async fn get_order(&self, id: Uuid) -> HisResult<LabOrderView> {
        let order: LabOrder = self.ctx.require(id, "Lab order").await?;
        Ok(self.populate(vec![order]).await?.remove(0))
    }

    async fn require_test(&self, id: Uuid) -> HisResult<LabOrderTest> {
        self.ctx.require(id, "Lab test").await
    }

    /// A test with its parameters, the reference ranges that apply to this patient, saved
    /// results, and the radiology report if there is one.
    pub async fn get_test(&self, id: Uuid) -> HisResult<LabTestDetail> {
        let test = self.require_test(id).await?;
        self.detail(test).await
    }

    async fn detail(&self, test: LabOrderTest) -> HisResult<LabTestDetail> {
        let order: LabOrder = self.ctx.require(test.lab_order_id, "Lab order").await?;
        let patient = self.ctx.collection::<Patient>().get(order.patient_id).await?;

        let parameter_ids = match test.lab_test_id {
            Some(id) => self
                .ctx
                .collection::<LabTest>()
                .get(id)
                .await?
                .map(|t| t.parameter_ids)
                .unwrap_or_default(),
            None => Vec::new(),
        };
        let parameters = self
            .ctx
            .collection::<LabParameter>()
            .get_many(parameter_ids.iter().copied())
            .await?;
        let references = self.references_by_parameter(&parameter_ids).await?;
        let mut results: HashMap<Uuid, LabResult> = self
            .results_of(test.id)
            .await?
            .into_iter()
            .map(|r| (r.parameter_id, r))
            .collect();

        let details = parameter_ids
            .iter()
            .filter_map(|id| parameters.get(id))
            .map(|parameter| {
                let all = references.get(&parameter.id).map(Vec::as_slice).unwrap_or_default();
                let references = match &patient {
                    Some(p) => applicable_references(all, p.gender, &p.age)
                        .into_iter()
                        .cloned()
                        .collect(),
                    None => all.to_vec(),
                };
                ParameterDetail {
                    parameter: parameter.clone(),
                    references,
                    result: results.remove(&parameter.id),
                }
            })
            .collect();

        let radiology_report = if test.is_radiology() {
            self.ctx
                .collection::<RadiologyReport>()
                .find_one(Filter::eq("labOrderTestId", id_value(test.id)))
                .await?
        } else {
            None
        };

        Ok(LabTestDetail {
            accession_number: order.accession_number,
            patient: patient.as_ref().map(PatientSummary::from),
            parameters: details,
            radiology_report,
            test,
        })
    }

    async fn references_by_parameter(&self, ids: &[Uuid]) -> HisResult<HashMap<Uuid, Vec<BioReference>>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let query = Query::new(Filter::one_of("parameterId", ids.iter().map(Uuid::to_string)))
            .sort(Sort::asc("minAge"));
        let mut grouped: HashMap<Uuid, Vec<BioReference>> = HashMap::new();
        for reference in self.ctx.collection::<BioReference>().find(&query).await? {
            grouped.entry(reference.parameter_id).or_default().push(reference);
        }
        Ok(grouped)
    }

    async fn results_of(&self, test_id: Uuid) -> HisResult<Vec<LabResult>> {
        Ok(self
            .ctx
            .collection::<LabResult>()
            .find(&Query::new(Filter::eq("labOrderTestId", id_value(test_id))))
            .await?)
    }

    async fn commit_test(&self, test: &LabOrderTest, mut unit: UnitOfWork) -> HisResult<LabStatus> {
        let status = stage_with_rollup(&self.ctx, &mut unit, test).await?;
        self.ctx.commit(unit).await?;
        Ok(status)
    }

    /// Record sample collection on a pending test.
    pub async fn collect(&self, id: Uuid) -> HisResult<LabOrderTest> {
        let mut test = self.require_test(id).await?;
        if test.status != LabStatus::Pending {
            tracing::warn!(test_id = %id, status = %test.status, "collect rejected");
            return Err(HisError::precondition(format!(
                "Sample can only be collected for a pending test; this test is {}",
                test.status
            )));
        }
        let now = self.ctx.now();
        test.status = LabStatus::Collected;
        test.collected_at = Some(now);
        test.updated_at = now;
        let order_status = self.commit_test(&test, UnitOfWork::new()).await?;
        tracing::info!(test_id = %id, order_status = %order_status, "sample collected");
        Ok(test)
    }

    /// Save parameter values, replacing any value already saved for the same parameter.
    ///
    /// # Errors
    ///
    /// Returns `HisError::Precondition` unless the test is a collected or saved laboratory
    /// test with a catalogue definition, and `HisError::Validation` for parameters that are
    /// not part of that definition.
    pub async fn save_results(&self, id: Uuid, req: SaveResultsRequest) -> HisResult<LabTestDetail> {
        req.validate()?;
        let mut test = self.require_test(id).await?;
        if test.is_radiology() {
            return Err(HisError::precondition(
                "Radiology tests take a report, not parameter results",
            ));
        }
        if !matches!(test.status, LabStatus::Collected | LabStatus::Saved) {
            tracing::warn!(test_id = %id, status = %test.status, "save results rejected");
            return Err(HisError::precondition(format!(
                "Results can only be saved after collection and before authorisation; this test is {}",
                test.status
            )));
        }
        let definition: LabTest = match test.lab_test_id {
            Some(def) => self.ctx.collection::<LabTest>().get(def).await?,
            None => None,
        }
        .ok_or_else(|| {
            HisError::precondition(format!(
                "{} has no test definition in the catalogue",
                test.name
            ))
        })?;
        if let Some(entry) = req
            .results
            .iter()
            .find(|e| !definition.parameter_ids.contains(&e.parameter_id))
        {
            return Err(HisError::validation(format!(
                "parameter {} is not part of {}",
                entry.parameter_id, test.name
            )));
        }

        let order: LabOrder = self.ctx.require(test.lab_order_id, "Lab order").await?;
        let patient = self.ctx.collection::<Patient>().get(order.patient_id).await?;
        let ids: Vec<Uuid> = req.results.iter().map(|e| e.parameter_id).collect();
        let parameters = self.ctx.collection::<LabParameter>().get_many(ids.iter().copied()).await?;
        let references = self.references_by_parameter(&ids).await?;
        let mut existing: HashMap<Uuid, LabResult> = self
            .results_of(test.id)
            .await?
            .into_iter()
            .map(|r| (r.parameter_id, r))
            .collect();

        let now = self.ctx.now();
        let mut unit = UnitOfWork::new();
        for entry in req.results {
            let parameter = parameters
                .get(&entry.parameter_id)
                .ok_or(HisError::NotFound("Lab parameter"))?;
            let abnormal = match (&patient, parameter.result_type) {
                (Some(p), ResultType::Numeric) => {
                    let all = references.get(&parameter.id).map(Vec::as_slice).unwrap_or_default();
                    is_abnormal(entry.value.as_str(), &applicable_references(all, p.gender, &p.age))
                }
                _ => None,
            };
            match existing.remove(&entry.parameter_id) {
                Some(mut result) => {
                    result.value = entry.value.into_inner();
                    result.unit = parameter.unit.clone();
                    result.is_abnormal = abnormal;
                    result.remarks = clean(entry.remarks);
                    result.updated_at = now;
                    unit.replace(&result)?;
                }
                None => {
                    unit.insert(&LabResult {
                        id: Uuid::new_v4(),
                        lab_order_test_id: test.id,
                        parameter_id: entry.parameter_id,
                        value: entry.value.into_inner(),
                        unit: parameter.unit.clone(),
                        is_abnormal: abnormal,
                        remarks: clean(entry.remarks),
                        created_at: now,
                        updated_at: now,
                    })?;
                }
            }
        }

        test.status = LabStatus::Saved;
        test.saved_at = Some(now);
        if let Some(remarks) = clean(req.remarks) {
            test.remarks = Some(remarks);
        }
        test.updated_at = now;
        self.commit_test(&test, unit).await?;
        tracing::info!(test_id = %id, "lab results saved");
        self.detail(test).await
    }

    /// Sign off a saved test.
    pub async fn authorize(&self, id: Uuid, req: LabRemarksRequest, user_id: Uuid) -> HisResult<LabOrderTest> {
        let mut test = self.require_test(id).await?;
        if test.status != LabStatus::Saved {
            tracing::warn!(test_id = %id, status = %test.status, "authorize rejected");
            return Err(HisError::precondition(format!(
                "Only saved results can be authorised; this test is {}",
                test.status
            )));
        }
        let now = self.ctx.now();
        test.status = LabStatus::Authorized;
        test.authorized_at = Some(now);
        test.authorized_by = Some(user_id);
        if let Some(remarks) = clean(req.remarks) {
            test.remarks = Some(remarks);
        }
        test.updated_at = now;
        let order_status = self.commit_test(&test, UnitOfWork::new()).await?;
        tracing::info!(test_id = %id, order_status = %order_status, "lab test authorised");
        Ok(test)
    }

    /// Set a test's status directly, bypassing the workflow checks. Timestamps for the new
    /// status are filled in if missing.
    pub async fn set_status(&self, id: Uuid, req: LabStatusRequest) -> HisResult<LabOrderTest> {
        let mut test = self.require_test(id).await?;
        let now = self.ctx.now();
        test.status = req.status;
        let stamp: Option<&mut Option<Timestamp>> = match req.status {
            LabStatus::Pending => None,
            LabStatus::Collected => Some(&mut test.collected_at),
            LabStatus::Saved => Some(&mut test.saved_at),
            LabStatus::Authorized => Some(&mut test.authorized_at),
        };
        if let Some(slot) = stamp {
            slot.get_or_insert(now);
        }
        test.updated_at = now;
        self.commit_test(&test, UnitOfWork::new()).await?;
        tracing::info!(test_id = %id, status = %req.status, "lab test status overridden");
        Ok(test)
    }

    /// PDF of every laboratory test on the order that has results.
    pub async fn report_pdf(&self, order_id: Uuid) -> HisResult<(String, Vec<u8>)> {
        let order: LabOrder = self.ctx.require(order_id, "Lab order").await?;
        let mut details = Vec::new();
        for test in tests_of(&self.ctx, order.id).await? {
            if !test.is_radiology() && matches!(test.status, LabStatus::Saved | LabStatus::Authorized) {
                details.push(self.detail(test).await?);
            }
        }
        if details.is_empty() {
            return Err(HisError::precondition("No results are ready to report"));
        }
        let patient = details[0].patient.clone();
        let layout = documents::lab_report_layout(&self.ctx.letterhead(), &order, patient.as_ref(), &details);
        Ok((order.accession_number, render(&layout)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BillLineRequest, OpdBillingRequest, ResultEntry};
    use crate::services::catalog::CatalogFile;
    use crate::services::testing::{harness, text, Harness};
    use crate::vocab::{Applicability, PaymentMode, ServiceCategory};

    const CATALOGUE: &str = r#"
parameters:
  - name: Haemoglobin
    unit: g/dL
    resultType: numeric
    references:
      - { gender: Female, minAge: 18, maxAge: 120, lowerValue: 12, upperValue: 15.5 }
  - name: Remarks
    resultType: text
  - name: Fasting Glucose
    unit: mg/dL
    resultType: numeric
services:
  - { name: Complete Blood Count, code: CBC, category: Laboratory, applicability: Both, price: 350,
      test: { sampleType: Blood, parameters: [Haemoglobin, Remarks] } }
  - { name: Blood Sugar, code: BSF, category: Laboratory, applicability: Both, price: 120,
      test: { sampleType: Plasma, parameters: [Fasting Glucose] } }
"#;

    /// A bill with two lab tests; returns the order view.
    async fn billed_order(h: &Harness) -> LabOrderView {
        h.services
            .catalog
            .import(CatalogFile::from_yaml(CATALOGUE).expect("parse"))
            .await
            .expect("import should succeed");
        let consult = h
            .service("CONS", ServiceCategory::Consultation, Applicability::Opd, 500.0)
            .await;
        let services = h
            .services
            .catalog
            .list_services(&Default::default(), &PageRequest::default())
            .await
            .expect("list should succeed")
            .items;
        let lines = services
            .iter()
            .map(|s| BillLineRequest {
                service_id: s.id,
                quantity: 1,
                price: None,
            })
            .collect();
        let patient = h.patient().await;
        let bill = h
            .services
            .opd
            .create(OpdBillingRequest {
                patient_id: patient.id,
                visit_id: None,
                doctor_id: None,
                services: lines,
                discount: None,
                paid_amount: None,
                payment_mode: PaymentMode::Cash,
            })
            .await
            .expect("bill should succeed");
        assert_eq!(bill.bill.services.len(), 3);
        assert!(bill.bill.services.iter().any(|l| l.service_id == Some(consult.id)));
        let order_id = bill.bill.lab_order_id.expect("lab order should be raised");
        h.services.lab.get_order(order_id).await.expect("order should load")
    }

    fn test_named<'a>(view: &'a LabOrderView, name: &str) -> &'a LabOrderTest {
        view.tests
            .iter()
            .find(|t| t.name == name)
            .expect("test should exist")
    }

    #[tokio::test]
    async fn test_order_rolls_up_lowest_status() {
        let h = harness();
        let view = billed_order(&h).await;
        assert_eq!(view.tests.len(), 2);
        assert_eq!(view.order.accession_number, "LAB202610160001");
        let lab = &h.services.lab;
        let cbc = test_named(&view, "Complete Blood Count").id;
        let bsf = test_named(&view, "Blood Sugar").id;

        lab.collect(cbc).await.expect("collect should succeed");
        assert_eq!(lab.get_order(view.order.id).await.expect("order").order.status, LabStatus::Pending);

        lab.collect(bsf).await.expect("collect should succeed");
        assert_eq!(lab.get_order(view.order.id).await.expect("order").order.status, LabStatus::Collected);

        for id in [cbc, bsf] {
            lab.set_status(id, LabStatusRequest { status: LabStatus::Saved })
                .await
                .expect("status should succeed");
        }
        lab.authorize(cbc, LabRemarksRequest::default(), Uuid::new_v4())
            .await
            .expect("authorize should succeed");
        assert_eq!(lab.get_order(view.order.id).await.expect("order").order.status, LabStatus::Saved);

        lab.authorize(bsf, LabRemarksRequest::default(), Uuid::new_v4())
            .await
            .expect("authorize should succeed");
        assert_eq!(
            lab.get_order(view.order.id).await.expect("order").order.status,
            LabStatus::Authorized
        );
    }

    #[tokio::test]
    async fn test_workflow_order_is_enforced() {
        let h = harness();
        let view = billed_order(&h).await;
        let lab = &h.services.lab;
        let cbc = test_named(&view, "Complete Blood Count").id;

        let err = lab
            .authorize(cbc, LabRemarksRequest::default(), Uuid::new_v4())
            .await
            .expect_err("pending test cannot be authorised");
        assert!(matches!(err, HisError::Precondition(_)));

        lab.collect(cbc).await.expect("collect should succeed");
        let err = lab.collect(cbc).await.expect_err("double collect");
        assert!(matches!(err, HisError::Precondition(_)));
    }

    #[tokio::test]
    async fn test_save_results_flags_abnormal_and_upserts() {
        let h = harness();
        let view = billed_order(&h).await;
        let lab = &h.services.lab;
        let cbc = test_named(&view, "Complete Blood Count").id;
        lab.collect(cbc).await.expect("collect should succeed");

        let detail = lab.get_test(cbc).await.expect("detail should load");
        let hb = detail.parameters[0].parameter.id;
        let remarks = detail.parameters[1].parameter.id;
        assert_eq!(detail.parameters[0].references.len(), 1);

        let save = |value: &str| SaveResultsRequest {
            results: vec![
                ResultEntry {
                    parameter_id: hb,
                    value: text(value),
                    remarks: None,
                },
                ResultEntry {
                    parameter_id: remarks,
                    value: text("Normocytic"),
                    remarks: None,
                },
            ],
            remarks: None,
        };
        let detail = lab.save_results(cbc, save("9.8")).await.expect("save should succeed");
        let hb_result = detail.parameters[0].result.clone().expect("result should be saved");
        assert_eq!(hb_result.is_abnormal, Some(true));
        assert_eq!(hb_result.unit.as_deref(), Some("g/dL"));
        assert_eq!(detail.parameters[1].result.as_ref().and_then(|r| r.is_abnormal), None);

        let detail = lab.save_results(cbc, save("13.1")).await.expect("resave should succeed");
        assert_eq!(detail.parameters[0].result.as_ref().and_then(|r| r.is_abnormal), Some(false));
        let stored = h
            .ctx
            .collection::<LabResult>()
            .count(&Filter::All)
            .await
            .expect("count");
        assert_eq!(stored, 2);
        assert_eq!(detail.test.status, LabStatus::Saved);

        let (accession, pdf) = lab.report_pdf(view.order.id).await.expect("report should render");
        assert_eq!(accession, view.order.accession_number);
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_save_results_rejects_foreign_parameter() {
        let h = harness();
        let view = billed_order(&h).await;
        let lab = &h.services.lab;
        let cbc = test_named(&view, "Complete Blood Count").id;
        lab.collect(cbc).await.expect("collect should succeed");
        let err = lab
            .save_results(
                cbc,
                SaveResultsRequest {
                    results: vec![ResultEntry {
                        parameter_id: Uuid::new_v4(),
                        value: text("1"),
                        remarks: None,
                    }],
                    remarks: None,
                },
            )
            .await
            .expect_err("unknown parameter");
        assert!(matches!(err, HisError::Validation(_)));
    }
}
