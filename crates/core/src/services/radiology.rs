//! Radiology report templates and per-test reports.

use super::lab::stage_with_rollup;
use super::{id_value, search_filter, ServiceContext};
use crate::models::{
    clean, LabOrder, LabOrderTest, Patient, PatientSummary, RadiologyReport,
    RadiologyReportRequest, RadiologyTemplate, RadiologyTemplateRequest, Service,
};
use crate::pagination::{paginate, PageRequest, Paginated};
use crate::pdf::{documents, render};
use crate::store::{Filter, Query, Sort, UnitOfWork};
use crate::validation::Validate;
use crate::vocab::LabStatus;
use crate::{HisError, HisResult};
use api_shared::DropdownOption;
use uuid::Uuid;

#[derive(Clone)]
pub struct RadiologyService {
    ctx: ServiceContext,
}

impl RadiologyService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    // =========================================================================
    // TEMPLATES
    // =========================================================================

    async fn check_template(&self, req: &RadiologyTemplateRequest) -> HisResult<()> {
        req.validate()?;
        if let Some(service_id) = req.service_id {
            self.ctx.require::<Service>(service_id, "Service").await?;
        }
        Ok(())
    }

    pub async fn create_template(&self, req: RadiologyTemplateRequest) -> HisResult<RadiologyTemplate> {
        self.check_template(&req).await?;
        let template = RadiologyTemplate::new(req, self.ctx.now());
        self.ctx.collection::<RadiologyTemplate>().insert(&template).await?;
        Ok(template)
    }

    pub async fn get_template(&self, id: Uuid) -> HisResult<RadiologyTemplate> {
        self.ctx.require(id, "Radiology template").await
    }

    pub async fn list_templates(
        &self,
        search: Option<&str>,
        page: &PageRequest,
    ) -> HisResult<Paginated<RadiologyTemplate>> {
        Ok(paginate(
            &self.ctx.collection::<RadiologyTemplate>(),
            search_filter(&["name"], search),
            Sort::asc("name"),
            page,
        )
        .await?)
    }

    pub async fn update_template(&self, id: Uuid, req: RadiologyTemplateRequest) -> HisResult<RadiologyTemplate> {
        self.check_template(&req).await?;
        let mut template = self.get_template(id).await?;
        template.apply(req, self.ctx.now());
        self.ctx.collection::<RadiologyTemplate>().replace(&template).await?;
        Ok(template)
    }

    pub async fn delete_template(&self, id: Uuid) -> HisResult<()> {
        let template = self.get_template(id).await?;
        self.ctx.collection::<RadiologyTemplate>().delete(template.id).await?;
        Ok(())
    }

    /// Templates for a service, plus the general ones that name no service.
    pub async fn template_dropdown(&self, service_id: Option<Uuid>) -> HisResult<Vec<DropdownOption>> {
        let filter = match service_id {
            Some(id) => Filter::any_of(vec![
                Filter::eq("serviceId", id_value(id)),
                Filter::eq("serviceId", serde_json::Value::Null),
            ]),
            None => Filter::All,
        };
        let templates = self
            .ctx
            .collection::<RadiologyTemplate>()
            .find(&Query::new(filter).sort(Sort::asc("name")))
            .await?;
        Ok(templates
            .into_iter()
            .map(|t| DropdownOption::new(t.id, t.name.as_str()))
            .collect())
    }

    // =========================================================================
    // REPORTS
    // =========================================================================

    async fn radiology_test(&self, test_id: Uuid) -> HisResult<LabOrderTest> {
        let test: LabOrderTest = self.ctx.require(test_id, "Lab test").await?;
        if !test.is_radiology() {
            return Err(HisError::precondition(format!(
                "{} is not a radiology test",
                test.name
            )));
        }
        Ok(test)
    }

    fn for_test(test_id: Uuid) -> Filter {
        Filter::eq("labOrderTestId", id_value(test_id))
    }

    /// Write or rewrite the report for a radiology test and mark the test saved.
    ///
    /// # Errors
    ///
    /// Returns `HisError::Precondition` for non-radiology tests and for tests that are already
    /// authorised.
    pub async fn save_report(
        &self,
        test_id: Uuid,
        req: RadiologyReportRequest,
        user_id: Uuid,
    ) -> HisResult<RadiologyReport> {
        req.validate()?;
        let mut test = self.radiology_test(test_id).await?;
        if test.status == LabStatus::Authorized {
            tracing::warn!(test_id = %test_id, "report rejected for authorised test");
            return Err(HisError::precondition(
                "Report cannot be changed after authorisation",
            ));
        }
        if let Some(template_id) = req.template_id {
            self.get_template(template_id).await?;
        }

        let now = self.ctx.now();
        let mut unit = UnitOfWork::new();
        let report = match self
            .ctx
            .collection::<RadiologyReport>()
            .find_one(Self::for_test(test.id))
            .await?
        {
            Some(mut report) => {
                report.template_id = req.template_id;
                report.content = req.content.into_inner();
                report.impression = clean(req.impression);
                report.reported_by = Some(user_id);
                report.updated_at = now;
                unit.replace(&report)?;
                report
            }
            None => {
                let report = RadiologyReport {
                    id: Uuid::new_v4(),
                    lab_order_test_id: test.id,
                    template_id: req.template_id,
                    content: req.content.into_inner(),
                    impression: clean(req.impression),
                    reported_by: Some(user_id),
                    created_at: now,
                    updated_at: now,
                };
                unit.insert(&report)?;
                report
            }
        };

        test.status = LabStatus::Saved;
        test.saved_at = Some(now);
        test.updated_at = now;
        stage_with_rollup(&self.ctx, &mut unit, &test).await?;
        self.ctx.commit(unit).await?;
        tracing::info!(test_id = %test_id, "radiology report saved");
        Ok(report)
    }

    pub async fn get_report(&self, test_id: Uuid) -> HisResult<RadiologyReport> {
        self.radiology_test(test_id).await?;
        self.ctx
            .collection::<RadiologyReport>()
            .find_one(Self::for_test(test_id))
            .await?
            .ok_or(HisError::NotFound("Radiology report"))
    }

    pub async fn report_pdf(&self, test_id: Uuid) -> HisResult<(String, Vec<u8>)> {
        let report = self.get_report(test_id).await?;
        let test: LabOrderTest = self.ctx.require(test_id, "Lab test").await?;
        let order: LabOrder = self.ctx.require(test.lab_order_id, "Lab order").await?;
        let patient = self.ctx.collection::<Patient>().get(order.patient_id).await?;
        let layout = documents::radiology_layout(
            &self.ctx.letterhead(),
            &order.accession_number,
            patient.as_ref().map(PatientSummary::from).as_ref(),
            &test,
            &report,
        );
        Ok((order.accession_number.clone(), render(&layout)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BillLineRequest, OpdBillingRequest};
    use crate::services::testing::{harness, text, Harness};
    use crate::vocab::{Applicability, PaymentMode, ServiceCategory};

    /// Bills one X-ray and returns its order test.
    async fn xray_test(h: &Harness) -> LabOrderTest {
        let patient = h.patient().await;
        let xray = h.service("XRAY", ServiceCategory::Radiology, Applicability::Both, 400.0).await;
        let bill = h
            .services
            .opd
            .create(OpdBillingRequest {
                patient_id: patient.id,
                visit_id: None,
                doctor_id: None,
                services: vec![BillLineRequest {
                    service_id: xray.id,
                    quantity: 1,
                    price: None,
                }],
                discount: None,
                paid_amount: None,
                payment_mode: PaymentMode::Cash,
            })
            .await
            .expect("bill should succeed");
        let order = h
            .services
            .lab
            .get_order(bill.bill.lab_order_id.expect("order"))
            .await
            .expect("order should load");
        order.tests[0].clone()
    }

    fn report(content: &str) -> RadiologyReportRequest {
        RadiologyReportRequest {
            template_id: None,
            content: text(content),
            impression: Some("Normal study".into()),
        }
    }

    #[tokio::test]
    async fn test_save_report_upserts_and_rolls_up() {
        let h = harness();
        let test = xray_test(&h).await;
        let radiology = &h.services.radiology;
        let user = Uuid::new_v4();

        let first = radiology
            .save_report(test.id, report("Lung fields clear."), user)
            .await
            .expect("save should succeed");
        let second = radiology
            .save_report(test.id, report("Lung fields clear. No effusion."), user)
            .await
            .expect("resave should succeed");
        assert_eq!(first.id, second.id);

        let order = h.services.lab.get_order(test.lab_order_id).await.expect("order");
        assert_eq!(order.order.status, LabStatus::Saved);

        let detail = h.services.lab.get_test(test.id).await.expect("detail");
        assert_eq!(
            detail.radiology_report.map(|r| r.content),
            Some("Lung fields clear. No effusion.".to_owned())
        );

        let (_, pdf) = radiology.report_pdf(test.id).await.expect("pdf should render");
        assert!(pdf.starts_with(b"%PDF"));

        h.services
            .lab
            .authorize(test.id, Default::default(), user)
            .await
            .expect("authorize should succeed");
        let err = radiology
            .save_report(test.id, report("Changed"), user)
            .await
            .expect_err("authorised report is locked");
        assert!(matches!(err, HisError::Precondition(_)));
    }

    #[tokio::test]
    async fn test_template_dropdown_includes_general_templates() {
        let h = harness();
        let xray = h.service("XRAY", ServiceCategory::Radiology, Applicability::Both, 400.0).await;
        let usg = h.service("USG", ServiceCategory::Radiology, Applicability::Both, 900.0).await;
        let radiology = &h.services.radiology;
        for (name, service_id) in [
            ("Chest PA", Some(xray.id)),
            ("Abdomen", Some(usg.id)),
            ("Free text", None),
        ] {
            radiology
                .create_template(RadiologyTemplateRequest {
                    name: text(name),
                    service_id,
                    content: text("Findings:"),
                })
                .await
                .expect("template should succeed");
        }
        let options = radiology
            .template_dropdown(Some(xray.id))
            .await
            .expect("dropdown should succeed");
        let labels: Vec<_> = options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, ["Chest PA", "Free text"]);
    }
}
