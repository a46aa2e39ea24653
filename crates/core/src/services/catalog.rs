//! Service catalogue: billable services, lab test definitions, parameters and reference
//! ranges, plus bulk import from a YAML catalogue file.

use super::{id_value, search_filter, ServiceContext};
use crate::models::{
    BioReference, BioReferenceRequest, LabParameter, LabParameterRequest, LabTest, LabTestRequest,
    LabTestView, Patient, ReferenceFilter, Service, ServiceFilter, ServiceRequest,
};
use crate::pagination::{paginate, PageRequest, Paginated};
use crate::reference::applicable_references;
use crate::store::{Filter, Query, Sort, UnitOfWork};
use crate::validation::Validate;
use crate::vocab::{AgeUnit, Applicability, ReferenceGender, ResultType, SampleType, ServiceCategory};
use crate::{HisError, HisResult};
use api_shared::DropdownOption;
use his_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use uuid::Uuid;

#[derive(Clone)]
pub struct CatalogService {
    ctx: ServiceContext,
}

/// `OPD` and `IPD` also match services applicable to both desks.
fn applicability_filter(applicability: Option<Applicability>) -> Filter {
    match applicability {
        None | Some(Applicability::Both) => applicability
            .map_or(Filter::All, |a| Filter::eq("applicability", a.as_str())),
        Some(a) => Filter::one_of("applicability", [a.as_str(), Applicability::Both.as_str()]),
    }
}

impl CatalogService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    // ========================================================================
    // SERVICES
    // ========================================================================

    async fn check_code(&self, code: &str, except: Option<Uuid>) -> HisResult<()> {
        let filter = Filter::all_of(vec![
            Filter::eq("code", code.to_ascii_uppercase()),
            except.map_or(Filter::All, |id| Filter::ne("id", id_value(id))),
        ]);
        if self.ctx.collection::<Service>().exists(filter).await? {
            return Err(HisError::precondition(format!(
                "Service code {} already exists",
                code.to_ascii_uppercase()
            )));
        }
        Ok(())
    }

    pub async fn create_service(&self, req: ServiceRequest) -> HisResult<Service> {
        req.validate()?;
        self.check_code(req.code.as_str(), None).await?;
        let service = Service::new(req, self.ctx.now());
        self.ctx.collection::<Service>().insert(&service).await?;
        tracing::info!(service_id = %service.id, code = %service.code, "service created");
        Ok(service)
    }

    pub async fn get_service(&self, id: Uuid) -> HisResult<Service> {
        self.ctx.require(id, "Service").await
    }

    pub async fn list_services(&self, filter: &ServiceFilter, page: &PageRequest) -> HisResult<Paginated<Service>> {
        let predicate = Filter::all_of(vec![
            filter
                .category
                .map_or(Filter::All, |c| Filter::eq("category", c.as_str())),
            applicability_filter(filter.applicability),
            search_filter(&["name", "code"], filter.search.as_deref()),
            filter
                .is_active
                .map_or(Filter::All, |active| Filter::eq("isActive", active)),
        ]);
        Ok(paginate(&self.ctx.collection::<Service>(), predicate, Sort::asc("name"), page).await?)
    }

    pub async fn update_service(&self, id: Uuid, req: ServiceRequest) -> HisResult<Service> {
        req.validate()?;
        let mut service = self.get_service(id).await?;
        self.check_code(req.code.as_str(), Some(id)).await?;
        if !req.category.is_lab_relevant() && self.lab_test_for_service(id).await?.is_some() {
            return Err(HisError::precondition(
                "Service has a lab test definition; its category must stay Laboratory or Radiology",
            ));
        }
        service.apply(req, self.ctx.now());
        self.ctx.collection::<Service>().replace(&service).await?;
        Ok(service)
    }

    /// Issued bills keep their own copy of the line, so deleting a service does not touch them.
    pub async fn delete_service(&self, id: Uuid) -> HisResult<()> {
        let service = self.get_service(id).await?;
        if self.lab_test_for_service(id).await?.is_some() {
            return Err(HisError::precondition(
                "Service has a lab test definition; delete it first",
            ));
        }
        self.ctx.collection::<Service>().delete(service.id).await?;
        Ok(())
    }

    /// Active services billable at the given desk.
    pub async fn service_dropdown(
        &self,
        applicability: Option<Applicability>,
        category: Option<ServiceCategory>,
    ) -> HisResult<Vec<DropdownOption>> {
        let filter = Filter::all_of(vec![
            Filter::eq("isActive", true),
            applicability_filter(applicability),
            category.map_or(Filter::All, |c| Filter::eq("category", c.as_str())),
        ]);
        let services = self
            .ctx
            .collection::<Service>()
            .find(&Query::new(filter).sort(Sort::asc("name")))
            .await?;
        Ok(services
            .iter()
            .map(|s| DropdownOption::new(s.id, format!("{} ({}) - {:.2}", s.name, s.code, s.price)))
            .collect())
    }

    // ========================================================================
    // LAB TESTS
    // ========================================================================

    pub async fn lab_test_for_service(&self, service_id: Uuid) -> HisResult<Option<LabTest>> {
        Ok(self
            .ctx
            .collection::<LabTest>()
            .find_one(Filter::eq("serviceId", id_value(service_id)))
            .await?)
    }

    async fn check_lab_test(&self, req: &LabTestRequest, except: Option<Uuid>) -> HisResult<()> {
        let service = self.get_service(req.service_id).await?;
        if !service.category.is_lab_relevant() {
            return Err(HisError::precondition(format!(
                "{} is not a Laboratory or Radiology service",
                service.name
            )));
        }
        if let Some(existing) = self.lab_test_for_service(req.service_id).await? {
            if Some(existing.id) != except {
                return Err(HisError::precondition(format!(
                    "{} already has a lab test definition",
                    service.name
                )));
            }
        }
        let found = self
            .ctx
            .collection::<LabParameter>()
            .get_many(req.parameter_ids.iter().copied())
            .await?;
        if found.len() != req.parameter_ids.len() {
            return Err(HisError::NotFound("Lab parameter"));
        }
        Ok(())
    }

    pub async fn create_lab_test(&self, req: LabTestRequest) -> HisResult<LabTestView> {
        req.validate()?;
        self.check_lab_test(&req, None).await?;
        let test = LabTest::new(req, self.ctx.now());
        self.ctx.collection::<LabTest>().insert(&test).await?;
        Ok(self.view_lab_tests(vec![test]).await?.remove(0))
    }

    pub async fn get_lab_test(&self, id: Uuid) -> HisResult<LabTestView> {
        let test: LabTest = self.ctx.require(id, "Lab test").await?;
        Ok(self.view_lab_tests(vec![test]).await?.remove(0))
    }

    async fn view_lab_tests(&self, tests: Vec<LabTest>) -> HisResult<Vec<LabTestView>> {
        let parameters = self
            .ctx
            .collection::<LabParameter>()
            .get_many(tests.iter().flat_map(|t| t.parameter_ids.iter().copied()))
            .await?;
        Ok(tests
            .into_iter()
            .map(|test| LabTestView {
                parameters: test
                    .parameter_ids
                    .iter()
                    .filter_map(|id| parameters.get(id).cloned())
                    .collect(),
                test,
            })
            .collect())
    }

    pub async fn list_lab_tests(&self, search: Option<&str>, page: &PageRequest) -> HisResult<Paginated<LabTestView>> {
        let page = paginate(
            &self.ctx.collection::<LabTest>(),
            search_filter(&["name"], search),
            Sort::asc("name"),
            page,
        )
        .await?;
        let items = self.view_lab_tests(page.items.clone()).await?;
        Ok(page.with_items(items))
    }

    pub async fn update_lab_test(&self, id: Uuid, req: LabTestRequest) -> HisResult<LabTestView> {
        req.validate()?;
        let mut test: LabTest = self.ctx.require(id, "Lab test").await?;
        self.check_lab_test(&req, Some(id)).await?;
        test.apply(req, self.ctx.now());
        self.ctx.collection::<LabTest>().replace(&test).await?;
        Ok(self.view_lab_tests(vec![test]).await?.remove(0))
    }

    pub async fn delete_lab_test(&self, id: Uuid) -> HisResult<()> {
        let test: LabTest = self.ctx.require(id, "Lab test").await?;
        self.ctx.collection::<LabTest>().delete(test.id).await?;
        Ok(())
    }

    // ========================================================================
    // PARAMETERS
    // ========================================================================

    pub async fn create_parameter(&self, req: LabParameterRequest) -> HisResult<LabParameter> {
        req.validate()?;
        let parameter = LabParameter::new(req, self.ctx.now());
        self.ctx.collection::<LabParameter>().insert(&parameter).await?;
        Ok(parameter)
    }

    pub async fn get_parameter(&self, id: Uuid) -> HisResult<LabParameter> {
        self.ctx.require(id, "Lab parameter").await
    }

    pub async fn list_parameters(&self, search: Option<&str>, page: &PageRequest) -> HisResult<Paginated<LabParameter>> {
        Ok(paginate(
            &self.ctx.collection::<LabParameter>(),
            search_filter(&["name"], search),
            Sort::asc("name"),
            page,
        )
        .await?)
    }

    pub async fn update_parameter(&self, id: Uuid, req: LabParameterRequest) -> HisResult<LabParameter> {
        req.validate()?;
        let mut parameter = self.get_parameter(id).await?;
        parameter.apply(req, self.ctx.now());
        self.ctx.collection::<LabParameter>().replace(&parameter).await?;
        Ok(parameter)
    }

    /// Removes the parameter together with its reference ranges.
    ///
    /// # Errors
    ///
    /// Returns `HisError::Precondition` while any lab test lists the parameter.
    pub async fn delete_parameter(&self, id: Uuid) -> HisResult<()> {
        let parameter = self.get_parameter(id).await?;
        let tests = self.ctx.collection::<LabTest>().find(&Query::default()).await?;
        if let Some(test) = tests.iter().find(|t| t.parameter_ids.contains(&id)) {
            return Err(HisError::precondition(format!(
                "Parameter is used by lab test {}",
                test.name
            )));
        }
        let references = self.references_for(id).await?;

        let mut unit = UnitOfWork::new();
        unit.delete::<LabParameter>(parameter.id);
        for reference in &references {
            unit.delete::<BioReference>(reference.id);
        }
        self.ctx.commit(unit).await?;
        Ok(())
    }

    pub async fn parameter_dropdown(&self) -> HisResult<Vec<DropdownOption>> {
        let parameters = self
            .ctx
            .collection::<LabParameter>()
            .find(&Query::default().sort(Sort::asc("name")))
            .await?;
        Ok(parameters
            .iter()
            .map(|p| match p.unit.as_deref() {
                Some(unit) => DropdownOption::new(p.id, format!("{} ({unit})", p.name)),
                None => DropdownOption::new(p.id, p.name.as_str()),
            })
            .collect())
    }

    // ========================================================================
    // REFERENCE RANGES
    // ========================================================================

    pub(crate) async fn references_for(&self, parameter_id: Uuid) -> HisResult<Vec<BioReference>> {
        let query = Query::new(Filter::eq("parameterId", id_value(parameter_id))).sort(Sort::asc("minAge"));
        Ok(self.ctx.collection::<BioReference>().find(&query).await?)
    }

    pub async fn create_reference(&self, req: BioReferenceRequest) -> HisResult<BioReference> {
        req.validate()?;
        self.get_parameter(req.parameter_id).await?;
        let reference = BioReference::new(req, self.ctx.now());
        self.ctx.collection::<BioReference>().insert(&reference).await?;
        Ok(reference)
    }

    pub async fn get_reference(&self, id: Uuid) -> HisResult<BioReference> {
        self.ctx.require(id, "Reference range").await
    }

    pub async fn list_references(
        &self,
        filter: &ReferenceFilter,
        page: &PageRequest,
    ) -> HisResult<Paginated<BioReference>> {
        let predicate = filter
            .parameter_id
            .map_or(Filter::All, |id| Filter::eq("parameterId", id_value(id)));
        Ok(paginate(
            &self.ctx.collection::<BioReference>(),
            predicate,
            Sort::asc("minAge"),
            page,
        )
        .await?)
    }

    pub async fn update_reference(&self, id: Uuid, req: BioReferenceRequest) -> HisResult<BioReference> {
        req.validate()?;
        let mut reference = self.get_reference(id).await?;
        self.get_parameter(req.parameter_id).await?;
        reference.apply(req, self.ctx.now());
        self.ctx.collection::<BioReference>().replace(&reference).await?;
        Ok(reference)
    }

    pub async fn delete_reference(&self, id: Uuid) -> HisResult<()> {
        let reference = self.get_reference(id).await?;
        self.ctx.collection::<BioReference>().delete(reference.id).await?;
        Ok(())
    }

    /// The reference ranges of `parameter_id` that apply to the patient's gender and age.
    pub async fn applicable_references(&self, parameter_id: Uuid, patient_id: Uuid) -> HisResult<Vec<BioReference>> {
        self.get_parameter(parameter_id).await?;
        let patient: Patient = self.ctx.require(patient_id, "Patient").await?;
        let references = self.references_for(parameter_id).await?;
        Ok(applicable_references(&references, patient.gender, &patient.age)
            .into_iter()
            .cloned()
            .collect())
    }

    // ========================================================================
    // IMPORT
    // ========================================================================

    /// Load a catalogue file in one unit of work.
    ///
    /// Services whose code already exists are skipped. Parameters are matched by name
    /// (case-insensitive) against the store first; only newly created parameters get the
    /// reference ranges listed in the file.
    ///
    /// # Errors
    ///
    /// Returns `HisError::Validation` if an entry fails its checks or a test names a parameter
    /// that is neither in the file nor in the store. Nothing is written in that case.
    pub async fn import(&self, file: CatalogFile) -> HisResult<ImportSummary> {
        let now = self.ctx.now();
        let mut summary = ImportSummary::default();
        let mut unit = UnitOfWork::new();

        let existing = self.ctx.collection::<LabParameter>().find(&Query::default()).await?;
        let mut parameter_ids: HashMap<String, Uuid> = existing
            .iter()
            .map(|p| (p.name.as_str().to_lowercase(), p.id))
            .collect();

        for entry in file.parameters {
            let key = entry.name.as_str().to_lowercase();
            if parameter_ids.contains_key(&key) {
                summary.parameters_reused += 1;
                continue;
            }
            let request = LabParameterRequest {
                name: entry.name,
                unit: entry.unit,
                result_type: entry.result_type,
                description: entry.description,
            };
            request.validate()?;
            let parameter = LabParameter::new(request, now);
            for range in entry.references {
                let request = range.into_request(parameter.id);
                request.validate()?;
                unit.insert(&BioReference::new(request, now))?;
                summary.references_created += 1;
            }
            unit.insert(&parameter)?;
            parameter_ids.insert(key, parameter.id);
            summary.parameters_created += 1;
        }

        for entry in file.services {
            let request = ServiceRequest {
                name: entry.name,
                code: entry.code,
                category: entry.category,
                applicability: entry.applicability,
                price: entry.price,
                is_active: entry.is_active,
            };
            request.validate()?;
            let code = request.code.as_str().to_ascii_uppercase();
            if self
                .ctx
                .collection::<Service>()
                .exists(Filter::eq("code", code.as_str()))
                .await?
            {
                summary.services_skipped += 1;
                continue;
            }
            let service = Service::new(request, now);

            if let Some(test) = entry.test {
                if !service.category.is_lab_relevant() {
                    return Err(HisError::validation(format!(
                        "service {code}: only Laboratory or Radiology services can define a test"
                    )));
                }
                let ids = test
                    .parameters
                    .iter()
                    .map(|name| {
                        parameter_ids
                            .get(&name.trim().to_lowercase())
                            .copied()
                            .ok_or_else(|| {
                                HisError::validation(format!(
                                    "service {code}: unknown parameter '{name}'"
                                ))
                            })
                    })
                    .collect::<HisResult<Vec<_>>>()?;
                let request = LabTestRequest {
                    service_id: service.id,
                    name: test.name.unwrap_or_else(|| service.name.clone()),
                    sample_type: test.sample_type,
                    method: test.method,
                    parameter_ids: ids,
                };
                request.validate()?;
                unit.insert(&LabTest::new(request, now))?;
                summary.tests_created += 1;
            }
            unit.insert(&service)?;
            summary.services_created += 1;
        }

        self.ctx.commit(unit).await?;
        tracing::info!(
            services = summary.services_created,
            skipped = summary.services_skipped,
            parameters = summary.parameters_created,
            tests = summary.tests_created,
            "catalogue imported"
        );
        Ok(summary)
    }
}

// ============================================================================
// CATALOGUE FILE
// ============================================================================

/// A catalogue file: parameters with their reference ranges, then services with optional
/// test definitions that name parameters.
///
/// ```yaml
/// parameters:
///   - name: Haemoglobin
///     unit: g/dL
///     resultType: numeric
///     references:
///       - { gender: Male, minAge: 18, maxAge: 120, lowerValue: 13, upperValue: 17 }
/// services:
///   - name: Complete Blood Count
///     code: CBC
///     category: Laboratory
///     applicability: Both
///     price: 350
///     test: { sampleType: Blood, parameters: [Haemoglobin] }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CatalogFile {
    #[serde(default)]
    pub parameters: Vec<ParameterEntry>,
    #[serde(default)]
    pub services: Vec<ServiceEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ParameterEntry {
    pub name: NonEmptyText,
    pub unit: Option<String>,
    pub result_type: ResultType,
    pub description: Option<String>,
    #[serde(default)]
    pub references: Vec<ReferenceEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReferenceEntry {
    pub gender: Option<ReferenceGender>,
    pub age_type: Option<AgeUnit>,
    pub min_age: Option<f64>,
    pub max_age: Option<f64>,
    pub lower_value: Option<f64>,
    pub upper_value: Option<f64>,
    pub reference_text: Option<String>,
}

impl ReferenceEntry {
    /// Unspecified scope means every gender, ages 0 to 120 years.
    fn into_request(self, parameter_id: Uuid) -> BioReferenceRequest {
        BioReferenceRequest {
            parameter_id,
            gender: self.gender.unwrap_or(ReferenceGender::All),
            age_type: self.age_type.unwrap_or(AgeUnit::Year),
            min_age: self.min_age.unwrap_or(0.0),
            max_age: self.max_age.unwrap_or(120.0),
            lower_value: self.lower_value,
            upper_value: self.upper_value,
            reference_text: self.reference_text,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ServiceEntry {
    pub name: NonEmptyText,
    pub code: NonEmptyText,
    pub category: ServiceCategory,
    pub applicability: Applicability,
    pub price: f64,
    pub is_active: Option<bool>,
    pub test: Option<TestEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TestEntry {
    /// Defaults to the service name.
    pub name: Option<NonEmptyText>,
    pub sample_type: SampleType,
    pub method: Option<String>,
    /// Parameter names in report order.
    #[serde(default)]
    pub parameters: Vec<String>,
}

impl CatalogFile {
    /// Parse catalogue YAML, reporting the path of the first mismatching field.
    ///
    /// # Errors
    ///
    /// Returns `HisError::CatalogParse` with the failing path (e.g. `services[2].category`).
    pub fn from_yaml(yaml_text: &str) -> HisResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
        serde_path_to_error::deserialize::<_, CatalogFile>(deserializer).map_err(|err| {
            let path = err.path().to_string();
            let source = err.into_inner();
            let path = if path.is_empty() || path == "." {
                "<root>".to_owned()
            } else {
                path
            };
            HisError::CatalogParse(format!("schema mismatch at {path}: {source}"))
        })
    }

    /// # Errors
    ///
    /// Returns `HisError::CatalogRead` if the file cannot be read, otherwise as
    /// [`CatalogFile::from_yaml`].
    pub fn from_path(path: &Path) -> HisResult<Self> {
        let text = std::fs::read_to_string(path).map_err(HisError::CatalogRead)?;
        Self::from_yaml(&text)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub services_created: usize,
    pub services_skipped: usize,
    pub parameters_created: usize,
    pub parameters_reused: usize,
    pub references_created: usize,
    pub tests_created: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Age;
    use crate::services::testing::{harness, patient_request, text};
    use crate::vocab::Gender;

    const CATALOGUE: &str = r#"
parameters:
  - name: Haemoglobin
    unit: g/dL
    resultType: numeric
    references:
      - { gender: Male, minAge: 18, maxAge: 120, lowerValue: 13, upperValue: 17 }
      - { gender: Female, minAge: 18, maxAge: 120, lowerValue: 12, upperValue: 15.5 }
      - { ageType: Month, minAge: 0, maxAge: 12, lowerValue: 10, upperValue: 14 }
  - name: Platelet Count
    unit: lakh/uL
    resultType: numeric
services:
  - name: Complete Blood Count
    code: cbc
    category: Laboratory
    applicability: Both
    price: 350
    test:
      sampleType: Blood
      parameters: [haemoglobin, Platelet Count]
  - name: Consultation
    code: CONS
    category: Consultation
    applicability: OPD
    price: 500
"#;

    #[tokio::test]
    async fn test_import_then_reimport_skips_existing() {
        let h = harness();
        let catalog = &h.services.catalog;
        let file = CatalogFile::from_yaml(CATALOGUE).expect("catalogue should parse");
        let summary = catalog.import(file.clone()).await.expect("import should succeed");
        assert_eq!(
            summary,
            ImportSummary {
                services_created: 2,
                services_skipped: 0,
                parameters_created: 2,
                parameters_reused: 0,
                references_created: 3,
                tests_created: 1,
            }
        );

        let again = catalog.import(file).await.expect("reimport should succeed");
        assert_eq!((again.services_skipped, again.parameters_reused), (2, 2));
        assert_eq!(again.references_created, 0);

        let tests = catalog
            .list_lab_tests(None, &PageRequest::default())
            .await
            .expect("list should succeed");
        assert_eq!(tests.total, 1);
        let names: Vec<_> = tests.items[0].parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Haemoglobin", "Platelet Count"]);
    }

    #[tokio::test]
    async fn test_import_unknown_parameter_writes_nothing() {
        let h = harness();
        let yaml = r#"
services:
  - { name: Lipid Profile, code: LIPID, category: Laboratory, applicability: Both, price: 600,
      test: { sampleType: Serum, parameters: [Cholesterol] } }
"#;
        let file = CatalogFile::from_yaml(yaml).expect("catalogue should parse");
        let err = h.services.catalog.import(file).await.expect_err("unknown parameter");
        assert_eq!(err.to_string(), "service LIPID: unknown parameter 'Cholesterol'");
        let count = h.ctx.collection::<Service>().count(&Filter::All).await.expect("count");
        assert_eq!(count, 0);
    }

    #[test]
    fn test_parse_error_reports_path() {
        let yaml = "services:\n  - { name: X, code: X, category: Bakery, applicability: OPD, price: 1 }\n";
        let err = CatalogFile::from_yaml(yaml).expect_err("bad category should fail");
        let message = err.to_string();
        assert!(message.contains("services[0].category"), "{message}");
    }

    #[tokio::test]
    async fn test_applicable_references_use_patient_age_and_gender() {
        let h = harness();
        let catalog = &h.services.catalog;
        catalog
            .import(CatalogFile::from_yaml(CATALOGUE).expect("parse"))
            .await
            .expect("import should succeed");
        let parameter = catalog
            .list_parameters(Some("haemo"), &PageRequest::default())
            .await
            .expect("list should succeed")
            .items
            .remove(0);

        let adult = h.patient().await;
        let refs = catalog
            .applicable_references(parameter.id, adult.id)
            .await
            .expect("lookup should succeed");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].gender, ReferenceGender::Female);

        let mut req = patient_request("Baby Rao");
        req.gender = Gender::Male;
        req.age = Age::new(1, 0, 0);
        let infant = h.services.patients.create(req).await.expect("create should succeed");
        let refs = catalog
            .applicable_references(parameter.id, infant.id)
            .await
            .expect("lookup should succeed");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].age_type, AgeUnit::Month);
    }

    #[tokio::test]
    async fn test_lab_test_only_for_lab_services() {
        let h = harness();
        let consult = h
            .service("CONS", ServiceCategory::Consultation, Applicability::Opd, 500.0)
            .await;
        let err = h
            .services
            .catalog
            .create_lab_test(LabTestRequest {
                service_id: consult.id,
                name: text("Consult"),
                sample_type: SampleType::NotApplicable,
                method: None,
                parameter_ids: vec![],
            })
            .await
            .expect_err("consultation cannot carry a test");
        assert!(matches!(err, HisError::Precondition(_)));
    }

    #[tokio::test]
    async fn test_dropdown_by_applicability() {
        let h = harness();
        h.service("CONS", ServiceCategory::Consultation, Applicability::Opd, 500.0).await;
        h.service("ROOM", ServiceCategory::RoomCharge, Applicability::Ipd, 1500.0).await;
        h.service("CBC", ServiceCategory::Laboratory, Applicability::Both, 350.0).await;

        let opd = h
            .services
            .catalog
            .service_dropdown(Some(Applicability::Opd), None)
            .await
            .expect("dropdown should succeed");
        assert_eq!(opd.len(), 2);
        assert!(opd.iter().all(|o| !o.label.contains("ROOM")));
    }
}
