//! Inpatient admissions: bed occupancy, transfers, running bill and discharge.

use super::lab::{stage_order, stage_order_removal, OrderSource};
use super::opd::{price_lines, Desk};
use super::{id_value, ServiceContext};
use crate::models::{
    clean, Bed, BillLine, Doctor, DoctorSummary, Ipd, IpdAdmitRequest, IpdFilter, IpdUpdateRequest,
    IpdView, Patient, PatientSummary, Totals, Ward,
};
use crate::pagination::{paginate, PageRequest, Paginated};
use crate::pdf::documents::{bill_layout, BillDocument};
use crate::pdf::render;
use crate::store::{Filter, Sort, UnitOfWork};
use crate::time::Timestamp;
use crate::validation::Validate;
use crate::vocab::{BedStatus, BillingKind, PatientStatus, ServiceCategory};
use crate::{HisError, HisResult};
use his_ids::CodeKind;
use uuid::Uuid;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Whole days charged for a stay, rounding any part day up.
fn days_between(from: Timestamp, to: Timestamp) -> u32 {
    let millis = (to.as_datetime() - from.as_datetime()).num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    u32::try_from((millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY).unwrap_or(u32::MAX)
}

/// Room charge line for `days` on `bed`; `None` for a zero-day stay.
fn bed_charge(bed: &Bed, days: u32) -> Option<BillLine> {
    (days > 0).then(|| BillLine {
        service_id: None,
        name: format!("Bed {} charges", bed.bed_number),
        category: ServiceCategory::RoomCharge,
        quantity: days,
        price: bed.charge_per_day,
        amount: crate::models::round2(bed.charge_per_day * f64::from(days)),
    })
}

fn occupy(bed: &mut Bed, patient_id: Uuid, now: Timestamp) {
    bed.status = BedStatus::Occupied;
    bed.patient_id = Some(patient_id);
    bed.updated_at = now;
}

fn release(bed: &mut Bed, now: Timestamp) {
    bed.status = BedStatus::Available;
    bed.patient_id = None;
    bed.updated_at = now;
}

#[derive(Clone)]
pub struct IpdService {
    ctx: ServiceContext,
}

impl IpdService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    async fn available_bed(&self, id: Uuid) -> HisResult<Bed> {
        let bed: Bed = self.ctx.require(id, "Bed").await?;
        if bed.status != BedStatus::Available {
            return Err(HisError::precondition(format!(
                "Bed {} is {}",
                bed.bed_number, bed.status
            )));
        }
        Ok(bed)
    }

    /// Admit a patient onto an available bed.
    ///
    /// # Errors
    ///
    /// Returns `HisError::Precondition` if the bed is not available or the patient already
    /// has an open admission.
    pub async fn admit(&self, req: IpdAdmitRequest) -> HisResult<IpdView> {
        req.validate()?;
        self.ctx.require::<Patient>(req.patient_id, "Patient").await?;
        self.ctx.require::<Doctor>(req.doctor_id, "Doctor").await?;
        let mut bed = self.available_bed(req.bed_id).await?;
        let already_admitted = self
            .ctx
            .collection::<Ipd>()
            .exists(Filter::all_of(vec![
                Filter::eq("patientId", id_value(req.patient_id)),
                Filter::eq("patientStatus", PatientStatus::Admitted.as_str()),
            ]))
            .await?;
        if already_admitted {
            return Err(HisError::precondition("Patient is already admitted"));
        }

        let lines = price_lines(&self.ctx, &req.services, Desk::Ipd).await?;
        let totals = Totals::with_advance(
            &lines,
            req.discount.unwrap_or(0.0),
            req.paid_amount.unwrap_or(0.0),
        )?;
        let number = self.ctx.codes().timestamped(CodeKind::Ipd)?;
        let now = self.ctx.now();
        let admitted_at = req.admission_date.unwrap_or(now);
        let mut ipd = Ipd {
            id: Uuid::new_v4(),
            ipd_number: number.to_string(),
            patient_id: req.patient_id,
            doctor_id: req.doctor_id,
            bed_id: bed.id,
            bed_assigned_at: admitted_at,
            admission_date: admitted_at,
            discharge_date: None,
            patient_status: PatientStatus::Admitted,
            services: lines,
            totals,
            payment_mode: req.payment_mode,
            diagnosis: clean(req.diagnosis),
            notes: clean(req.notes),
            lab_order_id: None,
            created_at: now,
            updated_at: now,
        };

        let mut unit = UnitOfWork::new();
        ipd.lab_order_id = stage_order(&self.ctx, &mut unit, self.order_source(&ipd), &ipd.services).await?;
        occupy(&mut bed, ipd.patient_id, now);
        unit.insert(&ipd)?.replace(&bed)?;
        self.ctx.commit(unit).await?;

        tracing::info!(ipd_number = %ipd.ipd_number, bed = %bed.bed_number, "patient admitted");
        Ok(self.populate(vec![ipd]).await?.remove(0))
    }

    fn order_source(&self, ipd: &Ipd) -> OrderSource {
        OrderSource {
            patient_id: ipd.patient_id,
            billing_id: ipd.id,
            billing_kind: BillingKind::Ipd,
            doctor_id: Some(ipd.doctor_id),
            existing_order: ipd.lab_order_id,
        }
    }

    async fn populate(&self, admissions: Vec<Ipd>) -> HisResult<Vec<IpdView>> {
        let patients = self
            .ctx
            .collection::<Patient>()
            .get_many(admissions.iter().map(|i| i.patient_id))
            .await?;
        let doctors = self
            .ctx
            .collection::<Doctor>()
            .get_many(admissions.iter().map(|i| i.doctor_id))
            .await?;
        let beds = self
            .ctx
            .collection::<Bed>()
            .get_many(admissions.iter().map(|i| i.bed_id))
            .await?;
        let wards = self
            .ctx
            .collection::<Ward>()
            .get_many(beds.values().map(|b| b.ward_id))
            .await?;
        Ok(admissions
            .into_iter()
            .map(|ipd| {
                let bed = beds.get(&ipd.bed_id);
                IpdView {
                    patient: patients.get(&ipd.patient_id).map(PatientSummary::from),
                    doctor: doctors.get(&ipd.doctor_id).map(DoctorSummary::from),
                    bed_number: bed.map(|b| b.bed_number.to_string()),
                    ward_name: bed
                        .and_then(|b| wards.get(&b.ward_id))
                        .map(|w| w.name.to_string()),
                    ipd,
                }
            })
            .collect())
    }

    pub async fn get(&self, id: Uuid) -> HisResult<IpdView> {
        let ipd: Ipd = self.ctx.require(id, "IPD record").await?;
        Ok(self.populate(vec![ipd]).await?.remove(0))
    }

    pub async fn list(&self, filter: &IpdFilter, page: &PageRequest) -> HisResult<Paginated<IpdView>> {
        let predicate = Filter::all_of(vec![
            filter
                .patient_id
                .map_or(Filter::All, |id| Filter::eq("patientId", id_value(id))),
            filter
                .patient_status
                .map_or(Filter::All, |s| Filter::eq("patientStatus", s.as_str())),
        ]);
        let page = paginate(
            &self.ctx.collection::<Ipd>(),
            predicate,
            Sort::desc("admissionDate"),
            page,
        )
        .await?;
        let items = self.populate(page.items.clone()).await?;
        Ok(page.with_items(items))
    }

    /// Apply a partial update: doctor change, bed transfer, extra services, payment, and
    /// discharge, in that order, as one unit.
    ///
    /// A transfer charges the old bed for the days used so far. Discharge charges the
    /// current bed for at least one day and frees it.
    pub async fn update(&self, id: Uuid, req: IpdUpdateRequest) -> HisResult<IpdView> {
        req.validate()?;
        let mut ipd: Ipd = self.ctx.require(id, "IPD record").await?;
        let discharging = req.patient_status == Some(PatientStatus::Discharged);
        let changes_stay =
            req.bed_id.is_some() || !req.add_services.is_empty() || req.patient_status.is_some();
        if !ipd.is_admitted() && changes_stay {
            return Err(HisError::precondition("Patient has already been discharged"));
        }

        let now = self.ctx.now();
        let mut unit = UnitOfWork::new();

        if let Some(doctor_id) = req.doctor_id {
            self.ctx.require::<Doctor>(doctor_id, "Doctor").await?;
            ipd.doctor_id = doctor_id;
        }

        if let Some(bed_id) = req.bed_id.filter(|b| *b != ipd.bed_id) {
            let mut next = self.available_bed(bed_id).await?;
            let mut current: Bed = self.ctx.require(ipd.bed_id, "Bed").await?;
            ipd.services
                .extend(bed_charge(&current, days_between(ipd.bed_assigned_at, now)));
            release(&mut current, now);
            occupy(&mut next, ipd.patient_id, now);
            unit.replace(&current)?.replace(&next)?;
            tracing::info!(
                ipd_number = %ipd.ipd_number,
                from = %current.bed_number,
                to = %next.bed_number,
                "patient transferred"
            );
            ipd.bed_id = next.id;
            ipd.bed_assigned_at = now;
        }

        if !req.add_services.is_empty() {
            let added = price_lines(&self.ctx, &req.add_services, Desk::Ipd).await?;
            ipd.lab_order_id = stage_order(&self.ctx, &mut unit, self.order_source(&ipd), &added).await?;
            ipd.services.extend(added);
        }

        if discharging {
            let discharged_at = req.discharge_date.unwrap_or(now);
            if discharged_at < ipd.admission_date || discharged_at < ipd.bed_assigned_at {
                return Err(HisError::validation(
                    "dischargeDate cannot be before the admission or the last bed transfer",
                ));
            }
            let mut bed: Bed = self.ctx.require(ipd.bed_id, "Bed").await?;
            let days = days_between(ipd.bed_assigned_at, discharged_at).max(1);
            ipd.services.extend(bed_charge(&bed, days));
            release(&mut bed, now);
            unit.replace(&bed)?;
            ipd.patient_status = PatientStatus::Discharged;
            ipd.discharge_date = Some(discharged_at);
        }

        ipd.totals = Totals::with_advance(
            &ipd.services,
            req.discount.unwrap_or(ipd.totals.discount),
            req.paid_amount.unwrap_or(ipd.totals.paid_amount),
        )?;
        if let Some(mode) = req.payment_mode {
            ipd.payment_mode = Some(mode);
        }
        if let Some(diagnosis) = clean(req.diagnosis) {
            ipd.diagnosis = Some(diagnosis);
        }
        if let Some(notes) = clean(req.notes) {
            ipd.notes = Some(notes);
        }
        ipd.updated_at = now;
        unit.replace(&ipd)?;
        self.ctx.commit(unit).await?;

        if discharging {
            tracing::info!(ipd_number = %ipd.ipd_number, net_amount = ipd.totals.net_amount, "patient discharged");
        }
        Ok(self.populate(vec![ipd]).await?.remove(0))
    }

    /// Delete an admission, freeing its bed if the patient is still admitted.
    pub async fn delete(&self, id: Uuid) -> HisResult<()> {
        let ipd: Ipd = self.ctx.require(id, "IPD record").await?;
        let mut unit = UnitOfWork::new();
        if let Some(order_id) = ipd.lab_order_id {
            stage_order_removal(&self.ctx, &mut unit, order_id).await?;
        }
        if ipd.is_admitted() {
            if let Some(mut bed) = self.ctx.collection::<Bed>().get(ipd.bed_id).await? {
                release(&mut bed, self.ctx.now());
                unit.replace(&bed)?;
            }
        }
        unit.delete::<Ipd>(ipd.id);
        self.ctx.commit(unit).await?;
        tracing::info!(ipd_number = %ipd.ipd_number, "ipd record deleted");
        Ok(())
    }

    pub async fn bill_pdf(&self, id: Uuid) -> HisResult<(String, Vec<u8>)> {
        let view = self.get(id).await?;
        let letterhead = self.ctx.letterhead();
        let mut details = vec![("Admitted", letterhead.date(view.ipd.admission_date))];
        if let Some(discharged) = view.ipd.discharge_date {
            details.push(("Discharged", letterhead.date(discharged)));
        }
        if let (Some(ward), Some(bed)) = (&view.ward_name, &view.bed_number) {
            details.push(("Bed", format!("{ward} / {bed}")));
        }
        let layout = bill_layout(
            &letterhead,
            &BillDocument {
                title: "IPD Bill",
                number: &view.ipd.ipd_number,
                date: view.ipd.updated_at,
                patient: view.patient.as_ref(),
                doctor: view.doctor.as_ref(),
                details,
                lines: &view.ipd.services,
                totals: &view.ipd.totals,
                payment_mode: view.ipd.payment_mode,
            },
        );
        Ok((view.ipd.ipd_number.clone(), render(&layout)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BedRequest, BillLineRequest, LabOrder};
    use crate::services::testing::{harness, Harness};
    use crate::vocab::{Applicability, PaymentMode};
    use chrono::Duration;

    async fn admit(h: &Harness, bed: &Bed) -> IpdView {
        let patient = h.patient().await;
        let doctor = h.doctor("dr.rao@example.org", "MCI-1001").await;
        h.services
            .ipd
            .admit(IpdAdmitRequest {
                patient_id: patient.id,
                doctor_id: doctor.id,
                bed_id: bed.id,
                admission_date: None,
                services: vec![],
                discount: None,
                paid_amount: Some(1000.0),
                payment_mode: Some(PaymentMode::Cash),
                diagnosis: Some("Dengue".into()),
                notes: None,
            })
            .await
            .expect("admit should succeed")
    }

    #[test]
    fn test_days_between_rounds_up() {
        let start = Timestamp::parse("2026-10-16T04:30:00Z").expect("ts");
        let plus = |hours| Timestamp::new(start.as_datetime() + Duration::hours(hours));
        assert_eq!(days_between(start, start), 0);
        assert_eq!(days_between(start, plus(1)), 1);
        assert_eq!(days_between(start, plus(24)), 1);
        assert_eq!(days_between(start, plus(25)), 2);
        assert_eq!(days_between(plus(5), start), 0);
    }

    #[tokio::test]
    async fn test_admit_occupies_bed() {
        let h = harness();
        let bed = h.bed("B-1", 1500.0).await;
        let view = admit(&h, &bed).await;
        assert!(view.ipd.ipd_number.starts_with("IPD-"));
        assert_eq!(view.bed_number.as_deref(), Some("B-1"));
        assert_eq!(view.ward_name.as_deref(), Some("Ward B-1"));

        let bed = h.services.facilities.get_bed(bed.id).await.expect("bed");
        assert_eq!(bed.bed.status, BedStatus::Occupied);
        assert_eq!(bed.bed.patient_id, Some(view.ipd.patient_id));
    }

    #[tokio::test]
    async fn test_admit_to_unavailable_bed_is_rejected() {
        let h = harness();
        let bed = h.bed("B-1", 1500.0).await;
        admit(&h, &bed).await;

        let other = h.patient().await;
        let doctor = h.doctor("dr.sen@example.org", "MCI-1002").await;
        let err = h
            .services
            .ipd
            .admit(IpdAdmitRequest {
                patient_id: other.id,
                doctor_id: doctor.id,
                bed_id: bed.id,
                admission_date: None,
                services: vec![],
                discount: None,
                paid_amount: None,
                payment_mode: None,
                diagnosis: None,
                notes: None,
            })
            .await
            .expect_err("occupied bed");
        assert_eq!(err.to_string(), "Bed B-1 is occupied");

        let maintenance = h.bed("B-2", 1500.0).await;
        h.services
            .facilities
            .update_bed(
                maintenance.id,
                BedRequest {
                    bed_number: maintenance.bed_number.clone(),
                    ward_id: maintenance.ward_id,
                    charge_per_day: 1500.0,
                    status: Some(BedStatus::Maintenance),
                },
            )
            .await
            .expect("update should succeed");
        let err = h
            .services
            .ipd
            .admit(IpdAdmitRequest {
                patient_id: other.id,
                doctor_id: doctor.id,
                bed_id: maintenance.id,
                admission_date: None,
                services: vec![],
                discount: None,
                paid_amount: None,
                payment_mode: None,
                diagnosis: None,
                notes: None,
            })
            .await
            .expect_err("bed under maintenance");
        assert!(matches!(err, HisError::Precondition(_)));
    }

    #[tokio::test]
    async fn test_transfer_and_discharge_charge_beds() {
        let h = harness();
        let first = h.bed("B-1", 1000.0).await;
        let second = h.bed("B-2", 2000.0).await;
        let view = admit(&h, &first).await;

        h.clock.advance(Duration::hours(30));
        let moved = h
            .services
            .ipd
            .update(
                view.ipd.id,
                IpdUpdateRequest {
                    bed_id: Some(second.id),
                    ..Default::default()
                },
            )
            .await
            .expect("transfer should succeed");
        assert_eq!(moved.ipd.bed_id, second.id);
        assert_eq!(moved.ipd.services.len(), 1);
        assert_eq!(moved.ipd.services[0].quantity, 2);
        assert_eq!(moved.ipd.services[0].amount, 2000.0);
        let old = h.services.facilities.get_bed(first.id).await.expect("bed");
        assert_eq!(old.bed.status, BedStatus::Available);

        h.clock.advance(Duration::hours(2));
        let discharged = h
            .services
            .ipd
            .update(
                view.ipd.id,
                IpdUpdateRequest {
                    patient_status: Some(PatientStatus::Discharged),
                    ..Default::default()
                },
            )
            .await
            .expect("discharge should succeed");
        assert_eq!(discharged.ipd.patient_status, PatientStatus::Discharged);
        assert_eq!(discharged.ipd.services.len(), 2);
        assert_eq!(discharged.ipd.services[1].quantity, 1);
        assert_eq!(discharged.ipd.totals.total_amount, 4000.0);
        assert_eq!(discharged.ipd.totals.paid_amount, 1000.0);
        assert_eq!(discharged.ipd.totals.due_amount, 3000.0);

        let freed = h.services.facilities.get_bed(second.id).await.expect("bed");
        assert_eq!(freed.bed.status, BedStatus::Available);
        let json = serde_json::to_value(&freed.bed).expect("serialise should succeed");
        assert!(json["patientId"].is_null());

        let err = h
            .services
            .ipd
            .update(
                view.ipd.id,
                IpdUpdateRequest {
                    bed_id: Some(first.id),
                    ..Default::default()
                },
            )
            .await
            .expect_err("discharged admission");
        assert!(matches!(err, HisError::Precondition(_)));
    }

    #[tokio::test]
    async fn test_discharge_before_admission_is_rejected() {
        let h = harness();
        let bed = h.bed("B-1", 1000.0).await;
        let view = admit(&h, &bed).await;
        let before = Timestamp::new(view.ipd.admission_date.as_datetime() - Duration::hours(1));

        let err = h
            .services
            .ipd
            .update(
                view.ipd.id,
                IpdUpdateRequest {
                    patient_status: Some(PatientStatus::Discharged),
                    discharge_date: Some(before),
                    ..Default::default()
                },
            )
            .await
            .expect_err("discharge before admission");
        assert!(matches!(err, HisError::Validation(_)));

        let err = h
            .services
            .ipd
            .update(
                view.ipd.id,
                IpdUpdateRequest {
                    discharge_date: Some(h.ctx.now()),
                    ..Default::default()
                },
            )
            .await
            .expect_err("discharge date without status");
        assert!(matches!(err, HisError::Validation(_)));

        let still = h.services.ipd.get(view.ipd.id).await.expect("get should succeed");
        assert_eq!(still.ipd.patient_status, PatientStatus::Admitted);
        assert_eq!(still.ipd.discharge_date, None);
        let occupied = h.services.facilities.get_bed(bed.id).await.expect("bed");
        assert_eq!(occupied.bed.status, BedStatus::Occupied);
    }

    #[tokio::test]
    async fn test_discharge_before_last_transfer_is_rejected() {
        let h = harness();
        let first = h.bed("B-1", 1000.0).await;
        let second = h.bed("B-2", 2000.0).await;
        let view = admit(&h, &first).await;

        h.clock.advance(Duration::hours(30));
        let moved = h
            .services
            .ipd
            .update(
                view.ipd.id,
                IpdUpdateRequest {
                    bed_id: Some(second.id),
                    ..Default::default()
                },
            )
            .await
            .expect("transfer should succeed");

        let between = Timestamp::new(moved.ipd.bed_assigned_at.as_datetime() - Duration::hours(2));
        let err = h
            .services
            .ipd
            .update(
                view.ipd.id,
                IpdUpdateRequest {
                    patient_status: Some(PatientStatus::Discharged),
                    discharge_date: Some(between),
                    ..Default::default()
                },
            )
            .await
            .expect_err("discharge before transfer");
        assert!(matches!(err, HisError::Validation(_)));
    }

    #[tokio::test]
    async fn test_added_lab_services_share_one_order() {
        let h = harness();
        let bed = h.bed("B-1", 1000.0).await;
        let view = admit(&h, &bed).await;
        let cbc = h.service("CBC", ServiceCategory::Laboratory, Applicability::Both, 350.0).await;
        let usg = h.service("USG", ServiceCategory::Radiology, Applicability::Ipd, 900.0).await;

        let add = |service_id| IpdUpdateRequest {
            add_services: vec![BillLineRequest {
                service_id,
                quantity: 1,
                price: None,
            }],
            ..Default::default()
        };
        let first = h.services.ipd.update(view.ipd.id, add(cbc.id)).await.expect("add");
        let second = h.services.ipd.update(view.ipd.id, add(usg.id)).await.expect("add");
        assert_eq!(first.ipd.lab_order_id, second.ipd.lab_order_id);

        let order = h
            .services
            .lab
            .get_order(second.ipd.lab_order_id.expect("order"))
            .await
            .expect("order");
        assert_eq!(order.tests.len(), 2);
        assert_eq!(order.order.billing_kind, BillingKind::Ipd);
        assert_eq!(
            h.ctx.collection::<LabOrder>().count(&Filter::All).await.expect("count"),
            1
        );
    }

    #[tokio::test]
    async fn test_delete_frees_bed() {
        let h = harness();
        let bed = h.bed("B-1", 1000.0).await;
        let view = admit(&h, &bed).await;
        h.services.ipd.delete(view.ipd.id).await.expect("delete should succeed");
        let bed = h.services.facilities.get_bed(bed.id).await.expect("bed");
        assert_eq!(bed.bed.status, BedStatus::Available);
    }
}
