//! Front-desk counters.

use super::ServiceContext;
use crate::models::{round2, Bed, Ipd, LabOrderTest, OpdBilling, Patient, Visit};
use crate::store::{Filter, Query};
use crate::vocab::{BedStatus, LabStatus, PatientStatus, VisitStatus};
use crate::HisResult;
use serde::Serialize;

/// "Today" is the current calendar day in hospital local time.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub patients_today: u64,
    pub visits_today: u64,
    /// Visits still pending, on any day.
    pub open_visits: u64,
    pub occupied_beds: u64,
    pub available_beds: u64,
    pub admitted_patients: u64,
    pub pending_lab_tests: u64,
    /// Sum of amounts paid on OPD bills raised today.
    pub opd_revenue_today: f64,
}

#[derive(Clone)]
pub struct DashboardService {
    ctx: ServiceContext,
}

impl DashboardService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn stats(&self) -> HisResult<DashboardStats> {
        let today = self.ctx.today();
        let created_today = self.ctx.date_range("createdAt", Some(today), Some(today));
        let beds = self.ctx.collection::<Bed>();

        let bills_today = self
            .ctx
            .collection::<OpdBilling>()
            .find(&Query::new(created_today.clone()))
            .await?;

        Ok(DashboardStats {
            patients_today: self.ctx.collection::<Patient>().count(&created_today).await?,
            visits_today: self
                .ctx
                .collection::<Visit>()
                .count(&self.ctx.date_range("visitDate", Some(today), Some(today)))
                .await?,
            open_visits: self
                .ctx
                .collection::<Visit>()
                .count(&Filter::eq("status", VisitStatus::Pending.as_str()))
                .await?,
            occupied_beds: beds
                .count(&Filter::eq("status", BedStatus::Occupied.as_str()))
                .await?,
            available_beds: beds
                .count(&Filter::eq("status", BedStatus::Available.as_str()))
                .await?,
            admitted_patients: self
                .ctx
                .collection::<Ipd>()
                .count(&Filter::eq("patientStatus", PatientStatus::Admitted.as_str()))
                .await?,
            pending_lab_tests: self
                .ctx
                .collection::<LabOrderTest>()
                .count(&Filter::eq("status", LabStatus::Pending.as_str()))
                .await?,
            opd_revenue_today: round2(bills_today.iter().map(|b| b.totals.paid_amount).sum()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BillLineRequest, OpdBillingRequest, VisitRequest};
    use crate::services::testing::harness;
    use crate::vocab::{Applicability, PaymentMode, ServiceCategory};
    use chrono::Duration;

    #[tokio::test]
    async fn test_stats_count_today_in_local_time() {
        let h = harness();
        let patient = h.patient().await;
        let doctor = h.doctor("dr.rao@example.org", "MCI-1001").await;
        h.bed("B-1", 1000.0).await;
        h.bed("B-2", 1000.0).await;
        let cbc = h.service("CBC", ServiceCategory::Laboratory, Applicability::Both, 350.0).await;

        h.services
            .visits
            .create(VisitRequest {
                patient_id: patient.id,
                doctor_id: doctor.id,
                visit_date: None,
                status: None,
                complaint: None,
                notes: None,
            })
            .await
            .expect("visit should succeed");
        h.services
            .opd
            .create(OpdBillingRequest {
                patient_id: patient.id,
                visit_id: None,
                doctor_id: None,
                services: vec![BillLineRequest {
                    service_id: cbc.id,
                    quantity: 1,
                    price: None,
                }],
                discount: None,
                paid_amount: Some(200.0),
                payment_mode: PaymentMode::Cash,
            })
            .await
            .expect("bill should succeed");

        let stats = h.services.dashboard.stats().await.expect("stats should succeed");
        assert_eq!(stats.patients_today, 1);
        assert_eq!(stats.visits_today, 1);
        assert_eq!(stats.open_visits, 1);
        assert_eq!(stats.available_beds, 2);
        assert_eq!(stats.occupied_beds, 0);
        assert_eq!(stats.pending_lab_tests, 1);
        assert_eq!(stats.opd_revenue_today, 200.0);

        // 10:00 IST plus 14h is 00:00 IST the next day.
        h.clock.advance(Duration::hours(14));
        let stats = h.services.dashboard.stats().await.expect("stats should succeed");
        assert_eq!(stats.patients_today, 0);
        assert_eq!(stats.open_visits, 1);
        assert_eq!(stats.opd_revenue_today, 0.0);
    }
}
