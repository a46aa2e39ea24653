//! Persisted records and the request bodies that create or change them.
//!
//! Every record carries a UUID `id` plus `createdAt`/`updatedAt`, and serialises as camelCase
//! JSON. The same JSON is what the store keeps, so field names here are also the field names
//! used in [`Filter`](crate::store::Filter) paths and unique keys.

mod appointment;
mod billing;
mod catalog;
mod clinical;
mod doctor;
mod facility;
mod lab;
mod patient;
mod user;
mod visit;

pub use appointment::*;
pub use billing::*;
pub use catalog::*;
pub use clinical::*;
pub use doctor::*;
pub use facility::*;
pub use lab::*;
pub use patient::*;
pub use user::*;
pub use visit::*;

use crate::store::CollectionSpec;

macro_rules! document {
    ($ty:ident, $collection:literal, [$($key:expr),*]) => {
        impl crate::store::Document for $ty {
            const COLLECTION: &'static str = $collection;
            const UNIQUE: &'static [&'static [&'static str]] = &[$($key),*];

            fn id(&self) -> uuid::Uuid {
                self.id
            }
        }
    };
}

document!(User, "users", [&["email"]]);
document!(Patient, "patients", [&["uhid"]]);
document!(Doctor, "doctors", [&["licenseNumber"], &["email"], &["userId"]]);
document!(Visit, "visits", [&["code"]]);
document!(Appointment, "appointments", [&["appointmentNumber"]]);
document!(Floor, "floors", [&["number"]]);
document!(Ward, "wards", [&["floorId", "name"]]);
document!(Bed, "beds", [&["wardId", "bedNumber"]]);
document!(Service, "services", [&["code"]]);
document!(LabTest, "lab_tests", [&["serviceId"]]);
document!(LabParameter, "lab_parameters", []);
document!(BioReference, "bio_references", []);
document!(OpdBilling, "opd_billings", [&["billNumber"]]);
document!(Ipd, "ipds", [&["ipdNumber"]]);
document!(LabOrder, "lab_orders", [&["accessionNumber"]]);
document!(LabOrderTest, "lab_order_tests", []);
document!(LabResult, "lab_results", [&["labOrderTestId", "parameterId"]]);
document!(RadiologyTemplate, "radiology_templates", [&["name"]]);
document!(RadiologyReport, "radiology_reports", [&["labOrderTestId"]]);
document!(Prescription, "prescriptions", [&["visitId"]]);
document!(Examination, "examinations", [&["visitId"]]);

/// Every collection the system uses, for [`Store::migrate`](crate::store::Store::migrate).
pub fn collections() -> Vec<CollectionSpec> {
    vec![
        CollectionSpec::of::<User>(),
        CollectionSpec::of::<Patient>(),
        CollectionSpec::of::<Doctor>(),
        CollectionSpec::of::<Visit>(),
        CollectionSpec::of::<Appointment>(),
        CollectionSpec::of::<Floor>(),
        CollectionSpec::of::<Ward>(),
        CollectionSpec::of::<Bed>(),
        CollectionSpec::of::<Service>(),
        CollectionSpec::of::<LabTest>(),
        CollectionSpec::of::<LabParameter>(),
        CollectionSpec::of::<BioReference>(),
        CollectionSpec::of::<OpdBilling>(),
        CollectionSpec::of::<Ipd>(),
        CollectionSpec::of::<LabOrder>(),
        CollectionSpec::of::<LabOrderTest>(),
        CollectionSpec::of::<LabResult>(),
        CollectionSpec::of::<RadiologyTemplate>(),
        CollectionSpec::of::<RadiologyReport>(),
        CollectionSpec::of::<Prescription>(),
        CollectionSpec::of::<Examination>(),
    ]
}

/// Trims optional free text, turning blank strings into `None`.
pub(crate) fn clean(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_owned()).filter(|t| !t.is_empty())
}

/// Rounds a money amount to paise.
pub(crate) fn round2(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_collection_names_are_unique() {
        let specs = collections();
        let names: HashSet<_> = specs.iter().map(|s| s.name).collect();
        assert_eq!(names.len(), specs.len());
    }

    #[test]
    fn test_clean_drops_blank_text() {
        assert_eq!(clean(Some("  ".into())), None);
        assert_eq!(clean(Some(" fever ".into())), Some("fever".into()));
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(10.005_1), 10.01);
        assert_eq!(round2(99.994), 99.99);
    }
}
