//! Static vocabularies shared by validation, persistence and dropdowns.
//!
//! Every enum here serialises to a fixed wire string, exposes an `ALL` slice for pickers, and
//! parses case-insensitively from either the wire string or the label.

use api_shared::DropdownOption;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Returned when text does not name any variant of a vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {vocabulary} '{value}'")]
pub struct UnknownVariant {
    pub vocabulary: &'static str,
    pub value: String,
}

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident ($display:literal) {
            $($variant:ident => $wire:literal, $label:literal;)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            /// All variants as `{value, label}` picker entries.
            pub fn options() -> Vec<DropdownOption> {
                Self::ALL
                    .iter()
                    .map(|v| DropdownOption::new(v.as_str(), v.label()))
                    .collect()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s) || v.label().eq_ignore_ascii_case(s))
                    .ok_or_else(|| UnknownVariant {
                        vocabulary: $display,
                        value: s.to_owned(),
                    })
            }
        }
    };
}

vocabulary! {
    Title ("title") {
        Mr => "Mr", "Mr.";
        Mrs => "Mrs", "Mrs.";
        Ms => "Ms", "Ms.";
        Miss => "Miss", "Miss";
        Master => "Master", "Master";
        Baby => "Baby", "Baby";
        Dr => "Dr", "Dr.";
    }
}

vocabulary! {
    Gender ("gender") {
        Male => "Male", "Male";
        Female => "Female", "Female";
        Other => "Other", "Other";
    }
}

vocabulary! {
    /// How the relative named on the registration relates to the patient.
    RelationType ("relation type") {
        SonOf => "S/O", "Son of";
        DaughterOf => "D/O", "Daughter of";
        WifeOf => "W/O", "Wife of";
        HusbandOf => "H/O", "Husband of";
        FatherOf => "F/O", "Father of";
        MotherOf => "M/O", "Mother of";
        CareOf => "C/O", "Care of";
    }
}

vocabulary! {
    Religion ("religion") {
        Hindu => "Hindu", "Hindu";
        Muslim => "Muslim", "Muslim";
        Christian => "Christian", "Christian";
        Sikh => "Sikh", "Sikh";
        Buddhist => "Buddhist", "Buddhist";
        Jain => "Jain", "Jain";
        Parsi => "Parsi", "Parsi";
        Other => "Other", "Other";
    }
}

vocabulary! {
    Occupation ("occupation") {
        Service => "Service", "Service";
        Business => "Business", "Business";
        Professional => "Professional", "Professional";
        Student => "Student", "Student";
        Homemaker => "Homemaker", "Homemaker";
        Farmer => "Farmer", "Farmer";
        Labourer => "Labourer", "Labourer";
        Retired => "Retired", "Retired";
        Unemployed => "Unemployed", "Unemployed";
        Other => "Other", "Other";
    }
}

vocabulary! {
    /// Identity document presented at registration.
    IdType ("id type") {
        Aadhaar => "Aadhaar", "Aadhaar Card";
        Pan => "PAN", "PAN Card";
        VoterId => "Voter ID", "Voter ID";
        Passport => "Passport", "Passport";
        DrivingLicence => "Driving Licence", "Driving Licence";
        Other => "Other", "Other";
    }
}

vocabulary! {
    BloodGroup ("blood group") {
        APositive => "A+", "A+";
        ANegative => "A-", "A-";
        BPositive => "B+", "B+";
        BNegative => "B-", "B-";
        AbPositive => "AB+", "AB+";
        AbNegative => "AB-", "AB-";
        OPositive => "O+", "O+";
        ONegative => "O-", "O-";
    }
}

vocabulary! {
    MaritalStatus ("marital status") {
        Single => "Single", "Single";
        Married => "Married", "Married";
        Divorced => "Divorced", "Divorced";
        Widowed => "Widowed", "Widowed";
    }
}

vocabulary! {
    VisitStatus ("visit status") {
        Pending => "pending", "Pending";
        Closed => "closed", "Closed";
        Cancelled => "cancelled", "Cancelled";
    }
}

vocabulary! {
    AppointmentStatus ("appointment status") {
        Scheduled => "scheduled", "Scheduled";
        Completed => "completed", "Completed";
        Cancelled => "cancelled", "Cancelled";
    }
}

vocabulary! {
    BedStatus ("bed status") {
        Available => "available", "Available";
        Occupied => "occupied", "Occupied";
        Maintenance => "maintenance", "Maintenance";
    }
}

vocabulary! {
    WardType ("ward type") {
        General => "General", "General";
        SemiPrivate => "Semi-Private", "Semi-Private";
        Private => "Private", "Private";
        Icu => "ICU", "ICU";
        Nicu => "NICU", "NICU";
        Emergency => "Emergency", "Emergency";
    }
}

vocabulary! {
    ServiceCategory ("service category") {
        Consultation => "Consultation", "Consultation";
        Laboratory => "Laboratory", "Laboratory";
        Radiology => "Radiology", "Radiology";
        Procedure => "Procedure", "Procedure";
        Pharmacy => "Pharmacy", "Pharmacy";
        RoomCharge => "Room Charge", "Room Charge";
        Nursing => "Nursing", "Nursing";
        Other => "Other", "Other";
    }
}

impl ServiceCategory {
    /// Services in these categories get a lab order test when billed.
    pub fn is_lab_relevant(self) -> bool {
        matches!(self, ServiceCategory::Laboratory | ServiceCategory::Radiology)
    }
}

vocabulary! {
    /// Which billing desks may charge a service.
    Applicability ("applicability") {
        Opd => "OPD", "OPD";
        Ipd => "IPD", "IPD";
        Both => "Both", "OPD & IPD";
    }
}

impl Applicability {
    pub fn allows_opd(self) -> bool {
        matches!(self, Applicability::Opd | Applicability::Both)
    }

    pub fn allows_ipd(self) -> bool {
        matches!(self, Applicability::Ipd | Applicability::Both)
    }
}

vocabulary! {
    SampleType ("sample type") {
        Blood => "Blood", "Blood";
        Serum => "Serum", "Serum";
        Plasma => "Plasma", "Plasma";
        Urine => "Urine", "Urine";
        Stool => "Stool", "Stool";
        Sputum => "Sputum", "Sputum";
        Swab => "Swab", "Swab";
        Csf => "CSF", "CSF";
        Tissue => "Tissue", "Tissue";
        NotApplicable => "N/A", "Not applicable";
    }
}

vocabulary! {
    ResultType ("result type") {
        Numeric => "numeric", "Numeric";
        Text => "text", "Text";
    }
}

vocabulary! {
    /// Gender scope of a reference range.
    ReferenceGender ("reference gender") {
        All => "All", "All";
        Male => "Male", "Male";
        Female => "Female", "Female";
    }
}

impl ReferenceGender {
    pub fn matches(self, gender: Gender) -> bool {
        match self {
            ReferenceGender::All => true,
            ReferenceGender::Male => gender == Gender::Male,
            ReferenceGender::Female => gender == Gender::Female,
        }
    }
}

vocabulary! {
    AgeUnit ("age unit") {
        Year => "Year", "Years";
        Month => "Month", "Months";
        Day => "Day", "Days";
    }
}

vocabulary! {
    PaymentMode ("payment mode") {
        Cash => "Cash", "Cash";
        Card => "Card", "Card";
        Upi => "UPI", "UPI";
        Insurance => "Insurance", "Insurance";
        Other => "Other", "Other";
    }
}

vocabulary! {
    PatientStatus ("patient status") {
        Admitted => "Admitted", "Admitted";
        Discharged => "Discharged", "Discharged";
    }
}

vocabulary! {
    BillingKind ("billing kind") {
        Opd => "opd", "OPD";
        Ipd => "ipd", "IPD";
    }
}

vocabulary! {
    /// Progress of a lab order test, and by rollup of its order.
    LabStatus ("lab status") {
        Pending => "pending", "Pending";
        Collected => "collected", "Collected";
        Saved => "saved", "Saved";
        Authorized => "authorized", "Authorized";
    }
}

impl LabStatus {
    /// Position in the workflow; the rollup takes the lowest rank.
    pub fn rank(self) -> u8 {
        match self {
            LabStatus::Pending => 0,
            LabStatus::Collected => 1,
            LabStatus::Saved => 2,
            LabStatus::Authorized => 3,
        }
    }

    /// Status of an order given its tests. An order with no tests is pending.
    pub fn rollup(statuses: impl IntoIterator<Item = LabStatus>) -> LabStatus {
        statuses
            .into_iter()
            .min_by_key(|s| s.rank())
            .unwrap_or(LabStatus::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_value(RelationType::SonOf).expect("serialise should succeed"),
            "S/O"
        );
        let parsed: Applicability =
            serde_json::from_str("\"Both\"").expect("deserialise should succeed");
        assert_eq!(parsed, Applicability::Both);
    }

    #[test]
    fn test_unknown_enum_value_fails_to_deserialise() {
        assert!(serde_json::from_str::<BedStatus>("\"broken\"").is_err());
    }

    #[test]
    fn test_from_str_accepts_label_and_wire() {
        assert_eq!("son of".parse::<RelationType>(), Ok(RelationType::SonOf));
        assert_eq!("d/o".parse::<RelationType>(), Ok(RelationType::DaughterOf));
        let err = "cousin".parse::<RelationType>().expect_err("should fail");
        assert_eq!(err.to_string(), "unknown relation type 'cousin'");
    }

    #[test]
    fn test_rollup_takes_minimum() {
        use LabStatus::*;
        assert_eq!(LabStatus::rollup([Authorized, Authorized]), Authorized);
        assert_eq!(LabStatus::rollup([Authorized, Collected, Saved]), Collected);
        assert_eq!(LabStatus::rollup([]), Pending);
    }

    #[test]
    fn test_reference_gender_matching() {
        assert!(ReferenceGender::All.matches(Gender::Other));
        assert!(ReferenceGender::Female.matches(Gender::Female));
        assert!(!ReferenceGender::Male.matches(Gender::Female));
    }

    #[test]
    fn test_options_cover_all_variants() {
        let options = Applicability::options();
        assert_eq!(options.len(), 3);
        assert_eq!(options[2], DropdownOption::new("Both", "OPD & IPD"));
    }
}
