//! Selection of reference ranges for a patient.
//!
//! Ranges carry their own age unit. A year is 12 months or 365 days, and both sides are scaled
//! into the same whole-number steps (see [`Age::in_steps`]) before comparison, so a patient
//! exactly on a bound is always inside it.

use crate::constants::{AGE_STEPS_PER_DAY, AGE_STEPS_PER_MONTH, AGE_STEPS_PER_YEAR};
use crate::models::{Age, BioReference};
use crate::vocab::{AgeUnit, Gender};

/// Converts an age bound to age steps. Whole bounds convert exactly.
pub fn bound_in_steps(value: f64, unit: AgeUnit) -> f64 {
    let per_unit = match unit {
        AgeUnit::Year => AGE_STEPS_PER_YEAR,
        AgeUnit::Month => AGE_STEPS_PER_MONTH,
        AgeUnit::Day => AGE_STEPS_PER_DAY,
    };
    value * per_unit as f64
}

/// Whether `reference` covers a patient of `gender` and `age`. Both bounds are inclusive.
pub fn applies_to(reference: &BioReference, gender: Gender, age: &Age) -> bool {
    let steps = age.in_steps() as f64;
    let min = bound_in_steps(reference.min_age, reference.age_type);
    let max = bound_in_steps(reference.max_age, reference.age_type);
    reference.gender.matches(gender) && min <= steps && steps <= max
}

/// The subset of `references` that apply to the patient, in input order.
pub fn applicable_references<'a>(
    references: &'a [BioReference],
    gender: Gender,
    age: &Age,
) -> Vec<&'a BioReference> {
    references
        .iter()
        .filter(|r| applies_to(r, gender, age))
        .collect()
}

/// `Some(true)` when a numeric `value` falls outside the first applicable bounded range.
/// `None` when the value is not numeric or no applicable range has bounds.
pub fn is_abnormal(value: &str, applicable: &[&BioReference]) -> Option<bool> {
    let value: f64 = value.trim().parse().ok().filter(|v: &f64| v.is_finite())?;
    let range = applicable
        .iter()
        .find(|r| r.lower_value.is_some() || r.upper_value.is_some())?;
    let below = range.lower_value.is_some_and(|lower| value < lower);
    let above = range.upper_value.is_some_and(|upper| value > upper);
    Some(below || above)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::Timestamp;
    use crate::vocab::ReferenceGender;
    use uuid::Uuid;

    fn reference(gender: ReferenceGender, unit: AgeUnit, min: f64, max: f64) -> BioReference {
        let now = Timestamp::parse("2026-10-16").expect("timestamp");
        BioReference {
            id: Uuid::new_v4(),
            parameter_id: Uuid::new_v4(),
            gender,
            age_type: unit,
            min_age: min,
            max_age: max,
            lower_value: Some(11.0),
            upper_value: Some(15.0),
            reference_text: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_month_range_includes_exactly_one_year() {
        let infant = reference(ReferenceGender::All, AgeUnit::Month, 0.0, 12.0);
        assert!(applies_to(&infant, Gender::Male, &Age::new(1, 0, 0)));
        assert!(!applies_to(&infant, Gender::Male, &Age::new(1, 1, 0)));
    }

    #[test]
    fn test_month_bounds_are_inclusive() {
        let toddler = reference(ReferenceGender::All, AgeUnit::Month, 0.0, 19.0);
        assert!(applies_to(&toddler, Gender::Male, &Age::new(1, 7, 0)));
        assert!(!applies_to(&toddler, Gender::Male, &Age::new(1, 7, 1)));

        let older = reference(ReferenceGender::All, AgeUnit::Month, 20.0, 36.0);
        assert!(applies_to(&older, Gender::Male, &Age::new(1, 8, 0)));
        assert!(!applies_to(&older, Gender::Male, &Age::new(1, 7, 0)));
    }

    #[test]
    fn test_patient_on_a_bound_is_inside_for_every_unit() {
        // (unit, bound, age exactly on that bound)
        let cases = [
            (AgeUnit::Year, 1.0, Age::new(1, 0, 0)),
            (AgeUnit::Year, 18.0, Age::new(18, 0, 0)),
            (AgeUnit::Year, 0.5, Age::new(0, 6, 0)),
            (AgeUnit::Year, 65.0, Age::new(64, 12, 0)),
            (AgeUnit::Month, 1.0, Age::new(0, 1, 0)),
            (AgeUnit::Month, 13.0, Age::new(1, 1, 0)),
            (AgeUnit::Month, 19.0, Age::new(1, 7, 0)),
            (AgeUnit::Month, 20.0, Age::new(1, 8, 0)),
            (AgeUnit::Month, 35.0, Age::new(2, 11, 0)),
            (AgeUnit::Month, 150.0, Age::new(12, 6, 0)),
            (AgeUnit::Day, 7.0, Age::new(0, 0, 7)),
            (AgeUnit::Day, 365.0, Age::new(1, 0, 0)),
            (AgeUnit::Day, 395.0, Age::new(1, 0, 30)),
            (AgeUnit::Day, 730.0, Age::new(2, 0, 0)),
        ];
        for (unit, bound, age) in cases {
            let as_max = reference(ReferenceGender::All, unit, 0.0, bound);
            assert!(applies_to(&as_max, Gender::Female, &age), "{age:?} <= {bound} {unit:?}");
            let as_min = reference(ReferenceGender::All, unit, bound, bound + 100.0);
            assert!(applies_to(&as_min, Gender::Female, &age), "{age:?} >= {bound} {unit:?}");
        }
    }

    #[test]
    fn test_one_day_past_a_bound_is_outside() {
        let cases = [
            (AgeUnit::Year, 18.0, Age::new(18, 0, 1)),
            (AgeUnit::Month, 19.0, Age::new(1, 7, 1)),
            (AgeUnit::Day, 395.0, Age::new(1, 0, 31)),
        ];
        for (unit, bound, age) in cases {
            let r = reference(ReferenceGender::All, unit, 0.0, bound);
            assert!(!applies_to(&r, Gender::Male, &age), "{age:?} > {bound} {unit:?}");
        }
    }

    #[test]
    fn test_day_range() {
        let neonate = reference(ReferenceGender::All, AgeUnit::Day, 0.0, 28.0);
        assert!(applies_to(&neonate, Gender::Female, &Age::new(0, 0, 28)));
        assert!(!applies_to(&neonate, Gender::Female, &Age::new(0, 1, 0)));
    }

    #[test]
    fn test_gender_scoping() {
        let refs = vec![
            reference(ReferenceGender::Male, AgeUnit::Year, 18.0, 100.0),
            reference(ReferenceGender::Female, AgeUnit::Year, 18.0, 100.0),
            reference(ReferenceGender::All, AgeUnit::Year, 0.0, 17.0),
        ];
        let adult = Age::new(30, 0, 0);
        let picked = applicable_references(&refs, Gender::Female, &adult);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].gender, ReferenceGender::Female);

        assert!(applicable_references(&refs, Gender::Other, &adult).is_empty());
    }

    #[test]
    fn test_is_abnormal() {
        let r = reference(ReferenceGender::All, AgeUnit::Year, 0.0, 100.0);
        let applicable = vec![&r];
        assert_eq!(is_abnormal("16.1", &applicable), Some(true));
        assert_eq!(is_abnormal("10.9", &applicable), Some(true));
        assert_eq!(is_abnormal("13", &applicable), Some(false));
        assert_eq!(is_abnormal("Reactive", &applicable), None);
        assert_eq!(is_abnormal("13", &[]), None);
    }
}
