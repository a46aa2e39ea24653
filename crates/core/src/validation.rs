//! Input validation utilities.
//!
//! Request types implement [`Validate`]; each check returns the first failure as
//! `HisError::Validation` with a message suitable for showing to the user.

use crate::{HisError, HisResult};
use chrono::NaiveDate;

/// Shape and range checks run before any write.
pub trait Validate {
    /// # Errors
    ///
    /// Returns `HisError::Validation` describing the first problem found.
    fn validate(&self) -> HisResult<()>;
}

/// Rejects text longer than `max` characters.
pub fn max_len(field: &str, value: &str, max: usize) -> HisResult<()> {
    if value.chars().count() > max {
        return Err(HisError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

pub fn optional_max_len(field: &str, value: Option<&str>, max: usize) -> HisResult<()> {
    value.map_or(Ok(()), |v| max_len(field, v, max))
}

/// Rejects NaN, infinities and values outside `min..=max`.
pub fn in_range(field: &str, value: f64, min: f64, max: f64) -> HisResult<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(HisError::validation(format!(
            "{field} must be between {min} and {max}"
        )));
    }
    Ok(())
}

/// Money must be a finite, non-negative amount.
pub fn money(field: &str, value: f64) -> HisResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(HisError::validation(format!(
            "{field} must be a non-negative amount"
        )));
    }
    Ok(())
}

pub fn quantity(field: &str, value: u32) -> HisResult<()> {
    if value < 1 {
        return Err(HisError::validation(format!("{field} must be at least 1")));
    }
    Ok(())
}

/// Indian postal code: six digits, not starting with zero.
pub fn pincode(value: &str) -> HisResult<()> {
    let ok = value.len() == 6
        && value.bytes().all(|b| b.is_ascii_digit())
        && !value.starts_with('0');
    if !ok {
        return Err(HisError::validation("pincode must be a 6-digit postal code"));
    }
    Ok(())
}

pub fn not_in_future(field: &str, date: NaiveDate, today: NaiveDate) -> HisResult<()> {
    if date > today {
        return Err(HisError::validation(format!("{field} cannot be in the future")));
    }
    Ok(())
}

/// Age parts as entered at registration: years 0-150, months 0-11, days 0-30.
pub fn age_parts(years: u32, months: u32, days: u32) -> HisResult<()> {
    if years > 150 {
        return Err(HisError::validation("age years must be between 0 and 150"));
    }
    if months > 11 {
        return Err(HisError::validation("age months must be between 0 and 11"));
    }
    if days > 30 {
        return Err(HisError::validation("age days must be between 0 and 30"));
    }
    Ok(())
}

pub fn non_empty_list<T>(field: &str, items: &[T]) -> HisResult<()> {
    if items.is_empty() {
        return Err(HisError::validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(result: HisResult<()>) -> String {
        result.expect_err("validation should fail").to_string()
    }

    #[test]
    fn test_max_len_counts_chars() {
        assert!(max_len("name", "ñññ", 3).is_ok());
        assert_eq!(
            message(max_len("name", "abcd", 3)),
            "name must be at most 3 characters"
        );
    }

    #[test]
    fn test_money_rejects_negative_and_nan() {
        assert!(money("price", 0.0).is_ok());
        assert!(money("price", -1.0).is_err());
        assert!(money("price", f64::NAN).is_err());
    }

    #[test]
    fn test_pincode() {
        assert!(pincode("560001").is_ok());
        assert!(pincode("060001").is_err());
        assert!(pincode("56001").is_err());
    }

    #[test]
    fn test_not_in_future() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).expect("valid date");
        assert!(not_in_future("dateOfBirth", today, today).is_ok());
        assert_eq!(
            message(not_in_future("dateOfBirth", today.succ_opt().expect("date"), today)),
            "dateOfBirth cannot be in the future"
        );
    }

    #[test]
    fn test_age_parts_ranges() {
        assert!(age_parts(0, 11, 30).is_ok());
        assert!(age_parts(151, 0, 0).is_err());
        assert!(age_parts(1, 12, 0).is_err());
        assert!(age_parts(1, 0, 31).is_err());
    }

    #[test]
    fn test_quantity_and_range() {
        assert!(quantity("quantity", 0).is_err());
        assert!(in_range("spo2", 101.0, 0.0, 100.0).is_err());
        assert!(in_range("spo2", 98.0, 0.0, 100.0).is_ok());
    }
}
