//! Query predicates.
//!
//! A [`Filter`] is a small expression tree over dotted JSON field paths (`"age.years"`). Each
//! store backend evaluates it natively: [`Filter::matches`] for documents held in memory, SQL
//! generation for Postgres.
//!
//! A missing field reads as `null`, so `Filter::eq("patientId", Value::Null)` matches documents
//! that omit the field as well as those that store an explicit `null`.

use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Filter {
    /// Matches every document.
    #[default]
    All,
    Eq(String, Value),
    Ne(String, Value),
    In(String, Vec<Value>),
    /// Case-insensitive substring match on a string field.
    Contains(String, String),
    /// Field is of the same JSON type as the bound and not less than it.
    Gte(String, Value),
    /// Field is of the same JSON type as the bound and not greater than it.
    Lte(String, Value),
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Filter::Eq(field.to_owned(), value.into())
    }

    pub fn ne(field: &str, value: impl Into<Value>) -> Self {
        Filter::Ne(field.to_owned(), value.into())
    }

    pub fn one_of<V: Into<Value>>(field: &str, values: impl IntoIterator<Item = V>) -> Self {
        Filter::In(field.to_owned(), values.into_iter().map(Into::into).collect())
    }

    pub fn contains(field: &str, needle: impl Into<String>) -> Self {
        Filter::Contains(field.to_owned(), needle.into())
    }

    pub fn gte(field: &str, value: impl Into<Value>) -> Self {
        Filter::Gte(field.to_owned(), value.into())
    }

    pub fn lte(field: &str, value: impl Into<Value>) -> Self {
        Filter::Lte(field.to_owned(), value.into())
    }

    /// Conjunction that drops `All` terms; an empty list is `All`.
    pub fn all_of(filters: Vec<Filter>) -> Self {
        let mut terms: Vec<Filter> = filters.into_iter().filter(|f| *f != Filter::All).collect();
        match terms.len() {
            0 => Filter::All,
            1 => terms.remove(0),
            _ => Filter::And(terms),
        }
    }

    /// Disjunction; a single term is returned as is.
    pub fn any_of(mut filters: Vec<Filter>) -> Self {
        if filters.len() == 1 {
            return filters.remove(0);
        }
        Filter::Or(filters)
    }

    pub fn negate(self) -> Self {
        Filter::Not(Box::new(self))
    }

    /// Evaluate against an in-memory JSON document.
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(path, value) => json_eq(lookup(doc, path), value),
            Filter::Ne(path, value) => !json_eq(lookup(doc, path), value),
            Filter::In(path, values) => {
                let field = lookup(doc, path);
                values.iter().any(|v| json_eq(field, v))
            }
            Filter::Contains(path, needle) => match lookup(doc, path) {
                Value::String(s) => s.to_lowercase().contains(&needle.to_lowercase()),
                _ => false,
            },
            Filter::Gte(path, bound) => matches!(
                same_type_cmp(lookup(doc, path), bound),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Filter::Lte(path, bound) => matches!(
                same_type_cmp(lookup(doc, path), bound),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Filter::And(terms) => terms.iter().all(|t| t.matches(doc)),
            Filter::Or(terms) => terms.iter().any(|t| t.matches(doc)),
            Filter::Not(inner) => !inner.matches(doc),
        }
    }
}

/// Splits a dotted path into its segments.
pub(crate) fn path_segments(path: &str) -> Vec<String> {
    path.split('.').map(str::to_owned).collect()
}

static NULL: Value = Value::Null;

/// Resolves a dotted path, returning `null` for anything missing.
pub(crate) fn lookup<'a>(doc: &'a Value, path: &str) -> &'a Value {
    path.split('.')
        .try_fold(doc, |current, segment| current.get(segment))
        .unwrap_or(&NULL)
}

fn json_eq(field: &Value, expected: &Value) -> bool {
    match (field, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => field == expected,
    }
}

fn same_type_cmp(field: &Value, bound: &Value) -> Option<Ordering> {
    match (field, bound) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Total order used for sorting: null, then booleans, numbers, strings, and anything else.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn type_rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    same_type_cmp(a, b).unwrap_or_else(|| type_rank(a).cmp(&type_rank(b)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patient() -> Value {
        json!({
            "name": "Asha Verma",
            "uhid": "UHID202610160001",
            "age": {"years": 34, "months": 2},
            "patientId": null,
            "createdAt": "2026-10-16T09:00:00.000Z"
        })
    }

    #[test]
    fn test_eq_on_nested_path() {
        assert!(Filter::eq("age.years", 34).matches(&patient()));
        assert!(Filter::eq("age.years", 34.0).matches(&patient()));
        assert!(!Filter::eq("age.months", 3).matches(&patient()));
    }

    #[test]
    fn test_null_matches_missing_and_explicit_null() {
        assert!(Filter::eq("patientId", Value::Null).matches(&patient()));
        assert!(Filter::eq("dischargeDate", Value::Null).matches(&patient()));
        assert!(!Filter::ne("patientId", Value::Null).matches(&patient()));
    }

    #[test]
    fn test_contains_is_case_insensitive() {
        assert!(Filter::contains("name", "verma").matches(&patient()));
        assert!(!Filter::contains("age", "3").matches(&patient()));
    }

    #[test]
    fn test_range_requires_same_type() {
        let doc = patient();
        assert!(Filter::gte("createdAt", "2026-10-16T00:00:00.000Z").matches(&doc));
        assert!(!Filter::lte("createdAt", "2026-10-15T23:59:59.999Z").matches(&doc));
        assert!(!Filter::gte("name", 0).matches(&doc));
    }

    #[test]
    fn test_boolean_combinators() {
        let doc = patient();
        let filter = Filter::all_of(vec![
            Filter::any_of(vec![
                Filter::contains("name", "zzz"),
                Filter::contains("uhid", "20261016"),
            ]),
            Filter::eq("age.years", 34).negate().negate(),
        ]);
        assert!(filter.matches(&doc));
        assert!(!Filter::one_of("age.years", [1, 2]).matches(&doc));
    }

    #[test]
    fn test_all_of_collapses() {
        assert_eq!(Filter::all_of(vec![]), Filter::All);
        assert_eq!(
            Filter::all_of(vec![Filter::All, Filter::eq("a", 1)]),
            Filter::eq("a", 1)
        );
    }

    #[test]
    fn test_compare_values_orders_types() {
        assert_eq!(compare_values(&Value::Null, &json!(1)), Ordering::Less);
        assert_eq!(compare_values(&json!("b"), &json!("a")), Ordering::Greater);
        assert_eq!(compare_values(&json!(2), &json!(10)), Ordering::Less);
    }
}
