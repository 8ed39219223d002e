// src/filter.rs
// Filter builder - typed predicate trees over stored records

use serde_json::Value;
use std::cmp::Ordering;

use crate::record::{compare_values, get_path, RecordId};

/// Comparison operator for a filter leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    Eq,
    Gt,
    Lt,
}

/// A predicate selecting a subset of records
///
/// Filters are a tree of comparison leaves combined by logical nodes.
/// Building one is pure; nothing is evaluated until `matches` is called
/// against a record.
///
/// # Examples
///
/// ```
/// use vinylbase_core::Filter;
///
/// let modern = Filter::and(vec![Filter::gt("year", 1950)]);
/// let by_artist = Filter::eq("artist", "Queen");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Empty filter, matches every record
    All,
    /// Comparison leaf: {field, operator, value}
    Cmp {
        field: String,
        op: Cmp,
        value: Value,
    },
    /// Logical AND over sub-filters; `And([])` matches everything
    And(Vec<Filter>),
    /// Logical OR over sub-filters; `Or([])` matches nothing
    Or(Vec<Filter>),
}

impl Filter {
    /// Empty filter, matches all records
    pub fn all() -> Self {
        Filter::All
    }

    /// Equality on a field (dot notation supported)
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Cmp {
            field: field.into(),
            op: Cmp::Eq,
            value: value.into(),
        }
    }

    /// Greater-than on a field
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Cmp {
            field: field.into(),
            op: Cmp::Gt,
            value: value.into(),
        }
    }

    /// Less-than on a field
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Cmp {
            field: field.into(),
            op: Cmp::Lt,
            value: value.into(),
        }
    }

    /// Conjunction of sub-filters
    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::And(filters)
    }

    /// Disjunction of sub-filters
    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Or(filters)
    }

    /// Equality on the record identifier
    pub fn id(id: &RecordId) -> Self {
        Filter::eq("_id", id.to_value())
    }

    /// Check whether a record matches this filter
    ///
    /// A comparison against a missing field does not match; neither does a
    /// comparison between incompatible types.
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Filter::All => true,
            Filter::Cmp { field, op, value } => {
                let Some(actual) = get_path(doc, field) else {
                    return false;
                };
                match op {
                    Cmp::Eq => match compare_values(actual, value) {
                        Some(ord) => ord == Ordering::Equal,
                        // Deep equality for non-scalar values
                        None => actual == value,
                    },
                    Cmp::Gt => compare_values(actual, value) == Some(Ordering::Greater),
                    Cmp::Lt => compare_values(actual, value) == Some(Ordering::Less),
                }
            }
            Filter::And(filters) => filters.iter().all(|f| f.matches(doc)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(doc)),
        }
    }
}

impl Default for Filter {
    fn default() -> Self {
        Filter::All
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn album(artist: &str, year: i64) -> Value {
        json!({"_id": 1, "artist": artist, "year": year})
    }

    #[test]
    fn test_empty_filter_matches_all() {
        assert!(Filter::all().matches(&album("Queen", 1976)));
        assert!(Filter::and(vec![]).matches(&album("Queen", 1976)));
    }

    #[test]
    fn test_empty_or_matches_nothing() {
        assert!(!Filter::or(vec![]).matches(&album("Queen", 1976)));
    }

    #[test]
    fn test_eq() {
        let filter = Filter::eq("artist", "Queen");
        assert!(filter.matches(&album("Queen", 1976)));
        assert!(!filter.matches(&album("Beethoven", 1824)));
    }

    #[test]
    fn test_eq_numeric_cross_type() {
        // Integer and float representations of the same number are equal
        let filter = Filter::eq("year", 1976.0);
        assert!(filter.matches(&album("Queen", 1976)));
    }

    #[test]
    fn test_gt_lt() {
        let modern = Filter::gt("year", 1950);
        assert!(modern.matches(&album("Queen", 1976)));
        assert!(!modern.matches(&album("Beethoven", 1824)));
        assert!(!modern.matches(&album("Boundary", 1950)));

        let old = Filter::lt("year", 1950);
        assert!(old.matches(&album("Beethoven", 1824)));
        assert!(!old.matches(&album("Queen", 1976)));
        assert!(!old.matches(&album("Boundary", 1950)));
    }

    #[test]
    fn test_missing_field_does_not_match() {
        let filter = Filter::gt("missing", 0);
        assert!(!filter.matches(&album("Queen", 1976)));
    }

    #[test]
    fn test_incompatible_types_do_not_match() {
        let filter = Filter::gt("artist", 1950);
        assert!(!filter.matches(&album("Queen", 1976)));

        let filter = Filter::eq("year", "1976");
        assert!(!filter.matches(&album("Queen", 1976)));
    }

    #[test]
    fn test_conjunction() {
        let filter = Filter::and(vec![
            Filter::gt("year", 1950),
            Filter::eq("artist", "Queen"),
        ]);
        assert!(filter.matches(&album("Queen", 1976)));
        assert!(!filter.matches(&album("Queen", 1900)));
        assert!(!filter.matches(&album("Rammstein", 2022)));
    }

    #[test]
    fn test_disjunction() {
        let filter = Filter::or(vec![
            Filter::lt("year", 1900),
            Filter::gt("year", 2000),
        ]);
        assert!(filter.matches(&album("Beethoven", 1824)));
        assert!(filter.matches(&album("Rammstein", 2022)));
        assert!(!filter.matches(&album("Queen", 1976)));
    }

    #[test]
    fn test_nested_logical_nodes() {
        let filter = Filter::and(vec![
            Filter::or(vec![
                Filter::eq("artist", "Queen"),
                Filter::eq("artist", "Rammstein"),
            ]),
            Filter::gt("year", 1950),
        ]);
        assert!(filter.matches(&album("Queen", 1976)));
        assert!(!filter.matches(&album("Queen", 1900)));
        assert!(!filter.matches(&album("Beethoven", 1824)));
    }

    #[test]
    fn test_id_filter() {
        let id = RecordId::Int(1);
        assert!(Filter::id(&id).matches(&album("Queen", 1976)));
        assert!(!Filter::id(&RecordId::Int(2)).matches(&album("Queen", 1976)));
    }

    #[test]
    fn test_dot_notation_field() {
        let doc = json!({"label": {"country": "UK"}});
        assert!(Filter::eq("label.country", "UK").matches(&doc));
        assert!(!Filter::eq("label.country", "DE").matches(&doc));
    }

    #[test]
    fn test_building_is_pure() {
        let filter = Filter::gt("year", 1950);
        let doc = album("Queen", 1976);
        // Matching twice against the same record gives the same answer
        assert_eq!(filter.matches(&doc), filter.matches(&doc));
        assert_eq!(filter, Filter::gt("year", 1950));
    }
}
