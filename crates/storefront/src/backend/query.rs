//! Structured queries over a single collection.
//!
//! The same `Query` is sent to Firestore as a `structuredQuery` and evaluated
//! locally by the in-memory store, so the local evaluation mirrors Firestore's
//! semantics: documents missing a filtered or ordered field are excluded, and
//! values compare by type then by value.

use std::cmp::Ordering;

use chrono::DateTime;
use serde_json::Value;

use super::{CollectionPath, DocumentSnapshot, Fields};

/// A single `field == value` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

/// A query: conjunctive filters, ordering and an optional limit.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: CollectionPath,
    pub filters: Vec<Filter>,
    pub order_by: Vec<(String, Direction)>,
    pub limit: Option<usize>,
}

impl Query {
    /// Query every document of a collection.
    #[must_use]
    pub const fn new(collection: CollectionPath) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            order_by: Vec::new(),
            limit: None,
        }
    }

    /// Add an equality filter.
    #[must_use]
    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.to_owned(),
            value: value.into(),
        });
        self
    }

    /// Append a sort key.
    #[must_use]
    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by.push((field.to_owned(), direction));
        self
    }

    /// Cap the number of results.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a document satisfies every filter and has every sort field.
    #[must_use]
    pub fn matches(&self, fields: &Fields) -> bool {
        self.filters.iter().all(|f| filter_matches(f, fields))
            && self
                .order_by
                .iter()
                .all(|(field, _)| fields.contains_key(field))
    }

    /// Filter, sort and truncate a set of documents the way the backend would.
    #[must_use]
    pub fn apply(&self, documents: Vec<DocumentSnapshot>) -> Vec<DocumentSnapshot> {
        let mut matched: Vec<DocumentSnapshot> = documents
            .into_iter()
            .filter(|doc| self.matches(&doc.fields))
            .collect();

        matched.sort_by(|a, b| {
            for (field, direction) in &self.order_by {
                let ordering = match (a.fields.get(field), b.fields.get(field)) {
                    (Some(x), Some(y)) => compare_values(x, y),
                    _ => Ordering::Equal,
                };
                let ordering = match direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            a.id.cmp(&b.id)
        });

        if let Some(limit) = self.limit {
            matched.truncate(limit);
        }
        matched
    }
}

fn filter_matches(filter: &Filter, fields: &Fields) -> bool {
    fields
        .get(&filter.field)
        .is_some_and(|actual| compare_values(actual, &filter.value) == Ordering::Equal)
}

/// Firestore type order: null < bool < number < timestamp < string < array < map.
const fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 4,
        Value::Array(_) => 5,
        Value::Object(_) => 6,
    }
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::String(s) if is_timestamp(s) => 3,
        other => type_rank(other),
    }
}

fn is_timestamp(s: &str) -> bool {
    s.contains('T') && DateTime::parse_from_rfc3339(s).is_ok()
}

/// Total order over JSON values following the backend's cross-type ordering.
#[must_use]
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    let (ra, rb) = (rank(a), rank(b));
    if ra != rb {
        return ra.cmp(&rb);
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) if ra == 3 => {
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (item_x, item_y) in x.iter().zip(y) {
                let ordering = compare_values(item_x, item_y);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(x), Value::Object(y)) => {
            if x == y {
                Ordering::Equal
            } else {
                x.len().cmp(&y.len()).then(Ordering::Less)
            }
        }
        _ => Ordering::Equal,
    }
}
