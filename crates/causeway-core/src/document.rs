//! Schemaless document model: the shapes exchanged with a [`crate::DataStore`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single store document: a flat JSON object.
pub type Document = serde_json::Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum FieldPredicate {
    Eq(Value),
    Gte(i64),
}

impl FieldPredicate {
    fn matches(&self, value: Option<&Value>) -> bool {
        match self {
            Self::Eq(expected) => value == Some(expected),
            Self::Gte(min) => value.and_then(as_i64).is_some_and(|v| v >= *min),
        }
    }
}

/// A conjunction of per-field predicates selecting documents.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Filter {
    clauses: Vec<(String, FieldPredicate)>,
}

impl Filter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field` to equal `value` exactly.
    #[must_use]
    pub fn field_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses
            .push((field.into(), FieldPredicate::Eq(value.into())));
        self
    }

    /// Require `field` to hold an integer of at least `min`. Used for
    /// preconditions such as "stock >= quantity".
    #[must_use]
    pub fn field_gte(mut self, field: impl Into<String>, min: i64) -> Self {
        self.clauses
            .push((field.into(), FieldPredicate::Gte(min)));
        self
    }

    /// Whether every clause holds for `doc`.
    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        self.clauses
            .iter()
            .all(|(field, predicate)| predicate.matches(doc.get(field)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum MutationOp {
    Set(String, Value),
    Inc(String, i64),
    IncF64(String, f64),
}

/// An ordered list of in-place field mutations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Mutation {
    ops: Vec<MutationOp>,
}

impl Mutation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite `field` with `value`, inserting it if absent.
    #[must_use]
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.ops.push(MutationOp::Set(field.into(), value.into()));
        self
    }

    /// Add `delta` to an integer field. A missing field counts as zero.
    #[must_use]
    pub fn inc(mut self, field: impl Into<String>, delta: i64) -> Self {
        self.ops.push(MutationOp::Inc(field.into(), delta));
        self
    }

    /// Add `delta` to a floating-point field. A missing field counts as zero.
    #[must_use]
    pub fn inc_f64(mut self, field: impl Into<String>, delta: f64) -> Self {
        self.ops.push(MutationOp::IncF64(field.into(), delta));
        self
    }

    /// Apply every op to `doc` in order.
    pub fn apply(&self, doc: &mut Document) {
        for op in &self.ops {
            match op {
                MutationOp::Set(field, value) => {
                    doc.insert(field.clone(), value.clone());
                }
                MutationOp::Inc(field, delta) => {
                    let current = doc.get(field).and_then(as_i64).unwrap_or(0);
                    doc.insert(field.clone(), Value::from(current + delta));
                }
                MutationOp::IncF64(field, delta) => {
                    let current = doc.get(field).and_then(Value::as_f64).unwrap_or(0.0);
                    doc.insert(field.clone(), Value::from(current + delta));
                }
            }
        }
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    value.as_i64()
}
