use std::fmt;

use causeway_core::Document;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which half of a step's lifecycle an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Forward,
    Compensate,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Forward => "forward",
            Self::Compensate => "compensate",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
}

/// One attempted phase of one step. Append-only: never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub run_id: String,
    pub step_name: String,
    pub phase: Phase,
    pub outcome: Outcome,
    pub timestamp: DateTime<Utc>,
}

impl LedgerEntry {
    #[must_use]
    pub fn new(
        run_id: impl Into<String>,
        step_name: impl Into<String>,
        phase: Phase,
        outcome: Outcome,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            step_name: step_name.into(),
            phase,
            outcome,
            timestamp: Utc::now(),
        }
    }

    /// Serialize into a store document.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization produces a non-object value, which
    /// would indicate a bug in the entry definition.
    pub fn to_document(&self) -> Result<Document, serde_json::Error> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            _ => unreachable!("ledger entries serialize to objects"),
        }
    }

    /// Deserialize from a store document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not hold a well-formed entry.
    pub fn from_document(document: Document) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::Value::Object(document))
    }
}
