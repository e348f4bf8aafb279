use causeway_core::Document;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Store collection holding causal event rows.
pub const CAUSAL_COLLECTION: &str = "causal_events";

/// One versioned event of an entity's history.
///
/// Versions are unique and strictly increasing within an entity.
/// `depends_on` names at most one causal predecessor (a strictly smaller
/// version of the same entity); events with no dependency relation are
/// concurrent and carry no ordering constraint relative to each other. The
/// graph is acyclic by construction since a dependency always points
/// backwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CausalEvent {
    pub entity_id: String,
    pub version: u64,
    pub depends_on: Option<u64>,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

impl CausalEvent {
    /// Serialize into a store document.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization produces a non-object value, which
    /// would indicate a bug in the event definition.
    pub fn to_document(&self) -> Result<Document, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => unreachable!("causal events serialize to objects"),
        }
    }

    /// Deserialize from a store document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not hold a well-formed event.
    pub fn from_document(document: Document) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(document))
    }
}
