//! Persisted projections of a [`Person`] mutation.
//!
//! Both records are derived from one entity value at a single instant and are
//! only ever written together, inside one store transaction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{MutationKind, Person};

/// Latest snapshot of a person, one row per id. Fully overwritten on
/// add/update, deleted on remove.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentStateRecord {
    #[serde(rename = "PK")]
    pub pk: String,
    #[serde(flatten)]
    pub person: Person,
}

impl CurrentStateRecord {
    pub fn from_person(person: &Person) -> Self {
        Self {
            pk: person.person_id.clone(),
            person: person.clone(),
        }
    }
}

/// Immutable audit entry capturing one mutation event. Never updated or
/// deleted once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(rename = "PK")]
    pub pk: String,
    #[serde(rename = "SK")]
    pub sk: String,
    pub update_type: MutationKind,
    #[serde(flatten)]
    pub person: Person,
}

impl HistoryRecord {
    /// A fresh uuid suffix keeps sort keys distinct even when two mutations
    /// for the same person carry the same timestamp.
    pub fn new(person: &Person, kind: MutationKind) -> Self {
        Self {
            pk: person.person_id.clone(),
            sk: format!("{}#{}", person.timestamp, Uuid::new_v4()),
            update_type: kind,
            person: person.clone(),
        }
    }
}
