use serde::{Deserialize, Serialize};

use crate::records::HistoryRecord;

/// The entity carried by every webhook payload. `timestamp` is
/// caller-supplied and only used to order history entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub person_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationKind {
    Add,
    Update,
    Remove,
}

impl MutationKind {
    /// Verb used in failure messages ("Failed to add person" etc.).
    pub fn verb(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Remove => "remove",
        }
    }

    pub fn past_tense(self) -> &'static str {
        match self {
            Self::Add => "added",
            Self::Update => "updated",
            Self::Remove => "removed",
        }
    }
}

/// Inbound webhook envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    pub payload_type: String,
    pub payload_content: Person,
}

#[derive(Debug, Serialize)]
pub struct ApiMessage {
    pub message: String,
}

impl ApiMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GetNameResponse {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct GetNameQuery {
    #[serde(default)]
    pub person_id: String,
}

#[derive(Debug, Deserialize)]
pub struct GetHistoryQuery {
    #[serde(default)]
    pub person_id: String,
}

#[derive(Debug, Serialize)]
pub struct GetHistoryResponse {
    pub history: Vec<HistoryRecord>,
}
