//! Key-value store abstraction with atomic multi-item writes.
//!
//! The service only ever talks to [`StateStore`]; the shipped engine is the
//! in-memory [`InMemoryStore`], and tests substitute their own impls.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::InMemoryStore;

/// A stored item: a JSON object carrying its own key attributes.
pub type Document = serde_json::Value;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport/availability failure. Retryable by the caller; never retried
    /// in this layer.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A per-op condition did not hold; the whole transaction was discarded.
    #[error("condition failed for key '{key}' in table '{table}'")]
    ConditionFailed { table: String, key: String },

    /// Unknown table, non-object item, or an item missing its key attribute.
    #[error("malformed operation: {0}")]
    Malformed(String),
}

/// Per-operation predicate evaluated inside the transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// The target key must already hold an item.
    KeyExists,
}

/// One operation inside a transactional write.
#[derive(Debug, Clone)]
pub enum WriteOp {
    Put {
        table: String,
        item: Document,
        condition: Option<Condition>,
    },
    Delete {
        table: String,
        key: String,
        condition: Option<Condition>,
    },
}

impl WriteOp {
    pub fn put(table: impl Into<String>, item: Document) -> Self {
        Self::Put {
            table: table.into(),
            item,
            condition: None,
        }
    }

    pub fn put_if_exists(table: impl Into<String>, item: Document) -> Self {
        Self::Put {
            table: table.into(),
            item,
            condition: Some(Condition::KeyExists),
        }
    }

    pub fn delete_if_exists(table: impl Into<String>, key: impl Into<String>) -> Self {
        Self::Delete {
            table: table.into(),
            key: key.into(),
            condition: Some(Condition::KeyExists),
        }
    }
}

/// Contract every storage engine must honor.
///
/// `transact_write` is the load-bearing guarantee: either every operation in
/// the list takes effect or none does. A mutation's current-state write and
/// its audit-history write must never be observable independently.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Point lookup by partition key. A missing key is `Ok(None)`, never an
    /// error; `Err` means the store itself failed.
    async fn get(&self, table: &str, key: &str) -> Result<Option<Document>, StoreError>;

    /// Apply all operations atomically, in order.
    async fn transact_write(&self, ops: Vec<WriteOp>) -> Result<(), StoreError>;

    /// All items sharing a partition key, ordered by sort key.
    async fn query_partition(
        &self,
        table: &str,
        partition_key: &str,
    ) -> Result<Vec<Document>, StoreError>;
}
