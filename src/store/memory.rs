//! In-memory document store with atomic multi-item writes.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Condition, Document, StateStore, StoreError, WriteOp};

/// Key layout of one table: a partition key attribute, optionally paired with
/// a sort key attribute.
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub name: String,
    pub partition_key: String,
    pub sort_key: Option<String>,
}

impl TableSchema {
    pub fn keyed_by(name: impl Into<String>, partition_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partition_key: partition_key.into(),
            sort_key: None,
        }
    }

    pub fn with_sort_key(mut self, sort_key: impl Into<String>) -> Self {
        self.sort_key = Some(sort_key.into());
        self
    }
}

struct TableData {
    schema: TableSchema,
    // (partition key, sort key); BTreeMap keeps partitions contiguous and
    // sorted by sort key, which query_partition relies on.
    rows: BTreeMap<(String, String), Document>,
}

/// All tables behind one lock; `transact_write` validates every operation
/// against the pre-transaction state before applying any, so a rejected
/// condition or malformed item leaves the store untouched.
pub struct InMemoryStore {
    tables: RwLock<HashMap<String, TableData>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_table(mut self, schema: TableSchema) -> Self {
        self.tables.get_mut().insert(
            schema.name.clone(),
            TableData {
                schema,
                rows: BTreeMap::new(),
            },
        );
        self
    }

    /// Number of rows currently held by a table.
    pub async fn row_count(&self, table: &str) -> Result<usize, StoreError> {
        let tables = self.tables.read().await;
        let data = lookup_table(&tables, table)?;
        Ok(data.rows.len())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn lookup_table<'t>(
    tables: &'t HashMap<String, TableData>,
    name: &str,
) -> Result<&'t TableData, StoreError> {
    tables
        .get(name)
        .ok_or_else(|| StoreError::Malformed(format!("unknown table '{name}'")))
}

fn key_attr(item: &Document, attr: &str, table: &str) -> Result<String, StoreError> {
    item.get(attr)
        .and_then(|value| value.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            StoreError::Malformed(format!(
                "item for table '{table}' is missing string attribute '{attr}'"
            ))
        })
}

fn item_key(schema: &TableSchema, item: &Document) -> Result<(String, String), StoreError> {
    let pk = key_attr(item, &schema.partition_key, &schema.name)?;
    let sk = match &schema.sort_key {
        Some(attr) => key_attr(item, attr, &schema.name)?,
        None => String::new(),
    };
    Ok((pk, sk))
}

/// A fully validated operation, ready to apply without failing.
enum PlannedOp {
    Put {
        table: String,
        key: (String, String),
        item: Document,
    },
    Delete {
        table: String,
        key: (String, String),
    },
}

#[async_trait]
impl StateStore for InMemoryStore {
    async fn get(&self, table: &str, key: &str) -> Result<Option<Document>, StoreError> {
        let tables = self.tables.read().await;
        let data = lookup_table(&tables, table)?;
        Ok(data.rows.get(&(key.to_string(), String::new())).cloned())
    }

    async fn transact_write(&self, ops: Vec<WriteOp>) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;

        // Validate everything against the pre-transaction state first.
        let mut planned = Vec::with_capacity(ops.len());
        for op in ops {
            match op {
                WriteOp::Put {
                    table,
                    item,
                    condition,
                } => {
                    let data = lookup_table(&tables, &table)?;
                    if !item.is_object() {
                        return Err(StoreError::Malformed(format!(
                            "item for table '{table}' is not an object"
                        )));
                    }
                    let key = item_key(&data.schema, &item)?;
                    check_condition(data, &key, condition, &table)?;
                    planned.push(PlannedOp::Put { table, key, item });
                }
                WriteOp::Delete {
                    table,
                    key,
                    condition,
                } => {
                    let data = lookup_table(&tables, &table)?;
                    let key = (key, String::new());
                    check_condition(data, &key, condition, &table)?;
                    planned.push(PlannedOp::Delete { table, key });
                }
            }
        }

        // Nothing below can fail; the lock is held across both phases.
        for op in planned {
            match op {
                PlannedOp::Put { table, key, item } => {
                    if let Some(data) = tables.get_mut(&table) {
                        data.rows.insert(key, item);
                    }
                }
                PlannedOp::Delete { table, key } => {
                    if let Some(data) = tables.get_mut(&table) {
                        data.rows.remove(&key);
                    }
                }
            }
        }

        Ok(())
    }

    async fn query_partition(
        &self,
        table: &str,
        partition_key: &str,
    ) -> Result<Vec<Document>, StoreError> {
        let tables = self.tables.read().await;
        let data = lookup_table(&tables, table)?;
        let lower = (partition_key.to_string(), String::new());
        Ok(data
            .rows
            .range(lower..)
            .take_while(|((pk, _), _)| pk == partition_key)
            .map(|(_, item)| item.clone())
            .collect())
    }
}

fn check_condition(
    data: &TableData,
    key: &(String, String),
    condition: Option<Condition>,
    table: &str,
) -> Result<(), StoreError> {
    match condition {
        None => Ok(()),
        Some(Condition::KeyExists) => {
            if data.rows.contains_key(key) {
                Ok(())
            } else {
                Err(StoreError::ConditionFailed {
                    table: table.to_string(),
                    key: key.0.clone(),
                })
            }
        }
    }
}
