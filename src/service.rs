//! Mutation orchestration and read queries over the injected store.
//!
//! Every mutation is one-shot: derive both persisted projections from a
//! single entity value, then submit one atomic transaction. The lookup for
//! update/remove always completes before the write is issued.

use std::sync::Arc;

use serde_json::to_value;
use tracing::error;

use crate::error::{AppError, AppResult};
use crate::models::{MutationKind, Person};
use crate::records::{CurrentStateRecord, HistoryRecord};
use crate::store::{StateStore, StoreError, WriteOp};

/// Names of the two collections the service writes to.
#[derive(Debug, Clone)]
pub struct TableNames {
    pub person: String,
    pub history: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            person: "Person".to_string(),
            history: "PersonHistory".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct PersonService {
    store: Arc<dyn StateStore>,
    tables: TableNames,
}

impl PersonService {
    pub fn new(store: Arc<dyn StateStore>, tables: TableNames) -> Self {
        Self { store, tables }
    }

    pub fn tables(&self) -> &TableNames {
        &self.tables
    }

    /// Add always overwrites; no existence pre-check.
    pub async fn add(&self, person: &Person) -> AppResult<()> {
        let ops = vec![
            self.put_current(person, false, MutationKind::Add)?,
            self.put_history(person, MutationKind::Add)?,
        ];
        self.submit(ops, MutationKind::Add).await
    }

    /// The current record is rebuilt from the incoming entity, not the
    /// fetched one; the fetch only provides the not-found guard.
    pub async fn update(&self, person: &Person) -> AppResult<()> {
        let Some(_existing) = self.lookup(&person.person_id).await? else {
            return Err(AppError::NotFound);
        };

        let ops = vec![
            self.put_current(person, true, MutationKind::Update)?,
            self.put_history(person, MutationKind::Update)?,
        ];
        self.submit(ops, MutationKind::Update).await
    }

    /// The history entry snapshots the previously stored person; a removal
    /// payload may carry nothing but an id.
    pub async fn remove(&self, person: &Person) -> AppResult<()> {
        let Some(existing) = self.lookup(&person.person_id).await? else {
            return Err(AppError::NotFound);
        };

        let ops = vec![
            WriteOp::delete_if_exists(self.tables.person.clone(), person.person_id.clone()),
            self.put_history(&existing, MutationKind::Remove)?,
        ];
        self.submit(ops, MutationKind::Remove).await
    }

    /// Latest display name for an id. Returns the empty string when no
    /// record exists; callers cannot distinguish that from a stored empty
    /// name (long-standing surface behavior, kept as is).
    pub async fn latest_name(&self, person_id: &str) -> AppResult<String> {
        if person_id.is_empty() {
            return Err(AppError::InvalidRequest);
        }
        let found = self.lookup(person_id).await?;
        Ok(found.map(|person| person.name).unwrap_or_default())
    }

    /// Audit entries for an id, ordered by sort key.
    pub async fn history(&self, person_id: &str) -> AppResult<Vec<HistoryRecord>> {
        if person_id.is_empty() {
            return Err(AppError::InvalidRequest);
        }
        let items = self
            .store
            .query_partition(&self.tables.history, person_id)
            .await
            .map_err(AppError::Lookup)?;

        items
            .into_iter()
            .map(|item| {
                serde_json::from_value::<HistoryRecord>(item).map_err(|err| {
                    AppError::Lookup(StoreError::Malformed(format!(
                        "stored history entry for '{person_id}' does not decode: {err}"
                    )))
                })
            })
            .collect()
    }

    async fn lookup(&self, person_id: &str) -> AppResult<Option<Person>> {
        let found = self
            .store
            .get(&self.tables.person, person_id)
            .await
            .map_err(|err| {
                error!(person_id, error = %err, "person lookup failed");
                AppError::Lookup(err)
            })?;

        match found {
            None => Ok(None),
            Some(item) => serde_json::from_value::<CurrentStateRecord>(item)
                .map(|record| Some(record.person))
                .map_err(|err| {
                    AppError::Lookup(StoreError::Malformed(format!(
                        "stored record for '{person_id}' does not decode: {err}"
                    )))
                }),
        }
    }

    fn put_current(
        &self,
        person: &Person,
        must_exist: bool,
        kind: MutationKind,
    ) -> AppResult<WriteOp> {
        let item = to_value(CurrentStateRecord::from_person(person))
            .map_err(|err| self.encode_error(kind, err))?;
        // The exists-predicate runs inside the transaction, so a delete racing
        // past the pre-check fails the whole write instead of resurrecting the
        // record.
        Ok(if must_exist {
            WriteOp::put_if_exists(self.tables.person.clone(), item)
        } else {
            WriteOp::put(self.tables.person.clone(), item)
        })
    }

    fn put_history(&self, person: &Person, kind: MutationKind) -> AppResult<WriteOp> {
        let item = to_value(HistoryRecord::new(person, kind))
            .map_err(|err| self.encode_error(kind, err))?;
        Ok(WriteOp::put(self.tables.history.clone(), item))
    }

    fn encode_error(&self, kind: MutationKind, err: serde_json::Error) -> AppError {
        AppError::Mutation {
            kind,
            source: StoreError::Malformed(format!("record does not encode: {err}")),
        }
    }

    async fn submit(&self, ops: Vec<WriteOp>, kind: MutationKind) -> AppResult<()> {
        self.store.transact_write(ops).await.map_err(|source| {
            error!(kind = kind.verb(), error = %source, "person transaction failed");
            AppError::Mutation { kind, source }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::TableSchema;
    use crate::store::{Document, InMemoryStore};
    use async_trait::async_trait;

    fn person(id: &str, name: &str, timestamp: &str) -> Person {
        Person {
            person_id: id.to_string(),
            name: name.to_string(),
            timestamp: timestamp.to_string(),
        }
    }

    fn service() -> (Arc<InMemoryStore>, PersonService) {
        let tables = TableNames::default();
        let store = Arc::new(
            InMemoryStore::new()
                .with_table(TableSchema::keyed_by(tables.person.clone(), "PK"))
                .with_table(
                    TableSchema::keyed_by(tables.history.clone(), "PK").with_sort_key("SK"),
                ),
        );
        let service = PersonService::new(store.clone(), tables);
        (store, service)
    }

    /// A store whose transactions always fail; lookups pass through to an
    /// empty in-memory store.
    struct UnavailableStore {
        inner: InMemoryStore,
        fail_lookups: bool,
    }

    impl UnavailableStore {
        fn new(fail_lookups: bool) -> Self {
            let tables = TableNames::default();
            Self {
                inner: InMemoryStore::new()
                    .with_table(TableSchema::keyed_by(tables.person, "PK"))
                    .with_table(TableSchema::keyed_by(tables.history, "PK").with_sort_key("SK")),
                fail_lookups,
            }
        }
    }

    #[async_trait]
    impl StateStore for UnavailableStore {
        async fn get(&self, table: &str, key: &str) -> Result<Option<Document>, StoreError> {
            if self.fail_lookups {
                return Err(StoreError::Unavailable("connection refused".to_string()));
            }
            self.inner.get(table, key).await
        }

        async fn transact_write(&self, _ops: Vec<WriteOp>) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn query_partition(
            &self,
            table: &str,
            partition_key: &str,
        ) -> Result<Vec<Document>, StoreError> {
            if self.fail_lookups {
                return Err(StoreError::Unavailable("connection refused".to_string()));
            }
            self.inner.query_partition(table, partition_key).await
        }
    }

    #[tokio::test]
    async fn add_writes_current_and_history_together() {
        let (store, service) = service();
        service
            .add(&person("p1", "Alice", "2024-01-01T00:00:00Z"))
            .await
            .expect("add should succeed");

        assert_eq!(store.row_count("Person").await.unwrap(), 1);
        assert_eq!(store.row_count("PersonHistory").await.unwrap(), 1);
        let history = service.history("p1").await.unwrap();
        assert_eq!(history[0].update_type, MutationKind::Add);
    }

    #[tokio::test]
    async fn repeated_add_overwrites_state_but_appends_history() {
        let (store, service) = service();
        let p = person("p1", "Alice", "2024-01-01T00:00:00Z");
        service.add(&p).await.unwrap();
        service.add(&p).await.unwrap();

        assert_eq!(store.row_count("Person").await.unwrap(), 1);
        assert_eq!(store.row_count("PersonHistory").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn update_missing_person_is_not_found_and_writes_nothing() {
        let (store, service) = service();
        let err = service
            .update(&person("ghost", "Nobody", "2024-01-01T00:00:00Z"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound));
        assert_eq!(store.row_count("PersonHistory").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn update_uses_incoming_entity() {
        let (store, service) = service();
        service
            .add(&person("p1", "Alice", "2024-01-01T00:00:00Z"))
            .await
            .unwrap();
        service
            .update(&person("p1", "Alicia", "2024-01-02T00:00:00Z"))
            .await
            .unwrap();

        assert_eq!(service.latest_name("p1").await.unwrap(), "Alicia");
        assert_eq!(store.row_count("PersonHistory").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn remove_snapshots_last_stored_state() {
        let (_, service) = service();
        service
            .add(&person("p1", "Alice", "2024-01-01T00:00:00Z"))
            .await
            .unwrap();
        service
            .update(&person("p1", "Alicia", "2024-01-02T00:00:00Z"))
            .await
            .unwrap();
        // Removal payload carries only the id.
        service.remove(&person("p1", "", "")).await.unwrap();

        let history = service.history("p1").await.unwrap();
        assert_eq!(history.len(), 3);
        let removal = history
            .iter()
            .find(|entry| entry.update_type == MutationKind::Remove)
            .expect("removal entry exists");
        assert_eq!(removal.person.name, "Alicia");
    }

    #[tokio::test]
    async fn remove_missing_person_is_not_found() {
        let (store, service) = service();
        let err = service.remove(&person("ghost", "", "")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
        assert_eq!(store.row_count("PersonHistory").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn latest_name_is_empty_for_missing_person() {
        let (_, service) = service();
        assert_eq!(service.latest_name("ghost").await.unwrap(), "");
    }

    #[tokio::test]
    async fn latest_name_rejects_empty_id() {
        let (_, service) = service();
        let err = service.latest_name("").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest));
    }

    #[tokio::test]
    async fn transaction_failure_surfaces_as_mutation_error() {
        let service = PersonService::new(
            Arc::new(UnavailableStore::new(false)),
            TableNames::default(),
        );
        let err = service
            .add(&person("p1", "Alice", "2024-01-01T00:00:00Z"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Mutation {
                kind: MutationKind::Add,
                ..
            }
        ));
        assert_eq!(err.to_string(), "Failed to add person");
    }

    #[tokio::test]
    async fn lookup_failure_aborts_before_any_write() {
        let service =
            PersonService::new(Arc::new(UnavailableStore::new(true)), TableNames::default());
        let err = service
            .update(&person("p1", "Alicia", "2024-01-02T00:00:00Z"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Lookup(_)));
        assert_eq!(err.to_string(), "Internal Error Try Later");
    }
}
