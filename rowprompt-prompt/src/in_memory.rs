use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rowprompt_core::{Row, RowKey, RowStore, StoreError, Value};
use tokio::sync::RwLock;

#[derive(Default)]
struct Table {
    key_columns: Vec<String>,
    rows: Vec<Row>,
}

#[derive(Default)]
struct StoreInner {
    tables: HashMap<(String, String), Table>,
}

/// A `RowStore` kept entirely in memory, mainly for tests and demos.
#[derive(Clone, Default)]
pub struct InMemoryRowStore {
    inner: Arc<RwLock<StoreInner>>,
    lookups: Arc<AtomicUsize>,
}

impl InMemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or reset) `keyspace.table` with the given key columns.
    pub async fn create_table<I, S>(&self, keyspace: &str, table: &str, key_columns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let table_def = Table {
            key_columns: key_columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        };
        self.inner
            .write()
            .await
            .tables
            .insert((keyspace.to_string(), table.to_string()), table_def);
    }

    /// Insert `row`, replacing any row with the same key.
    pub async fn insert(&self, keyspace: &str, table: &str, row: Row) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let table_def = inner
            .tables
            .get_mut(&(keyspace.to_string(), table.to_string()))
            .ok_or_else(|| StoreError::unknown_table(keyspace, table))?;

        for column in &table_def.key_columns {
            if row.get(column).map_or(true, Value::is_null) {
                return Err(StoreError::InvalidKey(format!(
                    "row is missing key column '{column}'"
                )));
            }
        }

        let key_columns = table_def.key_columns.clone();
        table_def
            .rows
            .retain(|existing| !same_key(&key_columns, existing, &row));
        table_def.rows.push(row);
        Ok(())
    }

    /// Number of `get_row` calls served so far.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

fn same_key(key_columns: &[String], left: &Row, right: &Row) -> bool {
    key_columns
        .iter()
        .all(|column| left.get(column) == right.get(column))
}

#[async_trait::async_trait]
impl RowStore for InMemoryRowStore {
    async fn primary_key(&self, keyspace: &str, table: &str) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.read().await;
        inner
            .tables
            .get(&(keyspace.to_string(), table.to_string()))
            .map(|table_def| table_def.key_columns.clone())
            .ok_or_else(|| StoreError::unknown_table(keyspace, table))
    }

    async fn get_row(
        &self,
        keyspace: &str,
        table: &str,
        key: &RowKey,
    ) -> Result<Option<Row>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.read().await;
        let table_def = inner
            .tables
            .get(&(keyspace.to_string(), table.to_string()))
            .ok_or_else(|| StoreError::unknown_table(keyspace, table))?;

        let addresses_primary_key = key.len() == table_def.key_columns.len()
            && table_def.key_columns.iter().all(|column| key.contains_key(column));
        if !addresses_primary_key {
            return Err(StoreError::InvalidKey(format!(
                "key columns {:?} do not match the primary key {:?} of {keyspace}.{table}",
                key.keys().collect::<Vec<_>>(),
                table_def.key_columns
            )));
        }

        let found = table_def
            .rows
            .iter()
            .find(|row| key.iter().all(|(column, value)| row.get(column) == Some(value)));
        Ok(found.cloned())
    }
}
