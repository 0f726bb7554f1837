use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::{StoreError, Value};

/// One stored row, keyed by column name.
pub type Row = BTreeMap<String, Value>;

/// Key/value pairs addressing a single row by its key columns.
pub type RowKey = BTreeMap<String, Value>;

/// A keyspace-scoped store able to answer point lookups.
///
/// Implementations are read-only from the caller's point of view; lookups
/// return at most one row because they address the full primary key.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Key columns of `table`, partition columns first.
    async fn primary_key(&self, keyspace: &str, table: &str) -> Result<Vec<String>, StoreError>;

    /// Fetch the row whose key columns equal `key`, if any.
    async fn get_row(
        &self,
        keyspace: &str,
        table: &str,
        key: &RowKey,
    ) -> Result<Option<Row>, StoreError>;
}
