//! A [`RowStore`] backed by SQLite.
//!
//! Keyspaces map to SQLite schema names: `main` is always present and further
//! keyspaces can be attached when the pool is built.

mod error;
mod query;

use std::str::FromStr;
use std::sync::Arc;

use rowprompt_core::{Row, RowKey, RowStore, StoreError};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

pub use error::SqliteStoreError;

/// Schema every SQLite database has.
pub const MAIN_KEYSPACE: &str = "main";

#[derive(Debug, Clone)]
pub struct SqliteRowStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone)]
pub struct SqliteRowStoreBuilder {
    database_url: String,
    max_connections: u32,
    attachments: Vec<(String, String)>,
}

impl SqliteRowStore {
    pub fn builder(database_url: impl Into<String>) -> SqliteRowStoreBuilder {
        SqliteRowStoreBuilder {
            database_url: database_url.into(),
            max_connections: 1,
            attachments: Vec::new(),
        }
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl SqliteRowStoreBuilder {
    pub fn max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Attach the database at `path` under the keyspace name `keyspace` on
    /// every pooled connection.
    pub fn attach(mut self, keyspace: impl Into<String>, path: impl Into<String>) -> Self {
        self.attachments.push((keyspace.into(), path.into()));
        self
    }

    pub async fn build(self) -> Result<SqliteRowStore, StoreError> {
        for (keyspace, _) in &self.attachments {
            query::check_identifier(keyspace)?;
        }

        let options = SqliteConnectOptions::from_str(&self.database_url)
            .map_err(SqliteStoreError::InvalidUrl)?
            .create_if_missing(true);

        let attachments = Arc::new(self.attachments);
        let pool = SqlitePoolOptions::new()
            .max_connections(self.max_connections)
            .after_connect(move |conn, _meta| {
                let attachments = Arc::clone(&attachments);
                Box::pin(async move {
                    for (keyspace, path) in attachments.iter() {
                        sqlx::query(&format!("ATTACH DATABASE ? AS \"{keyspace}\""))
                            .bind(path.as_str())
                            .execute(&mut *conn)
                            .await?;
                    }
                    Ok(())
                })
            })
            .connect_with(options)
            .await
            .map_err(SqliteStoreError::Connection)?;

        Ok(SqliteRowStore { pool })
    }
}

#[async_trait::async_trait]
impl RowStore for SqliteRowStore {
    async fn primary_key(&self, keyspace: &str, table: &str) -> Result<Vec<String>, StoreError> {
        query::primary_key(&self.pool, keyspace, table).await
    }

    async fn get_row(
        &self,
        keyspace: &str,
        table: &str,
        key: &RowKey,
    ) -> Result<Option<Row>, StoreError> {
        query::point_lookup(&self.pool, keyspace, table, key).await
    }
}
