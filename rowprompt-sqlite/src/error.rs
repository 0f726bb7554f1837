use rowprompt_core::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqliteStoreError {
    #[error("invalid sqlite database url: {0}")]
    InvalidUrl(#[source] sqlx::Error),
    #[error("failed to connect to sqlite: {0}")]
    Connection(#[source] sqlx::Error),
    #[error("sqlite query failed: {0}")]
    Query(#[source] sqlx::Error),
}

impl From<SqliteStoreError> for StoreError {
    fn from(err: SqliteStoreError) -> Self {
        StoreError::Internal(Box::new(err))
    }
}
