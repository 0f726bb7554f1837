use std::error::Error as StdError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RowpromptError {
    #[error("LLM provider failed: {0}")]
    LlmProvider(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Prompt formatting failed: {0}")]
    Prompt(String),
    #[error("Row store failed: {0}")]
    Store(#[from] StoreError),
    #[error("Serialization/deserialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("{0}")]
    Custom(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unknown table '{keyspace}.{table}'")]
    UnknownTable { keyspace: String, table: String },
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
    #[error("invalid row key: {0}")]
    InvalidKey(String),
    #[error("Store error: {0}")]
    Internal(#[source] Box<dyn StdError + Send + Sync>),
}

impl StoreError {
    pub fn unknown_table(keyspace: impl Into<String>, table: impl Into<String>) -> Self {
        StoreError::UnknownTable {
            keyspace: keyspace.into(),
            table: table.into(),
        }
    }
}
