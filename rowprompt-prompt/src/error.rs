use thiserror::Error;

use rowprompt_core::{RowKey, RowpromptError, StoreError};

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("no value for placeholder '{placeholder}' in table '{table}' (key {key:?})")]
    UnresolvedField {
        placeholder: String,
        table: String,
        key: RowKey,
    },
    #[error("missing template variable '{0}'")]
    MissingVariable(String),
    #[error("missing key column '{column}' required to read table '{table}'")]
    MissingRowKey { table: String, column: String },
    #[error("invalid template: {0}")]
    InvalidTemplate(String),
    #[error("invalid field mapping: {0}")]
    InvalidMapping(String),
    #[error(
        "table '{table}' is addressed with conflicting key columns {} and {}",
        key_shape(.first),
        key_shape(.second)
    )]
    ConflictingKeyShape {
        table: String,
        /// `None` stands for the table's primary key.
        first: Option<Vec<String>>,
        second: Option<Vec<String>>,
    },
    #[error("no row store given and no default session registered")]
    NoSession,
    #[error("no keyspace given and the default session has none")]
    MissingKeyspace,
    #[error("invalid prompt config: {0}")]
    Config(String),
    #[error("row store error: {0}")]
    Store(#[from] StoreError),
}

fn key_shape(columns: &Option<Vec<String>>) -> String {
    match columns {
        Some(columns) => format!("{columns:?}"),
        None => "<primary key>".to_string(),
    }
}

impl From<PromptError> for RowpromptError {
    fn from(err: PromptError) -> Self {
        match err {
            PromptError::Store(store) => RowpromptError::Store(store),
            PromptError::Config(reason) => RowpromptError::InvalidConfig(reason),
            other => RowpromptError::Prompt(other.to_string()),
        }
    }
}
