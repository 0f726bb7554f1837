//! Prompt templates filled from database rows.
//!
//! ```no_run
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! use rowprompt::prompt::{FieldSpec, InMemoryRowStore, ReaderPromptTemplate, RowTransform};
//!
//! # async fn demo() -> Result<(), rowprompt::prompt::PromptError> {
//! let store = InMemoryRowStore::new();
//! let prompt = ReaderPromptTemplate::builder("{name} from {city_upper}: {question}")
//!     .field("name", FieldSpec::column("people", "name"))
//!     .field("city_upper", FieldSpec::transform("people", RowTransform::upper("city")))
//!     .store(Arc::new(store))
//!     .keyspace("reader_test")
//!     .build()?;
//!
//! let args = HashMap::from([
//!     ("city".to_string(), "milan".into()),
//!     ("name".to_string(), "alba".into()),
//!     ("question".to_string(), "how old am I?".into()),
//! ]);
//! let text = prompt.format(&args).await?;
//! # let _ = text;
//! # Ok(())
//! # }
//! ```

pub use rowprompt_core as core;
pub use rowprompt_prompt as prompt;

#[cfg(feature = "llm")]
pub use rowprompt_llm as llm;

#[cfg(feature = "sqlite")]
pub use rowprompt_sqlite as sqlite;

pub use rowprompt_core::{
    clear_default_session, default_session, init_default_session, Row, RowKey, RowStore,
    RowpromptError, Runnable, RunnableExt, StoreError, Value,
};
pub use rowprompt_prompt::{
    FieldSource, FieldSpec, InMemoryRowStore, PromptError, PromptTemplate, ReaderPromptConfig,
    ReaderPromptTemplate, RowTransform, RowTransformer,
};

#[cfg(feature = "llm")]
pub use rowprompt_llm::{AzureChatClient, LlmRequest, LlmResponse, Message, Role};

#[cfg(feature = "sqlite")]
pub use rowprompt_sqlite::SqliteRowStore;
