mod config;
mod error;
mod field;
mod in_memory;
mod reader;
mod template;

pub use config::ReaderPromptConfig;
pub use error::PromptError;
pub use field::{FieldSource, FieldSpec, RowTransform, RowTransformer};
pub use in_memory::InMemoryRowStore;
pub use reader::{ReaderPromptTemplate, ReaderPromptTemplateBuilder};
pub use template::{display_value, PromptTemplate, DEFAULT_NULL_REPR};
