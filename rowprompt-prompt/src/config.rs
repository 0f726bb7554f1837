use std::collections::BTreeMap;
use std::sync::Arc;

use rowprompt_core::RowStore;
use serde::{Deserialize, Serialize};

use crate::reader::{ReaderPromptTemplate, ReaderPromptTemplateBuilder};
use crate::{FieldSpec, PromptError};

/// Declarative form of a [`ReaderPromptTemplate`], loadable from JSON or YAML.
///
/// ```json
/// {
///   "template": "r_age={r_age}",
///   "keyspace": "reader_test",
///   "fields": { "r_age": { "table": "people", "column": "age" } }
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReaderPromptConfig {
    pub template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyspace: Option<String>,
    #[serde(default)]
    pub admit_nulls: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub null_repr: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldSpec>,
}

impl ReaderPromptConfig {
    pub fn from_json(input: &str) -> Result<Self, PromptError> {
        serde_json::from_str(input).map_err(|e| PromptError::Config(e.to_string()))
    }

    #[cfg(feature = "yaml")]
    pub fn from_yaml(input: &str) -> Result<Self, PromptError> {
        serde_yaml::from_str(input).map_err(|e| PromptError::Config(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, PromptError> {
        serde_json::to_string_pretty(self).map_err(|e| PromptError::Config(e.to_string()))
    }

    pub fn into_builder(self) -> ReaderPromptTemplateBuilder {
        let mut builder = ReaderPromptTemplate::builder(self.template)
            .fields(self.fields)
            .admit_nulls(self.admit_nulls);
        if let Some(keyspace) = self.keyspace {
            builder = builder.keyspace(keyspace);
        }
        if let Some(null_repr) = self.null_repr {
            builder = builder.null_repr(null_repr);
        }
        builder
    }

    /// Build against `store`, or the default session when `None`.
    pub fn build(self, store: Option<Arc<dyn RowStore>>) -> Result<ReaderPromptTemplate, PromptError> {
        let builder = self.into_builder();
        match store {
            Some(store) => builder.store(store).build(),
            None => builder.build(),
        }
    }
}
