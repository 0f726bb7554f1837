use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use rowprompt_core::{
    default_session, Row, RowKey, RowStore, RowpromptError, Runnable, Session, StreamEvent, Value,
};
use tracing::Instrument;

use crate::template::{display_value, PromptTemplate, DEFAULT_NULL_REPR};
use crate::{FieldSpec, PromptError};

/// A prompt template whose placeholders are filled from rows of a `RowStore`.
///
/// Each mapped placeholder names a table and a column (or a transform over the
/// whole row). On `format`, every referenced table is read once with the key
/// columns taken from the caller's arguments; placeholders that are not mapped
/// are taken from the arguments verbatim.
#[derive(Clone)]
pub struct ReaderPromptTemplate {
    template: PromptTemplate,
    fields: BTreeMap<String, FieldSpec>,
    store: Arc<dyn RowStore>,
    keyspace: String,
    admit_nulls: bool,
    null_repr: String,
}

pub struct ReaderPromptTemplateBuilder {
    template: String,
    fields: BTreeMap<String, FieldSpec>,
    store: Option<Arc<dyn RowStore>>,
    keyspace: Option<String>,
    admit_nulls: bool,
    null_repr: String,
}

impl ReaderPromptTemplate {
    pub fn builder(template: impl Into<String>) -> ReaderPromptTemplateBuilder {
        ReaderPromptTemplateBuilder {
            template: template.into(),
            fields: BTreeMap::new(),
            store: None,
            keyspace: None,
            admit_nulls: false,
            null_repr: DEFAULT_NULL_REPR.to_string(),
        }
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldSpec> {
        &self.fields
    }

    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    pub fn admit_nulls(&self) -> bool {
        self.admit_nulls
    }

    /// Placeholders the caller has to supply directly.
    pub fn input_variables(&self) -> Vec<&str> {
        self.template
            .placeholders()
            .into_iter()
            .filter(|name| !self.fields.contains_key(*name))
            .collect()
    }

    /// Distinct tables read by `format`.
    pub fn tables(&self) -> Vec<&str> {
        let mut tables: Vec<&str> = self.fields.values().map(|f| f.table.as_str()).collect();
        tables.sort_unstable();
        tables.dedup();
        tables
    }

    pub async fn format(&self, args: &HashMap<String, Value>) -> Result<String, PromptError> {
        let span = tracing::debug_span!(
            "reader_prompt_format",
            keyspace = %self.keyspace,
            fields = self.fields.len(),
        );
        self.format_inner(args).instrument(span).await
    }

    async fn format_inner(&self, args: &HashMap<String, Value>) -> Result<String, PromptError> {
        let rows = self.read_rows(args).await?;

        let mut resolved: HashMap<&str, String> = HashMap::with_capacity(self.fields.len());
        for (placeholder, spec) in &self.fields {
            let (key, row) = &rows[spec.table.as_str()];
            let text = match spec.resolve(row.as_ref()) {
                Some(value) => display_value(&value, &self.null_repr),
                None if spec.accept_missing => match &spec.default {
                    Some(default) => display_value(default, &self.null_repr),
                    None => self.null_repr.clone(),
                },
                None if self.admit_nulls => {
                    tracing::warn!(
                        placeholder = %placeholder,
                        table = %spec.table,
                        "admitting null for unresolved placeholder"
                    );
                    self.null_repr.clone()
                }
                None => {
                    return Err(PromptError::UnresolvedField {
                        placeholder: placeholder.clone(),
                        table: spec.table.clone(),
                        key: key.clone(),
                    });
                }
            };
            resolved.insert(placeholder.as_str(), text);
        }

        self.template.render_with(|name| match resolved.get(name) {
            Some(text) => Some(text.clone()),
            None => args
                .get(name)
                .map(|value| display_value(value, &self.null_repr)),
        })
    }

    // One point lookup per distinct table, issued sequentially.
    async fn read_rows(
        &self,
        args: &HashMap<String, Value>,
    ) -> Result<HashMap<&str, (RowKey, Option<Row>)>, PromptError> {
        let mut rows = HashMap::new();
        for (table, explicit_key) in self.table_keys() {
            let key_columns = match explicit_key {
                Some(columns) => columns.clone(),
                None => self.store.primary_key(&self.keyspace, table).await?,
            };

            let mut key = RowKey::new();
            for column in key_columns {
                let value = args.get(&column).cloned().ok_or_else(|| PromptError::MissingRowKey {
                    table: table.to_string(),
                    column: column.clone(),
                })?;
                key.insert(column, value);
            }

            let row = self.store.get_row(&self.keyspace, table, &key).await?;
            tracing::debug!(table = %table, found = row.is_some(), "row lookup");
            rows.insert(table, (key, row));
        }
        Ok(rows)
    }

    // Each table with its key columns; all fields of a table agree on them.
    fn table_keys(&self) -> BTreeMap<&str, Option<&Vec<String>>> {
        let mut tables = BTreeMap::new();
        for spec in self.fields.values() {
            tables
                .entry(spec.table.as_str())
                .or_insert(spec.key_columns.as_ref());
        }
        tables
    }
}

impl fmt::Debug for ReaderPromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderPromptTemplate")
            .field("template", &self.template.template())
            .field("fields", &self.fields)
            .field("keyspace", &self.keyspace)
            .field("admit_nulls", &self.admit_nulls)
            .field("null_repr", &self.null_repr)
            .finish_non_exhaustive()
    }
}

impl ReaderPromptTemplateBuilder {
    pub fn field(mut self, placeholder: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.insert(placeholder.into(), spec);
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (S, FieldSpec)>,
        S: Into<String>,
    {
        self.fields
            .extend(fields.into_iter().map(|(name, spec)| (name.into(), spec)));
        self
    }

    pub fn store(mut self, store: Arc<dyn RowStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn keyspace(mut self, keyspace: impl Into<String>) -> Self {
        self.keyspace = Some(keyspace.into());
        self
    }

    pub fn admit_nulls(mut self, admit_nulls: bool) -> Self {
        self.admit_nulls = admit_nulls;
        self
    }

    pub fn null_repr(mut self, null_repr: impl Into<String>) -> Self {
        self.null_repr = null_repr.into();
        self
    }

    /// Validate the mapping and bind to a store.
    ///
    /// Without an explicit store (or keyspace) the default session registered
    /// through `rowprompt_core::init_default_session` is used.
    pub fn build(self) -> Result<ReaderPromptTemplate, PromptError> {
        let template = PromptTemplate::new(self.template)?;

        for (placeholder, spec) in &self.fields {
            if !template.has_placeholder(placeholder) {
                return Err(PromptError::InvalidMapping(format!(
                    "'{placeholder}' is not a placeholder of the template"
                )));
            }
            spec.validate(placeholder)?;
        }
        check_key_shapes(&self.fields)?;

        let session = match (&self.store, &self.keyspace) {
            (Some(_), Some(_)) => None,
            _ => default_session(),
        };
        let store = match self.store {
            Some(store) => store,
            None => session
                .as_ref()
                .map(Session::store)
                .ok_or(PromptError::NoSession)?,
        };
        let keyspace = self
            .keyspace
            .or_else(|| {
                session
                    .as_ref()
                    .and_then(|s| s.keyspace().map(str::to_string))
            })
            .ok_or(PromptError::MissingKeyspace)?;

        Ok(ReaderPromptTemplate {
            template,
            fields: self.fields,
            store,
            keyspace,
            admit_nulls: self.admit_nulls,
            null_repr: self.null_repr,
        })
    }
}

// A table without explicit key columns is read by primary key, which counts
// as its own shape.
fn check_key_shapes(fields: &BTreeMap<String, FieldSpec>) -> Result<(), PromptError> {
    let mut seen: BTreeMap<&str, Option<&Vec<String>>> = BTreeMap::new();
    for spec in fields.values() {
        let columns = spec.key_columns.as_ref();
        match seen.get(spec.table.as_str()) {
            Some(first) if *first != columns => {
                return Err(PromptError::ConflictingKeyShape {
                    table: spec.table.clone(),
                    first: (*first).cloned(),
                    second: columns.cloned(),
                });
            }
            Some(_) => {}
            None => {
                seen.insert(spec.table.as_str(), columns);
            }
        }
    }
    Ok(())
}

#[async_trait]
impl Runnable<HashMap<String, Value>, String> for ReaderPromptTemplate {
    async fn invoke(&self, input: HashMap<String, Value>) -> Result<String, RowpromptError> {
        Ok(self.format(&input).await?)
    }

    fn stream(
        &self,
        input: HashMap<String, Value>,
    ) -> BoxStream<'_, Result<StreamEvent, RowpromptError>> {
        futures::stream::once(async move {
            self.format(&input)
                .await
                .map(StreamEvent::FinalAnswer)
                .map_err(RowpromptError::from)
        })
        .boxed()
    }
}
