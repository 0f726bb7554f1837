use std::fmt;
use std::sync::Arc;

use rowprompt_core::{Row, Value};
use serde::{Deserialize, Serialize};

use crate::template::{display_value, PromptTemplate};
use crate::PromptError;

/// Where one placeholder's value comes from.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldSpec {
    pub table: String,
    #[serde(flatten)]
    pub source: FieldSource,
    /// Substitute `default` (or null) instead of failing when the value is missing.
    #[serde(default)]
    pub accept_missing: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Key columns used to address `table`; the store's primary key when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_columns: Option<Vec<String>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    Column(String),
    Transform(RowTransform),
}

impl FieldSpec {
    pub fn column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::with_source(table, FieldSource::Column(column.into()))
    }

    pub fn transform(table: impl Into<String>, transform: RowTransform) -> Self {
        Self::with_source(table, FieldSource::Transform(transform))
    }

    fn with_source(table: impl Into<String>, source: FieldSource) -> Self {
        Self {
            table: table.into(),
            source,
            accept_missing: false,
            default: None,
            key_columns: None,
        }
    }

    pub fn accept_missing(mut self) -> Self {
        self.accept_missing = true;
        self
    }

    /// Accept a missing value and substitute `default` for it.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.accept_missing = true;
        self.default = Some(default.into());
        self
    }

    pub fn with_key_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// The non-null value this field takes from `row`, if there is one.
    pub fn resolve(&self, row: Option<&Row>) -> Option<Value> {
        let row = row?;
        let value = match &self.source {
            FieldSource::Column(column) => row.get(column).cloned()?,
            FieldSource::Transform(transform) => transform.apply(row),
        };
        (!value.is_null()).then_some(value)
    }

    pub(crate) fn validate(&self, placeholder: &str) -> Result<(), PromptError> {
        if self.table.trim().is_empty() {
            return Err(PromptError::InvalidMapping(format!(
                "field '{placeholder}' has an empty table name"
            )));
        }
        if self.default.is_some() && !self.accept_missing {
            return Err(PromptError::InvalidMapping(format!(
                "field '{placeholder}' has a default but does not accept missing values"
            )));
        }
        match &self.source {
            FieldSource::Column(column) if column.trim().is_empty() => Err(
                PromptError::InvalidMapping(format!("field '{placeholder}' has an empty column")),
            ),
            FieldSource::Column(_) => Ok(()),
            FieldSource::Transform(transform) => transform.validate(),
        }
    }
}

/// A single-method hook for transforms the built-in kinds do not cover.
pub trait RowTransformer: Send + Sync {
    fn apply(&self, row: &Row) -> Value;

    fn name(&self) -> &str {
        "custom"
    }
}

impl<F> RowTransformer for F
where
    F: Fn(&Row) -> Value + Send + Sync,
{
    fn apply(&self, row: &Row) -> Value {
        self(row)
    }
}

/// Derives a substitution value from a whole resolved row.
///
/// Every variant except `Custom` is plain data and round-trips through serde.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowTransform {
    Upper {
        column: String,
    },
    Lower {
        column: String,
    },
    Trim {
        column: String,
    },
    Concat {
        columns: Vec<String>,
        #[serde(default)]
        separator: String,
    },
    /// Renders a template whose placeholders are column names of the row.
    Format {
        template: String,
    },
    #[serde(skip)]
    Custom(Arc<dyn RowTransformer>),
}

impl RowTransform {
    pub fn upper(column: impl Into<String>) -> Self {
        RowTransform::Upper {
            column: column.into(),
        }
    }

    pub fn lower(column: impl Into<String>) -> Self {
        RowTransform::Lower {
            column: column.into(),
        }
    }

    pub fn trim(column: impl Into<String>) -> Self {
        RowTransform::Trim {
            column: column.into(),
        }
    }

    pub fn concat<I, S>(columns: I, separator: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RowTransform::Concat {
            columns: columns.into_iter().map(Into::into).collect(),
            separator: separator.into(),
        }
    }

    pub fn format(template: impl Into<String>) -> Self {
        RowTransform::Format {
            template: template.into(),
        }
    }

    pub fn custom<T: RowTransformer + 'static>(transformer: T) -> Self {
        RowTransform::Custom(Arc::new(transformer))
    }

    /// Apply to `row`. A `Null` result means the value is missing.
    pub fn apply(&self, row: &Row) -> Value {
        match self {
            RowTransform::Upper { column } => map_text(row, column, |text| text.to_uppercase()),
            RowTransform::Lower { column } => map_text(row, column, |text| text.to_lowercase()),
            RowTransform::Trim { column } => map_text(row, column, |text| text.trim().to_string()),
            RowTransform::Concat { columns, separator } => columns
                .iter()
                .map(|column| column_text(row, column))
                .collect::<Option<Vec<_>>>()
                .map(|parts| Value::String(parts.join(separator)))
                .unwrap_or(Value::Null),
            RowTransform::Format { template } => PromptTemplate::new(template.as_str())
                .and_then(|template| template.render_with(|name| column_text(row, name)))
                .map(Value::String)
                .unwrap_or(Value::Null),
            RowTransform::Custom(transformer) => transformer.apply(row),
        }
    }

    fn validate(&self) -> Result<(), PromptError> {
        match self {
            RowTransform::Format { template } => PromptTemplate::new(template.as_str()).map(|_| ()),
            RowTransform::Concat { columns, .. } if columns.is_empty() => Err(
                PromptError::InvalidMapping("concat transform needs at least one column".into()),
            ),
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for RowTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowTransform::Upper { column } => f.debug_struct("Upper").field("column", column).finish(),
            RowTransform::Lower { column } => f.debug_struct("Lower").field("column", column).finish(),
            RowTransform::Trim { column } => f.debug_struct("Trim").field("column", column).finish(),
            RowTransform::Concat { columns, separator } => f
                .debug_struct("Concat")
                .field("columns", columns)
                .field("separator", separator)
                .finish(),
            RowTransform::Format { template } => {
                f.debug_struct("Format").field("template", template).finish()
            }
            RowTransform::Custom(transformer) => {
                f.debug_tuple("Custom").field(&transformer.name()).finish()
            }
        }
    }
}

fn column_text(row: &Row, column: &str) -> Option<String> {
    row.get(column)
        .filter(|value| !value.is_null())
        .map(|value| display_value(value, ""))
}

fn map_text(row: &Row, column: &str, f: impl FnOnce(&str) -> String) -> Value {
    column_text(row, column)
        .map(|text| Value::String(f(&text)))
        .unwrap_or(Value::Null)
}
