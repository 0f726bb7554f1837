use rowprompt_core::{Row, RowKey, StoreError, Value};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqlitePool, SqliteRow};
use sqlx::{Column, Row as _, TypeInfo, ValueRef};

use crate::SqliteStoreError;

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// Identifiers are interpolated into SQL, so only plain names are allowed.
pub(crate) fn check_identifier(name: &str) -> Result<(), StoreError> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}

pub(crate) async fn primary_key(
    pool: &SqlitePool,
    keyspace: &str,
    table: &str,
) -> Result<Vec<String>, StoreError> {
    check_identifier(keyspace)?;
    check_identifier(table)?;

    let columns: Vec<(String, i64)> =
        sqlx::query_as("SELECT name, pk FROM pragma_table_info(?1, ?2)")
            .bind(table)
            .bind(keyspace)
            .fetch_all(pool)
            .await
            .map_err(SqliteStoreError::Query)?;

    if columns.is_empty() {
        return Err(StoreError::unknown_table(keyspace, table));
    }

    let mut key: Vec<(String, i64)> = columns.into_iter().filter(|(_, pk)| *pk > 0).collect();
    if key.is_empty() {
        return Err(StoreError::InvalidKey(format!(
            "{keyspace}.{table} has no declared primary key"
        )));
    }
    key.sort_by_key(|(_, position)| *position);
    Ok(key.into_iter().map(|(name, _)| name).collect())
}

pub(crate) async fn point_lookup(
    pool: &SqlitePool,
    keyspace: &str,
    table: &str,
    key: &RowKey,
) -> Result<Option<Row>, StoreError> {
    let key_columns = primary_key(pool, keyspace, table).await?;
    let addresses_primary_key =
        key.len() == key_columns.len() && key_columns.iter().all(|c| key.contains_key(c));
    if !addresses_primary_key {
        return Err(StoreError::InvalidKey(format!(
            "key columns {:?} do not match the primary key {key_columns:?} of {keyspace}.{table}",
            key.keys().collect::<Vec<_>>()
        )));
    }

    let predicates = key
        .keys()
        .map(|column| check_identifier(column).map(|()| format!("\"{column}\" = ?")))
        .collect::<Result<Vec<_>, _>>()?;
    let sql = format!(
        "SELECT * FROM \"{keyspace}\".\"{table}\" WHERE {}",
        predicates.join(" AND ")
    );

    let mut query = sqlx::query(&sql);
    for value in key.values() {
        query = bind_value(query, value)?;
    }

    tracing::debug!(keyspace = %keyspace, table = %table, "sqlite point lookup");
    let row = query
        .fetch_optional(pool)
        .await
        .map_err(|err| {
            let missing_table = matches!(
                &err,
                sqlx::Error::Database(db) if db.message().contains("no such table")
            );
            if missing_table {
                StoreError::unknown_table(keyspace, table)
            } else {
                SqliteStoreError::Query(err).into()
            }
        })?;

    row.as_ref()
        .map(decode_row)
        .transpose()
        .map_err(|err| SqliteStoreError::Query(err).into())
}

fn bind_value<'q>(query: SqliteQuery<'q>, value: &Value) -> Result<SqliteQuery<'q>, StoreError> {
    let query = match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(flag) => query.bind(*flag),
        Value::Number(number) => match number.as_i64() {
            Some(int) => query.bind(int),
            None => query.bind(number.as_f64()),
        },
        Value::String(text) => query.bind(text.clone()),
        other => {
            return Err(StoreError::InvalidKey(format!(
                "unsupported key value {other}"
            )))
        }
    };
    Ok(query)
}

fn decode_row(row: &SqliteRow) -> Result<Row, sqlx::Error> {
    let mut out = Row::new();
    for column in row.columns() {
        let index = column.ordinal();
        let raw = row.try_get_raw(index)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            match raw.type_info().name() {
                "INTEGER" | "BOOLEAN" => Value::from(row.try_get::<i64, _>(index)?),
                "REAL" => serde_json::Number::from_f64(row.try_get::<f64, _>(index)?)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
                "BLOB" => Value::from(row.try_get::<Vec<u8>, _>(index)?),
                _ => Value::from(row.try_get::<String, _>(index)?),
            }
        };
        out.insert(column.name().to_string(), value);
    }
    Ok(out)
}
