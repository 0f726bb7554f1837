use std::collections::HashMap;
use std::sync::Arc;

use rowprompt_core::{RowKey, RowStore, StoreError, Value};
use rowprompt_prompt::{FieldSpec, PromptError, ReaderPromptTemplate, RowTransform};
use rowprompt_sqlite::{SqliteRowStore, MAIN_KEYSPACE};
use serde_json::json;

async fn seeded_store() -> SqliteRowStore {
    let store = SqliteRowStore::builder("sqlite::memory:")
        .max_connections(1)
        .build()
        .await
        .expect("sqlite store should build");

    for statement in [
        "CREATE TABLE people (city TEXT, name TEXT, age INTEGER, score REAL, \
         PRIMARY KEY (city, name))",
        "INSERT INTO people (city, name, age, score) VALUES ('milan', 'alba', 11, 0.5)",
        "CREATE TABLE nicknames (city TEXT PRIMARY KEY, nickname TEXT)",
        "INSERT INTO nicknames (city, nickname) VALUES ('milan', 'Taaac')",
        "CREATE TABLE notes (body TEXT)",
    ] {
        sqlx::query(statement)
            .execute(store.pool())
            .await
            .expect("seed statement");
    }
    store
}

fn key(value: Value) -> RowKey {
    serde_json::from_value(value).expect("key")
}

#[tokio::test]
async fn primary_key_follows_declaration_order() {
    let store = seeded_store().await;
    let people = store
        .primary_key(MAIN_KEYSPACE, "people")
        .await
        .expect("pk");
    assert_eq!(people, vec!["city".to_string(), "name".to_string()]);

    let nicknames = store
        .primary_key(MAIN_KEYSPACE, "nicknames")
        .await
        .expect("pk");
    assert_eq!(nicknames, vec!["city".to_string()]);
}

#[tokio::test]
async fn primary_key_errors_for_unknown_or_keyless_tables() {
    let store = seeded_store().await;
    let err = store
        .primary_key(MAIN_KEYSPACE, "ghosts")
        .await
        .expect_err("unknown");
    assert!(matches!(err, StoreError::UnknownTable { .. }));

    let err = store
        .primary_key(MAIN_KEYSPACE, "notes")
        .await
        .expect_err("no primary key");
    assert!(matches!(err, StoreError::InvalidKey(_)));
}

#[tokio::test]
async fn point_lookup_decodes_typed_columns() {
    let store = seeded_store().await;
    let row = store
        .get_row(
            MAIN_KEYSPACE,
            "people",
            &key(json!({"city": "milan", "name": "alba"})),
        )
        .await
        .expect("lookup")
        .expect("row exists");

    assert_eq!(row["city"], json!("milan"));
    assert_eq!(row["age"], json!(11));
    assert_eq!(row["score"], json!(0.5));

    let missing = store
        .get_row(
            MAIN_KEYSPACE,
            "people",
            &key(json!({"city": "milan", "name": "albax"})),
        )
        .await
        .expect("lookup");
    assert!(missing.is_none());
}

#[tokio::test]
async fn rejects_unsafe_identifiers_and_empty_keys() {
    let store = seeded_store().await;
    let err = store
        .get_row(
            MAIN_KEYSPACE,
            "people\"; DROP TABLE people; --",
            &key(json!({"city": "milan"})),
        )
        .await
        .expect_err("bad identifier");
    assert!(matches!(err, StoreError::InvalidIdentifier(_)));

    let err = store
        .get_row(MAIN_KEYSPACE, "people", &RowKey::new())
        .await
        .expect_err("empty key");
    assert!(matches!(err, StoreError::InvalidKey(_)));

    let err = store
        .get_row(MAIN_KEYSPACE, "ghosts", &key(json!({"id": 1})))
        .await
        .expect_err("unknown table");
    assert!(matches!(err, StoreError::UnknownTable { .. }));
}

#[tokio::test]
async fn lookup_requires_exactly_the_primary_key() {
    let store = seeded_store().await;
    let err = store
        .get_row(MAIN_KEYSPACE, "people", &key(json!({"city": "milan"})))
        .await
        .expect_err("partial key");
    assert!(matches!(err, StoreError::InvalidKey(_)));

    let err = store
        .get_row(
            MAIN_KEYSPACE,
            "people",
            &key(json!({"city": "milan", "name": "alba", "age": 11})),
        )
        .await
        .expect_err("non-key column");
    assert!(matches!(err, StoreError::InvalidKey(_)));

    let prompt = ReaderPromptTemplate::builder("{r_age}")
        .field(
            "r_age",
            FieldSpec::column("people", "age").with_key_columns(["city"]),
        )
        .store(Arc::new(store))
        .keyspace(MAIN_KEYSPACE)
        .build()
        .expect("build");
    let args: HashMap<String, Value> = HashMap::from([
        ("city".to_string(), json!("milan")),
        ("name".to_string(), json!("alba")),
    ]);
    let err = prompt.format(&args).await.expect_err("partial key");
    assert!(matches!(err, PromptError::Store(StoreError::InvalidKey(_))));
}

#[tokio::test]
async fn attached_database_is_addressable_as_keyspace() {
    let store = SqliteRowStore::builder("sqlite::memory:")
        .attach("reader_test", ":memory:")
        .build()
        .await
        .expect("build");

    sqlx::query("CREATE TABLE reader_test.people (city TEXT, name TEXT, age INTEGER, PRIMARY KEY (city, name))")
        .execute(store.pool())
        .await
        .expect("create");
    sqlx::query("INSERT INTO reader_test.people VALUES ('milan', 'alba', 11)")
        .execute(store.pool())
        .await
        .expect("insert");

    let row = store
        .get_row(
            "reader_test",
            "people",
            &key(json!({"city": "milan", "name": "alba"})),
        )
        .await
        .expect("lookup")
        .expect("row");
    assert_eq!(row["age"], json!(11));
}

#[tokio::test]
async fn reader_prompt_over_sqlite() {
    let store: Arc<dyn RowStore> = Arc::new(seeded_store().await);
    let prompt = ReaderPromptTemplate::builder(
        "r_age={r_age} r_name={r_name} r_nickname3={r_nickname3} external={external}",
    )
    .field("r_age", FieldSpec::column("people", "age"))
    .field("r_name", FieldSpec::column("people", "name"))
    .field(
        "r_nickname3",
        FieldSpec::transform("nicknames", RowTransform::upper("nickname")),
    )
    .store(Arc::clone(&store))
    .keyspace(MAIN_KEYSPACE)
    .build()
    .expect("build");

    let args: HashMap<String, Value> = HashMap::from([
        ("city".to_string(), json!("milan")),
        ("name".to_string(), json!("alba")),
        ("external".to_string(), json!("external")),
    ]);
    let result = prompt.format(&args).await.expect("format");
    assert_eq!(result, "r_age=11 r_name=alba r_nickname3=TAAAC external=external");

    let miss: HashMap<String, Value> = HashMap::from([
        ("city".to_string(), json!("milanx")),
        ("name".to_string(), json!("albax")),
        ("external".to_string(), json!("external")),
    ]);
    let err = prompt.format(&miss).await.expect_err("strict miss");
    assert!(matches!(err, PromptError::UnresolvedField { .. }));
}
