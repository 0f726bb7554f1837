use std::collections::HashMap;
use std::sync::Arc;

use rowprompt_core::{Row, Value};
use rowprompt_prompt::{FieldSource, InMemoryRowStore, PromptError, ReaderPromptConfig, RowTransform};
use serde_json::json;

const CONFIG: &str = r#"{
    "template": "{greeting}, {name_upper} from {city}",
    "keyspace": "reader_test",
    "admit_nulls": false,
    "fields": {
        "name_upper": { "table": "people", "transform": { "kind": "upper", "column": "name" } },
        "city": { "table": "people", "column": "city" }
    }
}"#;

#[test]
fn parses_json_config() {
    let config = ReaderPromptConfig::from_json(CONFIG).expect("config");
    assert_eq!(config.keyspace.as_deref(), Some("reader_test"));
    assert!(!config.admit_nulls);
    assert!(config.null_repr.is_none());

    let city = &config.fields["city"];
    assert!(matches!(&city.source, FieldSource::Column(c) if c == "city"));
    assert!(!city.accept_missing);

    let upper = &config.fields["name_upper"];
    assert!(matches!(
        &upper.source,
        FieldSource::Transform(RowTransform::Upper { column }) if column == "name"
    ));
}

#[test]
fn reports_malformed_config() {
    let err = ReaderPromptConfig::from_json(r#"{"fields": {}}"#).expect_err("no template");
    assert!(matches!(err, PromptError::Config(_)));
}

#[test]
fn default_without_accept_missing_is_rejected_at_build() {
    let config = ReaderPromptConfig::from_json(
        r#"{
            "template": "age={age}",
            "keyspace": "reader_test",
            "fields": { "age": { "table": "people", "column": "age", "default": 0 } }
        }"#,
    )
    .expect("config");
    let err = config
        .build(Some(Arc::new(InMemoryRowStore::new())))
        .expect_err("default is never used");
    assert!(matches!(err, PromptError::InvalidMapping(ref reason) if reason.contains("'age'")));
}

#[test]
fn config_survives_json_round_trip() {
    let config = ReaderPromptConfig::from_json(CONFIG).expect("config");
    let again = ReaderPromptConfig::from_json(&config.to_json().expect("to json")).expect("again");
    assert_eq!(again.template, config.template);
    assert_eq!(again.fields.len(), 2);
}

#[tokio::test]
async fn builds_and_formats_from_config() {
    let store = InMemoryRowStore::new();
    store.create_table("reader_test", "people", ["city", "name"]).await;
    let row: Row = serde_json::from_value(json!({"city": "milan", "name": "alba", "age": 11}))
        .expect("row");
    store.insert("reader_test", "people", row).await.expect("insert");

    let prompt = ReaderPromptConfig::from_json(CONFIG)
        .expect("config")
        .build(Some(Arc::new(store)))
        .expect("build");
    assert_eq!(prompt.input_variables(), vec!["greeting"]);

    let args: HashMap<String, Value> = HashMap::from([
        ("greeting".to_string(), json!("Ciao")),
        ("city".to_string(), json!("milan")),
        ("name".to_string(), json!("alba")),
    ]);
    let result = prompt.format(&args).await.expect("format");
    assert_eq!(result, "Ciao, ALBA from milan");
}

#[cfg(feature = "yaml")]
#[test]
fn parses_yaml_config() {
    let yaml = r#"
template: "age={age}"
keyspace: reader_test
admit_nulls: true
null_repr: "n/a"
fields:
  age:
    table: people
    column: age
    accept_missing: true
    default: 0
"#;
    let config = ReaderPromptConfig::from_yaml(yaml).expect("yaml");
    assert!(config.admit_nulls);
    assert_eq!(config.null_repr.as_deref(), Some("n/a"));
    assert_eq!(config.fields["age"].default, Some(json!(0)));
    assert!(config.fields["age"].accept_missing);
}
