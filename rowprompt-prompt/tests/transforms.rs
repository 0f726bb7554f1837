use std::sync::{Arc, Mutex};

use rowprompt_core::{Row, Value};
use rowprompt_prompt::{FieldSpec, RowTransform, RowTransformer};
use serde_json::json;

fn person() -> Row {
    serde_json::from_value(json!({
        "city": "milan",
        "name": "  Alba ",
        "age": 11,
        "nickname": null
    }))
    .expect("row")
}

#[test]
fn case_transforms_fold_text_columns() {
    let row = person();
    assert_eq!(RowTransform::upper("city").apply(&row), json!("MILAN"));
    assert_eq!(RowTransform::lower("name").apply(&row), json!("  alba "));
    assert_eq!(RowTransform::trim("name").apply(&row), json!("Alba"));
}

#[test]
fn text_transforms_on_missing_or_null_columns_yield_null() {
    let row = person();
    assert_eq!(RowTransform::upper("nickname").apply(&row), Value::Null);
    assert_eq!(RowTransform::upper("unknown").apply(&row), Value::Null);
}

#[test]
fn concat_joins_columns_and_is_missing_when_any_part_is() {
    let row = person();
    let t = RowTransform::concat(["city", "age"], "/");
    assert_eq!(t.apply(&row), json!("milan/11"));
    assert_eq!(
        RowTransform::concat(["city", "nickname", "age"], "/").apply(&row),
        Value::Null
    );
}

#[test]
fn format_renders_row_columns() {
    let row = person();
    let t = RowTransform::format("{city}:{age}");
    assert_eq!(t.apply(&row), json!("milan:11"));
    assert_eq!(RowTransform::format("{nickname}").apply(&row), Value::Null);
}

#[test]
fn custom_transform_receives_the_whole_row() {
    let seen: Arc<Mutex<Vec<String>>> = Arc::default();
    let seen_in = Arc::clone(&seen);
    let t = RowTransform::custom(move |row: &Row| {
        seen_in
            .lock()
            .expect("lock")
            .extend(row.keys().cloned());
        json!(row.len())
    });

    assert_eq!(t.apply(&person()), json!(4));
    assert_eq!(
        *seen.lock().expect("lock"),
        vec!["age", "city", "name", "nickname"]
    );
}

struct InitialOf(&'static str);

impl RowTransformer for InitialOf {
    fn apply(&self, row: &Row) -> Value {
        row.get(self.0)
            .and_then(Value::as_str)
            .and_then(|s| s.trim().chars().next())
            .map(|c| Value::String(c.to_string()))
            .unwrap_or(Value::Null)
    }

    fn name(&self) -> &str {
        "initial"
    }
}

#[test]
fn named_transformers_show_up_in_debug_output() {
    let t = RowTransform::custom(InitialOf("name"));
    assert_eq!(t.apply(&person()), json!("A"));
    assert_eq!(format!("{t:?}"), "Custom(\"initial\")");
}

#[test]
fn field_spec_resolve_treats_null_as_missing() {
    let row = person();
    assert_eq!(
        FieldSpec::column("people", "age").resolve(Some(&row)),
        Some(json!(11))
    );
    assert_eq!(FieldSpec::column("people", "nickname").resolve(Some(&row)), None);
    assert_eq!(FieldSpec::column("people", "age").resolve(None), None);
    assert_eq!(
        FieldSpec::transform("people", RowTransform::upper("city")).resolve(Some(&row)),
        Some(json!("MILAN"))
    );
}

#[test]
fn builtin_transforms_serialize_with_kind_tag() {
    let spec = FieldSpec::transform("nicknames", RowTransform::upper("nickname"));
    let value = serde_json::to_value(&spec).expect("serialize");
    assert_eq!(
        value,
        json!({
            "table": "nicknames",
            "transform": { "kind": "upper", "column": "nickname" },
            "accept_missing": false
        })
    );

    let custom = FieldSpec::transform("t", RowTransform::custom(InitialOf("name")));
    assert!(serde_json::to_value(&custom).is_err());
}
