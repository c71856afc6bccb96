use chrono::{TimeZone, Utc};
use formwork_model::{Entity, EntityState, FieldKind, ModelError, Schema, Value};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::{Arc, OnceLock};

fn sample() -> &'static Arc<Schema> {
    static SCHEMA: OnceLock<Arc<Schema>> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        Schema::builder("state_tests.Sample")
            .field("id", FieldKind::Int)
            .field("name", FieldKind::String)
            .field("url", FieldKind::Url)
            .field("flag", FieldKind::Bool)
            .field("entity", "self")
            .field("collection", vec![FieldKind::String])
            .field("entity_collection", vec!["self"])
            .field("date", FieldKind::DateTime)
            .build()
            .unwrap()
    })
}

fn populated() -> Entity {
    let date = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
    let mut e = sample()
        .create([
            ("id", json!(1)),
            ("name", json!("test name")),
            ("url", json!("http://example.com")),
            ("flag", json!(true)),
            ("collection", json!(["a", "b", "c", "d"])),
            ("entity_collection", json!([{"id": 2}, {"id": 3}, {"id": 4}])),
            ("entity", json!({"id": 5, "name": "sample 5"})),
        ])
        .unwrap();
    e.set("date", date).unwrap();
    e
}

// ── Dump & load ──────────────────────────────────────────────────

#[test]
fn dump_and_load_preserve_values() {
    let entity = populated();
    let bytes = entity.dump().unwrap();
    let mut restored = Entity::load(&bytes).unwrap();

    assert_eq!(restored, entity);
    assert!(Arc::ptr_eq(restored.schema(), sample()));
    assert_eq!(restored.changes(), entity.changes());

    restored.set("name", "New name").unwrap();
    assert_eq!(restored.get("name").unwrap(), Value::from("New name"));
}

#[test]
fn persistence_keeps_sub_second_precision() {
    let entity = populated();
    let restored = Entity::load(&entity.dump().unwrap()).unwrap();
    assert_eq!(restored.get("date").unwrap(), entity.get("date").unwrap());
}

#[test]
fn restore_bypasses_adaptation() {
    let state = EntityState {
        schema: "state_tests.Sample".to_string(),
        values: [("id".to_string(), Value::from("not adapted"))].into(),
        changes: Default::default(),
        flex_fields: Default::default(),
    };
    let e = Entity::restore(Arc::clone(sample()), state);
    assert_eq!(e.value("id"), Some(&Value::from("not adapted")));
    assert!(e.changes().is_empty());
}

#[test]
fn state_round_trips_through_serde() {
    let entity = populated();
    let state = entity.state();
    let json = serde_json::to_string(&state).unwrap();
    let back: EntityState = serde_json::from_str(&json).unwrap();
    assert_eq!(back, state);
    assert_eq!(Entity::from_state(back).unwrap(), entity);
}

#[test]
fn unknown_schemas_cannot_be_restored() {
    let state = EntityState {
        schema: "state_tests.Missing".to_string(),
        values: Default::default(),
        changes: Default::default(),
        flex_fields: Default::default(),
    };
    assert!(matches!(
        Entity::from_state(state),
        Err(ModelError::InvalidReference { .. })
    ));
}

#[test]
fn corrupt_dumps_fail() {
    assert!(matches!(
        Entity::load(b"not json"),
        Err(ModelError::Serialization(_))
    ));
}

#[test]
fn flex_fields_survive_persistence() {
    let flex = Schema::builder("state_tests.Flex")
        .flexible()
        .field("id", FieldKind::Int)
        .build()
        .unwrap();
    let e = flex.create([("id", json!(1)), ("extra", json!([1, 2]))]).unwrap();
    let restored = Entity::load(&e.dump().unwrap()).unwrap();
    assert_eq!(restored, e);
    assert_eq!(restored.flex_fields(), e.flex_fields());
}

#[test]
fn non_finite_floats_survive_persistence() {
    let measure = Schema::builder("state_tests.Measure")
        .field("nan", FieldKind::Float)
        .field("up", FieldKind::Float)
        .field("down", FieldKind::Float)
        .build()
        .unwrap();
    let e = measure
        .create([("nan", "NaN"), ("up", "inf"), ("down", "-inf")])
        .unwrap();
    let dumped = e.dump().unwrap();
    let raw: serde_json::Value = serde_json::from_slice(&dumped).unwrap();
    assert_eq!(raw["values"]["nan"], json!({"float": "NaN"}));

    let restored = Entity::load(&dumped).unwrap();
    assert!(matches!(restored.value("nan"), Some(Value::Float(f)) if f.is_nan()));
    assert_eq!(restored.value("up"), Some(&Value::Float(f64::INFINITY)));
    assert_eq!(restored.value("down"), Some(&Value::Float(f64::NEG_INFINITY)));
}

#[test]
fn finite_floats_stay_numbers_in_dumps() {
    let measure = Schema::builder("state_tests.Finite")
        .field("ratio", FieldKind::Float)
        .build()
        .unwrap();
    let e = measure.create([("ratio", 0.25)]).unwrap();
    let raw: serde_json::Value = serde_json::from_slice(&e.dump().unwrap()).unwrap();
    assert_eq!(raw["values"]["ratio"], json!({"float": 0.25}));
    assert_eq!(Entity::load(&e.dump().unwrap()).unwrap(), e);
}
