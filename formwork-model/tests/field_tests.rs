use chrono::{TimeZone, Utc};
use formwork_model::{Encoding, FieldKind, FieldSpec, ModelError, Schema, Value};
use rust_decimal::Decimal;
use serde_json::json;

fn adapted(spec: &FieldSpec, input: impl Into<Value>) -> Value {
    spec.adapt(input).unwrap()
}

fn rejects(spec: &FieldSpec, input: impl Into<Value>) -> bool {
    matches!(spec.adapt(input), Err(ModelError::Adaptation(_)))
}

// ── Int ──────────────────────────────────────────────────────────

#[test]
fn int_accepts_ints_and_numeric_text() {
    let spec = FieldSpec::int();
    assert_eq!(adapted(&spec, 42), Value::Int(42));
    assert_eq!(adapted(&spec, "42"), Value::Int(42));
    assert_eq!(adapted(&spec, " -7 "), Value::Int(-7));
}

#[test]
fn int_accepts_only_integral_floats() {
    let spec = FieldSpec::int();
    assert_eq!(adapted(&spec, 3.0), Value::Int(3));
    assert!(rejects(&spec, 3.5));
    assert!(rejects(&spec, f64::NAN));
}

#[test]
fn int_accepts_bools() {
    let spec = FieldSpec::int();
    assert_eq!(adapted(&spec, true), Value::Int(1));
    assert_eq!(adapted(&spec, false), Value::Int(0));
}

#[test]
fn int_rejects_garbage() {
    let spec = FieldSpec::int();
    assert!(rejects(&spec, "twelve"));
    assert!(rejects(&spec, vec![1u8, 2]));
}

#[test]
fn adaptation_error_names_value_and_target() {
    let err = FieldSpec::int().adapt("twelve").unwrap_err();
    let message = err.to_string();
    assert!(message.contains("twelve"), "{message}");
    assert!(message.contains("int"), "{message}");
}

// ── Float ────────────────────────────────────────────────────────

#[test]
fn float_accepts_ints_text_and_decimals() {
    let spec = FieldSpec::float();
    assert_eq!(adapted(&spec, 2), Value::Float(2.0));
    assert_eq!(adapted(&spec, "1.5"), Value::Float(1.5));
    assert_eq!(adapted(&spec, Decimal::new(125, 2)), Value::Float(1.25));
    assert!(rejects(&spec, "one and a half"));
}

// ── Bool ─────────────────────────────────────────────────────────

#[test]
fn bool_truthy_inputs() {
    let spec = FieldSpec::bool();
    for input in [
        Value::Bool(true),
        "yes".into(),
        "YES".into(),
        "on".into(),
        "true".into(),
        "1".into(),
        Value::Int(1),
        Value::Float(1.0),
    ] {
        assert_eq!(adapted(&spec, input), Value::Bool(true));
    }
}

#[test]
fn bool_falsy_inputs() {
    let spec = FieldSpec::bool();
    for input in [
        Value::Bool(false),
        "no".into(),
        "OFF".into(),
        "off".into(),
        "FALSE".into(),
        "0".into(),
        Value::Int(0),
    ] {
        assert_eq!(adapted(&spec, input), Value::Bool(false));
    }
}

#[test]
fn bool_rejects_other_numbers_and_text() {
    let spec = FieldSpec::bool();
    assert!(rejects(&spec, 22));
    assert!(rejects(&spec, 2.4));
    assert!(rejects(&spec, "frag"));
}

#[test]
fn null_passes_through_every_kind() {
    for spec in [
        FieldSpec::id(),
        FieldSpec::int(),
        FieldSpec::float(),
        FieldSpec::bool(),
        FieldSpec::string(),
        FieldSpec::email(),
        FieldSpec::url(),
        FieldSpec::datetime(),
        FieldSpec::bytes(Encoding::Hex),
        FieldSpec::collection(FieldSpec::int()),
    ] {
        assert_eq!(adapted(&spec, Value::Null), Value::Null, "{:?}", spec.kind());
        assert_eq!(adapted(&spec, Value::Empty), Value::Empty, "{:?}", spec.kind());
    }
}

// ── Text kinds ───────────────────────────────────────────────────

#[test]
fn string_rejects_non_text_without_fallback() {
    let spec = FieldSpec::string();
    assert_eq!(adapted(&spec, "hello"), Value::from("hello"));
    assert!(rejects(&spec, 5));
}

#[test]
fn slug_table() {
    let spec = FieldSpec::slug();
    for (input, expect) in [
        ("01 HDR test", "01-hdr-test"),
        ("--&*$#(8$jjsdsd77-----test phrase12 123--", "8jjsdsd77-test-phrase12-123"),
        ("1234", "1234"),
        ("abcdEFG", "abcdefg"),
    ] {
        assert_eq!(adapted(&spec, input), Value::from(expect), "{input}");
    }
}

#[test]
fn slug_of_nothing_is_empty_text() {
    let spec = FieldSpec::slug();
    assert_eq!(adapted(&spec, Value::Null), Value::from(""));
    assert_eq!(adapted(&spec, ""), Value::from(""));
}

#[test]
fn url_lowercases_scheme_and_host_only() {
    let spec = FieldSpec::url();
    assert_eq!(
        adapted(&spec, "http://www.google.com/SOME/path"),
        Value::from("http://www.google.com/SOME/path")
    );
    assert_eq!(
        adapted(&spec, "hTTp://www.Google.com"),
        Value::from("http://www.google.com")
    );
}

#[test]
fn url_requires_scheme_and_host() {
    let spec = FieldSpec::url();
    for input in ["http;//www.google.com", "http:/www.google.com", "http:www.google.com"] {
        assert!(rejects(&spec, input), "{input}");
    }
}

// ── DateTime ─────────────────────────────────────────────────────

#[test]
fn datetime_parses_rfc3339_text() {
    let spec = FieldSpec::datetime();
    let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
    assert_eq!(adapted(&spec, "2024-03-01T12:30:00Z"), Value::DateTime(expected));
    assert_eq!(
        adapted(&spec, "2024-03-01T14:30:00+02:00"),
        Value::DateTime(expected)
    );
    assert_eq!(adapted(&spec, expected), Value::DateTime(expected));
}

#[test]
fn datetime_rejects_other_input() {
    let spec = FieldSpec::datetime();
    assert!(rejects(&spec, "last tuesday"));
    assert!(rejects(&spec, 1_700_000_000));
}

#[test]
fn datetime_jsonify_and_flatten() {
    let spec = FieldSpec::datetime();
    let when = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
    let value = Value::DateTime(when);
    assert_eq!(spec.jsonify(&value).unwrap(), json!("2024-03-01T12:30:00Z"));
    assert_eq!(spec.flatten(&value), value);
}

// ── Bytes ────────────────────────────────────────────────────────

#[test]
fn bytes_round_trip_through_json_text() {
    let raw = vec![0u8, 1, 127, 128, 200, 255];
    for encoding in [Encoding::Raw, Encoding::Hex, Encoding::Base64] {
        let spec = FieldSpec::bytes(encoding);
        let json = spec.jsonify(&Value::Bytes(raw.clone())).unwrap();
        let text = json.as_str().unwrap().to_string();
        assert_eq!(adapted(&spec, text), Value::Bytes(raw.clone()), "{encoding}");
    }
}

#[test]
fn bytes_encodings_render_differently() {
    let raw = Value::Bytes(b"hi".to_vec());
    assert_eq!(FieldSpec::bytes(Encoding::Hex).jsonify(&raw).unwrap(), json!("6869"));
    assert_eq!(FieldSpec::bytes(Encoding::Base64).jsonify(&raw).unwrap(), json!("aGk="));
    assert_eq!(FieldSpec::bytes(Encoding::Raw).jsonify(&raw).unwrap(), json!("hi"));
}

#[test]
fn bytes_reject_wide_code_points_and_bad_encodings() {
    assert!(rejects(&FieldSpec::bytes(Encoding::Raw), "snow ☃"));
    assert!(rejects(&FieldSpec::bytes(Encoding::Hex), "zz"));
    assert!(rejects(&FieldSpec::bytes(Encoding::Base64), "!!!"));
}

#[test]
fn bytes_jsonify_rejects_non_bytes() {
    let spec = FieldSpec::bytes(Encoding::Base64);
    assert!(spec.jsonify(&Value::from("snow ☃")).is_err());
    assert_eq!(spec.jsonify(&Value::Null).unwrap(), serde_json::Value::Null);
}

// ── Collections ──────────────────────────────────────────────────

#[test]
fn collection_adapts_elementwise_in_order() {
    let spec = FieldSpec::collection(FieldSpec::int());
    assert_eq!(
        adapted(&spec, vec![Value::from("3"), Value::Int(1), Value::Float(2.0)]),
        Value::List(vec![Value::Int(3), Value::Int(1), Value::Int(2)])
    );
}

#[test]
fn collection_fails_on_any_bad_element() {
    let spec = FieldSpec::collection(FieldSpec::int());
    assert!(rejects(&spec, vec![Value::Int(1), Value::from("x")]));
}

#[test]
fn collection_rejects_scalars() {
    let spec = FieldSpec::collection(FieldSpec::int());
    assert!(rejects(&spec, 5));
}

#[test]
fn collection_jsonify_maps_inner_kind() {
    let spec = FieldSpec::collection(FieldSpec::bytes(Encoding::Hex));
    let value = Value::List(vec![Value::Bytes(vec![0xab]), Value::Bytes(vec![0x01])]);
    assert_eq!(spec.jsonify(&value).unwrap(), json!(["ab", "01"]));
    assert_eq!(spec.jsonify(&Value::Null).unwrap(), serde_json::Value::Null);
}

// ── Id ───────────────────────────────────────────────────────────

#[test]
fn id_field_does_not_coerce() {
    let spec = FieldSpec::id();
    assert_eq!(spec.kind(), FieldKind::Id);
    assert_eq!(adapted(&spec, "abc"), Value::from("abc"));
    assert_eq!(adapted(&spec, 7), Value::Int(7));
}

// ── Defaults ─────────────────────────────────────────────────────

#[test]
fn literal_defaults_are_adapted_at_declaration() {
    let spec = FieldSpec::int().with_default("5").unwrap();
    assert!(matches!(
        spec.declared_default(),
        formwork_model::DefaultValue::Value(Value::Int(5))
    ));
    assert!(FieldSpec::int().with_default("five").is_err());
}

#[test]
fn factory_defaults_are_adapted_on_read() {
    let schema = Schema::builder("field_tests.Counter")
        .field("count", FieldSpec::int().with_default_fn(|| Value::from("9")))
        .build()
        .unwrap();
    let entity = schema.instantiate();
    assert_eq!(entity.get("count").unwrap(), Value::Int(9));
    assert!(entity.is_empty());
}

#[test]
fn docs_are_kept() {
    let spec = FieldSpec::string().with_doc("display name");
    assert_eq!(spec.doc(), Some("display name"));
}
