use chrono::{TimeZone, Utc};
use formwork_model::{Encoding, FieldKind, FieldSpec, Schema, Value};
use proptest::prelude::*;
use std::sync::{Arc, OnceLock};

fn record() -> &'static Arc<Schema> {
    static SCHEMA: OnceLock<Arc<Schema>> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        Schema::builder("adapt_props.Record")
            .field("count", FieldKind::Int)
            .field("ratio", FieldKind::Float)
            .field("flag", FieldKind::Bool)
            .field("label", FieldKind::String)
            .field("slug", FieldKind::Slug)
            .field("when", FieldKind::DateTime)
            .field("blob", FieldSpec::bytes(Encoding::Base64))
            .field("numbers", vec![FieldKind::Int])
            .build()
            .unwrap()
    })
}

fn idempotent(spec: &FieldSpec, input: Value) -> Result<(), TestCaseError> {
    if let Ok(once) = spec.adapt(input) {
        let twice = spec.adapt(once.clone()).unwrap();
        prop_assert_eq!(twice, once);
    }
    Ok(())
}

proptest! {
    // ── Idempotence ──────────────────────────────────────────────

    #[test]
    fn int_adapt_is_idempotent(i in any::<i64>(), s in "[ -]?[0-9]{0,12} ?") {
        idempotent(&FieldSpec::int(), Value::Int(i))?;
        idempotent(&FieldSpec::int(), Value::from(s))?;
    }

    #[test]
    fn float_adapt_is_idempotent(f in -1.0e300f64..1.0e300, i in any::<i32>()) {
        idempotent(&FieldSpec::float(), Value::Float(f))?;
        idempotent(&FieldSpec::float(), Value::from(i))?;
    }

    #[test]
    fn bool_adapt_is_idempotent(s in "(?i)(yes|no|true|false|on|off|1|0|maybe)") {
        idempotent(&FieldSpec::bool(), Value::from(s))?;
    }

    #[test]
    fn slug_adapt_is_idempotent(s in "\\PC{0,40}") {
        idempotent(&FieldSpec::slug(), Value::from(s))?;
    }

    #[test]
    fn url_adapt_is_idempotent(
        scheme in "[a-zA-Z][a-zA-Z0-9+.-]{0,6}",
        host in "[a-zA-Z0-9.-]{1,20}",
        path in "(/[a-zA-Z0-9]{0,8}){0,3}",
    ) {
        idempotent(&FieldSpec::url(), Value::from(format!("{scheme}://{host}{path}")))?;
    }

    #[test]
    fn bytes_adapt_is_idempotent(raw in proptest::collection::vec(any::<u8>(), 0..64)) {
        for encoding in [Encoding::Raw, Encoding::Hex, Encoding::Base64] {
            let spec = FieldSpec::bytes(encoding);
            idempotent(&spec, Value::Bytes(raw.clone()))?;
            let text = spec.jsonify(&Value::Bytes(raw.clone())).unwrap();
            let text = text.as_str().unwrap().to_string();
            prop_assert_eq!(spec.adapt(text).unwrap(), Value::Bytes(raw.clone()));
        }
    }

    // ── JSON round trip ──────────────────────────────────────────

    #[test]
    fn json_round_trip_preserves_flatten(
        count in any::<i64>(),
        quarters in -4_000_000i64..4_000_000,
        flag in any::<bool>(),
        label in "\\PC{0,24}",
        slug in "[a-zA-Z0-9 ]{0,24}",
        secs in 0i64..4_000_000_000,
        blob in proptest::collection::vec(any::<u8>(), 0..32),
        numbers in proptest::collection::vec(any::<i64>(), 0..8),
    ) {
        let e = record()
            .create([
                ("count", Value::Int(count)),
                ("ratio", Value::Float(quarters as f64 / 4.0)),
                ("flag", Value::Bool(flag)),
                ("label", Value::from(label)),
                ("slug", Value::from(slug)),
                ("when", Value::DateTime(Utc.timestamp_opt(secs, 0).unwrap())),
                ("blob", Value::Bytes(blob)),
                ("numbers", Value::List(numbers.into_iter().map(Value::Int).collect())),
            ])
            .unwrap();
        let back = record().from_json(&e.to_json().unwrap()).unwrap();
        prop_assert_eq!(back.flatten(), e.flatten());
    }
}
