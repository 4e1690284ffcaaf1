//! Fixture-driven acceptance tests.
//!
//! - `fixtures/valid/*.rdn` must parse to the tree described by the sibling
//!   `*.json` file
//! - `fixtures/invalid/*.rdn` must fail with a syntax error
//! - `fixtures/roundtrip/*.rdn` must read back equal after being written
//!
//! Expected trees use plain JSON for JSON kinds. Everything else is an object
//! with a `"$type"` member: `BigInt`, `Date`, `TimeOnly`, `Duration` and
//! `Number` carry a string `"value"`, `RegExp` has `"source"` and `"flags"`,
//! `Binary` has `"hex"`, `Tuple` and `Set` have `"items"`, and `Map` has
//! `"entries"` as `[key, value]` pairs.

use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use rdn::{parse, stringify, Duration, Object, RegExp, TimeOnly, Value};
use serde_json::Value as Json;
use std::fs;
use std::path::{Path, PathBuf};

fn fixtures(category: &str, extension: &str) -> Vec<PathBuf> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(category);
    let mut paths: Vec<PathBuf> = fs::read_dir(&dir)
        .unwrap_or_else(|e| panic!("cannot read {}: {}", dir.display(), e))
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some(extension))
        .collect();
    paths.sort();
    assert!(!paths.is_empty(), "no fixtures in {}", dir.display());
    paths
}

fn string_field<'a>(object: &'a serde_json::Map<String, Json>, name: &str) -> &'a str {
    object
        .get(name)
        .and_then(Json::as_str)
        .unwrap_or_else(|| panic!("missing string field {:?} in {:?}", name, object))
}

fn items_field(object: &serde_json::Map<String, Json>, name: &str) -> Vec<Value> {
    object
        .get(name)
        .and_then(Json::as_array)
        .unwrap_or_else(|| panic!("missing array field {:?} in {:?}", name, object))
        .iter()
        .map(from_tagged)
        .collect()
}

fn decode_hex(hex: &str) -> Vec<u8> {
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).unwrap())
        .collect()
}

fn from_tagged(json: &Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => Value::Number(n.as_f64().unwrap()),
        Json::String(s) => Value::String(s.clone()),
        Json::Array(items) => Value::Array(items.iter().map(from_tagged).collect()),
        Json::Object(object) => match object.get("$type").and_then(Json::as_str) {
            None => {
                let mut members = Object::new();
                for (k, v) in object {
                    members.insert(k.clone(), from_tagged(v));
                }
                Value::Object(members)
            }
            Some("BigInt") => Value::BigInt(string_field(object, "value").parse::<BigInt>().unwrap()),
            Some("Date") => Value::DateTime(
                DateTime::parse_from_rfc3339(string_field(object, "value"))
                    .unwrap()
                    .with_timezone(&Utc),
            ),
            Some("TimeOnly") => {
                Value::TimeOnly(string_field(object, "value").parse::<TimeOnly>().unwrap())
            }
            Some("Duration") => {
                Value::Duration(Duration::new(string_field(object, "value")).unwrap())
            }
            Some("RegExp") => Value::RegExp(
                RegExp::new(string_field(object, "source"), string_field(object, "flags")).unwrap(),
            ),
            Some("Binary") => Value::Binary(decode_hex(string_field(object, "hex"))),
            Some("Number") => Value::Number(match string_field(object, "value") {
                "NaN" => f64::NAN,
                "Infinity" => f64::INFINITY,
                "-Infinity" => f64::NEG_INFINITY,
                other => panic!("unknown special number {:?}", other),
            }),
            Some("Tuple") => Value::Tuple(items_field(object, "items")),
            Some("Set") => Value::Set(items_field(object, "items")),
            Some("Map") => Value::Map(
                items_field(object, "entries")
                    .into_iter()
                    .map(|pair| match pair {
                        Value::Array(kv) if kv.len() == 2 => {
                            let mut kv = kv.into_iter();
                            (kv.next().unwrap(), kv.next().unwrap())
                        }
                        other => panic!("map entry must be a pair, got {:?}", other),
                    })
                    .collect(),
            ),
            Some(other) => panic!("unknown $type {:?}", other),
        },
    }
}

#[test]
fn test_valid_fixtures() {
    for path in fixtures("valid", "rdn") {
        let source = fs::read_to_string(&path).unwrap();
        let expected_path = path.with_extension("json");
        let expected_text = fs::read_to_string(&expected_path)
            .unwrap_or_else(|e| panic!("{}: {}", expected_path.display(), e));
        let expected = from_tagged(&serde_json::from_str(&expected_text).unwrap());

        let actual = parse(&source)
            .unwrap_or_else(|e| panic!("{} failed to parse: {}", path.display(), e));
        assert_eq!(actual, expected, "{}", path.display());
    }
}

#[test]
fn test_invalid_fixtures() {
    for path in fixtures("invalid", "rdn") {
        let source = fs::read_to_string(&path).unwrap();
        match parse(&source) {
            Ok(value) => panic!("{} parsed as {}", path.display(), value),
            Err(err) => {
                assert!(err.is_syntax(), "{}: {}", path.display(), err);
                assert!(err.offset().unwrap() <= source.len(), "{}", path.display());
            }
        }
    }
}

#[test]
fn test_roundtrip_fixtures() {
    for path in fixtures("roundtrip", "rdn") {
        let source = fs::read_to_string(&path).unwrap();
        let first = parse(&source)
            .unwrap_or_else(|e| panic!("{} failed to parse: {}", path.display(), e));
        let written = stringify(&first);
        let second = parse(&written)
            .unwrap_or_else(|e| panic!("{} rewritten as {:?}: {}", path.display(), written, e));
        assert_eq!(second, first, "{}", path.display());
        assert_eq!(stringify(&second), written, "{}", path.display());
    }
}
