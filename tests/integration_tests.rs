use num_bigint::BigInt;
use rdn::{
    parse, parse_with_options, parse_with_reviver, stringify, stringify_with_options,
    stringify_with_replacer, to_value, BinaryFormat, DateFormat, Error, Key, Object,
    ParseOptions, StringifyOptions, Value,
};
use serde::ser::{SerializeSeq, SerializeStruct};
use serde::{Serialize, Serializer};
use std::cell::RefCell;
use std::rc::Rc;

fn from_json(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap()),
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => Value::Array(items.into_iter().map(from_json).collect()),
        serde_json::Value::Object(members) => {
            let mut object = Object::new();
            for (k, v) in members {
                object.insert(k, from_json(v));
            }
            Value::Object(object)
        }
    }
}

fn round_trip(text: &str) -> Value {
    let value = parse(text).unwrap();
    let written = stringify(&value);
    let reparsed = parse(&written)
        .unwrap_or_else(|e| panic!("{:?} rewritten as {:?} failed: {}", text, written, e));
    assert_eq!(reparsed, value, "{:?} rewritten as {:?}", text, written);
    reparsed
}

#[test]
fn test_json_documents_parse_like_json() {
    let docs = [
        r#"{"a": [1, 2.5, -3e2, true, false, null], "b": {"c": "dé\n"}}"#,
        "[]",
        "{}",
        r#""plain""#,
        "0",
        "-0.5",
        "12345678901234567890",
        "1E-7",
        " \t\r\n[ { } , [ ] ]\n",
        r#"{"z": 1, "a": 2, "m": 3}"#,
        r#""\/\b\f\r\t\"\\""#,
    ];
    for doc in docs {
        let expected = from_json(serde_json::from_str(doc).unwrap());
        assert_eq!(parse(doc).unwrap(), expected, "{}", doc);
    }
}

#[test]
fn test_object_order_is_preserved() {
    let value = parse(r#"{"z": 1, "a": 2, "m": 3}"#).unwrap();
    let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
    assert_eq!(keys, ["z", "a", "m"]);
    assert_eq!(stringify(&value), r#"{"z":1,"a":2,"m":3}"#);
}

#[test]
fn test_leading_zero_rejection() {
    for bad in ["01", "01.5", "-01", "00", "[1, 02]"] {
        assert!(parse(bad).unwrap_err().is_syntax(), "{} parsed", bad);
    }
    for good in ["0", "0.5", "0e1", "-0", "10", "0E+2"] {
        assert!(parse(good).is_ok(), "{} rejected", good);
    }
    assert_eq!(parse("01").unwrap_err().offset(), Some(0));
    assert_eq!(parse("-01").unwrap_err().offset(), Some(1));
}

#[test]
fn test_brace_disambiguation() {
    assert_eq!(parse("{}").unwrap(), Value::Object(Object::new()));

    let mut object = Object::new();
    object.insert("a".to_string(), Value::from(1));
    assert_eq!(parse(r#"{"a":1}"#).unwrap(), Value::Object(object));

    assert_eq!(
        parse(r#"{"a"=>1}"#).unwrap(),
        Value::Map(vec![(Value::from("a"), Value::from(1))])
    );
    assert_eq!(
        parse(r#"{"a","b"}"#).unwrap(),
        Value::Set(vec![Value::from("a"), Value::from("b")])
    );
    assert_eq!(parse(r#"{"a"}"#).unwrap(), Value::Set(vec![Value::from("a")]));

    // Whitespace between '=' and '>' splits the arrow
    assert!(parse(r#"{"a" = > 1}"#).is_err());
    // The first separator fixes the kind for the rest
    assert!(parse(r#"{"a": 1, "b" => 2}"#).is_err());
    assert!(parse(r#"{"a" => 1, "b": 2}"#).is_err());
    assert!(parse(r#"{1, 2: 3}"#).is_err());
}

#[test]
fn test_map_keys_of_any_kind() {
    let value = parse(r#"{[1, 2] => "pair", @2024-01-01 => "new year", null => 0}"#).unwrap();
    let entries = value.as_map().unwrap();
    assert_eq!(entries.len(), 3);
    assert!(entries[0].0.is_array());
    assert!(entries[1].0.is_datetime());
    assert!(entries[2].0.is_null());
}

#[test]
fn test_bigint_boundary() {
    assert_eq!(
        parse("999999999999999999n").unwrap(),
        Value::BigInt(BigInt::from(999_999_999_999_999_999i64))
    );
    assert_eq!(
        parse("-123456789012345678901234567890n").unwrap().to_string(),
        "-123456789012345678901234567890n"
    );
    assert!(parse("3.14n").is_err());
    assert!(parse("1e10n").is_err());
    assert!(parse("01n").is_err());
}

#[test]
fn test_fast_path_and_general_numbers_agree() {
    assert_eq!(parse("123456789012345").unwrap(), Value::Number(123_456_789_012_345.0));
    assert_eq!(
        parse("1234567890123456789").unwrap(),
        Value::Number(1_234_567_890_123_456_789.0)
    );
    assert_eq!(parse("-42").unwrap(), Value::Number(-42.0));
}

#[test]
fn test_datetime_literals() {
    use chrono::{Datelike, Timelike};

    let with_millis = parse("@2024-01-15T10:30:00.123Z").unwrap();
    let dt = with_millis.as_datetime().unwrap();
    assert_eq!(dt.timestamp_subsec_millis(), 123);
    assert_eq!((dt.hour(), dt.minute()), (10, 30));

    let date_only = parse("@2024-01-15").unwrap();
    let dt = date_only.as_datetime().unwrap();
    assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 1, 15));
    assert_eq!((dt.hour(), dt.minute(), dt.second()), (0, 0, 0));

    assert_eq!(parse("@1705312200").unwrap(), parse("@1705312200000").unwrap());
    assert_eq!(
        parse("@1705312200").unwrap(),
        parse("@2024-01-15T09:50:00Z").unwrap()
    );

    assert!(parse("@2024-13-01").is_err());
    assert!(parse("@2024-01-15T25:00:00Z").is_err());
    assert!(parse("@2024-01-15T10:30:00").is_err());
}

#[test]
fn test_time_and_duration_literals() {
    let time = parse("@09:05:30.250").unwrap();
    assert_eq!(time.to_string(), "@09:05:30.250");
    assert!(parse("@24:00:00").is_err());
    assert!(parse("@10:60:00").is_err());

    let duration = parse("@PT1H30M").unwrap();
    assert_eq!(duration.to_string(), "@PT1H30M");
    assert!(parse("@P").is_err());

    // Week designators are outside the duration alphabet
    let err = parse("@P2W").unwrap_err();
    assert!(err.is_syntax());
    assert_eq!(err.offset(), Some(3));
}

#[test]
fn test_binary_round_trip() {
    let value = parse(r#"x"48656C6C6F""#).unwrap();
    assert_eq!(value.as_binary(), Some(&[72u8, 101, 108, 108, 111][..]));
    assert_eq!(stringify(&value), r#"b"SGVsbG8=""#);

    let hex = StringifyOptions::new().with_binary_format(BinaryFormat::Hex);
    assert_eq!(stringify_with_options(&value, &hex), r#"x"48656C6C6F""#);

    assert_eq!(parse(r#"b"""#).unwrap(), Value::Binary(vec![]));
    assert!(parse(r#"b"SGVsbG8""#).is_err());
    assert!(parse(r#"b"SGVs*G8=""#).is_err());
    assert!(parse(r#"b"SGVsbG9=""#).is_err());
    assert!(parse(r#"x"4G""#).is_err());
    assert!(parse(r#"x"ABC"#).is_err());
}

#[test]
fn test_idempotent_round_trip() {
    let docs = [
        r#"{"a": 1, "b": [true, false, null], "c": "text"}"#,
        "[NaN, Infinity, -Infinity, -0, 1e300, 1.5e-10]",
        "[123456789012345678901234567890n, -1n, 0n]",
        "[@2024-01-15T10:30:00.123Z, @1705312200, @12:00:00, @P3D]",
        r"[/a\/b/gimsuy, //, /\d+/v]",
        r#"(b"", x"00FF", b"AQID")"#,
        r#"Map{(1, 2) => {"nested" => Set{}}, "k" => Map{}}"#,
        r#"{"empty": [Map{}, Set{}, {}, (), []]}"#,
        r#""\u0000\u001f😀""#,
        r#"{"a", "a", "a"}"#,
    ];
    for doc in docs {
        round_trip(doc);
    }
}

#[test]
fn test_strip_collection_keywords() {
    let value = parse(r#"Map{1 => Set{2}}"#).unwrap();
    let options = StringifyOptions::new().with_strip_collection_keywords(true);
    let text = stringify_with_options(&value, &options);
    assert_eq!(text, "{1=>{2}}");
    assert_eq!(parse(&text).unwrap(), value);
}

#[test]
fn test_unix_millis_date_format() {
    let value = parse("@2024-01-15T10:30:00.000Z").unwrap();
    let options = StringifyOptions::new().with_date_format(DateFormat::UnixMillis);
    let text = stringify_with_options(&value, &options);
    assert_eq!(text, "@1705314600000");
    assert_eq!(parse(&text).unwrap(), value);
}

#[test]
fn test_error_positions() {
    let err = parse("[1] x").unwrap_err();
    assert!(err.is_syntax());
    assert_eq!(err.offset(), Some(4));

    let err = parse("{\n  \"a\": tru\n}").unwrap_err();
    match err {
        Error::Syntax { line, column, .. } => assert_eq!((line, column), (2, 8)),
        other => panic!("expected syntax error, got {:?}", other),
    }

    for bad in ["", "   ", "[1,]", "[1 2]", "{\"a\" 1}", "undefined", "'a'", "\"open"] {
        assert!(parse(bad).unwrap_err().is_syntax(), "{:?} parsed", bad);
    }
}

#[test]
fn test_limits_are_not_syntax_errors() {
    let deep = format!("{}{}", "[".repeat(300), "]".repeat(300));
    let err = parse(&deep).unwrap_err();
    assert!(err.is_limit());
    assert!(!err.is_syntax());

    let options = ParseOptions::new().with_max_depth(3);
    assert!(parse_with_options("[({})]", &options).is_ok());
    assert!(matches!(
        parse_with_options("[[[[1]]]]", &options),
        Err(Error::DepthLimitExceeded { limit: 3, .. })
    ));

    let options = ParseOptions::new().with_max_binary_size(4);
    assert!(parse_with_options(r#"x"00112233""#, &options).is_ok());
    assert!(matches!(
        parse_with_options(r#"x"0011223344""#, &options),
        Err(Error::BinaryLimitExceeded { limit: 4, size: 5, .. })
    ));
}

#[test]
fn test_failed_parse_does_not_affect_next_parse() {
    assert!(parse("[1, [2, {\"a\": ").is_err());
    assert_eq!(parse("[3]").unwrap(), Value::Array(vec![Value::from(3)]));
}

#[test]
fn test_reviver_runs_bottom_up() {
    let mut seen = Vec::new();
    let value = parse_with_reviver(r#"{"a": [1, 2], "b": Map{"k" => 3}}"#, |key, value| {
        let label = match key {
            Key::Root => "root".to_string(),
            Key::Index(i) => format!("[{}]", i),
            Key::Field(name) => name.to_string(),
            Key::Entry(k) => format!("=>{}", k),
        };
        seen.push(label);
        Ok(Some(value))
    })
    .unwrap()
    .unwrap();

    assert_eq!(seen, ["[0]", "[1]", "a", "=>\"k\"", "b", "root"]);
    assert!(value.is_object());
}

#[test]
fn test_reviver_splices_sequences() {
    let value = parse_with_reviver("(1, 2, 3)", |_, value| {
        Ok(if value == Value::from(2) { None } else { Some(value) })
    })
    .unwrap()
    .unwrap();
    assert_eq!(stringify(&value), "(1,3)");
}

#[test]
fn test_replacer_runs_top_down() {
    let value = parse(r#"{"when": @2024-01-15, "list": [1, 2]}"#).unwrap();
    let text = stringify_with_replacer(&value, &StringifyOptions::default(), |key, value| {
        Ok(Some(match (key, value) {
            (_, Value::DateTime(dt)) => Value::Number(dt.timestamp() as f64),
            (Key::Field("list"), _) => Value::Set(vec![Value::from(9)]),
            (_, other) => other.clone(),
        }))
    })
    .unwrap();
    assert_eq!(text.as_deref(), Some(r#"{"when":1705276800,"list":Set{9}}"#));
}

struct Graph {
    name: &'static str,
    children: RefCell<Vec<Rc<Graph>>>,
}

struct Children<'a>(&'a [Rc<Graph>]);

impl Serialize for Children<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for child in self.0 {
            seq.serialize_element(&**child)?;
        }
        seq.end()
    }
}

impl Serialize for Graph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let children = self.children.borrow();
        let mut state = serializer.serialize_struct("Graph", 2)?;
        state.serialize_field("name", self.name)?;
        state.serialize_field("children", &Children(&children))?;
        state.end()
    }
}

#[test]
fn test_cycle_through_array_is_detected() {
    let root = Rc::new(Graph {
        name: "root",
        children: RefCell::new(vec![]),
    });
    let child = Rc::new(Graph {
        name: "child",
        children: RefCell::new(vec![Rc::clone(&root)]),
    });
    root.children.borrow_mut().push(Rc::clone(&child));

    let err = to_value(&*root).unwrap_err();
    assert!(err.is_cycle());
    assert!(rdn::to_string(&*root).is_err());

    root.children.borrow_mut().clear();
    let value = to_value(&*root).unwrap();
    assert_eq!(stringify(&value), r#"{"name":"root","children":[]}"#);
}
