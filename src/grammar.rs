//! RDN Format Reference
//!
//! This module documents the RDN (Rich Data Notation) grammar as implemented
//! by this library. It contains no code.
//!
//! # Overview
//!
//! RDN is a strict superset of JSON. Every JSON document parses to the same
//! tree it would as JSON, using only null, booleans, numbers, strings, arrays
//! and objects. The extensions add literals for values JSON can only encode
//! by convention.
//!
//! Whitespace is exactly space, tab, line feed and carriage return. There are
//! no comments, no trailing commas, no single-quoted strings and no unquoted
//! keys.
//!
//! # Numbers
//!
//! JSON numbers, plus `NaN`, `Infinity` and `-Infinity`. A leading zero is
//! only allowed when it is the whole integer part:
//!
//! ```rust
//! assert!(rdn::parse("0").is_ok());
//! assert!(rdn::parse("0.5").is_ok());
//! assert!(rdn::parse("0e1").is_ok());
//! assert!(rdn::parse("01").is_err());
//! assert!(rdn::parse("-01.5").is_err());
//! assert!(rdn::parse("-Infinity").unwrap().as_f64().unwrap().is_infinite());
//! ```
//!
//! ## BigInt
//!
//! An integer immediately followed by `n`. Fractions and exponents are not
//! allowed:
//!
//! ```rust
//! let big = rdn::parse("999999999999999999n").unwrap();
//! assert_eq!(big.as_bigint().unwrap().to_string(), "999999999999999999");
//!
//! assert!(rdn::parse("3.14n").is_err());
//! assert!(rdn::parse("1e10n").is_err());
//! ```
//!
//! # Strings
//!
//! Double-quoted with the JSON escapes (`\" \\ \/ \b \f \n \r \t \uXXXX`).
//! Raw control characters must be escaped, and `\u` escapes must form a
//! valid scalar value: surrogate pairs combine, a lone surrogate is an error.
//!
//! ```rust
//! assert_eq!(rdn::parse(r#""😀""#).unwrap().as_str(), Some("\u{1F600}"));
//! assert!(rdn::parse(r#""\ud83d""#).is_err());
//! assert!(rdn::parse("\"tab\there\"").is_err());
//! ```
//!
//! # `@` literals
//!
//! | Form                           | Kind        |
//! |--------------------------------|-------------|
//! | `@YYYY-MM-DD`                  | Date at midnight UTC |
//! | `@YYYY-MM-DDTHH:MM:SS[.mmm]Z`  | Date        |
//! | `@` + up to 10 digits          | Date, seconds since the epoch |
//! | `@` + 11 or more digits        | Date, milliseconds since the epoch |
//! | `@HH:MM:SS[.mmm]`              | Time of day |
//! | `@P...`                        | ISO-8601 duration, kept verbatim |
//!
//! ```rust
//! use rdn::parse;
//!
//! let seconds = parse("@1705312200").unwrap();
//! let millis = parse("@1705312200000").unwrap();
//! assert_eq!(seconds, millis);
//!
//! assert_eq!(parse("@2024-01-15").unwrap(), parse("@2024-01-15T00:00:00.000Z").unwrap());
//! assert!(parse("@2024-02-30").is_err());
//!
//! let time = parse("@23:59:59.999").unwrap();
//! assert_eq!(time.as_time_only().unwrap().milliseconds(), 999);
//!
//! let duration = parse("@P1Y2M10DT2H30M").unwrap();
//! assert_eq!(duration.as_duration().unwrap().as_str(), "P1Y2M10DT2H30M");
//! ```
//!
//! # Regular expressions
//!
//! `/source/flags`, with flags drawn from `dgimsuvy`, each at most once. The
//! source is kept as written, escapes included, and may not contain a line
//! break.
//!
//! ```rust
//! let re = rdn::parse(r"/^\d+\/x$/gi").unwrap();
//! let re = re.as_regexp().unwrap();
//! assert_eq!((re.source(), re.flags()), (r"^\d+\/x$", "gi"));
//!
//! assert!(rdn::parse("/a/gg").is_err());
//! ```
//!
//! # Binary
//!
//! `b"..."` holds padded standard base64; `x"..."` holds hex digits of either
//! case. The writer emits base64 unless configured otherwise.
//!
//! ```rust
//! let hex = rdn::parse(r#"x"48656C6C6F""#).unwrap();
//! assert_eq!(hex.as_binary(), Some(&b"Hello"[..]));
//! assert_eq!(rdn::stringify(&hex), r#"b"SGVsbG8=""#);
//!
//! assert!(rdn::parse(r#"b"SGVsbG8""#).is_err());
//! assert!(rdn::parse(r#"x"ABC""#).is_err());
//! ```
//!
//! # Collections
//!
//! ## Tuples
//!
//! `(a, b, ...)`, with `()` as the empty tuple.
//!
//! ## Braces
//!
//! After `{`, an immediate `}` is an empty object. Otherwise the first value
//! is read and the next character decides:
//!
//! - `:` makes an object (the first value must be a string)
//! - `=>` makes a map with keys of any kind
//! - `,` or `}` makes a set
//!
//! ```rust
//! use rdn::{parse, Value};
//!
//! assert!(matches!(parse("{}").unwrap(), Value::Object(o) if o.is_empty()));
//! assert!(parse(r#"{"a": 1}"#).unwrap().is_object());
//! assert!(parse(r#"{"a" => 1}"#).unwrap().is_map());
//! assert!(parse(r#"{"a", "b"}"#).unwrap().is_set());
//! assert!(parse(r#"{"a"}"#).unwrap().is_set());
//!
//! assert!(parse("{1: 2}").is_err());
//! ```
//!
//! `Map{...}` and `Set{...}` name the kind explicitly, which is the only way
//! to write an empty map or set. The writer always uses the keyword for empty
//! collections:
//!
//! ```rust
//! use rdn::{parse, stringify};
//!
//! assert_eq!(stringify(&parse("Map{}").unwrap()), "Map{}");
//! assert_eq!(stringify(&parse("Set{}").unwrap()), "Set{}");
//! assert_eq!(stringify(&parse("{[0, 0] => true}").unwrap()), "Map{[0,0]=>true}");
//! ```
//!
//! Maps and sets keep entries in source order and keep duplicates.
//!
//! # Rejected input
//!
//! ```rust
//! for bad in ["", "[1,]", "{'a': 1}", "{a: 1}", "undefined", "[1] [2]", "\"open"] {
//!     assert!(rdn::parse(bad).unwrap_err().is_syntax(), "{:?} parsed", bad);
//! }
//! ```
