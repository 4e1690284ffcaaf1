//! # rdn
//!
//! A reader and writer for RDN (Rich Data Notation), a strict superset of JSON.
//!
//! ## What is RDN?
//!
//! Every JSON document is valid RDN and parses to the same tree. On top of
//! JSON, RDN adds literal syntax for the types JSON has to smuggle through
//! strings:
//!
//! | Kind        | Example                          |
//! |-------------|----------------------------------|
//! | BigInt      | `12345678901234567890n`          |
//! | Date        | `@2024-01-15T10:30:00.000Z`, `@2024-01-15`, `@1705314600` |
//! | Time of day | `@10:30:00`                      |
//! | Duration    | `@P1Y2M3DT4H`                    |
//! | RegExp      | `/^[a-z]+$/gi`                   |
//! | Binary      | `b"SGVsbG8="`, `x"48656C6C6F"`   |
//! | Tuple       | `(1, "two", 3)`                  |
//! | Map         | `Map{1 => "one"}`, `{[0, 0] => "origin"}` |
//! | Set         | `Set{1, 2}`, `{"a", "b"}`        |
//! | Non-finite  | `NaN`, `Infinity`, `-Infinity`   |
//!
//! A `{` opens an object, a map or a set depending on the separator after
//! its first value (`:`, `=>`, or `,`/`}`); `{}` is always an empty object.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! rdn = "0.1"
//! serde = { version = "1.0", features = ["derive"] }
//! ```
//!
//! ### Parsing and writing values
//!
//! ```rust
//! use rdn::{parse, stringify, Value};
//!
//! let value = parse(r#"{"id": 7n, "seen": @2024-01-15, "tags": Set{"a", "b"}}"#).unwrap();
//! let object = value.as_object().unwrap();
//! assert!(object.get("id").unwrap().is_bigint());
//! assert!(matches!(object.get("tags"), Some(Value::Set(_))));
//!
//! assert_eq!(
//!     stringify(&value),
//!     r#"{"id":7n,"seen":@2024-01-15T00:00:00.000Z,"tags":Set{"a","b"}}"#
//! );
//! ```
//!
//! ### With serde
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use std::collections::BTreeMap;
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Grid {
//!     origin: (i32, i32),
//!     labels: BTreeMap<u8, String>,
//! }
//!
//! let grid = Grid {
//!     origin: (0, 0),
//!     labels: BTreeMap::from([(1, "one".to_string())]),
//! };
//!
//! let text = rdn::to_string(&grid).unwrap();
//! assert_eq!(text, r#"{"origin":(0,0),"labels":Map{1=>"one"}}"#);
//!
//! let back: Grid = rdn::from_str(&text).unwrap();
//! assert_eq!(back, grid);
//! ```
//!
//! ### Reviving and replacing
//!
//! ```rust
//! use rdn::{parse_with_reviver, Key, Value};
//!
//! // Drop every member named "secret"
//! let value = parse_with_reviver(r#"{"user": "ann", "secret": "hunter2"}"#, |key, value| {
//!     Ok(match key {
//!         Key::Field("secret") => None,
//!         _ => Some(value),
//!     })
//! })
//! .unwrap()
//! .unwrap();
//! assert_eq!(value.to_string(), r#"{"user":"ann"}"#);
//! ```
//!
//! ## Limits
//!
//! [`ParseOptions`] caps nesting depth and decoded binary size. Inputs that
//! exceed them fail with [`Error::DepthLimitExceeded`] or
//! [`Error::BinaryLimitExceeded`], which [`Error::is_limit`] tells apart from
//! malformed input.
//!
//! ## Logging
//!
//! The crate reports through [`tracing`](https://docs.rs/tracing) events and
//! never installs a subscriber.
//!
//! ## Safety Guarantees
//!
//! - No `unsafe` code blocks
//! - Parser state lives on the stack of each call, so concurrent parses on
//!   different threads share nothing
//! - No panics in the public API on any input

pub mod cst;
pub mod de;
pub mod error;
pub mod grammar;
mod literal;
pub mod macros;
pub mod map;
pub mod options;
pub mod ser;
mod table;
pub mod value;

pub use cst::{CstKind, CstNode};
pub use de::Deserializer;
pub use error::{Error, Result};
pub use map::Object;
pub use options::{BinaryFormat, DateFormat, ParseOptions, StringifyOptions};
pub use value::{Duration, Key, RegExp, TimeOnly, Value};

use crate::cst::CstBuilder;
use crate::de::ValueBuilder;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use tracing::trace;

/// Parses RDN text into a [`Value`].
///
/// # Examples
///
/// ```rust
/// use rdn::{parse, Value};
///
/// assert_eq!(parse("[1, 2]").unwrap(), Value::Array(vec![1.into(), 2.into()]));
/// assert!(parse("01").is_err());
/// ```
///
/// # Errors
///
/// Returns [`Error::Syntax`] with the byte offset of the problem for malformed
/// input, or a limit error when the default [`ParseOptions`] are exceeded.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse(s: &str) -> Result<Value> {
    parse_with_options(s, &ParseOptions::default())
}

/// Parses RDN text with custom limits.
///
/// # Examples
///
/// ```rust
/// use rdn::{parse_with_options, ParseOptions};
///
/// let options = ParseOptions::new().with_max_depth(2);
/// assert!(parse_with_options("[[1]]", &options).is_ok());
/// assert!(parse_with_options("[[[1]]]", &options).unwrap_err().is_limit());
/// ```
///
/// # Errors
///
/// Returns a syntax error for malformed input and a limit error when
/// `options` are exceeded.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse_with_options(s: &str, options: &ParseOptions) -> Result<Value> {
    de::parse_with::<ValueBuilder>(s, options)
}

/// Parses RDN text and passes every node through `reviver`, children first.
///
/// The reviver receives the node's position in its parent and the already
/// revived node. Returning `Ok(None)` removes the node; if the root itself is
/// removed the result is `Ok(None)`.
///
/// # Examples
///
/// ```rust
/// use rdn::{parse_with_reviver, Value};
///
/// let doubled = parse_with_reviver("[1, 2]", |_, value| {
///     Ok(Some(match value {
///         Value::Number(n) => Value::Number(n * 2.0),
///         other => other,
///     }))
/// })
/// .unwrap();
/// assert_eq!(doubled.unwrap().to_string(), "[2,4]");
/// ```
///
/// # Errors
///
/// Returns parse errors, or the first error the reviver returns.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse_with_reviver<F>(s: &str, reviver: F) -> Result<Option<Value>>
where
    F: FnMut(Key<'_>, Value) -> Result<Option<Value>>,
{
    parse_with_reviver_and_options(s, &ParseOptions::default(), reviver)
}

/// [`parse_with_reviver`] with custom limits.
///
/// # Errors
///
/// Returns parse errors, or the first error the reviver returns.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse_with_reviver_and_options<F>(
    s: &str,
    options: &ParseOptions,
    mut reviver: F,
) -> Result<Option<Value>>
where
    F: FnMut(Key<'_>, Value) -> Result<Option<Value>>,
{
    let value = parse_with_options(s, options)?;
    de::revive(Key::Root, value, &mut reviver)
}

/// Parses RDN from bytes, which must be UTF-8.
///
/// # Examples
///
/// ```rust
/// let value = rdn::parse_slice(b"Set{1}").unwrap();
/// assert!(value.is_set());
///
/// let err = rdn::parse_slice(b"\"ok\xff\"").unwrap_err();
/// assert_eq!(err.offset(), Some(3));
/// ```
///
/// # Errors
///
/// Returns a syntax error at the first invalid UTF-8 byte, or any error
/// [`parse`] returns.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse_slice(v: &[u8]) -> Result<Value> {
    match std::str::from_utf8(v) {
        Ok(s) => parse(s),
        Err(e) => {
            let valid = e.valid_up_to();
            let prefix = std::str::from_utf8(&v[..valid]).unwrap_or_default();
            Err(Error::syntax(prefix, valid, "Invalid UTF-8 in input"))
        }
    }
}

/// Parses RDN from UTF-16 code units.
///
/// Offsets in errors refer to the UTF-8 re-encoding of the input.
///
/// # Examples
///
/// ```rust
/// let units: Vec<u16> = "[@10:30:00]".encode_utf16().collect();
/// assert!(rdn::parse_utf16(&units).is_ok());
///
/// assert!(rdn::parse_utf16(&[0x22, 0xD800, 0x22]).unwrap_err().is_syntax());
/// ```
///
/// # Errors
///
/// Returns a syntax error at offset 0 if the input has an unpaired surrogate,
/// or any error [`parse`] returns.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse_utf16(v: &[u16]) -> Result<Value> {
    let s = String::from_utf16(v)
        .map_err(|_| Error::syntax("", 0, "Unpaired surrogate in UTF-16 input"))?;
    parse(&s)
}

/// Parses RDN text into a concrete syntax tree.
///
/// # Examples
///
/// ```rust
/// use rdn::{parse_cst, CstKind};
///
/// let cst = parse_cst("{1, 2}").unwrap();
/// assert!(matches!(cst.kind, CstKind::Set { explicit: false, .. }));
/// ```
///
/// # Errors
///
/// Fails exactly where [`parse`] would.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse_cst(s: &str) -> Result<CstNode> {
    parse_cst_with_options(s, &ParseOptions::default())
}

/// [`parse_cst`] with custom limits.
///
/// # Errors
///
/// Fails exactly where [`parse_with_options`] would.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse_cst_with_options(s: &str, options: &ParseOptions) -> Result<CstNode> {
    de::parse_with::<CstBuilder>(s, options)
}

/// Writes a [`Value`] as compact RDN text.
///
/// The writer recurses once per container level and has no depth limit of its
/// own. Trees read by [`parse`] stay within [`ParseOptions::max_depth`]; a tree
/// built by hand thousands of levels deep can exhaust the stack, as dropping it
/// would.
///
/// A [`Value::DateTime`] before year 0000 has no literal form and is written
/// as `@0000-01-01T00:00:00.000Z`.
///
/// # Examples
///
/// ```rust
/// use rdn::{stringify, Value};
///
/// let value = Value::Tuple(vec![Value::from(1), Value::Binary(b"Hi".to_vec())]);
/// assert_eq!(stringify(&value), r#"(1,b"SGk=")"#);
/// ```
#[must_use]
pub fn stringify(value: &Value) -> String {
    stringify_with_options(value, &StringifyOptions::default())
}

/// Writes a [`Value`] with custom output encodings.
///
/// # Examples
///
/// ```rust
/// use rdn::{stringify_with_options, BinaryFormat, StringifyOptions, Value};
///
/// let options = StringifyOptions::new().with_binary_format(BinaryFormat::Hex);
/// assert_eq!(
///     stringify_with_options(&Value::Binary(b"Hi".to_vec()), &options),
///     r#"x"4869""#
/// );
/// ```
#[must_use]
pub fn stringify_with_options(value: &Value, options: &StringifyOptions) -> String {
    ser::write(value, options)
}

/// Writes a [`Value`] after passing every node through `replacer`, parents first.
///
/// The replacer sees each node before its children and may return a
/// different value, which is then written (and its own children replaced).
/// Returning `Ok(None)` omits the node: omitted array and tuple members are
/// written as `null`, other omitted members are dropped, and an omitted root
/// yields `Ok(None)`.
///
/// # Examples
///
/// ```rust
/// use rdn::{parse, stringify_with_replacer, Key, StringifyOptions};
///
/// let value = parse(r#"{"keep": 1, "drop": 2}"#).unwrap();
/// let text = stringify_with_replacer(&value, &StringifyOptions::default(), |key, value| {
///     Ok(match key {
///         Key::Field("drop") => None,
///         _ => Some(value.clone()),
///     })
/// })
/// .unwrap();
/// assert_eq!(text.as_deref(), Some(r#"{"keep":1}"#));
/// ```
///
/// # Errors
///
/// Returns the first error the replacer returns.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn stringify_with_replacer<F>(
    value: &Value,
    options: &StringifyOptions,
    mut replacer: F,
) -> Result<Option<String>>
where
    F: FnMut(Key<'_>, &Value) -> Result<Option<Value>>,
{
    let Some(replaced) = ser::replace(Key::Root, value, &mut replacer)? else {
        trace!("replacer omitted the root value");
        return Ok(None);
    };
    Ok(Some(ser::write(&replaced, options)))
}

/// Converts any `T: Serialize` to a [`Value`].
///
/// # Examples
///
/// ```rust
/// use rdn::{to_value, Value};
///
/// let value = to_value(&(1u8, u64::MAX)).unwrap();
/// assert!(matches!(&value, Value::Tuple(items) if items[1].is_bigint()));
/// ```
///
/// # Errors
///
/// Returns an error if `T`'s `Serialize` impl fails, or [`Error::Cycle`] if
/// the graph revisits a value already being serialized.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_value<T>(value: &T) -> Result<Value>
where
    T: ?Sized + Serialize,
{
    ser::to_value(value)
}

/// Serializes any `T: Serialize` to an RDN string.
///
/// # Examples
///
/// ```rust
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// assert_eq!(rdn::to_string(&Point { x: 1, y: 2 }).unwrap(), r#"{"x":1,"y":2}"#);
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    to_string_with_options(value, &StringifyOptions::default())
}

/// Serializes any `T: Serialize` to an RDN string with custom output encodings.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_with_options<T>(value: &T, options: &StringifyOptions) -> Result<String>
where
    T: ?Sized + Serialize,
{
    Ok(stringify_with_options(&to_value(value)?, options))
}

/// Serializes any `T: Serialize` to a writer as RDN.
///
/// # Examples
///
/// ```rust
/// let mut buffer = Vec::new();
/// rdn::to_writer(&mut buffer, &vec![1, 2]).unwrap();
/// assert_eq!(buffer, b"[1,2]");
/// ```
///
/// # Errors
///
/// Returns an error if serialization fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W, T>(writer: W, value: &T) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    to_writer_with_options(writer, value, &StringifyOptions::default())
}

/// Serializes any `T: Serialize` to a writer with custom output encodings.
///
/// # Errors
///
/// Returns an error if serialization fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer_with_options<W, T>(
    mut writer: W,
    value: &T,
    options: &StringifyOptions,
) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    let rdn_string = to_string_with_options(value, options)?;
    writer
        .write_all(rdn_string.as_bytes())
        .map_err(|e| Error::io(&e.to_string()))?;
    Ok(())
}

/// Deserializes an instance of `T` from a [`Value`].
///
/// # Examples
///
/// ```rust
/// use rdn::{from_value, rdn};
///
/// let pair: (i32, String) = from_value(rdn!((1, "one"))).unwrap();
/// assert_eq!(pair, (1, "one".to_string()));
/// ```
///
/// # Errors
///
/// Returns an error if the value does not match the shape `T` expects.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_value<T>(value: Value) -> Result<T>
where
    T: DeserializeOwned,
{
    T::deserialize(Deserializer::new(value))
}

/// Deserializes an instance of `T` from RDN text.
///
/// Dates, durations and other extended kinds reach `T` as their closest serde
/// type (strings, byte buffers, sequences, maps). Use [`parse`] to keep them
/// as [`Value`] variants.
///
/// # Examples
///
/// ```rust
/// use serde::Deserialize;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let point: Point = rdn::from_str(r#"{"x": 1, "y": 2}"#).unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
///
/// # Errors
///
/// Returns an error if the input is not valid RDN or does not match `T`.
/// Syntax errors include line and column information.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str<T>(s: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    from_value(parse(s)?)
}

/// Deserializes an instance of `T` from UTF-8 bytes of RDN text.
///
/// # Errors
///
/// Returns an error if the bytes are not valid UTF-8, not valid RDN, or do
/// not match `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice<T>(v: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    from_value(parse_slice(v)?)
}

/// Deserializes an instance of `T` from an I/O stream of RDN.
///
/// # Examples
///
/// ```rust
/// use std::io::Cursor;
///
/// let value: rdn::Value = rdn::from_reader(Cursor::new(b"x\"CAFE\"")).unwrap();
/// assert_eq!(value.as_binary(), Some(&[0xCA, 0xFE][..]));
/// ```
///
/// # Errors
///
/// Returns an error if reading fails, the input is not valid RDN, or the data
/// does not match `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R, T>(mut reader: R) -> Result<T>
where
    R: io::Read,
    T: DeserializeOwned,
{
    let mut buffer = Vec::new();
    reader
        .read_to_end(&mut buffer)
        .map_err(|e| Error::io(&e.to_string()))?;
    from_slice(&buffer)
}
