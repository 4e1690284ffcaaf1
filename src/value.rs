//! Dynamic value representation for RDN data.
//!
//! This module provides the [`Value`] enum which represents any valid RDN value,
//! together with the small wrapper types for RDN's extended literals.
//!
//! ## Core Types
//!
//! - [`Value`]: a closed sum type over every RDN kind (JSON kinds plus bigint,
//!   date/time, duration, regexp, binary, tuple, map and set)
//! - [`TimeOnly`]: a wall-clock time without a date (`@14:30:00`)
//! - [`Duration`]: an ISO-8601 duration kept verbatim (`@P1Y2M`)
//! - [`RegExp`]: a regular expression source and its flags (`/ab+c/gi`)
//! - [`Key`]: the position of a value inside its parent, passed to reviver and
//!   replacer callbacks
//!
//! ## Usage Patterns
//!
//! ### Creating Values
//!
//! ```rust
//! use rdn::{rdn, Value};
//!
//! let null = Value::Null;
//! let number = Value::from(42);
//! let text = Value::from("hello");
//!
//! let obj = rdn!({
//!     "name": "Alice",
//!     "age": 30
//! });
//! assert!(obj.is_object());
//! ```
//!
//! ### Extracting Values
//!
//! ```rust
//! use rdn::Value;
//! use std::convert::TryFrom;
//!
//! let value = Value::from(42);
//! let num: i64 = i64::try_from(value).unwrap();
//! assert_eq!(num, 42);
//! ```
//!
//! ## Equality
//!
//! `Value` equality is structural, with one deliberate departure from IEEE-754:
//! two `NaN` numbers compare equal, so a document containing `NaN` equals its
//! own re-parse.

use crate::Object;
use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// Newtype struct names that carry extended kinds through serde. The
// `ValueSerializer` recognises them; any other serializer sees a plain newtype.
pub(crate) const BIGINT_MARKER: &str = "$rdn::private::BigInt";
pub(crate) const DATETIME_MARKER: &str = "$rdn::private::DateTime";
pub(crate) const TIME_ONLY_MARKER: &str = "$rdn::private::TimeOnly";
pub(crate) const DURATION_MARKER: &str = "$rdn::private::Duration";
pub(crate) const REGEXP_MARKER: &str = "$rdn::private::RegExp";
pub(crate) const MAP_MARKER: &str = "$rdn::private::Map";
pub(crate) const SET_MARKER: &str = "$rdn::private::Set";

/// Largest integer magnitude an `f64` represents exactly (2^53 - 1).
pub(crate) const MAX_SAFE_INTEGER: u64 = 9_007_199_254_740_991;

/// A dynamically-typed representation of any valid RDN value.
///
/// Containers preserve source order; nothing is sorted or deduplicated. `Set`
/// in particular accepts duplicate members.
///
/// # Examples
///
/// ```rust
/// use rdn::{parse, Value};
///
/// let value = parse("{1, 2}").unwrap();
/// assert_eq!(value, Value::Set(vec![Value::from(1), Value::from(2)]));
/// ```
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    BigInt(BigInt),
    String(String),
    DateTime(DateTime<Utc>),
    TimeOnly(TimeOnly),
    Duration(Duration),
    RegExp(RegExp),
    Binary(Vec<u8>),
    Array(Vec<Value>),
    Tuple(Vec<Value>),
    Object(Object),
    Map(Vec<(Value, Value)>),
    Set(Vec<Value>),
}

/// A time of day without a date or time zone.
///
/// # Examples
///
/// ```rust
/// use rdn::TimeOnly;
///
/// let time = TimeOnly::new(14, 30, 0, 500).unwrap();
/// assert_eq!(time.to_string(), "14:30:00.500");
/// assert!(TimeOnly::new(24, 0, 0, 0).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeOnly {
    hours: u8,
    minutes: u8,
    seconds: u8,
    milliseconds: u16,
}

impl TimeOnly {
    /// Creates a time, rejecting fields outside 0-23 / 0-59 / 0-59 / 0-999.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first out-of-range field.
    pub fn new(hours: u8, minutes: u8, seconds: u8, milliseconds: u16) -> crate::Result<Self> {
        if hours > 23 {
            return Err(crate::Error::custom(format!(
                "hours must be 0-23, got {}",
                hours
            )));
        }
        if minutes > 59 {
            return Err(crate::Error::custom(format!(
                "minutes must be 0-59, got {}",
                minutes
            )));
        }
        if seconds > 59 {
            return Err(crate::Error::custom(format!(
                "seconds must be 0-59, got {}",
                seconds
            )));
        }
        if milliseconds > 999 {
            return Err(crate::Error::custom(format!(
                "milliseconds must be 0-999, got {}",
                milliseconds
            )));
        }
        Ok(TimeOnly {
            hours,
            minutes,
            seconds,
            milliseconds,
        })
    }

    #[must_use]
    pub const fn hours(&self) -> u8 {
        self.hours
    }

    #[must_use]
    pub const fn minutes(&self) -> u8 {
        self.minutes
    }

    #[must_use]
    pub const fn seconds(&self) -> u8 {
        self.seconds
    }

    #[must_use]
    pub const fn milliseconds(&self) -> u16 {
        self.milliseconds
    }
}

/// Formats as `HH:MM:SS`, adding `.mmm` only when milliseconds are non-zero.
impl fmt::Display for TimeOnly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds
        )?;
        if self.milliseconds > 0 {
            write!(f, ".{:03}", self.milliseconds)?;
        }
        Ok(())
    }
}

/// Parses `HH:MM:SS` or `HH:MM:SS.mmm`.
impl FromStr for TimeOnly {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        let bytes = s.as_bytes();
        let invalid = || crate::Error::custom(format!("invalid time of day: {:?}", s));
        if !(bytes.len() == 8 || bytes.len() == 12) || bytes[2] != b':' || bytes[5] != b':' {
            return Err(invalid());
        }
        let field = |range: std::ops::Range<usize>| -> crate::Result<u16> {
            let digits = &s[range];
            if digits.bytes().all(|b| b.is_ascii_digit()) {
                digits.parse::<u16>().map_err(|_| invalid())
            } else {
                Err(invalid())
            }
        };
        let milliseconds = if bytes.len() == 12 {
            if bytes[8] != b'.' {
                return Err(invalid());
            }
            field(9..12)?
        } else {
            0
        };
        TimeOnly::new(
            field(0..2)? as u8,
            field(3..5)? as u8,
            field(6..8)? as u8,
            milliseconds,
        )
    }
}

/// An ISO-8601 duration, stored exactly as written.
///
/// Year and month units are calendar-relative, so the text is never reduced to
/// a fixed length of time.
///
/// # Examples
///
/// ```rust
/// use rdn::Duration;
///
/// let duration = Duration::new("P1Y2M3DT4H5M6S").unwrap();
/// assert_eq!(duration.as_str(), "P1Y2M3DT4H5M6S");
/// assert!(Duration::new("P").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Duration(String);

impl Duration {
    /// Wraps ISO-8601 duration text.
    ///
    /// The text must start with `P`, have at least one more character, and use
    /// only digits and `Y M D T H S .`.
    ///
    /// # Errors
    ///
    /// Returns an error if the text does not have that shape.
    pub fn new(iso: impl Into<String>) -> crate::Result<Self> {
        let iso = iso.into();
        let valid = iso.len() >= 2
            && iso.starts_with('P')
            && iso[1..].bytes().all(is_duration_byte);
        if valid {
            Ok(Duration(iso))
        } else {
            Err(crate::Error::custom(format!(
                "invalid ISO-8601 duration: {:?}",
                iso
            )))
        }
    }

    pub(crate) fn from_raw(iso: &str) -> Self {
        Duration(iso.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[inline]
pub(crate) fn is_duration_byte(b: u8) -> bool {
    matches!(
        b,
        b'0'..=b'9' | b'Y' | b'M' | b'D' | b'T' | b'H' | b'S' | b'.'
    )
}

/// Flags accepted after a regular expression literal.
pub(crate) const REGEXP_FLAGS: &[u8] = b"dgimsuvy";

/// A regular expression: its source text (with its own escaping untouched)
/// and its flags.
///
/// # Examples
///
/// ```rust
/// use rdn::RegExp;
///
/// let re = RegExp::new(r"\d+", "gi").unwrap();
/// assert_eq!(re.source(), r"\d+");
/// assert_eq!(re.to_string(), r"/\d+/gi");
/// assert!(RegExp::new(".", "gg").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RegExp {
    source: String,
    flags: String,
}

impl RegExp {
    /// Creates a regular expression, rejecting unknown or repeated flags.
    ///
    /// The source is stored in literal form: an unescaped `/` becomes `\/`
    /// and line terminators become `\n` and `\r`, so the value always reads
    /// back from its own text.
    ///
    /// ```rust
    /// use rdn::RegExp;
    ///
    /// assert_eq!(RegExp::new("a/b", "").unwrap().to_string(), r"/a\/b/");
    /// assert_eq!(RegExp::new("a\nb", "").unwrap().source(), r"a\nb");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error for a flag outside `dgimsuvy`, a flag given twice, or
    /// a source ending in an unpaired `\`.
    pub fn new(source: impl AsRef<str>, flags: impl Into<String>) -> crate::Result<Self> {
        let flags = flags.into();
        if let Some(msg) = check_regexp_flags(flags.as_bytes()) {
            return Err(crate::Error::custom(msg));
        }
        let source = escape_regexp_source(source.as_ref()).map_err(crate::Error::custom)?;
        Ok(RegExp { source, flags })
    }

    pub(crate) fn from_parts(source: &str, flags: &str) -> Self {
        RegExp {
            source: source.to_string(),
            flags: flags.to_string(),
        }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn flags(&self) -> &str {
        &self.flags
    }
}

impl fmt::Display for RegExp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}

/// Rewrites a pattern into the form it takes between the slashes of a
/// literal. Escape sequences already present are kept as written.
fn escape_regexp_source(source: &str) -> Result<String, String> {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('\n') => out.push_str("\\n"),
                Some('\r') => out.push_str("\\r"),
                Some(escaped) => {
                    out.push('\\');
                    out.push(escaped);
                }
                None => return Err("Regular expression source ends with '\\'".to_string()),
            },
            '/' => out.push_str("\\/"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    Ok(out)
}

/// Returns a message describing the first bad flag, if any.
pub(crate) fn check_regexp_flags(flags: &[u8]) -> Option<String> {
    let mut seen = [false; 8];
    for &flag in flags {
        match REGEXP_FLAGS.iter().position(|&f| f == flag) {
            Some(idx) if seen[idx] => {
                return Some(format!(
                    "Duplicate regular expression flag '{}'",
                    char::from(flag)
                ))
            }
            Some(idx) => seen[idx] = true,
            None => {
                return Some(format!(
                    "Invalid regular expression flag '{}'",
                    char::from(flag)
                ))
            }
        }
    }
    None
}

/// Where a value sits inside its parent.
///
/// Reviver and replacer callbacks receive the key together with the value.
///
/// # Examples
///
/// ```rust
/// use rdn::{parse_with_reviver, Key, Value};
///
/// // Drop every object member named "secret"
/// let value = parse_with_reviver(r#"{"user": "a", "secret": "b"}"#, |key, value| {
///     Ok(if key == Key::Field("secret") { None } else { Some(value) })
/// })
/// .unwrap()
/// .unwrap();
///
/// assert!(value.as_object().unwrap().get("secret").is_none());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Key<'a> {
    /// The document root.
    Root,
    /// A member of an array, tuple or set.
    Index(usize),
    /// A member of an object.
    Field(&'a str),
    /// A map value, identified by its key.
    Entry(&'a Value),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::TimeOnly(a), Value::TimeOnly(b)) => a == b,
            (Value::Duration(a), Value::Duration(b)) => a == b,
            (Value::RegExp(a), Value::RegExp(b)) => a == b,
            (Value::Binary(a), Value::Binary(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// Short name of the variant, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::BigInt(_) => "bigint",
            Value::String(_) => "string",
            Value::DateTime(_) => "datetime",
            Value::TimeOnly(_) => "time",
            Value::Duration(_) => "duration",
            Value::RegExp(_) => "regexp",
            Value::Binary(_) => "binary",
            Value::Array(_) => "array",
            Value::Tuple(_) => "tuple",
            Value::Object(_) => "object",
            Value::Map(_) => "map",
            Value::Set(_) => "set",
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_bigint(&self) -> bool {
        matches!(self, Value::BigInt(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_datetime(&self) -> bool {
        matches!(self, Value::DateTime(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_time_only(&self) -> bool {
        matches!(self, Value::TimeOnly(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_duration(&self) -> bool {
        matches!(self, Value::Duration(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_regexp(&self) -> bool {
        matches!(self, Value::RegExp(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_binary(&self) -> bool {
        matches!(self, Value::Binary(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_tuple(&self) -> bool {
        matches!(self, Value::Tuple(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_set(&self) -> bool {
        matches!(self, Value::Set(_))
    }

    /// If the value is a boolean, returns it. Otherwise returns `None`.
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// If the value is a number, returns it. Otherwise returns `None`.
    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the value as an `i64` if it is a whole number in range.
    ///
    /// Both `Number` and `BigInt` qualify.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rdn::{parse, Value};
    ///
    /// assert_eq!(Value::from(42).as_i64(), Some(42));
    /// assert_eq!(parse("42n").unwrap().as_i64(), Some(42));
    /// assert_eq!(Value::from(42.5).as_i64(), None);
    /// ```
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => number_to_i64(*n),
            Value::BigInt(bi) => i64::try_from(bi).ok(),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_bigint(&self) -> Option<&BigInt> {
        match self {
            Value::BigInt(bi) => Some(bi),
            _ => None,
        }
    }

    /// If the value is a string, returns a reference to it. Otherwise returns `None`.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_datetime(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_time_only(&self) -> Option<&TimeOnly> {
        match self {
            Value::TimeOnly(t) => Some(t),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_duration(&self) -> Option<&Duration> {
        match self {
            Value::Duration(d) => Some(d),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_regexp(&self) -> Option<&RegExp> {
        match self {
            Value::RegExp(re) => Some(re),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            Value::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_tuple(&self) -> Option<&[Value]> {
        match self {
            Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_set(&self) -> Option<&[Value]> {
        match self {
            Value::Set(items) => Some(items),
            _ => None,
        }
    }
}

pub(crate) fn number_to_i64(n: f64) -> Option<i64> {
    if n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 {
        Some(n as i64)
    } else {
        None
    }
}

/// Renders canonical RDN text with default [`StringifyOptions`](crate::StringifyOptions).
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::stringify(self))
    }
}

struct MapEntries<'a>(&'a [(Value, Value)]);

impl Serialize for MapEntries<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeSeq;
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for (key, value) in self.0 {
            seq.serialize_element(&(key, value))?;
        }
        seq.end()
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::BigInt(bi) => serializer.serialize_newtype_struct(BIGINT_MARKER, &bi.to_string()),
            Value::String(s) => serializer.serialize_str(s),
            Value::DateTime(dt) => serializer
                .serialize_newtype_struct(DATETIME_MARKER, &crate::literal::format_iso_datetime(dt)),
            Value::TimeOnly(t) => serializer.serialize_newtype_struct(TIME_ONLY_MARKER, &t.to_string()),
            Value::Duration(d) => serializer.serialize_newtype_struct(DURATION_MARKER, d.as_str()),
            Value::RegExp(re) => {
                serializer.serialize_newtype_struct(REGEXP_MARKER, &(re.source(), re.flags()))
            }
            Value::Binary(bytes) => serializer.serialize_bytes(bytes),
            Value::Array(items) => {
                use serde::ser::SerializeSeq;
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for element in items {
                    seq.serialize_element(element)?;
                }
                seq.end()
            }
            Value::Tuple(items) => {
                use serde::ser::SerializeTuple;
                let mut tuple = serializer.serialize_tuple(items.len())?;
                for element in items {
                    tuple.serialize_element(element)?;
                }
                tuple.end()
            }
            Value::Object(obj) => {
                use serde::ser::SerializeMap;
                let mut map = serializer.serialize_map(Some(obj.len()))?;
                for (k, v) in obj.iter() {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::Map(entries) => serializer.serialize_newtype_struct(MAP_MARKER, &MapEntries(entries)),
            Value::Set(items) => serializer.serialize_newtype_struct(SET_MARKER, items),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any valid RDN value")
            }

            fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E> {
                Ok(Value::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E> {
                Ok(Value::from(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E> {
                Ok(Value::from(value))
            }

            fn visit_i128<E>(self, value: i128) -> Result<Self::Value, E> {
                Ok(Value::from(value))
            }

            fn visit_u128<E>(self, value: u128) -> Result<Self::Value, E> {
                Ok(Value::from(value))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E> {
                Ok(Value::Number(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E> {
                Ok(Value::String(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> Result<Self::Value, E> {
                Ok(Value::String(value))
            }

            fn visit_bytes<E>(self, value: &[u8]) -> Result<Self::Value, E> {
                Ok(Value::Binary(value.to_vec()))
            }

            fn visit_byte_buf<E>(self, value: Vec<u8>) -> Result<Self::Value, E> {
                Ok(Value::Binary(value))
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E> {
                Ok(Value::Null)
            }

            fn visit_none<E>(self) -> Result<Self::Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_newtype_struct<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut vec = Vec::new();
                while let Some(elem) = seq.next_element()? {
                    vec.push(elem);
                }
                Ok(Value::Array(vec))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut entries: Vec<(Value, Value)> = Vec::new();
                while let Some(entry) = map.next_entry()? {
                    entries.push(entry);
                }
                Ok(object_or_map(entries))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

/// An `Object` when every key is a string, otherwise a `Map`.
pub(crate) fn object_or_map(entries: Vec<(Value, Value)>) -> Value {
    if entries.iter().all(|(k, _)| k.is_string()) {
        let object = entries
            .into_iter()
            .filter_map(|(k, v)| match k {
                Value::String(k) => Some((k, v)),
                _ => None,
            })
            .collect();
        Value::Object(object)
    } else {
        Value::Map(entries)
    }
}

// TryFrom implementations for extracting values from Value
impl TryFrom<Value> for i64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        value.as_i64().ok_or_else(|| {
            crate::Error::custom(format!("expected integer, found {}", value.kind()))
        })
    }
}

impl TryFrom<Value> for f64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Number(n) => Ok(n),
            _ => Err(crate::Error::custom(format!(
                "expected number, found {}",
                value.kind()
            ))),
        }
    }
}

impl TryFrom<Value> for bool {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            _ => Err(crate::Error::custom(format!(
                "expected bool, found {}",
                value.kind()
            ))),
        }
    }
}

impl TryFrom<Value> for String {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            _ => Err(crate::Error::custom(format!(
                "expected string, found {}",
                value.kind()
            ))),
        }
    }
}

// From implementations for creating Value from Rust types
impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

macro_rules! from_small_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Number(f64::from(value))
                }
            }
        )*
    };
}

from_small_integer!(i8, i16, i32, u8, u16, u32);

/// Integers beyond ±(2^53 - 1) become `BigInt` so no precision is lost.
impl From<i64> for Value {
    fn from(value: i64) -> Self {
        if value.unsigned_abs() <= MAX_SAFE_INTEGER {
            Value::Number(value as f64)
        } else {
            Value::BigInt(BigInt::from(value))
        }
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        if value <= MAX_SAFE_INTEGER {
            Value::Number(value as f64)
        } else {
            Value::BigInt(BigInt::from(value))
        }
    }
}

impl From<i128> for Value {
    fn from(value: i128) -> Self {
        if value.unsigned_abs() <= u128::from(MAX_SAFE_INTEGER) {
            Value::Number(value as f64)
        } else {
            Value::BigInt(BigInt::from(value))
        }
    }
}

impl From<u128> for Value {
    fn from(value: u128) -> Self {
        if value <= u128::from(MAX_SAFE_INTEGER) {
            Value::Number(value as f64)
        } else {
            Value::BigInt(BigInt::from(value))
        }
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Value::BigInt(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::DateTime(value)
    }
}

impl From<TimeOnly> for Value {
    fn from(value: TimeOnly) -> Self {
        Value::TimeOnly(value)
    }
}

impl From<Duration> for Value {
    fn from(value: Duration) -> Self {
        Value::Duration(value)
    }
}

impl From<RegExp> for Value {
    fn from(value: RegExp) -> Self {
        Value::RegExp(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Binary(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::TryFrom;

    #[test]
    fn test_tryfrom_i64() {
        let value = Value::Number(42.0);
        assert_eq!(i64::try_from(value).unwrap(), 42);

        let value = Value::BigInt(BigInt::from(-7));
        assert_eq!(i64::try_from(value).unwrap(), -7);

        let value = Value::String("test".to_string());
        assert!(i64::try_from(value).is_err());

        let value = Value::Number(0.5);
        assert!(i64::try_from(value).is_err());
    }

    #[test]
    fn test_tryfrom_f64_and_bool() {
        assert_eq!(f64::try_from(Value::Number(3.5)).unwrap(), 3.5);
        assert!(f64::try_from(Value::Null).is_err());
        assert!(bool::try_from(Value::Bool(true)).unwrap());
        assert!(bool::try_from(Value::Number(1.0)).is_err());
    }

    #[test]
    fn test_large_integers_become_bigint() {
        assert_eq!(Value::from(9_007_199_254_740_991i64), Value::Number(9_007_199_254_740_991.0));
        assert!(Value::from(9_007_199_254_740_992i64).is_bigint());
        assert!(Value::from(u64::MAX).is_bigint());
        assert!(Value::from(i64::MIN).is_bigint());
    }

    #[test]
    fn test_nan_equals_nan() {
        assert_eq!(Value::Number(f64::NAN), Value::Number(f64::NAN));
        assert_ne!(Value::Number(f64::NAN), Value::Number(0.0));
        assert_eq!(Value::Number(-0.0), Value::Number(0.0));
    }

    #[test]
    fn test_array_and_tuple_differ() {
        let items = vec![Value::from(1)];
        assert_ne!(Value::Array(items.clone()), Value::Tuple(items));
    }

    #[test]
    fn test_time_only_parse_and_display() {
        let time: TimeOnly = "23:59:59.999".parse().unwrap();
        assert_eq!(time.hours(), 23);
        assert_eq!(time.milliseconds(), 999);
        assert_eq!(time.to_string(), "23:59:59.999");

        let time: TimeOnly = "08:05:00.000".parse().unwrap();
        assert_eq!(time.to_string(), "08:05:00");

        assert!("8:05:00".parse::<TimeOnly>().is_err());
        assert!("08:60:00".parse::<TimeOnly>().is_err());
        assert!("08:05:00.5".parse::<TimeOnly>().is_err());
    }

    #[test]
    fn test_time_only_ranges() {
        assert!(TimeOnly::new(0, 0, 0, 0).is_ok());
        assert!(TimeOnly::new(23, 59, 59, 999).is_ok());
        assert!(TimeOnly::new(12, 60, 0, 0).is_err());
        assert!(TimeOnly::new(12, 30, 60, 0).is_err());
        assert!(TimeOnly::new(12, 30, 0, 1000).is_err());
    }

    #[test]
    fn test_regexp_flags() {
        assert!(RegExp::new(".", "dgimsuvy").is_ok());
        assert!(RegExp::new(".", "x").is_err());
        assert!(RegExp::new(".", "gig").is_err());
    }

    #[test]
    fn test_regexp_source_reads_back() {
        for source in ["a/b", "a\nb", "x\r", r"\/", r"\\/", r"\d+/"] {
            let re = RegExp::new(source, "g").unwrap();
            let back = crate::parse(&re.to_string()).unwrap();
            assert_eq!(back, Value::RegExp(re), "{:?}", source);
        }
        assert_eq!(RegExp::new("a/b", "").unwrap().source(), r"a\/b");
        assert_eq!(RegExp::new(r"a\/b", "").unwrap().source(), r"a\/b");
        assert!(RegExp::new(r"ab\", "").is_err());
    }

    #[test]
    fn test_duration_shape() {
        assert!(Duration::new("PT0S").is_ok());
        assert!(Duration::new("P1Y2M3DT4H5M6.5S").is_ok());
        assert!(Duration::new("P2W").is_err());
        assert!(Duration::new("1D").is_err());
        assert!(Duration::new("P1 D").is_err());
    }

    #[test]
    fn test_accessors() {
        let value = Value::Tuple(vec![Value::from(1), Value::from("a")]);
        assert!(value.is_tuple());
        assert!(value.as_array().is_none());
        assert_eq!(value.as_tuple().map(|t| t.len()), Some(2));
        assert_eq!(value.kind(), "tuple");

        let value = Value::Binary(vec![1, 2]);
        assert_eq!(value.as_binary(), Some(&[1u8, 2][..]));
    }

    #[test]
    fn test_object_or_map() {
        let entries = vec![(Value::from("a"), Value::from(1))];
        assert!(object_or_map(entries).is_object());

        let entries = vec![(Value::from(1), Value::from(1))];
        assert!(object_or_map(entries).is_map());
    }
}
