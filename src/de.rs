//! RDN deserialization.
//!
//! This module holds the recursive-descent reader that turns RDN text into a
//! tree, the bottom-up reviver pass, and the serde [`Deserializer`] that maps a
//! [`Value`] onto any `T: Deserialize`.
//!
//! ## Overview
//!
//! - **Single pass**: the first byte of every value selects its literal
//!   routine through the dispatch table; no separate tokenizer runs
//! - **Brace disambiguation**: `{` is read as Object, Map or Set after looking
//!   at one value and the punctuation that follows it
//! - **Stack-local cursor**: each call owns its `Parser`, so a failed parse
//!   leaves nothing behind and concurrent parses on different threads never
//!   share state
//! - **Bounded**: nesting depth and decoded binary size are checked against
//!   [`ParseOptions`]
//!
//! The same `Parser` produces both plain values and CST nodes; what it builds
//! is decided by a `Builder`.
//!
//! ## Usage
//!
//! Most users should use the high-level functions in the crate root:
//!
//! ```rust
//! use rdn::from_str;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Point { x: i32, y: i32 }
//!
//! let point: Point = from_str(r#"{"x": 1, "y": 2}"#).unwrap();
//! assert_eq!(point, Point { x: 1, y: 2 });
//! ```

use crate::literal::{base64_decoded_len, decode_base64, decode_hex, hex_decoded_len};
use crate::table::{classify, Token};
use crate::value::{check_regexp_flags, is_duration_byte, number_to_i64, MAX_SAFE_INTEGER, REGEXP_FLAGS};
use crate::{Duration, Error, Key, Object, ParseOptions, RegExp, Result, TimeOnly, Value};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use num_bigint::BigInt;
use serde::de::IntoDeserializer;
use serde::{de, forward_to_deserialize_any};
use std::borrow::Cow;
use std::marker::PhantomData;
use std::ops::Range;
use tracing::{debug, trace};

/// Assembles parse results into a tree.
///
/// [`ValueBuilder`] produces plain [`Value`]s; the CST builder keeps spans and
/// raw literal text. Spans are byte ranges into the input.
pub(crate) trait Builder {
    type Node;

    /// A scalar literal together with its verbatim source text.
    fn literal(value: Value, raw: &str, span: Range<usize>) -> Self::Node;

    /// Whether `node` came from a string literal (object keys must).
    fn is_string(node: &Self::Node) -> bool;

    fn array(items: Vec<Self::Node>, span: Range<usize>) -> Self::Node;

    fn tuple(items: Vec<Self::Node>, span: Range<usize>) -> Self::Node;

    /// Object members; every key satisfies [`Builder::is_string`].
    fn object(members: Vec<(Self::Node, Self::Node)>, span: Range<usize>) -> Self::Node;

    fn map(entries: Vec<(Self::Node, Self::Node)>, explicit: bool, span: Range<usize>) -> Self::Node;

    fn set(items: Vec<Self::Node>, explicit: bool, span: Range<usize>) -> Self::Node;
}

/// Builds plain [`Value`] trees.
pub(crate) struct ValueBuilder;

impl Builder for ValueBuilder {
    type Node = Value;

    fn literal(value: Value, _raw: &str, _span: Range<usize>) -> Value {
        value
    }

    fn is_string(node: &Value) -> bool {
        node.is_string()
    }

    fn array(items: Vec<Value>, _span: Range<usize>) -> Value {
        Value::Array(items)
    }

    fn tuple(items: Vec<Value>, _span: Range<usize>) -> Value {
        Value::Tuple(items)
    }

    fn object(members: Vec<(Value, Value)>, _span: Range<usize>) -> Value {
        let mut object = Object::with_capacity(members.len());
        for (key, value) in members {
            if let Value::String(key) = key {
                object.insert(key, value);
            }
        }
        Value::Object(object)
    }

    fn map(entries: Vec<(Value, Value)>, _explicit: bool, _span: Range<usize>) -> Value {
        Value::Map(entries)
    }

    fn set(items: Vec<Value>, _explicit: bool, _span: Range<usize>) -> Value {
        Value::Set(items)
    }
}

/// Recursive-descent reader over a single input.
///
/// The cursor lives in this struct and nowhere else.
pub(crate) struct Parser<'a, B> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
    options: ParseOptions,
    builder: PhantomData<B>,
}

impl<'a, B: Builder> Parser<'a, B> {
    pub(crate) fn new(src: &'a str, options: ParseOptions) -> Self {
        Parser {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            depth: 0,
            options,
            builder: PhantomData,
        }
    }

    /// Parses exactly one value surrounded by optional whitespace.
    pub(crate) fn parse_document(&mut self) -> Result<B::Node> {
        let node = self.parse_value()?;
        self.skip_whitespace();
        if self.pos < self.bytes.len() {
            return Err(self.error(self.pos, "Unexpected trailing data"));
        }
        Ok(node)
    }

    fn error(&self, at: usize, msg: &str) -> Error {
        Error::syntax(self.src, at, msg)
    }

    fn unexpected(&self, at: usize) -> Error {
        match self.src.get(at..).and_then(|rest| rest.chars().next()) {
            Some(c) => self.error(at, &format!("Unexpected character '{}'", c)),
            None => self.error(at, "Unexpected end of input"),
        }
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    #[inline]
    fn at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if classify(b) != Token::Whitespace {
                break;
            }
            self.pos += 1;
        }
    }

    fn skip_digits(&mut self) -> bool {
        let start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn expect_byte(&mut self, expected: u8, msg: &str) -> Result<()> {
        if self.peek() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(self.pos, msg))
        }
    }

    fn literal(&self, value: Value, start: usize) -> B::Node {
        B::literal(value, &self.src[start..self.pos], start..self.pos)
    }

    fn enter(&mut self, at: usize) -> Result<()> {
        self.depth += 1;
        if self.depth > self.options.max_depth {
            debug!(offset = at, limit = self.options.max_depth, "RDN nesting limit hit");
            return Err(Error::depth_limit(at, self.options.max_depth));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn parse_value(&mut self) -> Result<B::Node> {
        self.skip_whitespace();
        let start = self.pos;
        let Some(byte) = self.peek() else {
            return Err(self.error(start, "Unexpected end of input"));
        };

        match classify(byte) {
            Token::String => {
                let s = self.parse_string()?;
                Ok(self.literal(Value::String(s.into_owned()), start))
            }
            Token::Number => self.parse_number(start),
            Token::Minus => {
                if self.bytes[start + 1..].starts_with(b"Infinity") {
                    self.pos = start + 9;
                    Ok(self.literal(Value::Number(f64::NEG_INFINITY), start))
                } else {
                    self.pos += 1;
                    self.parse_number(start)
                }
            }
            Token::OpenBrace => self.parse_brace(start),
            Token::OpenBracket => {
                self.enter(start)?;
                self.pos += 1;
                let items = self.parse_elements(b']')?;
                self.leave();
                Ok(B::array(items, start..self.pos))
            }
            Token::OpenParen => {
                self.enter(start)?;
                self.pos += 1;
                let items = self.parse_elements(b')')?;
                self.leave();
                Ok(B::tuple(items, start..self.pos))
            }
            Token::True => self.parse_keyword(start, "true", Value::Bool(true)),
            Token::False => self.parse_keyword(start, "false", Value::Bool(false)),
            Token::Null => self.parse_keyword(start, "null", Value::Null),
            Token::Infinity => self.parse_keyword(start, "Infinity", Value::Number(f64::INFINITY)),
            Token::NaN => self.parse_keyword(start, "NaN", Value::Number(f64::NAN)),
            Token::At => self.parse_at(start),
            Token::Slash => self.parse_regexp(start),
            Token::Base64 | Token::Hex => self.parse_binary(start, byte),
            Token::Map => self.parse_explicit_map(start),
            Token::Set => self.parse_explicit_set(start),
            _ => Err(self.unexpected(start)),
        }
    }

    fn parse_keyword(&mut self, start: usize, word: &str, value: Value) -> Result<B::Node> {
        if self.bytes[start..].starts_with(word.as_bytes()) {
            self.pos = start + word.len();
            Ok(self.literal(value, start))
        } else {
            Err(self.error(start, &format!("Invalid literal, expected '{}'", word)))
        }
    }

    /// Reads an integer, float or bigint. `self.pos` is on the first digit and
    /// `start` on the sign, if any.
    fn parse_number(&mut self, start: usize) -> Result<B::Node> {
        let negative = self.bytes[start] == b'-';
        let int_start = self.pos;
        let mut acc: u64 = 0;
        while let Some(b @ b'0'..=b'9') = self.peek() {
            acc = acc.wrapping_mul(10).wrapping_add(u64::from(b - b'0'));
            self.pos += 1;
        }
        let digits = self.pos - int_start;
        if digits == 0 {
            return Err(self.error(int_start, "Expected digit"));
        }
        if digits > 1 && self.bytes[int_start] == b'0' {
            return Err(self.error(int_start, "Leading zeros are not allowed"));
        }

        if self.peek() == Some(b'n') {
            let bigint = self.src[start..self.pos]
                .parse::<BigInt>()
                .map_err(|_| self.error(start, "Invalid BigInt literal"))?;
            self.pos += 1;
            return Ok(self.literal(Value::BigInt(bigint), start));
        }

        let mut is_float = false;
        if self.peek() == Some(b'.') {
            self.pos += 1;
            if !self.skip_digits() {
                return Err(self.error(self.pos, "Expected digit after decimal point"));
            }
            is_float = true;
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if !self.skip_digits() {
                return Err(self.error(self.pos, "Expected digit in exponent"));
            }
            is_float = true;
        }
        if is_float && self.peek() == Some(b'n') {
            return Err(self.error(
                self.pos,
                "BigInt literals cannot have a fraction or exponent",
            ));
        }

        let n = if !is_float && digits <= 15 {
            let magnitude = acc as f64;
            if negative {
                -magnitude
            } else {
                magnitude
            }
        } else {
            self.src[start..self.pos]
                .parse::<f64>()
                .map_err(|_| self.error(start, "Invalid number"))?
        };
        Ok(self.literal(Value::Number(n), start))
    }

    /// Reads a string literal; `self.pos` is on the opening quote.
    ///
    /// Returns a borrowed slice until the first escape is seen.
    fn parse_string(&mut self) -> Result<Cow<'a, str>> {
        let src = self.src;
        let open = self.pos;
        self.pos += 1;
        let content_start = self.pos;

        loop {
            match self.peek() {
                None => return Err(self.error(open, "Unterminated string")),
                Some(b'"') => {
                    self.pos += 1;
                    return Ok(Cow::Borrowed(&src[content_start..self.pos - 1]));
                }
                Some(b'\\') => break,
                Some(b) if b < 0x20 => {
                    return Err(self.error(self.pos, "Unescaped control character in string"))
                }
                Some(_) => self.pos += 1,
            }
        }

        let mut buf = String::with_capacity(self.pos - content_start + 16);
        buf.push_str(&src[content_start..self.pos]);
        loop {
            match self.peek() {
                None => return Err(self.error(open, "Unterminated string")),
                Some(b'"') => {
                    self.pos += 1;
                    return Ok(Cow::Owned(buf));
                }
                Some(b'\\') => self.parse_escape(&mut buf)?,
                Some(b) if b < 0x20 => {
                    return Err(self.error(self.pos, "Unescaped control character in string"))
                }
                Some(_) => {
                    let run_start = self.pos;
                    while let Some(b) = self.peek() {
                        if b == b'"' || b == b'\\' || b < 0x20 {
                            break;
                        }
                        self.pos += 1;
                    }
                    buf.push_str(&src[run_start..self.pos]);
                }
            }
        }
    }

    fn parse_escape(&mut self, buf: &mut String) -> Result<()> {
        let at = self.pos;
        self.pos += 1;
        let Some(b) = self.peek() else {
            return Err(self.error(at, "Unterminated string"));
        };
        self.pos += 1;
        match b {
            b'"' => buf.push('"'),
            b'\\' => buf.push('\\'),
            b'/' => buf.push('/'),
            b'b' => buf.push('\u{08}'),
            b'f' => buf.push('\u{0C}'),
            b'n' => buf.push('\n'),
            b'r' => buf.push('\r'),
            b't' => buf.push('\t'),
            b'u' => {
                let first = self.parse_hex4(at)?;
                let code = match first {
                    0xD800..=0xDBFF => {
                        if !self.bytes[self.pos..].starts_with(b"\\u") {
                            return Err(self.error(at, "Unpaired surrogate in \\u escape"));
                        }
                        self.pos += 2;
                        let second = self.parse_hex4(at)?;
                        if !(0xDC00..=0xDFFF).contains(&second) {
                            return Err(self.error(at, "Unpaired surrogate in \\u escape"));
                        }
                        0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00)
                    }
                    0xDC00..=0xDFFF => {
                        return Err(self.error(at, "Unpaired surrogate in \\u escape"))
                    }
                    code => code,
                };
                match char::from_u32(code) {
                    Some(c) => buf.push(c),
                    None => return Err(self.error(at, "Invalid \\u escape")),
                }
            }
            _ => return Err(self.error(at, "Invalid escape sequence")),
        }
        Ok(())
    }

    fn parse_hex4(&mut self, escape_start: usize) -> Result<u32> {
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = self
                .peek()
                .and_then(|b| char::from(b).to_digit(16))
                .ok_or_else(|| self.error(escape_start, "Invalid \\u escape"))?;
            code = code << 4 | digit;
            self.pos += 1;
        }
        Ok(code)
    }

    /// Comma-separated values up to `close`; `self.pos` is just past the
    /// opening delimiter.
    fn parse_elements(&mut self, close: u8) -> Result<Vec<B::Node>> {
        let mut items = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some(close) {
            self.pos += 1;
            return Ok(items);
        }
        loop {
            items.push(self.parse_value()?);
            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b) if b == close => {
                    self.pos += 1;
                    return Ok(items);
                }
                Some(_) => {
                    return Err(self.error(
                        self.pos,
                        &format!("Expected ',' or '{}'", char::from(close)),
                    ))
                }
                None => return Err(self.error(self.pos, "Unexpected end of input")),
            }
        }
    }

    fn parse_brace(&mut self, start: usize) -> Result<B::Node> {
        self.enter(start)?;
        self.pos += 1;
        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            self.leave();
            return Ok(B::object(Vec::new(), start..self.pos));
        }

        let first_start = self.pos;
        let first = self.parse_value()?;
        self.skip_whitespace();
        let node = match self.peek() {
            Some(b':') => {
                if !B::is_string(&first) {
                    return Err(self.error(first_start, "Object keys must be strings"));
                }
                self.pos += 1;
                let value = self.parse_value()?;
                let mut members = vec![(first, value)];
                self.parse_object_rest(&mut members)?;
                B::object(members, start..self.pos)
            }
            Some(b'=') if self.at(1) == Some(b'>') => {
                self.pos += 2;
                let value = self.parse_value()?;
                let mut entries = vec![(first, value)];
                self.parse_map_rest(&mut entries)?;
                B::map(entries, false, start..self.pos)
            }
            Some(b',') => {
                self.pos += 1;
                let mut items = vec![first];
                items.extend(self.parse_elements_after_comma()?);
                B::set(items, false, start..self.pos)
            }
            Some(b'}') => {
                self.pos += 1;
                B::set(vec![first], false, start..self.pos)
            }
            Some(_) => {
                return Err(self.error(self.pos, "Expected ':', '=>', ',' or '}' after value"))
            }
            None => return Err(self.error(self.pos, "Unexpected end of input")),
        };
        self.leave();
        Ok(node)
    }

    /// Set members after a comma has been consumed, through the closing `}`.
    fn parse_elements_after_comma(&mut self) -> Result<Vec<B::Node>> {
        let mut items = vec![self.parse_value()?];
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                    items.push(self.parse_value()?);
                }
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(items);
                }
                Some(_) => return Err(self.error(self.pos, "Expected ',' or '}'")),
                None => return Err(self.error(self.pos, "Unexpected end of input")),
            }
        }
    }

    fn parse_object_rest(&mut self, members: &mut Vec<(B::Node, B::Node)>) -> Result<()> {
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(_) => return Err(self.error(self.pos, "Expected ',' or '}'")),
                None => return Err(self.error(self.pos, "Unexpected end of input")),
            }
            self.skip_whitespace();
            if self.peek() != Some(b'"') {
                return Err(match self.peek() {
                    Some(_) => self.error(self.pos, "Object keys must be strings"),
                    None => self.error(self.pos, "Unexpected end of input"),
                });
            }
            let key = self.parse_value()?;
            self.skip_whitespace();
            self.expect_byte(b':', "Expected ':' after object key")?;
            let value = self.parse_value()?;
            members.push((key, value));
        }
    }

    fn parse_map_entry(&mut self) -> Result<(B::Node, B::Node)> {
        let key = self.parse_value()?;
        self.skip_whitespace();
        if !(self.peek() == Some(b'=') && self.at(1) == Some(b'>')) {
            return Err(self.error(self.pos, "Expected '=>' after map key"));
        }
        self.pos += 2;
        let value = self.parse_value()?;
        Ok((key, value))
    }

    fn parse_map_rest(&mut self, entries: &mut Vec<(B::Node, B::Node)>) -> Result<()> {
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                    entries.push(self.parse_map_entry()?);
                }
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(_) => return Err(self.error(self.pos, "Expected ',' or '}'")),
                None => return Err(self.error(self.pos, "Unexpected end of input")),
            }
        }
    }

    fn parse_explicit_map(&mut self, start: usize) -> Result<B::Node> {
        if !self.bytes[start..].starts_with(b"Map{") {
            return Err(self.unexpected(start));
        }
        self.enter(start)?;
        self.pos = start + 4;
        self.skip_whitespace();
        let mut entries = Vec::new();
        if self.peek() == Some(b'}') {
            self.pos += 1;
        } else {
            entries.push(self.parse_map_entry()?);
            self.parse_map_rest(&mut entries)?;
        }
        self.leave();
        Ok(B::map(entries, true, start..self.pos))
    }

    fn parse_explicit_set(&mut self, start: usize) -> Result<B::Node> {
        if !self.bytes[start..].starts_with(b"Set{") {
            return Err(self.unexpected(start));
        }
        self.enter(start)?;
        self.pos = start + 4;
        let items = self.parse_elements(b'}')?;
        self.leave();
        Ok(B::set(items, true, start..self.pos))
    }

    /// Dispatches the body of an `@` literal by its shape.
    fn parse_at(&mut self, start: usize) -> Result<B::Node> {
        let body = start + 1;
        self.pos = body;
        let bytes = self.bytes;
        let rest = &bytes[body..];
        let first = rest.first().copied();
        let value = match first {
            Some(b'P') => Value::Duration(self.parse_duration()?),
            Some(b'0'..=b'9') if rest.get(2) == Some(&b':') => {
                let (hours, minutes, seconds, millis) = self.parse_clock()?;
                let time = TimeOnly::new(hours as u8, minutes as u8, seconds as u8, millis as u16)
                    .map_err(|e| self.error(body, &invalid_field_message(e)))?;
                Value::TimeOnly(time)
            }
            Some(b'0'..=b'9') if rest.get(4) == Some(&b'-') => {
                Value::DateTime(self.parse_date(body)?)
            }
            Some(b'0'..=b'9') => Value::DateTime(self.parse_timestamp(body)?),
            _ => {
                return Err(self.error(
                    body,
                    "Expected a date, time, duration or timestamp after '@'",
                ))
            }
        };
        Ok(self.literal(value, start))
    }

    fn parse_duration(&mut self) -> Result<Duration> {
        let span_start = self.pos;
        self.pos += 1;
        while matches!(self.peek(), Some(b) if is_duration_byte(b)) {
            self.pos += 1;
        }
        if self.pos - span_start < 2 {
            return Err(self.error(span_start, "Empty duration"));
        }
        Ok(Duration::from_raw(&self.src[span_start..self.pos]))
    }

    fn fixed_digits(&mut self, count: usize, field: &str) -> Result<u32> {
        let mut n = 0u32;
        for _ in 0..count {
            match self.peek() {
                Some(b @ b'0'..=b'9') => {
                    n = n * 10 + u32::from(b - b'0');
                    self.pos += 1;
                }
                _ => {
                    return Err(self.error(self.pos, &format!("Expected digit in {}", field)))
                }
            }
        }
        Ok(n)
    }

    /// `HH:MM:SS[.mmm]`
    fn parse_clock(&mut self) -> Result<(u32, u32, u32, u32)> {
        let hours = self.fixed_digits(2, "hours")?;
        self.expect_byte(b':', "Expected ':' after hours")?;
        let minutes = self.fixed_digits(2, "minutes")?;
        self.expect_byte(b':', "Expected ':' after minutes")?;
        let seconds = self.fixed_digits(2, "seconds")?;
        let millis = if self.peek() == Some(b'.') {
            self.pos += 1;
            self.fixed_digits(3, "milliseconds")?
        } else {
            0
        };
        Ok((hours, minutes, seconds, millis))
    }

    /// `YYYY-MM-DD[THH:MM:SS[.mmm]Z]`
    fn parse_date(&mut self, body: usize) -> Result<DateTime<Utc>> {
        let year = self.fixed_digits(4, "year")?;
        self.expect_byte(b'-', "Expected '-' after year")?;
        let month = self.fixed_digits(2, "month")?;
        self.expect_byte(b'-', "Expected '-' after month")?;
        let day = self.fixed_digits(2, "day")?;
        let date = NaiveDate::from_ymd_opt(year as i32, month, day)
            .ok_or_else(|| self.error(body, "Invalid calendar date"))?;

        let (hours, minutes, seconds, millis) = if self.peek() == Some(b'T') {
            self.pos += 1;
            let clock = self.parse_clock()?;
            self.expect_byte(b'Z', "Expected 'Z' after time")?;
            clock
        } else {
            (0, 0, 0, 0)
        };
        let time = NaiveTime::from_hms_milli_opt(hours, minutes, seconds, millis)
            .ok_or_else(|| self.error(body, "Invalid time of day"))?;
        Ok(Utc.from_utc_datetime(&date.and_time(time)))
    }

    /// Ten digits or fewer are seconds since the epoch, more are milliseconds.
    fn parse_timestamp(&mut self, body: usize) -> Result<DateTime<Utc>> {
        self.skip_digits();
        let digits = &self.src[body..self.pos];
        let instant = digits.parse::<i64>().ok().and_then(|n| {
            if digits.len() <= 10 {
                Utc.timestamp_opt(n, 0).single()
            } else {
                Utc.timestamp_millis_opt(n).single()
            }
        });
        instant.ok_or_else(|| self.error(body, "Timestamp out of range"))
    }

    /// Reads `/source/flags`; the source keeps its own escaping.
    fn parse_regexp(&mut self, start: usize) -> Result<B::Node> {
        self.pos = start + 1;
        let source_start = self.pos;
        loop {
            match self.peek() {
                None => return Err(self.error(start, "Unterminated regular expression")),
                Some(b'\n' | b'\r') => {
                    return Err(self.error(self.pos, "Line terminator in regular expression"))
                }
                Some(b'\\') => {
                    self.pos += 1;
                    match self.peek() {
                        None => {
                            return Err(self.error(start, "Unterminated regular expression"))
                        }
                        Some(b'\n' | b'\r') => {
                            return Err(
                                self.error(self.pos, "Line terminator in regular expression")
                            )
                        }
                        Some(_) => self.pos += 1,
                    }
                }
                Some(b'/') => break,
                Some(_) => self.pos += 1,
            }
        }
        let source_end = self.pos;
        self.pos += 1;

        let flags_start = self.pos;
        while matches!(self.peek(), Some(b) if REGEXP_FLAGS.contains(&b)) {
            self.pos += 1;
        }
        if let Some(msg) = check_regexp_flags(&self.bytes[flags_start..self.pos]) {
            return Err(self.error(flags_start, &msg));
        }

        let re = RegExp::from_parts(
            &self.src[source_start..source_end],
            &self.src[flags_start..self.pos],
        );
        Ok(self.literal(Value::RegExp(re), start))
    }

    /// Reads `b"..."` or `x"..."`. The size limit is checked before decoding.
    fn parse_binary(&mut self, start: usize, prefix: u8) -> Result<B::Node> {
        let bytes = self.bytes;
        if bytes.get(start + 1) != Some(&b'"') {
            return Err(self.unexpected(start));
        }
        let body_start = start + 2;
        let body_end = bytes[body_start..]
            .iter()
            .position(|&b| b == b'"')
            .map(|i| body_start + i)
            .ok_or_else(|| self.error(start, "Unterminated binary literal"))?;
        let body = &bytes[body_start..body_end];

        let base64 = prefix == b'b';
        let size = if base64 {
            base64_decoded_len(body)
        } else {
            hex_decoded_len(body)
        }
        .map_err(|e| self.error(body_start + e.at, &e.msg))?;
        if size > self.options.max_binary_size {
            debug!(
                offset = start,
                size,
                limit = self.options.max_binary_size,
                "RDN binary limit hit"
            );
            return Err(Error::binary_limit(start, self.options.max_binary_size, size));
        }

        let decoded = if base64 {
            decode_base64(body)
        } else {
            decode_hex(body)
        }
        .map_err(|e| self.error(body_start + e.at, &e.msg))?;
        self.pos = body_end + 1;
        Ok(self.literal(Value::Binary(decoded), start))
    }
}

fn invalid_field_message(err: Error) -> String {
    match err {
        Error::Custom(msg) => format!("Invalid time of day: {}", msg),
        other => other.to_string(),
    }
}

/// Runs a parse with logging around it.
pub(crate) fn parse_with<B: Builder>(src: &str, options: &ParseOptions) -> Result<B::Node> {
    trace!(len = src.len(), "parsing RDN");
    Parser::<B>::new(src, *options)
        .parse_document()
        .map_err(|err| {
            debug!(error = %err, offset = ?err.offset(), "RDN parse failed");
            err
        })
}

/// Applies `reviver` bottom-up: children first, then the container itself.
///
/// Children the reviver omits are removed from their parent; array, tuple and
/// set members are spliced out rather than replaced with `null`.
pub(crate) fn revive<F>(key: Key<'_>, value: Value, reviver: &mut F) -> Result<Option<Value>>
where
    F: FnMut(Key<'_>, Value) -> Result<Option<Value>>,
{
    let value = match value {
        Value::Array(items) => Value::Array(revive_items(items, reviver)?),
        Value::Tuple(items) => Value::Tuple(revive_items(items, reviver)?),
        Value::Set(items) => Value::Set(revive_items(items, reviver)?),
        Value::Object(object) => {
            let mut revived = Object::with_capacity(object.len());
            for (k, v) in object {
                if let Some(v) = revive(Key::Field(&k), v, reviver)? {
                    revived.insert(k, v);
                }
            }
            Value::Object(revived)
        }
        Value::Map(entries) => {
            let mut revived = Vec::with_capacity(entries.len());
            for (k, v) in entries {
                if let Some(v) = revive(Key::Entry(&k), v, reviver)? {
                    revived.push((k, v));
                }
            }
            Value::Map(revived)
        }
        other => other,
    };
    reviver(key, value)
}

fn revive_items<F>(items: Vec<Value>, reviver: &mut F) -> Result<Vec<Value>>
where
    F: FnMut(Key<'_>, Value) -> Result<Option<Value>>,
{
    let mut revived = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        if let Some(item) = revive(Key::Index(i), item, reviver)? {
            revived.push(item);
        }
    }
    Ok(revived)
}

/// Serde deserializer over an owned [`Value`].
///
/// Extended kinds surface as the closest serde data model type: dates, times,
/// durations and regular expressions as strings, binary as a byte buffer,
/// tuples and sets as sequences and maps as maps with arbitrary keys.
pub struct Deserializer {
    value: Value,
}

impl Deserializer {
    pub fn new(value: Value) -> Self {
        Deserializer { value }
    }
}

fn visit_bigint<'de, V>(bigint: BigInt, visitor: V) -> Result<V::Value>
where
    V: de::Visitor<'de>,
{
    if let Ok(i) = i64::try_from(&bigint) {
        visitor.visit_i64(i)
    } else if let Ok(u) = u64::try_from(&bigint) {
        visitor.visit_u64(u)
    } else if let Ok(i) = i128::try_from(&bigint) {
        visitor.visit_i128(i)
    } else if let Ok(u) = u128::try_from(&bigint) {
        visitor.visit_u128(u)
    } else {
        visitor.visit_string(bigint.to_string())
    }
}

impl<'de> de::Deserializer<'de> for Deserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Number(n) => match number_to_i64(n) {
                Some(i) if i.unsigned_abs() <= MAX_SAFE_INTEGER && !(i == 0 && n.is_sign_negative()) => {
                    visitor.visit_i64(i)
                }
                _ => visitor.visit_f64(n),
            },
            Value::BigInt(bigint) => visit_bigint(bigint, visitor),
            Value::String(s) => visitor.visit_string(s),
            Value::DateTime(dt) => visitor.visit_string(crate::literal::format_iso_datetime(&dt)),
            Value::TimeOnly(time) => visitor.visit_string(time.to_string()),
            Value::Duration(duration) => visitor.visit_string(duration.to_string()),
            Value::RegExp(re) => visitor.visit_string(re.to_string()),
            Value::Binary(bytes) => visitor.visit_byte_buf(bytes),
            Value::Array(items) | Value::Tuple(items) | Value::Set(items) => {
                visitor.visit_seq(SeqDeserializer::new(items))
            }
            Value::Object(obj) => visitor.visit_map(MapDeserializer::new(obj)),
            Value::Map(entries) => visitor.visit_map(EntriesDeserializer::new(entries)),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::String(s) => visitor.visit_enum(s.into_deserializer()),
            Value::Object(obj) => {
                if obj.len() != 1 {
                    return Err(Error::custom(
                        "Expected an object with exactly one member for an enum",
                    ));
                }
                match obj.into_iter().next() {
                    Some((variant, value)) => {
                        visitor.visit_enum(EnumDeserializer::new(variant, value))
                    }
                    None => Err(Error::custom("Expected enum variant")),
                }
            }
            other => Err(Error::custom(format!(
                "Expected enum, found {}",
                other.kind()
            ))),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<Value>,
}

impl SeqDeserializer {
    fn new(vec: Vec<Value>) -> Self {
        SeqDeserializer {
            iter: vec.into_iter(),
        }
    }
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(Deserializer::new(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct MapDeserializer {
    iter: indexmap::map::IntoIter<String, Value>,
    value: Option<Value>,
}

impl MapDeserializer {
    fn new(map: Object) -> Self {
        MapDeserializer {
            iter: map.into_iter(),
            value: None,
        }
    }
}

impl<'de> de::MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(Deserializer::new(Value::String(key)))
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(Deserializer::new(value)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

/// Map access over `Map` entries, whose keys may be any value.
struct EntriesDeserializer {
    iter: std::vec::IntoIter<(Value, Value)>,
    value: Option<Value>,
}

impl EntriesDeserializer {
    fn new(entries: Vec<(Value, Value)>) -> Self {
        EntriesDeserializer {
            iter: entries.into_iter(),
            value: None,
        }
    }
}

impl<'de> de::MapAccess<'de> for EntriesDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(Deserializer::new(key)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(Deserializer::new(value)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct EnumDeserializer {
    variant: String,
    value: Option<Value>,
}

impl EnumDeserializer {
    fn new(variant: String, value: Value) -> Self {
        EnumDeserializer {
            variant,
            value: Some(value),
        }
    }
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(Deserializer::new(Value::String(self.variant)))?;
        let visitor = VariantDeserializer { value: self.value };
        Ok((variant, visitor))
    }
}

struct VariantDeserializer {
    value: Option<Value>,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Some(Value::Null) | None => Ok(()),
            _ => Err(Error::custom("Expected unit variant")),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.value {
            Some(value) => seed.deserialize(Deserializer::new(value)),
            None => Err(Error::custom("Expected newtype variant")),
        }
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(Value::Array(items)) | Some(Value::Tuple(items)) => {
                visitor.visit_seq(SeqDeserializer::new(items))
            }
            _ => Err(Error::custom("Expected tuple variant")),
        }
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(Value::Object(obj)) => visitor.visit_map(MapDeserializer::new(obj)),
            _ => Err(Error::custom("Expected struct variant")),
        }
    }
}
