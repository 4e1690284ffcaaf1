//! RDN serialization.
//!
//! This module turns [`Value`] trees into canonical RDN text, applies replacer
//! callbacks, and converts any `T: Serialize` into a [`Value`].
//!
//! ## Overview
//!
//! - **Canonical output**: compact text with no insignificant whitespace;
//!   empty maps and sets always keep their keyword
//! - **Replacer**: applied top-down, once per node, before the node's type is
//!   inspected
//! - **Serde bridge**: Rust tuples become RDN tuples, byte buffers become
//!   binary, maps with non-string keys become `Map`, and integers that an
//!   `f64` cannot hold exactly become bigints
//! - **Cycle detection**: a `Serialize` graph that reaches a value already on
//!   the active path fails with [`Error::Cycle`](crate::Error::Cycle)
//!
//! ## Usage
//!
//! ```rust
//! use rdn::{to_string, to_value};
//! use serde::Serialize;
//! use std::collections::BTreeMap;
//!
//! struct Raw(Vec<u8>);
//!
//! impl Serialize for Raw {
//!     fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
//!         s.serialize_bytes(&self.0)
//!     }
//! }
//!
//! #[derive(Serialize)]
//! struct Reading { sensor: (u8, u8), raw: Raw }
//!
//! let reading = Reading { sensor: (1, 2), raw: Raw(b"Hi".to_vec()) };
//! assert_eq!(to_string(&reading).unwrap(), r#"{"sensor":(1,2),"raw":b"SGk="}"#);
//!
//! let mut by_id = BTreeMap::new();
//! by_id.insert(7, "seven");
//! assert!(to_value(&by_id).unwrap().is_map());
//! ```

use crate::literal::{
    encode_base64, encode_hex, is_writable_datetime, write_datetime, write_number, write_string,
};
use crate::value::{
    object_or_map, BIGINT_MARKER, DATETIME_MARKER, DURATION_MARKER, MAP_MARKER, REGEXP_MARKER,
    SET_MARKER, TIME_ONLY_MARKER,
};
use crate::{
    BinaryFormat, DateFormat, Duration, Error, Key, Object, RegExp, Result, StringifyOptions,
    TimeOnly, Value,
};
use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use serde::{ser, Serialize};
use std::cell::{Cell, RefCell};
use tracing::{debug, trace};

/// Writes [`Value`] trees as RDN text.
pub(crate) struct Writer<'o> {
    out: String,
    options: &'o StringifyOptions,
}

impl<'o> Writer<'o> {
    pub(crate) fn new(options: &'o StringifyOptions) -> Self {
        Writer {
            out: String::new(),
            options,
        }
    }

    pub(crate) fn into_inner(self) -> String {
        self.out
    }

    pub(crate) fn write_value(&mut self, value: &Value) {
        match value {
            Value::Null => self.out.push_str("null"),
            Value::Bool(true) => self.out.push_str("true"),
            Value::Bool(false) => self.out.push_str("false"),
            Value::Number(n) => write_number(&mut self.out, *n),
            Value::BigInt(bigint) => {
                self.out.push_str(&bigint.to_string());
                self.out.push('n');
            }
            Value::String(s) => write_string(&mut self.out, s),
            Value::DateTime(dt) => write_datetime(
                &mut self.out,
                dt,
                self.options.date_format == DateFormat::UnixMillis,
            ),
            Value::TimeOnly(time) => {
                self.out.push('@');
                self.out.push_str(&time.to_string());
            }
            Value::Duration(duration) => {
                self.out.push('@');
                self.out.push_str(duration.as_str());
            }
            Value::RegExp(re) => self.out.push_str(&re.to_string()),
            Value::Binary(bytes) => {
                let format = self.options.binary_format;
                self.out.push(format.prefix());
                self.out.push('"');
                match format {
                    BinaryFormat::Base64 => self.out.push_str(&encode_base64(bytes)),
                    BinaryFormat::Hex => self.out.push_str(&encode_hex(bytes)),
                }
                self.out.push('"');
            }
            Value::Array(items) => self.write_sequence('[', ']', items),
            Value::Tuple(items) => self.write_sequence('(', ')', items),
            Value::Object(object) => {
                self.out.push('{');
                for (i, (key, value)) in object.iter().enumerate() {
                    if i > 0 {
                        self.out.push(',');
                    }
                    write_string(&mut self.out, key);
                    self.out.push(':');
                    self.write_value(value);
                }
                self.out.push('}');
            }
            Value::Map(entries) => {
                self.open_collection("Map", entries.is_empty());
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        self.out.push(',');
                    }
                    self.write_value(key);
                    self.out.push_str("=>");
                    self.write_value(value);
                }
                self.out.push('}');
            }
            Value::Set(items) => {
                self.open_collection("Set", items.is_empty());
                self.write_items(items);
                self.out.push('}');
            }
        }
    }

    fn write_sequence(&mut self, open: char, close: char, items: &[Value]) {
        self.out.push(open);
        self.write_items(items);
        self.out.push(close);
    }

    fn write_items(&mut self, items: &[Value]) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.out.push(',');
            }
            self.write_value(item);
        }
    }

    // An empty collection keeps its keyword, or it would read back as `{}`
    fn open_collection(&mut self, keyword: &str, empty: bool) {
        if empty || !self.options.strip_collection_keywords {
            self.out.push_str(keyword);
        }
        self.out.push('{');
    }
}

pub(crate) fn write(value: &Value, options: &StringifyOptions) -> String {
    let mut writer = Writer::new(options);
    writer.write_value(value);
    let out = writer.into_inner();
    trace!(len = out.len(), "wrote RDN");
    out
}

/// Applies `replacer` top-down and returns the tree the writer should see.
///
/// `Ok(None)` means the node produces no output. Omitted array and tuple
/// members become `null`; omitted object members, map entries and set
/// members are dropped.
pub(crate) fn replace<F>(key: Key<'_>, value: &Value, replacer: &mut F) -> Result<Option<Value>>
where
    F: FnMut(Key<'_>, &Value) -> Result<Option<Value>>,
{
    let Some(value) = replacer(key, value)? else {
        return Ok(None);
    };
    let value = match value {
        Value::Array(items) => Value::Array(replace_sequence(&items, replacer)?),
        Value::Tuple(items) => Value::Tuple(replace_sequence(&items, replacer)?),
        Value::Set(items) => {
            let mut replaced = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                if let Some(item) = replace(Key::Index(i), item, replacer)? {
                    replaced.push(item);
                }
            }
            Value::Set(replaced)
        }
        Value::Object(object) => {
            let mut replaced = Object::with_capacity(object.len());
            for (k, v) in object.iter() {
                if let Some(v) = replace(Key::Field(k), v, replacer)? {
                    replaced.insert(k.clone(), v);
                }
            }
            Value::Object(replaced)
        }
        Value::Map(entries) => {
            let mut replaced = Vec::with_capacity(entries.len());
            for (k, v) in &entries {
                if let Some(v) = replace(Key::Entry(k), v, replacer)? {
                    replaced.push((k.clone(), v));
                }
            }
            Value::Map(replaced)
        }
        other => other,
    };
    Ok(Some(value))
}

fn replace_sequence<F>(items: &[Value], replacer: &mut F) -> Result<Vec<Value>>
where
    F: FnMut(Key<'_>, &Value) -> Result<Option<Value>>,
{
    items
        .iter()
        .enumerate()
        .map(|(i, item)| Ok(replace(Key::Index(i), item, replacer)?.unwrap_or(Value::Null)))
        .collect()
}

/// Nesting depth below which the serde bridge skips cycle bookkeeping.
const CYCLE_CHECK_DEPTH: usize = 32;

/// Tracks the values on the active serialization path.
#[derive(Default)]
pub(crate) struct CycleGuard {
    depth: Cell<usize>,
    active: RefCell<Vec<(usize, &'static str)>>,
}

impl CycleGuard {
    /// Serializes `value` one level deeper, failing if it is already being
    /// serialized further up the path.
    ///
    /// A value is identified by address and type name, so a struct and its
    /// first field never collide. Zero-sized values are not tracked.
    pub(crate) fn visit<T>(&self, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        let depth = self.depth.get();
        let id = (
            value as *const T as *const () as usize,
            std::any::type_name::<T>(),
        );
        let tracked = depth >= CYCLE_CHECK_DEPTH && std::mem::size_of_val(value) != 0;
        if tracked {
            if self.active.borrow().contains(&id) {
                debug!(type_name = id.1, depth, "cycle detected while serializing");
                return Err(Error::cycle(id.1));
            }
            self.active.borrow_mut().push(id);
        }

        self.depth.set(depth + 1);
        let result = value.serialize(ValueSerializer { guard: self });
        self.depth.set(depth);
        if tracked {
            self.active.borrow_mut().pop();
        }
        result
    }
}

/// Serializer whose output is a [`Value`].
pub(crate) struct ValueSerializer<'g> {
    guard: &'g CycleGuard,
}

pub(crate) fn to_value<T>(value: &T) -> Result<Value>
where
    T: ?Sized + Serialize,
{
    CycleGuard::default().visit(value)
}

fn tagged(variant: &str, value: Value) -> Value {
    let mut object = Object::with_capacity(1);
    object.insert(variant.to_string(), value);
    Value::Object(object)
}

/// Rebuilds an extended kind from the payload its marker newtype carried.
fn from_marker(name: &'static str, inner: Value) -> Result<Value> {
    let invalid = || Error::custom(format!("invalid payload for {}", name));
    match (name, inner) {
        (BIGINT_MARKER, Value::String(digits)) => digits
            .parse::<BigInt>()
            .map(Value::BigInt)
            .map_err(|_| invalid()),
        (DATETIME_MARKER, Value::String(iso)) => {
            let dt = DateTime::parse_from_rfc3339(&iso)
                .map_err(|_| invalid())?
                .with_timezone(&Utc);
            if !is_writable_datetime(&dt) {
                return Err(Error::custom(format!(
                    "date {} is before year 0000 and has no RDN form",
                    iso
                )));
            }
            Ok(Value::DateTime(dt))
        }
        (TIME_ONLY_MARKER, Value::String(text)) => text.parse::<TimeOnly>().map(Value::TimeOnly),
        (DURATION_MARKER, Value::String(iso)) => Duration::new(iso).map(Value::Duration),
        (REGEXP_MARKER, Value::Tuple(parts)) => match <[Value; 2]>::try_from(parts) {
            Ok([Value::String(source), Value::String(flags)]) => {
                RegExp::new(source, flags).map(Value::RegExp)
            }
            _ => Err(invalid()),
        },
        (MAP_MARKER, Value::Array(pairs)) => pairs
            .into_iter()
            .map(|pair| match pair {
                Value::Tuple(kv) => match <[Value; 2]>::try_from(kv) {
                    Ok([k, v]) => Ok((k, v)),
                    Err(_) => Err(invalid()),
                },
                _ => Err(invalid()),
            })
            .collect::<Result<Vec<_>>>()
            .map(Value::Map),
        (SET_MARKER, Value::Array(items)) => Ok(Value::Set(items)),
        (BIGINT_MARKER | DATETIME_MARKER | TIME_ONLY_MARKER | DURATION_MARKER, _)
        | (REGEXP_MARKER | MAP_MARKER | SET_MARKER, _) => Err(invalid()),
        (_, inner) => Ok(inner),
    }
}

impl<'g> ser::Serializer for ValueSerializer<'g> {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeVec<'g>;
    type SerializeTuple = SerializeVec<'g>;
    type SerializeTupleStruct = SerializeVec<'g>;
    type SerializeTupleVariant = SerializeVec<'g>;
    type SerializeMap = SerializeMap<'g>;
    type SerializeStruct = SerializeMap<'g>;
    type SerializeStructVariant = SerializeMap<'g>;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i128(self, v: i128) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u128(self, v: u128) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        Ok(Value::Number(v))
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        Ok(Value::Binary(v.to_vec()))
    }

    fn serialize_none(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        self.guard.visit(value)
    }

    fn serialize_unit(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value> {
        Ok(Value::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(self, name: &'static str, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        from_marker(name, self.guard.visit(value)?)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        Ok(tagged(variant, self.guard.visit(value)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec<'g>> {
        Ok(SerializeVec::new(self.guard, len.unwrap_or(0), false, None))
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec<'g>> {
        Ok(SerializeVec::new(self.guard, len, true, None))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec<'g>> {
        Ok(SerializeVec::new(self.guard, len, true, None))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeVec<'g>> {
        Ok(SerializeVec::new(self.guard, len, true, Some(variant)))
    }

    fn serialize_map(self, len: Option<usize>) -> Result<SerializeMap<'g>> {
        Ok(SerializeMap::new(self.guard, len.unwrap_or(0), None))
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<SerializeMap<'g>> {
        Ok(SerializeMap::new(self.guard, len, None))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeMap<'g>> {
        Ok(SerializeMap::new(self.guard, len, Some(variant)))
    }
}

pub(crate) struct SerializeVec<'g> {
    guard: &'g CycleGuard,
    vec: Vec<Value>,
    tuple: bool,
    variant: Option<&'static str>,
}

impl<'g> SerializeVec<'g> {
    fn new(guard: &'g CycleGuard, len: usize, tuple: bool, variant: Option<&'static str>) -> Self {
        SerializeVec {
            guard,
            vec: Vec::with_capacity(len),
            tuple,
            variant,
        }
    }

    fn push<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.vec.push(self.guard.visit(value)?);
        Ok(())
    }

    fn finish(self) -> Value {
        let value = if self.tuple {
            Value::Tuple(self.vec)
        } else {
            Value::Array(self.vec)
        };
        match self.variant {
            Some(variant) => tagged(variant, value),
            None => value,
        }
    }
}

impl ser::SerializeSeq for SerializeVec<'_> {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SerializeVec<'_> {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SerializeVec<'_> {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for SerializeVec<'_> {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

pub(crate) struct SerializeMap<'g> {
    guard: &'g CycleGuard,
    entries: Vec<(Value, Value)>,
    current_key: Option<Value>,
    variant: Option<&'static str>,
}

impl<'g> SerializeMap<'g> {
    fn new(guard: &'g CycleGuard, len: usize, variant: Option<&'static str>) -> Self {
        SerializeMap {
            guard,
            entries: Vec::with_capacity(len),
            current_key: None,
            variant,
        }
    }

    fn field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let value = self.guard.visit(value)?;
        self.entries.push((Value::String(key.to_string()), value));
        Ok(())
    }

    fn finish(self) -> Value {
        let value = object_or_map(self.entries);
        match self.variant {
            Some(variant) => tagged(variant, value),
            None => value,
        }
    }
}

impl ser::SerializeMap for SerializeMap<'_> {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.current_key = Some(self.guard.visit(key)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        let value = self.guard.visit(value)?;
        self.entries.push((key, value));
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeStruct for SerializeMap<'_> {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.field(key, value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeStructVariant for SerializeMap<'_> {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.field(key, value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}
