//! jsurl deserialization.
//!
//! [`decode`] parses jsurl text into a [`Value`] tree with a single-pass
//! recursive descent [`Parser`]. The `try_*` variants never fail and fall back
//! to a default instead. [`ValueDeserializer`] then feeds a [`Value`] to any
//! `Deserialize` impl, which is how the crate-level `from_str` works.
//!
//! ## Usage
//!
//! ```rust
//! use serde_jsurl::{decode, jsurl, DecodeOptions};
//!
//! let value = decode("(a~!1~2~~b~hello_world)~", DecodeOptions::default()).unwrap();
//! assert_eq!(value, jsurl!({ "a": [1, 2], "b": "hello world" }));
//! ```
//!
//! ## Percent-decoding
//!
//! Text copied out of a URL may have been percent-encoded once or several
//! times by outer layers. With `de_uri` set, percent-decoding is applied until
//! the text stops changing, before parsing:
//!
//! ```rust
//! use serde_jsurl::{decode, jsurl, DecodeOptions};
//!
//! let options = DecodeOptions::new().with_de_uri(true);
//! let value = decode("(a~*%2527hello)~", options).unwrap();
//! assert_eq!(value, jsurl!({ "a": "'hello" }));
//! ```

use crate::escape;
use crate::ser::{ARRAY_OPEN, OBJECT_OPEN, TERMINATOR};
use crate::value::{iso_string, whole_i64};
use crate::{DecodeOptions, Error, Map, Result, Value};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use percent_encoding::percent_decode_str;
use serde::de::IntoDeserializer;
use serde::{de, forward_to_deserialize_any};
use std::borrow::Cow;

/// Decodes jsurl text into a value tree.
///
/// # Errors
///
/// Returns [`Error::MalformedInput`] when the text does not follow the
/// grammar and [`Error::DepthExceeded`] when containers nest deeper than
/// `options.max_depth`.
///
/// # Examples
///
/// ```rust
/// use serde_jsurl::{decode, DecodeOptions, Value};
///
/// assert_eq!(decode("_N~", DecodeOptions::default()).unwrap(), Value::Null);
/// assert_eq!(decode("", DecodeOptions::default()).unwrap(), Value::Bool(true));
/// assert!(decode("!1x~", DecodeOptions::default()).is_err());
/// ```
pub fn decode(text: &str, options: DecodeOptions) -> Result<Value> {
    let text = if options.de_uri {
        de_uri(text)?
    } else {
        Cow::Borrowed(text)
    };
    Parser::new(&text, options).parse_root()
}

/// Decodes `text`, returning [`Value::Undefined`] on any failure.
///
/// ```rust
/// use serde_jsurl::{try_decode, DecodeOptions, Value};
///
/// assert_eq!(try_decode("_N~", DecodeOptions::default()), Value::Null);
/// assert_eq!(try_decode("_", DecodeOptions::default()), Value::Undefined);
/// ```
#[must_use]
pub fn try_decode(text: &str, options: DecodeOptions) -> Value {
    decode(text, options).unwrap_or_default()
}

/// Decodes `text`, returning `default` on any failure.
///
/// ```rust
/// use serde_jsurl::{try_decode_or, DecodeOptions, Value};
///
/// let fallback = Value::from(0);
/// assert_eq!(try_decode_or("1~", fallback.clone(), DecodeOptions::default()), Value::from(1));
/// assert_eq!(try_decode_or("12323NOTANUMBER", fallback.clone(), DecodeOptions::default()), fallback);
/// ```
#[must_use]
pub fn try_decode_or(text: &str, default: Value, options: DecodeOptions) -> Value {
    decode(text, options).unwrap_or(default)
}

/// Decodes the part of `text` starting at byte `offset`.
///
/// An offset past the end of `text`, or one that splits a character, yields
/// [`Value::Undefined`] like any other failure.
#[must_use]
pub fn try_decode_from(text: &str, offset: usize, options: DecodeOptions) -> Value {
    match text.get(offset..) {
        Some(rest) => try_decode(rest, options),
        None => Value::Undefined,
    }
}

/// Percent-decodes until a fixed point is reached.
fn de_uri(text: &str) -> Result<Cow<'_, str>> {
    let mut current = Cow::Borrowed(text);
    loop {
        let decoded = percent_decode_str(&current)
            .decode_utf8()
            .map_err(|e| {
                Error::malformed(e.valid_up_to(), "percent-decoded input is not valid UTF-8")
            })?;
        if decoded == current {
            return Ok(current);
        }
        current = Cow::Owned(decoded.into_owned());
    }
}

/// Where a value is being parsed. Only an array element must spell out `true`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    Root,
    Element,
    Member,
}

/// Recursive descent parser over jsurl text.
///
/// Every structural character is ASCII, so the parser walks bytes and only
/// slices the input at ASCII positions.
pub struct Parser<'a> {
    input: &'a str,
    position: usize,
    short: bool,
    max_depth: usize,
    remaining_depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str, options: DecodeOptions) -> Self {
        Parser {
            input,
            position: 0,
            short: options.short,
            max_depth: options.max_depth,
            remaining_depth: options.max_depth,
        }
    }

    /// Parses one value and requires the input to end after it.
    ///
    /// The trailing root terminator is optional.
    pub fn parse_root(&mut self) -> Result<Value> {
        let value = self.parse_value(Slot::Root)?;
        if self.peek() == Some(TERMINATOR as u8) {
            self.position += 1;
        }
        if self.at_end() {
            Ok(value)
        } else {
            Err(self.error("trailing characters after value"))
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.position).copied()
    }

    fn at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn error(&self, msg: &str) -> Error {
        Error::malformed(self.position, msg)
    }

    /// Whether the next byte ends a value: a terminator, a closer or end of input.
    fn at_boundary(&self) -> bool {
        matches!(self.peek(), None | Some(b'~') | Some(b')'))
    }

    fn parse_value(&mut self, slot: Slot) -> Result<Value> {
        match self.peek() {
            None | Some(b'~') | Some(b')') => {
                if slot == Slot::Element {
                    Err(self.error("expected a value"))
                } else {
                    // Elided `true`.
                    Ok(Value::Bool(true))
                }
            }
            Some(b'_') => self.parse_tag(),
            Some(b'!') => self.parse_array(),
            Some(b'(') => self.parse_object(),
            Some(b'*') => {
                self.position += 1;
                self.parse_text().map(Value::String)
            }
            Some(b'-' | b'0'..=b'9') => self.parse_number(),
            Some(_) => self.parse_text().map(Value::String),
        }
    }

    fn parse_tag(&mut self) -> Result<Value> {
        let start = self.position;
        self.position += 1;
        let tag = self.peek();
        self.position += 1;
        match tag {
            Some(b'U') => Ok(Value::Undefined),
            Some(b'N') => Ok(Value::Null),
            Some(b'F') => Ok(Value::Bool(false)),
            Some(b'T') => Ok(Value::Bool(true)),
            Some(b'D') => self.parse_date(),
            _ => Err(Error::malformed(start, "unknown tag")),
        }
    }

    fn parse_date(&mut self) -> Result<Value> {
        let start = self.position;
        while !self.at_boundary() {
            self.position += 1;
        }
        let text = &self.input[start..self.position];
        // Years outside 0000..=9999 carry a sign, which RFC 3339 does not allow.
        let date = DateTime::parse_from_rfc3339(text)
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|_| {
                NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.fZ")
                    .map(|dt| dt.and_utc())
            })
            .or_else(|_| {
                NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .map(|d| d.and_time(NaiveTime::MIN).and_utc())
            })
            .map_err(|_| Error::malformed(start, "invalid date"))?;
        Ok(Value::Date(date))
    }

    fn parse_number(&mut self) -> Result<Value> {
        let start = self.position;
        while matches!(
            self.peek(),
            Some(b'0'..=b'9' | b'.' | b'-' | b'+' | b'e' | b'E')
        ) {
            self.position += 1;
        }
        let text = &self.input[start..self.position];
        match text.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(Value::Number(n)),
            _ => Err(Error::malformed(start, "invalid number")),
        }
    }

    /// Reads an escaped run up to the next terminator, closer or end of input.
    fn parse_text(&mut self) -> Result<String> {
        let input = self.input;
        let bytes = input.as_bytes();
        let mut out = String::new();
        let mut start = self.position;
        while let Some(&byte) = bytes.get(self.position) {
            match byte {
                b'~' | b')' => break,
                b'_' => {
                    out.push_str(&self.input[start..self.position]);
                    out.push(' ');
                    self.position += 1;
                }
                b'*' => {
                    out.push_str(&self.input[start..self.position]);
                    let designator = self.input[self.position + 1..].chars().next();
                    match designator.and_then(escape::unescape) {
                        Some(ch) => out.push(ch),
                        None => return Err(self.error("unknown escape designator")),
                    }
                    // Every designator is ASCII.
                    self.position += 2;
                }
                _ => {
                    self.position += 1;
                    continue;
                }
            }
            start = self.position;
        }
        out.push_str(&self.input[start..self.position]);
        Ok(out)
    }

    fn enter(&mut self) -> Result<()> {
        if self.remaining_depth == 0 {
            return Err(Error::depth_exceeded(self.max_depth));
        }
        self.remaining_depth -= 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.remaining_depth += 1;
    }

    /// After a value other than an object: a terminator, or a closer left in place.
    fn finish_value(&mut self, value: &Value) -> Result<()> {
        if value.is_object() {
            return Ok(());
        }
        match self.peek() {
            Some(b'~') => {
                self.position += 1;
                Ok(())
            }
            None | Some(b')') => Ok(()),
            Some(_) => Err(self.error("expected '~'")),
        }
    }

    fn parse_array(&mut self) -> Result<Value> {
        debug_assert_eq!(self.peek(), Some(ARRAY_OPEN as u8));
        self.enter()?;
        self.position += 1;

        let mut items = Vec::new();
        while !self.at_boundary() {
            let item = self.parse_value(Slot::Element)?;
            self.finish_value(&item)?;
            items.push(item);
        }

        self.leave();
        Ok(Value::Array(items))
    }

    fn parse_object(&mut self) -> Result<Value> {
        debug_assert_eq!(self.peek(), Some(OBJECT_OPEN as u8));
        self.enter()?;
        self.position += 1;

        let mut map = Map::new();
        loop {
            match self.peek() {
                Some(b')') => {
                    self.position += 1;
                    break;
                }
                None if self.short => break,
                None => return Err(self.error("unterminated object")),
                Some(_) => {}
            }

            let key = self.parse_text()?;
            let value = match self.peek() {
                None | Some(b')') => Value::Bool(true),
                _ => {
                    // parse_text stops only at `~`, `)` or end of input.
                    self.position += 1;
                    let value = self.parse_value(Slot::Member)?;
                    self.finish_value(&value)?;
                    value
                }
            };
            map.insert(key, value);
        }

        self.leave();
        Ok(Value::Object(map))
    }
}

/// Deserializes a [`Value`] into any `T: Deserialize`.
///
/// # Errors
///
/// Returns an error when the value's shape does not match `T`.
///
/// ```rust
/// use serde::Deserialize;
/// use serde_jsurl::{from_value, jsurl};
///
/// #[derive(Deserialize, Debug, PartialEq)]
/// struct Query { page: u32, open: bool }
///
/// let query: Query = from_value(jsurl!({ "page": 2, "open": true })).unwrap();
/// assert_eq!(query, Query { page: 2, open: true });
/// ```
pub fn from_value<'de, T>(value: Value) -> Result<T>
where
    T: de::Deserialize<'de>,
{
    T::deserialize(ValueDeserializer::new(value))
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
            Some(value) => seed.deserialize(ValueDeserializer::new(value)).map(Some),
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
    fn new(map: Map) -> Self {
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
                seed.deserialize(ValueDeserializer::new(Value::String(key)))
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
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
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

impl<'de> de::EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(ValueDeserializer::new(Value::String(self.variant)))?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Option<Value>,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Some(Value::Null) | Some(Value::Undefined) | None => Ok(()),
            _ => Err(Error::custom("expected unit variant")),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.value {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::custom("expected newtype variant")),
        }
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(Value::Array(arr)) => visitor.visit_seq(SeqDeserializer::new(arr)),
            _ => Err(Error::custom("expected tuple variant")),
        }
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(Value::Object(obj)) => visitor.visit_map(MapDeserializer::new(obj)),
            _ => Err(Error::custom("expected struct variant")),
        }
    }
}

/// Serde deserializer reading from an owned [`Value`].
pub struct ValueDeserializer {
    value: Value,
}

impl ValueDeserializer {
    pub fn new(value: Value) -> Self {
        ValueDeserializer { value }
    }
}

impl<'de> de::Deserializer<'de> for ValueDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Undefined | Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Number(n) => match whole_i64(n) {
                Some(i) => visitor.visit_i64(i),
                None if n.fract() == 0.0 && n >= 0.0 && n < u64::MAX as f64 => {
                    visitor.visit_u64(n as u64)
                }
                None => visitor.visit_f64(n),
            },
            Value::String(s) => visitor.visit_string(s),
            Value::Date(dt) => visitor.visit_string(iso_string(&dt)),
            Value::Array(arr) => visitor.visit_seq(SeqDeserializer::new(arr)),
            Value::Object(obj) => visitor.visit_map(MapDeserializer::new(obj)),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Undefined | Value::Null => visitor.visit_none(),
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
                let mut entries = obj.into_iter();
                match (entries.next(), entries.next()) {
                    (Some((variant, value)), None) => visitor.visit_enum(EnumDeserializer {
                        variant,
                        value: Some(value),
                    }),
                    _ => Err(Error::custom("expected an object with a single variant key")),
                }
            }
            other => Err(Error::custom(format!(
                "expected enum, found {}",
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
