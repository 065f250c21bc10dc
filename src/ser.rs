//! jsurl serialization.
//!
//! Two pieces live here:
//!
//! - [`encode`] and the [`Encoder`] behind it, which write a [`Value`] tree as
//!   jsurl text
//! - [`ValueSerializer`], a Serde serializer that turns any `T: Serialize`
//!   into a [`Value`] first (the crate-level `to_string` chains the two)
//!
//! ## Output shape
//!
//! ```rust
//! use serde_jsurl::{encode, jsurl, EncodeOptions};
//!
//! let value = jsurl!({ "a": [[1, 2], [], false, true, {}], "b": "hello world" });
//! assert_eq!(
//!     encode(&value, EncodeOptions::default()),
//!     "(a~!!1~2~~!~_F~_T~()~b~hello_world)~"
//! );
//! ```

use crate::escape;
use crate::value::iso_string;
use crate::{EncodeOptions, Error, Map, Result, Value};
use serde::{ser, Serialize};

/// Terminates a value, an array element or an object key.
pub(crate) const TERMINATOR: char = '~';
pub(crate) const ARRAY_OPEN: char = '!';
pub(crate) const OBJECT_OPEN: char = '(';
pub(crate) const OBJECT_CLOSE: char = ')';

/// Midnight suffix that rich dates leave out.
const MIDNIGHT: &str = "T00:00:00.000Z";

/// Where a value sits. Decides whether `true` may be elided.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Context {
    TopLevel,
    ArrayElement,
    ObjectValue,
}

/// Encodes a value tree as jsurl text.
///
/// Encoding is total: every [`Value`] has a representation.
///
/// # Examples
///
/// ```rust
/// use serde_jsurl::{encode, jsurl, EncodeOptions};
///
/// assert_eq!(encode(&jsurl!(true), EncodeOptions::default()), "~");
/// assert_eq!(encode(&jsurl!([true]), EncodeOptions::default()), "!_T~");
/// assert_eq!(encode(&jsurl!({}), EncodeOptions::short()), "(");
/// ```
#[must_use]
pub fn encode(value: &Value, options: EncodeOptions) -> String {
    let mut encoder = Encoder::new(options);
    encoder.write_root(value);
    encoder.into_inner()
}

enum Frame<'v> {
    Array(std::slice::Iter<'v, Value>),
    Object(indexmap::map::Iter<'v, String, Value>),
}

enum Step<'v> {
    Element(&'v Value),
    Entry(&'v str, &'v Value),
    CloseArray,
    CloseObject,
}

/// Writes jsurl text straight into a single buffer.
///
/// Containers are walked with an explicit stack, so arbitrarily deep trees
/// do not grow the call stack.
pub struct Encoder {
    output: String,
    options: EncodeOptions,
}

impl Encoder {
    pub fn new(options: EncodeOptions) -> Self {
        Encoder {
            output: String::with_capacity(64),
            options,
        }
    }

    pub fn into_inner(self) -> String {
        self.output
    }

    /// Writes `value` as the root and applies the top-level terminator rules.
    pub fn write_root(&mut self, value: &Value) {
        let mut stack = Vec::new();
        if let Some(frame) = self.open(value, Context::TopLevel) {
            stack.push(frame);
        }

        while let Some(frame) = stack.last_mut() {
            let step = match frame {
                Frame::Array(items) => items.next().map_or(Step::CloseArray, Step::Element),
                Frame::Object(entries) => entries
                    .find(|(_, v)| !v.is_undefined())
                    .map_or(Step::CloseObject, |(k, v)| Step::Entry(k, v)),
            };

            match step {
                Step::Element(item) => match self.open(item, Context::ArrayElement) {
                    Some(child) => stack.push(child),
                    None => self.output.push(TERMINATOR),
                },
                Step::Entry(key, item) => {
                    escape::write_escaped(&mut self.output, key);
                    self.output.push(TERMINATOR);
                    // An empty key followed by an elided `true` would vanish entirely.
                    let context = if key.is_empty() {
                        Context::ArrayElement
                    } else {
                        Context::ObjectValue
                    };
                    match self.open(item, context) {
                        Some(child) => stack.push(child),
                        None => self.output.push(TERMINATOR),
                    }
                }
                Step::CloseArray => {
                    stack.pop();
                    // A closed object is delimited by its `)`; an array needs a terminator.
                    if !stack.is_empty() {
                        self.output.push(TERMINATOR);
                    }
                }
                Step::CloseObject => {
                    stack.pop();
                    self.trim_terminators();
                    self.output.push(OBJECT_CLOSE);
                }
            }
        }

        self.trim_terminators();
        if self.options.short {
            let kept = self
                .output
                .trim_end_matches([TERMINATOR, OBJECT_CLOSE])
                .len();
            self.output.truncate(kept);
        } else {
            self.output.push(TERMINATOR);
        }
    }

    /// Writes a scalar, or the opening marker of a container and its frame.
    fn open<'v>(&mut self, value: &'v Value, context: Context) -> Option<Frame<'v>> {
        match value {
            Value::Undefined => self.output.push_str("_U"),
            Value::Null => self.output.push_str("_N"),
            Value::Bool(false) => self.output.push_str("_F"),
            Value::Bool(true) => {
                if context == Context::ArrayElement {
                    self.output.push_str("_T");
                }
            }
            Value::Number(n) => self.write_number(*n),
            Value::String(s) => self.write_string(s),
            Value::Date(dt) => {
                let iso = iso_string(dt);
                if self.options.rich {
                    self.output.push_str("_D");
                    self.output
                        .push_str(iso.strip_suffix(MIDNIGHT).unwrap_or(&iso));
                } else {
                    self.write_string(&iso);
                }
            }
            Value::Array(items) => {
                self.output.push(ARRAY_OPEN);
                return Some(Frame::Array(items.iter()));
            }
            Value::Object(map) => {
                self.output.push(OBJECT_OPEN);
                return Some(Frame::Object(map.iter()));
            }
        }
        None
    }

    fn write_number(&mut self, n: f64) {
        if !n.is_finite() {
            self.output.push_str("_N");
        } else if n == 0.0 {
            self.output.push('0');
        } else if (1e-6..1e21).contains(&n.abs()) {
            self.output.push_str(&n.to_string());
        } else {
            self.output.push_str(&format!("{:e}", n));
        }
    }

    fn write_string(&mut self, s: &str) {
        if escape::needs_prefix(s) {
            self.output.push(escape::ESCAPE);
        }
        escape::write_escaped(&mut self.output, s);
    }

    fn trim_terminators(&mut self) {
        let kept = self.output.trim_end_matches(TERMINATOR).len();
        self.output.truncate(kept);
    }
}

/// Serde serializer producing a [`Value`].
///
/// Used by [`to_value`](crate::to_value); every `Serialize` impl acts as the
/// hook that turns a Rust type into something the encoder understands.
pub struct ValueSerializer;

pub struct SerializeVec {
    vec: Vec<Value>,
}

pub struct SerializeMap {
    map: Map,
    current_key: Option<String>,
}

/// Collects the payload of a tuple or struct variant under its variant name.
pub struct SerializeVariant<T> {
    variant: &'static str,
    inner: T,
}

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeVariant<SerializeVec>;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = SerializeVariant<SerializeMap>;

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
        Ok(Value::Array(v.iter().map(|&b| Value::from(b)).collect()))
    }

    fn serialize_none(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
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

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
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
        let mut map = Map::with_capacity(1);
        map.insert(variant.to_string(), to_value(value)?);
        Ok(Value::Object(map))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len.unwrap_or(0)))
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeVariant<SerializeVec>> {
        Ok(SerializeVariant {
            variant,
            inner: SerializeVec::new(len),
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap::new())
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<SerializeMap> {
        Ok(SerializeMap::new())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<SerializeVariant<SerializeMap>> {
        Ok(SerializeVariant {
            variant,
            inner: SerializeMap::new(),
        })
    }
}

impl SerializeVec {
    fn new(capacity: usize) -> Self {
        SerializeVec {
            vec: Vec::with_capacity(capacity),
        }
    }
}

impl SerializeMap {
    fn new() -> Self {
        SerializeMap {
            map: Map::new(),
            current_key: None,
        }
    }
}

impl<T> SerializeVariant<T> {
    fn wrap(variant: &'static str, payload: Value) -> Value {
        let mut map = Map::with_capacity(1);
        map.insert(variant.to_string(), payload);
        Value::Object(map)
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.vec.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Array(self.vec))
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleVariant for SerializeVariant<SerializeVec> {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(&mut self.inner, value)
    }

    fn end(self) -> Result<Value> {
        let payload = ser::SerializeSeq::end(self.inner)?;
        Ok(Self::wrap(self.variant, payload))
    }
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.current_key = Some(key_string(to_value(key)?)?);
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
        self.map.insert(key, to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Object(self.map))
    }
}

impl ser::SerializeStruct for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.map.insert(key.to_string(), to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Object(self.map))
    }
}

impl ser::SerializeStructVariant for SerializeVariant<SerializeMap> {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeStruct::serialize_field(&mut self.inner, key, value)
    }

    fn end(self) -> Result<Value> {
        let payload = ser::SerializeStruct::end(self.inner)?;
        Ok(Self::wrap(self.variant, payload))
    }
}

fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    value.serialize(ValueSerializer)
}

/// Object keys are text; numbers and booleans are stringified like JSON does.
fn key_string(key: Value) -> Result<String> {
    match key {
        Value::String(s) => Ok(s),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(Error::unrepresentable(&format!(
            "map key must be a string, found {}",
            other.kind()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsurl;
    use chrono::{TimeZone, Utc};

    fn enc(value: &Value) -> String {
        encode(value, EncodeOptions::default())
    }

    #[test]
    fn test_scalars() {
        assert_eq!(enc(&Value::Undefined), "_U~");
        assert_eq!(enc(&Value::Null), "_N~");
        assert_eq!(enc(&Value::Bool(false)), "_F~");
        assert_eq!(enc(&Value::Bool(true)), "~");
        assert_eq!(enc(&Value::Number(0.0)), "0~");
        assert_eq!(enc(&Value::Number(1.0)), "1~");
        assert_eq!(enc(&Value::Number(-1.5)), "-1.5~");
        assert_eq!(enc(&Value::from("")), "*~");
    }

    #[test]
    fn test_numbers() {
        assert_eq!(enc(&Value::Number(f64::NAN)), "_N~");
        assert_eq!(enc(&Value::Number(f64::INFINITY)), "_N~");
        assert_eq!(enc(&Value::Number(f64::NEG_INFINITY)), "_N~");
        assert_eq!(enc(&Value::Number(-0.0)), "0~");
        assert_eq!(enc(&Value::Number(1e21)), "1e21~");
        assert_eq!(enc(&Value::Number(1.5e-7)), "1.5e-7~");
        assert_eq!(enc(&Value::Number(0.000001)), "0.000001~");
        assert_eq!(enc(&Value::Number(123456789.0)), "123456789~");
    }

    #[test]
    fn test_string_prefix() {
        assert_eq!(enc(&Value::from("hello world")), "hello_world~");
        assert_eq!(enc(&Value::from("123")), "*123~");
        assert_eq!(enc(&Value::from("_N")), "**_N~");
        assert_eq!(enc(&Value::from("-")), "*-~");
        assert_eq!(enc(&Value::from("~")), "**-~");
    }

    #[test]
    fn test_dates() {
        let dt = Utc.timestamp_millis_opt(1_456_898_746_898).unwrap();
        assert_eq!(enc(&Value::Date(dt)), "*2016-03-02T06:05:46.898Z~");
        assert_eq!(
            encode(&Value::Date(dt), EncodeOptions::rich()),
            "_D2016-03-02T06:05:46.898Z~"
        );

        let midnight = Utc.with_ymd_and_hms(2017, 4, 1, 0, 0, 0).unwrap();
        assert_eq!(enc(&Value::Date(midnight)), "*2017-04-01T00:00:00.000Z~");
        assert_eq!(
            encode(&Value::Date(midnight), EncodeOptions::rich()),
            "_D2017-04-01~"
        );
    }

    #[test]
    fn test_arrays() {
        assert_eq!(enc(&jsurl!([])), "!~");
        assert_eq!(enc(&jsurl!([true])), "!_T~");
        assert_eq!(
            enc(&jsurl!([undefined, null, false, 0, "hello world"])),
            "!_U~_N~_F~0~hello_world~"
        );
        assert_eq!(enc(&jsurl!([[1]])), "!!1~");
        assert_eq!(enc(&jsurl!([[1], 2])), "!!1~~2~");
        assert_eq!(enc(&jsurl!([{}, 1])), "!()1~");
    }

    #[test]
    fn test_objects() {
        assert_eq!(enc(&jsurl!({})), "()~");
        assert_eq!(enc(&jsurl!({"a": true})), "(a)~");
        assert_eq!(enc(&jsurl!({"a": true, "b": true, "c": true})), "(a~~b~~c)~");
        assert_eq!(enc(&jsurl!({"a": [[[1]]]})), "(a~!!!1)~");
        assert_eq!(
            enc(&jsurl!({"()": {}, "c": {"~": "()"}})),
            "(*C*D~()c~(*-~**C*D))~"
        );
    }

    #[test]
    fn test_undefined_entries_are_dropped() {
        assert_eq!(
            enc(&jsurl!({"a": undefined, "b": 1})),
            enc(&jsurl!({"b": 1}))
        );
        assert_ne!(enc(&jsurl!([undefined, 1])), enc(&jsurl!([1])));
    }

    #[test]
    fn test_empty_key_keeps_true() {
        assert_eq!(enc(&jsurl!({"": true})), "(~_T)~");
        assert_ne!(enc(&jsurl!({"": true})), enc(&jsurl!({})));
    }

    #[test]
    fn test_short_mode() {
        let short = EncodeOptions::short();
        assert_eq!(encode(&jsurl!(true), short), "");
        assert_eq!(encode(&jsurl!([]), short), "!");
        assert_eq!(encode(&jsurl!({"a": [[[1]]]}), short), "(a~!!!1");
        assert_eq!(encode(&jsurl!([[{"a": [{"b": [[1]]}]}]]), short), "!!(a~!(b~!!1");
    }

    #[test]
    fn test_deep_nesting_does_not_recurse() {
        let mut value = Value::Number(1.0);
        for _ in 0..10_000 {
            value = Value::Array(vec![value]);
        }
        let text = enc(&value);
        assert!(text.starts_with("!!!!"));
        assert!(text.ends_with("1~"));
        // Iteratively unwrap so dropping the tree does not recurse either.
        while let Value::Array(mut items) = value {
            value = items.pop().unwrap_or(Value::Null);
        }
    }

    #[test]
    fn test_value_serializer_enums() {
        #[derive(Serialize)]
        enum Shape {
            Unit,
            Circle(f64),
            Rect(u32, u32),
            Named { label: String },
        }

        assert_eq!(to_value(&Shape::Unit).unwrap(), jsurl!("Unit"));
        assert_eq!(to_value(&Shape::Circle(1.5)).unwrap(), jsurl!({"Circle": 1.5}));
        assert_eq!(to_value(&Shape::Rect(2, 3)).unwrap(), jsurl!({"Rect": [2, 3]}));
        assert_eq!(
            to_value(&Shape::Named {
                label: "x".to_string()
            })
            .unwrap(),
            jsurl!({"Named": {"label": "x"}})
        );
    }

    #[test]
    fn test_map_keys() {
        let mut ints = std::collections::BTreeMap::new();
        ints.insert(1, "one");
        assert_eq!(to_value(&ints).unwrap(), jsurl!({"1": "one"}));

        let mut bad = std::collections::BTreeMap::new();
        bad.insert(vec![1], "one");
        assert!(matches!(
            to_value(&bad),
            Err(Error::UnrepresentableValue(_))
        ));
    }
}
