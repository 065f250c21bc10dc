//! # serde_jsurl
//!
//! A Serde-compatible codec for jsurl, a compact URL-safe text encoding of
//! JSON-like values.
//!
//! ## What is jsurl?
//!
//! jsurl writes structured data so it can sit in a URL query or fragment
//! without percent-encoding. The output never contains `% ? # & = ' < \`,
//! newlines or NUL, and decoding gives back exactly the value that was encoded.
//! The decoder is lenient and also accepts some non-canonical text, such as a
//! stray terminator before `)`.
//!
//! ## Key Features
//!
//! - **URL-safe**: reserved characters are escaped with `*` designators
//! - **Canonical**: the encoder emits one canonical form per value, and it decodes back to it
//! - **Short mode**: trailing markers implied by end of input are dropped
//! - **Rich mode**: dates survive as dates instead of turning into strings
//! - **Serde Compatible**: works with `#[derive(Serialize, Deserialize)]` types
//!
//! ## Quick Start
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use serde_jsurl::{from_str, to_string};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Filter {
//!     query: String,
//!     page: u32,
//!     exact: bool,
//! }
//!
//! let filter = Filter {
//!     query: "rust (lang)".to_string(),
//!     page: 2,
//!     exact: true,
//! };
//!
//! let text = to_string(&filter).unwrap();
//! assert_eq!(text, "(query~rust_*Clang*D~page~2~exact)~");
//!
//! let back: Filter = from_str(&text).unwrap();
//! assert_eq!(filter, back);
//! ```
//!
//! ## Grammar at a Glance
//!
//! | Value | Encoding |
//! |-------|----------|
//! | undefined / null / false | `_U` / `_N` / `_F` |
//! | true | elided, `_T` inside arrays |
//! | number | decimal text, `_N` when not finite |
//! | string | escaped text, prefixed with `*` unless it starts with a letter |
//! | date (rich) | `_D` + ISO-8601 |
//! | array | `!` + items each followed by `~` |
//! | object | `(` + `key~value~` pairs + `)` |
//!
//! Every top-level encoding ends with a single `~`, which short mode leaves off
//! together with any closing `)`.
//!
//! ### Dynamic Values with jsurl! Macro
//!
//! ```rust
//! use serde_jsurl::{decode, encode, jsurl, DecodeOptions, EncodeOptions};
//!
//! let data = jsurl!({ "tags": ["a b", "c"], "hidden": false });
//! let text = encode(&data, EncodeOptions::short());
//! assert_eq!(text, "(tags~!a_b~c~~hidden~_F");
//! assert_eq!(decode(&text, DecodeOptions::short()).unwrap(), data);
//! ```

pub mod de;
pub mod error;
pub mod escape;
pub mod macros;
pub mod map;
pub mod options;
pub mod ser;
pub mod value;

pub use de::{decode, from_value, try_decode, try_decode_from, try_decode_or, ValueDeserializer};
pub use error::{Error, Result};
pub use map::Map;
pub use options::{DecodeOptions, EncodeOptions};
pub use ser::{encode, ValueSerializer};
pub use value::Value;

use serde::{Deserialize, Serialize};
use std::io;

/// Serialize any `T: Serialize` to jsurl text.
///
/// # Examples
///
/// ```rust
/// use serde_jsurl::to_string;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// assert_eq!(to_string(&Point { x: 1, y: -2 }).unwrap(), "(x~1~y~-2)~");
/// ```
///
/// # Errors
///
/// Returns an error if the value has no jsurl representation (e.g. a map with
/// non-scalar keys).
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    to_string_with_options(value, EncodeOptions::default())
}

/// Serialize any `T: Serialize` to jsurl text with custom options.
///
/// # Examples
///
/// ```rust
/// use serde_jsurl::{to_string_with_options, EncodeOptions};
///
/// let text = to_string_with_options(&vec!["a", "b"], EncodeOptions::short()).unwrap();
/// assert_eq!(text, "!a~b");
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_with_options<T>(value: &T, options: EncodeOptions) -> Result<String>
where
    T: ?Sized + Serialize,
{
    Ok(encode(&to_value(value)?, options))
}

/// Convert any `T: Serialize` to a [`Value`].
///
/// # Examples
///
/// ```rust
/// use serde_jsurl::{to_value, Value};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// let value: Value = to_value(&Point { x: 1, y: 2 }).unwrap();
/// assert!(value.is_object());
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_value<T>(value: &T) -> Result<Value>
where
    T: ?Sized + Serialize,
{
    value.serialize(ValueSerializer)
}

/// Serialize any `T: Serialize` to a writer as jsurl text.
///
/// # Examples
///
/// ```rust
/// use serde_jsurl::to_writer;
///
/// let mut buffer = Vec::new();
/// to_writer(&mut buffer, &[1, 2]).unwrap();
/// assert_eq!(buffer, b"!1~2~");
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
    to_writer_with_options(writer, value, EncodeOptions::default())
}

/// Serialize any `T: Serialize` to a writer with custom options.
///
/// # Errors
///
/// Returns an error if serialization fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer_with_options<W, T>(mut writer: W, value: &T, options: EncodeOptions) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    let text = to_string_with_options(value, options)?;
    writer
        .write_all(text.as_bytes())
        .map_err(|e| Error::io(&e.to_string()))?;
    Ok(())
}

/// Deserialize an instance of type `T` from jsurl text.
///
/// # Examples
///
/// ```rust
/// use serde_jsurl::from_str;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let point: Point = from_str("(x~1~y~2)~").unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
///
/// # Errors
///
/// Returns an error if the input is not valid jsurl or cannot be deserialized
/// to type `T`. Grammar errors carry the byte offset of the problem.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str<'a, T>(s: &'a str) -> Result<T>
where
    T: Deserialize<'a>,
{
    from_str_with_options(s, DecodeOptions::default())
}

/// Deserialize an instance of type `T` from jsurl text with custom options.
///
/// # Examples
///
/// ```rust
/// use serde_jsurl::{from_str_with_options, DecodeOptions};
/// use std::collections::BTreeMap;
///
/// let options = DecodeOptions::short().with_de_uri(true);
/// let map: BTreeMap<String, String> = from_str_with_options("(q~*%27quoted", options).unwrap();
/// assert_eq!(map["q"], "'quoted");
/// ```
///
/// # Errors
///
/// Returns an error if the input is not valid jsurl or cannot be deserialized
/// to type `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str_with_options<'a, T>(s: &'a str, options: DecodeOptions) -> Result<T>
where
    T: Deserialize<'a>,
{
    T::deserialize(ValueDeserializer::new(decode(s, options)?))
}

/// Deserialize an instance of type `T` from an I/O stream of jsurl text.
///
/// # Examples
///
/// ```rust
/// use serde_jsurl::from_reader;
/// use std::io::Cursor;
///
/// let numbers: Vec<u8> = from_reader(Cursor::new(b"!1~2~3~")).unwrap();
/// assert_eq!(numbers, vec![1, 2, 3]);
/// ```
///
/// # Errors
///
/// Returns an error if reading from the reader fails, the input is not valid
/// jsurl, or the data cannot be deserialized to type `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R, T>(mut reader: R) -> Result<T>
where
    R: io::Read,
    T: for<'de> Deserialize<'de>,
{
    let mut string = String::new();
    reader
        .read_to_string(&mut string)
        .map_err(|e| Error::io(&e.to_string()))?;
    from_str(&string)
}

/// Deserialize an instance of type `T` from bytes of jsurl text.
///
/// # Examples
///
/// ```rust
/// use serde_jsurl::from_slice;
///
/// let words: Vec<String> = from_slice(b"!hello_world~*~").unwrap();
/// assert_eq!(words, vec!["hello world", ""]);
/// ```
///
/// # Errors
///
/// Returns an error if the bytes are not valid UTF-8, not valid jsurl, or
/// cannot be deserialized to type `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice<'a, T>(v: &'a [u8]) -> Result<T>
where
    T: Deserialize<'a>,
{
    let s = std::str::from_utf8(v)
        .map_err(|e| Error::malformed(e.valid_up_to(), "input is not valid UTF-8"))?;
    from_str(s)
}
