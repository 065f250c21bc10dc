//! Error types for jsurl encoding and decoding.
//!
//! Encoding a [`Value`](crate::Value) never fails. Errors come from three places:
//!
//! - **Decoding**: the input does not follow the grammar ([`Error::MalformedInput`])
//!   or nests deeper than allowed ([`Error::DepthExceeded`])
//! - **Serde bridging**: a Rust value has no jsurl representation
//!   ([`Error::UnrepresentableValue`]) or a `Deserialize` impl rejected the data
//!   ([`Error::Custom`])
//! - **I/O**: reading or writing through `from_reader` / `to_writer`
//!
//! ## Examples
//!
//! ```rust
//! use serde_jsurl::{decode, DecodeOptions, Error};
//!
//! let err = decode("12323NOTANUMBER", DecodeOptions::default()).unwrap_err();
//! assert!(matches!(err, Error::MalformedInput { position: 5, .. }));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors that can occur while working with jsurl text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The input does not match the grammar.
    ///
    /// `position` is a byte offset into the decoded input (after the
    /// percent-decoding pass when `de_uri` is enabled).
    #[error("Malformed input at position {position}: {msg}")]
    MalformedInput { position: usize, msg: String },

    /// Containers are nested deeper than the configured limit.
    #[error("Nesting depth exceeds the limit of {limit}")]
    DepthExceeded { limit: usize },

    /// A Rust value that cannot be expressed as a jsurl value.
    #[error("Unrepresentable value: {0}")]
    UnrepresentableValue(String),

    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a grammar error at the given byte offset.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_jsurl::Error;
    ///
    /// let err = Error::malformed(3, "unknown escape designator");
    /// assert!(err.to_string().contains("position 3"));
    /// ```
    pub fn malformed(position: usize, msg: &str) -> Self {
        Error::MalformedInput {
            position,
            msg: msg.to_string(),
        }
    }

    /// Creates a nesting-depth error.
    pub fn depth_exceeded(limit: usize) -> Self {
        Error::DepthExceeded { limit }
    }

    /// Creates an error for Rust values with no jsurl mapping.
    pub fn unrepresentable(msg: &str) -> Self {
        Error::UnrepresentableValue(msg.to_string())
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_jsurl::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for reading/writing failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Byte offset of a grammar error, if this is one.
    #[must_use]
    pub fn position(&self) -> Option<usize> {
        match self {
            Error::MalformedInput { position, .. } => Some(*position),
            _ => None,
        }
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
