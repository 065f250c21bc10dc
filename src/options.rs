//! Configuration options for encoding and decoding.
//!
//! - [`EncodeOptions`]: short output and rich (date-preserving) output
//! - [`DecodeOptions`]: short input, percent-decoding pre-pass and nesting limit
//!
//! ## Examples
//!
//! ```rust
//! use serde_jsurl::{encode, decode, jsurl, DecodeOptions, EncodeOptions};
//!
//! let value = jsurl!({ "page": 2, "open": true });
//!
//! let text = encode(&value, EncodeOptions::short());
//! assert_eq!(text, "(page~2~open");
//!
//! let back = decode(&text, DecodeOptions::short()).unwrap();
//! assert_eq!(back, value);
//! ```

/// Default maximum nesting of arrays and objects accepted by the decoder.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Options controlling the encoder.
///
/// # Examples
///
/// ```rust
/// use serde_jsurl::EncodeOptions;
///
/// let options = EncodeOptions::new().with_short(true).with_rich(true);
/// assert!(options.short);
/// assert!(options.rich);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Omit the trailing terminator and closing markers implied by end of input.
    pub short: bool,
    /// Keep dates as dates (`_D` tag) instead of encoding them as strings.
    pub rich: bool,
}

impl EncodeOptions {
    /// Creates default options (full output, dates as strings).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for output meant to be the last component of a URL.
    #[must_use]
    pub fn short() -> Self {
        EncodeOptions {
            short: true,
            ..Default::default()
        }
    }

    /// Options that preserve dates as a distinct type.
    #[must_use]
    pub fn rich() -> Self {
        EncodeOptions {
            rich: true,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_short(mut self, short: bool) -> Self {
        self.short = short;
        self
    }

    #[must_use]
    pub fn with_rich(mut self, rich: bool) -> Self {
        self.rich = rich;
        self
    }
}

/// Options controlling the decoder.
///
/// # Examples
///
/// ```rust
/// use serde_jsurl::DecodeOptions;
///
/// let options = DecodeOptions::new().with_de_uri(true).with_max_depth(16);
/// assert!(options.de_uri);
/// assert!(!options.short);
/// assert_eq!(options.max_depth, 16);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Accept input whose trailing closing markers were dropped by short encoding.
    pub short: bool,
    /// Undo percent-encoding applied by outer URL layers before parsing.
    pub de_uri: bool,
    /// Deepest nesting of arrays and objects accepted before failing.
    pub max_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            short: false,
            de_uri: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl DecodeOptions {
    /// Creates default options (strict closing markers, no percent-decoding).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for reading text produced with [`EncodeOptions::short`].
    #[must_use]
    pub fn short() -> Self {
        DecodeOptions {
            short: true,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_short(mut self, short: bool) -> Self {
        self.short = short;
        self
    }

    #[must_use]
    pub fn with_de_uri(mut self, de_uri: bool) -> Self {
        self.de_uri = de_uri;
        self
    }

    /// Sets the nesting limit. A limit of zero rejects every array and object.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
