//! Configuration options for RDN parsing and serialization.
//!
//! - [`ParseOptions`]: resource limits applied while reading
//! - [`StringifyOptions`]: output encodings chosen while writing
//! - [`DateFormat`] and [`BinaryFormat`]: the output encodings themselves
//!
//! Input acceptance never depends on the output options: both date forms and
//! both binary forms are always accepted by the reader.
//!
//! ## Examples
//!
//! ```rust
//! use rdn::{parse_with_options, stringify_with_options, BinaryFormat, ParseOptions, StringifyOptions};
//!
//! let value = parse_with_options("b\"SGk=\"", &ParseOptions::new().with_max_binary_size(16)).unwrap();
//!
//! let options = StringifyOptions::new().with_binary_format(BinaryFormat::Hex);
//! assert_eq!(stringify_with_options(&value, &options), "x\"4869\"");
//! ```

/// Default maximum container nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Default maximum decoded size of a single binary literal (64 MiB).
pub const DEFAULT_MAX_BINARY_SIZE: usize = 64 * 1024 * 1024;

/// Limits that bound the memory and stack use of a parse.
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
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    pub max_depth: usize,
    pub max_binary_size: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            max_depth: DEFAULT_MAX_DEPTH,
            max_binary_size: DEFAULT_MAX_BINARY_SIZE,
        }
    }
}

impl ParseOptions {
    /// Creates default limits (depth 256, 64 MiB binary payloads).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum container nesting depth.
    ///
    /// A document nested exactly `max_depth` containers deep is accepted.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the maximum decoded size, in bytes, of a single binary literal.
    #[must_use]
    pub fn with_max_binary_size(mut self, max_binary_size: usize) -> Self {
        self.max_binary_size = max_binary_size;
        self
    }
}

/// How `DateTime` values are written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DateFormat {
    /// `@YYYY-MM-DDTHH:MM:SS.mmmZ`
    #[default]
    Iso,
    /// `@<milliseconds since epoch>`
    ///
    /// Instants whose millisecond count has ten digits or fewer (or is
    /// negative) are still written in ISO form, because the reader would
    /// interpret a short digit run as seconds.
    UnixMillis,
}

/// How `Binary` values are written.
///
/// # Examples
///
/// ```rust
/// use rdn::BinaryFormat;
///
/// assert_eq!(BinaryFormat::Base64.prefix(), 'b');
/// assert_eq!(BinaryFormat::Hex.prefix(), 'x');
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BinaryFormat {
    /// `b"<standard base64, padded>"`
    #[default]
    Base64,
    /// `x"<uppercase hex>"`
    Hex,
}

impl BinaryFormat {
    /// Returns the literal prefix character for this encoding.
    #[must_use]
    pub const fn prefix(&self) -> char {
        match self {
            BinaryFormat::Base64 => 'b',
            BinaryFormat::Hex => 'x',
        }
    }
}

/// Configuration options for RDN output.
///
/// # Examples
///
/// ```rust
/// use rdn::{DateFormat, StringifyOptions};
///
/// // Default canonical output
/// let options = StringifyOptions::new();
/// assert!(!options.strip_collection_keywords);
///
/// // Unix timestamps, bare braces for non-empty maps and sets
/// let options = StringifyOptions::new()
///     .with_date_format(DateFormat::UnixMillis)
///     .with_strip_collection_keywords(true);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StringifyOptions {
    pub date_format: DateFormat,
    pub binary_format: BinaryFormat,
    /// Write non-empty maps and sets as bare `{...}`. Empty ones always keep
    /// their `Map{}` / `Set{}` keyword so they stay distinct from `{}`.
    pub strip_collection_keywords: bool,
}

impl StringifyOptions {
    /// Creates default options (ISO dates, base64 binary, explicit keywords).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the date output encoding.
    #[must_use]
    pub fn with_date_format(mut self, date_format: DateFormat) -> Self {
        self.date_format = date_format;
        self
    }

    /// Sets the binary output encoding.
    #[must_use]
    pub fn with_binary_format(mut self, binary_format: BinaryFormat) -> Self {
        self.binary_format = binary_format;
        self
    }

    /// Enables or disables stripping of the `Map`/`Set` keyword on non-empty collections.
    #[must_use]
    pub fn with_strip_collection_keywords(mut self, strip: bool) -> Self {
        self.strip_collection_keywords = strip;
        self
    }
}
