//! Error types for RDN parsing and serialization.
//!
//! RDN distinguishes "bad data" from "data that is valid but too large or too
//! deep to process safely":
//!
//! - **Syntax errors**: malformed input, always carrying the byte offset (plus a
//!   derived line and column) at which the problem was detected
//! - **Limit errors**: nesting depth or decoded binary size above the configured
//!   maximum (see [`ParseOptions`](crate::ParseOptions))
//! - **Cycle errors**: a `Serialize` graph that contains itself
//! - **Custom errors**: serde and reviver/replacer callback failures
//!
//! ## Examples
//!
//! ```rust
//! use rdn::parse;
//!
//! let err = parse("[1, 2,]").unwrap_err();
//! assert!(err.is_syntax());
//! assert_eq!(err.offset(), Some(6));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors that can occur while reading or writing RDN.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Malformed input.
    #[error("Syntax error at line {line}, column {column} (offset {offset}): {msg}")]
    Syntax {
        offset: usize,
        line: usize,
        column: usize,
        msg: String,
    },

    /// Containers nested deeper than the configured maximum.
    #[error("Nesting depth exceeds the limit of {limit} at offset {offset}")]
    DepthLimitExceeded { offset: usize, limit: usize },

    /// A binary literal decodes to more bytes than the configured maximum.
    #[error("Binary literal of {size} bytes exceeds the limit of {limit} bytes at offset {offset}")]
    BinaryLimitExceeded {
        offset: usize,
        limit: usize,
        size: usize,
    },

    /// A value graph refers back to a value that is still being serialized.
    #[error("Converting circular structure to RDN (value of type `{type_name}` contains itself)")]
    Cycle { type_name: String },

    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a syntax error at `offset`, deriving line and column from `source`.
    ///
    /// Lines are 1-based and split on `\n`; columns are 1-based and count
    /// characters, not bytes.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rdn::Error;
    ///
    /// let err = Error::syntax("[1,\n  x]", 6, "Unexpected character 'x'");
    /// assert!(err.to_string().contains("line 2, column 3"));
    /// ```
    pub fn syntax(source: &str, offset: usize, msg: &str) -> Self {
        let offset = offset.min(source.len());
        let before = source.get(..offset).unwrap_or(source);
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;
        Error::Syntax {
            offset,
            line,
            column,
            msg: msg.to_string(),
        }
    }

    /// Creates a depth limit error.
    pub fn depth_limit(offset: usize, limit: usize) -> Self {
        Error::DepthLimitExceeded { offset, limit }
    }

    /// Creates a binary size limit error.
    pub fn binary_limit(offset: usize, limit: usize, size: usize) -> Self {
        Error::BinaryLimitExceeded {
            offset,
            limit,
            size,
        }
    }

    /// Creates a cycle error naming the type that was revisited.
    pub fn cycle(type_name: &str) -> Self {
        Error::Cycle {
            type_name: type_name.to_string(),
        }
    }

    /// Creates a custom error with a display message.
    ///
    /// Reviver and replacer callbacks use this to report their own failures.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rdn::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for reader/writer failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Returns `true` for malformed input.
    #[must_use]
    pub const fn is_syntax(&self) -> bool {
        matches!(self, Error::Syntax { .. })
    }

    /// Returns `true` when the input was rejected for exceeding a configured limit.
    #[must_use]
    pub const fn is_limit(&self) -> bool {
        matches!(
            self,
            Error::DepthLimitExceeded { .. } | Error::BinaryLimitExceeded { .. }
        )
    }

    /// Returns `true` for circular structures.
    #[must_use]
    pub const fn is_cycle(&self) -> bool {
        matches!(self, Error::Cycle { .. })
    }

    /// Byte offset into the input for positioned errors.
    #[must_use]
    pub const fn offset(&self) -> Option<usize> {
        match self {
            Error::Syntax { offset, .. }
            | Error::DepthLimitExceeded { offset, .. }
            | Error::BinaryLimitExceeded { offset, .. } => Some(*offset),
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
