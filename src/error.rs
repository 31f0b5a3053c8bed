//! Error types for clipping and JSON serialization.
//!
//! Most of the crate never surfaces these: [`clip`](crate::clip),
//! [`safe_stringify`](crate::safe_stringify) and every [`DevLogger`](crate::DevLogger)
//! method fold failures into sentinel strings. The fallible entry points
//! ([`try_clip`](crate::try_clip), [`to_json_string`](crate::to_json_string),
//! [`to_value`](crate::to_value), [`from_json_str`](crate::from_json_str))
//! return them directly.
//!
//! ## Error Categories
//!
//! - **Walk failures**: a [`Getter`](crate::Getter) failed, or a shared node was
//!   mutably borrowed while being read
//! - **Serialization failures**: cycles or runaway nesting reaching the JSON
//!   writer, values with no JSON form, exotic values refusing to serialize
//!
//! ## Examples
//!
//! ```rust
//! use serde_clip::{to_json_string, Error, Value};
//!
//! let err = to_json_string(&Value::Undefined).unwrap_err();
//! assert!(matches!(err, Error::Unserializable(_)));
//! assert_eq!(err.to_string(), "value has no JSON representation: undefined");
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors raised while walking or serializing a value graph.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A lazily evaluated property failed when read
    #[error("getter failed: {0}")]
    Getter(String),

    /// A shared node was mutably borrowed while the walker tried to read it
    #[error("node is already mutably borrowed")]
    Unreadable,

    /// The JSON writer met a node that is its own ancestor
    #[error("converting circular structure to JSON")]
    Circular,

    /// The JSON writer went deeper than its nesting limit, e.g. through getters
    /// that keep producing fresh nodes
    #[error("nesting deeper than {0} levels")]
    TooDeep(usize),

    /// The value has no JSON representation (undefined, function, symbol, bigint)
    #[error("value has no JSON representation: {0}")]
    Unserializable(&'static str),

    /// An exotic value could not produce its JSON form
    #[error("exotic value `{type_name}` failed to serialize: {msg}")]
    Exotic { type_name: String, msg: String },

    /// Failure reported by `serde_json`
    #[error("JSON error: {0}")]
    Json(String),

    /// Unsupported type for value conversion
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a getter failure from any displayable message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_clip::Error;
    ///
    /// let err = Error::getter("permission denied");
    /// assert_eq!(err.to_string(), "getter failed: permission denied");
    /// ```
    pub fn getter<T: fmt::Display>(msg: T) -> Self {
        Error::Getter(msg.to_string())
    }

    /// Creates an unsupported type error for types that cannot become a [`Value`](crate::Value).
    pub fn unsupported_type(msg: &str) -> Self {
        Error::UnsupportedType(msg.to_string())
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_clip::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Short name of the failure, used inside sentinel strings.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Getter(_) => "getter",
            Error::Unreadable => "unreadable",
            Error::Circular => "circular",
            Error::TooDeep(_) => "too_deep",
            Error::Unserializable(kind) => *kind,
            Error::Exotic { .. } => "exotic",
            Error::Json(_) => "json",
            Error::UnsupportedType(_) => "unsupported",
            Error::Custom(_) => "custom",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err.to_string())
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(Error::Circular.kind(), "circular");
        assert_eq!(Error::Unserializable("bigint").kind(), "bigint");
        assert_eq!(Error::getter("x").kind(), "getter");
    }

    #[test]
    fn test_from_json_error() {
        let err = serde_json::from_str::<u32>("nope").unwrap_err();
        assert!(matches!(Error::from(err), Error::Json(_)));
    }
}
