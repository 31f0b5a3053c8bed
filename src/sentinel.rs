//! Marker strings written in place of content that was cut, hidden, or unreadable.
//!
//! Downstream tooling matches on these literals (for example the cache checker in
//! [`integrity`](crate::integrity) rejects records whose `name` is
//! [`MAX_DEPTH_EXCEEDED`]). Changing any of them requires bumping
//! [`SENTINEL_VERSION`].

/// Version of the marker vocabulary below.
pub const SENTINEL_VERSION: u32 = 1;

pub const MAX_DEPTH_EXCEEDED: &str = "[MAX_DEPTH_EXCEEDED]";
pub const CIRCULAR: &str = "[CIRCULAR]";
pub const FUNCTION: &str = "[Function]";
pub const TRUNCATED: &str = "[TRUNCATED]";
pub const REDACTED: &str = "[REDACTED]";
pub const ARRAY_METADATA: &str = "[ARRAY_METADATA]";
pub const OBJECT_METADATA: &str = "[OBJECT_METADATA]";
pub const NOT_ARRAY: &str = "[NOT_ARRAY]";
pub const NOT_OBJECT: &str = "[NOT_OBJECT]";

/// Every fixed marker, for scanners.
pub const ALL: [&str; 9] = [
    MAX_DEPTH_EXCEEDED,
    CIRCULAR,
    FUNCTION,
    TRUNCATED,
    REDACTED,
    ARRAY_METADATA,
    OBJECT_METADATA,
    NOT_ARRAY,
    NOT_OBJECT,
];

/// Suffix appended to a string cut at `max_length` characters.
#[must_use]
pub fn truncated_string(original_chars: usize, show_sizes: bool) -> String {
    if show_sizes {
        format!("... [TRUNCATED: {} chars]", original_chars)
    } else {
        format!("... {}", TRUNCATED)
    }
}

/// Trailing array element replacing `dropped` items.
#[must_use]
pub fn truncated_items(dropped: usize, show_sizes: bool) -> String {
    if show_sizes {
        format!("[TRUNCATED: {} more items]", dropped)
    } else {
        TRUNCATED.to_string()
    }
}

/// Value stored under the [`TRUNCATED`] key of a clipped object.
#[must_use]
pub fn truncated_keys(dropped: usize, show_sizes: bool) -> String {
    if show_sizes {
        format!("{} more keys", dropped)
    } else {
        "more keys".to_string()
    }
}

/// Suffix appended to a cut stack trace.
pub const STACK_SUFFIX: &str = "... [TRUNCATED]";

#[must_use]
pub fn thrown(msg: &str) -> String {
    format!("[THROWN: {}]", msg)
}

#[must_use]
pub fn too_large(serialized_len: usize) -> String {
    format!("[TOO_LARGE: {} chars]", serialized_len)
}

#[must_use]
pub fn log_error(msg: &str) -> String {
    format!("[LOG_ERROR: {}]", msg)
}

#[must_use]
pub fn unserializable(kind: &str) -> String {
    format!("[UNSERIALIZABLE: {}]", kind)
}

#[must_use]
pub fn stringify_error(msg: &str) -> String {
    format!("[STRINGIFY_ERROR: {}]", msg)
}

/// Returns `true` if `s` is, or starts with, a marker produced by this crate.
///
/// # Examples
///
/// ```rust
/// use serde_clip::sentinel;
///
/// assert!(sentinel::is_sentinel("[CIRCULAR]"));
/// assert!(sentinel::is_sentinel("[TRUNCATED: 3 more items]"));
/// assert!(!sentinel::is_sentinel("Joe's Pizza"));
/// ```
#[must_use]
pub fn is_sentinel(s: &str) -> bool {
    ALL.contains(&s)
        || s.starts_with("[TRUNCATED: ")
        || s.starts_with("[THROWN: ")
        || s.starts_with("[TOO_LARGE: ")
        || s.starts_with("[LOG_ERROR: ")
        || s.starts_with("[UNSERIALIZABLE: ")
        || s.starts_with("[STRINGIFY_ERROR: ")
}
