//! Configuration for the clipper, the state sanitizer, and the logging facade.
//!
//! - [`ClipOptions`]: depth/item/length budget for [`clip`](crate::clip)
//! - [`SanitizeOptions`]: field policy for [`sanitize_state`](crate::sanitize_state)
//! - [`LoggerConfig`]: development gate and ceilings for [`DevLogger`](crate::DevLogger)
//!
//! Every struct deserializes with per-field defaults, so a partial JSON config
//! only overrides what it names:
//!
//! ```rust
//! use serde_clip::ClipOptions;
//!
//! let options: ClipOptions = serde_json::from_str(r#"{"maxItems": 3}"#).unwrap();
//! assert_eq!(options.max_items, 3);
//! assert_eq!(options.max_depth, 3);
//! ```

use serde::{Deserialize, Serialize};

/// Environment variable read by [`LoggerConfig::from_env`].
pub const DEV_ENV_VAR: &str = "SERDE_CLIP_DEV";

/// Budget applied by the clipper.
///
/// # Examples
///
/// ```rust
/// use serde_clip::ClipOptions;
///
/// let options = ClipOptions::new().with_max_depth(2).with_max_items(3);
/// assert_eq!(options.max_depth, 2);
/// assert_eq!(options.max_length, 5000);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClipOptions {
    /// Characters kept from a string before it is cut.
    pub max_length: usize,
    /// Deepest level expanded; anything below becomes a depth marker.
    pub max_depth: usize,
    /// Array elements kept.
    pub max_items: usize,
    /// Whether truncation markers carry counts.
    pub show_sizes: bool,
}

impl Default for ClipOptions {
    fn default() -> Self {
        ClipOptions {
            max_length: 5000,
            max_depth: 3,
            max_items: 10,
            show_sizes: true,
        }
    }
}

impl ClipOptions {
    /// Logging defaults: 5000 chars, depth 3, 10 items.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tighter budget used before values are persisted: 1000 chars, depth 2, 5 items.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_clip::ClipOptions;
    ///
    /// let storage = ClipOptions::storage();
    /// assert!(storage.max_depth < ClipOptions::default().max_depth);
    /// ```
    #[must_use]
    pub fn storage() -> Self {
        ClipOptions {
            max_length: 1000,
            max_depth: 2,
            max_items: 5,
            show_sizes: true,
        }
    }

    #[must_use]
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    #[must_use]
    pub fn with_show_sizes(mut self, show_sizes: bool) -> Self {
        self.show_sizes = show_sizes;
        self
    }
}

/// Field policy for the state sanitizer.
///
/// # Examples
///
/// ```rust
/// use serde_clip::SanitizeOptions;
///
/// let options = SanitizeOptions::new()
///     .with_max_items(3)
///     .with_redact_field("sessionId");
/// assert!(options.is_redacted("sessionId"));
/// assert!(options.is_redacted("apiKey"));
/// assert!(options.is_metadata_only("businesses"));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SanitizeOptions {
    pub max_depth: usize,
    /// Arrays longer than this become an `[ARRAY_METADATA]` record.
    pub max_items: usize,
    /// Objects with more keys than this become an `[OBJECT_METADATA]` record.
    pub max_keys: usize,
    /// Keys whose values are always replaced by `[REDACTED]`.
    pub redact_fields: Vec<String>,
    /// Keys whose values are summarized in one line instead of walked.
    pub metadata_fields: Vec<String>,
    /// Budget for leaf values.
    pub leaf: ClipOptions,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        SanitizeOptions {
            max_depth: 5,
            max_items: 10,
            max_keys: 25,
            redact_fields: [
                "apiKey",
                "api_key",
                "token",
                "accessToken",
                "refreshToken",
                "password",
                "secret",
                "authorization",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            metadata_fields: ["businesses", "photos", "reviews", "results"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            leaf: ClipOptions::default(),
        }
    }
}

impl SanitizeOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    #[must_use]
    pub fn with_max_keys(mut self, max_keys: usize) -> Self {
        self.max_keys = max_keys;
        self
    }

    /// Adds one key to the redaction list.
    #[must_use]
    pub fn with_redact_field(mut self, field: &str) -> Self {
        if !self.is_redacted(field) {
            self.redact_fields.push(field.to_string());
        }
        self
    }

    /// Replaces the redaction list.
    #[must_use]
    pub fn with_redact_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.redact_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Adds one key to the metadata-only list.
    #[must_use]
    pub fn with_metadata_field(mut self, field: &str) -> Self {
        if !self.is_metadata_only(field) {
            self.metadata_fields.push(field.to_string());
        }
        self
    }

    /// Replaces the metadata-only list.
    #[must_use]
    pub fn with_metadata_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_leaf(mut self, leaf: ClipOptions) -> Self {
        self.leaf = leaf;
        self
    }

    /// Exact key-name match against the redaction list.
    #[must_use]
    pub fn is_redacted(&self, key: &str) -> bool {
        self.redact_fields.iter().any(|f| f == key)
    }

    /// Exact key-name match against the metadata-only list.
    #[must_use]
    pub fn is_metadata_only(&self, key: &str) -> bool {
        self.metadata_fields.iter().any(|f| f == key)
    }
}

/// Settings fixed when a [`DevLogger`](crate::DevLogger) is built.
///
/// # Examples
///
/// ```rust
/// use serde_clip::LoggerConfig;
///
/// let config = LoggerConfig::new().with_enabled(true).with_max_serialized_len(2_000);
/// assert!(config.enabled);
/// assert_eq!(config.max_serialized_len, 2_000);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoggerConfig {
    /// Development gate. When off, every facade call returns immediately.
    pub enabled: bool,
    /// Ceiling on the serialized payload of one entry, checked after clipping.
    pub max_serialized_len: usize,
    /// Budget used by `log_safe` when the caller passes none.
    pub clip: ClipOptions,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        LoggerConfig {
            enabled: cfg!(debug_assertions),
            max_serialized_len: 10_000,
            clip: ClipOptions::default(),
        }
    }
}

impl LoggerConfig {
    /// Defaults; the gate follows `debug_assertions`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, with the gate overridden by `SERDE_CLIP_DEV` when it is set
    /// to a recognised value (`1`/`true`/`on`/`yes` or `0`/`false`/`off`/`no`).
    #[must_use]
    pub fn from_env() -> Self {
        let config = Self::default();
        match std::env::var(DEV_ENV_VAR).ok().as_deref().and_then(parse_flag) {
            Some(enabled) => config.with_enabled(enabled),
            None => config,
        }
    }

    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_max_serialized_len(mut self, max_serialized_len: usize) -> Self {
        self.max_serialized_len = max_serialized_len;
        self
    }

    #[must_use]
    pub fn with_clip(mut self, clip: ClipOptions) -> Self {
        self.clip = clip;
        self
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
