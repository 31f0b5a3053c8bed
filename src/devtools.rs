//! State sanitizing for developer tooling, and the context logger built on it.
//!
//! [`sanitize_state`] is a policy-driven variant of the clipper aimed at
//! application state trees: secrets are redacted by key, bulky result lists
//! are reduced to a one-line summary, and oversized collections become
//! metadata records instead of being cut mid-way.
//!
//! ```rust
//! use serde_clip::{sanitize_state, value, SanitizeOptions};
//!
//! let state = value!({
//!     "session": { "token": "abc123", "user": "kim" },
//!     "search": { "businesses": [{ "id": "b1", "name": "Noodle Bar" }] },
//! });
//! let clean = sanitize_state(&state, &SanitizeOptions::default());
//! assert_eq!(
//!     clean,
//!     value!({
//!         "session": { "token": "[REDACTED]", "user": "kim" },
//!         "search": { "businesses": "Array(1) first: {id, name}" },
//!     })
//! );
//! ```

use crate::clip::{
    clip_string, clip_with_options, error_like, error_record, failure_message, iso_string,
};
use crate::guard::VisitGuard;
use crate::logger::{DevLogger, LogSink, Sink};
use crate::value::{Array, Object};
use crate::{sentinel, ClipMap, SanitizeOptions, Value};
use log::Level;

/// Keys named inside a metadata summary of an object element.
const SUMMARY_KEYS: usize = 3;

/// Characters kept from a string element inside a metadata summary.
const SUMMARY_STRING_LEN: usize = 40;

/// Produces a bounded, redacted copy of `state`. Never fails.
///
/// # Examples
///
/// ```rust
/// use serde_clip::{sanitize_state, Value, SanitizeOptions};
///
/// let list = Value::from((0..100i64).map(Value::from).collect::<Vec<_>>());
/// let clean = sanitize_state(&list, &SanitizeOptions::new().with_max_items(3));
/// let meta = clean.get("[ARRAY_METADATA]").unwrap();
/// assert_eq!(meta.get("length"), Some(Value::from(100)));
/// assert_eq!(meta.get("truncated"), Some(Value::from(97)));
/// ```
#[must_use]
pub fn sanitize_state(state: &Value, options: &SanitizeOptions) -> Value {
    Sanitizer {
        options,
        guard: VisitGuard::new(),
    }
    .walk(state, 0)
}

struct Sanitizer<'a> {
    options: &'a SanitizeOptions,
    guard: VisitGuard,
}

impl Sanitizer<'_> {
    fn walk(&mut self, value: &Value, depth: usize) -> Value {
        if depth > self.options.max_depth {
            return Value::from(sentinel::MAX_DEPTH_EXCEEDED);
        }

        match value {
            Value::Getter(getter) => match getter.get() {
                Ok(resolved @ Value::Getter(_)) => self.walk(&resolved, depth + 1),
                Ok(resolved) => self.walk(&resolved, depth),
                Err(err) => Value::String(sentinel::thrown(&failure_message(&err))),
            },
            Value::Date(dt) => Value::String(iso_string(dt)),
            Value::Error(err) => error_record(err, &self.options.leaf),
            Value::Array(arr) => {
                if !self.guard.enter(arr.id()) {
                    return Value::from(sentinel::CIRCULAR);
                }
                let out = self.walk_array(arr, depth);
                self.guard.leave(arr.id());
                out
            }
            Value::Object(obj) => {
                if !self.guard.enter(obj.id()) {
                    return Value::from(sentinel::CIRCULAR);
                }
                let out = self.walk_object(obj, depth);
                self.guard.leave(obj.id());
                out
            }
            leaf => clip_with_options(leaf, &self.options.leaf),
        }
    }

    fn walk_array(&mut self, arr: &Array, depth: usize) -> Value {
        let max_items = self.options.max_items;
        let (total, head) = match arr.try_read() {
            Ok(items) => (
                items.len(),
                items.iter().take(max_items).cloned().collect::<Vec<_>>(),
            ),
            Err(err) => return Value::String(sentinel::thrown(&err.to_string())),
        };

        let walked: Vec<Value> = head.iter().map(|item| self.walk(item, depth + 1)).collect();
        if total <= max_items {
            return Value::array(walked);
        }

        let mut meta = ClipMap::with_capacity(3);
        meta.insert("length".to_string(), Value::from(total));
        meta.insert("sample".to_string(), Value::array(walked));
        meta.insert("truncated".to_string(), Value::from(total - max_items));
        wrap(sentinel::ARRAY_METADATA, meta)
    }

    fn walk_object(&mut self, obj: &Object, depth: usize) -> Value {
        let max_keys = self.options.max_keys;
        let entries = match obj.try_read() {
            Ok(map) => {
                if let Some(err) = error_like(&map) {
                    return error_record(&err, &self.options.leaf);
                }
                if map.len() > max_keys {
                    let mut meta = ClipMap::with_capacity(3);
                    meta.insert("keyCount".to_string(), Value::from(map.len()));
                    meta.insert(
                        "sampleKeys".to_string(),
                        Value::from(
                            map.keys()
                                .take(max_keys)
                                .map(|k| Value::from(k.as_str()))
                                .collect::<Vec<_>>(),
                        ),
                    );
                    meta.insert("truncated".to_string(), Value::from(map.len() - max_keys));
                    return wrap(sentinel::OBJECT_METADATA, meta);
                }
                map.iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect::<Vec<_>>()
            }
            Err(err) => return Value::String(sentinel::thrown(&err.to_string())),
        };

        let mut out = ClipMap::with_capacity(entries.len());
        for (key, item) in entries {
            let clean = if self.options.is_redacted(&key) {
                Value::from(sentinel::REDACTED)
            } else if self.options.is_metadata_only(&key) {
                self.summarize_or_walk(&item, depth + 1)
            } else {
                self.walk(&item, depth + 1)
            };
            out.insert(key, clean);
        }
        Value::object(out)
    }

    /// Summary line for a metadata-only field, looking through one getter.
    fn summarize_or_walk(&mut self, item: &Value, depth: usize) -> Value {
        let resolved = match item {
            Value::Getter(getter) => match getter.get() {
                Ok(resolved) => resolved,
                Err(err) => return Value::String(sentinel::thrown(&failure_message(&err))),
            },
            plain => plain.clone(),
        };
        match summarize(&resolved) {
            Some(line) => Value::String(line),
            None => self.walk(&resolved, depth),
        }
    }
}

fn wrap(marker: &str, meta: ClipMap) -> Value {
    let mut outer = ClipMap::with_capacity(1);
    outer.insert(marker.to_string(), Value::object(meta));
    Value::object(outer)
}

/// One-line summary of a bulky collection, or `None` when `value` is not one.
///
/// `"Array(50) first: {id, name, rating, +4 more}"`, `"Object(12 keys)"`.
fn summarize(value: &Value) -> Option<String> {
    match value {
        Value::Array(arr) => {
            let items = arr.try_read().ok()?;
            Some(match items.first() {
                None => "Array(0)".to_string(),
                Some(first) => format!("Array({}) first: {}", items.len(), describe(first)),
            })
        }
        Value::Object(obj) => {
            let len = obj.try_read().ok()?.len();
            Some(format!("Object({} keys)", len))
        }
        _ => None,
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Object(obj) => match obj.try_read() {
            Ok(map) => {
                let mut names: Vec<String> = map.keys().take(SUMMARY_KEYS).cloned().collect();
                let rest = map.len().saturating_sub(SUMMARY_KEYS);
                if rest > 0 {
                    names.push(format!("+{} more", rest));
                }
                format!("{{{}}}", names.join(", "))
            }
            Err(_) => value.type_name().to_string(),
        },
        Value::Array(arr) => match arr.try_read() {
            Ok(items) => format!("Array({})", items.len()),
            Err(_) => value.type_name().to_string(),
        },
        Value::String(s) => {
            let options = crate::ClipOptions::new()
                .with_max_length(SUMMARY_STRING_LEN)
                .with_show_sizes(false);
            format!("{:?}", clip_string(s, &options))
        }
        Value::Getter(getter) => match getter.get() {
            Ok(Value::Getter(_)) | Err(_) => value.type_name().to_string(),
            Ok(resolved) => describe(&resolved),
        },
        other => other.type_name().to_string(),
    }
}

/// Logs state snapshots and reducer transitions under a fixed context label.
///
/// Every entry goes through [`sanitize_state`] and then the logger's size
/// ceiling, so a transition is always exactly one entry.
///
/// ```rust
/// use serde_clip::{value, DevLogger, LoggerConfig, MemorySink, StateLogger};
///
/// let logger = DevLogger::with_sink(LoggerConfig::new().with_enabled(true), MemorySink::new());
/// let search = StateLogger::new(&logger, "search");
/// search.log_transition(
///     &value!({ "type": "SET_TERM", "term": "ramen" }),
///     &value!({ "term": "" }),
///     &value!({ "term": "ramen" }),
/// );
///
/// let entries = logger.sink().take();
/// assert_eq!(entries.len(), 1);
/// assert_eq!(entries[0].label, "search SET_TERM");
/// ```
pub struct StateLogger<'a, S: Sink = LogSink> {
    logger: &'a DevLogger<S>,
    context: String,
    options: SanitizeOptions,
}

impl<'a, S: Sink> StateLogger<'a, S> {
    pub fn new(logger: &'a DevLogger<S>, context: impl Into<String>) -> Self {
        StateLogger {
            logger,
            context: context.into(),
            options: SanitizeOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: SanitizeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    /// Logs `action` with the state before and after it.
    ///
    /// The entry carries `action`, `prevState`, `nextState` and `changedKeys`,
    /// the top-level keys whose value differs between the two states.
    pub fn log_transition(&self, action: &Value, prev: &Value, next: &Value) {
        if !self.logger.is_enabled() {
            return;
        }
        let label = format!("{} {}", self.context, action_type(action));

        let mut summary = ClipMap::with_capacity(4);
        summary.insert("action".to_string(), self.sanitize(action));
        summary.insert("prevState".to_string(), self.sanitize(prev));
        summary.insert("nextState".to_string(), self.sanitize(next));
        summary.insert(
            "changedKeys".to_string(),
            Value::from(
                changed_keys(prev, next)
                    .into_iter()
                    .map(Value::from)
                    .collect::<Vec<_>>(),
            ),
        );

        if let Err(err) = self
            .logger
            .emit_value(Level::Debug, &label, &Value::object(summary))
        {
            self.logger.emit_failure(&label, &err);
        }
    }

    /// Logs one sanitized snapshot under `"<context> <label>"`.
    pub fn log_state(&self, label: &str, state: &Value) {
        if !self.logger.is_enabled() {
            return;
        }
        let label = format!("{} {}", self.context, label);
        if let Err(err) = self
            .logger
            .emit_value(Level::Debug, &label, &self.sanitize(state))
        {
            self.logger.emit_failure(&label, &err);
        }
    }

    fn sanitize(&self, value: &Value) -> Value {
        sanitize_state(value, &self.options)
    }
}

fn action_type(action: &Value) -> String {
    match action {
        Value::String(s) => s.clone(),
        other => match other.get("type") {
            Some(Value::String(s)) => s,
            _ => "UNKNOWN".to_string(),
        },
    }
}

/// Top-level keys added, removed or replaced between two object states.
///
/// Nested nodes compare by identity, which is how an immutable update marks
/// the slices it touched.
fn changed_keys(prev: &Value, next: &Value) -> Vec<String> {
    let (Value::Object(prev), Value::Object(next)) = (prev, next) else {
        return Vec::new();
    };
    if prev.ptr_eq(next) {
        return Vec::new();
    }
    let (Ok(before), Ok(after)) = (prev.try_read(), next.try_read()) else {
        return Vec::new();
    };

    let mut changed: Vec<String> = after
        .iter()
        .filter(|(key, value)| match before.get(key) {
            None => true,
            Some(old) => !same_slot(old, value),
        })
        .map(|(key, _)| key.clone())
        .collect();
    changed.extend(
        before
            .keys()
            .filter(|key| !after.contains_key(key))
            .cloned(),
    );
    changed
}

fn same_slot(a: &Value, b: &Value) -> bool {
    match (a.node_id(), b.node_id()) {
        (Some(x), Some(y)) => x == y,
        (None, None) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::STACK_LIMIT;
    use crate::value::ErrorValue;
    use crate::{value, LoggerConfig, MemorySink};
    use chrono::{TimeZone, Utc};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn options() -> SanitizeOptions {
        SanitizeOptions::default()
    }

    #[test]
    fn test_array_metadata_record() {
        let list = Value::from((0..100i64).map(Value::from).collect::<Vec<_>>());
        let clean = sanitize_state(&list, &options().with_max_items(3));
        assert_eq!(
            clean,
            value!({ "[ARRAY_METADATA]": { "length": 100, "sample": [0, 1, 2], "truncated": 97 } })
        );
    }

    #[test]
    fn test_short_array_walked() {
        let clean = sanitize_state(&value!([1, "two", null]), &options());
        assert_eq!(clean, value!([1, "two", null]));
    }

    #[test]
    fn test_object_metadata_record() {
        let mut fields = ClipMap::new();
        for i in 0..6i64 {
            fields.insert(format!("k{}", i), Value::from(i));
        }
        let clean = sanitize_state(&Value::object(fields), &options().with_max_keys(4));
        assert_eq!(
            clean,
            value!({ "[OBJECT_METADATA]": {
                "keyCount": 6,
                "sampleKeys": ["k0", "k1", "k2", "k3"],
                "truncated": 2,
            } })
        );
    }

    #[test]
    fn test_redaction_is_exact_match() {
        let state = value!({ "password": "hunter2", "passwordHint": "pet", "apiKey": 12 });
        let clean = sanitize_state(&state, &options());
        assert_eq!(
            clean,
            value!({ "password": "[REDACTED]", "passwordHint": "pet", "apiKey": "[REDACTED]" })
        );
    }

    #[test]
    fn test_metadata_summaries() {
        let state = value!({
            "photos": [],
            "reviews": { "a": 1, "b": 2 },
            "results": [["x"], ["y"]],
            "businesses": [{ "id": 1, "name": "A", "rating": 4.5, "price": "$$", "open": true }],
        });
        let clean = sanitize_state(&state, &options());
        assert_eq!(clean.get("photos"), Some(Value::from("Array(0)")));
        assert_eq!(clean.get("reviews"), Some(Value::from("Object(2 keys)")));
        assert_eq!(clean.get("results"), Some(Value::from("Array(2) first: Array(1)")));
        assert_eq!(
            clean.get("businesses"),
            Some(Value::from("Array(1) first: {id, name, rating, +2 more}"))
        );
    }

    #[test]
    fn test_metadata_field_with_scalar_is_walked() {
        let clean = sanitize_state(&value!({ "results": 0 }), &options());
        assert_eq!(clean, value!({ "results": 0 }));
    }

    #[test]
    fn test_depth_and_cycles() {
        let root = Object::new();
        root.insert("me", root.clone());
        root.insert("deep", value!({ "a": { "b": 1 } }));
        let clean = sanitize_state(&Value::Object(root), &options().with_max_depth(2));
        assert_eq!(
            clean,
            value!({ "me": "[CIRCULAR]", "deep": { "a": { "b": "[MAX_DEPTH_EXCEEDED]" } } })
        );
    }

    #[test]
    fn test_leaves_use_leaf_budget() {
        let leaf = crate::ClipOptions::new().with_max_length(3);
        let clean = sanitize_state(
            &value!({ "q": "abcdef", "f": (Value::function("cb")) }),
            &options().with_leaf(leaf),
        );
        assert_eq!(
            clean,
            value!({ "q": "abc... [TRUNCATED: 6 chars]", "f": "[Function]" })
        );
    }

    #[test]
    fn test_getter_failure_inline() {
        let state = Object::new();
        state.insert("lazy", Value::getter(|| Err("offline".to_string())));
        let clean = sanitize_state(&Value::Object(state), &options());
        assert_eq!(
            clean.get("lazy"),
            Some(Value::from("[THROWN: offline]"))
        );
    }

    #[test]
    fn test_getter_returning_itself_ends_at_max_depth() {
        let slot: Rc<RefCell<Option<Value>>> = Rc::new(RefCell::new(None));
        let inner = Rc::clone(&slot);
        let getter = Value::getter(move || Ok(inner.borrow().clone().unwrap_or(Value::Null)));
        *slot.borrow_mut() = Some(getter.clone());

        let clean = sanitize_state(&value!({ "loop": (getter) }), &options().with_max_depth(2));
        assert_eq!(clean, value!({ "loop": "[MAX_DEPTH_EXCEEDED]" }));
    }

    #[test]
    fn test_metadata_field_behind_getter_is_summarized() {
        let state = Object::new();
        state.insert(
            "businesses",
            Value::getter(|| Ok(value!([{ "id": "secret-biz", "name": "A" }]))),
        );
        state.insert("photos", Value::getter(|| Err("not loaded".to_string())));
        state.insert(
            "results",
            Value::getter(|| Ok(Value::array(vec![Value::getter(|| Ok(value!({ "id": 1 })))]))),
        );
        let clean = sanitize_state(&Value::Object(state), &options());
        assert_eq!(
            clean,
            value!({
                "businesses": "Array(1) first: {id, name}",
                "photos": "[THROWN: not loaded]",
                "results": "Array(1) first: {id}",
            })
        );
    }

    #[test]
    fn test_dates_and_errors_take_special_forms() {
        let when = Utc.with_ymd_and_hms(2024, 5, 17, 8, 0, 0).unwrap();
        let mut failure = ClipMap::new();
        failure.insert("name".to_string(), Value::from("FetchError"));
        failure.insert("message".to_string(), Value::from("offline"));
        failure.insert("stack".to_string(), Value::from("at fetch"));
        for i in 0..30i64 {
            failure.insert(format!("extra{}", i), Value::from(i));
        }
        let state = value!({
            "updatedAt": (Value::Date(when)),
            "lastError": (Value::Error(ErrorValue::new("TypeError", "boom").with_stack("s".repeat(800)))),
            "fetchFailure": (Value::object(failure)),
        });

        let clean = sanitize_state(&state, &options());
        assert_eq!(clean.get("updatedAt"), Some(Value::from("2024-05-17T08:00:00.000Z")));

        let last = clean.get("lastError").unwrap();
        assert_eq!(last.get("name"), Some(Value::from("TypeError")));
        assert_eq!(last.get("message"), Some(Value::from("boom")));
        let stack = last.get("stack").unwrap();
        let stack = stack.as_str().unwrap();
        assert_eq!(stack, format!("{}{}", "s".repeat(STACK_LIMIT), sentinel::STACK_SUFFIX));

        assert_eq!(
            clean.get("fetchFailure"),
            Some(value!({ "name": "FetchError", "message": "offline", "stack": "at fetch" }))
        );
    }

    #[test]
    fn test_changed_keys_by_identity() {
        let filters = value!({ "open": true });
        let prev = value!({ "term": "", "filters": (filters.clone()), "page": 1 });
        let next = value!({ "term": "ramen", "filters": (filters), "sort": "rating" });
        assert_eq!(changed_keys(&prev, &next), vec!["term", "sort", "page"]);
    }

    #[test]
    fn test_transition_entry() {
        let logger =
            DevLogger::with_sink(LoggerConfig::new().with_enabled(true), MemorySink::new());
        let auth = StateLogger::new(&logger, "auth");
        auth.log_transition(
            &value!({ "type": "LOGIN", "token": "t" }),
            &value!({ "user": null }),
            &value!({ "user": "kim" }),
        );
        let entries = logger.sink().take();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].label, "auth LOGIN");
        assert_eq!(
            entries[0].payload,
            r#"{"action":{"type":"LOGIN","token":"[REDACTED]"},"prevState":{"user":null},"nextState":{"user":"kim"},"changedKeys":["user"]}"#
        );
    }

    #[test]
    fn test_state_logger_respects_gate() {
        let logger =
            DevLogger::with_sink(LoggerConfig::new().with_enabled(false), MemorySink::new());
        let ui = StateLogger::new(&logger, "ui");
        ui.log_state("snapshot", &value!({ "a": 1 }));
        ui.log_transition(&value!("TOGGLE"), &Value::Null, &Value::Null);
        assert!(logger.sink().is_empty());
    }

    #[test]
    fn test_state_logger_oversized() {
        let logger = DevLogger::with_sink(
            LoggerConfig::new()
                .with_enabled(true)
                .with_max_serialized_len(20),
            MemorySink::new(),
        );
        StateLogger::new(&logger, "cache").log_state("dump", &value!({ "k": "0123456789abcdef" }));
        let entries = logger.sink().take();
        assert_eq!(entries[0].level, Level::Warn);
        assert_eq!(entries[0].payload, "[TOO_LARGE: 24 chars]");
    }
}
