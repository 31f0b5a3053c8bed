//! The clipper: bounded, cycle-safe copies of arbitrary value graphs.
//!
//! [`clip`] walks a [`Value`] depth-first and builds a fresh copy that respects
//! a [`ClipOptions`] budget:
//!
//! - nodes deeper than `max_depth` become `"[MAX_DEPTH_EXCEEDED]"`
//! - strings longer than `max_length` characters are cut and suffixed
//! - arrays keep their first `max_items` elements plus one marker element
//! - objects keep their first 20 entries plus a `"[TRUNCATED]"` entry
//! - a node met again while it is still being walked becomes `"[CIRCULAR]"`
//!
//! Functions, symbols, big integers, dates and errors are replaced by their
//! JSON-safe forms. The result contains no shared or cyclic nodes.
//!
//! ```rust
//! use serde_clip::{clip_with_options, value, ClipOptions};
//!
//! let nested = value!({ "a": { "b": { "c": { "d": { "e": 1 } } } } });
//! let clipped = clip_with_options(&nested, &ClipOptions::new().with_max_depth(2));
//! assert_eq!(clipped, value!({ "a": { "b": { "c": "[MAX_DEPTH_EXCEEDED]" } } }));
//! ```

use crate::guard::VisitGuard;
use crate::sentinel;
use crate::value::{Array, ErrorValue, Object};
use crate::{ClipMap, ClipOptions, Error, Result, Value};
use chrono::{DateTime, SecondsFormat, Utc};
use std::convert::Infallible;
use std::marker::PhantomData;

/// Entries kept from a generic object, independent of `max_items`.
pub const OBJECT_KEY_LIMIT: usize = 20;

/// Characters kept from an error's stack trace.
pub const STACK_LIMIT: usize = 500;

/// Clips `value` with the default logging budget.
///
/// Never fails: a getter that errors is replaced by a `"[THROWN: ...]"` string.
///
/// # Examples
///
/// ```rust
/// use serde_clip::{clip, Object, Value};
///
/// let node = Object::new();
/// node.insert("name", "x");
/// node.insert("self", node.clone());
///
/// let clipped = clip(&Value::Object(node));
/// assert_eq!(clipped.get("self"), Some(Value::from("[CIRCULAR]")));
/// ```
#[must_use]
pub fn clip(value: &Value) -> Value {
    clip_with_options(value, &ClipOptions::default())
}

/// Clips `value` with a caller-supplied budget. Never fails.
///
/// # Examples
///
/// ```rust
/// use serde_clip::{clip_with_options, value, ClipOptions};
///
/// let clipped = clip_with_options(&value!([1, 2, 3, 4, 5]), &ClipOptions::new().with_max_items(3));
/// assert_eq!(clipped, value!([1, 2, 3, "[TRUNCATED: 2 more items]"]));
/// ```
#[must_use]
pub fn clip_with_options(value: &Value, options: &ClipOptions) -> Value {
    match Clipper::<Lenient>::new(options).walk(value, 0) {
        Ok(clipped) => clipped,
        Err(never) => match never {},
    }
}

/// Clips `value`, reporting the first failing getter or unreadable node.
///
/// # Errors
///
/// Returns [`Error::Getter`] or [`Error::Unreadable`] when part of the graph
/// cannot be read.
pub fn try_clip(value: &Value, options: &ClipOptions) -> Result<Value> {
    Clipper::<Strict>::new(options).walk(value, 0)
}

/// What the clipper does with a getter or node it cannot read.
trait OnFailure {
    type Err;

    fn fail(err: Error) -> std::result::Result<Value, Self::Err>;
}

/// Folds the failure into a `"[THROWN: ...]"` string.
enum Lenient {}

impl OnFailure for Lenient {
    type Err = Infallible;

    fn fail(err: Error) -> std::result::Result<Value, Infallible> {
        Ok(Value::String(sentinel::thrown(&failure_message(&err))))
    }
}

/// Stops the walk at the first failure.
enum Strict {}

impl OnFailure for Strict {
    type Err = Error;

    fn fail(err: Error) -> Result<Value> {
        Err(err)
    }
}

struct Clipper<'a, P> {
    options: &'a ClipOptions,
    guard: VisitGuard,
    policy: PhantomData<P>,
}

impl<'a, P: OnFailure> Clipper<'a, P> {
    fn new(options: &'a ClipOptions) -> Self {
        Clipper {
            options,
            guard: VisitGuard::new(),
            policy: PhantomData,
        }
    }

    fn walk(&mut self, value: &Value, depth: usize) -> std::result::Result<Value, P::Err> {
        if depth > self.options.max_depth {
            return Ok(Value::from(sentinel::MAX_DEPTH_EXCEEDED));
        }

        match value {
            Value::Getter(getter) => match getter.get() {
                // Each further getter in a chain costs a level, so the chain
                // ends at `max_depth`.
                Ok(resolved @ Value::Getter(_)) => self.walk(&resolved, depth + 1),
                Ok(resolved) => self.walk(&resolved, depth),
                Err(err) => P::fail(err),
            },
            Value::Undefined | Value::Null | Value::Bool(_) | Value::Number(_) => {
                Ok(value.clone())
            }
            Value::String(s) => Ok(Value::String(clip_string(s, self.options))),
            Value::Function(_) => Ok(Value::from(sentinel::FUNCTION)),
            Value::Symbol(desc) => Ok(Value::String(symbol_string(desc.as_deref()))),
            Value::BigInt(bi) => Ok(Value::String(format!("{}n", bi))),
            Value::Date(dt) => Ok(Value::String(iso_string(dt))),
            Value::Error(err) => Ok(error_record(err, self.options)),
            Value::Array(arr) => self.walk_array(arr, depth),
            Value::Object(obj) => self.walk_object(obj, depth),
            Value::Exotic(_) => Ok(value.clone()),
        }
    }

    fn walk_array(&mut self, arr: &Array, depth: usize) -> std::result::Result<Value, P::Err> {
        if !self.guard.enter(arr.id()) {
            return Ok(Value::from(sentinel::CIRCULAR));
        }
        let result = self.clip_items(arr, depth);
        self.guard.leave(arr.id());
        result
    }

    fn clip_items(&mut self, arr: &Array, depth: usize) -> std::result::Result<Value, P::Err> {
        // Snapshot before descending so getters may touch the node.
        let (total, kept) = match arr.try_read() {
            Ok(items) => (
                items.len(),
                items
                    .iter()
                    .take(self.options.max_items)
                    .cloned()
                    .collect::<Vec<_>>(),
            ),
            Err(err) => return P::fail(err),
        };

        let mut out = Vec::with_capacity(kept.len() + 1);
        for item in &kept {
            out.push(self.walk(item, depth + 1)?);
        }
        if total > kept.len() {
            out.push(Value::String(sentinel::truncated_items(
                total - kept.len(),
                self.options.show_sizes,
            )));
        }
        Ok(Value::array(out))
    }

    fn walk_object(&mut self, obj: &Object, depth: usize) -> std::result::Result<Value, P::Err> {
        if !self.guard.enter(obj.id()) {
            return Ok(Value::from(sentinel::CIRCULAR));
        }
        let result = self.clip_entries(obj, depth);
        self.guard.leave(obj.id());
        result
    }

    fn clip_entries(&mut self, obj: &Object, depth: usize) -> std::result::Result<Value, P::Err> {
        let (total, kept) = match obj.try_read() {
            Ok(map) => {
                if let Some(err) = error_like(&map) {
                    return Ok(error_record(&err, self.options));
                }
                (
                    map.len(),
                    map.iter()
                        .take(OBJECT_KEY_LIMIT)
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect::<Vec<_>>(),
                )
            }
            Err(err) => return P::fail(err),
        };

        let mut out = ClipMap::with_capacity(kept.len() + 1);
        for (key, item) in &kept {
            let clipped = self.walk(item, depth + 1)?;
            out.insert(key.clone(), clipped);
        }
        if total > kept.len() {
            out.insert(
                sentinel::TRUNCATED.to_string(),
                Value::String(sentinel::truncated_keys(
                    total - kept.len(),
                    self.options.show_sizes,
                )),
            );
        }
        Ok(Value::object(out))
    }
}

pub(crate) fn failure_message(err: &Error) -> String {
    match err {
        Error::Getter(msg) => msg.clone(),
        other => other.to_string(),
    }
}

/// Cuts `s` to `max_length` characters and appends the truncation suffix.
pub(crate) fn clip_string(s: &str, options: &ClipOptions) -> String {
    match s.char_indices().nth(options.max_length) {
        None => s.to_string(),
        Some((cut, _)) => {
            let total = options.max_length + s[cut..].chars().count();
            let mut out = String::with_capacity(cut + 32);
            out.push_str(&s[..cut]);
            out.push_str(&sentinel::truncated_string(total, options.show_sizes));
            out
        }
    }
}

pub(crate) fn iso_string(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn symbol_string(description: Option<&str>) -> String {
    format!("Symbol({})", description.unwrap_or(""))
}

/// `{name, message, stack}` with the stack cut to [`STACK_LIMIT`] characters
/// and `name`/`message` cut to `max_length`.
pub(crate) fn error_record(err: &ErrorValue, options: &ClipOptions) -> Value {
    let stack = match &err.stack {
        None => Value::Undefined,
        Some(stack) => match stack.char_indices().nth(STACK_LIMIT) {
            None => Value::String(stack.clone()),
            Some((cut, _)) => Value::String(format!("{}{}", &stack[..cut], sentinel::STACK_SUFFIX)),
        },
    };

    let mut record = ClipMap::with_capacity(3);
    record.insert("name".to_string(), Value::String(clip_string(&err.name, options)));
    record.insert(
        "message".to_string(),
        Value::String(clip_string(&err.message, options)),
    );
    record.insert("stack".to_string(), stack);
    Value::object(record)
}

/// An object whose `name`, `message` and `stack` are all strings reads as an error.
pub(crate) fn error_like(map: &ClipMap) -> Option<ErrorValue> {
    let name = map.get("name")?.as_str()?;
    let message = map.get("message")?.as_str()?;
    let stack = map.get("stack")?.as_str()?;
    Some(ErrorValue::new(name, message).with_stack(stack))
}
