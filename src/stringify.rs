//! JSON output: a strict writer and the never-failing safe stringifier.
//!
//! [`to_json_string`] follows `JSON.stringify` rules for the kinds a
//! [`Value`] can hold: non-finite numbers become `null`; undefined, functions and
//! symbols become `null` inside arrays and are dropped from objects; a cycle is
//! an error. [`safe_stringify`] clips first and turns every failure into a
//! sentinel string, so it always yields a string.

use crate::clip::{clip_with_options, iso_string};
use crate::guard::VisitGuard;
use crate::value::Number;
use crate::{sentinel, ClipOptions, Error, Result, Value};
use serde::ser::{self, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::cell::{Cell, RefCell};

/// Arrays, objects and getters the JSON writer will open inside one another.
pub const NESTING_LIMIT: usize = 128;

/// Serializes `value` to compact JSON.
///
/// # Errors
///
/// - [`Error::Unserializable`] for a top-level undefined, function or symbol,
///   and for any big integer
/// - [`Error::Circular`] when a node contains itself
/// - [`Error::TooDeep`] past [`NESTING_LIMIT`] nested arrays, objects and getters
/// - [`Error::Getter`] / [`Error::Exotic`] when a lazy or opaque value fails
///
/// # Examples
///
/// ```rust
/// use serde_clip::{to_json_string, value, Value};
///
/// let v = value!({ "a": [1, undefined], "b": undefined, "c": (f64::INFINITY) });
/// assert_eq!(to_json_string(&v).unwrap(), r#"{"a":[1,null],"c":null}"#);
/// ```
pub fn to_json_string(value: &Value) -> Result<String> {
    match value {
        Value::Undefined => return Err(Error::Unserializable("undefined")),
        Value::Function(_) => return Err(Error::Unserializable("function")),
        Value::Symbol(_) => return Err(Error::Unserializable("symbol")),
        _ => {}
    }

    let writer = JsonWriter::default();
    serde_json::to_string(&writer.view(value))
        .map_err(|err| writer.take_failure().unwrap_or_else(|| err.into()))
}

/// Parses JSON text into a fresh value graph.
///
/// # Errors
///
/// Returns [`Error::Json`] if the text is not valid JSON.
///
/// # Examples
///
/// ```rust
/// use serde_clip::from_json_str;
///
/// let v = from_json_str(r#"{"total": 3}"#).unwrap();
/// assert_eq!(v.get("total").and_then(|t| t.as_i64()), Some(3));
/// ```
pub fn from_json_str(s: &str) -> Result<Value> {
    Ok(serde_json::from_str(s)?)
}

/// Clips with [`ClipOptions::storage`] and serializes. Never fails.
///
/// # Examples
///
/// ```rust
/// use serde_clip::{safe_stringify, Object, Value};
///
/// let node = Object::new();
/// node.insert("self", node.clone());
/// assert_eq!(safe_stringify(&Value::Object(node)), r#"{"self":"[CIRCULAR]"}"#);
/// assert_eq!(safe_stringify(&Value::Undefined), "[UNSERIALIZABLE: undefined]");
/// ```
#[must_use]
pub fn safe_stringify(value: &Value) -> String {
    safe_stringify_with_options(value, &ClipOptions::storage())
}

/// Clips with the given budget and serializes. Never fails.
#[must_use]
pub fn safe_stringify_with_options(value: &Value, options: &ClipOptions) -> String {
    let clipped = clip_with_options(value, options);
    match to_json_string(&clipped) {
        Ok(json) => json,
        Err(err @ Error::Unserializable(_)) => sentinel::unserializable(err.kind()),
        Err(err) => sentinel::stringify_error(&err.to_string()),
    }
}

/// Shared state of one serialization: the open-node guard and the first failure.
#[derive(Default)]
struct JsonWriter {
    guard: RefCell<VisitGuard>,
    depth: Cell<usize>,
    failure: RefCell<Option<Error>>,
}

impl JsonWriter {
    fn view<'w, 'v>(&'w self, value: &'v Value) -> JsonView<'w, 'v> {
        JsonView {
            writer: self,
            value,
        }
    }

    // serde only carries strings across the boundary; keep the typed error aside.
    fn fail<E: ser::Error>(&self, err: Error) -> E {
        let msg = err.to_string();
        self.failure.borrow_mut().get_or_insert(err);
        E::custom(msg)
    }

    fn descend<E: ser::Error>(&self) -> std::result::Result<(), E> {
        let depth = self.depth.get() + 1;
        if depth > NESTING_LIMIT {
            return Err(self.fail(Error::TooDeep(NESTING_LIMIT)));
        }
        self.depth.set(depth);
        Ok(())
    }

    fn ascend(&self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }

    fn take_failure(&self) -> Option<Error> {
        self.failure.borrow_mut().take()
    }
}

struct JsonView<'w, 'v> {
    writer: &'w JsonWriter,
    value: &'v Value,
}

// Undefined, functions and symbols have no JSON form and are dropped from objects.
fn omitted_in_object(value: &Value) -> bool {
    matches!(
        value,
        Value::Undefined | Value::Function(_) | Value::Symbol(_)
    )
}

impl Serialize for JsonView<'_, '_> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let writer = self.writer;
        match self.value {
            Value::Undefined | Value::Null | Value::Function(_) | Value::Symbol(_) => {
                serializer.serialize_unit()
            }
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(Number::Integer(i)) => serializer.serialize_i64(*i),
            Value::Number(Number::Float(f)) if f.is_finite() => serializer.serialize_f64(*f),
            Value::Number(_) => serializer.serialize_unit(),
            Value::String(s) => serializer.serialize_str(s),
            Value::BigInt(_) => Err(writer.fail(Error::Unserializable("bigint"))),
            Value::Date(dt) => serializer.serialize_str(&iso_string(dt)),
            Value::Error(err) => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("name", &err.name)?;
                map.serialize_entry("message", &err.message)?;
                if let Some(stack) = &err.stack {
                    map.serialize_entry("stack", stack)?;
                }
                map.end()
            }
            Value::Array(arr) => {
                writer.descend::<S::Error>()?;
                if !writer.guard.borrow_mut().enter(arr.id()) {
                    return Err(writer.fail(Error::Circular));
                }
                let items: Vec<Value> = match arr.try_read() {
                    Ok(items) => items.clone(),
                    Err(err) => return Err(writer.fail(err)),
                };
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in &items {
                    seq.serialize_element(&writer.view(item))?;
                }
                writer.guard.borrow_mut().leave(arr.id());
                writer.ascend();
                seq.end()
            }
            Value::Object(obj) => {
                writer.descend::<S::Error>()?;
                if !writer.guard.borrow_mut().enter(obj.id()) {
                    return Err(writer.fail(Error::Circular));
                }
                let entries: Vec<(String, Value)> = match obj.try_read() {
                    Ok(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
                    Err(err) => return Err(writer.fail(err)),
                };
                let mut map = serializer.serialize_map(None)?;
                for (key, item) in entries {
                    let item = match item {
                        Value::Getter(getter) => getter.get().map_err(|err| writer.fail(err))?,
                        other => other,
                    };
                    if omitted_in_object(&item) {
                        continue;
                    }
                    map.serialize_entry(&key, &writer.view(&item))?;
                }
                writer.guard.borrow_mut().leave(obj.id());
                writer.ascend();
                map.end()
            }
            Value::Getter(getter) => {
                let resolved = getter.get().map_err(|err| writer.fail(err))?;
                writer.descend::<S::Error>()?;
                let out = writer.view(&resolved).serialize(serializer);
                writer.ascend();
                out
            }
            Value::Exotic(ex) => match ex.to_json() {
                Ok(json) => json.serialize(serializer),
                Err(msg) => Err(writer.fail(Error::Exotic {
                    type_name: ex.type_name().to_string(),
                    msg,
                })),
            },
        }
    }
}

impl Serialize for Value {
    /// Serializes with `JSON.stringify` rules; fails on cycles instead of looping.
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        JsonWriter::default().view(self).serialize(serializer)
    }
}
