//! Development logging facade.
//!
//! [`DevLogger`] wraps the clipper with purpose-built helpers. Every helper:
//!
//! - returns immediately when the development gate is off
//! - clips its input before serializing it
//! - re-checks the serialized size against an absolute ceiling
//! - emits exactly one [`LogEntry`] and never fails or panics on bad input
//!
//! Entries go to a [`Sink`]. The default [`LogSink`] forwards them to the
//! [`log`] crate under the `serde_clip` target; [`MemorySink`] keeps them in
//! memory for tests and in-app consoles.
//!
//! ```rust
//! use serde_clip::{value, DevLogger, LoggerConfig, MemorySink};
//!
//! let logger = DevLogger::with_sink(LoggerConfig::new().with_enabled(true), MemorySink::new());
//! logger.log_safe("search", &value!({ "term": "pizza" }), None);
//!
//! let entries = logger.sink().entries();
//! assert_eq!(entries[0].line(), r#"[search] {"term":"pizza"}"#);
//! ```

use crate::clip::try_clip;
use crate::value::short_type_name;
use crate::{
    sentinel, to_json_string, ClipMap, ClipOptions, Error, ErrorValue, LoggerConfig, Result,
    Value,
};
use log::Level;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// `log` target used by [`LogSink`].
pub const LOG_TARGET: &str = "serde_clip";

/// Items sampled by `log_array` when the caller gives no size.
pub const ARRAY_SAMPLE_SIZE: usize = 3;

/// Depth budget for sampled array items.
pub const ARRAY_ITEM_DEPTH: usize = 2;

/// Key names listed by `log_object` for orientation.
pub const OBJECT_KEY_PREVIEW: usize = 10;

/// Keys whose values `log_object` shows by default.
pub const OBJECT_DEFAULT_KEYS: usize = 5;

/// One console line: a label and a bounded payload.
#[derive(Clone, Debug, PartialEq)]
pub struct LogEntry {
    pub level: Level,
    pub label: String,
    /// Serialized JSON, or a sentinel string.
    pub payload: String,
}

impl LogEntry {
    /// Rendered line: `[label] payload`.
    #[must_use]
    pub fn line(&self) -> String {
        format!("[{}] {}", self.label, self.payload)
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.label, self.payload)
    }
}

/// Destination of log entries.
pub trait Sink {
    fn emit(&self, entry: LogEntry);
}

impl<S: Sink + ?Sized> Sink for Arc<S> {
    fn emit(&self, entry: LogEntry) {
        (**self).emit(entry);
    }
}

impl<S: Sink + ?Sized> Sink for &S {
    fn emit(&self, entry: LogEntry) {
        (**self).emit(entry);
    }
}

/// Forwards entries to the `log` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl Sink for LogSink {
    fn emit(&self, entry: LogEntry) {
        log::log!(target: LOG_TARGET, entry.level, "{}", entry);
    }
}

/// Collects entries in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Removes and returns everything emitted so far.
    pub fn take(&self) -> Vec<LogEntry> {
        std::mem::take(&mut *self.entries.lock().unwrap_or_else(PoisonError::into_inner))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Sink for MemorySink {
    fn emit(&self, entry: LogEntry) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }
}

/// How many array items `log_array` samples, and how hard each is clipped.
///
/// Built from a count (`3usize.into()`) or from full clip options, in which case
/// `max_items` is the sample size.
#[derive(Clone, Debug, PartialEq)]
pub struct ArraySample {
    pub size: usize,
    pub item_options: ClipOptions,
}

impl Default for ArraySample {
    fn default() -> Self {
        ArraySample {
            size: ARRAY_SAMPLE_SIZE,
            item_options: ClipOptions::default().with_max_depth(ARRAY_ITEM_DEPTH),
        }
    }
}

impl From<usize> for ArraySample {
    fn from(size: usize) -> Self {
        ArraySample {
            size,
            ..Default::default()
        }
    }
}

impl From<ClipOptions> for ArraySample {
    fn from(options: ClipOptions) -> Self {
        ArraySample {
            size: options.max_items,
            item_options: options,
        }
    }
}

/// Which keys `log_object` shows values for.
#[derive(Clone, Debug, PartialEq)]
pub enum KeySelection {
    All,
    /// The first `n` keys in insertion order.
    First(usize),
    /// Exactly these keys, in this order, when present.
    Keys(Vec<String>),
}

impl Default for KeySelection {
    fn default() -> Self {
        KeySelection::First(OBJECT_DEFAULT_KEYS)
    }
}

impl From<usize> for KeySelection {
    fn from(count: usize) -> Self {
        KeySelection::First(count)
    }
}

impl From<&[&str]> for KeySelection {
    fn from(keys: &[&str]) -> Self {
        KeySelection::Keys(keys.iter().map(|k| k.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for KeySelection {
    fn from(keys: [&str; N]) -> Self {
        KeySelection::Keys(keys.iter().map(|k| k.to_string()).collect())
    }
}

impl From<Vec<String>> for KeySelection {
    fn from(keys: Vec<String>) -> Self {
        KeySelection::Keys(keys)
    }
}

/// Gated, bounded logging facade over a [`Sink`].
///
/// The gate is read from [`LoggerConfig::enabled`] once, at construction.
#[derive(Debug)]
pub struct DevLogger<S = LogSink> {
    config: LoggerConfig,
    sink: S,
}

impl DevLogger<LogSink> {
    /// Logger writing to the `log` crate.
    #[must_use]
    pub fn new(config: LoggerConfig) -> Self {
        DevLogger::with_sink(config, LogSink)
    }

    /// Logger writing to the `log` crate, gated by `SERDE_CLIP_DEV`.
    #[must_use]
    pub fn from_env() -> Self {
        DevLogger::new(LoggerConfig::from_env())
    }
}

impl Default for DevLogger<LogSink> {
    fn default() -> Self {
        DevLogger::new(LoggerConfig::default())
    }
}

impl<S: Sink> DevLogger<S> {
    pub fn with_sink(config: LoggerConfig, sink: S) -> Self {
        DevLogger { config, sink }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    #[must_use]
    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Logs a clipped copy of `value`.
    ///
    /// If the serialized result still exceeds
    /// [`LoggerConfig::max_serialized_len`], only `"[TOO_LARGE: <n> chars]"` is
    /// logged. A failing getter or serializer yields `"[LOG_ERROR: ...]"`.
    pub fn log_safe(&self, label: &str, value: &Value, options: Option<&ClipOptions>) {
        if !self.config.enabled {
            return;
        }
        let options = options.unwrap_or(&self.config.clip);
        if let Err(err) = self.log_clipped(Level::Debug, label, value, options) {
            self.emit_failure(label, &err);
        }
    }

    /// Logs `{count, sample, omitted?}` for an array.
    ///
    /// A non-array is logged under `"<label> [NOT_ARRAY]"`.
    pub fn log_array(&self, label: &str, value: &Value, sample: impl Into<ArraySample>) {
        if !self.config.enabled {
            return;
        }
        if let Err(err) = self.try_log_array(label, value, sample.into()) {
            self.emit_failure(label, &err);
        }
    }

    fn try_log_array(&self, label: &str, value: &Value, sample: ArraySample) -> Result<()> {
        let Value::Array(arr) = value else {
            let label = format!("{} {}", label, sentinel::NOT_ARRAY);
            return self.log_clipped(Level::Warn, &label, value, &self.config.clip);
        };

        let (count, head) = {
            let items = arr.try_read()?;
            let head: Vec<Value> = items.iter().take(sample.size).cloned().collect();
            (items.len(), head)
        };
        let clipped = head
            .iter()
            .map(|item| try_clip(item, &sample.item_options))
            .collect::<Result<Vec<_>>>()?;

        let mut summary = ClipMap::with_capacity(3);
        summary.insert("count".to_string(), Value::from(count));
        summary.insert("sample".to_string(), Value::array(clipped));
        if count > head.len() {
            summary.insert("omitted".to_string(), Value::from(count - head.len()));
        }
        self.emit_value(Level::Debug, label, &Value::object(summary))
    }

    /// Logs `{keyCount, keys, values, omittedKeys?}` for an object.
    ///
    /// `keys` always lists the first ten key names; `values` holds the clipped
    /// values of the selected keys. A non-object is logged under
    /// `"<label> [NOT_OBJECT]"`.
    pub fn log_object(&self, label: &str, value: &Value, selection: impl Into<KeySelection>) {
        if !self.config.enabled {
            return;
        }
        if let Err(err) = self.try_log_object(label, value, selection.into()) {
            self.emit_failure(label, &err);
        }
    }

    fn try_log_object(&self, label: &str, value: &Value, selection: KeySelection) -> Result<()> {
        let Value::Object(obj) = value else {
            let label = format!("{} {}", label, sentinel::NOT_OBJECT);
            return self.log_clipped(Level::Warn, &label, value, &self.config.clip);
        };

        let (key_count, preview, selected) = {
            let map = obj.try_read()?;
            let preview: Vec<Value> = map
                .keys()
                .take(OBJECT_KEY_PREVIEW)
                .map(|k| Value::from(k.as_str()))
                .collect();
            let selected: Vec<(String, Value)> = match &selection {
                KeySelection::All => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
                KeySelection::First(n) => map
                    .iter()
                    .take(*n)
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
                KeySelection::Keys(keys) => keys
                    .iter()
                    .filter_map(|k| map.get(k).map(|v| (k.clone(), v.clone())))
                    .collect(),
            };
            (map.len(), preview, selected)
        };

        let mut values = ClipMap::with_capacity(selected.len());
        for (key, item) in &selected {
            values.insert(key.clone(), try_clip(item, &self.config.clip)?);
        }

        let mut summary = ClipMap::with_capacity(4);
        summary.insert("keyCount".to_string(), Value::from(key_count));
        summary.insert("keys".to_string(), Value::array(preview));
        summary.insert("values".to_string(), Value::object(values));
        if selected.len() < key_count {
            summary.insert(
                "omittedKeys".to_string(),
                Value::from(key_count - selected.len()),
            );
        }
        self.emit_value(Level::Debug, label, &Value::object(summary))
    }

    /// Logs one HTTP call without ever logging a raw response body.
    ///
    /// The label is `"API <METHOD> <path>"` with the origin stripped. `response`
    /// is read as `{status?, duration?, data?}`; when it has no `data` field
    /// the whole value is treated as the body.
    pub fn log_network(
        &self,
        method: &str,
        url: &str,
        params: Option<&Value>,
        response: Option<&Value>,
    ) {
        if !self.config.enabled {
            return;
        }
        let label = format!("API {} {}", method.to_uppercase(), strip_origin(url));
        if let Err(err) = self.try_log_network(&label, params, response) {
            self.emit_failure(&label, &err);
        }
    }

    fn try_log_network(
        &self,
        label: &str,
        params: Option<&Value>,
        response: Option<&Value>,
    ) -> Result<()> {
        let mut summary = ClipMap::with_capacity(4);
        if let Some(params) = params {
            let shallow = self.config.clip.clone().with_max_depth(1);
            summary.insert("params".to_string(), try_clip(params, &shallow)?);
        }
        if let Some(response) = response {
            let response = response.resolved()?;
            if let Some(status) = response.get("status") {
                summary.insert("status".to_string(), try_clip(&status, &self.config.clip)?);
            }
            let duration = response.get("duration").map(|d| d.resolved()).transpose()?;
            if let Some(ms) = duration.and_then(|d| d.as_f64()) {
                summary.insert("duration".to_string(), Value::String(format_ms(ms)));
            }
            let body = match response.get("data") {
                Some(data) => data.resolved()?,
                None => response.clone(),
            };
            summary.insert("response".to_string(), self.summarize_body(&body)?);
        }
        self.emit_value(Level::Debug, label, &Value::object(summary))
    }

    fn summarize_body(&self, body: &Value) -> Result<Value> {
        match body {
            Value::Array(arr) => {
                let len = arr.try_read()?.len();
                Ok(Value::String(format!("Array({})", len)))
            }
            Value::Object(obj) => {
                // Read everything up front; resolving `businesses` and
                // clipping `total` may run getters.
                let (key_count, businesses, total, has_region) = {
                    let map = obj.try_read()?;
                    (
                        map.len(),
                        map.get("businesses").cloned(),
                        map.get("total").cloned(),
                        map.contains_key("region"),
                    )
                };
                let count = match businesses.map(|b| b.resolved()).transpose()? {
                    Some(Value::Array(list)) => list.try_read()?.len(),
                    _ => return Ok(Value::String(format!("Object({} keys)", key_count))),
                };
                let mut summary = ClipMap::with_capacity(3);
                summary.insert(
                    "businesses".to_string(),
                    Value::String(format!("Array({})", count)),
                );
                if let Some(total) = total {
                    summary.insert("total".to_string(), try_clip(&total, &self.config.clip)?);
                }
                let region = if has_region { "present" } else { "absent" };
                summary.insert("region".to_string(), Value::from(region));
                Ok(Value::object(summary))
            }
            other => try_clip(other, &self.config.clip),
        }
    }

    /// Times `operation`, logs the outcome, and returns it untouched.
    ///
    /// # Errors
    ///
    /// Returns exactly the error `operation` returned.
    pub fn log_perf<T, E, F>(&self, label: &str, operation: F) -> std::result::Result<T, E>
    where
        F: FnOnce() -> std::result::Result<T, E>,
        E: fmt::Display,
    {
        if !self.config.enabled {
            return operation();
        }
        let started = Instant::now();
        let outcome = operation();
        self.report_perf(label, started.elapsed(), outcome.as_ref().err());
        outcome
    }

    /// Awaits and times `operation`, logs the outcome, and returns it untouched.
    ///
    /// # Errors
    ///
    /// Returns exactly the error `operation` resolved to.
    pub async fn log_perf_async<T, E, Fut>(
        &self,
        label: &str,
        operation: Fut,
    ) -> std::result::Result<T, E>
    where
        Fut: Future<Output = std::result::Result<T, E>>,
        E: fmt::Display,
    {
        if !self.config.enabled {
            return operation.await;
        }
        let started = Instant::now();
        let outcome = operation.await;
        self.report_perf(label, started.elapsed(), outcome.as_ref().err());
        outcome
    }

    fn report_perf<E: fmt::Display>(&self, label: &str, elapsed: Duration, failure: Option<&E>) {
        let label = format!("PERF {}", label);
        let mut summary = ClipMap::with_capacity(2);
        summary.insert(
            "duration".to_string(),
            Value::String(format_ms(elapsed.as_secs_f64() * 1000.0)),
        );
        let level = match failure {
            None => Level::Debug,
            Some(err) => {
                let name = short_type_name(std::any::type_name::<E>());
                let record = ErrorValue::new(name, err.to_string());
                summary.insert(
                    "error".to_string(),
                    crate::clip_with_options(&Value::Error(record), &self.config.clip),
                );
                Level::Error
            }
        };
        if let Err(err) = self.emit_value(level, &label, &Value::object(summary)) {
            self.emit_failure(&label, &err);
        }
    }

    /// Logs a component render. Function-valued props are dropped before clipping.
    pub fn log_render(&self, component: &str, props: Option<&Value>, render_count: Option<u64>) {
        if !self.config.enabled {
            return;
        }
        let label = match render_count {
            Some(count) => format!("RENDER {} #{}", component, count),
            None => format!("RENDER {}", component),
        };
        if let Err(err) = self.try_log_render(&label, props, render_count) {
            self.emit_failure(&label, &err);
        }
    }

    fn try_log_render(
        &self,
        label: &str,
        props: Option<&Value>,
        render_count: Option<u64>,
    ) -> Result<()> {
        let mut summary = ClipMap::with_capacity(2);
        if let Some(count) = render_count {
            summary.insert("renderCount".to_string(), Value::from(count));
        }
        if let Some(props) = props {
            let filtered = match props {
                Value::Object(obj) => Value::object(
                    obj.try_read()?
                        .iter()
                        .filter(|(_, v)| !v.is_function())
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect(),
                ),
                other => other.clone(),
            };
            summary.insert("props".to_string(), try_clip(&filtered, &self.config.clip)?);
        }
        self.emit_value(Level::Debug, label, &Value::object(summary))
    }

    fn log_clipped(
        &self,
        level: Level,
        label: &str,
        value: &Value,
        options: &ClipOptions,
    ) -> Result<()> {
        let clipped = try_clip(value, options)?;
        self.emit_value(level, label, &clipped)
    }

    /// Serializes an already bounded value and emits it, or its size sentinel.
    pub(crate) fn emit_value(&self, level: Level, label: &str, bounded: &Value) -> Result<()> {
        let payload = match to_json_string(bounded) {
            Ok(json) => json,
            Err(Error::Unserializable("undefined")) => "undefined".to_string(),
            Err(err) => return Err(err),
        };
        let len = payload.chars().count();
        if len > self.config.max_serialized_len {
            self.emit(Level::Warn, label, sentinel::too_large(len));
        } else {
            self.emit(level, label, payload);
        }
        Ok(())
    }

    pub(crate) fn emit_failure(&self, label: &str, err: &Error) {
        self.emit(Level::Error, label, sentinel::log_error(&err.to_string()));
    }

    fn emit(&self, level: Level, label: &str, payload: String) {
        self.sink.emit(LogEntry {
            level,
            label: label.to_string(),
            payload,
        });
    }
}

/// Drops `scheme://host` from an absolute URL.
pub(crate) fn strip_origin(url: &str) -> &str {
    match url.find("://") {
        Some(scheme_end) => {
            let rest = &url[scheme_end + 3..];
            rest.find('/').map_or("/", |path| &rest[path..])
        }
        None => url,
    }
}

/// Milliseconds rounded half away from zero: `"123ms"`.
pub(crate) fn format_ms(ms: f64) -> String {
    format!("{}ms", ms.round())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value;
    use crate::value::GETTER_HOPS;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn logger() -> DevLogger<MemorySink> {
        DevLogger::with_sink(LoggerConfig::new().with_enabled(true), MemorySink::new())
    }

    #[test]
    fn test_disabled_logger_is_silent() {
        let logger = DevLogger::with_sink(LoggerConfig::new().with_enabled(false), MemorySink::new());
        logger.log_safe("x", &value!(1), None);
        logger.log_array("x", &value!([1]), 3usize);
        logger.log_object("x", &value!({}), KeySelection::All);
        logger.log_network("GET", "/x", None, None);
        logger.log_render("X", None, None);
        assert_eq!(logger.log_perf("x", || Ok::<_, String>(5)), Ok(5));
        assert!(logger.sink().is_empty());
    }

    #[test]
    fn test_strip_origin() {
        assert_eq!(
            strip_origin("https://api.yelp.com/v3/businesses/search?term=x"),
            "/v3/businesses/search?term=x"
        );
        assert_eq!(strip_origin("https://api.yelp.com"), "/");
        assert_eq!(strip_origin("/businesses/search"), "/businesses/search");
    }

    #[test]
    fn test_format_ms() {
        assert_eq!(format_ms(12.5), "13ms");
        assert_eq!(format_ms(0.2), "0ms");
        assert_eq!(format_ms(1234.0), "1234ms");
    }

    #[test]
    fn test_log_safe_undefined() {
        let logger = logger();
        logger.log_safe("nothing", &Value::Undefined, None);
        assert_eq!(logger.sink().entries()[0].payload, "undefined");
    }

    #[test]
    fn test_log_safe_getter_failure_is_labelled() {
        let logger = logger();
        let value = value!({});
        value
            .as_object()
            .unwrap()
            .insert("lazy", Value::getter(|| Err("boom".to_string())));
        logger.log_safe("state", &value, None);

        let entry = &logger.sink().entries()[0];
        assert_eq!(entry.level, Level::Error);
        assert_eq!(entry.label, "state");
        assert_eq!(entry.payload, "[LOG_ERROR: getter failed: boom]");
    }

    fn self_returning_getter() -> Value {
        let slot: Rc<RefCell<Option<Value>>> = Rc::new(RefCell::new(None));
        let inner = Rc::clone(&slot);
        let getter = Value::getter(move || Ok(inner.borrow().clone().unwrap_or(Value::Null)));
        *slot.borrow_mut() = Some(getter.clone());
        getter
    }

    #[test]
    fn test_getter_loops_end_in_one_entry() {
        let logger = logger();
        let getter = self_returning_getter();
        logger.log_safe("loop", &getter, None);
        logger.log_network("GET", "/loop", None, Some(&value!({ "data": (getter) })));

        let entries = logger.sink().take();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].payload, r#""[MAX_DEPTH_EXCEEDED]""#);
        assert_eq!(entries[1].label, "API GET /loop");
        assert_eq!(
            entries[1].payload,
            format!("[LOG_ERROR: getter failed: more than {} chained getters]", GETTER_HOPS)
        );
    }

    #[test]
    fn test_network_body_behind_getter_is_summarized() {
        let logger = logger();
        let response = value!({ "status": 200 });
        response.as_object().unwrap().insert(
            "data",
            Value::getter(|| {
                Ok(value!({
                    "businesses": (Value::getter(|| Ok(value!([{ "id": "secret-biz", "name": "A" }])))),
                    "total": 1,
                }))
            }),
        );
        logger.log_network("GET", "https://api.example.com/businesses/search", None, Some(&response));

        let entry = &logger.sink().entries()[0];
        assert_eq!(
            entry.payload,
            r#"{"status":200,"response":{"businesses":"Array(1)","total":1,"region":"absent"}}"#
        );
        assert!(!entry.payload.contains("secret-biz"));
    }

    #[test]
    fn test_array_sample_from_options() {
        let sample = ArraySample::from(ClipOptions::new().with_max_items(4));
        assert_eq!(sample.size, 4);
        assert_eq!(ArraySample::from(2usize).item_options.max_depth, ARRAY_ITEM_DEPTH);
    }

    #[test]
    fn test_arc_sink_shares_entries() {
        let sink = Arc::new(MemorySink::new());
        let logger = DevLogger::with_sink(LoggerConfig::new().with_enabled(true), Arc::clone(&sink));
        logger.log_safe("a", &value!(1), None);
        assert_eq!(sink.len(), 1);
    }
}
