//! Dynamic value graph accepted by the clipper and the state sanitizer.
//!
//! [`Value`] models whatever a caller might hand to a debug logger: primitives,
//! big integers, symbols, functions, dates, errors, arrays and objects. Arrays
//! and objects are reference handles ([`Array`], [`Object`]), so a value can
//! share sub-trees or point back at itself the way a live application state does.
//!
//! ## Creating Values
//!
//! ```rust
//! use serde_clip::{value, Value};
//!
//! let null = Value::Null;
//! let number = Value::from(42);
//! let text = Value::from("hello");
//! let record = value!({ "name": "Pizzeria", "rating": 4.5 });
//! assert!(record.is_object());
//! ```
//!
//! ## Shared and Cyclic Graphs
//!
//! Cloning an [`Array`] or [`Object`] clones the handle, not the contents:
//!
//! ```rust
//! use serde_clip::{Object, Value};
//!
//! let node = Object::new();
//! node.insert("name", "x");
//! node.insert("self", node.clone());
//!
//! let again = node.get("self").unwrap();
//! assert_eq!(again.node_id(), Some(node.id()));
//! ```

use crate::{ClipMap, Error};
use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use serde::{Deserialize, Deserializer};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

/// Identity of an [`Array`] or [`Object`] node, stable for the node's lifetime.
pub type NodeId = usize;

/// Getters [`Value::resolved`] follows before giving up on a chain.
pub const GETTER_HOPS: usize = 16;

/// A dynamically-typed value, possibly shared or cyclic.
///
/// # Examples
///
/// ```rust
/// use serde_clip::{Number, Value};
///
/// let num = Value::Number(Number::Integer(42));
/// let text = Value::String("hello".to_string());
///
/// assert!(num.is_number());
/// assert!(text.is_string());
/// assert_eq!(Value::function("onPress").type_name(), "function");
/// ```
#[derive(Clone, Default)]
pub enum Value {
    Undefined,
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    BigInt(BigInt),
    /// Symbol with an optional description.
    Symbol(Option<String>),
    /// Opaque callable, optionally named. Never invoked.
    Function(Option<String>),
    Date(DateTime<Utc>),
    Error(ErrorValue),
    Array(Array),
    Object(Object),
    /// Property whose value is computed on read and may fail.
    Getter(Getter),
    /// Host type the walkers pass through untouched.
    Exotic(Rc<dyn Exotic>),
}

/// A numeric value: integer, float, or one of the IEEE special values.
///
/// # Examples
///
/// ```rust
/// use serde_clip::Number;
///
/// assert!(Number::Integer(42).is_integer());
/// assert_eq!(Number::Float(42.0).as_i64(), Some(42));
/// assert!(Number::NaN.is_special());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
    Infinity,
    NegativeInfinity,
    NaN,
}

impl Number {
    /// Returns `true` if this is an integer value.
    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Number::Integer(_))
    }

    /// Returns `true` if this is a special value (Infinity, -Infinity, or NaN).
    #[inline]
    #[must_use]
    pub const fn is_special(&self) -> bool {
        matches!(
            self,
            Number::Infinity | Number::NegativeInfinity | Number::NaN
        )
    }

    /// Converts this number to an `i64` if it is whole and in range.
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Integer(i) => Some(*i),
            Number::Float(f) => {
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                    Some(*f as i64)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Converts this number to an `f64`.
    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(i) => *i as f64,
            Number::Float(f) => *f,
            Number::Infinity => f64::INFINITY,
            Number::NegativeInfinity => f64::NEG_INFINITY,
            Number::NaN => f64::NAN,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{}", i),
            Number::Float(fl) => write!(f, "{}", fl),
            Number::Infinity => write!(f, "Infinity"),
            Number::NegativeInfinity => write!(f, "-Infinity"),
            Number::NaN => write!(f, "NaN"),
        }
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Integer(value)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        if value.is_nan() {
            Number::NaN
        } else if value == f64::INFINITY {
            Number::Infinity
        } else if value == f64::NEG_INFINITY {
            Number::NegativeInfinity
        } else {
            Number::Float(value)
        }
    }
}

/// An error record: the three fields a debug dump of an error needs.
///
/// # Examples
///
/// ```rust
/// use serde_clip::ErrorValue;
///
/// let err = ErrorValue::new("TypeError", "x is undefined").with_stack("at render (App.tsx:10)");
/// assert_eq!(err.name, "TypeError");
/// assert!(err.stack.is_some());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ErrorValue {
    pub name: String,
    pub message: String,
    pub stack: Option<String>,
}

impl ErrorValue {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        ErrorValue {
            name: name.into(),
            message: message.into(),
            stack: None,
        }
    }

    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Builds a record from a Rust error. The source chain becomes the stack.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_clip::ErrorValue;
    ///
    /// let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
    /// let err = ErrorValue::from_error(&io);
    /// assert_eq!(err.message, "disk full");
    /// ```
    pub fn from_error<E>(err: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let name = short_type_name(std::any::type_name::<E>());
        let mut chain = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push(format!("caused by: {}", cause));
            source = cause.source();
        }
        ErrorValue {
            name: name.to_string(),
            message: err.to_string(),
            stack: if chain.is_empty() {
                None
            } else {
                Some(chain.join("\n"))
            },
        }
    }
}

pub(crate) fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Shared, identity-bearing ordered sequence.
#[derive(Clone, Default)]
pub struct Array(Rc<RefCell<Vec<Value>>>);

impl Array {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_vec(items: Vec<Value>) -> Self {
        Array(Rc::new(RefCell::new(items)))
    }

    /// Identity of this node.
    #[must_use]
    pub fn id(&self) -> NodeId {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Array) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push(&self, value: impl Into<Value>) {
        self.0.borrow_mut().push(value.into());
    }

    /// Returns a clone of the element at `index` (a new handle for nested nodes).
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.borrow().get(index).cloned()
    }

    pub fn borrow(&self) -> Ref<'_, Vec<Value>> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Vec<Value>> {
        self.0.borrow_mut()
    }

    pub(crate) fn try_read(&self) -> crate::Result<Ref<'_, Vec<Value>>> {
        self.0.try_borrow().map_err(|_| Error::Unreadable)
    }
}

/// Shared, identity-bearing, insertion-ordered keyed collection.
#[derive(Clone, Default)]
pub struct Object(Rc<RefCell<ClipMap>>);

impl Object {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_map(map: ClipMap) -> Self {
        Object(Rc::new(RefCell::new(map)))
    }

    /// Identity of this node.
    #[must_use]
    pub fn id(&self) -> NodeId {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.borrow_mut().insert(key.into(), value.into())
    }

    /// Returns a clone of the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.borrow().get(key).cloned()
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.borrow().contains_key(key)
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.0.borrow().keys().cloned().collect()
    }

    pub fn borrow(&self) -> Ref<'_, ClipMap> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, ClipMap> {
        self.0.borrow_mut()
    }

    pub(crate) fn try_read(&self) -> crate::Result<Ref<'_, ClipMap>> {
        self.0.try_borrow().map_err(|_| Error::Unreadable)
    }
}

type GetterFn = dyn Fn() -> std::result::Result<Value, String>;

/// A property computed when read. Reading may fail.
///
/// # Examples
///
/// ```rust
/// use serde_clip::{Getter, Value};
///
/// let ok = Getter::new(|| Ok(Value::from(1)));
/// assert_eq!(ok.get().unwrap(), Value::from(1));
///
/// let failing = Getter::new(|| Err("not ready".to_string()));
/// assert!(failing.get().is_err());
/// ```
#[derive(Clone)]
pub struct Getter(Rc<GetterFn>);

impl Getter {
    pub fn new<F>(read: F) -> Self
    where
        F: Fn() -> std::result::Result<Value, String> + 'static,
    {
        Getter(Rc::new(read))
    }

    /// Evaluates the property.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Getter`] with the message produced by the closure.
    pub fn get(&self) -> crate::Result<Value> {
        (self.0)().map_err(Error::Getter)
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Getter) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Getter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Getter(..)")
    }
}

/// A host value outside the closed set of kinds, passed through unchanged.
///
/// Implementors provide their own JSON form; the walkers never look inside.
pub trait Exotic: fmt::Debug {
    /// Name used in error messages and [`Value::type_name`].
    fn type_name(&self) -> &str;

    /// JSON form of the value.
    ///
    /// # Errors
    ///
    /// Returns a message when the value cannot be represented.
    fn to_json(&self) -> std::result::Result<serde_json::Value, String>;
}

impl Value {
    #[must_use]
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Array::from_vec(items))
    }

    #[must_use]
    pub fn object(map: ClipMap) -> Self {
        Value::Object(Object::from_map(map))
    }

    #[must_use]
    pub fn function(name: &str) -> Self {
        Value::Function(Some(name.to_string()))
    }

    #[must_use]
    pub fn symbol(description: &str) -> Self {
        Value::Symbol(Some(description.to_string()))
    }

    pub fn getter<F>(read: F) -> Self
    where
        F: Fn() -> std::result::Result<Value, String> + 'static,
    {
        Value::Getter(Getter::new(read))
    }

    /// Reads through getters until a plain value comes out.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Getter`] when a getter fails or more than
    /// [`GETTER_HOPS`] getters are chained.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_clip::Value;
    ///
    /// let lazy = Value::getter(|| Ok(Value::getter(|| Ok(Value::from(3)))));
    /// assert_eq!(lazy.resolved().unwrap(), Value::from(3));
    /// ```
    pub fn resolved(&self) -> crate::Result<Value> {
        let mut current = self.clone();
        for _ in 0..GETTER_HOPS {
            current = match current {
                Value::Getter(getter) => getter.get()?,
                plain => return Ok(plain),
            };
        }
        match current {
            Value::Getter(_) => Err(Error::getter(format!(
                "more than {} chained getters",
                GETTER_HOPS
            ))),
            plain => Ok(plain),
        }
    }

    pub fn exotic<T: Exotic + 'static>(value: T) -> Self {
        Value::Exotic(Rc::new(value))
    }

    #[inline]
    #[must_use]
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_function(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_date(&self) -> bool {
        matches!(self, Value::Date(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// If the value is a string, returns a reference to it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_clip::Value;
    ///
    /// assert_eq!(Value::from("hello").as_str(), Some("hello"));
    /// assert_eq!(Value::from(42).as_str(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Date(dt) => Some(dt),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_error(&self) -> Option<&ErrorValue> {
        match self {
            Value::Error(err) => Some(err),
            _ => None,
        }
    }

    /// Looks up `key` when the value is an object.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_clip::value;
    ///
    /// let v = value!({ "total": 1000 });
    /// assert_eq!(v.get("total").and_then(|t| t.as_i64()), Some(1000));
    /// assert!(v.get("missing").is_none());
    /// ```
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.as_object().and_then(|obj| obj.get(key))
    }

    /// Identity of the node for arrays and objects.
    #[must_use]
    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            Value::Array(arr) => Some(arr.id()),
            Value::Object(obj) => Some(obj.id()),
            _ => None,
        }
    }

    /// Kind name, as reported in summaries and errors.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::BigInt(_) => "bigint",
            Value::Symbol(_) => "symbol",
            Value::Function(_) => "function",
            Value::Date(_) => "date",
            Value::Error(_) => "error",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Getter(_) => "getter",
            Value::Exotic(ex) => ex.type_name(),
        }
    }
}

thread_local! {
    static FORMATTING: RefCell<HashSet<NodeId>> = RefCell::new(HashSet::new());
    static COMPARING: RefCell<HashSet<(NodeId, NodeId)>> = RefCell::new(HashSet::new());
}

// Runs `body` with `id` marked as open in `set`; returns `None` on re-entry.
fn reentrant<K, R>(
    set: &'static std::thread::LocalKey<RefCell<HashSet<K>>>,
    id: K,
    body: impl FnOnce() -> R,
) -> Option<R>
where
    K: std::hash::Hash + Eq + Copy + 'static,
{
    if !set.with(|open| open.borrow_mut().insert(id)) {
        return None;
    }
    let result = body();
    set.with(|open| open.borrow_mut().remove(&id));
    Some(result)
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Ok(items) = self.0.try_borrow() else {
            return f.write_str("Array(<borrowed>)");
        };
        reentrant(&FORMATTING, self.id(), || f.debug_list().entries(items.iter()).finish())
            .unwrap_or_else(|| f.write_str("[Circular]"))
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Ok(map) = self.0.try_borrow() else {
            return f.write_str("Object(<borrowed>)");
        };
        reentrant(&FORMATTING, self.id(), || fmt::Debug::fmt(&*map, f))
            .unwrap_or_else(|| f.write_str("[Circular]"))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("Undefined"),
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::BigInt(bi) => f.debug_tuple("BigInt").field(bi).finish(),
            Value::Symbol(desc) => f.debug_tuple("Symbol").field(desc).finish(),
            Value::Function(name) => f.debug_tuple("Function").field(name).finish(),
            Value::Date(dt) => f.debug_tuple("Date").field(dt).finish(),
            Value::Error(err) => f.debug_tuple("Error").field(err).finish(),
            Value::Array(arr) => fmt::Debug::fmt(arr, f),
            Value::Object(obj) => fmt::Debug::fmt(obj, f),
            Value::Getter(g) => fmt::Debug::fmt(g, f),
            Value::Exotic(ex) => fmt::Debug::fmt(ex, f),
        }
    }
}

impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let (Ok(a), Ok(b)) = (self.0.try_borrow(), other.0.try_borrow()) else {
            return false;
        };
        // A pair already under comparison is assumed equal; any difference shows up elsewhere.
        reentrant(&COMPARING, (self.id(), other.id()), || *a == *b).unwrap_or(true)
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let (Ok(a), Ok(b)) = (self.0.try_borrow(), other.0.try_borrow()) else {
            return false;
        };
        reentrant(&COMPARING, (self.id(), other.id()), || *a == *b).unwrap_or(true)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Getter(a), Value::Getter(b)) => a.ptr_eq(b),
            (Value::Exotic(a), Value::Exotic(b)) => {
                Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    /// Bounded JSON rendering; never fails and never loops.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::safe_stringify_with_options(
            self,
            &crate::ClipOptions::default(),
        ))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any JSON value")
            }

            fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E> {
                Ok(Value::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E> {
                Ok(Value::Number(Number::Integer(value)))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E> {
                Ok(Value::from(value))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E> {
                Ok(Value::from(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E> {
                Ok(Value::String(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> Result<Self::Value, E> {
                Ok(Value::String(value))
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E> {
                Ok(Value::Null)
            }

            fn visit_none<E>(self) -> Result<Self::Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut vec = Vec::new();
                while let Some(elem) = seq.next_element()? {
                    vec.push(elem);
                }
                Ok(Value::array(vec))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut values = ClipMap::new();
                while let Some((key, value)) = map.next_entry()? {
                    values.insert(key, value);
                }
                Ok(Value::object(values))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

fn mismatch(expected: &str, found: &Value) -> crate::Error {
    crate::Error::unsupported_type(&format!("expected {}, found {}", expected, found.type_name()))
}

impl TryFrom<Value> for i64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        value
            .as_i64()
            .ok_or_else(|| mismatch("integer", &value))
    }
}

impl TryFrom<Value> for f64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        value
            .as_f64()
            .ok_or_else(|| mismatch("number", &value))
    }
}

impl TryFrom<Value> for bool {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch("boolean", &other)),
        }
    }
}

impl TryFrom<Value> for String {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

macro_rules! from_small_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Number(Number::Integer(value as i64))
                }
            }
        )*
    };
}

from_small_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(i) => Value::Number(Number::Integer(i)),
            Err(_) => Value::Number(Number::Float(value as f64)),
        }
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::from(value as u64)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Number(Number::from(value as f64))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(Number::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::array(value)
    }
}

impl From<ClipMap> for Value {
    fn from(value: ClipMap) -> Self {
        Value::object(value)
    }
}

impl From<Array> for Value {
    fn from(value: Array) -> Self {
        Value::Array(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Date(value)
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Value::BigInt(value)
    }
}

impl From<ErrorValue> for Value {
    fn from(value: ErrorValue) -> Self {
        Value::Error(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tryfrom_i64() {
        let value = Value::Number(Number::Float(42.0));
        assert_eq!(i64::try_from(value).unwrap(), 42);
        assert!(i64::try_from(Value::from("test")).is_err());
    }

    #[test]
    fn test_tryfrom_string_and_bool() {
        assert_eq!(String::try_from(Value::from("hi")).unwrap(), "hi");
        assert!(bool::try_from(Value::from(1)).is_err());
    }

    #[test]
    fn test_from_f64_specials() {
        assert_eq!(Value::from(f64::NAN), Value::Number(Number::NaN));
        assert_eq!(Value::from(f64::INFINITY), Value::Number(Number::Infinity));
        assert_eq!(Value::from(1.5), Value::Number(Number::Float(1.5)));
    }

    #[test]
    fn test_clone_shares_identity() {
        let arr = Array::new();
        let alias = Value::Array(arr.clone());
        arr.push(1);
        assert_eq!(alias.as_array().map(Array::len), Some(1));
        assert_eq!(alias.node_id(), Some(arr.id()));
    }

    #[test]
    fn test_debug_terminates_on_cycle() {
        let obj = Object::new();
        obj.insert("self", obj.clone());
        let rendered = format!("{:?}", Value::Object(obj));
        assert!(rendered.contains("[Circular]"));
    }

    #[test]
    fn test_eq_terminates_on_cycles() {
        let a = Object::new();
        a.insert("self", a.clone());
        let b = Object::new();
        b.insert("self", b.clone());
        assert_eq!(Value::Object(a), Value::Object(b));
    }

    #[test]
    fn test_eq_structural() {
        let a = Value::array(vec![Value::from(1), Value::from("x")]);
        let b = Value::array(vec![Value::from(1), Value::from("x")]);
        let c = Value::array(vec![Value::from(2)]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_error_value_from_error() {
        #[derive(Debug)]
        struct Outer(std::io::Error);
        impl fmt::Display for Outer {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "request failed")
            }
        }
        impl std::error::Error for Outer {
            fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
                Some(&self.0)
            }
        }

        let err = Outer(std::io::Error::new(std::io::ErrorKind::Other, "timeout"));
        let record = ErrorValue::from_error(&err);
        assert_eq!(record.name, "Outer");
        assert_eq!(record.message, "request failed");
        assert_eq!(record.stack.as_deref(), Some("caused by: timeout"));
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("std::io::error::Error"), "Error");
        assert_eq!(short_type_name("a::Wrapper<b::Inner>"), "Wrapper");
    }

    #[test]
    fn test_deserialize_from_json() {
        let value: Value = serde_json::from_str(r#"{"a":[1,2.5,null],"b":"x"}"#).unwrap();
        assert_eq!(value.get("b").and_then(|v| v.as_str().map(String::from)), Some("x".into()));
        let arr = value.get("a").unwrap();
        assert_eq!(arr.as_array().map(Array::len), Some(3));
    }
}
