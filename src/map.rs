//! Ordered map type backing object nodes.
//!
//! [`ClipMap`] wraps [`IndexMap`] so that object entries keep their insertion
//! order. The clipper keeps "the first N keys" of an object, which is only
//! meaningful when iteration order is the order the keys were written in.
//!
//! ## Examples
//!
//! ```rust
//! use serde_clip::{ClipMap, Value};
//!
//! let mut map = ClipMap::new();
//! map.insert("name".to_string(), Value::from("Pizzeria"));
//! map.insert("rating".to_string(), Value::from(4.5));
//!
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.get("name").and_then(|v| v.as_str()), Some("Pizzeria"));
//! ```

use indexmap::IndexMap;
use std::collections::HashMap;

/// An insertion-ordered map of string keys to values.
///
/// # Examples
///
/// ```rust
/// use serde_clip::{ClipMap, Value};
///
/// let mut map = ClipMap::new();
/// map.insert("first".to_string(), Value::from(1));
/// map.insert("second".to_string(), Value::from(2));
///
/// let keys: Vec<_> = map.keys().cloned().collect();
/// assert_eq!(keys, vec!["first", "second"]);
/// ```
#[derive(Clone, Default, PartialEq)]
pub struct ClipMap(IndexMap<String, crate::Value>);

impl ClipMap {
    /// Creates an empty `ClipMap`.
    #[must_use]
    pub fn new() -> Self {
        ClipMap(IndexMap::new())
    }

    /// Creates an empty `ClipMap` with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        ClipMap(IndexMap::with_capacity(capacity))
    }

    /// Inserts a key-value pair, keeping the original position if the key existed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_clip::{ClipMap, Value};
    ///
    /// let mut map = ClipMap::new();
    /// assert!(map.insert("key".to_string(), Value::from(42)).is_none());
    /// assert!(map.insert("key".to_string(), Value::from(43)).is_some());
    /// ```
    pub fn insert(&mut self, key: String, value: crate::Value) -> Option<crate::Value> {
        self.0.insert(key, value)
    }

    /// Returns a reference to the value corresponding to the key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&crate::Value> {
        self.0.get(key)
    }

    /// Returns `true` if the map holds the key.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Removes a key, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<crate::Value> {
        self.0.shift_remove(key)
    }

    /// Returns the number of entries in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the map contains no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the keys of the map, in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, crate::Value> {
        self.0.keys()
    }

    /// Returns an iterator over the values of the map, in insertion order.
    pub fn values(&self) -> indexmap::map::Values<'_, String, crate::Value> {
        self.0.values()
    }

    /// Returns an iterator over the key-value pairs of the map, in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, crate::Value> {
        self.0.iter()
    }
}

impl From<HashMap<String, crate::Value>> for ClipMap {
    fn from(map: HashMap<String, crate::Value>) -> Self {
        ClipMap(map.into_iter().collect())
    }
}

impl IntoIterator for ClipMap {
    type Item = (String, crate::Value);
    type IntoIter = indexmap::map::IntoIter<String, crate::Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ClipMap {
    type Item = (&'a String, &'a crate::Value);
    type IntoIter = indexmap::map::Iter<'a, String, crate::Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, crate::Value)> for ClipMap {
    fn from_iter<T: IntoIterator<Item = (String, crate::Value)>>(iter: T) -> Self {
        ClipMap(IndexMap::from_iter(iter))
    }
}

impl std::fmt::Debug for ClipMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}
