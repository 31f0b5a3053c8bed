//! Checks on cached result lists for damage left by clipping at write time.
//!
//! A business list that went through the clipper before being persisted can
//! come back with markers where real data used to be: a `"[MAX_DEPTH_EXCEEDED]"`
//! instead of a record, or coordinates flattened into strings. Readers of the
//! cache call [`check_cached_results`] and drop the entry when it fails.

use crate::guard::VisitGuard;
use crate::{sentinel, Value};
use thiserror::Error;

/// Record fields that must never hold a marker.
const IDENTITY_FIELDS: [&str; 2] = ["id", "name"];

const COORDINATE_FIELDS: [&str; 2] = ["latitude", "longitude"];

/// Why a cached list was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Corruption {
    #[error("cached results are {found}, expected a list of records")]
    NotAList { found: String },

    #[error("record {index} is {found}, expected an object")]
    RecordNotObject { index: usize, found: String },

    #[error("record {index} has marker {value:?} in `{field}`")]
    SentinelField {
        index: usize,
        field: String,
        value: String,
    },

    #[error("record {index} has non-numeric coordinates.{field}")]
    CoordinateNotNumber { index: usize, field: String },
}

/// Validates a cached business list: a bare array of records, or an object
/// whose `businesses` field is one.
///
/// # Errors
///
/// Returns the first [`Corruption`] found, scanning records in order.
///
/// # Examples
///
/// ```rust
/// use serde_clip::integrity::{check_cached_results, Corruption};
/// use serde_clip::value;
///
/// let good = value!({ "businesses": [{ "id": "b1", "name": "Taqueria" }], "total": 1 });
/// assert!(check_cached_results(&good).is_ok());
///
/// let clipped = value!([{ "id": "b1", "name": "[MAX_DEPTH_EXCEEDED]" }]);
/// assert!(matches!(
///     check_cached_results(&clipped),
///     Err(Corruption::SentinelField { index: 0, .. })
/// ));
/// ```
pub fn check_cached_results(cached: &Value) -> Result<(), Corruption> {
    let list = match cached {
        Value::Array(_) => cached.clone(),
        Value::Object(_) => match cached.get("businesses") {
            Some(list @ Value::Array(_)) => list,
            Some(other) => return Err(not_a_list(&other)),
            None => return Err(not_a_list(cached)),
        },
        other => return Err(not_a_list(other)),
    };
    let records = match list.as_array().map(|arr| arr.try_read()) {
        Some(Ok(items)) => items.clone(),
        _ => Vec::new(),
    };

    for (index, record) in records.iter().enumerate() {
        check_record(index, record)?;
    }
    Ok(())
}

fn not_a_list(value: &Value) -> Corruption {
    Corruption::NotAList {
        found: describe(value),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) if sentinel::is_sentinel(s) => format!("marker {:?}", s),
        other => other.type_name().to_string(),
    }
}

fn check_record(index: usize, record: &Value) -> Result<(), Corruption> {
    if !record.is_object() {
        return Err(Corruption::RecordNotObject {
            index,
            found: describe(record),
        });
    }

    for field in IDENTITY_FIELDS {
        if let Some(Value::String(s)) = record.get(field) {
            if is_damaged(&s) {
                return Err(Corruption::SentinelField {
                    index,
                    field: field.to_string(),
                    value: s,
                });
            }
        }
    }

    if let Some(coordinates) = record.get("coordinates") {
        if coordinates.is_string() {
            return Err(Corruption::CoordinateNotNumber {
                index,
                field: "*".to_string(),
            });
        }
        for field in COORDINATE_FIELDS {
            match coordinates.get(field) {
                None | Some(Value::Null) | Some(Value::Number(_)) => {}
                Some(_) => {
                    return Err(Corruption::CoordinateNotNumber {
                        index,
                        field: field.to_string(),
                    })
                }
            }
        }
    }
    Ok(())
}

fn is_damaged(s: &str) -> bool {
    sentinel::is_sentinel(s) || s.contains("... [TRUNCATED")
}

/// Returns `true` if any string or key anywhere in `value` is a marker.
///
/// # Examples
///
/// ```rust
/// use serde_clip::integrity::contains_sentinel;
/// use serde_clip::{clip_with_options, value, ClipOptions};
///
/// let raw = value!({ "a": { "b": { "c": 1 } } });
/// assert!(!contains_sentinel(&raw));
/// assert!(contains_sentinel(&clip_with_options(&raw, &ClipOptions::new().with_max_depth(1))));
/// ```
#[must_use]
pub fn contains_sentinel(value: &Value) -> bool {
    scan(value, &mut VisitGuard::new())
}

fn scan(value: &Value, guard: &mut VisitGuard) -> bool {
    match value {
        Value::String(s) => is_damaged(s),
        Value::Array(arr) => {
            if !guard.enter(arr.id()) {
                return false;
            }
            let items = match arr.try_read() {
                Ok(items) => items.clone(),
                Err(_) => Vec::new(),
            };
            let found = items.iter().any(|item| scan(item, guard));
            guard.leave(arr.id());
            found
        }
        Value::Object(obj) => {
            if !guard.enter(obj.id()) {
                return false;
            }
            let entries: Vec<(String, Value)> = match obj.try_read() {
                Ok(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
                Err(_) => Vec::new(),
            };
            let found = entries
                .iter()
                .any(|(key, item)| sentinel::is_sentinel(key) || scan(item, guard));
            guard.leave(obj.id());
            found
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clip_with_options, safe_stringify, value, ClipOptions, Object};

    #[test]
    fn test_valid_list_passes() {
        let list = value!([
            { "id": "a", "name": "Dim Sum House", "coordinates": { "latitude": 37.7, "longitude": 122.4 } },
            { "id": "b", "name": "Crepe Stop" }
        ]);
        assert_eq!(check_cached_results(&list), Ok(()));
    }

    #[test]
    fn test_not_a_list() {
        assert_eq!(
            check_cached_results(&value!("[CIRCULAR]")),
            Err(Corruption::NotAList {
                found: "marker \"[CIRCULAR]\"".to_string()
            })
        );
        assert!(matches!(
            check_cached_results(&value!({ "total": 3 })),
            Err(Corruption::NotAList { .. })
        ));
    }

    #[test]
    fn test_record_replaced_by_marker() {
        let list = value!([{ "id": "a" }, "[MAX_DEPTH_EXCEEDED]"]);
        assert_eq!(
            check_cached_results(&list),
            Err(Corruption::RecordNotObject {
                index: 1,
                found: "marker \"[MAX_DEPTH_EXCEEDED]\"".to_string()
            })
        );
    }

    #[test]
    fn test_stringified_coordinates() {
        let list = value!([{ "id": "a", "coordinates": { "latitude": "37.7", "longitude": 1 } }]);
        assert_eq!(
            check_cached_results(&list),
            Err(Corruption::CoordinateNotNumber {
                index: 0,
                field: "latitude".to_string()
            })
        );
    }

    #[test]
    fn test_truncated_name_is_damage() {
        let record = value!({ "id": "a", "name": "Extremely Long Restaurant Name" });
        let clipped = clip_with_options(&record, &ClipOptions::new().with_max_length(5));
        let list = Value::array(vec![clipped]);
        assert!(matches!(
            check_cached_results(&list),
            Err(Corruption::SentinelField { ref field, .. }) if field == "name"
        ));
    }

    #[test]
    fn test_contains_sentinel_scans_keys_and_cycles() {
        let wide = Object::new();
        for i in 0..25i64 {
            wide.insert(format!("k{}", i), i);
        }
        let clipped = crate::clip(&Value::Object(wide.clone()));
        assert!(!contains_sentinel(&Value::Object(wide.clone())));
        assert!(contains_sentinel(&clipped));

        wide.insert("me", wide.clone());
        assert!(!contains_sentinel(&Value::Object(wide)));
    }

    #[test]
    fn test_round_trip_through_storage_is_detected() {
        let deep = value!([{ "id": "a", "name": "x", "hours": [{ "open": [{ "day": 1 }] }] }]);
        let stored = crate::from_json_str(&safe_stringify(&deep)).unwrap();
        assert!(contains_sentinel(&stored));
        assert_eq!(check_cached_results(&stored), Ok(()));
    }
}
