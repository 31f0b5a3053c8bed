//! # serde_clip
//!
//! Bounded, cycle-safe copies of arbitrary value graphs, for logging and
//! developer tooling.
//!
//! Application state is rarely safe to print as-is: result lists run to
//! thousands of records, nodes point back at their parents, and some fields
//! are secrets. `serde_clip` walks a [`Value`] graph and produces a fresh copy
//! that fits a budget, replacing whatever it had to drop with a fixed
//! vocabulary of [`sentinel`] strings.
//!
//! ## Key Features
//!
//! - **Clipping**: depth, array-length, key-count and string-length limits,
//!   with explicit markers for everything cut ([`clip`], [`ClipOptions`])
//! - **Cycle Safety**: a node met while it is still being walked becomes
//!   `"[CIRCULAR]"`; shared but acyclic nodes are copied in full
//! - **Safe Stringify**: [`safe_stringify`] always returns a string
//! - **Logging Facade**: [`DevLogger`] emits one bounded entry per call
//!   through the `log` crate, gated off outside development
//! - **State Sanitizing**: [`sanitize_state`] redacts secrets and reduces bulky
//!   lists to one-line summaries for reducer logging ([`StateLogger`])
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_clip::{clip_with_options, safe_stringify, value, ClipOptions, Object, Value};
//!
//! let response = value!({
//!     "businesses": [1, 2, 3, 4, 5, 6, 7],
//!     "region": { "center": { "latitude": 37.8, "longitude": 122.3 } },
//! });
//!
//! let clipped = clip_with_options(&response, &ClipOptions::new().with_max_items(2));
//! assert_eq!(
//!     clipped.get("businesses"),
//!     Some(value!([1, 2, "[TRUNCATED: 5 more items]"]))
//! );
//!
//! let node = Object::new();
//! node.insert("parent", node.clone());
//! assert_eq!(safe_stringify(&Value::Object(node)), r#"{"parent":"[CIRCULAR]"}"#);
//! ```
//!
//! ### Logging
//!
//! ```rust
//! use serde_clip::{value, DevLogger, LoggerConfig, MemorySink};
//!
//! let logger = DevLogger::with_sink(LoggerConfig::new().with_enabled(true), MemorySink::new());
//! logger.log_array("results", &value!([10, 20, 30, 40]), 2usize);
//!
//! let entries = logger.sink().take();
//! assert_eq!(
//!     entries[0].line(),
//!     r#"[results] {"count":4,"sample":[10,20],"omitted":2}"#
//! );
//! ```
//!
//! ### From Rust types
//!
//! Anything that implements `Serialize` converts into a [`Value`]:
//!
//! ```rust
//! use serde::Serialize;
//! use serde_clip::{clip, to_value};
//!
//! #[derive(Serialize)]
//! struct Business { id: String, rating: f64 }
//!
//! let v = to_value(&Business { id: "b1".into(), rating: 4.5 }).unwrap();
//! assert_eq!(clip(&v), v);
//! ```
//!
//! ## Guarantees
//!
//! - No `unsafe` code
//! - [`clip`], [`safe_stringify`], [`sanitize_state`] and every logger method
//!   never fail and never panic on cyclic input
//! - Clipped output contains no shared or cyclic nodes

pub mod clip;
pub mod devtools;
pub mod error;
pub mod guard;
pub mod integrity;
pub mod logger;
pub mod macros;
pub mod map;
pub mod options;
pub mod sentinel;
pub mod ser;
pub mod stringify;
pub mod value;

pub use clip::{clip, clip_with_options, try_clip};
pub use devtools::{sanitize_state, StateLogger};
pub use error::{Error, Result};
pub use guard::VisitGuard;
pub use logger::{ArraySample, DevLogger, KeySelection, LogEntry, LogSink, MemorySink, Sink};
pub use map::ClipMap;
pub use options::{ClipOptions, LoggerConfig, SanitizeOptions};
pub use ser::{to_value, ValueSerializer};
pub use stringify::{from_json_str, safe_stringify, safe_stringify_with_options, to_json_string};
pub use value::{Array, ErrorValue, Exotic, Getter, NodeId, Number, Object, Value};

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Coordinates {
        latitude: f64,
        longitude: f64,
    }

    #[derive(Serialize)]
    struct Business {
        id: String,
        name: String,
        coordinates: Coordinates,
        categories: Vec<String>,
    }

    fn business(i: usize) -> Business {
        Business {
            id: format!("b{}", i),
            name: format!("Place {}", i),
            coordinates: Coordinates {
                latitude: 37.0 + i as f64 / 100.0,
                longitude: 122.0,
            },
            categories: vec!["food".to_string(); 12],
        }
    }

    #[test]
    fn test_serialized_struct_is_clipped() {
        let v = to_value(&business(1)).unwrap();
        let clipped = clip_with_options(&v, &ClipOptions::new().with_max_items(2));
        assert_eq!(
            clipped.get("categories"),
            Some(value!(["food", "food", "[TRUNCATED: 10 more items]"]))
        );
        assert_eq!(clipped.get("coordinates"), v.get("coordinates"));
    }

    #[test]
    fn test_storage_round_trip_stays_valid_json() {
        let list: Vec<Business> = (0..40).map(business).collect();
        let json = safe_stringify(&to_value(&list).unwrap());
        let back = from_json_str(&json).unwrap();
        assert_eq!(back.as_array().map(|a| a.len()), Some(6));
        assert!(integrity::contains_sentinel(&back));
    }

    #[test]
    fn test_display_is_safe_stringify() {
        let node = Object::new();
        node.insert("me", node.clone());
        assert_eq!(Value::Object(node).to_string(), r#"{"me":"[CIRCULAR]"}"#);
    }
}
