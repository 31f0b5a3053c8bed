//! Property-based tests for the clipping invariants.
//!
//! Generated value trees cover every kind the clipper dispatches on, including
//! non-finite numbers, failing getters and nodes that point back at an ancestor.

use proptest::prelude::*;
use serde_clip::{
    clip_with_options, safe_stringify, sanitize_state, to_json_string, ClipMap, ClipOptions,
    Object, SanitizeOptions, Value,
};

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        Just(Value::Undefined),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<f64>().prop_map(Value::from),
        "[a-z]{0,20}".prop_map(Value::from),
        Just(Value::function("cb")),
        Just(Value::symbol("s")),
        Just(Value::getter(|| Err("nope".to_string()))),
    ]
}

fn tree() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(6, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..8).prop_map(Value::array),
            prop::collection::vec(("[a-z]{1,6}", inner), 0..8).prop_map(|entries| {
                let map: ClipMap = entries.into_iter().collect();
                Value::object(map)
            }),
        ]
    })
}

fn options() -> impl Strategy<Value = ClipOptions> {
    (0usize..5, 0usize..6, 0usize..30).prop_map(|(depth, items, length)| {
        ClipOptions::new()
            .with_max_depth(depth)
            .with_max_items(items)
            .with_max_length(length)
    })
}

/// Deepest nesting of arrays/objects in a clipped tree.
fn depth_of(value: &Value) -> usize {
    match value {
        Value::Array(arr) => 1 + arr.borrow().iter().map(depth_of).max().unwrap_or(0),
        Value::Object(obj) => 1 + obj.borrow().values().map(depth_of).max().unwrap_or(0),
        _ => 0,
    }
}

fn nested(levels: usize) -> Value {
    let mut v = Value::from("bottom");
    for _ in 0..levels {
        let mut map = ClipMap::new();
        map.insert("next".to_string(), v);
        v = Value::object(map);
    }
    v
}

proptest! {
    #[test]
    fn prop_clip_is_total_and_serializable(v in tree(), opts in options()) {
        let clipped = clip_with_options(&v, &opts);
        let json = to_json_string(&clipped);
        prop_assert!(json.is_ok() || clipped.is_undefined() || clipped.is_string());
        let _ = safe_stringify(&v);
        let _ = sanitize_state(&v, &SanitizeOptions::default());
    }

    #[test]
    fn prop_clip_terminates_on_cycles(v in tree()) {
        let root = Object::new();
        root.insert("payload", v);
        root.insert("back", root.clone());
        let clipped = clip_with_options(&Value::Object(root), &ClipOptions::default());
        prop_assert_eq!(clipped.get("back"), Some(Value::from("[CIRCULAR]")));
    }

    #[test]
    fn prop_depth_bound(levels in 1usize..12, max_depth in 0usize..6) {
        let clipped = clip_with_options(&nested(levels), &ClipOptions::new().with_max_depth(max_depth));
        prop_assert!(depth_of(&clipped) <= max_depth + 1);
        if levels > max_depth {
            let mut cursor = clipped;
            for _ in 0..=max_depth {
                cursor = cursor.get("next").unwrap();
            }
            prop_assert_eq!(cursor, Value::from("[MAX_DEPTH_EXCEEDED]"));
        }
    }

    #[test]
    fn prop_array_truncation(len in 0usize..40, max_items in 0usize..15) {
        let input: Vec<Value> = (0..len as i64).map(Value::from).collect();
        let clipped = clip_with_options(
            &Value::from(input.clone()),
            &ClipOptions::new().with_max_items(max_items),
        );
        let out = clipped.as_array().unwrap();
        if len > max_items {
            prop_assert_eq!(out.len(), max_items + 1);
            for (i, item) in input.iter().take(max_items).enumerate() {
                let got = out.get(i);
                prop_assert_eq!(got.as_ref(), Some(item));
            }
            let marker = out.get(max_items).unwrap();
            let dropped = (len - max_items).to_string();
            prop_assert!(marker.as_str().unwrap().contains(&dropped));
        } else {
            prop_assert_eq!(out.len(), len);
        }
    }

    #[test]
    fn prop_string_truncation(s in "\\PC{0,80}", max_length in 0usize..60) {
        let clipped = clip_with_options(&Value::from(s.as_str()), &ClipOptions::new().with_max_length(max_length));
        let out = clipped.as_str().unwrap();
        let len = s.chars().count();
        if len > max_length {
            let head: String = s.chars().take(max_length).collect();
            prop_assert!(out.starts_with(&head));
            let suffix = format!("{} chars]", len);
            prop_assert!(out.ends_with(&suffix));
        } else {
            prop_assert_eq!(out, s.as_str());
        }
    }

    #[test]
    fn prop_small_input_is_unchanged(items in prop::collection::vec(any::<i32>(), 0..10), label in "[a-z ]{0,30}") {
        let mut map = ClipMap::new();
        map.insert("label".to_string(), Value::from(label));
        map.insert(
            "items".to_string(),
            Value::from(items.into_iter().map(Value::from).collect::<Vec<_>>()),
        );
        let v = Value::object(map);
        prop_assert_eq!(clip_with_options(&v, &ClipOptions::default()), v);
    }
}
