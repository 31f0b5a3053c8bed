use serde_clip::{value, ClipMap, Number, Value};

#[test]
fn test_value_macro_null_and_undefined() {
    assert_eq!(value!(null), Value::Null);
    assert_eq!(value!(undefined), Value::Undefined);
    assert_ne!(value!(null), value!(undefined));
}

#[test]
fn test_value_macro_booleans() {
    assert_eq!(value!(true), Value::Bool(true));
    assert_eq!(value!(false), Value::Bool(false));
}

#[test]
fn test_value_macro_numbers() {
    assert_eq!(value!(42), Value::Number(Number::Integer(42)));
    assert_eq!(value!(3.5), Value::Number(Number::Float(3.5)));
    assert_eq!(value!(-123), Value::Number(Number::Integer(-123)));
    assert_eq!(value!(f64::INFINITY), Value::Number(Number::Infinity));
    assert!(matches!(value!(f64::NAN), Value::Number(Number::NaN)));
}

#[test]
fn test_value_macro_strings() {
    assert_eq!(value!("hello"), Value::String("hello".to_string()));
    let owned = String::from("owned");
    assert_eq!(value!(owned), Value::from("owned"));
}

#[test]
fn test_value_macro_arrays() {
    let empty = value!([]);
    assert_eq!(empty.as_array().map(|a| a.len()), Some(0));

    let mixed = value!([1, "two", null, undefined, [3]]);
    let arr = mixed.as_array().unwrap();
    assert_eq!(arr.len(), 5);
    assert_eq!(arr.get(1), Some(Value::from("two")));
    assert_eq!(arr.get(3), Some(Value::Undefined));
    assert_eq!(arr.get(4), Some(value!([3])));
}

#[test]
fn test_value_macro_objects_keep_insertion_order() {
    let obj = value!({ "zeta": 1, "alpha": 2, "mid": 3 });
    let keys = obj.as_object().unwrap().keys();
    assert_eq!(keys, vec!["zeta", "alpha", "mid"]);

    let mut expected = ClipMap::new();
    expected.insert("zeta".to_string(), Value::from(1));
    expected.insert("alpha".to_string(), Value::from(2));
    expected.insert("mid".to_string(), Value::from(3));
    assert_eq!(obj, Value::object(expected));
}

#[test]
fn test_value_macro_nested() {
    let search = value!({
        "term": "tacos",
        "filters": { "open_now": true, "price": [1, 2] },
        "results": [{ "id": "b1" }, { "id": "b2" }],
    });
    assert_eq!(
        search.get("filters").and_then(|f| f.get("open_now")),
        Some(Value::Bool(true))
    );
    let results = search.get("results").unwrap();
    assert_eq!(
        results.as_array().and_then(|r| r.get(1)).and_then(|b| b.get("id")),
        Some(Value::from("b2"))
    );
}

#[test]
fn test_value_macro_embeds_expressions() {
    let shared = value!({ "n": 1 });
    let root = value!({ "a": (shared.clone()), "b": (shared.clone()) });
    assert_eq!(root.get("a").and_then(|v| v.node_id()), shared.node_id());
    assert_eq!(root.get("b").and_then(|v| v.node_id()), shared.node_id());
}
