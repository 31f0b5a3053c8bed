/// Builds a [`Value`](crate::Value) from a JSON-like literal.
///
/// Arrays and objects are created as fresh nodes; leaves go through `Value::from`.
///
/// ```rust
/// use serde_clip::value;
///
/// let business = value!({
///     "name": "Pizzeria",
///     "rating": 4.5,
///     "categories": ["pizza", "italian"],
///     "closed": false
/// });
/// assert_eq!(business.get("rating").and_then(|v| v.as_f64()), Some(4.5));
/// ```
#[macro_export]
macro_rules! value {
    (null) => {
        $crate::Value::Null
    };

    (undefined) => {
        $crate::Value::Undefined
    };

    (true) => {
        $crate::Value::Bool(true)
    };

    (false) => {
        $crate::Value::Bool(false)
    };

    ([]) => {
        $crate::Value::array(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::array(vec![$($crate::value!($elem)),*])
    };

    ({}) => {
        $crate::Value::object($crate::ClipMap::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut object = $crate::ClipMap::new();
        $(
            object.insert($key.to_string(), $crate::value!($value));
        )*
        $crate::Value::object(object)
    }};

    ($s:expr) => {
        $crate::Value::from($s)
    };
}
