/// Builds a [`Value`](crate::Value) from RDN-like syntax.
///
/// Arrays use `[...]`, tuples `(...)`, objects `{"key": value}`. Explicit
/// maps and sets (`Map{k => v}`, `Set{...}`) are accepted at the top level of
/// a call. Anything else is converted through [`to_value`](crate::to_value).
///
/// A top-level tuple needs its own parentheses inside the call: `rdn!((1, 2))`.
///
/// ```rust
/// use rdn::{rdn, stringify};
///
/// let value = rdn!({
///     "id": 7,
///     "point": (1, 2),
///     "tags": ["a", "b"]
/// });
/// assert_eq!(stringify(&value), r#"{"id":7,"point":(1,2),"tags":["a","b"]}"#);
///
/// let lookup = rdn!(Map{1 => "one"});
/// assert_eq!(stringify(&lookup), r#"Map{1=>"one"}"#);
/// ```
#[macro_export]
macro_rules! rdn {
    // Handle null
    (null) => {
        $crate::Value::Null
    };

    // Handle true
    (true) => {
        $crate::Value::Bool(true)
    };

    // Handle false
    (false) => {
        $crate::Value::Bool(false)
    };

    // Handle empty array
    ([]) => {
        $crate::Value::Array(vec![])
    };

    // Handle non-empty array
    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::Array(vec![$($crate::rdn!($elem)),*])
    };

    // Handle tuple
    (( $($elem:tt),* $(,)? )) => {
        $crate::Value::Tuple(vec![$($crate::rdn!($elem)),*])
    };

    // Handle empty object
    ({}) => {
        $crate::Value::Object($crate::Object::new())
    };

    // Handle non-empty object
    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut object = $crate::Object::new();
        $(
            object.insert($key.to_string(), $crate::rdn!($value));
        )*
        $crate::Value::Object(object)
    }};

    (Map { $($key:tt => $value:tt),* $(,)? }) => {
        $crate::Value::Map(vec![$(($crate::rdn!($key), $crate::rdn!($value))),*])
    };

    (Set { $($elem:tt),* $(,)? }) => {
        $crate::Value::Set(vec![$($crate::rdn!($elem)),*])
    };

    // Any other expression
    ($s:expr) => {{
        $crate::to_value(&$s).unwrap_or($crate::Value::Null)
    }};
}
