/// Builds a [`Value`](crate::Value) from a JSON-like literal.
///
/// `undefined` and `null` are keywords; any other leaf is converted through
/// [`to_value`](crate::to_value). Negative numbers and other multi-token
/// leaves must be wrapped in parentheses inside arrays and objects.
///
/// ```rust
/// use serde_jsurl::{jsurl, Value};
///
/// let value = jsurl!({ "a": [1, (-2), undefined], "b": null });
/// assert_eq!(value.to_string(), "(a~!1~-2~_U~~b~_N)~");
/// assert_eq!(jsurl!(undefined), Value::Undefined);
/// ```
#[macro_export]
macro_rules! jsurl {
    (undefined) => {
        $crate::Value::Undefined
    };

    (null) => {
        $crate::Value::Null
    };

    (true) => {
        $crate::Value::Bool(true)
    };

    (false) => {
        $crate::Value::Bool(false)
    };

    ([]) => {
        $crate::Value::Array(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::Array(vec![$($crate::jsurl!($elem)),*])
    };

    ({}) => {
        $crate::Value::Object($crate::Map::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut object = $crate::Map::new();
        $(
            object.insert($key.to_string(), $crate::jsurl!($value));
        )*
        $crate::Value::Object(object)
    }};

    ($s:expr) => {
        $crate::to_value(&$s).unwrap_or($crate::Value::Undefined)
    };
}
