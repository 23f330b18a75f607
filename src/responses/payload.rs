//! Payloads handed to response formatters.

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value};

/// The shape of a [`RawValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawKind {
    /// Absent value
    #[serde(alias = "none")]
    Null,
    /// Boolean
    Bool,
    /// Integer
    Int,
    /// Floating point number
    Float,
    /// Text
    #[serde(alias = "string")]
    Str,
    /// Byte string
    Bytes,
    /// Ordered sequence
    #[serde(alias = "tuple")]
    List,
    /// Key-value mapping
    #[serde(rename = "dict", alias = "map")]
    Map,
}

impl fmt::Display for RawKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RawKind::Null => "null",
            RawKind::Bool => "bool",
            RawKind::Int => "int",
            RawKind::Float => "float",
            RawKind::Str => "str",
            RawKind::Bytes => "bytes",
            RawKind::List => "list",
            RawKind::Map => "dict",
        };
        f.write_str(name)
    }
}

/// The set of payload kinds a formatter converts before building a response.
///
/// Defaults to `int`, `str`, `bytes`, `list` and `dict`. `int` also covers
/// `bool`.
///
/// ```
/// use heaven::{RawKind, RawTypes};
///
/// let raw_types: RawTypes = [RawKind::Str, RawKind::Map].into_iter().collect();
/// assert!(raw_types.contains(RawKind::Str));
/// assert!(!raw_types.contains(RawKind::Int));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct RawTypes(BTreeSet<RawKind>);

impl RawTypes {
    /// Returns `true` if `kind` is converted.
    ///
    /// Booleans count as integers: a set holding `int` converts `bool` too.
    pub fn contains(&self, kind: RawKind) -> bool {
        self.0.contains(&kind) || (kind == RawKind::Bool && self.0.contains(&RawKind::Int))
    }

    /// Iterates over the configured kinds in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = RawKind> + '_ {
        self.0.iter().copied()
    }
}

impl Default for RawTypes {
    fn default() -> Self {
        [
            RawKind::Int,
            RawKind::Str,
            RawKind::Bytes,
            RawKind::List,
            RawKind::Map,
        ]
        .into_iter()
        .collect()
    }
}

impl FromIterator<RawKind> for RawTypes {
    fn from_iter<I: IntoIterator<Item = RawKind>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Plain data a handler wants to return.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Absent value
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// Text
    Str(String),
    /// Byte string
    Bytes(Vec<u8>),
    /// Ordered sequence
    List(Vec<Value>),
    /// Key-value mapping
    Map(Map<String, Value>),
}

impl RawValue {
    /// Builds a byte-string value.
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        RawValue::Bytes(bytes.into())
    }

    /// Returns the discriminant used for raw-type matching.
    pub fn kind(&self) -> RawKind {
        match self {
            RawValue::Null => RawKind::Null,
            RawValue::Bool(_) => RawKind::Bool,
            RawValue::Int(_) => RawKind::Int,
            RawValue::Float(_) => RawKind::Float,
            RawValue::Str(_) => RawKind::Str,
            RawValue::Bytes(_) => RawKind::Bytes,
            RawValue::List(_) => RawKind::List,
            RawValue::Map(_) => RawKind::Map,
        }
    }

    /// Converts the value to JSON. Bytes decode as lossy UTF-8 text, and
    /// non-finite floats become `null`.
    pub fn into_json(self) -> Value {
        match self {
            RawValue::Null => Value::Null,
            RawValue::Bool(b) => Value::Bool(b),
            RawValue::Int(i) => Value::from(i),
            RawValue::Float(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            RawValue::Str(s) => Value::String(s),
            RawValue::Bytes(b) => Value::String(String::from_utf8_lossy(&b).into_owned()),
            RawValue::List(items) => Value::Array(items),
            RawValue::Map(map) => Value::Object(map),
        }
    }
}

impl From<Value> for RawValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => RawValue::Null,
            Value::Bool(b) => RawValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => RawValue::Int(i),
                None => RawValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => RawValue::Str(s),
            Value::Array(items) => RawValue::List(items),
            Value::Object(map) => RawValue::Map(map),
        }
    }
}

macro_rules! raw_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for RawValue {
                fn from(value: $ty) -> Self {
                    RawValue::$variant(value.into())
                }
            }
        )*
    };
}

raw_value_from! {
    bool => Bool,
    i32 => Int,
    i64 => Int,
    u32 => Int,
    f64 => Float,
    String => Str,
    &str => Str,
    Vec<Value> => List,
    Map<String, Value> => Map,
}

/// What a formatter receives: plain data, or a response that is already built.
///
/// The variant is chosen by the caller, so the formatter never has to inspect
/// the payload to find out which branch to take.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload<R> {
    /// Data that still has to be turned into a response
    Raw(RawValue),
    /// A response built elsewhere, returned after validation
    Finished(R),
}

impl<R> Payload<R> {
    /// Wraps a finished response.
    pub fn finished(response: R) -> Self {
        Payload::Finished(response)
    }

    /// Wraps plain data.
    pub fn raw(value: impl Into<RawValue>) -> Self {
        Payload::Raw(value.into())
    }

    /// Returns `true` for plain data.
    pub fn is_raw(&self) -> bool {
        matches!(self, Payload::Raw(_))
    }
}

impl<R> From<RawValue> for Payload<R> {
    fn from(value: RawValue) -> Self {
        Payload::Raw(value)
    }
}

macro_rules! payload_from_raw {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<R> From<$ty> for Payload<R> {
                fn from(value: $ty) -> Self {
                    Payload::Raw(RawValue::from(value))
                }
            }
        )*
    };
}

payload_from_raw!(
    bool,
    i32,
    i64,
    u32,
    f64,
    String,
    &str,
    Value,
    Vec<Value>,
    Map<String, Value>,
);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kinds_follow_variants() {
        assert_eq!(RawValue::from(7).kind(), RawKind::Int);
        assert_eq!(RawValue::from("ok").kind(), RawKind::Str);
        assert_eq!(RawValue::bytes(b"abc".to_vec()).kind(), RawKind::Bytes);
        assert_eq!(RawValue::from(json!([1, 2])).kind(), RawKind::List);
        assert_eq!(RawValue::from(json!({"a": 1})).kind(), RawKind::Map);
        assert_eq!(RawValue::from(json!(1.5)).kind(), RawKind::Float);
        assert_eq!(RawValue::from(Value::Null).kind(), RawKind::Null);
    }

    #[test]
    fn bytes_become_text() {
        assert_eq!(RawValue::bytes("héllo").into_json(), json!("héllo"));
    }

    #[test]
    fn non_finite_float_is_null() {
        assert_eq!(RawValue::Float(f64::INFINITY).into_json(), Value::Null);
    }

    #[test]
    fn default_raw_types() {
        let kinds: Vec<RawKind> = RawTypes::default().iter().collect();
        assert_eq!(
            kinds,
            vec![
                RawKind::Int,
                RawKind::Str,
                RawKind::Bytes,
                RawKind::List,
                RawKind::Map
            ]
        );
    }

    #[test]
    fn int_covers_bool() {
        assert!(RawTypes::default().contains(RawKind::Bool));
        let raw_types: RawTypes = serde_json::from_value(json!(["int"])).unwrap();
        assert!(raw_types.contains(RawKind::Bool));

        let text_only: RawTypes = [RawKind::Str].into_iter().collect();
        assert!(!text_only.contains(RawKind::Bool));
        let bool_only: RawTypes = [RawKind::Bool].into_iter().collect();
        assert!(bool_only.contains(RawKind::Bool));
        assert!(!bool_only.contains(RawKind::Int));
    }

    #[test]
    fn raw_types_deserialize_from_kind_names() {
        let raw_types: RawTypes = serde_json::from_value(json!(["str", "dict", "none"])).unwrap();
        assert!(raw_types.contains(RawKind::Str));
        assert!(raw_types.contains(RawKind::Map));
        assert!(raw_types.contains(RawKind::Null));
        assert!(!raw_types.contains(RawKind::List));
    }

    #[test]
    fn payload_from_plain_data_is_raw() {
        let payload: Payload<()> = "OK".into();
        assert!(payload.is_raw());
        let payload: Payload<()> = Payload::finished(());
        assert!(!payload.is_raw());
    }
}
