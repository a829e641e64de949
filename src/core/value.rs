use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A raw column value as surfaced by the query engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    Timestamp(NaiveDateTime),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Integer(_) => "INTEGER",
            Self::Float(_) => "FLOAT",
            Self::Text(_) => "TEXT",
            Self::Boolean(_) => "BOOLEAN",
            Self::Timestamp(_) => "TIMESTAMP",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Converts a JSON value into a raw column value. Engines that surface
    /// rows as JSON documents feed the materializer through this.
    pub fn from_json(value: &serde_json::Value) -> Value {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Text(s.clone()),
            other => Value::Text(other.to_string()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => {
                if a.is_nan() && b.is_nan() {
                    return true;
                }
                (a - b).abs() < f64::EPSILON
            }
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Timestamp(a), Self::Timestamp(b)) => a == b,
            (Self::Integer(i), Self::Float(f)) | (Self::Float(f), Self::Integer(i)) => {
                (*i as f64 - f).abs() < f64::EPSILON
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(fl) => write!(f, "{}", fl),
            Self::Text(s) => write!(f, "{}", s),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Timestamp(ts) => write!(f, "{}", ts),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(ts: NaiveDateTime) -> Self {
        Self::Timestamp(ts)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

/// The semantic type of a mapped property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyType {
    Integer,
    Float,
    Text,
    Boolean,
    Timestamp,
    Nullable(Box<PropertyType>),
}

impl PropertyType {
    pub fn is_nullable(&self) -> bool {
        matches!(self, Self::Nullable(_))
    }

    /// Strips the nullable wrapper, if any.
    pub fn unwrapped(&self) -> &PropertyType {
        match self {
            Self::Nullable(inner) => inner.unwrapped(),
            other => other,
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => write!(f, "INTEGER"),
            Self::Float => write!(f, "FLOAT"),
            Self::Text => write!(f, "TEXT"),
            Self::Boolean => write!(f, "BOOLEAN"),
            Self::Timestamp => write!(f, "TIMESTAMP"),
            Self::Nullable(inner) => write!(f, "NULLABLE {}", inner),
        }
    }
}

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Coerces a raw fetched value to a property's declared type.
///
/// The conversion table is pure: the same input always produces the same
/// output or the same failure reason. Nullable targets unwrap to their inner
/// type; a `Null` raw value satisfies any nullable target.
pub fn coerce(value: &Value, target: &PropertyType) -> std::result::Result<Value, String> {
    if let PropertyType::Nullable(inner) = target {
        if value.is_null() {
            return Ok(Value::Null);
        }
        return coerce(value, inner);
    }

    match (target, value) {
        (_, Value::Null) => Err(format!("NULL is not a valid {}", target)),

        (PropertyType::Integer, Value::Integer(i)) => Ok(Value::Integer(*i)),
        (PropertyType::Integer, Value::Float(f)) => {
            if f.is_finite() && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                Ok(Value::Integer(f.round() as i64))
            } else {
                Err(format!("{} is out of integer range", f))
            }
        }
        (PropertyType::Integer, Value::Boolean(b)) => Ok(Value::Integer(i64::from(*b))),
        (PropertyType::Integer, Value::Text(s)) => s
            .trim()
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| format!("'{}' is not a valid integer", s)),

        (PropertyType::Float, Value::Float(f)) => Ok(Value::Float(*f)),
        (PropertyType::Float, Value::Integer(i)) => Ok(Value::Float(*i as f64)),
        (PropertyType::Float, Value::Boolean(b)) => {
            Ok(Value::Float(if *b { 1.0 } else { 0.0 }))
        }
        (PropertyType::Float, Value::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| format!("'{}' is not a valid float", s)),

        (PropertyType::Text, v) => Ok(Value::Text(v.to_string())),

        (PropertyType::Boolean, Value::Boolean(b)) => Ok(Value::Boolean(*b)),
        (PropertyType::Boolean, Value::Integer(i)) => Ok(Value::Boolean(*i != 0)),
        (PropertyType::Boolean, Value::Float(f)) => Ok(Value::Boolean(*f != 0.0)),
        (PropertyType::Boolean, Value::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(Value::Boolean(true)),
            "false" | "0" => Ok(Value::Boolean(false)),
            _ => Err(format!("'{}' is not a valid boolean", s)),
        },

        (PropertyType::Timestamp, Value::Timestamp(ts)) => Ok(Value::Timestamp(*ts)),
        (PropertyType::Timestamp, Value::Text(s)) => {
            let trimmed = s.trim();
            TIMESTAMP_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
                .map(Value::Timestamp)
                .ok_or_else(|| format!("'{}' is not a valid timestamp", s))
        }

        (target, value) => Err(format!(
            "cannot convert {} to {}",
            value.type_name(),
            target
        )),
    }
}

/// A Rust type that maps to a property's semantic type.
///
/// Implemented for the scalar types entities may declare and for
/// `Option<T>` of each. The `Default` bound gives unset proxy properties a
/// well-defined value through the generated typed accessors.
pub trait PropertyValue: Sized + Default {
    fn property_type() -> PropertyType;
    fn from_value(value: &Value) -> Option<Self>;
    fn into_value(self) -> Value;
}

impl PropertyValue for i64 {
    fn property_type() -> PropertyType {
        PropertyType::Integer
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64()
    }

    fn into_value(self) -> Value {
        Value::Integer(self)
    }
}

impl PropertyValue for f64 {
    fn property_type() -> PropertyType {
        PropertyType::Float
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64()
    }

    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl PropertyValue for String {
    fn property_type() -> PropertyType {
        PropertyType::Text
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }

    fn into_value(self) -> Value {
        Value::Text(self)
    }
}

impl PropertyValue for bool {
    fn property_type() -> PropertyType {
        PropertyType::Boolean
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }

    fn into_value(self) -> Value {
        Value::Boolean(self)
    }
}

impl PropertyValue for NaiveDateTime {
    fn property_type() -> PropertyType {
        PropertyType::Timestamp
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Timestamp(self)
    }
}

impl<T: PropertyValue> PropertyValue for Option<T> {
    fn property_type() -> PropertyType {
        PropertyType::Nullable(Box::new(T::property_type()))
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Null,
        }
    }
}
