//! Tri-state attribute values
//!
//! The host distinguishes a value the user omitted (`Null`), a value that is
//! resolved later during apply (`Unknown`) and a concrete value (`Known`).
//! There is no implicit coercion between the three; conversions to the cloud
//! API's optional shape go through [`Value::to_option`] and
//! [`Value::from_option`].

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Error as _, Serialize, Serializer};

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Value<T> {
    #[default]
    Null,
    Unknown,
    Known(T),
}

impl<T> Value<T> {
    pub fn known(value: impl Into<T>) -> Self {
        Value::Known(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown)
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Value::Known(_))
    }

    /// Null and Unknown both mean "do not send to the API"
    pub fn is_null_or_unknown(&self) -> bool {
        !self.is_known()
    }

    pub fn as_known(&self) -> Option<&T> {
        match self {
            Value::Known(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_ref(&self) -> Value<&T> {
        match self {
            Value::Null => Value::Null,
            Value::Unknown => Value::Unknown,
            Value::Known(v) => Value::Known(v),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Value<U> {
        match self {
            Value::Null => Value::Null,
            Value::Unknown => Value::Unknown,
            Value::Known(v) => Value::Known(f(v)),
        }
    }

    /// Expand direction: Known becomes `Some`, Null and Unknown become `None`
    pub fn to_option(self) -> Option<T> {
        match self {
            Value::Known(v) => Some(v),
            _ => None,
        }
    }

    /// Flatten direction: `None` becomes Null
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(v) => Value::Known(v),
            None => Value::Null,
        }
    }

    /// Use `other` when this value is Unknown
    pub fn or_known(self, other: &Value<T>) -> Self
    where
        T: Clone,
    {
        match (self, other) {
            (Value::Unknown, Value::Known(v)) => Value::Known(v.clone()),
            (this, _) => this,
        }
    }

    /// Drift check: only Known values on both sides are compared
    pub fn differs_from(&self, other: &Value<T>) -> bool
    where
        T: PartialEq,
    {
        match (self, other) {
            (Value::Known(a), Value::Known(b)) => a != b,
            _ => false,
        }
    }
}

impl Value<String> {
    pub fn as_str(&self) -> Option<&str> {
        self.as_known().map(String::as_str)
    }
}

impl<T> From<Option<T>> for Value<T> {
    fn from(value: Option<T>) -> Self {
        Value::from_option(value)
    }
}

impl<T: Serialize> Serialize for Value<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Known(v) => serializer.serialize_some(v),
            Value::Unknown => Err(S::Error::custom("unknown value cannot be persisted")),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Value<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Value::from_option)
    }
}
