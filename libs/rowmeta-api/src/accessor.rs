use chrono::{DateTime, Utc};

use crate::crypto::Crypto;
use crate::value::Value;

/// Soft coercion from a stored [`Value`] into a requested Rust type.
///
/// Returns `None` when the stored variant cannot represent the type; the
/// accessor then falls back to the caller's default. Never called with
/// [`Value::Null`].
///
/// - Integers: `Int`/`Int64` with checked narrowing, or text that parses.
/// - Floats: any numeric variant, or text that parses.
/// - `bool`, `String`: the canonical rendering, parsed.
/// - `Vec<u8>`: blobs only. Dates: dates or RFC 3339 text.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(*v),
            Value::Int64(v) => i32::try_from(*v).ok(),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(i64::from(*v)),
            Value::Int64(v) => Some(*v),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(f64::from(*v)),
            Value::Int64(v) => Some(*v as f64),
            Value::Float(v) => Some(f64::from(*v)),
            Value::Float64(v) => Some(*v),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(*v),
            Value::Text(s) => s.trim().parse().ok(),
            other => f64::from_value(other).map(|v| v as f32),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        value.render().parse().ok()
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.render())
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Blob(bytes) => Some(bytes.clone()),
            _ => None,
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Date(d) => Some(*d),
            Value::Text(s) => DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|d| d.with_timezone(&Utc)),
            _ => None,
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

/// Nullable columns: a stored value that coerces becomes `Some`.
impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Option<Self> {
        T::from_value(value).map(Some)
    }
}

/// Default-hinted, case-insensitive key/value access shared by
/// [`Record`](crate::record::Record) and [`MetaNode`](crate::meta::MetaNode).
///
/// Reads never fail: a missing key, a null, or a value that does not coerce
/// into the hinted type all yield the caller's default. Writes to keys the
/// container refuses are silent no-ops.
pub trait Accessor {
    /// Case-insensitive existence test.
    fn has_key(&self, name: &str) -> bool;

    /// Stored scalar under `name`, or `None` if absent or not a scalar.
    fn value(&self, name: &str) -> Option<&Value>;

    /// Store `value` under the resolved key. Returns whether it was stored.
    fn put(&mut self, name: &str, value: Value) -> bool;

    /// Clear `name`. What "clear" means is up to the container.
    fn unset(&mut self, name: &str) -> bool;

    fn get<T: FromValue>(&self, name: &str, default: T) -> T {
        self.get_opt(name).unwrap_or(default)
    }

    /// `None` when the key is absent, null, or does not coerce.
    fn get_opt<T: FromValue>(&self, name: &str) -> Option<T> {
        match self.value(name) {
            Some(v) if !v.is_null() => T::from_value(v),
            _ => None,
        }
    }

    /// Like [`get`](Accessor::get), but text values pass through
    /// `crypto.decrypt` before coercion.
    fn get_with<T: FromValue, C: Crypto + ?Sized>(&self, name: &str, default: T, crypto: &C) -> T {
        match self.value(name) {
            Some(Value::Text(cipher)) => {
                T::from_value(&Value::Text(crypto.decrypt(cipher))).unwrap_or(default)
            }
            Some(v) if !v.is_null() => T::from_value(v).unwrap_or(default),
            _ => default,
        }
    }

    /// Store a value. A null (`None`, [`Value::Null`]) is an [`unset`](Accessor::unset).
    fn set<V: Into<Value>>(&mut self, name: &str, value: V) -> bool {
        match value.into() {
            Value::Null => self.unset(name),
            v => self.put(name, v),
        }
    }

    /// Like [`set`](Accessor::set), but text values pass through
    /// `crypto.encrypt` before storage.
    fn set_with<V: Into<Value>, C: Crypto + ?Sized>(&mut self, name: &str, value: V, crypto: &C) -> bool {
        match value.into() {
            Value::Text(plain) => self.put(name, Value::Text(crypto.encrypt(&plain))),
            other => self.set(name, other),
        }
    }
}
