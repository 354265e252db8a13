//! Structured key-value fields attached to records.

use std::borrow::Cow;
use std::fmt;

use serde_json::Value;

/// A single structured field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    key: Cow<'static, str>,
    value: Value,
}

impl Field {
    /// Create a field from any JSON-convertible value.
    pub fn new(key: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a field holding the `Display` rendering of a value.
    pub fn display(key: impl Into<Cow<'static, str>>, value: impl fmt::Display) -> Self {
        Self::new(key, value.to_string())
    }

    /// Create an `error` field from an error value.
    pub fn error(err: &dyn std::error::Error) -> Self {
        Self::new("error", err.to_string())
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// Shorthand for [`Field::new`].
pub fn field(key: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Field {
    Field::new(key, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_values() {
        assert_eq!(field("count", 3).value(), &Value::from(3));
        assert_eq!(field("ok", true).value(), &Value::Bool(true));
        assert_eq!(Field::display("addr", "127.0.0.1:80").value(), "127.0.0.1:80");
    }

    #[test]
    fn test_error_field() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let f = Field::error(&err);
        assert_eq!(f.key(), "error");
        assert_eq!(f.value(), "disk full");
    }
}
