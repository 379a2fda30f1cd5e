//! Attribute bag values.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Field name → value mapping carried by every feature.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// A scalar attribute value.
///
/// Serialises as the plain JSON scalar (`null`, `true`, `42`, `1.5`, `"text"`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl AttributeValue {
    /// Convert a JSON value into an attribute.
    ///
    /// Arrays and objects have no scalar form and are kept as their compact
    /// JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => AttributeValue::Null,
            Value::Bool(b) => AttributeValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => AttributeValue::Integer(i),
                None => n
                    .as_f64()
                    .map(AttributeValue::Float)
                    .unwrap_or_else(|| AttributeValue::Text(n.to_string())),
            },
            Value::String(s) => AttributeValue::Text(s.clone()),
            other => AttributeValue::Text(other.to_string()),
        }
    }

    /// Numeric view of integers and floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Integer(i) => Some(*i as f64),
            AttributeValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Text view of string values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }
}

/// Renders the value the way it appears in popups: `Null` is empty.
impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => Ok(()),
            AttributeValue::Bool(b) => write!(f, "{}", b),
            AttributeValue::Integer(i) => write!(f, "{}", i),
            AttributeValue::Float(v) => write!(f, "{}", v),
            AttributeValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Integer(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        AttributeValue::Integer(i64::from(value))
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Float(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_scalars() {
        assert_eq!(AttributeValue::from_json(&json!(null)), AttributeValue::Null);
        assert_eq!(AttributeValue::from_json(&json!(true)), AttributeValue::Bool(true));
        assert_eq!(AttributeValue::from_json(&json!(42)), AttributeValue::Integer(42));
        assert_eq!(AttributeValue::from_json(&json!(1.5)), AttributeValue::Float(1.5));
        assert_eq!(
            AttributeValue::from_json(&json!("AE")),
            AttributeValue::Text("AE".to_string())
        );
    }

    #[test]
    fn test_from_json_nested_becomes_text() {
        let value = AttributeValue::from_json(&json!({"a": [1, 2]}));
        assert_eq!(value, AttributeValue::Text(r#"{"a":[1,2]}"#.to_string()));
    }

    #[test]
    fn test_serialize_as_plain_scalars() {
        let mut attrs = Attributes::new();
        attrs.insert("id".to_string(), 7.into());
        attrs.insert("zone".to_string(), "VE".into());
        attrs.insert("note".to_string(), AttributeValue::Null);
        let text = serde_json::to_string(&attrs).unwrap();
        assert_eq!(text, r#"{"id":7,"note":null,"zone":"VE"}"#);
    }

    #[test]
    fn test_display_null_is_empty() {
        assert_eq!(AttributeValue::Null.to_string(), "");
        assert_eq!(AttributeValue::Integer(3).to_string(), "3");
        assert_eq!(AttributeValue::from("x").to_string(), "x");
    }
}
