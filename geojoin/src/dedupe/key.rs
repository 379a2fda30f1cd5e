//! Identity keys used to recognise the same feature across probe results.

use std::fmt;

use crate::feature::{AttributeValue, Feature};
use crate::source::SourceName;

/// How the identity of a feature is derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityKey {
    /// A single attribute, e.g. `OBJECTID`.
    Field(String),
    /// An attribute qualified by the dataset it came from.
    ///
    /// Use when the joined datasets do not share an identity space.
    Namespaced { namespace: SourceName, field: String },
}

impl IdentityKey {
    pub fn field(field: impl Into<String>) -> Self {
        IdentityKey::Field(field.into())
    }

    pub fn namespaced(namespace: impl Into<SourceName>, field: impl Into<String>) -> Self {
        IdentityKey::Namespaced {
            namespace: namespace.into(),
            field: field.into(),
        }
    }

    /// The attribute the key is read from.
    pub fn field_name(&self) -> &str {
        match self {
            IdentityKey::Field(field) => field,
            IdentityKey::Namespaced { field, .. } => field,
        }
    }

    /// Key for `feature`, or `None` when the attribute is absent or null.
    pub fn extract(&self, feature: &Feature) -> Option<FeatureKey> {
        let value = KeyValue::from_attribute(feature.attribute(self.field_name())?)?;
        let namespace = match self {
            IdentityKey::Field(_) => None,
            IdentityKey::Namespaced { namespace, .. } => Some(namespace.clone()),
        };
        Some(FeatureKey { namespace, value })
    }
}

impl Default for IdentityKey {
    fn default() -> Self {
        IdentityKey::field("OBJECTID")
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityKey::Field(field) => write!(f, "{}", field),
            IdentityKey::Namespaced { namespace, field } => write!(f, "{}:{}", namespace, field),
        }
    }
}

/// A hashable identity value.
///
/// Integral floats compare equal to integers (`10.0` and `10` are the same
/// key); other floats compare by bit pattern with `-0.0` folded into `0.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyValue {
    Bool(bool),
    Integer(i64),
    FloatBits(u64),
    Text(String),
}

impl KeyValue {
    /// Convert an attribute; `Null` has no key.
    pub fn from_attribute(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Null => None,
            AttributeValue::Bool(b) => Some(KeyValue::Bool(*b)),
            AttributeValue::Integer(i) => Some(KeyValue::Integer(*i)),
            AttributeValue::Float(f) => Some(Self::from_float(*f)),
            AttributeValue::Text(s) => Some(KeyValue::Text(s.clone())),
        }
    }

    fn from_float(f: f64) -> Self {
        // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
        if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
            return KeyValue::Integer(f as i64);
        }
        let f = if f == 0.0 { 0.0 } else { f };
        KeyValue::FloatBits(f.to_bits())
    }
}

/// Identity of one feature: optional namespace plus value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeatureKey {
    pub namespace: Option<SourceName>,
    pub value: KeyValue,
}
