//! Value type definitions for fetchkit.
//!
//! This module defines the `Value` enum which represents any value that can be
//! stored in a record attribute or supplied as a condition operand.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use uuid::Uuid;

/// A lookup to another record.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EntityReference {
    /// Logical name of the referenced entity.
    pub entity: String,
    /// Id of the referenced record.
    pub id: Uuid,
    /// Primary name of the referenced record, when known.
    pub name: Option<String>,
}

impl EntityReference {
    pub fn new(entity: impl Into<String>, id: Uuid) -> Self {
        Self {
            entity: entity.into(),
            id,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A value copied from a joined record, tagged with the alias it came from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AliasedValue {
    /// Alias of the link the value was joined through.
    pub alias: String,
    /// Attribute name on the linked entity.
    pub attribute: String,
    /// The wrapped value.
    pub value: Box<Value>,
}

impl AliasedValue {
    pub fn new(alias: impl Into<String>, attribute: impl Into<String>, value: Value) -> Self {
        Self {
            alias: alias.into(),
            attribute: attribute.into(),
            value: Box::new(value),
        }
    }
}

/// A value that can be stored in a record attribute.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    /// Null value
    Null,
    /// UTF-8 string
    String(String),
    /// Whole number
    Int(i64),
    /// Decimal number
    Decimal(Decimal),
    /// Two-option value
    Bool(bool),
    /// Instant in UTC
    DateTime(DateTime<Utc>),
    /// Unique identifier
    Guid(Uuid),
    /// Lookup to another record
    Reference(EntityReference),
    /// Currency amount
    Money(Decimal),
    /// Single-select option set code
    OptionSet(i32),
    /// Multi-select option set codes
    OptionSetCollection(BTreeSet<i32>),
    /// Value joined in from a linked entity
    Aliased(AliasedValue),
    /// List of values; appears in condition operands
    Array(Vec<Value>),
}

impl Value {
    /// Returns the name of this value's variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::String(_) => "String",
            Value::Int(_) => "Int",
            Value::Decimal(_) => "Decimal",
            Value::Bool(_) => "Bool",
            Value::DateTime(_) => "DateTime",
            Value::Guid(_) => "Guid",
            Value::Reference(_) => "EntityReference",
            Value::Money(_) => "Money",
            Value::OptionSet(_) => "OptionSetValue",
            Value::OptionSetCollection(_) => "OptionSetValueCollection",
            Value::Aliased(_) => "AliasedValue",
            Value::Array(_) => "Array",
        }
    }

    /// Returns true if this value is Null.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Strips any number of aliased wrappers.
    pub fn unwrap_aliased(&self) -> &Value {
        match self {
            Value::Aliased(aliased) => aliased.value.unwrap_aliased(),
            other => other,
        }
    }

    /// Returns a reference to the string if this is a String, None otherwise.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Returns the integer if this is an Int, None otherwise.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the boolean value if this is a Bool, None otherwise.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the instant if this is a DateTime, None otherwise.
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::DateTime(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the id carried by a Guid or Reference.
    pub fn as_guid(&self) -> Option<Uuid> {
        match self {
            Value::Guid(v) => Some(*v),
            Value::Reference(r) => Some(r.id),
            _ => None,
        }
    }

    /// Returns the reference if this is a Reference, None otherwise.
    pub fn as_reference(&self) -> Option<&EntityReference> {
        match self {
            Value::Reference(r) => Some(r),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::DateTime(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Guid(v)
    }
}

impl From<EntityReference> for Value {
    fn from(v: EntityReference) -> Self {
        Value::Reference(v)
    }
}

impl<T> From<Vec<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_null() {
        let v = Value::Null;
        assert!(v.is_null());
        assert_eq!(v.kind(), "Null");
    }

    #[test]
    fn test_value_accessors() {
        let id = Uuid::new_v4();
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Int(42).as_int(), Some(42));
        assert_eq!(Value::String("hello".into()).as_str(), Some("hello"));
        assert_eq!(Value::Guid(id).as_guid(), Some(id));
        assert_eq!(Value::Reference(EntityReference::new("contact", id)).as_guid(), Some(id));
        assert_eq!(Value::Int(1).as_str(), None);
    }

    #[test]
    fn test_unwrap_aliased_nested() {
        let inner = Value::String("Contoso".into());
        let once = Value::Aliased(AliasedValue::new("a", "name", inner.clone()));
        let twice = Value::Aliased(AliasedValue::new("b", "name", once));
        assert_eq!(twice.unwrap_aliased(), &inner);
    }

    #[test]
    fn test_value_from_impls() {
        let v: Value = 42i32.into();
        assert_eq!(v.as_int(), Some(42));

        let v: Value = "hello".into();
        assert_eq!(v.as_str(), Some("hello"));

        let v: Value = None::<i64>.into();
        assert!(v.is_null());

        let v: Value = vec![1i64, 2].into();
        assert_eq!(v, Value::Array(vec![Value::Int(1), Value::Int(2)]));
    }
}
