//! Attribute type definitions.
//!
//! Three vocabularies meet here: the logical `AttributeType` the predicate
//! compiler works with, the metadata `AttributeTypeCode` categories injected
//! by a metadata provider, and the `DeclaredType` of a field on a registered
//! entity schema.

use serde::{Deserialize, Serialize};

/// Logical attribute type used for coercion and operator selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeType {
    /// Text (single line or memo)
    String,
    /// Whole number
    Int,
    /// Decimal or floating point number
    Decimal,
    /// Two-option
    Bool,
    /// Date and time (UTC)
    DateTime,
    /// Unique identifier
    Guid,
    /// Lookup to another record
    Reference,
    /// Currency amount
    Money,
    /// Single-select option set
    OptionSet,
    /// Multi-select option set
    MultiSelectOptionSet,
}

impl AttributeType {
    /// Returns true if values of this type are ordered by time.
    #[inline]
    pub fn is_temporal(&self) -> bool {
        matches!(self, AttributeType::DateTime)
    }

    /// Returns true if values of this type are numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            AttributeType::Int | AttributeType::Decimal | AttributeType::Money | AttributeType::OptionSet
        )
    }
}

/// Metadata category of an attribute, as reported by a metadata provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeTypeCode {
    Boolean,
    Customer,
    DateTime,
    Decimal,
    Double,
    Integer,
    BigInt,
    Lookup,
    Memo,
    Money,
    Owner,
    PartyList,
    Picklist,
    State,
    Status,
    String,
    Uniqueidentifier,
    CalendarRules,
    Virtual,
    ManagedProperty,
    EntityName,
    MultiSelectPicklist,
}

impl AttributeTypeCode {
    /// Maps a metadata category to a logical type.
    ///
    /// Returns `None` for categories the engine cannot evaluate.
    pub fn logical_type(&self) -> Option<AttributeType> {
        match self {
            AttributeTypeCode::Boolean => Some(AttributeType::Bool),
            AttributeTypeCode::Customer | AttributeTypeCode::Lookup | AttributeTypeCode::Owner => {
                Some(AttributeType::Reference)
            }
            AttributeTypeCode::DateTime => Some(AttributeType::DateTime),
            AttributeTypeCode::Decimal | AttributeTypeCode::Double => Some(AttributeType::Decimal),
            AttributeTypeCode::Integer | AttributeTypeCode::BigInt => Some(AttributeType::Int),
            AttributeTypeCode::Memo | AttributeTypeCode::String | AttributeTypeCode::EntityName => {
                Some(AttributeType::String)
            }
            AttributeTypeCode::Money => Some(AttributeType::Money),
            AttributeTypeCode::Picklist | AttributeTypeCode::State | AttributeTypeCode::Status => {
                Some(AttributeType::OptionSet)
            }
            AttributeTypeCode::Uniqueidentifier => Some(AttributeType::Guid),
            AttributeTypeCode::MultiSelectPicklist => Some(AttributeType::MultiSelectOptionSet),
            AttributeTypeCode::PartyList
            | AttributeTypeCode::CalendarRules
            | AttributeTypeCode::Virtual
            | AttributeTypeCode::ManagedProperty => None,
        }
    }
}

/// Declared field type on a registered entity schema.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DeclaredType {
    Text,
    Int32,
    Int64,
    Decimal,
    Float64,
    Bool,
    DateTime,
    Guid,
    EntityReference,
    Money,
    OptionSetValue,
    OptionSetValueCollection,
    /// A named enumeration; compared by its integer code.
    Enum(String),
}

impl DeclaredType {
    /// Maps a declared field type to a logical type.
    pub fn logical_type(&self) -> AttributeType {
        match self {
            DeclaredType::Text => AttributeType::String,
            DeclaredType::Int32 | DeclaredType::Int64 | DeclaredType::Enum(_) => AttributeType::Int,
            DeclaredType::Decimal | DeclaredType::Float64 => AttributeType::Decimal,
            DeclaredType::Bool => AttributeType::Bool,
            DeclaredType::DateTime => AttributeType::DateTime,
            DeclaredType::Guid => AttributeType::Guid,
            DeclaredType::EntityReference => AttributeType::Reference,
            DeclaredType::Money => AttributeType::Money,
            DeclaredType::OptionSetValue => AttributeType::OptionSet,
            DeclaredType::OptionSetValueCollection => AttributeType::MultiSelectOptionSet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_code_mapping() {
        assert_eq!(AttributeTypeCode::Lookup.logical_type(), Some(AttributeType::Reference));
        assert_eq!(AttributeTypeCode::Owner.logical_type(), Some(AttributeType::Reference));
        assert_eq!(AttributeTypeCode::State.logical_type(), Some(AttributeType::OptionSet));
        assert_eq!(
            AttributeTypeCode::MultiSelectPicklist.logical_type(),
            Some(AttributeType::MultiSelectOptionSet)
        );
        assert_eq!(AttributeTypeCode::PartyList.logical_type(), None);
        assert_eq!(AttributeTypeCode::CalendarRules.logical_type(), None);
    }

    #[test]
    fn test_enum_declared_type_is_int() {
        assert_eq!(DeclaredType::Enum("account_statecode".into()).logical_type(), AttributeType::Int);
        assert_eq!(DeclaredType::Float64.logical_type(), AttributeType::Decimal);
    }

    #[test]
    fn test_numeric() {
        assert!(AttributeType::Money.is_numeric());
        assert!(!AttributeType::String.is_numeric());
        assert!(AttributeType::DateTime.is_temporal());
    }
}
