//! Value coercion to comparable scalars.
//!
//! Stored values and operand values are both coerced through the resolved
//! attribute type so they meet on the same representation. Strings compare
//! on their lowercased form. Values of different representations are
//! unequal and unordered, which makes every comparison on them false.

use crate::temporal::parse_datetime;
use chrono::{DateTime, Utc};
use core::cmp::Ordering;
use fetchkit_core::{AttributeType, Decimal, Error, Result, Uuid, Value};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Result of integer coercion when the value has no integer reading.
pub const INT_SENTINEL: i64 = i64::MIN;

/// A value ready for comparison.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Comparable {
    /// Lowercased text.
    Str(String),
    Int(i64),
    Decimal(Decimal),
    Bool(bool),
    DateTime(DateTime<Utc>),
    Guid(Uuid),
    IntSet(BTreeSet<i32>),
}

impl Comparable {
    /// Orders two comparables of compatible representations.
    pub fn compare(&self, other: &Comparable) -> Option<Ordering> {
        use Comparable::*;
        match (self, other) {
            (Str(a), Str(b)) => Some(a.cmp(b)),
            (Int(a), Int(b)) => Some(a.cmp(b)),
            (Decimal(a), Decimal(b)) => Some(a.cmp(b)),
            (Int(a), Decimal(b)) => Some(fetchkit_core::Decimal::from(*a).cmp(b)),
            (Decimal(a), Int(b)) => Some(a.cmp(&fetchkit_core::Decimal::from(*b))),
            (Bool(a), Bool(b)) => Some(a.cmp(b)),
            (DateTime(a), DateTime(b)) => Some(a.cmp(b)),
            (Guid(a), Guid(b)) => Some(a.cmp(b)),
            (IntSet(a), IntSet(b)) if a == b => Some(Ordering::Equal),
            _ => None,
        }
    }

    /// Equality across compatible representations.
    pub fn equals(&self, other: &Comparable) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }
}

/// Coerces a value for comparison against an attribute of `attribute_type`.
///
/// `operand_sample` decides how references are read: a textual operand that
/// is not an id compares against the reference name, anything else against
/// the reference id. Returns `None` for null.
pub fn coerce(
    raw: &Value,
    attribute_type: AttributeType,
    operand_sample: Option<&Value>,
) -> Option<Comparable> {
    match raw.unwrap_aliased() {
        Value::Null => None,
        Value::String(s) => Some(coerce_text(s, attribute_type)),
        Value::Int(i) => Some(int_like(raw, *i, attribute_type)),
        Value::OptionSet(i) => Some(int_like(raw, i64::from(*i), attribute_type)),
        Value::Decimal(d) | Value::Money(d) => Some(match attribute_type {
            AttributeType::Int | AttributeType::OptionSet => Comparable::Int(safe_to_int(raw)),
            _ => Comparable::Decimal(*d),
        }),
        Value::Bool(b) => Some(match attribute_type {
            AttributeType::Int | AttributeType::OptionSet => Comparable::Int(safe_to_int(raw)),
            _ => Comparable::Bool(*b),
        }),
        Value::DateTime(dt) => Some(Comparable::DateTime(*dt)),
        Value::Guid(g) => Some(Comparable::Guid(*g)),
        Value::Reference(r) => {
            let by_name = matches!(
                operand_sample.map(Value::unwrap_aliased),
                Some(Value::String(s)) if Uuid::parse_str(s.trim()).is_err()
            );
            if by_name {
                Some(Comparable::Str(
                    r.name.as_deref().unwrap_or_default().to_lowercase(),
                ))
            } else {
                Some(Comparable::Guid(r.id))
            }
        }
        Value::OptionSetCollection(set) => Some(Comparable::IntSet(set.clone())),
        Value::Aliased(_) | Value::Array(_) => None,
    }
}

fn int_like(raw: &Value, value: i64, attribute_type: AttributeType) -> Comparable {
    match attribute_type {
        AttributeType::Decimal | AttributeType::Money => Comparable::Decimal(Decimal::from(value)),
        AttributeType::Int | AttributeType::OptionSet => Comparable::Int(value),
        _ => Comparable::Int(safe_to_int(raw)),
    }
}

/// Reads text through the attribute type, falling back to lowercased text.
fn coerce_text(text: &str, attribute_type: AttributeType) -> Comparable {
    let trimmed = text.trim();
    let parsed = match attribute_type {
        AttributeType::DateTime => parse_datetime(trimmed).map(Comparable::DateTime),
        AttributeType::Int | AttributeType::OptionSet => {
            trimmed.parse::<i64>().ok().map(Comparable::Int)
        }
        AttributeType::Decimal | AttributeType::Money => Decimal::from_str(trimmed)
            .ok()
            .map(Comparable::Decimal),
        AttributeType::Guid | AttributeType::Reference => {
            Uuid::parse_str(trimmed).ok().map(Comparable::Guid)
        }
        AttributeType::Bool => parse_bool(trimmed).map(Comparable::Bool),
        AttributeType::String | AttributeType::MultiSelectOptionSet => None,
    };
    parsed.unwrap_or_else(|| Comparable::Str(text.to_lowercase()))
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

/// Reads an integer out of a value; returns [`INT_SENTINEL`] when there is
/// no integer reading.
pub fn safe_to_int(value: &Value) -> i64 {
    match value.unwrap_aliased() {
        Value::Int(i) => *i,
        Value::OptionSet(i) => i64::from(*i),
        Value::Bool(b) => i64::from(*b),
        Value::String(s) => s.trim().parse().unwrap_or(INT_SENTINEL),
        Value::Decimal(d) | Value::Money(d) if d.fract().is_zero() => {
            i64::try_from(*d).unwrap_or(INT_SENTINEL)
        }
        _ => INT_SENTINEL,
    }
}

/// Converts a multi-select operand to a set of option codes.
///
/// Accepts an integer, an integer string, an array of those, or an array
/// holding exactly one such array.
pub fn to_int_set(value: &Value) -> Result<BTreeSet<i32>> {
    match value.unwrap_aliased() {
        Value::Array(items) => {
            if let [inner @ Value::Array(_)] = items.as_slice() {
                return to_int_set(inner);
            }
            let mut set = BTreeSet::new();
            for item in items {
                set.insert(scalar_option(item)?);
            }
            Ok(set)
        }
        Value::OptionSetCollection(set) => Ok(set.clone()),
        other => Ok(BTreeSet::from([scalar_option(other)?])),
    }
}

/// Converts the operand list of a multi-select condition to a set.
pub fn operand_int_set(values: &[Value]) -> Result<BTreeSet<i32>> {
    match values {
        [single] => to_int_set(single),
        many => to_int_set(&Value::Array(many.to_vec())),
    }
}

fn scalar_option(value: &Value) -> Result<i32> {
    let parsed = match value.unwrap_aliased() {
        Value::Int(i) => i32::try_from(*i).ok(),
        Value::OptionSet(i) => Some(*i),
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        Error::deserialization(format!(
            "Expected an integer or an array of integers for option set values, found {}",
            value.kind()
        ))
    })
}

/// Normalized key used to match link attributes. References and id
/// strings become ids, text is lowercased, integers and option values
/// become integers.
pub fn join_key(value: &Value) -> Option<Comparable> {
    match value.unwrap_aliased() {
        Value::Null | Value::Aliased(_) | Value::Array(_) => None,
        Value::Guid(g) => Some(Comparable::Guid(*g)),
        Value::Reference(r) => Some(Comparable::Guid(r.id)),
        Value::String(s) => Some(match Uuid::parse_str(s.trim()) {
            Ok(id) => Comparable::Guid(id),
            Err(_) => Comparable::Str(s.to_lowercase()),
        }),
        Value::Int(i) => Some(Comparable::Int(*i)),
        Value::OptionSet(i) => Some(Comparable::Int(i64::from(*i))),
        Value::Decimal(d) | Value::Money(d) => Some(Comparable::Decimal(d.normalize())),
        Value::Bool(b) => Some(Comparable::Bool(*b)),
        Value::DateTime(dt) => Some(Comparable::DateTime(*dt)),
        Value::OptionSetCollection(set) => Some(Comparable::IntSet(set.clone())),
    }
}

/// Expands nested arrays into a flat operand list.
pub fn flatten_operands(values: &[Value]) -> Vec<Value> {
    let mut flat = Vec::with_capacity(values.len());
    for value in values {
        match value {
            Value::Array(items) => flat.extend(flatten_operands(items)),
            other => flat.push(other.clone()),
        }
    }
    flat
}

/// Text form of a value for pattern matching. Null reads as empty text.
pub fn display_text(value: &Value) -> String {
    match value.unwrap_aliased() {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Int(i) => i.to_string(),
        Value::OptionSet(i) => i.to_string(),
        Value::Decimal(d) | Value::Money(d) => d.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::DateTime(dt) => dt.to_rfc3339(),
        Value::Guid(g) => g.to_string(),
        Value::Reference(r) => r.name.clone().unwrap_or_default(),
        Value::OptionSetCollection(set) => set
            .iter()
            .map(i32::to_string)
            .collect::<Vec<_>>()
            .join(","),
        Value::Aliased(_) => String::new(),
        Value::Array(items) => items.iter().map(display_text).collect::<Vec<_>>().join(","),
    }
}
