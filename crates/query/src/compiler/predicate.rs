//! Compiled predicates.

use crate::coercion::{coerce, display_text, Comparable};
use crate::resolver::{AttributeLookup, ResolvedAttribute};
use crate::temporal::local_date;
use chrono::{FixedOffset, NaiveDate};
use core::cmp::Ordering;
use fetchkit_core::pattern_match::LikePattern;
use fetchkit_core::{AttributeType, Record, Uuid, Value, ALIAS_SEPARATOR};
use hashbrown::HashSet;
use std::borrow::Cow;
use std::collections::BTreeSet;

/// A predicate that can be evaluated against records.
pub trait Predicate {
    /// Evaluates the predicate against a record.
    fn eval(&self, record: &Record) -> bool;
}

/// Comparison of two ordered values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvalType {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl EvalType {
    /// Applies the comparison to an ordering.
    pub fn test(&self, ordering: Ordering) -> bool {
        match self {
            EvalType::Eq => ordering == Ordering::Equal,
            EvalType::Ne => ordering != Ordering::Equal,
            EvalType::Lt => ordering == Ordering::Less,
            EvalType::Le => ordering != Ordering::Greater,
            EvalType::Gt => ordering == Ordering::Greater,
            EvalType::Ge => ordering != Ordering::Less,
        }
    }
}

/// Reads one attribute out of a (possibly joined) record.
#[derive(Clone, Debug, PartialEq)]
pub struct Accessor {
    key: String,
    attribute_type: AttributeType,
    reference_key: Option<String>,
}

fn qualified(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(alias) => format!("{alias}{ALIAS_SEPARATOR}{name}"),
        None => name.to_string(),
    }
}

impl Accessor {
    /// Creates an accessor for a resolved attribute, optionally qualified
    /// by a link alias.
    pub fn new(prefix: Option<&str>, resolved: &ResolvedAttribute) -> Self {
        let reference_key = match &resolved.lookup {
            AttributeLookup::Direct => None,
            AttributeLookup::ReferenceName { base } => Some(qualified(prefix, base)),
        };
        Self {
            key: qualified(prefix, &resolved.attribute),
            attribute_type: resolved.attribute_type,
            reference_key,
        }
    }

    /// Key of the attribute in the record.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn attribute_type(&self) -> AttributeType {
        self.attribute_type
    }

    /// Reads the value with alias wrappers removed; `None` when absent.
    pub fn read<'r>(&self, record: &'r Record) -> Option<Cow<'r, Value>> {
        if let Some(value) = record.get_unwrapped(&self.key) {
            return Some(Cow::Borrowed(value));
        }
        let base = self.reference_key.as_deref()?;
        match record.get_unwrapped(base)? {
            Value::Reference(r) => Some(Cow::Owned(
                r.name.clone().map(Value::String).unwrap_or(Value::Null),
            )),
            Value::Null => Some(Cow::Owned(Value::Null)),
            _ => None,
        }
    }
}

/// Calendar-day comparison for the `on` family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateTest {
    On,
    OnOrAfter,
    OnOrBefore,
}

/// Test applied to a present, non-null, coerced value.
#[derive(Clone, Debug, PartialEq)]
pub enum ValueTest {
    /// Equal to any of the operands.
    AnyOf(Vec<Comparable>),
    Compare(EvalType, Comparable),
    /// Inclusive range.
    Range(Comparable, Comparable),
    /// Local calendar date comparison.
    Date {
        test: DateTest,
        date: NaiveDate,
        offset: FixedOffset,
    },
    SetEquals(BTreeSet<i32>),
    SetOverlaps(BTreeSet<i32>),
    IdIn(HashSet<Uuid>),
}

impl ValueTest {
    fn eval(&self, value: &Comparable) -> bool {
        match self {
            ValueTest::AnyOf(operands) => operands.iter().any(|o| value.equals(o)),
            ValueTest::Compare(eval_type, operand) => value
                .compare(operand)
                .map(|ordering| eval_type.test(ordering))
                .unwrap_or(false),
            ValueTest::Range(from, to) => {
                matches!(value.compare(from), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(value.compare(to), Some(Ordering::Less | Ordering::Equal))
            }
            ValueTest::Date { test, date, offset } => match value {
                Comparable::DateTime(instant) => {
                    let day = local_date(*instant, *offset);
                    match test {
                        DateTest::On => day == *date,
                        DateTest::OnOrAfter => day >= *date,
                        DateTest::OnOrBefore => day <= *date,
                    }
                }
                _ => false,
            },
            ValueTest::SetEquals(set) => matches!(value, Comparable::IntSet(s) if s == set),
            ValueTest::SetOverlaps(set) => {
                matches!(value, Comparable::IntSet(s) if !s.is_disjoint(set))
            }
            ValueTest::IdIn(ids) => matches!(value, Comparable::Guid(g) if ids.contains(g)),
        }
    }
}

/// A compiled filter tree.
#[derive(Clone, Debug, PartialEq)]
pub enum CompiledPredicate {
    Constant(bool),
    Not(Box<CompiledPredicate>),
    And(Vec<CompiledPredicate>),
    Or(Vec<CompiledPredicate>),
    /// The attribute must be present and non-null; then `test` decides,
    /// and `negate` flips the test result.
    Value {
        accessor: Accessor,
        test: ValueTest,
        negate: bool,
        /// Operand used to pick how stored references are read.
        sample: Option<Value>,
    },
    /// Absent attributes count as null.
    IsNull { accessor: Accessor, negate: bool },
    /// Null and absent attributes read as empty text.
    Like {
        accessor: Accessor,
        pattern: LikePattern,
        negate: bool,
    },
    /// Compares two attributes of the same record.
    Columns {
        left: Accessor,
        right: Accessor,
        eval_type: EvalType,
    },
}

impl CompiledPredicate {
    /// Conjunction, folding trivial cases.
    pub fn and(mut parts: Vec<CompiledPredicate>) -> Self {
        parts.retain(|p| *p != CompiledPredicate::Constant(true));
        match parts.len() {
            0 => CompiledPredicate::Constant(true),
            1 => parts.remove(0),
            _ => CompiledPredicate::And(parts),
        }
    }

    /// Disjunction. An empty disjunction imposes nothing.
    pub fn or(mut parts: Vec<CompiledPredicate>) -> Self {
        match parts.len() {
            0 => CompiledPredicate::Constant(true),
            1 => parts.remove(0),
            _ => CompiledPredicate::Or(parts),
        }
    }

    pub fn negate(self) -> Self {
        match self {
            CompiledPredicate::Constant(b) => CompiledPredicate::Constant(!b),
            CompiledPredicate::Not(inner) => *inner,
            other => CompiledPredicate::Not(Box::new(other)),
        }
    }
}

impl Predicate for CompiledPredicate {
    fn eval(&self, record: &Record) -> bool {
        match self {
            CompiledPredicate::Constant(b) => *b,
            CompiledPredicate::Not(inner) => !inner.eval(record),
            CompiledPredicate::And(parts) => parts.iter().all(|p| p.eval(record)),
            CompiledPredicate::Or(parts) => parts.iter().any(|p| p.eval(record)),
            CompiledPredicate::Value {
                accessor,
                test,
                negate,
                sample,
            } => {
                let value = match accessor.read(record) {
                    Some(v) if !v.is_null() => v,
                    _ => return false,
                };
                match coerce(&value, accessor.attribute_type, sample.as_ref()) {
                    Some(comparable) => test.eval(&comparable) != *negate,
                    None => false,
                }
            }
            CompiledPredicate::IsNull { accessor, negate } => {
                let is_null = accessor.read(record).map(|v| v.is_null()).unwrap_or(true);
                is_null != *negate
            }
            CompiledPredicate::Like {
                accessor,
                pattern,
                negate,
            } => {
                let text = accessor
                    .read(record)
                    .map(|v| display_text(&v))
                    .unwrap_or_default();
                pattern.matches(&text) != *negate
            }
            CompiledPredicate::Columns {
                left,
                right,
                eval_type,
            } => {
                let (Some(l), Some(r)) = (left.read(record), right.read(record)) else {
                    return false;
                };
                let l = coerce(&l, left.attribute_type, None);
                let r = coerce(&r, right.attribute_type, None);
                match (l, r) {
                    (Some(l), Some(r)) => l
                        .compare(&r)
                        .map(|ordering| eval_type.test(ordering))
                        .unwrap_or(false),
                    _ => false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fetchkit_core::EntityReference;

    fn accessor(name: &str, attribute_type: AttributeType) -> Accessor {
        Accessor::new(
            None,
            &ResolvedAttribute {
                entity: "account".into(),
                attribute: name.into(),
                attribute_type,
                lookup: AttributeLookup::Direct,
            },
        )
    }

    #[test]
    fn test_value_requires_present_non_null() {
        let pred = CompiledPredicate::Value {
            accessor: accessor("name", AttributeType::String),
            test: ValueTest::AnyOf(vec![Comparable::Str("contoso".into())]),
            negate: true,
            sample: None,
        };
        let absent = Record::new("account", Uuid::new_v4());
        let null = Record::new("account", Uuid::new_v4()).with("name", Value::Null);
        let other = Record::new("account", Uuid::new_v4()).with("name", "Fabrikam");
        let same = Record::new("account", Uuid::new_v4()).with("name", "CONTOSO");
        assert!(!pred.eval(&absent));
        assert!(!pred.eval(&null));
        assert!(pred.eval(&other));
        assert!(!pred.eval(&same));
    }

    #[test]
    fn test_is_null_counts_absent() {
        let pred = CompiledPredicate::IsNull {
            accessor: accessor("name", AttributeType::String),
            negate: false,
        };
        assert!(pred.eval(&Record::new("account", Uuid::new_v4())));
        assert!(!pred.eval(&Record::new("account", Uuid::new_v4()).with("name", "x")));
    }

    #[test]
    fn test_like_reads_null_as_empty() {
        let pred = CompiledPredicate::Like {
            accessor: accessor("name", AttributeType::String),
            pattern: LikePattern::compile("%"),
            negate: false,
        };
        assert!(pred.eval(&Record::new("account", Uuid::new_v4())));
    }

    #[test]
    fn test_reference_name_lookup() {
        let resolved = ResolvedAttribute {
            entity: "account".into(),
            attribute: "primarycontactidname".into(),
            attribute_type: AttributeType::String,
            lookup: AttributeLookup::ReferenceName {
                base: "primarycontactid".into(),
            },
        };
        let accessor = Accessor::new(Some("a"), &resolved);
        assert_eq!(accessor.key(), "a.primarycontactidname");

        let contact = Record::new("contact", Uuid::new_v4()).with(
            "primarycontactid",
            EntityReference::new("contact", Uuid::new_v4()).with_name("Jane"),
        );
        let mut row = Record::new("account", Uuid::new_v4());
        row.merge_aliased("a", &contact);
        assert_eq!(accessor.read(&row).map(Cow::into_owned), Some(Value::from("Jane")));
    }

    #[test]
    fn test_eval_type() {
        assert!(EvalType::Ge.test(Ordering::Equal));
        assert!(!EvalType::Gt.test(Ordering::Equal));
        assert!(EvalType::Ne.test(Ordering::Less));
    }

    #[test]
    fn test_constant_folding() {
        assert_eq!(CompiledPredicate::and(vec![]), CompiledPredicate::Constant(true));
        assert_eq!(
            CompiledPredicate::and(vec![CompiledPredicate::Constant(true), CompiledPredicate::Constant(false)]),
            CompiledPredicate::Constant(false)
        );
        assert_eq!(
            CompiledPredicate::Constant(true).negate(),
            CompiledPredicate::Constant(false)
        );
    }
}
