//! Sort executor.

use crate::ast::SortOrder;
use crate::coercion::coerce;
use crate::compiler::Accessor;
use crate::executor::Relation;
use core::cmp::Ordering;
use fetchkit_core::{Record, Value};

/// One ordering term.
#[derive(Clone, Debug)]
pub struct SortKey {
    pub accessor: Accessor,
    pub order: SortOrder,
}

impl SortKey {
    pub fn new(accessor: Accessor, order: SortOrder) -> Self {
        Self { accessor, order }
    }
}

/// Sort executor - stable multi-key sort.
///
/// Null and absent values sort first in ascending order. References sort by
/// their name, then by id. Values that cannot be compared tie.
pub struct SortExecutor {
    keys: Vec<SortKey>,
}

impl SortExecutor {
    /// Creates a new sort executor.
    pub fn new(keys: Vec<SortKey>) -> Self {
        Self { keys }
    }

    /// Executes the sort on the input relation.
    pub fn execute(&self, mut input: Relation) -> Relation {
        if !self.keys.is_empty() {
            input.records.sort_by(|a, b| self.compare_records(a, b));
        }
        input
    }

    fn compare_records(&self, a: &Record, b: &Record) -> Ordering {
        for key in &self.keys {
            let a_val = key.accessor.read(a).filter(|v| !v.is_null());
            let b_val = key.accessor.read(b).filter(|v| !v.is_null());

            let cmp = match (a_val, b_val) {
                (Some(av), Some(bv)) => compare_values(&av, &bv, &key.accessor),
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };

            if cmp != Ordering::Equal {
                return match key.order {
                    SortOrder::Asc => cmp,
                    SortOrder::Desc => cmp.reverse(),
                };
            }
        }
        Ordering::Equal
    }
}

fn compare_values(a: &Value, b: &Value, accessor: &Accessor) -> Ordering {
    if let (Value::Reference(ra), Value::Reference(rb)) = (a, b) {
        let name = |r: &fetchkit_core::EntityReference| r.name.as_deref().unwrap_or_default().to_lowercase();
        return name(ra).cmp(&name(rb)).then_with(|| ra.id.cmp(&rb.id));
    }
    let attribute_type = accessor.attribute_type();
    match (coerce(a, attribute_type, None), coerce(b, attribute_type, None)) {
        (Some(ca), Some(cb)) => ca.compare(&cb).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{AttributeLookup, ResolvedAttribute};
    use fetchkit_core::{AttributeType, EntityReference, Uuid};

    fn accessor(attribute: &str, attribute_type: AttributeType) -> Accessor {
        Accessor::new(
            None,
            &ResolvedAttribute {
                entity: "account".into(),
                attribute: attribute.into(),
                attribute_type,
                lookup: AttributeLookup::Direct,
            },
        )
    }

    fn names(relation: &Relation) -> Vec<&str> {
        relation
            .iter()
            .map(|r| r.get("name").and_then(Value::as_str).unwrap_or(""))
            .collect()
    }

    fn accounts() -> Relation {
        let row = |name: &str, revenue: Option<i64>| {
            let record = Record::new("account", Uuid::new_v4()).with("name", name);
            match revenue {
                Some(r) => record.with("revenue", r),
                None => record,
            }
        };
        Relation::from_records(vec![
            row("b", Some(20)),
            row("a", None),
            row("c", Some(10)),
            row("d", Some(20)),
        ])
    }

    #[test]
    fn test_sort_ascending_nulls_first() {
        let sort = SortExecutor::new(vec![SortKey::new(accessor("revenue", AttributeType::Int), SortOrder::Asc)]);
        let result = sort.execute(accounts());
        assert_eq!(names(&result), vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn test_sort_descending_is_stable() {
        let sort = SortExecutor::new(vec![SortKey::new(accessor("revenue", AttributeType::Int), SortOrder::Desc)]);
        let result = sort.execute(accounts());
        assert_eq!(names(&result), vec!["b", "d", "c", "a"]);
    }

    #[test]
    fn test_sort_multiple_keys() {
        let sort = SortExecutor::new(vec![
            SortKey::new(accessor("revenue", AttributeType::Int), SortOrder::Desc),
            SortKey::new(accessor("name", AttributeType::String), SortOrder::Desc),
        ]);
        let result = sort.execute(accounts());
        assert_eq!(names(&result), vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn test_sort_text_case_insensitive() {
        let input = Relation::from_records(
            ["beta", "Alpha", "gamma"]
                .iter()
                .map(|n| Record::new("account", Uuid::new_v4()).with("name", *n))
                .collect(),
        );
        let sort = SortExecutor::new(vec![SortKey::new(accessor("name", AttributeType::String), SortOrder::Asc)]);
        assert_eq!(names(&sort.execute(input)), vec!["Alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_sort_references_by_name() {
        let input = Relation::from_records(
            ["Zed", "amy"]
                .iter()
                .map(|n| {
                    Record::new("account", Uuid::new_v4())
                        .with("name", *n)
                        .with("ownerid", EntityReference::new("systemuser", Uuid::new_v4()).with_name(*n))
                })
                .collect(),
        );
        let sort = SortExecutor::new(vec![SortKey::new(accessor("ownerid", AttributeType::Reference), SortOrder::Asc)]);
        assert_eq!(names(&sort.execute(input)), vec!["amy", "Zed"]);
    }
}
