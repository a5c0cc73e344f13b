//! Aggregate executor.

use crate::ast::{AggregateFunc, DateGrouping};
use crate::coercion::{coerce, join_key, Comparable, INT_SENTINEL};
use crate::compiler::Accessor;
use crate::executor::Relation;
use crate::temporal::local_date;
use chrono::{Datelike, FixedOffset};
use core::cmp::Ordering;
use fetchkit_core::{AliasedValue, AttributeType, Decimal, Record, Uuid, Value};
use hashbrown::{HashMap, HashSet};

/// What an output column computes.
#[derive(Clone, Debug, PartialEq)]
pub enum AggregateKind {
    /// Grouping key, optionally reduced to a date component.
    GroupBy(Option<DateGrouping>),
    /// Aggregate function over the group.
    Function { func: AggregateFunc, distinct: bool },
}

/// One output column of an aggregate query.
#[derive(Clone, Debug)]
pub struct AggregateColumn {
    /// Output attribute name.
    pub output: String,
    /// Alias of the entity the attribute belongs to.
    pub source: String,
    pub attribute: String,
    pub accessor: Accessor,
    pub kind: AggregateKind,
}

/// Aggregate executor - groups records and computes aggregate functions.
///
/// Groups appear in the order their first record appears. Without group-by
/// columns, the whole input forms one group, even when it is empty.
pub struct AggregateExecutor {
    entity: String,
    columns: Vec<AggregateColumn>,
    offset: FixedOffset,
}

impl AggregateExecutor {
    /// Creates a new aggregate executor. `offset` is the time zone date
    /// groupings are computed in.
    pub fn new(entity: impl Into<String>, columns: Vec<AggregateColumn>, offset: FixedOffset) -> Self {
        Self {
            entity: entity.into(),
            columns,
            offset,
        }
    }

    fn has_grouping(&self) -> bool {
        self.columns
            .iter()
            .any(|c| matches!(c.kind, AggregateKind::GroupBy(_)))
    }

    /// Executes the aggregation on the input relation.
    pub fn execute(&self, input: Relation) -> Relation {
        if !self.has_grouping() {
            let group: Vec<&Record> = input.iter().collect();
            return input.with_records(vec![self.output_row(&group)]);
        }

        let mut index: HashMap<Vec<Option<Comparable>>, usize> = HashMap::new();
        let mut groups: Vec<Vec<&Record>> = Vec::new();
        for record in input.iter() {
            let key = self.group_key(record);
            let slot = *index.entry(key).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(record);
        }

        let records = groups.iter().map(|group| self.output_row(group)).collect();
        input.with_records(records)
    }

    fn group_key(&self, record: &Record) -> Vec<Option<Comparable>> {
        self.columns
            .iter()
            .filter_map(|column| match column.kind {
                AggregateKind::GroupBy(grouping) => Some(self.group_value(column, grouping, record)),
                AggregateKind::Function { .. } => None,
            })
            .map(|value| join_key(&value))
            .collect()
    }

    fn group_value(&self, column: &AggregateColumn, grouping: Option<DateGrouping>, record: &Record) -> Value {
        let value = match column.accessor.read(record) {
            Some(value) => value.into_owned(),
            None => return Value::Null,
        };
        match (grouping, &value) {
            (None, _) => value,
            (Some(grouping), Value::DateTime(instant)) => {
                let date = local_date(*instant, self.offset);
                let component = match grouping {
                    DateGrouping::Day => date.day() as i64,
                    DateGrouping::Week => date.iso_week().week() as i64,
                    DateGrouping::Month => date.month() as i64,
                    DateGrouping::Quarter => ((date.month() - 1) / 3 + 1) as i64,
                    DateGrouping::Year => date.year() as i64,
                };
                Value::Int(component)
            }
            (Some(_), _) => Value::Null,
        }
    }

    fn output_row(&self, group: &[&Record]) -> Record {
        let mut row = Record::new(self.entity.as_str(), Uuid::nil());
        for column in &self.columns {
            let value = match &column.kind {
                AggregateKind::GroupBy(grouping) => group
                    .first()
                    .map(|record| self.group_value(column, *grouping, record))
                    .unwrap_or(Value::Null),
                AggregateKind::Function { func, distinct } => compute(*func, *distinct, column, group),
            };
            row.set(
                column.output.as_str(),
                Value::Aliased(AliasedValue::new(column.source.as_str(), column.attribute.as_str(), value)),
            );
        }
        row
    }
}

fn present_values(column: &AggregateColumn, group: &[&Record]) -> Vec<Value> {
    group
        .iter()
        .filter_map(|record| column.accessor.read(record))
        .filter(|value| !value.is_null())
        .map(|value| value.into_owned())
        .collect()
}

fn compute(func: AggregateFunc, distinct: bool, column: &AggregateColumn, group: &[&Record]) -> Value {
    let attribute_type = column.accessor.attribute_type();
    match func {
        AggregateFunc::Count => Value::Int(group.len() as i64),
        AggregateFunc::CountColumn => {
            let values = present_values(column, group);
            if distinct {
                let keys: HashSet<Comparable> = values.iter().filter_map(join_key).collect();
                Value::Int(keys.len() as i64)
            } else {
                Value::Int(values.len() as i64)
            }
        }
        AggregateFunc::Sum | AggregateFunc::Avg => {
            let numbers: Vec<Decimal> = present_values(column, group)
                .iter()
                .filter_map(|v| numeric(v, attribute_type))
                .collect();
            if numbers.is_empty() {
                return Value::Null;
            }
            let total: Decimal = numbers.iter().sum();
            if func == AggregateFunc::Sum {
                numeric_value(total, attribute_type)
            } else {
                let avg = total / Decimal::from(numbers.len() as i64);
                match attribute_type {
                    AttributeType::Money => Value::Money(avg),
                    _ => Value::Decimal(avg),
                }
            }
        }
        AggregateFunc::Min | AggregateFunc::Max => {
            let wanted = if func == AggregateFunc::Min {
                Ordering::Less
            } else {
                Ordering::Greater
            };
            let mut best: Option<(Comparable, Value)> = None;
            for value in present_values(column, group) {
                let Some(candidate) = coerce(&value, attribute_type, None) else {
                    continue;
                };
                let replace = match &best {
                    None => true,
                    Some((current, _)) => candidate.compare(current) == Some(wanted),
                };
                if replace {
                    best = Some((candidate, value));
                }
            }
            best.map(|(_, value)| value).unwrap_or(Value::Null)
        }
    }
}

fn numeric(value: &Value, attribute_type: AttributeType) -> Option<Decimal> {
    match coerce(value, attribute_type, None)? {
        Comparable::Int(i) if i != INT_SENTINEL => Some(Decimal::from(i)),
        Comparable::Decimal(d) => Some(d),
        _ => None,
    }
}

fn numeric_value(total: Decimal, attribute_type: AttributeType) -> Value {
    match attribute_type {
        AttributeType::Int => i64::try_from(total)
            .map(Value::Int)
            .unwrap_or(Value::Decimal(total)),
        AttributeType::Money => Value::Money(total),
        _ => Value::Decimal(total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{AttributeLookup, ResolvedAttribute};
    use chrono::{TimeZone, Utc};

    fn column(attribute: &str, attribute_type: AttributeType, output: &str, kind: AggregateKind) -> AggregateColumn {
        AggregateColumn {
            output: output.into(),
            source: "opportunity".into(),
            attribute: attribute.into(),
            accessor: Accessor::new(
                None,
                &ResolvedAttribute {
                    entity: "opportunity".into(),
                    attribute: attribute.into(),
                    attribute_type,
                    lookup: AttributeLookup::Direct,
                },
            ),
            kind,
        }
    }

    fn function(func: AggregateFunc) -> AggregateKind {
        AggregateKind::Function { func, distinct: false }
    }

    fn opportunities() -> Relation {
        let row = |owner: &str, amount: i64, month: u32| {
            Record::new("opportunity", Uuid::new_v4())
                .with("owner", owner)
                .with("amount", Value::Money(Decimal::from(amount)))
                .with("closedon", Utc.with_ymd_and_hms(2024, month, 10, 12, 0, 0).unwrap())
        };
        Relation::from_records(vec![
            row("ann", 100, 1),
            row("bob", 50, 2),
            row("ann", 300, 2),
            Record::new("opportunity", Uuid::new_v4()).with("owner", "bob"),
        ])
    }

    fn get(record: &Record, output: &str) -> Value {
        record.get_unwrapped(output).cloned().unwrap_or(Value::Null)
    }

    #[test]
    fn test_aggregate_without_grouping() {
        let executor = AggregateExecutor::new(
            "opportunity",
            vec![
                column("opportunityid", AttributeType::Guid, "total", function(AggregateFunc::Count)),
                column("amount", AttributeType::Money, "priced", function(AggregateFunc::CountColumn)),
                column("amount", AttributeType::Money, "sum", function(AggregateFunc::Sum)),
                column("amount", AttributeType::Money, "avg", function(AggregateFunc::Avg)),
                column("amount", AttributeType::Money, "max", function(AggregateFunc::Max)),
            ],
            FixedOffset::east_opt(0).unwrap(),
        );
        let result = executor.execute(opportunities());
        assert_eq!(result.len(), 1);
        let row = &result.records[0];
        assert_eq!(get(row, "total"), Value::Int(4));
        assert_eq!(get(row, "priced"), Value::Int(3));
        assert_eq!(get(row, "sum"), Value::Money(Decimal::from(450)));
        assert_eq!(get(row, "avg"), Value::Money(Decimal::from(150)));
        assert_eq!(get(row, "max"), Value::Money(Decimal::from(300)));
        assert!(matches!(row.get("sum"), Some(Value::Aliased(a)) if a.attribute == "amount"));
    }

    #[test]
    fn test_group_by_in_first_seen_order() {
        let executor = AggregateExecutor::new(
            "opportunity",
            vec![
                column("owner", AttributeType::String, "owner", AggregateKind::GroupBy(None)),
                column("amount", AttributeType::Money, "sum", function(AggregateFunc::Sum)),
                column("amount", AttributeType::Money, "min", function(AggregateFunc::Min)),
            ],
            FixedOffset::east_opt(0).unwrap(),
        );
        let result = executor.execute(opportunities());
        assert_eq!(result.len(), 2);
        assert_eq!(get(&result.records[0], "owner"), Value::from("ann"));
        assert_eq!(get(&result.records[0], "sum"), Value::Money(Decimal::from(400)));
        assert_eq!(get(&result.records[1], "owner"), Value::from("bob"));
        assert_eq!(get(&result.records[1], "min"), Value::Money(Decimal::from(50)));
    }

    #[test]
    fn test_group_by_month() {
        let executor = AggregateExecutor::new(
            "opportunity",
            vec![
                column("closedon", AttributeType::DateTime, "month", AggregateKind::GroupBy(Some(DateGrouping::Month))),
                column("opportunityid", AttributeType::Guid, "n", function(AggregateFunc::Count)),
            ],
            FixedOffset::east_opt(0).unwrap(),
        );
        let result = executor.execute(opportunities());
        let months: Vec<(Value, Value)> = result
            .iter()
            .map(|r| (get(r, "month"), get(r, "n")))
            .collect();
        assert_eq!(
            months,
            vec![
                (Value::Int(1), Value::Int(1)),
                (Value::Int(2), Value::Int(2)),
                (Value::Null, Value::Int(1)),
            ]
        );
    }

    #[test]
    fn test_distinct_count_column() {
        let executor = AggregateExecutor::new(
            "opportunity",
            vec![column(
                "owner",
                AttributeType::String,
                "owners",
                AggregateKind::Function {
                    func: AggregateFunc::CountColumn,
                    distinct: true,
                },
            )],
            FixedOffset::east_opt(0).unwrap(),
        );
        let result = executor.execute(opportunities());
        assert_eq!(get(&result.records[0], "owners"), Value::Int(2));
    }

    #[test]
    fn test_empty_input() {
        let count = column("opportunityid", AttributeType::Guid, "n", function(AggregateFunc::Count));
        let sum = column("amount", AttributeType::Money, "sum", function(AggregateFunc::Sum));
        let executor = AggregateExecutor::new("opportunity", vec![count.clone(), sum], FixedOffset::east_opt(0).unwrap());
        let result = executor.execute(Relation::empty());
        assert_eq!(result.len(), 1);
        assert_eq!(get(&result.records[0], "n"), Value::Int(0));
        assert_eq!(get(&result.records[0], "sum"), Value::Null);

        let grouped = AggregateExecutor::new(
            "opportunity",
            vec![column("owner", AttributeType::String, "owner", AggregateKind::GroupBy(None)), count],
            FixedOffset::east_opt(0).unwrap(),
        );
        assert!(grouped.execute(Relation::empty()).is_empty());
    }
}
