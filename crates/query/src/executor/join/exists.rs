//! Existential (semi/anti) join.

use crate::ast::JoinKind;
use crate::coercion::{join_key, Comparable};
use crate::compiler::{CompiledPredicate, Predicate};
use crate::executor::Relation;
use fetchkit_core::Record;
use hashbrown::HashMap;

/// Filters left records by the correlated right records that pass `filter`.
///
/// Correlated records are the right records whose `right_key` matches the
/// left record's `left_key`. No right attributes are merged.
pub struct ExistsJoin {
    kind: JoinKind,
    left_key: String,
    right_key: String,
    filter: CompiledPredicate,
}

impl ExistsJoin {
    pub fn new(kind: JoinKind, left_key: impl Into<String>, right_key: impl Into<String>, filter: CompiledPredicate) -> Self {
        Self {
            kind,
            left_key: left_key.into(),
            right_key: right_key.into(),
            filter,
        }
    }

    fn keep(&self, correlated: &[&Record]) -> bool {
        match self.kind {
            JoinKind::Any => correlated.iter().any(|r| self.filter.eval(r)),
            JoinKind::NotAny => !correlated.iter().any(|r| self.filter.eval(r)),
            JoinKind::All => correlated.iter().all(|r| self.filter.eval(r)),
            JoinKind::NotAll => correlated.iter().any(|r| !self.filter.eval(r)),
            JoinKind::Inner | JoinKind::LeftOuter => !correlated.is_empty(),
        }
    }

    pub fn execute(&self, left: Relation, right: Relation) -> Relation {
        let mut groups: HashMap<Comparable, Vec<&Record>> = HashMap::new();
        for record in &right.records {
            if let Some(key) = record.get(&self.right_key).and_then(join_key) {
                groups.entry(key).or_default().push(record);
            }
        }

        let records = left
            .records
            .iter()
            .filter(|record| {
                let correlated = record
                    .get(&self.left_key)
                    .and_then(join_key)
                    .and_then(|key| groups.get(&key))
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                self.keep(correlated)
            })
            .cloned()
            .collect();
        left.with_records(records)
    }
}
