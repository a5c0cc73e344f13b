//! Distinct executor.

use crate::executor::Relation;
use fetchkit_core::{Record, Value};
use hashbrown::HashSet;

/// Removes records whose attributes repeat an earlier record's attributes.
/// Record ids are not compared. The first occurrence is kept.
pub struct DistinctExecutor;

impl DistinctExecutor {
    pub fn execute(&self, input: Relation) -> Relation {
        let mut seen: HashSet<Vec<(&str, &Value)>> = HashSet::with_capacity(input.len());
        let mut keep = Vec::with_capacity(input.len());
        for (idx, record) in input.iter().enumerate() {
            if seen.insert(signature(record)) {
                keep.push(idx);
            }
        }
        let records: Vec<Record> = keep.into_iter().map(|idx| input.records[idx].clone()).collect();
        input.with_records(records)
    }
}

fn signature(record: &Record) -> Vec<(&str, &Value)> {
    let mut attributes: Vec<(&str, &Value)> = record
        .attributes()
        .iter()
        .map(|(name, value)| (name.as_str(), value))
        .collect();
    attributes.sort_unstable_by(|a, b| a.0.cmp(b.0));
    attributes
}
