//! Filter executor.

use crate::compiler::Predicate;
use crate::executor::Relation;
use fetchkit_core::Record;

/// Filter executor - keeps records accepted by a predicate.
pub struct FilterExecutor<P: Predicate> {
    predicate: P,
}

impl<P: Predicate> FilterExecutor<P> {
    /// Creates a new filter executor.
    pub fn new(predicate: P) -> Self {
        Self { predicate }
    }

    /// Executes the filter on the input relation. Order is preserved.
    pub fn execute(&self, input: Relation) -> Relation {
        let records: Vec<Record> = input
            .iter()
            .filter(|record| self.predicate.eval(record))
            .cloned()
            .collect();
        input.with_records(records)
    }
}
