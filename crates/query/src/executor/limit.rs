//! Limit executor.

use crate::executor::Relation;

/// Limit executor - applies a limit and offset to a relation.
pub struct LimitExecutor {
    limit: usize,
    offset: usize,
}

impl LimitExecutor {
    /// Creates a new limit executor.
    pub fn new(limit: usize, offset: usize) -> Self {
        Self { limit, offset }
    }

    /// Creates a limit executor with only a limit (no offset).
    pub fn limit_only(limit: usize) -> Self {
        Self { limit, offset: 0 }
    }

    /// Executes the limit on the input relation.
    pub fn execute(&self, mut input: Relation) -> Relation {
        let len = input.records.len();
        let start = self.offset.min(len);
        let end = self.offset.saturating_add(self.limit).min(len);

        input.records.truncate(end);
        if start > 0 {
            input.records.drain(..start);
        }
        input
    }
}
