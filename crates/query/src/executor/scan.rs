//! Scan executor.

use crate::executor::Relation;
use crate::store::RecordStore;
use fetchkit_core::Value;

/// Materializes every record of an entity, in store order.
pub struct TableScanExecutor<'a> {
    entity: &'a str,
    primary_id: &'a str,
}

impl<'a> TableScanExecutor<'a> {
    pub fn new(entity: &'a str, primary_id: &'a str) -> Self {
        Self { entity, primary_id }
    }

    /// Copies the records out of the store. Each copy carries its id under
    /// the primary id attribute.
    pub fn execute(&self, store: &dyn RecordStore) -> Relation {
        let records = store
            .records(self.entity)
            .into_iter()
            .map(|record| {
                let mut copy = record.clone();
                if !copy.contains(self.primary_id) {
                    copy.set(self.primary_id, Value::Guid(record.id()));
                }
                copy
            })
            .collect();
        Relation::from_records(records)
    }
}
