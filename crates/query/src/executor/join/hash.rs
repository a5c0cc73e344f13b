//! Hash Join implementation.

use crate::coercion::{join_key, Comparable};
use crate::executor::Relation;
use fetchkit_core::Record;
use hashbrown::HashMap;

/// Hash Join executor.
///
/// Builds a hash table over the right (link target) relation, then probes
/// it once per left record. Output keeps left order; matches of one left
/// record keep right order. Matched right records are merged under the
/// link alias.
pub struct HashJoin {
    /// Attribute key in the left records.
    left_key: String,
    /// Attribute of the right records.
    right_key: String,
    alias: String,
    /// Whether this is an outer join.
    is_outer_join: bool,
}

impl HashJoin {
    /// Creates a new hash join executor.
    pub fn new(left_key: impl Into<String>, right_key: impl Into<String>, alias: impl Into<String>, is_outer_join: bool) -> Self {
        Self {
            left_key: left_key.into(),
            right_key: right_key.into(),
            alias: alias.into(),
            is_outer_join,
        }
    }

    /// Creates an inner hash join.
    pub fn inner(left_key: impl Into<String>, right_key: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::new(left_key, right_key, alias, false)
    }

    /// Creates a left outer hash join.
    pub fn left_outer(left_key: impl Into<String>, right_key: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::new(left_key, right_key, alias, true)
    }

    /// Executes the hash join.
    pub fn execute(&self, left: Relation, right: Relation) -> Relation {
        // Build phase
        let mut hash_table: HashMap<Comparable, Vec<usize>> = HashMap::with_capacity(right.len());
        for (idx, record) in right.records.iter().enumerate() {
            if let Some(key) = record.get(&self.right_key).and_then(join_key) {
                hash_table.entry(key).or_default().push(idx);
            }
        }

        // Probe phase
        let mut records: Vec<Record> = Vec::with_capacity(left.len());
        for record in &left.records {
            let matches = record
                .get(&self.left_key)
                .and_then(join_key)
                .and_then(|key| hash_table.get(&key));
            match matches {
                Some(indices) => {
                    for idx in indices {
                        let mut joined = record.clone();
                        joined.merge_aliased(&self.alias, &right.records[*idx]);
                        records.push(joined);
                    }
                }
                None if self.is_outer_join => records.push(record.clone()),
                None => {}
            }
        }

        let mut output = left.with_records(records);
        output.push_alias(&self.alias);
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fetchkit_core::{EntityReference, Uuid, Value};

    fn fixture() -> (Relation, Relation, Uuid) {
        let jane = Uuid::new_v4();
        let accounts = Relation::from_records(vec![
            Record::new("account", Uuid::new_v4())
                .with("name", "Contoso")
                .with("primarycontactid", EntityReference::new("contact", jane)),
            Record::new("account", Uuid::new_v4()).with("name", "Fabrikam"),
        ]);
        let contacts = Relation::from_records(vec![Record::new("contact", jane)
            .with("contactid", Value::Guid(jane))
            .with("fullname", "Jane")]);
        (accounts, contacts, jane)
    }

    #[test]
    fn test_inner_join() {
        let (accounts, contacts, _) = fixture();
        let result = HashJoin::inner("primarycontactid", "contactid", "c").execute(accounts, contacts);
        assert_eq!(result.len(), 1);
        assert_eq!(result.aliases(), ["c".to_string()]);
        assert_eq!(
            result.records[0].get_unwrapped("c.fullname"),
            Some(&Value::from("Jane"))
        );
    }

    #[test]
    fn test_left_outer_join_keeps_unmatched() {
        let (accounts, contacts, _) = fixture();
        let result = HashJoin::left_outer("primarycontactid", "contactid", "c").execute(accounts, contacts);
        assert_eq!(result.len(), 2);
        assert!(result.records[0].contains("c.fullname"));
        assert!(!result.records[1].contains("c.fullname"));
    }

    #[test]
    fn test_one_row_per_match() {
        let id = Uuid::new_v4();
        let left = Relation::from_records(vec![Record::new("contact", id).with("contactid", Value::Guid(id))]);
        let right = Relation::from_records(
            (0..3)
                .map(|i| {
                    Record::new("task", Uuid::new_v4())
                        .with("regardingobjectid", EntityReference::new("contact", id))
                        .with("subject", format!("task {i}"))
                })
                .collect(),
        );
        let result = HashJoin::inner("contactid", "regardingobjectid", "t").execute(left, right);
        assert_eq!(result.len(), 3);
        assert_eq!(
            result.records[2].get_unwrapped("t.subject"),
            Some(&Value::from("task 2"))
        );
    }
}
