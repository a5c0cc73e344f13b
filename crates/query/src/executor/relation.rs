//! Relation type for query execution.

use fetchkit_core::Record;

/// An ordered bag of (possibly joined) records.
///
/// `aliases` lists the link aliases merged into the records, in join order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Relation {
    pub records: Vec<Record>,
    aliases: Vec<String>,
}

impl Relation {
    /// Creates a relation over records of a single entity.
    pub fn from_records(records: Vec<Record>) -> Self {
        Self {
            records,
            aliases: Vec::new(),
        }
    }

    /// Creates an empty relation.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Aliases merged into the records.
    #[inline]
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Returns a relation with the same aliases over new records.
    pub(crate) fn with_records(&self, records: Vec<Record>) -> Self {
        Self {
            records,
            aliases: self.aliases.clone(),
        }
    }

    /// Records that an alias was merged in.
    pub(crate) fn push_alias(&mut self, alias: &str) {
        self.aliases.push(alias.to_string());
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

impl IntoIterator for Relation {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fetchkit_core::Uuid;

    #[test]
    fn test_relation_basics() {
        let mut relation = Relation::from_records(vec![
            Record::new("account", Uuid::new_v4()),
            Record::new("account", Uuid::new_v4()),
        ]);
        relation.push_alias("c");
        assert_eq!(relation.len(), 2);
        assert_eq!(relation.aliases(), ["c".to_string()]);

        let narrowed = relation.with_records(Vec::new());
        assert!(narrowed.is_empty());
        assert_eq!(narrowed.aliases().len(), 1);
        assert!(Relation::empty().is_empty());
    }
}
