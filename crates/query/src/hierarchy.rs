//! Self-referential hierarchy traversal.

use crate::store::RecordStore;
use fetchkit_core::{Uuid, Value};
use hashbrown::{HashMap, HashSet};
use std::collections::VecDeque;

/// Walks parent links of one entity.
pub struct Hierarchy<'a> {
    store: &'a dyn RecordStore,
    entity: &'a str,
    parent_attribute: &'a str,
}

impl<'a> Hierarchy<'a> {
    pub fn new(store: &'a dyn RecordStore, entity: &'a str, parent_attribute: &'a str) -> Self {
        Self {
            store,
            entity,
            parent_attribute,
        }
    }

    /// Returns true if the record exists.
    pub fn contains(&self, id: Uuid) -> bool {
        self.store.get(self.entity, id).is_some()
    }

    fn parent_of(&self, id: Uuid) -> Option<Uuid> {
        let record = self.store.get(self.entity, id)?;
        match record.get_unwrapped(self.parent_attribute)? {
            Value::Reference(r) => Some(r.id),
            Value::Guid(g) => Some(*g),
            _ => None,
        }
    }

    /// Ids of every ancestor, nearest first. Excludes `id` itself.
    pub fn ancestors(&self, id: Uuid) -> Vec<Uuid> {
        let mut seen = HashSet::new();
        seen.insert(id);
        let mut chain = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent_of(current) {
            if !seen.insert(parent) {
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// Ids of every descendant in breadth-first order. Excludes `id` itself.
    pub fn descendants(&self, id: Uuid) -> Vec<Uuid> {
        let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for record in self.store.records(self.entity) {
            let parent = match record.get_unwrapped(self.parent_attribute) {
                Some(Value::Reference(r)) => r.id,
                Some(Value::Guid(g)) => *g,
                _ => continue,
            };
            children.entry(parent).or_default().push(record.id());
        }

        let mut seen = HashSet::new();
        seen.insert(id);
        let mut order = Vec::new();
        let mut queue = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            for child in children.get(&current).into_iter().flatten() {
                if seen.insert(*child) {
                    order.push(*child);
                    queue.push_back(*child);
                }
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use fetchkit_core::{EntityReference, Record};

    fn account(id: Uuid, parent: Option<Uuid>) -> Record {
        let record = Record::new("account", id);
        match parent {
            Some(p) => record.with("parentaccountid", EntityReference::new("account", p)),
            None => record,
        }
    }

    #[test]
    fn test_ancestors_and_descendants() {
        let root = Uuid::new_v4();
        let child = Uuid::new_v4();
        let grandchild = Uuid::new_v4();
        let other = Uuid::new_v4();
        let store = InMemoryStore::new()
            .with(account(root, None))
            .with(account(child, Some(root)))
            .with(account(grandchild, Some(child)))
            .with(account(other, None));
        let hierarchy = Hierarchy::new(&store, "account", "parentaccountid");

        assert_eq!(hierarchy.ancestors(grandchild), vec![child, root]);
        assert!(hierarchy.ancestors(root).is_empty());
        assert_eq!(hierarchy.descendants(root), vec![child, grandchild]);
        assert!(hierarchy.descendants(other).is_empty());
    }

    #[test]
    fn test_cycles_terminate() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let store = InMemoryStore::new()
            .with(account(a, Some(b)))
            .with(account(b, Some(a)));
        let hierarchy = Hierarchy::new(&store, "account", "parentaccountid");

        assert_eq!(hierarchy.ancestors(a), vec![b]);
        assert_eq!(hierarchy.descendants(a), vec![b]);
    }

    #[test]
    fn test_missing_record() {
        let store = InMemoryStore::new();
        let hierarchy = Hierarchy::new(&store, "account", "parentaccountid");
        let id = Uuid::new_v4();
        assert!(!hierarchy.contains(id));
        assert!(hierarchy.ancestors(id).is_empty());
        assert!(hierarchy.descendants(id).is_empty());
    }
}
