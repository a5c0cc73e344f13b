//! Record store abstraction.

use fetchkit_core::{Record, Uuid};
use hashbrown::HashMap;

/// Read access to stored records.
pub trait RecordStore {
    /// Returns a record by entity and id.
    fn get(&self, entity: &str, id: Uuid) -> Option<&Record>;

    /// Returns every record of an entity in a stable order.
    fn records(&self, entity: &str) -> Vec<&Record>;

    /// Returns the number of records of an entity.
    fn count(&self, entity: &str) -> usize {
        self.records(entity).len()
    }
}

#[derive(Clone, Debug, Default)]
struct EntitySet {
    order: Vec<Uuid>,
    records: HashMap<Uuid, Record>,
}

/// In-memory record store keeping insertion order per entity.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    entities: HashMap<String, EntitySet>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a record. Replacing keeps the original position.
    pub fn insert(&mut self, record: Record) -> Option<Record> {
        let set = self.entities.entry(record.entity().to_string()).or_default();
        let id = record.id();
        let previous = set.records.insert(id, record);
        if previous.is_none() {
            set.order.push(id);
        }
        previous
    }

    /// Inserts a record, builder style.
    pub fn with(mut self, record: Record) -> Self {
        self.insert(record);
        self
    }

    /// Removes a record.
    pub fn remove(&mut self, entity: &str, id: Uuid) -> Option<Record> {
        let set = self.entities.get_mut(entity)?;
        let removed = set.records.remove(&id)?;
        set.order.retain(|x| *x != id);
        Some(removed)
    }

    /// Total number of records across entities.
    pub fn len(&self) -> usize {
        self.entities.values().map(|s| s.records.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<Record> for InMemoryStore {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let mut store = InMemoryStore::new();
        for record in iter {
            store.insert(record);
        }
        store
    }
}

impl RecordStore for InMemoryStore {
    fn get(&self, entity: &str, id: Uuid) -> Option<&Record> {
        self.entities.get(entity)?.records.get(&id)
    }

    fn records(&self, entity: &str) -> Vec<&Record> {
        match self.entities.get(entity) {
            Some(set) => set.order.iter().filter_map(|id| set.records.get(id)).collect(),
            None => Vec::new(),
        }
    }

    fn count(&self, entity: &str) -> usize {
        self.entities.get(entity).map(|s| s.records.len()).unwrap_or(0)
    }
}
