//! Entity metadata and declared schemas available to the engine.

use crate::temporal::FiscalSettings;
use chrono::{FixedOffset, Offset, Utc};
use fetchkit_core::schema::{EntityMetadata, EntitySchema};
use hashbrown::HashMap;

/// Source of entity metadata and organization settings.
pub trait MetadataProvider {
    /// Metadata of an entity, if known.
    fn entity_metadata(&self, entity: &str) -> Option<&EntityMetadata>;

    /// Self-referential parent attribute used for hierarchy operators.
    fn hierarchy_parent_attribute(&self, entity: &str) -> Option<&str>;

    /// Fiscal calendar settings.
    fn fiscal_settings(&self) -> FiscalSettings;

    /// Time zone used for calendar operators.
    fn time_zone(&self) -> FixedOffset;
}

/// Metadata held in memory.
#[derive(Clone, Debug)]
pub struct InMemoryMetadata {
    entities: HashMap<String, EntityMetadata>,
    hierarchies: HashMap<String, String>,
    fiscal: FiscalSettings,
    time_zone: FixedOffset,
}

impl Default for InMemoryMetadata {
    fn default() -> Self {
        Self {
            entities: HashMap::new(),
            hierarchies: HashMap::new(),
            fiscal: FiscalSettings::default(),
            time_zone: utc_offset(),
        }
    }
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

impl InMemoryMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers entity metadata, replacing any previous registration.
    pub fn register(&mut self, metadata: EntityMetadata) {
        self.entities.insert(metadata.logical_name.clone(), metadata);
    }

    /// Registers entity metadata, builder style.
    pub fn with_entity(mut self, metadata: EntityMetadata) -> Self {
        self.register(metadata);
        self
    }

    /// Registers the parent attribute of a hierarchical entity.
    pub fn with_hierarchy(mut self, entity: impl Into<String>, parent_attribute: impl Into<String>) -> Self {
        self.hierarchies.insert(entity.into(), parent_attribute.into());
        self
    }

    pub fn with_fiscal_settings(mut self, fiscal: FiscalSettings) -> Self {
        self.fiscal = fiscal;
        self
    }

    pub fn with_time_zone(mut self, time_zone: FixedOffset) -> Self {
        self.time_zone = time_zone;
        self
    }
}

impl MetadataProvider for InMemoryMetadata {
    fn entity_metadata(&self, entity: &str) -> Option<&EntityMetadata> {
        self.entities.get(entity)
    }

    fn hierarchy_parent_attribute(&self, entity: &str) -> Option<&str> {
        self.hierarchies.get(entity).map(String::as_str)
    }

    fn fiscal_settings(&self) -> FiscalSettings {
        self.fiscal
    }

    fn time_zone(&self) -> FixedOffset {
        self.time_zone
    }
}

/// Registry of declared entity schemas.
#[derive(Clone, Debug, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, EntitySchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a schema, replacing any previous one of the same entity.
    pub fn register(&mut self, schema: EntitySchema) {
        self.schemas.insert(schema.name().to_string(), schema);
    }

    /// Registers a schema, builder style.
    pub fn with_schema(mut self, schema: EntitySchema) -> Self {
        self.register(schema);
        self
    }

    pub fn get(&self, entity: &str) -> Option<&EntitySchema> {
        self.schemas.get(entity)
    }

    pub fn contains(&self, entity: &str) -> bool {
        self.schemas.contains_key(entity)
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
