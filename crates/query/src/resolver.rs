//! Attribute type resolution.
//!
//! Each entity is resolved by exactly one strategy: a declared schema when
//! the registry knows the entity, injected metadata otherwise. Results are
//! cached for the lifetime of the resolver.

use crate::context::QueryContext;
use crate::metadata::{MetadataProvider, SchemaRegistry};
use core::cell::RefCell;
use fetchkit_core::{AttributeType, Error, Result};
use hashbrown::HashMap;

/// Suffix addressing the display name of a reference attribute.
pub const REFERENCE_NAME_SUFFIX: &str = "name";

/// How an attribute value is read from a row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttributeLookup {
    /// Read the attribute itself.
    Direct,
    /// Read the name of the reference stored in `base`.
    ReferenceName { base: String },
}

/// A resolved attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedAttribute {
    pub entity: String,
    pub attribute: String,
    pub attribute_type: AttributeType,
    pub lookup: AttributeLookup,
}

/// A type resolution strategy.
pub trait TypeResolver {
    /// Returns true if the strategy can describe the entity.
    fn knows_entity(&self, entity: &str) -> bool;

    /// Primary id attribute of a known entity.
    fn primary_id(&self, entity: &str) -> Option<String>;

    /// `None` for an unknown attribute, `Some(Err)` for a known attribute
    /// whose type cannot be queried.
    fn attribute_type(&self, entity: &str, attribute: &str) -> Option<Result<AttributeType>>;
}

/// Resolves from declared schemas.
pub struct SchemaTypeResolver<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> SchemaTypeResolver<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }
}

impl TypeResolver for SchemaTypeResolver<'_> {
    fn knows_entity(&self, entity: &str) -> bool {
        self.registry.contains(entity)
    }

    fn primary_id(&self, entity: &str) -> Option<String> {
        self.registry.get(entity).map(|s| s.primary_id().to_string())
    }

    fn attribute_type(&self, entity: &str, attribute: &str) -> Option<Result<AttributeType>> {
        let schema = self.registry.get(entity)?;
        schema
            .get_attribute(attribute)
            .map(|a| Ok(a.declared().logical_type()))
    }
}

/// Resolves from injected entity metadata.
pub struct MetadataTypeResolver<'a> {
    metadata: &'a dyn MetadataProvider,
}

impl<'a> MetadataTypeResolver<'a> {
    pub fn new(metadata: &'a dyn MetadataProvider) -> Self {
        Self { metadata }
    }
}

impl TypeResolver for MetadataTypeResolver<'_> {
    fn knows_entity(&self, entity: &str) -> bool {
        self.metadata.entity_metadata(entity).is_some()
    }

    fn primary_id(&self, entity: &str) -> Option<String> {
        self.metadata
            .entity_metadata(entity)
            .map(|m| m.primary_id_attribute.clone())
    }

    fn attribute_type(&self, entity: &str, attribute: &str) -> Option<Result<AttributeType>> {
        let metadata = self.metadata.entity_metadata(entity)?;
        let attr = metadata.attribute(attribute)?;
        Some(
            attr.type_code
                .logical_type()
                .ok_or_else(|| Error::unsupported_type(attribute, format!("{:?}", attr.type_code))),
        )
    }
}

/// Resolves attributes of any entity through the strategy owning it.
pub struct AttributeResolver<'a> {
    schema: SchemaTypeResolver<'a>,
    metadata: MetadataTypeResolver<'a>,
    cache: RefCell<HashMap<(String, String), ResolvedAttribute>>,
}

impl<'a> AttributeResolver<'a> {
    pub fn new(schemas: &'a SchemaRegistry, metadata: &'a dyn MetadataProvider) -> Self {
        Self {
            schema: SchemaTypeResolver::new(schemas),
            metadata: MetadataTypeResolver::new(metadata),
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn from_context(ctx: &QueryContext<'a>) -> Self {
        Self::new(ctx.schemas, ctx.metadata)
    }

    fn strategy(&self, entity: &str) -> Option<&dyn TypeResolver> {
        if self.schema.knows_entity(entity) {
            Some(&self.schema)
        } else if self.metadata.knows_entity(entity) {
            Some(&self.metadata)
        } else {
            None
        }
    }

    /// Returns true if some strategy knows the entity.
    pub fn knows_entity(&self, entity: &str) -> bool {
        self.strategy(entity).is_some()
    }

    /// Primary id attribute of an entity.
    pub fn primary_id(&self, entity: &str) -> Result<String> {
        self.strategy(entity)
            .and_then(|s| s.primary_id(entity))
            .ok_or_else(|| Error::unknown_entity(entity))
    }

    /// Resolves an attribute of an entity.
    pub fn resolve(&self, entity: &str, attribute: &str) -> Result<ResolvedAttribute> {
        let key = (entity.to_string(), attribute.to_string());
        if let Some(hit) = self.cache.borrow().get(&key) {
            return Ok(hit.clone());
        }
        let resolved = self.resolve_uncached(entity, attribute)?;
        self.cache.borrow_mut().insert(key, resolved.clone());
        Ok(resolved)
    }

    fn resolve_uncached(&self, entity: &str, attribute: &str) -> Result<ResolvedAttribute> {
        let strategy = self
            .strategy(entity)
            .ok_or_else(|| Error::unknown_entity(entity))?;

        if let Some(attribute_type) = strategy.attribute_type(entity, attribute) {
            return Ok(ResolvedAttribute {
                entity: entity.to_string(),
                attribute: attribute.to_string(),
                attribute_type: attribute_type?,
                lookup: AttributeLookup::Direct,
            });
        }

        if let Some(base) = attribute.strip_suffix(REFERENCE_NAME_SUFFIX) {
            if !base.is_empty()
                && matches!(
                    strategy.attribute_type(entity, base),
                    Some(Ok(AttributeType::Reference))
                )
            {
                return Ok(ResolvedAttribute {
                    entity: entity.to_string(),
                    attribute: attribute.to_string(),
                    attribute_type: AttributeType::String,
                    lookup: AttributeLookup::ReferenceName {
                        base: base.to_string(),
                    },
                });
            }
        }

        Err(Error::unknown_attribute(entity, attribute))
    }
}
