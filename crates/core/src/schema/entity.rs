//! Declared entity schema.

use crate::error::{Error, Result};
use crate::record::primary_id_attribute;
use crate::types::DeclaredType;

/// A declared attribute of an entity schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaAttribute {
    name: String,
    declared: DeclaredType,
}

impl SchemaAttribute {
    pub fn new(name: impl Into<String>, declared: DeclaredType) -> Self {
        Self {
            name: name.into(),
            declared,
        }
    }

    /// Returns the attribute name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared type.
    #[inline]
    pub fn declared(&self) -> &DeclaredType {
        &self.declared
    }
}

/// A declared entity: its logical name, primary id attribute and fields.
#[derive(Clone, Debug)]
pub struct EntitySchema {
    name: String,
    primary_id: String,
    attributes: Vec<SchemaAttribute>,
}

impl EntitySchema {
    /// Returns the entity logical name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the primary id attribute name.
    #[inline]
    pub fn primary_id(&self) -> &str {
        &self.primary_id
    }

    /// Returns the declared attributes.
    #[inline]
    pub fn attributes(&self) -> &[SchemaAttribute] {
        &self.attributes
    }

    /// Gets an attribute by name.
    pub fn get_attribute(&self, name: &str) -> Option<&SchemaAttribute> {
        self.attributes.iter().find(|a| a.name() == name)
    }
}

/// Builder for declared entity schemas.
pub struct EntitySchemaBuilder {
    name: String,
    primary_id: Option<String>,
    attributes: Vec<SchemaAttribute>,
}

impl EntitySchemaBuilder {
    /// Creates a new schema builder.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        Self::check_naming_rules(&name)?;
        Ok(Self {
            name,
            primary_id: None,
            attributes: Vec::new(),
        })
    }

    /// Validates a name follows naming rules.
    fn check_naming_rules(name: &str) -> Result<()> {
        let mut chars = name.chars();
        let first = match chars.next() {
            Some(c) => c,
            None => return Err(Error::validation("Name cannot be empty")),
        };
        if !first.is_ascii_alphabetic() && first != '_' {
            return Err(Error::validation(format!(
                "Name must start with letter or underscore: {name}"
            )));
        }
        if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::validation(format!("Name contains invalid characters: {name}")));
        }
        Ok(())
    }

    /// Adds an attribute.
    pub fn attribute(mut self, name: impl Into<String>, declared: DeclaredType) -> Result<Self> {
        let name = name.into();
        Self::check_naming_rules(&name)?;
        if self.attributes.iter().any(|a| a.name() == name) {
            return Err(Error::validation(format!("Attribute already exists: {name}")));
        }
        self.attributes.push(SchemaAttribute::new(name, declared));
        Ok(self)
    }

    /// Overrides the primary id attribute (defaults to `<entity>id`).
    pub fn primary_id(mut self, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        Self::check_naming_rules(&name)?;
        self.primary_id = Some(name);
        Ok(self)
    }

    /// Builds the schema. The primary id attribute is always declared as a Guid.
    pub fn build(self) -> EntitySchema {
        let primary_id = self
            .primary_id
            .unwrap_or_else(|| primary_id_attribute(&self.name));
        let mut attributes = self.attributes;
        if !attributes.iter().any(|a| a.name() == primary_id) {
            attributes.push(SchemaAttribute::new(primary_id.clone(), DeclaredType::Guid));
        }
        EntitySchema {
            name: self.name,
            primary_id,
            attributes,
        }
    }
}
