//! Injected entity metadata.

use crate::record::primary_id_attribute;
use crate::types::AttributeTypeCode;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// Metadata of a single attribute.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeMetadata {
    /// Attribute logical name.
    pub logical_name: String,
    /// Metadata category.
    pub type_code: AttributeTypeCode,
    /// Target entities of a lookup attribute.
    #[serde(default)]
    pub targets: Vec<String>,
}

impl AttributeMetadata {
    pub fn new(logical_name: impl Into<String>, type_code: AttributeTypeCode) -> Self {
        Self {
            logical_name: logical_name.into(),
            type_code,
            targets: Vec::new(),
        }
    }

    /// Creates lookup metadata pointing at the given entities.
    pub fn lookup(logical_name: impl Into<String>, targets: &[&str]) -> Self {
        Self {
            logical_name: logical_name.into(),
            type_code: AttributeTypeCode::Lookup,
            targets: targets.iter().map(|t| (*t).to_string()).collect(),
        }
    }
}

/// Metadata of an entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMetadata {
    /// Entity logical name.
    pub logical_name: String,
    /// Primary id attribute name.
    pub primary_id_attribute: String,
    /// Attributes keyed by logical name.
    #[serde(default)]
    pub attributes: HashMap<String, AttributeMetadata>,
}

impl EntityMetadata {
    /// Creates metadata with a `<entity>id` primary key attribute.
    pub fn new(logical_name: impl Into<String>) -> Self {
        let logical_name = logical_name.into();
        let primary_id = primary_id_attribute(&logical_name);
        let mut attributes = HashMap::new();
        attributes.insert(
            primary_id.clone(),
            AttributeMetadata::new(primary_id.clone(), AttributeTypeCode::Uniqueidentifier),
        );
        Self {
            logical_name,
            primary_id_attribute: primary_id,
            attributes,
        }
    }

    /// Adds an attribute, builder style.
    pub fn with_attribute(mut self, attribute: AttributeMetadata) -> Self {
        self.attributes.insert(attribute.logical_name.clone(), attribute);
        self
    }

    /// Adds an attribute of the given category, builder style.
    pub fn with(self, logical_name: impl Into<String>, type_code: AttributeTypeCode) -> Self {
        self.with_attribute(AttributeMetadata::new(logical_name, type_code))
    }

    /// Gets attribute metadata.
    pub fn attribute(&self, logical_name: &str) -> Option<&AttributeMetadata> {
        self.attributes.get(logical_name)
    }
}
