//! Record structure for fetchkit.
//!
//! A `Record` is one entity instance: a logical type name, an id and an
//! attribute bag. Records produced by joins additionally carry attributes
//! keyed `alias.attribute` holding `Value::Aliased` values.

use crate::value::{AliasedValue, Value};
use hashbrown::HashMap;
use uuid::Uuid;

/// Separator between a link alias and an attribute name.
pub const ALIAS_SEPARATOR: char = '.';

/// Returns the conventional primary id attribute name of an entity.
pub fn primary_id_attribute(entity: &str) -> String {
    format!("{entity}id")
}

/// An entity instance.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    /// Logical name of the entity.
    entity: String,
    /// Unique identifier.
    id: Uuid,
    /// Attribute values keyed by attribute name.
    attributes: HashMap<String, Value>,
}

impl Record {
    /// Creates an empty record.
    pub fn new(entity: impl Into<String>, id: Uuid) -> Self {
        Self {
            entity: entity.into(),
            id,
            attributes: HashMap::new(),
        }
    }

    /// Adds an attribute, builder style.
    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(attribute.into(), value.into());
        self
    }

    /// Returns the entity logical name.
    #[inline]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Returns the record id.
    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Gets an attribute value.
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }

    /// Gets an attribute value with any alias wrapper removed.
    pub fn get_unwrapped(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute).map(Value::unwrap_aliased)
    }

    /// Returns true if the attribute is present (even if Null).
    pub fn contains(&self, attribute: &str) -> bool {
        self.attributes.contains_key(attribute)
    }

    /// Sets an attribute value, returning the previous one.
    pub fn set(&mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.attributes.insert(attribute.into(), value.into())
    }

    /// Removes an attribute.
    pub fn remove(&mut self, attribute: &str) -> Option<Value> {
        self.attributes.remove(attribute)
    }

    /// Returns the attribute map.
    #[inline]
    pub fn attributes(&self) -> &HashMap<String, Value> {
        &self.attributes
    }

    /// Returns attribute names in sorted order.
    pub fn attribute_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.attributes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of attributes.
    #[inline]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Returns true if the record has no attributes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Copies every attribute of `other` into this record under `alias.`.
    ///
    /// Values are wrapped in `Value::Aliased` so callers can tell them apart
    /// from the record's own attributes.
    pub fn merge_aliased(&mut self, alias: &str, other: &Record) {
        for (name, value) in &other.attributes {
            if name.contains(ALIAS_SEPARATOR) {
                continue;
            }
            let key = format!("{alias}{ALIAS_SEPARATOR}{name}");
            let aliased = AliasedValue::new(alias, name.as_str(), value.unwrap_aliased().clone());
            self.attributes.insert(key, Value::Aliased(aliased));
        }
    }

    /// Keeps only attributes accepted by `keep`.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str, &Value) -> bool,
    {
        self.attributes.retain(|k, v| keep(k.as_str(), v));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_new() {
        let id = Uuid::new_v4();
        let record = Record::new("account", id).with("name", "Alice");
        assert_eq!(record.id(), id);
        assert_eq!(record.entity(), "account");
        assert_eq!(record.len(), 1);
        assert!(!record.is_empty());
    }

    #[test]
    fn test_record_set_and_remove() {
        let mut record = Record::new("account", Uuid::new_v4());
        assert_eq!(record.set("name", "A"), None);
        assert_eq!(record.set("name", "B"), Some(Value::String("A".into())));
        assert_eq!(record.remove("name"), Some(Value::String("B".into())));
        assert!(!record.contains("name"));
    }

    #[test]
    fn test_merge_aliased() {
        let mut account = Record::new("account", Uuid::new_v4()).with("name", "Contoso");
        let contact = Record::new("contact", Uuid::new_v4()).with("fullname", "Jane");
        account.merge_aliased("c", &contact);

        match account.get("c.fullname") {
            Some(Value::Aliased(a)) => {
                assert_eq!(a.alias, "c");
                assert_eq!(a.attribute, "fullname");
                assert_eq!(*a.value, Value::String("Jane".into()));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(account.get_unwrapped("c.fullname"), Some(&Value::String("Jane".into())));
    }

    #[test]
    fn test_merge_skips_nested_alias_keys() {
        let mut account = Record::new("account", Uuid::new_v4());
        let contact = Record::new("contact", Uuid::new_v4()).with("x.name", "nested");
        account.merge_aliased("c", &contact);
        assert!(account.is_empty());
    }

    #[test]
    fn test_attribute_names_sorted() {
        let record = Record::new("account", Uuid::new_v4()).with("b", 1i64).with("a", 2i64);
        assert_eq!(record.attribute_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_primary_id_attribute() {
        assert_eq!(primary_id_attribute("account"), "accountid");
    }
}
