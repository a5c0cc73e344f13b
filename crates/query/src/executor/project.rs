//! Project executor.

use crate::executor::Relation;
use fetchkit_core::{AliasedValue, Record, Value, ALIAS_SEPARATOR};

/// A projected attribute, optionally renamed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectColumn {
    pub attribute: String,
    pub alias: Option<String>,
}

impl ProjectColumn {
    pub fn new(attribute: impl Into<String>, alias: Option<String>) -> Self {
        Self {
            attribute: attribute.into(),
            alias,
        }
    }
}

/// Attributes kept from one source of a joined record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    All,
    Columns(Vec<ProjectColumn>),
    None,
}

/// Project executor - narrows records to the requested attributes.
///
/// The root selection reads unprefixed attributes; each link selection
/// reads the attributes merged under its alias. Renamed root attributes are
/// wrapped in `Value::Aliased` so the source attribute stays known.
pub struct ProjectExecutor {
    entity: String,
    primary_id: String,
    root: Selection,
    links: Vec<(String, Selection)>,
}

impl ProjectExecutor {
    /// Creates a new project executor.
    pub fn new(entity: impl Into<String>, primary_id: impl Into<String>, root: Selection) -> Self {
        Self {
            entity: entity.into(),
            primary_id: primary_id.into(),
            root,
            links: Vec::new(),
        }
    }

    /// Adds the selection of a link alias.
    pub fn with_link(mut self, alias: impl Into<String>, selection: Selection) -> Self {
        self.links.push((alias.into(), selection));
        self
    }

    /// Executes the projection on the input relation.
    pub fn execute(&self, input: Relation) -> Relation {
        let records = input.iter().map(|record| self.project(record)).collect();
        input.with_records(records)
    }

    fn project(&self, record: &Record) -> Record {
        let mut out = Record::new(record.entity(), record.id());
        match &self.root {
            Selection::All => {
                for (name, value) in record.attributes() {
                    if !name.contains(ALIAS_SEPARATOR) {
                        out.set(name.as_str(), value.clone());
                    }
                }
            }
            Selection::Columns(columns) => {
                for column in columns {
                    let Some(value) = record.get(&column.attribute) else {
                        continue;
                    };
                    match &column.alias {
                        Some(alias) => {
                            let aliased =
                                AliasedValue::new(self.entity.as_str(), column.attribute.as_str(), value.clone());
                            out.set(alias.as_str(), Value::Aliased(aliased));
                        }
                        None => {
                            out.set(column.attribute.as_str(), value.clone());
                        }
                    }
                }
            }
            Selection::None => {
                if let Some(id) = record.get(&self.primary_id) {
                    out.set(self.primary_id.as_str(), id.clone());
                }
            }
        }

        for (alias, selection) in &self.links {
            self.project_link(record, alias, selection, &mut out);
        }
        out
    }

    fn project_link(&self, record: &Record, alias: &str, selection: &Selection, out: &mut Record) {
        match selection {
            Selection::All => {
                let prefix = format!("{alias}{ALIAS_SEPARATOR}");
                for (name, value) in record.attributes() {
                    let Some(rest) = name.strip_prefix(&prefix) else {
                        continue;
                    };
                    if !rest.contains(ALIAS_SEPARATOR) {
                        out.set(name.as_str(), value.clone());
                    }
                }
            }
            Selection::Columns(columns) => {
                for column in columns {
                    let key = format!("{alias}{ALIAS_SEPARATOR}{}", column.attribute);
                    if let Some(value) = record.get(&key) {
                        let output = column.alias.clone().unwrap_or(key);
                        out.set(output, value.clone());
                    }
                }
            }
            Selection::None => {}
        }
    }
}
