//! Filter trees.

use crate::ast::ConditionOperator;
use fetchkit_core::Value;

/// Logical combinator of a filter node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

impl LogicalOperator {
    /// FetchXML spelling.
    pub fn fetch_name(&self) -> &'static str {
        match self {
            LogicalOperator::And => "and",
            LogicalOperator::Or => "or",
        }
    }

    /// Parses the FetchXML spelling (case-insensitive).
    pub fn from_fetch_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "and" => Some(LogicalOperator::And),
            "or" => Some(LogicalOperator::Or),
            _ => None,
        }
    }
}

/// A single condition.
#[derive(Clone, Debug, PartialEq)]
pub struct ConditionNode {
    /// Attribute the condition tests.
    pub attribute: String,
    /// Alias of the link the attribute belongs to. `None` means the entity
    /// owning the filter.
    pub entity_alias: Option<String>,
    pub operator: ConditionOperator,
    /// Operand values. Textual operands stay strings until compilation.
    pub values: Vec<Value>,
    /// Attribute of the same row to compare against instead of `values`.
    pub compare_column: Option<String>,
    /// Set on conditions contributed by a left outer link; such conditions
    /// no longer restrict the joined row set.
    pub outer: bool,
}

impl ConditionNode {
    /// Creates a condition.
    pub fn new(
        attribute: impl Into<String>,
        operator: ConditionOperator,
        values: Vec<Value>,
    ) -> Self {
        Self {
            attribute: attribute.into(),
            entity_alias: None,
            operator,
            values,
            compare_column: None,
            outer: false,
        }
    }

    /// Creates a condition without operand values.
    pub fn unary(attribute: impl Into<String>, operator: ConditionOperator) -> Self {
        Self::new(attribute, operator, Vec::new())
    }

    /// Creates a condition comparing two attributes of the same row.
    pub fn compare_columns(
        attribute: impl Into<String>,
        operator: ConditionOperator,
        other: impl Into<String>,
    ) -> Self {
        let mut node = Self::unary(attribute, operator);
        node.compare_column = Some(other.into());
        node
    }

    /// Qualifies the attribute with a link alias, builder style.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.entity_alias = Some(alias.into());
        self
    }

    /// Derives a node with the same attribute and alias but a different
    /// operator and operands.
    pub fn derive(&self, operator: ConditionOperator, values: Vec<Value>) -> Self {
        Self {
            attribute: self.attribute.clone(),
            entity_alias: self.entity_alias.clone(),
            operator,
            values,
            compare_column: None,
            outer: self.outer,
        }
    }
}

/// A logical combination of conditions and nested filters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterNode {
    pub operator: LogicalOperator,
    pub conditions: Vec<ConditionNode>,
    pub filters: Vec<FilterNode>,
}

impl FilterNode {
    /// Creates an empty AND filter.
    pub fn and() -> Self {
        Self::default()
    }

    /// Creates an empty OR filter.
    pub fn or() -> Self {
        Self {
            operator: LogicalOperator::Or,
            ..Self::default()
        }
    }

    /// Adds a condition, builder style.
    pub fn with_condition(mut self, condition: ConditionNode) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Adds a nested filter, builder style.
    pub fn with_filter(mut self, filter: FilterNode) -> Self {
        self.filters.push(filter);
        self
    }

    /// Returns true if the filter has no conditions at any depth.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty() && self.filters.iter().all(FilterNode::is_empty)
    }

    /// Returns a copy with every condition at every depth flagged `outer`.
    /// Outer conditions compile to constant true: the left-outer join
    /// has already matched them.
    pub fn relaxed(&self) -> Self {
        Self {
            operator: self.operator,
            conditions: self
                .conditions
                .iter()
                .map(|c| ConditionNode {
                    outer: true,
                    ..c.clone()
                })
                .collect(),
            filters: self.filters.iter().map(FilterNode::relaxed).collect(),
        }
    }
}
