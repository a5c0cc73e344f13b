//! Link (join) descriptors.

use crate::ast::{ColumnSet, FilterNode, OrderBy};

/// Join semantics of a link.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum JoinKind {
    /// Rows without a match are dropped; one output row per match.
    #[default]
    Inner,
    /// Rows without a match are kept with the link's attributes absent.
    LeftOuter,
    /// Keep rows having at least one matching target row.
    Any,
    /// Keep rows having no matching target row.
    NotAny,
    /// Keep rows whose correlated target rows all match.
    All,
    /// Keep rows with at least one correlated target row that does not match.
    NotAll,
}

impl JoinKind {
    /// Existential kinds filter the parent and contribute no columns.
    pub fn is_existential(&self) -> bool {
        matches!(
            self,
            JoinKind::Any | JoinKind::NotAny | JoinKind::All | JoinKind::NotAll
        )
    }

    /// FetchXML `link-type` spelling.
    pub fn fetch_name(&self) -> &'static str {
        match self {
            JoinKind::Inner => "inner",
            JoinKind::LeftOuter => "outer",
            JoinKind::Any => "any",
            JoinKind::NotAny => "not any",
            JoinKind::All => "all",
            JoinKind::NotAll => "not all",
        }
    }

    /// Parses a FetchXML `link-type` value (case-insensitive).
    pub fn from_fetch_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "inner" => Some(JoinKind::Inner),
            "outer" => Some(JoinKind::LeftOuter),
            "any" | "exists" | "in" => Some(JoinKind::Any),
            "not any" => Some(JoinKind::NotAny),
            "all" => Some(JoinKind::All),
            "not all" => Some(JoinKind::NotAll),
            _ => None,
        }
    }
}

/// A link from a parent entity to a target entity.
///
/// `from_attribute` lives on the parent, `to_attribute` on the target.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkDescriptor {
    pub from_attribute: String,
    pub to_entity: String,
    pub to_attribute: String,
    pub kind: JoinKind,
    /// `None` until an alias is allocated.
    pub alias: Option<String>,
    pub columns: ColumnSet,
    pub filter: FilterNode,
    /// Orders on the target's attributes.
    pub orders: Vec<OrderBy>,
    pub links: Vec<LinkDescriptor>,
}

impl LinkDescriptor {
    /// Creates an inner link with no columns.
    pub fn new(
        from_attribute: impl Into<String>,
        to_entity: impl Into<String>,
        to_attribute: impl Into<String>,
    ) -> Self {
        Self {
            from_attribute: from_attribute.into(),
            to_entity: to_entity.into(),
            to_attribute: to_attribute.into(),
            kind: JoinKind::Inner,
            alias: None,
            columns: ColumnSet::None,
            filter: FilterNode::and(),
            orders: Vec::new(),
            links: Vec::new(),
        }
    }

    /// Sets the join kind, builder style.
    pub fn with_kind(mut self, kind: JoinKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the alias, builder style.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Sets the projected columns, builder style.
    pub fn with_columns(mut self, columns: ColumnSet) -> Self {
        self.columns = columns;
        self
    }

    /// Sets the link filter, builder style.
    pub fn with_filter(mut self, filter: FilterNode) -> Self {
        self.filter = filter;
        self
    }

    /// Adds an order, builder style.
    pub fn with_order(mut self, order: OrderBy) -> Self {
        self.orders.push(order);
        self
    }

    /// Adds a nested link, builder style.
    pub fn with_link(mut self, link: LinkDescriptor) -> Self {
        self.links.push(link);
        self
    }
}
