//! Query descriptions.

use crate::ast::{ConditionNode, FilterNode, LinkDescriptor};

/// Sort direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// An ordering on one attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderBy {
    pub attribute: String,
    /// Link alias owning the attribute; `None` for the root entity.
    pub entity_alias: Option<String>,
    pub order: SortOrder,
}

impl OrderBy {
    pub fn asc(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            entity_alias: None,
            order: SortOrder::Asc,
        }
    }

    pub fn desc(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            entity_alias: None,
            order: SortOrder::Desc,
        }
    }

    /// Qualifies the attribute with a link alias, builder style.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.entity_alias = Some(alias.into());
        self
    }
}

/// Aggregate function of an aggregate column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AggregateFunc {
    /// Number of rows.
    Count,
    /// Number of rows with a non-null value.
    CountColumn,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunc {
    pub fn fetch_name(&self) -> &'static str {
        match self {
            AggregateFunc::Count => "count",
            AggregateFunc::CountColumn => "countcolumn",
            AggregateFunc::Sum => "sum",
            AggregateFunc::Avg => "avg",
            AggregateFunc::Min => "min",
            AggregateFunc::Max => "max",
        }
    }

    pub fn from_fetch_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "count" => Some(AggregateFunc::Count),
            "countcolumn" => Some(AggregateFunc::CountColumn),
            "sum" => Some(AggregateFunc::Sum),
            "avg" => Some(AggregateFunc::Avg),
            "min" => Some(AggregateFunc::Min),
            "max" => Some(AggregateFunc::Max),
            _ => None,
        }
    }
}

/// Date component used to group a date attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DateGrouping {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl DateGrouping {
    pub fn fetch_name(&self) -> &'static str {
        match self {
            DateGrouping::Day => "day",
            DateGrouping::Week => "week",
            DateGrouping::Month => "month",
            DateGrouping::Quarter => "quarter",
            DateGrouping::Year => "year",
        }
    }

    pub fn from_fetch_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "day" => Some(DateGrouping::Day),
            "week" => Some(DateGrouping::Week),
            "month" => Some(DateGrouping::Month),
            "quarter" => Some(DateGrouping::Quarter),
            "year" => Some(DateGrouping::Year),
            _ => None,
        }
    }
}

/// A projected attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub alias: Option<String>,
    pub aggregate: Option<AggregateFunc>,
    pub group_by: bool,
    pub date_grouping: Option<DateGrouping>,
    /// Distinct flag of an aggregate (`countcolumn` of distinct values).
    pub distinct: bool,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            aggregate: None,
            group_by: false,
            date_grouping: None,
            distinct: false,
        }
    }

    /// An aggregate column, named by `alias` in results.
    pub fn aggregate(name: impl Into<String>, func: AggregateFunc, alias: impl Into<String>) -> Self {
        Self {
            aggregate: Some(func),
            alias: Some(alias.into()),
            ..Self::new(name)
        }
    }

    /// A group-by column, named by `alias` in results.
    pub fn group_by(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            group_by: true,
            alias: Some(alias.into()),
            ..Self::new(name)
        }
    }

    pub fn with_date_grouping(mut self, grouping: DateGrouping) -> Self {
        self.date_grouping = Some(grouping);
        self
    }

    pub fn with_distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }
}

/// Projection of an entity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ColumnSet {
    /// Every attribute.
    All,
    /// The listed attributes.
    Columns(Vec<Column>),
    /// No attributes; only record identity.
    #[default]
    None,
}

impl ColumnSet {
    /// Creates an explicit column set from attribute names.
    pub fn columns<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ColumnSet::Columns(names.into_iter().map(Column::new).collect())
    }

    /// Returns explicit columns, empty for `All` and `None`.
    pub fn explicit(&self) -> &[Column] {
        match self {
            ColumnSet::Columns(columns) => columns,
            _ => &[],
        }
    }
}

/// Paging request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Paging {
    /// Page size.
    pub count: Option<usize>,
    /// One-based page number.
    pub page: Option<usize>,
    /// Report the number of records before paging.
    pub return_total_count: bool,
}

impl Paging {
    pub fn is_requested(&self) -> bool {
        self.count.is_some() || self.page.is_some()
    }
}

/// A structured query against one root entity.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryDescription {
    pub entity: String,
    pub columns: ColumnSet,
    pub criteria: FilterNode,
    pub orders: Vec<OrderBy>,
    pub paging: Paging,
    pub distinct: bool,
    pub top: Option<usize>,
    pub links: Vec<LinkDescriptor>,
    /// Aggregate query: columns carry aggregate or group-by markers.
    pub aggregate: bool,
}

impl QueryDescription {
    /// Creates a query returning every attribute of `entity`.
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            columns: ColumnSet::All,
            criteria: FilterNode::and(),
            orders: Vec::new(),
            paging: Paging::default(),
            distinct: false,
            top: None,
            links: Vec::new(),
            aggregate: false,
        }
    }

    pub fn with_columns(mut self, columns: ColumnSet) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_criteria(mut self, criteria: FilterNode) -> Self {
        self.criteria = criteria;
        self
    }

    /// Adds a condition to the top-level filter.
    pub fn with_condition(mut self, condition: ConditionNode) -> Self {
        self.criteria.conditions.push(condition);
        self
    }

    pub fn with_order(mut self, order: OrderBy) -> Self {
        self.orders.push(order);
        self
    }

    pub fn with_link(mut self, link: LinkDescriptor) -> Self {
        self.links.push(link);
        self
    }

    pub fn with_top(mut self, top: usize) -> Self {
        self.top = Some(top);
        self
    }

    pub fn with_distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    pub fn with_paging(mut self, paging: Paging) -> Self {
        self.paging = paging;
        self
    }

    pub fn with_aggregate(mut self, aggregate: bool) -> Self {
        self.aggregate = aggregate;
        self
    }
}
