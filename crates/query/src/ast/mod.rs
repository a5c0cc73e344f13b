//! Query description AST.

mod filter;
mod link;
mod operator;
mod query;

pub use filter::{ConditionNode, FilterNode, LogicalOperator};
pub use link::{JoinKind, LinkDescriptor};
pub use operator::{Arity, ConditionOperator};
pub use query::{
    AggregateFunc, Column, ColumnSet, DateGrouping, OrderBy, Paging, QueryDescription, SortOrder,
};
