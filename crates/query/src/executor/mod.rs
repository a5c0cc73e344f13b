//! Query executor module.

mod aggregate;
mod distinct;
mod filter;
pub mod join;
mod limit;
mod project;
mod relation;
mod runner;
mod scan;
mod sort;

pub use aggregate::{AggregateColumn, AggregateExecutor, AggregateKind};
pub use distinct::DistinctExecutor;
pub use filter::FilterExecutor;
pub use join::{ExistsJoin, HashJoin};
pub use limit::LimitExecutor;
pub use project::{ProjectColumn, ProjectExecutor, Selection};
pub use relation::Relation;
pub use runner::{QueryResult, QueryRunner};
pub use scan::TableScanExecutor;
pub use sort::{SortExecutor, SortKey};
