//! Fetchkit Query - query evaluation over an in-memory record store.
//!
//! This crate provides the query pipeline:
//!
//! - `ast`: Structured query description (filters, links, columns, paging)
//! - `resolver`: Attribute type resolution from schemas or metadata
//! - `coercion`: Value coercion to comparable scalars
//! - `temporal`: Calendar and fiscal period arithmetic
//! - `hierarchy`: Ancestor and descendant closure over parent references
//! - `compiler`: Filter compilation into record predicates
//! - `planner`: Link validation and alias allocation
//! - `executor`: Execution operators (scan, join, filter, aggregate, sort, project, limit)
//! - `store`, `metadata`, `context`: Collaborators a query reads from
//!
//! # Example
//!
//! ```
//! use fetchkit_core::schema::EntityMetadata;
//! use fetchkit_core::{AttributeTypeCode, Record, Uuid, Value};
//! use fetchkit_query::ast::{ConditionNode, ConditionOperator, QueryDescription};
//! use fetchkit_query::context::{QueryContext, SystemClock};
//! use fetchkit_query::executor::QueryRunner;
//! use fetchkit_query::metadata::{InMemoryMetadata, SchemaRegistry};
//! use fetchkit_query::store::InMemoryStore;
//!
//! let metadata = InMemoryMetadata::new()
//!     .with_entity(EntityMetadata::new("account").with("name", AttributeTypeCode::String));
//! let store = InMemoryStore::new()
//!     .with(Record::new("account", Uuid::new_v4()).with("name", "Contoso"))
//!     .with(Record::new("account", Uuid::new_v4()).with("name", "Fabrikam"));
//! let schemas = SchemaRegistry::new();
//!
//! let query = QueryDescription::new("account").with_condition(ConditionNode::new(
//!     "name",
//!     ConditionOperator::Equal,
//!     vec![Value::from("contoso")],
//! ));
//! let ctx = QueryContext::new(&store, &metadata, &schemas, &SystemClock);
//! let result = QueryRunner::new(ctx).run(&query).unwrap();
//! assert_eq!(result.len(), 1);
//! ```

pub mod ast;
pub mod coercion;
pub mod compiler;
pub mod context;
pub mod executor;
pub mod hierarchy;
pub mod metadata;
pub mod planner;
pub mod resolver;
pub mod store;
pub mod temporal;

pub use ast::{ColumnSet, ConditionNode, ConditionOperator, FilterNode, JoinKind, LinkDescriptor, QueryDescription};
pub use context::{CallerContext, Clock, FixedClock, QueryContext, SystemClock, DEFAULT_PAGE_SIZE};
pub use executor::{QueryResult, QueryRunner};
pub use metadata::{InMemoryMetadata, MetadataProvider, SchemaRegistry};
pub use store::{InMemoryStore, RecordStore};
pub use temporal::{FiscalPeriodTemplate, FiscalSettings};
