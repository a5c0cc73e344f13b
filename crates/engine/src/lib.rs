//! Fetchkit Engine - in-memory evaluation of FetchXML and structured queries.
//!
//! [`QueryEngine`] owns a record store and entity metadata and executes
//! either a [`QueryDescription`] or FetchXML text against them. The
//! pipeline itself lives in `fetchkit-query`; FetchXML translation lives in
//! `fetchkit-fetchxml`.
//!
//! # Example
//!
//! ```
//! use fetchkit_engine::{EngineConfig, QueryEngine};
//! use fetchkit_core::schema::EntityMetadata;
//! use fetchkit_core::{AttributeTypeCode, Record, Uuid, Value};
//! use fetchkit_query::{InMemoryMetadata, InMemoryStore};
//!
//! let metadata = InMemoryMetadata::new().with_entity(
//!     EntityMetadata::new("account")
//!         .with("name", AttributeTypeCode::String)
//!         .with("statecode", AttributeTypeCode::State),
//! );
//! let store = InMemoryStore::new()
//!     .with(Record::new("account", Uuid::new_v4()).with("name", "Contoso Ltd").with("statecode", Value::OptionSet(0)))
//!     .with(Record::new("account", Uuid::new_v4()).with("name", "Contoso Old").with("statecode", Value::OptionSet(1)));
//! let engine = QueryEngine::new(store, metadata).with_config(EngineConfig::default());
//!
//! let result = engine
//!     .execute_fetchxml(
//!         r#"<fetch>
//!             <entity name="account">
//!                 <attribute name="name"/>
//!                 <filter>
//!                     <condition attribute="statecode" operator="eq" value="0"/>
//!                     <condition attribute="name" operator="like" value="%contoso%"/>
//!                 </filter>
//!             </entity>
//!         </fetch>"#,
//!     )
//!     .unwrap();
//! assert_eq!(result.len(), 1);
//! ```

mod config;
mod engine;

pub use config::EngineConfig;
pub use engine::QueryEngine;

pub use fetchkit_core::{Error, Record, Result, Value};
pub use fetchkit_fetchxml::render as render_fetchxml;
pub use fetchkit_query::ast::QueryDescription;
pub use fetchkit_query::context::{CallerContext, Clock, FixedClock, SystemClock};
pub use fetchkit_query::executor::QueryResult;
pub use fetchkit_query::metadata::{InMemoryMetadata, MetadataProvider, SchemaRegistry};
pub use fetchkit_query::store::{InMemoryStore, RecordStore};

/// Translates FetchXML into a [`QueryDescription`] without executing it.
pub fn translate_fetchxml_to_query_description(xml: &str) -> Result<QueryDescription> {
    fetchkit_fetchxml::translate(xml)
}
