//! Query engine facade.

use crate::config::EngineConfig;
use chrono::{DateTime, Utc};
use fetchkit_core::Result;
use fetchkit_query::ast::QueryDescription;
use fetchkit_query::context::{Clock, FixedClock, QueryContext, SystemClock};
use fetchkit_query::executor::{QueryResult, QueryRunner};
use fetchkit_query::metadata::{InMemoryMetadata, MetadataProvider, SchemaRegistry};
use fetchkit_query::store::{InMemoryStore, RecordStore};
use tracing::debug;

/// Evaluates queries against a record store.
///
/// The engine owns its store, metadata and declared schemas. Executions
/// only read them, so one engine serves any number of queries; each
/// execution samples the clock once.
pub struct QueryEngine<S = InMemoryStore, M = InMemoryMetadata> {
    store: S,
    metadata: M,
    schemas: SchemaRegistry,
    config: EngineConfig,
    clock: Option<Box<dyn Clock>>,
}

impl<S: RecordStore, M: MetadataProvider> QueryEngine<S, M> {
    pub fn new(store: S, metadata: M) -> Self {
        Self {
            store,
            metadata,
            schemas: SchemaRegistry::new(),
            config: EngineConfig::default(),
            clock: None,
        }
    }

    pub fn with_schemas(mut self, schemas: SchemaRegistry) -> Self {
        self.schemas = schemas;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses `clock` for the current instant. Takes precedence over
    /// [`EngineConfig::fixed_now`].
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn metadata(&self) -> &M {
        &self.metadata
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn now(&self) -> DateTime<Utc> {
        match (&self.clock, self.config.fixed_now) {
            (Some(clock), _) => clock.now(),
            (None, Some(now)) => now,
            (None, None) => SystemClock.now(),
        }
    }

    /// Executes a structured query.
    pub fn execute(&self, query: &QueryDescription) -> Result<QueryResult> {
        self.config.validate()?;
        let clock = FixedClock(self.now());
        debug!(entity = %query.entity, now = %clock.0, "executing query");
        let ctx = QueryContext::new(&self.store, &self.metadata, &self.schemas, &clock)
            .with_caller(self.config.caller)
            .with_default_page_size(self.config.default_page_size);
        QueryRunner::new(ctx).run(query)
    }

    /// Translates and executes a FetchXML query.
    pub fn execute_fetchxml(&self, xml: &str) -> Result<QueryResult> {
        let query = fetchkit_fetchxml::translate(xml)?;
        self.execute(&query)
    }
}

impl<S, M> core::fmt::Debug for QueryEngine<S, M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("QueryEngine")
            .field("config", &self.config)
            .field("custom_clock", &self.clock.is_some())
            .finish_non_exhaustive()
    }
}
