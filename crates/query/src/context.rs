//! Execution context for query execution.

use crate::metadata::{MetadataProvider, SchemaRegistry};
use crate::store::RecordStore;
use chrono::{DateTime, Utc};
use fetchkit_core::Uuid;
use serde::{Deserialize, Serialize};

/// Page size used when a page number is requested without a page size.
pub const DEFAULT_PAGE_SIZE: usize = 5000;

/// Identity of the user executing a query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerContext {
    pub user_id: Uuid,
    pub business_unit_id: Uuid,
}

impl CallerContext {
    pub fn new(user_id: Uuid, business_unit_id: Uuid) -> Self {
        Self {
            user_id,
            business_unit_id,
        }
    }
}

/// Source of the current instant.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at one instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Everything one query execution reads from.
///
/// `now` is sampled once so every relative date operator of a query sees
/// the same instant.
#[derive(Clone, Copy)]
pub struct QueryContext<'a> {
    pub store: &'a dyn RecordStore,
    pub metadata: &'a dyn MetadataProvider,
    pub schemas: &'a SchemaRegistry,
    pub caller: CallerContext,
    pub now: DateTime<Utc>,
    pub default_page_size: usize,
}

impl<'a> QueryContext<'a> {
    /// Creates a context sampling `clock` once.
    pub fn new(
        store: &'a dyn RecordStore,
        metadata: &'a dyn MetadataProvider,
        schemas: &'a SchemaRegistry,
        clock: &dyn Clock,
    ) -> Self {
        Self {
            store,
            metadata,
            schemas,
            caller: CallerContext::default(),
            now: clock.now(),
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_caller(mut self, caller: CallerContext) -> Self {
        self.caller = caller;
        self
    }

    pub fn with_default_page_size(mut self, size: usize) -> Self {
        self.default_page_size = size;
        self
    }
}

impl core::fmt::Debug for QueryContext<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("QueryContext")
            .field("caller", &self.caller)
            .field("now", &self.now)
            .field("default_page_size", &self.default_page_size)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::InMemoryMetadata;
    use crate::store::InMemoryStore;
    use chrono::TimeZone;

    #[test]
    fn test_context_samples_clock_once() {
        let store = InMemoryStore::new();
        let metadata = InMemoryMetadata::new();
        let schemas = SchemaRegistry::new();
        let instant = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let ctx = QueryContext::new(&store, &metadata, &schemas, &FixedClock(instant));
        assert_eq!(ctx.now, instant);
        assert_eq!(ctx.default_page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(ctx.caller, CallerContext::default());
    }
}
