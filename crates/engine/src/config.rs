//! Engine configuration.

use chrono::{DateTime, Utc};
use fetchkit_core::{Error, Result};
use fetchkit_query::context::{CallerContext, DEFAULT_PAGE_SIZE};
use serde::{Deserialize, Serialize};

/// Settings applied to every query an engine executes.
///
/// Missing fields take their defaults when deserialized, so `{}` is a valid
/// configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Identity used by the `eq-userid` / `eq-businessid` operator family.
    pub caller: CallerContext,
    /// Freezes the clock for relative date operators.
    pub fixed_now: Option<DateTime<Utc>>,
    /// Page size when a page number is requested without a count.
    pub default_page_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            caller: CallerContext::default(),
            fixed_now: None,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl EngineConfig {
    pub fn with_caller(mut self, caller: CallerContext) -> Self {
        self.caller = caller;
        self
    }

    pub fn with_fixed_now(mut self, now: DateTime<Utc>) -> Self {
        self.fixed_now = Some(now);
        self
    }

    pub fn with_default_page_size(mut self, size: usize) -> Self {
        self.default_page_size = size;
        self
    }

    /// Checks the settings for consistency.
    pub fn validate(&self) -> Result<()> {
        if self.default_page_size == 0 {
            return Err(Error::configuration("default_page_size must be at least 1"));
        }
        Ok(())
    }
}
