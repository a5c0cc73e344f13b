//! Fetchkit Core - Core types shared by the fetchkit query engine.
//!
//! This crate provides the foundational types for evaluating record-store
//! queries in memory:
//!
//! - `Value`: Attribute values stored on records (strings, numbers, references, option sets, ...)
//! - `Record`: A typed, identified attribute bag
//! - `AttributeType` / `AttributeTypeCode`: Logical attribute types and metadata categories
//! - `schema`: Declared entity schemas and injected entity metadata
//! - `pattern_match`: Case-insensitive LIKE matching
//! - `Error`: The error taxonomy shared by every fetchkit crate
//!
//! # Example
//!
//! ```rust
//! use fetchkit_core::{Record, Uuid, Value};
//!
//! let id = Uuid::new_v4();
//! let record = Record::new("account", id)
//!     .with("name", "Contoso")
//!     .with("statecode", Value::OptionSet(0));
//!
//! assert_eq!(record.entity(), "account");
//! assert_eq!(record.get("name"), Some(&Value::String("Contoso".into())));
//! ```

mod error;
pub mod pattern_match;
mod record;
pub mod schema;
mod types;
mod value;

pub use error::{Error, Result};
pub use record::{primary_id_attribute, Record, ALIAS_SEPARATOR};
pub use types::{AttributeType, AttributeTypeCode, DeclaredType};
pub use value::{AliasedValue, EntityReference, Value};

pub use chrono;
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
