//! Schema module for fetchkit.
//!
//! Entities can be described two ways: a declared `EntitySchema` (field names
//! and their declared Rust-side types), or injected `EntityMetadata` (attribute
//! metadata categories as a record-store service reports them).

mod entity;
mod metadata;

pub use entity::{EntitySchema, EntitySchemaBuilder, SchemaAttribute};
pub use metadata::{AttributeMetadata, EntityMetadata};
