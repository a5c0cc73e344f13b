//! Fetchkit FetchXML - FetchXML front end for the fetchkit query engine.
//!
//! Translation runs in three steps:
//!
//! - [`parse`]: well-formedness, producing an owned element tree
//! - [`validate`]: element names, placement, required attributes and
//!   enumerated attribute values
//! - [`normalize`]: lowering into a [`QueryDescription`], with link aliases
//!   allocated
//!
//! [`render`] goes the other way and produces FetchXML that translates back
//! into an equivalent query.
//!
//! # Example
//!
//! ```
//! use fetchkit_fetchxml::translate;
//! use fetchkit_query::ast::{ConditionOperator, JoinKind};
//!
//! let query = translate(
//!     r#"<fetch top="10">
//!         <entity name="account">
//!             <attribute name="name"/>
//!             <filter><condition attribute="statecode" operator="eq" value="0"/></filter>
//!             <link-entity name="contact" from="parentcustomerid" to="accountid" link-type="not any"/>
//!         </entity>
//!     </fetch>"#,
//! )
//! .unwrap();
//!
//! assert_eq!(query.top, Some(10));
//! assert_eq!(query.criteria.conditions[0].operator, ConditionOperator::Equal);
//! assert_eq!(query.links[0].kind, JoinKind::NotAny);
//! assert_eq!(query.links[0].alias.as_deref(), Some("contact"));
//! ```

pub mod document;
mod normalize;
mod render;
mod validate;

pub use document::{parse, Document, XmlElement};
pub use normalize::normalize;
pub use render::render;
pub use validate::validate;

use fetchkit_core::Result;
use fetchkit_query::ast::QueryDescription;
use tracing::debug;

/// Translates FetchXML text into a query description.
///
/// Pure: the same text always yields the same description.
pub fn translate(xml: &str) -> Result<QueryDescription> {
    let doc = parse(xml)?;
    validate(&doc)?;
    let query = normalize(&doc)?;
    debug!(
        entity = %query.entity,
        links = query.links.len(),
        aggregate = query.aggregate,
        "fetchxml normalized"
    );
    Ok(query)
}
