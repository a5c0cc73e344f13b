//! Structural validation of FetchXML documents.

use crate::document::{Document, XmlElement};
use fetchkit_core::{Error, Result};
use fetchkit_query::ast::{AggregateFunc, ConditionOperator, DateGrouping, JoinKind, LogicalOperator};

const ELEMENTS: &[&str] = &[
    "fetch",
    "entity",
    "attribute",
    "all-attributes",
    "no-attrs",
    "order",
    "filter",
    "condition",
    "value",
    "link-entity",
];

const ENTITY_CHILDREN: &[&str] = &["attribute", "all-attributes", "no-attrs", "order", "filter", "link-entity"];

/// Checks a parsed document against the supported grammar.
///
/// Unknown element names and misplaced elements fail with a validation
/// error naming the element. Unknown operators fail with an
/// unsupported-operator error.
pub fn validate(doc: &Document) -> Result<()> {
    let fetch = &doc.root;
    if fetch.name != "fetch" {
        return Err(Error::validation(format!(
            "The root element must be 'fetch', found '{}'",
            fetch.name
        )));
    }
    check_children(fetch, &["entity"])?;
    let mut entities = fetch.children_named("entity");
    let entity = match (entities.next(), entities.next()) {
        (Some(entity), None) => entity,
        (None, _) => return Err(Error::validation("The 'fetch' element must contain an 'entity' element")),
        (Some(_), Some(_)) => {
            return Err(Error::validation(
                "The 'fetch' element must contain exactly one 'entity' element",
            ))
        }
    };
    entity.required("name")?;
    validate_entity(entity)
}

/// Validates the children of `entity` or `link-entity`.
fn validate_entity(element: &XmlElement) -> Result<()> {
    check_children(element, ENTITY_CHILDREN)?;
    for child in &element.children {
        match child.name.as_str() {
            "attribute" => {
                check_children(child, &[])?;
                validate_attribute(child)?;
            }
            "all-attributes" | "no-attrs" => check_children(child, &[])?,
            "order" => check_children(child, &[])?,
            "filter" => validate_filter(child)?,
            "link-entity" => validate_link(child)?,
            _ => {}
        }
    }
    Ok(())
}

fn validate_attribute(attribute: &XmlElement) -> Result<()> {
    attribute.required("name")?;
    if let Some(func) = attribute.attribute("aggregate") {
        if AggregateFunc::from_fetch_name(func).is_none() {
            return Err(Error::validation(format!("Unknown aggregate function '{func}'")));
        }
    }
    if let Some(grouping) = attribute.attribute("dategrouping") {
        if DateGrouping::from_fetch_name(grouping).is_none() {
            return Err(Error::validation(format!("Unknown date grouping '{grouping}'")));
        }
    }
    Ok(())
}

fn validate_link(link: &XmlElement) -> Result<()> {
    link.required("name")?;
    link.required("from")?;
    link.required("to")?;
    if let Some(kind) = link.attribute("link-type") {
        if JoinKind::from_fetch_name(kind).is_none() {
            return Err(Error::validation(format!("Unknown link-type '{kind}'")));
        }
    }
    validate_entity(link)
}

fn validate_filter(filter: &XmlElement) -> Result<()> {
    check_children(filter, &["condition", "filter"])?;
    if let Some(kind) = filter.attribute("type") {
        if LogicalOperator::from_fetch_name(kind).is_none() {
            return Err(Error::validation(format!("Unknown filter type '{kind}'")));
        }
    }
    for child in &filter.children {
        if child.name == "filter" {
            validate_filter(child)?;
        } else {
            validate_condition(child)?;
        }
    }
    Ok(())
}

fn validate_condition(condition: &XmlElement) -> Result<()> {
    check_children(condition, &["value"])?;
    condition.required("attribute")?;
    let operator = condition.required("operator")?;
    if ConditionOperator::from_fetch_name(operator).is_none() {
        return Err(Error::unsupported_operator(format!(
            "The operator '{operator}' is not supported"
        )));
    }
    for value in &condition.children {
        check_children(value, &[])?;
    }
    Ok(())
}

/// Fails on child elements outside `allowed`.
fn check_children(element: &XmlElement, allowed: &[&str]) -> Result<()> {
    for child in &element.children {
        if !ELEMENTS.contains(&child.name.as_str()) {
            return Err(Error::validation(format!(
                "The element '{}' is not supported",
                child.name
            )));
        }
        if !allowed.contains(&child.name.as_str()) {
            return Err(Error::validation(format!(
                "The element '{}' is not allowed inside '{}'",
                child.name, element.name
            )));
        }
    }
    Ok(())
}
