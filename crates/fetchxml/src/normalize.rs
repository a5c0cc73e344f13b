//! Lowering of validated FetchXML into a [`QueryDescription`].

use crate::document::{Document, XmlElement};
use fetchkit_core::{Error, Result, Value};
use fetchkit_query::ast::{
    AggregateFunc, Column, ColumnSet, ConditionNode, ConditionOperator, DateGrouping, FilterNode, JoinKind,
    LinkDescriptor, LogicalOperator, OrderBy, Paging, QueryDescription, SortOrder,
};
use fetchkit_query::planner::AliasAllocator;

/// Builds a query from a validated document.
pub fn normalize(doc: &Document) -> Result<QueryDescription> {
    let fetch = &doc.root;
    let entity = fetch
        .children_named("entity")
        .next()
        .ok_or_else(|| Error::validation("The 'fetch' element must contain an 'entity' element"))?;

    let aggregate = flag(fetch, "aggregate")?;
    let mut query = QueryDescription::new(entity.required("name")?);
    query.aggregate = aggregate;
    query.distinct = flag(fetch, "distinct")?;
    query.top = number(fetch, "top")?;
    query.paging = Paging {
        count: number(fetch, "count")?,
        page: number(fetch, "page")?,
        return_total_count: flag(fetch, "returntotalrecordcount")?,
    };
    query.columns = columns(entity)?;
    query.criteria = criteria(entity)?;
    if !aggregate {
        query.orders = orders(entity)?;
    }
    query.links = links(entity, aggregate)?;

    AliasAllocator::new().assign(&mut query.links)?;
    Ok(query)
}

fn flag(element: &XmlElement, name: &str) -> Result<bool> {
    match element.attribute(name) {
        None => Ok(false),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(Error::validation(format!(
                "The '{name}' attribute of '{}' must be true or false, found '{raw}'",
                element.name
            ))),
        },
    }
}

fn number(element: &XmlElement, name: &str) -> Result<Option<usize>> {
    element
        .attribute(name)
        .map(|raw| {
            raw.trim().parse::<usize>().map_err(|_| {
                Error::validation(format!(
                    "The '{name}' attribute of '{}' must be a non-negative integer, found '{raw}'",
                    element.name
                ))
            })
        })
        .transpose()
}

fn columns(element: &XmlElement) -> Result<ColumnSet> {
    if element.has_child("all-attributes") {
        return Ok(ColumnSet::All);
    }
    let mut columns = Vec::new();
    for attribute in element.children_named("attribute") {
        columns.push(column(attribute)?);
    }
    if columns.is_empty() {
        Ok(ColumnSet::None)
    } else {
        Ok(ColumnSet::Columns(columns))
    }
}

fn column(attribute: &XmlElement) -> Result<Column> {
    let mut column = Column::new(attribute.required("name")?);
    column.alias = attribute.attribute("alias").map(str::to_string);
    column.group_by = flag(attribute, "groupby")?;
    column.distinct = flag(attribute, "distinct")?;
    if let Some(func) = attribute.attribute("aggregate") {
        column.aggregate = Some(
            AggregateFunc::from_fetch_name(func)
                .ok_or_else(|| Error::validation(format!("Unknown aggregate function '{func}'")))?,
        );
    }
    if let Some(grouping) = attribute.attribute("dategrouping") {
        column.date_grouping = Some(
            DateGrouping::from_fetch_name(grouping)
                .ok_or_else(|| Error::validation(format!("Unknown date grouping '{grouping}'")))?,
        );
    }
    Ok(column)
}

fn orders(element: &XmlElement) -> Result<Vec<OrderBy>> {
    element
        .children_named("order")
        .map(|order| {
            let order_by = OrderBy {
                attribute: order.required("attribute")?.to_string(),
                entity_alias: order.attribute("entityname").map(str::to_string),
                order: if flag(order, "descending")? {
                    SortOrder::Desc
                } else {
                    SortOrder::Asc
                },
            };
            Ok(order_by)
        })
        .collect()
}

/// Sibling filters are AND-combined.
fn criteria(element: &XmlElement) -> Result<FilterNode> {
    let mut filters = element
        .children_named("filter")
        .map(filter)
        .collect::<Result<Vec<_>>>()?;
    Ok(match filters.len() {
        0 => FilterNode::and(),
        1 => filters.remove(0),
        _ => FilterNode {
            operator: LogicalOperator::And,
            conditions: Vec::new(),
            filters,
        },
    })
}

fn filter(element: &XmlElement) -> Result<FilterNode> {
    let operator = match element.attribute("type") {
        Some(kind) => LogicalOperator::from_fetch_name(kind)
            .ok_or_else(|| Error::validation(format!("Unknown filter type '{kind}'")))?,
        None => LogicalOperator::And,
    };
    let mut node = FilterNode {
        operator,
        ..FilterNode::default()
    };
    for child in &element.children {
        match child.name.as_str() {
            "condition" => node.conditions.push(condition(child)?),
            "filter" => node.filters.push(filter(child)?),
            _ => {}
        }
    }
    Ok(node)
}

fn condition(element: &XmlElement) -> Result<ConditionNode> {
    let name = element.required("operator")?;
    let operator = ConditionOperator::from_fetch_name(name)
        .ok_or_else(|| Error::unsupported_operator(format!("The operator '{name}' is not supported")))?;

    let mut values: Vec<Value> = Vec::new();
    if let Some(value) = element.attribute("value") {
        values.push(Value::from(value));
    }
    for child in element.children_named("value") {
        values.push(Value::from(child.text.as_deref().unwrap_or_default()));
    }

    let mut node = ConditionNode::new(element.required("attribute")?, operator, values);
    node.entity_alias = element.attribute("entityname").map(str::to_string);
    node.compare_column = element.attribute("valueof").map(str::to_string);
    Ok(node)
}

fn links(element: &XmlElement, aggregate: bool) -> Result<Vec<LinkDescriptor>> {
    element
        .children_named("link-entity")
        .map(|child| link(child, aggregate))
        .collect()
}

/// `to` names the parent attribute and `from` the target attribute.
fn link(element: &XmlElement, aggregate: bool) -> Result<LinkDescriptor> {
    let mut link = LinkDescriptor::new(
        element.required("to")?,
        element.required("name")?,
        element.required("from")?,
    );
    if let Some(kind) = element.attribute("link-type") {
        link.kind =
            JoinKind::from_fetch_name(kind).ok_or_else(|| Error::validation(format!("Unknown link-type '{kind}'")))?;
    }
    link.alias = element.attribute("alias").map(str::to_string);
    link.columns = columns(element)?;
    link.filter = criteria(element)?;
    if !aggregate {
        link.orders = orders(element)?;
    }
    link.links = links(element, aggregate)?;
    Ok(link)
}
