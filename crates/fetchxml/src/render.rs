//! Rendering of a [`QueryDescription`] back to FetchXML.
//!
//! The output parses back into an equivalent query. Operators without a
//! FetchXML spelling are expressed through `like` / `not-like` patterns,
//! and typed operands are written as their text form.

use fetchkit_core::Value;
use fetchkit_query::ast::{
    Column, ColumnSet, ConditionNode, ConditionOperator, FilterNode, JoinKind, LinkDescriptor, OrderBy,
    QueryDescription, SortOrder,
};

/// Renders a query as a FetchXML document.
pub fn render(query: &QueryDescription) -> String {
    let mut out = String::from("<fetch");
    if query.aggregate {
        out.push_str(r#" aggregate="true""#);
    }
    if query.distinct {
        out.push_str(r#" distinct="true""#);
    }
    if let Some(top) = query.top {
        push_attr(&mut out, "top", &top.to_string());
    }
    if let Some(count) = query.paging.count {
        push_attr(&mut out, "count", &count.to_string());
    }
    if let Some(page) = query.paging.page {
        push_attr(&mut out, "page", &page.to_string());
    }
    if query.paging.return_total_count {
        out.push_str(r#" returntotalrecordcount="true""#);
    }
    out.push('>');

    out.push_str("<entity");
    push_attr(&mut out, "name", &query.entity);
    out.push('>');
    render_body(&mut out, &query.columns, &query.orders, &query.criteria, &query.links);
    out.push_str("</entity></fetch>");
    out
}

fn render_body(out: &mut String, columns: &ColumnSet, orders: &[OrderBy], filter: &FilterNode, links: &[LinkDescriptor]) {
    match columns {
        ColumnSet::All => out.push_str("<all-attributes/>"),
        ColumnSet::Columns(columns) => columns.iter().for_each(|c| render_column(out, c)),
        ColumnSet::None => {}
    }
    for order in orders {
        render_order(out, order);
    }
    if *filter != FilterNode::and() {
        render_filter(out, filter);
    }
    for link in links {
        render_link(out, link);
    }
}

fn render_column(out: &mut String, column: &Column) {
    out.push_str("<attribute");
    push_attr(out, "name", &column.name);
    if let Some(alias) = &column.alias {
        push_attr(out, "alias", alias);
    }
    if let Some(func) = column.aggregate {
        push_attr(out, "aggregate", func.fetch_name());
    }
    if column.group_by {
        out.push_str(r#" groupby="true""#);
    }
    if let Some(grouping) = column.date_grouping {
        push_attr(out, "dategrouping", grouping.fetch_name());
    }
    if column.distinct {
        out.push_str(r#" distinct="true""#);
    }
    out.push_str("/>");
}

fn render_order(out: &mut String, order: &OrderBy) {
    out.push_str("<order");
    push_attr(out, "attribute", &order.attribute);
    if let Some(alias) = &order.entity_alias {
        push_attr(out, "entityname", alias);
    }
    if order.order == SortOrder::Desc {
        out.push_str(r#" descending="true""#);
    }
    out.push_str("/>");
}

fn render_filter(out: &mut String, filter: &FilterNode) {
    out.push_str("<filter");
    push_attr(out, "type", filter.operator.fetch_name());
    out.push('>');
    for condition in &filter.conditions {
        render_condition(out, condition);
    }
    for nested in &filter.filters {
        render_filter(out, nested);
    }
    out.push_str("</filter>");
}

fn render_condition(out: &mut String, condition: &ConditionNode) {
    use ConditionOperator as Op;

    let (name, wrap) = match condition.operator {
        Op::Contains => ("like", true),
        Op::DoesNotContain => ("not-like", true),
        other => (other.fetch_name().unwrap_or("eq"), false),
    };

    out.push_str("<condition");
    if let Some(alias) = &condition.entity_alias {
        push_attr(out, "entityname", alias);
    }
    push_attr(out, "attribute", &condition.attribute);
    push_attr(out, "operator", name);
    if let Some(other) = &condition.compare_column {
        push_attr(out, "valueof", other);
        out.push_str("/>");
        return;
    }

    let mut texts = Vec::new();
    for value in &condition.values {
        operand_texts(value, &mut texts);
    }
    if wrap {
        texts = texts.into_iter().map(|t| format!("%{t}%")).collect();
    }
    if texts.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for text in &texts {
        out.push_str("<value>");
        out.push_str(&escape(text));
        out.push_str("</value>");
    }
    out.push_str("</condition>");
}

fn render_link(out: &mut String, link: &LinkDescriptor) {
    out.push_str("<link-entity");
    push_attr(out, "name", &link.to_entity);
    push_attr(out, "from", &link.to_attribute);
    push_attr(out, "to", &link.from_attribute);
    if let Some(alias) = &link.alias {
        push_attr(out, "alias", alias);
    }
    if link.kind != JoinKind::Inner {
        push_attr(out, "link-type", link.kind.fetch_name());
    }
    out.push('>');
    render_body(out, &link.columns, &link.orders, &link.filter, &link.links);
    out.push_str("</link-entity>");
}

/// Text forms of an operand. Arrays and option set collections expand to
/// one entry per element; nulls are dropped.
fn operand_texts(value: &Value, texts: &mut Vec<String>) {
    match value.unwrap_aliased() {
        Value::Null => {}
        Value::String(s) => texts.push(s.clone()),
        Value::Int(i) => texts.push(i.to_string()),
        Value::Decimal(d) | Value::Money(d) => texts.push(d.to_string()),
        Value::Bool(b) => texts.push(b.to_string()),
        Value::DateTime(dt) => texts.push(dt.to_rfc3339()),
        Value::Guid(g) => texts.push(g.to_string()),
        Value::Reference(r) => texts.push(r.id.to_string()),
        Value::OptionSet(code) => texts.push(code.to_string()),
        Value::OptionSetCollection(codes) => texts.extend(codes.iter().map(i32::to_string)),
        Value::Array(items) => items.iter().for_each(|item| operand_texts(item, texts)),
        Value::Aliased(_) => {}
    }
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape(value));
    out.push('"');
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use fetchkit_query::ast::{AggregateFunc, DateGrouping};

    #[test]
    fn test_render_shape() {
        let query = QueryDescription::new("account")
            .with_columns(ColumnSet::columns(["name"]))
            .with_order(OrderBy::desc("name"))
            .with_top(3)
            .with_condition(ConditionNode::new("statecode", ConditionOperator::Equal, vec![Value::Int(0)]));
        assert_eq!(
            render(&query),
            concat!(
                r#"<fetch top="3"><entity name="account">"#,
                r#"<attribute name="name"/><order attribute="name" descending="true"/>"#,
                r#"<filter type="and"><condition attribute="statecode" operator="eq"><value>0</value></condition></filter>"#,
                r#"</entity></fetch>"#
            )
        );
    }

    #[test]
    fn test_contains_renders_as_like() {
        let query = QueryDescription::new("account").with_condition(ConditionNode::new(
            "name",
            ConditionOperator::DoesNotContain,
            vec![Value::from("Contoso")],
        ));
        assert!(render(&query)
            .contains(r#"<condition attribute="name" operator="not-like"><value>%Contoso%</value></condition>"#));
    }

    #[test]
    fn test_values_are_escaped() {
        let query = QueryDescription::new("account").with_condition(ConditionNode::new(
            "name",
            ConditionOperator::Equal,
            vec![Value::from(r#"<A & "B">"#)],
        ));
        assert!(render(&query).contains("<value>&lt;A &amp; &quot;B&quot;&gt;</value>"));
    }

    #[test]
    fn test_link_and_aggregate_columns() {
        let query = QueryDescription::new("opportunity")
            .with_aggregate(true)
            .with_columns(ColumnSet::Columns(vec![
                Column::aggregate("estimatedvalue", AggregateFunc::Avg, "avg_value"),
                Column::group_by("closedon", "quarter").with_date_grouping(DateGrouping::Quarter),
            ]))
            .with_link(
                LinkDescriptor::new("customerid", "account", "accountid")
                    .with_alias("a")
                    .with_kind(JoinKind::Any),
            );
        let xml = render(&query);
        assert!(xml.starts_with(r#"<fetch aggregate="true"><entity name="opportunity">"#));
        assert!(xml.contains(r#"<attribute name="estimatedvalue" alias="avg_value" aggregate="avg"/>"#));
        assert!(xml.contains(r#"<attribute name="closedon" alias="quarter" groupby="true" dategrouping="quarter"/>"#));
        assert!(xml.contains(r#"<link-entity name="account" from="accountid" to="customerid" alias="a" link-type="any"></link-entity>"#));
    }

    #[test]
    fn test_unary_condition_has_no_values() {
        let query = QueryDescription::new("account")
            .with_columns(ColumnSet::None)
            .with_condition(ConditionNode::unary("createdon", ConditionOperator::Today));
        assert_eq!(
            render(&query),
            r#"<fetch><entity name="account"><filter type="and"><condition attribute="createdon" operator="today"/></filter></entity></fetch>"#
        );
    }
}
