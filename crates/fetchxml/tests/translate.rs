//! Translation tests: error taxonomy, idempotence and render round trips.

use fetchkit_core::{Error, Value};
use fetchkit_fetchxml::{render, translate};
use fetchkit_query::ast::{
    ColumnSet, ConditionNode, ConditionOperator, FilterNode, JoinKind, LinkDescriptor, LogicalOperator, OrderBy,
    Paging, QueryDescription, SortOrder,
};
use proptest::prelude::*;

const ACCOUNTS_WITH_CONTACTS: &str = r#"
<fetch count="20" page="1" returntotalrecordcount="true">
    <entity name="account">
        <attribute name="name"/>
        <attribute name="revenue"/>
        <order attribute="name"/>
        <filter type="and">
            <condition attribute="statecode" operator="eq" value="0"/>
            <filter type="or">
                <condition attribute="name" operator="like" value="%Contoso%"/>
                <condition attribute="address1_city" operator="in">
                    <value>Redmond</value>
                    <value>Seattle</value>
                </condition>
            </filter>
        </filter>
        <link-entity name="contact" from="parentcustomerid" to="accountid" alias="c" link-type="outer">
            <attribute name="fullname"/>
            <filter><condition attribute="statecode" operator="eq" value="0"/></filter>
            <link-entity name="task" from="regardingobjectid" to="contactid" link-type="any">
                <filter><condition attribute="subject" operator="begins-with" value="Call"/></filter>
            </link-entity>
        </link-entity>
    </entity>
</fetch>"#;

#[test]
fn test_translate_is_idempotent() {
    let first = translate(ACCOUNTS_WITH_CONTACTS).unwrap();
    let second = translate(ACCOUNTS_WITH_CONTACTS).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_render_round_trip() {
    let query = translate(ACCOUNTS_WITH_CONTACTS).unwrap();
    let rendered = render(&query);
    assert_eq!(translate(&rendered).unwrap(), query);
}

#[test]
fn test_translated_shape() {
    let query = translate(ACCOUNTS_WITH_CONTACTS).unwrap();
    assert_eq!(query.columns, ColumnSet::columns(["name", "revenue"]));
    assert_eq!(query.orders, vec![OrderBy::asc("name")]);
    assert_eq!(query.criteria.filters[0].operator, LogicalOperator::Or);
    assert_eq!(
        query.criteria.filters[0].conditions[1].values,
        vec![Value::from("Redmond"), Value::from("Seattle")]
    );

    let contacts = &query.links[0];
    assert_eq!(contacts.alias.as_deref(), Some("c"));
    assert_eq!(contacts.kind, JoinKind::LeftOuter);
    let tasks = &contacts.links[0];
    assert_eq!(tasks.alias.as_deref(), Some("task"));
    assert_eq!(tasks.kind, JoinKind::Any);
    assert_eq!(tasks.from_attribute, "contactid");
    assert_eq!(tasks.to_attribute, "regardingobjectid");
}

#[test]
fn test_contains_round_trips_as_like() {
    let query = QueryDescription::new("account")
        .with_columns(ColumnSet::None)
        .with_condition(ConditionNode::new("name", ConditionOperator::Contains, vec![Value::from("oso")]));
    let translated = translate(&render(&query)).unwrap();
    let condition = &translated.criteria.conditions[0];
    assert_eq!(condition.operator, ConditionOperator::Like);
    assert_eq!(condition.values, vec![Value::from("%oso%")]);
}

#[test]
fn test_error_taxonomy() {
    let err = |xml: &str| translate(xml).unwrap_err();

    assert!(matches!(err("<fetch><entity name='account'>"), Error::Format { .. }));
    assert!(matches!(
        err("<fetch><entity name='account'><bogus/></entity></fetch>"),
        Error::Validation { .. }
    ));
    assert!(matches!(
        err("<fetch><entity name='account'><filter><condition attribute='name' operator='near' value='x'/></filter></entity></fetch>"),
        Error::UnsupportedOperator { .. }
    ));
    assert!(matches!(
        err("<fetch><entity name='account'><link-entity name='contact' from='a' to='b' link-type='full'/></entity></fetch>"),
        Error::Validation { .. }
    ));
    assert!(matches!(err("<fetch count='x'><entity name='account'/></fetch>"), Error::Validation { .. }));
    assert!(matches!(
        err("<fetch><entity name='account'><link-entity name='contact' from='a' to='b' alias='x'/><link-entity name='task' from='a' to='b' alias='x'/></entity></fetch>"),
        Error::Catalog { .. }
    ));
    assert!(matches!(
        err("<fetch><entity name='account'><link-entity name='contact' from='a' to='b' alias='c-1'/></entity></fetch>"),
        Error::Catalog { .. }
    ));
}

fn text_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 %&<>'\"_-]{0,8}"
}

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,6}"
}

fn operator_strategy() -> impl Strategy<Value = ConditionOperator> {
    prop::sample::select(
        ConditionOperator::ALL
            .iter()
            .copied()
            .filter(|op| op.fetch_name().is_some())
            .collect::<Vec<_>>(),
    )
}

fn condition_strategy() -> impl Strategy<Value = ConditionNode> {
    (
        name_strategy(),
        operator_strategy(),
        prop::collection::vec(text_strategy(), 0..3),
        prop::option::of(name_strategy()),
    )
        .prop_map(|(attribute, op, values, alias)| {
            let mut node = ConditionNode::new(attribute, op, values.into_iter().map(Value::from).collect());
            node.entity_alias = alias;
            node
        })
}

fn filter_strategy() -> impl Strategy<Value = FilterNode> {
    let leaf = (any::<bool>(), prop::collection::vec(condition_strategy(), 0..3)).prop_map(|(or, conditions)| {
        FilterNode {
            operator: if or { LogicalOperator::Or } else { LogicalOperator::And },
            conditions,
            filters: Vec::new(),
        }
    });
    leaf.prop_recursive(2, 8, 2, |inner| {
        (
            any::<bool>(),
            prop::collection::vec(condition_strategy(), 0..3),
            prop::collection::vec(inner, 0..2),
        )
            .prop_map(|(or, conditions, filters)| FilterNode {
                operator: if or { LogicalOperator::Or } else { LogicalOperator::And },
                conditions,
                filters,
            })
    })
}

fn columns_strategy() -> impl Strategy<Value = ColumnSet> {
    prop_oneof![
        Just(ColumnSet::All),
        Just(ColumnSet::None),
        prop::collection::vec(name_strategy(), 1..4).prop_map(ColumnSet::columns),
    ]
}

fn kind_strategy() -> impl Strategy<Value = JoinKind> {
    prop::sample::select(vec![
        JoinKind::Inner,
        JoinKind::LeftOuter,
        JoinKind::Any,
        JoinKind::NotAny,
        JoinKind::All,
        JoinKind::NotAll,
    ])
}

fn order_strategy() -> impl Strategy<Value = OrderBy> {
    (name_strategy(), any::<bool>()).prop_map(|(attribute, desc)| OrderBy {
        attribute,
        entity_alias: None,
        order: if desc { SortOrder::Desc } else { SortOrder::Asc },
    })
}

/// Links with distinct explicit aliases `l0`, `l1`, ... assigned afterwards.
fn link_strategy() -> impl Strategy<Value = LinkDescriptor> {
    let leaf = (
        name_strategy(),
        name_strategy(),
        name_strategy(),
        kind_strategy(),
        columns_strategy(),
        filter_strategy(),
        prop::collection::vec(order_strategy(), 0..2),
    )
        .prop_map(|(from, entity, to, kind, columns, filter, orders)| LinkDescriptor {
            from_attribute: from,
            to_entity: entity,
            to_attribute: to,
            kind,
            alias: None,
            columns,
            filter,
            orders,
            links: Vec::new(),
        });
    leaf.prop_recursive(2, 6, 2, |inner| {
        (link_header_strategy(), prop::collection::vec(inner, 0..2)).prop_map(|(mut link, links)| {
            link.links = links;
            link
        })
    })
}

fn link_header_strategy() -> impl Strategy<Value = LinkDescriptor> {
    (name_strategy(), name_strategy(), name_strategy(), kind_strategy())
        .prop_map(|(from, entity, to, kind)| LinkDescriptor::new(from, entity, to).with_kind(kind))
}

fn name_links(links: &mut [LinkDescriptor], next: &mut usize) {
    for link in links {
        link.alias = Some(format!("l{next}"));
        *next += 1;
        name_links(&mut link.links, next);
    }
}

prop_compose! {
    fn query_strategy()(
        entity in name_strategy(),
        columns in columns_strategy(),
        criteria in filter_strategy(),
        orders in prop::collection::vec(order_strategy(), 0..3),
        links in prop::collection::vec(link_strategy(), 0..3),
        distinct in any::<bool>(),
        top in prop::option::of(0usize..500),
        count in prop::option::of(1usize..100),
        page in prop::option::of(1usize..10),
        return_total_count in any::<bool>(),
    ) -> QueryDescription {
        let mut links = links;
        name_links(&mut links, &mut 0);
        QueryDescription {
            entity,
            columns,
            criteria,
            orders,
            paging: Paging { count, page, return_total_count },
            distinct,
            top,
            links,
            aggregate: false,
        }
    }
}

proptest! {
    /// Property: rendering then translating reproduces the query.
    #[test]
    fn render_then_translate_is_identity(query in query_strategy()) {
        let rendered = render(&query);
        let translated = translate(&rendered)
            .map_err(|e| TestCaseError::fail(format!("{e} for {rendered}")))?;
        prop_assert_eq!(translated, query);
    }
}
