//! FetchXML queries executed end to end through the engine.

use chrono::{TimeZone, Utc};
use fetchkit_core::schema::{AttributeMetadata, EntityMetadata};
use fetchkit_core::{AttributeTypeCode, Decimal, EntityReference, Error, Record, Uuid, Value};
use fetchkit_engine::{
    render_fetchxml, translate_fetchxml_to_query_description, CallerContext, EngineConfig, InMemoryMetadata,
    InMemoryStore, QueryEngine, QueryResult,
};
use std::collections::BTreeSet;

struct Crm {
    engine: QueryEngine,
    root: Uuid,
    child: Uuid,
}

fn metadata() -> InMemoryMetadata {
    InMemoryMetadata::new()
        .with_entity(
            EntityMetadata::new("account")
                .with("name", AttributeTypeCode::String)
                .with("statecode", AttributeTypeCode::State)
                .with("revenue", AttributeTypeCode::Money)
                .with("createdon", AttributeTypeCode::DateTime)
                .with("industries", AttributeTypeCode::MultiSelectPicklist)
                .with_attribute(AttributeMetadata::new("ownerid", AttributeTypeCode::Owner))
                .with_attribute(AttributeMetadata::lookup("parentaccountid", &["account"])),
        )
        .with_entity(
            EntityMetadata::new("contact")
                .with("fullname", AttributeTypeCode::String)
                .with("statecode", AttributeTypeCode::State)
                .with_attribute(AttributeMetadata::new("parentcustomerid", AttributeTypeCode::Customer)),
        )
        .with_hierarchy("account", "parentaccountid")
}

impl Crm {
    fn new() -> Self {
        let user = Uuid::new_v4();
        let owner = EntityReference::new("systemuser", user).with_name("Ann");
        let (root, child, grandchild) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let parent = |id: Uuid| EntityReference::new("account", id);
        let industries = |codes: &[i32]| Value::OptionSetCollection(codes.iter().copied().collect::<BTreeSet<i32>>());

        let mut store = InMemoryStore::new();
        store.insert(
            Record::new("account", root)
                .with("name", "Contoso Holdings")
                .with("statecode", Value::OptionSet(0))
                .with("revenue", Value::Money(Decimal::from(500)))
                .with("industries", industries(&[1, 2]))
                .with("ownerid", owner.clone())
                .with("createdon", Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 0).unwrap()),
        );
        store.insert(
            Record::new("account", child)
                .with("name", "Contoso Retail")
                .with("statecode", Value::OptionSet(1))
                .with("revenue", Value::Money(Decimal::from(200)))
                .with("parentaccountid", parent(root))
                .with("createdon", Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()),
        );
        store.insert(
            Record::new("account", grandchild)
                .with("name", "Fabrikam")
                .with("statecode", Value::OptionSet(0))
                .with("revenue", Value::Money(Decimal::from(300)))
                .with("industries", industries(&[3]))
                .with("ownerid", owner)
                .with("parentaccountid", parent(child))
                .with("createdon", Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap()),
        );
        store.insert(
            Record::new("contact", Uuid::new_v4())
                .with("fullname", "Dana")
                .with("statecode", Value::OptionSet(0))
                .with("parentcustomerid", parent(root)),
        );

        let config = EngineConfig::default()
            .with_caller(CallerContext::new(user, Uuid::new_v4()))
            .with_fixed_now(Utc.with_ymd_and_hms(2024, 2, 10, 12, 0, 0).unwrap());
        Self {
            engine: QueryEngine::new(store, metadata()).with_config(config),
            root,
            child,
        }
    }

    fn run(&self, xml: &str) -> QueryResult {
        self.engine.execute_fetchxml(xml).unwrap()
    }

    fn names(&self, xml: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .run(xml)
            .records
            .iter()
            .filter_map(|r| r.get("name").and_then(Value::as_str).map(str::to_string))
            .collect();
        names.sort();
        names
    }
}

fn accounts(filter: &str) -> String {
    format!(r#"<fetch><entity name="account"><attribute name="name"/><filter>{filter}</filter></entity></fetch>"#)
}

#[test]
fn test_active_contoso_accounts() {
    let crm = Crm::new();
    let xml = accounts(
        r#"<condition attribute="statecode" operator="eq" value="0"/>
           <condition attribute="name" operator="like" value="%Contoso%"/>"#,
    );
    assert_eq!(crm.names(&xml), vec!["Contoso Holdings"]);
}

#[test]
fn test_hierarchy_conditions() {
    let crm = Crm::new();
    let above = accounts(&format!(
        r#"<condition attribute="accountid" operator="eq-or-above" value="{}"/>"#,
        crm.child
    ));
    assert_eq!(crm.names(&above), vec!["Contoso Holdings", "Contoso Retail"]);

    let under = accounts(&format!(
        r#"<condition attribute="accountid" operator="under" value="{}"/>"#,
        crm.root
    ));
    assert_eq!(crm.names(&under), vec!["Contoso Retail", "Fabrikam"]);

    let not_under = accounts(&format!(
        r#"<condition attribute="accountid" operator="not-under" value="{}"/>"#,
        crm.child
    ));
    assert_eq!(crm.names(&not_under), vec!["Contoso Holdings", "Contoso Retail"]);
}

#[test]
fn test_multi_select_conditions() {
    let crm = Crm::new();
    let contains = accounts(r#"<condition attribute="industries" operator="contain-values"><value>1</value></condition>"#);
    assert_eq!(crm.names(&contains), vec!["Contoso Holdings"]);

    let exact = accounts(r#"<condition attribute="industries" operator="eq"><value>2</value><value>1</value></condition>"#);
    assert_eq!(crm.names(&exact), vec!["Contoso Holdings"]);

    let mismatch = accounts(r#"<condition attribute="industries" operator="eq"><value>1</value><value>3</value></condition>"#);
    assert!(crm.names(&mismatch).is_empty());
}

#[test]
fn test_accounts_without_contacts() {
    let crm = Crm::new();
    let xml = r#"<fetch><entity name="account"><attribute name="name"/>
        <link-entity name="contact" from="parentcustomerid" to="accountid" link-type="not any"/>
    </entity></fetch>"#;
    assert_eq!(crm.names(xml), vec!["Contoso Retail", "Fabrikam"]);
}

#[test]
fn test_between_includes_last_day() {
    let crm = Crm::new();
    let xml = accounts(
        r#"<condition attribute="createdon" operator="between">
               <value>2024-01-01</value><value>2024-01-31T00:00:00</value>
           </condition>"#,
    );
    assert_eq!(crm.names(&xml), vec!["Contoso Holdings", "Fabrikam"]);
}

#[test]
fn test_current_user_and_relative_dates() {
    let crm = Crm::new();
    let mine = accounts(r#"<condition attribute="ownerid" operator="eq-userid"/>"#);
    assert_eq!(crm.names(&mine), vec!["Contoso Holdings", "Fabrikam"]);

    let recent = accounts(r#"<condition attribute="createdon" operator="last-x-days" value="9"/>"#);
    assert_eq!(crm.names(&recent), vec!["Contoso Retail"]);

    let last_month = accounts(r#"<condition attribute="createdon" operator="last-month"/>"#);
    assert_eq!(crm.names(&last_month), vec!["Contoso Holdings", "Fabrikam"]);
}

#[test]
fn test_outer_link_with_alias_condition() {
    let crm = Crm::new();
    let xml = r#"<fetch><entity name="account"><attribute name="name"/>
        <filter><condition entityname="c" attribute="contactid" operator="null"/></filter>
        <link-entity name="contact" from="parentcustomerid" to="accountid" alias="c" link-type="outer">
            <attribute name="fullname"/>
        </link-entity>
    </entity></fetch>"#;
    let result = crm.run(xml);
    assert_eq!(result.len(), 2);
    assert!(result.records.iter().all(|r| !r.contains("c.fullname")));
}

#[test]
fn test_aggregate_sum_by_owner() {
    let crm = Crm::new();
    let xml = r#"<fetch aggregate="true"><entity name="account">
        <attribute name="revenue" alias="total" aggregate="sum"/>
        <attribute name="accountid" alias="n" aggregate="count"/>
        <filter><condition attribute="statecode" operator="eq" value="0"/></filter>
    </entity></fetch>"#;
    let result = crm.run(xml);
    assert_eq!(result.len(), 1);
    let row = &result.records[0];
    assert_eq!(row.get_unwrapped("total"), Some(&Value::Money(Decimal::from(800))));
    assert_eq!(row.get_unwrapped("n"), Some(&Value::Int(2)));
}

#[test]
fn test_paging_with_total_count() {
    let crm = Crm::new();
    let xml = r#"<fetch count="2" page="2" returntotalrecordcount="true">
        <entity name="account"><attribute name="name"/><order attribute="name"/></entity>
    </fetch>"#;
    let result = crm.run(xml);
    assert_eq!(result.total_record_count, Some(3));
    assert!(!result.more_records);
    assert_eq!(result.records[0].get("name"), Some(&Value::from("Fabrikam")));
}

#[test]
fn test_repeated_execution_is_identical() {
    let crm = Crm::new();
    let xml = r#"<fetch><entity name="account"><all-attributes/><order attribute="revenue" descending="true"/></entity></fetch>"#;
    assert_eq!(crm.run(xml), crm.run(xml));
}

#[test]
fn test_rendered_query_executes_the_same() {
    let crm = Crm::new();
    let xml = accounts(r#"<condition attribute="name" operator="begins-with" value="contoso"/>"#);
    let query = translate_fetchxml_to_query_description(&xml).unwrap();
    let rendered = render_fetchxml(&query);
    assert_eq!(crm.run(&xml), crm.run(&rendered));
}

#[test]
fn test_errors_abort_execution() {
    let crm = Crm::new();
    let unknown_attribute = accounts(r#"<condition attribute="nickname" operator="eq" value="x"/>"#);
    assert!(matches!(
        crm.engine.execute_fetchxml(&unknown_attribute),
        Err(Error::Catalog { .. })
    ));

    let wrong_arity = accounts(r#"<condition attribute="createdon" operator="between" value="2024-01-01"/>"#);
    assert!(matches!(
        crm.engine.execute_fetchxml(&wrong_arity),
        Err(Error::ArgumentCount { .. })
    ));

    let unknown_entity = r#"<fetch><entity name="lead"/></fetch>"#;
    assert!(matches!(crm.engine.execute_fetchxml(unknown_entity), Err(Error::Catalog { .. })));

    assert!(matches!(crm.engine.execute_fetchxml("<fetch>"), Err(Error::Format { .. })));
}
