//! Benchmarks for the query pipeline.
//!
//! Run with: cargo bench -p fetchkit-engine

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fetchkit_core::schema::{AttributeMetadata, EntityMetadata};
use fetchkit_core::{AttributeTypeCode, Decimal, EntityReference, Record, Uuid, Value};
use fetchkit_engine::{translate_fetchxml_to_query_description, EngineConfig, InMemoryMetadata, InMemoryStore, QueryEngine};

const FILTERED: &str = r#"<fetch count="50" returntotalrecordcount="true">
    <entity name="account">
        <attribute name="name"/>
        <attribute name="revenue"/>
        <order attribute="revenue" descending="true"/>
        <filter>
            <condition attribute="statecode" operator="eq" value="0"/>
            <condition attribute="name" operator="like" value="%7%"/>
        </filter>
    </entity>
</fetch>"#;

const JOINED: &str = r#"<fetch>
    <entity name="account">
        <attribute name="name"/>
        <link-entity name="contact" from="parentcustomerid" to="accountid" alias="c">
            <attribute name="fullname"/>
            <filter><condition attribute="statecode" operator="eq" value="0"/></filter>
        </link-entity>
    </entity>
</fetch>"#;

const NOT_ANY: &str = r#"<fetch>
    <entity name="account">
        <attribute name="name"/>
        <link-entity name="contact" from="parentcustomerid" to="accountid" link-type="not any"/>
    </entity>
</fetch>"#;

const AGGREGATE: &str = r#"<fetch aggregate="true">
    <entity name="account">
        <attribute name="statecode" alias="state" groupby="true"/>
        <attribute name="revenue" alias="total" aggregate="sum"/>
        <attribute name="createdon" alias="month" groupby="true" dategrouping="month"/>
    </entity>
</fetch>"#;

fn metadata() -> InMemoryMetadata {
    InMemoryMetadata::new()
        .with_entity(
            EntityMetadata::new("account")
                .with("name", AttributeTypeCode::String)
                .with("statecode", AttributeTypeCode::State)
                .with("revenue", AttributeTypeCode::Money)
                .with("createdon", AttributeTypeCode::DateTime),
        )
        .with_entity(
            EntityMetadata::new("contact")
                .with("fullname", AttributeTypeCode::String)
                .with("statecode", AttributeTypeCode::State)
                .with_attribute(AttributeMetadata::new("parentcustomerid", AttributeTypeCode::Customer)),
        )
}

fn engine(accounts: usize) -> QueryEngine {
    let start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
    let mut store = InMemoryStore::new();
    for i in 0..accounts {
        let id = Uuid::new_v4();
        store.insert(
            Record::new("account", id)
                .with("name", format!("Account {i}"))
                .with("statecode", Value::OptionSet((i % 2) as i32))
                .with("revenue", Value::Money(Decimal::from(i as i64 * 100)))
                .with("createdon", start + Duration::hours(i as i64 * 7)),
        );
        for j in 0..(i % 3) {
            store.insert(
                Record::new("contact", Uuid::new_v4())
                    .with("fullname", format!("Contact {i}-{j}"))
                    .with("statecode", Value::OptionSet((j % 2) as i32))
                    .with("parentcustomerid", EntityReference::new("account", id)),
            );
        }
    }
    QueryEngine::new(store, metadata()).with_config(EngineConfig::default().with_fixed_now(start))
}

fn bench_translate(c: &mut Criterion) {
    let mut group = c.benchmark_group("translate");
    for (name, xml) in [("filtered", FILTERED), ("joined", JOINED), ("aggregate", AGGREGATE)] {
        group.bench_function(name, |b| b.iter(|| translate_fetchxml_to_query_description(black_box(xml))));
    }
    group.finish();
}

fn bench_execute(c: &mut Criterion) {
    let mut group = c.benchmark_group("execute");

    for size in [100, 1000, 10000] {
        let engine = engine(size);
        for (name, xml) in [
            ("filtered", FILTERED),
            ("joined", JOINED),
            ("not_any", NOT_ANY),
            ("aggregate", AGGREGATE),
        ] {
            let query = translate_fetchxml_to_query_description(xml).unwrap();
            group.bench_with_input(BenchmarkId::new(name, size), &query, |b, query| {
                b.iter(|| engine.execute(black_box(query)))
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_translate, bench_execute);
criterion_main!(benches);
