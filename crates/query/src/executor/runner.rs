//! Query runner - executes a `QueryDescription` against a store.
//!
//! Planning, root criteria, sort keys, projection and aggregate columns are
//! all resolved before the first record is read. Link filters compile as
//! their link is applied. Any error aborts the whole run.
//!
//! Stages run in this order: scan the root entity, apply links in declared
//! order (depth first), filter with the root criteria conjoined with the
//! filters of inner links and the relaxed filters of outer links, then
//! either aggregate or sort and project, then distinct, top and paging.

use crate::ast::{ColumnSet, JoinKind, OrderBy, Paging, QueryDescription};
use crate::compiler::{Accessor, CompileScope, CompiledPredicate, PredicateCompiler};
use crate::context::QueryContext;
use crate::executor::aggregate::{AggregateColumn, AggregateKind};
use crate::executor::join::{ExistsJoin, HashJoin};
use crate::executor::project::{ProjectColumn, Selection};
use crate::executor::{
    AggregateExecutor, DistinctExecutor, FilterExecutor, LimitExecutor, ProjectExecutor, Relation, SortExecutor,
    SortKey, TableScanExecutor,
};
use crate::planner::{plan, AliasMap, JoinPlan, PlannedLink};
use crate::resolver::AttributeResolver;
use fetchkit_core::{Error, Record, Result, ALIAS_SEPARATOR};
use tracing::{debug, debug_span};

/// Records produced by a query.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryResult {
    pub records: Vec<Record>,
    /// Number of records before paging; set when the query asked for it.
    pub total_record_count: Option<usize>,
    /// Whether records exist past the returned page.
    pub more_records: bool,
}

impl QueryResult {
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Executes queries within one context.
pub struct QueryRunner<'a> {
    ctx: QueryContext<'a>,
}

impl<'a> QueryRunner<'a> {
    pub fn new(ctx: QueryContext<'a>) -> Self {
        Self { ctx }
    }

    /// Runs a query to completion.
    pub fn run(&self, query: &QueryDescription) -> Result<QueryResult> {
        let span = debug_span!("execute", entity = %query.entity);
        let _enter = span.enter();

        let resolver = AttributeResolver::from_context(&self.ctx);
        let plan = plan(query, &resolver)?;
        let compiler = PredicateCompiler::new(self.ctx, &resolver, &plan.aliases);
        let execution = Execution {
            ctx: self.ctx,
            resolver: &resolver,
            compiler: &compiler,
            aliases: &plan.aliases,
        };
        execution.run(query, &plan)
    }
}

/// Output stage of a query, prepared before execution.
enum Shape {
    Aggregate(AggregateExecutor),
    Rows { sort: SortExecutor, project: ProjectExecutor },
}

struct Execution<'x> {
    ctx: QueryContext<'x>,
    resolver: &'x AttributeResolver<'x>,
    compiler: &'x PredicateCompiler<'x>,
    aliases: &'x AliasMap,
}

impl Execution<'_> {
    fn run(&self, query: &QueryDescription, plan: &JoinPlan<'_>) -> Result<QueryResult> {
        let criteria = self
            .compiler
            .compile_filter(&query.criteria, CompileScope::root(&query.entity))?;
        let shape = if query.aggregate {
            Shape::Aggregate(AggregateExecutor::new(
                query.entity.as_str(),
                self.aggregate_columns(query, plan)?,
                self.ctx.metadata.time_zone(),
            ))
        } else {
            Shape::Rows {
                sort: SortExecutor::new(self.sort_keys(query, plan)?),
                project: self.projection(query, plan)?,
            }
        };

        let relation = TableScanExecutor::new(&query.entity, &plan.primary_id).execute(self.ctx.store);
        debug!(rows = relation.len(), "rows materialized");

        let mut filters = vec![criteria];
        let relation = self.apply_links(relation, &plan.links, None, &mut filters)?;
        if !plan.links.is_empty() {
            debug!(links = plan.aliases.len(), rows = relation.len(), "joins applied");
        }

        let relation = FilterExecutor::new(CompiledPredicate::and(filters)).execute(relation);
        debug!(rows = relation.len(), "rows after filter");

        let relation = match shape {
            Shape::Aggregate(aggregate) => aggregate.execute(relation),
            Shape::Rows { sort, project } => project.execute(sort.execute(relation)),
        };

        let relation = if query.distinct {
            DistinctExecutor.execute(relation)
        } else {
            relation
        };
        let relation = match query.top {
            Some(top) => LimitExecutor::limit_only(top).execute(relation),
            None => relation,
        };

        let total = relation.len();
        let (relation, more_records) = self.page(&query.paging, relation);
        debug!(rows = relation.len(), total, more_records, "page produced");

        Ok(QueryResult {
            records: relation.into_records(),
            total_record_count: query.paging.return_total_count.then_some(total),
            more_records,
        })
    }

    fn scan(&self, entity: &str) -> Result<Relation> {
        let primary_id = self.resolver.primary_id(entity)?;
        Ok(TableScanExecutor::new(entity, &primary_id).execute(self.ctx.store))
    }

    /// Applies `links` to `relation`. Filters that must wait until every
    /// join is done are pushed onto `deferred`.
    fn apply_links(
        &self,
        mut relation: Relation,
        links: &[PlannedLink<'_>],
        parent: Option<&str>,
        deferred: &mut Vec<CompiledPredicate>,
    ) -> Result<Relation> {
        for link in links {
            let descriptor = link.descriptor;
            let left_key = qualify(parent, &descriptor.from_attribute);
            let right = self.scan(&descriptor.to_entity)?;

            relation = match descriptor.kind {
                JoinKind::Inner => {
                    let scope = CompileScope::link(&descriptor.to_entity, &link.alias);
                    if !descriptor.filter.is_empty() {
                        deferred.push(self.compiler.compile_filter(&descriptor.filter, scope)?);
                    }
                    let joined = HashJoin::inner(left_key, descriptor.to_attribute.as_str(), link.alias.as_str())
                        .execute(relation, right);
                    self.apply_links(joined, &link.children, Some(&link.alias), deferred)?
                }
                JoinKind::LeftOuter => {
                    let scope = CompileScope::root(&descriptor.to_entity);
                    let filter = self.compiler.compile_filter(&descriptor.filter, scope)?;
                    let right = FilterExecutor::new(filter).execute(right);
                    if !descriptor.filter.is_empty() {
                        // already applied by the join
                        let scope = CompileScope::link(&descriptor.to_entity, &link.alias);
                        deferred.push(self.compiler.compile_filter(&descriptor.filter.relaxed(), scope)?);
                    }
                    let joined = HashJoin::left_outer(left_key, descriptor.to_attribute.as_str(), link.alias.as_str())
                        .execute(relation, right);
                    self.apply_links(joined, &link.children, Some(&link.alias), deferred)?
                }
                kind => {
                    let scope = CompileScope::root(&descriptor.to_entity);
                    let mut correlated = vec![self.compiler.compile_filter(&descriptor.filter, scope)?];
                    let right = self.apply_links(right, &link.children, None, &mut correlated)?;
                    ExistsJoin::new(
                        kind,
                        left_key,
                        descriptor.to_attribute.as_str(),
                        CompiledPredicate::and(correlated),
                    )
                    .execute(relation, right)
                }
            };
            debug!(alias = %link.alias, kind = ?descriptor.kind, rows = relation.len(), "link applied");
        }
        Ok(relation)
    }

    /// Entity and record prefix an attribute reference points at.
    fn source(&self, alias: Option<&str>, entity: &str, prefix: Option<&str>) -> Result<(String, Option<String>)> {
        match alias {
            Some(alias) => {
                let entity = self.aliases.get(alias).ok_or_else(|| {
                    Error::catalog(format!("No link-entity with alias '{alias}' was found in the query"))
                })?;
                Ok((entity.clone(), Some(alias.to_string())))
            }
            None => Ok((entity.to_string(), prefix.map(str::to_string))),
        }
    }

    fn sort_key(&self, order: &OrderBy, entity: &str, prefix: Option<&str>) -> Result<SortKey> {
        let (entity, prefix) = self.source(order.entity_alias.as_deref(), entity, prefix)?;
        let resolved = self.resolver.resolve(&entity, &order.attribute)?;
        Ok(SortKey::new(Accessor::new(prefix.as_deref(), &resolved), order.order))
    }

    /// Root orders first, then the orders declared inside merged links.
    fn sort_keys(&self, query: &QueryDescription, plan: &JoinPlan<'_>) -> Result<Vec<SortKey>> {
        let mut keys = Vec::with_capacity(query.orders.len());
        for order in &query.orders {
            keys.push(self.sort_key(order, &query.entity, None)?);
        }
        for link in merged_links(&plan.links) {
            for order in &link.descriptor.orders {
                keys.push(self.sort_key(order, &link.descriptor.to_entity, Some(&link.alias))?);
            }
        }
        Ok(keys)
    }

    fn selection(&self, columns: &ColumnSet, entity: &str) -> Result<Selection> {
        Ok(match columns {
            ColumnSet::All => Selection::All,
            ColumnSet::None => Selection::None,
            ColumnSet::Columns(columns) => {
                let mut projected = Vec::with_capacity(columns.len());
                for column in columns {
                    self.resolver.resolve(entity, &column.name)?;
                    projected.push(ProjectColumn::new(column.name.as_str(), column.alias.clone()));
                }
                Selection::Columns(projected)
            }
        })
    }

    fn projection(&self, query: &QueryDescription, plan: &JoinPlan<'_>) -> Result<ProjectExecutor> {
        let root = self.selection(&query.columns, &query.entity)?;
        let mut project = ProjectExecutor::new(query.entity.as_str(), plan.primary_id.as_str(), root);
        for link in merged_links(&plan.links) {
            let selection = self.selection(&link.descriptor.columns, &link.descriptor.to_entity)?;
            project = project.with_link(link.alias.as_str(), selection);
        }
        Ok(project)
    }

    fn aggregate_columns(&self, query: &QueryDescription, plan: &JoinPlan<'_>) -> Result<Vec<AggregateColumn>> {
        let mut columns = Vec::new();
        self.collect_aggregate(&query.columns, &query.entity, None, &mut columns)?;
        for link in merged_links(&plan.links) {
            self.collect_aggregate(
                &link.descriptor.columns,
                &link.descriptor.to_entity,
                Some(&link.alias),
                &mut columns,
            )?;
        }
        if columns.is_empty() {
            return Err(Error::validation(
                "An aggregate query must contain at least one aggregate or groupby attribute",
            ));
        }
        Ok(columns)
    }

    fn collect_aggregate(
        &self,
        set: &ColumnSet,
        entity: &str,
        alias: Option<&str>,
        out: &mut Vec<AggregateColumn>,
    ) -> Result<()> {
        let columns = match set {
            ColumnSet::All => {
                return Err(Error::validation(
                    "all-attributes can not be used in an aggregate query",
                ))
            }
            ColumnSet::None => return Ok(()),
            ColumnSet::Columns(columns) => columns,
        };
        for column in columns {
            let output = column.alias.clone().ok_or_else(|| {
                Error::validation(format!(
                    "Attribute '{}' of an aggregate query requires an alias",
                    column.name
                ))
            })?;
            let kind = match (column.aggregate, column.group_by) {
                (Some(func), _) => AggregateKind::Function {
                    func,
                    distinct: column.distinct,
                },
                (None, true) => AggregateKind::GroupBy(column.date_grouping),
                (None, false) => {
                    return Err(Error::validation(format!(
                        "Attribute '{}' of an aggregate query must have an aggregate or be a groupby",
                        column.name
                    )))
                }
            };
            let resolved = self.resolver.resolve(entity, &column.name)?;
            out.push(AggregateColumn {
                output,
                source: alias.unwrap_or(entity).to_string(),
                attribute: column.name.clone(),
                accessor: Accessor::new(alias, &resolved),
                kind,
            });
        }
        Ok(())
    }

    fn page(&self, paging: &Paging, relation: Relation) -> (Relation, bool) {
        if !paging.is_requested() {
            return (relation, false);
        }
        let size = paging.count.unwrap_or(self.ctx.default_page_size);
        let page = paging.page.unwrap_or(1).max(1);
        let offset = (page - 1).saturating_mul(size);
        let more_records = relation.len() > offset.saturating_add(size);
        (LimitExecutor::new(size, offset).execute(relation), more_records)
    }
}

fn qualify(prefix: Option<&str>, attribute: &str) -> String {
    match prefix {
        Some(alias) => format!("{alias}{ALIAS_SEPARATOR}{attribute}"),
        None => attribute.to_string(),
    }
}

/// Links whose attributes end up in the result rows: inner and outer
/// links, reached through inner and outer parents only. Parents come
/// before children.
fn merged_links<'p, 'q>(links: &'p [PlannedLink<'q>]) -> Vec<&'p PlannedLink<'q>> {
    fn walk<'p, 'q>(links: &'p [PlannedLink<'q>], out: &mut Vec<&'p PlannedLink<'q>>) {
        for link in links {
            if link.descriptor.kind.is_existential() {
                continue;
            }
            out.push(link);
            walk(&link.children, out);
        }
    }
    let mut out = Vec::new();
    walk(links, &mut out);
    out
}
