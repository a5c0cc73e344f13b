//! Compilation of filter trees into record predicates.
//!
//! Compilation resolves every attribute, checks operand arity, coerces
//! operands through the resolved attribute type and rewrites date window
//! operators. All failures surface here, before any record is evaluated.

mod predicate;
mod windows;

pub use predicate::{Accessor, CompiledPredicate, DateTest, EvalType, Predicate, ValueTest};
pub use windows::{rewrite as rewrite_window, WindowContext};

use crate::ast::{ConditionNode, ConditionOperator, FilterNode, LogicalOperator};
use crate::coercion::{coerce, display_text, flatten_operands, operand_int_set, Comparable};
use crate::context::QueryContext;
use crate::hierarchy::Hierarchy;
use crate::planner::AliasMap;
use crate::resolver::{AttributeResolver, ResolvedAttribute};
use crate::temporal::is_midnight;
use chrono::Duration;
use fetchkit_core::pattern_match::LikePattern;
use fetchkit_core::{AttributeType, Error, Result, Uuid, Value, ALIAS_SEPARATOR};
use hashbrown::HashSet;

/// The entity unqualified attributes belong to, and the key prefix under
/// which its attributes appear in joined records.
#[derive(Clone, Copy, Debug)]
pub struct CompileScope<'s> {
    pub entity: &'s str,
    pub prefix: Option<&'s str>,
}

impl<'s> CompileScope<'s> {
    /// Scope of an entity whose attributes are stored unprefixed.
    pub fn root(entity: &'s str) -> Self {
        Self {
            entity,
            prefix: None,
        }
    }

    /// Scope of a link whose attributes are stored under `alias.`.
    pub fn link(entity: &'s str, alias: &'s str) -> Self {
        Self {
            entity,
            prefix: Some(alias),
        }
    }
}

/// Compiles conditions and filters.
pub struct PredicateCompiler<'a> {
    ctx: QueryContext<'a>,
    resolver: &'a AttributeResolver<'a>,
    aliases: &'a AliasMap,
    windows: WindowContext,
}

impl<'a> PredicateCompiler<'a> {
    pub fn new(ctx: QueryContext<'a>, resolver: &'a AttributeResolver<'a>, aliases: &'a AliasMap) -> Self {
        let windows = WindowContext {
            now: ctx.now,
            offset: ctx.metadata.time_zone(),
            fiscal: ctx.metadata.fiscal_settings(),
        };
        Self {
            ctx,
            resolver,
            aliases,
            windows,
        }
    }

    /// Compiles a filter tree.
    pub fn compile_filter(&self, filter: &FilterNode, scope: CompileScope<'_>) -> Result<CompiledPredicate> {
        let mut parts = Vec::with_capacity(filter.conditions.len() + filter.filters.len());
        for condition in &filter.conditions {
            parts.push(self.compile_condition(condition, scope)?);
        }
        for nested in &filter.filters {
            parts.push(self.compile_filter(nested, scope)?);
        }
        Ok(match filter.operator {
            LogicalOperator::And => CompiledPredicate::and(parts),
            LogicalOperator::Or => CompiledPredicate::or(parts),
        })
    }

    /// Compiles one condition.
    pub fn compile_condition(&self, cond: &ConditionNode, scope: CompileScope<'_>) -> Result<CompiledPredicate> {
        self.compile_node(cond, scope, false)
    }

    fn target<'s>(&'s self, alias: Option<&'s str>, scope: CompileScope<'s>) -> Result<(&'s str, Option<&'s str>)> {
        match alias {
            Some(alias) => {
                let entity = self.aliases.get(alias).ok_or_else(|| {
                    Error::catalog(format!("No link-entity with alias '{alias}' was found in the query"))
                })?;
                Ok((entity.as_str(), Some(alias)))
            }
            None => Ok((scope.entity, scope.prefix)),
        }
    }

    fn compile_node(&self, cond: &ConditionNode, scope: CompileScope<'_>, rewritten: bool) -> Result<CompiledPredicate> {
        if cond.outer {
            return Ok(CompiledPredicate::Constant(true));
        }

        let (entity, prefix) = self.target(cond.entity_alias.as_deref(), scope)?;
        let resolved = self.resolver.resolve(entity, &cond.attribute)?;
        let accessor = Accessor::new(prefix, &resolved);
        let op = cond.operator;

        if let Some(other) = &cond.compare_column {
            return self.compile_columns(cond, accessor, other, entity, prefix);
        }

        let values = flatten_operands(&cond.values);
        let arity = op.arity();
        if !arity.accepts(values.len()) {
            return Err(Error::argument_count(op.to_string(), arity.describe(), values.len()));
        }

        if resolved.attribute_type == AttributeType::MultiSelectOptionSet {
            return self.compile_multi_select(cond, accessor);
        }
        if matches!(op, ConditionOperator::ContainValues | ConditionOperator::DoesNotContainValues) {
            return Err(Error::unsupported_operator(format!(
                "The operator '{op}' is only supported for multi-select option set attributes, not '{}'",
                cond.attribute
            )));
        }
        if op.is_date_operator() && !resolved.attribute_type.is_temporal() {
            return Err(Error::unsupported_operator(format!(
                "The operator '{op}' is not valid for attribute '{}' of type {:?}",
                cond.attribute, resolved.attribute_type
            )));
        }
        if op.is_hierarchy() {
            return self.compile_hierarchy(cond, accessor, &resolved, &values);
        }
        if let Some(derived) = windows::rewrite(cond, &values, &self.windows)? {
            return self.compile_node(&derived, scope, true);
        }

        let attribute_type = resolved.attribute_type;
        use ConditionOperator as Op;
        let predicate = match op {
            Op::Equal | Op::NotEqual | Op::In | Op::NotIn => {
                let operands: Vec<_> = values
                    .iter()
                    .filter_map(|v| coerce(v, attribute_type, Some(v)))
                    .collect();
                if operands.is_empty() {
                    return Ok(CompiledPredicate::Constant(false));
                }
                CompiledPredicate::Value {
                    accessor,
                    test: ValueTest::AnyOf(operands),
                    negate: matches!(op, Op::NotEqual | Op::NotIn),
                    sample: values.first().cloned(),
                }
            }
            Op::GreaterThan | Op::GreaterEqual | Op::LessThan | Op::LessEqual => {
                let eval_type = match op {
                    Op::GreaterThan => EvalType::Gt,
                    Op::GreaterEqual => EvalType::Ge,
                    Op::LessThan => EvalType::Lt,
                    _ => EvalType::Le,
                };
                let operand = &values[0];
                match coerce(operand, attribute_type, Some(operand)) {
                    Some(c) => CompiledPredicate::Value {
                        accessor,
                        test: ValueTest::Compare(eval_type, c),
                        negate: false,
                        sample: Some(operand.clone()),
                    },
                    None => CompiledPredicate::Constant(false),
                }
            }
            Op::Like
            | Op::NotLike
            | Op::BeginsWith
            | Op::DoesNotBeginWith
            | Op::EndsWith
            | Op::DoesNotEndWith
            | Op::Contains
            | Op::DoesNotContain => {
                let text = display_text(&values[0]);
                let pattern = match op {
                    Op::BeginsWith | Op::DoesNotBeginWith => format!("{text}%"),
                    Op::EndsWith | Op::DoesNotEndWith => format!("%{text}"),
                    Op::Contains | Op::DoesNotContain => format!("%{text}%"),
                    _ => text,
                };
                CompiledPredicate::Like {
                    accessor,
                    pattern: LikePattern::compile(&pattern),
                    negate: matches!(
                        op,
                        Op::NotLike | Op::DoesNotBeginWith | Op::DoesNotEndWith | Op::DoesNotContain
                    ),
                }
            }
            Op::Null | Op::NotNull => CompiledPredicate::IsNull {
                accessor,
                negate: op == Op::NotNull,
            },
            Op::Between | Op::NotBetween => {
                let from = coerce(&values[0], attribute_type, Some(&values[0]));
                let mut to = coerce(&values[1], attribute_type, Some(&values[1]));
                if !rewritten {
                    if let Some(Comparable::DateTime(upper)) = to {
                        if is_midnight(upper) {
                            to = Some(Comparable::DateTime(
                                upper + Duration::days(1) - Duration::milliseconds(1),
                            ));
                        }
                    }
                }
                match (from, to) {
                    (Some(from), Some(to)) => CompiledPredicate::Value {
                        accessor,
                        test: ValueTest::Range(from, to),
                        negate: op == Op::NotBetween,
                        sample: Some(values[0].clone()),
                    },
                    _ => CompiledPredicate::Constant(false),
                }
            }
            Op::On | Op::NotOn | Op::OnOrAfter | Op::OnOrBefore => {
                let date = match coerce(&values[0], AttributeType::DateTime, None) {
                    Some(Comparable::DateTime(instant)) => instant.date_naive(),
                    _ => {
                        return Err(Error::invalid_argument(format!(
                            "Condition operator {op} on attribute '{}' requires a date value",
                            cond.attribute
                        )))
                    }
                };
                let test = match op {
                    Op::OnOrAfter => DateTest::OnOrAfter,
                    Op::OnOrBefore => DateTest::OnOrBefore,
                    _ => DateTest::On,
                };
                CompiledPredicate::Value {
                    accessor,
                    test: ValueTest::Date {
                        test,
                        date,
                        offset: self.windows.offset,
                    },
                    negate: op == Op::NotOn,
                    sample: None,
                }
            }
            Op::EqualUserId | Op::NotEqualUserId | Op::EqualBusinessId | Op::NotEqualBusinessId => {
                let id = match op {
                    Op::EqualUserId | Op::NotEqualUserId => self.ctx.caller.user_id,
                    _ => self.ctx.caller.business_unit_id,
                };
                CompiledPredicate::Value {
                    accessor,
                    test: ValueTest::AnyOf(vec![Comparable::Guid(id)]),
                    negate: matches!(op, Op::NotEqualUserId | Op::NotEqualBusinessId),
                    sample: None,
                }
            }
            other => {
                return Err(Error::unsupported_operator(format!(
                    "The operator '{other}' is not supported for attribute '{}'",
                    cond.attribute
                )))
            }
        };
        Ok(predicate)
    }

    fn compile_columns(
        &self,
        cond: &ConditionNode,
        left: Accessor,
        other: &str,
        entity: &str,
        prefix: Option<&str>,
    ) -> Result<CompiledPredicate> {
        let op = cond.operator;
        if !op.supports_column_comparison() {
            return Err(Error::unsupported_operator(format!(
                "The operator '{op}' is not supported when comparing attribute '{}' to another column",
                cond.attribute
            )));
        }
        let (other_entity, other_prefix, other_attribute) = match other.split_once(ALIAS_SEPARATOR) {
            Some((alias, attribute)) => {
                let entity = self.aliases.get(alias).ok_or_else(|| {
                    Error::catalog(format!("No link-entity with alias '{alias}' was found in the query"))
                })?;
                (entity.as_str(), Some(alias), attribute)
            }
            None => (entity, prefix, other),
        };
        let resolved = self.resolver.resolve(other_entity, other_attribute)?;
        let right = Accessor::new(other_prefix, &resolved);
        let eval_type = match op {
            ConditionOperator::Equal => EvalType::Eq,
            ConditionOperator::NotEqual => EvalType::Ne,
            ConditionOperator::GreaterThan => EvalType::Gt,
            ConditionOperator::GreaterEqual => EvalType::Ge,
            ConditionOperator::LessThan => EvalType::Lt,
            _ => EvalType::Le,
        };
        Ok(CompiledPredicate::Columns {
            left,
            right,
            eval_type,
        })
    }

    fn compile_multi_select(&self, cond: &ConditionNode, accessor: Accessor) -> Result<CompiledPredicate> {
        use ConditionOperator as Op;
        let op = cond.operator;
        let predicate = match op {
            Op::Null | Op::NotNull => CompiledPredicate::IsNull {
                accessor,
                negate: op == Op::NotNull,
            },
            Op::Equal | Op::NotEqual | Op::In | Op::NotIn => {
                let codes = operand_int_set(&cond.values)?;
                if codes.is_empty() {
                    return Ok(CompiledPredicate::Constant(false));
                }
                CompiledPredicate::Value {
                    accessor,
                    test: ValueTest::SetEquals(codes),
                    negate: matches!(op, Op::NotEqual | Op::NotIn),
                    sample: None,
                }
            }
            Op::ContainValues | Op::DoesNotContainValues => CompiledPredicate::Value {
                accessor,
                test: ValueTest::SetOverlaps(operand_int_set(&cond.values)?),
                negate: op == Op::DoesNotContainValues,
                sample: None,
            },
            other => {
                return Err(Error::unsupported_operator(format!(
                    "The operator '{other}' is not supported for multi-select option set attribute '{}'",
                    cond.attribute
                )))
            }
        };
        Ok(predicate)
    }

    fn compile_hierarchy(
        &self,
        cond: &ConditionNode,
        accessor: Accessor,
        resolved: &ResolvedAttribute,
        values: &[Value],
    ) -> Result<CompiledPredicate> {
        use ConditionOperator as Op;
        let entity = resolved.entity.as_str();
        let parent_attribute = self
            .ctx
            .metadata
            .hierarchy_parent_attribute(entity)
            .ok_or_else(|| {
                Error::configuration(format!(
                    "Entity '{entity}' has no hierarchical relationship configured"
                ))
            })?;
        let id = match values[0].unwrap_aliased() {
            Value::Guid(g) => Some(*g),
            Value::Reference(r) => Some(r.id),
            Value::String(s) => Uuid::parse_str(s.trim()).ok(),
            _ => None,
        }
        .ok_or_else(|| {
            Error::invalid_argument(format!(
                "Condition operator {} on attribute '{}' requires a record id",
                cond.operator, cond.attribute
            ))
        })?;

        let hierarchy = Hierarchy::new(self.ctx.store, entity, parent_attribute);
        let mut ids: HashSet<Uuid> = HashSet::new();
        if hierarchy.contains(id) {
            match cond.operator {
                Op::Above | Op::AboveOrEqual => ids.extend(hierarchy.ancestors(id)),
                _ => ids.extend(hierarchy.descendants(id)),
            }
            if matches!(cond.operator, Op::AboveOrEqual | Op::UnderOrEqual) {
                ids.insert(id);
            } else {
                ids.remove(&id);
            }
        }

        Ok(CompiledPredicate::Value {
            accessor,
            test: ValueTest::IdIn(ids),
            negate: cond.operator == Op::NotUnder,
            sample: None,
        })
    }
}
