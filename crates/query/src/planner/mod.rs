//! Join planning.
//!
//! Planning validates the root entity and every link endpoint, allocates
//! link aliases and records which entity each alias refers to.

mod alias;

pub use alias::AliasAllocator;

use crate::ast::{LinkDescriptor, QueryDescription};
use crate::resolver::AttributeResolver;
use fetchkit_core::{Error, Result};
use hashbrown::HashMap;
use tracing::trace;

/// Link alias to target entity.
pub type AliasMap = HashMap<String, String>;

/// A link with its allocated alias.
#[derive(Clone, Debug)]
pub struct PlannedLink<'q> {
    pub alias: String,
    pub descriptor: &'q LinkDescriptor,
    pub children: Vec<PlannedLink<'q>>,
}

/// A validated query with its link tree.
#[derive(Clone, Debug)]
pub struct JoinPlan<'q> {
    pub root: &'q str,
    pub primary_id: String,
    pub links: Vec<PlannedLink<'q>>,
    pub aliases: AliasMap,
}

/// Plans a query.
pub fn plan<'q>(query: &'q QueryDescription, resolver: &AttributeResolver<'_>) -> Result<JoinPlan<'q>> {
    if !resolver.knows_entity(&query.entity) {
        return Err(Error::unknown_entity(&query.entity));
    }
    let primary_id = resolver.primary_id(&query.entity)?;

    let mut allocator = AliasAllocator::new();
    reserve_explicit(&query.links, &mut allocator)?;

    let mut aliases = AliasMap::new();
    let links = plan_links(&query.entity, &query.links, resolver, &mut allocator, &mut aliases)?;
    trace!(entity = %query.entity, links = aliases.len(), "planned query");

    Ok(JoinPlan {
        root: &query.entity,
        primary_id,
        links,
        aliases,
    })
}

fn reserve_explicit(links: &[LinkDescriptor], allocator: &mut AliasAllocator) -> Result<()> {
    for link in links {
        if let Some(alias) = &link.alias {
            allocator.reserve(alias)?;
        }
        reserve_explicit(&link.links, allocator)?;
    }
    Ok(())
}

fn plan_links<'q>(
    parent_entity: &str,
    links: &'q [LinkDescriptor],
    resolver: &AttributeResolver<'_>,
    allocator: &mut AliasAllocator,
    aliases: &mut AliasMap,
) -> Result<Vec<PlannedLink<'q>>> {
    let mut planned = Vec::with_capacity(links.len());
    for link in links {
        if !resolver.knows_entity(&link.to_entity) {
            return Err(Error::unknown_entity(&link.to_entity));
        }
        resolver.resolve(parent_entity, &link.from_attribute)?;
        resolver.resolve(&link.to_entity, &link.to_attribute)?;

        let alias = match &link.alias {
            Some(alias) => alias.clone(),
            None => allocator.allocate(&link.to_entity),
        };
        aliases.insert(alias.clone(), link.to_entity.clone());

        let children = plan_links(&link.to_entity, &link.links, resolver, allocator, aliases)?;
        planned.push(PlannedLink {
            alias,
            descriptor: link,
            children,
        });
    }
    Ok(planned)
}
