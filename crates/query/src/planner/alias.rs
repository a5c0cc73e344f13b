//! Link alias allocation.

use crate::ast::LinkDescriptor;
use fetchkit_core::{Error, Result};
use hashbrown::HashSet;
use tracing::trace;

/// Allocates unique link aliases.
///
/// Automatic aliases are the target entity name, then `entity2`,
/// `entity3`, ... skipping names already taken. The allocator is plain
/// state owned by the caller; nothing is shared between queries.
#[derive(Clone, Debug, Default)]
pub struct AliasAllocator {
    taken: HashSet<String>,
}

impl AliasAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `alias` is a legal alias identifier.
    pub fn is_valid_alias(alias: &str) -> bool {
        let mut chars = alias.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        }
    }

    /// Reserves an explicit alias.
    pub fn reserve(&mut self, alias: &str) -> Result<()> {
        if !Self::is_valid_alias(alias) {
            return Err(Error::catalog(format!(
                "Invalid alias '{alias}': aliases must start with a letter or underscore and contain only letters, digits or underscores"
            )));
        }
        if !self.taken.insert(alias.to_string()) {
            return Err(Error::catalog(format!(
                "Table alias '{alias}' is not unique amongst all top-level table and join aliases"
            )));
        }
        Ok(())
    }

    /// Allocates the next free alias for `entity`.
    pub fn allocate(&mut self, entity: &str) -> String {
        let mut candidate = entity.to_string();
        let mut suffix = 1usize;
        while self.taken.contains(&candidate) {
            suffix += 1;
            candidate = format!("{entity}{suffix}");
        }
        self.taken.insert(candidate.clone());
        trace!(alias = %candidate, entity, "allocated link alias");
        candidate
    }

    /// Fills in every missing alias of a link tree.
    ///
    /// Explicit aliases are reserved first, at every depth, so automatic
    /// aliases never collide with one declared later in the tree.
    pub fn assign(&mut self, links: &mut [LinkDescriptor]) -> Result<()> {
        self.reserve_explicit(links)?;
        self.allocate_missing(links);
        Ok(())
    }

    fn reserve_explicit(&mut self, links: &[LinkDescriptor]) -> Result<()> {
        for link in links {
            if let Some(alias) = &link.alias {
                self.reserve(alias)?;
            }
            self.reserve_explicit(&link.links)?;
        }
        Ok(())
    }

    fn allocate_missing(&mut self, links: &mut [LinkDescriptor]) {
        for link in links {
            if link.alias.is_none() {
                link.alias = Some(self.allocate(&link.to_entity));
            }
            self.allocate_missing(&mut link.links);
        }
    }
}
