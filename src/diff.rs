//! Index diff - compare two indexes of the same file by signature
//!
//! Ids are only meaningful inside their own container, so entities are
//! matched by USR and their links are compared by the USR they resolve to.
//! A re-index of an unchanged file yields an empty diff.

use crate::entity::Entity;
use crate::id_cache::IdCache;
use crate::index_file::IndexFile;
use crate::symbol::{SymbolKind, Usr};
use std::collections::HashMap;

/// Changes within one entity category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryDiff {
    pub added: Vec<Usr>,
    pub removed: Vec<Usr>,
    /// Present on both sides with a different `Def`
    pub changed: Vec<Usr>,
    /// Same `Def`, but usages or reverse edges moved
    pub references_changed: Vec<Usr>,
}

impl CategoryDiff {
    /// Compare two entity arrays, each with the resolver of its own file.
    /// Output lists follow the order of the side the signature came from.
    pub fn compute<E: Entity>(
        previous: &[E],
        previous_ids: &IdCache,
        current: &[E],
        current_ids: &IdCache,
    ) -> Self {
        let before: HashMap<&Usr, &E> = previous.iter().map(|e| (e.usr(), e)).collect();
        let after: HashMap<&Usr, &E> = current.iter().map(|e| (e.usr(), e)).collect();

        let mut diff = Self::default();
        for entity in current {
            match before.get(entity.usr()) {
                None => diff.added.push(entity.usr().clone()),
                Some(old) if !old.same_def(previous_ids, entity, current_ids) => {
                    diff.changed.push(entity.usr().clone())
                }
                Some(old) if !old.same_references(previous_ids, entity, current_ids) => {
                    diff.references_changed.push(entity.usr().clone())
                }
                Some(_) => {}
            }
        }
        diff.removed = previous
            .iter()
            .filter(|e| !after.contains_key(e.usr()))
            .map(|e| e.usr().clone())
            .collect();
        diff
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.changed.is_empty()
            && self.references_changed.is_empty()
    }

    /// Number of signatures touched in any way
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.changed.len() + self.references_changed.len()
    }
}

/// Differences between a cached index and a fresh one for the same file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexDiff {
    pub types: CategoryDiff,
    pub funcs: CategoryDiff,
    pub vars: CategoryDiff,
    /// Includes, dependencies, skipped ranges, args or language differ
    pub metadata_changed: bool,
}

impl IndexDiff {
    pub fn compute(previous: &IndexFile, current: &IndexFile) -> Self {
        let metadata_changed = previous.args != current.args
            || previous.language() != current.language()
            || previous.import_file != current.import_file
            || previous.includes != current.includes
            || previous.dependencies != current.dependencies
            || previous.skipped_by_preprocessor != current.skipped_by_preprocessor;

        let (before, after) = (previous.id_cache(), current.id_cache());
        let diff = Self {
            types: CategoryDiff::compute(previous.types(), before, current.types(), after),
            funcs: CategoryDiff::compute(previous.funcs(), before, current.funcs(), after),
            vars: CategoryDiff::compute(previous.vars(), before, current.vars(), after),
            metadata_changed,
        };
        tracing::debug!(
            "Diffed {}: {} type, {} func, {} var changes",
            current.path,
            diff.types.len(),
            diff.funcs.len(),
            diff.vars.len()
        );
        diff
    }

    pub fn is_empty(&self) -> bool {
        !self.metadata_changed && self.types.is_empty() && self.funcs.is_empty() && self.vars.is_empty()
    }

    pub fn category(&self, kind: SymbolKind) -> Option<&CategoryDiff> {
        match kind {
            SymbolKind::Type => Some(&self.types),
            SymbolKind::Func => Some(&self.funcs),
            SymbolKind::Var => Some(&self.vars),
            SymbolKind::Invalid | SymbolKind::File => None,
        }
    }
}
