//! Symbol identity resolver - USR to typed id, and back
//!
//! One `IdCache` belongs to exactly one `IndexFile`. Ids are handed out in
//! first-seen order starting at zero for each category, so the inverse map
//! is just a vector indexed by id.

use crate::id::{Category, FuncCategory, Id, TypeCategory, VarCategory};
use crate::id::{FuncId, TypeId, VarId};
use crate::symbol::{SymbolKind, Usr};
use crate::{Error, Result};
use std::collections::HashMap;
use std::fmt;

/// Forward and inverse mapping for one category.
struct IdMap<T> {
    forward: HashMap<Usr, Id<T>>,
    inverse: Vec<Usr>,
}

impl<T> Clone for IdMap<T> {
    fn clone(&self) -> Self {
        Self {
            forward: self.forward.clone(),
            inverse: self.inverse.clone(),
        }
    }
}

impl<T: Category> fmt::Debug for IdMap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdMap")
            .field("category", &T::NAME)
            .field("len", &self.inverse.len())
            .finish()
    }
}

impl<T> Default for IdMap<T> {
    fn default() -> Self {
        Self {
            forward: HashMap::new(),
            inverse: Vec::new(),
        }
    }
}

impl<T: Category> IdMap<T> {
    fn get(&self, usr: &str) -> Option<Id<T>> {
        self.forward.get(usr).copied()
    }

    /// Returns the id and whether it was freshly allocated.
    fn get_or_insert(&mut self, usr: &str) -> (Id<T>, bool) {
        if let Some(id) = self.forward.get(usr) {
            return (*id, false);
        }
        let id = Id::from_index(self.inverse.len());
        let usr = Usr::from(usr);
        self.forward.insert(usr.clone(), id);
        self.inverse.push(usr);
        (id, true)
    }

    fn usr(&self, id: Id<T>) -> Option<&Usr> {
        id.index().and_then(|index| self.inverse.get(index))
    }

    fn len(&self) -> usize {
        self.inverse.len()
    }
}

impl<T> PartialEq for IdMap<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inverse == other.inverse
    }
}

/// Per-file USR resolver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdCache {
    primary_file: String,
    types: IdMap<TypeCategory>,
    funcs: IdMap<FuncCategory>,
    vars: IdMap<VarCategory>,
}

impl IdCache {
    pub fn new(primary_file: impl Into<String>) -> Self {
        Self {
            primary_file: primary_file.into(),
            ..Default::default()
        }
    }

    /// Rebuild a resolver from entity USRs listed in id order.
    ///
    /// Fails if a USR repeats, within or across categories.
    pub fn rebuild<'a>(
        primary_file: impl Into<String>,
        type_usrs: impl IntoIterator<Item = &'a Usr>,
        func_usrs: impl IntoIterator<Item = &'a Usr>,
        var_usrs: impl IntoIterator<Item = &'a Usr>,
    ) -> Result<Self> {
        let mut cache = Self::new(primary_file);
        for usr in type_usrs {
            cache.insert_unique(usr, SymbolKind::Type)?;
        }
        for usr in func_usrs {
            cache.insert_unique(usr, SymbolKind::Func)?;
        }
        for usr in var_usrs {
            cache.insert_unique(usr, SymbolKind::Var)?;
        }
        Ok(cache)
    }

    fn insert_unique(&mut self, usr: &Usr, kind: SymbolKind) -> Result<()> {
        let existing = self.kind_of(usr.as_str());
        if existing != SymbolKind::Invalid {
            return Err(Error::CorruptIndex(format!(
                "USR {usr} listed as {kind} but already indexed as {existing}"
            )));
        }
        match kind {
            SymbolKind::Type => {
                self.types.get_or_insert(usr.as_str());
            }
            SymbolKind::Func => {
                self.funcs.get_or_insert(usr.as_str());
            }
            SymbolKind::Var => {
                self.vars.get_or_insert(usr.as_str());
            }
            SymbolKind::Invalid | SymbolKind::File => {
                return Err(Error::CorruptIndex(format!("USR {usr} has non-entity kind {kind}")));
            }
        }
        Ok(())
    }

    pub fn primary_file(&self) -> &str {
        &self.primary_file
    }

    /// Category currently holding `usr`, or `Invalid` if unseen.
    pub fn kind_of(&self, usr: &str) -> SymbolKind {
        if self.types.get(usr).is_some() {
            SymbolKind::Type
        } else if self.funcs.get(usr).is_some() {
            SymbolKind::Func
        } else if self.vars.get(usr).is_some() {
            SymbolKind::Var
        } else {
            SymbolKind::Invalid
        }
    }

    fn assert_unclaimed(&self, usr: &str, kind: SymbolKind) {
        let existing = self.kind_of(usr);
        assert!(
            existing == SymbolKind::Invalid || existing == kind,
            "USR {usr} requested as {kind} but already indexed as {existing} in {}",
            self.primary_file
        );
    }

    pub fn type_id(&self, usr: &str) -> Option<TypeId> {
        self.types.get(usr)
    }

    pub fn func_id(&self, usr: &str) -> Option<FuncId> {
        self.funcs.get(usr)
    }

    pub fn var_id(&self, usr: &str) -> Option<VarId> {
        self.vars.get(usr)
    }

    /// Get or allocate the type id for `usr`.
    ///
    /// Panics if `usr` is already indexed as a function or variable.
    pub fn get_or_insert_type(&mut self, usr: &str) -> (TypeId, bool) {
        self.assert_unclaimed(usr, SymbolKind::Type);
        self.types.get_or_insert(usr)
    }

    /// Get or allocate the function id for `usr`.
    pub fn get_or_insert_func(&mut self, usr: &str) -> (FuncId, bool) {
        self.assert_unclaimed(usr, SymbolKind::Func);
        self.funcs.get_or_insert(usr)
    }

    /// Get or allocate the variable id for `usr`.
    pub fn get_or_insert_var(&mut self, usr: &str) -> (VarId, bool) {
        self.assert_unclaimed(usr, SymbolKind::Var);
        self.vars.get_or_insert(usr)
    }

    pub fn type_usr(&self, id: TypeId) -> Option<&Usr> {
        self.types.usr(id)
    }

    pub fn func_usr(&self, id: FuncId) -> Option<&Usr> {
        self.funcs.usr(id)
    }

    pub fn var_usr(&self, id: VarId) -> Option<&Usr> {
        self.vars.usr(id)
    }

    /// Inverse lookup for an id of any category
    pub fn usr_of<T: Category>(&self, id: Id<T>) -> Option<&Usr> {
        match T::KIND {
            SymbolKind::Type => self.types.usr(id.retag()),
            SymbolKind::Func => self.funcs.usr(id.retag()),
            SymbolKind::Var => self.vars.usr(id.retag()),
            SymbolKind::Invalid | SymbolKind::File => None,
        }
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn func_count(&self) -> usize {
        self.funcs.len()
    }

    pub fn var_count(&self) -> usize {
        self.vars.len()
    }
}
