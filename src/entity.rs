//! Entity records - one per indexed type, function or variable
//!
//! A record pairs a USR and its id with a `Def`, plus lists filled in from
//! other entities' point of view. Those lists are append-only and free of
//! duplicates; they can only grow through the `add_*` methods.

use crate::def::{FuncDef, TypeDef, VarDef, VarParent};
use crate::func_ref::FuncRef;
use crate::id::{Category, FuncId, Id, TypeId, VarId};
use crate::id_cache::IdCache;
use crate::position::Range;
use crate::symbol::{SymbolKind, Usr};
use serde::{Deserialize, Serialize};

/// Push `value` unless an equal element is already present.
pub(crate) fn push_unique<T: PartialEq>(list: &mut Vec<T>, value: T) -> bool {
    if list.contains(&value) {
        return false;
    }
    list.push(value);
    true
}

/// Common view over the three record kinds, used for diffing.
///
/// The comparisons take each record's own resolver, since ids are only
/// meaningful in the file that issued them. Links are compared by USR.
pub trait Entity {
    type Def: PartialEq;

    const KIND: SymbolKind;

    fn usr(&self) -> &Usr;

    fn def(&self) -> &Self::Def;

    /// `Def` equality between records of two indexes of the same file.
    fn same_def(&self, ids: &IdCache, other: &Self, other_ids: &IdCache) -> bool;

    /// Reverse edges and usages match (the non-`Def` half of the record).
    fn same_references(&self, ids: &IdCache, other: &Self, other_ids: &IdCache) -> bool;
}

fn link<'a, T: Category>(ids: &'a IdCache, id: Option<Id<T>>) -> Option<Option<&'a Usr>> {
    id.map(|id| ids.usr_of(id))
}

fn links<'a, T: Category>(ids: &'a IdCache, list: &[Id<T>]) -> Vec<Option<&'a Usr>> {
    list.iter().map(|&id| ids.usr_of(id)).collect()
}

/// Call sites keyed by USR; the implicit flag is kept only when `exact`.
fn call_sites<'a>(ids: &'a IdCache, calls: &[FuncRef], exact: bool) -> Vec<(Option<&'a Usr>, Range, bool)> {
    calls
        .iter()
        .map(|c| (ids.usr_of(c.id), c.range, exact && c.is_implicit))
        .collect()
}

fn parent_link(ids: &IdCache, parent: Option<VarParent>) -> Option<(SymbolKind, Option<&Usr>)> {
    parent.map(|p| match p {
        VarParent::Func(id) => (SymbolKind::Func, ids.usr_of(id)),
        VarParent::Type(id) => (SymbolKind::Type, ids.usr_of(id)),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexType {
    pub usr: Usr,
    pub id: TypeId,
    #[serde(default)]
    pub def: TypeDef,
    /// Immediate derived types
    #[serde(default)]
    derived: Vec<TypeId>,
    /// Declared variables of this type
    #[serde(default)]
    instances: Vec<VarId>,
    /// Every usage, useful for renames
    #[serde(default)]
    uses: Vec<Range>,
}

impl IndexType {
    pub fn new(id: TypeId, usr: Usr) -> Self {
        Self {
            usr,
            id,
            def: TypeDef::default(),
            derived: Vec::new(),
            instances: Vec::new(),
            uses: Vec::new(),
        }
    }

    pub fn derived(&self) -> &[TypeId] {
        &self.derived
    }

    pub fn instances(&self) -> &[VarId] {
        &self.instances
    }

    pub fn uses(&self) -> &[Range] {
        &self.uses
    }

    pub fn add_derived(&mut self, id: TypeId) -> bool {
        push_unique(&mut self.derived, id)
    }

    pub fn add_instance(&mut self, id: VarId) -> bool {
        push_unique(&mut self.instances, id)
    }

    pub fn add_use(&mut self, range: Range) -> bool {
        push_unique(&mut self.uses, range)
    }
}

impl Entity for IndexType {
    type Def = TypeDef;

    const KIND: SymbolKind = SymbolKind::Type;

    fn usr(&self) -> &Usr {
        &self.usr
    }

    fn def(&self) -> &TypeDef {
        &self.def
    }

    fn same_def(&self, ids: &IdCache, other: &Self, other_ids: &IdCache) -> bool {
        let (a, b) = (&self.def, &other.def);
        a.same_description(b)
            && link(ids, a.alias_of) == link(other_ids, b.alias_of)
            && links(ids, &a.parents) == links(other_ids, &b.parents)
            && links(ids, &a.types) == links(other_ids, &b.types)
            && links(ids, &a.funcs) == links(other_ids, &b.funcs)
            && links(ids, &a.vars) == links(other_ids, &b.vars)
    }

    fn same_references(&self, ids: &IdCache, other: &Self, other_ids: &IdCache) -> bool {
        self.uses == other.uses
            && links(ids, &self.derived) == links(other_ids, &other.derived)
            && links(ids, &self.instances) == links(other_ids, &other.instances)
    }
}

/// A forward declaration of a function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuncDeclaration {
    /// Range of only the function name
    pub spelling: Range,
    /// Full range of the declaration
    pub extent: Range,
    /// Full text of the declaration
    pub content: String,
    /// Location of the parameter names
    pub param_spellings: Vec<Range>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexFunc {
    pub usr: Usr,
    pub id: FuncId,
    #[serde(default)]
    pub def: FuncDef,
    /// Places the function is forward-declared
    #[serde(default)]
    declarations: Vec<FuncDeclaration>,
    /// Methods which directly override this one
    #[serde(default)]
    derived: Vec<FuncId>,
    /// Calls and usages. A call from outside any function has no caller id.
    #[serde(default)]
    callers: Vec<FuncRef>,
}

impl IndexFunc {
    pub fn new(id: FuncId, usr: Usr) -> Self {
        Self {
            usr,
            id,
            def: FuncDef::default(),
            declarations: Vec::new(),
            derived: Vec::new(),
            callers: Vec::new(),
        }
    }

    pub fn declarations(&self) -> &[FuncDeclaration] {
        &self.declarations
    }

    pub fn derived(&self) -> &[FuncId] {
        &self.derived
    }

    pub fn callers(&self) -> &[FuncRef] {
        &self.callers
    }

    /// Record a declaration; one per spelling range.
    pub fn add_declaration(&mut self, declaration: FuncDeclaration) -> bool {
        if self.declarations.iter().any(|d| d.spelling == declaration.spelling) {
            return false;
        }
        self.declarations.push(declaration);
        true
    }

    pub fn add_derived(&mut self, id: FuncId) -> bool {
        push_unique(&mut self.derived, id)
    }

    /// Record a call site; the first implicit flag seen for a site is kept.
    pub fn add_caller(&mut self, caller: FuncRef) -> bool {
        if self.callers.iter().any(|c| c.same_call_site(&caller)) {
            return false;
        }
        self.callers.push(caller);
        true
    }

    /// All ranges where this function is named: definition, declarations
    /// and call sites.
    pub fn all_usages(&self) -> Vec<Range> {
        let mut ranges: Vec<Range> = self.def.definition_spelling.into_iter().collect();
        ranges.extend(self.declarations.iter().map(|d| d.spelling));
        ranges.extend(self.callers.iter().map(|c| c.range));
        ranges
    }
}

impl Entity for IndexFunc {
    type Def = FuncDef;

    const KIND: SymbolKind = SymbolKind::Func;

    fn usr(&self) -> &Usr {
        &self.usr
    }

    fn def(&self) -> &FuncDef {
        &self.def
    }

    fn same_def(&self, ids: &IdCache, other: &Self, other_ids: &IdCache) -> bool {
        let (a, b) = (&self.def, &other.def);
        a.same_description(b)
            && link(ids, a.declaring_type) == link(other_ids, b.declaring_type)
            && links(ids, &a.base) == links(other_ids, &b.base)
            && links(ids, &a.locals) == links(other_ids, &b.locals)
            && call_sites(ids, &a.callees, true) == call_sites(other_ids, &b.callees, true)
    }

    /// Callers are compared by call site, so implicit-flag drift between
    /// two runs is not a change.
    fn same_references(&self, ids: &IdCache, other: &Self, other_ids: &IdCache) -> bool {
        self.declarations == other.declarations
            && links(ids, &self.derived) == links(other_ids, &other.derived)
            && call_sites(ids, &self.callers, false) == call_sites(other_ids, &other.callers, false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexVar {
    pub usr: Usr,
    pub id: VarId,
    #[serde(default)]
    pub def: VarDef,
    #[serde(default)]
    declarations: Vec<Range>,
    /// Usages
    #[serde(default)]
    uses: Vec<Range>,
}

impl IndexVar {
    pub fn new(id: VarId, usr: Usr) -> Self {
        Self {
            usr,
            id,
            def: VarDef::default(),
            declarations: Vec::new(),
            uses: Vec::new(),
        }
    }

    pub fn declarations(&self) -> &[Range] {
        &self.declarations
    }

    pub fn uses(&self) -> &[Range] {
        &self.uses
    }

    pub fn add_declaration(&mut self, range: Range) -> bool {
        push_unique(&mut self.declarations, range)
    }

    pub fn add_use(&mut self, range: Range) -> bool {
        push_unique(&mut self.uses, range)
    }
}

impl Entity for IndexVar {
    type Def = VarDef;

    const KIND: SymbolKind = SymbolKind::Var;

    fn usr(&self) -> &Usr {
        &self.usr
    }

    fn def(&self) -> &VarDef {
        &self.def
    }

    fn same_def(&self, ids: &IdCache, other: &Self, other_ids: &IdCache) -> bool {
        let (a, b) = (&self.def, &other.def);
        a.same_description(b)
            && link(ids, a.variable_type) == link(other_ids, b.variable_type)
            && parent_link(ids, a.parent) == parent_link(other_ids, b.parent)
    }

    fn same_references(&self, _ids: &IdCache, other: &Self, _other_ids: &IdCache) -> bool {
        self.declarations == other.declarations && self.uses == other.uses
    }
}
