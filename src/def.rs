//! Definition payloads for indexed entities
//!
//! A `Def` holds the structural facts about one symbol as seen from its own
//! declaration: name, docs, definition ranges and forward links. Facts
//! recorded from other entities' point of view (derived types, callers,
//! usages) live on the entity record instead and take no part in `Def`
//! equality, which is what cache diffing compares.
//!
//! `PartialEq` compares links by raw id, which only holds within one file.
//! Across two indexes of a file, the entity records compare links by USR
//! (see [`crate::entity::Entity::same_def`]).

use crate::func_ref::FuncRef;
use crate::id::{FuncId, TypeId, VarId};
use crate::position::Range;
use crate::symbol::{ClangSymbolKind, StorageClass, SymbolKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A detailed display name plus the window naming the bare identifier.
///
/// `void ns::S::f(int)` keeps `f` as its short name. The window is stored as
/// an owned offset/length pair and validated on construction, so
/// [`DisplayName::short_name`] always borrows from this value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDisplayName")]
pub struct DisplayName {
    #[serde(rename = "detailed_name")]
    text: String,
    #[serde(rename = "short_name_offset")]
    short_offset: u32,
    #[serde(rename = "short_name_size")]
    short_len: u32,
}

#[derive(Deserialize)]
struct RawDisplayName {
    #[serde(default)]
    detailed_name: String,
    #[serde(default)]
    short_name_offset: u32,
    #[serde(default)]
    short_name_size: u32,
}

impl TryFrom<RawDisplayName> for DisplayName {
    type Error = String;

    fn try_from(raw: RawDisplayName) -> std::result::Result<Self, Self::Error> {
        DisplayName::with_window(raw.detailed_name, raw.short_name_offset, raw.short_name_size)
            .ok_or_else(|| "short name window is outside the detailed name".to_string())
    }
}

impl DisplayName {
    /// A name whose short form is the whole text
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let short_len = text.len() as u32;
        Self {
            text,
            short_offset: 0,
            short_len,
        }
    }

    /// A name with an explicit short-name window.
    ///
    /// Returns `None` when the window falls outside `text` or splits a
    /// UTF-8 character.
    pub fn with_window(text: impl Into<String>, offset: u32, len: u32) -> Option<Self> {
        let text = text.into();
        let start = offset as usize;
        let end = start.checked_add(len as usize)?;
        text.get(start..end)?;
        Some(Self {
            text,
            short_offset: offset,
            short_len: len,
        })
    }

    /// Build `<qualifier>::<short>` with the window on `short`.
    pub fn qualified(qualifier: &str, short: &str) -> Self {
        if qualifier.is_empty() {
            return Self::new(short);
        }
        let text = format!("{qualifier}::{short}");
        let short_offset = (text.len() - short.len()) as u32;
        Self {
            text,
            short_offset,
            short_len: short.len() as u32,
        }
    }

    /// Wrap a qualified name in surrounding text, e.g. a return type and a
    /// parameter list, keeping the window on the short name.
    pub fn decorated(&self, prefix: &str, suffix: &str) -> Self {
        Self {
            text: format!("{prefix}{}{suffix}", self.text),
            short_offset: self.short_offset + prefix.len() as u32,
            short_len: self.short_len,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn short_name(&self) -> &str {
        let start = self.short_offset as usize;
        let end = start + self.short_len as usize;
        self.text.get(start..end).unwrap_or_default()
    }

    /// The qualified prefix before the short name, without a trailing `::`.
    pub fn qualifier(&self) -> &str {
        let prefix = self.text.get(..self.short_offset as usize).unwrap_or_default();
        prefix.trim_end_matches("::")
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Definition data of an indexed type.
///
/// Types are only tracked at their definition; a forward `class Foo;` adds
/// a usage, not a declaration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeDef {
    pub name: DisplayName,
    pub kind: ClangSymbolKind,
    pub hover: String,
    pub comments: String,
    pub definition_spelling: Option<Range>,
    pub definition_extent: Option<Range>,
    /// Set when this type is a `using`/`typedef` of another type
    pub alias_of: Option<TypeId>,
    /// Immediate parent types
    pub parents: Vec<TypeId>,
    /// Types, functions and variables declared inside this type
    pub types: Vec<TypeId>,
    pub funcs: Vec<FuncId>,
    pub vars: Vec<VarId>,
}

impl TypeDef {
    pub fn short_name(&self) -> &str {
        self.name.short_name()
    }

    pub fn is_defined(&self) -> bool {
        self.definition_spelling.is_some()
    }

    /// Every compared field except the id links
    pub(crate) fn same_description(&self, other: &Self) -> bool {
        self.name == other.name
            && self.hover == other.hover
            && self.comments == other.comments
            && self.definition_spelling == other.definition_spelling
            && self.definition_extent == other.definition_extent
    }
}

impl PartialEq for TypeDef {
    fn eq(&self, other: &Self) -> bool {
        self.same_description(other)
            && self.alias_of == other.alias_of
            && self.parents == other.parents
            && self.types == other.types
            && self.funcs == other.funcs
            && self.vars == other.vars
    }
}

impl Eq for TypeDef {}

/// Definition data of an indexed function.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FuncDef {
    pub name: DisplayName,
    pub kind: ClangSymbolKind,
    pub storage: StorageClass,
    pub hover: String,
    pub comments: String,
    pub definition_spelling: Option<Range>,
    pub definition_extent: Option<Range>,
    /// Type which declares this function (it is a method)
    pub declaring_type: Option<TypeId>,
    /// Methods this method overrides
    pub base: Vec<FuncId>,
    /// Local variables defined in this function
    pub locals: Vec<VarId>,
    /// Functions this function calls
    pub callees: Vec<FuncRef>,
}

impl FuncDef {
    pub fn short_name(&self) -> &str {
        self.name.short_name()
    }

    pub fn is_defined(&self) -> bool {
        self.definition_spelling.is_some()
    }

    pub(crate) fn same_description(&self, other: &Self) -> bool {
        self.name == other.name
            && self.hover == other.hover
            && self.comments == other.comments
            && self.definition_spelling == other.definition_spelling
            && self.definition_extent == other.definition_extent
    }
}

/// `kind` and `storage` are presentation data and not compared.
impl PartialEq for FuncDef {
    fn eq(&self, other: &Self) -> bool {
        self.same_description(other)
            && self.declaring_type == other.declaring_type
            && self.base == other.base
            && self.locals == other.locals
            && self.callees == other.callees
    }
}

impl Eq for FuncDef {}

/// Function or type that declares a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarParent {
    Func(FuncId),
    Type(TypeId),
}

impl VarParent {
    pub fn kind(&self) -> SymbolKind {
        match self {
            VarParent::Func(_) => SymbolKind::Func,
            VarParent::Type(_) => SymbolKind::Type,
        }
    }
}

/// Definition data of an indexed variable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VarDef {
    pub name: DisplayName,
    pub kind: ClangSymbolKind,
    pub storage: StorageClass,
    pub hover: String,
    pub comments: String,
    pub definition_spelling: Option<Range>,
    pub definition_extent: Option<Range>,
    /// Declared type of the variable
    pub variable_type: Option<TypeId>,
    pub parent: Option<VarParent>,
}

impl VarDef {
    pub fn short_name(&self) -> &str {
        self.name.short_name()
    }

    pub fn is_defined(&self) -> bool {
        self.definition_spelling.is_some()
    }

    /// Function-local variable or parameter
    pub fn is_local(&self) -> bool {
        matches!(self.kind, ClangSymbolKind::Parameter | ClangSymbolKind::Variable)
            && matches!(self.parent, Some(VarParent::Func(_)))
    }

    pub fn is_macro(&self) -> bool {
        self.kind == ClangSymbolKind::Macro
    }

    pub(crate) fn same_description(&self, other: &Self) -> bool {
        self.name == other.name
            && self.storage == other.storage
            && self.hover == other.hover
            && self.comments == other.comments
            && self.definition_spelling == other.definition_spelling
            && self.definition_extent == other.definition_extent
    }
}

impl PartialEq for VarDef {
    fn eq(&self, other: &Self) -> bool {
        self.same_description(other)
            && self.variable_type == other.variable_type
            && self.parent == other.parent
    }
}

impl Eq for VarDef {}
