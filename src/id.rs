//! Typed identifiers - dense per-file handles into the entity arrays
//!
//! Every indexed file owns three arrays (types, functions, variables).
//! An `Id<T>` is an index into exactly one of them; the category lives in
//! the type parameter so a `FuncId` can never be passed where a `TypeId`
//! is expected.

use crate::symbol::SymbolKind;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Raw integer behind every identifier.
pub type RawId = u32;

/// Marker trait for the three entity categories.
pub trait Category: 'static {
    /// Short name used in `Debug` output
    const NAME: &'static str;
    /// Symbol kind this category indexes
    const KIND: SymbolKind;
}

/// Category tag for indexed types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {}

/// Category tag for indexed functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuncCategory {}

/// Category tag for indexed variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarCategory {}

impl Category for TypeCategory {
    const NAME: &'static str = "TypeId";
    const KIND: SymbolKind = SymbolKind::Type;
}

impl Category for FuncCategory {
    const NAME: &'static str = "FuncId";
    const KIND: SymbolKind = SymbolKind::Func;
}

impl Category for VarCategory {
    const NAME: &'static str = "VarId";
    const KIND: SymbolKind = SymbolKind::Var;
}

pub type TypeId = Id<TypeCategory>;
pub type FuncId = Id<FuncCategory>;
pub type VarId = Id<VarCategory>;

/// A category-tagged index into one file's entity array.
///
/// The default value is the sentinel (`RawId::MAX`), which never resolves to
/// an entity and sorts after every concrete id.
pub struct Id<T> {
    raw: RawId,
    _category: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    /// The "no value" sentinel.
    pub const INVALID: Self = Self {
        raw: RawId::MAX,
        _category: PhantomData,
    };

    /// Create an id from a raw array index.
    #[inline]
    pub const fn new(raw: RawId) -> Self {
        debug_assert!(raw != RawId::MAX, "raw id collides with the sentinel");
        Self {
            raw,
            _category: PhantomData,
        }
    }

    /// Create an id from a `usize` array index.
    #[inline]
    pub fn from_index(index: usize) -> Self {
        let raw = RawId::try_from(index).expect("entity index overflows RawId");
        Self::new(raw)
    }

    /// Whether this id refers to an entity (is not the sentinel).
    #[inline]
    pub const fn has_value(self) -> bool {
        self.raw != RawId::MAX
    }

    /// The raw integer value.
    #[inline]
    pub const fn raw(self) -> RawId {
        self.raw
    }

    /// The array index, or `None` for the sentinel.
    #[inline]
    pub fn index(self) -> Option<usize> {
        self.has_value().then_some(self.raw as usize)
    }

    /// Re-tag this id as another category.
    ///
    /// Only meant for bridging serialized data whose category is carried
    /// out of band. Never compare the result against ids of the target
    /// category that came from a different source.
    #[inline]
    pub const fn retag<U>(self) -> Id<U> {
        Id {
            raw: self.raw,
            _category: PhantomData,
        }
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> Default for Id<T> {
    fn default() -> Self {
        Self::INVALID
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T: Category> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_value() {
            write!(f, "{}({})", T::NAME, self.raw)
        } else {
            write!(f, "{}(-)", T::NAME)
        }
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_value() {
            write!(f, "{}", self.raw)
        } else {
            f.write_str("-1")
        }
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u32(self.raw)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawId::deserialize(deserializer)?;
        Ok(Self {
            raw,
            _category: PhantomData,
        })
    }
}

/// An identifier of any category, used where the category is only known
/// at runtime (e.g. resolving a signature reported by the front-end).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnyId {
    Type(TypeId),
    Func(FuncId),
    Var(VarId),
}

impl AnyId {
    /// The symbol kind of the wrapped id
    pub fn kind(&self) -> SymbolKind {
        match self {
            AnyId::Type(_) => SymbolKind::Type,
            AnyId::Func(_) => SymbolKind::Func,
            AnyId::Var(_) => SymbolKind::Var,
        }
    }

    pub fn as_type(self) -> Option<TypeId> {
        match self {
            AnyId::Type(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_func(self) -> Option<FuncId> {
        match self {
            AnyId::Func(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_var(self) -> Option<VarId> {
        match self {
            AnyId::Var(id) => Some(id),
            _ => None,
        }
    }
}
