//! Symbol vocabulary - signatures, kinds, storage classes and languages
//!
//! Every indexed entity falls into one of three categories:
//! - `Type`: struct, class, union, enum, typedef, namespace
//! - `Func`: function, method, constructor, destructor
//! - `Var`: variable, field, parameter, enum constant, macro
//!
//! `ClangSymbolKind` keeps the finer-grained declaration kind the front-end
//! reported, which is used for display and for language detection.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Stable, location-independent signature of a declared symbol (a USR).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Usr(String);

impl Usr {
    pub fn new(usr: impl Into<String>) -> Self {
        Self(usr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Usr {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Usr {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for Usr {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Usr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Anything that can produce a USR: a raw signature, or a front-end
/// declaration handle that knows how to derive one.
pub trait SignatureSource {
    fn usr(&self) -> Usr;
}

impl SignatureSource for Usr {
    fn usr(&self) -> Usr {
        self.clone()
    }
}

impl SignatureSource for str {
    fn usr(&self) -> Usr {
        Usr::from(self)
    }
}

impl SignatureSource for String {
    fn usr(&self) -> Usr {
        Usr::from(self.as_str())
    }
}

/// Entity category of a symbol.
///
/// The order matters: when several symbols sit at one location, `Func` and
/// `Var` are preferred over the others.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    #[default]
    Invalid,
    File,
    Type,
    Func,
    Var,
}

impl SymbolKind {
    /// Get the string representation of the symbol kind
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Invalid => "invalid",
            SymbolKind::File => "file",
            SymbolKind::Type => "type",
            SymbolKind::Func => "func",
            SymbolKind::Var => "var",
        }
    }

    /// Get all symbol kinds
    pub fn all() -> &'static [SymbolKind] {
        &[
            SymbolKind::Invalid,
            SymbolKind::File,
            SymbolKind::Type,
            SymbolKind::Func,
            SymbolKind::Var,
        ]
    }

    /// Whether this kind is backed by an entity array
    pub fn is_entity(&self) -> bool {
        matches!(self, SymbolKind::Type | SymbolKind::Func | SymbolKind::Var)
    }
}

impl FromStr for SymbolKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "invalid" => Ok(SymbolKind::Invalid),
            "file" => Ok(SymbolKind::File),
            "type" | "class" | "struct" | "union" | "enum" | "typedef" => Ok(SymbolKind::Type),
            "func" | "function" | "method" | "fn" => Ok(SymbolKind::Func),
            "var" | "variable" | "field" | "param" => Ok(SymbolKind::Var),
            _ => Err(Error::UnknownKind(format!("Unknown symbol kind: {}", s))),
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fine-grained declaration kind reported by the front-end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClangSymbolKind {
    #[default]
    Unknown,
    Module,
    Namespace,
    NamespaceAlias,
    Macro,
    Enum,
    Struct,
    Class,
    Protocol,
    Extension,
    Union,
    TypeAlias,
    Function,
    Variable,
    Field,
    EnumConstant,
    InstanceMethod,
    ClassMethod,
    StaticMethod,
    InstanceProperty,
    ClassProperty,
    StaticProperty,
    Constructor,
    Destructor,
    ConversionFunction,
    Parameter,
    Using,
}

impl ClangSymbolKind {
    /// Declarations that cannot appear in a C translation unit.
    pub fn is_cpp_only(&self) -> bool {
        matches!(
            self,
            ClangSymbolKind::Namespace
                | ClangSymbolKind::NamespaceAlias
                | ClangSymbolKind::Class
                | ClangSymbolKind::Constructor
                | ClangSymbolKind::Destructor
                | ClangSymbolKind::ConversionFunction
                | ClangSymbolKind::Using
        )
    }

    /// Declarations that only exist in Objective-C.
    pub fn is_objc_only(&self) -> bool {
        matches!(
            self,
            ClangSymbolKind::Protocol
                | ClangSymbolKind::Extension
                | ClangSymbolKind::ClassMethod
                | ClangSymbolKind::InstanceProperty
                | ClangSymbolKind::ClassProperty
        )
    }
}

/// Storage class of a function or variable declaration.
///
/// A variable may be seen both with `None` (definition) and `Extern`
/// (declaration); the last reported value is kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageClass {
    #[default]
    Invalid,
    None,
    Extern,
    Static,
    PrivateExtern,
    Auto,
    Register,
}

/// Language of an indexed file.
///
/// `Unknown < C < Cpp` is an upgrade path: a file seen as C becomes C++ on
/// its first C++-only construct and never goes back. `ObjC` is terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageId {
    #[default]
    Unknown,
    C,
    Cpp,
    ObjC,
}

impl LanguageId {
    /// Seed a language from a file extension
    pub fn from_path(path: &str) -> Self {
        let ext = std::path::Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        match ext {
            "c" => LanguageId::C,
            "cc" | "cpp" | "cxx" | "c++" | "hpp" | "hh" | "hxx" | "ipp" | "inl" => LanguageId::Cpp,
            "m" | "mm" => LanguageId::ObjC,
            _ => LanguageId::Unknown,
        }
    }

    /// The language after observing `observed`; never moves backwards.
    pub fn upgrade(self, observed: LanguageId) -> LanguageId {
        match (self, observed) {
            (LanguageId::ObjC, _) => LanguageId::ObjC,
            (_, LanguageId::ObjC) => LanguageId::ObjC,
            (LanguageId::Cpp, _) => LanguageId::Cpp,
            (LanguageId::C, LanguageId::Cpp) => LanguageId::Cpp,
            (LanguageId::C, _) => LanguageId::C,
            (LanguageId::Unknown, other) => other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageId::Unknown => "unknown",
            LanguageId::C => "c",
            LanguageId::Cpp => "cpp",
            LanguageId::ObjC => "objc",
        }
    }
}

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_symbol_kind_roundtrip() {
        for kind in SymbolKind::all() {
            let s = kind.as_str();
            let parsed: SymbolKind = s.parse().unwrap();
            assert_eq!(*kind, parsed);
        }
    }

    #[test]
    fn test_symbol_kind_aliases() {
        assert_eq!(SymbolKind::from_str("struct").unwrap(), SymbolKind::Type);
        assert_eq!(SymbolKind::from_str("method").unwrap(), SymbolKind::Func);
        assert_eq!(SymbolKind::from_str("field").unwrap(), SymbolKind::Var);
        assert!(SymbolKind::from_str("widget").is_err());
    }

    #[test]
    fn test_func_and_var_sort_after_type() {
        assert!(SymbolKind::Var > SymbolKind::Type);
        assert!(SymbolKind::Func > SymbolKind::Type);
    }

    #[test]
    fn test_usr_lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(Usr::from("c:@S@Foo"), 1);
        assert_eq!(map.get("c:@S@Foo"), Some(&1));
    }

    #[test]
    fn test_language_upgrade_is_monotonic() {
        use LanguageId::*;
        assert_eq!(Unknown.upgrade(C), C);
        assert_eq!(C.upgrade(Cpp), Cpp);
        assert_eq!(Cpp.upgrade(C), Cpp);
        assert_eq!(Cpp.upgrade(Unknown), Cpp);
        assert_eq!(C.upgrade(Unknown), C);
        assert_eq!(Cpp.upgrade(ObjC), ObjC);
        assert_eq!(ObjC.upgrade(Cpp), ObjC);
    }

    #[test]
    fn test_language_from_extension() {
        assert_eq!(LanguageId::from_path("src/main.c"), LanguageId::C);
        assert_eq!(LanguageId::from_path("src/main.cc"), LanguageId::Cpp);
        assert_eq!(LanguageId::from_path("src/view.mm"), LanguageId::ObjC);
        assert_eq!(LanguageId::from_path("include/foo.h"), LanguageId::Unknown);
    }

    #[test]
    fn test_kind_serde_names() {
        let json = serde_json::to_string(&ClangSymbolKind::InstanceMethod).unwrap();
        assert_eq!(json, "\"instance_method\"");
        let json = serde_json::to_string(&LanguageId::ObjC).unwrap();
        assert_eq!(json, "\"objc\"");
    }
}
