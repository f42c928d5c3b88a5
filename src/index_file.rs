//! File index - the per-file owner of every indexed entity
//!
//! An `IndexFile` is built by a single ingestion pass, then treated as an
//! immutable snapshot. Entities live in flat per-category arrays and refer
//! to each other only by id, so edges can point at entities created later.

use crate::def::{DisplayName, VarParent};
use crate::entity::{IndexFunc, IndexType, IndexVar};
use crate::id::{AnyId, Category, FuncId, Id, TypeId, VarId};
use crate::id_cache::IdCache;
use crate::position::Range;
use crate::symbol::{LanguageId, SignatureSource, SymbolKind, Usr};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// An `#include` directive resolved to a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexInclude {
    /// Line of the directive; a line is precise enough for navigation
    pub line: u32,
    /// Absolute path of the included file
    pub resolved_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Information,
    Hint,
}

/// A front-end diagnostic from the last parse. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub range: Range,
    pub severity: DiagnosticSeverity,
    pub message: String,
}

impl Diagnostic {
    pub fn error(range: Range, message: impl Into<String>) -> Self {
        Self {
            range,
            severity: DiagnosticSeverity::Error,
            message: message.into(),
        }
    }

    pub fn warning(range: Range, message: impl Into<String>) -> Self {
        Self {
            range,
            severity: DiagnosticSeverity::Warning,
            message: message.into(),
        }
    }
}

/// Index of one source file (a header pulled in by a translation unit gets
/// its own `IndexFile`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "PersistedIndexFile")]
pub struct IndexFile {
    pub path: String,
    /// Compiler arguments used for the parse
    pub args: Vec<String>,
    /// Unix seconds; 0 when unknown
    pub last_modification_time: i64,
    language: LanguageId,
    /// Translation unit whose parse produced this file. Editing a header
    /// means re-parsing this file.
    pub import_file: String,
    /// Source ranges disabled by the preprocessor
    pub skipped_by_preprocessor: Vec<Range>,
    pub includes: Vec<IndexInclude>,
    pub dependencies: Vec<String>,
    #[serde(skip)]
    id_cache: IdCache,
    types: Vec<IndexType>,
    funcs: Vec<IndexFunc>,
    vars: Vec<IndexVar>,
    /// Diagnostics from the last parse. Not serialized.
    #[serde(skip)]
    pub diagnostics: Vec<Diagnostic>,
    /// File contents at index time. Not serialized.
    #[serde(skip)]
    pub file_contents: String,
}

/// On-disk shape of an `IndexFile`; the resolver is rebuilt from it.
#[derive(Deserialize, Default)]
#[serde(default)]
struct PersistedIndexFile {
    path: String,
    args: Vec<String>,
    last_modification_time: i64,
    language: LanguageId,
    import_file: String,
    skipped_by_preprocessor: Vec<Range>,
    includes: Vec<IndexInclude>,
    dependencies: Vec<String>,
    types: Vec<IndexType>,
    funcs: Vec<IndexFunc>,
    vars: Vec<IndexVar>,
}

impl TryFrom<PersistedIndexFile> for IndexFile {
    type Error = Error;

    fn try_from(p: PersistedIndexFile) -> Result<Self> {
        check_dense(&p.path, "type", p.types.iter().map(|t| t.id.index()))?;
        check_dense(&p.path, "func", p.funcs.iter().map(|f| f.id.index()))?;
        check_dense(&p.path, "var", p.vars.iter().map(|v| v.id.index()))?;
        check_links(&p)?;

        let id_cache = IdCache::rebuild(
            p.path.clone(),
            p.types.iter().map(|t| &t.usr),
            p.funcs.iter().map(|f| &f.usr),
            p.vars.iter().map(|v| &v.usr),
        )?;

        Ok(Self {
            path: p.path,
            args: p.args,
            last_modification_time: p.last_modification_time,
            language: p.language,
            import_file: p.import_file,
            skipped_by_preprocessor: p.skipped_by_preprocessor,
            includes: p.includes,
            dependencies: p.dependencies,
            id_cache,
            types: p.types,
            funcs: p.funcs,
            vars: p.vars,
            diagnostics: Vec::new(),
            file_contents: String::new(),
        })
    }
}

/// Every entity must sit at the index its id names.
fn check_dense(path: &str, what: &str, ids: impl Iterator<Item = Option<usize>>) -> Result<()> {
    for (position, index) in ids.enumerate() {
        if index != Some(position) {
            return Err(Error::CorruptIndex(format!(
                "{path}: {what} at position {position} has id {index:?}"
            )));
        }
    }
    Ok(())
}

/// Entity counts that every loaded link must stay within.
struct Bounds<'a> {
    path: &'a str,
    types: usize,
    funcs: usize,
    vars: usize,
}

impl Bounds<'_> {
    fn check<T: Category>(&self, owner: &Usr, ids: impl IntoIterator<Item = Id<T>>) -> Result<()> {
        let len = match T::KIND {
            SymbolKind::Type => self.types,
            SymbolKind::Func => self.funcs,
            SymbolKind::Var => self.vars,
            SymbolKind::Invalid | SymbolKind::File => 0,
        };
        for id in ids {
            if !id.index().is_some_and(|index| index < len) {
                return Err(Error::CorruptIndex(format!(
                    "{}: {owner} links to {id:?} but the file has {len} {} entries",
                    self.path,
                    T::KIND
                )));
            }
        }
        Ok(())
    }
}

/// Every link must name an entity of this file. The only sentinel allowed
/// is the caller of a call made outside any function.
fn check_links(p: &PersistedIndexFile) -> Result<()> {
    let bounds = Bounds {
        path: &p.path,
        types: p.types.len(),
        funcs: p.funcs.len(),
        vars: p.vars.len(),
    };
    for t in &p.types {
        let usr = &t.usr;
        bounds.check(usr, t.def.alias_of)?;
        bounds.check(usr, t.def.parents.iter().copied())?;
        bounds.check(usr, t.def.types.iter().copied())?;
        bounds.check(usr, t.def.funcs.iter().copied())?;
        bounds.check(usr, t.def.vars.iter().copied())?;
        bounds.check(usr, t.derived().iter().copied())?;
        bounds.check(usr, t.instances().iter().copied())?;
    }
    for f in &p.funcs {
        let usr = &f.usr;
        bounds.check(usr, f.def.declaring_type)?;
        bounds.check(usr, f.def.base.iter().copied())?;
        bounds.check(usr, f.def.locals.iter().copied())?;
        bounds.check(usr, f.def.callees.iter().map(|c| c.id))?;
        bounds.check(usr, f.derived().iter().copied())?;
        bounds.check(usr, f.callers().iter().filter(|c| c.has_caller()).map(|c| c.id))?;
    }
    for v in &p.vars {
        bounds.check(&v.usr, v.def.variable_type)?;
        match v.def.parent {
            Some(VarParent::Func(id)) => bounds.check(&v.usr, Some(id))?,
            Some(VarParent::Type(id)) => bounds.check(&v.usr, Some(id))?,
            None => {}
        }
    }
    Ok(())
}

impl IndexFile {
    /// Create an empty index for `path`, seeding the language from its
    /// extension.
    pub fn new(path: impl Into<String>, contents: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            language: LanguageId::from_path(&path),
            id_cache: IdCache::new(path.clone()),
            path,
            args: Vec::new(),
            last_modification_time: 0,
            import_file: String::new(),
            skipped_by_preprocessor: Vec::new(),
            includes: Vec::new(),
            dependencies: Vec::new(),
            types: Vec::new(),
            funcs: Vec::new(),
            vars: Vec::new(),
            diagnostics: Vec::new(),
            file_contents: contents.into(),
        }
    }

    // ========== Metadata ==========

    pub fn language(&self) -> LanguageId {
        self.language
    }

    /// Move the language forward (Unknown → C → C++, or to ObjC).
    /// Attempts to go backwards are ignored.
    pub fn set_language(&mut self, language: LanguageId) {
        self.language = self.language.upgrade(language);
    }

    pub fn add_include(&mut self, include: IndexInclude) -> bool {
        crate::entity::push_unique(&mut self.includes, include)
    }

    pub fn add_dependency(&mut self, path: impl Into<String>) -> bool {
        let path = path.into();
        if path == self.path {
            return false;
        }
        crate::entity::push_unique(&mut self.dependencies, path)
    }

    pub fn add_skipped_range(&mut self, range: Range) -> bool {
        crate::entity::push_unique(&mut self.skipped_by_preprocessor, range)
    }

    pub fn id_cache(&self) -> &IdCache {
        &self.id_cache
    }

    // ========== Resolution ==========

    /// Get or create the type for `usr`.
    pub fn to_type_id(&mut self, usr: &str) -> TypeId {
        let (id, created) = self.id_cache.get_or_insert_type(usr);
        if created {
            self.types.push(IndexType::new(id, Usr::from(usr)));
        }
        id
    }

    /// Get or create the function for `usr`.
    pub fn to_func_id(&mut self, usr: &str) -> FuncId {
        let (id, created) = self.id_cache.get_or_insert_func(usr);
        if created {
            self.funcs.push(IndexFunc::new(id, Usr::from(usr)));
        }
        id
    }

    /// Get or create the variable for `usr`.
    pub fn to_var_id(&mut self, usr: &str) -> VarId {
        let (id, created) = self.id_cache.get_or_insert_var(usr);
        if created {
            self.vars.push(IndexVar::new(id, Usr::from(usr)));
        }
        id
    }

    /// Get or create the type for a front-end declaration.
    pub fn type_id_for<S: SignatureSource + ?Sized>(&mut self, source: &S) -> TypeId {
        self.to_type_id(source.usr().as_str())
    }

    pub fn func_id_for<S: SignatureSource + ?Sized>(&mut self, source: &S) -> FuncId {
        self.to_func_id(source.usr().as_str())
    }

    pub fn var_id_for<S: SignatureSource + ?Sized>(&mut self, source: &S) -> VarId {
        self.to_var_id(source.usr().as_str())
    }

    /// Get or create the entity for `usr` in the category named by `kind`.
    /// Returns `None` for kinds without an entity array.
    pub fn resolve_or_create(&mut self, usr: &str, kind: SymbolKind) -> Option<AnyId> {
        match kind {
            SymbolKind::Type => Some(AnyId::Type(self.to_type_id(usr))),
            SymbolKind::Func => Some(AnyId::Func(self.to_func_id(usr))),
            SymbolKind::Var => Some(AnyId::Var(self.to_var_id(usr))),
            SymbolKind::Invalid | SymbolKind::File => None,
        }
    }

    // ========== Dereference ==========

    /// The type behind `id`.
    ///
    /// Panics if `id` is the sentinel or was not issued by this file.
    pub fn resolve_type(&self, id: TypeId) -> &IndexType {
        match self.try_type(id) {
            Some(t) => t,
            None => panic!("{id:?} does not belong to index of {}", self.path),
        }
    }

    pub fn resolve_func(&self, id: FuncId) -> &IndexFunc {
        match self.try_func(id) {
            Some(f) => f,
            None => panic!("{id:?} does not belong to index of {}", self.path),
        }
    }

    pub fn resolve_var(&self, id: VarId) -> &IndexVar {
        match self.try_var(id) {
            Some(v) => v,
            None => panic!("{id:?} does not belong to index of {}", self.path),
        }
    }

    pub fn resolve_type_mut(&mut self, id: TypeId) -> &mut IndexType {
        let path = &self.path;
        match id.index().and_then(|i| self.types.get_mut(i)) {
            Some(t) => t,
            None => panic!("{id:?} does not belong to index of {path}"),
        }
    }

    pub fn resolve_func_mut(&mut self, id: FuncId) -> &mut IndexFunc {
        let path = &self.path;
        match id.index().and_then(|i| self.funcs.get_mut(i)) {
            Some(f) => f,
            None => panic!("{id:?} does not belong to index of {path}"),
        }
    }

    pub fn resolve_var_mut(&mut self, id: VarId) -> &mut IndexVar {
        let path = &self.path;
        match id.index().and_then(|i| self.vars.get_mut(i)) {
            Some(v) => v,
            None => panic!("{id:?} does not belong to index of {path}"),
        }
    }

    /// Non-panicking lookup for read-side callers
    pub fn try_type(&self, id: TypeId) -> Option<&IndexType> {
        id.index().and_then(|i| self.types.get(i))
    }

    pub fn try_func(&self, id: FuncId) -> Option<&IndexFunc> {
        id.index().and_then(|i| self.funcs.get(i))
    }

    pub fn try_var(&self, id: VarId) -> Option<&IndexVar> {
        id.index().and_then(|i| self.vars.get(i))
    }

    /// Look up an existing entity by USR without creating it
    pub fn find_type(&self, usr: &str) -> Option<&IndexType> {
        self.id_cache.type_id(usr).map(|id| self.resolve_type(id))
    }

    pub fn find_func(&self, usr: &str) -> Option<&IndexFunc> {
        self.id_cache.func_id(usr).map(|id| self.resolve_func(id))
    }

    pub fn find_var(&self, usr: &str) -> Option<&IndexVar> {
        self.id_cache.var_id(usr).map(|id| self.resolve_var(id))
    }

    /// Display name of any entity, for logs and diagnostics
    pub fn name_of(&self, id: AnyId) -> Option<&DisplayName> {
        match id {
            AnyId::Type(id) => self.try_type(id).map(|t| &t.def.name),
            AnyId::Func(id) => self.try_func(id).map(|f| &f.def.name),
            AnyId::Var(id) => self.try_var(id).map(|v| &v.def.name),
        }
    }

    // ========== Iteration ==========

    pub fn types(&self) -> &[IndexType] {
        &self.types
    }

    pub fn funcs(&self) -> &[IndexFunc] {
        &self.funcs
    }

    pub fn vars(&self) -> &[IndexVar] {
        &self.vars
    }

    /// Get statistics about the index
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            types: self.types.len(),
            funcs: self.funcs.len(),
            vars: self.vars.len(),
            defined: self.types.iter().filter(|t| t.def.is_defined()).count()
                + self.funcs.iter().filter(|f| f.def.is_defined()).count()
                + self.vars.iter().filter(|v| v.def.is_defined()).count(),
            uses: self.types.iter().map(|t| t.uses().len()).sum::<usize>()
                + self.vars.iter().map(|v| v.uses().len()).sum::<usize>(),
            calls: self.funcs.iter().map(|f| f.callers().len()).sum(),
            includes: self.includes.len(),
            dependencies: self.dependencies.len(),
        }
    }

    /// Pretty JSON dump of the persisted fields
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Structural equality over every persisted field; diagnostics and file
/// contents are ignored.
impl PartialEq for IndexFile {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
            && self.args == other.args
            && self.last_modification_time == other.last_modification_time
            && self.language == other.language
            && self.import_file == other.import_file
            && self.skipped_by_preprocessor == other.skipped_by_preprocessor
            && self.includes == other.includes
            && self.dependencies == other.dependencies
            && self.types == other.types
            && self.funcs == other.funcs
            && self.vars == other.vars
    }
}

/// Statistics about a file index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub types: usize,
    pub funcs: usize,
    pub vars: usize,
    pub defined: usize,
    pub uses: usize,
    pub calls: usize,
    pub includes: usize,
    pub dependencies: usize,
}

impl std::fmt::Display for IndexStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Index Statistics:")?;
        writeln!(f, "  Entities: {} types, {} funcs, {} vars ({} defined)",
            self.types, self.funcs, self.vars, self.defined)?;
        writeln!(f, "  References: {} uses, {} calls", self.uses, self.calls)?;
        writeln!(f, "  Includes: {} (dependencies: {})", self.includes, self.dependencies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::func_ref::FuncRef;

    fn range(line: u32) -> Range {
        Range::from_coords(line, 1, line, 5)
    }

    #[test]
    fn test_resolve_or_create_is_idempotent() {
        let mut file = IndexFile::new("a.cc", "");
        for kind in [SymbolKind::Type, SymbolKind::Func, SymbolKind::Var] {
            let first = file.resolve_or_create(&format!("usr-{kind}"), kind);
            let second = file.resolve_or_create(&format!("usr-{kind}"), kind);
            assert!(first.is_some());
            assert_eq!(first, second);
        }
        assert_eq!(file.resolve_or_create("x", SymbolKind::File), None);
        assert_eq!(file.types().len(), 1);
        assert_eq!(file.funcs().len(), 1);
        assert_eq!(file.vars().len(), 1);
    }

    #[test]
    fn test_entities_sit_at_their_id() {
        let mut file = IndexFile::new("a.cc", "");
        let a = file.to_func_id("c:@F@a#");
        let b = file.to_func_id("c:@F@b#");
        assert_eq!(a, FuncId::new(0));
        assert_eq!(b, FuncId::new(1));
        assert_eq!(file.resolve_func(b).usr.as_str(), "c:@F@b#");
        assert_eq!(file.resolve_func(b).id, b);
    }

    #[test]
    fn test_signature_source_overload() {
        let mut file = IndexFile::new("a.cc", "");
        let usr = Usr::from("c:@S@S");
        let by_usr = file.type_id_for(&usr);
        let by_str = file.type_id_for("c:@S@S");
        assert_eq!(by_usr, by_str);
    }

    #[test]
    #[should_panic(expected = "does not belong")]
    fn test_sentinel_does_not_resolve() {
        let file = IndexFile::new("a.cc", "");
        file.resolve_type(TypeId::INVALID);
    }

    #[test]
    #[should_panic(expected = "does not belong")]
    fn test_foreign_id_panics() {
        let mut other = IndexFile::new("b.cc", "");
        let foreign = other.to_var_id("c:@x");
        let file = IndexFile::new("a.cc", "");
        file.resolve_var(foreign);
    }

    #[test]
    fn test_try_lookups_do_not_panic() {
        let file = IndexFile::new("a.cc", "");
        assert!(file.try_type(TypeId::INVALID).is_none());
        assert!(file.try_func(FuncId::new(3)).is_none());
        assert!(file.find_var("c:@x").is_none());
    }

    #[test]
    fn test_language_only_moves_forward() {
        let mut file = IndexFile::new("a.h", "");
        assert_eq!(file.language(), LanguageId::Unknown);
        file.set_language(LanguageId::C);
        assert_eq!(file.language(), LanguageId::C);
        file.set_language(LanguageId::Cpp);
        file.set_language(LanguageId::C);
        assert_eq!(file.language(), LanguageId::Cpp);
        file.set_language(LanguageId::ObjC);
        file.set_language(LanguageId::Cpp);
        assert_eq!(file.language(), LanguageId::ObjC);
    }

    #[test]
    fn test_dependencies_skip_self_and_duplicates() {
        let mut file = IndexFile::new("a.cc", "");
        assert!(file.add_dependency("a.h"));
        assert!(!file.add_dependency("a.h"));
        assert!(!file.add_dependency("a.cc"));
        assert_eq!(file.dependencies, vec!["a.h".to_string()]);
    }

    #[test]
    fn test_stats() {
        let mut file = IndexFile::new("a.cc", "");
        let f = file.to_func_id("c:@F@f#");
        let g = file.to_func_id("c:@F@g#");
        file.resolve_func_mut(f).def.definition_spelling = Some(range(1));
        file.resolve_func_mut(g).add_caller(FuncRef::new(f, range(2), false));
        let t = file.to_type_id("c:@S@T");
        file.resolve_type_mut(t).add_use(range(3));

        let stats = file.stats();
        assert_eq!(stats.funcs, 2);
        assert_eq!(stats.types, 1);
        assert_eq!(stats.defined, 1);
        assert_eq!(stats.calls, 1);
        assert_eq!(stats.uses, 1);
        assert!(stats.to_string().contains("2 funcs"));
    }

    #[test]
    fn test_json_roundtrip_rebuilds_resolver() {
        let mut file = IndexFile::new("a.cc", "int main() {}");
        file.diagnostics.push(Diagnostic::error(range(1), "oops"));
        let main = file.to_func_id("c:@F@main#");
        file.resolve_func_mut(main).def.name = DisplayName::new("main");

        let json = file.to_json_string().unwrap();
        assert!(!json.contains("oops"));
        assert!(!json.contains("int main() {}"));

        let mut loaded: IndexFile = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, file);
        assert!(loaded.diagnostics.is_empty());
        assert!(loaded.file_contents.is_empty());
        assert_eq!(loaded.to_func_id("c:@F@main#"), main);
        assert_eq!(loaded.to_func_id("c:@F@other#"), FuncId::new(1));
    }

    #[test]
    fn test_misplaced_entity_is_rejected() {
        let json = r#"{"path":"a.cc","funcs":[{"usr":"c:@F@f#","id":3}]}"#;
        assert!(serde_json::from_str::<IndexFile>(json).is_err());
    }

    #[test]
    fn test_dangling_links_are_rejected() {
        let dangling = [
            r#"{"path":"a.cc","types":[{"usr":"c:@S@S","id":0,"def":{"funcs":[5]}}]}"#,
            r#"{"path":"a.cc","types":[{"usr":"c:@S@S","id":0,"def":{"parents":[0,1]}}]}"#,
            r#"{"path":"a.cc","types":[{"usr":"c:@S@S","id":0,"derived":[4294967295]}]}"#,
            r#"{"path":"a.cc","funcs":[{"usr":"c:@F@f#","id":0,"def":{"callees":["7@1:1-1:2"]}}]}"#,
            r#"{"path":"a.cc","funcs":[{"usr":"c:@F@f#","id":0,"callers":["2@1:1-1:2"]}]}"#,
            r#"{"path":"a.cc","vars":[{"usr":"c:@x","id":0,"def":{"variable_type":0}}]}"#,
        ];
        for json in dangling {
            match serde_json::from_str::<IndexFile>(json) {
                Err(e) => assert!(e.to_string().contains("links to"), "{json}: {e}"),
                Ok(_) => panic!("loaded {json}"),
            }
        }
    }

    #[test]
    fn test_call_without_caller_loads() {
        let json = r#"{"path":"a.cc","funcs":[{"usr":"c:@F@g#","id":0,"callers":["-1@4:10-4:11"]}]}"#;
        let file: IndexFile = serde_json::from_str(json).unwrap();
        let g = file.find_func("c:@F@g#").unwrap();
        assert!(!g.callers()[0].has_caller());
    }
}
