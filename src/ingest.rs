//! Ingestion boundary - turn front-end events into file indexes
//!
//! The native front-end (libclang or anything else able to produce USRs)
//! lives outside this crate. It implements [`FrontEnd`] and streams
//! [`IndexEvent`]s; [`IndexBuilder`] resolves each signature in the right
//! [`IndexFile`] and applies the update. One translation unit produces one
//! `IndexFile` per source file it touched.

use crate::def::{DisplayName, VarParent};
use crate::entity::{push_unique, FuncDeclaration};
use crate::func_ref::FuncRef;
use crate::id::FuncId;
use crate::index_file::{Diagnostic, IndexFile, IndexInclude};
use crate::position::Range;
use crate::symbol::{ClangSymbolKind, LanguageId, StorageClass, SymbolKind, Usr};
use crate::Result;
use std::collections::HashMap;
use std::path::Path;
use std::time::UNIX_EPOCH;

/// In-memory contents for a file that may differ from disk (an unsaved
/// editor buffer).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileContents {
    pub path: String,
    pub content: String,
}

impl FileContents {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// What to parse: a translation unit plus its compiler arguments.
#[derive(Debug, Clone, Default)]
pub struct ParseRequest {
    pub file: String,
    pub args: Vec<String>,
    pub contents: Vec<FileContents>,
}

impl ParseRequest {
    pub fn new(file: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            file: file.into(),
            args,
            contents: Vec::new(),
        }
    }

    pub fn with_contents(mut self, contents: FileContents) -> Self {
        self.contents.push(contents);
        self
    }

    fn contents_of(&self, path: &str) -> Option<&str> {
        self.contents
            .iter()
            .find(|c| c.path == path)
            .map(|c| c.content.as_str())
    }
}

/// A symbol declaration or definition seen by the front-end.
#[derive(Debug, Clone, Default)]
pub struct Declaration {
    /// File the declaration is spelled in
    pub file: String,
    pub kind: SymbolKind,
    pub usr: Usr,
    /// Unqualified name
    pub name: String,
    /// Semantic container used to qualify `name` (namespace, class, function)
    pub container: Option<Usr>,
    pub spelling: Range,
    pub extent: Range,
    pub is_definition: bool,
    pub detail: ClangSymbolKind,
    pub storage: StorageClass,
    pub hover: String,
    pub comments: String,
    /// Text of the declaration, kept for function forward declarations
    pub content: String,
    pub param_spellings: Vec<Range>,
    /// Entity that owns this one (method's class, local's function)
    pub semantic_parent: Option<(SymbolKind, Usr)>,
    /// Declared type of a variable
    pub type_usr: Option<Usr>,
    /// Base classes of a type, or overridden methods of a function
    pub bases: Vec<Usr>,
    /// Target of a `typedef`/`using`
    pub alias_of: Option<Usr>,
}

/// A usage of a symbol. For functions this is a call.
#[derive(Debug, Clone, Default)]
pub struct Reference {
    pub file: String,
    pub kind: SymbolKind,
    pub usr: Usr,
    pub range: Range,
    /// Enclosing function of the reference, if any
    pub container_func: Option<Usr>,
    pub is_implicit: bool,
}

/// One fact reported by the front-end.
#[derive(Debug, Clone)]
pub enum IndexEvent {
    Declaration(Declaration),
    Reference(Reference),
    Include {
        file: String,
        line: u32,
        resolved_path: String,
    },
    SkippedRange {
        file: String,
        range: Range,
    },
    LanguageHint {
        file: String,
        language: LanguageId,
    },
    Diagnostic {
        file: String,
        diagnostic: Diagnostic,
    },
}

/// A native front-end that walks a translation unit.
///
/// Events may be emitted in any order; a reference may name a symbol whose
/// declaration arrives later. Returning an error keeps whatever was
/// emitted before it.
pub trait FrontEnd {
    fn parse(&self, request: &ParseRequest, sink: &mut dyn FnMut(IndexEvent)) -> Result<()>;
}

/// Maps container signatures to their qualified names.
#[derive(Debug, Default)]
pub struct NamespaceHelper {
    qualified: HashMap<Usr, String>,
}

impl NamespaceHelper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Qualified display name of `name` declared inside `container`.
    /// Unknown containers contribute no qualifier.
    pub fn qualified_name(&self, container: Option<&Usr>, name: &str) -> DisplayName {
        let qualifier = container
            .and_then(|usr| self.qualified.get(usr))
            .map(String::as_str)
            .unwrap_or_default();
        DisplayName::qualified(qualifier, name)
    }

    /// Remember the qualified name of a declaration so that its members can
    /// be qualified by it.
    pub fn register(&mut self, usr: &Usr, name: &DisplayName) {
        if !self.qualified.contains_key(usr) {
            self.qualified.insert(usr.clone(), name.as_str().to_string());
        }
    }
}

/// The file indexes produced by one translation unit. The translation unit
/// itself comes first.
#[derive(Debug, Default)]
pub struct ParseOutput {
    pub files: Vec<IndexFile>,
}

impl ParseOutput {
    pub fn primary(&self) -> Option<&IndexFile> {
        self.files.first()
    }

    pub fn get(&self, path: &str) -> Option<&IndexFile> {
        self.files.iter().find(|f| f.path == path)
    }

    pub fn into_files(self) -> Vec<IndexFile> {
        self.files
    }
}

/// Single-writer builder for the indexes of one translation unit.
pub struct IndexBuilder<'a> {
    request: &'a ParseRequest,
    files: Vec<IndexFile>,
    by_path: HashMap<String, usize>,
    namespaces: NamespaceHelper,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(request: &'a ParseRequest) -> Self {
        let mut builder = Self {
            request,
            files: Vec::new(),
            by_path: HashMap::new(),
            namespaces: NamespaceHelper::new(),
        };
        builder.file_mut(&request.file);
        builder
    }

    /// Index for `path`, created on first sight.
    fn file_mut(&mut self, path: &str) -> &mut IndexFile {
        let index = match self.by_path.get(path) {
            Some(&index) => index,
            None => {
                let file = self.open_file(path);
                self.files.push(file);
                let index = self.files.len() - 1;
                self.by_path.insert(path.to_string(), index);
                if index > 0 {
                    self.files[0].add_dependency(path);
                }
                index
            }
        };
        &mut self.files[index]
    }

    fn open_file(&self, path: &str) -> IndexFile {
        let contents = match self.request.contents_of(path) {
            Some(contents) => contents.to_string(),
            None => std::fs::read_to_string(path).unwrap_or_default(),
        };
        let mut file = IndexFile::new(path, contents);
        file.args = self.request.args.clone();
        file.import_file = self.request.file.clone();
        file.last_modification_time = modification_time(Path::new(path));
        tracing::debug!("Indexing {} (from {})", path, self.request.file);
        file
    }

    /// Apply one event.
    pub fn apply(&mut self, event: IndexEvent) {
        match event {
            IndexEvent::Declaration(decl) => self.declare(decl),
            IndexEvent::Reference(reference) => self.reference(reference),
            IndexEvent::Include {
                file,
                line,
                resolved_path,
            } => {
                self.file_mut(&file).add_include(IndexInclude {
                    line,
                    resolved_path,
                });
            }
            IndexEvent::SkippedRange { file, range } => {
                self.file_mut(&file).add_skipped_range(range);
            }
            IndexEvent::LanguageHint { file, language } => {
                self.file_mut(&file).set_language(language);
            }
            IndexEvent::Diagnostic { file, diagnostic } => {
                self.file_mut(&file).diagnostics.push(diagnostic);
            }
        }
    }

    /// Record a front-end failure on the translation unit.
    pub fn record_failure(&mut self, error: &crate::Error) {
        tracing::warn!("Front-end failed on {}: {}", self.request.file, error);
        self.files[0]
            .diagnostics
            .push(Diagnostic::error(Range::default(), error.to_string()));
    }

    /// Seal the builder and hand out the indexes.
    pub fn finish(self) -> ParseOutput {
        for file in &self.files {
            tracing::debug!("{}: {}", file.path, file.stats().to_string().trim_end());
        }
        ParseOutput { files: self.files }
    }

    /// Whether every signature an event resolves agrees with the category
    /// it is already indexed under (and with the rest of the event). A
    /// conflicting event is dropped and leaves a warning on its file.
    fn kinds_agree(&mut self, path: &str, range: Range, signatures: &[(&Usr, SymbolKind)]) -> bool {
        let file = self.file_mut(path);
        for (i, &(usr, kind)) in signatures.iter().enumerate() {
            let existing = match file.id_cache().kind_of(usr.as_str()) {
                SymbolKind::Invalid => signatures[..i]
                    .iter()
                    .find(|&&(other, other_kind)| other == usr && other_kind != kind)
                    .map(|&(_, other_kind)| other_kind),
                known => (known != kind).then_some(known),
            };
            if let Some(existing) = existing {
                let message = format!("{usr} reported as {kind} but already indexed as {existing}");
                tracing::warn!("{}: {}", file.path, message);
                file.diagnostics.push(Diagnostic::warning(range, message));
                return false;
            }
        }
        true
    }

    fn declare(&mut self, decl: Declaration) {
        if !self.kinds_agree(&decl.file, decl.spelling, &declared_signatures(&decl)) {
            return;
        }
        let name = self.namespaces.qualified_name(decl.container.as_ref(), &decl.name);
        self.namespaces.register(&decl.usr, &name);

        let file = self.file_mut(&decl.file);
        if decl.detail.is_cpp_only() {
            file.set_language(LanguageId::Cpp);
        } else if decl.detail.is_objc_only() {
            file.set_language(LanguageId::ObjC);
        }

        let kind = decl.kind;
        match kind {
            SymbolKind::Type => declare_type(file, decl, name),
            SymbolKind::Func => declare_func(file, decl, name),
            SymbolKind::Var => declare_var(file, decl, name),
            SymbolKind::Invalid | SymbolKind::File => {
                tracing::debug!("Ignoring {} declaration {}", kind, decl.usr);
            }
        }
    }

    fn reference(&mut self, reference: Reference) {
        let mut signatures = Vec::new();
        if matches!(reference.kind, SymbolKind::Type | SymbolKind::Func | SymbolKind::Var) {
            signatures.push((&reference.usr, reference.kind));
        }
        if reference.kind == SymbolKind::Func {
            signatures.extend(reference.container_func.iter().map(|usr| (usr, SymbolKind::Func)));
        }
        if !self.kinds_agree(&reference.file, reference.range, &signatures) {
            return;
        }
        let file = self.file_mut(&reference.file);
        match reference.kind {
            SymbolKind::Func => {
                let callee = file.to_func_id(reference.usr.as_str());
                let caller = reference
                    .container_func
                    .as_ref()
                    .map(|usr| file.to_func_id(usr.as_str()))
                    .unwrap_or(FuncId::INVALID);
                file.resolve_func_mut(callee)
                    .add_caller(FuncRef::new(caller, reference.range, reference.is_implicit));
                if caller.has_value() {
                    let call = FuncRef::new(callee, reference.range, reference.is_implicit);
                    let callees = &mut file.resolve_func_mut(caller).def.callees;
                    if !callees.iter().any(|c| c.same_call_site(&call)) {
                        callees.push(call);
                    }
                }
            }
            SymbolKind::Type => {
                let id = file.to_type_id(reference.usr.as_str());
                file.resolve_type_mut(id).add_use(reference.range);
            }
            SymbolKind::Var => {
                let id = file.to_var_id(reference.usr.as_str());
                file.resolve_var_mut(id).add_use(reference.range);
            }
            SymbolKind::Invalid | SymbolKind::File => {
                tracing::debug!("Ignoring {} reference {}", reference.kind, reference.usr);
            }
        }
    }
}

/// Every signature `declare_*` resolves for `decl`, with the category it
/// is resolved in.
fn declared_signatures(decl: &Declaration) -> Vec<(&Usr, SymbolKind)> {
    let kind = decl.kind;
    let mut signatures = vec![(&decl.usr, kind)];
    match kind {
        SymbolKind::Type => {
            signatures.extend(decl.alias_of.iter().map(|usr| (usr, SymbolKind::Type)));
            signatures.extend(decl.bases.iter().map(|usr| (usr, SymbolKind::Type)));
        }
        SymbolKind::Func => {
            signatures.extend(decl.bases.iter().map(|usr| (usr, SymbolKind::Func)));
        }
        SymbolKind::Var => {
            signatures.extend(decl.type_usr.iter().map(|usr| (usr, SymbolKind::Type)));
        }
        SymbolKind::Invalid | SymbolKind::File => return Vec::new(),
    }
    match &decl.semantic_parent {
        Some((SymbolKind::Type, owner)) => signatures.push((owner, SymbolKind::Type)),
        Some((SymbolKind::Func, owner)) if kind == SymbolKind::Var => {
            signatures.push((owner, SymbolKind::Func))
        }
        _ => {}
    }
    signatures
}

fn declare_type(file: &mut IndexFile, decl: Declaration, name: DisplayName) {
    let id = file.to_type_id(decl.usr.as_str());
    let alias_of = decl.alias_of.as_ref().map(|usr| file.to_type_id(usr.as_str()));
    let parents: Vec<_> = decl.bases.iter().map(|usr| file.to_type_id(usr.as_str())).collect();

    for &parent in &parents {
        file.resolve_type_mut(parent).add_derived(id);
    }
    if let Some((SymbolKind::Type, owner)) = &decl.semantic_parent {
        let owner = file.to_type_id(owner.as_str());
        push_unique(&mut file.resolve_type_mut(owner).def.types, id);
    }

    let ty = file.resolve_type_mut(id);
    ty.def.name = name;
    ty.def.kind = decl.detail;
    fill_docs(&mut ty.def.hover, &mut ty.def.comments, &decl);
    if alias_of.is_some() {
        ty.def.alias_of = alias_of;
    }
    for parent in parents {
        push_unique(&mut ty.def.parents, parent);
    }
    if decl.is_definition {
        ty.def.definition_spelling = Some(decl.spelling);
        ty.def.definition_extent = Some(decl.extent);
    } else {
        // forward declarations count as usages
        ty.add_use(decl.spelling);
    }
}

fn declare_func(file: &mut IndexFile, decl: Declaration, name: DisplayName) {
    let id = file.to_func_id(decl.usr.as_str());
    let bases: Vec<_> = decl.bases.iter().map(|usr| file.to_func_id(usr.as_str())).collect();

    for &base in &bases {
        file.resolve_func_mut(base).add_derived(id);
    }
    let declaring_type = match &decl.semantic_parent {
        Some((SymbolKind::Type, owner)) => {
            let owner = file.to_type_id(owner.as_str());
            push_unique(&mut file.resolve_type_mut(owner).def.funcs, id);
            Some(owner)
        }
        _ => None,
    };

    let func = file.resolve_func_mut(id);
    func.def.name = name;
    func.def.kind = decl.detail;
    func.def.storage = decl.storage;
    fill_docs(&mut func.def.hover, &mut func.def.comments, &decl);
    if declaring_type.is_some() {
        func.def.declaring_type = declaring_type;
    }
    for base in bases {
        push_unique(&mut func.def.base, base);
    }
    if decl.is_definition {
        func.def.definition_spelling = Some(decl.spelling);
        func.def.definition_extent = Some(decl.extent);
    } else {
        func.add_declaration(FuncDeclaration {
            spelling: decl.spelling,
            extent: decl.extent,
            content: decl.content,
            param_spellings: decl.param_spellings,
        });
    }
}

fn declare_var(file: &mut IndexFile, decl: Declaration, name: DisplayName) {
    let id = file.to_var_id(decl.usr.as_str());
    let variable_type = decl.type_usr.as_ref().map(|usr| file.to_type_id(usr.as_str()));
    if let Some(ty) = variable_type {
        file.resolve_type_mut(ty).add_instance(id);
    }

    let parent = match &decl.semantic_parent {
        Some((SymbolKind::Func, owner)) => {
            let owner = file.to_func_id(owner.as_str());
            push_unique(&mut file.resolve_func_mut(owner).def.locals, id);
            Some(VarParent::Func(owner))
        }
        Some((SymbolKind::Type, owner)) => {
            let owner = file.to_type_id(owner.as_str());
            push_unique(&mut file.resolve_type_mut(owner).def.vars, id);
            Some(VarParent::Type(owner))
        }
        _ => None,
    };

    let var = file.resolve_var_mut(id);
    var.def.name = name;
    var.def.kind = decl.detail;
    var.def.storage = decl.storage;
    fill_docs(&mut var.def.hover, &mut var.def.comments, &decl);
    if variable_type.is_some() {
        var.def.variable_type = variable_type;
    }
    if parent.is_some() {
        var.def.parent = parent;
    }
    if decl.is_definition {
        var.def.definition_spelling = Some(decl.spelling);
        var.def.definition_extent = Some(decl.extent);
    } else {
        var.add_declaration(decl.spelling);
    }
}

/// Later declarations only fill in docs, never erase them.
fn fill_docs(hover: &mut String, comments: &mut String, decl: &Declaration) {
    if !decl.hover.is_empty() {
        hover.clone_from(&decl.hover);
    }
    if !decl.comments.is_empty() {
        comments.clone_from(&decl.comments);
    }
}

fn modification_time(path: &Path) -> i64 {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Parse one translation unit and build the indexes of every file it
/// touched. A front-end failure is recorded as a diagnostic on the
/// translation unit; whatever was emitted before it is kept.
pub fn index_translation_unit(front_end: &dyn FrontEnd, request: &ParseRequest) -> ParseOutput {
    let mut builder = IndexBuilder::new(request);
    let result = front_end.parse(request, &mut |event| builder.apply(event));
    if let Err(e) = result {
        builder.record_failure(&e);
    }
    builder.finish()
}
