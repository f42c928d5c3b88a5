//! # cxindex - Persistent symbol index for C, C++ and Objective-C
//!
//! Per-file symbol graph for a language-intelligence backend.
//!
//! cxindex provides:
//! - Phantom-typed, per-file dense identifiers for types, functions and variables
//! - USR-keyed identity resolution scoped to one indexed file
//! - Entity records with definition payloads, reverse edges and usage lists
//! - An ingestion boundary that turns front-end events into file containers
//! - A versioned on-disk cache (JSON or MessagePack) with diffing across runs

pub mod id;
pub mod position;
pub mod symbol;
pub mod func_ref;
pub mod def;
pub mod entity;
pub mod id_cache;
pub mod index_file;
pub mod diff;
pub mod ingest;
pub mod cache;
pub mod config;
pub mod logging;

// Re-exports for convenient access
pub use id::{AnyId, FuncId, Id, RawId, TypeId, VarId};
pub use position::{Position, Range};
pub use symbol::{ClangSymbolKind, LanguageId, SignatureSource, StorageClass, SymbolKind, Usr};
pub use func_ref::FuncRef;
pub use def::{DisplayName, FuncDef, TypeDef, VarDef, VarParent};
pub use entity::{Entity, FuncDeclaration, IndexFunc, IndexType, IndexVar};
pub use id_cache::IdCache;
pub use index_file::{Diagnostic, DiagnosticSeverity, IndexFile, IndexInclude, IndexStats};
pub use diff::{CategoryDiff, IndexDiff};
pub use ingest::{
    index_translation_unit, Declaration, FileContents, FrontEnd, IndexBuilder, IndexEvent,
    NamespaceHelper, ParseOutput, ParseRequest, Reference,
};
pub use cache::{CacheStore, CacheVersion, SerializeFormat};
pub use config::CacheConfig;

/// Result type alias for cxindex operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cxindex operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("MessagePack encoding error: {0}")]
    MessagePackEncode(#[from] rmp_serde::encode::Error),

    #[error("MessagePack decoding error: {0}")]
    MessagePackDecode(#[from] rmp_serde::decode::Error),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Invalid function reference: {0}")]
    InvalidFuncRef(String),

    #[error("Unknown kind: {0}")]
    UnknownKind(String),

    #[error("Invalid cache header: {0}")]
    InvalidHeader(String),

    #[error("Unsupported cache version {found} (running {running})")]
    UnsupportedVersion {
        found: CacheVersion,
        running: CacheVersion,
    },

    #[error("Corrupt index: {0}")]
    CorruptIndex(String),

    #[error("Front-end error: {0}")]
    FrontEnd(String),
}
