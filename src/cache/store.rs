//! Cache store - maps source files to cache files and moves indexes in
//! and out of them

use super::format::{decode, encode};
use super::{CacheVersion, SerializeFormat};
use crate::index_file::IndexFile;
use crate::Result;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Longest cache file name kept verbatim
const MAX_FILE_NAME_LEN: usize = 200;

/// A directory of cache files, one per indexed source file.
#[derive(Debug, Clone)]
pub struct CacheStore {
    cache_dir: PathBuf,
    project_root: Option<PathBuf>,
    format: SerializeFormat,
    version: CacheVersion,
}

impl CacheStore {
    pub fn new(
        cache_dir: impl Into<PathBuf>,
        project_root: Option<PathBuf>,
        format: SerializeFormat,
    ) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            project_root,
            format,
            version: CacheVersion::CURRENT,
        }
    }

    /// Read and write as `version` instead of the running version.
    pub fn with_version(mut self, version: CacheVersion) -> Self {
        self.version = version;
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn format(&self) -> SerializeFormat {
        self.format
    }

    pub fn version(&self) -> CacheVersion {
        self.version
    }

    /// Cache file for `source_path`.
    ///
    /// Paths under the project root are made relative first; separators
    /// and drive colons become `@`, so every source maps to one flat name.
    /// A literal `@` is written as `%40` (and `%` as `%25`) so it cannot
    /// collide with a separator. `/`, `\` and `:` all fold to `@`.
    pub fn cache_path_for(&self, source_path: &str) -> PathBuf {
        let relative = self
            .project_root
            .as_ref()
            .and_then(|root| Path::new(source_path).strip_prefix(root).ok())
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|| source_path.to_string());

        let mut escaped = String::with_capacity(relative.len());
        for c in relative.chars() {
            match c {
                '%' => escaped.push_str("%25"),
                '@' => escaped.push_str("%40"),
                '/' | '\\' | ':' => escaped.push('@'),
                c => escaped.push(c),
            }
        }

        let extension = self.format.extension();
        let name = if escaped.len() + extension.len() + 1 > MAX_FILE_NAME_LEN {
            shortened_name(source_path, &escaped)
        } else {
            escaped
        };
        self.cache_dir.join(format!("{name}.{extension}"))
    }

    /// Load an index, or `None` if the cache cannot be used and the file
    /// must be re-indexed.
    pub fn load(&self, cache_path: &Path) -> Option<IndexFile> {
        let bytes = match std::fs::read(cache_path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!("Cache miss for {}: {}", cache_path.display(), e);
                return None;
            }
        };
        match decode(&bytes, self.format, self.version) {
            Ok(file) => {
                tracing::debug!("Loaded cache {} ({} bytes)", cache_path.display(), bytes.len());
                Some(file)
            }
            Err(crate::Error::UnsupportedVersion { found, running }) => {
                tracing::info!(
                    "Ignoring cache {}: version {} cannot be read by {}",
                    cache_path.display(),
                    found,
                    running
                );
                None
            }
            Err(e) => {
                tracing::warn!("Failed to decode cache {}: {}", cache_path.display(), e);
                None
            }
        }
    }

    /// Load the cached index of `source_path`.
    pub fn load_for(&self, source_path: &str) -> Option<IndexFile> {
        self.load(&self.cache_path_for(source_path))
    }

    /// Write an index atomically: readers see the old file or the new one,
    /// never a partial write.
    pub fn write(&self, cache_path: &Path, file: &IndexFile) -> Result<()> {
        let bytes = encode(file, self.format, self.version)?;
        let parent = match cache_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)?;

        let mut temp = tempfile::NamedTempFile::new_in(parent)?;
        temp.write_all(&bytes)?;
        temp.as_file().sync_all()?;
        temp.persist(cache_path).map_err(|e| e.error)?;

        tracing::debug!("Wrote cache {} ({} bytes)", cache_path.display(), bytes.len());
        Ok(())
    }

    /// Write the index of `file` to its own cache path.
    pub fn write_for(&self, file: &IndexFile) -> Result<PathBuf> {
        let path = self.cache_path_for(&file.path);
        self.write(&path, file)?;
        Ok(path)
    }

    /// Drop a cache file. Missing files are not an error.
    pub fn remove(&self, cache_path: &Path) -> Result<()> {
        match std::fs::remove_file(cache_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Hash of the full path plus as much of the name's tail as fits.
fn shortened_name(source_path: &str, escaped: &str) -> String {
    let hash = blake3::hash(source_path.as_bytes()).to_hex();
    let budget = MAX_FILE_NAME_LEN - hash.len() - 16;
    let mut start = escaped.len().saturating_sub(budget);
    while !escaped.is_char_boundary(start) {
        start += 1;
    }
    format!("{}-{}", hash, &escaped[start..])
}
