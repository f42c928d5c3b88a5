use crate::cache::{CacheStore, SerializeFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Cache settings, read from `cxindex.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CacheConfig {
    pub cache_directory: Option<String>,
    pub project_root: Option<String>,
    pub format: Option<SerializeFormat>,
}

impl CacheConfig {
    /// Build the cache store this config describes. Relative paths are
    /// taken from `base`.
    pub fn store(&self, base: &Path) -> CacheStore {
        let project_root = self
            .project_root
            .as_ref()
            .map(|root| base.join(root))
            .unwrap_or_else(|| base.to_path_buf());
        let cache_dir = self
            .cache_directory
            .as_ref()
            .map(|dir| base.join(dir))
            .unwrap_or_else(|| default_cache_dir_in(&project_root));
        CacheStore::new(cache_dir, Some(project_root), self.format.unwrap_or_default())
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("cxindex.toml")
}

pub fn default_cache_dir_in(base: &Path) -> PathBuf {
    base.join(".cxindex").join("cache")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<CacheConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: CacheConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &CacheConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (pass force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_cache_dir(cache_dir: &Path) -> anyhow::Result<()> {
    if !cache_dir.as_os_str().is_empty() && !cache_dir.exists() {
        std::fs::create_dir_all(cache_dir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(load_config(Some(&dir.path().join("cxindex.toml"))).unwrap().is_none());
    }

    #[test]
    fn test_write_and_load_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cxindex.toml");
        let config = CacheConfig {
            cache_directory: Some("build/cache".to_string()),
            project_root: None,
            format: Some(SerializeFormat::MessagePack),
        };
        write_config(&path, &config, false).unwrap();
        assert!(write_config(&path, &config, false).is_err());
        write_config(&path, &config, true).unwrap();

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_store_defaults() {
        let store = CacheConfig::default().store(Path::new("/proj"));
        assert_eq!(store.cache_dir(), Path::new("/proj/.cxindex/cache"));
        assert_eq!(store.format(), SerializeFormat::Json);
        assert_eq!(
            store.cache_path_for("/proj/a.cc"),
            PathBuf::from("/proj/.cxindex/cache/a.cc.json")
        );
    }

    #[test]
    fn test_format_parses_from_toml() {
        let config: CacheConfig = toml::from_str("format = \"messagepack\"").unwrap();
        assert_eq!(config.format, Some(SerializeFormat::MessagePack));
        let config: CacheConfig = toml::from_str("format = \"msgpack\"").unwrap();
        assert_eq!(config.format, Some(SerializeFormat::MessagePack));
    }

    #[test]
    fn test_ensure_cache_dir() {
        let dir = TempDir::new().unwrap();
        let cache = default_cache_dir_in(dir.path());
        ensure_cache_dir(&cache).unwrap();
        assert!(cache.is_dir());
    }
}
