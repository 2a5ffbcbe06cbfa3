//
// config.rs
//
// Resolver configuration
//

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::cache::{ResolutionCache, DEFAULT_CACHE_CAPACITY};
use crate::dialect::DialectConfig;

/// Settings for a resolution run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverConfig {
    /// XQuery version and vendor profile
    pub dialect: DialectConfig,
    /// Capacity of each resolver cache; 0 disables caching
    pub cache_capacity: usize,
    /// Library module trees registered before resolving
    pub module_paths: Vec<PathBuf>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            dialect: DialectConfig::default(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            module_paths: Vec::new(),
        }
    }
}

impl ResolverConfig {
    /// Parse settings of the form
    ///
    /// ```json
    /// {
    ///   "xquery": { "version": "1.0-ml", "implementation": "marklogic/v9" },
    ///   "cacheCapacity": 1024,
    ///   "modules": ["lib/json.json"]
    /// }
    /// ```
    ///
    /// The dialect keys may also appear at the top level. Missing keys keep
    /// their defaults.
    pub fn from_settings(settings: &serde_json::Value) -> Self {
        let mut config = Self::default();

        config.dialect = DialectConfig::from_settings(settings.get("xquery").unwrap_or(settings));

        if let Some(v) = settings.get("cacheCapacity").and_then(|v| v.as_u64()) {
            config.cache_capacity = v as usize;
        }
        if let Some(paths) = settings.get("modules").and_then(|v| v.as_array()) {
            config.module_paths = paths
                .iter()
                .filter_map(|p| p.as_str())
                .map(PathBuf::from)
                .collect();
        }

        log::debug!(
            "Resolver config: dialect={} cache_capacity={} modules={}",
            config.dialect,
            config.cache_capacity,
            config.module_paths.len()
        );
        config
    }

    /// Read settings from a JSON file. Relative module paths are taken
    /// relative to the file's directory.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let settings: serde_json::Value = serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in config {}", path.display()))?;
        let mut config = Self::from_settings(&settings);

        if let Some(dir) = path.parent() {
            for module in &mut config.module_paths {
                if module.is_relative() {
                    *module = dir.join(&*module);
                }
            }
        }
        Ok(config)
    }

    /// A cache sized for this configuration, or `None` when caching is off.
    pub fn new_cache(&self) -> Option<ResolutionCache> {
        (self.cache_capacity > 0).then(|| ResolutionCache::with_capacity(self.cache_capacity))
    }
}
