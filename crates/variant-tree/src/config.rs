//! Model configuration.
//!
//! Every field has a default, so a configuration file only lists what it
//! changes:
//!
//! ```toml
//! display_depth = 2
//! async_threshold = 500
//!
//! [filter]
//! pattern = "id*"
//! mode = "wildcard"
//! columns = { key = true, value = false, type = false }
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use variant_tree_core::{ThreadPoolConfig, ThreadPoolError, TreeError};

use crate::model::{Filter, FilterColumns, FilterMode};

/// Errors raised while loading a configuration or building a model from it.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid model configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("loader pool unavailable: {0}")]
    Pool(#[from] ThreadPoolError),

    #[error(transparent)]
    Filter(#[from] TreeError),
}

/// Initial filter settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub pattern: String,
    pub mode: FilterMode,
    pub columns: FilterColumns,
}

impl FilterConfig {
    pub fn compile(&self) -> Result<Filter, TreeError> {
        Filter::new(self.pattern.clone(), self.mode, self.columns)
    }
}

/// Settings of a [`VariantModel`](crate::VariantModel).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Container levels expanded in value text.
    pub display_depth: usize,
    /// Containers with at least this many children load in the background.
    pub async_threshold: usize,
    /// Children a loader publishes at a time.
    pub build_batch_size: usize,
    /// Keep siblings sorted by key.
    pub dynamic_sort: bool,
    pub filter: FilterConfig,
    /// Dedicated loader threads. `None` shares the global pool.
    pub loader_threads: Option<usize>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            display_depth: 1,
            async_threshold: 200,
            build_batch_size: 50,
            dynamic_sort: false,
            filter: FilterConfig::default(),
            loader_threads: None,
        }
    }
}

impl ModelConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn with_display_depth(mut self, depth: usize) -> Self {
        self.display_depth = depth;
        self
    }

    pub fn with_async_threshold(mut self, threshold: usize) -> Self {
        self.async_threshold = threshold;
        self
    }

    pub fn with_build_batch_size(mut self, size: usize) -> Self {
        self.build_batch_size = size;
        self
    }

    pub fn with_dynamic_sort(mut self, enabled: bool) -> Self {
        self.dynamic_sort = enabled;
        self
    }

    pub fn with_filter(mut self, pattern: impl Into<String>, mode: FilterMode, columns: FilterColumns) -> Self {
        self.filter = FilterConfig {
            pattern: pattern.into(),
            mode,
            columns,
        };
        self
    }

    pub fn with_loader_threads(mut self, threads: usize) -> Self {
        self.loader_threads = Some(threads);
        self
    }

    /// Pool configuration for a dedicated loader pool, if one is requested.
    pub(crate) fn pool_config(&self) -> Option<ThreadPoolConfig> {
        self.loader_threads.map(ThreadPoolConfig::with_threads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ModelConfig::default();
        assert_eq!(config.display_depth, 1);
        assert_eq!(config.async_threshold, 200);
        assert_eq!(config.build_batch_size, 50);
        assert!(!config.dynamic_sort);
        assert!(config.filter.pattern.is_empty());
        assert_eq!(config.filter.columns, FilterColumns::ALL);
        assert!(config.pool_config().is_none());
    }

    #[test]
    fn test_partial_toml() {
        let config = ModelConfig::from_toml_str(
            r#"
            display_depth = 3
            dynamic_sort = true

            [filter]
            pattern = "a?"
            mode = "wildcard"
            columns = { value = false }
            "#,
        )
        .unwrap();

        assert_eq!(config.display_depth, 3);
        assert_eq!(config.async_threshold, 200);
        assert!(config.dynamic_sort);
        assert_eq!(config.filter.mode, FilterMode::Wildcard);
        assert!(config.filter.columns.key);
        assert!(!config.filter.columns.value);
        assert!(config.filter.columns.type_name);
        assert!(config.filter.compile().unwrap().is_active());
    }

    #[test]
    fn test_bad_toml() {
        let err = ModelConfig::from_toml_str("display_depth = \"deep\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "async_threshold = 10\nloader_threads = 2").unwrap();

        let config = ModelConfig::load(file.path()).unwrap();
        assert_eq!(config.async_threshold, 10);
        assert_eq!(config.pool_config().and_then(|c| c.num_threads), Some(2));

        let missing = ModelConfig::load(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_builders() {
        let config = ModelConfig::new()
            .with_display_depth(0)
            .with_async_threshold(5)
            .with_build_batch_size(2)
            .with_dynamic_sort(true)
            .with_filter("x", FilterMode::Fixed, FilterColumns::KEY)
            .with_loader_threads(1);
        assert_eq!(config.display_depth, 0);
        assert_eq!(config.filter.mode, FilterMode::Fixed);
        assert_eq!(config.loader_threads, Some(1));
    }
}
