//! Project configuration loaded from `depscope.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::analysis::{AnalyzeOptions, ImportSyntax, DEFAULT_EXTENSIONS};
use crate::cache::CacheConfig;

/// Config file looked up in the project root.
pub const CONFIG_FILE: &str = "depscope.toml";

/// Build config picked up automatically when present in the root.
pub const TSCONFIG_FILE: &str = "tsconfig.json";

/// Errors that can occur while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Settings for one project. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub extensions: Vec<String>,
    pub cache_ttl_secs: u64,
    pub use_cache: bool,
    pub max_depth: Option<usize>,
    pub include_ignored: bool,
    pub build_config: Option<PathBuf>,
    /// Ad hoc ignore patterns, evaluated after the ignore files
    pub ignore: Vec<String>,
    pub skip_type_imports: bool,
    pub include_dynamic_imports: bool,
    pub include_require: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            cache_ttl_secs: 300,
            use_cache: true,
            max_depth: None,
            include_ignored: false,
            build_config: None,
            ignore: Vec::new(),
            skip_type_imports: true,
            include_dynamic_imports: true,
            include_require: true,
        }
    }
}

impl Config {
    /// Loads `explicit` if given, else `depscope.toml` from `root` when it
    /// exists. A missing default file yields the defaults.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = root.join(CONFIG_FILE);
                if !path.is_file() {
                    debug!(root = %root.display(), "no config file, using defaults");
                    return Ok(Self::default());
                }
                path
            }
        };

        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config = Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            default_ttl: self.cache_ttl(),
        }
    }

    /// The build config to hand the extractor, resolved against `root`.
    ///
    /// Falls back to `tsconfig.json` in the root when none is configured.
    pub fn resolve_build_config(&self, root: &Path) -> Option<PathBuf> {
        match &self.build_config {
            Some(path) => Some(root.join(path)),
            None => Some(root.join(TSCONFIG_FILE)).filter(|p| p.is_file()),
        }
    }

    pub fn to_analyze_options(&self, root: &Path) -> AnalyzeOptions {
        AnalyzeOptions {
            extensions: self.extensions.clone(),
            build_config: self.resolve_build_config(root),
            syntax: ImportSyntax {
                skip_type_imports: self.skip_type_imports,
                include_require: self.include_require,
                include_dynamic: self.include_dynamic_imports,
            },
            use_cache: self.use_cache,
            include_ignored: self.include_ignored,
            ..AnalyzeOptions::default()
        }
    }
}
