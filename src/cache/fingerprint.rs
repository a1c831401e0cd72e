//! Cache key computation.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::analysis::ImportSyntax;
use crate::paths;

/// Fingerprint identifying one analysis request.
///
/// Computed over the sorted project-relative entry files, the project root,
/// the allowed extensions, any build config path handed to the extractor and
/// the import syntax flags, so reordering entries yields the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

#[derive(Serialize)]
struct KeyMaterial<'a> {
    entries: Vec<String>,
    root: String,
    extensions: Vec<&'a str>,
    config_paths: Vec<String>,
    skip_type_imports: bool,
    include_require: bool,
    include_dynamic: bool,
}

impl CacheKey {
    /// Computes the key for an analysis request.
    ///
    /// # Example
    ///
    /// ```rust
    /// use depscope::analysis::ImportSyntax;
    /// use depscope::cache::CacheKey;
    /// use std::path::{Path, PathBuf};
    ///
    /// let exts = vec!["ts".to_string()];
    /// let syntax = ImportSyntax::default();
    /// let a = CacheKey::compute(&[PathBuf::from("b.ts"), PathBuf::from("a.ts")], Path::new("/p"), &exts, &[], syntax);
    /// let b = CacheKey::compute(&[PathBuf::from("a.ts"), PathBuf::from("b.ts")], Path::new("/p"), &exts, &[], syntax);
    /// assert_eq!(a, b);
    /// ```
    pub fn compute(
        relative_entries: &[PathBuf],
        root: &Path,
        extensions: &[String],
        config_paths: &[PathBuf],
        syntax: ImportSyntax,
    ) -> Self {
        let mut entries: Vec<String> = relative_entries.iter().map(|e| paths::to_slash(e)).collect();
        entries.sort();
        entries.dedup();

        let material = KeyMaterial {
            entries,
            root: root.display().to_string(),
            extensions: extensions.iter().map(String::as_str).collect(),
            config_paths: config_paths.iter().map(|p| p.display().to_string()).collect(),
            skip_type_imports: syntax.skip_type_imports,
            include_require: syntax.include_require,
            include_dynamic: syntax.include_dynamic,
        };

        let serialized = serde_json::to_vec(&material).unwrap_or_default();
        Self(format!("deps:{}", hex::encode(Sha256::digest(&serialized))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}
