//! Graph extraction adapters.
//!
//! An extractor turns one entry file into the local adjacency map of the
//! files it (transitively) imports. The builder fans out one extraction per
//! entry and merges the results; extractors never see each other's output.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, trace};

use super::imports::{ExtractError, ExtractResult, Import, ImportAnalyzer, ImportKind, SourceLanguage};
use crate::ignore::IgnoreEngine;
use crate::paths;

/// Project-relative file path -> project-relative paths it imports.
pub type Adjacency = BTreeMap<String, Vec<String>>;

/// File extensions analyzed when nothing else is configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs", "ts", "tsx", "mts", "cts"];

/// Which import forms count as edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSyntax {
    /// Drop TypeScript `import type` / `export type` edges
    pub skip_type_imports: bool,
    /// Follow CommonJS `require()` calls
    pub include_require: bool,
    /// Follow dynamic `import()` calls
    pub include_dynamic: bool,
}

impl Default for ImportSyntax {
    fn default() -> Self {
        Self {
            skip_type_imports: true,
            include_require: true,
            include_dynamic: true,
        }
    }
}

impl ImportSyntax {
    /// Returns true if the import should become a graph edge.
    pub fn accepts(&self, import: &Import) -> bool {
        if import.type_only && self.skip_type_imports {
            return false;
        }
        match import.kind {
            ImportKind::ES6 | ImportKind::ReExport => true,
            ImportKind::CommonJS => self.include_require,
            ImportKind::DynamicImport => self.include_dynamic,
        }
    }
}

/// Settings handed to an extractor for one call.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Directory all paths are resolved against and reported relative to
    pub base_dir: PathBuf,
    /// Project build config (e.g. `tsconfig.json`), if any
    pub build_config: Option<PathBuf>,
    /// Allowed extensions, without the leading dot
    pub extensions: Vec<String>,
    /// Paths this filter ignores are never reported
    pub exclude: Option<Arc<IgnoreEngine>>,
    pub syntax: ImportSyntax,
}

impl ExtractConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            build_config: None,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            exclude: None,
            syntax: ImportSyntax::default(),
        }
    }

    /// Returns true if the exclude filter rejects `path`.
    pub fn is_excluded(&self, path: &Path) -> bool {
        self.exclude
            .as_ref()
            .is_some_and(|engine| engine.should_ignore(path))
    }

    /// Returns true if the path carries one of the allowed extensions.
    pub fn has_allowed_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|allowed| allowed == ext))
    }
}

/// Source of per-entry adjacency maps.
#[async_trait]
pub trait GraphExtractor: Send + Sync {
    /// Extracts the import closure of `entry`, a path relative to
    /// `config.base_dir`. Every key and value is relative to the base dir.
    async fn extract(&self, entry: &Path, config: &ExtractConfig) -> ExtractResult<Adjacency>;
}

/// Extractor backed by tree-sitter import parsing and relative-path
/// resolution on disk.
///
/// Only relative specifiers are followed; package imports are external.
/// A specifier resolves to the exact file, then `<spec>.<ext>`, then
/// `<spec>/index.<ext>`, trying extensions in configured order.
///
/// File reads and parsing are blocking; the walk yields to the runtime after
/// each file so concurrent extractions on one task interleave.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeSitterExtractor;

impl TreeSitterExtractor {
    pub fn new() -> Self {
        Self
    }

    async fn extract_closure(&self, entry: &Path, config: &ExtractConfig) -> ExtractResult<Adjacency> {
        let mut analyzer = ImportAnalyzer::new()?;
        let base = &config.base_dir;
        let entry_abs = paths::absolutize(base, entry);

        if SourceLanguage::from_path(&entry_abs).is_none() {
            return Err(ExtractError::UnsupportedFileType {
                ext: entry_abs
                    .extension()
                    .map(|e| e.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                path: entry_abs,
            });
        }

        let mut adjacency = Adjacency::new();
        let mut seen: HashSet<PathBuf> = HashSet::from([entry_abs.clone()]);
        let mut queue: VecDeque<PathBuf> = VecDeque::from([entry_abs]);

        while let Some(file) = queue.pop_front() {
            let Some(relative) = paths::relative_to(&file, base) else {
                continue;
            };

            // Non-source files (json, css, ...) are leaves.
            let imports = if SourceLanguage::from_path(&file).is_some() {
                analyzer.analyze_file(&file)?
            } else {
                Vec::new()
            };

            let mut deps: Vec<String> = Vec::new();
            for import in imports {
                if !import.is_relative() || !config.syntax.accepts(&import) {
                    continue;
                }

                let Some(resolved) = resolve_specifier(&file, &import.source, config) else {
                    debug!(from = %file.display(), specifier = %import.source, "unresolved import");
                    continue;
                };

                let Some(dep_relative) = paths::relative_to(&resolved, base) else {
                    trace!(path = %resolved.display(), "import escapes base directory");
                    continue;
                };

                if config.is_excluded(&resolved) {
                    trace!(path = %resolved.display(), "import excluded");
                    continue;
                }

                let dep = paths::to_slash(&dep_relative);
                if !deps.contains(&dep) {
                    deps.push(dep);
                }
                if seen.insert(resolved.clone()) {
                    queue.push_back(resolved);
                }
            }

            adjacency.insert(paths::to_slash(&relative), deps);
            tokio::task::yield_now().await;
        }

        debug!(entry = %entry.display(), files = adjacency.len(), "extracted import closure");
        Ok(adjacency)
    }
}

#[async_trait]
impl GraphExtractor for TreeSitterExtractor {
    async fn extract(&self, entry: &Path, config: &ExtractConfig) -> ExtractResult<Adjacency> {
        self.extract_closure(entry, config).await
    }
}

/// Resolves a relative specifier from `importer` to an existing file.
pub fn resolve_specifier(importer: &Path, specifier: &str, config: &ExtractConfig) -> Option<PathBuf> {
    let dir = importer.parent()?;
    let target = paths::normalize(&dir.join(specifier));

    // `./dir/`, `.` and `..` name a directory: only its index can match.
    let directory_only = specifier.ends_with('/') || specifier == "." || specifier == "..";
    if directory_only {
        return find_index(&target, config);
    }

    if target.is_file() && config.has_allowed_extension(&target) {
        return Some(target);
    }

    for ext in &config.extensions {
        let mut with_ext: OsString = target.clone().into_os_string();
        with_ext.push(".");
        with_ext.push(ext);
        let candidate = PathBuf::from(with_ext);
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    find_index(&target, config)
}

fn find_index(dir: &Path, config: &ExtractConfig) -> Option<PathBuf> {
    config
        .extensions
        .iter()
        .map(|ext| dir.join(format!("index.{}", ext)))
        .find(|candidate| candidate.is_file())
}
