//! Dependency analysis for JavaScript/TypeScript projects.
//!
//! This module turns entry files into a merged, ignore-filtered dependency
//! graph.
//!
//! # Features
//!
//! - Parse ES6 `import`/`export ... from`, CommonJS `require()` and dynamic
//!   `import()` with tree-sitter
//! - Resolve relative specifiers to files on disk
//! - Fan out one extraction per entry and merge the results
//! - Serve repeated analyses from a TTL cache
//!
//! # Example
//!
//! ```ignore
//! use std::path::{Path, PathBuf};
//! use std::sync::Arc;
//! use depscope::analysis::{AnalyzeOptions, DependencyGraphBuilder, TreeSitterExtractor};
//! use depscope::ignore::IgnoreEngine;
//!
//! let root = Path::new("./my-app").canonicalize()?;
//! let mut builder = DependencyGraphBuilder::new(
//!     Arc::new(TreeSitterExtractor::new()),
//!     IgnoreEngine::load(&root)?,
//! );
//!
//! let entries = vec![PathBuf::from("src/index.ts")];
//! let result = builder.analyze(&entries, &root, &AnalyzeOptions::default()).await?;
//! for file in builder.gather(&result.graph, &entries, None) {
//!     println!("{}", file.display());
//! }
//! ```

mod builder;
mod discover;
mod extractor;
mod imports;

pub use builder::{AnalysisResult, AnalyzeOptions, DependencyGraphBuilder};
pub use discover::discover_entries;
pub use extractor::{
    resolve_specifier, Adjacency, ExtractConfig, GraphExtractor, ImportSyntax, TreeSitterExtractor,
    DEFAULT_EXTENSIONS,
};
pub use imports::{ExtractError, ExtractResult, Import, ImportAnalyzer, ImportKind, SourceLanguage};
