//! Import extraction using tree-sitter for JavaScript/TypeScript.
//!
//! This module parses source files and lists the module specifiers each file
//! pulls in, whether through ES6 `import`, `export ... from`, CommonJS
//! `require()` or dynamic `import()`.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tree_sitter::{Language, Node, Parser, Tree, TreeCursor};

/// Errors that can occur while extracting imports.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Failed to read {}: {error}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("Failed to parse file: {}", .path.display())]
    ParseError { path: PathBuf },

    #[error("Unsupported file type '{ext}': {}", .path.display())]
    UnsupportedFileType { path: PathBuf, ext: String },

    #[error("Tree-sitter language initialization failed")]
    LanguageInit,
}

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// How a module was pulled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// `import ... from 'module'` or `import 'module'`
    ES6,
    /// `export { x } from 'module'` or `export * from 'module'`
    ReExport,
    /// `require('module')`
    CommonJS,
    /// `import('module')`
    DynamicImport,
}

/// A single module reference in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// The module specifier (e.g., "react", "./utils", "../lib/index.js")
    pub source: String,
    pub kind: ImportKind,
    /// `import type` / `export type` (TypeScript only)
    pub type_only: bool,
    /// Line number in the source file (1-indexed)
    pub line: usize,
}

impl Import {
    /// Returns true if the specifier is a path relative to the importing file.
    pub fn is_relative(&self) -> bool {
        self.source == "."
            || self.source == ".."
            || self.source.starts_with("./")
            || self.source.starts_with("../")
    }
}

/// Language type for file analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLanguage {
    JavaScript,
    TypeScript,
    Tsx,
    Jsx,
}

impl SourceLanguage {
    /// Determine language from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "js" | "mjs" | "cjs" => Some(SourceLanguage::JavaScript),
            "jsx" => Some(SourceLanguage::Jsx),
            "ts" | "mts" | "cts" => Some(SourceLanguage::TypeScript),
            "tsx" => Some(SourceLanguage::Tsx),
            _ => None,
        }
    }

    /// Determine language from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Get tree-sitter language for this source language.
    pub fn tree_sitter_language(&self) -> Language {
        match self {
            SourceLanguage::JavaScript | SourceLanguage::Jsx => {
                tree_sitter_javascript::LANGUAGE.into()
            }
            SourceLanguage::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            SourceLanguage::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

/// Extracts imports from JavaScript/TypeScript source files.
pub struct ImportAnalyzer {
    js_parser: Parser,
    ts_parser: Parser,
    tsx_parser: Parser,
}

impl ImportAnalyzer {
    /// Create a new ImportAnalyzer.
    pub fn new() -> ExtractResult<Self> {
        let parser_for = |language: SourceLanguage| -> ExtractResult<Parser> {
            let mut parser = Parser::new();
            parser
                .set_language(&language.tree_sitter_language())
                .map_err(|_| ExtractError::LanguageInit)?;
            Ok(parser)
        };

        Ok(Self {
            js_parser: parser_for(SourceLanguage::JavaScript)?,
            ts_parser: parser_for(SourceLanguage::TypeScript)?,
            tsx_parser: parser_for(SourceLanguage::Tsx)?,
        })
    }

    /// Analyze a single file and extract all imports.
    pub fn analyze_file(&mut self, path: &Path) -> ExtractResult<Vec<Import>> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        let language =
            SourceLanguage::from_extension(ext).ok_or_else(|| ExtractError::UnsupportedFileType {
                path: path.to_path_buf(),
                ext: ext.to_string(),
            })?;

        let content = fs::read_to_string(path).map_err(|error| ExtractError::FileRead {
            path: path.to_path_buf(),
            error,
        })?;
        self.analyze_source(&content, language, path)
    }

    /// Analyze source code directly.
    pub fn analyze_source(
        &mut self,
        source: &str,
        language: SourceLanguage,
        path: &Path,
    ) -> ExtractResult<Vec<Import>> {
        let parser = match language {
            SourceLanguage::JavaScript | SourceLanguage::Jsx => &mut self.js_parser,
            SourceLanguage::TypeScript => &mut self.ts_parser,
            SourceLanguage::Tsx => &mut self.tsx_parser,
        };

        let tree = parser.parse(source, None).ok_or_else(|| ExtractError::ParseError {
            path: path.to_path_buf(),
        })?;

        Ok(extract_imports(&tree, source))
    }
}

fn extract_imports(tree: &Tree, source: &str) -> Vec<Import> {
    let mut imports = Vec::new();
    let mut cursor = tree.root_node().walk();
    visit_node(&mut cursor, source, &mut imports);
    imports
}

fn visit_node(cursor: &mut TreeCursor, source: &str, imports: &mut Vec<Import>) {
    let node = cursor.node();

    match node.kind() {
        "import_statement" => {
            if let Some(import) = parse_module_statement(&node, source, ImportKind::ES6) {
                imports.push(import);
            }
        }
        "export_statement" => {
            if let Some(import) = parse_module_statement(&node, source, ImportKind::ReExport) {
                imports.push(import);
            }
        }
        "call_expression" => {
            if let Some(import) = parse_require_or_dynamic_import(&node, source) {
                imports.push(import);
            }
        }
        _ => {}
    }

    if cursor.goto_first_child() {
        loop {
            visit_node(cursor, source, imports);
            if !cursor.goto_next_sibling() {
                break;
            }
        }
        cursor.goto_parent();
    }
}

/// Parse an `import` statement or an `export ... from` statement.
fn parse_module_statement(node: &Node, source: &str, kind: ImportKind) -> Option<Import> {
    let source_node = node.child_by_field_name("source")?;
    let module = extract_string_value(&source_node, source)?;
    if module.is_empty() {
        return None;
    }

    let mut cursor = node.walk();
    let type_only = node
        .children(&mut cursor)
        .any(|child| !child.is_named() && child.kind() == "type");

    Some(Import {
        source: module,
        kind,
        type_only,
        line: node.start_position().row + 1,
    })
}

/// Parse `require('x')` or `import('x')` calls.
fn parse_require_or_dynamic_import(node: &Node, source: &str) -> Option<Import> {
    let func_node = node.child_by_field_name("function")?;
    let kind = match node_text(&func_node, source)? {
        "require" => ImportKind::CommonJS,
        "import" => ImportKind::DynamicImport,
        _ => return None,
    };

    let args_node = node.child_by_field_name("arguments")?;
    let mut cursor = args_node.walk();
    let first_string = args_node
        .children(&mut cursor)
        .find(|child| child.kind() == "string")?;

    Some(Import {
        source: extract_string_value(&first_string, source)?,
        kind,
        type_only: false,
        line: node.start_position().row + 1,
    })
}

fn node_text<'a>(node: &Node, source: &'a str) -> Option<&'a str> {
    source.get(node.start_byte()..node.end_byte())
}

/// Extract string value (removes quotes).
fn extract_string_value(node: &Node, source: &str) -> Option<String> {
    let text = node_text(node, source)?;
    let trimmed = text
        .trim_start_matches(['"', '\'', '`'])
        .trim_end_matches(['"', '\'', '`']);
    Some(trimmed.to_string())
}
