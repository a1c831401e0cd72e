//! Export functionality for analysis reports.
//!
//! This module provides exporters for writing the gathered file set, the
//! merged graph and any cycles in JSON or Markdown.

pub mod json;
pub mod markdown;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::analysis::AnalysisResult;
use crate::graph::{Cycle, DependencyGraph};

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// JSON format - machine-readable, full data
    Json,
    /// Markdown format - documentation/reporting
    Markdown,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            _ => Err(format!(
                "Unknown export format: '{}'. Valid formats: json, markdown",
                s
            )),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// Everything one `analyze` + `gather` run produced.
#[derive(Debug, Clone)]
pub struct Report {
    /// Project root; paths are shown relative to it
    pub root: PathBuf,
    pub entries: Vec<PathBuf>,
    /// Gathered files in discovery order
    pub files: Vec<PathBuf>,
    pub graph: DependencyGraph,
    pub cycles: Vec<Cycle>,
    pub total_files: usize,
    pub max_depth: Option<usize>,
    pub elapsed: Duration,
    pub warnings: Vec<String>,
    pub from_cache: bool,
}

impl Report {
    /// Combines an analysis result with the files gathered from it.
    pub fn new(root: impl Into<PathBuf>, result: AnalysisResult, files: Vec<PathBuf>, max_depth: Option<usize>) -> Self {
        Self {
            root: root.into(),
            entries: result.entry_files,
            files,
            graph: result.graph,
            cycles: result.cycles,
            total_files: result.total_files,
            max_depth,
            elapsed: result.elapsed,
            warnings: result.warnings,
            from_cache: result.from_cache,
        }
    }

    /// Renders a path relative to the root, with forward slashes.
    pub fn display_path(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root) {
            Ok(relative) => crate::paths::to_slash(relative),
            Err(_) => path.display().to_string(),
        }
    }

    pub fn display_paths(&self, paths: &[PathBuf]) -> Vec<String> {
        paths.iter().map(|p| self.display_path(p)).collect()
    }

    /// The merged graph as sorted (file, dependencies) pairs, relative to the root.
    pub fn relative_adjacency(&self) -> Vec<(String, Vec<String>)> {
        self.graph
            .files()
            .into_iter()
            .map(|file| {
                let deps = self
                    .graph
                    .dependencies_of(file)
                    .into_iter()
                    .map(|d| self.display_path(d))
                    .collect();
                (self.display_path(file), deps)
            })
            .collect()
    }
}

/// Trait for exporters.
pub trait Exporter {
    /// Export the report to the given writer.
    fn export<W: Write>(&self, report: &Report, writer: &mut W) -> io::Result<()>;
}

/// Export a report in the specified format.
pub fn export<W: Write>(format: ExportFormat, report: &Report, writer: &mut W) -> io::Result<()> {
    match format {
        ExportFormat::Json => json::JsonExporter.export(report, writer),
        ExportFormat::Markdown => markdown::MarkdownExporter.export(report, writer),
    }
}

/// Export a report to a string.
pub fn export_to_string(format: ExportFormat, report: &Report) -> io::Result<String> {
    let mut buffer = Vec::new();
    export(format, report, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
pub(crate) fn sample_report() -> Report {
    use crate::graph::detect_cycles;

    let root = PathBuf::from("/project");
    let mut graph = DependencyGraph::new();
    graph.add_dependency("/project/src/index.ts", "/project/src/a.ts");
    graph.add_dependency("/project/src/a.ts", "/project/src/b.ts");
    graph.add_dependency("/project/src/b.ts", "/project/src/a.ts");
    let cycles = detect_cycles(&graph);

    Report {
        entries: vec![root.join("src/index.ts")],
        files: vec![root.join("src/index.ts"), root.join("src/a.ts"), root.join("src/b.ts")],
        total_files: graph.node_count(),
        graph,
        warnings: vec!["Circular dependency: src/a.ts -> src/b.ts -> src/a.ts".to_string()],
        cycles,
        max_depth: Some(4),
        elapsed: Duration::from_millis(12),
        from_cache: false,
        root,
    }
}
