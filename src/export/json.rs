//! JSON export implementation.
//!
//! Exports analysis reports in JSON format for machine-readable output.

use super::{Exporter, Report};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};

/// JSON exporter implementation.
pub struct JsonExporter;

/// Serializable cycle for JSON output.
#[derive(Serialize)]
struct JsonCycle {
    files: Vec<String>,
    path: String,
}

/// Summary statistics for JSON output.
#[derive(Serialize)]
struct JsonSummary {
    entries: usize,
    gathered_files: usize,
    total_files: usize,
    imports: usize,
    circular_dependencies: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_depth: Option<usize>,
    elapsed_ms: u64,
    from_cache: bool,
}

/// Root JSON export structure.
#[derive(Serialize)]
struct JsonExport {
    root: String,
    summary: JsonSummary,
    entries: Vec<String>,
    files: Vec<String>,
    graph: BTreeMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    circular_dependencies: Vec<JsonCycle>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
}

impl Exporter for JsonExporter {
    fn export<W: Write>(&self, report: &Report, writer: &mut W) -> io::Result<()> {
        let circular_dependencies: Vec<JsonCycle> = report
            .cycles
            .iter()
            .map(|c| JsonCycle {
                files: report.display_paths(&c.nodes),
                path: c.relative_path(&report.root),
            })
            .collect();

        let export = JsonExport {
            root: report.root.display().to_string(),
            summary: JsonSummary {
                entries: report.entries.len(),
                gathered_files: report.files.len(),
                total_files: report.total_files,
                imports: report.graph.edge_count(),
                circular_dependencies: report.cycles.len(),
                max_depth: report.max_depth,
                elapsed_ms: u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
                from_cache: report.from_cache,
            },
            entries: report.display_paths(&report.entries),
            files: report.display_paths(&report.files),
            graph: report.relative_adjacency().into_iter().collect(),
            circular_dependencies,
            warnings: report.warnings.clone(),
        };

        let json = serde_json::to_string_pretty(&export)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        writeln!(writer, "{}", json)
    }
}
