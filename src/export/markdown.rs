//! Markdown export implementation.
//!
//! Exports analysis reports in Markdown format for documentation and reporting.

use super::{Exporter, Report};
use std::io::{self, Write};

/// Markdown exporter implementation.
pub struct MarkdownExporter;

impl Exporter for MarkdownExporter {
    fn export<W: Write>(&self, report: &Report, writer: &mut W) -> io::Result<()> {
        // Title
        writeln!(writer, "# Dependency Scope Report")?;
        writeln!(writer)?;
        writeln!(writer, "**Root:** `{}`", report.root.display())?;
        writeln!(writer)?;

        // Summary section
        writeln!(writer, "## Summary")?;
        writeln!(writer)?;
        writeln!(writer, "| Metric | Value |")?;
        writeln!(writer, "|--------|-------|")?;
        writeln!(writer, "| Entry Files | {} |", report.entries.len())?;
        writeln!(writer, "| Gathered Files | {} |", report.files.len())?;
        writeln!(writer, "| Files in Graph | {} |", report.total_files)?;
        writeln!(writer, "| Imports | {} |", report.graph.edge_count())?;
        writeln!(
            writer,
            "| Circular Dependencies | {} |",
            report.cycles.len()
        )?;
        let depth = report
            .max_depth
            .map(|d| d.to_string())
            .unwrap_or_else(|| "unbounded".to_string());
        writeln!(writer, "| Max Depth | {} |", depth)?;
        writeln!(writer, "| Elapsed | {} ms |", report.elapsed.as_millis())?;
        writeln!(
            writer,
            "| Served From Cache | {} |",
            if report.from_cache { "yes" } else { "no" }
        )?;
        writeln!(writer)?;

        // Entries
        writeln!(writer, "## Entry Files")?;
        writeln!(writer)?;
        for entry in &report.entries {
            writeln!(writer, "- `{}`", report.display_path(entry))?;
        }
        writeln!(writer)?;

        // Gathered files, in discovery order
        writeln!(writer, "## Files ({})", report.files.len())?;
        writeln!(writer)?;
        for (i, file) in report.files.iter().enumerate() {
            writeln!(writer, "{}. `{}`", i + 1, report.display_path(file))?;
        }
        writeln!(writer)?;

        // Graph
        let adjacency = report.relative_adjacency();
        if !adjacency.is_empty() {
            writeln!(writer, "## Dependency Graph")?;
            writeln!(writer)?;
            writeln!(writer, "| File | Imports |")?;
            writeln!(writer, "|------|---------|")?;
            for (file, deps) in &adjacency {
                let imports = if deps.is_empty() {
                    "-".to_string()
                } else {
                    deps.iter()
                        .map(|d| format!("`{}`", d))
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                writeln!(writer, "| `{}` | {} |", file, imports)?;
            }
            writeln!(writer)?;
        }

        // Circular dependencies
        if !report.cycles.is_empty() {
            writeln!(writer, "## Issues")?;
            writeln!(writer)?;
            writeln!(writer, "### Circular Dependencies")?;
            writeln!(writer)?;
            writeln!(
                writer,
                "The following circular dependencies were detected:"
            )?;
            writeln!(writer)?;
            for (i, cycle) in report.cycles.iter().enumerate() {
                writeln!(writer, "{}. `{}`", i + 1, cycle.relative_path(&report.root))?;
            }
            writeln!(writer)?;
        }

        // Footer
        writeln!(writer, "---")?;
        writeln!(writer, "*Generated by depscope*")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::sample_report;

    fn export_markdown(report: &Report) -> String {
        let mut output = Vec::new();
        MarkdownExporter.export(report, &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_markdown_export_basic() {
        let md_str = export_markdown(&sample_report());

        assert!(md_str.contains("# Dependency Scope Report"));
        assert!(md_str.contains("**Root:** `/project`"));
        assert!(md_str.contains("| Gathered Files | 3 |"));
        assert!(md_str.contains("| Max Depth | 4 |"));
        assert!(md_str.contains("| Served From Cache | no |"));
    }

    #[test]
    fn test_markdown_export_sections() {
        let md_str = export_markdown(&sample_report());

        assert!(md_str.contains("## Summary"));
        assert!(md_str.contains("## Entry Files"));
        assert!(md_str.contains("## Files (3)"));
        assert!(md_str.contains("1. `src/index.ts`"));
        assert!(md_str.contains("| `src/index.ts` | `src/a.ts` |"));
    }

    #[test]
    fn test_markdown_export_with_cycles() {
        let md_str = export_markdown(&sample_report());

        assert!(md_str.contains("## Issues"));
        assert!(md_str.contains("### Circular Dependencies"));
        assert!(md_str.contains("1. `src/a.ts -> src/b.ts -> src/a.ts`"));
    }

    #[test]
    fn test_markdown_export_no_cycles() {
        let mut report = sample_report();
        report.cycles.clear();
        report.max_depth = None;

        let md_str = export_markdown(&report);
        assert!(!md_str.contains("## Issues"));
        assert!(md_str.contains("| Max Depth | unbounded |"));
        assert!(md_str.contains("*Generated by depscope*"));
    }
}
