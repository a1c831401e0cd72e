//! Circular dependency detection.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::warn;

use super::DependencyGraph;

/// An import loop, in the order it was walked.
///
/// The first node is where the loop was detected; the last node imports the
/// first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle {
    pub nodes: Vec<PathBuf>,
}

impl Cycle {
    pub fn new(nodes: Vec<PathBuf>) -> Self {
        Self { nodes }
    }

    /// Returns a formatted representation of the loop.
    ///
    /// For example: "a -> b -> c -> a"
    pub fn cycle_path(&self) -> String {
        let Some(first) = self.nodes.first() else {
            return String::new();
        };
        let mut parts: Vec<String> = self.nodes.iter().map(|n| n.display().to_string()).collect();
        parts.push(first.display().to_string());
        parts.join(" -> ")
    }

    /// Same as [`cycle_path`](Self::cycle_path) with every node shown
    /// relative to `root` where possible.
    pub fn relative_path(&self, root: &Path) -> String {
        let Some(first) = self.nodes.first() else {
            return String::new();
        };
        let show = |p: &PathBuf| {
            p.strip_prefix(root)
                .unwrap_or(p)
                .display()
                .to_string()
        };
        let mut parts: Vec<String> = self.nodes.iter().map(show).collect();
        parts.push(show(first));
        parts.join(" -> ")
    }

    /// Returns the number of files in the loop.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.nodes.iter().any(|n| n == path)
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cycle_path())
    }
}

/// Finds import loops in the graph.
///
/// A depth-first walk is started from every file (in path order), not only
/// from entry points, so loops unreachable from any entry are still
/// reported. Reaching a file that is on the current walk stack records the
/// stack suffix starting at that file. Loops are deduplicated only by exact
/// ordered sequence; a rotation of a known loop counts as a new one.
///
/// Detection never fails; the result is advisory.
///
/// # Example
///
/// ```rust
/// use depscope::graph::{detect_cycles, DependencyGraph};
///
/// let mut graph = DependencyGraph::new();
/// graph.add_dependency("/p/a", "/p/b");
/// graph.add_dependency("/p/b", "/p/a");
///
/// let cycles = detect_cycles(&graph);
/// assert_eq!(cycles.len(), 1);
/// assert_eq!(cycles[0].cycle_path(), "/p/a -> /p/b -> /p/a");
/// ```
pub fn detect_cycles(graph: &DependencyGraph) -> Vec<Cycle> {
    let mut cycles = Vec::new();
    let mut visited: HashSet<&Path> = HashSet::new();
    let mut on_stack: HashSet<&Path> = HashSet::new();
    let mut path: Vec<&Path> = Vec::new();
    // (node, its sorted dependencies, next dependency to visit)
    let mut frames: Vec<(&Path, Vec<&Path>, usize)> = Vec::new();

    for start in graph.files() {
        if visited.contains(start) {
            continue;
        }

        visited.insert(start);
        on_stack.insert(start);
        path.push(start);
        frames.push((start, graph.dependencies_of(start), 0));

        while let Some((node, deps, next)) = frames.last_mut() {
            if let Some(&dep) = deps.get(*next) {
                *next += 1;

                if on_stack.contains(dep) {
                    if let Some(pos) = path.iter().position(|p| *p == dep) {
                        let found = Cycle::new(path[pos..].iter().map(|p| p.to_path_buf()).collect());
                        push_unique(&mut cycles, found);
                    }
                } else if visited.insert(dep) {
                    on_stack.insert(dep);
                    path.push(dep);
                    frames.push((dep, graph.dependencies_of(dep), 0));
                }
            } else {
                let done = *node;
                on_stack.remove(done);
                path.pop();
                frames.pop();
            }
        }
    }

    for cycle in &cycles {
        warn!(cycle = %cycle, "circular dependency detected");
    }

    cycles
}

/// Appends `cycle` unless an identical ordered sequence is already present.
fn push_unique(cycles: &mut Vec<Cycle>, cycle: Cycle) -> bool {
    if cycles.contains(&cycle) {
        return false;
    }
    cycles.push(cycle);
    true
}
