//! File-level dependency graph implementation using petgraph.
//!
//! Nodes are absolute, normalized project paths; an edge points from an
//! importing file to the file it imports.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::ser::{Serialize, SerializeMap, Serializer};
use sha2::{Digest, Sha256};

/// A directed graph of file imports.
///
/// The graph uses petgraph's `DiGraph` internally, with a path index for
/// O(1) lookup. Parallel edges are never created: adding an edge that
/// already exists is a no-op, so each node's dependencies form a set.
///
/// # Example
///
/// ```rust
/// use depscope::graph::DependencyGraph;
///
/// let mut graph = DependencyGraph::new();
/// graph.add_dependency("/p/a.ts", "/p/b.ts");
/// graph.add_dependency("/p/a.ts", "/p/b.ts");
/// graph.add_dependency("/p/b.ts", "/p/c.ts");
///
/// assert_eq!(graph.node_count(), 3);
/// assert_eq!(graph.edge_count(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// The underlying directed graph
    graph: DiGraph<PathBuf, ()>,
    /// Maps paths to their node indices
    node_indices: HashMap<PathBuf, NodeIndex>,
}

impl DependencyGraph {
    /// Creates a new empty dependency graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new graph with pre-allocated capacity.
    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            graph: DiGraph::with_capacity(nodes, edges),
            node_indices: HashMap::with_capacity(nodes),
        }
    }

    /// Adds a file node, returning the existing index if already present.
    pub fn add_file(&mut self, path: impl Into<PathBuf>) -> NodeIndex {
        let path = path.into();
        if let Some(&idx) = self.node_indices.get(&path) {
            return idx;
        }

        let idx = self.graph.add_node(path.clone());
        self.node_indices.insert(path, idx);
        idx
    }

    /// Records that `from` imports `to`, adding both nodes as needed.
    ///
    /// Returns `true` if a new edge was created.
    pub fn add_dependency(&mut self, from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> bool {
        let from_idx = self.add_file(from);
        let to_idx = self.add_file(to);

        if self.graph.contains_edge(from_idx, to_idx) {
            return false;
        }
        self.graph.add_edge(from_idx, to_idx, ());
        true
    }

    /// Unions another graph into this one.
    pub fn merge(&mut self, other: &DependencyGraph) {
        for path in other.graph.node_weights() {
            self.add_file(path.clone());
        }
        for edge in other.graph.edge_references() {
            let from = &other.graph[edge.source()];
            let to = &other.graph[edge.target()];
            self.add_dependency(from.clone(), to.clone());
        }
    }

    /// Checks if a file is in the graph.
    pub fn contains(&self, path: &Path) -> bool {
        self.node_indices.contains_key(path)
    }

    /// Direct dependencies of `path`, sorted by path.
    ///
    /// Returns an empty vector for unknown paths.
    pub fn dependencies_of(&self, path: &Path) -> Vec<&Path> {
        self.neighbors(path, Direction::Outgoing)
    }

    /// Files that directly import `path`, sorted by path.
    pub fn dependents_of(&self, path: &Path) -> Vec<&Path> {
        self.neighbors(path, Direction::Incoming)
    }

    fn neighbors(&self, path: &Path, direction: Direction) -> Vec<&Path> {
        let Some(&idx) = self.node_indices.get(path) else {
            return Vec::new();
        };

        let mut paths: Vec<&Path> = self
            .graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n].as_path())
            .collect();
        paths.sort();
        paths
    }

    /// All files in the graph, sorted by path.
    pub fn files(&self) -> Vec<&Path> {
        let mut files: Vec<&Path> = self.graph.node_weights().map(PathBuf::as_path).collect();
        files.sort();
        files
    }

    /// Checks if the graph contains at least one import cycle.
    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Returns the number of files in the graph.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of import edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Checks if the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// A sorted adjacency view: every file maps to its sorted dependencies.
    pub fn to_adjacency(&self) -> BTreeMap<String, Vec<String>> {
        self.files()
            .into_iter()
            .map(|file| {
                let deps = self
                    .dependencies_of(file)
                    .into_iter()
                    .map(|d| d.display().to_string())
                    .collect();
                (file.display().to_string(), deps)
            })
            .collect()
    }

    /// Hash of the serialized graph, used as a diagnostic cache fingerprint.
    ///
    /// Serialization goes through the sorted adjacency view, so two graphs
    /// with the same files and edges always hash identically.
    pub fn content_hash(&self) -> String {
        let serialized = serde_json::to_vec(&self.to_adjacency()).unwrap_or_default();
        let digest = Sha256::digest(&serialized);
        format!("sha256:{}", hex::encode(digest))
    }
}

impl PartialEq for DependencyGraph {
    fn eq(&self, other: &Self) -> bool {
        self.node_count() == other.node_count()
            && self.edge_count() == other.edge_count()
            && self.to_adjacency() == other.to_adjacency()
    }
}

impl Eq for DependencyGraph {}

impl Serialize for DependencyGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let adjacency = self.to_adjacency();
        let mut map = serializer.serialize_map(Some(adjacency.len()))?;
        for (file, deps) in &adjacency {
            map.serialize_entry(file, deps)?;
        }
        map.end()
    }
}
