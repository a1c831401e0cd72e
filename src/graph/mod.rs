//! Graph module for file-level import relationships.
//!
//! This module provides the [`DependencyGraph`] struct, circular dependency
//! detection over it, and the depth-bounded [`ReachabilityGatherer`] that
//! produces the final packaged file set.
//!
//! # Example
//!
//! ```rust
//! use depscope::graph::{detect_cycles, DependencyGraph, ReachabilityGatherer};
//!
//! let mut graph = DependencyGraph::new();
//! graph.add_dependency("/p/a.ts", "/p/b.ts");
//! graph.add_dependency("/p/b.ts", "/p/a.ts");
//!
//! assert_eq!(detect_cycles(&graph).len(), 1);
//! assert_eq!(ReachabilityGatherer::unfiltered().gather(&graph, &["/p/a.ts"], None).len(), 2);
//! ```

mod cycles;
mod dependency_graph;
mod reachability;

pub use cycles::{detect_cycles, Cycle};
pub use dependency_graph::DependencyGraph;
pub use reachability::ReachabilityGatherer;
