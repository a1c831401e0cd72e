//! Depth-bounded reachability gathering.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::DependencyGraph;
use crate::ignore::IgnoreEngine;
use crate::paths;
use crate::progress::{Phase, ProgressReporter};

/// Breadth-first collector of the files reachable from a set of entries.
///
/// # Example
///
/// ```rust
/// use depscope::graph::{DependencyGraph, ReachabilityGatherer};
/// use depscope::ignore::IgnoreEngine;
/// use std::path::PathBuf;
///
/// let mut graph = DependencyGraph::new();
/// graph.add_dependency("/p/a.ts", "/p/b.ts");
/// graph.add_dependency("/p/b.ts", "/p/c.ts");
///
/// let ignore = IgnoreEngine::new("/p");
/// let files = ReachabilityGatherer::new(&ignore).gather(&graph, &["a.ts"], Some(1));
/// assert_eq!(files, vec![PathBuf::from("/p/a.ts"), PathBuf::from("/p/b.ts")]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReachabilityGatherer<'a> {
    ignore: Option<&'a IgnoreEngine>,
    progress: ProgressReporter,
}

impl<'a> ReachabilityGatherer<'a> {
    /// A gatherer that skips files the engine ignores and resolves relative
    /// entries against the engine's root.
    pub fn new(ignore: &'a IgnoreEngine) -> Self {
        Self {
            ignore: Some(ignore),
            progress: ProgressReporter::disabled(),
        }
    }

    /// A gatherer with no ignore filtering. Entries must already match the
    /// graph's node paths.
    pub fn unfiltered() -> Self {
        Self::default()
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    fn resolve(&self, entry: &Path) -> PathBuf {
        match self.ignore {
            Some(ignore) => paths::absolutize(ignore.root(), entry),
            None => paths::normalize(entry),
        }
    }

    fn is_ignored(&self, path: &Path) -> bool {
        self.ignore.is_some_and(|ignore| ignore.should_ignore(path))
    }

    /// Collects every non-ignored file within `max_depth` hops of an entry.
    ///
    /// Entries are depth 0 and always part of the result unless ignored. A
    /// node at depth `>= max_depth` is kept but not expanded; `None` means
    /// no bound. The result is in discovery order with no duplicates.
    pub fn gather<P: AsRef<Path>>(
        &self,
        graph: &DependencyGraph,
        entries: &[P],
        max_depth: Option<usize>,
    ) -> Vec<PathBuf> {
        let mut visited: HashSet<PathBuf> = HashSet::new();
        let mut order: Vec<PathBuf> = Vec::new();
        let mut queue: VecDeque<(PathBuf, usize)> = VecDeque::new();

        for entry in entries {
            let path = self.resolve(entry.as_ref());
            if self.is_ignored(&path) {
                debug!(path = %path.display(), "skipping ignored entry");
                continue;
            }
            if visited.insert(path.clone()) {
                order.push(path.clone());
                queue.push_back((path, 0));
            }
        }

        self.progress.start(Phase::Gathering, order.len());
        let mut expanded = 0;

        while let Some((node, depth)) = queue.pop_front() {
            expanded += 1;

            if max_depth.is_some_and(|max| depth >= max) {
                self.progress
                    .advance(Phase::Gathering, expanded, order.len(), Some(&node));
                continue;
            }

            for dep in graph.dependencies_of(&node) {
                if visited.contains(dep) || self.is_ignored(dep) {
                    continue;
                }
                visited.insert(dep.to_path_buf());
                order.push(dep.to_path_buf());
                queue.push_back((dep.to_path_buf(), depth + 1));
            }

            self.progress
                .advance(Phase::Gathering, expanded, order.len(), Some(&node));
        }

        self.progress.finish(Phase::Gathering, expanded, order.len());
        debug!(files = order.len(), ?max_depth, "gathered reachable files");
        order
    }
}
