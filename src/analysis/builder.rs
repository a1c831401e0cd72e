//! Project-wide dependency graph construction.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, info, trace};

use super::extractor::{Adjacency, ExtractConfig, GraphExtractor, ImportSyntax, DEFAULT_EXTENSIONS};
use crate::cache::{CacheKey, DependencyCache, GetOptions, SetOptions};
use crate::error::{EntryIssue, EntryIssueKind, ScopeError, ScopeResult, ValidationError};
use crate::graph::{detect_cycles, Cycle, DependencyGraph, ReachabilityGatherer};
use crate::ignore::IgnoreEngine;
use crate::paths;
use crate::progress::{Phase, ProgressReporter};

/// Per-call analysis settings.
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    /// Allowed extensions, without the leading dot
    pub extensions: Vec<String>,
    /// Project build config handed to the extractor
    pub build_config: Option<PathBuf>,
    pub syntax: ImportSyntax,
    /// Read and write the result cache, if the builder has one
    pub use_cache: bool,
    /// Skip the cache for this call only
    pub bypass_cache: bool,
    /// Re-extract and replace any live cache entry
    pub force: bool,
    /// TTL for the entry written by this call
    pub cache_ttl: Option<Duration>,
    /// Keep ignored and vendor paths in the merged graph
    pub include_ignored: bool,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            build_config: None,
            syntax: ImportSyntax::default(),
            use_cache: true,
            bypass_cache: false,
            force: false,
            cache_ttl: None,
            include_ignored: false,
        }
    }
}

/// Outcome of one `analyze` call.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// Absolute entry files, deduplicated, in the order given
    pub entry_files: Vec<PathBuf>,
    pub graph: DependencyGraph,
    pub cycles: Vec<Cycle>,
    /// Distinct files in the merged graph
    pub total_files: usize,
    pub elapsed: Duration,
    /// One message per cycle; empty when the graph is acyclic
    pub warnings: Vec<String>,
    pub from_cache: bool,
}

impl AnalysisResult {
    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }
}

/// Builds merged dependency graphs for sets of entry files.
///
/// The builder owns the ignore rules and the optional result cache for one
/// project root. Extraction is delegated to a [`GraphExtractor`], invoked
/// once per entry file with all calls in flight at the same time; results
/// are merged only after every call has completed.
///
/// # Example
///
/// ```rust,no_run
/// use std::path::{Path, PathBuf};
/// use std::sync::Arc;
/// use depscope::analysis::{AnalyzeOptions, DependencyGraphBuilder, TreeSitterExtractor};
/// use depscope::ignore::IgnoreEngine;
///
/// # async fn run() -> Result<(), depscope::error::ScopeError> {
/// let root = Path::new("/project");
/// let ignore = IgnoreEngine::load(root)?;
/// let mut builder = DependencyGraphBuilder::new(Arc::new(TreeSitterExtractor::new()), ignore);
///
/// let entries = vec![PathBuf::from("src/index.ts")];
/// let result = builder.analyze(&entries, root, &AnalyzeOptions::default()).await?;
/// let files = builder.gather(&result.graph, &entries, Some(3));
/// # Ok(())
/// # }
/// ```
pub struct DependencyGraphBuilder {
    extractor: Arc<dyn GraphExtractor>,
    ignore: Arc<IgnoreEngine>,
    cache: Option<DependencyCache>,
    progress: ProgressReporter,
}

impl DependencyGraphBuilder {
    pub fn new(extractor: Arc<dyn GraphExtractor>, ignore: IgnoreEngine) -> Self {
        Self {
            extractor,
            ignore: Arc::new(ignore),
            cache: None,
            progress: ProgressReporter::disabled(),
        }
    }

    /// Attaches a result cache. The cache must be initialized by the caller.
    pub fn with_cache(mut self, cache: DependencyCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    pub fn ignore(&self) -> &IgnoreEngine {
        &self.ignore
    }

    pub fn cache(&self) -> Option<&DependencyCache> {
        self.cache.as_ref()
    }

    pub fn cache_mut(&mut self) -> Option<&mut DependencyCache> {
        self.cache.as_mut()
    }

    /// Builds the merged, ignore-filtered dependency graph of `entry_files`.
    ///
    /// Entry files may be absolute or relative to `project_root`, which must
    /// be the root the ignore engine was created for. Every invalid entry is
    /// reported in a single error. Any extraction failure aborts the call;
    /// no partial graph is returned.
    pub async fn analyze(
        &mut self,
        entry_files: &[PathBuf],
        project_root: &Path,
        options: &AnalyzeOptions,
    ) -> ScopeResult<AnalysisResult> {
        let started = Instant::now();
        let root = self.check_root(project_root)?;
        let (entries, relative_entries) = self.validate(&root, entry_files, options)?;

        let cache_key = self.cache_key(&root, &relative_entries, options);
        if let Some(key) = &cache_key {
            if !options.force {
                if let Some(cache) = self.cache.as_mut() {
                    if let Some(graph) = cache.get(key, GetOptions::default())? {
                        info!(key = %key, files = graph.node_count(), "serving dependency graph from cache");
                        return Ok(Self::finish(&root, entries, graph, started, true));
                    }
                }
            }
        }

        let adjacencies = self.extract_all(&root, &relative_entries, options).await?;
        let graph = self.merge(&root, adjacencies, options.include_ignored);

        if let (Some(key), Some(cache)) = (&cache_key, self.cache.as_mut()) {
            let set = SetOptions {
                force: options.force,
                ttl: options.cache_ttl,
            };
            cache.set(key, graph.clone(), set)?;
            debug!(stats = ?cache.stats(), "cache stats after analyze");
        }

        Ok(Self::finish(&root, entries, graph, started, false))
    }

    /// Collects every non-ignored file within `max_depth` hops of the entries.
    pub fn gather<P: AsRef<Path>>(
        &self,
        graph: &DependencyGraph,
        entries: &[P],
        max_depth: Option<usize>,
    ) -> Vec<PathBuf> {
        ReachabilityGatherer::new(&self.ignore)
            .with_progress(self.progress.clone())
            .gather(graph, entries, max_depth)
    }

    /// Releases cached graphs. The builder remains usable.
    pub fn shutdown(&mut self) {
        if let Some(cache) = self.cache.as_mut() {
            cache.clear();
        }
    }

    fn check_root(&self, project_root: &Path) -> ScopeResult<PathBuf> {
        let canonical = project_root
            .canonicalize()
            .map_err(|source| ValidationError::ProjectRoot {
                path: project_root.to_path_buf(),
                source,
            })?;

        let engine_root = self.ignore.root();
        let engine_canonical = engine_root
            .canonicalize()
            .unwrap_or_else(|_| engine_root.to_path_buf());

        if canonical != engine_canonical {
            return Err(ValidationError::RootMismatch {
                project_root: canonical,
                engine_root: engine_root.to_path_buf(),
            }
            .into());
        }

        Ok(engine_root.to_path_buf())
    }

    /// Returns absolute and root-relative entries, or every problem found.
    fn validate(
        &self,
        root: &Path,
        entry_files: &[PathBuf],
        options: &AnalyzeOptions,
    ) -> ScopeResult<(Vec<PathBuf>, Vec<PathBuf>)> {
        if entry_files.is_empty() {
            return Err(ValidationError::NoEntries.into());
        }

        let total = entry_files.len();
        self.progress.start(Phase::Validation, total);

        let mut issues = Vec::new();
        let mut entries: Vec<PathBuf> = Vec::with_capacity(total);
        let mut relative_entries: Vec<PathBuf> = Vec::with_capacity(total);

        for (i, entry) in entry_files.iter().enumerate() {
            let absolute = paths::absolutize(root, entry);
            self.progress.advance(Phase::Validation, i + 1, total, Some(&absolute));

            let Some(relative) = paths::relative_to(&absolute, root) else {
                issues.push(EntryIssue::new(entry, EntryIssueKind::OutsideRoot));
                continue;
            };
            if !absolute.exists() {
                issues.push(EntryIssue::new(entry, EntryIssueKind::Missing));
                continue;
            }
            if !absolute.is_file() {
                issues.push(EntryIssue::new(entry, EntryIssueKind::NotAFile));
                continue;
            }
            if !options.include_ignored && self.ignore.should_ignore(&absolute) {
                issues.push(EntryIssue::new(entry, EntryIssueKind::Ignored));
                continue;
            }

            if !entries.contains(&absolute) {
                entries.push(absolute);
                relative_entries.push(relative);
            }
        }

        self.progress.finish(Phase::Validation, total, total);

        if !issues.is_empty() {
            return Err(ValidationError::InvalidEntries(issues).into());
        }
        Ok((entries, relative_entries))
    }

    fn cache_key(&self, root: &Path, relative_entries: &[PathBuf], options: &AnalyzeOptions) -> Option<CacheKey> {
        // Graphs that keep ignored paths are never cached.
        if self.cache.is_none() || !options.use_cache || options.bypass_cache || options.include_ignored {
            return None;
        }
        let config_paths: Vec<PathBuf> = options.build_config.iter().cloned().collect();
        Some(CacheKey::compute(
            relative_entries,
            root,
            &options.extensions,
            &config_paths,
            options.syntax,
        ))
    }

    async fn extract_all(
        &self,
        root: &Path,
        relative_entries: &[PathBuf],
        options: &AnalyzeOptions,
    ) -> ScopeResult<Vec<Adjacency>> {
        let config = ExtractConfig {
            base_dir: root.to_path_buf(),
            build_config: options.build_config.clone(),
            extensions: options.extensions.clone(),
            exclude: (!options.include_ignored).then(|| Arc::clone(&self.ignore)),
            syntax: options.syntax,
        };

        let total = relative_entries.len();
        self.progress.start(Phase::Extraction, total);
        debug!(entries = total, root = %root.display(), "starting extraction fan-out");

        let extractor = self.extractor.as_ref();
        let config = &config;
        let mut tasks: FuturesUnordered<_> = relative_entries
            .iter()
            .enumerate()
            .map(|(index, entry)| async move { (index, entry, extractor.extract(entry, config).await) })
            .collect();

        let mut results: Vec<Option<Adjacency>> = vec![None; total];
        let mut completed = 0;

        while let Some((index, entry, result)) = tasks.next().await {
            match result {
                Ok(adjacency) => {
                    completed += 1;
                    trace!(entry = %entry.display(), files = adjacency.len(), "extraction finished");
                    self.progress.advance(Phase::Extraction, completed, total, Some(entry));
                    results[index] = Some(adjacency);
                }
                Err(source) => {
                    self.progress.finish(Phase::Extraction, completed, total);
                    return Err(ScopeError::DependencyAnalysis {
                        entry: entry.clone(),
                        entries: relative_entries.to_vec(),
                        source,
                    });
                }
            }
        }

        self.progress.finish(Phase::Extraction, completed, total);
        debug!(completed, "extraction fan-out finished");
        Ok(results.into_iter().flatten().collect())
    }

    /// Unions the per-entry maps into one graph, dropping ignored nodes.
    fn merge(&self, root: &Path, adjacencies: Vec<Adjacency>, include_ignored: bool) -> DependencyGraph {
        let keep = |path: &Path| include_ignored || !self.ignore.should_ignore(path);
        let mut graph = DependencyGraph::new();
        let mut dropped = 0usize;

        for adjacency in adjacencies {
            for (file, deps) in adjacency {
                let from = paths::absolutize(root, Path::new(&file));
                if !keep(&from) {
                    dropped += 1;
                    continue;
                }
                graph.add_file(from.clone());

                for dep in deps {
                    let to = paths::absolutize(root, Path::new(&dep));
                    if !keep(&to) {
                        dropped += 1;
                        continue;
                    }
                    graph.add_dependency(from.clone(), to);
                }
            }
        }

        if dropped > 0 {
            debug!(dropped, "dropped ignored paths while merging");
        }
        graph
    }

    fn finish(
        root: &Path,
        entry_files: Vec<PathBuf>,
        graph: DependencyGraph,
        started: Instant,
        from_cache: bool,
    ) -> AnalysisResult {
        let cycles = detect_cycles(&graph);
        let warnings = cycles
            .iter()
            .map(|cycle| format!("Circular dependency: {}", cycle.relative_path(root)))
            .collect();

        let result = AnalysisResult {
            entry_files,
            total_files: graph.node_count(),
            graph,
            cycles,
            elapsed: started.elapsed(),
            warnings,
            from_cache,
        };
        info!(
            files = result.total_files,
            cycles = result.cycles.len(),
            from_cache,
            elapsed = ?result.elapsed,
            "dependency analysis complete"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ExtractError;
    use crate::cache::CacheConfig;
    use crate::error::ErrorKind;
    use crate::ignore::RuleSource;
    use crate::progress::ProgressEvent;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Serves canned adjacency maps and counts calls.
    #[derive(Default)]
    struct CannedExtractor {
        graphs: HashMap<String, Vec<(&'static str, Vec<&'static str>)>>,
        calls: AtomicUsize,
    }

    impl CannedExtractor {
        fn with(mut self, entry: &str, edges: Vec<(&'static str, Vec<&'static str>)>) -> Self {
            self.graphs.insert(entry.to_string(), edges);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GraphExtractor for CannedExtractor {
        async fn extract(&self, entry: &Path, config: &ExtractConfig) -> Result<Adjacency, ExtractError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let key = paths::to_slash(entry);
            let edges = self.graphs.get(&key).ok_or_else(|| ExtractError::ParseError {
                path: config.base_dir.join(entry),
            })?;
            Ok(edges
                .iter()
                .map(|(file, deps)| (file.to_string(), deps.iter().map(|d| d.to_string()).collect()))
                .collect())
        }
    }

    struct Fixture {
        _dir: TempDir,
        root: PathBuf,
    }

    fn fixture(files: &[&str]) -> Fixture {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        for file in files {
            let path = root.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "").unwrap();
        }
        Fixture { _dir: dir, root }
    }

    fn cycle_extractor() -> Arc<CannedExtractor> {
        Arc::new(CannedExtractor::default().with(
            "a",
            vec![("a", vec!["b"]), ("b", vec!["c", "a"]), ("c", vec![])],
        ))
    }

    fn builder(root: &Path, extractor: Arc<CannedExtractor>, ignore: &[&str]) -> DependencyGraphBuilder {
        let mut engine = IgnoreEngine::new(root);
        engine.add_patterns(ignore.iter().copied(), RuleSource::AdHoc).unwrap();
        let mut cache = DependencyCache::new(CacheConfig::default());
        cache.initialize();
        DependencyGraphBuilder::new(extractor, engine).with_cache(cache)
    }

    #[tokio::test]
    async fn test_end_to_end_ignore_cycle_gather() {
        let fx = fixture(&["a", "b", "c"]);
        let mut builder = builder(&fx.root, cycle_extractor(), &["c"]);
        let entries = vec![PathBuf::from("a")];

        let result = builder
            .analyze(&entries, &fx.root, &AnalyzeOptions::default())
            .await
            .unwrap();

        let a = fx.root.join("a");
        let b = fx.root.join("b");
        let c = fx.root.join("c");

        assert_eq!(result.graph.files(), vec![a.as_path(), b.as_path()]);
        assert_eq!(result.graph.dependencies_of(&a), vec![b.as_path()]);
        assert_eq!(result.graph.dependencies_of(&b), vec![a.as_path()]);
        assert!(!result.graph.contains(&c));
        assert_eq!(result.total_files, 2);

        assert_eq!(result.cycles, vec![Cycle::new(vec![a.clone(), b.clone()])]);
        assert_eq!(result.warnings, vec!["Circular dependency: a -> b -> a".to_string()]);

        let gathered = builder.gather(&result.graph, &entries, None);
        assert_eq!(gathered, vec![a.clone(), b]);
        assert_eq!(builder.gather(&result.graph, &entries, Some(0)), vec![a]);
    }

    #[tokio::test]
    async fn test_cache_serves_second_call() {
        let fx = fixture(&["a", "b", "c"]);
        let extractor = cycle_extractor();
        let mut builder = builder(&fx.root, Arc::clone(&extractor), &[]);
        let entries = vec![PathBuf::from("a")];
        let options = AnalyzeOptions::default();

        let first = builder.analyze(&entries, &fx.root, &options).await.unwrap();
        let second = builder.analyze(&entries, &fx.root, &options).await.unwrap();

        assert_eq!(extractor.calls(), 1);
        assert!(!first.from_cache);
        assert!(second.from_cache);
        assert_eq!(first.graph, second.graph);
        assert_eq!(first.cycles, second.cycles);

        let stats = builder.cache().unwrap().stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
    }

    #[tokio::test]
    async fn test_bypass_and_force_re_extract() {
        let fx = fixture(&["a", "b", "c"]);
        let extractor = cycle_extractor();
        let mut builder = builder(&fx.root, Arc::clone(&extractor), &[]);
        let entries = vec![PathBuf::from("a")];

        builder
            .analyze(&entries, &fx.root, &AnalyzeOptions::default())
            .await
            .unwrap();

        let bypass = AnalyzeOptions {
            bypass_cache: true,
            ..AnalyzeOptions::default()
        };
        let result = builder.analyze(&entries, &fx.root, &bypass).await.unwrap();
        assert!(!result.from_cache);
        assert_eq!(extractor.calls(), 2);

        let force = AnalyzeOptions {
            force: true,
            ..AnalyzeOptions::default()
        };
        let result = builder.analyze(&entries, &fx.root, &force).await.unwrap();
        assert!(!result.from_cache);
        assert_eq!(extractor.calls(), 3);
    }

    #[tokio::test]
    async fn test_syntax_change_misses_cache() {
        let fx = fixture(&["a", "b", "c"]);
        let extractor = cycle_extractor();
        let mut builder = builder(&fx.root, Arc::clone(&extractor), &[]);
        let entries = vec![PathBuf::from("a")];

        builder
            .analyze(&entries, &fx.root, &AnalyzeOptions::default())
            .await
            .unwrap();

        let with_types = AnalyzeOptions {
            syntax: ImportSyntax {
                skip_type_imports: false,
                ..ImportSyntax::default()
            },
            ..AnalyzeOptions::default()
        };
        let result = builder.analyze(&entries, &fx.root, &with_types).await.unwrap();

        assert!(!result.from_cache);
        assert_eq!(extractor.calls(), 2);
        assert_eq!(builder.cache().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_validation_accumulates_every_issue() {
        let fx = fixture(&["a", "node_modules/pkg/index.js", "dir/inner"]);
        let extractor = cycle_extractor();
        let mut builder = builder(&fx.root, Arc::clone(&extractor), &[]);
        let entries = vec![
            PathBuf::from("missing.ts"),
            PathBuf::from("node_modules/pkg/index.js"),
            PathBuf::from("../outside.ts"),
            PathBuf::from("dir"),
            PathBuf::from("a"),
        ];

        let err = builder
            .analyze(&entries, &fx.root, &AnalyzeOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        let ScopeError::Validation(ValidationError::InvalidEntries(issues)) = err else {
            panic!("expected invalid entries");
        };
        let kinds: Vec<EntryIssueKind> = issues.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EntryIssueKind::Missing,
                EntryIssueKind::Ignored,
                EntryIssueKind::OutsideRoot,
                EntryIssueKind::NotAFile,
            ]
        );
        assert_eq!(extractor.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_entries_and_bad_root() {
        let fx = fixture(&["a"]);
        let mut builder = builder(&fx.root, cycle_extractor(), &[]);

        let err = builder
            .analyze(&[], &fx.root, &AnalyzeOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ScopeError::Validation(ValidationError::NoEntries)));

        let err = builder
            .analyze(&[PathBuf::from("a")], &fx.root.join("nope"), &AnalyzeOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ScopeError::Validation(ValidationError::ProjectRoot { .. })));

        let other = fixture(&["a"]);
        let err = builder
            .analyze(&[PathBuf::from("a")], &other.root, &AnalyzeOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ScopeError::Validation(ValidationError::RootMismatch { .. })));
    }

    #[tokio::test]
    async fn test_extraction_failure_aborts_with_entry_list() {
        let fx = fixture(&["a", "b", "c", "broken"]);
        let mut builder = builder(&fx.root, cycle_extractor(), &[]);
        let entries = vec![PathBuf::from("a"), PathBuf::from("broken")];

        let err = builder
            .analyze(&entries, &fx.root, &AnalyzeOptions::default())
            .await
            .unwrap_err();

        match err {
            ScopeError::DependencyAnalysis { entry, entries, source } => {
                assert_eq!(entry, PathBuf::from("broken"));
                assert_eq!(entries, vec![PathBuf::from("a"), PathBuf::from("broken")]);
                assert!(matches!(source, ExtractError::ParseError { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(builder.cache().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_extraction_failure_still_finishes_phase() {
        let fx = fixture(&["a", "b", "c", "broken"]);
        let (reporter, mut rx) = ProgressReporter::channel();
        let mut builder = builder(&fx.root, cycle_extractor(), &[]).with_progress(reporter);
        let entries = vec![PathBuf::from("a"), PathBuf::from("broken")];

        assert!(builder
            .analyze(&entries, &fx.root, &AnalyzeOptions::default())
            .await
            .is_err());
        drop(builder);

        let mut extraction = Vec::new();
        while let Some(event) = rx.recv().await {
            if event.phase() == Phase::Extraction {
                extraction.push(event);
            }
        }

        assert!(matches!(extraction.first(), Some(ProgressEvent::PhaseStarted { total: 2, .. })));
        match extraction.last() {
            Some(ProgressEvent::PhaseFinished { completed, total, .. }) => {
                assert_eq!(*total, 2);
                assert!(*completed < 2);
            }
            other => panic!("unexpected last event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_uninitialized_cache_fails_fast() {
        let fx = fixture(&["a", "b", "c"]);
        let mut builder = DependencyGraphBuilder::new(cycle_extractor(), IgnoreEngine::new(&fx.root))
            .with_cache(DependencyCache::default());

        let err = builder
            .analyze(&[PathBuf::from("a")], &fx.root, &AnalyzeOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cache);
    }

    #[tokio::test]
    async fn test_entries_merge_shared_keys() {
        let fx = fixture(&["x", "y", "shared", "leaf"]);
        let extractor = Arc::new(
            CannedExtractor::default()
                .with("x", vec![("x", vec!["shared"]), ("shared", vec!["leaf"]), ("leaf", vec![])])
                .with("y", vec![("y", vec!["shared"]), ("shared", vec!["y"])]),
        );
        let mut builder = DependencyGraphBuilder::new(extractor, IgnoreEngine::new(&fx.root));
        let entries = vec![PathBuf::from("x"), PathBuf::from("y")];

        let result = builder
            .analyze(&entries, &fx.root, &AnalyzeOptions::default())
            .await
            .unwrap();

        let shared = fx.root.join("shared");
        assert_eq!(
            result.graph.dependencies_of(&shared),
            vec![fx.root.join("leaf").as_path(), fx.root.join("y").as_path()]
        );
        assert_eq!(result.total_files, 4);
        assert!(!result.from_cache);
    }

    #[tokio::test]
    async fn test_include_ignored_keeps_paths() {
        let fx = fixture(&["a", "b", "c"]);
        let mut builder = builder(&fx.root, cycle_extractor(), &["c"]);
        let options = AnalyzeOptions {
            include_ignored: true,
            ..AnalyzeOptions::default()
        };

        let result = builder
            .analyze(&[PathBuf::from("a")], &fx.root, &options)
            .await
            .unwrap();

        assert!(result.graph.contains(&fx.root.join("c")));
        assert!(builder.cache().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_progress_phases_are_ordered() {
        let fx = fixture(&["a", "b", "c"]);
        let (reporter, mut rx) = ProgressReporter::channel();
        let mut builder = builder(&fx.root, cycle_extractor(), &[]).with_progress(reporter);
        let entries = vec![PathBuf::from("a")];

        let result = builder
            .analyze(&entries, &fx.root, &AnalyzeOptions::default())
            .await
            .unwrap();
        builder.gather(&result.graph, &entries, None);
        drop(builder);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }

        for phase in [Phase::Validation, Phase::Extraction, Phase::Gathering] {
            let of_phase: Vec<&ProgressEvent> = events.iter().filter(|e| e.phase() == phase).collect();
            assert!(matches!(of_phase.first(), Some(ProgressEvent::PhaseStarted { .. })));
            assert!(matches!(of_phase.last(), Some(ProgressEvent::PhaseFinished { .. })));

            let counts: Vec<usize> = of_phase
                .iter()
                .filter_map(|e| match e {
                    ProgressEvent::Advanced { completed, .. } => Some(*completed),
                    _ => None,
                })
                .collect();
            assert!(counts.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[tokio::test]
    async fn test_shutdown_clears_cache() {
        let fx = fixture(&["a", "b", "c"]);
        let mut builder = builder(&fx.root, cycle_extractor(), &[]);
        builder
            .analyze(&[PathBuf::from("a")], &fx.root, &AnalyzeOptions::default())
            .await
            .unwrap();
        assert_eq!(builder.cache().unwrap().len(), 1);

        builder.shutdown();
        assert!(builder.cache().unwrap().is_empty());
    }
}
