//! The ignore engine: an ordered, first-match-wins list of compiled rules
//! scoped to a project root.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use super::pattern::{normalize_pattern, parse_lines, IgnoreRule, PatternError, RuleSource};
use crate::paths;

/// Tool-specific ignore file, read from the project root.
pub const TOOL_IGNORE_FILE: &str = ".depscopeignore";

/// VCS ignore file, read from the project root.
pub const VCS_IGNORE_FILE: &str = ".gitignore";

/// Built-in exclusions, always registered first.
pub const DEFAULT_PATTERNS: &[&str] = &["node_modules/", ".git/", ".svn/", ".hg/"];

/// Ordered ignore rules for one project root.
///
/// Evaluation is first-match-wins: the rules are scanned in registration
/// order and the first matching rule decides. A negation only rescues a path
/// if it is registered before the broader rule it refines.
///
/// # Example
///
/// ```rust
/// use depscope::ignore::{IgnoreEngine, RuleSource};
///
/// let mut engine = IgnoreEngine::new("/project");
/// engine.add_patterns(["*.log", "!important.log"], RuleSource::AdHoc).unwrap();
///
/// // The blanket rule is reached first.
/// assert!(engine.should_ignore("important.log"));
/// assert!(engine.should_ignore("/project/node_modules/react/index.js"));
/// assert!(!engine.should_ignore("src/index.ts"));
/// ```
#[derive(Debug, Clone)]
pub struct IgnoreEngine {
    root: PathBuf,
    rules: Vec<IgnoreRule>,
    seen: HashSet<String>,
}

impl IgnoreEngine {
    /// Creates an engine for `root` holding only the built-in defaults.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let mut engine = Self::empty(root);
        for pattern in DEFAULT_PATTERNS {
            for normalized in normalize_pattern(pattern) {
                // Built-in patterns are known to compile.
                if let Ok(rule) = IgnoreRule::compile(&normalized, RuleSource::Default) {
                    engine.push(normalized, rule);
                }
            }
        }
        engine
    }

    /// Creates an engine with no rules at all (the vendor check still applies).
    ///
    /// A relative root is resolved against the current directory.
    pub fn empty(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = match std::env::current_dir() {
            Ok(cwd) => paths::absolutize(&cwd, &root),
            Err(_) => paths::normalize(&root),
        };
        Self {
            root,
            rules: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Creates an engine with the defaults plus both ignore files found in `root`.
    ///
    /// Missing ignore files are skipped; unreadable ones and malformed
    /// patterns are errors.
    pub fn load(root: impl Into<PathBuf>) -> Result<Self, PatternError> {
        let mut engine = Self::new(root);
        let root = engine.root.clone();
        engine.add_file(&root.join(TOOL_IGNORE_FILE), RuleSource::ToolIgnoreFile)?;
        engine.add_file(&root.join(VCS_IGNORE_FILE), RuleSource::VcsIgnoreFile)?;
        Ok(engine)
    }

    /// Registers patterns from a newline-delimited ignore file, if it exists.
    ///
    /// Returns the number of rules added.
    pub fn add_file(&mut self, path: &Path, source: RuleSource) -> Result<usize, PatternError> {
        if !path.is_file() {
            trace!(path = %path.display(), "ignore file not present");
            return Ok(0);
        }

        let content = fs::read_to_string(path).map_err(|error| PatternError::Io {
            path: path.display().to_string(),
            error,
        })?;

        let added = self.add_patterns(parse_lines(&content), source)?;
        debug!(path = %path.display(), added, "loaded ignore file");
        Ok(added)
    }

    /// Normalizes, validates and appends raw patterns in order.
    ///
    /// Validation is all-or-nothing: if any pattern is malformed, no rule
    /// from this batch is registered. Duplicates of already registered
    /// patterns are dropped. Returns the number of rules added.
    pub fn add_patterns<I, S>(&mut self, patterns: I, source: RuleSource) -> Result<usize, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut compiled = Vec::new();
        for raw in patterns {
            for normalized in normalize_pattern(raw.as_ref()) {
                let rule = IgnoreRule::compile(&normalized, source)?;
                compiled.push((normalized, rule));
            }
        }

        let before = self.rules.len();
        for (normalized, rule) in compiled {
            self.push(normalized, rule);
        }
        Ok(self.rules.len() - before)
    }

    fn push(&mut self, normalized: String, rule: IgnoreRule) {
        if self.seen.insert(normalized) {
            self.rules.push(rule);
        }
    }

    /// The project root the engine resolves paths against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The registered rules in evaluation order.
    pub fn rules(&self) -> &[IgnoreRule] {
        &self.rules
    }

    /// The registered rules rendered back as patterns, in evaluation order.
    pub fn patterns(&self) -> Vec<String> {
        self.rules.iter().map(IgnoreRule::pattern).collect()
    }

    /// Decides whether a path is excluded.
    ///
    /// Relative paths are resolved against the root. Paths crossing the
    /// vendor directory are always ignored. Otherwise the first matching rule
    /// decides; no match means the path is kept. Paths outside the root are
    /// only subject to the vendor check.
    pub fn should_ignore(&self, path: impl AsRef<Path>) -> bool {
        let absolute = paths::absolutize(&self.root, path.as_ref());

        let Some(relative) = paths::relative_to(&absolute, &self.root) else {
            return paths::crosses_vendor_dir(&absolute);
        };

        if paths::crosses_vendor_dir(&relative) {
            return true;
        }

        let candidate = paths::to_slash(&relative);
        if candidate.is_empty() {
            return false;
        }

        self.first_match(&candidate)
            .map(|rule| !rule.negated)
            .unwrap_or(false)
    }

    /// Returns the rule that decides `relative`, if any.
    pub fn first_match(&self, relative: &str) -> Option<&IgnoreRule> {
        self.rules.iter().find(|rule| rule.is_match(relative))
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if no rules are registered.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
