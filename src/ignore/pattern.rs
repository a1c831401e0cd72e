//! Ignore rule normalization and compilation.
//!
//! Raw lines from ignore files are expanded into one or more glob patterns
//! and compiled eagerly, so malformed patterns are rejected at registration
//! time instead of surfacing later during matching.

use std::fmt;

use globset::{Glob, GlobMatcher};

/// Errors raised while registering ignore patterns.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    /// The glob could not be compiled.
    #[error("Invalid ignore pattern '{pattern}' ({origin}): {error}")]
    InvalidGlob {
        pattern: String,
        origin: RuleSource,
        #[source]
        error: globset::Error,
    },

    /// A negation with nothing after the `!`.
    #[error("Empty negated ignore pattern ({0})")]
    EmptyNegation(RuleSource),

    /// Failed to read an ignore file.
    #[error("Failed to read ignore file {path}: {error}")]
    Io {
        path: String,
        #[source]
        error: std::io::Error,
    },
}

/// Where an ignore rule came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleSource {
    /// Built-in vendor/VCS exclusions
    Default,
    /// The tool-specific ignore file (`.depscopeignore`)
    ToolIgnoreFile,
    /// The VCS ignore file (`.gitignore`)
    VcsIgnoreFile,
    /// Patterns supplied programmatically or on the command line
    AdHoc,
}

impl fmt::Display for RuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RuleSource::Default => "default",
            RuleSource::ToolIgnoreFile => "tool ignore file",
            RuleSource::VcsIgnoreFile => "vcs ignore file",
            RuleSource::AdHoc => "ad hoc",
        };
        write!(f, "{}", s)
    }
}

/// A single compiled ignore rule.
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    /// The normalized glob, without the leading `!`
    pub glob: String,
    /// Whether a match un-ignores the path
    pub negated: bool,
    /// Provenance of the rule
    pub source: RuleSource,
    matcher: GlobMatcher,
}

impl IgnoreRule {
    /// Compiles a normalized pattern. A leading `!` marks a negation.
    pub fn compile(pattern: &str, source: RuleSource) -> Result<Self, PatternError> {
        let (negated, glob) = match pattern.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, pattern),
        };

        if negated && glob.is_empty() {
            return Err(PatternError::EmptyNegation(source));
        }

        let matcher = Glob::new(glob)
            .map_err(|error| PatternError::InvalidGlob {
                pattern: pattern.to_string(),
                origin: source,
                error,
            })?
            .compile_matcher();

        Ok(Self {
            glob: glob.to_string(),
            negated,
            source,
            matcher,
        })
    }

    /// Tests a project-relative, forward-slash path against this rule.
    pub fn is_match(&self, relative: &str) -> bool {
        self.matcher.is_match(relative)
    }

    /// The rule as it would be written in an ignore file.
    pub fn pattern(&self) -> String {
        if self.negated {
            format!("!{}", self.glob)
        } else {
            self.glob.clone()
        }
    }
}

fn has_glob_chars(s: &str) -> bool {
    s.contains(['*', '?', '[', ']', '{', '}'])
}

/// Expands one raw ignore line into normalized patterns.
///
/// - a leading `./` is stripped
/// - a leading `/` anchors the pattern at the root: it is stripped and the
///   pattern gets no any-depth expansion
/// - `dir/` becomes the directory itself plus its subtree
/// - a bare name becomes the exact match plus an any-depth match
/// - globs and negations pass through unchanged
///
/// # Example
///
/// ```rust
/// use depscope::ignore::normalize_pattern;
///
/// assert_eq!(normalize_pattern("dist/"), vec!["dist", "dist/**"]);
/// assert_eq!(normalize_pattern("secrets"), vec!["secrets", "**/secrets"]);
/// assert_eq!(normalize_pattern("!keep.log"), vec!["!keep.log"]);
/// assert_eq!(normalize_pattern("/secrets"), vec!["secrets"]);
/// ```
pub fn normalize_pattern(raw: &str) -> Vec<String> {
    let pattern = raw.trim();
    let pattern = pattern.strip_prefix("./").unwrap_or(pattern);

    if let Some(rest) = pattern.strip_prefix("!/") {
        return vec![format!("!{}", rest)];
    }

    let (anchored, pattern) = match pattern.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, pattern),
    };

    if pattern.is_empty() {
        return Vec::new();
    }

    if pattern.starts_with('!') || has_glob_chars(pattern) {
        return vec![pattern.to_string()];
    }

    if let Some(dir) = pattern.strip_suffix('/') {
        let dir = dir.trim_end_matches('/');
        if dir.is_empty() {
            return Vec::new();
        }
        return vec![dir.to_string(), format!("{}/**", dir)];
    }

    if !anchored && !pattern.contains('/') {
        return vec![pattern.to_string(), format!("**/{}", pattern)];
    }

    vec![pattern.to_string()]
}

/// Parses newline-delimited ignore file content, skipping blanks and `#` comments.
pub fn parse_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
