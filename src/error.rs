//! Crate-level error taxonomy.
//!
//! Every failed `analyze` call surfaces exactly one [`ScopeError`]. Callers
//! dispatch on [`ScopeError::kind`] rather than downcasting.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::analysis::ExtractError;
use crate::cache::CacheError;
use crate::ignore::PatternError;

/// Discriminant of [`ScopeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    DependencyAnalysis,
    Cache,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::DependencyAnalysis => "dependency analysis",
            ErrorKind::Cache => "cache",
        };
        f.write_str(name)
    }
}

/// Why an entry file was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryIssueKind {
    Missing,
    NotAFile,
    OutsideRoot,
    Ignored,
}

/// One rejected entry file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryIssue {
    pub path: PathBuf,
    pub kind: EntryIssueKind,
}

impl EntryIssue {
    pub fn new(path: impl Into<PathBuf>, kind: EntryIssueKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

impl fmt::Display for EntryIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self.kind {
            EntryIssueKind::Missing => "does not exist",
            EntryIssueKind::NotAFile => "is not a file",
            EntryIssueKind::OutsideRoot => "is outside the project root",
            EntryIssueKind::Ignored => "is excluded by ignore rules",
        };
        write!(f, "{} {}", self.path.display(), reason)
    }
}

fn join_issues(issues: &[EntryIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Input problems detected before any graph work starts.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid project root {}: {source}", .path.display())]
    ProjectRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Project root {} does not match ignore engine root {}", .project_root.display(), .engine_root.display())]
    RootMismatch {
        project_root: PathBuf,
        engine_root: PathBuf,
    },

    #[error("No entry files given")]
    NoEntries,

    #[error("Invalid entry files: {}", join_issues(.0))]
    InvalidEntries(Vec<EntryIssue>),

    #[error(transparent)]
    InvalidPattern(#[from] PatternError),
}

/// Errors surfaced by the dependency engine.
#[derive(Debug, Error)]
pub enum ScopeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Extraction failed for one entry; the whole call is aborted.
    #[error("Dependency analysis failed for {} (entries: {}): {source}", .entry.display(), display_entries(.entries))]
    DependencyAnalysis {
        entry: PathBuf,
        entries: Vec<PathBuf>,
        #[source]
        source: ExtractError,
    },

    #[error(transparent)]
    Cache(#[from] CacheError),
}

fn display_entries(entries: &[PathBuf]) -> String {
    entries
        .iter()
        .map(|e| e.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<PatternError> for ScopeError {
    fn from(error: PatternError) -> Self {
        ScopeError::Validation(ValidationError::InvalidPattern(error))
    }
}

impl ScopeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScopeError::Validation(_) => ErrorKind::Validation,
            ScopeError::DependencyAnalysis { .. } => ErrorKind::DependencyAnalysis,
            ScopeError::Cache(_) => ErrorKind::Cache,
        }
    }

    /// The phase name shown to users alongside the message.
    pub fn phase(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Validation => "validation",
            ErrorKind::DependencyAnalysis => "extraction",
            ErrorKind::Cache => "cache",
        }
    }

    /// Paths the error is about, for reporting.
    pub fn paths(&self) -> Vec<PathBuf> {
        match self {
            ScopeError::Validation(ValidationError::InvalidEntries(issues)) => {
                issues.iter().map(|i| i.path.clone()).collect()
            }
            ScopeError::Validation(ValidationError::ProjectRoot { path, .. }) => vec![path.clone()],
            ScopeError::DependencyAnalysis { entry, .. } => vec![entry.clone()],
            _ => Vec::new(),
        }
    }
}

/// Result type for engine operations.
pub type ScopeResult<T> = Result<T, ScopeError>;
