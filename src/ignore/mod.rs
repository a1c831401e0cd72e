//! Ignore pattern engine.
//!
//! Loads exclusion patterns from built-in defaults, the tool ignore file
//! (`.depscopeignore`) and the VCS ignore file (`.gitignore`), normalizes
//! them, and decides whether a project path is excluded.
//!
//! Unlike gitignore, evaluation is **first-match-wins**: a negation must be
//! listed before the broader pattern it refines.
//!
//! # Example
//!
//! ```rust
//! use depscope::ignore::{IgnoreEngine, RuleSource};
//!
//! let mut engine = IgnoreEngine::new("/project");
//! engine.add_patterns(["!dist/keep.js", "dist/"], RuleSource::AdHoc).unwrap();
//!
//! assert!(!engine.should_ignore("dist/keep.js"));
//! assert!(engine.should_ignore("dist/bundle.js"));
//! ```

mod engine;
mod pattern;

pub use engine::{IgnoreEngine, DEFAULT_PATTERNS, TOOL_IGNORE_FILE, VCS_IGNORE_FILE};
pub use pattern::{normalize_pattern, parse_lines, IgnoreRule, PatternError, RuleSource};
