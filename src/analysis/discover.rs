//! Expansion of directory entries into source files.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::ignore::IgnoreEngine;
use crate::paths::VENDOR_DIR;

const SKIPPED_DIRS: &[&str] = &[VENDOR_DIR, ".git", ".svn", ".hg"];

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|allowed| allowed == ext))
}

/// Lists every file under `dir` with an allowed extension that the ignore
/// engine keeps, sorted by path.
///
/// Vendor and VCS directories are pruned during the walk. Unreadable
/// directory entries are logged and skipped.
pub fn discover_entries(dir: &Path, ignore: &IgnoreEngine, extensions: &[String]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| !is_skipped_dir(entry))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("Skipping unreadable path: {}", err);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(DirEntry::into_path)
        .filter(|path| has_extension(path, extensions))
        .filter(|path| !ignore.should_ignore(path))
        .collect();

    files.sort();
    debug!(dir = %dir.display(), found = files.len(), "discovered entry files");
    files
}
