//! Path helpers shared by the ignore engine, the builder and the extractor.
//!
//! Every node in a [`DependencyGraph`](crate::graph::DependencyGraph) is an
//! absolute, lexically normalized path under the project root. These helpers
//! keep that representation consistent without touching the filesystem.

use std::path::{Component, Path, PathBuf};

/// Name of the reserved vendor directory. Anything below it is excluded
/// before any pattern is evaluated.
pub const VENDOR_DIR: &str = "node_modules";

/// Lexically normalizes a path, dropping `.` and resolving `..`.
///
/// # Example
///
/// ```rust
/// use depscope::paths::normalize;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(normalize(Path::new("/p/./src/../lib/a.ts")), PathBuf::from("/p/lib/a.ts"));
/// ```
pub fn normalize(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            c => components.push(c),
        }
    }

    components.iter().collect()
}

/// Resolves `path` against `root` when it is relative, then normalizes it.
pub fn absolutize(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&root.join(path))
    }
}

/// Returns `path` relative to `root`, or `None` when it lies outside.
pub fn relative_to(path: &Path, root: &Path) -> Option<PathBuf> {
    path.strip_prefix(root).ok().map(Path::to_path_buf)
}

/// Renders a relative path with forward slashes, the form patterns match against.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Returns true if any component of the path is the vendor directory.
pub fn crosses_vendor_dir(path: &Path) -> bool {
    path.components()
        .any(|c| matches!(c, Component::Normal(part) if part == VENDOR_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_removes_dots() {
        assert_eq!(
            normalize(Path::new("/root/./src/../lib/x.js")),
            PathBuf::from("/root/lib/x.js")
        );
    }

    #[test]
    fn test_normalize_keeps_leading_parent_on_relative() {
        assert_eq!(normalize(Path::new("../a/./b")), PathBuf::from("../a/b"));
    }

    #[test]
    fn test_normalize_does_not_escape_root() {
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
    }

    #[test]
    fn test_absolutize() {
        let root = Path::new("/project");
        assert_eq!(
            absolutize(root, Path::new("src/a.ts")),
            PathBuf::from("/project/src/a.ts")
        );
        assert_eq!(
            absolutize(root, Path::new("/other/b.ts")),
            PathBuf::from("/other/b.ts")
        );
    }

    #[test]
    fn test_relative_to_and_slash() {
        let rel = relative_to(Path::new("/project/src/a.ts"), Path::new("/project")).unwrap();
        assert_eq!(to_slash(&rel), "src/a.ts");
        assert!(relative_to(Path::new("/elsewhere/a.ts"), Path::new("/project")).is_none());
    }

    #[test]
    fn test_crosses_vendor_dir() {
        assert!(crosses_vendor_dir(Path::new("node_modules/react/index.js")));
        assert!(crosses_vendor_dir(Path::new("/p/packages/x/node_modules/y.js")));
        assert!(!crosses_vendor_dir(Path::new("src/node_modules_helper.js")));
    }
}
