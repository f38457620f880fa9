/// Bounded-depth directory walker.
///
/// Walks the whole volume with `jwalk` (serially, symlinks never followed),
/// builds an arena [`FileTree`], aggregates sizes bottom-up and then lists
/// only the directories at depth ≤ the listing cap. Totals always reach
/// full depth; the cap only decides which directories get their own entry.
///
/// An unreadable subtree is zero-filled and reported in
/// [`ScanOutcome::failures`]; only an unreadable root aborts the scan.
pub mod failure;

pub use failure::{FailureKind, ScanFailure};

use crate::error::ScanError;
use crate::model::{DirectoryEntry, FileNode, FileTree, NodeIndex};
use compact_str::CompactString;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How deep directories are listed unless configured otherwise.
pub const DEFAULT_LISTING_DEPTH: u16 = 2;

/// Result of a walk that reached the root.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Directories at depth ≤ the cap, sorted by `relative_path`.
    pub directories: Vec<DirectoryEntry>,
    /// Subtrees and files that could not be read and count as zero.
    pub failures: Vec<ScanFailure>,
    pub total_size: u64,
    pub total_files: u64,
    /// Every directory walked, including those below the listing cap.
    pub dirs_walked: u64,
    /// Directories whose contents could not be read (counted as empty).
    pub unreadable_dirs: u64,
    pub duration: Duration,
}

impl ScanOutcome {
    /// The root entry (`/`), always present.
    pub fn root(&self) -> Option<&DirectoryEntry> {
        self.directories.iter().find(|d| d.depth == 0)
    }
}

/// Walk `root`, listing directories down to `listing_depth`.
pub fn walk(root: &Path, listing_depth: u16) -> Result<ScanOutcome, ScanError> {
    let start = Instant::now();
    check_root(root)?;

    let mut tree = FileTree::with_capacity(16_384);
    let root_idx = tree.add_root(CompactString::new(root_display_name(root)));

    // Directory path → arena index, so each entry can find its parent.
    let mut dir_map: HashMap<PathBuf, NodeIndex> = HashMap::with_capacity(1_024);
    dir_map.insert(root.to_path_buf(), root_idx);

    let mut failures: Vec<ScanFailure> = Vec::new();
    let mut total_files: u64 = 0;
    let mut dirs_walked: u64 = 1; // count the root

    let walker = jwalk::WalkDir::new(root)
        .skip_hidden(false)
        .follow_links(false)
        .sort(true)
        .parallelism(jwalk::Parallelism::Serial);

    for entry_result in walker {
        let mut entry = match entry_result {
            Ok(e) => e,
            Err(err) => {
                // Entry-level errors carry the path of the entry that failed.
                let idx = err.path().and_then(|p| dir_map.get(p)).copied();
                record_failure(root, None, &err, idx, &mut tree, &mut failures);
                continue;
            }
        };

        // The root itself is already in the tree.
        if entry.depth == 0 {
            if let Some(err) = entry.read_children_error.take() {
                record_failure(root, Some(root), &err, Some(root_idx), &mut tree, &mut failures);
            }
            continue;
        }

        let file_type = entry.file_type();
        if file_type.is_symlink() {
            continue;
        }

        let path = entry.path();
        let parent_idx = match path.parent().and_then(|p| dir_map.get(p)) {
            Some(&idx) => idx,
            None => {
                debug!("No parent node for {}; skipping", path.display());
                continue;
            }
        };
        let depth = u16::try_from(entry.depth).unwrap_or(u16::MAX);
        let name = CompactString::new(entry.file_name().to_string_lossy());

        if file_type.is_dir() {
            let idx = tree.add_node(FileNode::new_dir(name, depth, Some(parent_idx)));
            tree.add_child(parent_idx, idx);
            dirs_walked += 1;
            // jwalk reports an unreadable directory on the directory's own
            // entry rather than as a separate error item.
            if let Some(err) = entry.read_children_error.take() {
                record_failure(root, Some(&path), &err, Some(idx), &mut tree, &mut failures);
            }
            dir_map.insert(path, idx);
        } else {
            let size = match std::fs::symlink_metadata(&path) {
                Ok(meta) => meta.len(),
                Err(err) => {
                    let failure = ScanFailure::new(
                        relative_display(root, &path),
                        FailureKind::of(&err),
                        err.to_string(),
                    );
                    warn!("Skipping unreadable {}: {}", failure.relative_path, failure.reason);
                    failures.push(failure);
                    continue;
                }
            };
            let idx = tree.add_node(FileNode::new_file(name, size, depth, Some(parent_idx)));
            tree.add_child(parent_idx, idx);
            total_files += 1;
        }
    }

    tree.aggregate_sizes();
    let directories = list_directories(&tree, listing_depth);
    let unreadable_dirs = tree.nodes.iter().filter(|n| n.is_dir && n.is_error).count() as u64;

    let duration = start.elapsed();
    debug!(
        "Walked {}: {} nodes ({} files, {} dirs, {} unreadable), {} listed, {} failures in {:?}",
        root.display(),
        tree.len(),
        total_files,
        dirs_walked,
        unreadable_dirs,
        directories.len(),
        failures.len(),
        duration
    );

    Ok(ScanOutcome {
        directories,
        failures,
        total_size: tree.total_size,
        total_files,
        dirs_walked,
        unreadable_dirs,
        duration,
    })
}

/// Mark `node` (if known) as zero-filled and remember why. `at` names the
/// unreadable directory when the error itself carries no path.
fn record_failure(
    root: &Path,
    at: Option<&Path>,
    err: &jwalk::Error,
    node: Option<NodeIndex>,
    tree: &mut FileTree,
    failures: &mut Vec<ScanFailure>,
) {
    if let Some(idx) = node {
        tree.nodes[idx.idx()].is_error = true;
    }
    let failure = ScanFailure::new(
        at.or_else(|| err.path())
            .map(|p| relative_display(root, p))
            .unwrap_or_else(|| "?".to_string()),
        err.io_error().map(FailureKind::of).unwrap_or(FailureKind::Io),
        err.to_string(),
    );
    warn!("Skipping unreadable {}: {}", failure.relative_path, failure.reason);
    failures.push(failure);
}

/// The root must exist, be a directory and be listable.
fn check_root(root: &Path) -> Result<(), ScanError> {
    let meta = std::fs::metadata(root).map_err(|source| ScanError::RootInaccessible {
        path: root.to_path_buf(),
        source,
    })?;
    if !meta.is_dir() {
        return Err(ScanError::RootNotDirectory {
            path: root.to_path_buf(),
        });
    }
    std::fs::read_dir(root).map_err(|source| ScanError::RootInaccessible {
        path: root.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Emit one entry per directory at depth ≤ `listing_depth`, sorted by path.
///
/// Descends from the root and stops at the cap, so deep trees cost nothing
/// beyond the aggregation pass.
fn list_directories(tree: &FileTree, listing_depth: u16) -> Vec<DirectoryEntry> {
    let mut directories = Vec::new();
    let mut stack: Vec<NodeIndex> = tree.root.into_iter().collect();
    while let Some(idx) = stack.pop() {
        let node = tree.node(idx);
        directories.push(DirectoryEntry {
            relative_path: tree.relative_path(idx),
            depth: node.depth,
            size_bytes: node.size,
            file_count: node.file_count,
        });
        if node.depth < listing_depth {
            stack.extend(
                tree.children(idx)
                    .into_iter()
                    .filter(|&child| tree.node(child).is_dir),
            );
        }
    }
    directories.sort_unstable_by(|a, b| a.relative_path.cmp(&b.relative_path));
    directories
}

/// `/`-rooted path of `path` below `root`, independent of the host separator.
fn relative_display(root: &Path, path: &Path) -> String {
    let Ok(rel) = path.strip_prefix(root) else {
        return path.to_string_lossy().into_owned();
    };
    let mut out = String::new();
    for component in rel.components() {
        if let Component::Normal(part) = component {
            out.push('/');
            out.push_str(&part.to_string_lossy());
        }
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Derive a display name for the scan root.
fn root_display_name(path: &Path) -> String {
    if let Some(name) = path.file_name() {
        name.to_string_lossy().to_string()
    } else {
        path.to_string_lossy().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_display() {
        let root = Path::new("/media/ext");
        assert_eq!(relative_display(root, Path::new("/media/ext")), "/");
        assert_eq!(relative_display(root, Path::new("/media/ext/a/b")), "/a/b");
        assert_eq!(relative_display(root, Path::new("/elsewhere")), "/elsewhere");
    }

    #[test]
    fn test_root_display_name() {
        assert_eq!(root_display_name(Path::new("/media/ext")), "ext");
        assert_eq!(root_display_name(Path::new("/")), "/");
    }

    #[test]
    fn test_record_failure_marks_node_and_names_directory() {
        let tmp = tempfile::TempDir::new().unwrap();
        let gone = tmp.path().join("gone");
        // Walking a missing path is the simplest way to get a real jwalk error.
        let err = jwalk::WalkDir::new(&gone)
            .into_iter()
            .find_map(Result::err)
            .expect("walking a missing path yields an error");

        let mut tree = FileTree::with_capacity(2);
        let root = tree.add_root(CompactString::new("r"));
        let dir = tree.add_node(FileNode::new_dir(CompactString::new("gone"), 1, Some(root)));
        tree.add_child(root, dir);
        let mut failures = Vec::new();

        record_failure(tmp.path(), Some(&gone), &err, Some(dir), &mut tree, &mut failures);

        assert!(tree.node(dir).is_error);
        assert!(!tree.node(root).is_error);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].relative_path, "/gone");
        assert_eq!(failures[0].kind, FailureKind::Io);
    }

    #[test]
    fn test_missing_root_is_inaccessible() {
        let tmp = tempfile::TempDir::new().unwrap();
        let missing = tmp.path().join("not-mounted");
        assert!(matches!(
            walk(&missing, DEFAULT_LISTING_DEPTH),
            Err(ScanError::RootInaccessible { .. })
        ));
    }

    #[test]
    fn test_file_root_is_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let file = tmp.path().join("plain.txt");
        std::fs::write(&file, b"x").unwrap();
        assert!(matches!(
            walk(&file, DEFAULT_LISTING_DEPTH),
            Err(ScanError::RootNotDirectory { .. })
        ));
    }
}
