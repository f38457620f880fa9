use serde::{Deserialize, Serialize};

/// One directory listed by a scan.
///
/// `size_bytes` and `file_count` are transitive over the whole subtree,
/// however deep; only which directories get an entry is depth-capped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// `/`-rooted path relative to the volume mount point (`/` is the root).
    pub relative_path: String,
    pub depth: u16,
    pub size_bytes: u64,
    pub file_count: u64,
}
