/// A single node in the arena-allocated scan tree.
///
/// Nodes are stored in a flat `Vec<FileNode>`; parent-child relationships
/// use indices rather than pointers.
use compact_str::CompactString;

/// Lightweight index into the arena `Vec<FileNode>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    /// Create a new `NodeIndex` from a `usize`.
    #[inline]
    pub fn new(index: usize) -> Self {
        debug_assert!(index <= u32::MAX as usize, "NodeIndex overflow");
        Self(index as u32)
    }

    /// Return the index as a `usize` for Vec indexing.
    #[inline]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

/// A single file or directory seen during a walk.
///
/// Children are linked via a `first_child` / `next_sibling` list so no
/// per-node `Vec` allocation is needed.
#[derive(Debug, Clone)]
pub struct FileNode {
    /// File or directory name only (NOT the full path).
    pub name: CompactString,

    /// Logical size in bytes. For directories this is the sum over every
    /// descendant file, filled in by the aggregation pass.
    pub size: u64,

    /// `true` if this node represents a directory.
    pub is_dir: bool,

    /// Distance from the scan root (root = 0).
    pub depth: u16,

    /// Index of the parent node. `None` for the scan root.
    pub parent: Option<NodeIndex>,

    /// First child (directories only).
    pub first_child: Option<NodeIndex>,

    /// Next sibling under the same parent.
    pub next_sibling: Option<NodeIndex>,

    /// Number of descendant *files* (directories are not counted).
    pub file_count: u64,

    /// `true` if the directory's contents could not be read. Its totals
    /// stay at zero and it contributes nothing to its ancestors.
    pub is_error: bool,
}

impl FileNode {
    /// Create a new file node with the given name and size.
    pub fn new_file(name: CompactString, size: u64, depth: u16, parent: Option<NodeIndex>) -> Self {
        Self {
            name,
            size,
            is_dir: false,
            depth,
            parent,
            first_child: None,
            next_sibling: None,
            file_count: 0,
            is_error: false,
        }
    }

    /// Create a new directory node.
    pub fn new_dir(name: CompactString, depth: u16, parent: Option<NodeIndex>) -> Self {
        Self {
            name,
            size: 0,
            is_dir: true,
            depth,
            parent,
            first_child: None,
            next_sibling: None,
            file_count: 0,
            is_error: false,
        }
    }
}
