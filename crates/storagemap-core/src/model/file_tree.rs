/// Arena-backed scan tree with O(n) bottom-up size aggregation.
///
/// All nodes live in a single `Vec<FileNode>`. Relationships between nodes
/// use `NodeIndex` (a thin `u32` wrapper) rather than heap pointers.
use super::file_node::{FileNode, NodeIndex};
use compact_str::CompactString;

/// The tree produced by one walk of one volume.
#[derive(Debug, Clone)]
pub struct FileTree {
    /// Arena: every node in a flat vector.
    pub nodes: Vec<FileNode>,

    /// The scan root, once added.
    pub root: Option<NodeIndex>,

    /// Total logical size under the root.
    pub total_size: u64,
}

impl FileTree {
    /// Create an empty tree with pre-allocated capacity.
    pub fn with_capacity(estimated_nodes: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(estimated_nodes),
            root: None,
            total_size: 0,
        }
    }

    /// Allocate a new node in the arena and return its index.
    pub fn add_node(&mut self, node: FileNode) -> NodeIndex {
        let idx = NodeIndex::new(self.nodes.len());
        self.nodes.push(node);
        idx
    }

    /// Add the scan root. Must be the first node inserted.
    pub fn add_root(&mut self, name: CompactString) -> NodeIndex {
        debug_assert!(self.is_empty(), "root must be the first node");
        let idx = self.add_node(FileNode::new_dir(name, 0, None));
        self.root = Some(idx);
        idx
    }

    /// Attach `child` as a child of `parent`, prepending to the sibling list.
    pub fn add_child(&mut self, parent: NodeIndex, child: NodeIndex) {
        let old_first = self.nodes[parent.idx()].first_child;
        self.nodes[child.idx()].next_sibling = old_first;
        self.nodes[child.idx()].parent = Some(parent);
        self.nodes[parent.idx()].first_child = Some(child);
    }

    /// Compute directory sizes and file counts in a single bottom-up pass.
    ///
    /// Children are always inserted after their parent (the walk is
    /// parent-first), so iterating in *reverse* processes every child
    /// before its parent. Directory totals are reset first so the pass is
    /// safe to repeat.
    pub fn aggregate_sizes(&mut self) {
        for node in self.nodes.iter_mut() {
            if node.is_dir {
                node.size = 0;
                node.file_count = 0;
            }
        }

        for i in (0..self.nodes.len()).rev() {
            let node = &self.nodes[i];
            let (size, count) = if node.is_dir {
                (node.size, node.file_count)
            } else {
                (node.size, 1)
            };
            if let Some(parent_idx) = self.nodes[i].parent {
                let parent = &mut self.nodes[parent_idx.idx()];
                parent.size += size;
                parent.file_count += count;
            }
        }

        self.total_size = self.root.map(|r| self.nodes[r.idx()].size).unwrap_or(0);
    }

    /// Path of a node relative to the root, `/`-separated and rooted at
    /// `/` (the root itself is `/`).
    pub fn relative_path(&self, index: NodeIndex) -> String {
        let mut segments = Vec::new();
        let mut current = Some(index);
        while let Some(idx) = current {
            let node = &self.nodes[idx.idx()];
            if node.parent.is_none() {
                break;
            }
            segments.push(node.name.as_str());
            current = node.parent;
        }
        segments.reverse();

        let mut path = String::with_capacity(segments.iter().map(|s| s.len() + 1).sum());
        for segment in segments {
            path.push('/');
            path.push_str(segment);
        }
        if path.is_empty() {
            path.push('/');
        }
        path
    }

    /// Get direct children of a node (unsorted).
    pub fn children(&self, parent: NodeIndex) -> Vec<NodeIndex> {
        let mut children = Vec::new();
        let mut child = self.nodes[parent.idx()].first_child;
        while let Some(idx) = child {
            children.push(idx);
            child = self.nodes[idx.idx()].next_sibling;
        }
        children
    }

    /// Get the node at the given index.
    #[inline]
    pub fn node(&self, index: NodeIndex) -> &FileNode {
        &self.nodes[index.idx()]
    }

    /// Total number of nodes in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tree contains no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
