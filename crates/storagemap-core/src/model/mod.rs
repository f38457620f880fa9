/// Data model for StorageMap.
///
/// Re-exports the registry/volume types, the scan output entry and the
/// arena-allocated tree the scanner aggregates into.
pub mod directory;
pub mod file_node;
pub mod file_tree;
pub mod size;
pub mod volume;

pub use directory::DirectoryEntry;
pub use file_node::{FileNode, NodeIndex};
pub use file_tree::FileTree;
pub use volume::{LocationKind, VolumeIdentity, VolumeRecord, VolumeStatus};
