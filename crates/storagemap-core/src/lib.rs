/// StorageMap Core: volume identity, naming, shallow inventory and snapshots.
///
/// This crate contains all business logic with zero UI dependencies.
/// The `storagemap` binary is a thin CLI over it.
///
/// # Modules
///
/// - [`model`]: Volume records, registry identities, directory entries and the arena file tree.
/// - [`platform`]: Removable-volume enumeration (lsblk, Win32, JSON fixture file).
/// - [`naming`]: Capacity tiers and collision-free name proposals.
/// - [`registry`]: Durable UUID → identity store with atomic saves.
/// - [`scanner`]: Bounded-depth directory walk with full-depth totals.
/// - [`snapshot`]: Dated, immutable scan records.
/// - [`orchestrator`]: Per-volume detect → identify → scan → persist workflow.
/// - [`config`]: Base directory resolution and naming-rule loading.
pub mod config;
pub mod error;
pub mod fsutil;
pub mod model;
pub mod naming;
pub mod orchestrator;
pub mod platform;
pub mod registry;
pub mod scanner;
pub mod snapshot;
