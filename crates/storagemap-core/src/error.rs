/// Error taxonomy for the core.
///
/// Each concern gets its own enum so callers can tell run-fatal conditions
/// (enumeration, corrupt registry) from per-volume ones (id collision,
/// inaccessible root) without string matching.
use std::path::PathBuf;
use thiserror::Error;

use crate::naming::Tier;

/// The platform volume listing could not be obtained. Fatal for the run.
#[derive(Debug, Error)]
pub enum EnumerationError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("could not parse volume listing from {origin}: {message}")]
    Parse { origin: String, message: String },

    #[error("could not read volume listing {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("platform volume query failed: {0}")]
    Platform(String),

    #[error("volume enumeration is not supported on this platform; pass --volumes-file instead")]
    Unsupported,
}

/// Registry load/update/save failures.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(
        "registry {path} exists but cannot be parsed ({source}); repair or move it aside before running again"
    )]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("registry I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not serialise registry: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("id {id} is already assigned to volume {existing_uuid}; choose another name for volume {volume_uuid}")]
    IdCollision {
        id: String,
        existing_uuid: String,
        volume_uuid: String,
    },

    #[error("name {name:?} is not usable as an id ({reason}); choose another name")]
    InvalidName { name: String, reason: &'static str },
}

/// Name proposal failures.
#[derive(Debug, Error)]
pub enum NamingError {
    #[error("every {tier} name is already assigned; supply a name manually or extend naming_rules.json")]
    NoAvailableNames { tier: Tier },
}

/// Failures that abort the scan of one volume.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("scan root {path} is not accessible: {source}")]
    RootInaccessible {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("scan root {path} is not a directory")]
    RootNotDirectory { path: PathBuf },
}

/// Snapshot write/read/export failures.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot {path} cannot be parsed: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not serialise snapshot: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),
}

/// Base directory and naming-rule configuration failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid naming rules in {path}: {message}")]
    Invalid { path: PathBuf, message: String },

    #[error("could not determine a data directory; set STORAGEMAP_BASE_DIR or pass --base-dir")]
    Directories,
}

/// Conditions that stop a whole run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Enumeration(#[from] EnumerationError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
