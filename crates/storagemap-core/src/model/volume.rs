/// Volume records as reported by the platform, and the durable identities
/// the registry keeps for them.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A mounted volume as reported by a [`DeviceEnumerator`](crate::platform::DeviceEnumerator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeRecord {
    /// Platform device name, e.g. `sdb1`, `disk4s2` or `E:`.
    pub device_identifier: String,
    /// Filesystem UUID (or serial). The only key stable across remounts.
    pub volume_uuid: String,
    /// Volume label, may be empty.
    #[serde(default)]
    pub volume_name: String,
    pub mount_point: PathBuf,
    pub capacity_bytes: u64,
    #[serde(default)]
    pub free_bytes: u64,
    #[serde(default)]
    pub file_system: String,
}

impl VolumeRecord {
    /// Why this record cannot be processed, if it cannot.
    pub fn defect(&self) -> Option<&'static str> {
        if self.volume_uuid.trim().is_empty() {
            Some("missing volume UUID")
        } else if self.mount_point.as_os_str().is_empty() {
            Some("missing mount point")
        } else if self.capacity_bytes == 0 {
            Some("zero capacity")
        } else {
            None
        }
    }
}

/// What kind of storage location a registry entry describes.
///
/// Only `ExternalDrive` is produced today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    ExternalDrive,
    InternalDrive,
    CloudAccount,
    VersionControl,
    NetworkShare,
}

impl LocationKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::ExternalDrive => "external_drive",
            Self::InternalDrive => "internal_drive",
            Self::CloudAccount => "cloud_account",
            Self::VersionControl => "version_control",
            Self::NetworkShare => "network_share",
        }
    }
}

/// Lifecycle status of a registered volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeStatus {
    #[default]
    Active,
    /// Known but not seen for a while.
    Missing,
    /// Taken out of service; the name stays reserved.
    Retired,
}

impl fmt::Display for VolumeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Active => "active",
            Self::Missing => "missing",
            Self::Retired => "retired",
        })
    }
}

/// A registry entry: the durable identity of one volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeIdentity {
    /// Upper-cased name; unique across the registry.
    pub id: String,
    pub kind: LocationKind,
    pub volume_uuid: String,
    pub device_identifier: String,
    pub name: String,
    pub capacity_bytes: u64,
    pub first_seen: DateTime<Utc>,
    pub last_scanned: DateTime<Utc>,
    #[serde(default)]
    pub status: VolumeStatus,
}
