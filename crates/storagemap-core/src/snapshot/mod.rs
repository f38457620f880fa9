/// Dated, immutable scan records.
///
/// One JSON file per (volume id, UTC calendar date): `<id>-<YYYY-MM-DD>.json`.
/// A second scan on the same day replaces that day's file; other days'
/// files are never touched.
pub mod export;

pub use export::export_csv;

use crate::error::SnapshotError;
use crate::fsutil::atomic_write;
use crate::model::{DirectoryEntry, VolumeRecord};
use crate::scanner::ScanFailure;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Volume facts captured at scan time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveInfo {
    pub device_identifier: String,
    pub volume_uuid: String,
    pub capacity_bytes: u64,
    pub free_bytes: u64,
    #[serde(default)]
    pub volume_name: String,
    #[serde(default)]
    pub mount_point: PathBuf,
    #[serde(default)]
    pub file_system: String,
}

impl From<&VolumeRecord> for DriveInfo {
    fn from(volume: &VolumeRecord) -> Self {
        Self {
            device_identifier: volume.device_identifier.clone(),
            volume_uuid: volume.volume_uuid.clone(),
            capacity_bytes: volume.capacity_bytes,
            free_bytes: volume.free_bytes,
            volume_name: volume.volume_name.clone(),
            mount_point: volume.mount_point.clone(),
            file_system: volume.file_system.clone(),
        }
    }
}

/// One scan of one volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub drive_id: String,
    pub scan_date: DateTime<Utc>,
    pub drive_info: DriveInfo,
    pub directories: Vec<DirectoryEntry>,
    /// Zero-filled subtrees, so "empty" and "unreadable" can be told apart.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inaccessible: Vec<ScanFailure>,
}

impl Snapshot {
    /// The UTC calendar date that keys this snapshot's file.
    pub fn date(&self) -> NaiveDate {
        self.scan_date.date_naive()
    }
}

fn snapshot_file_name(drive_id: &str, date: NaiveDate) -> String {
    format!("{drive_id}-{}.json", date.format("%Y-%m-%d"))
}

/// A retained snapshot file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFile {
    pub date: NaiveDate,
    pub path: PathBuf,
}

/// Writes and finds snapshot files under one directory.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    dir: PathBuf,
}

impl SnapshotWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where a snapshot for `drive_id` on `date` lives.
    pub fn path_for(&self, drive_id: &str, date: NaiveDate) -> PathBuf {
        self.dir.join(snapshot_file_name(drive_id, date))
    }

    /// Persist `snapshot`, replacing any earlier snapshot from the same day.
    pub fn write(&self, snapshot: &Snapshot) -> Result<PathBuf, SnapshotError> {
        let path = self.path_for(&snapshot.drive_id, snapshot.date());
        let replacing = path.exists();

        let mut json = serde_json::to_vec_pretty(snapshot).map_err(SnapshotError::Serialize)?;
        json.push(b'\n');
        atomic_write(&path, &json).map_err(|source| SnapshotError::Io {
            path: path.clone(),
            source,
        })?;

        if replacing {
            info!("Replaced same-day snapshot {}", path.display());
        } else {
            info!("Snapshot saved: {}", path.display());
        }
        Ok(path)
    }

    /// Snapshots retained for `drive_id`, oldest first.
    pub fn list(&self, drive_id: &str) -> Result<Vec<SnapshotFile>, SnapshotError> {
        let read_dir = match std::fs::read_dir(&self.dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(SnapshotError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let prefix = format!("{drive_id}-");
        let mut files = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|source| SnapshotError::Io {
                path: self.dir.clone(),
                source,
            })?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(date) = name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(".json"))
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            else {
                continue;
            };
            files.push(SnapshotFile {
                date,
                path: entry.path(),
            });
        }
        files.sort_by_key(|f| f.date);
        debug!("Found {} snapshots for {}", files.len(), drive_id);
        Ok(files)
    }

    /// Read one snapshot back.
    pub fn load(path: &Path) -> Result<Snapshot, SnapshotError> {
        let content = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| SnapshotError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
