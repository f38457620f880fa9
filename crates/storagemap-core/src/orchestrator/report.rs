/// Per-volume and per-run results of an orchestrator run.
use crate::model::VolumeRecord;
use std::fmt;
use std::path::PathBuf;

/// Where a volume is in its workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeState {
    Detected,
    New,
    Known,
    NameResolved,
    Scanning,
    Completed,
    Aborted,
}

impl fmt::Display for VolumeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Detected => "DETECTED",
            Self::New => "NEW",
            Self::Known => "KNOWN",
            Self::NameResolved => "NAME_RESOLVED",
            Self::Scanning => "SCANNING",
            Self::Completed => "COMPLETED",
            Self::Aborted => "ABORTED",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedScan {
    pub id: String,
    /// Registered during this run.
    pub was_new: bool,
    pub snapshot_path: PathBuf,
    pub directories: usize,
    /// Zero-filled subtrees.
    pub inaccessible: usize,
    pub total_size: u64,
    pub total_files: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeOutcome {
    Completed(CompletedScan),
    /// The scan root could not be read; nothing was written for this volume.
    Aborted { id: String, reason: String },
    /// No identity could be established (no name, id collision, declined).
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeReport {
    pub volume: VolumeRecord,
    pub outcome: VolumeOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Devices the enumerator skipped.
    pub warnings: Vec<String>,
    pub volumes: Vec<VolumeReport>,
}

impl RunReport {
    pub fn completed(&self) -> impl Iterator<Item = &CompletedScan> {
        self.volumes.iter().filter_map(|v| match &v.outcome {
            VolumeOutcome::Completed(scan) => Some(scan),
            _ => None,
        })
    }

    pub fn aborted_count(&self) -> usize {
        self.volumes
            .iter()
            .filter(|v| matches!(v.outcome, VolumeOutcome::Aborted { .. }))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.volumes
            .iter()
            .filter(|v| matches!(v.outcome, VolumeOutcome::Skipped { .. }))
            .count()
    }
}
