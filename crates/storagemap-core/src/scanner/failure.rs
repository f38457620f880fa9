use serde::{Deserialize, Serialize};
use std::io;

/// Broad cause of a zero-filled subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    PermissionDenied,
    Io,
}

impl FailureKind {
    pub fn of(err: &io::Error) -> Self {
        if err.kind() == io::ErrorKind::PermissionDenied {
            Self::PermissionDenied
        } else {
            Self::Io
        }
    }
}

/// A file or subtree the walk could not read; it contributes zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanFailure {
    pub relative_path: String,
    pub kind: FailureKind,
    pub reason: String,
}

impl ScanFailure {
    pub fn new(relative_path: String, kind: FailureKind, reason: String) -> Self {
        Self {
            relative_path,
            kind,
            reason,
        }
    }
}
