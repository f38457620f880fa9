/// CSV export of a snapshot's directory table.
use super::Snapshot;
use crate::error::SnapshotError;
use std::io::Write;

/// Write `relative_path,depth,size_bytes,file_count` rows for `snapshot`.
pub fn export_csv<W: Write>(snapshot: &Snapshot, writer: W) -> Result<(), SnapshotError> {
    let mut csv = csv::Writer::from_writer(writer);
    for entry in &snapshot.directories {
        csv.serialize(entry)?;
    }
    csv.flush().map_err(|source| SnapshotError::Io {
        path: std::path::PathBuf::from("<csv output>"),
        source,
    })?;
    Ok(())
}
