/// Volume listing read from a JSON file instead of the OS.
///
/// Used for `--volumes-file` and for driving the orchestrator in tests.
/// The file is an array of [`VolumeRecord`] objects; elements that do not
/// parse are skipped with a warning like any other malformed device.
use super::{DeviceEnumerator, Enumeration};
use crate::error::EnumerationError;
use crate::model::VolumeRecord;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct JsonFileEnumerator {
    path: PathBuf,
}

impl JsonFileEnumerator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DeviceEnumerator for JsonFileEnumerator {
    fn enumerate(&self) -> Result<Enumeration, EnumerationError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| {
            EnumerationError::Read {
                path: self.path.clone(),
                source,
            }
        })?;
        let origin = self.path.display().to_string();
        let items: Vec<serde_json::Value> =
            serde_json::from_str(&content).map_err(|e| EnumerationError::Parse {
                origin: origin.clone(),
                message: e.to_string(),
            })?;

        let mut found = Enumeration::default();
        for (i, item) in items.into_iter().enumerate() {
            match serde_json::from_value::<VolumeRecord>(item) {
                Ok(volume) => found.push_checked(volume),
                Err(e) => found.skip(format!("skipping entry {i} of {origin}: {e}")),
            }
        }
        Ok(found)
    }
}
