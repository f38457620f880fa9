/// Platform-specific removable-volume enumeration.
///
/// The enumerator is an external collaborator: it is invoked once per run
/// and either returns every usable volume (malformed ones skipped with a
/// warning) or fails the whole run.
pub mod fixture;
pub mod lsblk;
#[cfg(windows)]
pub mod drives;

pub use fixture::JsonFileEnumerator;
pub use lsblk::LsblkEnumerator;
#[cfg(windows)]
pub use drives::WindowsEnumerator;

use crate::error::EnumerationError;
use crate::model::VolumeRecord;
use tracing::warn;

/// Volumes found by one enumeration, plus the devices that were skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enumeration {
    pub volumes: Vec<VolumeRecord>,
    pub warnings: Vec<String>,
}

impl Enumeration {
    /// Keep `volume` unless it is malformed, in which case record why.
    pub fn push_checked(&mut self, volume: VolumeRecord) {
        match volume.defect() {
            None => self.volumes.push(volume),
            Some(defect) => self.skip(format!(
                "skipping device {}: {defect}",
                if volume.device_identifier.is_empty() {
                    "<unnamed>"
                } else {
                    volume.device_identifier.as_str()
                }
            )),
        }
    }

    /// Record a skipped device.
    pub fn skip(&mut self, warning: String) {
        warn!("{warning}");
        self.warnings.push(warning);
    }
}

/// Lists currently mounted removable volumes.
pub trait DeviceEnumerator {
    fn enumerate(&self) -> Result<Enumeration, EnumerationError>;
}

/// The enumerator for the platform we are running on.
pub fn system_enumerator() -> Result<Box<dyn DeviceEnumerator>, EnumerationError> {
    #[cfg(windows)]
    {
        Ok(Box::new(WindowsEnumerator))
    }
    #[cfg(target_os = "linux")]
    {
        Ok(Box::new(LsblkEnumerator::default()))
    }
    #[cfg(not(any(windows, target_os = "linux")))]
    {
        Err(EnumerationError::Unsupported)
    }
}
