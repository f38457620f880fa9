/// Per-volume workflow: detect → identify → scan → persist.
///
/// ```text
/// DETECTED ─┬─ NEW ── NAME_RESOLVED ─┬─ SCANNING ─┬─ COMPLETED
///           └─ KNOWN ────────────────┘            └─ ABORTED
/// ```
///
/// Volumes are processed one at a time. A volume that cannot be named, or
/// whose root cannot be read, never stops the others; only enumeration
/// failure and registry save failure end the run.
pub mod prompt;
pub mod report;

pub use prompt::{AutoAcceptPrompt, NameDecision, NamePrompt, NameRequest};
pub use report::{CompletedScan, RunReport, VolumeOutcome, VolumeReport, VolumeState};

use crate::error::RunError;
use crate::model::VolumeRecord;
use crate::naming::NamingPool;
use crate::platform::DeviceEnumerator;
use crate::registry::{Registration, RegistryStore, Upserted};
use crate::scanner::{self, DEFAULT_LISTING_DEPTH};
use crate::snapshot::{DriveInfo, Snapshot, SnapshotWriter};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

/// Tunables for one run.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Deepest directory level that gets its own snapshot entry.
    pub listing_depth: u16,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            listing_depth: DEFAULT_LISTING_DEPTH,
        }
    }
}

/// Drives one run over every detected volume.
///
/// The registry and naming pool are borrowed for the run: the pool is
/// updated the moment a new volume is registered, so two new volumes in
/// the same run are never offered the same name.
pub struct Orchestrator<'a> {
    registry: &'a mut RegistryStore,
    pool: &'a mut NamingPool,
    writer: &'a SnapshotWriter,
    options: RunOptions,
    clock: fn() -> DateTime<Utc>,
}

/// Outcome of identity resolution for one volume.
enum Identity {
    Known(String),
    New(String),
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        registry: &'a mut RegistryStore,
        pool: &'a mut NamingPool,
        writer: &'a SnapshotWriter,
        options: RunOptions,
    ) -> Self {
        Self {
            registry,
            pool,
            writer,
            options,
            clock: Utc::now,
        }
    }

    /// Replace the time source (tests).
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Enumerate once, then process each volume in order.
    pub fn run(
        &mut self,
        enumerator: &dyn DeviceEnumerator,
        prompt: &mut dyn NamePrompt,
    ) -> Result<RunReport, RunError> {
        let enumeration = enumerator.enumerate()?;
        info!(
            "Found {} external volume(s), {} skipped",
            enumeration.volumes.len(),
            enumeration.warnings.len()
        );

        let mut report = RunReport {
            warnings: enumeration.warnings,
            volumes: Vec::with_capacity(enumeration.volumes.len()),
        };
        for volume in enumeration.volumes {
            let outcome = self.process_volume(&volume, prompt)?;
            report.volumes.push(VolumeReport { volume, outcome });
        }

        // New registrations whose scan aborted still hold their names.
        if self.registry.is_dirty() {
            self.registry.save()?;
        }
        Ok(report)
    }

    /// Run one volume to a terminal state.
    ///
    /// Only a registry save failure is returned as `Err`; everything
    /// volume-specific ends up in the [`VolumeOutcome`].
    pub fn process_volume(
        &mut self,
        volume: &VolumeRecord,
        prompt: &mut dyn NamePrompt,
    ) -> Result<VolumeOutcome, RunError> {
        let uuid = volume.volume_uuid.as_str();
        info!(
            "{uuid}: {} (device {}, mounted at {})",
            VolumeState::Detected,
            volume.device_identifier,
            volume.mount_point.display()
        );

        let identity = match self.registry.find_by_uuid(uuid) {
            Some(known) => {
                info!("{uuid}: {} as {}", VolumeState::Known, known.id);
                Identity::Known(known.id.clone())
            }
            None => {
                info!("{uuid}: {}", VolumeState::New);
                match self.register(volume, prompt) {
                    Ok(id) => Identity::New(id),
                    Err(reason) => {
                        warn!("{uuid}: not registered: {reason}");
                        return Ok(VolumeOutcome::Skipped { reason });
                    }
                }
            }
        };
        let (id, was_new) = match identity {
            Identity::Known(id) => (id, false),
            Identity::New(id) => (id, true),
        };

        info!("{uuid}: {} {}", VolumeState::Scanning, volume.mount_point.display());
        let outcome = match scanner::walk(&volume.mount_point, self.options.listing_depth) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!("{id}: {}: {err}", VolumeState::Aborted);
                return Ok(VolumeOutcome::Aborted {
                    id,
                    reason: err.to_string(),
                });
            }
        };

        let now = (self.clock)();
        let snapshot = Snapshot {
            drive_id: id.clone(),
            scan_date: now,
            drive_info: DriveInfo::from(volume),
            directories: outcome.directories,
            inaccessible: outcome.failures,
        };
        let snapshot_path = match self.writer.write(&snapshot) {
            Ok(path) => path,
            Err(err) => {
                warn!("{id}: {}: {err}", VolumeState::Aborted);
                return Ok(VolumeOutcome::Aborted {
                    id,
                    reason: err.to_string(),
                });
            }
        };

        self.registry
            .upsert(Registration::for_volume(volume, id.as_str()), now)?;
        self.registry.save()?;

        info!(
            "{id}: {} ({} directories listed, {} inaccessible)",
            VolumeState::Completed,
            snapshot.directories.len(),
            snapshot.inaccessible.len()
        );
        Ok(VolumeOutcome::Completed(CompletedScan {
            id,
            was_new,
            snapshot_path,
            directories: snapshot.directories.len(),
            inaccessible: snapshot.inaccessible.len(),
            total_size: outcome.total_size,
            total_files: outcome.total_files,
        }))
    }

    /// NEW → NAME_RESOLVED: obtain a name and register it. The error is a
    /// human-readable reason the volume is skipped.
    fn register(
        &mut self,
        volume: &VolumeRecord,
        prompt: &mut dyn NamePrompt,
    ) -> Result<String, String> {
        let tier = self.pool.tier_for(volume.capacity_bytes);
        let proposed = match self.pool.propose(volume.capacity_bytes) {
            Ok(name) => Some(name),
            Err(err) => {
                warn!("{}: {err}", volume.volume_uuid);
                None
            }
        };

        let decision = prompt.resolve_name(&NameRequest {
            volume,
            tier,
            proposed: proposed.as_deref(),
            pool: &*self.pool,
        });
        let name = match (decision, proposed) {
            (NameDecision::Accept, Some(name)) => name,
            (NameDecision::Accept, None) => {
                return Err(format!("no {tier} names left and no name was supplied"))
            }
            (NameDecision::Custom(name), _) => name,
            (NameDecision::Skip, _) => return Err("naming declined".to_string()),
        };

        let now = (self.clock)();
        let identity = match self
            .registry
            .upsert(Registration::for_volume(volume, name), now)
        {
            Ok(Upserted::Created(identity)) => identity,
            Ok(Upserted::Updated(identity)) => identity,
            Err(err) => return Err(err.to_string()),
        };
        self.pool.reserve(&identity.id);
        info!(
            "{}: {} as {} ({})",
            volume.volume_uuid,
            VolumeState::NameResolved,
            identity.id,
            identity.name
        );
        Ok(identity.id)
    }
}
