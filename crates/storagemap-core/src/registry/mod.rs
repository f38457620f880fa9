/// Durable mapping of volume UUID → identity.
///
/// Persisted as `{"locations": [...]}`. The volume UUID is the only key
/// used to recognise a volume again; the id (the upper-cased name) is kept
/// unique across entries.
use crate::error::RegistryError;
use crate::fsutil::atomic_write;
use crate::model::{LocationKind, VolumeIdentity, VolumeRecord, VolumeStatus};
use crate::naming::{id_problem, normalise_id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// On-disk shape of the registry file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    locations: Vec<VolumeIdentity>,
}

/// Input to [`RegistryStore::upsert`].
#[derive(Debug, Clone)]
pub struct Registration {
    pub volume_uuid: String,
    pub device_identifier: String,
    /// Only consulted when the UUID is new.
    pub name: String,
    pub capacity_bytes: u64,
    pub status: VolumeStatus,
}

impl Registration {
    /// An `active` registration for `volume` under `name`.
    pub fn for_volume(volume: &VolumeRecord, name: impl Into<String>) -> Self {
        Self {
            volume_uuid: volume.volume_uuid.clone(),
            device_identifier: volume.device_identifier.clone(),
            name: name.into(),
            capacity_bytes: volume.capacity_bytes,
            status: VolumeStatus::Active,
        }
    }
}

/// Whether an upsert created or refreshed an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upserted {
    Created(VolumeIdentity),
    Updated(VolumeIdentity),
}

impl Upserted {
    pub fn identity(&self) -> &VolumeIdentity {
        match self {
            Self::Created(identity) | Self::Updated(identity) => identity,
        }
    }
}

/// The loaded registry plus where it lives.
#[derive(Debug)]
pub struct RegistryStore {
    path: PathBuf,
    entries: Vec<VolumeIdentity>,
    dirty: bool,
}

impl RegistryStore {
    /// An empty registry that will be saved to `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Vec::new(),
            dirty: false,
        }
    }

    /// Read the registry at `path`.
    ///
    /// A missing file is an empty registry. A file that exists but does not
    /// parse is [`RegistryError::Corrupt`]: it may hold identities that must
    /// not be silently forgotten.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let path = path.into();
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No registry at {}; starting empty", path.display());
                return Ok(Self::empty(path));
            }
            Err(source) => return Err(RegistryError::Io { path, source }),
        };

        let file: RegistryFile = match serde_json::from_str(&content) {
            Ok(f) => f,
            Err(source) => return Err(RegistryError::Corrupt { path, source }),
        };

        // Hand-edited files may carry ids in any case; compare upper-cased.
        let mut entries = file.locations;
        let mut dirty = false;
        for entry in &mut entries {
            let id = normalise_id(&entry.id);
            if id != entry.id {
                warn!("Registry {}: normalising id {:?} to {}", path.display(), entry.id, id);
                entry.id = id;
                dirty = true;
            }
        }

        let mut seen_ids = std::collections::HashSet::new();
        for entry in &entries {
            if !seen_ids.insert(entry.id.as_str()) {
                warn!("Registry {} lists id {} more than once", path.display(), entry.id);
            }
        }

        debug!("Loaded {} registry entries from {}", entries.len(), path.display());
        Ok(Self {
            path,
            entries,
            dirty,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All identities, in first-seen order once saved.
    pub fn identities(&self) -> impl Iterator<Item = &VolumeIdentity> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `true` when there are changes not yet written by [`save`](Self::save).
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn find_by_uuid(&self, volume_uuid: &str) -> Option<&VolumeIdentity> {
        self.entries.iter().find(|e| e.volume_uuid == volume_uuid)
    }

    pub fn find_by_id(&self, id: &str) -> Option<&VolumeIdentity> {
        let id = normalise_id(id);
        self.entries.iter().find(|e| e.id == id)
    }

    /// Create or refresh the entry for `registration.volume_uuid`.
    ///
    /// New UUID: id = normalised name, `first_seen = last_scanned = now`,
    /// rejected with [`RegistryError::IdCollision`] if the id belongs to a
    /// different volume. Known UUID: id, name and `first_seen` are kept;
    /// `last_scanned`, `capacity_bytes` and `status` are overwritten.
    pub fn upsert(
        &mut self,
        registration: Registration,
        now: DateTime<Utc>,
    ) -> Result<Upserted, RegistryError> {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.volume_uuid == registration.volume_uuid)
        {
            entry.last_scanned = now;
            entry.capacity_bytes = registration.capacity_bytes;
            entry.status = registration.status;
            self.dirty = true;
            return Ok(Upserted::Updated(entry.clone()));
        }

        if let Some(reason) = id_problem(&registration.name) {
            return Err(RegistryError::InvalidName {
                name: registration.name,
                reason,
            });
        }
        let id = normalise_id(&registration.name);
        if let Some(existing) = self.entries.iter().find(|e| e.id == id) {
            return Err(RegistryError::IdCollision {
                id,
                existing_uuid: existing.volume_uuid.clone(),
                volume_uuid: registration.volume_uuid,
            });
        }

        let identity = VolumeIdentity {
            id,
            kind: LocationKind::ExternalDrive,
            volume_uuid: registration.volume_uuid,
            device_identifier: registration.device_identifier,
            name: registration.name.trim().to_string(),
            capacity_bytes: registration.capacity_bytes,
            first_seen: now,
            last_scanned: now,
            status: registration.status,
        };
        info!("Registered {} for volume {}", identity.id, identity.volume_uuid);
        self.entries.push(identity.clone());
        self.dirty = true;
        Ok(Upserted::Created(identity))
    }

    /// Persist every entry, ordered by `first_seen`, with an atomic
    /// write-then-rename so a crash never leaves a half-written file.
    pub fn save(&mut self) -> Result<(), RegistryError> {
        self.entries
            .sort_by(|a, b| a.first_seen.cmp(&b.first_seen).then_with(|| a.id.cmp(&b.id)));

        let file = RegistryFile {
            locations: self.entries.clone(),
        };
        let mut json = serde_json::to_vec_pretty(&file).map_err(RegistryError::Serialize)?;
        json.push(b'\n');

        atomic_write(&self.path, &json).map_err(|source| RegistryError::Io {
            path: self.path.clone(),
            source,
        })?;
        self.dirty = false;
        debug!("Saved {} registry entries to {}", self.entries.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, hour, 0, 0).unwrap()
    }

    fn registration(uuid: &str, name: &str, capacity: u64) -> Registration {
        Registration {
            volume_uuid: uuid.into(),
            device_identifier: "sdb1".into(),
            name: name.into(),
            capacity_bytes: capacity,
            status: VolumeStatus::Active,
        }
    }

    #[test]
    fn test_missing_file_is_empty_registry() {
        let tmp = TempDir::new().unwrap();
        let store = RegistryStore::load(tmp.path().join("drives.json")).unwrap();
        assert!(store.is_empty());
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_corrupt_file_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("drives.json");
        std::fs::write(&path, "{ \"locations\": [ oops").unwrap();

        match RegistryStore::load(&path) {
            Err(RegistryError::Corrupt { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected Corrupt, got {other:?}"),
        }
        // The damaged file is left untouched for manual repair.
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "{ \"locations\": [ oops"
        );
    }

    #[test]
    fn test_new_volume_gets_upper_case_id() {
        let tmp = TempDir::new().unwrap();
        let mut store = RegistryStore::empty(tmp.path().join("drives.json"));

        let up = store.upsert(registration("1234", "Asgard", 500), at(9)).unwrap();
        let identity = match up {
            Upserted::Created(identity) => identity,
            other => panic!("expected Created, got {other:?}"),
        };
        assert_eq!(identity.id, "ASGARD");
        assert_eq!(identity.name, "Asgard");
        assert_eq!(identity.kind, LocationKind::ExternalDrive);
        assert_eq!(identity.status, VolumeStatus::Active);
        assert_eq!(identity.first_seen, at(9));
        assert_eq!(identity.last_scanned, at(9));
        assert!(store.is_dirty());
    }

    #[test]
    fn test_known_volume_keeps_id_and_first_seen() {
        let tmp = TempDir::new().unwrap();
        let mut store = RegistryStore::empty(tmp.path().join("drives.json"));
        store.upsert(registration("1234", "Asgard", 500), at(9)).unwrap();

        let mut again = registration("1234", "SomethingElse", 700);
        again.status = VolumeStatus::Missing;
        let up = store.upsert(again, at(11)).unwrap();

        let identity = up.identity();
        assert!(matches!(up, Upserted::Updated(_)));
        assert_eq!(identity.id, "ASGARD");
        assert_eq!(identity.name, "Asgard");
        assert_eq!(identity.first_seen, at(9));
        assert_eq!(identity.last_scanned, at(11));
        assert_eq!(identity.capacity_bytes, 700);
        assert_eq!(identity.status, VolumeStatus::Missing);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_id_collision_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let mut store = RegistryStore::empty(tmp.path().join("drives.json"));
        store.upsert(registration("1234", "Asgard", 500), at(9)).unwrap();

        match store.upsert(registration("5678", "asgard", 500), at(10)) {
            Err(RegistryError::IdCollision {
                id,
                existing_uuid,
                volume_uuid,
            }) => {
                assert_eq!(id, "ASGARD");
                assert_eq!(existing_uuid, "1234");
                assert_eq!(volume_uuid, "5678");
            }
            other => panic!("expected IdCollision, got {other:?}"),
        }
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let mut store = RegistryStore::empty("unused.json");
        assert!(matches!(
            store.upsert(registration("1", "   ", 1), at(9)),
            Err(RegistryError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_names_that_are_not_file_name_safe_are_rejected() {
        let mut store = RegistryStore::empty("unused.json");
        for name in ["../../escaped", "a/b", "back\\slash", "E:", "..", "nul", "com1"] {
            match store.upsert(registration("1", name, 1), at(9)) {
                Err(RegistryError::InvalidName { name: rejected, .. }) => assert_eq!(rejected, name),
                other => panic!("{name:?}: expected InvalidName, got {other:?}"),
            }
        }
        assert!(store.is_empty());
        assert!(store.upsert(registration("1", "Dum-E", 1), at(9)).is_ok());
    }

    #[test]
    fn test_hand_edited_lower_case_id_still_collides() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("drives.json");
        std::fs::write(
            &path,
            r#"{"locations": [{"id": "asgard", "kind": "external_drive",
                "volume_uuid": "1234", "device_identifier": "sdb1", "name": "Asgard",
                "capacity_bytes": 5, "first_seen": "2026-10-01T00:00:00Z",
                "last_scanned": "2026-10-01T00:00:00Z", "status": "active"}]}"#,
        )
        .unwrap();

        let mut store = RegistryStore::load(&path).unwrap();
        assert_eq!(store.find_by_uuid("1234").unwrap().id, "ASGARD");
        assert!(store.is_dirty());
        assert!(matches!(
            store.upsert(registration("5678", "Asgard", 5), at(9)),
            Err(RegistryError::IdCollision { .. })
        ));
    }

    #[test]
    fn test_save_orders_by_first_seen_and_round_trips() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("registry").join("drives.json");
        let mut store = RegistryStore::empty(&path);

        store.upsert(registration("b", "Xandar", 2), at(12)).unwrap();
        store.upsert(registration("a", "Asgard", 1), at(8)).unwrap();
        store.upsert(registration("b", "ignored", 3), at(12) + Duration::hours(1)).unwrap();
        store.save().unwrap();
        assert!(!store.is_dirty());

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let ids: Vec<&str> = raw["locations"]
            .as_array()
            .unwrap()
            .iter()
            .map(|l| l["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["ASGARD", "XANDAR"]);
        assert_eq!(raw["locations"][0]["kind"], "external_drive");
        assert_eq!(raw["locations"][0]["status"], "active");

        let reloaded = RegistryStore::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        let xandar = reloaded.find_by_uuid("b").unwrap();
        assert_eq!(xandar.capacity_bytes, 3);
        assert_eq!(xandar.first_seen, at(12));
        assert_eq!(reloaded.find_by_id("asgard").unwrap().volume_uuid, "a");
    }
}
