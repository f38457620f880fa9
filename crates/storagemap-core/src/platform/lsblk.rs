/// Linux enumeration via `lsblk --json`.
///
/// Reports mounted volumes on removable or hot-plug devices. Removability
/// is a property of the disk, so partitions inherit it from their parent.
/// Older util-linux releases print numbers and flags as strings; both
/// forms are accepted.
use super::{DeviceEnumerator, Enumeration};
use crate::error::EnumerationError;
use crate::model::VolumeRecord;
use serde_json::Value;
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

const COLUMNS: &str = "NAME,UUID,LABEL,SIZE,FSAVAIL,FSTYPE,MOUNTPOINT,RM,HOTPLUG";

#[derive(Debug, Clone)]
pub struct LsblkEnumerator {
    program: String,
}

impl Default for LsblkEnumerator {
    fn default() -> Self {
        Self {
            program: "lsblk".to_string(),
        }
    }
}

impl LsblkEnumerator {
    /// Use a different `lsblk` binary.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl DeviceEnumerator for LsblkEnumerator {
    fn enumerate(&self) -> Result<Enumeration, EnumerationError> {
        let command = format!("{} --json --bytes --output {COLUMNS}", self.program);
        let output = Command::new(&self.program)
            .args(["--json", "--bytes", "--output", COLUMNS])
            .output()
            .map_err(|source| EnumerationError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(EnumerationError::CommandFailed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_lsblk_json(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Turn `lsblk --json` output into volume records.
pub fn parse_lsblk_json(json: &str) -> Result<Enumeration, EnumerationError> {
    let parse_error = |message: String| EnumerationError::Parse {
        origin: "lsblk".to_string(),
        message,
    };

    let root: Value = serde_json::from_str(json).map_err(|e| parse_error(e.to_string()))?;
    let devices = root
        .get("blockdevices")
        .and_then(Value::as_array)
        .ok_or_else(|| parse_error("missing \"blockdevices\" array".to_string()))?;

    let mut found = Enumeration::default();
    for device in devices {
        collect(device, false, &mut found);
    }
    Ok(found)
}

fn collect(device: &Value, parent_removable: bool, found: &mut Enumeration) {
    let Some(fields) = device.as_object() else {
        found.skip(format!("skipping lsblk entry that is not an object: {device}"));
        return;
    };

    let removable = parent_removable
        || fields.get("rm").and_then(as_flag).unwrap_or(false)
        || fields.get("hotplug").and_then(as_flag).unwrap_or(false);

    let name = text(fields.get("name"));
    let mount_point = text(fields.get("mountpoint"));

    if removable && !mount_point.is_empty() && mount_point != "[SWAP]" {
        found.push_checked(VolumeRecord {
            device_identifier: name.clone(),
            volume_uuid: text(fields.get("uuid")),
            volume_name: text(fields.get("label")),
            mount_point: PathBuf::from(mount_point),
            capacity_bytes: fields.get("size").and_then(as_u64).unwrap_or(0),
            free_bytes: fields.get("fsavail").and_then(as_u64).unwrap_or(0),
            file_system: text(fields.get("fstype")),
        });
    } else {
        debug!("lsblk: ignoring {name} (removable={removable}, mountpoint={mount_point:?})");
    }

    if let Some(children) = fields.get("children").and_then(Value::as_array) {
        for child in children {
            collect(child, removable, found);
        }
    }
}

fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_u64().map(|n| n != 0),
        Value::String(s) => match s.trim() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODERN: &str = r#"{
       "blockdevices": [
          {"name": "nvme0n1", "uuid": null, "label": null, "size": 512110190592,
           "fsavail": null, "fstype": null, "mountpoint": null, "rm": false, "hotplug": false,
           "children": [
              {"name": "nvme0n1p2", "uuid": "aaaa", "label": null, "size": 511000000000,
               "fsavail": 100, "fstype": "ext4", "mountpoint": "/", "rm": false, "hotplug": false}
           ]},
          {"name": "sdb", "uuid": null, "label": null, "size": 5497558138880,
           "fsavail": null, "fstype": null, "mountpoint": null, "rm": false, "hotplug": true,
           "children": [
              {"name": "sdb1", "uuid": "1234", "label": "Backup", "size": 5497558138880,
               "fsavail": 1099511627776, "fstype": "exfat", "mountpoint": "/media/backup",
               "rm": false, "hotplug": true},
              {"name": "sdb2", "uuid": null, "label": null, "size": 1048576,
               "fsavail": null, "fstype": "vfat", "mountpoint": "/media/efi",
               "rm": false, "hotplug": true},
              {"name": "sdb3", "uuid": "swap-1", "label": null, "size": 1048576,
               "fsavail": null, "fstype": "swap", "mountpoint": "[SWAP]",
               "rm": false, "hotplug": true}
           ]}
       ]
    }"#;

    #[test]
    fn test_only_mounted_removable_volumes_are_reported() {
        let found = parse_lsblk_json(MODERN).unwrap();

        assert_eq!(found.volumes.len(), 1);
        let volume = &found.volumes[0];
        assert_eq!(volume.device_identifier, "sdb1");
        assert_eq!(volume.volume_uuid, "1234");
        assert_eq!(volume.volume_name, "Backup");
        assert_eq!(volume.mount_point, PathBuf::from("/media/backup"));
        assert_eq!(volume.capacity_bytes, 5_497_558_138_880);
        assert_eq!(volume.free_bytes, 1_099_511_627_776);
        assert_eq!(volume.file_system, "exfat");

        // sdb2 has no UUID: skipped with a warning, not silently.
        assert_eq!(found.warnings.len(), 1);
        assert!(found.warnings[0].contains("sdb2"));
    }

    #[test]
    fn test_string_typed_fields_from_older_lsblk() {
        let json = r#"{"blockdevices": [
            {"name": "sdc", "uuid": "B00C-1E55", "label": "STICK", "size": "31914983424",
             "fsavail": "1024", "fstype": "vfat", "mountpoint": "/run/media/u/STICK",
             "rm": "1", "hotplug": "1"}
        ]}"#;
        let found = parse_lsblk_json(json).unwrap();
        assert_eq!(found.volumes.len(), 1);
        assert_eq!(found.volumes[0].capacity_bytes, 31_914_983_424);
        assert_eq!(found.volumes[0].free_bytes, 1024);
    }

    #[test]
    fn test_unparsable_output_is_an_error() {
        assert!(matches!(
            parse_lsblk_json("lsblk: unknown column"),
            Err(EnumerationError::Parse { .. })
        ));
        assert!(matches!(
            parse_lsblk_json(r#"{"devices": []}"#),
            Err(EnumerationError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_program_is_an_error() {
        let enumerator = LsblkEnumerator::with_program("storagemap-no-such-lsblk");
        assert!(matches!(
            enumerator.enumerate(),
            Err(EnumerationError::Spawn { .. })
        ));
    }
}
