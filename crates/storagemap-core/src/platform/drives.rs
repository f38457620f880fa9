/// Removable-drive enumeration using the Windows API.
///
/// The volume serial number stands in for the UUID; the drive letter is
/// the device identifier.
use super::{DeviceEnumerator, Enumeration};
use crate::error::EnumerationError;
use crate::model::VolumeRecord;
use std::ffi::OsString;
use std::os::windows::ffi::OsStringExt;
use std::path::PathBuf;
use windows::Win32::Storage::FileSystem::{
    GetDiskFreeSpaceExW, GetDriveTypeW, GetLogicalDriveStringsW, GetVolumeInformationW,
};

// Drive type constant from the Windows API.
const DRIVE_REMOVABLE_VAL: u32 = 2;

#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsEnumerator;

impl DeviceEnumerator for WindowsEnumerator {
    fn enumerate(&self) -> Result<Enumeration, EnumerationError> {
        let mut found = Enumeration::default();

        // GetLogicalDriveStringsW returns null-separated drive root strings.
        let mut buffer = [0u16; 256];
        let len = unsafe { GetLogicalDriveStringsW(Some(&mut buffer)) };
        if len == 0 {
            return Err(EnumerationError::Platform(
                "GetLogicalDriveStringsW returned no drives".to_string(),
            ));
        }

        let full = OsString::from_wide(&buffer[..len as usize]);
        let full_str = full.to_string_lossy();

        for root in full_str.split('\0').filter(|s| !s.is_empty()) {
            let root_wide: Vec<u16> = root.encode_utf16().chain(std::iter::once(0)).collect();
            let root_pcwstr = windows::core::PCWSTR(root_wide.as_ptr());

            if unsafe { GetDriveTypeW(root_pcwstr) } != DRIVE_REMOVABLE_VAL {
                continue;
            }

            let letter = root.trim_end_matches('\\').to_string();

            let mut label_buf = [0u16; 256];
            let mut fs_buf = [0u16; 256];
            let mut serial: u32 = 0;
            let has_volume_info = unsafe {
                GetVolumeInformationW(
                    root_pcwstr,
                    Some(&mut label_buf),
                    Some(&mut serial as *mut u32),
                    None,
                    None,
                    Some(&mut fs_buf),
                )
                .is_ok()
            };
            if !has_volume_info {
                // Card readers with no media land here.
                found.skip(format!("skipping device {letter}: no volume information"));
                continue;
            }

            let mut free_caller: u64 = 0;
            let mut total: u64 = 0;
            let has_space = unsafe {
                GetDiskFreeSpaceExW(
                    root_pcwstr,
                    Some(&mut free_caller as *mut u64),
                    Some(&mut total as *mut u64),
                    None,
                )
                .is_ok()
            };
            let (capacity_bytes, free_bytes) = if has_space { (total, free_caller) } else { (0, 0) };

            found.push_checked(VolumeRecord {
                device_identifier: letter,
                volume_uuid: format!("{:04X}-{:04X}", serial >> 16, serial & 0xFFFF),
                volume_name: wide_to_string(&label_buf),
                mount_point: PathBuf::from(root),
                capacity_bytes,
                free_bytes,
                file_system: wide_to_string(&fs_buf),
            });
        }

        Ok(found)
    }
}

fn wide_to_string(buf: &[u16]) -> String {
    let end = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..end])
}
