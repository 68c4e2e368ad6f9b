//! udev-backed GPU enumeration.
//!
//! Session implementations call [`find_gpu_paths`] from
//! [`super::Session::find_gpus`] and then open each path themselves.

use std::ffi::OsStr;
use std::path::PathBuf;

use tracing::{debug, warn};
use udev::Enumerator;

use super::gpu::{select_gpus, GpuCandidate};
use crate::error::SessionError;

fn enumeration_error(e: std::io::Error) -> SessionError {
    SessionError::GpuEnumeration(e.to_string())
}

/// Lists the DRM card nodes assigned to `seat`, boot GPU first, at most `max`.
pub fn find_gpu_paths(seat: &str, max: usize) -> Result<Vec<PathBuf>, SessionError> {
    let mut enumerator = Enumerator::new().map_err(enumeration_error)?;
    enumerator.match_subsystem("drm").map_err(enumeration_error)?;
    enumerator.match_sysname("card[0-9]*").map_err(enumeration_error)?;

    let mut candidates = Vec::new();
    for device in enumerator.scan_devices().map_err(enumeration_error)? {
        let Some(devnode) = device.devnode() else {
            continue;
        };
        let seat_name = device
            .property_value("ID_SEAT")
            .map(|value| value.to_string_lossy().into_owned());
        let boot_vga = match device.parent_with_subsystem("pci") {
            Ok(Some(pci)) => pci.attribute_value("boot_vga") == Some(OsStr::new("1")),
            Ok(None) => false,
            Err(e) => {
                warn!(path = %devnode.display(), "Failed to look up PCI parent: {}", e);
                false
            }
        };
        debug!(path = %devnode.display(), seat = ?seat_name, boot_vga, "Found DRM card");
        candidates.push(GpuCandidate {
            path: devnode.to_path_buf(),
            seat: seat_name,
            boot_vga,
        });
    }

    Ok(select_gpus(candidates, seat, max))
}
