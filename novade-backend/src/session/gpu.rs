//! GPU selection order shared by session implementations.

use std::path::PathBuf;

/// A DRM card node discovered during enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuCandidate {
    pub path: PathBuf,
    /// Seat the device is assigned to; `None` means the default seat.
    pub seat: Option<String>,
    /// Whether firmware used this device for the boot console.
    pub boot_vga: bool,
}

pub const DEFAULT_SEAT: &str = "seat0";

/// Picks the candidates belonging to `seat`, boot GPU first, at most `max`.
///
/// Candidates keep their enumeration order otherwise.
pub fn select_gpus(candidates: Vec<GpuCandidate>, seat: &str, max: usize) -> Vec<PathBuf> {
    let mut selected: Vec<PathBuf> = Vec::new();
    for candidate in candidates {
        let candidate_seat = candidate.seat.as_deref().unwrap_or(DEFAULT_SEAT);
        if candidate_seat != seat {
            continue;
        }
        if candidate.boot_vga {
            selected.insert(0, candidate.path);
        } else {
            selected.push(candidate.path);
        }
    }
    selected.truncate(max);
    selected
}
