use nokhwa::query;
use nokhwa::utils::{ApiBackend, CameraIndex};

use super::types::{CameraDevice, CameraError};

/// Capture devices visible through the platform backend, by index.
///
/// An empty list means no camera is attached; only a backend failure is an
/// error.
pub fn list_devices() -> Result<Vec<CameraDevice>, CameraError> {
    let found = query(ApiBackend::Auto).map_err(|e| CameraError::QueryFailed(e.to_string()))?;

    let mut devices: Vec<CameraDevice> = found
        .into_iter()
        .filter_map(|info| {
            // Devices addressed by a string (IP cameras) can't be picked by index
            let CameraIndex::Index(index) = info.index() else {
                log::debug!("Skipping non-indexed device {}", info.human_name());
                return None;
            };
            Some(CameraDevice {
                index: *index,
                name: info.human_name(),
                description: info.description().to_string(),
            })
        })
        .collect();
    devices.sort_by_key(|d| d.index);
    log::debug!("Found {} capture device(s)", devices.len());
    Ok(devices)
}
