//! The thread that owns the nokhwa device.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::mpsc::SyncSender;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, ControlValueSetter, FrameFormat as WireFormat, KnownCameraControl,
    RequestedFormat, RequestedFormatType,
};
use nokhwa::Camera;

use super::frame_utils::{convert_to_rgb, mirror_horizontal};
use super::source::SourceStatus;
use super::types::{CameraError, CameraSettings, Frame, Resolution};

/// Consecutive failed reads after which the device is considered gone.
const MAX_READ_FAILURES: u32 = 50;

/// Idle wait between polls while paused.
const PAUSED_POLL: Duration = Duration::from_millis(20);

/// What the device actually agreed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    pub resolution: Resolution,
    pub fps: u32,
}

/// State shared between [`super::CameraCapture`] and its worker.
#[derive(Debug)]
pub(crate) struct StreamShared {
    pub latest: Mutex<Option<Frame>>,
    status: AtomicU8,
    pub shutdown: AtomicBool,
}

impl StreamShared {
    pub fn new() -> Self {
        Self {
            latest: Mutex::new(None),
            status: AtomicU8::new(encode(SourceStatus::Paused)),
            shutdown: AtomicBool::new(false),
        }
    }

    pub fn status(&self) -> SourceStatus {
        match self.status.load(Ordering::Acquire) {
            0 => SourceStatus::Live,
            1 => SourceStatus::Paused,
            _ => SourceStatus::Ended,
        }
    }

    pub fn set_status(&self, status: SourceStatus) {
        self.status.store(encode(status), Ordering::Release);
    }

    /// Move between Live and Paused; an ended stream stays ended.
    pub fn toggle_pause(&self, paused: bool) -> bool {
        let (from, to) = if paused {
            (SourceStatus::Live, SourceStatus::Paused)
        } else {
            (SourceStatus::Paused, SourceStatus::Live)
        };
        self.status
            .compare_exchange(encode(from), encode(to), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

fn encode(status: SourceStatus) -> u8 {
    match status {
        SourceStatus::Live => 0,
        SourceStatus::Paused => 1,
        SourceStatus::Ended => 2,
    }
}

/// Open the device, report the negotiated format on `ready`, then keep
/// `shared.latest` filled until shutdown or the device stops answering.
pub(crate) fn run(
    settings: CameraSettings,
    shared: &StreamShared,
    ready: SyncSender<Result<StreamInfo, CameraError>>,
) {
    let mut camera = match open_device(&settings).and_then(|mut camera| {
        camera
            .open_stream()
            .map_err(|e| CameraError::StreamFailed(e.to_string()))?;
        Ok(camera)
    }) {
        Ok(camera) => camera,
        Err(e) => {
            shared.set_status(SourceStatus::Ended);
            let _ = ready.send(Err(e));
            return;
        }
    };

    apply_controls(&mut camera, &settings);

    let format = camera.camera_format();
    let info = StreamInfo {
        resolution: Resolution::new(format.resolution().width(), format.resolution().height()),
        fps: format.frame_rate(),
    };
    shared.set_status(SourceStatus::Live);
    if ready.send(Ok(info)).is_err() {
        // Nobody is waiting for this stream any more
        shared.set_status(SourceStatus::Ended);
        let _ = camera.stop_stream();
        return;
    }

    let mut failures = 0;
    while !shared.shutdown.load(Ordering::Acquire) {
        if shared.status() == SourceStatus::Paused {
            thread::sleep(PAUSED_POLL);
            continue;
        }

        match camera.frame() {
            Ok(buffer) => {
                failures = 0;
                // Undecodable frames are dropped; the next one usually decodes
                let Some(mut frame) = convert_to_rgb(&buffer) else {
                    continue;
                };
                if settings.mirror {
                    mirror_horizontal(&mut frame);
                }
                if let Ok(mut latest) = shared.latest.lock() {
                    *latest = Some(frame);
                }
            }
            Err(e) => {
                failures += 1;
                log::debug!("Camera read failed ({}): {}", failures, e);
                if failures >= MAX_READ_FAILURES {
                    log::warn!("Camera stopped delivering frames: {}", e);
                    break;
                }
                thread::sleep(Duration::from_millis(5));
            }
        }
    }

    shared.set_status(SourceStatus::Ended);
    if let Err(e) = camera.stop_stream() {
        log::debug!("Closing camera stream: {}", e);
    }
}

/// Apply exposure and contrast, if configured.
///
/// Not every device exposes these controls, so a rejected value is only
/// reported; capture carries on with the device defaults.
fn apply_controls(camera: &mut Camera, settings: &CameraSettings) {
    match camera.camera_controls() {
        Ok(controls) => log::debug!("Camera controls: {:?}", controls),
        Err(e) => log::debug!("Could not list camera controls: {}", e),
    }

    let requested = [
        (KnownCameraControl::Exposure, settings.exposure),
        (KnownCameraControl::Contrast, settings.contrast),
    ];

    for (control, value) in requested {
        let Some(value) = value else { continue };
        match camera.set_camera_control(control, ControlValueSetter::Integer(value)) {
            Ok(()) => log::info!("Applied camera control {:?} = {}", control, value),
            Err(e) => log::warn!(
                "Camera control {:?} = {} not supported by this device: {}",
                control,
                value,
                e
            ),
        }
    }
}

/// Wire formats tried in order. `None` takes the device's largest mode.
const WIRE_FORMATS: [Option<WireFormat>; 3] =
    [Some(WireFormat::NV12), Some(WireFormat::MJPEG), None];

fn request_for(wire: Option<WireFormat>, settings: &CameraSettings) -> RequestedFormat<'static> {
    let kind = match wire {
        Some(wire) => RequestedFormatType::Closest(CameraFormat::new(
            nokhwa::utils::Resolution::new(settings.resolution.width, settings.resolution.height),
            wire,
            settings.fps,
        )),
        None => RequestedFormatType::AbsoluteHighestResolution,
    };
    RequestedFormat::new::<RgbFormat>(kind)
}

/// Error text fragments backends use when the OS refuses camera access.
const PERMISSION_HINTS: [&str; 4] = ["permission", "denied", "authorization", "access"];

fn open_device(settings: &CameraSettings) -> Result<Camera, CameraError> {
    let index = CameraIndex::Index(settings.device_index);
    let mut last = None;

    for wire in WIRE_FORMATS {
        match Camera::new(index.clone(), request_for(wire, settings)) {
            Ok(camera) => return Ok(camera),
            Err(e) => {
                log::debug!("Format {:?} rejected: {}", wire, e);
                last = Some(e.to_string());
            }
        }
    }

    let message = last.unwrap_or_else(|| "no capture format accepted".to_string());
    let lower = message.to_lowercase();
    if PERMISSION_HINTS.iter().any(|hint| lower.contains(hint)) {
        Err(CameraError::PermissionDenied)
    } else {
        Err(CameraError::OpenFailed(message))
    }
}
