//! Live camera as a [`FrameSource`].

use std::sync::atomic::Ordering;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;

use super::device::list_devices;
use super::source::{FrameSource, SourceStatus};
use super::types::{CameraError, CameraSettings, Frame};
use super::worker::{self, StreamInfo, StreamShared};

/// A camera streaming on its own thread.
///
/// The worker keeps only the newest decoded frame, so [`FrameSource::grab`]
/// never waits for the device. Status is Paused until `start()`, Live while
/// streaming, and Ended once stopped or the device goes away.
pub struct CameraCapture {
    settings: CameraSettings,
    shared: Arc<StreamShared>,
    worker: Option<JoinHandle<()>>,
    info: Option<StreamInfo>,
}

impl std::fmt::Debug for CameraCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraCapture")
            .field("device", &self.settings.device_index)
            .field("status", &self.shared.status())
            .field("info", &self.info)
            .finish()
    }
}

impl CameraCapture {
    /// Check the device index against what the backend reports.
    ///
    /// Nothing is opened until [`CameraCapture::start`].
    pub fn open(settings: CameraSettings) -> Result<Self, CameraError> {
        let devices = list_devices()?;
        if devices.is_empty() {
            return Err(CameraError::NoDevices);
        }
        if devices.iter().all(|d| d.index != settings.device_index) {
            return Err(CameraError::DeviceNotFound(settings.device_index));
        }

        Ok(Self {
            settings,
            shared: Arc::new(StreamShared::new()),
            worker: None,
            info: None,
        })
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    /// Format negotiated by the last successful `start()`.
    pub fn stream_info(&self) -> Option<StreamInfo> {
        self.info
    }

    /// Open the device on a worker thread and wait until it streams.
    pub fn start(&mut self) -> Result<(), CameraError> {
        if self.worker.as_ref().is_some_and(|w| !w.is_finished()) {
            return Err(CameraError::AlreadyRunning);
        }
        self.join_worker();

        // A restart gets a fresh stream; the old one may have ended
        self.shared = Arc::new(StreamShared::new());
        let shared = Arc::clone(&self.shared);
        let settings = self.settings.clone();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);

        self.worker = Some(std::thread::spawn(move || {
            worker::run(settings, &shared, ready_tx);
        }));

        match ready_rx.recv() {
            Ok(Ok(info)) => {
                log::info!(
                    "Camera {} streaming at {} ({} fps)",
                    self.settings.device_index,
                    info.resolution,
                    info.fps
                );
                self.info = Some(info);
                Ok(())
            }
            Ok(Err(e)) => {
                self.join_worker();
                Err(e)
            }
            Err(_) => {
                self.join_worker();
                Err(CameraError::StreamFailed(
                    "capture thread exited before the stream opened".to_string(),
                ))
            }
        }
    }

    /// Stop grabbing without releasing the device.
    pub fn pause(&self) -> bool {
        self.shared.toggle_pause(true)
    }

    pub fn resume(&self) -> bool {
        self.shared.toggle_pause(false)
    }

    /// Release the device. The source reports Ended afterwards.
    pub fn stop(&mut self) {
        if self.worker.is_some() {
            self.join_worker();
            log::info!("Camera {} released", self.settings.device_index);
        }
    }

    fn join_worker(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        self.shared.shutdown.store(true, Ordering::Release);
        if worker.join().is_err() {
            log::warn!("Camera thread panicked");
        }
        self.shared.set_status(SourceStatus::Ended);
    }

    /// Newest decoded frame, if one has arrived.
    pub fn latest_frame(&self) -> Option<Frame> {
        self.shared.latest.lock().ok()?.clone()
    }
}

impl FrameSource for CameraCapture {
    fn status(&self) -> SourceStatus {
        self.shared.status()
    }

    fn grab(&mut self) -> Result<Frame, CameraError> {
        self.latest_frame().ok_or(CameraError::NoFrame)
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        self.stop();
    }
}
