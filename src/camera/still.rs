//! Still-image frame source backed by the `image` crate.

use std::path::Path;

use super::source::{FrameSource, SourceStatus};
use super::types::{CameraError, Frame};

/// Serves a single decoded image as a frame, forever.
#[derive(Debug, Clone)]
pub struct StillImage {
    frame: Frame,
}

impl StillImage {
    /// Decode an image file (any format `image` understands) into RGBA.
    pub fn open(path: &Path) -> Result<Self, CameraError> {
        let decoded = image::open(path).map_err(|e| CameraError::ImageLoad {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self::from_frame(Frame::from_rgba(rgba.into_raw(), width, height)))
    }

    pub fn from_frame(frame: Frame) -> Self {
        Self { frame }
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }
}

impl FrameSource for StillImage {
    fn status(&self) -> SourceStatus {
        SourceStatus::Live
    }

    fn grab(&mut self) -> Result<Frame, CameraError> {
        Ok(self.frame.clone())
    }
}
