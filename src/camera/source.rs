//! The capture-side seam the renderer pulls frames through.

use super::types::{CameraError, Frame};

/// Playback state reported by a frame source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStatus {
    /// Frames can be pulled
    Live,
    /// Temporarily not producing frames
    Paused,
    /// Will never produce another frame
    Ended,
}

impl SourceStatus {
    /// True when the renderer should stop pulling from this source.
    pub fn is_halted(&self) -> bool {
        !matches!(self, SourceStatus::Live)
    }
}

/// Anything that can hand out bitmap frames on demand.
pub trait FrameSource: Send {
    /// Current playback state.
    fn status(&self) -> SourceStatus;

    /// Pull the most recent frame.
    fn grab(&mut self) -> Result<Frame, CameraError>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn status(&self) -> SourceStatus {
        (**self).status()
    }

    fn grab(&mut self) -> Result<Frame, CameraError> {
        (**self).grab()
    }
}
