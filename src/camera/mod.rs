//! Frame sources: the live camera and still images.
//!
//! - Device enumeration via [`list_devices`]
//! - Camera capture via [`CameraCapture`]
//! - Still images via [`StillImage`]
//! - The [`FrameSource`] trait the renderer pulls from

mod capture;
mod device;
mod frame_utils;
mod source;
mod still;
mod types;
mod worker;

pub use capture::CameraCapture;
pub use device::list_devices;
pub use frame_utils::mirror_horizontal;
pub use source::{FrameSource, SourceStatus};
pub use still::StillImage;
pub use worker::StreamInfo;
pub use types::{CameraError, CameraDevice, CameraSettings, Frame, FrameFormat, Resolution};
