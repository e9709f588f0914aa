//! Frames, capture settings and camera errors.

use std::fmt;
use std::time::{Duration, Instant};

/// A capture device as reported by the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    /// Value for `--camera` / `[camera] device`
    pub index: u32,
    pub name: String,
    /// Backend-specific detail (driver, bus path, ...)
    pub description: String,
}

impl fmt::Display for CameraDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.description.is_empty() {
            write!(f, "{}: {}", self.index, self.name)
        } else {
            write!(f, "{}: {} - {}", self.index, self.name, self.description)
        }
    }
}

/// Capture size requested from a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const QVGA: Resolution = Resolution::new(320, 240);
    /// Requested by default; plenty for a 64x32 grid.
    pub const VGA: Resolution = Resolution::new(640, 480);

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::VGA
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Pixel layout of a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    /// 3 bytes per pixel
    Rgb,
    /// 4 bytes per pixel, alpha ignored by the sampler
    Rgba,
}

/// An immutable bitmap snapshot produced by a frame source.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Row-major pixels, `bytes_per_pixel()` bytes each
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: FrameFormat,
    pub timestamp: Instant,
}

impl Frame {
    /// Wrap packed RGB pixel data.
    pub fn from_rgb(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
            format: FrameFormat::Rgb,
            timestamp: Instant::now(),
        }
    }

    /// Wrap packed RGBA pixel data.
    pub fn from_rgba(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
            format: FrameFormat::Rgba,
            timestamp: Instant::now(),
        }
    }

    /// A frame where every pixel has the same color.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = (width as usize) * (height as usize);
        let data = rgb.iter().copied().cycle().take(pixels * 3).collect();
        Self::from_rgb(data, width, height)
    }

    pub fn bytes_per_pixel(&self) -> usize {
        match self.format {
            FrameFormat::Rgb => 3,
            FrameFormat::Rgba => 4,
        }
    }

    /// Red, green and blue of the pixel at `(x, y)`, or `None` when the
    /// coordinate falls outside the pixel data.
    ///
    /// RGBA pixels are composited over black, so a fully transparent pixel
    /// reads as `[0, 0, 0]` whatever color it hides.
    pub fn rgb_at(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = self.bytes_per_pixel();
        let idx = (y as usize * self.width as usize + x as usize) * bpp;
        let px = self.data.get(idx..idx + bpp)?;
        match self.format {
            FrameFormat::Rgb => Some([px[0], px[1], px[2]]),
            FrameFormat::Rgba => {
                let alpha = px[3] as u16;
                let over_black = |c: u8| ((c as u16 * alpha + 127) / 255) as u8;
                Some([over_black(px[0]), over_black(px[1]), over_black(px[2])])
            }
        }
    }

    /// Time since the frame was captured or decoded.
    pub fn age(&self) -> Duration {
        self.timestamp.elapsed()
    }
}

/// What to open and how to adjust it.
#[derive(Debug, Clone)]
pub struct CameraSettings {
    pub device_index: u32,
    /// The device may pick the closest size it supports
    pub resolution: Resolution,
    pub fps: u32,
    /// Flip each frame left-to-right before sampling
    pub mirror: bool,
    /// Exposure control value, device-specific units
    pub exposure: Option<i64>,
    /// Contrast control value, device-specific units
    pub contrast: Option<i64>,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            device_index: 0,
            resolution: Resolution::VGA,
            fps: 30,
            mirror: false,
            exposure: None,
            contrast: None,
        }
    }
}

/// Why a frame source could not be opened or read.
#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    #[error("No capture devices detected")]
    NoDevices,

    #[error("Failed to query cameras: {0}")]
    QueryFailed(String),

    #[error("Could not open camera: {0}")]
    OpenFailed(String),

    #[error(
        "Camera permission denied. Grant camera access to this terminal in your system privacy settings"
    )]
    PermissionDenied,

    #[error("Camera device {0} not found. Run 'list-cameras' to see available devices")]
    DeviceNotFound(u32),

    #[error("Failed to start camera stream: {0}")]
    StreamFailed(String),

    #[error("Camera is already streaming")]
    AlreadyRunning,

    #[error("No frame available yet")]
    NoFrame,

    #[error("Failed to load image '{path}': {message}")]
    ImageLoad { path: String, message: String },
}
