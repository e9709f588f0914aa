//! Configuration file handling for asciicam.
//!
//! Loads configuration from `<config dir>/asciicam/config.toml` or a custom path.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::ascii::{
    DensityPalette, GlyphMapper, GlyphPolicy, Orientation, PaletteError, DEFAULT_THRESHOLD,
};
use crate::camera::{CameraSettings, Resolution};
use crate::printer::{LineConfig, DEFAULT_BAUD_RATE, DEFAULT_MIN_LENGTH};
use crate::renderer::{RenderError, RenderOptions};

/// Ticks per second when no refresh rate is configured.
pub const DEFAULT_REFRESH_HZ: u32 = 30;

/// Highest accepted tick rate.
pub const MAX_REFRESH_HZ: u32 = 1000;

/// Configuration file structure.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub printer: PrinterConfig,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct CameraConfig {
    #[serde(default)]
    pub device: u32,
    #[serde(default)]
    pub mirror: bool,
    /// `WIDTHxHEIGHT`
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub exposure: Option<i64>,
    #[serde(default)]
    pub contrast: Option<i64>,
}

/// Glyph policy selector.
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    #[default]
    Density,
    Threshold,
}

impl RenderMode {
    pub fn name(&self) -> &'static str {
        match self {
            RenderMode::Density => "density",
            RenderMode::Threshold => "threshold",
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrientationConfig {
    Straight,
    Transposed,
}

impl From<OrientationConfig> for Orientation {
    fn from(o: OrientationConfig) -> Self {
        match o {
            OrientationConfig::Straight => Orientation::Straight,
            OrientationConfig::Transposed => Orientation::Transposed,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct RenderConfig {
    #[serde(default)]
    pub mode: RenderMode,
    /// Defaults to 48 (density) or 64 (threshold)
    #[serde(default)]
    pub width: Option<u16>,
    #[serde(default)]
    pub height: Option<u16>,
    /// Brightest-first glyphs
    #[serde(default)]
    pub palette: Option<String>,
    #[serde(default)]
    pub threshold: Option<u8>,
    /// Defaults to straight (density) or transposed (threshold)
    #[serde(default)]
    pub orientation: Option<OrientationConfig>,
    #[serde(default)]
    pub invert: bool,
    #[serde(default)]
    pub refresh_hz: Option<u32>,
}

/// How the printer port is driven.
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PortKind {
    #[default]
    Serial,
    File,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PrinterConfig {
    #[serde(default)]
    pub port: Option<String>,
    #[serde(default)]
    pub kind: PortKind,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    #[serde(default = "default_min_length")]
    pub min_length: usize,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            port: None,
            kind: PortKind::default(),
            baud_rate: DEFAULT_BAUD_RATE,
            min_length: DEFAULT_MIN_LENGTH,
        }
    }
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_min_length() -> usize {
    DEFAULT_MIN_LENGTH
}

/// Printer settings after defaults are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterSettings {
    pub port: Option<String>,
    pub kind: PortKind,
    pub line: LineConfig,
    pub min_length: usize,
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?;
            toml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.clone(),
                source: e,
            })
        } else {
            Ok(Config::default())
        }
    }

    pub fn camera_settings(&self) -> Result<CameraSettings, ConfigError> {
        let resolution = match self.camera.resolution.as_deref() {
            Some(s) => parse_resolution(s).map_err(ConfigError::Invalid)?,
            None => Resolution::default(),
        };
        Ok(CameraSettings {
            device_index: self.camera.device,
            resolution,
            mirror: self.camera.mirror,
            exposure: self.camera.exposure,
            contrast: self.camera.contrast,
            ..CameraSettings::default()
        })
    }

    /// Build render options, filling unset values from the mode's preset.
    pub fn render_options(&self) -> Result<RenderOptions, ConfigError> {
        let render = &self.render;
        let preset = match render.mode {
            RenderMode::Density => RenderOptions::density(),
            RenderMode::Threshold => RenderOptions::threshold(),
        };

        let policy = match render.mode {
            RenderMode::Density => {
                let palette = match render.palette.as_deref() {
                    Some(p) => DensityPalette::parse(p)?,
                    None => DensityPalette::default(),
                };
                GlyphPolicy::Density(palette)
            }
            RenderMode::Threshold => {
                GlyphPolicy::Threshold(render.threshold.unwrap_or(DEFAULT_THRESHOLD))
            }
        };
        let orientation = render
            .orientation
            .map(Orientation::from)
            .unwrap_or(preset.mapper().orientation);

        let mapper = GlyphMapper::new(policy, orientation).with_invert(render.invert);
        Ok(RenderOptions::new(
            render.width.unwrap_or(preset.width()),
            render.height.unwrap_or(preset.height()),
            mapper,
        )?)
    }

    /// Ticks per second; unset or 0 means the default.
    pub fn refresh_hz(&self) -> Result<u32, ConfigError> {
        match self.render.refresh_hz {
            None | Some(0) => Ok(DEFAULT_REFRESH_HZ),
            Some(hz) if hz <= MAX_REFRESH_HZ => Ok(hz),
            Some(hz) => Err(ConfigError::Invalid(format!(
                "refresh_hz {} is out of range (1-{})",
                hz, MAX_REFRESH_HZ
            ))),
        }
    }

    pub fn printer_settings(&self) -> PrinterSettings {
        PrinterSettings {
            port: self.printer.port.clone(),
            kind: self.printer.kind,
            line: LineConfig {
                baud_rate: self.printer.baud_rate,
            },
            min_length: self.printer.min_length,
        }
    }
}

/// Parse and validate a `WIDTHxHEIGHT` resolution.
pub fn parse_resolution(s: &str) -> Result<Resolution, String> {
    let Some((w, h)) = s.split_once('x') else {
        return Err(format!(
            "Invalid resolution format '{}'. Use WIDTHxHEIGHT (e.g., 640x480)",
            s
        ));
    };
    let width: u32 = w
        .trim()
        .parse()
        .map_err(|_| format!("Invalid width '{}' in resolution", w))?;
    let height: u32 = h
        .trim()
        .parse()
        .map_err(|_| format!("Invalid height '{}' in resolution", h))?;
    if width == 0 || height == 0 {
        return Err("Resolution width and height must be greater than 0".to_string());
    }
    Ok(Resolution { width, height })
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid palette: {0}")]
    Palette(#[from] PaletteError),

    #[error("Invalid render size: {0}")]
    Render(#[from] RenderError),

    #[error("{0}")]
    Invalid(String),
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("asciicam").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/asciicam/config.toml")
        })
}

/// Contents written by `config init`.
pub const DEFAULT_CONFIG: &str = r#"# asciicam configuration

[camera]
# Camera device index (see `asciicam list-cameras`)
device = 0
# Mirror horizontally (selfie view)
mirror = false
# Requested capture resolution
resolution = "640x480"
# Device-specific exposure and contrast values (unset = device default)
# exposure = 100
# contrast = 50

[render]
# density: 8-level palette, threshold: two-level cut
mode = "density"
# Sampled grid size (default 48x32 for density, 64x32 for threshold)
# width = 48
# height = 32
# Glyphs from brightest pixel to darkest
palette = "@G*POo. "
# Cutoff for threshold mode; pixels at or below it print as '*'
threshold = 128
# straight, or transposed for narrow receipt paper
# (default straight for density, transposed for threshold)
# orientation = "straight"
invert = false
# Frames rendered per second
refresh_hz = 30

[printer]
# Serial port or device file, e.g. "/dev/ttyUSB0", "COM3", "/dev/usb/lp0"
# port = "/dev/ttyUSB0"
# serial or file
kind = "serial"
baud_rate = 9600
# Minimum display length, in characters, worth printing
min_length = 50
"#;
