//! CLI enum types for render mode, orientation, and printer port kind.

use clap::ValueEnum;

use asciicam::config::{OrientationConfig, PortKind, RenderMode};

/// Glyph policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Mode {
    /// Multi-level palette, one glyph per brightness band
    #[default]
    Density,
    /// Two glyphs split at a brightness cutoff
    Threshold,
}

impl From<Mode> for RenderMode {
    fn from(m: Mode) -> Self {
        match m {
            Mode::Density => RenderMode::Density,
            Mode::Threshold => RenderMode::Threshold,
        }
    }
}

/// Text orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Layout {
    Straight,
    /// Columns become lines, for narrow receipt paper
    Transposed,
}

impl From<Layout> for OrientationConfig {
    fn from(l: Layout) -> Self {
        match l {
            Layout::Straight => OrientationConfig::Straight,
            Layout::Transposed => OrientationConfig::Transposed,
        }
    }
}

/// How the printer port is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PortType {
    Serial,
    /// Device node or plain file, written as-is
    File,
}

impl From<PortType> for PortKind {
    fn from(p: PortType) -> Self {
        match p {
            PortType::Serial => PortKind::Serial,
            PortType::File => PortKind::File,
        }
    }
}
