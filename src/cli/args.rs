//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::enums::{Layout, Mode, PortType};
use asciicam::config::{parse_resolution, Config};

/// Live webcam to ASCII art, with a receipt printer on the side
#[derive(Parser, Debug)]
#[command(name = "asciicam")]
#[command(version, about = "Render a webcam as ASCII art and print it on a receipt printer", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Camera device index (from list-cameras)
    #[arg(long)]
    pub camera: Option<u32>,

    /// Glyph mode
    #[arg(long, short)]
    pub mode: Option<Mode>,

    /// Sampled grid width
    #[arg(long)]
    pub width: Option<u16>,

    /// Sampled grid height
    #[arg(long)]
    pub height: Option<u16>,

    /// Density glyphs, brightest first
    #[arg(long)]
    pub palette: Option<String>,

    /// Threshold cutoff (0-255)
    #[arg(long, short)]
    pub threshold: Option<u8>,

    /// Text orientation
    #[arg(long, short)]
    pub orientation: Option<Layout>,

    /// Invert brightness (for light terminals)
    #[arg(long)]
    pub invert: bool,

    /// Mirror camera horizontally
    #[arg(long)]
    pub mirror: bool,

    /// Requested capture resolution (WIDTHxHEIGHT)
    #[arg(long, value_parser = validate_resolution)]
    pub resolution: Option<String>,

    /// Frames rendered per second
    #[arg(long)]
    pub fps: Option<u32>,

    /// Printer serial port or device file
    #[arg(long, short)]
    pub printer: Option<String>,

    /// How to open the printer port
    #[arg(long)]
    pub printer_kind: Option<PortType>,

    /// Serial baud rate
    #[arg(long)]
    pub baud: Option<u32>,

    /// Config file path
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(long, short)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Live camera view (the default)
    Run,
    /// Render an image file once
    Render {
        /// Image to render (PNG, JPEG, ...)
        image: PathBuf,
        /// Also send the result to the printer
        #[arg(long)]
        print: bool,
    },
    /// List available cameras
    ListCameras,
    /// List serial ports
    ListPorts,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Create default config file
    Init,
}

fn validate_resolution(s: &str) -> Result<String, String> {
    parse_resolution(s).map(|_| s.to_string())
}

impl Args {
    /// Overlay command-line flags onto a loaded config.
    ///
    /// Flags win over the file; unset flags leave it alone.
    pub fn apply(&self, config: &mut Config) {
        if let Some(camera) = self.camera {
            config.camera.device = camera;
        }
        if self.mirror {
            config.camera.mirror = true;
        }
        if let Some(resolution) = &self.resolution {
            config.camera.resolution = Some(resolution.clone());
        }

        let render = &mut config.render;
        if let Some(mode) = self.mode {
            render.mode = mode.into();
        }
        if let Some(width) = self.width {
            render.width = Some(width);
        }
        if let Some(height) = self.height {
            render.height = Some(height);
        }
        if let Some(palette) = &self.palette {
            render.palette = Some(palette.clone());
        }
        if let Some(threshold) = self.threshold {
            render.threshold = Some(threshold);
        }
        if let Some(orientation) = self.orientation {
            render.orientation = Some(orientation.into());
        }
        if self.invert {
            render.invert = true;
        }
        if let Some(fps) = self.fps {
            render.refresh_hz = Some(fps);
        }

        if let Some(port) = &self.printer {
            config.printer.port = Some(port.clone());
        }
        if let Some(kind) = self.printer_kind {
            config.printer.kind = kind.into();
        }
        if let Some(baud) = self.baud {
            config.printer.baud_rate = baud;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asciicam::config::{OrientationConfig, PortKind, RenderMode};
    use asciicam::renderer::RenderOptions;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["asciicam"]);
        assert!(args.command.is_none());
        assert!(args.camera.is_none());
        assert!(args.mode.is_none());
        assert!(!args.mirror);
        assert!(!args.invert);
        assert!(!args.verbose);
        assert!(args.printer.is_none());
        assert!(args.config.is_none());
    }

    #[test]
    fn test_defaults_leave_config_untouched() {
        let args = Args::parse_from(["asciicam"]);
        let mut config = Config::default();
        args.apply(&mut config);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_threshold_mode_flags() {
        let args = Args::parse_from(["asciicam", "-m", "threshold", "-t", "90"]);
        let mut config = Config::default();
        args.apply(&mut config);
        assert_eq!(config.render.mode, RenderMode::Threshold);
        assert_eq!(config.render.threshold, Some(90));

        let options = config.render_options().unwrap();
        assert_eq!(options.width(), RenderOptions::threshold().width());
    }

    #[test]
    fn test_orientation_and_size_flags() {
        let args = Args::parse_from([
            "asciicam",
            "--orientation",
            "transposed",
            "--width",
            "20",
            "--height",
            "10",
        ]);
        let mut config = Config::default();
        args.apply(&mut config);
        assert_eq!(
            config.render.orientation,
            Some(OrientationConfig::Transposed)
        );
        assert_eq!(config.render.width, Some(20));
        assert_eq!(config.render.height, Some(10));
    }

    #[test]
    fn test_printer_flags() {
        let args = Args::parse_from([
            "asciicam",
            "-p",
            "/dev/usb/lp0",
            "--printer-kind",
            "file",
            "--baud",
            "19200",
        ]);
        let mut config = Config::default();
        args.apply(&mut config);
        let settings = config.printer_settings();
        assert_eq!(settings.port.as_deref(), Some("/dev/usb/lp0"));
        assert_eq!(settings.kind, PortKind::File);
        assert_eq!(settings.line.baud_rate, 19200);
    }

    #[test]
    fn test_flags_override_file_values() {
        let mut config: Config = toml::from_str(
            r#"
            [camera]
            device = 3
            [render]
            invert = false
            "#,
        )
        .unwrap();
        let args = Args::parse_from(["asciicam", "--camera", "1", "--invert", "--mirror"]);
        args.apply(&mut config);
        assert_eq!(config.camera.device, 1);
        assert!(config.camera.mirror);
        assert!(config.render.invert);
    }

    #[test]
    fn test_resolution_validated() {
        assert!(Args::try_parse_from(["asciicam", "--resolution", "640x480"]).is_ok());
        assert!(Args::try_parse_from(["asciicam", "--resolution", "640"]).is_err());
        assert!(Args::try_parse_from(["asciicam", "--resolution", "0x480"]).is_err());
    }

    #[test]
    fn test_render_subcommand() {
        let args = Args::parse_from(["asciicam", "render", "cat.png", "--print"]);
        match args.command {
            Some(Command::Render { image, print }) => {
                assert_eq!(image, PathBuf::from("cat.png"));
                assert!(print);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_list_subcommands() {
        let args = Args::parse_from(["asciicam", "list-cameras"]);
        assert!(matches!(args.command, Some(Command::ListCameras)));
        let args = Args::parse_from(["asciicam", "list-ports"]);
        assert!(matches!(args.command, Some(Command::ListPorts)));
    }

    #[test]
    fn test_config_subcommands() {
        let args = Args::parse_from(["asciicam", "config", "init"]);
        assert!(matches!(
            args.command,
            Some(Command::Config {
                action: ConfigAction::Init
            })
        ));
        let args = Args::parse_from(["asciicam", "config", "show"]);
        assert!(matches!(
            args.command,
            Some(Command::Config {
                action: ConfigAction::Show
            })
        ));
    }
}
