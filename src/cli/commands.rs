//! Subcommand handlers for list-cameras, list-ports and config actions.

use std::path::Path;

use super::args::ConfigAction;
use asciicam::camera;
use asciicam::config::{Config, DEFAULT_CONFIG};
use asciicam::printer;

/// List available cameras and print them to stdout.
pub fn list_cameras() -> Result<(), String> {
    let devices = camera::list_devices().map_err(|e| e.to_string())?;
    if devices.is_empty() {
        println!("No cameras found.");
        println!();
        println!("Make sure your camera is connected and permissions are granted.");
        println!("On macOS, grant access in System Settings > Privacy & Security > Camera.");
    } else {
        println!("Available cameras:");
        for device in devices {
            println!("  {}", device);
        }
        println!();
        println!("Use --camera <index> to select a camera.");
    }
    Ok(())
}

/// List serial ports a printer could be attached to.
pub fn list_ports() -> Result<(), String> {
    let ports = printer::list_ports().map_err(|e| e.to_string())?;
    if ports.is_empty() {
        println!("No serial ports found.");
        println!();
        println!("USB line printers may appear as a device file instead (e.g. /dev/usb/lp0);");
        println!("use --printer <path> --printer-kind file for those.");
    } else {
        println!("Available serial ports:");
        for port in ports {
            println!("  {}", port.port_name);
        }
        println!();
        println!("Use --printer <port> to select a printer.");
    }
    Ok(())
}

/// Handle config subcommand actions.
pub fn handle_config_action(
    action: ConfigAction,
    config: &Config,
    config_path: &Path,
) -> Result<(), String> {
    match action {
        ConfigAction::Show => {
            println!("Current configuration:");
            print!("{}", describe(config));
            println!();
            if config_path.exists() {
                println!("Config file: {} (exists)", config_path.display());
            } else {
                println!("Config file: {} (not found)", config_path.display());
            }
            Ok(())
        }
        ConfigAction::Init => {
            if config_path.exists() {
                return Err(format!(
                    "Config file already exists: {}\nUse 'asciicam config show' to view current settings.",
                    config_path.display()
                ));
            }

            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| format!("Error creating config directory: {}", e))?;
            }
            std::fs::write(config_path, DEFAULT_CONFIG)
                .map_err(|e| format!("Error writing config file: {}", e))?;

            println!("Created config file: {}", config_path.display());
            Ok(())
        }
    }
}

/// Effective settings, one per line.
fn describe(config: &Config) -> String {
    let mut out = String::new();
    let camera = match config.camera_settings() {
        Ok(c) => c,
        Err(e) => return format!("  Invalid camera settings: {}\n", e),
    };
    out.push_str(&format!("  Camera: {}\n", camera.device_index));
    out.push_str(&format!("  Resolution: {}\n", camera.resolution));
    out.push_str(&format!(
        "  Mirror: {}\n",
        if camera.mirror { "yes" } else { "no" }
    ));

    match config.render_options() {
        Ok(options) => {
            let mapper = options.mapper();
            out.push_str(&format!("  Mode: {}\n", mapper.policy.name()));
            out.push_str(&format!(
                "  Grid: {}x{}\n",
                options.width(),
                options.height()
            ));
            out.push_str(&format!("  Orientation: {}\n", mapper.orientation.name()));
            out.push_str(&format!(
                "  Invert: {}\n",
                if mapper.invert { "yes" } else { "no" }
            ));
        }
        Err(e) => out.push_str(&format!("  Invalid render settings: {}\n", e)),
    }
    match config.refresh_hz() {
        Ok(hz) => out.push_str(&format!("  Refresh: {} Hz\n", hz)),
        Err(e) => out.push_str(&format!("  Invalid refresh rate: {}\n", e)),
    }

    let printer = config.printer_settings();
    match printer.port {
        Some(port) => out.push_str(&format!(
            "  Printer: {} ({:?}, {} baud)\n",
            port, printer.kind, printer.line.baud_rate
        )),
        None => out.push_str("  Printer: none\n"),
    }
    out
}
