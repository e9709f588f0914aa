mod cli;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use asciicam::app::{self, LiveSession};
use asciicam::config::{self, Config};
use cli::{Args, Command};

/// Logs go to stderr so they never mix with rendered text on stdout.
fn init_logging(verbose: bool) {
    let default = if verbose { "asciicam=debug" } else { "asciicam=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Load the config. An explicit `--config` path must exist (except for
/// `config` actions); a missing or broken default file falls back to
/// built-in settings.
fn load_config(args: &Args) -> Result<Config, String> {
    let managing = matches!(args.command, Some(Command::Config { .. }));
    let mut cfg = match &args.config {
        Some(path) => {
            if !path.exists() && !managing {
                return Err(format!("Config file not found: {}", path.display()));
            }
            Config::load(Some(path)).map_err(|e| e.to_string())?
        }
        None => match Config::load(None) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Failed to load config file: {}", e);
                log::warn!("Using default settings.");
                Config::default()
            }
        },
    };
    args.apply(&mut cfg);
    Ok(cfg)
}

async fn run(args: Args) -> Result<(), String> {
    let cfg = load_config(&args)?;

    match args.command {
        Some(Command::ListCameras) => cli::list_cameras(),
        Some(Command::ListPorts) => cli::list_ports(),
        Some(Command::Config { action }) => {
            let path = args.config.clone().unwrap_or_else(config::default_path);
            cli::handle_config_action(action, &cfg, &path)
        }
        Some(Command::Render { image, print }) => {
            let options = cfg.render_options().map_err(|e| e.to_string())?;
            let printer = if print {
                Some(
                    app::build_printer(&cfg.printer_settings())
                        .ok_or_else(|| app::AppError::NoPrinter.to_string())?,
                )
            } else {
                None
            };
            let text = app::render_still(&image, options, printer.as_ref())
                .await
                .map_err(|e| e.to_string())?;
            print!("{}", text);
            Ok(())
        }
        Some(Command::Run) | None => {
            let session = LiveSession {
                camera: cfg.camera_settings().map_err(|e| e.to_string())?,
                render: cfg.render_options().map_err(|e| e.to_string())?,
                refresh_hz: cfg.refresh_hz().map_err(|e| e.to_string())?,
                printer: cfg.printer_settings(),
            };
            log::info!(
                "Starting camera {} at {}, {} mode, {} Hz",
                session.camera.device_index,
                session.camera.resolution,
                session.render.mapper().policy.name(),
                session.refresh_hz
            );
            app::run_live(session).await.map_err(|e| e.to_string())
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
