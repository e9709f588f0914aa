//! The interactive session: camera -> renderer -> terminal, plus printing.
//!
//! Operator commands arrive one per line on stdin, read on a dedicated
//! thread so the render loop never blocks on input.

use std::io::BufRead;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::camera::{
    CameraCapture, CameraError, CameraSettings, FrameSource, SourceStatus, StillImage,
};
use crate::config::{ConfigError, PortKind, PrinterSettings};
use crate::display::{DisplaySink, TerminalDisplay, TextBuffer};
use crate::printer::{FileOutput, PrintError, Printer, PrinterPort, SerialOutput};
use crate::renderer::{FramePipeline, FrameRenderer, RenderOptions, SharedSource};
use crate::scheduler::{IntervalScheduler, SchedulerError};

/// Errors that end a session.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Camera(#[from] CameraError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Print(#[from] PrintError),

    #[error("No printer port configured. Set [printer] port in the config file or pass --printer")]
    NoPrinter,

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// A command typed by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    /// Send the current frame to the printer
    Print,
    /// Start or stop conversion
    Toggle,
    Connect,
    Disconnect,
    Help,
    Quit,
}

/// Parse one line of operator input. Blank or unknown input yields `None`.
pub fn parse_command(input: &str) -> Option<OperatorCommand> {
    match input.trim().to_lowercase().as_str() {
        "p" | "print" => Some(OperatorCommand::Print),
        "s" | "toggle" => Some(OperatorCommand::Toggle),
        "c" | "connect" => Some(OperatorCommand::Connect),
        "d" | "disconnect" => Some(OperatorCommand::Disconnect),
        "h" | "?" | "help" => Some(OperatorCommand::Help),
        "q" | "quit" | "exit" => Some(OperatorCommand::Quit),
        _ => None,
    }
}

pub const HELP: &str = "commands: p=print  s=start/stop  c=connect printer  d=disconnect  q=quit";

/// Read stdin lines on a background thread and forward parsed commands.
pub fn spawn_command_listener() -> mpsc::UnboundedReceiver<OperatorCommand> {
    let (tx, rx) = mpsc::unbounded_channel();

    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(input) = line else { break };
            match parse_command(&input) {
                Some(cmd) => {
                    if tx.send(cmd).is_err() {
                        break;
                    }
                }
                None if input.trim().is_empty() => {}
                None => eprintln!("Unknown command '{}'. {}", input.trim(), HELP),
            }
        }
    });

    rx
}

/// Global flag for handling Ctrl+C
static CTRLC_RECEIVED: AtomicBool = AtomicBool::new(false);

pub fn ctrlc_received() -> bool {
    CTRLC_RECEIVED.load(Ordering::SeqCst)
}

/// Set up the Ctrl+C handler. Call once at startup.
pub fn setup_ctrlc_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        CTRLC_RECEIVED.store(true, Ordering::SeqCst);
    })
}

/// Build the configured printer, if a port is set.
pub fn build_printer(settings: &PrinterSettings) -> Option<Printer<PrinterPort>> {
    let port = settings.port.as_deref()?;
    let sink = match settings.kind {
        PortKind::Serial => PrinterPort::Serial(SerialOutput::new(port)),
        PortKind::File => PrinterPort::File(FileOutput::new(port)),
    };
    Some(
        Printer::new(sink)
            .with_line_config(settings.line)
            .with_min_length(settings.min_length),
    )
}

/// Everything the live session needs.
#[derive(Debug, Clone)]
pub struct LiveSession {
    pub camera: CameraSettings,
    pub render: RenderOptions,
    pub refresh_hz: u32,
    pub printer: PrinterSettings,
}

/// Run the live camera session until `q`, Ctrl+C or camera loss.
pub async fn run_live(session: LiveSession) -> Result<(), AppError> {
    if let Err(e) = setup_ctrlc_handler() {
        log::warn!("Could not set up Ctrl+C handler: {}", e);
    }

    let mut camera = CameraCapture::open(session.camera.clone())?;
    camera.start()?;
    let camera = Arc::new(Mutex::new(camera));
    let source: SharedSource = camera.clone();

    let display = Arc::new(TerminalDisplay::new());
    let display_sink: Arc<dyn DisplaySink> = display.clone();

    let printer = build_printer(&session.printer).map(Arc::new);
    if let Some(printer) = &printer {
        if let Err(e) = printer.connect().await {
            log::warn!("{}", e);
        }
    }

    let mut renderer = FrameRenderer::new(IntervalScheduler::from_hz(session.refresh_hz)?);
    renderer.start(source.clone(), display_sink.clone(), session.render.clone());

    let mut commands = spawn_command_listener();
    let mut input_open = true;
    let mut in_flight: Option<JoinHandle<bool>> = None;
    let mut poll = tokio::time::interval(Duration::from_millis(100));

    eprintln!("{}", HELP);

    loop {
        tokio::select! {
            cmd = commands.recv(), if input_open => {
                let Some(cmd) = cmd else {
                    // stdin closed; keep rendering until Ctrl+C
                    input_open = false;
                    continue;
                };
                match cmd {
                    OperatorCommand::Print => match &printer {
                        Some(printer) => {
                            let printer = Arc::clone(printer);
                            let display = Arc::clone(&display_sink);
                            in_flight = Some(tokio::spawn(async move {
                                printer.print_current_display(&*display).await
                            }));
                        }
                        None => log::warn!("{}", AppError::NoPrinter),
                    },
                    OperatorCommand::Toggle => {
                        if renderer.is_running() {
                            renderer.stop();
                            if let Ok(camera) = camera.lock() {
                                camera.pause();
                            }
                        } else {
                            if let Ok(camera) = camera.lock() {
                                camera.resume();
                            }
                            renderer.start(
                                source.clone(),
                                display_sink.clone(),
                                session.render.clone(),
                            );
                        }
                    }
                    OperatorCommand::Connect => match &printer {
                        Some(printer) => match printer.connect().await {
                            Ok(()) => {}
                            Err(e) => log::warn!("{}", e),
                        },
                        None => log::warn!("{}", AppError::NoPrinter),
                    },
                    OperatorCommand::Disconnect => {
                        if let Some(printer) = &printer {
                            printer.disconnect().await;
                        }
                    }
                    OperatorCommand::Help => eprintln!("{}", HELP),
                    OperatorCommand::Quit => break,
                }
            }
            _ = poll.tick() => {
                if ctrlc_received() {
                    break;
                }
                let ended = camera
                    .lock()
                    .map(|c| c.status() == SourceStatus::Ended)
                    .unwrap_or(true);
                if ended {
                    log::warn!("Camera stream ended");
                    break;
                }
            }
        }
    }

    renderer.stop();
    // An in-flight job runs to completion before the port closes
    if let Some(job) = in_flight.take() {
        let _ = job.await;
    }
    if let Some(printer) = &printer {
        printer.disconnect().await;
    }
    if let Ok(mut camera) = camera.lock() {
        camera.stop();
    }
    display.release();
    Ok(())
}

/// Render a still image once; optionally print it.
///
/// Returns the rendered text.
pub async fn render_still(
    path: &Path,
    options: RenderOptions,
    printer: Option<&Printer<PrinterPort>>,
) -> Result<String, AppError> {
    let mut still = StillImage::open(path)?;
    let frame = still.grab()?;

    let mut pipeline = FramePipeline::new(options);
    let display = TextBuffer::new();
    display.set_text(pipeline.render(&frame));

    if let Some(printer) = printer {
        printer.connect().await?;
        let result = printer.try_print(&display).await;
        printer.disconnect().await;
        let bytes = result?;
        log::info!("Sent {} bytes to printer", bytes);
    }

    Ok(display.text())
}
