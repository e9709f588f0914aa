//! Output sinks the printer writes to.

use std::future::Future;
use std::io::Write;
use std::time::Duration;

use tokio::io::AsyncWriteExt;

use super::error::PrintError;

/// Line speed of the receipt printers this was built for.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// How long a single serial write may block before it is treated as failed.
const SERIAL_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings passed to [`OutputSink::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineConfig {
    pub baud_rate: u32,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

/// A byte sink that accepts whole print jobs.
pub trait OutputSink: Send {
    /// Connect to the device.
    fn open(&mut self, config: &LineConfig) -> Result<(), PrintError>;

    /// Write `bytes` as one unit.
    fn write(&mut self, bytes: &[u8]) -> impl Future<Output = Result<(), PrintError>> + Send;

    /// Disconnect. Errors are logged, never returned.
    fn close(&mut self);

    fn is_open(&self) -> bool;

    /// Port or path this sink talks to, for messages.
    fn name(&self) -> &str;
}

/// A serial-attached printer.
pub struct SerialOutput {
    path: String,
    port: Option<Box<dyn serialport::SerialPort>>,
}

impl std::fmt::Debug for SerialOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialOutput")
            .field("path", &self.path)
            .field("open", &self.port.is_some())
            .finish()
    }
}

impl SerialOutput {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            port: None,
        }
    }
}

impl OutputSink for SerialOutput {
    fn open(&mut self, config: &LineConfig) -> Result<(), PrintError> {
        if self.port.is_some() {
            return Ok(());
        }
        let port = serialport::new(&self.path, config.baud_rate)
            .timeout(SERIAL_WRITE_TIMEOUT)
            .open()
            .map_err(|e| PrintError::from_serial(&self.path, e))?;
        log::info!("Connected to {} at {} baud", self.path, config.baud_rate);
        self.port = Some(port);
        Ok(())
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<(), PrintError> {
        let Some(mut port) = self.port.take() else {
            return Err(PrintError::NotConnected);
        };
        let data = bytes.to_vec();

        // Blocking write at 9600 baud takes seconds for a full frame
        let (port, result) = tokio::task::spawn_blocking(move || {
            let result = port.write_all(&data).and_then(|_| port.flush());
            (port, result)
        })
        .await
        .map_err(|e| PrintError::Io(std::io::Error::other(e)))?;

        self.port = Some(port);
        result.map_err(PrintError::from)
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            log::info!("Disconnected from {}", self.path);
        }
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn name(&self) -> &str {
        &self.path
    }
}

/// A printer exposed as a writable file, e.g. `/dev/usb/lp0`.
///
/// Line speed doesn't apply; regular files work too, which is handy for
/// capturing print jobs.
#[derive(Debug)]
pub struct FileOutput {
    path: String,
    file: Option<tokio::fs::File>,
}

impl FileOutput {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            file: None,
        }
    }
}

impl OutputSink for FileOutput {
    fn open(&mut self, _config: &LineConfig) -> Result<(), PrintError> {
        if self.file.is_some() {
            return Ok(());
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| PrintError::from_open(&self.path, e))?;
        log::info!("Opened printer device {}", self.path);
        self.file = Some(tokio::fs::File::from_std(file));
        Ok(())
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<(), PrintError> {
        let Some(file) = self.file.as_mut() else {
            return Err(PrintError::NotConnected);
        };
        file.write_all(bytes).await?;
        file.flush().await?;
        Ok(())
    }

    fn close(&mut self) {
        if self.file.take().is_some() {
            log::info!("Closed printer device {}", self.path);
        }
    }

    fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn name(&self) -> &str {
        &self.path
    }
}

/// The sink kinds selectable from configuration.
#[derive(Debug)]
pub enum PrinterPort {
    Serial(SerialOutput),
    File(FileOutput),
}

impl OutputSink for PrinterPort {
    fn open(&mut self, config: &LineConfig) -> Result<(), PrintError> {
        match self {
            PrinterPort::Serial(s) => s.open(config),
            PrinterPort::File(f) => f.open(config),
        }
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<(), PrintError> {
        match self {
            PrinterPort::Serial(s) => s.write(bytes).await,
            PrinterPort::File(f) => f.write(bytes).await,
        }
    }

    fn close(&mut self) {
        match self {
            PrinterPort::Serial(s) => s.close(),
            PrinterPort::File(f) => f.close(),
        }
    }

    fn is_open(&self) -> bool {
        match self {
            PrinterPort::Serial(s) => s.is_open(),
            PrinterPort::File(f) => f.is_open(),
        }
    }

    fn name(&self) -> &str {
        match self {
            PrinterPort::Serial(s) => s.name(),
            PrinterPort::File(f) => f.name(),
        }
    }
}

/// Serial ports visible to the OS.
pub fn list_ports() -> Result<Vec<serialport::SerialPortInfo>, PrintError> {
    serialport::available_ports().map_err(|e| PrintError::Unsupported(e.description))
}
