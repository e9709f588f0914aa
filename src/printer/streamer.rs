//! Output Streamer: sends the current display text to the printer.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;

use super::error::PrintError;
use super::sink::{LineConfig, OutputSink};
use crate::display::DisplaySink;

/// ESC @ - printer initialize/reset, sent before every job.
pub const ESC_INIT: [u8; 2] = [0x1B, 0x40];

/// Displays shorter than this (in characters) are not worth a print.
pub const DEFAULT_MIN_LENGTH: usize = 50;

/// Build the bytes of one print job: `ESC @` followed by the text.
pub fn encode_job(text: &str) -> Vec<u8> {
    let mut job = Vec::with_capacity(ESC_INIT.len() + text.len());
    job.extend_from_slice(&ESC_INIT);
    job.extend_from_slice(text.as_bytes());
    job
}

/// Held while a job is being written; clears the busy flag on drop.
struct SendGate<'a>(&'a AtomicBool);

impl<'a> SendGate<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SendGate(flag))
    }
}

impl Drop for SendGate<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Sends rendered frames to an [`OutputSink`], one job at a time.
///
/// A second print while one is in flight is rejected with
/// [`PrintError::Busy`] rather than queued.
pub struct Printer<O: OutputSink> {
    sink: Mutex<O>,
    sending: AtomicBool,
    line: LineConfig,
    min_length: usize,
}

impl<O: OutputSink> std::fmt::Debug for Printer<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Printer")
            .field("sending", &self.is_sending())
            .field("line", &self.line)
            .field("min_length", &self.min_length)
            .finish_non_exhaustive()
    }
}

impl<O: OutputSink> Printer<O> {
    pub fn new(sink: O) -> Self {
        Self {
            sink: Mutex::new(sink),
            sending: AtomicBool::new(false),
            line: LineConfig::default(),
            min_length: DEFAULT_MIN_LENGTH,
        }
    }

    pub fn with_line_config(mut self, line: LineConfig) -> Self {
        self.line = line;
        self
    }

    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    /// True while a job is being written.
    pub fn is_sending(&self) -> bool {
        self.sending.load(Ordering::Acquire)
    }

    /// Open the underlying sink.
    pub async fn connect(&self) -> Result<(), PrintError> {
        self.sink.lock().await.open(&self.line)
    }

    /// Close the underlying sink. Waits for an in-flight job to finish.
    pub async fn disconnect(&self) {
        self.sink.lock().await.close();
    }

    pub async fn is_connected(&self) -> bool {
        self.sink.lock().await.is_open()
    }

    /// Send the display's current text; returns the number of bytes written.
    pub async fn try_print(&self, display: &dyn DisplaySink) -> Result<usize, PrintError> {
        let _gate = SendGate::acquire(&self.sending).ok_or(PrintError::Busy)?;

        let text = display.text();
        let length = text.chars().count();
        if length < self.min_length {
            return Err(PrintError::NoData {
                length,
                minimum: self.min_length,
            });
        }

        let job = encode_job(&text);
        let mut sink = self.sink.lock().await;
        if !sink.is_open() {
            return Err(PrintError::NotConnected);
        }
        sink.write(&job).await?;
        Ok(job.len())
    }

    /// Send the display's current text, reporting the outcome as a log notice.
    ///
    /// Returns `true` only when the sink accepted the whole job.
    pub async fn print_current_display(&self, display: &dyn DisplaySink) -> bool {
        match self.try_print(display).await {
            Ok(bytes) => {
                log::info!("Sent {} bytes to printer", bytes);
                true
            }
            Err(e) if e.is_rejection() => {
                log::warn!("{}", e);
                false
            }
            Err(e) => {
                log::warn!("Print failed: {}", e);
                false
            }
        }
    }
}
