//! Unit tests for the output streamer.
//!
//! Covers the busy gate, minimum length check, job framing and
//! connection handling.

use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use asciicam::display::{DisplaySink, TextBuffer};
use asciicam::printer::{
    FileOutput, LineConfig, OutputSink, PrintError, Printer, PrinterPort, DEFAULT_MIN_LENGTH,
    ESC_INIT,
};

/// Records every job; optionally waits for a release before finishing.
#[derive(Clone, Default)]
struct RecordingSink {
    open: bool,
    jobs: Arc<Mutex<Vec<Vec<u8>>>>,
    hold: Option<Arc<Notify>>,
    fail: bool,
}

impl OutputSink for RecordingSink {
    fn open(&mut self, _config: &LineConfig) -> Result<(), PrintError> {
        self.open = true;
        Ok(())
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<(), PrintError> {
        if let Some(hold) = &self.hold {
            hold.notified().await;
        }
        if self.fail {
            return Err(PrintError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "unplugged",
            )));
        }
        self.jobs.lock().unwrap().push(bytes.to_vec());
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn name(&self) -> &str {
        "recording"
    }
}

fn display_with(len: usize) -> TextBuffer {
    let display = TextBuffer::new();
    display.set_text(&"@".repeat(len));
    display
}

async fn connected(sink: RecordingSink) -> Printer<RecordingSink> {
    let printer = Printer::new(sink);
    printer.connect().await.unwrap();
    printer
}

// ==================== Job Framing Tests ====================

#[tokio::test]
async fn test_job_is_esc_at_then_text() {
    let sink = RecordingSink::default();
    let jobs = sink.jobs.clone();
    let printer = connected(sink).await;

    let display = TextBuffer::new();
    let text = format!("{}\n", "*".repeat(60));
    display.set_text(&text);

    let written = printer.try_print(&display).await.unwrap();
    assert_eq!(written, 2 + text.len());

    let jobs = jobs.lock().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(&jobs[0][..2], &ESC_INIT);
    assert_eq!(&jobs[0][2..], text.as_bytes());
}

// ==================== Length Check Tests ====================

#[tokio::test]
async fn test_short_display_is_rejected() {
    let sink = RecordingSink::default();
    let jobs = sink.jobs.clone();
    let printer = connected(sink).await;

    let err = printer.try_print(&display_with(49)).await.unwrap_err();
    assert!(matches!(
        err,
        PrintError::NoData {
            length: 49,
            minimum: DEFAULT_MIN_LENGTH
        }
    ));
    assert!(jobs.lock().unwrap().is_empty());
    assert!(!printer.is_sending());
}

#[tokio::test]
async fn test_minimum_length_is_accepted() {
    let printer = connected(RecordingSink::default()).await;
    assert!(printer.try_print(&display_with(50)).await.is_ok());
}

#[tokio::test]
async fn test_length_counts_characters_not_bytes() {
    let printer = connected(RecordingSink::default()).await;
    let display = TextBuffer::new();
    // 30 two-byte chars: 60 bytes but only 30 characters
    display.set_text(&"é".repeat(30));
    assert!(matches!(
        printer.try_print(&display).await,
        Err(PrintError::NoData { length: 30, .. })
    ));
}

// ==================== Busy Gate Tests ====================

#[tokio::test]
async fn test_second_print_while_sending_is_busy() {
    let hold = Arc::new(Notify::new());
    let sink = RecordingSink {
        hold: Some(hold.clone()),
        ..RecordingSink::default()
    };
    let jobs = sink.jobs.clone();
    let printer = connected(sink).await;
    let display = display_with(80);

    let (first, second) = tokio::join!(printer.try_print(&display), async {
        assert!(printer.is_sending());
        let second = printer.try_print(&display).await;
        hold.notify_one();
        second
    });

    assert!(first.is_ok());
    assert!(matches!(second, Err(PrintError::Busy)));
    assert_eq!(jobs.lock().unwrap().len(), 1);
    assert!(!printer.is_sending());
}

#[tokio::test]
async fn test_write_failure_releases_gate() {
    let sink = RecordingSink {
        fail: true,
        ..RecordingSink::default()
    };
    let printer = connected(sink).await;
    let display = display_with(80);

    assert!(matches!(
        printer.try_print(&display).await,
        Err(PrintError::Io(_))
    ));
    assert!(!printer.is_sending());
    // Gate is free again: the next attempt reaches the sink instead of Busy
    assert!(matches!(
        printer.try_print(&display).await,
        Err(PrintError::Io(_))
    ));
}

#[tokio::test]
async fn test_print_current_display_reports_outcome() {
    let printer = connected(RecordingSink::default()).await;
    assert!(printer.print_current_display(&display_with(64)).await);
    assert!(!printer.print_current_display(&display_with(3)).await);
}

// ==================== Connection Tests ====================

#[tokio::test]
async fn test_print_before_connect_is_not_connected() {
    let printer = Printer::new(RecordingSink::default());
    assert!(!printer.is_connected().await);
    assert!(matches!(
        printer.try_print(&display_with(80)).await,
        Err(PrintError::NotConnected)
    ));
    assert!(!printer.is_sending());
}

#[tokio::test]
async fn test_disconnect_then_print() {
    let printer = connected(RecordingSink::default()).await;
    printer.disconnect().await;
    assert!(matches!(
        printer.try_print(&display_with(80)).await,
        Err(PrintError::NotConnected)
    ));
}

#[tokio::test]
async fn test_file_port_appends_jobs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lp0");
    let printer = Printer::new(PrinterPort::File(FileOutput::new(
        path.to_string_lossy(),
    )));
    printer.connect().await.unwrap();

    let display = display_with(50);
    printer.try_print(&display).await.unwrap();
    printer.try_print(&display).await.unwrap();
    printer.disconnect().await;

    let written = std::fs::read(&path).unwrap();
    let job = [&ESC_INIT[..], "@".repeat(50).as_bytes()].concat();
    assert_eq!(written, [job.clone(), job].concat());
}

#[tokio::test]
async fn test_missing_device_reports_no_device() {
    let printer = Printer::new(PrinterPort::File(FileOutput::new(
        "/nonexistent-dir/lp0",
    )));
    assert!(matches!(
        printer.connect().await,
        Err(PrintError::NoDevice(_))
    ));
}
