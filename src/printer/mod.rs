//! Receipt-printer output.
//!
//! [`Printer`] reads the text currently on a display, prefixes the
//! printer-reset command and hands the job to an [`OutputSink`]: a serial
//! port ([`SerialOutput`]) or a writable device file ([`FileOutput`]).

mod error;
mod sink;
mod streamer;

pub use error::PrintError;
pub use sink::{
    list_ports, FileOutput, LineConfig, OutputSink, PrinterPort, SerialOutput, DEFAULT_BAUD_RATE,
};
pub use streamer::{encode_job, Printer, DEFAULT_MIN_LENGTH, ESC_INIT};
