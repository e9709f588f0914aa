//! Printer error types.

use std::io;

/// Why a print was rejected or failed.
///
/// None of these are fatal: the render loop keeps going and the next print
/// attempt starts from a clean gate.
#[derive(Debug, thiserror::Error)]
pub enum PrintError {
    /// The host can't drive this kind of output at all
    #[error("Printer output not supported on this system: {0}")]
    Unsupported(String),

    /// The selected port doesn't exist or disappeared
    #[error("Printer port '{0}' not found. Run 'list-ports' to see available ports")]
    NoDevice(String),

    /// The OS refused access to the port
    #[error("Permission denied opening printer port '{0}'")]
    PermissionDenied(String),

    #[error("No printer connected")]
    NotConnected,

    /// Another print is still being written
    #[error("Printer is busy sending the previous frame")]
    Busy,

    /// Nothing worth printing on the display yet
    #[error("Nothing to print: display has {length} characters, need at least {minimum}")]
    NoData { length: usize, minimum: usize },

    #[error("Printer I/O error: {0}")]
    Io(#[from] io::Error),
}

impl PrintError {
    /// Map a serialport error for `port` onto the taxonomy.
    pub fn from_serial(port: &str, err: serialport::Error) -> Self {
        match err.kind() {
            serialport::ErrorKind::NoDevice => PrintError::NoDevice(port.to_string()),
            serialport::ErrorKind::InvalidInput => PrintError::Unsupported(err.description),
            serialport::ErrorKind::Io(io::ErrorKind::NotFound) => {
                PrintError::NoDevice(port.to_string())
            }
            serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied) => {
                PrintError::PermissionDenied(port.to_string())
            }
            serialport::ErrorKind::Io(kind) => {
                PrintError::Io(io::Error::new(kind, err.description))
            }
            serialport::ErrorKind::Unknown => PrintError::Io(io::Error::other(err.description)),
        }
    }

    /// Map an error from opening a device file for `path`.
    pub fn from_open(path: &str, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => PrintError::NoDevice(path.to_string()),
            io::ErrorKind::PermissionDenied => PrintError::PermissionDenied(path.to_string()),
            _ => PrintError::Io(err),
        }
    }

    /// True for rejections that happen before any byte is written.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            PrintError::Busy | PrintError::NoData { .. } | PrintError::NotConnected
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_no_device_maps_to_no_device() {
        let err = serialport::Error::new(serialport::ErrorKind::NoDevice, "gone");
        match PrintError::from_serial("/dev/ttyUSB0", err) {
            PrintError::NoDevice(port) => assert_eq!(port, "/dev/ttyUSB0"),
            other => panic!("Expected NoDevice, got {:?}", other),
        }
    }

    #[test]
    fn test_serial_permission_maps_to_permission_denied() {
        let err = serialport::Error::new(
            serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied),
            "denied",
        );
        assert!(matches!(
            PrintError::from_serial("COM3", err),
            PrintError::PermissionDenied(_)
        ));
    }

    #[test]
    fn test_open_not_found_maps_to_no_device() {
        let err = io::Error::new(io::ErrorKind::NotFound, "missing");
        assert!(matches!(
            PrintError::from_open("/dev/usb/lp0", err),
            PrintError::NoDevice(_)
        ));
    }

    #[test]
    fn test_busy_is_distinct_from_io() {
        assert!(PrintError::Busy.is_rejection());
        assert!(!PrintError::Io(io::Error::other("x")).is_rejection());
        assert_ne!(
            PrintError::Busy.to_string(),
            PrintError::Io(io::Error::other("x")).to_string()
        );
    }

    #[test]
    fn test_no_data_message() {
        let msg = PrintError::NoData {
            length: 49,
            minimum: 50,
        }
        .to_string();
        assert!(msg.contains("49"));
        assert!(msg.contains("50"));
    }
}
