//! Display surfaces for rendered text.
//!
//! A display holds the most recently rendered frame so the printer can read
//! back exactly what is on screen.

use std::io::Write;
use std::sync::{Arc, Mutex};

/// A text surface the renderer paints and the printer reads.
pub trait DisplaySink: Send + Sync {
    /// Replace the visible text.
    fn set_text(&self, text: &str);

    /// Full visible text.
    fn text(&self) -> String;
}

impl<D: DisplaySink + ?Sized> DisplaySink for Arc<D> {
    fn set_text(&self, text: &str) {
        (**self).set_text(text)
    }

    fn text(&self) -> String {
        (**self).text()
    }
}

/// In-memory display; clones share the same text.
#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    text: Arc<Mutex<String>>,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DisplaySink for TextBuffer {
    fn set_text(&self, text: &str) {
        if let Ok(mut current) = self.text.lock() {
            current.clear();
            current.push_str(text);
        }
    }

    fn text(&self) -> String {
        self.text
            .lock()
            .map(|t| t.clone())
            .unwrap_or_default()
    }
}

/// Repaints stdout in place on every frame.
///
/// Uses ANSI escape codes to home the cursor and overwrite the previous
/// frame line by line, so the terminal doesn't scroll or flicker.
#[derive(Debug, Default)]
pub struct TerminalDisplay {
    buffer: TextBuffer,
    cleared: Mutex<bool>,
}

impl TerminalDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Escape sequence that paints `text` from the top-left corner.
    pub fn paint_sequence(text: &str, clear_screen: bool) -> String {
        let mut output = String::with_capacity(text.len() * 2 + 16);
        if clear_screen {
            output.push_str("\x1b[2J");
        }
        output.push_str("\x1b[?25l"); // Hide cursor
        output.push_str("\x1b[H"); // Home
        for line in text.lines() {
            output.push_str(line);
            output.push_str("\x1b[K\r\n"); // Clear the rest of the line
        }
        output.push_str("\x1b[?25h"); // Show cursor
        output
    }

    /// Restore a usable terminal after the last frame.
    pub fn release(&self) {
        let mut stdout = std::io::stdout();
        let _ = stdout.write_all(b"\x1b[0m\x1b[?25h\r\n");
        let _ = stdout.flush();
    }
}

impl DisplaySink for TerminalDisplay {
    fn set_text(&self, text: &str) {
        self.buffer.set_text(text);

        let clear_screen = match self.cleared.lock() {
            Ok(mut cleared) => !std::mem::replace(&mut *cleared, true),
            Err(_) => false,
        };

        let mut stdout = std::io::stdout().lock();
        let painted = stdout
            .write_all(Self::paint_sequence(text, clear_screen).as_bytes())
            .and_then(|_| stdout.flush());
        if let Err(e) = painted {
            log::debug!("Terminal repaint failed: {}", e);
        }
    }

    fn text(&self) -> String {
        self.buffer.text()
    }
}
