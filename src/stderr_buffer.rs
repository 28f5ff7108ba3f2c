//! Stderr sink for log output that can be held back while the TUI owns the
//! terminal and replayed once it exits.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};
use tracing_subscriber::fmt::MakeWriter;

#[derive(Debug)]
pub struct StderrBuffer {
    lines: Mutex<Option<Vec<String>>>,
}

impl StderrBuffer {
    pub const fn new() -> Self {
        Self {
            lines: Mutex::new(None),
        }
    }

    /// Start holding messages instead of printing them
    pub fn activate(&self) {
        *self.lines.lock().unwrap_or_else(PoisonError::into_inner) = Some(Vec::new());
    }

    /// Stop buffering and return everything collected
    pub fn drain(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .unwrap_or_default()
    }

    pub fn is_active(&self) -> bool {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Store the message if buffering, otherwise print it to stderr now
    pub fn emit(&self, msg: String) {
        let mut guard = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(buf) = guard.as_mut() {
            buf.push(msg);
        } else {
            drop(guard);
            eprintln!("{}", msg);
        }
    }
}

impl Default for StderrBuffer {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL: StderrBuffer = StderrBuffer::new();

pub fn activate() {
    GLOBAL.activate();
}

pub fn drain() -> Vec<String> {
    GLOBAL.drain()
}

/// `MakeWriter` for `tracing_subscriber::fmt` routing events through a buffer
#[derive(Debug, Clone, Copy)]
pub struct BufferedStderr {
    target: &'static StderrBuffer,
}

impl BufferedStderr {
    pub fn new(target: &'static StderrBuffer) -> Self {
        Self { target }
    }
}

impl Default for BufferedStderr {
    fn default() -> Self {
        Self::new(&GLOBAL)
    }
}

impl<'a> MakeWriter<'a> for BufferedStderr {
    type Writer = EventWriter;

    fn make_writer(&'a self) -> Self::Writer {
        EventWriter {
            target: self.target,
            pending: Vec::new(),
        }
    }
}

/// Collects one formatted event and hands it over on drop
pub struct EventWriter {
    target: &'static StderrBuffer,
    pending: Vec<u8>,
}

impl Write for EventWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for EventWriter {
    fn drop(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let text = String::from_utf8_lossy(&self.pending);
        self.target.emit(text.trim_end_matches('\n').to_string());
    }
}
