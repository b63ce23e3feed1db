//! On-device log ring shown by the diagnostics overlay.
//!
//! Firmware code logs through `log_info!`, `log_warn!` and `log_error!`, which
//! forward to defmt and also keep the formatted line here. The overlay reads
//! the newest lines with [`with_recent`].
//!
//! # Usage
//!
//! ```ignore
//! log_info!("Display initialized");
//! log_warn!("persist failed: {}", error);
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use heapless::{String, Vec};

/// Maximum number of log entries to keep.
pub const LOG_ENTRIES: usize = 8;

/// Maximum characters per log message (one overlay line).
pub const LOG_MSG_LEN: usize = 40;

/// Log severity level.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Single-character prefix shown before the message.
    pub const fn prefix(self) -> char {
        match self {
            Self::Info => 'I',
            Self::Warn => 'W',
            Self::Error => 'E',
        }
    }
}

/// A single log line: `"<prefix> <message>"`, truncated to [`LOG_MSG_LEN`].
#[derive(Clone)]
pub struct LogEntry {
    pub line: String<LOG_MSG_LEN>,
}

impl LogEntry {
    pub fn new(
        level: LogLevel,
        message: &str,
    ) -> Self {
        let mut line: String<LOG_MSG_LEN> = String::new();
        line.push(level.prefix()).ok();
        line.push(' ').ok();
        for c in message.chars() {
            if line.push(c).is_err() {
                break;
            }
        }
        Self { line }
    }
}

/// Circular buffer of log entries.
pub struct LogBuffer {
    entries: [LogEntry; LOG_ENTRIES],
    head: usize, // Next write position
    count: usize,
}

impl LogBuffer {
    pub const fn new() -> Self {
        Self {
            entries: [const { LogEntry { line: String::new() } }; LOG_ENTRIES],
            head: 0,
            count: 0,
        }
    }

    /// Push a new entry. The oldest entry is dropped when full.
    pub fn push(
        &mut self,
        entry: LogEntry,
    ) {
        self.entries[self.head] = entry;
        self.head = (self.head + 1) % LOG_ENTRIES;
        if self.count < LOG_ENTRIES {
            self.count += 1;
        }
    }

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        let start = if self.count < LOG_ENTRIES { 0 } else { self.head };
        (0..self.count).map(move |i| &self.entries[(start + i) % LOG_ENTRIES])
    }
}

/// Global log buffer protected by a mutex.
pub static LOG_BUFFER: Mutex<CriticalSectionRawMutex, LogBuffer> = Mutex::new(LogBuffer::new());

/// Push a log entry to the global buffer.
///
/// Non-blocking: if the buffer is locked the line only goes to defmt.
pub fn push_log(
    level: LogLevel,
    message: &str,
) {
    let entry = LogEntry::new(level, message);
    if let Ok(mut buffer) = LOG_BUFFER.try_lock() {
        buffer.push(entry);
    }
}

/// Run `f` with the buffered lines, oldest first.
///
/// `f` sees an empty slice if the buffer is locked.
pub fn with_recent<R>(f: impl FnOnce(&[&str]) -> R) -> R {
    match LOG_BUFFER.try_lock() {
        Ok(buffer) => {
            let mut lines: Vec<&str, LOG_ENTRIES> = Vec::new();
            for entry in buffer.iter() {
                lines.push(entry.line.as_str()).ok();
            }
            f(&lines)
        }
        Err(_) => f(&[]),
    }
}

/// Log a message at Info level.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {{
        use core::fmt::Write;
        let mut buf: heapless::String<{ $crate::log_buffer::LOG_MSG_LEN }> = heapless::String::new();
        let _ = write!(buf, $($arg)*);
        $crate::log_buffer::push_log($crate::log_buffer::LogLevel::Info, buf.as_str());
        defmt::info!($($arg)*);
    }};
}

/// Log a message at Warn level.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        use core::fmt::Write;
        let mut buf: heapless::String<{ $crate::log_buffer::LOG_MSG_LEN }> = heapless::String::new();
        let _ = write!(buf, $($arg)*);
        $crate::log_buffer::push_log($crate::log_buffer::LogLevel::Warn, buf.as_str());
        defmt::warn!($($arg)*);
    }};
}

/// Log a message at Error level.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {{
        use core::fmt::Write;
        let mut buf: heapless::String<{ $crate::log_buffer::LOG_MSG_LEN }> = heapless::String::new();
        let _ = write!(buf, $($arg)*);
        $crate::log_buffer::push_log($crate::log_buffer::LogLevel::Error, buf.as_str());
        defmt::error!($($arg)*);
    }};
}
