//! Logger: prefixed, fire-and-forget diagnostics
//!
//! The core never writes to a console directly. It formats lines with a fixed
//! prefix tag and hands them to a [`LogSink`]; the browser backend routes them
//! to `web_sys::console`.

use std::fmt::Display;
use std::rc::Rc;

use crate::error::Result;

// =============================================================================
// Types
// =============================================================================

/// Log severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

/// Destination for formatted log lines. Implementations must not panic.
pub trait LogSink {
    fn write(&self, level: Level, line: &str);
}

/// Sink that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl LogSink for NullSink {
    fn write(&self, _level: Level, _line: &str) {}
}

// =============================================================================
// Logger
// =============================================================================

/// Prefixed logger handle. Cheap to clone.
#[derive(Clone)]
pub struct Logger {
    prefix: Rc<str>,
    sink: Rc<dyn LogSink>,
}

impl Logger {
    pub fn new(prefix: &str, sink: Rc<dyn LogSink>) -> Self {
        Self {
            prefix: Rc::from(prefix),
            sink,
        }
    }

    /// Logger that discards every line
    pub fn silent() -> Self {
        Self::new("", Rc::new(NullSink))
    }

    pub fn info(&self, message: &str) {
        self.sink
            .write(Level::Info, &format!("{} {}", self.prefix, message));
    }

    pub fn warn(&self, context: &str, message: &str) {
        self.sink.write(
            Level::Warn,
            &format!("{} Warning in {}: {}", self.prefix, context, message),
        );
    }

    pub fn error(&self, context: &str, error: &dyn Display) {
        self.sink.write(
            Level::Error,
            &format!("{} Error in {}: {}", self.prefix, context, error),
        );
    }

    /// Error boundary for externally triggered operations.
    ///
    /// Runs `op`; on failure logs the error under `context` and returns
    /// `fallback`. Nothing escapes to the caller.
    pub fn guard<T>(&self, context: &str, fallback: T, op: impl FnOnce() -> Result<T>) -> T {
        match op() {
            Ok(value) => value,
            Err(e) => {
                self.error(context, &e);
                fallback
            }
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}
