//! Logging sink for the compiler.
//!
//! The compiler reports progress and soft failures through a caller-owned
//! sink rather than writing anywhere itself. Logging is best-effort and
//! has no influence on the computation.

use std::fmt;

/// Message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Normal progress messages
    Info,
    /// Detailed diagnostics
    Verbose,
    /// Soft failures the compiler recovered from
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Verbose => write!(f, "verbose"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A logging sink.
pub trait Log {
    /// Record a message at the given severity.
    fn log(&self, severity: Severity, message: &str);

    /// Record a progress message.
    fn info(&self, message: &str) {
        self.log(Severity::Info, message);
    }

    /// Record a detailed diagnostic.
    fn verbose(&self, message: &str) {
        self.log(Severity::Verbose, message);
    }

    /// Record a soft failure.
    fn warning(&self, message: &str) {
        self.log(Severity::Warning, message);
    }
}

/// A sink that discards everything.
pub struct NullLog;

impl Log for NullLog {
    fn log(&self, _severity: Severity, _message: &str) {}
}

/// A sink that forwards to the `log` crate facade, so the host's usual
/// logger configuration applies.
pub struct StdLog;

impl Log for StdLog {
    fn log(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => ::log::info!("{message}"),
            Severity::Verbose => ::log::debug!("{message}"),
            Severity::Warning => ::log::warn!("{message}"),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::{Log, Severity};
    use std::cell::RefCell;

    /// Captures messages for assertions.
    pub struct RecordingLog {
        pub messages: RefCell<Vec<(Severity, String)>>,
    }

    impl RecordingLog {
        pub fn new() -> Self {
            Self {
                messages: RefCell::new(Vec::new()),
            }
        }

        pub fn warnings(&self) -> Vec<String> {
            self.messages
                .borrow()
                .iter()
                .filter(|(s, _)| *s == Severity::Warning)
                .map(|(_, m)| m.clone())
                .collect()
        }
    }

    impl Log for RecordingLog {
        fn log(&self, severity: Severity, message: &str) {
            self.messages.borrow_mut().push((severity, message.to_string()));
        }
    }
}
