//! Console effect interface for diagnostic output
//!
//! # Effect Classification
//!
//! - **Category**: Infrastructure Effect
//! - **Implementation**: `persona-effects` (tracing), `persona-testkit` (interceptor)
//! - **Usage**: Application code reporting errors and warnings to the operator
//!
//! Every write names a [`DiagnosticChannel`], so a test harness can suppress and
//! record some channels while letting the rest through.

use crate::PersonaError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named output stream a diagnostic is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticChannel {
    /// Failures the operator should act on.
    Error,
    /// Recoverable problems.
    Warn,
    /// Routine progress.
    Info,
    /// Developer detail.
    Debug,
    /// Untagged output.
    Log,
}

impl DiagnosticChannel {
    /// All channels, in severity order.
    pub const ALL: [DiagnosticChannel; 5] = [
        DiagnosticChannel::Error,
        DiagnosticChannel::Warn,
        DiagnosticChannel::Info,
        DiagnosticChannel::Debug,
        DiagnosticChannel::Log,
    ];

    /// Lowercase channel name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticChannel::Error => "error",
            DiagnosticChannel::Warn => "warn",
            DiagnosticChannel::Info => "info",
            DiagnosticChannel::Debug => "debug",
            DiagnosticChannel::Log => "log",
        }
    }
}

impl fmt::Display for DiagnosticChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiagnosticChannel {
    type Err = PersonaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let matches = |channel: &Self| channel.as_str().eq_ignore_ascii_case(s);
        match Self::ALL.into_iter().find(matches) {
            Some(channel) => Ok(channel),
            None => Err(PersonaError::invalid(format!("unknown diagnostic channel: {s}"))),
        }
    }
}

/// Pure trait for console/diagnostic operations
pub trait ConsoleEffects: Send + Sync {
    /// Write one call's arguments to a channel
    fn write(&self, channel: DiagnosticChannel, args: &[String]);

    /// Log an error message
    fn error(&self, message: &str) {
        self.write(DiagnosticChannel::Error, &[message.to_owned()]);
    }

    /// Log a warning message
    fn warn(&self, message: &str) {
        self.write(DiagnosticChannel::Warn, &[message.to_owned()]);
    }

    /// Log an info message
    fn info(&self, message: &str) {
        self.write(DiagnosticChannel::Info, &[message.to_owned()]);
    }

    /// Log a debug message
    fn debug(&self, message: &str) {
        self.write(DiagnosticChannel::Debug, &[message.to_owned()]);
    }
}

impl<T: ConsoleEffects + ?Sized> ConsoleEffects for std::sync::Arc<T> {
    fn write(&self, channel: DiagnosticChannel, args: &[String]) {
        (**self).write(channel, args);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_names_parse_case_insensitively() {
        let warn: DiagnosticChannel = "WARN".parse().unwrap();
        let log: DiagnosticChannel = "log".parse().unwrap();
        assert_eq!(warn, DiagnosticChannel::Warn);
        assert_eq!(log, DiagnosticChannel::Log);
        assert!("trace".parse::<DiagnosticChannel>().is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for channel in DiagnosticChannel::ALL {
            let parsed: DiagnosticChannel = channel.to_string().parse().unwrap();
            assert_eq!(parsed, channel);
        }
    }
}
