//! Console effect handlers
//!
//! Forwards diagnostic writes to `tracing`, mapping each channel onto the
//! matching tracing level. This is the pass-through target for channels the
//! test harness does not intercept.

use persona_core::effects::{ConsoleEffects, DiagnosticChannel};

/// Console handler that emits every write as a tracing event
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingConsoleHandler;

impl TracingConsoleHandler {
    /// Create a new tracing console handler
    pub fn new() -> Self {
        Self
    }
}

impl ConsoleEffects for TracingConsoleHandler {
    fn write(&self, channel: DiagnosticChannel, args: &[String]) {
        let message = args.join(" ");
        match channel {
            DiagnosticChannel::Error => tracing::error!(channel = %channel, "{}", message),
            DiagnosticChannel::Warn => tracing::warn!(channel = %channel, "{}", message),
            DiagnosticChannel::Info | DiagnosticChannel::Log => {
                tracing::info!(channel = %channel, "{}", message);
            }
            DiagnosticChannel::Debug => tracing::debug!(channel = %channel, "{}", message),
        }
    }
}
