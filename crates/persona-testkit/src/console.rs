//! Diagnostic channel interception
//!
//! [`InterceptingConsole`] stands in for the console handed to code under test.
//! Suppressed channels (`error` and `warn` by default) record each call's
//! arguments instead of printing; every other channel passes straight through.

use parking_lot::Mutex;
use persona_core::effects::{ConsoleEffects, DiagnosticChannel};
use persona_effects::TracingConsoleHandler;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Channels suppressed when nothing else is configured.
pub const DEFAULT_SUPPRESSED: [DiagnosticChannel; 2] =
    [DiagnosticChannel::Error, DiagnosticChannel::Warn];

/// Ordered argument tuples recorded for one channel.
#[derive(Debug, Clone, Default)]
pub struct RecordedCallLog {
    calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl RecordedCallLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, args: &[String]) {
        self.calls.lock().push(args.to_vec());
    }

    /// Snapshot of every recorded call, oldest first.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().clone()
    }

    /// Number of recorded calls.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Whether anything was recorded.
    pub fn was_called(&self) -> bool {
        !self.calls.lock().is_empty()
    }

    /// Whether some call had exactly these arguments.
    pub fn was_called_with(&self, args: &[&str]) -> bool {
        let expected = args.iter().copied();
        self.calls
            .lock()
            .iter()
            .any(|call| call.iter().map(String::as_str).eq(expected.clone()))
    }

    /// Whether any argument of any call contains `needle`.
    pub fn any_call_contains(&self, needle: &str) -> bool {
        self.calls
            .lock()
            .iter()
            .flatten()
            .any(|arg| arg.contains(needle))
    }

    /// Arguments of the most recent call.
    pub fn last_call(&self) -> Option<Vec<String>> {
        self.calls.lock().last().cloned()
    }

    /// Forget every recorded call.
    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

/// Console that records suppressed channels and forwards the rest.
pub struct InterceptingConsole {
    logs: BTreeMap<DiagnosticChannel, RecordedCallLog>,
    passthrough: Arc<dyn ConsoleEffects>,
}

impl InterceptingConsole {
    /// Create a console recording `suppressed` and forwarding everything else to `passthrough`.
    pub fn new(
        passthrough: Arc<dyn ConsoleEffects>,
        suppressed: impl IntoIterator<Item = DiagnosticChannel>,
    ) -> Self {
        Self {
            logs: suppressed
                .into_iter()
                .map(|channel| (channel, RecordedCallLog::new()))
                .collect(),
            passthrough,
        }
    }

    /// Suppress `error` and `warn`, forward the rest to tracing.
    pub fn with_defaults() -> Self {
        Self::new(Arc::new(TracingConsoleHandler::new()), DEFAULT_SUPPRESSED)
    }

    /// Whether writes to `channel` are recorded instead of forwarded.
    pub fn is_suppressed(&self, channel: DiagnosticChannel) -> bool {
        self.logs.contains_key(&channel)
    }

    /// The log for a suppressed channel; `None` for pass-through channels.
    pub fn log(&self, channel: DiagnosticChannel) -> Option<&RecordedCallLog> {
        self.logs.get(&channel)
    }

    /// Recorded channels, in severity order.
    pub fn suppressed_channels(&self) -> impl Iterator<Item = DiagnosticChannel> + '_ {
        self.logs.keys().copied()
    }

    /// Empty every recorded log.
    pub fn clear_all(&self) {
        for log in self.logs.values() {
            log.clear();
        }
    }
}

impl ConsoleEffects for InterceptingConsole {
    fn write(&self, channel: DiagnosticChannel, args: &[String]) {
        match self.logs.get(&channel) {
            Some(log) => log.record(args),
            None => self.passthrough.write(channel, args),
        }
    }
}

impl std::fmt::Debug for InterceptingConsole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptingConsole")
            .field("logs", &self.logs)
            .finish_non_exhaustive()
    }
}
