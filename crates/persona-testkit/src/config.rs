//! Harness configuration
//!
//! Defaults are enough for most suites. A TOML file can override them, and
//! `PERSONA_TESTKIT_*` environment variables override the file:
//!
//! ```toml
//! start_time_ms = 1640995200000
//! timer_limit = 100000
//! suppressed_channels = ["error", "warn"]
//! log_filter = "warn"
//! ```

use crate::console::DEFAULT_SUPPRESSED;
use crate::time::DEFAULT_TIMER_LIMIT;
use persona_core::{DiagnosticChannel, PersonaError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "PERSONA_TESTKIT_";

/// Configuration for [`TestHarness`](crate::TestHarness).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Virtual clock reading at install, in Unix milliseconds.
    pub start_time_ms: u64,
    /// Upper bound on timers run by one `advance_by`/`run_all`.
    pub timer_limit: usize,
    /// Channels recorded instead of printed.
    pub suppressed_channels: Vec<DiagnosticChannel>,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            start_time_ms: 1_640_995_200_000, // 2022-01-01 00:00:00 UTC
            timer_limit: DEFAULT_TIMER_LIMIT,
            suppressed_channels: DEFAULT_SUPPRESSED.to_vec(),
            log_filter: "warn".to_string(),
        }
    }
}

impl HarnessConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| PersonaError::config(format!("Invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PersonaError::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply `PERSONA_TESTKIT_*` overrides from the process environment.
    pub fn merge_with_env(&mut self) -> Result<()> {
        self.merge_with_vars(std::env::vars())
    }

    /// Apply overrides from `(name, value)` pairs; names without the prefix are ignored.
    pub fn merge_with_vars<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let Some(name) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.as_ref().trim();
            match name {
                "START_TIME_MS" => self.start_time_ms = parse_number(name, value)?,
                "TIMER_LIMIT" => self.timer_limit = parse_number(name, value)?,
                "SUPPRESSED_CHANNELS" => {
                    self.suppressed_channels = value
                        .split(',')
                        .map(str::trim)
                        .filter(|channel| !channel.is_empty())
                        .map(str::parse)
                        .collect::<Result<_>>()?;
                }
                "LOG_FILTER" => self.log_filter = value.to_string(),
                other => {
                    let variable = format!("{ENV_PREFIX}{other}");
                    tracing::warn!(%variable, "ignoring unknown testkit variable");
                }
            }
        }
        self.validate()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.timer_limit == 0 {
            return Err(PersonaError::config("timer_limit must be greater than zero"));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    let Ok(number) = value.parse() else {
        let message = format!("{ENV_PREFIX}{name}: not a number: {value}");
        return Err(PersonaError::config(message));
    };
    Ok(number)
}
