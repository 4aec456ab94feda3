//! Batch configuration.
//!
//! [`BatchConfig`] carries every knob of a batch run. Defaults match the
//! CLI defaults; [`BatchConfig::validate`] is called by the engine before
//! anything is spawned.

use std::time::Duration;

use thiserror::Error;

use crate::download::constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_BATCH_DEADLINE, DEFAULT_MAX_CONCURRENT, READ_TIMEOUT_SECS,
};

/// How per-item failures affect the batch return value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Always return the report; failures show up in counts and logs only.
    #[default]
    ReportOnly,
    /// Return [`BatchError::ItemsFailed`](crate::BatchError::ItemsFailed)
    /// listing every failed URL when at least one item failed.
    FailOnAnyError,
}

/// Invalid configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// `max_concurrent` must be at least 1.
    #[error("invalid concurrency value {value}: must be at least 1")]
    InvalidConcurrency {
        /// The rejected value.
        value: usize,
    },

    /// A timeout was zero.
    #[error("invalid {field}: must be greater than zero")]
    InvalidTimeout {
        /// Name of the offending field.
        field: &'static str,
    },
}

/// Settings for one batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// Maximum transfers executing at once.
    pub max_concurrent: usize,
    /// Wall-clock limit for the whole batch; `None` disables the timer.
    pub deadline: Option<Duration>,
    /// Whether per-item failures fail the batch.
    pub failure_policy: FailurePolicy,
    /// Install Ctrl-C / SIGTERM handling that cancels the batch.
    ///
    /// Off by default. Once Tokio has registered a handler for a signal it
    /// stays registered for the life of the process, so the default Ctrl-C
    /// behaviour does not come back after the batch ends. Only binaries that
    /// own the process should turn this on.
    pub handle_signals: bool,
    /// HTTP connect timeout.
    pub connect_timeout: Duration,
    /// HTTP per-read timeout.
    pub read_timeout: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            deadline: Some(DEFAULT_BATCH_DEADLINE),
            failure_policy: FailurePolicy::ReportOnly,
            handle_signals: false,
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(READ_TIMEOUT_SECS),
        }
    }
}

impl BatchConfig {
    #[must_use]
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    #[must_use]
    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    #[must_use]
    pub fn with_signal_handling(mut self, handle_signals: bool) -> Self {
        self.handle_signals = handle_signals;
        self
    }

    #[must_use]
    pub fn with_timeouts(mut self, connect_timeout: Duration, read_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self.read_timeout = read_timeout;
        self
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent == 0 {
            return Err(ConfigError::InvalidConcurrency {
                value: self.max_concurrent,
            });
        }
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout {
                field: "connect_timeout",
            });
        }
        if self.read_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout {
                field: "read_timeout",
            });
        }
        Ok(())
    }
}
