//! Reporting capability handed to every comparator call.
//!
//! The engine never logs through a global; callers pass a [`Reporter`] and
//! decide where messages go.

use std::sync::Arc;

pub type ProgressCallback = Arc<dyn Fn(&str) + Send + Sync>;

pub trait Reporter: Send + Sync {
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
}

/// Forwards messages to `tracing` under the `prt` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "prt", "{message}");
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "prt", "{message}");
    }
}

/// Drops every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentReporter;

impl Reporter for SilentReporter {
    fn debug(&self, _message: &str) {}

    fn info(&self, _message: &str) {}
}

/// Sends every message, regardless of level, to a callback.
#[derive(Clone)]
pub struct CallbackReporter {
    callback: ProgressCallback,
}

impl CallbackReporter {
    pub fn new(callback: ProgressCallback) -> Self {
        Self { callback }
    }
}

impl Reporter for CallbackReporter {
    fn debug(&self, message: &str) {
        (self.callback)(message);
    }

    fn info(&self, message: &str) {
        (self.callback)(message);
    }
}
