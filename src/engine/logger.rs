// src/engine/logger.rs

//! Two-level log sink used by the dispatcher.

/// Sink for dispatcher log lines.
///
/// `debug` lines are verbose and only emitted when the owning
/// [`DiagnosisConfig`](super::DiagnosisConfig) has `debug` enabled; `warn`
/// lines (task errors, panics) are always emitted.
pub trait Logger: Send + Sync {
    fn debug(&self, message: &str);
    fn warn(&self, message: &str);
}

/// Default logger: forwards to `tracing` under the `netdiag` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "netdiag", "{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "netdiag", "{message}");
    }
}

/// Logger that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn debug(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
}
