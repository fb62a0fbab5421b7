// src/engine/config.rs

use std::fmt;
use std::sync::Arc;

use super::logger::{Logger, TracingLogger};
use crate::errors::Result;
use crate::exec::{Executor, TokioExecutor};

/// Configuration owned by a [`Diagnosis`](super::Diagnosis) and every
/// [`TaskChain`](super::TaskChain) built from it.
///
/// There is no process-wide state: two dispatchers with different configs can
/// coexist (tests rely on this). Each dispatch captures the executor and
/// logger at `execute` time, so replacing them later never affects tasks that
/// are already in flight.
#[derive(Clone)]
pub struct DiagnosisConfig {
    debug: bool,
    logger: Arc<dyn Logger>,
    executor: Arc<dyn Executor>,
}

impl DiagnosisConfig {
    /// Config with debug logging off and the [`TracingLogger`].
    pub fn new(executor: impl Executor + 'static) -> Self {
        Self {
            debug: false,
            logger: Arc::new(TracingLogger),
            executor: Arc::new(executor),
        }
    }

    /// Config backed by a [`TokioExecutor`] on the current runtime.
    pub fn from_current_runtime() -> Result<Self> {
        Ok(Self::new(TokioExecutor::current()?))
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_logger(mut self, logger: impl Logger + 'static) -> Self {
        self.logger = Arc::new(logger);
        self
    }

    pub fn with_shared_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_executor(mut self, executor: impl Executor + 'static) -> Self {
        self.executor = Arc::new(executor);
        self
    }

    pub fn with_shared_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn executor(&self) -> &Arc<dyn Executor> {
        &self.executor
    }

    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    /// Emit a debug line if debug logging is enabled. Formatting is skipped
    /// otherwise.
    pub(crate) fn log_debug(&self, message: fmt::Arguments<'_>) {
        if self.debug {
            self.logger.debug(&message.to_string());
        }
    }

    pub(crate) fn log_warn(&self, message: fmt::Arguments<'_>) {
        self.logger.warn(&message.to_string());
    }
}

impl fmt::Debug for DiagnosisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosisConfig")
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}
