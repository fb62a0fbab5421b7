// src/task/progress.rs

/// Sink handed to [`Task::run`](super::Task::run) for progress reports.
///
/// Values are conventionally in `(0, 100)` but are neither clamped nor checked
/// for monotonicity. A task may report from whatever thread it runs on; the
/// dispatcher re-delivers every value on the foreground context.
pub struct ProgressSink {
    deliver: Option<Box<dyn Fn(u32) + Send + Sync>>,
}

impl ProgressSink {
    pub(crate) fn attached(deliver: impl Fn(u32) + Send + Sync + 'static) -> Self {
        Self {
            deliver: Some(Box::new(deliver)),
        }
    }

    /// A sink that drops every value. Useful when calling `run` directly.
    pub fn detached() -> Self {
        Self { deliver: None }
    }

    pub fn report(&self, progress: u32) {
        if let Some(deliver) = &self.deliver {
            deliver(progress);
        }
    }

    /// Whether reported values go anywhere.
    pub fn is_attached(&self) -> bool {
        self.deliver.is_some()
    }
}

impl std::fmt::Debug for ProgressSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressSink")
            .field("attached", &self.is_attached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn attached_sink_forwards_values_unvalidated() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = Arc::clone(&seen);
            ProgressSink::attached(move |p| seen.lock().unwrap().push(p))
        };

        sink.report(80);
        sink.report(20);
        sink.report(250);

        assert!(sink.is_attached());
        assert_eq!(*seen.lock().unwrap(), vec![80, 20, 250]);
    }

    #[test]
    fn detached_sink_drops_values() {
        let sink = ProgressSink::detached();
        sink.report(50);
        assert!(!sink.is_attached());
    }
}
