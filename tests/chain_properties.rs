// tests/chain_properties.rs

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use netdiag::engine::{Diagnosis, DiagnosisConfig, TaskChain};
use netdiag::task::Callbacks;
use netdiag_test_utils::fake_executor::QueueExecutor;
use netdiag_test_utils::fake_task::{FakeError, FakeTask};

// Each step either succeeds or fails; optionally one step aborts the chain
// from its terminal callback.
fn steps_strategy() -> impl proptest::strategy::Strategy<Value = (Vec<bool>, Option<usize>)> {
    use proptest::prelude::*;
    proptest::collection::vec(any::<bool>(), 0..12).prop_flat_map(|steps| {
        let n = steps.len();
        let abort_at = if n == 0 {
            Just(None).boxed()
        } else {
            proptest::option::of(0..n).boxed()
        };
        (Just(steps), abort_at)
    })
}

proptest::proptest! {
    #[test]
    fn chain_runs_a_prefix_and_ends_exactly_once((steps, abort_at) in steps_strategy()) {
        let exec = QueueExecutor::new();
        let chain = TaskChain::new(Diagnosis::new(DiagnosisConfig::new(exec.clone())));

        let finished = Arc::new(AtomicUsize::new(0));
        let aborted = Arc::new(AtomicUsize::new(0));
        let terminals = Arc::new(AtomicUsize::new(0));
        {
            let finished = Arc::clone(&finished);
            chain.set_finish_callback(move || { finished.fetch_add(1, Ordering::SeqCst); });
            let aborted = Arc::clone(&aborted);
            chain.set_abort_callback(move || { aborted.fetch_add(1, Ordering::SeqCst); });
        }

        let mut runs = Vec::new();
        for (i, ok) in steps.iter().enumerate() {
            let name = format!("s{i}");
            let task = if *ok { FakeTask::ok(&name, i as u32) } else { FakeTask::err(&name, "x") };
            runs.push(task.runs());

            let aborts_here = abort_at == Some(i);
            let on_done = {
                let chain = chain.clone();
                let terminals = Arc::clone(&terminals);
                move || {
                    terminals.fetch_add(1, Ordering::SeqCst);
                    if aborts_here {
                        chain.abort();
                    }
                }
            };
            let on_fail = on_done.clone();
            let listener: Callbacks<u32, FakeError> = Callbacks::new()
                .on_finished(move |_| on_done())
                .on_error(move |_| on_fail());
            chain.add_task(task, listener).unwrap();
        }

        chain.start().unwrap();
        exec.run_until_idle();

        let expected_runs = abort_at.map_or(steps.len(), |k| k + 1);
        for (i, counter) in runs.iter().enumerate() {
            let expected = usize::from(i < expected_runs);
            proptest::prop_assert_eq!(counter.load(Ordering::SeqCst), expected);
        }
        proptest::prop_assert_eq!(terminals.load(Ordering::SeqCst), expected_runs);

        let (fin, abo) = (finished.load(Ordering::SeqCst), aborted.load(Ordering::SeqCst));
        proptest::prop_assert_eq!(fin + abo, 1);
        proptest::prop_assert_eq!(abo, usize::from(abort_at.is_some()));
    }
}
