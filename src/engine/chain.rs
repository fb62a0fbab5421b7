// src/engine/chain.rs

//! Sequential, abort-aware execution of several tasks.
//!
//! A [`TaskChain`] holds an ordered list of bound steps (task + listener).
//! After [`TaskChain::start`], steps are dispatched one at a time through
//! [`Diagnosis::execute`]; step `i + 1` is only dispatched once step `i`'s
//! terminal callback has begun. Aborting prevents every step that has not
//! been dispatched yet from starting; a step already running in the
//! background is left alone.
//!
//! All bookkeeping (advancing the cursor, dispatching the next step, firing
//! the finish hook) happens on the foreground context.
//!
//! Ordering on success: the chain advances and schedules the next step
//! *before* the caller's `on_finished` runs. The actual dispatch is the next
//! foreground job and re-checks the abort flag, so an `abort()` issued from
//! inside `on_finished` still prevents the next step from starting.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::dispatcher::Diagnosis;
use crate::errors::{NetdiagError, Result};
use crate::task::{Task, TaskError, TaskListener};

type BoundStep = Box<dyn FnOnce(&Arc<ChainInner>) + Send>;
type Hook = Box<dyn FnOnce() + Send>;
type ResultDecision<R> = Box<dyn FnOnce(&R) -> bool + Send>;
type ErrorDecision<E> = Box<dyn FnOnce(&TaskError<E>) -> bool + Send>;

/// Lifecycle of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainPhase {
    /// Constructed, `start` not called yet.
    Idle,
    /// Started; steps are being dispatched.
    Running,
    /// Every step reached its terminal callback and the finish hook fired.
    Finished,
    /// `abort` was called before the chain finished.
    Aborted,
}

/// One step of a chain: a task, its listener, and optional abort decisions.
///
/// The decisions are evaluated before the chain advances, so returning `true`
/// stops the remaining steps just like calling [`TaskChain::abort`].
pub struct ChainStep<T: Task, L = ()> {
    task: T,
    listener: L,
    abort_on_result: Option<ResultDecision<T::Output>>,
    abort_on_error: Option<ErrorDecision<T::Error>>,
}

impl<T: Task> ChainStep<T, ()> {
    pub fn new(task: T) -> Self {
        Self {
            task,
            listener: (),
            abort_on_result: None,
            abort_on_error: None,
        }
    }
}

impl<T: Task, L> ChainStep<T, L> {
    pub fn with_listener<M>(self, listener: M) -> ChainStep<T, M>
    where
        M: TaskListener<T::Output, T::Error>,
    {
        ChainStep {
            task: self.task,
            listener,
            abort_on_result: self.abort_on_result,
            abort_on_error: self.abort_on_error,
        }
    }

    /// Abort the chain when `decide` returns `true` for this step's result.
    pub fn abort_on_result(
        mut self,
        decide: impl FnOnce(&T::Output) -> bool + Send + 'static,
    ) -> Self {
        self.abort_on_result = Some(Box::new(decide));
        self
    }

    /// Abort the chain when `decide` returns `true` for this step's error.
    pub fn abort_on_error(
        mut self,
        decide: impl FnOnce(&TaskError<T::Error>) -> bool + Send + 'static,
    ) -> Self {
        self.abort_on_error = Some(Box::new(decide));
        self
    }
}

/// Runs tasks one after another.
///
/// Cloning yields another handle to the same chain, which is how listeners
/// get hold of [`abort`](Self::abort).
///
/// `start` may be called once; adding steps after `start` is not allowed and
/// is rejected with [`NetdiagError::ChainSealed`].
#[derive(Clone)]
pub struct TaskChain {
    inner: Arc<ChainInner>,
}

struct ChainInner {
    diagnosis: Diagnosis,
    aborted: AtomicBool,
    state: Mutex<ChainState>,
    on_finish: Mutex<Option<Hook>>,
    on_abort: Mutex<Option<Hook>>,
}

struct ChainState {
    steps: Vec<Option<BoundStep>>,
    /// Index of the last step the chain tried to start.
    cursor: Option<usize>,
    started: bool,
    phase: ChainPhase,
}

impl TaskChain {
    pub fn new(diagnosis: Diagnosis) -> Self {
        Self {
            inner: Arc::new(ChainInner {
                diagnosis,
                aborted: AtomicBool::new(false),
                state: Mutex::new(ChainState {
                    steps: Vec::new(),
                    cursor: None,
                    started: false,
                    phase: ChainPhase::Idle,
                }),
                on_finish: Mutex::new(None),
                on_abort: Mutex::new(None),
            }),
        }
    }

    /// Append `task` with its listener.
    pub fn add_task<T, L>(&self, task: T, listener: L) -> Result<()>
    where
        T: Task,
        L: TaskListener<T::Output, T::Error>,
    {
        self.add_step(ChainStep::new(task).with_listener(listener))
    }

    /// Append a fully configured step.
    pub fn add_step<T, L>(&self, step: ChainStep<T, L>) -> Result<()>
    where
        T: Task,
        L: TaskListener<T::Output, T::Error>,
    {
        let mut state = lock(&self.inner.state);
        if state.started {
            return Err(NetdiagError::ChainSealed);
        }

        let index = state.steps.len();
        let bound: BoundStep = Box::new(move |chain: &Arc<ChainInner>| {
            let ChainStep {
                task,
                listener,
                abort_on_result,
                abort_on_error,
            } = step;
            let link = ChainLink {
                chain: Arc::clone(chain),
                index,
                listener,
                abort_on_result,
                abort_on_error,
            };
            chain.diagnosis.execute(task, link);
        });
        state.steps.push(Some(bound));
        Ok(())
    }

    /// Hook fired once, on the foreground, after the last step's terminal
    /// callback.
    pub fn set_finish_callback(&self, f: impl FnOnce() + Send + 'static) {
        *lock(&self.inner.on_finish) = Some(Box::new(f));
    }

    /// Hook fired once, synchronously inside the first effective
    /// [`abort`](Self::abort).
    pub fn set_abort_callback(&self, f: impl FnOnce() + Send + 'static) {
        *lock(&self.inner.on_abort) = Some(Box::new(f));
    }

    /// Start dispatching steps. Only valid once.
    ///
    /// The first step is dispatched from the foreground context. An empty
    /// chain finishes right away.
    pub fn start(&self) -> Result<()> {
        {
            let mut state = lock(&self.inner.state);
            if state.started {
                return Err(NetdiagError::ChainAlreadyStarted);
            }
            state.started = true;
            state.cursor = None;
            if state.phase == ChainPhase::Idle {
                state.phase = ChainPhase::Running;
            }
        }

        self.inner
            .diagnosis
            .config()
            .log_debug(format_args!("Starting chain of {} tasks", self.len()));
        self.inner.schedule(0);
        Ok(())
    }

    /// Stop the chain: no step that has not been dispatched yet will start.
    ///
    /// Idempotent. The abort hook fires on the first call only, and not at
    /// all if the chain already finished. A step that is already running is
    /// not interrupted; its callbacks are still delivered.
    pub fn abort(&self) {
        self.inner.abort();
    }

    pub fn is_aborted(&self) -> bool {
        self.inner.is_aborted()
    }

    pub fn phase(&self) -> ChainPhase {
        lock(&self.inner.state).phase
    }

    /// Index of the last step the chain tried to start; `None` before start.
    /// Equal to [`len`](Self::len) once the chain ran past its last step.
    pub fn cursor(&self) -> Option<usize> {
        lock(&self.inner.state).cursor
    }

    pub fn len(&self) -> usize {
        lock(&self.inner.state).steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for TaskChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.inner.state);
        f.debug_struct("TaskChain")
            .field("phase", &state.phase)
            .field("cursor", &state.cursor)
            .field("len", &state.steps.len())
            .field("aborted", &self.inner.is_aborted())
            .finish()
    }
}

impl ChainInner {
    fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    /// Queue the dispatch of step `index` on the foreground.
    fn schedule(self: &Arc<Self>, index: usize) {
        let chain = Arc::clone(self);
        self.diagnosis
            .config()
            .executor()
            .run_foreground(Box::new(move || chain.dispatch(index)));
    }

    /// Start step `index`, or finish the chain if there is none.
    fn dispatch(self: &Arc<Self>, index: usize) {
        let config = self.diagnosis.config();

        let step = {
            let mut state = lock(&self.state);
            // Checked under the state lock: `abort` flips the flag before it
            // takes the lock, so it either sees `Finished` or we see the flag.
            if self.is_aborted() {
                drop(state);
                config.log_debug(format_args!("Chain aborted; step {index} not started"));
                return;
            }
            state.cursor = Some(index);
            if index >= state.steps.len() {
                state.phase = ChainPhase::Finished;
                None
            } else {
                let slot = state.steps[index].take();
                if slot.is_none() {
                    drop(state);
                    config.log_warn(format_args!("Chain step {index} was already dispatched"));
                    return;
                }
                slot
            }
        };

        match step {
            Some(step) => {
                config.log_debug(format_args!("Chain dispatching step {index}"));
                step(self);
            }
            None => {
                config.log_debug(format_args!("Chain finished after {index} tasks"));
                fire(&self.on_finish);
            }
        }
    }

    fn abort(&self) {
        if self.aborted.swap(true, Ordering::SeqCst) {
            return;
        }

        let (finished, dropped) = {
            let mut state = lock(&self.state);
            if state.phase == ChainPhase::Finished {
                (true, Vec::new())
            } else {
                state.phase = ChainPhase::Aborted;
                let pending: Vec<BoundStep> =
                    state.steps.iter_mut().filter_map(Option::take).collect();
                (false, pending)
            }
        };
        // Pending steps may own listeners holding chain handles; release them
        // outside the lock.
        let skipped = dropped.len();
        drop(dropped);

        let config = self.diagnosis.config();
        if finished {
            config.log_debug(format_args!("Abort requested after chain finished; ignoring"));
            return;
        }

        config.log_debug(format_args!("Chain aborted; {skipped} pending tasks skipped"));
        fire(&self.on_abort);
    }
}

fn fire(hook: &Mutex<Option<Hook>>) {
    let hook = lock(hook).take();
    if let Some(hook) = hook {
        hook();
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Listener installed for each chain step. Forwards to the caller's listener
/// and drives the chain on terminal events.
struct ChainLink<R, E, L> {
    chain: Arc<ChainInner>,
    index: usize,
    listener: L,
    abort_on_result: Option<ResultDecision<R>>,
    abort_on_error: Option<ErrorDecision<E>>,
}

impl<R, E, L> TaskListener<R, E> for ChainLink<R, E, L>
where
    R: 'static,
    E: 'static,
    L: TaskListener<R, E>,
{
    fn on_started(&mut self) {
        self.listener.on_started();
    }

    fn on_progress(&mut self, progress: u32) {
        self.listener.on_progress(progress);
    }

    fn on_finished(&mut self, result: R) {
        let advance = Advance::new(&self.chain, self.index + 1);
        if let Some(decide) = self.abort_on_result.take() {
            if decide(&result) {
                self.chain.abort();
            }
        }
        drop(advance);
        self.listener.on_finished(result);
    }

    fn on_error(&mut self, error: TaskError<E>) {
        // Dropped last, also while unwinding out of a panicking handler.
        let _advance = Advance::new(&self.chain, self.index + 1);
        if let Some(decide) = self.abort_on_error.take() {
            if decide(&error) {
                self.chain.abort();
            }
        }
        self.listener.on_error(error);
    }
}

/// Schedules step `next` when dropped, unless the chain was aborted by then.
struct Advance<'a> {
    chain: &'a Arc<ChainInner>,
    next: usize,
}

impl<'a> Advance<'a> {
    fn new(chain: &'a Arc<ChainInner>, next: usize) -> Self {
        Self { chain, next }
    }
}

impl Drop for Advance<'_> {
    fn drop(&mut self) {
        if !self.chain.is_aborted() {
            self.chain.schedule(self.next);
        }
    }
}
