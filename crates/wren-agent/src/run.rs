// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background execution of a turn.
//!
//! A [`Run`] wraps one engine invocation in a tokio task. Its status moves
//! from `running` to exactly one terminal state, decided under a mutex so an
//! interrupt and a natural finish cannot both win.
//!
//! Interrupting cancels the run's token, which the work is expected to
//! observe. Work that has not returned within [`FORCE_STOP_GRACE`] is dropped
//! at its current await point; tool processes are spawned with
//! `kill_on_drop`, so they die with it.
//!
//! A panic in the work is reported through `on_error` as an internal error,
//! so the completion guarantees hold for it too.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use wren_core::{RunStatus, WrenError};

use crate::engine::TurnOutcome;
use crate::supervisor::panic_message;

/// How long interrupted work may take to wind down before it is dropped.
pub const FORCE_STOP_GRACE: Duration = Duration::from_secs(2);

type SuccessFn = Box<dyn FnOnce(&TurnOutcome) + Send>;
type ErrorFn = Box<dyn FnOnce(&WrenError) + Send>;
type CompleteFn = Box<dyn FnOnce(RunStatus) + Send>;

/// Hooks invoked from the run's task when it ends.
///
/// `on_success` or `on_error` fires after a natural finish; an interrupted run
/// fires neither. `on_complete` always fires, last.
#[derive(Default)]
pub struct RunCallbacks {
    on_success: Option<SuccessFn>,
    on_error: Option<ErrorFn>,
    on_complete: Option<CompleteFn>,
}

impl RunCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_success(mut self, f: impl FnOnce(&TurnOutcome) + Send + 'static) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnOnce(&WrenError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl FnOnce(RunStatus) + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }
}

/// Runs in flight, keyed by run id.
#[derive(Clone, Default)]
pub struct ActiveRuns {
    runs: Arc<DashMap<String, Arc<Run>>>,
}

impl ActiveRuns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, run_id: &str) -> Option<Arc<Run>> {
        self.runs.get(run_id).map(|r| Arc::clone(r.value()))
    }

    /// Runs working on the given conversation.
    pub fn for_conversation(&self, conversation_id: &str) -> Vec<Arc<Run>> {
        self.runs
            .iter()
            .filter(|r| r.conversation_id() == conversation_id)
            .map(|r| Arc::clone(r.value()))
            .collect()
    }

    /// Interrupts every run of a conversation, returning how many were stopped.
    pub fn interrupt_conversation(&self, conversation_id: &str) -> usize {
        self.for_conversation(conversation_id)
            .iter()
            .filter(|run| run.interrupt())
            .count()
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    fn insert(&self, run: Arc<Run>) {
        self.runs.insert(run.id.clone(), run);
    }

    fn remove(&self, run_id: &str) {
        self.runs.remove(run_id);
    }
}

/// A turn executing in the background.
pub struct Run {
    id: String,
    conversation_id: String,
    status: Mutex<RunStatus>,
    cancel: CancellationToken,
    done: CancellationToken,
    registry: Option<ActiveRuns>,
    started: Mutex<bool>,
}

impl Run {
    /// A run that is not tracked in any registry.
    pub fn new(conversation_id: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::build(conversation_id.into(), None))
    }

    /// A run that registers itself in `registry` on start and removes itself
    /// once its callbacks have fired.
    pub fn tracked(conversation_id: impl Into<String>, registry: &ActiveRuns) -> Arc<Self> {
        Arc::new(Self::build(conversation_id.into(), Some(registry.clone())))
    }

    fn build(conversation_id: String, registry: Option<ActiveRuns>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            conversation_id,
            status: Mutex::new(RunStatus::Running),
            cancel: CancellationToken::new(),
            done: CancellationToken::new(),
            registry,
            started: Mutex::new(false),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn status(&self) -> RunStatus {
        *self.lock_status()
    }

    /// Token cancelled on interrupt; pass it to the work being run.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Spawns `work` and returns immediately.
    ///
    /// Fails with `InvalidOperation` if the run was already started.
    pub fn start<F>(self: &Arc<Self>, work: F, callbacks: RunCallbacks) -> Result<(), WrenError>
    where
        F: Future<Output = Result<TurnOutcome, WrenError>> + Send + 'static,
    {
        {
            let mut started = self
                .started
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if *started {
                return Err(WrenError::InvalidOperation(format!(
                    "run {} was already started",
                    self.id
                )));
            }
            *started = true;
        }

        if let Some(registry) = &self.registry {
            registry.insert(Arc::clone(self));
        }

        let run = Arc::clone(self);
        tokio::spawn(async move {
            // The work gets its own task so a panic surfaces as a join error.
            let mut task = tokio::spawn(work);
            let force_stop = async {
                run.cancel.cancelled().await;
                tokio::time::sleep(FORCE_STOP_GRACE).await;
            };
            let result = tokio::select! {
                joined = &mut task => Some(joined.unwrap_or_else(|e| {
                    let message = if e.is_panic() {
                        panic_message(e.into_panic())
                    } else {
                        e.to_string()
                    };
                    error!(run_id = %run.id, error = %message, "run panicked");
                    Err(WrenError::Internal(format!("run panicked: {message}")))
                })),
                _ = force_stop => {
                    warn!(run_id = %run.id, "run ignored cancellation, dropping it");
                    task.abort();
                    None
                }
            };
            run.finish(result, callbacks);
        });
        debug!(run_id = %self.id, conversation_id = %self.conversation_id, "run started");
        Ok(())
    }

    /// Forces the run to stop. Returns `false` without effect if the run had
    /// already reached a terminal state.
    pub fn interrupt(&self) -> bool {
        if !self.transition(RunStatus::Interrupted) {
            return false;
        }
        self.cancel.cancel();
        info!(run_id = %self.id, conversation_id = %self.conversation_id, "run interrupted");
        true
    }

    /// Waits until the task has ended and all callbacks have fired.
    pub async fn wait(&self) {
        self.done.cancelled().await;
    }

    pub fn is_finished(&self) -> bool {
        self.done.is_cancelled()
    }

    fn finish(&self, result: Option<Result<TurnOutcome, WrenError>>, callbacks: RunCallbacks) {
        // A result that lost the race to an interrupt is discarded.
        let natural = result.filter(|_| self.transition(RunStatus::Completed));

        match natural {
            Some(Ok(outcome)) => {
                if let Some(f) = callbacks.on_success {
                    self.guard_callback("on_success", || f(&outcome));
                }
            }
            Some(Err(e)) => {
                warn!(run_id = %self.id, error = %e, "run failed");
                if let Some(f) = callbacks.on_error {
                    self.guard_callback("on_error", || f(&e));
                }
            }
            None => {}
        }

        if let Some(f) = callbacks.on_complete {
            let status = self.status();
            self.guard_callback("on_complete", || f(status));
        }
        if let Some(registry) = &self.registry {
            registry.remove(&self.id);
        }
        self.done.cancel();
        debug!(run_id = %self.id, status = %self.status(), "run finished");
    }

    /// Runs a callback, logging instead of unwinding if it panics so the
    /// run is still deregistered and waiters are released.
    fn guard_callback(&self, name: &str, f: impl FnOnce()) {
        if let Err(payload) = std::panic::catch_unwind(AssertUnwindSafe(f)) {
            error!(
                run_id = %self.id,
                callback = name,
                error = %panic_message(payload),
                "run callback panicked"
            );
        }
    }

    /// Moves from `running` to `next`; false if already terminal.
    fn transition(&self, next: RunStatus) -> bool {
        let mut status = self.lock_status();
        if status.is_terminal() {
            return false;
        }
        *status = next;
        true
    }

    fn lock_status(&self) -> MutexGuard<'_, RunStatus> {
        self.status
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    /// Work that runs until its token is cancelled.
    fn cooperative(run: &Run) -> impl Future<Output = Result<TurnOutcome, WrenError>> + use<> {
        let token = run.cancellation_token();
        async move {
            token.cancelled().await;
            Err(WrenError::Cancelled)
        }
    }

    #[tokio::test]
    async fn natural_success_fires_success_then_complete() {
        let registry = ActiveRuns::new();
        let run = Run::tracked("conv", &registry);
        let successes = counter();
        let completes = counter();
        let (s, c) = (Arc::clone(&successes), Arc::clone(&completes));

        run.start(
            async {
                Ok(TurnOutcome {
                    answer: "done".into(),
                    ..TurnOutcome::default()
                })
            },
            RunCallbacks::new()
                .on_success(move |o| {
                    assert_eq!(o.answer, "done");
                    s.fetch_add(1, Ordering::SeqCst);
                })
                .on_complete(move |status| {
                    assert_eq!(status, RunStatus::Completed);
                    c.fetch_add(1, Ordering::SeqCst);
                }),
        )
        .unwrap();
        run.wait().await;

        assert_eq!(run.status(), RunStatus::Completed);
        assert_eq!(successes.load(Ordering::SeqCst), 1);
        assert_eq!(completes.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn failure_fires_error_callback() {
        let run = Run::new("conv");
        let errors = counter();
        let e = Arc::clone(&errors);
        run.start(
            async { Err(WrenError::MaxIterationsExceeded { limit: 3 }) },
            RunCallbacks::new().on_error(move |err| {
                assert!(matches!(err, WrenError::MaxIterationsExceeded { limit: 3 }));
                e.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();
        run.wait().await;
        assert_eq!(run.status(), RunStatus::Completed);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn interrupt_terminates_and_second_interrupt_is_noop() {
        let registry = ActiveRuns::new();
        let run = Run::tracked("conv", &registry);
        let successes = counter();
        let errors = counter();
        let completes = counter();
        let (s, e, c) = (
            Arc::clone(&successes),
            Arc::clone(&errors),
            Arc::clone(&completes),
        );

        run.start(
            cooperative(&run),
            RunCallbacks::new()
                .on_success(move |_| {
                    s.fetch_add(1, Ordering::SeqCst);
                })
                .on_error(move |_| {
                    e.fetch_add(1, Ordering::SeqCst);
                })
                .on_complete(move |status| {
                    assert_eq!(status, RunStatus::Interrupted);
                    c.fetch_add(1, Ordering::SeqCst);
                }),
        )
        .unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(run.status(), RunStatus::Running);

        assert!(run.interrupt());
        assert_eq!(run.status(), RunStatus::Interrupted);
        run.wait().await;
        assert_eq!(run.status(), RunStatus::Interrupted);

        assert!(!run.interrupt());
        assert_eq!(run.status(), RunStatus::Interrupted);
        assert_eq!(successes.load(Ordering::SeqCst), 0);
        assert_eq!(errors.load(Ordering::SeqCst), 0);
        assert_eq!(completes.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn work_ignoring_cancellation_is_dropped_after_grace() {
        let run = Run::new("conv");
        let dropped = Arc::new(tokio::sync::Notify::new());
        let guard_notify = Arc::clone(&dropped);

        struct NotifyOnDrop(Arc<tokio::sync::Notify>);
        impl Drop for NotifyOnDrop {
            fn drop(&mut self) {
                self.0.notify_one();
            }
        }

        run.start(
            async move {
                let _guard = NotifyOnDrop(guard_notify);
                std::future::pending::<()>().await;
                Ok(TurnOutcome::default())
            },
            RunCallbacks::new(),
        )
        .unwrap();
        tokio::task::yield_now().await;

        let started = tokio::time::Instant::now();
        assert!(run.interrupt());
        run.wait().await;
        dropped.notified().await;

        assert!(started.elapsed() >= FORCE_STOP_GRACE);
        assert_eq!(run.status(), RunStatus::Interrupted);
    }

    #[tokio::test]
    async fn interrupt_after_completion_is_noop() {
        let run = Run::new("conv");
        run.start(async { Ok(TurnOutcome::default()) }, RunCallbacks::new())
            .unwrap();
        run.wait().await;
        assert!(!run.interrupt());
        assert_eq!(run.status(), RunStatus::Completed);
    }

    #[tokio::test]
    async fn start_twice_is_rejected() {
        let run = Run::new("conv");
        run.start(async { Ok(TurnOutcome::default()) }, RunCallbacks::new())
            .unwrap();
        let err = run
            .start(async { Ok(TurnOutcome::default()) }, RunCallbacks::new())
            .unwrap_err();
        assert!(matches!(err, WrenError::InvalidOperation(_)));
        run.wait().await;
    }

    #[tokio::test]
    async fn interrupt_conversation_only_touches_that_conversation() {
        let registry = ActiveRuns::new();
        let a = Run::tracked("a", &registry);
        let b = Run::tracked("b", &registry);
        a.start(cooperative(&a), RunCallbacks::new()).unwrap();
        b.start(cooperative(&b), RunCallbacks::new()).unwrap();

        assert_eq!(registry.interrupt_conversation("a"), 1);
        a.wait().await;
        assert_eq!(b.status(), RunStatus::Running);
        assert_eq!(registry.for_conversation("b").len(), 1);
        assert!(b.interrupt());
        b.wait().await;
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn panicking_work_still_completes_and_deregisters() {
        let registry = ActiveRuns::new();
        let run = Run::tracked("conv", &registry);
        let errors = counter();
        let completes = counter();
        let (e, c) = (Arc::clone(&errors), Arc::clone(&completes));

        run.start(
            async {
                if true {
                    panic!("tool blew up");
                }
                Ok(TurnOutcome::default())
            },
            RunCallbacks::new()
                .on_error(move |err| {
                    assert!(matches!(err, WrenError::Internal(m) if m.contains("tool blew up")));
                    e.fetch_add(1, Ordering::SeqCst);
                })
                .on_complete(move |status| {
                    assert_eq!(status, RunStatus::Completed);
                    c.fetch_add(1, Ordering::SeqCst);
                }),
        )
        .unwrap();

        tokio::time::timeout(Duration::from_secs(3), run.wait())
            .await
            .expect("a panicking run must still finish");
        assert_eq!(run.status(), RunStatus::Completed);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
        assert_eq!(completes.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn panicking_callback_does_not_block_completion() {
        let registry = ActiveRuns::new();
        let run = Run::tracked("conv", &registry);
        let completes = counter();
        let c = Arc::clone(&completes);

        run.start(
            async { Ok(TurnOutcome::default()) },
            RunCallbacks::new()
                .on_success(|_| panic!("reply channel gone"))
                .on_complete(move |_| {
                    c.fetch_add(1, Ordering::SeqCst);
                }),
        )
        .unwrap();

        tokio::time::timeout(Duration::from_secs(3), run.wait())
            .await
            .expect("run should finish despite the callback panic");
        assert_eq!(completes.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }
}
