//! `CoreThread`: the worker-thread state machine that drives one iteration
//! of core work (timer + audio ticking, in this crate) per loop pass,
//! pacing itself against a [`SyncPoint`](crate::sync::SyncPoint).
//!
//! Grounded on the teacher's `platform/rustboyadvance-jni/src/emulator.rs`
//! (`EmulationState`, `EmulatorContext::native_run`, `pause`/`resume`/
//! `request_stop`) generalized from a one-shot pause/stop flag into the
//! full nestable interrupt/reset state machine this spec describes.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

use log::{debug, trace, warn};

use crate::error::{CoreError, CoreResult};
use crate::sync::SyncPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreState {
    Initialized,
    Running,
    Pausing,
    Paused,
    Interrupting,
    Interrupted,
    Reseting,
    /// Single-step: run exactly one iteration while otherwise paused, then
    /// fall back to `Paused`.
    RunOn,
    Exiting,
    Shutdown,
    Crashed,
}

type RunFunctionCallback = Box<dyn FnOnce() + Send>;

struct Shared {
    state: Mutex<CoreState>,
    condvar: Condvar,
    interrupt_depth: Mutex<u32>,
    saved_state: Mutex<Option<CoreState>>,
    /// One-shot closure installed by `run_function`, consumed by the worker
    /// the next time it observes `RunOn`.
    callback: Mutex<Option<RunFunctionCallback>>,
    /// The state `run_function`'s caller observed before requesting
    /// `RunOn`, restored once the callback returns. Distinct from
    /// `saved_state`, which belongs to the nestable interrupt mechanism.
    run_on_saved_state: Mutex<Option<CoreState>>,
    sync: Arc<SyncPoint>,
}

impl Shared {
    fn set_state(&self, state: CoreState) {
        let mut guard = self.state.lock().unwrap();
        trace!("core thread state {:?} -> {:?}", *guard, state);
        *guard = state;
        self.condvar.notify_all();
    }

    /// Leaves `Initialized` for `Running`, unless a caller already moved the
    /// state on (e.g. `pause()` racing the worker's first scheduling) — that
    /// request must win, not get clobbered by this startup transition.
    fn start_running(&self) {
        let mut guard = self.state.lock().unwrap();
        if *guard == CoreState::Initialized {
            *guard = CoreState::Running;
            self.condvar.notify_all();
        }
    }

    fn wait_while<F: Fn(CoreState) -> bool>(&self, pred: F) -> CoreState {
        let mut guard = self.state.lock().unwrap();
        while pred(*guard) {
            guard = self.condvar.wait(guard).unwrap();
        }
        *guard
    }

    fn wait_until(&self, target: CoreState) -> CoreState {
        self.wait_while(|s| s != target && s != CoreState::Crashed && s != CoreState::Shutdown)
    }

    /// Wakes any thread already blocked on the video/audio barriers so a
    /// consumer never deadlocks waiting on a frame this worker has stopped
    /// producing. Does not arm a pass for a consumer that calls `wait_*`
    /// after this point — that one genuinely waits for the next resume.
    fn release_barriers_for_parked_state(&self) {
        self.sync.release_parked_waiters();
    }
}

/// The worker-thread harness. `F` performs one unit of core work per loop
/// pass (a frame, in an embedder that ticks video/audio peripherals).
pub struct CoreThread {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl CoreThread {
    pub fn spawn<F>(sync: Arc<SyncPoint>, mut run_iteration: F) -> CoreThread
    where
        F: FnMut() + Send + 'static,
    {
        let shared = Arc::new(Shared {
            state: Mutex::new(CoreState::Initialized),
            condvar: Condvar::new(),
            interrupt_depth: Mutex::new(0),
            saved_state: Mutex::new(None),
            callback: Mutex::new(None),
            run_on_saved_state: Mutex::new(None),
            sync,
        });

        let worker_shared = Arc::clone(&shared);
        let handle = thread::spawn(move || {
            worker_shared.start_running();
            loop {
                let state = *worker_shared.state.lock().unwrap();
                match state {
                    CoreState::Pausing => {
                        worker_shared.release_barriers_for_parked_state();
                        worker_shared.set_state(CoreState::Paused);
                        worker_shared.wait_while(|s| s == CoreState::Paused);
                        continue;
                    }
                    CoreState::Interrupting => {
                        worker_shared.release_barriers_for_parked_state();
                        worker_shared.set_state(CoreState::Interrupted);
                        worker_shared.wait_while(|s| s == CoreState::Interrupted);
                        continue;
                    }
                    CoreState::Reseting => {
                        debug!("core thread resetting");
                        worker_shared.set_state(CoreState::Running);
                        continue;
                    }
                    CoreState::Exiting => {
                        worker_shared.set_state(CoreState::Shutdown);
                        worker_shared.sync.end();
                        break;
                    }
                    CoreState::Paused | CoreState::Interrupted => {
                        worker_shared.wait_while(|s| s == state);
                        continue;
                    }
                    CoreState::Crashed | CoreState::Shutdown => break,
                    CoreState::RunOn => {
                        let callback = worker_shared.callback.lock().unwrap().take();
                        if let Some(callback) = callback {
                            let result = panic::catch_unwind(AssertUnwindSafe(callback));
                            if result.is_err() {
                                warn!("core thread panicked while running a reach-in callback");
                                worker_shared.set_state(CoreState::Crashed);
                                worker_shared.sync.end();
                                break;
                            }
                            let restore = worker_shared
                                .run_on_saved_state
                                .lock()
                                .unwrap()
                                .take()
                                .unwrap_or(CoreState::Running);
                            if restore == CoreState::Paused {
                                worker_shared.release_barriers_for_parked_state();
                            }
                            worker_shared.set_state(restore);
                            continue;
                        }

                        // No callback installed: legacy single-step — run one
                        // iteration, then fall back to Paused.
                        let result = panic::catch_unwind(AssertUnwindSafe(&mut run_iteration));
                        if result.is_err() {
                            warn!("core thread panicked during an iteration");
                            worker_shared.set_state(CoreState::Crashed);
                            worker_shared.sync.end();
                            break;
                        }
                        worker_shared.release_barriers_for_parked_state();
                        worker_shared.set_state(CoreState::Paused);
                        continue;
                    }
                    CoreState::Initialized | CoreState::Running => {}
                }

                let result = panic::catch_unwind(AssertUnwindSafe(&mut run_iteration));
                if result.is_err() {
                    warn!("core thread panicked during an iteration");
                    worker_shared.set_state(CoreState::Crashed);
                    worker_shared.sync.end();
                    break;
                }
            }
        });

        CoreThread {
            shared,
            handle: Some(handle),
        }
    }

    pub fn state(&self) -> CoreState {
        *self.shared.state.lock().unwrap()
    }

    fn require_not_terminal(&self, action: &str) -> CoreResult<()> {
        let state = self.state();
        if state == CoreState::Crashed || state == CoreState::Shutdown {
            return Err(CoreError::InvalidStateTransition {
                from: format!("{:?}", state),
                action: action.to_string(),
            });
        }
        Ok(())
    }

    pub fn pause(&self) -> CoreResult<()> {
        self.require_not_terminal("pause")?;
        self.shared.set_state(CoreState::Pausing);
        self.shared.wait_until(CoreState::Paused);
        Ok(())
    }

    pub fn unpause(&self) -> CoreResult<()> {
        self.require_not_terminal("unpause")?;
        if self.state() != CoreState::Paused {
            return Err(CoreError::InvalidStateTransition {
                from: format!("{:?}", self.state()),
                action: "unpause".to_string(),
            });
        }
        self.shared.set_state(CoreState::Running);
        Ok(())
    }

    /// Runs exactly one iteration while paused, then returns to `Paused`.
    pub fn run_once(&self) -> CoreResult<()> {
        if self.state() != CoreState::Paused {
            return Err(CoreError::InvalidStateTransition {
                from: format!("{:?}", self.state()),
                action: "run_once".to_string(),
            });
        }
        self.shared.set_state(CoreState::RunOn);
        self.shared.wait_until(CoreState::Paused);
        Ok(())
    }

    /// Installs `f` to run on the worker thread, transitions to `RunOn`, and
    /// blocks until the worker has executed it and returned to whatever
    /// state the caller observed (§4.4). Unlike `run_once`, this may be
    /// called from `Running`, not just `Paused`.
    pub fn run_function<G>(&self, f: G) -> CoreResult<()>
    where
        G: FnOnce() + Send + 'static,
    {
        self.require_not_terminal("run_function")?;
        let current = self.state();
        if current == CoreState::RunOn {
            return Err(CoreError::InvalidStateTransition {
                from: format!("{:?}", current),
                action: "run_function".to_string(),
            });
        }
        *self.shared.run_on_saved_state.lock().unwrap() = Some(current);
        *self.shared.callback.lock().unwrap() = Some(Box::new(f));
        self.shared.set_state(CoreState::RunOn);
        self.shared.wait_until(current);
        Ok(())
    }

    /// Nestable: an inner `interrupt()` while already interrupted just bumps
    /// the depth counter. The thread only actually parks on the first call.
    pub fn interrupt(&self) -> CoreResult<()> {
        self.require_not_terminal("interrupt")?;
        let mut depth = self.shared.interrupt_depth.lock().unwrap();
        *depth += 1;
        if *depth == 1 {
            let current = self.state();
            *self.shared.saved_state.lock().unwrap() = Some(current);
            drop(depth);
            self.shared.set_state(CoreState::Interrupting);
            self.shared.wait_until(CoreState::Interrupted);
        }
        Ok(())
    }

    pub fn continue_(&self) -> CoreResult<()> {
        let mut depth = self.shared.interrupt_depth.lock().unwrap();
        if *depth == 0 {
            return Err(CoreError::InvalidStateTransition {
                from: format!("{:?}", self.state()),
                action: "continue_".to_string(),
            });
        }
        *depth -= 1;
        if *depth == 0 {
            let restore = self
                .shared
                .saved_state
                .lock()
                .unwrap()
                .take()
                .unwrap_or(CoreState::Running);
            drop(depth);
            self.shared.set_state(restore);
        }
        Ok(())
    }

    pub fn reset(&self) -> CoreResult<()> {
        self.require_not_terminal("reset")?;
        self.shared.set_state(CoreState::Reseting);
        self.shared.wait_until(CoreState::Running);
        Ok(())
    }

    pub fn end(&self) -> CoreResult<()> {
        if self.state() == CoreState::Shutdown {
            return Ok(());
        }
        self.shared.set_state(CoreState::Exiting);
        self.shared.sync.end();
        Ok(())
    }

    pub fn join(mut self) -> std::thread::Result<()> {
        if let Some(handle) = self.handle.take() {
            handle.join()
        } else {
            Ok(())
        }
    }
}

impl Drop for CoreThread {
    fn drop(&mut self) {
        if self.handle.is_some() {
            let _ = self.end();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn wait_for<F: Fn() -> bool>(pred: F) {
        let mut tries = 0;
        while !pred() && tries < 200 {
            thread::sleep(Duration::from_millis(5));
            tries += 1;
        }
        assert!(pred(), "condition never became true");
    }

    #[test]
    fn pause_and_unpause_round_trip() {
        let sync = Arc::new(SyncPoint::new());
        let counter = Arc::new(AtomicU32::new(0));
        let worker_counter = Arc::clone(&counter);
        let core = CoreThread::spawn(sync, move || {
            worker_counter.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(1));
        });

        wait_for(|| counter.load(Ordering::SeqCst) > 0);
        core.pause().unwrap();
        assert_eq!(core.state(), CoreState::Paused);
        let after_pause = counter.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(counter.load(Ordering::SeqCst), after_pause);

        core.unpause().unwrap();
        wait_for(|| counter.load(Ordering::SeqCst) > after_pause);

        core.end().unwrap();
        core.join().unwrap();
    }

    #[test]
    fn nested_interrupts_require_matching_continues() {
        let sync = Arc::new(SyncPoint::new());
        let core = CoreThread::spawn(sync, || {
            thread::sleep(Duration::from_millis(1));
        });

        core.interrupt().unwrap();
        core.interrupt().unwrap();
        assert_eq!(core.state(), CoreState::Interrupted);

        core.continue_().unwrap();
        assert_eq!(core.state(), CoreState::Interrupted, "one outstanding interrupt remains");

        core.continue_().unwrap();
        wait_for(|| core.state() == CoreState::Running);

        core.end().unwrap();
        core.join().unwrap();
    }

    #[test]
    fn reset_during_pause_returns_to_running() {
        let sync = Arc::new(SyncPoint::new());
        let core = CoreThread::spawn(sync, || {
            thread::sleep(Duration::from_millis(1));
        });

        core.pause().unwrap();
        core.reset().unwrap();
        assert_eq!(core.state(), CoreState::Running);

        core.end().unwrap();
        core.join().unwrap();
    }

    #[test]
    fn end_while_paused_does_not_deadlock_a_barrier_waiter() {
        let sync = Arc::new(SyncPoint::new());
        let core = CoreThread::spawn(Arc::clone(&sync), || {
            thread::sleep(Duration::from_millis(1));
        });
        core.pause().unwrap();

        let waiter_sync = Arc::clone(&sync);
        let waiter = thread::spawn(move || waiter_sync.wait_for_video());

        core.end().unwrap();
        let result = waiter.join().unwrap();
        assert!(result.is_err());
        core.join().unwrap();
    }

    #[test]
    fn run_function_executes_on_the_worker_and_restores_running() {
        let sync = Arc::new(SyncPoint::new());
        let counter = Arc::new(AtomicU32::new(0));
        let worker_counter = Arc::clone(&counter);
        let core = CoreThread::spawn(sync, move || {
            worker_counter.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(1));
        });

        wait_for(|| counter.load(Ordering::SeqCst) > 0);
        assert_eq!(core.state(), CoreState::Running);

        let ran_on_worker = Arc::new(AtomicU32::new(0));
        let callback_flag = Arc::clone(&ran_on_worker);
        core.run_function(move || {
            callback_flag.store(1, Ordering::SeqCst);
        })
        .unwrap();

        assert_eq!(ran_on_worker.load(Ordering::SeqCst), 1);
        assert_eq!(core.state(), CoreState::Running);

        core.end().unwrap();
        core.join().unwrap();
    }

    #[test]
    fn run_function_from_paused_restores_paused() {
        let sync = Arc::new(SyncPoint::new());
        let core = CoreThread::spawn(sync, || {
            thread::sleep(Duration::from_millis(1));
        });
        core.pause().unwrap();

        let ran = Arc::new(AtomicU32::new(0));
        let flag = Arc::clone(&ran);
        core.run_function(move || flag.store(1, Ordering::SeqCst)).unwrap();

        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert_eq!(core.state(), CoreState::Paused);

        core.end().unwrap();
        core.join().unwrap();
    }

    #[test]
    fn a_panicking_iteration_crashes_the_thread() {
        let sync = Arc::new(SyncPoint::new());
        let core = CoreThread::spawn(sync, || panic!("boom"));
        wait_for(|| core.state() == CoreState::Crashed);
        core.join().unwrap();
    }
}
