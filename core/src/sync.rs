//! Video/audio barrier pair the worker thread blocks on between frames,
//! grounded on the condvar-based pause/resume signalling in the teacher's
//! `platform/rustboyadvance-jni/src/emulator.rs`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};

use crate::error::{CoreError, CoreResult};

struct BarrierState {
    signaled: bool,
    cancelled: bool,
    waiting: u32,
}

/// A single producer/consumer rendezvous: one side signals, the other
/// waits. `cancel` wakes every waiter with an error instead of success so a
/// shutdown can never deadlock a blocked consumer. `wait` is non-terminal:
/// after waking it clears `signaled` so the same barrier can be used again
/// on the next cycle (the audio back-pressure loop re-enters it every time
/// the resampler buffer fills).
struct Barrier {
    state: Mutex<BarrierState>,
    condvar: Condvar,
    /// Runtime toggle (§4.4/§4.5): when false, `wait` returns immediately
    /// instead of blocking, letting an embedder disable a direction of
    /// back-pressure without tearing the barrier down.
    enabled: AtomicBool,
}

impl Barrier {
    fn new() -> Barrier {
        Barrier {
            state: Mutex::new(BarrierState {
                signaled: false,
                cancelled: false,
                waiting: 0,
            }),
            condvar: Condvar::new(),
            enabled: AtomicBool::new(true),
        }
    }

    fn wait(&self) -> CoreResult<()> {
        let mut state = self.state.lock().unwrap();
        state.waiting += 1;
        let result = loop {
            if state.cancelled {
                break Err(CoreError::SyncCancelled);
            }
            if !self.enabled.load(Ordering::SeqCst) {
                break Ok(());
            }
            if state.signaled {
                state.signaled = false;
                break Ok(());
            }
            state = self.condvar.wait(state).unwrap();
        };
        state.waiting -= 1;
        result
    }

    fn signal(&self) {
        let mut state = self.state.lock().unwrap();
        state.signaled = true;
        self.condvar.notify_all();
    }

    /// Wakes a waiter already parked in `wait`, without arming `signaled`
    /// for a future one (§4.4 deadlock avoidance). A consumer that hasn't
    /// called `wait` yet when the worker parks should still have to wait for
    /// real data on its next call, not be handed a stale pass.
    fn release_parked_waiter(&self) {
        let mut state = self.state.lock().unwrap();
        if state.waiting > 0 {
            state.signaled = true;
        }
        self.condvar.notify_all();
    }

    fn cancel(&self) {
        let mut state = self.state.lock().unwrap();
        state.cancelled = true;
        self.condvar.notify_all();
    }

    /// Toggling re-checks `wait`'s loop condition on every blocked waiter
    /// without touching `signaled`, so disabling never leaves a stale
    /// signal behind for the next, re-enabled, wait cycle.
    fn set_enabled(&self, enabled: bool) {
        let _state = self.state.lock().unwrap();
        self.enabled.store(enabled, Ordering::SeqCst);
        self.condvar.notify_all();
    }
}

/// Dual barrier for the video frame boundary and the audio buffer boundary.
/// Both must stay responsive to [`SyncPoint::end`] so a consumer parked in
/// `PAUSED` or `INTERRUPTED` never blocks a shutdown.
pub struct SyncPoint {
    video: Barrier,
    audio: Barrier,
}

impl Default for SyncPoint {
    fn default() -> SyncPoint {
        SyncPoint::new()
    }
}

impl SyncPoint {
    pub fn new() -> SyncPoint {
        SyncPoint {
            video: Barrier::new(),
            audio: Barrier::new(),
        }
    }

    pub fn signal_video_ready(&self) {
        self.video.signal();
    }

    pub fn wait_for_video(&self) -> CoreResult<()> {
        self.video.wait()
    }

    pub fn signal_audio_ready(&self) {
        self.audio.signal();
    }

    pub fn wait_for_audio(&self) -> CoreResult<()> {
        self.audio.wait()
    }

    /// Wakes any consumer already parked on either barrier, without
    /// pre-arming a pass for a consumer that calls `wait_for_video`/
    /// `wait_for_audio` later. Used when the worker parks in `PAUSED` or
    /// `INTERRUPTED` so an in-flight waiter never deadlocks on a frame the
    /// worker has stopped producing.
    pub fn release_parked_waiters(&self) {
        self.video.release_parked_waiter();
        self.audio.release_parked_waiter();
    }

    /// Toggles `video_frame_wait` (§4.5): disabling releases any producer
    /// currently blocked on the video barrier.
    pub fn set_video_frame_wait(&self, enabled: bool) {
        self.video.set_enabled(enabled);
    }

    /// Toggles `audio_wait` (§4.5): disabling releases any producer
    /// currently blocked on the audio barrier.
    pub fn set_audio_wait(&self, enabled: bool) {
        self.audio.set_enabled(enabled);
    }

    /// Wakes both barriers with a cancellation error and disables both
    /// directions of back-pressure. Idempotent.
    pub fn end(&self) {
        self.video.cancel();
        self.audio.cancel();
        self.video.set_enabled(false);
        self.audio.set_enabled(false);
    }
}
