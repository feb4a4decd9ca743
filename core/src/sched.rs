//! Event-deadline scheduling protocol shared by the timer and audio peripherals.
//!
//! Each peripheral is cooperative: instead of being polled every cycle, it is
//! handed the number of cycles elapsed since its last service call and hands
//! back the number of cycles until it next needs attention. The driver (the
//! CPU step loop, outside this crate) takes the minimum of every peripheral's
//! answer and runs exactly that long before calling again.

/// Returned by `process_events` to mean "no pending deadline; don't call me
/// again until a register write calls `EventScheduler::schedule_event`".
pub const NO_EVENT: i32 = i32::MAX;

/// A cooperative, cycle-driven peripheral.
///
/// `delta` is the number of CPU cycles elapsed since the previous call. An
/// implementation must treat `delta` as a signed quantity: if the driver ran
/// past a deadline (because another peripheral's deadline was nearer), the
/// residual after subtracting `delta` goes negative, and the peripheral must
/// still fire as if exactly on time and carry the overdraft into the next
/// period rather than resetting the phase.
pub trait PeripheralClock {
    fn process_events(&mut self, delta: i32) -> i32;
}

/// Tracks the nearest deadline across every peripheral driven by one clock
/// domain and lets a peripheral pull that deadline closer from the middle of
/// a CPU step (a register write scheduling an earlier event than what is
/// currently queued).
///
/// The CPU owns one of these per core; peripherals only ever call
/// `schedule_event`, never read `next_event` directly, so that `next_event`
/// remains the single arbiter of "cycles until the next `process_events`
/// round" the way §4.1 describes.
#[derive(Debug, Clone, Copy)]
pub struct EventScheduler {
    next_event: i32,
}

impl Default for EventScheduler {
    fn default() -> EventScheduler {
        EventScheduler {
            next_event: NO_EVENT,
        }
    }
}

impl EventScheduler {
    pub fn new() -> EventScheduler {
        EventScheduler::default()
    }

    /// Fold a peripheral's returned deadline into the scheduler's next
    /// round. Called once per peripheral after every `process_events`.
    #[inline]
    pub fn observe(&mut self, peripheral_deadline: i32) {
        self.next_event = self.next_event.min(peripheral_deadline);
    }

    /// Called by a peripheral (directly, or via its register-write handler)
    /// to pull the next round closer than whatever is currently queued. The
    /// CPU must observe the new value at the next instruction boundary.
    #[inline]
    pub fn schedule_event(&mut self, cycles: i32) {
        self.next_event = self.next_event.min(cycles);
    }

    /// Cycles until the next round; always `>= 1` once at least one
    /// peripheral has an active deadline.
    #[inline]
    pub fn next_event(&self) -> i32 {
        self.next_event
    }

    /// Reset to "nothing pending" before folding in a fresh round of
    /// peripheral deadlines.
    #[inline]
    pub fn reset_round(&mut self) {
        self.next_event = NO_EVENT;
    }
}
