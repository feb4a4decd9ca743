//! The DMG DIV/TIMA hardware timer.
//!
//! Grounded on the teacher's `Timer`/`Timers` split in `timer.rs`: register
//! state plus deadline bookkeeping live on the peripheral, and the deadline
//! protocol is the one-`process_events`-call-per-peripheral idiom the
//! teacher's scheduler embodies, here following the min-fold contract of
//! [`crate::sched`] instead of the teacher's absolute-timestamp heap.

use serde::{Deserialize, Serialize};

use crate::interrupt::{self, Interrupt, SharedInterruptFlags};
use crate::sched::{PeripheralClock, NO_EVENT};

const TIMA_PERIODS: [i32; 4] = [1024, 16, 64, 256];

bitfield! {
    #[derive(Serialize, Deserialize, Default, Copy, Clone, PartialEq)]
    pub struct Tac(u8);
    impl Debug;
    u8;
    pub clock_select, set_clock_select: 1, 0;
    pub running, set_running: 2;
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Timer {
    div_period: i32,
    next_div: i32,
    next_tima: i32,
    next_event: i32,
    event_diff: i32,
    tima_period: i32,

    pub div: u8,
    pub tima: u8,
    pub tma: u8,
    pub tac: Tac,

    interrupt_flags: SharedInterruptFlags,
}

impl Timer {
    pub fn new(interrupt_flags: SharedInterruptFlags) -> Timer {
        let mut timer = Timer {
            div_period: 256,
            next_div: 256,
            next_tima: NO_EVENT,
            next_event: 256,
            event_diff: 0,
            tima_period: 1024,
            div: 0,
            tima: 0,
            tma: 0,
            tac: Tac::default(),
            interrupt_flags,
        };
        timer.reset();
        timer
    }

    pub fn reset(&mut self) {
        self.div_period = 256;
        self.next_tima = NO_EVENT;
        self.next_event = 256;
        self.event_diff = 0;
        self.tima_period = 1024;
        self.div = 0;
        self.tima = 0;
        self.tma = 0;
        self.tac = Tac::default();
        self.next_div = self.div_period;
    }

    /// Cycles until this timer's next deadline; folded by the owning
    /// scheduler into the CPU's global `next_event`.
    pub fn next_event(&self) -> i32 {
        self.next_event
    }

    /// A write to DIV (any value written) resets the DMG prescaler.
    pub fn div_reset(&mut self) {
        self.div = 0;
        self.next_div = self.div_period;
        if self.next_div < self.next_event {
            self.next_event = self.next_div;
        }
    }

    pub fn write_tma(&mut self, value: u8) {
        self.tma = value;
    }

    pub fn write_tima(&mut self, value: u8) {
        self.tima = value;
    }

    /// A write to TAC. Re-derives `tima_period` from the clock-select field
    /// and either (re-)arms or disables the TIMA deadline.
    pub fn update_tac(&mut self, value: u8) {
        self.tac = Tac(value);
        if self.tac.running() {
            self.tima_period = TIMA_PERIODS[self.tac.clock_select() as usize];
            self.next_tima = self.tima_period;
            if self.next_tima < self.next_event {
                self.next_event = self.next_tima;
            }
        } else {
            self.next_tima = NO_EVENT;
        }
    }
}

impl PeripheralClock for Timer {
    fn process_events(&mut self, delta: i32) -> i32 {
        self.event_diff += delta;
        self.next_event -= delta;

        if self.next_event > 0 {
            return self.next_event;
        }

        self.next_div -= self.event_diff;
        if self.next_div <= 0 {
            self.div = self.div.wrapping_add(1);
            self.next_div += self.div_period;
        }
        self.next_event = self.next_div;

        if self.tac.running() {
            self.next_tima -= self.event_diff;
            if self.next_tima <= 0 {
                let (new_tima, overflowed) = self.tima.overflowing_add(1);
                self.tima = new_tima;
                if overflowed {
                    self.tima = self.tma;
                    interrupt::signal_irq(&self.interrupt_flags, Interrupt::Timer);
                }
                self.next_tima += self.tima_period;
            }
            if self.next_tima < self.next_event {
                self.next_event = self.next_tima;
            }
        }

        self.event_diff = 0;
        self.next_event
    }
}
