//! Channel 1's frequency sweep unit, including the hardware's sweep
//! "double-check" overflow re-evaluation (§4.3.3).

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub struct Sweep {
    pub shift: u8,
    pub direction_down: bool,
    pub time: u8,

    sweep_step: u8,
    sweep_enable: bool,
    sweep_occurred: bool,
    real_frequency: u16,
}

pub enum SweepOutcome {
    Unchanged,
    NewFrequency(u16),
    Disable,
}

impl Sweep {
    pub fn write(&mut self, shift: u8, direction_down: bool, time: u8) -> bool {
        let was_down = self.direction_down;
        self.shift = shift;
        self.time = time;
        self.direction_down = direction_down;
        // A direction flip from down to up after a sweep calculation has
        // already taken place on this trigger disables the channel.
        let must_disable = was_down && !direction_down && self.sweep_occurred;
        self.direction_down = direction_down;
        must_disable
    }

    pub fn trigger(&mut self, frequency: u16) {
        self.real_frequency = frequency;
        self.sweep_occurred = false;
        self.sweep_step = if self.time == 0 { 8 } else { self.time };
        self.sweep_enable = self.sweep_step != 8 || self.shift != 0;
    }

    /// `None` means the decreasing branch underflowed: the writeback is
    /// simply skipped, which is not the same as an overflow disable.
    fn calculate(&self) -> Option<u16> {
        let delta = self.real_frequency >> self.shift;
        if self.direction_down {
            self.real_frequency.checked_sub(delta)
        } else {
            Some(self.real_frequency + delta)
        }
    }

    /// Clocked on frame-sequencer steps 2 and 6.
    pub fn tick(&mut self) -> SweepOutcome {
        if !self.sweep_enable || self.time == 8 {
            return SweepOutcome::Unchanged;
        }
        if self.sweep_step > 0 {
            self.sweep_step -= 1;
        }
        if self.sweep_step != 0 {
            return SweepOutcome::Unchanged;
        }
        self.sweep_step = if self.time == 0 { 8 } else { self.time };

        let new_freq = match self.calculate() {
            None => return SweepOutcome::Unchanged,
            Some(f) if f >= 2048 => return SweepOutcome::Disable,
            Some(f) => f,
        };
        self.sweep_occurred = true;

        if self.shift == 0 {
            return SweepOutcome::Unchanged;
        }

        self.real_frequency = new_freq;
        // The double-check: hardware re-evaluates overflow against the
        // freshly written-back frequency before the new value is audible.
        match self.calculate() {
            None => SweepOutcome::NewFrequency(new_freq),
            Some(f) if f >= 2048 => SweepOutcome::Disable,
            Some(_) => SweepOutcome::NewFrequency(new_freq),
        }
    }
}
