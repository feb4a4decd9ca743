//! The volume envelope shared by channels 1, 2 and 4.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum EnvelopeDead {
    #[default]
    Alive,
    SaturatedHigh,
    SaturatedLow,
}

#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone)]
pub struct Envelope {
    pub step_time: u8,
    pub direction_up: bool,
    pub initial_volume: u8,
    pub current_volume: u8,
    next_step: u8,
    pub dead: EnvelopeDead,
}

impl Envelope {
    /// Register write to NRx2. Kills or saturates the channel per the
    /// documented "zombie volume" hardware quirk instead of only at trigger
    /// time.
    pub fn write(&mut self, step_time: u8, direction_up: bool, initial_volume: u8) -> bool {
        self.step_time = step_time;
        self.direction_up = direction_up;
        self.initial_volume = initial_volume;

        if step_time == 0 {
            self.dead = if self.current_volume == 0 {
                EnvelopeDead::SaturatedLow
            } else {
                EnvelopeDead::SaturatedHigh
            };
        }

        // Writing both fields to zero disables the channel outright.
        initial_volume != 0 || direction_up
    }

    pub fn trigger(&mut self) {
        self.current_volume = self.initial_volume;
        self.next_step = self.step_time;
        self.dead = EnvelopeDead::Alive;
    }

    /// Clocked once per frame-sequencer step 7 (§4.3.1).
    pub fn tick(&mut self) {
        if self.dead != EnvelopeDead::Alive {
            return;
        }
        if self.next_step > 0 {
            self.next_step -= 1;
        }
        if self.next_step == 0 {
            if self.direction_up {
                if self.current_volume < 15 {
                    self.current_volume += 1;
                } else {
                    self.dead = EnvelopeDead::SaturatedHigh;
                }
            } else if self.current_volume > 0 {
                self.current_volume -= 1;
            } else {
                self.dead = EnvelopeDead::SaturatedLow;
            }
            self.next_step = self.step_time;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_stays_in_range_and_freezes_once_dead() {
        let mut env = Envelope::default();
        env.write(1, true, 14);
        env.trigger();
        for _ in 0..32 {
            env.tick();
            assert!(env.current_volume <= 15);
        }
        assert_eq!(env.dead, EnvelopeDead::SaturatedHigh);
        let frozen = env.current_volume;
        env.tick();
        assert_eq!(env.current_volume, frozen);
    }

    #[test]
    fn zero_step_time_kills_or_saturates_immediately() {
        let mut env = Envelope::default();
        env.current_volume = 0;
        env.write(0, false, 0);
        assert_eq!(env.dead, EnvelopeDead::SaturatedLow);

        let mut env = Envelope::default();
        env.current_volume = 5;
        env.write(0, false, 5);
        assert_eq!(env.dead, EnvelopeDead::SaturatedHigh);
    }
}
