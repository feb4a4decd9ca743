//! The shared interrupt-flag register (IF) that the timer raises into.
//!
//! Grounded on the teacher's `Interrupt`/`SharedInterruptFlags` pair: a
//! `Cell`-backed bitmask shared by `Rc` between the peripheral and whatever
//! owns the CPU, so a peripheral can signal an IRQ without needing a
//! mutable borrow of the core.

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum Interrupt {
    VBlank = 0,
    LcdStat = 1,
    Timer = 2,
    Serial = 3,
    Joypad = 4,
}

bitfield! {
    #[derive(Serialize, Deserialize, Default, Copy, Clone, PartialEq)]
    pub struct IrqBitmask(u8);
    impl Debug;
    u8;
    pub vblank, set_vblank: 0;
    pub lcd_stat, set_lcd_stat: 1;
    pub timer, set_timer: 2;
    pub serial, set_serial: 3;
    pub joypad, set_joypad: 4;
}

impl IrqBitmask {
    pub fn value(&self) -> u8 {
        self.0
    }
}

pub type SharedInterruptFlags = Rc<Cell<IrqBitmask>>;

pub fn new_shared_interrupt_flags() -> SharedInterruptFlags {
    Rc::new(Cell::new(IrqBitmask::default()))
}

#[inline]
pub fn signal_irq(interrupt_flags: &SharedInterruptFlags, i: Interrupt) {
    let mut bits = interrupt_flags.get();
    match i {
        Interrupt::VBlank => bits.set_vblank(true),
        Interrupt::LcdStat => bits.set_lcd_stat(true),
        Interrupt::Timer => bits.set_timer(true),
        Interrupt::Serial => bits.set_serial(true),
        Interrupt::Joypad => bits.set_joypad(true),
    }
    interrupt_flags.set(bits);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_sets_only_the_named_bit() {
        let flags = new_shared_interrupt_flags();
        signal_irq(&flags, Interrupt::Timer);
        assert!(flags.get().timer());
        assert!(!flags.get().vblank());
        assert_eq!(flags.get().value(), 1 << 2);
    }
}
