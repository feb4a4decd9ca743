//! Timer, APU and thread-harness core for a Game Boy / Game Boy Advance
//! emulator. The CPU decoder, memory mapper, PPU and input matrix live
//! outside this crate; it exposes the peripherals and the worker-thread
//! scaffolding an embedder wires them into.

#[macro_use]
extern crate bitfield;

pub mod config;
pub mod error;
pub mod interrupt;
pub mod sched;
pub mod sound;
pub mod sync;
pub mod thread;
pub mod timer;

#[cfg(test)]
mod test_support;

pub mod prelude {
    pub use crate::config::{CoreConfig, Style};
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::interrupt::{Interrupt, SharedInterruptFlags};
    pub use crate::sched::PeripheralClock;
    pub use crate::sound::Audio;
    pub use crate::sync::SyncPoint;
    pub use crate::thread::{CoreState, CoreThread};
    pub use crate::timer::Timer;
}
