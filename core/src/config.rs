//! Embedder-facing configuration surface (ambient stack, §3).

use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Style {
    /// Original Game Boy timing, addressing and power-on quirks.
    #[default]
    Dmg,
    /// Game Boy Advance timing and wave-RAM addressing.
    Gba,
}

#[derive(Serialize, Deserialize, SmartDefault, Debug, Clone)]
pub struct CoreConfig {
    pub style: Style,
    /// Gates the DMG wave-RAM corruption-on-restart quirk (§4.3.4). On by
    /// default since it reproduces real hardware behavior that some
    /// software depends on.
    #[default = true]
    pub wave_ram_quirk: bool,
    /// Target frames per second the thread harness paces itself to.
    #[default = 60]
    pub fps_target: u32,
    #[default = 44100]
    pub audio_sample_rate: u32,
}
