//! Minimal two-operator FM chip with OPN-style timers.
//!
//! The register map follows the OPN layout closely enough for a
//! sequencer driver written against it: fnum/block frequency registers,
//! a key on/off register, per-channel level/multiplier/depth/pan, and
//! timer A/B control at `0x24..=0x27`.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod frame;
mod opn;
mod tables;
mod timer;

pub use frame::Frame;
pub use opn::{AdpcmRam, Opn, ADPCM_RAM_SIZE, CHANNELS};
pub use tables::init_tables;
pub use timer::{TimerState, TIMER_B_FRAMES_PER_STEP};

/// Native output rate in frames per second (master clock / 144).
pub const SAMPLE_RATE: u32 = 55467;

/// Register addresses.
pub mod reg {
    pub const TIMER_A_HIGH: u16 = 0x24;
    pub const TIMER_A_LOW: u16 = 0x25;
    pub const TIMER_B: u16 = 0x26;
    pub const TIMER_CONTROL: u16 = 0x27;
    pub const KEY_ON: u16 = 0x28;
    pub const MULTIPLIER: u16 = 0x30;
    pub const TOTAL_LEVEL: u16 = 0x40;
    pub const FNUM_LOW: u16 = 0xA0;
    pub const FNUM_HIGH: u16 = 0xA8;
    pub const DEPTH: u16 = 0xB0;
    pub const PAN: u16 = 0xB8;
    /// Read-only chip identification register
    pub const ID: u16 = 0xFF;
}

/// Timer control bits for [`reg::TIMER_CONTROL`].
pub mod timer_ctl {
    pub const LOAD_A: u8 = 0x01;
    pub const LOAD_B: u8 = 0x02;
    pub const ENABLE_A: u8 = 0x04;
    pub const ENABLE_B: u8 = 0x08;
    pub const RESET_A: u8 = 0x10;
    pub const RESET_B: u8 = 0x20;
}

/// Status register bits.
pub mod status {
    pub const TIMER_A: u8 = 0x01;
    pub const TIMER_B: u8 = 0x02;
}
