//! Sequencer driver for opnplay.
//!
//! The driver is written against [`HardwareBackend`] rather than a
//! concrete chip. Real playback passes the [`op_chip::Opn`] chip; the loop
//! simulator passes a [`SyntheticBackend`] that only counts timer ticks.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod backend;
mod driver;
mod frequency;
pub mod loop_sim;
mod work;

pub use backend::HardwareBackend;
pub use driver::{init, interrupt};
pub use frequency::note_to_fnum;
pub use loop_sim::{
    measure_from_copy, measure_loop_length, simulate, try_measure_loop_length, SyntheticBackend,
    DEFAULT_TICK_CEILING,
};
pub use work::{DriverWork, PartState, PCM_CHANNELS};
