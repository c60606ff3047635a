//! Playback core for opnplay.
//!
//! Two contexts drive playback, both called from outside:
//!
//! - [`Player`] lives on the host side. It owns the staging buffers and
//!   the display, and runs load, render and playback control.
//! - [`Mixer`] lives in the audio callback and produces interleaved
//!   stereo samples on request.
//!
//! They share one [`AudioLock`] around the chip and driver state, a
//! lock-free pause flag, and a single-slot [`SpectrumHandoff`].

mod audio_state;
mod config;
mod display;
mod error;
mod mixer;
mod player;
mod spectrum;
mod staging;

pub use audio_state::{AudioGuard, AudioLock, AudioState};
pub use config::PlayerConfig;
pub use display::{Display, NullDisplay, RenderFrame, TrackInfo};
pub use error::{DisplayError, InitError, LoadError};
pub use mixer::Mixer;
pub use player::{PlaybackPosition, Player};
pub use spectrum::{SpectrumHandoff, SpectrumSnapshot, SPECTRUM_BANDS};
pub use staging::{StagingBuffers, FILENAME_BUFFER_SIZE, FILE_BUFFER_SIZE};

pub use op_chip::SAMPLE_RATE;

/// Largest frame count a single [`Mixer::mix`] call produces.
pub const MAX_SAMPLES: usize = 128;
