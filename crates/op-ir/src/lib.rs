//! Track data model for the opnplay sequencer.
//!
//! A loaded file becomes a [`ParsedTrack`]; the driver and the loop
//! simulator only ever see it through a borrowed [`TrackView`], and the
//! simulator works on a private [`TrackCopy`].
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod command;
mod loop_length;
mod track;

pub use command::{decode, Command, DecodeError, Pan, MAX_COMMANDS_PER_TICK, MAX_NOTE};
pub use loop_length::LoopLength;
pub use track::{Board, ParsedTrack, Span, TrackCopy, TrackView, MAX_PARTS};
