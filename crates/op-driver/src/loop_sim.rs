//! Headless loop-length measurement.
//!
//! Runs the real driver against [`SyntheticBackend`], which performs no
//! synthesis and simply reports timer B as expired until the driver's
//! loop counter reaches the target. The number of ticks handed out by
//! then is the loop length.

use alloc::collections::TryReserveError;
use core::ops::RangeInclusive;

use op_chip::status;
use op_ir::{LoopLength, ParsedTrack, TrackCopy, TrackView};

use crate::backend::HardwareBackend;
use crate::driver;
use crate::work::DriverWork;

/// Ticks after which a track is declared never to loop.
pub const DEFAULT_TICK_CEILING: u32 = 1 << 20;

/// Loop targets the simulator accepts.
pub const LOOP_TARGETS: RangeInclusive<u32> = 1..=255;

/// Register reads on the synthetic backend return this.
pub const NOT_READY: u8 = 0xFF;

/// Timing-only backend for the loop simulator.
#[derive(Clone, Debug, Default)]
pub struct SyntheticBackend {
    target_loops: u32,
    /// Timer-B expiries reported so far
    ticks: u32,
    /// `ticks` at the moment the target was first reached, 0 until then
    loop_ticks: u32,
}

impl SyntheticBackend {
    pub fn new(target_loops: u32) -> Self {
        Self {
            target_loops,
            ..Self::default()
        }
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Recorded loop length, or 0 if the target has not been reached.
    pub fn loop_ticks(&self) -> u32 {
        self.loop_ticks
    }
}

impl HardwareBackend for SyntheticBackend {
    fn write(&mut self, _addr: u16, _value: u8) {}

    fn read(&mut self, _addr: u16) -> u8 {
        NOT_READY
    }

    fn status(&mut self, loop_count: u32) -> u8 {
        if loop_count >= self.target_loops {
            if self.loop_ticks == 0 {
                self.loop_ticks = self.ticks;
            }
            0
        } else {
            self.ticks = self.ticks.saturating_add(1);
            status::TIMER_B
        }
    }
}

/// Measure how many timer-B ticks `track` takes to complete `loop_target` loops.
///
/// Works on a private copy of the track. If the copy cannot be allocated
/// the result is [`LoopLength::Unknown`].
pub fn measure_loop_length(track: &ParsedTrack, loop_target: u32, tick_ceiling: u32) -> LoopLength {
    try_measure_loop_length(track, loop_target, tick_ceiling).unwrap_or_default()
}

/// Like [`measure_loop_length`], but hands a failed copy back to the caller.
pub fn try_measure_loop_length(
    track: &ParsedTrack,
    loop_target: u32,
    tick_ceiling: u32,
) -> Result<LoopLength, TryReserveError> {
    measure_from_copy(TrackCopy::try_from_track(track), loop_target, tick_ceiling)
}

/// Simulate on a copy that has already been attempted. The copy is
/// dropped on every path.
pub fn measure_from_copy(
    copy: Result<TrackCopy, TryReserveError>,
    loop_target: u32,
    tick_ceiling: u32,
) -> Result<LoopLength, TryReserveError> {
    let copy = copy?;
    Ok(simulate(copy.view(), loop_target, tick_ceiling))
}

/// Run the simulation against already-owned track data.
///
/// Logs nothing: the player runs this while holding the audio lock.
pub fn simulate(track: TrackView<'_>, loop_target: u32, tick_ceiling: u32) -> LoopLength {
    if !LOOP_TARGETS.contains(&loop_target) {
        return LoopLength::Unknown;
    }

    let mut backend = SyntheticBackend::new(loop_target);
    let mut work = DriverWork::new();
    driver::init(&mut work, track, &mut backend);

    // ticks reaches at most ceiling + 1, which must stay representable
    let ceiling = tick_ceiling.min(u32::MAX - 1);
    while backend.loop_ticks == 0 {
        driver::interrupt(&mut work, track, &mut backend);
        if backend.ticks > ceiling {
            return LoopLength::Never;
        }
    }

    LoopLength::Ticks(backend.loop_ticks)
}
