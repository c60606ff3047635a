//! Driver work area: the mutable progress of one loaded track.

use arrayvec::ArrayVec;
use op_ir::{LoopLength, MAX_PARTS};

/// Number of PCM sources that carry an error flag.
pub const PCM_CHANNELS: usize = 3;

/// Playback state of a single part.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PartState {
    /// Chip channel this part drives
    pub(crate) channel: u8,
    /// Offset of the next command within the body
    pub(crate) offset: usize,
    /// Offset just past the loop point marker, once seen
    pub(crate) loop_offset: Option<usize>,
    /// Ticks left on the current note or rest
    pub(crate) remaining: u16,
    /// Currently keyed note
    pub(crate) note: Option<u8>,
    /// Wrapped to the loop point since the loop counter last advanced
    pub(crate) looped: bool,
    pub(crate) finished: bool,
}

impl PartState {
    pub(crate) fn new(channel: u8, offset: usize) -> Self {
        Self {
            channel,
            offset,
            remaining: 1,
            ..Self::default()
        }
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn note(&self) -> Option<u8> {
        self.note
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn has_loop(&self) -> bool {
        self.loop_offset.is_some()
    }
}

/// Mutable runtime state of one loaded track.
///
/// `Default` is the clean zeroed state: no parts, no progress, loop
/// length unknown.
#[derive(Clone, Debug, Default)]
pub struct DriverWork {
    pub(crate) parts: ArrayVec<PartState, MAX_PARTS>,
    pub(crate) loop_count: u32,
    pub(crate) timerb_ticks: u32,
    pub(crate) timer_b: u8,
    pub(crate) initialized: bool,
    loop_length: LoopLength,
    /// Set when the matching PCM source has no sample data
    pub pcm_error: [bool; PCM_CHANNELS],
}

impl DriverWork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return to the clean zeroed state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Completed loops since init.
    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    /// Timer-B ticks processed since init.
    pub fn timerb_ticks(&self) -> u32 {
        self.timerb_ticks
    }

    /// Current timer-B reload value.
    pub fn timer_b(&self) -> u8 {
        self.timer_b
    }

    pub fn loop_length(&self) -> LoopLength {
        self.loop_length
    }

    pub fn set_loop_length(&mut self, length: LoopLength) {
        self.loop_length = length;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn parts(&self) -> &[PartState] {
        &self.parts
    }

    /// True once every part has reached its end without a loop point.
    pub fn is_finished(&self) -> bool {
        self.initialized && self.parts.iter().all(|p| p.finished)
    }

    /// Advance the loop counter when every part has looped or finished.
    pub(crate) fn update_loop_count(&mut self) {
        let any_looped = self.parts.iter().any(|p| p.looped);
        if any_looped && self.parts.iter().all(|p| p.looped || p.finished) {
            self.loop_count = self.loop_count.saturating_add(1);
            for part in &mut self.parts {
                part.looped = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_zeroed() {
        let work = DriverWork::default();
        assert_eq!(work.loop_count(), 0);
        assert_eq!(work.timerb_ticks(), 0);
        assert_eq!(work.loop_length(), LoopLength::Unknown);
        assert_eq!(work.pcm_error, [false; PCM_CHANNELS]);
        assert!(!work.is_initialized());
        assert!(!work.is_finished());
    }

    #[test]
    fn loop_count_waits_for_every_part() {
        let mut work = DriverWork::default();
        work.parts.push(PartState::new(0, 0));
        work.parts.push(PartState::new(1, 0));

        work.parts[0].looped = true;
        work.update_loop_count();
        assert_eq!(work.loop_count, 0);

        work.parts[1].finished = true;
        work.update_loop_count();
        assert_eq!(work.loop_count, 1);
        assert!(!work.parts[0].looped);
    }

    #[test]
    fn finished_parts_alone_never_loop() {
        let mut work = DriverWork::default();
        work.parts.push(PartState::new(0, 0));
        work.parts[0].finished = true;
        work.update_loop_count();
        assert_eq!(work.loop_count, 0);
    }

    #[test]
    fn reset_clears_everything() {
        let mut work = DriverWork::default();
        work.parts.push(PartState::new(0, 0));
        work.loop_count = 3;
        work.pcm_error = [true; PCM_CHANNELS];
        work.set_loop_length(LoopLength::Ticks(10));
        work.reset();
        assert!(work.parts().is_empty());
        assert_eq!(work.loop_count(), 0);
        assert_eq!(work.pcm_error, [false; PCM_CHANNELS]);
        assert_eq!(work.loop_length(), LoopLength::Unknown);
    }
}
